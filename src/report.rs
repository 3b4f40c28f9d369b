use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};

use crate::model::{
    CapabilityReport, MetricAggregate, REPORT_VERSION, RunReport, RunSummary, SampleReport,
    SampleStatus,
};
use crate::util::{
    ensure_directory, round4, utc_compact_string, utc_rfc3339_string, write_json_new,
};

const MAX_NAME_ATTEMPTS: usize = 1_000;

/// Run-level inputs recorded alongside the per-sample results.
pub struct RunContext {
    pub started_at: DateTime<Utc>,
    pub mode: String,
    pub dataset_path: String,
    pub dataset_sha256: String,
    pub generated_dir: String,
    pub capabilities: CapabilityReport,
}

/// Mean per metric over the samples that reported it.
pub fn aggregate(samples: &[SampleReport]) -> BTreeMap<String, MetricAggregate> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for sample in samples {
        for score in &sample.scores {
            let entry = sums.entry(score.name.as_str()).or_insert((0.0, 0));
            entry.0 += score.value;
            entry.1 += 1;
        }
    }

    sums.into_iter()
        .map(|(name, (sum, count))| {
            (
                name.to_string(),
                MetricAggregate {
                    mean: round4(sum / count as f64),
                    count,
                },
            )
        })
        .collect()
}

pub fn summarize(samples: &[SampleReport]) -> RunSummary {
    let failed_sample_ids: Vec<String> = samples
        .iter()
        .filter(|sample| sample.status == SampleStatus::Failed)
        .map(|sample| sample.sample_id.clone())
        .collect();

    RunSummary {
        total: samples.len(),
        scored: samples.len() - failed_sample_ids.len(),
        failed: failed_sample_ids.len(),
        failed_sample_ids,
    }
}

pub fn build_report(context: RunContext, samples: Vec<SampleReport>) -> RunReport {
    RunReport {
        report_version: REPORT_VERSION,
        generated_at: utc_rfc3339_string(context.started_at),
        timestamp: utc_compact_string(context.started_at),
        mode: context.mode,
        dataset_path: context.dataset_path,
        dataset_sha256: context.dataset_sha256,
        generated_dir: context.generated_dir,
        capabilities: context.capabilities,
        aggregates: aggregate(&samples),
        summary: summarize(&samples),
        samples,
    }
}

/// Writes `report_<timestamp>.json`, adding `_N` when that name is taken.
pub fn write_report(output_dir: &Path, report: &RunReport) -> Result<PathBuf> {
    ensure_directory(output_dir)?;

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let file_name = if attempt == 0 {
            format!("report_{}.json", report.timestamp)
        } else {
            format!("report_{}_{attempt}.json", report.timestamp)
        };
        let path = output_dir.join(file_name);

        match write_json_new(&path, report) {
            Ok(()) => return Ok(path),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to write report: {}", path.display()));
            }
        }
    }

    bail!(
        "no free report file name for timestamp {} in {}",
        report.timestamp,
        output_dir.display()
    )
}
