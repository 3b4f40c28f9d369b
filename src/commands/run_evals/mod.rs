use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::cli::{EvalMode, RunEvalsArgs};
use crate::config::Settings;
use crate::dataset::DatasetStore;
use crate::error::{EvalError, error_chain_message};
use crate::generation::pipeline::BlogPipeline;
use crate::generation::{GenerationAdapter, OutputCache};
use crate::metrics::structure::WordBand;
use crate::metrics::{Capabilities, MetricOptions, MetricSuite};
use crate::model::{EvaluationSample, GenerationSource, RunReport, SampleReport, SampleStatus};
use crate::report::{RunContext, build_report, write_report};
use crate::util::{read_trimmed, sha256_file, sha256_text};

#[cfg(test)]
mod tests;

pub fn run(args: RunEvalsArgs, settings: &Settings) -> Result<()> {
    let (report, path) = execute(&args, settings)?;
    print_summary(&report, &path);
    Ok(())
}

/// Loads the dataset, wires the generation mode, and scores every sample.
pub fn execute(args: &RunEvalsArgs, settings: &Settings) -> Result<(RunReport, PathBuf)> {
    let cache = OutputCache::new(&args.generated_dir);
    let adapter = match args.mode {
        EvalMode::Mock => GenerationAdapter::mock(cache),
        EvalMode::Live => {
            let pipeline = BlogPipeline::from_settings(settings)
                .context("live mode could not be configured")?;
            GenerationAdapter::live(cache, Box::new(pipeline))
        }
    };

    evaluate(args, settings, &adapter)
}

pub fn evaluate(
    args: &RunEvalsArgs,
    settings: &Settings,
    adapter: &GenerationAdapter,
) -> Result<(RunReport, PathBuf)> {
    let started_at = Utc::now();

    if args.min_words > args.max_words {
        bail!(
            "--min-words ({}) must not exceed --max-words ({})",
            args.min_words,
            args.max_words
        );
    }

    let store = DatasetStore::open_existing(&args.dataset, &args.root)?;
    let dataset_sha256 = sha256_file(&args.dataset)?;
    info!(
        path = %args.dataset.display(),
        samples = store.list().len(),
        mode = args.mode.as_str(),
        "dataset loaded"
    );

    let options = MetricOptions {
        skip_bert_score: args.skip_bert_score,
        bert_model: args.bert_model.clone(),
        keyword_top_n: args.keyword_top_n,
        word_band: WordBand {
            min: args.min_words,
            max: args.max_words,
        },
    };
    let suite = MetricSuite::new(Capabilities::resolve(&options, settings), &options)?;

    let mut samples = Vec::with_capacity(store.list().len());
    for sample in store.list() {
        let report = match evaluate_sample(&store, adapter, &suite, sample) {
            Ok(report) => {
                info!(
                    sample_id = %sample.id,
                    scores = report.scores.len(),
                    omitted = report.omitted.len(),
                    rouge_l = report.score("rougeL_f"),
                    keyword_recall = report.score("keyword_recall"),
                    "sample scored"
                );
                report
            }
            Err(err) => {
                let message = error_chain_message(&err);
                warn!(sample_id = %sample.id, kind = err.kind(), error = %message, "sample failed");
                SampleReport::failed(&sample.id, err.kind(), message)
            }
        };
        samples.push(report);
    }

    let context = RunContext {
        started_at,
        mode: args.mode.as_str().to_string(),
        dataset_path: args.dataset.display().to_string(),
        dataset_sha256,
        generated_dir: adapter.cache().dir().display().to_string(),
        capabilities: suite.capabilities().report(),
    };
    let report = build_report(context, samples);
    let path = write_report(&args.output_dir, &report)?;
    info!(
        path = %path.display(),
        scored = report.summary.scored,
        failed = report.summary.failed,
        "evaluation report written"
    );

    Ok((report, path))
}

fn evaluate_sample(
    store: &DatasetStore,
    adapter: &GenerationAdapter,
    suite: &MetricSuite,
    sample: &EvaluationSample,
) -> Result<SampleReport, EvalError> {
    let reference_path = store.resolve(&sample.reference_path);
    let reference =
        read_trimmed(&reference_path).map_err(|err| EvalError::io(&reference_path, err))?;
    if reference.is_empty() {
        return Err(EvalError::validation(
            &sample.id,
            format!("reference is empty: {}", reference_path.display()),
        ));
    }

    // Live generation falls back to transcribing the video when no transcript is on disk.
    let transcript = match adapter.source() {
        GenerationSource::Live => read_transcript(&store.resolve(&sample.transcript_path))?,
        GenerationSource::Mock => None,
    };

    let generated = adapter.generate(sample, transcript.as_deref())?;
    debug!(
        sample_id = %generated.sample_id,
        chars = generated.candidate_text.len(),
        "candidate ready"
    );
    let scores = suite.score(&generated.candidate_text, &reference);

    Ok(SampleReport {
        sample_id: sample.id.clone(),
        status: SampleStatus::Scored,
        source: Some(generated.source),
        candidate_sha256: Some(sha256_text(&generated.candidate_text)),
        candidate_text: Some(generated.candidate_text),
        scores: scores.scores,
        omitted: scores.omitted,
        error: None,
    })
}

/// A missing or blank transcript is absent; any other read failure is an error.
fn read_transcript(path: &Path) -> Result<Option<String>, EvalError> {
    match fs::read_to_string(path) {
        Ok(text) if text.trim().is_empty() => Ok(None),
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(EvalError::io(path, err)),
    }
}

fn print_summary(report: &RunReport, path: &Path) {
    let summary = &report.summary;
    println!(
        "{} run: {} samples, {} scored, {} failed",
        report.mode, summary.total, summary.scored, summary.failed
    );

    for (name, aggregate) in &report.aggregates {
        println!("  {name:<22} {:>10.4}  (n={})", aggregate.mean, aggregate.count);
    }

    if let Some(reason) = &report.capabilities.bert_score.reason {
        println!("  bert_score skipped: {reason}");
    }

    for sample in &report.samples {
        if let Some(error) = &sample.error {
            println!("  FAILED {} [{}]: {}", sample.sample_id, error.kind, error.message);
        }
    }

    println!("report: {}", path.display());
}
