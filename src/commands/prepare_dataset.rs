use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::{AddSampleArgs, DatasetCommand, PrepareDatasetArgs};
use crate::dataset::DatasetStore;
use crate::model::{EvaluationSample, Tone};

pub fn run(args: PrepareDatasetArgs) -> Result<()> {
    match args.command {
        DatasetCommand::Add(add) => add_sample(&args.dataset, &args.root, add),
        DatasetCommand::List => list_samples(&args.dataset, &args.root),
        DatasetCommand::Validate => validate_dataset(&args.dataset, &args.root),
    }
}

fn add_sample(dataset: &Path, root: &Path, add: AddSampleArgs) -> Result<()> {
    let mut store = DatasetStore::open(dataset, root)?;

    let tone = Tone::parse(&add.tone);
    if !tone.as_str().eq_ignore_ascii_case(add.tone.trim()) {
        warn!(tone = %add.tone, fallback = %tone, "unknown tone; using fallback");
    }

    let sample = EvaluationSample {
        id: add.id.trim().to_string(),
        title: add.title,
        video_url: add.video_url,
        transcript_path: add.transcript,
        reference_path: add.reference,
        tone: tone.as_str().to_string(),
        notes: add.notes.filter(|notes| !notes.trim().is_empty()),
    };
    let id = sample.id.clone();

    store
        .add(sample)
        .with_context(|| format!("failed to add sample to {}", dataset.display()))?;

    info!(sample_id = %id, path = %store.path().display(), "sample added");
    println!("added {id} ({} samples)", store.list().len());
    Ok(())
}

fn list_samples(dataset: &Path, root: &Path) -> Result<()> {
    let store = DatasetStore::open(dataset, root)?;
    for sample in store.list() {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            sample.id,
            sample.tone(),
            sample.title,
            sample.transcript_path,
            sample.reference_path,
            sample.notes.as_deref().unwrap_or("-")
        );
    }
    info!(path = %store.path().display(), samples = store.list().len(), "dataset listed");
    Ok(())
}

fn validate_dataset(dataset: &Path, root: &Path) -> Result<()> {
    if !dataset.is_file() {
        bail!("dataset file not found: {}", dataset.display());
    }
    let store = DatasetStore::open(dataset, root)?;
    let violations = store.validate();

    if violations.is_empty() {
        println!("dataset ok: {} samples", store.list().len());
        return Ok(());
    }

    for violation in &violations {
        println!("{}: {}", violation.sample_id, violation.reason);
    }
    bail!(
        "{} violation(s) found in {}",
        violations.len(),
        dataset.display()
    )
}
