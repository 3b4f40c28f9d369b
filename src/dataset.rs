use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::error::EvalError;
use crate::model::{EvaluationSample, is_valid_sample_id};

/// Line-delimited JSON collection of evaluation samples.
#[derive(Debug)]
pub struct DatasetStore {
    path: PathBuf,
    root: PathBuf,
    samples: Vec<EvaluationSample>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub sample_id: String,
    pub reason: String,
}

impl DatasetStore {
    /// Opens the dataset, treating a missing file as an empty dataset.
    pub fn open(path: &Path, root: &Path) -> Result<Self> {
        let samples = if path.exists() {
            read_samples(path)?
        } else {
            Vec::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
            samples,
        })
    }

    /// Opens a dataset that must already exist with unique ids.
    pub fn open_existing(path: &Path, root: &Path) -> Result<Self> {
        if !path.is_file() {
            bail!("dataset file not found: {}", path.display());
        }

        let store = Self::open(path, root)?;
        let mut seen = HashSet::new();
        for sample in &store.samples {
            if !seen.insert(sample.id.as_str()) {
                bail!(
                    "dataset {} contains duplicate id '{}'",
                    path.display(),
                    sample.id
                );
            }
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> &[EvaluationSample] {
        &self.samples
    }

    /// Resolves a dataset-relative file path against the dataset root.
    pub fn resolve(&self, raw: &str) -> PathBuf {
        let candidate = Path::new(raw);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        }
    }

    pub fn add(&mut self, sample: EvaluationSample) -> Result<(), EvalError> {
        if sample.id.trim().is_empty() {
            return Err(EvalError::validation(&sample.id, "id must not be blank"));
        }

        if !is_valid_sample_id(&sample.id) {
            return Err(EvalError::validation(
                &sample.id,
                "id may only contain ASCII letters, digits, '-', '_' and '.', and must not start with '.'",
            ));
        }

        if self.samples.iter().any(|existing| existing.id == sample.id) {
            return Err(EvalError::validation(
                &sample.id,
                format!("dataset already contains id '{}'", sample.id),
            ));
        }

        for (label, raw) in [
            ("transcript", sample.transcript_path.as_str()),
            ("reference", sample.reference_path.as_str()),
        ] {
            let resolved = self.resolve(raw);
            if !resolved.is_file() {
                return Err(EvalError::validation(
                    &sample.id,
                    format!("{label} file missing: {}", resolved.display()),
                ));
            }
        }

        append_sample(&self.path, &sample)?;
        self.samples.push(sample);
        Ok(())
    }

    /// Collects every problem instead of stopping at the first one.
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut seen = HashSet::new();

        for sample in &self.samples {
            if !seen.insert(sample.id.as_str()) {
                violations.push(Violation {
                    sample_id: sample.id.clone(),
                    reason: "duplicate id".to_string(),
                });
            }

            for (label, raw) in [
                ("transcript", sample.transcript_path.as_str()),
                ("reference", sample.reference_path.as_str()),
            ] {
                if let Some(reason) = check_text_file(label, &self.resolve(raw)) {
                    violations.push(Violation {
                        sample_id: sample.id.clone(),
                        reason,
                    });
                }
            }
        }

        violations
    }
}

fn read_samples(path: &Path) -> Result<Vec<EvaluationSample>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset: {}", path.display()))?;

    let mut samples = Vec::new();
    for (index, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let sample: EvaluationSample = serde_json::from_str(line).with_context(|| {
            format!(
                "failed to parse dataset line {} in {}",
                index + 1,
                path.display()
            )
        })?;
        samples.push(sample);
    }

    Ok(samples)
}

fn append_sample(path: &Path, sample: &EvaluationSample) -> Result<(), EvalError> {
    let line = serde_json::to_string(sample)
        .map_err(|err| EvalError::io(path, std::io::Error::other(err)))?;

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| EvalError::io(parent, err))?;
    }

    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .map_err(|err| EvalError::io(path, err))?;

    let needs_newline = ends_without_newline(&mut file).map_err(|err| EvalError::io(path, err))?;
    let mut payload = String::with_capacity(line.len() + 2);
    if needs_newline {
        payload.push('\n');
    }
    payload.push_str(&line);
    payload.push('\n');

    file.write_all(payload.as_bytes())
        .map_err(|err| EvalError::io(path, err))
}

fn ends_without_newline(file: &mut fs::File) -> std::io::Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0_u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

fn check_text_file(label: &str, path: &Path) -> Option<String> {
    if !path.is_file() {
        return Some(format!("missing {label}: {}", path.display()));
    }

    match fs::read_to_string(path) {
        Ok(text) if text.trim().is_empty() => Some(format!("empty {label}: {}", path.display())),
        Ok(_) => None,
        Err(err) => Some(format!("unreadable {label}: {} ({err})", path.display())),
    }
}
