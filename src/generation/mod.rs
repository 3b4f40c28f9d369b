pub mod openai;
pub mod pipeline;
pub mod retry;
pub mod transcriber;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{EvalError, GenerationError};
use crate::model::{EvaluationSample, GenerationResult, GenerationSource, Tone, is_valid_sample_id};
use crate::util::read_trimmed;

pub const CACHE_EXTENSIONS: [&str; 2] = ["md", "txt"];

pub struct BlogRequest<'a> {
    pub sample_id: &'a str,
    pub video_url: &'a str,
    pub transcript: Option<&'a str>,
    pub tone: Tone,
}

/// The upstream video-to-blog pipeline, seen as an opaque text producer.
pub trait ContentPipeline {
    fn generate(&self, request: &BlogRequest<'_>) -> Result<String, GenerationError>;
}

/// One cached candidate per sample id under a single directory.
#[derive(Debug, Clone)]
pub struct OutputCache {
    dir: PathBuf,
}

impl OutputCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn lookup(&self, sample_id: &str) -> Option<PathBuf> {
        CACHE_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{sample_id}.{ext}")))
            .find(|path| path.is_file())
    }

    pub fn load(&self, sample_id: &str) -> Result<String, EvalError> {
        let path = self
            .lookup(sample_id)
            .ok_or_else(|| EvalError::MissingCache {
                sample_id: sample_id.to_string(),
                dir: self.dir.clone(),
            })?;
        read_trimmed(&path).map_err(|err| EvalError::io(path, err))
    }

    pub fn store(&self, sample_id: &str, text: &str) -> Result<PathBuf, EvalError> {
        fs::create_dir_all(&self.dir).map_err(|err| EvalError::io(&self.dir, err))?;
        let path = self.dir.join(format!("{sample_id}.{}", CACHE_EXTENSIONS[0]));
        fs::write(&path, format!("{text}\n")).map_err(|err| EvalError::io(&path, err))?;
        Ok(path)
    }
}

enum Mode {
    Mock,
    Live(Box<dyn ContentPipeline>),
}

/// Produces one candidate blog post per sample, from cache or live.
pub struct GenerationAdapter {
    cache: OutputCache,
    mode: Mode,
}

impl GenerationAdapter {
    pub fn mock(cache: OutputCache) -> Self {
        Self {
            cache,
            mode: Mode::Mock,
        }
    }

    pub fn live(cache: OutputCache, pipeline: Box<dyn ContentPipeline>) -> Self {
        Self {
            cache,
            mode: Mode::Live(pipeline),
        }
    }

    pub fn cache(&self) -> &OutputCache {
        &self.cache
    }

    pub fn source(&self) -> GenerationSource {
        match self.mode {
            Mode::Mock => GenerationSource::Mock,
            Mode::Live(_) => GenerationSource::Live,
        }
    }

    pub fn generate(
        &self,
        sample: &EvaluationSample,
        transcript: Option<&str>,
    ) -> Result<GenerationResult, EvalError> {
        if !is_valid_sample_id(&sample.id) {
            return Err(EvalError::validation(
                &sample.id,
                "id cannot be used as a cache file name",
            ));
        }

        let candidate_text = match &self.mode {
            Mode::Mock => self.cache.load(&sample.id)?,
            Mode::Live(pipeline) => {
                let request = BlogRequest {
                    sample_id: &sample.id,
                    video_url: &sample.video_url,
                    transcript: transcript.filter(|text| !text.trim().is_empty()),
                    tone: sample.tone(),
                };
                let text = pipeline
                    .generate(&request)
                    .map_err(|source| EvalError::Generation {
                        sample_id: sample.id.clone(),
                        source,
                    })?;
                let text = text.trim().to_string();
                if !text.is_empty() {
                    let path = self.cache.store(&sample.id, &text)?;
                    info!(sample_id = %sample.id, path = %path.display(), "cached live output");
                }
                text
            }
        };

        if candidate_text.is_empty() {
            return Err(EvalError::validation(&sample.id, "generated output is empty"));
        }

        Ok(GenerationResult {
            sample_id: sample.id.clone(),
            candidate_text,
            source: self.source(),
        })
    }
}
