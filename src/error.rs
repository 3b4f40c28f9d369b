use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures attributable to a single dataset record or metric.
///
/// Everything here is recoverable at the sample boundary; fatal setup
/// problems travel as `anyhow::Error` instead.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("invalid sample '{sample_id}': {reason}")]
    Validation { sample_id: String, reason: String },

    #[error("no cached output for sample '{sample_id}' in {}; run in live mode first", dir.display())]
    MissingCache { sample_id: String, dir: PathBuf },

    #[error("generation failed for sample '{sample_id}'")]
    Generation {
        sample_id: String,
        #[source]
        source: GenerationError,
    },

    #[error("metric {metric} unavailable: {reason}")]
    MetricUnavailable { metric: &'static str, reason: String },

    #[error("i/o error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EvalError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::MissingCache { .. } => "missing_cache",
            Self::Generation { .. } => "generation_error",
            Self::MetricUnavailable { .. } => "metric_unavailable",
            Self::Io { .. } => "io_error",
        }
    }

    pub fn validation(sample_id: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            sample_id: sample_id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Upstream content-pipeline failures.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("transcript unavailable: {0}")]
    TranscriptUnavailable(String),

    #[error("transcription command failed: {0}")]
    Transcription(String),

    #[error("request to {endpoint} failed")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned status {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("malformed response from {endpoint}: {message}")]
    MalformedResponse { endpoint: String, message: String },

    #[error("model returned an empty completion")]
    EmptyCompletion,
}

impl GenerationError {
    /// Transient failures worth another attempt: timeouts, connection
    /// problems, rate limiting and server-side errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { source, .. } => source.is_timeout() || source.is_connect(),
            Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}

/// Renders an error and its source chain on one line for reports.
pub fn error_chain_message(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
