use anyhow::{Result, bail};
use tracing::{info, warn};

use super::openai::OpenAiBlogWriter;
use super::transcriber::ExternalTranscriber;
use super::{BlogRequest, ContentPipeline};
use crate::config::{Settings, TRANSCRIBE_CMD_ENV};
use crate::error::GenerationError;

/// Transcript (given or derived) → blog post.
pub struct BlogPipeline {
    transcriber: Option<ExternalTranscriber>,
    writer: OpenAiBlogWriter,
}

impl BlogPipeline {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let writer = OpenAiBlogWriter::from_settings(settings)?;

        let transcriber = match settings.transcribe_command.as_deref() {
            Some(command_line) => {
                let transcriber = ExternalTranscriber::from_command_line(command_line)?;
                if !transcriber.is_available() {
                    bail!(
                        "{TRANSCRIBE_CMD_ENV} points at '{}', which could not be executed",
                        transcriber.program()
                    );
                }
                info!(program = %transcriber.program(), "transcription command available");
                Some(transcriber)
            }
            None => {
                warn!(
                    "{TRANSCRIBE_CMD_ENV} not set; samples without a transcript will fail in live mode"
                );
                None
            }
        };

        Ok(Self {
            transcriber,
            writer,
        })
    }
}

impl ContentPipeline for BlogPipeline {
    fn generate(&self, request: &BlogRequest<'_>) -> Result<String, GenerationError> {
        let derived;
        let transcript = match request.transcript {
            Some(transcript) => transcript,
            None => {
                let transcriber = self.transcriber.as_ref().ok_or_else(|| {
                    GenerationError::TranscriptUnavailable(format!(
                        "no transcript for {} and {TRANSCRIBE_CMD_ENV} is not configured",
                        request.video_url
                    ))
                })?;
                derived = transcriber.transcribe(request.video_url)?;
                derived.as_str()
            }
        };

        info!(
            sample_id = %request.sample_id,
            tone = %request.tone,
            transcript_words = transcript.split_whitespace().count(),
            "requesting blog post"
        );
        self.writer.write_blog(transcript, request.tone)
    }
}
