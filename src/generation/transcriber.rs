use std::process::Command;

use anyhow::{Result, bail};
use tracing::info;

use crate::error::GenerationError;

/// Speech-to-text delegated to an external program.
///
/// The configured command line is split with shell quoting rules and run
/// with the video URL appended as the final argument; the transcript is
/// whatever the program prints on stdout.
#[derive(Debug, Clone)]
pub struct ExternalTranscriber {
    program: String,
    args: Vec<String>,
}

impl ExternalTranscriber {
    pub fn from_command_line(command_line: &str) -> Result<Self> {
        let Some(parts) = shlex::split(command_line) else {
            bail!("transcription command has unbalanced quoting: {command_line}");
        };
        let mut parts = parts.into_iter();
        let Some(program) = parts.next() else {
            bail!("transcription command is empty");
        };

        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn is_available(&self) -> bool {
        Command::new(&self.program).arg("--version").output().is_ok()
    }

    pub fn transcribe(&self, video_url: &str) -> Result<String, GenerationError> {
        info!(program = %self.program, url = %video_url, "transcribing video");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(video_url)
            .output()
            .map_err(|err| {
                GenerationError::Transcription(format!("failed to execute {}: {err}", self.program))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GenerationError::Transcription(format!(
                "{} returned non-zero exit status for {}: {}",
                self.program,
                video_url,
                stderr.trim()
            )));
        }

        let transcript = String::from_utf8_lossy(&output.stdout)
            .replace('\u{0000}', "")
            .trim()
            .to_string();
        if transcript.is_empty() {
            return Err(GenerationError::Transcription(format!(
                "{} produced an empty transcript for {}",
                self.program, video_url
            )));
        }

        Ok(transcript)
    }
}
