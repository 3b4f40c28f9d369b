use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::retry::RetryPolicy;
use crate::config::{OPENAI_API_KEY_ENV, Settings};
use crate::error::GenerationError;
use crate::model::Tone;

const SYSTEM_PROMPT: &str = "You are a professional content writer who creates engaging blog posts from video transcripts.";
const MAX_COMPLETION_TOKENS: u32 = 2000;
const TEMPERATURE: f32 = 0.7;

/// Chat-completions client that turns a transcript into a blog post.
pub struct OpenAiBlogWriter {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_transcript_words: usize,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: u64,
}

impl OpenAiBlogWriter {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings
            .openai_api_key
            .clone()
            .with_context(|| format!("{OPENAI_API_KEY_ENV} must be set for live generation"))?;

        let client = Client::builder()
            .timeout(settings.http_timeout)
            .build()
            .context("failed to build chat-completions client")?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/chat/completions",
                settings.openai_base_url.trim_end_matches('/')
            ),
            api_key,
            model: settings.chat_model.clone(),
            max_transcript_words: settings.max_transcript_words,
            retry: RetryPolicy::default(),
        })
    }

    pub fn write_blog(&self, transcript: &str, tone: Tone) -> Result<String, GenerationError> {
        let prompt = build_prompt(transcript, tone, self.max_transcript_words);
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: MAX_COMPLETION_TOKENS,
            temperature: TEMPERATURE,
        };

        self.retry
            .run("chat_completion", || self.send(&request))
    }

    fn send(&self, request: &ChatRequest<'_>) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .map_err(|source| GenerationError::Transport {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerationError::Status {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
                body: truncate_chars(body.trim(), 500),
            });
        }

        let body: ChatResponse =
            response
                .json()
                .map_err(|err| GenerationError::MalformedResponse {
                    endpoint: self.endpoint.clone(),
                    message: err.to_string(),
                })?;

        if let Some(usage) = &body.usage {
            info!(
                model = %body.model.as_deref().unwrap_or(&self.model),
                tokens_used = usage.total_tokens,
                "chat completion finished"
            );
        }

        extract_completion(body)
    }
}

fn extract_completion(body: ChatResponse) -> Result<String, GenerationError> {
    let content = body
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .unwrap_or_default();

    if content.is_empty() {
        Err(GenerationError::EmptyCompletion)
    } else {
        Ok(content)
    }
}

pub fn build_prompt(transcript: &str, tone: Tone, max_transcript_words: usize) -> String {
    let (transcript, truncated) = truncate_words(transcript, max_transcript_words);
    if truncated {
        debug!(max_words = max_transcript_words, "transcript truncated for prompt");
    }

    format!(
        "Please convert the following transcript from a YouTube video into a well-structured blog post.\n\
         {}\n\n\
         The blog post should include:\n\
         1. An engaging introduction\n\
         2. Clear sections with headings\n\
         3. Key points from the transcript\n\
         4. A conclusion that summarizes the main points\n\
         5. A call-to-action or thought-provoking question\n\n\
         Transcript:\n{}",
        tone.instruction(),
        transcript
    )
}

/// Keeps at most `max_words` whitespace-separated words.
pub fn truncate_words(text: &str, max_words: usize) -> (&str, bool) {
    let mut words = 0;
    let mut in_word = false;
    for (index, character) in text.char_indices() {
        if character.is_whitespace() {
            in_word = false;
        } else if !in_word {
            if words == max_words {
                return (text[..index].trim_end(), true);
            }
            words += 1;
            in_word = true;
        }
    }
    (text, false)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
