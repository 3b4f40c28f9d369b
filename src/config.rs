use std::time::Duration;

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL_ENV: &str = "OPENAI_BASE_URL";
pub const CHAT_MODEL_ENV: &str = "TUBE2BLOG_CHAT_MODEL";
pub const HTTP_TIMEOUT_ENV: &str = "TUBE2BLOG_HTTP_TIMEOUT_SECS";
pub const TRANSCRIBE_CMD_ENV: &str = "TUBE2BLOG_TRANSCRIBE_CMD";
pub const MAX_TRANSCRIPT_WORDS_ENV: &str = "TUBE2BLOG_MAX_TRANSCRIPT_WORDS";

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 120;
/// Roughly 3000 model tokens of English transcript.
pub const DEFAULT_MAX_TRANSCRIPT_WORDS: usize = 2250;

/// Process-level settings for the upstream collaborators.
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub chat_model: String,
    pub http_timeout: Duration,
    pub transcribe_command: Option<String>,
    pub max_transcript_words: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            transcribe_command: None,
            max_transcript_words: DEFAULT_MAX_TRANSCRIPT_WORDS,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        Self {
            openai_api_key: non_empty(OPENAI_API_KEY_ENV),
            openai_base_url: non_empty(OPENAI_BASE_URL_ENV)
                .map(|value| value.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openai_base_url),
            chat_model: non_empty(CHAT_MODEL_ENV).unwrap_or(defaults.chat_model),
            http_timeout: non_empty(HTTP_TIMEOUT_ENV)
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            transcribe_command: non_empty(TRANSCRIBE_CMD_ENV),
            max_transcript_words: non_empty(MAX_TRANSCRIPT_WORDS_ENV)
                .and_then(|value| value.parse::<usize>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(defaults.max_transcript_words),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn lookup_overrides_and_ignores_blank_or_invalid_values() {
        let env = HashMap::from([
            (OPENAI_API_KEY_ENV, "sk-test"),
            (OPENAI_BASE_URL_ENV, "http://localhost:8080/v1/"),
            (CHAT_MODEL_ENV, "   "),
            (HTTP_TIMEOUT_ENV, "thirty"),
            (MAX_TRANSCRIPT_WORDS_ENV, "500"),
        ]);

        let settings = Settings::from_lookup(|key| env.get(key).map(|value| value.to_string()));
        assert_eq!(settings.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.openai_base_url, "http://localhost:8080/v1");
        assert_eq!(settings.chat_model, DEFAULT_CHAT_MODEL);
        assert_eq!(
            settings.http_timeout,
            Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS)
        );
        assert_eq!(settings.max_transcript_words, 500);
        assert!(settings.transcribe_command.is_none());
    }
}
