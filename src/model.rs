use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const REPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSample {
    pub id: String,
    #[serde(alias = "video_title")]
    pub title: String,
    pub video_url: String,
    pub transcript_path: String,
    #[serde(alias = "reference_blog_path")]
    pub reference_path: String,
    #[serde(default = "default_tone")]
    pub tone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Ids double as cache file stems, so they stay within a safe alphabet.
pub fn is_valid_sample_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn default_tone() -> String {
    Tone::Professional.as_str().to_string()
}

impl EvaluationSample {
    pub fn tone(&self) -> Tone {
        Tone::parse(&self.tone)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Tone {
    Professional,
    Casual,
    Educational,
    Persuasive,
}

impl Tone {
    /// Unknown labels fall back to `Professional`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "casual" => Self::Casual,
            "educational" => Self::Educational,
            "persuasive" => Self::Persuasive,
            _ => Self::Professional,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Casual => "casual",
            Self::Educational => "educational",
            Self::Persuasive => "persuasive",
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            Self::Professional => "Write in a professional, business-appropriate tone.",
            Self::Casual => "Write in a casual, conversational tone.",
            Self::Educational => {
                "Write in an informative, educational tone suitable for teaching."
            }
            Self::Persuasive => {
                "Write in a persuasive, compelling tone that convinces the reader."
            }
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationSource {
    Mock,
    Live,
}

#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub sample_id: String,
    pub candidate_text: String,
    pub source: GenerationSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl MetricScore {
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmittedMetric {
    pub name: String,
    pub reason: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleStatus {
    Scored,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleFailure {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleReport {
    pub sample_id: String,
    pub status: SampleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<GenerationSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_sha256: Option<String>,
    pub scores: Vec<MetricScore>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omitted: Vec<OmittedMetric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<SampleFailure>,
}

impl SampleReport {
    pub fn failed(sample_id: &str, kind: &str, message: String) -> Self {
        Self {
            sample_id: sample_id.to_string(),
            status: SampleStatus::Failed,
            source: None,
            candidate_text: None,
            candidate_sha256: None,
            scores: Vec::new(),
            omitted: Vec::new(),
            error: Some(SampleFailure {
                kind: kind.to_string(),
                message,
            }),
        }
    }

    pub fn score(&self, name: &str) -> Option<f64> {
        self.scores
            .iter()
            .find(|score| score.name == name)
            .map(|score| score.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAggregate {
    pub mean: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BertCapabilityReport {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityReport {
    pub rouge: String,
    pub bert_score: BertCapabilityReport,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub scored: usize,
    pub failed: usize,
    pub failed_sample_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub report_version: u32,
    pub generated_at: String,
    pub timestamp: String,
    pub mode: String,
    pub dataset_path: String,
    pub dataset_sha256: String,
    pub generated_dir: String,
    pub capabilities: CapabilityReport,
    pub samples: Vec<SampleReport>,
    pub aggregates: BTreeMap<String, MetricAggregate>,
    pub summary: RunSummary,
}
