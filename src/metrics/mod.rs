pub mod bert;
pub mod keywords;
pub mod rouge;
pub mod structure;
pub mod text;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::EvalError;
use crate::model::{BertCapabilityReport, CapabilityReport, MetricScore, OmittedMetric};
use crate::semantic::LOCAL_HASH_MODEL;

use self::bert::{EmbeddingBackend, LocalHashEmbeddings, RemoteEmbeddings, score_bert};
use self::keywords::keyword_recall;
use self::rouge::{RougeMode, score_rouge};
use self::structure::{StructurePatterns, WordBand, structural_scores, word_count};

#[derive(Debug, Clone)]
pub struct MetricOptions {
    pub skip_bert_score: bool,
    pub bert_model: String,
    pub keyword_top_n: usize,
    pub word_band: WordBand,
}

pub enum BertCapability {
    Enabled(Box<dyn EmbeddingBackend>),
    Disabled { reason: String },
}

/// Which optional scorers this run can use, decided once before scoring.
pub struct Capabilities {
    pub rouge: RougeMode,
    pub bert: BertCapability,
}

impl Capabilities {
    pub fn resolve(options: &MetricOptions, settings: &Settings) -> Self {
        let rouge = RougeMode::detect();
        if rouge == RougeMode::Approximate {
            warn!("exact ROUGE not compiled in; using token-overlap approximation");
        }

        let bert = match resolve_bert_backend(options, settings) {
            Ok(backend) => {
                info!(
                    backend = backend.backend(),
                    model = backend.model(),
                    "semantic scoring enabled"
                );
                BertCapability::Enabled(backend)
            }
            Err(err) => {
                let reason = match err {
                    EvalError::MetricUnavailable { reason, .. } => reason,
                    other => other.to_string(),
                };
                if !options.skip_bert_score {
                    warn!(reason = %reason, "semantic scoring disabled");
                }
                BertCapability::Disabled { reason }
            }
        };

        Self { rouge, bert }
    }

    pub fn report(&self) -> CapabilityReport {
        let bert_score = match &self.bert {
            BertCapability::Enabled(backend) => BertCapabilityReport {
                enabled: true,
                backend: Some(backend.backend().to_string()),
                model: Some(backend.model().to_string()),
                reason: None,
            },
            BertCapability::Disabled { reason } => BertCapabilityReport {
                enabled: false,
                backend: None,
                model: None,
                reason: Some(reason.clone()),
            },
        };

        CapabilityReport {
            rouge: self.rouge.as_str().to_string(),
            bert_score,
        }
    }
}

fn resolve_bert_backend(
    options: &MetricOptions,
    settings: &Settings,
) -> Result<Box<dyn EmbeddingBackend>, EvalError> {
    let unavailable = |reason: String| EvalError::MetricUnavailable {
        metric: "bert_score",
        reason,
    };

    if options.skip_bert_score {
        return Err(unavailable("disabled by --skip-bert-score".to_string()));
    }

    let model = options.bert_model.trim();
    if model.is_empty() {
        return Err(unavailable("no embedding model configured".to_string()));
    }
    if model == LOCAL_HASH_MODEL {
        return Ok(Box::new(LocalHashEmbeddings::new(model)));
    }

    let api_key = settings.openai_api_key.as_deref().ok_or_else(|| {
        unavailable(format!(
            "{} is not set; embedding model '{model}' is unreachable",
            crate::config::OPENAI_API_KEY_ENV
        ))
    })?;

    RemoteEmbeddings::new(
        &settings.openai_base_url,
        api_key,
        model,
        settings.http_timeout,
    )
    .map(|backend| Box::new(backend) as Box<dyn EmbeddingBackend>)
    .map_err(|err| unavailable(format!("{err:#}")))
}

#[derive(Debug, Default)]
pub struct ScoreSet {
    pub scores: Vec<MetricScore>,
    pub omitted: Vec<OmittedMetric>,
}

impl ScoreSet {
    fn absorb(&mut self, outcome: Result<Vec<MetricScore>, EvalError>) {
        match outcome {
            Ok(scores) => self.scores.extend(scores),
            Err(EvalError::MetricUnavailable { metric, reason }) => {
                self.omitted.push(OmittedMetric {
                    name: metric.to_string(),
                    reason,
                });
            }
            Err(other) => self.omitted.push(OmittedMetric {
                name: other.kind().to_string(),
                reason: other.to_string(),
            }),
        }
    }
}

pub struct MetricSuite {
    capabilities: Capabilities,
    patterns: StructurePatterns,
    keyword_top_n: usize,
    word_band: WordBand,
}

impl MetricSuite {
    pub fn new(capabilities: Capabilities, options: &MetricOptions) -> Result<Self> {
        Ok(Self {
            capabilities,
            patterns: StructurePatterns::compile()?,
            keyword_top_n: options.keyword_top_n.max(1),
            word_band: options.word_band,
        })
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Runs every enabled metric; ones that cannot run are listed as
    /// omitted rather than scored as zero.
    pub fn score(&self, candidate: &str, reference: &str) -> ScoreSet {
        let mut set = ScoreSet::default();

        set.absorb(score_rouge(self.capabilities.rouge, candidate, reference));

        if let BertCapability::Enabled(backend) = &self.capabilities.bert {
            set.absorb(score_bert(backend.as_ref(), candidate, reference));
        }

        set.absorb(keyword_recall(candidate, reference, self.keyword_top_n).map(|score| vec![score]));

        set.scores
            .extend(structural_scores(&self.patterns, candidate, self.word_band));

        let reference_words = word_count(reference);
        if reference_words > 0 {
            set.scores.push(MetricScore::new(
                "word_count_reference",
                reference_words as f64,
            ));
        } else {
            set.omitted.push(OmittedMetric {
                name: "word_count_reference".to_string(),
                reason: "reference has no words".to_string(),
            });
        }

        set
    }
}
