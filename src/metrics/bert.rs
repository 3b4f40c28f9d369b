//! BERTScore-style semantic similarity.
//!
//! Candidate and reference are split into sentences, every sentence is
//! embedded, and each side is greedily matched against the other:
//! precision averages each candidate sentence's best cosine similarity to
//! any reference sentence, recall does the reverse, F1 is their harmonic
//! mean. Similarities are clamped to [0, 1].

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::rouge::harmonic_mean;
use super::text::split_sentences;
use crate::error::EvalError;
use crate::model::MetricScore;
use crate::semantic::{LOCAL_EMBEDDING_DIM, cosine_similarity, embed_text_local};
use crate::util::round4;

pub trait EmbeddingBackend {
    fn backend(&self) -> &'static str;
    fn model(&self) -> &str;
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EvalError>;
}

#[derive(Debug, Clone)]
pub struct LocalHashEmbeddings {
    model: String,
    dimensions: usize,
}

impl LocalHashEmbeddings {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            dimensions: LOCAL_EMBEDDING_DIM,
        }
    }
}

impl EmbeddingBackend for LocalHashEmbeddings {
    fn backend(&self) -> &'static str {
        "local-hash"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EvalError> {
        Ok(texts
            .iter()
            .map(|text| embed_text_local(text, self.dimensions))
            .collect())
    }
}

/// OpenAI-compatible `/embeddings` endpoint.
pub struct RemoteEmbeddings {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

impl RemoteEmbeddings {
    pub fn new(base_url: &str, api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build embeddings client")?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    fn unavailable(&self, reason: String) -> EvalError {
        EvalError::MetricUnavailable {
            metric: "bert_score",
            reason: format!("{} ({})", reason, self.endpoint),
        }
    }
}

impl EmbeddingBackend for RemoteEmbeddings {
    fn backend(&self) -> &'static str {
        "remote"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EvalError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .map_err(|err| self.unavailable(format!("embedding request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.unavailable(format!("embedding endpoint returned {status}")));
        }

        let mut body: EmbeddingResponse = response
            .json()
            .map_err(|err| self.unavailable(format!("malformed embedding response: {err}")))?;
        if body.data.len() != texts.len() {
            return Err(self.unavailable(format!(
                "expected {} embeddings, received {}",
                texts.len(),
                body.data.len()
            )));
        }

        body.data.sort_by_key(|datum| datum.index);
        Ok(body.data.into_iter().map(|datum| datum.embedding).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BertScore {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

pub fn compute_bert_score(
    backend: &dyn EmbeddingBackend,
    candidate: &str,
    reference: &str,
) -> Result<BertScore, EvalError> {
    let candidate_sentences = split_sentences(candidate);
    let reference_sentences = split_sentences(reference);
    if candidate_sentences.is_empty() || reference_sentences.is_empty() {
        return Err(EvalError::MetricUnavailable {
            metric: "bert_score",
            reason: "candidate or reference has no sentences".to_string(),
        });
    }

    let mut inputs = candidate_sentences;
    let split_at = inputs.len();
    inputs.extend(reference_sentences);

    let embeddings = backend.embed(&inputs)?;
    let (candidate_vectors, reference_vectors) = embeddings.split_at(split_at);

    let precision = mean_best_match(candidate_vectors, reference_vectors);
    let recall = mean_best_match(reference_vectors, candidate_vectors);

    Ok(BertScore {
        precision,
        recall,
        f1: harmonic_mean(precision, recall),
    })
}

pub fn score_bert(
    backend: &dyn EmbeddingBackend,
    candidate: &str,
    reference: &str,
) -> Result<Vec<MetricScore>, EvalError> {
    let score = compute_bert_score(backend, candidate, reference)?;
    let notes = format!("{}:{}", backend.backend(), backend.model());

    Ok(vec![
        MetricScore::new("bert_precision", round4(score.precision)).with_notes(notes.clone()),
        MetricScore::new("bert_recall", round4(score.recall)).with_notes(notes.clone()),
        MetricScore::new("bert_f1", round4(score.f1)).with_notes(notes),
    ])
}

fn mean_best_match(from: &[Vec<f32>], to: &[Vec<f32>]) -> f64 {
    if from.is_empty() {
        return 0.0;
    }

    let total: f64 = from
        .iter()
        .map(|vector| {
            to.iter()
                .map(|other| cosine_similarity(vector, other).clamp(0.0, 1.0))
                .fold(0.0, f64::max)
        })
        .sum();
    total / from.len() as f64
}
