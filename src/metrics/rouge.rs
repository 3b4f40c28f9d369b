use std::collections::HashMap;

use serde::Serialize;

use super::text::{tokenize, unique_content_tokens};
use crate::error::EvalError;
use crate::model::MetricScore;
use crate::util::round4;

pub const APPROXIMATE_NOTE: &str =
    "approximate: shared unique content tokens / unique reference content tokens";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RougeMode {
    Exact,
    Approximate,
}

impl RougeMode {
    /// Exact scoring is compiled in through the `exact-rouge` feature.
    pub fn detect() -> Self {
        if cfg!(feature = "exact-rouge") {
            Self::Exact
        } else {
            Self::Approximate
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Approximate => "approximate",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RougeScores {
    pub rouge1_precision: f64,
    pub rouge1_recall: f64,
    pub rouge1_f: f64,
    pub rouge_l_precision: f64,
    pub rouge_l_recall: f64,
    pub rouge_l_f: f64,
}

pub fn score_rouge(
    mode: RougeMode,
    candidate: &str,
    reference: &str,
) -> Result<Vec<MetricScore>, EvalError> {
    match mode {
        RougeMode::Exact => {
            let scores = compute_rouge(candidate, reference)?;
            Ok(vec![
                MetricScore::new("rouge1_precision", round4(scores.rouge1_precision)),
                MetricScore::new("rouge1_recall", round4(scores.rouge1_recall)),
                MetricScore::new("rouge1_f", round4(scores.rouge1_f)),
                MetricScore::new("rougeL_precision", round4(scores.rouge_l_precision)),
                MetricScore::new("rougeL_recall", round4(scores.rouge_l_recall)),
                MetricScore::new("rougeL_f", round4(scores.rouge_l_f)),
            ])
        }
        RougeMode::Approximate => {
            let overlap = round4(token_overlap(candidate, reference)?);
            Ok(vec![
                MetricScore::new("rouge1_f", overlap).with_notes(APPROXIMATE_NOTE),
                MetricScore::new("rougeL_f", overlap).with_notes(APPROXIMATE_NOTE),
            ])
        }
    }
}

pub fn compute_rouge(candidate: &str, reference: &str) -> Result<RougeScores, EvalError> {
    let cand_tokens = tokenize(candidate);
    let ref_tokens = tokenize(reference);
    if cand_tokens.is_empty() || ref_tokens.is_empty() {
        return Err(EvalError::MetricUnavailable {
            metric: "rouge",
            reason: "candidate or reference has no tokens".to_string(),
        });
    }

    let (rouge1_precision, rouge1_recall, rouge1_f) = rouge_1(&cand_tokens, &ref_tokens);
    let (rouge_l_precision, rouge_l_recall, rouge_l_f) = rouge_l(&cand_tokens, &ref_tokens);

    Ok(RougeScores {
        rouge1_precision,
        rouge1_recall,
        rouge1_f,
        rouge_l_precision,
        rouge_l_recall,
        rouge_l_f,
    })
}

/// Fallback used when exact ROUGE is not compiled in.
pub fn token_overlap(candidate: &str, reference: &str) -> Result<f64, EvalError> {
    let reference_tokens = unique_content_tokens(reference);
    if reference_tokens.is_empty() {
        return Err(EvalError::MetricUnavailable {
            metric: "rouge",
            reason: "reference has no content tokens".to_string(),
        });
    }

    let candidate_tokens = unique_content_tokens(candidate);
    let shared = reference_tokens.intersection(&candidate_tokens).count();
    Ok(shared as f64 / reference_tokens.len() as f64)
}

fn rouge_1(candidate: &[String], reference: &[String]) -> (f64, f64, f64) {
    let mut ref_counts: HashMap<&str, usize> = HashMap::new();
    for token in reference {
        *ref_counts.entry(token.as_str()).or_default() += 1;
    }

    let mut match_count = 0usize;
    let mut cand_counts: HashMap<&str, usize> = HashMap::new();
    for token in candidate {
        let seen = cand_counts.entry(token.as_str()).or_default();
        if *seen < ref_counts.get(token.as_str()).copied().unwrap_or(0) {
            match_count += 1;
        }
        *seen += 1;
    }

    precision_recall_f(match_count, candidate.len(), reference.len())
}

fn rouge_l(candidate: &[String], reference: &[String]) -> (f64, f64, f64) {
    let lcs = longest_common_subsequence(candidate, reference);
    precision_recall_f(lcs, candidate.len(), reference.len())
}

fn precision_recall_f(matches: usize, candidate_len: usize, reference_len: usize) -> (f64, f64, f64) {
    let precision = matches as f64 / candidate_len as f64;
    let recall = matches as f64 / reference_len as f64;
    (precision, recall, harmonic_mean(precision, recall))
}

pub fn harmonic_mean(a: f64, b: f64) -> f64 {
    if a + b == 0.0 {
        0.0
    } else {
        (2.0 * a * b) / (a + b)
    }
}

/// Two-row LCS table; blog posts run to thousands of tokens.
fn longest_common_subsequence(a: &[String], b: &[String]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    for left in a {
        for (j, right) in b.iter().enumerate() {
            current[j + 1] = if left == right {
                previous[j] + 1
            } else {
                current[j].max(previous[j + 1])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
