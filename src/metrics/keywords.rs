use std::collections::{HashMap, HashSet};

use super::text::{content_tokens, tokenize};
use crate::error::EvalError;
use crate::model::MetricScore;
use crate::util::round4;

pub const DEFAULT_KEYWORD_TOP_N: usize = 20;
pub const MIN_KEYWORD_CHARS: usize = 4;

/// Most frequent content tokens of the reference, ties broken by first
/// occurrence.
pub fn extract_keywords(reference: &str, top_n: usize) -> Vec<String> {
    let mut stats: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, token) in content_tokens(reference).into_iter().enumerate() {
        if token.chars().count() < MIN_KEYWORD_CHARS {
            continue;
        }
        let entry = stats.entry(token).or_insert((0, position));
        entry.0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = stats
        .into_iter()
        .map(|(token, (count, first_seen))| (token, count, first_seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(top_n)
        .map(|(token, _, _)| token)
        .collect()
}

pub fn keyword_recall(
    candidate: &str,
    reference: &str,
    top_n: usize,
) -> Result<MetricScore, EvalError> {
    let keywords = extract_keywords(reference, top_n);
    if keywords.is_empty() {
        return Err(EvalError::MetricUnavailable {
            metric: "keyword_recall",
            reason: "reference yields no keywords".to_string(),
        });
    }

    let candidate_tokens: HashSet<String> = tokenize(candidate).into_iter().collect();
    let matched = keywords
        .iter()
        .filter(|keyword| candidate_tokens.contains(keyword.as_str()))
        .count();

    Ok(MetricScore::new(
        "keyword_recall",
        round4(matched as f64 / keywords.len() as f64),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_recall_is_partial_not_binary() {
        let reference = "Use baking soda and vinegar for cleaning";
        let candidate = "Sprinkle some baking soda on the stain.";

        assert_eq!(
            extract_keywords(reference, DEFAULT_KEYWORD_TOP_N),
            vec!["baking", "soda", "vinegar", "cleaning"]
        );
        let score = keyword_recall(candidate, reference, DEFAULT_KEYWORD_TOP_N).expect("score");
        assert_eq!(score.value, 0.5);
    }

    #[test]
    fn keywords_rank_by_frequency_then_position() {
        let reference = "Ribbon loops. Glitter glue. Ribbon bows and more ribbon, plus glitter.";
        assert_eq!(extract_keywords(reference, 2), vec!["ribbon", "glitter"]);
    }

    #[test]
    fn reference_without_keywords_is_unavailable() {
        let error = keyword_recall("anything", "a cat is on it", 10).expect_err("no keywords");
        assert!(matches!(
            error,
            EvalError::MetricUnavailable {
                metric: "keyword_recall",
                ..
            }
        ));
    }
}
