use anyhow::{Context, Result};
use regex::Regex;

use super::text::tokenize;
use crate::model::MetricScore;

pub const CTA_PHRASES: &[&str] = &[
    "subscribe",
    "share",
    "tag",
    "join",
    "follow",
    "call to action",
    "let us know",
    "tell us",
    "comment",
];

pub const DEFAULT_MIN_WORDS: usize = 300;
pub const DEFAULT_MAX_WORDS: usize = 2000;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct WordBand {
    pub min: usize,
    pub max: usize,
}

impl Default for WordBand {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_WORDS,
            max: DEFAULT_MAX_WORDS,
        }
    }
}

impl WordBand {
    pub fn contains(self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }
}

/// Compiled once per run and shared across samples.
#[derive(Debug)]
pub struct StructurePatterns {
    heading: Regex,
    call_to_action: Regex,
}

impl StructurePatterns {
    pub fn compile() -> Result<Self> {
        let heading =
            Regex::new(r"(?m)^ {0,3}#{1,6}[ \t]+\S").context("failed to compile heading regex")?;

        let alternatives = CTA_PHRASES
            .iter()
            .map(|phrase| regex::escape(phrase).replace(' ', r"\s+"))
            .collect::<Vec<String>>()
            .join("|");
        let call_to_action = Regex::new(&format!(r"(?i)\b(?:{alternatives})"))
            .context("failed to compile call-to-action regex")?;

        Ok(Self {
            heading,
            call_to_action,
        })
    }

    pub fn heading_count(&self, text: &str) -> usize {
        self.heading.find_iter(text).count()
    }

    pub fn has_call_to_action(&self, text: &str) -> bool {
        self.call_to_action.is_match(text)
    }
}

pub fn word_count(text: &str) -> usize {
    tokenize(text).len()
}

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

/// Candidate-side signals, each reported separately.
pub fn structural_scores(
    patterns: &StructurePatterns,
    candidate: &str,
    band: WordBand,
) -> Vec<MetricScore> {
    let headings = patterns.heading_count(candidate);
    let words = word_count(candidate);

    vec![
        MetricScore::new("heading_count", headings as f64),
        MetricScore::new("has_heading", flag(headings >= 1)),
        MetricScore::new("call_to_action", flag(patterns.has_call_to_action(candidate))),
        MetricScore::new("word_count", words as f64),
        MetricScore::new("word_count_in_band", flag(band.contains(words)))
            .with_notes(format!("band {}-{} words", band.min, band.max)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> StructurePatterns {
        StructurePatterns::compile().expect("patterns should compile")
    }

    #[test]
    fn heading_count_only_matches_atx_headings() {
        let text = "# Title\n\nIntro paragraph with #hashtag.\n## Materials\n    # indented code\n###NoSpace\n";
        assert_eq!(patterns().heading_count(text), 2);
    }

    #[test]
    fn call_to_action_matches_phrases_case_insensitively() {
        let patterns = patterns();
        assert!(patterns.has_call_to_action("Let us  know what you think!"));
        assert!(patterns.has_call_to_action("Leave your comments below."));
        assert!(patterns.has_call_to_action("SUBSCRIBE for weekly ideas"));
        assert!(!patterns.has_call_to_action("A quiet ending with no ask."));
        assert!(!patterns.has_call_to_action("Use a hashtag sticker"));
    }

    #[test]
    fn structural_scores_are_reported_individually() {
        let text = "# Pop-up cards\nFold the paper twice. Share your results!";
        let band = WordBand { min: 5, max: 50 };
        let scores = structural_scores(&patterns(), text, band);

        let names: Vec<&str> = scores.iter().map(|score| score.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "heading_count",
                "has_heading",
                "call_to_action",
                "word_count",
                "word_count_in_band"
            ]
        );
        assert_eq!(scores[0].value, 1.0);
        assert_eq!(scores[1].value, 1.0);
        assert_eq!(scores[2].value, 1.0);
        assert_eq!(scores[3].value, 10.0);
        assert_eq!(scores[4].value, 1.0);
    }

    #[test]
    fn word_band_is_inclusive() {
        let band = WordBand { min: 3, max: 5 };
        assert!(band.contains(3));
        assert!(band.contains(5));
        assert!(!band.contains(6));
        assert!(!band.contains(2));
    }
}
