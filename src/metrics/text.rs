//! Tokenization shared by every lexical metric.
//!
//! A token is a maximal run of Unicode alphanumeric characters, lowercased.
//! Everything else (whitespace, punctuation, markdown syntax) separates
//! tokens. There is no stemming. Content tokens additionally drop
//! [`STOPWORDS`].

use std::collections::HashSet;

use unicode_segmentation::UnicodeSegmentation;

pub const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "are", "as", "at", "be", "because",
    "been", "but", "by", "can", "could", "do", "for", "from", "had", "has", "have", "here",
    "how", "i", "if", "in", "into", "is", "it", "its", "just", "like", "more", "my", "not",
    "of", "on", "or", "our", "so", "some", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "to", "very", "was", "we", "were", "what",
    "when", "which", "will", "with", "would", "you", "your",
];

pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|character: char| !character.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

pub fn content_tokens(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|token| !is_stopword(token))
        .collect()
}

pub fn unique_content_tokens(text: &str) -> HashSet<String> {
    content_tokens(text).into_iter().collect()
}

/// Splits prose into UAX #29 sentences, line by line.
///
/// Each line is segmented on its own so markdown headings and list items
/// never merge with the paragraph that follows. Heading markers and bullets
/// stay in the sentence text; they tokenize away downstream.
pub fn split_sentences(text: &str) -> Vec<String> {
    text.lines()
        .flat_map(|line| line.unicode_sentences())
        .map(str::trim)
        .filter(|sentence| sentence.chars().any(char::is_alphanumeric))
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_lowercases_and_splits_on_punctuation() {
        assert_eq!(
            tokenize("## Quilling 101: Paper-Strips, GLUE!"),
            vec!["quilling", "101", "paper", "strips", "glue"]
        );
    }

    #[test]
    fn content_tokens_drop_stopwords() {
        assert_eq!(
            content_tokens("Use baking soda and vinegar for cleaning"),
            vec!["use", "baking", "soda", "vinegar", "cleaning"]
        );
    }

    #[test]
    fn split_sentences_keeps_lines_apart_and_drops_empty_fragments() {
        let sentences = split_sentences("# Intro\n\nFold the card. Add glitter!\n- Done?\n...");
        assert_eq!(
            sentences,
            vec!["# Intro", "Fold the card.", "Add glitter!", "- Done?"]
        );
    }

    #[test]
    fn split_sentences_does_not_break_decimals_or_abbreviations() {
        assert_eq!(
            split_sentences("Cut a 3.5 inch strip, e.g. from cardstock."),
            vec!["Cut a 3.5 inch strip, e.g. from cardstock."]
        );
    }
}
