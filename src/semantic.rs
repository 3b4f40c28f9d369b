//! Offline hashed embeddings.
//!
//! Each word and adjacent-word bigram is hashed into a fixed number of
//! signed buckets and the vector is L2-normalized. Not a language model;
//! deterministic and offline.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::metrics::text::tokenize;

pub const LOCAL_HASH_MODEL: &str = "local-hash-v1";
pub const LOCAL_EMBEDDING_DIM: usize = 384;

pub fn embed_text_local(text: &str, dimensions: usize) -> Vec<f32> {
    let dims = dimensions.max(8);
    let mut vector = vec![0_f32; dims];

    for feature in hashed_features(text) {
        let hash = stable_hash(&feature);
        let index = (hash as usize) % dims;
        let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
        let weight = 1.0 + (((hash >> 48) & 0xFF) as f32 / 255.0);
        vector[index] += sign * weight;
    }

    normalize_vector(&mut vector);
    vector
}

/// Cosine similarity; zero for mismatched or degenerate vectors.
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f64 {
    if left.len() != right.len() || left.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut left_norm = 0.0_f64;
    let mut right_norm = 0.0_f64;
    for (left_value, right_value) in left.iter().zip(right.iter()) {
        let (l, r) = (f64::from(*left_value), f64::from(*right_value));
        dot += l * r;
        left_norm += l * l;
        right_norm += r * r;
    }

    if left_norm <= 0.0 || right_norm <= 0.0 {
        return 0.0;
    }
    dot / (left_norm.sqrt() * right_norm.sqrt())
}

fn stable_hash(value: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn hashed_features(text: &str) -> Vec<String> {
    let words = tokenize(text);

    let mut features = Vec::<String>::with_capacity(words.len() * 2);
    for (index, word) in words.iter().enumerate() {
        features.push(format!("w:{word}"));
        if let Some(next) = words.get(index + 1) {
            features.push(format!("b:{word}_{next}"));
        }
    }
    features
}

fn normalize_vector(values: &mut [f32]) {
    let squared_norm = values
        .iter()
        .map(|value| f64::from(*value) * f64::from(*value))
        .sum::<f64>();

    if squared_norm <= 0.0 {
        return;
    }

    let norm = squared_norm.sqrt() as f32;
    for value in values {
        *value /= norm;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_has_unit_similarity() {
        let left = embed_text_local("Watercolor thank you card", LOCAL_EMBEDDING_DIM);
        let right = embed_text_local("watercolor THANK-YOU card!", LOCAL_EMBEDDING_DIM);
        assert!((cosine_similarity(&left, &right) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn empty_text_embeds_to_zero_vector() {
        let vector = embed_text_local("  ...  ", 16);
        assert_eq!(vector.len(), 16);
        assert!(vector.iter().all(|value| *value == 0.0));
        assert_eq!(cosine_similarity(&vector, &vector), 0.0);
    }

    #[test]
    fn related_text_scores_higher_than_unrelated() {
        let anchor = embed_text_local("emboss the card with gold powder", LOCAL_EMBEDDING_DIM);
        let related = embed_text_local("gold powder emboss on the card front", LOCAL_EMBEDDING_DIM);
        let unrelated = embed_text_local("quarterly revenue grew in europe", LOCAL_EMBEDDING_DIM);
        assert!(cosine_similarity(&anchor, &related) > cosine_similarity(&anchor, &unrelated));
    }
}
