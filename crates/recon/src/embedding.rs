//! Embedding capability: text in, fixed-length vector out.
//!
//! The engine only needs `encode` (batched, order-preserving) and cosine
//! similarity. Two providers ship: a local feature-hashing embedder that
//! needs no model files, and an HTTP client for OpenAI-compatible
//! embedding servers (see `http_embedder`).

use rayon::prelude::*;

use crate::config::{EmbeddingConfig, EmbeddingProvider};
use crate::error::{EmbeddingError, ReconError};
use crate::http_embedder::HttpEmbedder;

pub trait Embedder: Send + Sync {
    /// Identifier recorded in report metadata.
    fn name(&self) -> String;

    /// One vector per input text, in input order. Identical texts must
    /// produce identical vectors.
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Cosine similarity in [-1, 1]. Zero for empty, mismatched, or zero-norm vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    (dot / denom).clamp(-1.0, 1.0)
}

/// Build the provider named in config.
pub fn from_config(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>, ReconError> {
    match config.provider {
        EmbeddingProvider::Hashing => Ok(Box::new(HashingEmbedder::new(config.dimensions))),
        EmbeddingProvider::Http => Ok(Box::new(HttpEmbedder::from_config(config)?)),
    }
}

// ---------------------------------------------------------------------------
// Hashing embedder
// ---------------------------------------------------------------------------

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Signed feature hashing of words and boundary-marked character trigrams.
///
/// Surface-level only: texts sharing vocabulary score high, paraphrases with
/// disjoint wording do not. Deterministic across runs and platforms.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.max(1) }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimensions];

        for word in text.split_whitespace() {
            self.add_feature(&mut v, "w", word, WORD_WEIGHT);

            let marked: Vec<char> = format!("<{word}>").chars().collect();
            for gram in marked.windows(3) {
                let gram: String = gram.iter().collect();
                self.add_feature(&mut v, "t", &gram, TRIGRAM_WEIGHT);
            }
        }

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }

    fn add_feature(&self, v: &mut [f32], kind: &str, feature: &str, weight: f32) {
        let mut hasher = blake3::Hasher::new();
        hasher.update(kind.as_bytes());
        hasher.update(b":");
        hasher.update(feature.as_bytes());
        let digest = hasher.finalize();
        let bytes = digest.as_bytes();

        let mut idx = [0u8; 8];
        idx.copy_from_slice(&bytes[..8]);
        let slot = (u64::from_le_bytes(idx) % self.dimensions as u64) as usize;
        let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
        v[slot] += sign * weight;
    }
}

impl Embedder for HashingEmbedder {
    fn name(&self) -> String {
        format!("hashing-{}", self.dimensions)
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.par_iter().map(|t| self.embed_one(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(e: &HashingEmbedder, texts: &[&str]) -> Vec<Vec<f32>> {
        let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        e.encode(&owned).unwrap()
    }

    #[test]
    fn cosine_edges() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn vectors_are_unit_length_and_deterministic() {
        let e = HashingEmbedder::new(256);
        let a = encode(&e, &["mejorar la gestion institucional", "mejorar la gestion institucional"]);
        assert_eq!(a[0].len(), 256);
        assert_eq!(a[0], a[1]);
        let norm: f32 = a[0].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let e = HashingEmbedder::new(64);
        let v = encode(&e, &[""]);
        assert!(v[0].iter().all(|x| *x == 0.0));
    }

    #[test]
    fn shared_wording_scores_higher() {
        let e = HashingEmbedder::new(1024);
        let v = encode(
            &e,
            &[
                "mejorar la gestion institucional",
                "mejorar la gestion publica institucional",
                "construir infraestructura vial",
            ],
        );
        let close = cosine_similarity(&v[0], &v[1]);
        let far = cosine_similarity(&v[0], &v[2]);
        assert!(close > 0.8 && close < 1.0, "close = {close}");
        assert!(far < 0.4, "far = {far}");
    }

    #[test]
    fn order_preserved_in_batches() {
        let e = HashingEmbedder::new(128);
        let texts: Vec<String> = (0..200).map(|i| format!("objetivo {i}")).collect();
        let batch = e.encode(&texts).unwrap();
        for (i, text) in texts.iter().enumerate().step_by(37) {
            assert_eq!(batch[i], e.embed_one(text));
        }
    }

    #[test]
    fn provider_from_config() {
        let embedder = from_config(&EmbeddingConfig::default()).unwrap();
        assert_eq!(embedder.name(), "hashing-1024");
    }
}
