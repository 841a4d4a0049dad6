//! Nearest-neighbour matching of submitted elements against the catalog.

use plancheck_core::normalize;
use rayon::prelude::*;
use tracing::debug;

use crate::classify::{classify, clamp_similarity};
use crate::diff::DiffStrategy;
use crate::embedding::{cosine_similarity, Embedder};
use crate::error::{EmbeddingError, ReconError};
use crate::model::{CanonicalRecord, MatchResult};

/// Index and raw cosine score of the most similar reference vector.
///
/// Ties keep the lowest index; NaN scores never win. `None` only for an
/// empty reference set.
pub fn nearest(query: &[f32], references: &[Vec<f32>]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, candidate) in references.iter().enumerate() {
        let raw = cosine_similarity(query, candidate);
        let score = if raw.is_nan() { f32::NEG_INFINITY } else { raw };
        match best {
            Some((_, s)) if score <= s => {}
            _ => best = Some((idx, score)),
        }
    }
    best
}

pub struct Matcher<'a> {
    embedder: &'a dyn Embedder,
    diff: &'a dyn DiffStrategy,
    threshold: f32,
}

impl<'a> Matcher<'a> {
    pub fn new(embedder: &'a dyn Embedder, diff: &'a dyn DiffStrategy, threshold: f32) -> Self {
        Self { embedder, diff, threshold }
    }

    /// One result per submitted record, in submitted order.
    ///
    /// Both lists are embedded once, as whole batches. An empty list on
    /// either side yields no results and makes no embedding calls.
    pub fn match_records(
        &self,
        reference: &[CanonicalRecord],
        submitted: &[CanonicalRecord],
    ) -> Result<Vec<MatchResult>, ReconError> {
        if reference.is_empty() || submitted.is_empty() {
            return Ok(Vec::new());
        }

        let ref_vectors = self.encode(reference)?;
        let sub_vectors = self.encode(submitted)?;
        let dims = ref_vectors[0].len();
        if let Some(bad) = sub_vectors.iter().find(|v| v.len() != dims) {
            return Err(EmbeddingError::DimensionMismatch { expected: dims, got: bad.len() }.into());
        }

        debug!(
            reference = reference.len(),
            submitted = submitted.len(),
            dims,
            embedder = %self.embedder.name(),
            "matching"
        );

        let results = submitted
            .par_iter()
            .zip(sub_vectors.par_iter())
            .map(|(record, vector)| {
                // reference is non-empty, so nearest always finds a candidate
                let (idx, raw) = nearest(vector, &ref_vectors).unwrap_or((0, 0.0));
                let matched = &reference[idx];
                let similarity = clamp_similarity(raw);
                MatchResult {
                    submitted_code: record.code().to_string(),
                    submitted_text: record.text().to_string(),
                    matched_reference_code: matched.code().to_string(),
                    matched_reference_text: matched.text().to_string(),
                    matched_reference_index: idx,
                    similarity,
                    classification: classify(record.text(), matched.text(), similarity, self.threshold),
                    diff_summary: self.diff.diff(matched.text(), record.text()),
                }
            })
            .collect();

        Ok(results)
    }

    fn encode(&self, records: &[CanonicalRecord]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let texts: Vec<String> = records.iter().map(|r| normalize(r.text())).collect();
        let vectors = self.embedder.encode(&texts)?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch { expected: texts.len(), got: vectors.len() });
        }
        let dims = vectors.first().map_or(0, Vec::len);
        if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
            return Err(EmbeddingError::DimensionMismatch { expected: dims, got: bad.len() });
        }
        Ok(vectors)
    }
}
