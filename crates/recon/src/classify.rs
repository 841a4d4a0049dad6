use plancheck_core::normalize;

use crate::model::Classification;

/// Classify a submitted text against its nearest reference text.
///
/// Exactness is decided on normalized text alone, independent of the
/// embedding score. Otherwise `similarity >= threshold` is a partial match.
pub fn classify(submitted: &str, reference: &str, similarity: f32, threshold: f32) -> Classification {
    if normalize(submitted) == normalize(reference) {
        Classification::Exact
    } else if similarity >= threshold {
        Classification::Partial
    } else {
        Classification::NoMatch
    }
}

/// Map a raw cosine score into 0..=1. NaN becomes 0.
pub fn clamp_similarity(raw: f32) -> f32 {
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn exact_ignores_case_and_accents() {
        let c = classify("mejorar la gestion institucional", "Mejorar la Gestión Institucional", 0.2, 0.75);
        assert_eq!(c, Classification::Exact);
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(classify("a b", "a c", 0.75, 0.75), Classification::Partial);
        assert_eq!(classify("a b", "a c", 0.7499, 0.75), Classification::NoMatch);
    }

    #[test]
    fn clamp() {
        assert_eq!(clamp_similarity(f32::NAN), 0.0);
        assert_eq!(clamp_similarity(-0.3), 0.0);
        assert_eq!(clamp_similarity(1.0000001), 1.0);
        assert_eq!(clamp_similarity(0.42), 0.42);
    }

    proptest! {
        #[test]
        fn classification_respects_threshold(
            sub in "[a-z ]{0,12}",
            refr in "[a-z ]{0,12}",
            sim in 0.0f32..=1.0,
            threshold in 0.0f32..=1.0,
        ) {
            let c = classify(&sub, &refr, sim, threshold);
            let same = normalize(&sub) == normalize(&refr);
            match c {
                Classification::Exact => prop_assert!(same),
                Classification::Partial => prop_assert!(!same && sim >= threshold),
                Classification::NoMatch => prop_assert!(!same && sim < threshold),
            }
        }
    }
}
