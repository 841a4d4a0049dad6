// Column-name resolution: raw header text -> canonical field.

use std::collections::BTreeSet;

use plancheck_core::{normalize, CanonicalField, Vocabulary};

use crate::model::{ColumnMatch, MatchMethod};

/// Resolve a header name to a canonical field.
///
/// Tries, in order: exact alias lookup, exact surface-form lookup, then the
/// best fuzzy match over the surface forms, accepted only at or above
/// `fuzzy_threshold` (0-100). Fuzzy ties keep the first-registered form.
pub fn map_to_canonical(name: &str, vocab: &Vocabulary, fuzzy_threshold: u8) -> Option<ColumnMatch> {
    let norm = normalize(name);
    if norm.is_empty() {
        return None;
    }

    if let Some(field) = vocab.alias(&norm) {
        return Some(ColumnMatch { field, score: 100, method: MatchMethod::Alias });
    }

    if let Some(field) = vocab.surface(&norm) {
        return Some(ColumnMatch { field, score: 100, method: MatchMethod::Exact });
    }

    let (field, score) = best_fuzzy(&norm, vocab)?;
    (score >= fuzzy_threshold).then_some(ColumnMatch { field, score, method: MatchMethod::Fuzzy })
}

/// Best fuzzy candidate and its 0-100 score, regardless of threshold.
pub fn best_fuzzy(normalized: &str, vocab: &Vocabulary) -> Option<(CanonicalField, u8)> {
    let mut best: Option<(CanonicalField, u8)> = None;
    for (form, field) in vocab.surface_forms() {
        let score = similarity_score(normalized, form);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((field, score));
        }
    }
    best
}

/// Normalized Levenshtein similarity scaled to 0-100.
pub fn similarity_score(a: &str, b: &str) -> u8 {
    (strsim::normalized_levenshtein(a, b) * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Resolve every name; `None` where no field is found.
pub fn map_all(names: &[String], vocab: &Vocabulary, fuzzy_threshold: u8) -> Vec<Option<ColumnMatch>> {
    names
        .iter()
        .map(|n| map_to_canonical(n, vocab, fuzzy_threshold))
        .collect()
}

/// Number of distinct canonical fields among resolutions.
pub fn distinct_fields(resolved: &[Option<ColumnMatch>]) -> usize {
    resolved
        .iter()
        .flatten()
        .map(|m| m.field)
        .collect::<BTreeSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> &'static Vocabulary {
        Vocabulary::builtin()
    }

    #[test]
    fn surface_form_maps_with_score_100_without_aliases() {
        let empty_aliases = {
            let mut v = Vocabulary::new();
            v.add_surface_form("Denominación", CanonicalField::NameText);
            v.add_surface_form("Código", CanonicalField::Code);
            v
        };
        for v in [&empty_aliases, vocab()] {
            let m = map_to_canonical("Denominación", v, 80).unwrap();
            assert_eq!(m.field, CanonicalField::NameText);
            assert_eq!(m.score, 100);
        }
    }

    #[test]
    fn alias_takes_precedence() {
        let m = map_to_canonical("Cod.", vocab(), 80).unwrap();
        assert_eq!(m.field, CanonicalField::Code);
        assert_eq!(m.method, MatchMethod::Alias);
        assert_eq!(m.score, 100);
    }

    #[test]
    fn case_and_accent_insensitive_exact() {
        let m = map_to_canonical("NOMBRE DEL INDICADOR", vocab(), 80).unwrap();
        assert_eq!(m.field, CanonicalField::Indicator);
        assert_eq!(m.method, MatchMethod::Exact);
        let m = map_to_canonical("denominacion del oei / aei", vocab(), 80).unwrap();
        assert_eq!(m.field, CanonicalField::NameText);
    }

    #[test]
    fn fuzzy_accepts_near_spelling() {
        // one letter dropped
        let m = map_to_canonical("Indicadr", vocab(), 80).unwrap();
        assert_eq!(m.field, CanonicalField::Indicator);
        assert_eq!(m.method, MatchMethod::Fuzzy);
        assert!(m.score >= 80 && m.score < 100);

        let m = map_to_canonical("Objetivos Estratégicos Institucionales Código", vocab(), 80).unwrap();
        assert_eq!(m.field, CanonicalField::NameText);
    }

    #[test]
    fn fuzzy_threshold_is_respected() {
        assert!(map_to_canonical("Indicadr", vocab(), 95).is_none());
        assert!(map_to_canonical("Meta 2025", vocab(), 80).is_none());
        assert!(map_to_canonical("de OEI", vocab(), 80).is_none());
    }

    #[test]
    fn empty_names_do_not_map() {
        assert!(map_to_canonical("", vocab(), 0).is_none());
        assert!(map_to_canonical(" - ", vocab(), 0).is_none());
    }

    #[test]
    fn distinct_field_count() {
        let names: Vec<String> = ["Objetivos Estratégicos Institucionales Código", "Denominación"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let resolved = map_all(&names, vocab(), 80);
        assert_eq!(resolved.iter().flatten().count(), 2);
        assert_eq!(distinct_fields(&resolved), 1);

        let names: Vec<String> = ["Código", "Denominación de OEI", ""].iter().map(|s| s.to_string()).collect();
        assert_eq!(distinct_fields(&map_all(&names, vocab(), 80)), 2);
    }

    #[test]
    fn score_scale() {
        assert_eq!(similarity_score("codigo", "codigo"), 100);
        assert_eq!(similarity_score("abc", "xyz"), 0);
    }
}
