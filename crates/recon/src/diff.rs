// Word-level diff between a matched reference text and a submitted text.

use plancheck_core::normalize;

use crate::model::DiffSpan;

/// Produces the non-equal spans between two texts, left to right.
pub trait DiffStrategy: Send + Sync {
    fn diff(&self, reference: &str, submitted: &str) -> Vec<DiffSpan>;
}

/// Longest-common-subsequence alignment over words.
///
/// Words are compared by their normalized form; spans report the words as
/// written (edge punctuation trimmed), so "Pública," and "publica" align and
/// an added "pública" is reported with its accent.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenLcs;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    key: String,
    surface: String,
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut out = Vec::new();
    for raw in text.split_whitespace() {
        let key = normalize(raw);
        if key.is_empty() {
            continue;
        }
        if key.contains(' ') {
            // "gestión/pública" normalizes to two words; report them normalized.
            out.extend(key.split(' ').map(|w| Token { key: w.to_string(), surface: w.to_string() }));
        } else {
            let surface = raw.trim_matches(|c: char| !c.is_alphanumeric()).to_string();
            out.push(Token { key, surface });
        }
    }
    out
}

impl DiffStrategy for TokenLcs {
    fn diff(&self, reference: &str, submitted: &str) -> Vec<DiffSpan> {
        let a = tokenize(reference);
        let b = tokenize(submitted);
        let (n, m) = (a.len(), b.len());

        // lcs[i][j] = LCS length of a[i..] and b[j..]
        let mut lcs = vec![vec![0usize; m + 1]; n + 1];
        for i in (0..n).rev() {
            for j in (0..m).rev() {
                lcs[i][j] = if a[i].key == b[j].key {
                    lcs[i + 1][j + 1] + 1
                } else {
                    lcs[i + 1][j].max(lcs[i][j + 1])
                };
            }
        }

        let mut spans = Vec::new();
        let mut pending = DiffSpan::default();
        let (mut i, mut j) = (0, 0);
        while i < n || j < m {
            if i < n && j < m && a[i].key == b[j].key {
                flush(&mut spans, &mut pending);
                i += 1;
                j += 1;
            } else if j == m || (i < n && lcs[i + 1][j] >= lcs[i][j + 1]) {
                pending.removed.push(a[i].surface.clone());
                i += 1;
            } else {
                pending.added.push(b[j].surface.clone());
                j += 1;
            }
        }
        flush(&mut spans, &mut pending);
        spans
    }
}

fn flush(spans: &mut Vec<DiffSpan>, pending: &mut DiffSpan) {
    if !pending.removed.is_empty() || !pending.added.is_empty() {
        spans.push(std::mem::take(pending));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::render_diff;

    fn diff(a: &str, b: &str) -> Vec<DiffSpan> {
        TokenLcs.diff(a, b)
    }

    #[test]
    fn identical_after_normalization() {
        assert!(diff("Mejorar la gestión institucional", "mejorar la gestion institucional").is_empty());
        assert!(diff("", "").is_empty());
    }

    #[test]
    fn inserted_word() {
        let spans = diff("Mejorar la gestión institucional", "Mejorar la gestión pública institucional");
        assert_eq!(spans, vec![DiffSpan { removed: vec![], added: vec!["pública".into()] }]);
        assert_eq!(render_diff(&spans), "+pública");
    }

    #[test]
    fn deleted_word() {
        let spans = diff("Fortalecer la gestión del riesgo", "Fortalecer la gestión");
        assert_eq!(spans, vec![DiffSpan { removed: vec!["del".into(), "riesgo".into()], added: vec![] }]);
    }

    #[test]
    fn replacement_is_one_span() {
        let spans = diff("Mejorar la calidad educativa", "Mejorar la cobertura educativa");
        assert_eq!(
            spans,
            vec![DiffSpan { removed: vec!["calidad".into()], added: vec!["cobertura".into()] }]
        );
        assert_eq!(render_diff(&spans), "calidad → cobertura");
    }

    #[test]
    fn spans_in_order() {
        let spans = diff("a b c d e", "x b c y e z");
        assert_eq!(render_diff(&spans), "a → x; d → y; +z");
    }

    #[test]
    fn punctuation_does_not_create_spans() {
        assert!(diff("Promover la innovación, en la región.", "Promover la innovación en la región").is_empty());
    }

    #[test]
    fn one_side_empty() {
        let spans = diff("", "nuevo objetivo");
        assert_eq!(render_diff(&spans), "+nuevo objetivo");
        let spans = diff("objetivo previo", "");
        assert_eq!(render_diff(&spans), "-objetivo previo");
    }

    #[test]
    fn compound_tokens_split() {
        let spans = diff("gestión pública", "gestión/pública eficiente");
        assert_eq!(render_diff(&spans), "+eficiente");
    }
}
