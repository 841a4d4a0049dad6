// Text normalization shared by header matching, exact-match checks, and diffing.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Characters treated as word separators (replaced by a space).
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[/\\\-_\u{2013}\u{2014}]+").unwrap());

/// Punctuation removed outright.
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[.,;:!?¡¿"'()\[\]{}«»\u{201C}\u{201D}\u{2018}\u{2019}*•·°º]"#).unwrap()
});

/// Canonicalize a string for comparison.
///
/// Lowercases, strips diacritics, turns `/ \ - _` and dashes into spaces,
/// drops punctuation, trims, and collapses whitespace runs to one space.
/// Total and idempotent: `normalize(&normalize(s)) == normalize(s)`.
/// Missing cells are represented as `""` and normalize to `""`.
pub fn normalize(s: &str) -> String {
    let folded = strip_marks(&strip_marks(s).to_lowercase());
    let spaced = SEPARATORS.replace_all(&folded, " ");
    let cleaned = PUNCTUATION.replace_all(&spaced, "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-separated words of the normalized form.
pub fn words(s: &str) -> Vec<String> {
    normalize(s).split(' ').filter(|w| !w.is_empty()).map(str::to_string).collect()
}

/// Snake-case identifier built from already-normalized text.
///
/// Used to synthesize a column name for headers that map to no canonical field.
pub fn to_identifier(normalized: &str) -> String {
    normalized
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

fn strip_marks(s: &str) -> String {
    s.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}
