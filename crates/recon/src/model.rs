use std::collections::BTreeMap;
use std::fmt;

use plancheck_core::{CanonicalField, Subject};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Header search
// ---------------------------------------------------------------------------

/// One hypothesis for where the header block sits and how tall it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderCandidate {
    pub start_row: usize,
    pub height: usize,
    /// One combined name per grid column (non-empty cells joined with a space).
    pub combined_names: Vec<String>,
    /// +10 per keyword-bearing column, +1 per non-empty column.
    pub score: u32,
    pub non_empty_count: usize,
    /// Distinct canonical fields the combined names resolve to.
    pub field_matches: usize,
    /// Chosen by the single-row fallback rather than the block search.
    pub fallback: bool,
}

impl HeaderCandidate {
    /// First grid row after the header block.
    pub fn data_start(&self) -> usize {
        self.start_row + self.height
    }
}

// ---------------------------------------------------------------------------
// Normalized tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Alias,
    Exact,
    Fuzzy,
}

/// A column-name resolution: which field, how, and how confidently (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnMatch {
    pub field: CanonicalField,
    pub score: u8,
    pub method: MatchMethod,
}

/// An output column of a normalized table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableColumn {
    /// Canonical field name, or a name synthesized from the header text.
    pub name: String,
    /// `None` for columns kept only so no data is lost.
    pub field: Option<CanonicalField>,
    /// Combined header text as found in the document.
    pub header: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ColumnMatch>,
    /// Column index in the raw grid.
    pub source_index: usize,
}

/// One reference or submitted element after normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CanonicalRecord {
    /// Row index in the raw grid.
    pub source_row: usize,
    pub fields: BTreeMap<CanonicalField, String>,
    /// Values of columns that resolved to no canonical field.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl CanonicalRecord {
    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn code(&self) -> &str {
        self.get(CanonicalField::Code).unwrap_or("")
    }

    pub fn text(&self) -> &str {
        self.get(CanonicalField::NameText).unwrap_or("")
    }
}

/// Output of the schema normalizer for one raw grid.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedTable {
    pub label: String,
    pub header: HeaderCandidate,
    pub columns: Vec<TableColumn>,
    pub records: Vec<CanonicalRecord>,
}

impl NormalizedTable {
    pub fn has_field(&self, field: CanonicalField) -> bool {
        self.columns.iter().any(|c| c.field == Some(field))
    }

    /// Canonical field -> raw header it was found under.
    pub fn field_headers(&self) -> BTreeMap<CanonicalField, String> {
        self.columns
            .iter()
            .filter_map(|c| c.field.map(|f| (f, c.header.clone())))
            .collect()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Exact,
    Partial,
    NoMatch,
}

impl Classification {
    /// Human-facing label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Exact => "Exact match",
            Self::Partial => "Partial match",
            Self::NoMatch => "No match",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Partial => write!(f, "partial"),
            Self::NoMatch => write!(f, "no_match"),
        }
    }
}

/// One non-equal span of a word diff: words of the reference missing from the
/// submission (`removed`) and words of the submission absent from the
/// reference (`added`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffSpan {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<String>,
}

impl fmt::Display for DiffSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.removed.is_empty(), self.added.is_empty()) {
            (true, _) => write!(f, "+{}", self.added.join(" ")),
            (false, true) => write!(f, "-{}", self.removed.join(" ")),
            (false, false) => write!(f, "{} → {}", self.removed.join(" "), self.added.join(" ")),
        }
    }
}

/// Render a diff as a single line, spans separated by `; `.
pub fn render_diff(spans: &[DiffSpan]) -> String {
    spans.iter().map(|s| s.to_string()).collect::<Vec<_>>().join("; ")
}

/// Outcome for one submitted element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub submitted_code: String,
    pub submitted_text: String,
    pub matched_reference_code: String,
    pub matched_reference_text: String,
    /// Index of the matched element in the reference list.
    pub matched_reference_index: usize,
    /// Cosine similarity clamped to 0..=1.
    pub similarity: f32,
    pub classification: Classification,
    pub diff_summary: Vec<DiffSpan>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub total: usize,
    pub exact: usize,
    pub partial: usize,
    pub no_match: usize,
    pub exact_pct: f64,
    pub partial_pct: f64,
    pub no_match_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonMeta {
    pub config_name: String,
    pub subject: Subject,
    pub embedder: String,
    pub threshold: f32,
    pub reference_records: usize,
    pub submitted_records: usize,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub meta: ComparisonMeta,
    pub summary: ComparisonSummary,
    pub results: Vec<MatchResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}
