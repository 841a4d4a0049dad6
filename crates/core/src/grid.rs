use crate::text::normalize;

/// A rectangular block of raw cell strings with no header semantics.
///
/// Rows shorter than the widest row are padded with empty cells on
/// construction, so every row has `n_cols()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawGrid {
    label: String,
    rows: Vec<Vec<String>>,
    width: usize,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { label: String::new(), rows, width }
    }

    /// Convenience constructor for literals and tests.
    pub fn from_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        )
    }

    /// Attach a human-readable origin ("table 3", "sheet OEI") for diagnostics.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.width == 0
    }

    /// Cell text, or `""` outside the grid.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn row(&self, row: usize) -> &[String] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// All cells joined with spaces, then normalized. Used for keyword search.
    pub fn flattened_text(&self) -> String {
        let joined = self
            .rows
            .iter()
            .flat_map(|r| r.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        normalize(&joined)
    }
}
