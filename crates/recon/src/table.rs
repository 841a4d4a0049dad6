//! Schema normalization: raw grid in, canonical records out.
//!
//! The normalizer owns its vocabulary and header options so it can be built
//! once per run and reused for both the reference catalog and the submission.

use std::collections::{BTreeMap, BTreeSet};

use plancheck_core::{normalize, text::to_identifier, CanonicalField, RawGrid, Subject, Vocabulary};
use tracing::{debug, warn};

use crate::columns::map_to_canonical;
use crate::config::HeaderConfig;
use crate::error::ReconError;
use crate::header::{detect_header, fallback_candidate};
use crate::model::{CanonicalRecord, HeaderCandidate, NormalizedTable, TableColumn};

#[derive(Debug, Clone)]
pub struct SchemaNormalizer {
    vocab: Vocabulary,
    options: HeaderConfig,
    keywords: Vec<String>,
}

impl SchemaNormalizer {
    pub fn new(vocab: Vocabulary, options: HeaderConfig, keywords: Vec<String>) -> Self {
        Self { vocab, options, keywords }
    }

    /// Normalizer using the header keywords of `subject`.
    pub fn for_subject(vocab: Vocabulary, options: HeaderConfig, subject: Subject) -> Self {
        let keywords = subject.header_keywords().iter().map(|k| k.to_string()).collect();
        Self::new(vocab, options, keywords)
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Best header block, falling back to the single-row heuristic.
    pub fn detect_header(&self, grid: &RawGrid) -> Result<HeaderCandidate, ReconError> {
        if let Some(found) = detect_header(grid, &self.keywords, &self.vocab, &self.options) {
            return Ok(found);
        }
        match fallback_candidate(grid, &self.keywords) {
            Some(fb) => {
                warn!(table = grid.label(), row = fb.start_row, "no header block found, using fallback row");
                Ok(fb)
            }
            None => Err(ReconError::SchemaDetection {
                table: grid.label().to_string(),
                rows: grid.n_rows(),
                cols: grid.n_cols(),
            }),
        }
    }

    pub fn normalize(&self, grid: &RawGrid) -> Result<NormalizedTable, ReconError> {
        let header = self.detect_header(grid)?;
        Ok(self.materialize(grid, header))
    }

    /// Build the output table below a known header.
    pub fn materialize(&self, grid: &RawGrid, header: HeaderCandidate) -> NormalizedTable {
        let width = header.combined_names.len();

        let rows: Vec<(usize, Vec<String>)> = (header.data_start()..grid.n_rows())
            .filter_map(|idx| {
                let mut cells: Vec<String> =
                    grid.row(idx).iter().take(width).map(|c| c.trim().to_string()).collect();
                cells.resize(width, String::new());
                if cells.iter().all(String::is_empty) {
                    None
                } else {
                    Some((idx, cells))
                }
            })
            .collect();

        // Columns kept: a non-empty header or at least one value.
        let kept: Vec<usize> = (0..width)
            .filter(|&col| {
                !header.combined_names[col].trim().is_empty()
                    || rows.iter().any(|(_, cells)| !cells[col].is_empty())
            })
            .collect();

        let columns = self.name_columns(&header.combined_names, &kept);

        let records = rows
            .into_iter()
            .map(|(source_row, cells)| {
                let mut record = CanonicalRecord { source_row, ..CanonicalRecord::default() };
                for column in &columns {
                    let value = cells[column.source_index].clone();
                    match column.field {
                        Some(field) => {
                            record.fields.insert(field, value);
                        }
                        None => {
                            record.extra.insert(column.name.clone(), value);
                        }
                    }
                }
                record
            })
            .collect::<Vec<_>>();

        debug!(
            table = grid.label(),
            columns = columns.len(),
            records = records.len(),
            "table normalized"
        );

        NormalizedTable { label: grid.label().to_string(), header, columns, records }
    }

    /// Resolve and name the kept columns. The first column mapped to a field
    /// owns it; later ones become extra columns named `<field>_<n>`.
    fn name_columns(&self, names: &[String], kept: &[usize]) -> Vec<TableColumn> {
        let resolved: Vec<_> = kept
            .iter()
            .map(|&col| {
                let header = names[col].trim().to_string();
                let resolution = map_to_canonical(&header, &self.vocab, self.options.fuzzy_threshold);
                (col, header, resolution)
            })
            .collect();

        // Canonical names are reserved before any synthesized name is handed out.
        let mut owners: BTreeMap<CanonicalField, usize> = BTreeMap::new();
        for (col, _, resolution) in &resolved {
            if let Some(m) = resolution {
                owners.entry(m.field).or_insert(*col);
            }
        }
        let mut used: BTreeSet<String> = owners.keys().map(|f| f.as_str().to_string()).collect();

        resolved
            .into_iter()
            .map(|(col, header, resolution)| {
                let (field, name) = match resolution {
                    Some(m) if owners.get(&m.field) == Some(&col) => {
                        (Some(m.field), m.field.as_str().to_string())
                    }
                    Some(m) => (None, unique_name(&mut used, m.field.as_str().to_string())),
                    None => {
                        let ident = to_identifier(&normalize(&header));
                        let base = if ident.is_empty() { format!("col_{col}") } else { ident };
                        (None, unique_name(&mut used, base))
                    }
                };
                TableColumn { name, field, header, resolution, source_index: col }
            })
            .collect()
    }
}

/// `base`, or the first free `base_<n>` for n >= 2. The result is reserved in `used`.
fn unique_name(used: &mut BTreeSet<String>, base: String) -> String {
    let mut name = base.clone();
    let mut n = 1;
    while used.contains(&name) {
        n += 1;
        name = format!("{base}_{n}");
    }
    used.insert(name.clone());
    name
}
