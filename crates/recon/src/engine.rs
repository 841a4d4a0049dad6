use plancheck_core::{normalize, CanonicalField, RawGrid, Subject};
use tracing::{info, warn};

use crate::config::CompareConfig;
use crate::diff::TokenLcs;
use crate::embedding::Embedder;
use crate::error::ReconError;
use crate::matcher::Matcher;
use crate::model::{CanonicalRecord, ComparisonMeta, ComparisonReport, NormalizedTable};
use crate::summary::compute_summary;
use crate::table::SchemaNormalizer;

/// Raw grids for one subject: the catalog sheet and the submitted table.
#[derive(Debug, Clone)]
pub struct CompareInput {
    pub subject: Subject,
    pub reference: RawGrid,
    pub submitted: RawGrid,
}

/// Normalize both grids and compare them.
pub fn run(config: &CompareConfig, input: &CompareInput, embedder: &dyn Embedder) -> Result<ComparisonReport, ReconError> {
    let normalizer = SchemaNormalizer::for_subject(config.vocabulary()?, config.header.clone(), input.subject);

    let reference = normalizer.normalize(&labelled(&input.reference, "reference", input.subject))?;
    let submitted = normalizer.normalize(&labelled(&input.submitted, "submitted", input.subject))?;

    compare_tables(config, input.subject, &reference, &submitted, embedder)
}

/// Compare two already-normalized tables.
pub fn compare_tables(
    config: &CompareConfig,
    subject: Subject,
    reference: &NormalizedTable,
    submitted: &NormalizedTable,
    embedder: &dyn Embedder,
) -> Result<ComparisonReport, ReconError> {
    require_name_text(reference)?;
    require_name_text(submitted)?;

    let ref_records = usable_records(reference);
    let mut sub_records = usable_records(submitted);

    if let Some(prefix) = config.matching.code_prefix(subject) {
        if submitted.has_field(CanonicalField::Code) {
            let before = sub_records.len();
            sub_records.retain(|r| has_prefix(r.code(), prefix));
            info!(
                subject = %subject,
                prefix,
                kept = sub_records.len(),
                dropped = before - sub_records.len(),
                "code prefix filter"
            );
        }
    }

    let mut warnings = Vec::new();
    for (table, records) in [(reference, &ref_records), (submitted, &sub_records)] {
        if records.is_empty() {
            let msg = format!("{}: no usable records after normalization", table.label);
            warn!("{msg}");
            warnings.push(msg);
        }
    }

    let diff = TokenLcs;
    let matcher = Matcher::new(embedder, &diff, config.matching.threshold);
    let results = if warnings.is_empty() {
        matcher.match_records(&ref_records, &sub_records)?
    } else {
        Vec::new()
    };

    let summary = compute_summary(&results);
    info!(
        subject = %subject,
        total = summary.total,
        exact = summary.exact,
        partial = summary.partial,
        no_match = summary.no_match,
        "comparison complete"
    );

    Ok(ComparisonReport {
        meta: ComparisonMeta {
            config_name: config.name.clone(),
            subject,
            embedder: embedder.name(),
            threshold: config.matching.threshold,
            reference_records: ref_records.len(),
            submitted_records: sub_records.len(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        results,
        warnings,
    })
}

fn labelled(grid: &RawGrid, side: &str, subject: Subject) -> RawGrid {
    if grid.label().is_empty() {
        grid.clone().with_label(format!("{side} {subject}"))
    } else {
        grid.clone()
    }
}

fn require_name_text(table: &NormalizedTable) -> Result<(), ReconError> {
    if table.has_field(CanonicalField::NameText) {
        return Ok(());
    }
    Err(ReconError::RequiredFieldMissing {
        table: table.label.clone(),
        required: vec![CanonicalField::NameText],
        found: table.columns.iter().map(|c| format!("{} ({})", c.name, c.header)).collect(),
    })
}

/// Records with a non-empty `name_text`.
fn usable_records(table: &NormalizedTable) -> Vec<CanonicalRecord> {
    table
        .records
        .iter()
        .filter(|r| !normalize(r.text()).is_empty())
        .cloned()
        .collect()
}

fn has_prefix(code: &str, prefix: &str) -> bool {
    code.trim().to_uppercase().starts_with(&prefix.trim().to_uppercase())
}
