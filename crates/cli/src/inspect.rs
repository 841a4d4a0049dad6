//! `plancheck inspect`: header detection and column mapping per table.

use std::path::{Path, PathBuf};

use plancheck_core::Subject;
use plancheck_recon::model::{HeaderCandidate, TableColumn};
use plancheck_recon::SchemaNormalizer;
use serde::Serialize;

use crate::compare::pick_tables;
use crate::exit_codes::EXIT_ERROR;
use crate::{settings, CliError};

#[derive(Debug, Serialize)]
struct TableReport {
    table: String,
    subject: Subject,
    #[serde(skip_serializing_if = "Option::is_none")]
    header: Option<HeaderCandidate>,
    columns: Vec<TableColumn>,
    records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn cmd_inspect(
    document: PathBuf,
    subject: Option<Subject>,
    config: Option<PathBuf>,
    json: bool,
) -> Result<(), CliError> {
    let loaded = settings::load(config.as_deref())?;
    let vocab = loaded.config.vocabulary()?;

    let grids = plancheck_io::read_document(&document)?;
    let tables = pick_tables(grids, subject, &document)?;

    // Every table is reported; the first failure decides the exit code.
    let mut first_error: Option<CliError> = None;
    let mut reports = Vec::with_capacity(tables.len());
    for (subject, grid) in tables {
        let normalizer = SchemaNormalizer::for_subject(vocab.clone(), loaded.config.header.clone(), subject);
        let label = table_label(grid.label(), &document);
        let grid = grid.with_label(label.clone());
        let report = match normalizer.normalize(&grid) {
            Ok(table) => TableReport {
                table: label,
                subject,
                header: Some(table.header),
                columns: table.columns,
                records: table.records.len(),
                error: None,
            },
            Err(e) => {
                let message = e.to_string();
                if first_error.is_none() {
                    first_error = Some(CliError::from(e));
                }
                TableReport { table: label, subject, header: None, columns: Vec::new(), records: 0, error: Some(message) }
            }
        };
        reports.push(report);
    }

    if json {
        let out = serde_json::to_string_pretty(&reports)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{out}");
    } else {
        for report in &reports {
            print_table(report);
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn table_label(label: &str, document: &Path) -> String {
    if label.is_empty() {
        document.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    } else {
        label.to_string()
    }
}

fn print_table(report: &TableReport) {
    println!("{} [{}]", report.table, report.subject);

    let Some(ref header) = report.header else {
        if let Some(ref err) = report.error {
            println!("  error: {err}");
        }
        println!();
        return;
    };

    println!(
        "  header: start row {}, height {}{} (score {}, {} field(s) mapped)",
        header.start_row,
        header.height,
        if header.fallback { ", fallback" } else { "" },
        header.score,
        header.field_matches,
    );
    let width = report.columns.iter().map(|c| c.header.chars().count()).max().unwrap_or(0);
    for column in &report.columns {
        let mapping = match column.resolution {
            Some(m) => format!("{} ({:?}, {})", column.name, m.method, m.score),
            None => format!("{} (unmapped)", column.name),
        };
        println!("  [{:>2}] {:<width$}  -> {}", column.source_index, column.header, mapping, width = width);
    }
    println!("  records: {}", report.records);
    println!();
}
