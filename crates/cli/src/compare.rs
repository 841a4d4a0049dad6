//! `plancheck compare`: submitted document vs reference catalog.

use std::path::{Path, PathBuf};

use plancheck_core::{RawGrid, Subject};
use plancheck_io::{export, subject, xlsx};
use plancheck_recon::embedding;
use plancheck_recon::{ComparisonReport, CompareInput, ReconError};
use tracing::{info, warn};

use crate::exit_codes::{EXIT_ERROR, EXIT_INPUT_NO_TABLES, EXIT_RESULT_NO_MATCH};
use crate::{settings, CliError};

pub struct CompareArgs {
    pub document: PathBuf,
    pub reference: Option<PathBuf>,
    pub subject: Option<Subject>,
    pub config: Option<PathBuf>,
    pub threshold: Option<f32>,
    pub output: Option<PathBuf>,
    pub json: bool,
    pub fail_on_no_match: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Xlsx,
    Csv,
    Json,
}

impl OutputFormat {
    fn from_path(path: &Path) -> Result<Self, CliError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(CliError::usage(format!("unsupported output format: {}", path.display()))
                .with_hint("use a .xlsx, .csv or .json file name")),
        }
    }
}

pub fn cmd_compare(args: CompareArgs) -> Result<(), CliError> {
    // Fail on a bad output name before doing any work
    let output_format = args.output.as_deref().map(OutputFormat::from_path).transpose()?;

    let mut loaded = settings::load(args.config.as_deref())?;
    if let Some(threshold) = args.threshold {
        loaded.config.matching.threshold = threshold;
        loaded.config.validate()?;
    }

    let reference_path = match (&args.reference, &loaded.config.reference.file) {
        (Some(path), _) => path.clone(),
        (None, Some(file)) => loaded.resolve(file),
        (None, None) => {
            return Err(CliError::usage("no reference workbook")
                .with_hint("pass --reference <file.xlsx> or set [reference].file in the config"))
        }
    };
    let config = &loaded.config;

    let grids = plancheck_io::read_document(&args.document)?;
    info!(document = %args.document.display(), tables = grids.len(), "document read");
    let tables = pick_tables(grids, args.subject, &args.document)?;

    let embedder = embedding::from_config(&config.embedding)?;
    info!(embedder = %embedder.name(), "embedder ready");

    // A table that cannot be normalized is reported and skipped; the first
    // such failure decides the exit code once the other reports are out.
    let mut first_error: Option<CliError> = None;
    let mut reports = Vec::with_capacity(tables.len());
    for (subject, submitted) in tables {
        let reference = xlsx::read_sheet(&reference_path, config.reference.sheet_for(subject))?;
        let input = CompareInput { subject, reference, submitted };
        match plancheck_recon::run(config, &input, embedder.as_ref()) {
            Ok(report) => reports.push(report),
            Err(e) if is_table_error(&e) => {
                warn!(subject = %subject, error = %e, "table skipped");
                eprintln!("{subject}: {e}");
                if first_error.is_none() {
                    first_error = Some(CliError::from(e));
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    if let (Some(path), Some(format)) = (&args.output, output_format) {
        for written in write_output(&reports, path, format)? {
            eprintln!("wrote {}", written.display());
        }
    }

    if args.json {
        let json = serde_json::to_string_pretty(&reports)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json}");
    }

    for report in &reports {
        print_summary(report);
    }

    if let Some(err) = first_error {
        return Err(err);
    }

    if args.fail_on_no_match {
        let no_match: usize = reports.iter().map(|r| r.summary.no_match).sum();
        if no_match > 0 {
            return Err(CliError::new(
                EXIT_RESULT_NO_MATCH,
                format!("{no_match} submitted element(s) without a match"),
            ));
        }
    }

    Ok(())
}

/// Failures confined to one table. Anything else (embedding, config) ends the run.
fn is_table_error(err: &ReconError) -> bool {
    matches!(err, ReconError::SchemaDetection { .. } | ReconError::RequiredFieldMissing { .. })
}

/// Tables to compare, one per subject.
///
/// Tagged tables win. A document holding a single untagged table (a plain
/// CSV export, say) is accepted when the subject is given explicitly.
pub(crate) fn pick_tables(
    grids: Vec<RawGrid>,
    requested: Option<Subject>,
    document: &Path,
) -> Result<Vec<(Subject, RawGrid)>, CliError> {
    let only = if grids.len() == 1 { grids.first().cloned() } else { None };
    let mut selected = subject::select_tables(grids);

    match requested {
        Some(subject) => match selected.remove(&subject).or(only) {
            Some(grid) => Ok(vec![(subject, grid)]),
            None => Err(CliError::new(
                EXIT_INPUT_NO_TABLES,
                format!("{}: no {} table found", document.display(), subject.code()),
            )),
        },
        None if selected.is_empty() => Err(CliError::new(
            EXIT_INPUT_NO_TABLES,
            format!("{}: no objective or action table found", document.display()),
        )
        .with_hint("pass --subject to compare a document's single table as-is")),
        None => Ok(selected.into_iter().collect()),
    }
}

fn write_output(reports: &[ComparisonReport], path: &Path, format: OutputFormat) -> Result<Vec<PathBuf>, CliError> {
    match format {
        OutputFormat::Xlsx => export::write_xlsx(reports, path)?,
        OutputFormat::Json => export::write_json(reports, path)?,
        OutputFormat::Csv => {
            if let [report] = reports {
                plancheck_io::csv::export_report(report, path)?;
            } else {
                // One file per subject: result.csv -> result_OEI.csv, result_AEI.csv
                let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("result");
                let mut written = Vec::with_capacity(reports.len());
                for report in reports {
                    let file = path.with_file_name(format!("{stem}_{}.csv", report.meta.subject.code()));
                    plancheck_io::csv::export_report(report, &file)?;
                    written.push(file);
                }
                return Ok(written);
            }
        }
    }
    Ok(vec![path.to_path_buf()])
}

fn print_summary(report: &ComparisonReport) {
    let s = &report.summary;
    eprintln!(
        "{}: {} compared against {} reference - {} exact ({}%), {} partial ({}%), {} no match ({}%)",
        report.meta.subject,
        s.total,
        report.meta.reference_records,
        s.exact,
        s.exact_pct,
        s.partial,
        s.partial_pct,
        s.no_match,
        s.no_match_pct,
    );
    for warning in &report.warnings {
        eprintln!("  warning: {warning}");
    }
}
