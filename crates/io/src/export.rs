// Report export: consolidated workbook and JSON.
//
// Classification drives row fill here and nowhere else; the engine only
// emits the enum.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use plancheck_recon::model::{render_diff, Classification, ComparisonReport};
use plancheck_recon::summary::consolidate;
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, Worksheet};

use crate::IoError;

/// Result columns, in export order.
pub const RESULT_COLUMNS: [&str; 7] = [
    "Submitted code",
    "Submitted text",
    "Reference code",
    "Reference text",
    "Similarity",
    "Classification",
    "Differences",
];

const SUMMARY_COLUMNS: [&str; 8] = [
    "Comparison",
    "Total",
    "Exact",
    "Partial",
    "No match",
    "Exact %",
    "Partial %",
    "No match %",
];

/// Exported similarity precision. The in-memory value is never rounded.
pub fn round_similarity(similarity: f32) -> f64 {
    (similarity as f64 * 1000.0).round() / 1000.0
}

fn fill(classification: Classification) -> Color {
    match classification {
        Classification::Exact => Color::RGB(0xC6EFCE),
        Classification::Partial => Color::RGB(0xFFEB9C),
        Classification::NoMatch => Color::RGB(0xFFC7CE),
    }
}

/// One workbook: a `Summary` sheet, then one sheet per report named by subject code.
pub fn write_xlsx(reports: &[ComparisonReport], path: &Path) -> Result<(), IoError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold().set_background_color(Color::RGB(0xD9D9D9));

    {
        let ws = workbook
            .add_worksheet()
            .set_name("Summary")
            .map_err(|e| IoError::Export(e.to_string()))?;
        write_header(ws, &SUMMARY_COLUMNS, &header)?;
        for (i, (subject, summary)) in consolidate(reports).iter().enumerate() {
            let row = i as u32 + 1;
            xl(ws.write_string(row, 0, subject.code()))?;
            xl(ws.write_number(row, 1, summary.total as f64))?;
            xl(ws.write_number(row, 2, summary.exact as f64))?;
            xl(ws.write_number(row, 3, summary.partial as f64))?;
            xl(ws.write_number(row, 4, summary.no_match as f64))?;
            xl(ws.write_number(row, 5, summary.exact_pct))?;
            xl(ws.write_number(row, 6, summary.partial_pct))?;
            xl(ws.write_number(row, 7, summary.no_match_pct))?;
        }
        xl(ws.set_column_width(0, 14))?;
    }

    let mut ordered: Vec<&ComparisonReport> = reports.iter().collect();
    ordered.sort_by_key(|r| r.meta.subject);

    for report in ordered {
        let ws = workbook
            .add_worksheet()
            .set_name(report.meta.subject.code())
            .map_err(|e| IoError::Export(e.to_string()))?;
        write_results(ws, report, &header)?;
    }

    workbook.save(path).map_err(|e| IoError::Export(format!("{}: {e}", path.display())))?;
    Ok(())
}

fn write_results(ws: &mut Worksheet, report: &ComparisonReport, header: &Format) -> Result<(), IoError> {
    write_header(ws, &RESULT_COLUMNS, header)?;

    for (i, r) in report.results.iter().enumerate() {
        let row = i as u32 + 1;
        let text = Format::new().set_background_color(fill(r.classification)).set_text_wrap();
        let number = Format::new()
            .set_background_color(fill(r.classification))
            .set_num_format("0.000")
            .set_align(FormatAlign::Right);

        xl(ws.write_string_with_format(row, 0, &r.submitted_code, &text))?;
        xl(ws.write_string_with_format(row, 1, &r.submitted_text, &text))?;
        xl(ws.write_string_with_format(row, 2, &r.matched_reference_code, &text))?;
        xl(ws.write_string_with_format(row, 3, &r.matched_reference_text, &text))?;
        xl(ws.write_number_with_format(row, 4, round_similarity(r.similarity), &number))?;
        xl(ws.write_string_with_format(row, 5, r.classification.label(), &text))?;
        xl(ws.write_string_with_format(row, 6, render_diff(&r.diff_summary), &text))?;
    }

    for (col, width) in [(0u16, 14.0), (1, 60.0), (2, 14.0), (3, 60.0), (4, 11.0), (5, 15.0), (6, 40.0)] {
        xl(ws.set_column_width(col, width))?;
    }
    xl(ws.set_freeze_panes(1, 0))?;
    Ok(())
}

fn write_header(ws: &mut Worksheet, columns: &[&str], format: &Format) -> Result<(), IoError> {
    for (col, name) in columns.iter().enumerate() {
        xl(ws.write_string_with_format(0, col as u16, *name, format))?;
    }
    Ok(())
}

fn xl<T>(result: Result<T, rust_xlsxwriter::XlsxError>) -> Result<T, IoError> {
    result.map_err(|e| IoError::Export(e.to_string()))
}

/// Reports as a pretty-printed JSON array.
pub fn write_json(reports: &[ComparisonReport], path: &Path) -> Result<(), IoError> {
    let file = File::create(path).map_err(|e| IoError::io(path, e))?;
    serde_json::to_writer_pretty(BufWriter::new(file), reports).map_err(|e| IoError::Export(e.to_string()))
}
