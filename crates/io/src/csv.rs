// CSV/TSV grids and result export

use std::io::Read;
use std::path::Path;

use plancheck_core::RawGrid;
use plancheck_recon::model::{render_diff, ComparisonReport};

use crate::export::{round_similarity, RESULT_COLUMNS};
use crate::IoError;

pub fn read_grid(path: &Path) -> Result<RawGrid, IoError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    grid_from_string(&content, delimiter).map(|g| g.with_label(file_label(path)))
}

pub fn read_grid_with_delimiter(path: &Path, delimiter: u8) -> Result<RawGrid, IoError> {
    let content = read_file_as_utf8(path)?;
    grid_from_string(&content, delimiter).map(|g| g.with_label(file_label(path)))
}

fn file_label(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // consistent lines x field count; more columns wins ties
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (Windows-1252 fallback for Excel-exported CSVs).
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let mut file = std::fs::File::open(path).map_err(|e| IoError::io(path, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| IoError::io(path, e))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(s)),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn grid_from_string(content: &str, delimiter: u8) -> Result<RawGrid, IoError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| IoError::Parse(e.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(RawGrid::new(rows))
}

/// Write one report's results as CSV, columns in export order.
pub fn export_report(report: &ComparisonReport, path: &Path) -> Result<(), IoError> {
    let mut writer = csv::WriterBuilder::new()
        .from_path(path)
        .map_err(|e| IoError::Export(e.to_string()))?;

    writer.write_record(RESULT_COLUMNS).map_err(|e| IoError::Export(e.to_string()))?;
    for r in &report.results {
        let similarity = format!("{:.3}", round_similarity(r.similarity));
        writer
            .write_record([
                r.submitted_code.as_str(),
                r.submitted_text.as_str(),
                r.matched_reference_code.as_str(),
                r.matched_reference_text.as_str(),
                similarity.as_str(),
                r.classification.label(),
                render_diff(&r.diff_summary).as_str(),
            ])
            .map_err(|e| IoError::Export(e.to_string()))?;
    }

    writer.flush().map_err(|e| IoError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sniff_semicolon_delimiter() {
        let content = "Código;Denominación;Indicador\nOEI.01;Mejorar;Índice\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_comma_delimiter() {
        let content = "Código,Denominación,Indicador\nOEI.01,Mejorar,Índice\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn test_sniff_semicolon_with_commas_in_values() {
        let content = "Código;Denominación\nOEI.01;\"Mejorar la gestión, con calidad\"\nOEI.02;Fortalecer\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_spanish_locale_export_keeps_unquoted_commas() {
        // Excel in es-PE writes ';' and leaves commas inside names unquoted
        let dir = tempdir().unwrap();
        let path = dir.path().join("oei.csv");
        fs::write(
            &path,
            "Código;Denominación;Indicador\n\
             OEI.01;Mejorar la gestión, el control y la transparencia;Índice\n\
             OEI.02;Fortalecer, articular y promover;Tasa\n",
        )
        .unwrap();

        let grid = read_grid(&path).unwrap();
        assert_eq!(grid.n_cols(), 3);
        assert_eq!(grid.cell(1, 1), "Mejorar la gestión, el control y la transparencia");
        assert_eq!(grid.cell(2, 1), "Fortalecer, articular y promover");
        assert_eq!(grid.cell(2, 2), "Tasa");
    }

    #[test]
    fn test_ragged_rows_become_rectangular() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pei.csv");
        fs::write(&path, "Objetivos Estratégicos\nCódigo,Denominación\nOEI.01,Mejorar\n").unwrap();

        let grid = read_grid(&path).unwrap();
        assert_eq!(grid.label(), "pei.csv");
        assert_eq!(grid.n_rows(), 3);
        assert_eq!(grid.n_cols(), 2);
        assert_eq!(grid.cell(0, 1), "");
        assert_eq!(grid.cell(2, 1), "Mejorar");
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        // "Código;Acción" in Windows-1252
        fs::write(&path, b"C\xf3digo;Acci\xf3n\n").unwrap();
        let grid = read_grid(&path).unwrap();
        assert_eq!(grid.cell(0, 0), "Código");
        assert_eq!(grid.cell(0, 1), "Acción");
    }

    #[test]
    fn test_bom_is_stripped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bom.csv");
        fs::write(&path, "\u{feff}Código,Denominación\n").unwrap();
        assert_eq!(read_grid(&path).unwrap().cell(0, 0), "Código");
    }
}
