// Excel workbook import (xlsx, xls, xlsb, ods) as raw grids.
//
// The reference catalog lives in a fixed sheet per subject; submissions may
// also arrive as workbooks, in which case every sheet is a candidate table.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use plancheck_core::RawGrid;
use tracing::debug;

use crate::IoError;

/// Guard against pathological used-ranges (formatting applied to a whole column).
const MAX_ROWS: usize = 100_000;
const MAX_COLS: usize = 256;

/// Every sheet as a grid labelled `sheet <name>`, in workbook order.
pub fn read_sheets(path: &Path) -> Result<Vec<RawGrid>, IoError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| IoError::Workbook(format!("{}: {e}", path.display())))?;

    let names: Vec<String> = workbook.sheet_names().to_vec();
    let mut grids = Vec::with_capacity(names.len());
    for name in &names {
        let range = workbook
            .worksheet_range(name)
            .map_err(|e| IoError::Workbook(format!("failed to read sheet '{name}': {e}")))?;
        grids.push(range_to_grid(&range).with_label(format!("sheet {name}")));
    }
    Ok(grids)
}

/// One named sheet. Names are matched exactly, then case-insensitively.
pub fn read_sheet(path: &Path, sheet: &str) -> Result<RawGrid, IoError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| IoError::Workbook(format!("{}: {e}", path.display())))?;

    let names: Vec<String> = workbook.sheet_names().to_vec();
    let name = names
        .iter()
        .find(|n| n.as_str() == sheet)
        .or_else(|| names.iter().find(|n| n.trim().eq_ignore_ascii_case(sheet.trim())))
        .cloned()
        .ok_or_else(|| IoError::SheetMissing { sheet: sheet.to_string(), available: names.clone() })?;

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| IoError::Workbook(format!("failed to read sheet '{name}': {e}")))?;
    let grid = range_to_grid(&range).with_label(format!("sheet {name}"));
    debug!(sheet = %name, rows = grid.n_rows(), cols = grid.n_cols(), "sheet read");
    Ok(grid)
}

fn range_to_grid(range: &Range<Data>) -> RawGrid {
    // Range start offset (data may not begin at A1)
    let (start_row, start_col) = range.start().map(|(r, c)| (r as usize, c as usize)).unwrap_or((0, 0));

    let mut rows: Vec<Vec<String>> = vec![Vec::new(); start_row.min(MAX_ROWS)];
    for row in range.rows().take(MAX_ROWS.saturating_sub(start_row)) {
        let mut cells = vec![String::new(); start_col.min(MAX_COLS)];
        cells.extend(row.iter().take(MAX_COLS.saturating_sub(start_col)).map(cell_text));
        rows.push(cells);
    }
    RawGrid::new(rows)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // integers without decimals
        Data::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        Data::Float(n) => format!("{n}"),
        Data::Int(n) => format!("{n}"),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::Error(e) => format!("#{e:?}"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::tempdir;

    fn write_catalog(path: &Path) {
        let mut wb = Workbook::new();
        let ws = wb.add_worksheet().set_name("OEI").unwrap();
        ws.write_string(0, 0, "Código").unwrap();
        ws.write_string(0, 1, "Denominación de OEI").unwrap();
        ws.write_string(1, 0, "OEI01").unwrap();
        ws.write_string(1, 1, "Mejorar la gestión institucional").unwrap();
        ws.write_number(2, 0, 7.0).unwrap();
        ws.write_number(2, 1, 0.5).unwrap();
        let ws = wb.add_worksheet().set_name("AEI").unwrap();
        ws.write_string(2, 1, "offset").unwrap();
        wb.save(path).unwrap();
    }

    #[test]
    fn reads_named_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("PEI_Estandar.xlsx");
        write_catalog(&path);

        let grid = read_sheet(&path, "OEI").unwrap();
        assert_eq!(grid.label(), "sheet OEI");
        assert_eq!(grid.cell(1, 1), "Mejorar la gestión institucional");
        assert_eq!(grid.cell(2, 0), "7");
        assert_eq!(grid.cell(2, 1), "0.5");
    }

    #[test]
    fn sheet_lookup_is_case_insensitive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("std.xlsx");
        write_catalog(&path);
        assert!(read_sheet(&path, "oei").is_ok());
    }

    #[test]
    fn missing_sheet_lists_available() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("std.xlsx");
        write_catalog(&path);
        match read_sheet(&path, "AO").unwrap_err() {
            IoError::SheetMissing { sheet, available } => {
                assert_eq!(sheet, "AO");
                assert_eq!(available, vec!["OEI", "AEI"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn offset_ranges_keep_position() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("std.xlsx");
        write_catalog(&path);
        let grids = read_sheets(&path).unwrap();
        assert_eq!(grids.len(), 2);
        assert_eq!(grids[1].label(), "sheet AEI");
        assert_eq!(grids[1].cell(2, 1), "offset");
    }
}
