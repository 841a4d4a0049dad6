// Word (.docx) table extraction.
//
// Reads word/document.xml and returns one RawGrid per top-level table, in
// document order. Horizontally merged cells repeat their text across every
// grid column they span; vertical-merge continuation cells repeat the text
// of the cell above. Nested tables are flattened into the enclosing cell.

use std::io::{Read, Seek};
use std::path::Path;

use plancheck_core::RawGrid;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::IoError;

const DOCUMENT_XML: &str = "word/document.xml";

/// Word tables hold at most 63 columns; wider spans or rows are cut there.
const MAX_GRID_COLUMNS: usize = 63;

pub fn read_tables(path: &Path) -> Result<Vec<RawGrid>, IoError> {
    let file = std::fs::File::open(path).map_err(|e| IoError::io(path, e))?;
    let xml = read_document_xml(file).map_err(|e| e.with_path(path))?;
    let grids = parse_tables(&xml)?;
    debug!(path = %path.display(), tables = grids.len(), "docx tables read");
    Ok(grids)
}

/// Extract `word/document.xml` from a .docx archive.
pub fn read_document_xml<R: Read + Seek>(reader: R) -> Result<String, IoError> {
    let mut archive = zip::ZipArchive::new(reader).map_err(|e| IoError::Archive(e.to_string()))?;
    let mut entry = archive
        .by_name(DOCUMENT_XML)
        .map_err(|e| IoError::Archive(format!("{DOCUMENT_XML}: {e}")))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| IoError::Archive(format!("{DOCUMENT_XML}: {e}")))?;
    Ok(xml)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VMerge {
    None,
    Restart,
    Continue,
}

#[derive(Debug)]
struct CellBuilder {
    paragraphs: Vec<String>,
    current: String,
    span: usize,
    vmerge: VMerge,
}

impl CellBuilder {
    fn new() -> Self {
        Self { paragraphs: Vec::new(), current: String::new(), span: 1, vmerge: VMerge::None }
    }
}

#[derive(Debug)]
struct Cell {
    text: String,
    span: usize,
    vmerge: VMerge,
}

#[derive(Debug, Default)]
struct TableBuilder {
    rows: Vec<Vec<Cell>>,
    row: Option<Vec<Cell>>,
    cell: Option<CellBuilder>,
}

/// Parse every top-level table in a WordprocessingML body.
pub fn parse_tables(xml: &str) -> Result<Vec<RawGrid>, IoError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    let mut stack: Vec<TableBuilder> = Vec::new();
    let mut out = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"tbl" => stack.push(TableBuilder::default()),
                b"tr" => {
                    if let Some(t) = stack.last_mut() {
                        t.row = Some(Vec::new());
                    }
                }
                b"tc" => {
                    if let Some(t) = stack.last_mut() {
                        t.cell = Some(CellBuilder::new());
                    }
                }
                b"t" => in_text = true,
                b"gridSpan" | b"vMerge" => cell_property(stack.last_mut(), e),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"gridSpan" | b"vMerge" => cell_property(stack.last_mut(), e),
                b"tab" | b"br" => push_text(stack.last_mut(), " "),
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text => {
                push_text(stack.last_mut(), &unescape_xml(&String::from_utf8_lossy(e.as_ref())));
            }
            Ok(Event::GeneralRef(ref e)) if in_text => {
                if let Some(c) = entity(&String::from_utf8_lossy(e.as_ref())) {
                    push_text(stack.last_mut(), c.encode_utf8(&mut [0u8; 4]));
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    if let Some(cell) = stack.last_mut().and_then(|t| t.cell.as_mut()) {
                        let para = std::mem::take(&mut cell.current);
                        cell.paragraphs.push(para);
                    }
                }
                b"tc" => {
                    if let Some(t) = stack.last_mut() {
                        if let Some(mut cell) = t.cell.take() {
                            if !cell.current.is_empty() {
                                let para = std::mem::take(&mut cell.current);
                                cell.paragraphs.push(para);
                            }
                            let text = cell.paragraphs.join("\n").trim().to_string();
                            let built = Cell { text, span: cell.span, vmerge: cell.vmerge };
                            t.row.get_or_insert_with(Vec::new).push(built);
                        }
                    }
                }
                b"tr" => {
                    if let Some(t) = stack.last_mut() {
                        if let Some(row) = t.row.take() {
                            t.rows.push(row);
                        }
                    }
                }
                b"tbl" => {
                    if let Some(table) = stack.pop() {
                        let grid = build_grid(table.rows);
                        match stack.last_mut().and_then(|t| t.cell.as_mut()) {
                            Some(cell) => cell.paragraphs.extend(flatten(&grid)),
                            None => {
                                let label = format!("table {}", out.len() + 1);
                                out.push(grid.with_label(label));
                            }
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(IoError::Parse(format!(
                    "{DOCUMENT_XML} at byte {}: {e}",
                    reader.error_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

fn cell_property(table: Option<&mut TableBuilder>, e: &BytesStart) {
    let Some(cell) = table.and_then(|t| t.cell.as_mut()) else {
        return;
    };
    let val = e
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == b"val")
        .map(|a| String::from_utf8_lossy(&a.value).to_string());

    match e.local_name().as_ref() {
        b"gridSpan" => {
            cell.span = val.and_then(|v| v.parse::<usize>().ok()).unwrap_or(1).clamp(1, MAX_GRID_COLUMNS);
        }
        b"vMerge" => {
            cell.vmerge = match val.as_deref() {
                Some("restart") => VMerge::Restart,
                _ => VMerge::Continue,
            };
        }
        _ => {}
    }
}

fn push_text(table: Option<&mut TableBuilder>, text: &str) {
    if let Some(cell) = table.and_then(|t| t.cell.as_mut()) {
        cell.current.push_str(text);
    }
}

fn build_grid(rows: Vec<Vec<Cell>>) -> RawGrid {
    let mut grid: Vec<Vec<String>> = Vec::with_capacity(rows.len());
    for row in rows {
        let mut out: Vec<String> = Vec::new();
        for cell in row {
            let span = cell.span.min(MAX_GRID_COLUMNS.saturating_sub(out.len()));
            for _ in 0..span {
                let col = out.len();
                let text = match cell.vmerge {
                    VMerge::Continue => grid
                        .last()
                        .and_then(|above| above.get(col))
                        .cloned()
                        .unwrap_or_default(),
                    VMerge::None | VMerge::Restart => cell.text.clone(),
                };
                out.push(text);
            }
        }
        grid.push(out);
    }
    RawGrid::new(grid)
}

/// Nested table as text lines, one per non-empty row.
fn flatten(grid: &RawGrid) -> Vec<String> {
    grid.rows()
        .map(|row| {
            row.iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|line| !line.is_empty())
        .collect()
}

fn entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

fn unescape_xml(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn body(tables: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:r><w:t>Plan Estratégico Institucional</w:t></w:r></w:p>
{tables}
</w:body></w:document>"#
        )
    }

    fn tc(text: &str) -> String {
        format!("<w:tc><w:p><w:r><w:t>{text}</w:t></w:r></w:p></w:tc>")
    }

    #[test]
    fn simple_table() {
        let xml = body(&format!(
            "<w:tbl><w:tr>{}{}</w:tr><w:tr>{}{}</w:tr></w:tbl>",
            tc("Código"),
            tc("Denominación"),
            tc("OEI.01"),
            tc("Mejorar la gestión &amp; el control")
        ));
        let grids = parse_tables(&xml).unwrap();
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].label(), "table 1");
        assert_eq!(grids[0].cell(0, 1), "Denominación");
        assert_eq!(grids[0].cell(1, 1), "Mejorar la gestión & el control");
    }

    #[test]
    fn paragraphs_join_with_newline() {
        let cell = "<w:tc><w:p><w:r><w:t>Denominación</w:t></w:r></w:p><w:p><w:r><w:t xml:space=\"preserve\">de OEI </w:t></w:r></w:p></w:tc>";
        let xml = body(&format!("<w:tbl><w:tr>{cell}</w:tr></w:tbl>"));
        let grids = parse_tables(&xml).unwrap();
        assert_eq!(grids[0].cell(0, 0), "Denominación\nde OEI");
    }

    #[test]
    fn grid_span_repeats_text() {
        let wide = "<w:tc><w:tcPr><w:gridSpan w:val=\"2\"/></w:tcPr><w:p><w:r><w:t>Objetivos Estratégicos</w:t></w:r></w:p></w:tc>";
        let xml = body(&format!(
            "<w:tbl><w:tr>{wide}</w:tr><w:tr>{}{}</w:tr></w:tbl>",
            tc("Código"),
            tc("Denominación")
        ));
        let grid = &parse_tables(&xml).unwrap()[0];
        assert_eq!(grid.n_cols(), 2);
        assert_eq!(grid.cell(0, 0), "Objetivos Estratégicos");
        assert_eq!(grid.cell(0, 1), "Objetivos Estratégicos");
    }

    #[test]
    fn oversized_grid_span_is_clamped() {
        let wide = "<w:tc><w:tcPr><w:gridSpan w:val=\"100000000\"/></w:tcPr><w:p><w:r><w:t>Título</w:t></w:r></w:p></w:tc>";
        let xml = body(&format!(
            "<w:tbl><w:tr>{wide}{wide}</w:tr><w:tr>{}{}</w:tr></w:tbl>",
            tc("Código"),
            tc("Denominación")
        ));
        let grid = &parse_tables(&xml).unwrap()[0];
        assert_eq!(grid.n_cols(), MAX_GRID_COLUMNS);
        assert_eq!(grid.cell(0, MAX_GRID_COLUMNS - 1), "Título");
        assert_eq!(grid.cell(1, 1), "Denominación");
    }

    #[test]
    fn vertical_merge_repeats_cell_above() {
        let start = "<w:tc><w:tcPr><w:vMerge w:val=\"restart\"/></w:tcPr><w:p><w:r><w:t>OEI.01</w:t></w:r></w:p></w:tc>";
        let cont = "<w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc>";
        let xml = body(&format!(
            "<w:tbl><w:tr>{start}{}</w:tr><w:tr>{cont}{}</w:tr></w:tbl>",
            tc("Indicador A"),
            tc("Indicador B")
        ));
        let grid = &parse_tables(&xml).unwrap()[0];
        assert_eq!(grid.cell(1, 0), "OEI.01");
        assert_eq!(grid.cell(1, 1), "Indicador B");
    }

    #[test]
    fn nested_table_is_flattened() {
        let inner = format!("<w:tbl><w:tr>{}{}</w:tr></w:tbl>", tc("a"), tc("b"));
        let outer_cell = format!("<w:tc><w:p><w:r><w:t>Meta</w:t></w:r></w:p>{inner}<w:p/></w:tc>");
        let xml = body(&format!("<w:tbl><w:tr>{outer_cell}{}</w:tr></w:tbl>", tc("x")));
        let grids = parse_tables(&xml).unwrap();
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].cell(0, 0), "Meta\na b");
        assert_eq!(grids[0].cell(0, 1), "x");
    }

    #[test]
    fn tables_in_document_order() {
        let t1 = format!("<w:tbl><w:tr>{}</w:tr></w:tbl>", tc("first"));
        let t2 = format!("<w:tbl><w:tr>{}</w:tr></w:tbl>", tc("second"));
        let grids = parse_tables(&body(&format!("{t1}<w:p/>{t2}"))).unwrap();
        assert_eq!(grids.len(), 2);
        assert_eq!(grids[1].cell(0, 0), "second");
        assert_eq!(grids[1].label(), "table 2");
    }

    #[test]
    fn reads_from_archive() {
        let xml = body(&format!("<w:tbl><w:tr>{}</w:tr></w:tbl>", tc("Código")));
        let mut bytes = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut bytes));
            zip.start_file(DOCUMENT_XML, zip::write::SimpleFileOptions::default()).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        let extracted = read_document_xml(Cursor::new(bytes)).unwrap();
        assert_eq!(parse_tables(&extracted).unwrap()[0].cell(0, 0), "Código");
    }

    #[test]
    fn missing_document_xml() {
        let mut bytes = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut bytes));
            zip.start_file("other.xml", zip::write::SimpleFileOptions::default()).unwrap();
            zip.finish().unwrap();
        }
        assert!(matches!(read_document_xml(Cursor::new(bytes)), Err(IoError::Archive(_))));
    }

    #[test]
    fn entities() {
        assert_eq!(entity("amp"), Some('&'));
        assert_eq!(entity("#x41"), Some('A'));
        assert_eq!(entity("#233"), Some('é'));
        assert_eq!(entity("nbsp"), None);
    }
}
