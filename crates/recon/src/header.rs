// Header block detection over a raw grid.
//
// Documents often carry a title row above the real header, and headers that
// wrap over two physical rows. Every (start, height) block in the search
// window is combined per column, scored, and the best one wins by:
//   1. distinct canonical fields mapped (when schema-aware)
//   2. keyword score
//   3. non-empty combined names
//   4. earliest start row
//   5. taller block (keeps wrapped continuation rows out of the data)

use std::cmp::Reverse;

use plancheck_core::field::FALLBACK_HEADER_KEYWORDS;
use plancheck_core::{normalize, RawGrid, Vocabulary};
use tracing::{debug, trace};

use crate::columns::{distinct_fields, map_all};
use crate::config::HeaderConfig;
use crate::model::HeaderCandidate;

/// Combine `height` rows from `start` into one name per column.
pub fn combine_rows(grid: &RawGrid, start: usize, height: usize) -> Vec<String> {
    let end = (start + height).min(grid.n_rows());
    (0..grid.n_cols())
        .map(|col| {
            (start..end)
                .map(|row| grid.cell(row, col).trim())
                .filter(|cell| !cell.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// +10 per column whose normalized name contains any keyword, +1 per non-empty column.
pub fn score_names(combined: &[String], keywords: &[String]) -> u32 {
    combined
        .iter()
        .map(|name| normalize(name))
        .filter(|norm| !norm.is_empty())
        .map(|norm| {
            if keywords.iter().any(|k| norm.contains(k.as_str())) {
                11
            } else {
                1
            }
        })
        .sum()
}

/// Every candidate block that meets the non-empty minimum, in scan order.
pub fn header_candidates(
    grid: &RawGrid,
    keywords: &[String],
    vocab: &Vocabulary,
    options: &HeaderConfig,
) -> Vec<HeaderCandidate> {
    let n_rows = grid.n_rows();
    let max_start = n_rows.min(options.max_start_row);
    let mut out = Vec::new();

    for start in 0..max_start {
        let max_height = options.max_header_height.min(n_rows - start);
        for height in 1..=max_height {
            let combined = combine_rows(grid, start, height);
            let non_empty_count = combined.iter().filter(|c| !c.is_empty()).count();
            if non_empty_count < options.min_non_empty {
                continue;
            }
            let score = score_names(&combined, keywords);
            let field_matches = if options.schema_aware {
                distinct_fields(&map_all(&combined, vocab, options.fuzzy_threshold))
            } else {
                0
            };
            trace!(start, height, score, non_empty_count, field_matches, "header candidate");
            out.push(HeaderCandidate {
                start_row: start,
                height,
                combined_names: combined,
                score,
                non_empty_count,
                field_matches,
                fallback: false,
            });
        }
    }

    out
}

/// Pick the best header block, or `None` when no block meets the minimum.
pub fn detect_header(
    grid: &RawGrid,
    keywords: &[String],
    vocab: &Vocabulary,
    options: &HeaderConfig,
) -> Option<HeaderCandidate> {
    let mut best: Option<HeaderCandidate> = None;
    for candidate in header_candidates(grid, keywords, vocab, options) {
        let better = match &best {
            None => true,
            Some(b) => selection_key(&candidate) > selection_key(b),
        };
        if better {
            best = Some(candidate);
        }
    }

    if let Some(ref b) = best {
        debug!(
            table = grid.label(),
            start = b.start_row,
            height = b.height,
            score = b.score,
            field_matches = b.field_matches,
            "header selected"
        );
    }
    best
}

fn selection_key(c: &HeaderCandidate) -> (usize, u32, usize, Reverse<usize>, usize) {
    (c.field_matches, c.score, c.non_empty_count, Reverse(c.start_row), c.height)
}

/// Single-row fallback: the row with the most keyword-bearing plus non-empty
/// cells over the whole grid. Earliest row wins ties; all-empty grids yield `None`.
pub fn fallback_header_row(grid: &RawGrid) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (idx, row) in grid.rows().enumerate() {
        let mut score = 0;
        for cell in row {
            let norm = normalize(cell);
            if norm.is_empty() {
                continue;
            }
            score += 1;
            if FALLBACK_HEADER_KEYWORDS.iter().any(|k| norm.contains(k)) {
                score += 1;
            }
        }
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((idx, score));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Header candidate for the fallback row.
pub fn fallback_candidate(grid: &RawGrid, keywords: &[String]) -> Option<HeaderCandidate> {
    let row = fallback_header_row(grid)?;
    let combined = combine_rows(grid, row, 1);
    let non_empty_count = combined.iter().filter(|c| !c.is_empty()).count();
    Some(HeaderCandidate {
        start_row: row,
        height: 1,
        score: score_names(&combined, keywords),
        combined_names: combined,
        non_empty_count,
        field_matches: 0,
        fallback: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use plancheck_core::Subject;

    fn keywords() -> Vec<String> {
        Subject::Objective.header_keywords().iter().map(|k| k.to_string()).collect()
    }

    fn titled_wrapped_grid() -> RawGrid {
        RawGrid::from_rows(vec![
            vec!["Objetivos Estratégicos Institucionales", ""],
            vec!["Código", "Denominación"],
            vec!["", "de OEI"],
            vec!["OEI.01", "Mejorar la gestión institucional"],
            vec!["OEI.02", "Fortalecer la transparencia"],
        ])
    }

    #[test]
    fn combine_joins_non_empty_cells() {
        let grid = titled_wrapped_grid();
        assert_eq!(combine_rows(&grid, 1, 2), vec!["Código", "Denominación de OEI"]);
        assert_eq!(combine_rows(&grid, 0, 1), vec!["Objetivos Estratégicos Institucionales", ""]);
        // height running past the end is clipped
        assert_eq!(combine_rows(&grid, 4, 3).len(), 2);
    }

    #[test]
    fn scoring() {
        let names = vec!["Código".to_string(), "Denominación de OEI".to_string(), String::new()];
        assert_eq!(score_names(&names, &keywords()), 1 + 11);
    }

    #[test]
    fn title_row_skipped_and_wrapped_header_combined() {
        let grid = titled_wrapped_grid();
        let header = detect_header(&grid, &keywords(), Vocabulary::builtin(), &HeaderConfig::default()).unwrap();
        assert_eq!((header.start_row, header.height), (1, 2));
        assert_eq!(header.combined_names, vec!["Código", "Denominación de OEI"]);
        assert_eq!(header.field_matches, 2);
        assert!(!header.fallback);
    }

    #[test]
    fn schema_unaware_selection_falls_for_title_row() {
        let grid = titled_wrapped_grid();
        let options = HeaderConfig { schema_aware: false, ..HeaderConfig::default() };
        let header = detect_header(&grid, &keywords(), Vocabulary::builtin(), &options).unwrap();
        assert_eq!(header.start_row, 0);
    }

    #[test]
    fn detection_is_deterministic() {
        let grid = titled_wrapped_grid();
        let options = HeaderConfig::default();
        let first = detect_header(&grid, &keywords(), Vocabulary::builtin(), &options).unwrap();
        for _ in 0..5 {
            let again = detect_header(&grid, &keywords(), Vocabulary::builtin(), &options).unwrap();
            assert_eq!((again.start_row, again.height), (first.start_row, first.height));
        }
    }

    #[test]
    fn single_row_header() {
        let grid = RawGrid::from_rows(vec![
            vec!["Código", "Denominación", "Indicador"],
            vec!["OEI.01", "Mejorar la gestión institucional", "Índice de gestión"],
        ]);
        let header = detect_header(&grid, &keywords(), Vocabulary::builtin(), &HeaderConfig::default()).unwrap();
        assert_eq!((header.start_row, header.height), (0, 1));
        assert_eq!(header.field_matches, 3);
    }

    #[test]
    fn search_window_is_bounded() {
        let grid = titled_wrapped_grid();
        let options = HeaderConfig { max_start_row: 1, max_header_height: 1, ..HeaderConfig::default() };
        let all = header_candidates(&grid, &keywords(), Vocabulary::builtin(), &options);
        assert_eq!(all.len(), 1);
        assert_eq!((all[0].start_row, all[0].height), (0, 1));
    }

    #[test]
    fn min_non_empty_rejects_sparse_blocks() {
        let grid = titled_wrapped_grid();
        let options = HeaderConfig { min_non_empty: 2, ..HeaderConfig::default() };
        let all = header_candidates(&grid, &keywords(), Vocabulary::builtin(), &options);
        assert!(all.iter().all(|c| c.non_empty_count >= 2));
        assert!(!all.iter().any(|c| c.start_row == 0 && c.height == 1));
    }

    #[test]
    fn blank_leading_rows_need_the_fallback() {
        let mut rows = vec![vec![String::new(), String::new()]; 6];
        rows.push(vec!["Código".into(), "Denominación".into()]);
        rows.push(vec!["OEI.01".into(), "Mejorar".into()]);
        let grid = RawGrid::new(rows);

        assert!(detect_header(&grid, &keywords(), Vocabulary::builtin(), &HeaderConfig::default()).is_none());
        let fb = fallback_candidate(&grid, &keywords()).unwrap();
        assert_eq!(fb.start_row, 6);
        assert!(fb.fallback);
    }

    #[test]
    fn fallback_on_empty_grid() {
        let grid = RawGrid::from_rows(vec![vec!["", " "], vec!["", ""]]);
        assert_eq!(fallback_header_row(&grid), None);
        assert_eq!(fallback_header_row(&RawGrid::new(Vec::new())), None);
    }
}
