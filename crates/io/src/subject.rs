// Subject tagging: which grids list objectives and which list actions.

use std::collections::BTreeMap;

use plancheck_core::{RawGrid, Subject};
use tracing::debug;

/// Subjects whose detection keywords occur in the grid's flattened text.
/// A grid may carry both tags.
pub fn tag(grid: &RawGrid) -> Vec<Subject> {
    let text = grid.flattened_text();
    Subject::ALL
        .into_iter()
        .filter(|s| s.detection_keywords().iter().any(|k| text.contains(k)))
        .collect()
}

/// The first tagged grid per subject, in document order.
pub fn select_tables(grids: Vec<RawGrid>) -> BTreeMap<Subject, RawGrid> {
    let mut selected = BTreeMap::new();
    for grid in grids {
        for subject in tag(&grid) {
            if !selected.contains_key(&subject) {
                debug!(table = grid.label(), subject = %subject, "table selected");
                selected.insert(subject, grid.clone());
            }
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(label: &str, rows: Vec<Vec<&str>>) -> RawGrid {
        RawGrid::from_rows(rows).with_label(label)
    }

    #[test]
    fn tags_by_keywords() {
        let oei = grid("t1", vec![vec!["Código", "Denominación"], vec!["OEI.01", "Mejorar"]]);
        let aei = grid("t2", vec![vec!["ACCIONES ESTRATÉGICAS INSTITUCIONALES"]]);
        let both = grid("t3", vec![vec!["Objetivo estratégico", "Acción"]]);
        let none = grid("t4", vec![vec!["Presupuesto", "2025"]]);

        assert_eq!(tag(&oei), vec![Subject::Objective]);
        assert_eq!(tag(&aei), vec![Subject::Action]);
        assert_eq!(tag(&both), vec![Subject::Objective, Subject::Action]);
        assert!(tag(&none).is_empty());
    }

    #[test]
    fn first_tagged_grid_wins() {
        let grids = vec![
            grid("budget", vec![vec!["Presupuesto"]]),
            grid("objectives", vec![vec!["OEI.01", "Mejorar"]]),
            grid("objectives again", vec![vec!["OEI.02", "Fortalecer"]]),
            grid("actions", vec![vec!["AEI.01.01", "Capacitar"]]),
        ];
        let selected = select_tables(grids);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[&Subject::Objective].label(), "objectives");
        assert_eq!(selected[&Subject::Action].label(), "actions");
    }
}
