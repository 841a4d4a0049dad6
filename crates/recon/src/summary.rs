use plancheck_core::Subject;

use crate::model::{Classification, ComparisonReport, ComparisonSummary, MatchResult};

/// Count results per classification. Percentages are of `total`, rounded to
/// one decimal, and all zero for an empty run.
pub fn compute_summary(results: &[MatchResult]) -> ComparisonSummary {
    let mut exact = 0;
    let mut partial = 0;
    let mut no_match = 0;

    for r in results {
        match r.classification {
            Classification::Exact => exact += 1,
            Classification::Partial => partial += 1,
            Classification::NoMatch => no_match += 1,
        }
    }

    let total = results.len();
    ComparisonSummary {
        total,
        exact,
        partial,
        no_match,
        exact_pct: percent(exact, total),
        partial_pct: percent(partial, total),
        no_match_pct: percent(no_match, total),
    }
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 * 1000.0 / total as f64).round() / 10.0
}

/// One summary row per report, in subject order (objectives before actions).
pub fn consolidate(reports: &[ComparisonReport]) -> Vec<(Subject, ComparisonSummary)> {
    let mut rows: Vec<(Subject, ComparisonSummary)> =
        reports.iter().map(|r| (r.meta.subject, r.summary.clone())).collect();
    rows.sort_by_key(|(subject, _)| *subject);
    rows
}
