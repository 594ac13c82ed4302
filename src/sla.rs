// SLA evaluation: elapsed service duration and the ternary verdict.
//
// Both functions are pure; the enrichment pass feeds them per record. "No
// data" is a real outcome here, distinct from zero days: an open work order
// (no TÉRMINO) or a record without a resolvable target must never count as
// either within or breached.
use chrono::NaiveDate;

use crate::types::SlaResult;

/// Elapsed service duration in whole days, `TÉRMINO − AUTORIZAÇÃO`.
///
/// Absent when either date is missing. The difference is taken as-is: a
/// completion recorded before the authorization yields a negative value,
/// which is a data-quality defect in the source sheet. Callers flag those
/// (see `EnrichSummary.negative_elapsed`) but the value is kept.
pub fn elapsed_days(autorizacao: Option<NaiveDate>, termino: Option<NaiveDate>) -> Option<i64> {
    match (autorizacao, termino) {
        (Some(start), Some(end)) => Some((end - start).num_days()),
        _ => None,
    }
}

/// Classify an elapsed duration against a target.
///
/// - `SemDado` when either side is absent.
/// - `Dentro` when elapsed ≤ target.
/// - `Fora` otherwise.
///
/// The comparison is literal, matching the upstream contract: a negative
/// elapsed value (completion before authorization) with a non-negative
/// target classifies as `Dentro`. That behavior is pinned by a test below;
/// changing it means changing the contract, not this function alone.
pub fn classify(elapsed: Option<i64>, target: Option<i64>) -> SlaResult {
    match (elapsed, target) {
        (Some(dias), Some(meta)) => {
            if dias <= meta {
                SlaResult::Dentro
            } else {
                SlaResult::Fora
            }
        }
        _ => SlaResult::SemDado,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn elapsed_is_whole_days_between_authorization_and_completion() {
        assert_eq!(elapsed_days(date(2024, 1, 1), date(2024, 1, 20)), Some(19));
        assert_eq!(elapsed_days(date(2024, 1, 1), date(2024, 1, 1)), Some(0));
    }

    #[test]
    fn elapsed_is_absent_when_either_date_missing() {
        assert_eq!(elapsed_days(None, date(2024, 1, 20)), None);
        assert_eq!(elapsed_days(date(2024, 1, 1), None), None);
        assert_eq!(elapsed_days(None, None), None);
    }

    #[test]
    fn elapsed_goes_negative_when_completion_precedes_authorization() {
        assert_eq!(elapsed_days(date(2024, 1, 20), date(2024, 1, 1)), Some(-19));
    }

    #[test]
    fn classify_covers_the_ternary_truth_table() {
        assert_eq!(classify(Some(5), Some(10)), SlaResult::Dentro);
        assert_eq!(classify(Some(10), Some(10)), SlaResult::Dentro);
        assert_eq!(classify(Some(15), Some(10)), SlaResult::Fora);
        assert_eq!(classify(None, Some(10)), SlaResult::SemDado);
        assert_eq!(classify(Some(5), None), SlaResult::SemDado);
        assert_eq!(classify(None, None), SlaResult::SemDado);
    }

    #[test]
    fn classify_negative_elapsed_is_dentro_by_contract() {
        // Completion recorded before authorization compares literally; the
        // enrichment summary flags these rather than reclassifying them.
        assert_eq!(classify(Some(-19), Some(15)), SlaResult::Dentro);
        assert_eq!(classify(Some(-1), Some(0)), SlaResult::Dentro);
    }
}
