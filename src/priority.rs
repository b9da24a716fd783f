//! Suggestion-priority ordering.
//!
//! Reviews flagged by the backend as containing an improvement suggestion are
//! surfaced first. The ordering is a stable partition, not a comparator sort:
//! order within each partition is exactly the input order.

use crate::models::{FieldValue, Record};

/// Ratings at or above this value count as positive.
pub const POSITIVE_RATING: f64 = 4.0;

/// Only the boolean `true` counts; `"true"`, `1` and missing values do not.
pub fn has_suggestion(record: &Record) -> bool {
    matches!(record.has_suggestion, Some(FieldValue::Bool(true)))
}

/// Move every record with a suggestion ahead of the rest, stably.
pub fn prioritize<'a, I>(records: I) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    let (mut flagged, rest): (Vec<&Record>, Vec<&Record>) =
        records.into_iter().partition(|r| has_suggestion(r));
    flagged.extend(rest);
    flagged
}

/// Keep positive reviews (numeric rating of at least 4) that carry a
/// suggestion. Backs the "only positive with suggestion" toggle.
pub fn positive_with_suggestion<'a, I>(records: I) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    records
        .into_iter()
        .filter(|r| {
            has_suggestion(r)
                && r
                    .rating
                    .as_ref()
                    .and_then(FieldValue::as_f64)
                    .is_some_and(|rating| rating >= POSITIVE_RATING)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, suggestion: Option<FieldValue>) -> Record {
        Record {
            customer_name: Some(FieldValue::Text(name.to_string())),
            has_suggestion: suggestion,
            ..Default::default()
        }
    }

    fn names(records: &[&Record]) -> Vec<String> {
        records.iter().map(|r| r.text("customer_name")).collect()
    }

    #[test]
    fn test_prioritize_partitions_stably() {
        let yes = || Some(FieldValue::Bool(true));
        let no = || Some(FieldValue::Bool(false));
        let records = vec![
            record("A", no()),
            record("B", yes()),
            record("C", no()),
            record("D", yes()),
        ];
        assert_eq!(names(&prioritize(&records)), vec!["B", "D", "A", "C"]);
    }

    #[test]
    fn test_only_boolean_true_is_prioritized() {
        let records = vec![
            record("A", None),
            record("B", Some(FieldValue::Text("true".into()))),
            record("C", Some(FieldValue::Integer(1))),
            record("D", Some(FieldValue::Bool(true))),
        ];
        assert_eq!(names(&prioritize(&records)), vec!["D", "A", "B", "C"]);
    }

    #[test]
    fn test_prioritize_without_flags_keeps_order() {
        let records = vec![record("A", None), record("B", None), record("C", None)];
        assert_eq!(names(&prioritize(&records)), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_positive_with_suggestion() {
        let with_rating = |name: &str, rating: FieldValue, flag: bool| Record {
            rating: Some(rating),
            ..record(name, Some(FieldValue::Bool(flag)))
        };
        let records = vec![
            with_rating("A", FieldValue::Integer(5), true),
            with_rating("B", FieldValue::Text("4".into()), true),
            with_rating("C", FieldValue::Integer(3), true),
            with_rating("D", FieldValue::Integer(5), false),
            with_rating("E", FieldValue::Text("n/a".into()), true),
        ];
        assert_eq!(names(&positive_with_suggestion(&records)), vec!["A", "B"]);
    }
}
