//! Row completeness and free-text search.
//!
//! Both filters are pure: they borrow records and return a new sequence of
//! references in input order. An empty result is a normal outcome, never an
//! error.

use crate::models::{Record, REQUIRED_FIELDS};

/// Fields concatenated into the search haystack, in this order.
pub const SEARCH_FIELDS: [&str; 5] = [
    "customer_name",
    "subject",
    "place",
    "review_text",
    "message_thread",
];

/// A record is complete when every required field is present and its
/// display string is non-blank. A rating of `0` is present.
pub fn is_complete(record: &Record) -> bool {
    REQUIRED_FIELDS.iter().all(|field| match record.get(field) {
        Some(value) => !value.to_string().trim().is_empty(),
        None => false,
    })
}

/// Keep only complete records.
pub fn filter_complete<'a, I>(records: I) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    records.into_iter().filter(|r| is_complete(r)).collect()
}

/// Lower-cased, space-joined text the search query is matched against.
pub fn search_haystack(record: &Record) -> String {
    SEARCH_FIELDS
        .iter()
        .map(|field| record.text(field))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Keep records whose haystack contains `query`, case-insensitively.
/// An empty query keeps everything.
pub fn filter_search<'a, I>(records: I, query: &str) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    if query.is_empty() {
        return records.into_iter().collect();
    }
    let needle = query.to_lowercase();
    records
        .into_iter()
        .filter(|r| search_haystack(r).contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;

    fn text(s: &str) -> Option<FieldValue> {
        Some(FieldValue::Text(s.to_string()))
    }

    fn complete(name: &str, review: &str) -> Record {
        Record {
            customer_name: text(name),
            rating: Some(FieldValue::Integer(5)),
            place: text("Lake Loft"),
            review_text: text(review),
            dates: text("Jun 10 – 12"),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_or_blank_field_is_incomplete() {
        let mut r = complete("Ana", "Lovely");
        assert!(is_complete(&r));
        r.place = text("   ");
        assert!(!is_complete(&r));
        r.place = None;
        assert!(!is_complete(&r));
    }

    #[test]
    fn test_zero_and_false_count_as_present() {
        let mut r = complete("Ana", "Lovely");
        r.rating = Some(FieldValue::Integer(0));
        assert!(is_complete(&r));
        r.rating = Some(FieldValue::Bool(false));
        assert!(is_complete(&r));
        r.rating = text("");
        assert!(!is_complete(&r));
    }

    #[test]
    fn test_filter_complete_is_idempotent() {
        let mut partial = complete("Ben", "Fine");
        partial.dates = None;
        let records = vec![complete("Ana", "Lovely"), partial, complete("Cy", "Great")];

        let once = filter_complete(&records);
        let twice = filter_complete(once.iter().copied());
        assert_eq!(once.len(), 2);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_query_is_identity() {
        let records = vec![complete("Ana", "Lovely"), complete("Ben", "Fine")];
        let complete_rows = filter_complete(&records);
        assert_eq!(filter_search(complete_rows.iter().copied(), "").len(), complete_rows.len());
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let mut with_thread = complete("Ben", "Fine");
        with_thread.message_thread = text("Could you add a KETTLE?");
        let mut with_subject = complete("Cy", "Ok");
        with_subject.subject = text("Cy wrote you a review");
        let records = vec![complete("Ana", "Lovely"), with_thread, with_subject];

        let hits = filter_search(&records, "kettle");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text("customer_name"), "Ben");

        let hits = filter_search(&records, "WROTE YOU");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text("customer_name"), "Cy");

        assert!(filter_search(&records, "no such phrase").is_empty());
    }

    #[test]
    fn test_search_spans_field_boundary() {
        // Fields are joined with a space, so a query may straddle two fields.
        let records = vec![complete("Ana", "Lovely")];
        assert_eq!(filter_search(&records, "lake loft lovely").len(), 1);
    }
}
