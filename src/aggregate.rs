//! Chart-ready aggregate series.
//!
//! Every builder is a pure function of the filtered records. Malformed values
//! never fail a build: a missing rating or place lands in the `"Unknown"`
//! bucket and an unparseable date is left out of the timeline.
//!
//! | Chart | Builder |
//! |-------|---------|
//! | bar | [`rating_histogram`] |
//! | stacked bar | [`place_by_rating_matrix`] |
//! | timeline | [`monthly_series`] |
//! | pie | [`place_histogram`] |
//! | word cloud | [`word_cloud`] |

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{FieldValue, Record};
use crate::sanitize::{clean_thread, rank_words, tokenize_for_cloud, WordWeight};

/// Bucket label for missing values.
pub const UNKNOWN_BUCKET: &str = "Unknown";

/// A labelled count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub count: usize,
}

fn bucket_key(value: Option<&FieldValue>) -> String {
    match value {
        Some(v) if v.is_truthy() => v.to_string(),
        _ => UNKNOWN_BUCKET.to_string(),
    }
}

fn histogram<'a, I, F>(records: I, key: F) -> Vec<Bucket>
where
    I: IntoIterator<Item = &'a Record>,
    F: Fn(&Record) -> String,
{
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for record in records {
        *counts.entry(key(record)).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(label, count)| Bucket { label, count })
        .collect()
}

/// Reviews per rating, in first-seen order.
pub fn rating_histogram<'a, I>(records: I) -> Vec<Bucket>
where
    I: IntoIterator<Item = &'a Record>,
{
    histogram(records, |r| bucket_key(r.rating.as_ref()))
}

/// Reviews per place, in first-seen order.
pub fn place_histogram<'a, I>(records: I) -> Vec<Bucket>
where
    I: IntoIterator<Item = &'a Record>,
{
    histogram(records, |r| bucket_key(r.place.as_ref()))
}

/// One stacked-bar series: counts of a single rating across all places.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingSeries {
    pub rating: String,
    pub label: String,
    pub counts: Vec<usize>,
}

/// Place × rating counts shaped for a stacked bar chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceRatingMatrix {
    /// Category axis, in first-seen order (may include `"Unknown"`).
    pub places: Vec<String>,
    /// One series per distinct rating, ratings in ascending string order.
    pub series: Vec<RatingSeries>,
}

/// Nested `place -> rating -> count` table turned into per-rating series.
///
/// Records without a rating are counted under their place but belong to no
/// series, so they do not appear in the stacks.
pub fn place_by_rating_matrix<'a, I>(records: I) -> PlaceRatingMatrix
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut table: IndexMap<String, IndexMap<String, usize>> = IndexMap::new();
    let mut ratings: BTreeSet<String> = BTreeSet::new();

    for record in records {
        let rating = bucket_key(record.rating.as_ref());
        if record.rating.as_ref().is_some_and(FieldValue::is_truthy) {
            ratings.insert(rating.clone());
        }
        *table
            .entry(bucket_key(record.place.as_ref()))
            .or_default()
            .entry(rating)
            .or_insert(0) += 1;
    }

    let series = ratings
        .into_iter()
        .map(|rating| RatingSeries {
            label: format!("{} Stars", rating),
            counts: table
                .values()
                .map(|by_rating| by_rating.get(&rating).copied().unwrap_or(0))
                .collect(),
            rating,
        })
        .collect();

    PlaceRatingMatrix {
        places: table.into_keys().collect(),
        series,
    }
}

/// Reviews in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthBucket {
    /// Short label such as `"Nov 2021"`.
    pub label: String,
    pub year: i32,
    pub month: u32,
    pub count: usize,
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

const DATE_FORMATS: [&str; 8] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%d %b %Y",
    "%d %B %Y",
];

/// Parse a date field into a calendar date.
///
/// Integers are epoch milliseconds, which is how the backend serializes
/// datetime columns.
pub fn parse_date(value: &FieldValue) -> Option<NaiveDate> {
    match value {
        FieldValue::Integer(ms) => DateTime::from_timestamp_millis(*ms).map(|d| d.date_naive()),
        FieldValue::Float(ms) if ms.is_finite() => {
            DateTime::from_timestamp_millis(*ms as i64).map(|d| d.date_naive())
        }
        FieldValue::Text(s) => parse_date_str(s.trim()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        })
}

/// The date a record is placed on the timeline by: `date` when set,
/// otherwise `dates`.
pub fn record_date(record: &Record) -> Option<NaiveDate> {
    let field = match record.date.as_ref() {
        Some(d) if d.is_truthy() => d,
        _ => record.dates.as_ref()?,
    };
    parse_date(field)
}

/// Reviews per month, oldest first. Records without a parseable date are
/// skipped.
pub fn monthly_series<'a, I>(records: I) -> Vec<MonthBucket>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut months: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for date in records.into_iter().filter_map(record_date) {
        *months.entry((date.year(), date.month())).or_insert(0) += 1;
    }
    months
        .into_iter()
        .filter_map(|((year, month), count)| {
            let first = NaiveDate::from_ymd_opt(year, month, 1)?;
            Some(MonthBucket {
                label: first.format("%b %Y").to_string(),
                year,
                month,
                count,
            })
        })
        .collect()
}

/// Concatenated text the word cloud is computed from.
pub fn word_cloud_text<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut text = String::new();
    for record in records {
        let thread = clean_thread(&record.truthy_text("message_thread"));
        for part in [
            record.truthy_text("review_text"),
            thread,
            record.truthy_text("subject"),
            record.truthy_text("place"),
        ] {
            text.push(' ');
            text.push_str(&part);
        }
    }
    text
}

/// Ranked word-cloud input: the `limit` most frequent words.
pub fn word_cloud<'a, I>(records: I, limit: usize) -> Vec<WordWeight>
where
    I: IntoIterator<Item = &'a Record>,
{
    rank_words(tokenize_for_cloud(&word_cloud_text(records)), limit)
}
