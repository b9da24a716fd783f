//! Derives the data each view displays from a [`Session`].
//!
//! Every render recomputes from the dataset and view state:
//!
//! ```text
//! dataset ─▶ complete ─▶ prioritize ─▶ [positive+suggestion] ─▶ search
//!                                                                 │
//!                    ┌──────────────────┬─────────────────────────┤
//!                    ▼                  ▼                         ▼
//!              page (table,       group raw dataset          aggregate
//!                bubble)            (grouped)                 (charts)
//! ```

use serde::Serialize;
use std::fmt;

use crate::aggregate::{
    monthly_series, place_by_rating_matrix, place_histogram, rating_histogram, word_cloud,
    Bucket, MonthBucket, PlaceRatingMatrix,
};
use crate::filter::{filter_complete, filter_search};
use crate::group::displayed_groups;
use crate::layout::{PositionedWord, WordLayout};
use crate::models::{FieldValue, Record, REQUIRED_FIELDS};
use crate::paginate::page;
use crate::priority::{positive_with_suggestion, prioritize};
use crate::sanitize::{clean_thread, WordWeight, DEFAULT_CLOUD_LIMIT};
use crate::view::{ChartKind, Session, ViewMode, ViewState};

/// Columns shown in the table, bubble and grouped views.
pub const DISPLAY_COLUMNS: [&str; 7] = [
    "subject",
    "customer_name",
    "rating",
    "place",
    "review_link",
    "dates",
    "message_thread",
];

/// Records that survive the filter pipeline, in display order.
pub fn filtered_records<'a>(dataset: &'a [Record], view: &ViewState) -> Vec<&'a Record> {
    let mut records = prioritize(filter_complete(dataset));
    if view.positive_with_suggestion {
        records = positive_with_suggestion(records);
    }
    filter_search(records, &view.search_query)
}

/// Render-time collaborators and limits.
pub struct RenderOptions<'a> {
    pub word_cloud_limit: usize,
    pub layout: &'a dyn WordLayout,
}

/// Pagination controls; present only when there is more than one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationControls {
    pub current_page: usize,
    pub total_pages: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

/// Row counts behind the "Showing N rows" line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub shown: usize,
    pub total: usize,
}

/// A labelled value on a card or grouped entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardField {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BubbleCard {
    pub customer_name: String,
    pub rating: String,
    pub color: &'static str,
    pub fields: Vec<CardField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupView {
    pub customer: String,
    pub count: usize,
    pub reviews: Vec<Vec<CardField>>,
}

/// Series fed to the charting layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "chart", content = "data", rename_all = "lowercase")]
pub enum ChartData {
    Bar(Vec<Bucket>),
    Stacked(PlaceRatingMatrix),
    Timeline(Vec<MonthBucket>),
    Pie(Vec<Bucket>),
    WordCloud {
        words: Vec<WordWeight>,
        placed: Vec<PositionedWord>,
    },
}

/// What the main area of the page shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Content {
    Loading,
    /// The dataset has no rows at all.
    NoData,
    /// Rows exist but none are complete or match the search.
    NoMatches { total: usize },
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Bubble { cards: Vec<BubbleCard> },
    Grouped { groups: Vec<GroupView> },
    Chart { data: ChartData },
}

/// A complete rendering of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rendered {
    pub mode: ViewMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartKind>,
    pub search_query: String,
    pub loading: bool,
    pub error: Option<String>,
    pub confirm_unload: bool,
    pub summary: Option<Summary>,
    pub pagination: Option<PaginationControls>,
    pub content: Content,
}

/// Bubble background colour by rating tier. Tiers use the rating's integer
/// prefix, so 4.7 is still a 4.
pub fn bubble_color(rating: Option<i64>) -> &'static str {
    match rating {
        Some(r) if r >= 5 => "#4CAF50",
        Some(4) => "#8BC34A",
        Some(3) => "#FFC107",
        Some(2) => "#FF9800",
        _ => "#F44336",
    }
}

fn column_label(column: &str) -> String {
    if column == "review_link" {
        return "Review Link".to_string();
    }
    let mut chars = column.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Cell text for a column; message threads are shown cleaned.
fn cell(record: &Record, column: &str) -> String {
    match column {
        "message_thread" => clean_thread(&record.text(column)),
        _ => record.text(column),
    }
}

/// Labelled, non-empty fields of a record, skipping `skip`.
fn card_fields(record: &Record, skip: &[&str]) -> Vec<CardField> {
    DISPLAY_COLUMNS
        .iter()
        .filter(|column| !skip.contains(*column))
        .filter(|column| record.get(column).is_some_and(|v| v.is_truthy()))
        .map(|column| CardField {
            label: column_label(column),
            value: cell(record, column),
        })
        .filter(|field| !field.value.is_empty())
        .collect()
}

/// Render the session's active view.
pub fn render(session: &Session, options: &RenderOptions<'_>) -> Rendered {
    let view = &session.view;
    let mut rendered = Rendered {
        mode: view.mode,
        chart: (view.mode == ViewMode::Charts).then_some(view.chart),
        search_query: view.search_query.clone(),
        loading: session.loading,
        error: session.error.clone(),
        confirm_unload: session.confirm_unload(),
        summary: None,
        pagination: None,
        content: Content::Loading,
    };
    if session.loading {
        return rendered;
    }

    let total = session.dataset.len();
    if total == 0 {
        rendered.content = Content::NoData;
        return rendered;
    }

    let filtered = filtered_records(&session.dataset, view);
    if filtered.is_empty() {
        rendered.content = Content::NoMatches { total };
        return rendered;
    }
    rendered.summary = Some(Summary {
        shown: filtered.len(),
        total,
    });

    rendered.content = match view.mode {
        ViewMode::Table | ViewMode::Bubble => {
            let current = page(&filtered, view.page, session.page_size);
            if current.total_pages > 1 {
                rendered.pagination = Some(PaginationControls {
                    current_page: current.current_page,
                    total_pages: current.total_pages,
                    has_previous: current.current_page > 1,
                    has_next: current.current_page < current.total_pages,
                });
            }
            if view.mode == ViewMode::Table {
                Content::Table {
                    columns: DISPLAY_COLUMNS.iter().map(|c| c.to_string()).collect(),
                    rows: current
                        .items
                        .iter()
                        .map(|r| DISPLAY_COLUMNS.iter().map(|c| cell(r, c)).collect())
                        .collect(),
                }
            } else {
                Content::Bubble {
                    cards: current
                        .items
                        .iter()
                        .map(|r| BubbleCard {
                            customer_name: r.text("customer_name"),
                            rating: r.text("rating"),
                            color: bubble_color(
                                r.rating.as_ref().and_then(FieldValue::leading_integer),
                            ),
                            fields: card_fields(r, &["customer_name", "rating"]),
                        })
                        .collect(),
                }
            }
        }
        ViewMode::Grouped => Content::Grouped {
            groups: displayed_groups(session.dataset.iter())
                .into_iter()
                .map(|group| GroupView {
                    count: group.count(),
                    reviews: group
                        .reviews
                        .iter()
                        .map(|r| card_fields(r, &["customer_name"]))
                        .collect(),
                    customer: group.customer,
                })
                .collect(),
        },
        ViewMode::Charts => Content::Chart {
            data: chart_data(view.chart, &filtered, options),
        },
    };
    rendered
}

fn chart_data(chart: ChartKind, records: &[&Record], options: &RenderOptions<'_>) -> ChartData {
    let records = records.iter().copied();
    match chart {
        ChartKind::Bar => ChartData::Bar(rating_histogram(records)),
        ChartKind::Stacked => ChartData::Stacked(place_by_rating_matrix(records)),
        ChartKind::Timeline => ChartData::Timeline(monthly_series(records)),
        ChartKind::Pie => ChartData::Pie(place_histogram(records)),
        ChartKind::WordCloud => {
            let words = word_cloud(records, options.word_cloud_limit);
            let placed = options.layout.place(&words);
            ChartData::WordCloud { words, placed }
        }
    }
}

impl Default for RenderOptions<'static> {
    fn default() -> Self {
        static LAYOUT: std::sync::LazyLock<crate::layout::SpiralLayout> =
            std::sync::LazyLock::new(crate::layout::SpiralLayout::default);
        Self {
            word_cloud_limit: DEFAULT_CLOUD_LIMIT,
            layout: &*LAYOUT,
        }
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref error) = self.error {
            writeln!(f, "Error: {}", error)?;
        }
        match &self.content {
            Content::Loading => return writeln!(f, "Loading..."),
            Content::NoData => return writeln!(f, "No data available"),
            Content::NoMatches { total } => {
                writeln!(
                    f,
                    "No rows found with all required fields ({}) or search keyword.",
                    REQUIRED_FIELDS.join(", ")
                )?;
                return writeln!(f, "Showing {} total rows, but none matched the filter.", total);
            }
            _ => {}
        }

        if let Some(ref summary) = self.summary {
            writeln!(
                f,
                "Showing {} rows with complete data (filtered from {} total rows)",
                summary.shown, summary.total
            )?;
        }
        if !self.search_query.is_empty() {
            writeln!(f, "Search: {}", self.search_query)?;
        }
        writeln!(f)?;

        match &self.content {
            Content::Table { columns, rows } => {
                writeln!(f, "{}", columns.join(" | "))?;
                for row in rows {
                    writeln!(f, "{}", row.join(" | "))?;
                }
            }
            Content::Bubble { cards } => {
                for card in cards {
                    writeln!(f, "[{}] {} ({}⭐)", card.color, card.customer_name, card.rating)?;
                    for field in &card.fields {
                        writeln!(f, "    {}: {}", field.label, field.value)?;
                    }
                }
            }
            Content::Grouped { groups } => {
                for group in groups {
                    writeln!(f, "{} ({})", group.customer, plural(group.count, "review"))?;
                    for review in &group.reviews {
                        let line: Vec<String> = review
                            .iter()
                            .map(|field| format!("{}: {}", field.label, field.value))
                            .collect();
                        writeln!(f, "  - {}", line.join("  "))?;
                    }
                }
            }
            Content::Chart { data } => write_chart(f, data)?,
            Content::Loading | Content::NoData | Content::NoMatches { .. } => {}
        }

        if let Some(ref p) = self.pagination {
            writeln!(f)?;
            writeln!(f, "Page {} of {}", p.current_page, p.total_pages)?;
        }
        Ok(())
    }
}

fn write_buckets(f: &mut fmt::Formatter<'_>, title: &str, buckets: &[Bucket]) -> fmt::Result {
    writeln!(f, "{}", title)?;
    for bucket in buckets {
        writeln!(f, "  {:<24} {}", bucket.label, bucket.count)?;
    }
    Ok(())
}

fn write_chart(f: &mut fmt::Formatter<'_>, data: &ChartData) -> fmt::Result {
    match data {
        ChartData::Bar(buckets) => write_buckets(f, "Reviews by Rating", buckets),
        ChartData::Pie(buckets) => write_buckets(f, "Reviews by Place", buckets),
        ChartData::Stacked(matrix) => {
            writeln!(f, "Reviews by Place and Rating")?;
            writeln!(f, "  places: {}", matrix.places.join(", "))?;
            for series in &matrix.series {
                let counts: Vec<String> = series.counts.iter().map(|c| c.to_string()).collect();
                writeln!(f, "  {:<10} {}", series.label, counts.join(", "))?;
            }
            Ok(())
        }
        ChartData::Timeline(months) => {
            writeln!(f, "Reviews Timeline")?;
            for month in months {
                writeln!(f, "  {:<10} {}", month.label, month.count)?;
            }
            Ok(())
        }
        ChartData::WordCloud { words, .. } => {
            writeln!(f, "Word Cloud")?;
            for word in words {
                writeln!(f, "  {:<24} {}", word.word, word.count)?;
            }
            Ok(())
        }
    }
}
