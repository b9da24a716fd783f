//! View state and the session reducer.
//!
//! All user interaction is expressed as an [`Event`] fed to
//! [`Session::dispatch`], which returns the next state. A front end (the CLI,
//! the HTTP session server, or any UI toolkit) only dispatches events and
//! re-renders from the returned state with [`crate::render::render`].
//!
//! # Uploads
//!
//! Uploads are the only asynchronous step. The caller allocates a
//! monotonically increasing generation id, dispatches
//! [`Event::UploadStarted`], runs the request, then dispatches
//! [`Event::UploadFinished`] with the same id. A finish whose generation is
//! not the active upload is dropped, so a superseded request can never
//! overwrite a newer dataset.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::models::{Dataset, Record};
use crate::paginate::{is_navigable, total_pages, DEFAULT_PAGE_SIZE};
use crate::preferences::Preferences;
use crate::render::filtered_records;

/// The four mutually exclusive views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Table,
    Bubble,
    Grouped,
    Charts,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Bubble => "bubble",
            Self::Grouped => "grouped",
            Self::Charts => "charts",
        }
    }

    /// Table and bubble views are sliced into pages; grouped and charts
    /// render the whole filtered set.
    pub fn is_paginated(self) -> bool {
        matches!(self, Self::Table | Self::Bubble)
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "table" => Ok(Self::Table),
            "bubble" => Ok(Self::Bubble),
            "grouped" => Ok(Self::Grouped),
            "charts" => Ok(Self::Charts),
            other => bail!(
                "Unknown view mode: '{}'. Use table, bubble, grouped, or charts.",
                other
            ),
        }
    }
}

/// Chart selector inside the charts view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Bar,
    Stacked,
    Timeline,
    Pie,
    WordCloud,
}

impl ChartKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Stacked => "stacked",
            Self::Timeline => "timeline",
            Self::Pie => "pie",
            Self::WordCloud => "wordcloud",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bar" => Ok(Self::Bar),
            "stacked" => Ok(Self::Stacked),
            "timeline" => Ok(Self::Timeline),
            "pie" => Ok(Self::Pie),
            "wordcloud" => Ok(Self::WordCloud),
            other => bail!(
                "Unknown chart: '{}'. Use bar, stacked, timeline, pie, or wordcloud.",
                other
            ),
        }
    }
}

/// User-facing view state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub mode: ViewMode,
    pub chart: ChartKind,
    pub search_query: String,
    /// 1-based page number.
    pub page: usize,
    pub positive_with_suggestion: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            mode: ViewMode::default(),
            chart: ChartKind::default(),
            search_query: String::new(),
            page: 1,
            positive_with_suggestion: false,
        }
    }
}

/// Result of an upload as seen by the reducer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
    Loaded { records: Vec<Record> },
    Failed { error: String },
}

/// Every state transition of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SelectView { mode: ViewMode },
    SelectChart { chart: ChartKind },
    Search { query: String },
    GoToPage { page: usize },
    NextPage,
    PreviousPage,
    TogglePositiveWithSuggestion,
    UploadStarted { generation: u64 },
    UploadFinished { generation: u64, outcome: UploadOutcome },
    Reset,
}

impl Event {
    /// Upload events are issued by whoever runs the request, never by a
    /// client directly.
    pub fn is_upload(&self) -> bool {
        matches!(self, Self::UploadStarted { .. } | Self::UploadFinished { .. })
    }
}

/// Dataset plus view state: everything a render needs.
#[derive(Debug, Clone)]
pub struct Session {
    pub dataset: Dataset,
    pub view: ViewState,
    pub loading: bool,
    pub error: Option<String>,
    pub page_size: usize,
    /// Highest generation ever started.
    generation: u64,
    /// Generation whose result is still awaited.
    active_upload: Option<u64>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Session {
    pub fn new(page_size: usize) -> Self {
        Self {
            dataset: Arc::from(Vec::new()),
            view: ViewState::default(),
            loading: false,
            error: None,
            page_size,
            generation: 0,
            active_upload: None,
        }
    }

    /// Restore durable preferences into a fresh session.
    pub fn with_preferences(mut self, prefs: &Preferences) -> Self {
        self.view.mode = prefs.view_mode;
        self.view.positive_with_suggestion = prefs.positive_with_suggestion;
        if let Some(page) = prefs.current_page {
            self.view.page = page.max(1);
        }
        self
    }

    /// Snapshot of the durable preferences.
    pub fn preferences(&self) -> Preferences {
        Preferences {
            view_mode: self.view.mode,
            positive_with_suggestion: self.view.positive_with_suggestion,
            current_page: Some(self.view.page),
        }
    }

    /// Apply one event and return the next state.
    pub fn dispatch(mut self, event: Event) -> Self {
        self.apply(event);
        self
    }

    /// In-place form of [`Session::dispatch`].
    pub fn apply(&mut self, event: Event) {
        if self.loading && !event.is_upload() && event != Event::Reset {
            tracing::debug!(?event, "ignoring event while an upload is in flight");
            return;
        }

        match event {
            Event::SelectView { mode } => self.view.mode = mode,
            Event::SelectChart { chart } => self.view.chart = chart,
            Event::Search { query } => {
                self.view.search_query = query;
                self.view.page = 1;
            }
            Event::GoToPage { page } => self.go_to(page),
            Event::NextPage => self.go_to(self.view.page.saturating_add(1)),
            Event::PreviousPage => self.go_to(self.view.page.saturating_sub(1)),
            Event::TogglePositiveWithSuggestion => {
                self.view.positive_with_suggestion = !self.view.positive_with_suggestion;
                self.view.page = 1;
            }
            Event::UploadStarted { generation } => {
                if generation <= self.generation {
                    tracing::warn!(generation, latest = self.generation, "stale upload start ignored");
                    return;
                }
                self.generation = generation;
                self.active_upload = Some(generation);
                self.loading = true;
                self.error = None;
                self.clear_dataset();
            }
            Event::UploadFinished { generation, outcome } => {
                if self.active_upload != Some(generation) {
                    tracing::info!(
                        generation,
                        active = ?self.active_upload,
                        "dropping result of superseded upload"
                    );
                    return;
                }
                self.active_upload = None;
                self.loading = false;
                match outcome {
                    UploadOutcome::Loaded { records } => {
                        tracing::info!(generation, rows = records.len(), "dataset loaded");
                        self.dataset = Arc::from(records);
                        self.view.search_query.clear();
                        self.view.page = 1;
                    }
                    UploadOutcome::Failed { error } => {
                        tracing::warn!(generation, %error, "upload failed");
                        self.error = Some(error);
                    }
                }
            }
            Event::Reset => {
                self.active_upload = None;
                self.loading = false;
                self.error = None;
                self.clear_dataset();
            }
        }
    }

    fn clear_dataset(&mut self) {
        self.dataset = Arc::from(Vec::new());
        self.view.search_query.clear();
        self.view.page = 1;
    }

    fn go_to(&mut self, page: usize) {
        if is_navigable(page, self.total_pages()) {
            self.view.page = page;
        }
    }

    /// Pages of the filtered set at the session's page size.
    pub fn total_pages(&self) -> usize {
        total_pages(filtered_records(&self.dataset, &self.view).len(), self.page_size)
    }

    /// The page-unload guard should ask for confirmation.
    pub fn confirm_unload(&self) -> bool {
        !self.dataset.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
