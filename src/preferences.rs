//! Durable view preferences.
//!
//! Preferences are a flat JSON object of string values, one per key. String
//! preferences are stored as they are; other values hold their JSON encoding:
//!
//! ```json
//! { "viewMode": "bubble", "showOnlyPositiveWithSuggestion": "false", "currentPage": "1" }
//! ```
//!
//! A stored value that is not valid JSON is read back as the raw string, so
//! both `"grouped"` and a JSON-quoted `"\"grouped\""` decode to the same
//! mode. Values that cannot be interpreted fall back to the default for that
//! key; a missing or unreadable file falls back to all defaults.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::Path;

use crate::view::ViewMode;

pub const VIEW_MODE_KEY: &str = "viewMode";
pub const POSITIVE_WITH_SUGGESTION_KEY: &str = "showOnlyPositiveWithSuggestion";
pub const CURRENT_PAGE_KEY: &str = "currentPage";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    pub view_mode: ViewMode,
    pub positive_with_suggestion: bool,
    /// Restored only when page persistence is enabled.
    pub current_page: Option<usize>,
}

/// Decode one stored value: JSON if it parses, the raw string otherwise.
fn decode(raw: &Value) -> Value {
    match raw {
        Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.clone())),
        other => other.clone(),
    }
}

impl Preferences {
    /// Read preferences from a key/value map.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let mut prefs = Self::default();

        if let Some(raw) = map.get(VIEW_MODE_KEY) {
            match decode(raw).as_str().map(str::parse::<ViewMode>) {
                Some(Ok(mode)) => prefs.view_mode = mode,
                _ => tracing::warn!(value = %raw, "unknown stored view mode; using default"),
            }
        }
        if let Some(raw) = map.get(POSITIVE_WITH_SUGGESTION_KEY) {
            match decode(raw).as_bool() {
                Some(flag) => prefs.positive_with_suggestion = flag,
                None => tracing::warn!(value = %raw, "invalid stored toggle; using default"),
            }
        }
        if let Some(raw) = map.get(CURRENT_PAGE_KEY) {
            match decode(raw).as_u64() {
                Some(page) if page >= 1 => prefs.current_page = usize::try_from(page).ok(),
                _ => tracing::warn!(value = %raw, "invalid stored page; using default"),
            }
        }
        prefs
    }

    /// Encode as a key/value map. The page is written only when `persist_page`.
    pub fn to_map(&self, persist_page: bool) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(
            VIEW_MODE_KEY.to_string(),
            Value::String(self.view_mode.to_string()),
        );
        map.insert(
            POSITIVE_WITH_SUGGESTION_KEY.to_string(),
            Value::String(self.positive_with_suggestion.to_string()),
        );
        if persist_page {
            if let Some(page) = self.current_page {
                map.insert(CURRENT_PAGE_KEY.to_string(), Value::String(page.to_string()));
            }
        }
        map
    }

    /// Load from `path`. A missing file yields defaults; a corrupt one is
    /// logged and also yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read preferences: {}", path.display()))?;
        match serde_json::from_str::<Map<String, Value>>(&content) {
            Ok(map) => Ok(Self::from_map(&map)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt preferences file; using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path, persist_page: bool) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create preferences directory: {}", parent.display())
                })?;
            }
        }
        let body = serde_json::to_string_pretty(&self.to_map(persist_page))?;
        std::fs::write(path, body)
            .with_context(|| format!("Failed to write preferences: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "preferences saved");
        Ok(())
    }
}
