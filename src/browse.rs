//! CLI front end: load a dataset into a session, apply the requested view
//! events and print the rendered result.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::layout::SpiralLayout;
use crate::preferences::Preferences;
use crate::render::{render, RenderOptions, Rendered};
use crate::upload::{load_local, UploadClient};
use crate::view::{ChartKind, Event, Session, UploadOutcome, ViewMode};

/// What to load and how to narrow it.
#[derive(Debug, Clone, Default)]
pub struct BrowseOptions {
    pub file: PathBuf,
    /// Read `file` as a JSON array of records instead of uploading it.
    pub local: bool,
    pub mode: Option<ViewMode>,
    pub chart: Option<ChartKind>,
    pub page: Option<usize>,
    pub search: Option<String>,
    pub positive_with_suggestion: bool,
    pub json: bool,
}

/// Upload or read the dataset and feed the outcome to the session.
async fn load(config: &Config, session: Session, file: &Path, local: bool) -> Result<Session> {
    let generation = session.generation() + 1;
    let session = session.dispatch(Event::UploadStarted { generation });

    let outcome: UploadOutcome = if local {
        load_local(file).into()
    } else {
        UploadClient::new(&config.backend)?
            .upload_file(file)
            .await
            .into()
    };

    Ok(session.dispatch(Event::UploadFinished {
        generation,
        outcome,
    }))
}

/// Build the session a CLI invocation describes. Preferences are restored
/// first; explicit options override them.
pub async fn browse(config: &Config, opts: &BrowseOptions) -> Result<Session> {
    let prefs = Preferences::load(&config.preferences.path)?;
    let mut session = Session::new(config.view.page_size).with_preferences(&prefs);

    if let Some(mode) = opts.mode {
        session.apply(Event::SelectView { mode });
    }
    if let Some(chart) = opts.chart {
        session.apply(Event::SelectChart { chart });
    }
    if opts.positive_with_suggestion && !session.view.positive_with_suggestion {
        session.apply(Event::TogglePositiveWithSuggestion);
    }

    let mut session = load(config, session, &opts.file, opts.local).await?;

    if let Some(ref query) = opts.search {
        session.apply(Event::Search {
            query: query.clone(),
        });
    }
    // A restored page only applies when the dataset still reaches it.
    let restored = prefs
        .current_page
        .filter(|_| config.preferences.persist_page);
    let page = opts.page.or(restored);
    if let Some(page) = page {
        session.apply(Event::GoToPage { page });
    }

    Ok(session)
}

fn print_rendered(rendered: &Rendered, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rendered)?);
    } else {
        print!("{}", rendered);
    }
    Ok(())
}

/// CLI entry point for `lens view`, `lens charts` and `lens groups`.
pub async fn run_browse(config: &Config, opts: &BrowseOptions) -> Result<()> {
    let session = browse(config, opts).await?;

    let prefs = &config.preferences;
    session.preferences().save(&prefs.path, prefs.persist_page)?;

    let layout = SpiralLayout::default();
    let rendered = render(
        &session,
        &RenderOptions {
            word_cloud_limit: config.view.word_cloud_limit,
            layout: &layout,
        },
    );
    print_rendered(&rendered, opts.json)?;

    if session.error.is_some() {
        std::process::exit(1);
    }
    Ok(())
}

/// CLI entry point for `lens prefs`: optionally update, then print.
pub fn run_prefs(
    config: &Config,
    view: Option<ViewMode>,
    positive_with_suggestion: Option<bool>,
    reset: bool,
) -> Result<()> {
    let path = &config.preferences.path;
    let mut prefs = if reset {
        Preferences::default()
    } else {
        Preferences::load(path)?
    };

    let changed = reset || view.is_some() || positive_with_suggestion.is_some();
    if let Some(mode) = view {
        prefs.view_mode = mode;
    }
    if let Some(flag) = positive_with_suggestion {
        prefs.positive_with_suggestion = flag;
    }
    if changed {
        prefs.save(path, config.preferences.persist_page)?;
    }

    println!("preferences: {}", path.display());
    println!("  viewMode:                       {}", prefs.view_mode);
    println!(
        "  showOnlyPositiveWithSuggestion: {}",
        prefs.positive_with_suggestion
    );
    match prefs.current_page {
        Some(page) if config.preferences.persist_page => {
            println!("  currentPage:                    {}", page)
        }
        _ => println!("  currentPage:                    (not persisted)"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup(records: &str) -> (TempDir, Config, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("reviews.json");
        std::fs::write(&file, records).unwrap();
        let mut config = Config::minimal();
        config.preferences.path = tmp.path().join("prefs.json");
        (tmp, config, file)
    }

    fn rows(n: usize) -> String {
        let rows: Vec<String> = (0..n)
            .map(|i| {
                format!(
                    r#"{{"customer_name":"guest{}","rating":5,"place":"Loft","review_text":"fine","dates":"2024-01-01"}}"#,
                    i
                )
            })
            .collect();
        format!("[{}]", rows.join(","))
    }

    #[tokio::test]
    async fn test_browse_local_with_options() {
        let (_tmp, config, file) = setup(&rows(25));
        let opts = BrowseOptions {
            file,
            local: true,
            mode: Some(ViewMode::Bubble),
            page: Some(3),
            ..Default::default()
        };
        let session = browse(&config, &opts).await.unwrap();
        assert_eq!(session.dataset.len(), 25);
        assert_eq!(session.view.mode, ViewMode::Bubble);
        assert_eq!(session.view.page, 3);
    }

    #[tokio::test]
    async fn test_out_of_range_page_is_ignored() {
        let (_tmp, config, file) = setup(&rows(5));
        let opts = BrowseOptions {
            file,
            local: true,
            page: Some(4),
            ..Default::default()
        };
        let session = browse(&config, &opts).await.unwrap();
        assert_eq!(session.view.page, 1);
    }

    #[tokio::test]
    async fn test_stored_preferences_are_restored() {
        let (_tmp, config, file) = setup(&rows(1));
        Preferences {
            view_mode: ViewMode::Grouped,
            positive_with_suggestion: true,
            current_page: None,
        }
        .save(&config.preferences.path, false)
        .unwrap();

        let opts = BrowseOptions {
            file,
            local: true,
            ..Default::default()
        };
        let session = browse(&config, &opts).await.unwrap();
        assert_eq!(session.view.mode, ViewMode::Grouped);
        assert!(session.view.positive_with_suggestion);
    }

    #[tokio::test]
    async fn test_unsupported_file_surfaces_error() {
        let (tmp, config, _) = setup("[]");
        let file = tmp.path().join("notes.txt");
        std::fs::write(&file, "hello").unwrap();
        let opts = BrowseOptions {
            file,
            ..Default::default()
        };
        let session = browse(&config, &opts).await.unwrap();
        assert!(session.dataset.is_empty());
        assert!(session.error.unwrap().contains("Unsupported file type"));
    }
}
