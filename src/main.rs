//! # Review Lens CLI (`lens`)
//!
//! Loads a review export through the parsing backend (or a local JSON file)
//! and prints one of the review views.
//!
//! ## Usage
//!
//! ```bash
//! lens --config ./config/lens.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lens view <file>` | Table or bubble view, paginated |
//! | `lens charts <chart> <file>` | Bar, stacked, timeline, pie or wordcloud |
//! | `lens groups <file>` | Reviews grouped by customer |
//! | `lens prefs` | Show or change stored preferences |
//! | `lens serve` | Start the session server |
//!
//! ## Examples
//!
//! ```bash
//! # Upload an export and page through it
//! lens view reviews.xlsx --page 2
//!
//! # Bubble view of an already-parsed file, only positive reviews with a suggestion
//! lens view reviews.json --local --mode bubble --positive-with-suggestion
//!
//! # Word cloud as JSON
//! lens charts wordcloud reviews.csv --json
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use review_lens::browse::{run_browse, run_prefs, BrowseOptions};
use review_lens::config;
use review_lens::server;
use review_lens::view::{ChartKind, ViewMode};

/// Review Lens: browse, search and chart guest reviews.
#[derive(Parser)]
#[command(
    name = "lens",
    about = "Review Lens: browse, search and chart guest reviews",
    version,
    long_about = "Review Lens sends a review export to a parsing backend and presents the \
    records as a table, bubble cards, per-customer groups, or charts. The same view state \
    can be driven over HTTP with `lens serve`."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/lens.toml`. Built-in defaults are used when the
    /// file does not exist.
    #[arg(long, global = true, default_value = "./config/lens.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every dataset command.
#[derive(Args)]
struct DatasetArgs {
    /// Review export (.csv, .xlsx, .xls, .json, .parquet, .pkl, .pickle, .mbox).
    file: PathBuf,

    /// Read FILE as a JSON array of records instead of uploading it.
    #[arg(long)]
    local: bool,

    /// Keep only rows containing this text (case-insensitive).
    #[arg(long)]
    search: Option<String>,

    /// Only positive reviews (rating 4 or more) that contain a suggestion.
    #[arg(long)]
    positive_with_suggestion: bool,

    /// Print the rendered view as JSON.
    #[arg(long)]
    json: bool,
}

impl DatasetArgs {
    fn into_options(self) -> BrowseOptions {
        BrowseOptions {
            file: self.file,
            local: self.local,
            search: self.search,
            positive_with_suggestion: self.positive_with_suggestion,
            json: self.json,
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the table or bubble view.
    View {
        #[command(flatten)]
        data: DatasetArgs,

        /// View to show: table or bubble. Defaults to the stored preference.
        #[arg(long)]
        mode: Option<ViewMode>,

        /// Page to show (1-based).
        #[arg(long)]
        page: Option<usize>,
    },

    /// Show one chart of the filtered reviews.
    Charts {
        /// Chart: bar, stacked, timeline, pie, or wordcloud.
        chart: ChartKind,

        #[command(flatten)]
        data: DatasetArgs,
    },

    /// Show reviews grouped by customer.
    Groups {
        #[command(flatten)]
        data: DatasetArgs,
    },

    /// Show or change stored preferences.
    Prefs {
        /// Store a default view mode.
        #[arg(long)]
        view: Option<ViewMode>,

        /// Store the positive-with-suggestion toggle.
        #[arg(long)]
        positive_with_suggestion: Option<bool>,

        /// Restore all preferences to their defaults.
        #[arg(long)]
        reset: bool,
    },

    /// Start the session server.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_or_minimal(&cli.config)?;

    match cli.command {
        Commands::View { data, mode, page } => {
            let opts = BrowseOptions {
                mode,
                page,
                ..data.into_options()
            };
            run_browse(&cfg, &opts).await?;
        }
        Commands::Charts { chart, data } => {
            let opts = BrowseOptions {
                mode: Some(ViewMode::Charts),
                chart: Some(chart),
                ..data.into_options()
            };
            run_browse(&cfg, &opts).await?;
        }
        Commands::Groups { data } => {
            let opts = BrowseOptions {
                mode: Some(ViewMode::Grouped),
                ..data.into_options()
            };
            run_browse(&cfg, &opts).await?;
        }
        Commands::Prefs {
            view,
            positive_with_suggestion,
            reset,
        } => {
            run_prefs(&cfg, view, positive_with_suggestion, reset)?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
