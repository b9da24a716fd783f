//! # Review Lens
//!
//! Presentation pipeline for guest reviews.
//!
//! A review export is parsed by an external backend into loosely typed
//! records. Review Lens filters out incomplete rows, surfaces reviews that
//! contain a suggestion, searches, paginates, groups by customer, and
//! aggregates the result into chart series and a word cloud. The pipeline is
//! pure: every view is recomputed from the dataset and the view state.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌──────────────┐   ┌──────────┐
//! │  upload  │──▶│  Session  │──▶│ filter/sort/ │──▶│  render  │
//! │ backend  │   │  (events) │   │ search/page  │   │ CLI/HTTP │
//! └──────────┘   └───────────┘   └──────────────┘   └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Records and field values |
//! | [`filter`] | Completeness filter and keyword search |
//! | [`priority`] | Suggestion-first ordering |
//! | [`paginate`] | Fixed-size pages |
//! | [`group`] | Per-customer grouping |
//! | [`sanitize`] | Message-thread cleanup and word-cloud tokenizing |
//! | [`aggregate`] | Chart series and word cloud |
//! | [`layout`] | Word-cloud placement |
//! | [`view`] | View state and the session reducer |
//! | [`render`] | View content derived from a session |
//! | [`preferences`] | Durable view preferences |
//! | [`upload`] | Parsing-backend client |
//! | [`browse`] | CLI front end |
//! | [`server`] | HTTP session server |

pub mod aggregate;
pub mod browse;
pub mod config;
pub mod filter;
pub mod group;
pub mod layout;
pub mod models;
pub mod paginate;
pub mod preferences;
pub mod priority;
pub mod render;
pub mod sanitize;
pub mod server;
pub mod upload;
pub mod view;
