//! Session server.
//!
//! Holds one [`Session`] and exposes it over a small JSON API so any front
//! end can drive the review browser by posting events and re-rendering from
//! the returned view.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/upload` | Multipart field `file`; forwarded to the parsing backend |
//! | `POST` | `/api/events` | Dispatch one non-upload [`Event`] |
//! | `GET`  | `/api/view` | Current rendered view |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Every successful call answers with the rendered view.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "missing multipart field 'file'" } }
//! ```
//!
//! Backend failures are not HTTP errors: they land in the session and show up
//! as the rendered view's `error`.
//!
//! # Uploads
//!
//! Each upload takes a fresh generation from an atomic counter. The session
//! lock is released while the backend call runs, so a second upload can
//! start meanwhile; the first one's result is then dropped by the session.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::layout::SpiralLayout;
use crate::preferences::Preferences;
use crate::render::{render, RenderOptions, Rendered};
use crate::upload::UploadClient;
use crate::view::{Event, Session, UploadOutcome};

/// Uploads larger than this are refused.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    uploader: Arc<UploadClient>,
    generation: Arc<AtomicU64>,
    layout: Arc<SpiralLayout>,
}

impl AppState {
    fn render(&self, session: &Session) -> Rendered {
        render(
            session,
            &RenderOptions {
                word_cloud_limit: self.config.view.word_cloud_limit,
                layout: self.layout.as_ref(),
            },
        )
    }

    /// Write a preferences snapshot off the async runtime. Call with the
    /// session lock released.
    async fn save_preferences(&self, prefs: Preferences) {
        let path = self.config.preferences.path.clone();
        let persist_page = self.config.preferences.persist_page;
        let result = tokio::task::spawn_blocking(move || prefs.save(&path, persist_page)).await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "failed to save preferences"),
            Err(e) => tracing::warn!(error = %e, "preferences writer panicked"),
        }
    }
}

/// Starts the session server on `[server].bind` and runs until the process
/// is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let prefs = Preferences::load(&config.preferences.path)?;
    let session = Session::new(config.view.page_size).with_preferences(&prefs);

    let state = AppState {
        config: Arc::new(config.clone()),
        session: Arc::new(Mutex::new(session)),
        uploader: Arc::new(UploadClient::new(&config.backend)?),
        generation: Arc::new(AtomicU64::new(0)),
        layout: Arc::new(SpiralLayout::default()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/upload", post(handle_upload))
        .route("/api/events", post(handle_event))
        .route("/api/view", get(handle_view))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state);

    let bind_addr = &config.server.bind;
    println!("Review session server listening on http://{}", bind_addr);
    println!("  Backend: {}", config.backend.url);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /api/view ============

async fn handle_view(State(state): State<AppState>) -> Json<Rendered> {
    let session = state.session.lock().await;
    Json(state.render(&session))
}

// ============ POST /api/events ============

/// Dispatches one event. Upload events are reserved for `/api/upload`,
/// which owns generation numbering.
async fn handle_event(
    State(state): State<AppState>,
    Json(event): Json<Event>,
) -> Result<Json<Rendered>, AppError> {
    if event.is_upload() {
        return Err(bad_request(
            "upload events are issued by POST /api/upload",
        ));
    }
    tracing::debug!(?event, "event");

    let (prefs, rendered) = {
        let mut session = state.session.lock().await;
        session.apply(event);
        (session.preferences(), state.render(&session))
    };
    state.save_preferences(prefs).await;
    Ok(Json(rendered))
}

// ============ POST /api/upload ============

async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Rendered>, AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(format!("failed to read upload: {}", e)))?;
        file = Some((name, bytes.to_vec()));
        break;
    }
    let (file_name, bytes) = file.ok_or_else(|| bad_request("missing multipart field 'file'"))?;

    let generation = state.generation.fetch_add(1, Ordering::SeqCst) + 1;
    {
        let mut session = state.session.lock().await;
        session.apply(Event::UploadStarted { generation });
    }

    // Lock released: a newer upload may start while this one is in flight.
    let outcome: UploadOutcome = state.uploader.upload_bytes(&file_name, bytes).await.into();

    let (prefs, rendered) = {
        let mut session = state.session.lock().await;
        session.apply(Event::UploadFinished {
            generation,
            outcome,
        });
        (session.preferences(), state.render(&session))
    };
    state.save_preferences(prefs).await;
    Ok(Json(rendered))
}
