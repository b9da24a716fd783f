//! Client for the file-parsing backend.
//!
//! The backend accepts one multipart field named `file` at
//! `POST {backend.url}/api/upload` and answers either with a JSON array of
//! records or with `{ "error": "..." }`. The body is interpreted regardless
//! of HTTP status, since the backend reports parse failures with a 4xx/5xx
//! and a JSON error body.

use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::config::BackendConfig;
use crate::models::Record;
use crate::view::UploadOutcome;

/// File types the backend knows how to parse.
pub const ACCEPTED_EXTENSIONS: [&str; 8] =
    ["csv", "xlsx", "xls", "json", "parquet", "pkl", "pickle", "mbox"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    /// Error text reported by the backend, surfaced verbatim.
    #[error("{0}")]
    Backend(String),
    #[error("Malformed response from backend: {0}")]
    Malformed(String),
    #[error("Unsupported file type '{0}'. Accepted: .csv, .xlsx, .xls, .json, .parquet, .pkl, .pickle, .mbox")]
    UnsupportedFile(String),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Reject file names whose extension the backend does not accept.
pub fn check_extension(file_name: &str) -> Result<(), UploadError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(UploadError::UnsupportedFile(file_name.to_string()))
    }
}

/// Turn a JSON array of objects into records. Non-object items are skipped.
fn records_from_array(items: Vec<Value>) -> Vec<Record> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(_) => match serde_json::from_value::<Record>(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unreadable row");
                    None
                }
            },
            _ => None,
        })
        .collect()
}

/// Interpret a backend response body.
pub fn parse_upload_response(body: &str) -> Result<Vec<Record>, UploadError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| UploadError::Malformed(e.to_string()))?;
    match value {
        Value::Array(items) => Ok(records_from_array(items)),
        Value::Object(ref obj) => match obj.get("error") {
            Some(Value::String(message)) => Err(UploadError::Backend(message.clone())),
            Some(other) => Err(UploadError::Backend(other.to_string())),
            None => Err(UploadError::Malformed(
                "expected an array of records or an error object".to_string(),
            )),
        },
        _ => Err(UploadError::Malformed(
            "expected an array of records or an error object".to_string(),
        )),
    }
}

/// Read a local JSON file of records, bypassing the backend.
pub fn load_local(path: &Path) -> Result<Vec<Record>, UploadError> {
    let body = std::fs::read_to_string(path)?;
    parse_upload_response(&body)
}

pub struct UploadClient {
    client: reqwest::Client,
    endpoint: String,
}

impl UploadClient {
    pub fn new(config: &BackendConfig) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/upload", config.url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Upload a file from disk.
    pub async fn upload_file(&self, path: &Path) -> Result<Vec<Record>, UploadError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        check_extension(&file_name)?;
        let bytes = tokio::fs::read(path).await?;
        self.upload_bytes(&file_name, bytes).await
    }

    /// Upload an in-memory file under `file_name`.
    pub async fn upload_bytes(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Vec<Record>, UploadError> {
        check_extension(file_name)?;
        tracing::info!(file = file_name, size = bytes.len(), endpoint = %self.endpoint, "uploading");

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(%status, "backend returned an error status");
        }
        parse_upload_response(&body)
    }
}

impl From<Result<Vec<Record>, UploadError>> for UploadOutcome {
    fn from(result: Result<Vec<Record>, UploadError>) -> Self {
        match result {
            Ok(records) => UploadOutcome::Loaded { records },
            Err(e) => UploadOutcome::Failed {
                error: e.to_string(),
            },
        }
    }
}
