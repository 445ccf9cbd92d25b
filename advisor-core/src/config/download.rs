use serde::Deserialize;
use std::path::PathBuf;

/// A static file served as an attachment under `/api/downloads/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DownloadConfig {
    pub name: String,
    pub path: PathBuf,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

fn default_content_type() -> String {
    "application/octet-stream".to_string()
}
