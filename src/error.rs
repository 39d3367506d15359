use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Icon catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Icon not found: {0}")]
    NotFound(String),

    #[error("Icon content unavailable for {id}: {reason}")]
    ContentUnavailable { id: String, reason: String },

    #[error("IO error at {}: {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Wrap an IO error with the path it occurred on
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoFailure {
            path: path.into(),
            source,
        }
    }

    /// Stable error kind reported to MCP clients
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CatalogUnavailable(_) => "CatalogUnavailable",
            Self::InvalidQuery(_) => "InvalidQuery",
            Self::NotFound(_) => "NotFound",
            Self::ContentUnavailable { .. } => "ContentUnavailable",
            Self::IoFailure { .. } | Self::Io(_) => "IOFailure",
            Self::AlreadyExists(_) => "AlreadyExists",
            Self::Json(_) | Self::Http(_) | Self::Config(_) | Self::Other(_) => "Internal",
        }
    }

    /// Render as the `{"error": {...}}` payload returned by MCP tools
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        })
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
