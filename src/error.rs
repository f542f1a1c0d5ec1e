//! Error types for the sp_extract crate.

use thiserror::Error;

/// Errors that can occur while resolving and scanning a SharePoint location.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Could not parse SharePoint URL: {0:?}")]
    UrlParse(String),

    #[error("Could not find SharePoint site for {0}")]
    SiteNotFound(String),

    #[error("No document library found in site {0}")]
    NoDrive(String),

    #[error("Folder '{segment}' not found. Available folders: {available:?}")]
    FolderNotFound {
        segment: String,
        available: Vec<String>,
    },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Export failed: {0}")]
    Export(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ExtractError.
pub type Result<T> = std::result::Result<T, ExtractError>;
