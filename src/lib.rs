//! sp_extract - A CLI tool for listing SharePoint / OneDrive folder trees.
//!
//! This library provides functionality to:
//! - Authenticate against Microsoft Graph (service principal or device code)
//! - Resolve a SharePoint or OneDrive folder URL into site, drive and folder IDs
//! - Recursively enumerate the folder and export item metadata to CSV
//!
//! # Example
//!
//! ```no_run
//! use sp_extract::{Extractor, ExtractorConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ExtractorConfig::new("https://contoso.sharepoint.com/sites/myteam/Documents/Archive");
//!     let report = Extractor::new(config).run().await?;
//!
//!     for item in &report.items {
//!         println!("{}", item);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod export;
pub mod extractor;
pub mod locator;
pub mod models;
pub mod scanner;
pub mod url_parser;

// Re-exports for convenience
pub use auth::{Authenticator, Credentials};
pub use client::GraphClient;
pub use error::{ExtractError, Result};
pub use extractor::{Extractor, ExtractorConfig, RunReport};
pub use models::ItemRecord;
pub use scanner::{ScanResult, ScanStats, Scanner};
pub use url_parser::{parse_site_url, SiteReference};
