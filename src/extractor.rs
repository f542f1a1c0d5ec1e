//! Runs the full pipeline: parse URL, authenticate, resolve, scan, export.

use std::path::PathBuf;

use tracing::{error, info};

use crate::auth::{Authenticator, Credentials, AUTHORITY_HOST};
use crate::client::{GraphClient, GRAPH_API_BASE};
use crate::error::{ExtractError, Result};
use crate::export::{default_output_path, export_to_csv, ExportStatus};
use crate::locator::{Locator, ResourceChain};
use crate::models::ItemRecord;
use crate::scanner::{ScanStats, Scanner};
use crate::url_parser::parse_site_url;

/// Settings for one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// SharePoint or OneDrive folder URL.
    pub url: String,
    /// CSV destination; a timestamped name in the working directory when `None`.
    pub output: Option<PathBuf>,
    pub credentials: Credentials,
    pub graph_endpoint: String,
    pub authority_host: String,
}

impl ExtractorConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            output: None,
            credentials: Credentials::default(),
            graph_endpoint: GRAPH_API_BASE.to_string(),
            authority_host: AUTHORITY_HOST.to_string(),
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug)]
pub struct RunReport {
    pub items: Vec<ItemRecord>,
    pub stats: ScanStats,
    pub chain: ResourceChain,
    pub output: PathBuf,
    /// `Err` holds the export failure message; the scan results stay valid.
    pub export: std::result::Result<ExportStatus, String>,
}

/// One-shot extractor for a single URL.
pub struct Extractor {
    config: ExtractorConfig,
    auth: Authenticator,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Self {
        let auth =
            Authenticator::new(&config.credentials).with_authority_host(&config.authority_host);
        Self { config, auth }
    }

    /// Run every stage, stopping at the first fatal failure.
    ///
    /// An export failure is not fatal: it is logged and reported in
    /// [`RunReport::export`].
    pub async fn run(&self) -> Result<RunReport> {
        let output = self
            .config
            .output
            .clone()
            .unwrap_or_else(default_output_path);

        info!("=== SharePoint File & Folder Extractor ===");
        info!("Target URL: {}", self.config.url);
        info!("Output file: {}", output.display());

        let site = parse_site_url(&self.config.url);
        if site.tenant_domain.is_empty() {
            return Err(ExtractError::UrlParse(self.config.url.clone()));
        }

        info!("Starting authentication with Microsoft Graph...");
        let token = self.auth.get_access_token().await?;
        let client = GraphClient::with_base_url(&self.config.graph_endpoint, token);

        let chain = Locator::new(&client).resolve(&site).await?;

        info!("Starting content scan...");
        let scan = Scanner::new(&client, &chain.drive_id)
            .scan(&chain.folder_id, &site.document_path)
            .await;

        let export = export_to_csv(&scan.items, &output).map_err(|e| {
            error!("Export failed: {}", e);
            e.to_string()
        });

        info!("=== SCAN COMPLETE ===");
        info!("Total items found: {}", scan.stats.total);
        info!("Files: {}", scan.stats.files);
        info!("Folders: {}", scan.stats.folders);

        Ok(RunReport {
            items: scan.items,
            stats: scan.stats,
            chain,
            output,
            export,
        })
    }
}
