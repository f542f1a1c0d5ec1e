//! Microsoft Graph API client for read-only site, drive and item lookups.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::error::{ExtractError, Result};
use crate::models::{Collection, DriveItem, GraphErrorResponse};

/// Base URL for Microsoft Graph v1.0.
pub const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Characters escaped inside a path-addressed item segment (`root:/a/b:`).
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Client for the Graph endpoints the extractor reads from.
pub struct GraphClient {
    base_url: String,
    access_token: String,
    http: Client,
}

impl GraphClient {
    /// Create a client against the public Graph endpoint.
    pub fn new(access_token: String) -> Self {
        Self::with_base_url(GRAPH_API_BASE, access_token)
    }

    /// Create a client against a custom Graph endpoint.
    pub fn with_base_url(base_url: &str, access_token: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
            http: Client::new(),
        }
    }

    /// Full URL for an endpoint path. Absolute URLs (`@odata.nextLink`) pass through.
    fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
        }
    }

    /// GET an endpoint, distinguishing "not found" from other failures.
    ///
    /// Returns `Ok(None)` on 404 and an `Api` error for any other non-200 status.
    pub async fn fetch<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Option<T>> {
        debug!("Making Graph API request: {}", endpoint);

        let response = self
            .http
            .get(self.url(endpoint))
            .bearer_auth(&self.access_token)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("Resource not found: {}", endpoint);
            return Ok(None);
        }

        if status != StatusCode::OK {
            let error_body = response.text().await.unwrap_or_default();
            if let Ok(api_error) = serde_json::from_str::<GraphErrorResponse>(&error_body) {
                return Err(ExtractError::Api {
                    status: status.as_u16(),
                    message: format!("{}: {}", api_error.error.code, api_error.error.message),
                });
            }
            return Err(ExtractError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let body = response.text().await?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    /// GET an endpoint, treating every failure as an absent result.
    ///
    /// Transient failures are logged so fallback lookups can proceed.
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Option<T> {
        match self.fetch(endpoint).await {
            Ok(found) => found,
            Err(e @ ExtractError::Api { .. }) => {
                warn!("API request failed: {}", e);
                None
            }
            Err(e) => {
                error!("Request error for {}: {}", endpoint, e);
                None
            }
        }
    }

    /// GET a collection endpoint, following `@odata.nextLink` pages.
    ///
    /// Returns `None` only when the first page is absent. A failing later page
    /// keeps whatever was gathered before it.
    pub async fn get_collection<T: DeserializeOwned>(&self, endpoint: &str) -> Option<Vec<T>> {
        let first: Collection<T> = self.get_json(endpoint).await?;
        let mut all_items = first.value;
        let mut next_link = first.next_link;

        while let Some(link) = next_link {
            match self.get_json::<Collection<T>>(&link).await {
                Some(page) => {
                    all_items.extend(page.value);
                    next_link = page.next_link;
                }
                None => {
                    warn!(
                        "Stopped paging {} after {} items",
                        endpoint,
                        all_items.len()
                    );
                    break;
                }
            }
        }

        Some(all_items)
    }

    /// List the children of an item in a drive.
    pub async fn list_children(&self, drive_id: &str, item_id: &str) -> Option<Vec<DriveItem>> {
        self.get_collection(&format!("drives/{}/items/{}/children", drive_id, item_id))
            .await
    }
}

/// Percent-encode each `/`-separated segment of a drive path.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}
