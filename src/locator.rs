//! Resolves a [`SiteReference`] into Graph IDs: site, then drive, then folder.
//!
//! Each step tries an ordered list of lookup forms and takes the first one the
//! API answers. Nothing is cached between runs.

use tracing::{debug, error, info};

use crate::client::{encode_path, GraphClient};
use crate::error::{ExtractError, Result};
use crate::models::{Drive, DriveItem, Site};
use crate::url_parser::SiteReference;

/// Item ID Graph accepts for a drive's root folder.
pub const ROOT_ITEM_ID: &str = "root";

/// Name of the default document library.
const DOCUMENTS_DRIVE: &str = "Documents";

type SiteCandidate = fn(&SiteReference) -> Option<String>;

/// Site lookup forms, in the order they are tried.
const SITE_CANDIDATES: &[SiteCandidate] = &[
    domain_and_path_candidate,
    domain_candidate,
    root_candidate,
    sharepoint_path_candidate,
];

/// Folder path templates for direct path addressing, in the order they are tried.
const FOLDER_PATH_TEMPLATES: &[fn(&str) -> String] = &[drive_root_path, documents_path];

fn domain_and_path_candidate(site: &SiteReference) -> Option<String> {
    Some(format!("{}:{}", site.tenant_domain, site.site_path))
}

fn domain_candidate(site: &SiteReference) -> Option<String> {
    Some(site.tenant_domain.clone())
}

fn root_candidate(_: &SiteReference) -> Option<String> {
    Some("root".to_string())
}

/// Comma-separated `host,sites,<name>` / `host,personal,<user>` form.
fn sharepoint_path_candidate(site: &SiteReference) -> Option<String> {
    let (tenant_prefix, _) = site.tenant_domain.split_once('.')?;
    let host = format!("{}.sharepoint.com", tenant_prefix);

    if let Some((_, name)) = site.site_path.split_once("/sites/") {
        Some(format!("{},sites,{}", host, name.replace('/', ",")))
    } else if let Some((_, user)) = site.site_path.split_once("/personal/") {
        Some(format!("{},personal,{}", host, user))
    } else {
        None
    }
}

fn drive_root_path(path: &str) -> String {
    format!("root:/{}:", path)
}

fn documents_path(path: &str) -> String {
    format!("root:/Documents/{}:", path)
}

/// Site identifiers to try for a reference, first match wins.
pub fn site_candidates(site: &SiteReference) -> Vec<String> {
    SITE_CANDIDATES
        .iter()
        .filter_map(|candidate| candidate(site))
        .collect()
}

/// Path-addressed item identifiers to try for a document path.
pub fn folder_path_candidates(path: &str) -> Vec<String> {
    let encoded = encode_path(path);
    FOLDER_PATH_TEMPLATES
        .iter()
        .map(|template| template(&encoded))
        .collect()
}

/// The resolved site → drive → folder chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceChain {
    pub site_id: String,
    pub drive_id: String,
    pub folder_id: String,
}

/// Site, drive and folder lookups against Graph.
pub struct Locator<'a> {
    client: &'a GraphClient,
}

impl<'a> Locator<'a> {
    pub fn new(client: &'a GraphClient) -> Self {
        Self { client }
    }

    /// Resolve the full chain for a reference.
    pub async fn resolve(&self, site: &SiteReference) -> Result<ResourceChain> {
        let site_id = self.find_site(site).await?.id;
        let drive_id = self.find_document_drive(&site_id).await?.id;
        let folder_id = self
            .find_target_folder(&drive_id, &site.document_path)
            .await?;

        Ok(ResourceChain {
            site_id,
            drive_id,
            folder_id,
        })
    }

    /// Find the site, trying each lookup form in turn.
    pub async fn find_site(&self, site: &SiteReference) -> Result<Site> {
        info!("Looking up SharePoint site...");

        for attempt in site_candidates(site) {
            debug!("Trying site ID: {}", attempt);
            if let Some(found) = self
                .client
                .get_json::<Site>(&format!("sites/{}", attempt))
                .await
            {
                info!(
                    "Found site: {}",
                    found.display_name.as_deref().unwrap_or("Unknown")
                );
                return Ok(found);
            }
        }

        error!("Could not find the specified site");
        Err(ExtractError::SiteNotFound(format!(
            "{}{}",
            site.tenant_domain, site.site_path
        )))
    }

    /// Pick the site's "Documents" library, or its first drive.
    pub async fn find_document_drive(&self, site_id: &str) -> Result<Drive> {
        info!("Finding document library...");

        let drives: Vec<Drive> = self
            .client
            .get_collection(&format!("sites/{}/drives", site_id))
            .await
            .unwrap_or_default();
        debug!("Found {} drives", drives.len());

        let position = drives
            .iter()
            .position(|drive| drive.name.as_deref() == Some(DOCUMENTS_DRIVE))
            .unwrap_or(0);

        match drives.into_iter().nth(position) {
            Some(drive) => {
                info!(
                    "Using drive: {}",
                    drive.name.as_deref().unwrap_or("Unknown")
                );
                Ok(drive)
            }
            None => {
                error!("No drives found in site");
                Err(ExtractError::NoDrive(site_id.to_string()))
            }
        }
    }

    /// Find the item ID of the folder at `path` (empty means the drive root).
    pub async fn find_target_folder(&self, drive_id: &str, path: &str) -> Result<String> {
        if path.is_empty() {
            info!("Starting from root folder");
            return Ok(ROOT_ITEM_ID.to_string());
        }

        info!("Navigating to folder: {}", path);

        for attempt in folder_path_candidates(path) {
            debug!("Trying path: {}", attempt);
            if let Some(item) = self
                .client
                .get_json::<DriveItem>(&format!("drives/{}/items/{}", drive_id, attempt))
                .await
            {
                info!("Found target folder");
                return Ok(item.id);
            }
        }

        info!("Direct path failed, navigating step by step...");
        self.navigate_path_segments(drive_id, ROOT_ITEM_ID, path)
            .await
    }

    /// Walk `path` one segment at a time from `start_id`, matching folder names
    /// case-insensitively.
    pub async fn navigate_path_segments(
        &self,
        drive_id: &str,
        start_id: &str,
        path: &str,
    ) -> Result<String> {
        let segments: Vec<&str> = path
            .split('/')
            .filter(|segment| !segment.trim().is_empty())
            .collect();
        let mut current_id = start_id.to_string();

        for (idx, segment) in segments.iter().enumerate() {
            info!(
                "Looking for folder: {} ({}/{})",
                segment,
                idx + 1,
                segments.len()
            );

            let Some(children) = self.client.list_children(drive_id, &current_id).await else {
                error!("Cannot access folder contents");
                return Err(ExtractError::FolderNotFound {
                    segment: segment.to_string(),
                    available: Vec::new(),
                });
            };

            let wanted = segment.to_lowercase();
            match children
                .iter()
                .find(|child| child.is_folder() && child.name.to_lowercase() == wanted)
            {
                Some(child) => {
                    debug!("Found: {}", child.name);
                    current_id = child.id.clone();
                }
                None => {
                    let available: Vec<String> = children
                        .iter()
                        .filter(|child| child.is_folder())
                        .map(|child| child.name.clone())
                        .collect();
                    error!(
                        "Folder '{}' not found. Available folders: {:?}",
                        segment, available
                    );
                    return Err(ExtractError::FolderNotFound {
                        segment: segment.to_string(),
                        available,
                    });
                }
            }
        }

        info!("Successfully navigated to target folder");
        Ok(current_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(domain: &str, site_path: &str, personal: bool) -> SiteReference {
        SiteReference {
            tenant_domain: domain.to_string(),
            site_path: site_path.to_string(),
            document_path: String::new(),
            is_personal_site: personal,
        }
    }

    #[test]
    fn test_team_site_candidates() {
        let site = reference("contoso.sharepoint.com", "/sites/myteam", false);
        assert_eq!(
            site_candidates(&site),
            vec![
                "contoso.sharepoint.com:/sites/myteam",
                "contoso.sharepoint.com",
                "root",
                "contoso.sharepoint.com,sites,myteam",
            ]
        );
    }

    #[test]
    fn test_personal_site_candidates() {
        let site = reference("contoso-my.sharepoint.com", "/personal/jdoe_contoso_com", true);
        let candidates = site_candidates(&site);
        assert_eq!(candidates.len(), 4);
        assert_eq!(
            candidates[3],
            "contoso-my.sharepoint.com,personal,jdoe_contoso_com"
        );
    }

    #[test]
    fn test_candidates_without_dot_or_site() {
        let site = reference("localhost", "/sites/dev", false);
        assert_eq!(
            site_candidates(&site),
            vec!["localhost:/sites/dev", "localhost", "root"]
        );

        let site = reference("contoso.sharepoint.com", "", false);
        assert_eq!(site_candidates(&site).len(), 3);
    }

    #[test]
    fn test_folder_path_candidates() {
        assert_eq!(
            folder_path_candidates("Archive/Q1 Reports"),
            vec![
                "root:/Archive/Q1%20Reports:",
                "root:/Documents/Archive/Q1%20Reports:",
            ]
        );
    }
}
