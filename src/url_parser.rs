//! URL parser for splitting SharePoint / OneDrive URLs into site components.

use percent_encoding::percent_decode_str;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, error, info};

/// Tenant host, e.g. `contoso.sharepoint.com`.
static DOMAIN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https://([^/]+)").expect("Invalid domain regex"));

/// Personal (OneDrive) site segment.
static PERSONAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/personal/([^/]+)").expect("Invalid personal site regex"));

/// Team site segment.
static SITE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/sites/([^/]+)").expect("Invalid team site regex"));

/// Everything after the document library segment.
static DOCUMENTS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:Shared(?:%20| ))?Documents/(.+)").expect("Invalid documents regex")
});

/// Everything after `/personal/<user>/` when no library segment is present.
static PERSONAL_PATH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/personal/[^/]+/(.+)").expect("Invalid personal path regex")
});

const LIBRARY_SEGMENTS: &[&str] = &["/Documents", "/Shared%20Documents", "/Shared Documents"];

/// Components of a SharePoint URL needed to locate the target folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteReference {
    /// Host name, e.g. `contoso.sharepoint.com`. Empty when the URL is unusable.
    pub tenant_domain: String,
    /// `/sites/<name>` or `/personal/<user>`, empty for the tenant root site.
    pub site_path: String,
    /// Folder path inside the document library, percent-decoded. Empty means the library root.
    pub document_path: String,
    pub is_personal_site: bool,
}

impl SiteReference {
    /// The user part of a personal site path, or the name part of a team site path.
    pub fn site_name(&self) -> Option<&str> {
        self.site_path
            .strip_prefix("/sites/")
            .or_else(|| self.site_path.strip_prefix("/personal/"))
    }
}

/// Parse a SharePoint or OneDrive URL into a [`SiteReference`].
///
/// Every rule is independent; whatever cannot be found is left empty. An empty
/// input yields an all-empty reference, which callers must treat as fatal.
///
/// # Examples
///
/// ```
/// use sp_extract::url_parser::parse_site_url;
///
/// let site = parse_site_url("https://contoso.sharepoint.com/sites/myteam/Documents/Q1%20Reports");
/// assert_eq!(site.tenant_domain, "contoso.sharepoint.com");
/// assert_eq!(site.site_path, "/sites/myteam");
/// assert_eq!(site.document_path, "Q1 Reports");
/// assert!(!site.is_personal_site);
/// ```
pub fn parse_site_url(url: &str) -> SiteReference {
    info!("Parsing SharePoint URL: {}", url);

    let mut site = SiteReference::default();

    if url.is_empty() {
        error!("Empty URL provided");
        return site;
    }

    let url = url.split('?').next().unwrap_or_default().trim_end_matches('/');

    if let Some(captures) = DOMAIN_REGEX.captures(url) {
        site.tenant_domain = captures[1].to_string();
        debug!("Extracted tenant domain: {}", site.tenant_domain);
    }

    if let Some(captures) = PERSONAL_REGEX.captures(url) {
        site.is_personal_site = true;
        site.site_path = format!("/personal/{}", &captures[1]);
        info!("Detected personal OneDrive site");
    } else if let Some(captures) = SITE_REGEX.captures(url) {
        site.site_path = format!("/sites/{}", &captures[1]);
        info!("Detected team SharePoint site");
    }

    if let Some(captures) = DOCUMENTS_REGEX.captures(url) {
        site.document_path = decode(&captures[1]);
        info!("Target folder: {}", site.document_path);
    } else if LIBRARY_SEGMENTS.iter().any(|segment| url.contains(segment)) {
        info!("Target: Root Documents folder");
    } else if site.is_personal_site {
        if let Some(captures) = PERSONAL_PATH_REGEX.captures(url) {
            site.document_path = decode(&captures[1]);
            info!("Target folder: {}", site.document_path);
        }
    }

    site
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_site_with_folder() {
        let site = parse_site_url("https://contoso.sharepoint.com/sites/myteam/Documents/Archive");
        assert_eq!(site.tenant_domain, "contoso.sharepoint.com");
        assert_eq!(site.site_path, "/sites/myteam");
        assert_eq!(site.document_path, "Archive");
        assert!(!site.is_personal_site);
        assert_eq!(site.site_name(), Some("myteam"));
    }

    #[test]
    fn test_personal_site() {
        let site = parse_site_url(
            "https://contoso-my.sharepoint.com/personal/user_contoso_com/Documents/Projects",
        );
        assert!(site.is_personal_site);
        assert_eq!(site.site_path, "/personal/user_contoso_com");
        assert_eq!(site.document_path, "Projects");
        assert_eq!(site.site_name(), Some("user_contoso_com"));
    }

    #[test]
    fn test_documents_root() {
        let site = parse_site_url("https://contoso.sharepoint.com/sites/myteam/Documents/");
        assert_eq!(site.document_path, "");
        assert_eq!(site.site_path, "/sites/myteam");
    }

    #[test]
    fn test_empty_url() {
        assert_eq!(parse_site_url(""), SiteReference::default());
    }

    #[test]
    fn test_query_string_stripped() {
        let site = parse_site_url(
            "https://contoso.sharepoint.com/sites/myteam/Documents/Archive/2023?web=1",
        );
        assert_eq!(site.document_path, "Archive/2023");
    }

    #[test]
    fn test_personal_without_documents() {
        let site = parse_site_url("https://contoso-my.sharepoint.com/personal/jdoe/Work%20Items/Q1");
        assert!(site.is_personal_site);
        assert_eq!(site.document_path, "Work Items/Q1");
    }

    #[test]
    fn test_no_site_path() {
        let site = parse_site_url("https://contoso.sharepoint.com");
        assert_eq!(site.tenant_domain, "contoso.sharepoint.com");
        assert_eq!(site.site_path, "");
        assert_eq!(site.document_path, "");
        assert_eq!(site.site_name(), None);
    }
}
