//! Data models for Microsoft Graph and identity platform responses, plus the
//! flat item records produced by a scan.

use serde::Deserialize;

/// A SharePoint site (team or personal).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A document library belonging to a site.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drive {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A file or folder entry within a drive.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub created_date_time: Option<String>,
    #[serde(default)]
    pub last_modified_date_time: Option<String>,
    #[serde(default)]
    pub created_by: Option<IdentitySet>,
    #[serde(default)]
    pub last_modified_by: Option<IdentitySet>,
    #[serde(default)]
    pub folder: Option<FolderFacet>,
}

impl DriveItem {
    /// Graph marks folders with a `folder` facet; everything else is a file.
    pub fn is_folder(&self) -> bool {
        self.folder.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderFacet {
    #[serde(default)]
    pub child_count: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentitySet {
    #[serde(default)]
    pub user: Option<Identity>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(default)]
    pub display_name: Option<String>,
}

fn display_name(identity: Option<&IdentitySet>) -> String {
    identity
        .and_then(|set| set.user.as_ref())
        .and_then(|user| user.display_name.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// A page of a Graph collection response.
#[derive(Debug, Deserialize)]
pub struct Collection<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

/// Graph API error response.
#[derive(Debug, Deserialize)]
pub struct GraphErrorResponse {
    pub error: GraphErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct GraphErrorDetail {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// OAuth2 token response from the identity platform.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// OAuth2 error body (`error` / `error_description`).
#[derive(Debug, Deserialize)]
pub struct OAuthErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl OAuthErrorResponse {
    /// The provider's description, or the bare error code when none is given.
    pub fn describe(&self) -> String {
        self.error_description
            .clone()
            .unwrap_or_else(|| self.error.clone())
    }
}

/// Response from the device authorization endpoint.
#[derive(Debug, Deserialize)]
pub struct DeviceCodeResponse {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    #[serde(default = "default_device_code_lifetime")]
    pub expires_in: u64,
    #[serde(default = "default_poll_interval")]
    pub interval: u64,
}

fn default_device_code_lifetime() -> u64 {
    900
}

fn default_poll_interval() -> u64 {
    5
}

/// Whether a scanned entry is a file or a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    File,
    Folder,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::File => write!(f, "File"),
            ItemKind::Folder => write!(f, "Folder"),
        }
    }
}

/// Flat metadata record for one remote item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    pub name: String,
    pub kind: ItemKind,
    /// Path relative to the scan root, `/`-joined.
    pub path: String,
    pub created: String,
    pub modified: String,
    pub created_by: String,
    pub modified_by: String,
    pub size_kb: f64,
}

impl ItemRecord {
    /// Build a record for `item` whose parent resolved to `parent_path`.
    pub fn from_drive_item(item: &DriveItem, parent_path: &str) -> Self {
        let kind = if item.is_folder() {
            ItemKind::Folder
        } else {
            ItemKind::File
        };

        Self {
            name: item.name.clone(),
            kind,
            path: join_path(parent_path, &item.name),
            created: item.created_date_time.clone().unwrap_or_default(),
            modified: item.last_modified_date_time.clone().unwrap_or_default(),
            created_by: display_name(item.created_by.as_ref()),
            modified_by: display_name(item.last_modified_by.as_ref()),
            size_kb: size_in_kb(item.size),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == ItemKind::Folder
    }
}

impl std::fmt::Display for ItemRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}\t{}",
            self.kind,
            format_size_kb(self.size_kb),
            self.path
        )
    }
}

/// Join a parent path and a child name; root-level items get no prefix.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Convert a byte count to kilobytes rounded to two decimals, ties to even.
pub fn size_in_kb(bytes: Option<u64>) -> f64 {
    match bytes {
        Some(b) if b > 0 => (b as f64 / 1024.0 * 100.0).round_ties_even() / 100.0,
        _ => 0.0,
    }
}

/// Render a kilobyte value the way the export columns show it.
pub fn format_size_kb(kb: f64) -> String {
    if kb == 0.0 {
        "0".to_string()
    } else if kb.fract() == 0.0 {
        format!("{:.1}", kb)
    } else {
        format!("{}", kb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_in_kb() {
        assert_eq!(size_in_kb(None), 0.0);
        assert_eq!(size_in_kb(Some(0)), 0.0);
        assert_eq!(size_in_kb(Some(1024)), 1.0);
        assert_eq!(size_in_kb(Some(1536)), 1.5);
        assert_eq!(size_in_kb(Some(1000)), 0.98);
    }

    #[test]
    fn test_size_in_kb_halves_round_to_even() {
        assert_eq!(size_in_kb(Some(128)), 0.12);
        assert_eq!(size_in_kb(Some(640)), 0.62);
        assert_eq!(size_in_kb(Some(384)), 0.38);
        assert_eq!(size_in_kb(Some(1152)), 1.12);
    }

    #[test]
    fn test_format_size_kb() {
        assert_eq!(format_size_kb(0.0), "0");
        assert_eq!(format_size_kb(1.0), "1.0");
        assert_eq!(format_size_kb(0.98), "0.98");
        assert_eq!(format_size_kb(2048.5), "2048.5");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "a.txt"), "a.txt");
        assert_eq!(join_path("Archive", "a.txt"), "Archive/a.txt");
        assert_eq!(join_path("Archive/2023", "q1"), "Archive/2023/q1");
    }

    #[test]
    fn test_drive_item_deserialize_folder() {
        let json = r#"{
            "id": "01ABC",
            "name": "Reports",
            "size": 4096,
            "createdDateTime": "2023-01-02T03:04:05Z",
            "lastModifiedDateTime": "2023-02-02T03:04:05Z",
            "createdBy": {"user": {"displayName": "Alice"}},
            "lastModifiedBy": {"user": {"displayName": "Bob"}},
            "folder": {"childCount": 3}
        }"#;

        let item: DriveItem = serde_json::from_str(json).unwrap();
        assert!(item.is_folder());
        assert_eq!(item.folder.unwrap().child_count, Some(3));
        assert_eq!(item.size, Some(4096));
    }

    #[test]
    fn test_record_from_drive_item() {
        let json = r#"{
            "id": "02DEF",
            "name": "notes.txt",
            "size": 2048,
            "createdDateTime": "2023-01-02T03:04:05Z",
            "createdBy": {"application": {"displayName": "Sync"}},
            "file": {"mimeType": "text/plain"}
        }"#;

        let item: DriveItem = serde_json::from_str(json).unwrap();
        let record = ItemRecord::from_drive_item(&item, "Archive");

        assert_eq!(record.kind, ItemKind::File);
        assert!(!record.is_folder());
        assert_eq!(record.path, "Archive/notes.txt");
        assert_eq!(record.created, "2023-01-02T03:04:05Z");
        assert_eq!(record.modified, "");
        assert_eq!(record.created_by, "Unknown");
        assert_eq!(record.modified_by, "Unknown");
        assert_eq!(record.size_kb, 2.0);
    }

    #[test]
    fn test_collection_without_value() {
        let page: Collection<DriveItem> = serde_json::from_str("{}").unwrap();
        assert!(page.value.is_empty());
        assert!(page.next_link.is_none());
    }

    #[test]
    fn test_collection_next_link() {
        let json = r#"{
            "value": [{"id": "1", "name": "a"}],
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/next"
        }"#;
        let page: Collection<DriveItem> = serde_json::from_str(json).unwrap();
        assert_eq!(page.value.len(), 1);
        assert_eq!(
            page.next_link.as_deref(),
            Some("https://graph.microsoft.com/v1.0/next")
        );
    }

    #[test]
    fn test_record_display() {
        let record = ItemRecord {
            name: "Reports".to_string(),
            kind: ItemKind::Folder,
            path: "Archive/Reports".to_string(),
            created: String::new(),
            modified: String::new(),
            created_by: "Unknown".to_string(),
            modified_by: "Unknown".to_string(),
            size_kb: 4.0,
        };

        let display = format!("{}", record);
        assert!(display.contains("Folder"));
        assert!(display.contains("4.0"));
        assert!(display.contains("Archive/Reports"));
    }

    #[test]
    fn test_oauth_error_describe() {
        let err: OAuthErrorResponse =
            serde_json::from_str(r#"{"error": "invalid_client"}"#).unwrap();
        assert_eq!(err.describe(), "invalid_client");

        let err: OAuthErrorResponse = serde_json::from_str(
            r#"{"error": "invalid_client", "error_description": "AADSTS7000215: bad secret"}"#,
        )
        .unwrap();
        assert_eq!(err.describe(), "AADSTS7000215: bad secret");
    }
}
