//! CSV export of scanned item records.

use std::path::{Path, PathBuf};

use serde::Serialize;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{format_size_kb, ItemRecord};

/// One CSV row; field renames form the header.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Path")]
    path: &'a str,
    #[serde(rename = "Created")]
    created: &'a str,
    #[serde(rename = "Modified")]
    modified: &'a str,
    #[serde(rename = "CreatedBy")]
    created_by: &'a str,
    #[serde(rename = "ModifiedBy")]
    modified_by: &'a str,
    #[serde(rename = "Size_KB")]
    size_kb: String,
    #[serde(rename = "IsFolder")]
    is_folder: &'static str,
}

impl<'a> From<&'a ItemRecord> for CsvRow<'a> {
    fn from(record: &'a ItemRecord) -> Self {
        Self {
            name: &record.name,
            kind: record.kind.to_string(),
            path: &record.path,
            created: &record.created,
            modified: &record.modified,
            created_by: &record.created_by,
            modified_by: &record.modified_by,
            size_kb: format_size_kb(record.size_kb),
            is_folder: if record.is_folder() { "True" } else { "False" },
        }
    }
}

/// What the exporter did with a list of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStatus {
    /// Header plus this many data rows were written.
    Written(usize),
    /// Nothing to export; no file was created.
    Skipped,
}

/// Write `items` to `output` as CSV, in the given order.
///
/// An empty list writes nothing and returns [`ExportStatus::Skipped`].
pub fn export_to_csv(items: &[ItemRecord], output: &Path) -> Result<ExportStatus> {
    if items.is_empty() {
        warn!("No items to export");
        return Ok(ExportStatus::Skipped);
    }

    info!("Exporting {} items to CSV...", items.len());

    let mut writer = csv::Writer::from_path(output)?;
    for record in items {
        writer.serialize(CsvRow::from(record))?;
    }
    writer.flush()?;

    info!("Export completed: {}", output.display());
    Ok(ExportStatus::Written(items.len()))
}

/// `sharepoint_contents_YYYYmmdd_HHMMSS.csv` for the given moment.
pub fn output_file_name(at: OffsetDateTime) -> String {
    let format = format_description!("[year][month][day]_[hour][minute][second]");
    let stamp = at
        .format(&format)
        .unwrap_or_else(|_| at.unix_timestamp().to_string());
    format!("sharepoint_contents_{}.csv", stamp)
}

/// Default output path in the working directory, stamped with local time.
pub fn default_output_path() -> PathBuf {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    PathBuf::from(output_file_name(now))
}
