//! Depth-first enumeration of a drive folder tree.

use tracing::{debug, info};

use crate::client::GraphClient;
use crate::models::{DriveItem, ItemKind, ItemRecord};

/// Running item counts for a scan. `total == files + folders` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub total: usize,
    pub files: usize,
    pub folders: usize,
}

impl ScanStats {
    fn record(&mut self, kind: ItemKind) {
        self.total += 1;
        match kind {
            ItemKind::File => self.files += 1,
            ItemKind::Folder => self.folders += 1,
        }
    }
}

/// Records in traversal order plus their counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanResult {
    pub items: Vec<ItemRecord>,
    pub stats: ScanStats,
}

/// Child waiting to be recorded, with the path of the folder that listed it.
struct Pending {
    item: DriveItem,
    parent_path: String,
}

/// Walks one drive, listing children folder by folder.
pub struct Scanner<'a> {
    client: &'a GraphClient,
    drive_id: &'a str,
}

impl<'a> Scanner<'a> {
    pub fn new(client: &'a GraphClient, drive_id: &'a str) -> Self {
        Self { client, drive_id }
    }

    /// Scan everything below `folder_id`, naming items relative to `path_prefix`.
    ///
    /// Items come out pre-order: a folder is recorded before its descendants,
    /// and siblings keep the order the API returned them in. A folder that
    /// cannot be listed contributes no children; the scan carries on.
    pub async fn scan(&self, folder_id: &str, path_prefix: &str) -> ScanResult {
        let mut result = ScanResult::default();
        let mut stack: Vec<Pending> = Vec::new();

        self.push_children(&mut stack, folder_id, path_prefix).await;

        while let Some(Pending { item, parent_path }) = stack.pop() {
            let record = ItemRecord::from_drive_item(&item, &parent_path);
            result.stats.record(record.kind);

            if record.is_folder() {
                debug!("Found folder: {}", record.path);
                let path = record.path.clone();
                result.items.push(record);
                self.push_children(&mut stack, &item.id, &path).await;
            } else {
                debug!("Found file: {}", record.path);
                result.items.push(record);
            }
        }

        result
    }

    /// List a folder and queue its children so the first child is popped first.
    async fn push_children(&self, stack: &mut Vec<Pending>, folder_id: &str, path: &str) {
        let children = match self.client.list_children(self.drive_id, folder_id).await {
            Some(children) if !children.is_empty() => children,
            _ => {
                debug!("No items found in folder: {}", path);
                return;
            }
        };

        info!(
            "Scanning folder: {} ({} items)",
            if path.is_empty() { "Root" } else { path },
            children.len()
        );

        stack.extend(children.into_iter().rev().map(|item| Pending {
            item,
            parent_path: path.to_string(),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_partition_total() {
        let mut stats = ScanStats::default();
        stats.record(ItemKind::File);
        stats.record(ItemKind::Folder);
        stats.record(ItemKind::File);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.files, 2);
        assert_eq!(stats.folders, 1);
        assert_eq!(stats.files + stats.folders, stats.total);
    }
}
