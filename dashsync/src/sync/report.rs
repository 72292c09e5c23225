use std::path::PathBuf;

use super::engine::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderOutcome {
    Materialized,
    Reused,
    Created,
    Updated,
}

#[derive(Debug)]
pub enum ItemOutcome {
    Folder {
        dir: PathBuf,
        title: String,
        outcome: FolderOutcome,
    },
    Downloaded {
        path: PathBuf,
    },
    Uploaded {
        file: PathBuf,
        title: String,
        slug: String,
        url: String,
    },
    Unchanged {
        file: PathBuf,
        title: String,
    },
    Skipped {
        path: PathBuf,
        reason: &'static str,
    },
    Failed {
        item: String,
        error: SyncError,
    },
}

/// Everything a download or upload pass did, in order.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub items: Vec<ItemOutcome>,
}

impl SyncReport {
    pub fn push(&mut self, outcome: ItemOutcome) {
        self.items.push(outcome);
    }

    pub fn fail(&mut self, item: impl Into<String>, error: impl Into<SyncError>) {
        self.items.push(ItemOutcome::Failed {
            item: item.into(),
            error: error.into(),
        });
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &SyncError)> {
        self.items.iter().filter_map(|outcome| match outcome {
            ItemOutcome::Failed { item, error } => Some((item.as_str(), error)),
            _ => None,
        })
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for item in &self.items {
            match item {
                ItemOutcome::Folder { .. } => summary.folders += 1,
                ItemOutcome::Downloaded { .. } | ItemOutcome::Uploaded { .. } => {
                    summary.written += 1
                }
                ItemOutcome::Unchanged { .. } => summary.unchanged += 1,
                ItemOutcome::Skipped { .. } => summary.skipped += 1,
                ItemOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub folders: usize,
    pub written: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}
