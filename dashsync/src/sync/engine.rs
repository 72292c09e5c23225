use std::io;
use std::path::{Path, PathBuf};

use dashsync_core::{ClientError, DashboardClient, Folder, SearchParams};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::signature::{self, FolderSignature, SIGNATURE_FILE, SignatureError};

use super::dashboard::{self, DashboardDocument, DashboardError, UploadDecision};
use super::folder::{self, DownloadDecision, FolderAction, LocalDir};
use super::paths::{self, PathError};
use super::report::{FolderOutcome, ItemOutcome, SyncReport};

/// Id of the root-level "General" folder; its dashboards live in the target root.
pub const GENERAL_FOLDER_ID: i64 = 0;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error("invalid dashboard {}: {source}", .path.display())]
    InvalidDashboard {
        path: PathBuf,
        #[source]
        source: DashboardError,
    },
    #[error(
        "directory {} is signed for folder {recorded:?}, not {remote:?}; folder skipped",
        .dir.display()
    )]
    SignatureMismatch {
        dir: PathBuf,
        recorded: String,
        remote: String,
    },
    #[error("server returned no id for folder {uid:?}; its dashboards were skipped")]
    UnresolvedFolder { uid: String },
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid local name: {0}")]
    Path(#[from] PathError),
}

/// Runs one download or upload pass. Per-item failures land in the report;
/// only setup failures are returned as errors.
pub struct SyncEngine {
    client: DashboardClient,
    config: SyncConfig,
}

impl SyncEngine {
    pub fn new(client: DashboardClient, config: SyncConfig) -> Self {
        Self { client, config }
    }

    pub async fn download_all(&self, target: &Path) -> Result<SyncReport, SyncError> {
        tokio::fs::create_dir_all(target)
            .await
            .map_err(io_error(target))?;
        let folders = self.client.list_folders().await?;
        info!(folders = folders.len(), target = %target.display(), "download started");

        let mut report = SyncReport::default();
        for folder in &folders {
            self.download_folder(folder, target, &mut report).await;
        }
        self.save_folder_dashboards(GENERAL_FOLDER_ID, target, &mut report)
            .await;
        Ok(report)
    }

    pub async fn download_folder(&self, folder: &Folder, target: &Path, report: &mut SyncReport) {
        let label = folder_label(folder);
        let dir = match paths::folder_dir_for(target, &folder.title) {
            Ok(dir) => dir,
            Err(err) => {
                warn!(folder = %label, error = %err, "cannot map folder to a directory");
                report.fail(label, err);
                return;
            }
        };

        let outcome = match folder::decide_download(folder, LocalDir::inspect(&dir)) {
            DownloadDecision::Materialize => {
                if let Err(err) = materialize(&dir, folder).await {
                    warn!(folder = %label, error = %err, "failed to materialize folder");
                    report.fail(label, err);
                    return;
                }
                FolderOutcome::Materialized
            }
            DownloadDecision::Reuse => FolderOutcome::Reused,
            DownloadDecision::Mismatch { recorded } => {
                warn!(folder = %label, dir = %dir.display(), recorded = %recorded.uid, "folder signatures don't match");
                report.fail(
                    label,
                    SyncError::SignatureMismatch {
                        dir,
                        recorded: recorded.uid,
                        remote: folder.uid.clone(),
                    },
                );
                return;
            }
            DownloadDecision::Unusable(err) => {
                warn!(folder = %label, error = %err, "existing directory has no usable signature");
                report.fail(label, err);
                return;
            }
        };
        info!(folder = %label, dir = %dir.display(), ?outcome, "folder ready");
        report.push(ItemOutcome::Folder {
            dir: dir.clone(),
            title: folder.title.clone(),
            outcome,
        });
        self.save_folder_dashboards(folder.id, &dir, report).await;
    }

    async fn save_folder_dashboards(&self, folder_id: i64, dir: &Path, report: &mut SyncReport) {
        let hits = match self
            .client
            .search_dashboards(&SearchParams::in_folder(folder_id))
            .await
        {
            Ok(hits) => hits,
            Err(err) => {
                warn!(folder_id, error = %err, "failed to list dashboards");
                report.fail(format!("dashboards of folder id {folder_id}"), err);
                return;
            }
        };
        for hit in hits {
            match self.download_dashboard(&hit.uid, dir).await {
                Ok(path) => {
                    debug!(uid = %hit.uid, path = %path.display(), "dashboard downloaded");
                    report.push(ItemOutcome::Downloaded { path });
                }
                Err(err) => {
                    warn!(uid = %hit.uid, error = %err, "dashboard download failed");
                    report.fail(format!("dashboard {:?} ({})", hit.title, hit.uid), err);
                }
            }
        }
    }

    async fn download_dashboard(&self, uid: &str, dir: &Path) -> Result<PathBuf, SyncError> {
        let source = self.client.get_dashboard_source(uid).await?;
        let path = paths::dashboard_path(dir, &source.meta.slug)?;
        tokio::fs::write(&path, source.dashboard.get())
            .await
            .map_err(io_error(&path))?;
        Ok(path)
    }

    /// `path` is one dashboard file, a signed folder directory, or a root laid
    /// out by [`SyncEngine::download_all`].
    pub async fn upload(&self, path: &Path, overwrite: bool) -> Result<SyncReport, SyncError> {
        let metadata = tokio::fs::metadata(path).await.map_err(io_error(path))?;
        let mut report = SyncReport::default();

        if !metadata.is_dir() {
            self.upload_single_file(path, overwrite, &mut report).await;
        } else if signature::signature_path(path).is_file() {
            self.upload_folder_dir(path, overwrite, &mut report).await;
        } else {
            info!(root = %path.display(), "uploading general dashboards and folder directories");
            for entry in read_sorted_entries(path).await? {
                if !entry.is_dir {
                    self.upload_file(&entry.path, GENERAL_FOLDER_ID, overwrite, &mut report)
                        .await;
                } else if is_hidden(&entry.path) {
                    report.push(ItemOutcome::Skipped {
                        path: entry.path,
                        reason: "hidden directory",
                    });
                } else {
                    self.upload_folder_dir(&entry.path, overwrite, &mut report)
                        .await;
                }
            }
        }
        Ok(report)
    }

    async fn upload_single_file(&self, file: &Path, overwrite: bool, report: &mut SyncReport) {
        if !dashboard::is_dashboard_file(file) {
            report.push(ItemOutcome::Skipped {
                path: file.to_path_buf(),
                reason: "not a JSON file",
            });
            return;
        }
        let parent = file
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let folder_id = if signature::signature_path(parent).is_file() {
            match self.resolve_directory_folder(parent, report).await {
                Some(folder_id) => folder_id,
                None => return,
            }
        } else {
            GENERAL_FOLDER_ID
        };
        self.upload_file(file, folder_id, overwrite, report).await;
    }

    async fn upload_folder_dir(&self, dir: &Path, overwrite: bool, report: &mut SyncReport) {
        let Some(folder_id) = self.resolve_directory_folder(dir, report).await else {
            return;
        };
        let entries = match read_sorted_entries(dir).await {
            Ok(entries) => entries,
            Err(err) => {
                report.fail(dir.display().to_string(), err);
                return;
            }
        };
        for entry in entries {
            if entry.is_dir {
                report.push(ItemOutcome::Skipped {
                    path: entry.path,
                    reason: "is a directory",
                });
                continue;
            }
            self.upload_file(&entry.path, folder_id, overwrite, report)
                .await;
        }
    }

    /// Resolves the server id for a signed directory, or records why it can't.
    async fn resolve_directory_folder(&self, dir: &Path, report: &mut SyncReport) -> Option<i64> {
        let label = dir.display().to_string();
        let signature = match signature::read_signature(dir) {
            Ok(signature) => signature,
            Err(err) => {
                warn!(dir = %label, error = %err, "directory skipped");
                report.fail(label, err);
                return None;
            }
        };
        let (remote, outcome) = match self.resolve_remote_folder(&signature).await {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!(dir = %label, uid = %signature.uid, error = %err, "folder could not be resolved");
                report.fail(label, err);
                return None;
            }
        };
        let Some(folder_id) = folder::target_folder_id(&remote) else {
            report.fail(
                label,
                SyncError::UnresolvedFolder {
                    uid: signature.uid.clone(),
                },
            );
            return None;
        };
        info!(dir = %label, folder_id, ?outcome, "folder resolved");
        report.push(ItemOutcome::Folder {
            dir: dir.to_path_buf(),
            title: remote.title,
            outcome,
        });
        Some(folder_id)
    }

    async fn resolve_remote_folder(
        &self,
        signature: &FolderSignature,
    ) -> Result<(Folder, FolderOutcome), SyncError> {
        let remote = if signature.has_uid() {
            self.client.get_folder(&signature.uid).await?
        } else {
            None
        };
        let resolved = match folder::decide_upload(signature, remote.as_ref()) {
            FolderAction::Create => (
                self.client
                    .create_folder(&signature.uid, &signature.title)
                    .await?,
                FolderOutcome::Created,
            ),
            FolderAction::Update => (
                self.client
                    .update_folder(&signature.uid, &signature.title, signature.version, false)
                    .await?,
                FolderOutcome::Updated,
            ),
        };
        Ok(resolved)
    }

    async fn upload_file(&self, file: &Path, folder_id: i64, overwrite: bool, report: &mut SyncReport) {
        if file.file_name().is_some_and(|name| name == SIGNATURE_FILE) {
            return;
        }
        if !dashboard::is_dashboard_file(file) {
            report.push(ItemOutcome::Skipped {
                path: file.to_path_buf(),
                reason: "not a JSON file",
            });
            return;
        }
        match self.push_dashboard(file, folder_id, overwrite).await {
            Ok(outcome) => report.push(outcome),
            Err(err) => {
                warn!(file = %file.display(), error = %err, "dashboard upload failed");
                report.fail(file.display().to_string(), err);
            }
        }
    }

    async fn push_dashboard(
        &self,
        file: &Path,
        folder_id: i64,
        overwrite: bool,
    ) -> Result<ItemOutcome, SyncError> {
        let raw = tokio::fs::read(file).await.map_err(io_error(file))?;
        let document =
            DashboardDocument::parse(&raw).map_err(|source| SyncError::InvalidDashboard {
                path: file.to_path_buf(),
                source,
            })?;

        let remote = match document.uid() {
            Some(uid) => match self.client.get_dashboard(uid).await {
                Ok(existing) => Some(existing.dashboard),
                Err(err) if err.is_not_found() => None,
                Err(err) => return Err(err.into()),
            },
            None => None,
        };
        let title = document.title().to_string();
        if dashboard::decide_upload(&document, remote.as_ref()) == UploadDecision::NoChanges {
            info!(file = %file.display(), %title, "no changes, not updating");
            return Ok(ItemOutcome::Unchanged {
                file: file.to_path_buf(),
                title,
            });
        }

        let response = self
            .client
            .set_dashboard(document.body(), overwrite, folder_id)
            .await?;
        info!(file = %file.display(), uid = %response.uid, version = response.version, "dashboard uploaded");
        Ok(ItemOutcome::Uploaded {
            file: file.to_path_buf(),
            title,
            slug: response.slug,
            url: self.config.link(&response.url),
        })
    }
}

async fn materialize(dir: &Path, folder: &Folder) -> Result<(), SyncError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(io_error(dir))?;
    signature::write_signature(dir, folder)?;
    Ok(())
}

struct LocalEntry {
    path: PathBuf,
    is_dir: bool,
}

async fn read_sorted_entries(dir: &Path) -> Result<Vec<LocalEntry>, SyncError> {
    let mut reader = tokio::fs::read_dir(dir).await.map_err(io_error(dir))?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await.map_err(io_error(dir))? {
        let path = entry.path();
        let is_dir = entry
            .file_type()
            .await
            .map_err(io_error(&path))?
            .is_dir();
        entries.push(LocalEntry { path, is_dir });
    }
    entries.sort_by(|left, right| left.path.cmp(&right.path));
    Ok(entries)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

fn folder_label(folder: &Folder) -> String {
    format!("folder {:?} ({})", folder.title, folder.uid)
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> SyncError + '_ {
    move |source| SyncError::Io {
        path: path.to_path_buf(),
        source,
    }
}
