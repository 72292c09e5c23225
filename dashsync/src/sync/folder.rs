use std::path::Path;

use dashsync_core::Folder;

use crate::signature::{self, FolderSignature, SignatureError};

/// What is on disk where a remote folder would be materialized.
#[derive(Debug)]
pub enum LocalDir {
    Missing,
    Signed(FolderSignature),
    Unusable(SignatureError),
}

impl LocalDir {
    pub fn inspect(dir: &Path) -> Self {
        // Lstat semantics: a dangling symlink still occupies the name.
        if std::fs::symlink_metadata(dir).is_err() {
            return LocalDir::Missing;
        }
        match signature::read_signature(dir) {
            Ok(signature) => LocalDir::Signed(signature),
            Err(err) => LocalDir::Unusable(err),
        }
    }
}

#[derive(Debug)]
pub enum DownloadDecision {
    /// Create the directory, write its signature, then sync dashboards.
    Materialize,
    /// The directory already belongs to this folder.
    Reuse,
    /// The directory belongs to another remote folder; leave it alone.
    Mismatch { recorded: FolderSignature },
    /// The directory exists but carries no trustworthy signature.
    Unusable(SignatureError),
}

pub fn decide_download(remote: &Folder, local: LocalDir) -> DownloadDecision {
    match local {
        LocalDir::Missing => DownloadDecision::Materialize,
        LocalDir::Signed(recorded) if recorded.identifies(remote) => DownloadDecision::Reuse,
        LocalDir::Signed(recorded) => DownloadDecision::Mismatch { recorded },
        LocalDir::Unusable(err) => DownloadDecision::Unusable(err),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderAction {
    Create,
    /// Push the recorded title and version onto the existing folder.
    Update,
}

/// `remote` is the server's answer for the signature's uid (`None` on 404).
/// A signature without a uid cannot be looked up and always creates.
pub fn decide_upload(signature: &FolderSignature, remote: Option<&Folder>) -> FolderAction {
    match remote {
        Some(_) if signature.has_uid() => FolderAction::Update,
        _ => FolderAction::Create,
    }
}

/// Server id dashboards are filed under, or `None` when the server could not assign one.
pub fn target_folder_id(folder: &Folder) -> Option<i64> {
    (folder.id != 0).then_some(folder.id)
}
