//! Sidecar `.folder.json` files that tie a local directory to a remote folder.
//!
//! A signature is written exactly once, right after its directory was created
//! from a remote folder, and only read afterwards. A directory whose signature
//! disagrees with a remote folder is reported, never rewritten.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use dashsync_core::{Folder, same_identity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SIGNATURE_FILE: &str = ".folder.json";

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("no folder signature in {}", .0.display())]
    NotFound(PathBuf),
    #[error("folder signature {} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },
    #[error("folder signature {} already exists", .0.display())]
    AlreadyExists(PathBuf),
    #[error("failed to write folder signature {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Identity snapshot of the remote folder a directory was materialized from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FolderSignature {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: i64,
}

impl FolderSignature {
    /// Compares stable identity only; a renamed or re-versioned folder still matches.
    pub fn identifies(&self, folder: &Folder) -> bool {
        same_identity(&self.uid, self.id, &folder.uid, folder.id)
    }

    /// Only a uid can be looked up on the server; without one the folder is always created.
    pub fn has_uid(&self) -> bool {
        !self.uid.is_empty()
    }
}

impl From<&Folder> for FolderSignature {
    fn from(folder: &Folder) -> Self {
        Self {
            id: folder.id,
            uid: folder.uid.clone(),
            title: folder.title.clone(),
            version: folder.version,
        }
    }
}

pub fn signature_path(dir: &Path) -> PathBuf {
    dir.join(SIGNATURE_FILE)
}

pub fn write_signature(dir: &Path, folder: &Folder) -> Result<(), SignatureError> {
    let path = signature_path(dir);
    let payload = serde_json::to_vec_pretty(&FolderSignature::from(folder)).map_err(|err| {
        SignatureError::Corrupt {
            path: path.clone(),
            reason: err.to_string(),
        }
    })?;
    let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            return Err(SignatureError::AlreadyExists(path));
        }
        Err(source) => return Err(SignatureError::Write { path, source }),
    };
    file.write_all(&payload)
        .and_then(|_| file.sync_all())
        .map_err(|source| SignatureError::Write {
            path: path.clone(),
            source,
        })
}

pub fn read_signature(dir: &Path) -> Result<FolderSignature, SignatureError> {
    let path = signature_path(dir);
    let raw = match std::fs::read(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(SignatureError::NotFound(dir.to_path_buf()));
        }
        Err(err) => {
            return Err(SignatureError::Corrupt {
                path,
                reason: err.to_string(),
            });
        }
    };
    serde_json::from_slice(&raw).map_err(|err| SignatureError::Corrupt {
        path,
        reason: err.to_string(),
    })
}

pub fn matches(dir: &Path, folder: &Folder) -> Result<bool, SignatureError> {
    Ok(read_signature(dir)?.identifies(folder))
}
