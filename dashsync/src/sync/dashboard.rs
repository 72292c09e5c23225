use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::signature::SIGNATURE_FILE;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("document is not a json object")]
    NotAnObject,
    #[error("missing \"panels\", not a dashboard")]
    MissingPanels,
}

/// A dashboard document kept as an opaque json tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardDocument {
    body: Value,
}

impl DashboardDocument {
    pub fn parse(raw: &[u8]) -> Result<Self, DashboardError> {
        Self::from_value(serde_json::from_slice(raw)?)
    }

    pub fn from_value(body: Value) -> Result<Self, DashboardError> {
        let object = body.as_object().ok_or(DashboardError::NotAnObject)?;
        if object.get("panels").is_none_or(Value::is_null) {
            return Err(DashboardError::MissingPanels);
        }
        Ok(Self { body })
    }

    pub fn uid(&self) -> Option<&str> {
        self.body
            .get("uid")
            .and_then(Value::as_str)
            .filter(|uid| !uid.is_empty())
    }

    pub fn title(&self) -> &str {
        self.body
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("untitled")
    }

    pub fn body(&self) -> &Value {
        &self.body
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadDecision {
    /// Identical to the server copy; submitting would only bump its version.
    NoChanges,
    Submit,
}

pub fn decide_upload(local: &DashboardDocument, remote: Option<&Value>) -> UploadDecision {
    match remote {
        Some(remote) if is_unchanged(remote, local.body()) => UploadDecision::NoChanges,
        _ => UploadDecision::Submit,
    }
}

/// Structural equality ignoring the environment-specific numeric `id`.
pub fn is_unchanged(remote: &Value, local: &Value) -> bool {
    match (remote.as_object(), local.as_object()) {
        (Some(remote), Some(local)) => {
            let mut remote = remote.clone();
            let mut local = local.clone();
            remote.remove("id");
            local.remove("id");
            remote == local
        }
        _ => remote == local,
    }
}

/// Upload candidates: `.json` files other than the folder signature.
pub fn is_dashboard_file(path: &Path) -> bool {
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let is_signature = path.file_name().is_some_and(|name| name == SIGNATURE_FILE);
    is_json && !is_signature
}
