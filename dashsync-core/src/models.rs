use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::value::RawValue;

/// A dashboard folder as the server reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Folder {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: i64,
}

/// Stable identity: equal non-empty uids, or equal non-zero ids when a
/// uid is missing on either side. Title and version are attributes.
pub fn same_identity(left_uid: &str, left_id: i64, right_uid: &str, right_id: i64) -> bool {
    if !left_uid.is_empty() && !right_uid.is_empty() {
        return left_uid == right_uid;
    }
    left_id != 0 && left_id == right_id
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateFolderCommand<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    pub uid: &'a str,
    pub title: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateFolderCommand<'a> {
    pub uid: &'a str,
    pub title: &'a str,
    pub version: i64,
    pub overwrite: bool,
}

/// Error payload the server attaches to 4xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiMessage {
    #[serde(default)]
    pub status: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardMeta {
    pub slug: String,
    pub url: String,
    pub version: i64,
    pub folder_id: i64,
    pub folder_uid: String,
    pub folder_title: String,
    pub is_folder: bool,
    pub provisioned: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DashboardWithMeta {
    #[serde(default)]
    pub meta: DashboardMeta,
    pub dashboard: Value,
}

#[derive(Debug, Deserialize)]
pub struct DashboardSource {
    #[serde(default)]
    pub meta: DashboardMeta,
    pub dashboard: Box<RawValue>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DashboardUploadRequest<'a> {
    pub dashboard: &'a Value,
    pub folder_id: i64,
    pub overwrite: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DashboardUploadResponse {
    pub id: i64,
    pub uid: String,
    pub url: String,
    pub status: String,
    pub version: i64,
    pub slug: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchType {
    #[default]
    DashDb,
    DashFolder,
    #[serde(other)]
    Other,
}

impl SearchType {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::DashDb => "dash-db",
            SearchType::DashFolder => "dash-folder",
            SearchType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchHit {
    pub id: i64,
    pub uid: String,
    pub title: String,
    pub uri: String,
    pub url: String,
    #[serde(rename = "type")]
    pub hit_type: SearchType,
    pub tags: Vec<String>,
    pub is_starred: bool,
    pub folder_id: Option<i64>,
    pub folder_uid: Option<String>,
    pub folder_title: Option<String>,
}

/// Filters for `GET /api/search`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub query: Option<String>,
    pub tags: Vec<String>,
    pub dashboard_ids: Vec<i64>,
    pub folder_ids: Vec<i64>,
    pub starred: bool,
    pub search_type: Option<SearchType>,
}

impl SearchParams {
    pub fn in_folder(folder_id: i64) -> Self {
        Self {
            folder_ids: vec![folder_id],
            ..Self::default()
        }
    }

    pub fn with_type(mut self, search_type: SearchType) -> Self {
        self.search_type = Some(search_type);
        self
    }

    /// Query pairs in a stable order; repeated list entries are sent once.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(query) = self.query.as_deref().filter(|q| !q.is_empty()) {
            pairs.push(("query".to_string(), query.to_string()));
        }
        for tag in dedup(&self.tags) {
            pairs.push(("tag".to_string(), tag.clone()));
        }
        for id in dedup(&self.dashboard_ids) {
            pairs.push(("dashboardIds".to_string(), id.to_string()));
        }
        for id in dedup(&self.folder_ids) {
            pairs.push(("folderIds".to_string(), id.to_string()));
        }
        if self.starred {
            pairs.push(("starred".to_string(), "true".to_string()));
        }
        if let Some(search_type) = self.search_type {
            pairs.push(("type".to_string(), search_type.as_str().to_string()));
        }
        pairs
    }
}

fn dedup<T: PartialEq>(items: &[T]) -> Vec<&T> {
    let mut out: Vec<&T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
