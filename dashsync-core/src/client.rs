use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::error::ClientError;
use crate::models::{
    ApiMessage, CreateFolderCommand, DashboardUploadRequest, DashboardUploadResponse,
    DashboardSource, DashboardWithMeta, Folder, SearchHit, SearchParams, SearchType, UpdateFolderCommand,
};
use crate::transport::{RawResponse, Transport};

/// Typed access to the folder, dashboard and search endpoints.
#[derive(Clone)]
pub struct DashboardClient {
    transport: Transport,
}

impl DashboardClient {
    pub fn new(base_url: &str, credential: &str) -> Result<Self, ClientError> {
        Ok(Self {
            transport: Transport::new(base_url, credential)?,
        })
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn base_url(&self) -> &Url {
        self.transport.base_url()
    }

    pub async fn list_folders(&self) -> Result<Vec<Folder>, ClientError> {
        let response = self.transport.get(&["api", "folders"], &[]).await?;
        decode_ok(response)
    }

    /// A 404 is an answer here, not a failure: the folder does not exist.
    pub async fn get_folder(&self, uid: &str) -> Result<Option<Folder>, ClientError> {
        let response = self.transport.get(&["api", "folders", uid], &[]).await?;
        if response.status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode_ok(response).map(Some)
    }

    pub async fn create_folder(&self, uid: &str, title: &str) -> Result<Folder, ClientError> {
        let body = encode(&CreateFolderCommand { uid, title })?;
        let response = self.transport.post(&["api", "folders", ""], body).await?;
        decode_ok(response)
    }

    pub async fn update_folder(
        &self,
        uid: &str,
        title: &str,
        version: i64,
        overwrite: bool,
    ) -> Result<Folder, ClientError> {
        let body = encode(&UpdateFolderCommand {
            uid,
            title,
            version,
            overwrite,
        })?;
        let response = self.transport.put(&["api", "folders", uid], body).await?;
        if response.status == StatusCode::PRECONDITION_FAILED {
            return Err(conflict_error(&response));
        }
        decode_ok(response)
    }

    pub async fn get_dashboard(&self, uid: &str) -> Result<DashboardWithMeta, ClientError> {
        self.fetch_dashboard(uid).await
    }

    /// Same lookup as [`DashboardClient::get_dashboard`], but the document is
    /// kept as the exact text the server sent.
    pub async fn get_dashboard_source(&self, uid: &str) -> Result<DashboardSource, ClientError> {
        self.fetch_dashboard(uid).await
    }

    async fn fetch_dashboard<T: DeserializeOwned>(&self, uid: &str) -> Result<T, ClientError> {
        let response = self
            .transport
            .get(&["api", "dashboards", "uid", uid], &[])
            .await?;
        if response.status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(format!("dashboard {uid}")));
        }
        decode_ok(response)
    }

    /// Creates or updates a dashboard from its raw document.
    pub async fn set_dashboard(
        &self,
        dashboard: &Value,
        overwrite: bool,
        folder_id: i64,
    ) -> Result<DashboardUploadResponse, ClientError> {
        let body = encode(&DashboardUploadRequest {
            dashboard,
            folder_id,
            overwrite,
        })?;
        let response = self.transport.post(&["api", "dashboards", "db"], body).await?;
        if response.status == StatusCode::PRECONDITION_FAILED {
            return Err(conflict_error(&response));
        }
        decode_ok(response)
    }

    pub async fn search(&self, params: &SearchParams) -> Result<Vec<SearchHit>, ClientError> {
        let response = self
            .transport
            .get(&["api", "search"], &params.to_query())
            .await?;
        decode_ok(response)
    }

    pub async fn search_folders(&self, params: &SearchParams) -> Result<Vec<SearchHit>, ClientError> {
        self.search(&params.clone().with_type(SearchType::DashFolder))
            .await
    }

    pub async fn search_dashboards(
        &self,
        params: &SearchParams,
    ) -> Result<Vec<SearchHit>, ClientError> {
        self.search(&params.clone().with_type(SearchType::DashDb))
            .await
    }
}

fn encode<T: Serialize>(payload: &T) -> Result<Vec<u8>, ClientError> {
    Ok(serde_json::to_vec(payload)?)
}

fn decode_ok<T: DeserializeOwned>(response: RawResponse) -> Result<T, ClientError> {
    if response.status != StatusCode::OK {
        return Err(server_error(&response));
    }
    Ok(serde_json::from_slice(&response.body)?)
}

fn server_error(response: &RawResponse) -> ClientError {
    let body = match serde_json::from_slice::<ApiMessage>(&response.body) {
        Ok(message) => message.message,
        Err(_) => response.body_text(),
    };
    ClientError::Server {
        status: response.status,
        body,
    }
}

fn conflict_error(response: &RawResponse) -> ClientError {
    match serde_json::from_slice::<ApiMessage>(&response.body) {
        Ok(ApiMessage { status, message }) => ClientError::Conflict {
            status: status.unwrap_or_else(|| response.status.to_string()),
            message,
        },
        Err(_) => ClientError::Conflict {
            status: response.status.to_string(),
            message: response.body_text(),
        },
    }
}
