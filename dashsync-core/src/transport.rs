use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, StatusCode};
use tracing::debug;
use url::Url;

use crate::error::ClientError;

const DEFAULT_USER_AGENT: &str = concat!("dashsync/", env!("CARGO_PKG_VERSION"));

/// How requests authenticate against the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Basic { username: String, password: String },
}

impl Credentials {
    /// `user:password` selects basic auth, anything else is an API key.
    pub fn parse(credential: &str) -> Self {
        match credential.split_once(':') {
            Some((username, password)) => Credentials::Basic {
                username: username.to_string(),
                password: password.to_string(),
            },
            None => Credentials::Bearer(credential.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Clone)]
pub struct Transport {
    http: Client,
    base_url: Url,
    bearer: Option<String>,
}

impl Transport {
    pub fn new(base_url: &str, credential: &str) -> Result<Self, ClientError> {
        Self::with_http(Client::new(), base_url, credential)
    }

    pub fn with_http(http: Client, base_url: &str, credential: &str) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }
        let bearer = match Credentials::parse(credential) {
            Credentials::Bearer(token) => Some(token),
            Credentials::Basic { username, password } => {
                // reqwest turns URL userinfo into a basic Authorization header.
                let embedded = base_url.set_username(&username).is_ok()
                    && base_url.set_password(Some(&password)).is_ok();
                if !embedded {
                    return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
                }
                None
            }
        };
        Ok(Self {
            http,
            base_url,
            bearer,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn get(
        &self,
        segments: &[&str],
        query: &[(String, String)],
    ) -> Result<RawResponse, ClientError> {
        self.send(Method::GET, segments, query, None).await
    }

    pub async fn post(&self, segments: &[&str], body: Vec<u8>) -> Result<RawResponse, ClientError> {
        self.send(Method::POST, segments, &[], Some(body)).await
    }

    pub async fn put(&self, segments: &[&str], body: Vec<u8>) -> Result<RawResponse, ClientError> {
        self.send(Method::PUT, segments, &[], Some(body)).await
    }

    pub async fn patch(&self, segments: &[&str], body: Vec<u8>) -> Result<RawResponse, ClientError> {
        self.send(Method::PATCH, segments, &[], Some(body)).await
    }

    pub async fn delete(&self, segments: &[&str]) -> Result<RawResponse, ClientError> {
        self.send(Method::DELETE, segments, &[], None).await
    }

    pub async fn send(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(String, String)],
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse, ClientError> {
        let url = self.endpoint(segments, query)?;
        debug!(%method, path = url.path(), "sending request");
        let mut request = self
            .http
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, DEFAULT_USER_AGENT);
        if let Some(token) = &self.bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.body(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        debug!(%status, bytes = body.len(), "received response");
        Ok(RawResponse { status, body })
    }

    fn endpoint(&self, segments: &[&str], query: &[(String, String)]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        {
            // Keeps any path prefix of the base URL ("https://host/grafana/").
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidBaseUrl(self.base_url.to_string()))?;
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}
