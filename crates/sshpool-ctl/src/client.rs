//! HTTP client for the daemon's control surface

use std::collections::BTreeMap;

use reqwest::{Response, StatusCode};
use thiserror::Error;

use sshpool_core::record::TextOutput;
use sshpool_core::{ChannelInfo, ErrorRecord};

#[derive(Debug, Error)]
pub enum ClientError {
    /// Daemon unreachable or the response could not be read
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The channel reported a handshake or execution failure
    #[error("{0}")]
    Remote(ErrorRecord),

    /// Any other non-2xx response
    #[error("daemon returned {code}: {body}")]
    Status { code: u16, body: String },
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Status { code, .. } if *code == StatusCode::NOT_FOUND.as_u16())
    }
}

/// Client for one daemon
pub struct PoolClient {
    base: String,
    http: reqwest::Client,
}

impl PoolClient {
    /// `base` is the daemon's base URL, e.g. `http://127.0.0.1:8877`
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Every registered channel
    pub async fn list(&self) -> Result<BTreeMap<String, ChannelInfo>, ClientError> {
        let url = self.url("/channels");
        let response = self.send(&url, self.http.get(&url)).await?;
        decode(&url, response).await
    }

    /// One channel
    pub async fn status(&self, alias: &str) -> Result<ChannelInfo, ClientError> {
        let url = self.url(&format!("/channels/{}", alias));
        let response = self.send(&url, self.http.get(&url)).await?;
        decode(&url, response).await
    }

    /// Register a descriptor and wait for its handshake
    pub async fn start(&self, dsn: &str) -> Result<(), ClientError> {
        let url = self.url("/channels");
        self.send(&url, self.http.post(&url).body(dsn.to_string()))
            .await?;
        Ok(())
    }

    /// Run a command on a channel
    pub async fn run(&self, alias: &str, command: &str) -> Result<TextOutput, ClientError> {
        let url = self.url(&format!("/channels/{}", alias));
        let response = self
            .send(&url, self.http.post(&url).body(command.to_string()))
            .await?;
        decode(&url, response).await
    }

    /// Remove a channel and close its session
    pub async fn stop(&self, alias: &str) -> Result<(), ClientError> {
        let url = self.url(&format!("/channels/{}", alias));
        self.send(&url, self.http.delete(&url)).await?;
        Ok(())
    }

    async fn send(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<Response, ClientError> {
        tracing::debug!(%url, "Sending request");
        let response = request.send().await.map_err(|source| ClientError::Request {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::BAD_GATEWAY {
            if let Ok(record) = serde_json::from_str::<ErrorRecord>(&body) {
                return Err(ClientError::Remote(record));
            }
        }
        Err(ClientError::Status {
            code: status.as_u16(),
            body,
        })
    }
}

async fn decode<T: serde::de::DeserializeOwned>(url: &str, response: Response) -> Result<T, ClientError> {
    response.json().await.map_err(|source| ClientError::Request {
        url: url.to_string(),
        source,
    })
}
