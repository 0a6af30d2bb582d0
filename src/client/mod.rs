//! # API Client Facade
//!
//! Thin typed wrappers over HTTP calls to the target services. Every call
//! returns the raw status code alongside the decoded body so tests can
//! assert on both; non-success responses map to the error taxonomy, with
//! authorization failures surfacing as [`Error::Unauthorized`] rather than
//! a status code.

mod hosts;
mod identity;
mod networks;
mod servers;
mod snapshots;
mod volumes;

pub use hosts::HostsClient;
pub use identity::IdentityClient;
pub use networks::NetworksClient;
pub use servers::{CreateServerRequest, ServersClient};
pub use snapshots::{CreateSnapshotRequest, SnapshotsClient};
pub use volumes::{CreateVolumeRequest, VolumesClient};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::{TestConfig, WireFormat};
use crate::creds::CredentialSet;
use crate::errors::{Error, Result};

/// Shared HTTP plumbing for all service clients: base URL, auth token,
/// content negotiation and status-to-error mapping.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
    wire_format: WireFormat,
}

impl RestClient {
    pub fn new(endpoint: &str, wire_format: WireFormat) -> Result<Self> {
        // A trailing slash keeps Url::join from eating the last path segment.
        let base = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{endpoint}/")
        };
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(&base)?,
            token: None,
            wire_format,
        })
    }

    /// Attach the auth token sent with every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(Error::from)
    }

    fn prepare(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut builder = builder.header(reqwest::header::ACCEPT, self.wire_format.mime());
        if let Some(token) = &self.token {
            builder = builder.header("X-Auth-Token", token);
        }
        builder
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        method: &str,
        path: &str,
    ) -> Result<(StatusCode, String)> {
        let response = self
            .prepare(builder)
            .send()
            .await
            .map_err(|e| Error::transport(e, format!("{method} {path}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(e, format!("reading {method} {path} response")))?;
        if status.is_success() {
            Ok((status, body))
        } else {
            Err(status_error(status, path, &body))
        }
    }

    fn decode<T: DeserializeOwned>(path: &str, body: &str) -> Result<T> {
        serde_json::from_str(body).map_err(|e| Error::Serialization {
            source: e,
            context: format!("decoding response body from {path}"),
        })
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<(StatusCode, T)> {
        let mut builder = self.http.get(self.url(path)?);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        let (status, body) = self.send(builder, "GET", path).await?;
        Ok((status, Self::decode(path, &body)?))
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<(StatusCode, T)> {
        let builder = self.http.post(self.url(path)?).json(body);
        let (status, text) = self.send(builder, "POST", path).await?;
        Ok((status, Self::decode(path, &text)?))
    }

    /// POST whose success response carries no decodable body (action calls)
    pub async fn post_action(&self, path: &str, body: &serde_json::Value) -> Result<StatusCode> {
        let builder = self.http.post(self.url(path)?).json(body);
        let (status, _) = self.send(builder, "POST", path).await?;
        Ok(status)
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<(StatusCode, T)> {
        let builder = self.http.put(self.url(path)?).json(body);
        let (status, text) = self.send(builder, "PUT", path).await?;
        Ok((status, Self::decode(path, &text)?))
    }

    /// PUT whose success response carries no decodable body (role grants)
    pub async fn put_action(&self, path: &str, body: &serde_json::Value) -> Result<StatusCode> {
        let builder = self.http.put(self.url(path)?).json(body);
        let (status, _) = self.send(builder, "PUT", path).await?;
        Ok(status)
    }

    pub async fn delete(&self, path: &str) -> Result<StatusCode> {
        let builder = self.http.delete(self.url(path)?);
        let (status, _) = self.send(builder, "DELETE", path).await?;
        Ok(status)
    }
}

fn status_error(status: StatusCode, path: &str, body: &str) -> Error {
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("request rejected").to_string()
    } else {
        body.trim().to_string()
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::unauthorized(message),
        StatusCode::NOT_FOUND => Error::not_found("endpoint", path),
        StatusCode::BAD_REQUEST => Error::bad_request(message),
        other => Error::http(other.as_u16(), message),
    }
}

/// All per-service clients for one credential set, sharing a single token.
#[derive(Debug, Clone)]
pub struct ClientSet {
    pub hosts: HostsClient,
    pub servers: ServersClient,
    pub networks: NetworksClient,
    pub volumes: VolumesClient,
    pub snapshots: SnapshotsClient,
}

impl ClientSet {
    /// Exchange the credential set for a token and build all service clients.
    pub async fn authenticate(config: &TestConfig, creds: &CredentialSet) -> Result<Self> {
        let identity = IdentityClient::new(&config.identity.auth_url, config.interface)?;
        let token = identity
            .issue_token(&creds.username, &creds.password, &creds.tenant_name)
            .await?;
        Self::with_token(config, &token.id)
    }

    /// Build all service clients around an already-issued token.
    pub fn with_token(config: &TestConfig, token: &str) -> Result<Self> {
        let compute = RestClient::new(&config.compute.endpoint, config.interface)?.with_token(token);
        let volume = RestClient::new(&config.volume.endpoint, config.interface)?.with_token(token);

        Ok(Self {
            hosts: HostsClient::new(compute.clone()),
            servers: ServersClient::new(
                compute.clone(),
                config.compute.wait_config("server status"),
            ),
            networks: NetworksClient::new(compute),
            volumes: VolumesClient::new(volume.clone(), config.volume.wait_config("volume status")),
            snapshots: SnapshotsClient::new(volume, config.volume.wait_config("snapshot status")),
        })
    }
}
