//! REST transport for the Spectrum Virtualize management API.
//!
//! Every CLI command is exposed as `POST /rest/<verb>[/<object>]` with the
//! command options as a JSON body. Requests carry an `X-Auth-Token`
//! obtained once from `POST /rest/auth`. Path segments are percent-encoded,
//! so an object name can never change the endpoint being called.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::attributes::{self, Attributes};
use crate::command::SvcCommand;
use crate::config::ClusterConfig;
use crate::error::{SvcError, SvcResult};
use crate::transport::SvcTransport;

/// Header carrying the login user on `/rest/auth`.
pub const AUTH_USERNAME_HEADER: &str = "X-Auth-Username";

/// Header carrying the login password on `/rest/auth`.
pub const AUTH_PASSWORD_HEADER: &str = "X-Auth-Password";

/// Header carrying the session token on command requests.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
}

/// HTTPS transport built on `reqwest`.
pub struct RestTransport {
    client: Client,
    base_url: Url,
    username: Option<String>,
    password: Option<String>,
    token: Mutex<Option<String>>,
}

impl RestTransport {
    /// Creates a transport for the cluster's REST endpoint.
    pub fn new(cluster: &ClusterConfig) -> SvcResult<Self> {
        Self::with_base_url(cluster, cluster.rest_url())
    }

    /// Creates a transport against an explicit API root.
    pub fn with_base_url(cluster: &ClusterConfig, base_url: impl Into<String>) -> SvcResult<Self> {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base_url = Url::parse(&base_url)
            .map_err(|e| SvcError::config(format!("Invalid REST URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SvcError::config(format!("Invalid REST URL {}", base_url)));
        }

        let client = Client::builder()
            .danger_accept_invalid_certs(!cluster.validate_certs)
            .timeout(cluster.timeout())
            .build()
            .map_err(|e| SvcError::config(format!("Failed to create HTTP client: {}", e)))?;

        let token = cluster.token.clone().filter(|t| !t.is_empty());

        Ok(Self {
            client,
            base_url,
            username: cluster.username.clone(),
            password: cluster.password.clone(),
            token: Mutex::new(token),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Appends `segments` to the API root, encoding each one.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        // Checked in the constructor
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Returns the session token, authenticating on first use.
    async fn token(&self) -> SvcResult<String> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }
        let token = self.authenticate().await?;
        *guard = Some(token.clone());
        Ok(token)
    }

    #[instrument(skip(self), fields(url = %self.base_url))]
    async fn authenticate(&self) -> SvcResult<String> {
        let url = self.endpoint(["auth"]);
        let (username, password) = match (&self.username, &self.password) {
            (Some(u), Some(p)) => (u, p),
            _ => {
                return Err(SvcError::transport(
                    url.as_str(),
                    "no token configured and no credentials to obtain one",
                ))
            }
        };

        let response = self
            .client
            .post(url.clone())
            .header(AUTH_USERNAME_HEADER, username)
            .header(AUTH_PASSWORD_HEADER, password)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| {
                SvcError::transport(url.as_str(), format!("authentication request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SvcError::transport(
                url.as_str(),
                format!("authentication failed with status {}", status),
            ));
        }

        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| SvcError::transport(url.as_str(), format!("invalid auth response: {}", e)))?;

        info!(user = %username, "Authenticated to REST API");
        Ok(auth.token)
    }

    /// Posts a command to `url` and returns the status and raw body.
    async fn post(&self, url: &Url, cmd: &SvcCommand) -> SvcResult<(StatusCode, String)> {
        let token = self.token().await?;

        debug!(url = %url, verb = %cmd.verb(), "Posting REST command");

        let response = self
            .client
            .post(url.clone())
            .header(AUTH_TOKEN_HEADER, token)
            .json(&cmd.rest_body())
            .send()
            .await
            .map_err(|e| SvcError::transport(url.as_str(), format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            SvcError::transport(url.as_str(), format!("failed to read response: {}", e))
        })?;

        Ok((status, body))
    }
}

#[async_trait]
impl SvcTransport for RestTransport {
    async fn obj_info(&self, cmd: &SvcCommand) -> SvcResult<Option<Attributes>> {
        let url = self.endpoint(cmd.rest_segments());
        let (status, body) = self.post(&url, cmd).await?;

        // The REST API answers a lookup of a missing object with 500
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            debug!(verb = %cmd.verb(), "Object does not exist");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SvcError::transport(
                url.as_str(),
                format!("status {}: {}", status, body.trim()),
            ));
        }
        if body.trim().is_empty() {
            return Ok(None);
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| {
            SvcError::transport(
                url.as_str(),
                format!("invalid JSON in response: {}", e),
            )
        })?;
        Ok(attributes::from_json(&value))
    }

    async fn run_command(&self, cmd: &SvcCommand) -> SvcResult<()> {
        let url = self.endpoint(cmd.rest_segments());
        let (status, body) = self.post(&url, cmd).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(SvcError::operation(
                cmd.to_cli(),
                format!("status {}: {}", status, body.trim()),
            ))
        }
    }
}
