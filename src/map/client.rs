//! HTTP client for the homemap API
//!
//! The map controller only needs the two home location calls, expressed as
//! [`ProfileClient`]. [`HttpApiClient`] implements them against a running
//! server and also covers register and login, which supply its token.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::{HomeLocation, LatLng};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success status; `msg` is the server's message or raw body
    #[error("Server returned HTTP {status}: {msg}")]
    Api { status: u16, msg: String },

    #[error("Not logged in")]
    NotAuthenticated,
}

/// Home location calls the map controller depends on
#[async_trait]
pub trait ProfileClient: Send + Sync {
    async fn get_home_location(&self) -> Result<Option<HomeLocation>, ClientError>;

    async fn set_home_location(&self, at: LatLng) -> Result<HomeLocation, ClientError>;
}

#[derive(Serialize)]
struct CredentialsBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenBody {
    token: String,
}

#[derive(Deserialize)]
struct MessageBody {
    msg: String,
}

#[derive(Deserialize)]
struct HomeLocationBody {
    #[serde(rename = "homeLocation")]
    home_location: Option<HomeLocation>,
}

/// reqwest-backed API client holding the current bearer token
pub struct HttpApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpApiClient {
    /// `base_url` is the server root, e.g. `http://localhost:3000`
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("homemap/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Register and keep the returned token
    pub async fn register(&mut self, username: &str, password: &str) -> Result<(), ClientError> {
        let token = self.credentials_call("register", username, password).await?;
        self.token = Some(token);
        Ok(())
    }

    /// Log in and keep the returned token
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), ClientError> {
        let token = self.credentials_call("login", username, password).await?;
        self.token = Some(token);
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    fn bearer(&self) -> Result<&str, ClientError> {
        self.token.as_deref().ok_or(ClientError::NotAuthenticated)
    }

    async fn credentials_call(
        &self,
        path: &str,
        username: &str,
        password: &str,
    ) -> Result<String, ClientError> {
        let response = self
            .client
            .post(self.url(path))
            .json(&CredentialsBody { username, password })
            .send()
            .await?;
        let body: TokenBody = check(response).await?.json().await?;
        Ok(body.token)
    }
}

/// Turn a non-success response into [`ClientError::Api`]
async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let msg = serde_json::from_str::<MessageBody>(&text)
        .map(|body| body.msg)
        .unwrap_or(text);
    Err(ClientError::Api {
        status: status.as_u16(),
        msg,
    })
}

#[async_trait]
impl ProfileClient for HttpApiClient {
    async fn get_home_location(&self) -> Result<Option<HomeLocation>, ClientError> {
        let response = self
            .client
            .get(self.url("homeLocation"))
            .bearer_auth(self.bearer()?)
            .send()
            .await?;
        let body: HomeLocationBody = check(response).await?.json().await?;
        Ok(body.home_location)
    }

    async fn set_home_location(&self, at: LatLng) -> Result<HomeLocation, ClientError> {
        let response = self
            .client
            .put(self.url("homeLocation"))
            .bearer_auth(self.bearer()?)
            .json(&at)
            .send()
            .await?;
        let body: HomeLocationBody = check(response).await?.json().await?;
        body.home_location.ok_or_else(|| ClientError::Api {
            status: 200,
            msg: "Response did not include homeLocation".to_string(),
        })
    }
}
