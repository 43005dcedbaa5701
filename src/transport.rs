//! HTTP transport for the GoAffPro API

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{map_status_to_error_code, GoaffproError, Result};

/// Default GoAffPro API URL
pub const DEFAULT_BASE_URL: &str = "https://api.goaffpro.com";

/// Header carrying the store's public token on every request
pub const PUBLIC_TOKEN_HEADER: &str = "x-goaffpro-public-token";

/// API paths
pub mod paths {
    pub const CONFIG: &str = "/v1/sdk/config.json";
    pub const TRACK_VISIT: &str = "/v1/sdk/track/visit";
    pub const TRACK_CONVERSION: &str = "/v1/sdk/track/conversion";
    pub const AFFILIATE: &str = "/v1/sdk/affiliate";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A single call against the GoAffPro API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the base URL, including any query string
    pub path: String,
    pub public_token: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>, public_token: &str) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            public_token: public_token.to_string(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, public_token: &str, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            public_token: public_token.to_string(),
            body: Some(body),
        }
    }
}

/// Sends JSON to the API and hands back the parsed JSON response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<Value>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    base_url: String,
    http: HttpClient,
}

impl HttpTransport {
    /// Create a transport against `base_url` (default: "https://api.goaffpro.com").
    pub fn new(base_url: Option<&str>) -> Result<Self> {
        let base_url = base_url
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        let http = HttpClient::builder()
            .user_agent(concat!("goaffpro-sdk-rust/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GoaffproError::network(e.to_string()))?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn handle_response(&self, response: reqwest::Response) -> Result<Value> {
        let status = response.status().as_u16();

        if !response.status().is_success() {
            #[derive(Deserialize)]
            struct ErrorResponse {
                error: Option<String>,
                message: Option<String>,
            }

            let error_body: ErrorResponse = response.json().await.unwrap_or(ErrorResponse {
                error: None,
                message: None,
            });

            let message = error_body
                .error
                .or(error_body.message)
                .unwrap_or_else(|| format!("Request failed: {}", status));

            return Err(GoaffproError::with_status(
                map_status_to_error_code(status),
                message,
                status,
            ));
        }

        response
            .json()
            .await
            .map_err(|e| GoaffproError::network(e.to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        let url = format!("{}{}", self.base_url, request.path);

        let builder = match request.method {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url),
        };

        let builder = builder.header(PUBLIC_TOKEN_HEADER, &request.public_token);
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder.header(reqwest::header::CONTENT_TYPE, "application/json"),
        };

        tracing::debug!(method = ?request.method, path = %request.path, "Sending GoAffPro request");

        let response = builder
            .send()
            .await
            .map_err(|e| GoaffproError::network(e.to_string()))?;

        self.handle_response(response).await
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .finish()
    }
}
