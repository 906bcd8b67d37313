//! Test service REST client

use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use rflocal_common::{
    Environment, EnvironmentClient, EnvironmentParams, Error, Result, RunClient, RunParams,
    RunStatus,
};

pub const DEFAULT_API_URL: &str = "https://app.rainforestqa.com/api/1/";

/// Header carrying the API token
const TOKEN_HEADER: &str = "CLIENT_TOKEN";

/// Transport-level failures, mapped onto the operation that hit them
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct DefaultParams {
    default: bool,
}

/// Client for the test service API
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: HttpClient,
    base_url: Url,
    token: String,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str, token: &str) -> anyhow::Result<Self> {
        // Url::join drops the last segment unless the base ends in a slash
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&base_url)
            .map_err(|e| anyhow::anyhow!("invalid API URL {}: {}", base_url, e))?;

        let http_client = HttpClient::builder()
            .user_agent(concat!("rflocal/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            token: token.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> std::result::Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", path, e)))
    }

    async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> std::result::Result<T, ApiError> {
        let text = self.send(method, path, body).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Send a request and return the raw body of a successful response
    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> std::result::Result<String, ApiError> {
        let url = self.endpoint(path)?;
        debug!("{} {}", method, url);

        let mut request = self
            .http_client
            .request(method, url)
            .header(TOKEN_HEADER, &self.token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            Ok(text)
        } else {
            Err(ApiError::Status { status, body: text })
        }
    }
}

#[async_trait]
impl EnvironmentClient for ApiClient {
    async fn create_temporary_environment(&self, url: &str) -> Result<Environment> {
        let body = EnvironmentParams::temporary(url);
        self.request(Method::POST, "environments", Some(&body))
            .await
            .map_err(|e| Error::environment("create", e))
    }

    async fn is_environment_default(&self, id: i64) -> Result<bool> {
        let environment: Environment = self
            .request(Method::GET, &format!("environments/{}", id), None::<&()>)
            .await
            .map_err(|e| Error::environment(format!("query {}", id), e))?;
        Ok(environment.default)
    }

    async fn set_environment_default(&self, id: i64, default: bool) -> Result<()> {
        self.send(
            Method::PUT,
            &format!("environments/{}", id),
            Some(&DefaultParams { default }),
        )
        .await
        .map(|_| ())
        .map_err(|e| Error::environment(format!("update {}", id), e))
    }

    async fn delete_environment(&self, id: i64) -> Result<()> {
        self.send(Method::DELETE, &format!("environments/{}", id), None::<&()>)
            .await
            .map(|_| ())
            .map_err(|e| Error::environment(format!("delete {}", id), e))
    }
}

#[async_trait]
impl RunClient for ApiClient {
    async fn create_run(&self, params: &RunParams) -> Result<RunStatus> {
        self.request(Method::POST, "runs", Some(params))
            .await
            .map_err(|e| Error::run("create", e))
    }

    async fn run_status(&self, id: i64) -> Result<RunStatus> {
        self.request(Method::GET, &format!("runs/{}", id), None::<&()>)
            .await
            .map_err(|e| Error::run(format!("status {}", id), e))
    }
}
