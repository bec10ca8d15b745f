use crate::error::ApiError;
use crate::models::{LoginRequest, RefreshTokenRequest, TokenResponse};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// The slice of the Synkronus API the session layer needs.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<TokenResponse, ApiError>;

    async fn refresh_token(&self, request: &RefreshTokenRequest)
        -> Result<TokenResponse, ApiError>;

    /// Forget any bearer token the client holds for authenticated calls.
    fn clear_token_cache(&self);
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct HttpAuthApi {
    client: reqwest::Client,
    base_url: String,
    token_cache: Arc<RwLock<Option<String>>>,
}

impl HttpAuthApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("formulus-auth/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token_cache: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bearer token for authenticated calls made through this client: the
    /// token from the last successful login or refresh. `clear_token_cache`
    /// is its invalidation hook; the session layer calls it on login and logout.
    pub fn cached_token(&self) -> Option<String> {
        self.token_cache.read().clone()
    }

    async fn post_for_tokens<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<TokenResponse, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "posting auth request");
        let res = self.client.post(url).json(body).send().await?;
        let status = res.status();
        if !status.is_success() {
            let body: Value = res.json().await.unwrap_or_default();
            let message = body
                .get("error")
                .or_else(|| body.get("message"))
                .and_then(Value::as_str)
                .or_else(|| status.canonical_reason())
                .unwrap_or("request failed")
                .to_string();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        let tokens: TokenResponse = res.json().await?;
        *self.token_cache.write() = Some(tokens.token.clone());
        Ok(tokens)
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, request: &LoginRequest) -> Result<TokenResponse, ApiError> {
        self.post_for_tokens("/auth/login", request).await
    }

    async fn refresh_token(
        &self,
        request: &RefreshTokenRequest,
    ) -> Result<TokenResponse, ApiError> {
        self.post_for_tokens("/auth/refresh", request).await
    }

    fn clear_token_cache(&self) {
        self.token_cache.write().take();
    }
}
