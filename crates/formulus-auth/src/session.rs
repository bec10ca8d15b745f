use crate::api_client::AuthApi;
use crate::claims::resolve_identity;
use crate::error::SessionError;
use crate::models::{LoginRequest, RefreshTokenRequest, TokenResponse, UserInfo};
use crate::storage::KeyValueStore;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

pub const TOKEN_KEY: &str = "@token";
pub const REFRESH_TOKEN_KEY: &str = "@refreshToken";
pub const TOKEN_EXPIRES_AT_KEY: &str = "@tokenExpiresAt";
pub const USER_KEY: &str = "@user";

pub const SESSION_KEYS: [&str; 4] = [TOKEN_KEY, REFRESH_TOKEN_KEY, TOKEN_EXPIRES_AT_KEY, USER_KEY];

/// In-process copy of the persisted bearer token.
///
/// Filled lazily by the first token read and emptied whenever the persisted
/// token changes (login, refresh, logout).
#[derive(Debug, Default)]
pub struct SessionCache {
    token: Mutex<Option<String>>,
}

impl SessionCache {
    pub fn token(&self) -> Option<String> {
        self.token.lock().clone()
    }

    fn fill(&self, token: &str) {
        *self.token.lock() = Some(token.to_string());
    }

    pub fn invalidate(&self) {
        self.token.lock().take();
    }
}

pub struct SessionManager<A, S> {
    api: A,
    store: S,
    cache: SessionCache,
}

impl<A: AuthApi, S: KeyValueStore> SessionManager<A, S> {
    pub fn new(api: A, store: S) -> Self {
        Self {
            api,
            store,
            cache: SessionCache::default(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    /// Authenticate against the server and persist the resulting session.
    ///
    /// The returned identity comes from unverified token claims and is only fit
    /// for display.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserInfo, SessionError> {
        info!(username, "logging in");
        self.invalidate_caches();

        let tokens = self
            .api
            .login(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.persist_tokens(&tokens).await?;

        let user = resolve_identity(&tokens.token, username);
        self.store
            .set_item(USER_KEY, &serde_json::to_string(&user)?)
            .await?;
        info!(username = %user.username, role = %user.role, "login complete");
        Ok(user)
    }

    /// The identity stored by the last login, if it is present and readable.
    pub async fn get_user_info(&self) -> Option<UserInfo> {
        let json = match self.store.get_item(USER_KEY).await {
            Ok(Some(json)) if !json.is_empty() => json,
            Ok(_) => return None,
            Err(err) => {
                warn!(error = %err, "cannot read stored user info");
                return None;
            }
        };
        match serde_json::from_str(&json) {
            Ok(user) => Some(user),
            Err(err) => {
                warn!(error = %err, "stored user info is not valid");
                None
            }
        }
    }

    /// Remove all persisted session keys. Failures are logged, never returned.
    pub async fn logout(&self) {
        if let Err(err) = self.store.multi_remove(&SESSION_KEYS).await {
            warn!(error = %err, "logout could not remove every session key");
        }
        self.invalidate_caches();
        info!("logged out");
    }

    pub async fn get_api_auth_token(&self) -> Option<String> {
        if let Some(token) = self.cache.token() {
            return Some(token);
        }
        match self.store.get_item(TOKEN_KEY).await {
            Ok(Some(token)) if !token.is_empty() => {
                debug!("token retrieved from storage");
                self.cache.fill(&token);
                Some(token)
            }
            Ok(_) => {
                warn!("no token found in storage");
                None
            }
            Err(err) => {
                error!(error = %err, "error retrieving token from storage");
                None
            }
        }
    }

    /// Exchange the stored refresh token for a new token triple.
    ///
    /// A missing refresh token is sent as an empty string; the server rejects it.
    pub async fn refresh_token(&self) -> Result<bool, SessionError> {
        let refresh_token = self
            .store
            .get_item(REFRESH_TOKEN_KEY)
            .await?
            .unwrap_or_default();
        let tokens = self
            .api
            .refresh_token(&RefreshTokenRequest { refresh_token })
            .await?;
        self.persist_tokens(&tokens).await?;
        debug!("token refreshed");
        Ok(true)
    }

    pub async fn get_token_expires_at(&self) -> Option<String> {
        match self.store.get_item(TOKEN_EXPIRES_AT_KEY).await {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(err) => {
                warn!(error = %err, "cannot read token expiry");
                None
            }
        }
    }

    async fn persist_tokens(&self, tokens: &TokenResponse) -> Result<(), SessionError> {
        // the cache must not outlive a partial write
        self.cache.invalidate();
        self.store.set_item(TOKEN_KEY, &tokens.token).await?;
        self.store
            .set_item(REFRESH_TOKEN_KEY, &tokens.refresh_token)
            .await?;
        self.store
            .set_item(TOKEN_EXPIRES_AT_KEY, &tokens.expires_at.to_string())
            .await?;
        Ok(())
    }

    fn invalidate_caches(&self) {
        self.cache.invalidate();
        self.api.clear_token_cache();
    }
}
