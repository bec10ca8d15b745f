//! Client-side session handling for the Synkronus API.
//!
//! [`session::SessionManager`] wraps an [`api_client::AuthApi`] and a
//! [`storage::KeyValueStore`]: it logs in, refreshes and logs out, persisting the
//! token triple and a cached [`models::UserInfo`] between runs.

pub mod api_client;
pub mod claims;
pub mod error;
pub mod models;
pub mod paths;
pub mod secure_storage;
pub mod session;
pub mod storage;

pub use api_client::{ApiConfig, AuthApi, HttpAuthApi};
pub use error::{ApiError, SessionError, StorageError};
pub use models::{ExpiresAt, LoginRequest, RefreshTokenRequest, TokenResponse, UserInfo, UserRole};
pub use secure_storage::KeyringStore;
pub use session::{SessionCache, SessionManager};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
