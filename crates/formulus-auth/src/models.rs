use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserRole {
    #[default]
    ReadOnly,
    ReadWrite,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::ReadOnly => "read-only",
            UserRole::ReadWrite => "read-write",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "read-only" => Some(UserRole::ReadOnly),
            "read-write" => Some(UserRole::ReadWrite),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who the current session belongs to, as far as the unverified token claims
/// say. Suitable for display only; never use it to gate access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub username: String,
    pub role: UserRole,
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub refresh_token: String,
    pub expires_at: ExpiresAt,
}

/// The server has sent both epoch numbers and timestamp strings here; both are
/// stored as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpiresAt {
    Epoch(Number),
    Text(String),
}

impl fmt::Display for ExpiresAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpiresAt::Epoch(n) => write!(f, "{n}"),
            ExpiresAt::Text(s) => f.write_str(s),
        }
    }
}

/// Interpret a stored `@tokenExpiresAt` value. Numbers above 10^11 are
/// milliseconds, smaller ones seconds; anything else must be RFC 3339.
pub fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<f64>() {
        if !n.is_finite() {
            return None;
        }
        let millis = if n.abs() >= 1e11 { n } else { n * 1000.0 };
        if millis.abs() >= i64::MAX as f64 {
            return None;
        }
        return Utc.timestamp_millis_opt(millis as i64).single();
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_info_json_shape() {
        let user = UserInfo {
            username: "alice".into(),
            role: UserRole::ReadWrite,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert_eq!(json, r#"{"username":"alice","role":"read-write"}"#);
        let back: UserInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn token_response_accepts_numeric_and_text_expiry() {
        let numeric: TokenResponse = serde_json::from_str(
            r#"{"token":"t","refreshToken":"r","expiresAt":1735689600}"#,
        )
        .unwrap();
        assert_eq!(numeric.expires_at.to_string(), "1735689600");

        let text: TokenResponse = serde_json::from_str(
            r#"{"token":"t","refreshToken":"r","expiresAt":"2025-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(text.expires_at.to_string(), "2025-01-01T00:00:00Z");
    }

    #[test]
    fn token_response_keeps_fractional_and_huge_expiry() {
        let fractional: TokenResponse = serde_json::from_str(
            r#"{"token":"t","refreshToken":"r","expiresAt":1735689600.5}"#,
        )
        .unwrap();
        assert_eq!(fractional.expires_at.to_string(), "1735689600.5");

        let huge: TokenResponse = serde_json::from_str(
            r#"{"token":"t","refreshToken":"r","expiresAt":18446744073709551615}"#,
        )
        .unwrap();
        assert_eq!(huge.expires_at.to_string(), "18446744073709551615");
        assert!(parse_expiry(&huge.expires_at.to_string()).is_none());
    }

    #[test]
    fn login_request_debug_hides_password() {
        let req = LoginRequest {
            username: "bob".into(),
            password: "hunter2".into(),
        };
        let dbg = format!("{req:?}");
        assert!(dbg.contains("bob"));
        assert!(!dbg.contains("hunter2"));
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["password"], "hunter2");
    }

    #[test]
    fn expiry_parsing() {
        let secs = parse_expiry("1735689600").unwrap();
        let millis = parse_expiry("1735689600000").unwrap();
        let text = parse_expiry("2025-01-01T00:00:00Z").unwrap();
        assert_eq!(secs, text);
        assert_eq!(millis, text);
        assert_eq!(
            parse_expiry("1735689600.5").unwrap(),
            text + chrono::Duration::milliseconds(500)
        );
        assert!(parse_expiry("soon").is_none());
    }
}
