//! Unverified token claims.
//!
//! The payload segment of a JWT is decoded without checking the signature.
//! Nothing here is a trust boundary: the result only labels the UI with a
//! username and role, and the server enforces access on every request.

use crate::models::{UserInfo, UserRole};
use base64::{engine::general_purpose, Engine as _};
use serde_json::{Map, Value};

/// Payload fields of a token whose signature has not been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct UnverifiedClaims(Map<String, Value>);

impl UnverifiedClaims {
    pub fn username(&self) -> Option<&str> {
        self.str_claim("username")
    }

    pub fn role(&self) -> Option<UserRole> {
        self.str_claim("role").and_then(UserRole::parse)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    fn str_claim(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Decode the middle segment of `header.payload.signature`.
///
/// Returns `None` for a wrong segment count, bad base64 or a payload that is
/// not a JSON object. Both the URL-safe and standard alphabets are accepted,
/// with or without padding.
pub fn decode_unverified_claims(token: &str) -> Option<UnverifiedClaims> {
    let mut parts = token.split('.');
    let (Some(_), Some(payload), Some(_), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };
    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();
    let bytes = general_purpose::URL_SAFE_NO_PAD.decode(normalized).ok()?;
    match serde_json::from_slice(&bytes).ok()? {
        Value::Object(map) => Some(UnverifiedClaims(map)),
        _ => None,
    }
}

/// Identity to show for `token`, falling back to the name the user typed and
/// the least privileged role.
pub fn resolve_identity(token: &str, fallback_username: &str) -> UserInfo {
    let claims = decode_unverified_claims(token);
    UserInfo {
        username: claims
            .as_ref()
            .and_then(UnverifiedClaims::username)
            .unwrap_or(fallback_username)
            .to_string(),
        role: claims
            .as_ref()
            .and_then(UnverifiedClaims::role)
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with(payload: &str) -> String {
        let header = general_purpose::URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let body = general_purpose::URL_SAFE_NO_PAD.encode(payload);
        format!("{header}.{body}.c2lnbmF0dXJl")
    }

    #[test]
    fn resolves_claims_from_payload() {
        let token = token_with(r#"{"username":"alice","role":"admin"}"#);
        let user = resolve_identity(&token, "typed-name");
        assert_eq!(user.username, "alice");
        assert_eq!(user.role, UserRole::Admin);
    }

    #[test]
    fn wrong_segment_count_falls_back() {
        for token in ["only.two", "a.b.c.d", "", "nodots"] {
            assert!(decode_unverified_claims(token).is_none(), "{token}");
            let user = resolve_identity(token, "bob");
            assert_eq!(user.username, "bob");
            assert_eq!(user.role, UserRole::ReadOnly);
        }
    }

    #[test]
    fn bad_encoding_or_json_falls_back() {
        assert!(decode_unverified_claims("h.!!!notbase64!!!.s").is_none());
        let not_json = general_purpose::URL_SAFE_NO_PAD.encode("not json");
        assert!(decode_unverified_claims(&format!("h.{not_json}.s")).is_none());
        let array = general_purpose::URL_SAFE_NO_PAD.encode("[1,2]");
        assert!(decode_unverified_claims(&format!("h.{array}.s")).is_none());
    }

    #[test]
    fn missing_or_unknown_claims_fall_back_per_field() {
        let token = token_with(r#"{"username":"carol"}"#);
        assert_eq!(
            resolve_identity(&token, "x"),
            UserInfo {
                username: "carol".into(),
                role: UserRole::ReadOnly
            }
        );

        let token = token_with(r#"{"role":"read-write","sub":"42"}"#);
        assert_eq!(
            resolve_identity(&token, "dave"),
            UserInfo {
                username: "dave".into(),
                role: UserRole::ReadWrite
            }
        );

        let token = token_with(r#"{"username":"","role":"superuser"}"#);
        assert_eq!(
            resolve_identity(&token, "erin"),
            UserInfo {
                username: "erin".into(),
                role: UserRole::ReadOnly
            }
        );
    }

    #[test]
    fn padded_standard_alphabet_is_accepted() {
        let payload = general_purpose::STANDARD.encode(r#"{"username":"?>?","role":"admin"}"#);
        let claims = decode_unverified_claims(&format!("h.{payload}.s")).unwrap();
        assert_eq!(claims.username(), Some("?>?"));
        assert_eq!(claims.get("role"), Some(&Value::String("admin".into())));
    }
}
