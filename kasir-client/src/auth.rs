//! Current-user identity
//!
//! The backend issues a JWT whose `sub` claim is the numeric user id. The
//! client only needs that id for `created_by`, so the payload is decoded
//! without verifying the signature; verification is the backend's job.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

/// Source of the logged-in user's id
pub trait Identity: Send + Sync {
    fn current_user_id(&self) -> Option<u64>;
}

/// Identity read from a bearer token
#[derive(Debug, Clone, Default)]
pub struct TokenIdentity {
    token: Option<String>,
}

impl TokenIdentity {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }
}

impl Identity for TokenIdentity {
    fn current_user_id(&self) -> Option<u64> {
        let token = self.token.as_deref()?;
        let id = parse_jwt_subject(token);
        if id.is_none() {
            tracing::warn!("Bearer token has no numeric subject");
        }
        id
    }
}

/// Fixed identity, for callers that resolve the user elsewhere
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticIdentity(pub Option<u64>);

impl Identity for StaticIdentity {
    fn current_user_id(&self) -> Option<u64> {
        self.0
    }
}

/// Extract the numeric `sub` claim of a JWT.
///
/// `sub` may be a JSON string (`"12"`) or number (`12`).
pub fn parse_jwt_subject(token: &str) -> Option<u64> {
    // header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    // Tolerate padded payloads
    let payload_bytes = URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .ok()?;
    let payload: serde_json::Value = serde_json::from_slice(&payload_bytes).ok()?;

    match payload.get("sub")? {
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) fn make_token(payload: &str) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_subject() {
        let token = make_token(r#"{"sub":"12","username":"kasir1","role":"cashier"}"#);
        assert_eq!(parse_jwt_subject(&token), Some(12));
    }

    #[test]
    fn test_numeric_subject() {
        let token = make_token(r#"{"sub":7}"#);
        assert_eq!(parse_jwt_subject(&token), Some(7));
    }

    #[test]
    fn test_invalid_tokens() {
        assert_eq!(parse_jwt_subject("not-a-jwt"), None);
        assert_eq!(parse_jwt_subject("a.!!!.c"), None);
        assert_eq!(parse_jwt_subject(&make_token(r#"{"username":"x"}"#)), None);
        assert_eq!(parse_jwt_subject(&make_token(r#"{"sub":"admin"}"#)), None);
    }

    #[test]
    fn test_token_identity() {
        let mut identity = TokenIdentity::new(None);
        assert_eq!(identity.current_user_id(), None);

        identity.set_token(Some(make_token(r#"{"sub":"5"}"#)));
        assert_eq!(identity.current_user_id(), Some(5));
        assert_eq!(StaticIdentity(Some(9)).current_user_id(), Some(9));
    }
}
