//! Advisory decoding of session tokens.
//!
//! The backend issues JWTs whose payload carries the user's role. The client
//! reads that payload **without verifying the signature** to decide which
//! screens to offer first. Nothing here is a security boundary: the backend
//! re-checks every request and answers 401/403 when the role is insufficient.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::role::UserRole;

/// Payload keys that may carry the role, in lookup order.
const ROLE_KEYS: &[&str] = &["tipo", "role"];

/// Payload keys that may carry the user id, in lookup order.
const SUBJECT_KEYS: &[&str] = &["id", "usuarioId", "sub"];

/// Role information read from an unverified token payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleClaim {
    /// Role claimed by the token.
    pub role: UserRole,
    /// User id, when the payload names one.
    pub subject: Option<String>,
    /// Expiry (`exp`), when present.
    pub expires_at: Option<DateTime<Utc>>,
}

impl RoleClaim {
    /// Whether the token claims the admin role.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Whether the token's `exp` lies at or before `now`.
    ///
    /// Tokens without `exp` never expire client-side.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

/// Decode the role claim from a JWT-shaped token.
///
/// Returns `None` for anything malformed: wrong segment count, invalid
/// base64url, a payload that is not a JSON object, or no string role field.
/// Never panics.
#[must_use]
pub fn decode_role_claim(token: &str) -> Option<RoleClaim> {
    let mut segments = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return None;
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: Map<String, Value> = serde_json::from_slice(&bytes).ok()?;

    let role = first_string(&claims, ROLE_KEYS)?;
    let subject = first_string(&claims, SUBJECT_KEYS).map(str::to_owned);
    let expires_at = claims
        .get("exp")
        .and_then(Value::as_i64)
        .and_then(|secs| DateTime::from_timestamp(secs, 0));

    Some(RoleClaim {
        role: UserRole::from(role),
        subject,
        expires_at,
    })
}

fn first_string<'a>(claims: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| claims.get(*key).and_then(Value::as_str))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn token_with(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_decodes_admin_role() {
        let claim = decode_role_claim(&token_with(r#"{"id":"u1","tipo":"admin","exp":4102444800}"#))
            .unwrap();
        assert!(claim.is_admin());
        assert_eq!(claim.subject.as_deref(), Some("u1"));
        assert!(!claim.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_falls_back_to_role_key() {
        let claim = decode_role_claim(&token_with(r#"{"sub":"u2","role":"cliente"}"#)).unwrap();
        assert_eq!(claim.role, UserRole::from("cliente"));
        assert_eq!(claim.subject.as_deref(), Some("u2"));
        assert_eq!(claim.expires_at, None);
    }

    #[test]
    fn test_tolerates_padding() {
        let padded = base64::engine::general_purpose::URL_SAFE.encode(r#"{"tipo":"admin"}"#);
        let token = format!("h.{padded}.s");
        assert!(decode_role_claim(&token).unwrap().is_admin());
    }

    #[test]
    fn test_expired_claim() {
        let claim = decode_role_claim(&token_with(r#"{"tipo":"admin","exp":1}"#)).unwrap();
        assert!(claim.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_malformed_tokens_yield_none() {
        assert_eq!(decode_role_claim(""), None);
        assert_eq!(decode_role_claim("not-a-token"), None);
        assert_eq!(decode_role_claim("a.b"), None);
        assert_eq!(decode_role_claim("a.b.c.d"), None);
        assert_eq!(decode_role_claim("h.!!!.s"), None);
        assert_eq!(decode_role_claim(&token_with("[1,2,3]")), None);
        assert_eq!(decode_role_claim(&token_with("not json")), None);
        assert_eq!(decode_role_claim(&token_with(r#"{"id":"u1"}"#)), None);
        assert_eq!(decode_role_claim(&token_with(r#"{"tipo":42}"#)), None);
    }
}
