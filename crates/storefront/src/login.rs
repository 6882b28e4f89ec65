//! Login and logout.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use thiserror::Error;
use tracing::{info, instrument, warn};

use floricultura_core::RoleClaim;

use crate::api::{Credentials, StoreApi};
use crate::error::StoreError;
use crate::session::{Session, SessionError};

const UNKNOWN_ERROR: &str = "Erro Desconhecido.";

/// First screen to offer after login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    /// Token claims the admin role.
    Admin,
    Storefront,
}

impl Landing {
    /// Pick the landing for a decoded claim.
    ///
    /// Missing, non-admin or expired claims land on the storefront. This only
    /// chooses what to show; the backend still checks every admin request.
    #[must_use]
    pub fn for_claim(claim: Option<&RoleClaim>, now: DateTime<Utc>) -> Self {
        match claim {
            Some(c) if c.is_admin() && !c.is_expired_at(now) => Self::Admin,
            _ => Self::Storefront,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoginError {
    /// The backend refused the credentials or never answered.
    #[error("login failed: {0}")]
    Rejected(#[source] StoreError),

    /// The token was issued but could not be saved.
    #[error("could not save session: {0}")]
    Session(#[from] SessionError),
}

impl LoginError {
    /// Text to show on the login screen.
    ///
    /// The backend's `mensagem` wins, then the transport error, then the
    /// failed status. An unreadable response gets a generic text.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Rejected(e) => match (e.backend_message(), e) {
                (Some(msg), _) => msg.to_owned(),
                (None, StoreError::Transport(raw)) => raw.clone(),
                (None, StoreError::Decode(_)) => UNKNOWN_ERROR.to_owned(),
                (None, other) => other.to_string(),
            },
            Self::Session(e) => e.to_string(),
        }
    }
}

/// Exchange credentials for a token, keep it in `session`, and choose where
/// to land.
///
/// # Errors
///
/// Returns `LoginError::Rejected` when the backend refuses, and
/// `LoginError::Session` when the token cannot be persisted. The session is
/// left untouched in both cases.
#[instrument(skip(api, session, password))]
pub async fn login<A: StoreApi>(
    api: &A,
    session: &Session,
    email: &str,
    password: SecretString,
) -> Result<Landing, LoginError> {
    let credentials = Credentials::new(email.trim(), password);
    let token = api.login(&credentials).await.map_err(|e| {
        warn!(error = %e, "Login rejected");
        LoginError::Rejected(e)
    })?;

    session.set_token(token).await?;

    let landing = Landing::for_claim(session.role_claim().await.as_ref(), Utc::now());
    info!(?landing, "Logged in");
    Ok(landing)
}

/// Forget the stored token.
///
/// # Errors
///
/// Returns `SessionError` if the stored token cannot be removed.
#[instrument(skip(session))]
pub async fn logout(session: &Session) -> Result<(), SessionError> {
    session.clear().await?;
    info!("Logged out");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::Duration;

    use floricultura_core::UserRole;

    use super::*;
    use crate::testing::{FakeStore, Failure};

    fn token(payload: &str) -> String {
        format!("h.{}.s", URL_SAFE_NO_PAD.encode(payload))
    }

    #[tokio::test]
    async fn test_admin_login_lands_on_admin() {
        let store = FakeStore::default();
        store.set_login_token(&token(r#"{"tipo":"admin","id":"u1"}"#));
        let session = Session::in_memory();

        let landing = login(&store, &session, " ana@flora.test ", SecretString::from("x"))
            .await
            .unwrap();

        assert_eq!(landing, Landing::Admin);
        assert!(session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_customer_login_lands_on_storefront() {
        let store = FakeStore::default();
        store.set_login_token(&token(r#"{"tipo":"cliente"}"#));
        let session = Session::in_memory();

        let landing = login(&store, &session, "bia@flora.test", SecretString::from("x"))
            .await
            .unwrap();
        assert_eq!(landing, Landing::Storefront);
    }

    #[tokio::test]
    async fn test_rejected_login_keeps_session_empty() {
        let store = FakeStore::default();
        store.fail_next("login", Failure::Unauthorized(Some("Email ou senha inválidos")));
        let session = Session::in_memory();

        let err = login(&store, &session, "x@y", SecretString::from("bad"))
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Email ou senha inválidos");
        assert!(!session.is_authenticated().await);
    }

    #[test]
    fn test_message_fallbacks() {
        let transport = LoginError::Rejected(StoreError::Transport("timed out".into()));
        assert_eq!(transport.message(), "timed out");

        let bare = LoginError::Rejected(StoreError::Unauthorized { message: None });
        assert_eq!(bare.message(), "unauthorized: no message");

        let status_only = LoginError::Rejected(StoreError::Backend {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            message: None,
        });
        assert!(status_only.message().contains("500"));

        let garbled = LoginError::Rejected(StoreError::Decode("expected value".into()));
        assert_eq!(garbled.message(), UNKNOWN_ERROR);
    }

    #[test]
    fn test_expired_admin_claim_lands_on_storefront() {
        let now = Utc::now();
        let claim = RoleClaim {
            role: UserRole::Admin,
            subject: None,
            expires_at: Some(now - Duration::minutes(1)),
        };
        assert_eq!(Landing::for_claim(Some(&claim), now), Landing::Storefront);
        assert_eq!(Landing::for_claim(None, now), Landing::Storefront);
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let session = Session::in_memory();
        session.set_token(SecretString::from("t")).await.unwrap();
        logout(&session).await.unwrap();
        assert!(!session.is_authenticated().await);
    }
}
