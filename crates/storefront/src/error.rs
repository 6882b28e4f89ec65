//! Errors raised by the remote store client.
//!
//! Three failure classes reach the user:
//! - the server never answered (transport),
//! - the server answered with an error payload (backend, possibly carrying a
//!   `mensagem` to show verbatim),
//! - the server refused the credential (401/403).
//!
//! Callers catch every error at the operation boundary, log it, and turn it
//! into a notice with [`StoreError::user_message`].

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No response: connection refused, timeout, truncated body.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success status with an optional backend message.
    #[error("backend error (HTTP {status}): {}", .message.as_deref().unwrap_or("no message"))]
    Backend {
        /// HTTP status returned.
        status: StatusCode,
        /// `mensagem` field of the error body, when present.
        message: Option<String>,
    },

    /// 401: missing or rejected credential.
    #[error("unauthorized: {}", .message.as_deref().unwrap_or("no message"))]
    Unauthorized {
        /// `mensagem` field of the error body, when present.
        message: Option<String>,
    },

    /// 403: credential valid but role insufficient.
    #[error("forbidden: {}", .message.as_deref().unwrap_or("no message"))]
    Forbidden {
        /// `mensagem` field of the error body, when present.
        message: Option<String>,
    },

    /// Response body did not have the expected shape.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// An admin-only request was attempted without a session token.
    #[error("no session token; log in first")]
    NotAuthenticated,
}

/// Error body the backend sends alongside failure statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message, in Portuguese.
    #[serde(default)]
    pub mensagem: Option<String>,
}

impl StoreError {
    /// Build the error for a non-success response from its status and body.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.mensagem)
            .filter(|m| !m.trim().is_empty());

        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized { message },
            StatusCode::FORBIDDEN => Self::Forbidden { message },
            _ => Self::Backend { status, message },
        }
    }

    /// The backend's own message, if it sent one.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Backend { message, .. }
            | Self::Unauthorized { message }
            | Self::Forbidden { message } => message.as_deref(),
            _ => None,
        }
    }

    /// Whether the backend refused the credential.
    #[must_use]
    pub const fn is_access_denied(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. } | Self::Forbidden { .. } | Self::NotAuthenticated
        )
    }

    /// Whether the server never answered.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Text to show the user.
    ///
    /// Transport failures always read "server did not respond"; otherwise the
    /// backend message wins and `fallback` covers the rest.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Transport(raw) => format!("Servidor não respondeu. Erro: {raw}"),
            other => other
                .backend_message()
                .map_or_else(|| fallback.to_owned(), str::to_owned),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message_extracted() {
        let err = StoreError::from_response(
            StatusCode::BAD_REQUEST,
            r#"{"mensagem":"Produto não encontrado"}"#,
        );
        assert_eq!(err.backend_message(), Some("Produto não encontrado"));
        assert_eq!(err.user_message("Veja o console"), "Produto não encontrado");
    }

    #[test]
    fn test_fallback_when_body_has_no_message() {
        let err = StoreError::from_response(StatusCode::INTERNAL_SERVER_ERROR, "oops");
        assert!(matches!(err, StoreError::Backend { message: None, .. }));
        assert_eq!(err.user_message("Veja o console"), "Veja o console");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            StoreError::from_response(StatusCode::FORBIDDEN, "{}"),
            StoreError::Forbidden { message: None }
        ));
        assert!(matches!(
            StoreError::from_response(StatusCode::UNAUTHORIZED, r#"{"mensagem":"Token inválido"}"#),
            StoreError::Unauthorized { message: Some(_) }
        ));
        assert!(StoreError::NotAuthenticated.is_access_denied());
    }

    #[test]
    fn test_transport_message() {
        let err = StoreError::Transport("connection refused".to_string());
        assert!(err.is_transport());
        assert_eq!(
            err.user_message("ignored"),
            "Servidor não respondeu. Erro: connection refused"
        );
    }

    #[test]
    fn test_display() {
        let err = StoreError::Backend {
            status: StatusCode::BAD_REQUEST,
            message: Some("quantidade inválida".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "backend error (HTTP 400 Bad Request): quantidade inválida"
        );
    }
}
