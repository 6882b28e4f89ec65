//! `login`, `logout` and `whoami`.

use secrecy::SecretString;
use thiserror::Error;

use floricultura_admin::AdminGate;
use floricultura_storefront::{Landing, LoginError, SessionError};

use super::Context;
use crate::terminal;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Login(String),

    #[error("no password given")]
    MissingPassword,

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<LoginError> for AuthError {
    fn from(e: LoginError) -> Self {
        Self::Login(e.message())
    }
}

/// Log in; the password is read from stdin when not given.
///
/// # Errors
///
/// Returns `AuthError::Login` with the text to show when the backend refuses.
pub async fn login(ctx: &Context, email: &str, password: Option<String>) -> Result<(), AuthError> {
    let password = password
        .or_else(|| terminal::prompt("Senha"))
        .filter(|p| !p.is_empty())
        .ok_or(AuthError::MissingPassword)?;

    let landing =
        floricultura_storefront::login(&ctx.store, &ctx.session, email, SecretString::from(password))
            .await?;

    match landing {
        Landing::Admin => println!("Bem-vindo! Console de administração disponível (flora admin)."),
        Landing::Storefront => println!("Bem-vindo à Floricultura!"),
    }
    Ok(())
}

/// Forget the stored token.
///
/// # Errors
///
/// Returns `AuthError::Session` if the session file cannot be updated.
pub async fn logout(ctx: &Context) -> Result<(), AuthError> {
    floricultura_storefront::logout(&ctx.session).await?;
    println!("Sessão encerrada.");
    Ok(())
}

/// Print what the token claims. Advisory only.
pub async fn whoami(ctx: &Context) {
    let gate = AdminGate::new(ctx.session.clone());
    match gate.claim().await {
        Some(claim) => {
            println!("papel: {}", claim.role);
            if let Some(subject) = &claim.subject {
                println!("usuário: {subject}");
            }
            if let Some(exp) = claim.expires_at {
                println!("expira: {}", exp.to_rfc3339());
            }
            println!(
                "console admin: {}",
                if gate.allows_admin().await { "sim" } else { "não" }
            );
        }
        None if ctx.session.is_authenticated().await => {
            println!("Sessão ativa, mas o token não informa o papel.");
        }
        None => println!("Nenhuma sessão. Use `flora login`."),
    }
}
