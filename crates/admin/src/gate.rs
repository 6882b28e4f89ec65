//! Advisory role gate for the admin console.
//!
//! Reads the role from the session token to decide whether to offer the
//! console at all. The backend is the authority: a token that passes here can
//! still be refused with 401/403, and the console reports that as access
//! denied.

use chrono::Utc;
use tracing::debug;

use floricultura_core::RoleClaim;
use floricultura_storefront::{Landing, Session};

/// Decides whether the admin console should be offered.
#[derive(Debug, Clone)]
pub struct AdminGate {
    session: Session,
}

impl AdminGate {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// Where the current session should land.
    pub async fn landing(&self) -> Landing {
        let claim = self.session.role_claim().await;
        let landing = Landing::for_claim(claim.as_ref(), Utc::now());
        debug!(?landing, has_claim = claim.is_some(), "Admin gate evaluated");
        landing
    }

    /// Whether to offer the admin console.
    pub async fn allows_admin(&self) -> bool {
        self.landing().await == Landing::Admin
    }

    /// The decoded claim, for display (`whoami`).
    pub async fn claim(&self) -> Option<RoleClaim> {
        self.session.role_claim().await
    }
}
