//! Session Manager
//!
//! Issues and verifies signed identity tokens. Sessions are stateless: the
//! 7-day window slides because every successful resolution issues a fresh
//! token, never because an existing one is extended.

use kernel::id::UserId;
use platform::token::{IssuedToken, TokenError, TokenSigner};

use crate::application::config::CommunityConfig;
use crate::error::{CommunityError, CommunityResult};

#[derive(Debug, Clone)]
pub struct SessionManager {
    signer: TokenSigner,
}

impl SessionManager {
    pub fn new(config: &CommunityConfig) -> Self {
        Self {
            signer: config.token_signer(),
        }
    }

    pub fn issue(&self, id: UserId) -> IssuedToken {
        self.signer.issue(id.as_i64())
    }

    /// Identity id bound to `token`
    ///
    /// Every verification failure collapses to `InvalidToken`.
    pub fn verify(&self, token: &str) -> CommunityResult<UserId> {
        match self.signer.verify(token) {
            Ok(claims) => Ok(UserId::from_i64(claims.subject)),
            Err(e) => {
                if e == TokenError::BadSignature {
                    tracing::warn!("Token with bad signature presented");
                } else {
                    tracing::debug!(error = %e, "Token rejected");
                }
                Err(CommunityError::InvalidToken)
            }
        }
    }
}
