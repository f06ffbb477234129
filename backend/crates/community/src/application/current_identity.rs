//! Current Identity Use Case
//!
//! Maps the presented token to an identity and renews the session.

use std::sync::Arc;

use platform::token::IssuedToken;

use crate::application::config::CommunityConfig;
use crate::application::session::SessionManager;
use crate::domain::entity::Identity;
use crate::domain::repository::IdentityRepository;
use crate::error::CommunityResult;

/// Outcome of resolving the request's token
#[derive(Debug, Clone)]
pub enum Resolution {
    /// No token was presented
    Anonymous,
    /// A token was presented but is invalid or names an unknown identity
    Rejected,
    /// The identity is banned
    Banned(Identity),
    /// Valid session with a freshly issued replacement token
    Authenticated {
        identity: Identity,
        token: IssuedToken,
    },
}

impl Resolution {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Resolution::Authenticated { identity, .. } => Some(identity),
            _ => None,
        }
    }

    pub fn into_identity(self) -> Option<Identity> {
        match self {
            Resolution::Authenticated { identity, .. } => Some(identity),
            _ => None,
        }
    }
}

pub struct CurrentIdentityUseCase<R>
where
    R: IdentityRepository,
{
    repo: Arc<R>,
    config: Arc<CommunityConfig>,
}

impl<R> CurrentIdentityUseCase<R>
where
    R: IdentityRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<CommunityConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, token: Option<&str>) -> CommunityResult<Resolution> {
        let Some(token) = token else {
            return Ok(Resolution::Anonymous);
        };

        let sessions = SessionManager::new(&self.config);
        let Ok(id) = sessions.verify(token) else {
            return Ok(Resolution::Rejected);
        };

        let Some(identity) = self.repo.find_by_id(id).await? else {
            tracing::debug!(user_id = %id, "Token names an unknown identity");
            return Ok(Resolution::Rejected);
        };

        if self.config.recheck_ban_on_resolve && identity.is_banned() {
            tracing::debug!(user_id = %id, "Banned identity resolved as anonymous");
            return Ok(Resolution::Banned(identity));
        }

        let token = sessions.issue(identity.id);
        Ok(Resolution::Authenticated { identity, token })
    }
}
