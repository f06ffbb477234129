//! Sign In Use Case
//!
//! Authenticates by email or user name plus password.

use std::sync::Arc;

use platform::password::ClearTextPassword;
use platform::token::IssuedToken;

use crate::application::config::CommunityConfig;
use crate::application::session::SessionManager;
use crate::domain::entity::Identity;
use crate::domain::repository::IdentityRepository;
use crate::domain::value_object::{Email, Reason, UserName};
use crate::error::{CommunityError, CommunityResult};

/// Sign in input
pub struct SignInInput {
    /// User name or email
    pub identifier: String,
    pub password: String,
}

/// Sign in output
#[derive(Debug)]
pub enum SignInOutput {
    Authenticated {
        identity: Identity,
        token: IssuedToken,
    },
    /// Correct credentials for a banned identity; no token is issued
    Banned { reason: Option<Reason> },
}

/// Sign in use case
pub struct SignInUseCase<R>
where
    R: IdentityRepository,
{
    repo: Arc<R>,
    config: Arc<CommunityConfig>,
}

impl<R> SignInUseCase<R>
where
    R: IdentityRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<CommunityConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: SignInInput) -> CommunityResult<SignInOutput> {
        if input.identifier.trim().is_empty() || input.password.is_empty() {
            return Err(CommunityError::validation("Missing fields"));
        }

        let identity = if input.identifier.contains('@') {
            let email = Email::new(&input.identifier)
                .map_err(|_| CommunityError::InvalidCredentials)?;
            self.repo.find_by_email(&email).await?
        } else {
            let user_name = UserName::new(&input.identifier)
                .map_err(|_| CommunityError::InvalidCredentials)?;
            self.repo.find_by_user_name(&user_name).await?
        };

        let identity = identity.ok_or(CommunityError::InvalidCredentials)?;

        let hash = self
            .repo
            .find_password_hash(identity.id)
            .await?
            .ok_or_else(|| CommunityError::Internal("Password hash not found".to_string()))?;

        // A password that could never have been set cannot match.
        let password =
            ClearTextPassword::new(input.password).map_err(|_| CommunityError::InvalidCredentials)?;

        if !hash.verify(&password, self.config.pepper()) {
            return Err(CommunityError::InvalidCredentials);
        }

        if let Some(ban) = &identity.ban {
            tracing::warn!(user_id = %identity.id, "Sign in refused for banned identity");
            return Ok(SignInOutput::Banned {
                reason: ban.reason.clone(),
            });
        }

        let token = SessionManager::new(&self.config).issue(identity.id);

        tracing::info!(user_id = %identity.id, "User signed in");

        Ok(SignInOutput::Authenticated { identity, token })
    }
}
