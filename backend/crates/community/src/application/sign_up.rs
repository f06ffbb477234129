//! Sign Up Use Case
//!
//! Creates a new identity and signs it in.

use std::sync::Arc;

use platform::password::ClearTextPassword;
use platform::token::IssuedToken;

use crate::application::config::CommunityConfig;
use crate::application::session::SessionManager;
use crate::domain::entity::{Identity, NewIdentity};
use crate::domain::repository::IdentityRepository;
use crate::domain::value_object::{Email, Role, UserName};
use crate::error::{CommunityError, CommunityResult, ConflictReason};

/// Sign up input
pub struct SignUpInput {
    pub user_name: String,
    pub email: String,
    pub password: String,
}

/// Sign up output
#[derive(Debug)]
pub struct SignUpOutput {
    pub identity: Identity,
    pub token: IssuedToken,
}

/// Sign up use case
pub struct SignUpUseCase<R>
where
    R: IdentityRepository,
{
    repo: Arc<R>,
    config: Arc<CommunityConfig>,
}

impl<R> SignUpUseCase<R>
where
    R: IdentityRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<CommunityConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: SignUpInput) -> CommunityResult<SignUpOutput> {
        // All shape checks happen before touching the store.
        let user_name = UserName::new(&input.user_name)?;
        let email = Email::new(&input.email)?;
        let password = ClearTextPassword::new(input.password)?;

        if self.repo.user_name_taken(&user_name, None).await? {
            return Err(CommunityError::Conflict(ConflictReason::UserNameTaken));
        }
        if self.repo.email_taken(&email, None).await? {
            return Err(CommunityError::Conflict(ConflictReason::EmailTaken));
        }

        let password_hash = password.hash(self.config.pepper(), self.config.password_cost)?;

        let identity = self
            .repo
            .create(&NewIdentity {
                user_name,
                email,
                password_hash,
                role: Role::User,
            })
            .await?;

        let token = SessionManager::new(&self.config).issue(identity.id);

        tracing::info!(
            user_id = %identity.id,
            user_name = %identity.user_name,
            "User signed up"
        );

        Ok(SignUpOutput { identity, token })
    }
}
