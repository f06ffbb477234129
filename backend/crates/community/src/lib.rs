//! Community Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits, authorization policy
//! - `application/` - Use cases (sessions, moderation, follows, notifications, posts)
//! - `infra/` - PostgreSQL and in-memory repositories
//! - `presentation/` - HTTP handlers, DTOs, middleware, router
//!
//! ## Features
//! - Username/email + password sign up and sign in
//! - Signed session tokens with a sliding 7-day window
//! - Admin moderation (warn, ban, unban, delete post) with an audit trail
//! - Follow graph with new-post notifications to followers
//! - Ban gate that keeps banned clients on the banned page
//!
//! ## Security Model
//! - Passwords hashed with Argon2id
//! - Stateless HMAC-SHA256 tokens in an HttpOnly cookie
//! - Ban status re-read from the store on every token resolution

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::CommunityConfig;
pub use error::{CommunityError, CommunityResult};
pub use infra::memory::MemoryCommunityStore;
pub use infra::postgres::PgCommunityRepository;
pub use presentation::router::{community_router, community_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}
