//! Domain Layer
//!
//! Contains entities, value objects, repository traits and the
//! authorization policy.

pub mod entity;
pub mod policy;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{Identity, Notification, Post};
pub use policy::Denial;
pub use repository::{
    CommunityStore, FollowRepository, IdentityRepository, ModerationRepository,
    NotificationRepository, PostRepository,
};
