//! Application Layer
//!
//! Use cases and application services.

pub mod ban_gate;
pub mod config;
pub mod current_identity;
pub mod follow;
pub mod moderation;
pub mod notification;
pub mod post;
pub mod profile;
pub mod session;
pub mod sign_in;
pub mod sign_up;

// Re-exports
pub use config::CommunityConfig;
pub use current_identity::{CurrentIdentityUseCase, Resolution};
pub use follow::FollowUseCase;
pub use moderation::ModerationUseCase;
pub use notification::{NotificationList, NotificationUseCase};
pub use post::{CreatePostInput, EditPostInput, PostUseCase};
pub use profile::{ProfileUpdateInput, ProfileUseCase, ProfileView};
pub use session::SessionManager;
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};
