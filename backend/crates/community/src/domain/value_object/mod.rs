//! Value Object Module

pub mod email;
pub mod image_ref;
pub mod moderation_kind;
pub mod notification_kind;
pub mod patch;
pub mod reason;
pub mod role;
pub mod user_name;

pub use email::{Email, EmailError};
pub use image_ref::ImageRef;
pub use moderation_kind::ModerationKind;
pub use notification_kind::NotificationKind;
pub use patch::Patch;
pub use reason::Reason;
pub use role::Role;
pub use user_name::{UserName, UserNameError};
