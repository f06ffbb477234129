//! Post Entity

use chrono::{DateTime, Utc};
use kernel::id::{CategoryId, PostId, UserId};

use crate::domain::entity::identity::ProfileSummary;
use crate::domain::value_object::{ImageRef, Patch};

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub description: String,
    pub image: Option<ImageRef>,
    pub category: Option<Category>,
    pub author: ProfileSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    #[inline]
    pub fn author_id(&self) -> UserId {
        self.author.id
    }

    /// Storage key of the attached image, if any
    pub fn image_key(&self) -> Option<&str> {
        self.image.as_ref().map(|image| image.key.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: UserId,
    pub title: String,
    pub description: String,
    pub image: Option<ImageRef>,
    pub category_id: Option<CategoryId>,
}

#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Patch<ImageRef>,
    pub category_id: Patch<CategoryId>,
}

impl PostChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.image.is_unchanged()
            && self.category_id.is_unchanged()
    }
}

/// Result of publishing: the stored post and how many followers were notified
#[derive(Debug, Clone)]
pub struct Published {
    pub post: Post,
    pub notified: u64,
}
