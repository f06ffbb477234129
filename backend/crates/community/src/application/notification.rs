//! Notification Dispatcher

use std::sync::Arc;

use kernel::id::UserId;

use crate::application::config::CommunityConfig;
use crate::domain::entity::{NewNotification, Notification};
use crate::domain::repository::NotificationRepository;
use crate::error::CommunityResult;

/// Hard cap on a single page
const MAX_LIST_LIMIT: i64 = 100;

/// Recent notifications together with the unread total
#[derive(Debug, Clone)]
pub struct NotificationList {
    pub items: Vec<Notification>,
    pub unread: i64,
}

pub struct NotificationUseCase<R>
where
    R: NotificationRepository,
{
    repo: Arc<R>,
    config: Arc<CommunityConfig>,
}

impl<R> NotificationUseCase<R>
where
    R: NotificationRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<CommunityConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn notify(&self, notification: &NewNotification) -> CommunityResult<Notification> {
        let created = self.repo.create_notification(notification).await?;
        tracing::debug!(
            recipient = %created.recipient_id,
            kind = %created.kind,
            "Notification created"
        );
        Ok(created)
    }

    pub async fn list_recent(&self, recipient: UserId, limit: Option<i64>) -> CommunityResult<NotificationList> {
        let limit = limit
            .unwrap_or(self.config.notification_limit)
            .clamp(1, MAX_LIST_LIMIT);

        let items = self.repo.list_notifications(recipient, limit).await?;
        let unread = self.repo.count_unread(recipient).await?;

        Ok(NotificationList { items, unread })
    }

    pub async fn count_unread(&self, recipient: UserId) -> CommunityResult<i64> {
        self.repo.count_unread(recipient).await
    }

    pub async fn mark_all_read(&self, recipient: UserId) -> CommunityResult<u64> {
        let marked = self.repo.mark_all_read(recipient).await?;
        tracing::debug!(recipient = %recipient, marked, "Notifications marked read");
        Ok(marked)
    }

    pub async fn clear_all(&self, recipient: UserId) -> CommunityResult<u64> {
        let deleted = self.repo.clear_all(recipient).await?;
        tracing::debug!(recipient = %recipient, deleted, "Notifications cleared");
        Ok(deleted)
    }
}
