//! Notification Handlers

use axum::Json;
use axum::extract::State;
use platform::blob::BlobStore;

use crate::domain::repository::CommunityStore;
use crate::error::CommunityResult;
use crate::presentation::dto::{AffectedResponse, LimitQuery, NotificationListResponse};
use crate::presentation::extractors::{QueryParams, SignedIn};
use crate::presentation::handlers::AppState;

/// GET /api/notifications
pub async fn list<R, B>(
    State(state): State<AppState<R, B>>,
    SignedIn(recipient): SignedIn,
    QueryParams(query): QueryParams<LimitQuery>,
) -> CommunityResult<Json<NotificationListResponse>>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let list = state
        .notifications()
        .list_recent(recipient.id, query.limit)
        .await?;
    Ok(Json(NotificationListResponse::from(&list)))
}

/// POST /api/notifications/read
pub async fn mark_read<R, B>(
    State(state): State<AppState<R, B>>,
    SignedIn(recipient): SignedIn,
) -> CommunityResult<Json<AffectedResponse>>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let count = state.notifications().mark_all_read(recipient.id).await?;
    Ok(Json(AffectedResponse { count }))
}

/// POST /api/notifications/clear
pub async fn clear<R, B>(
    State(state): State<AppState<R, B>>,
    SignedIn(recipient): SignedIn,
) -> CommunityResult<Json<AffectedResponse>>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let count = state.notifications().clear_all(recipient.id).await?;
    Ok(Json(AffectedResponse { count }))
}
