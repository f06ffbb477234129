//! Admin Handlers
//!
//! Every action is checked by the moderation use case; these handlers only
//! decode the request.

use axum::Json;
use axum::extract::{Path, State};
use kernel::id::UserId;
use platform::blob::BlobStore;

use crate::domain::repository::CommunityStore;
use crate::error::CommunityResult;
use crate::presentation::dto::{
    IdentityOverviewResponse, LimitQuery, ModeratePostRequest, ModerateUserRequest,
    ModerationActionResponse,
};
use crate::presentation::extractors::{JsonBody, QueryParams, SignedIn};
use crate::presentation::handlers::AppState;

/// POST /api/admin/users/warn
pub async fn warn<R, B>(
    State(state): State<AppState<R, B>>,
    SignedIn(admin): SignedIn,
    JsonBody(req): JsonBody<ModerateUserRequest>,
) -> CommunityResult<Json<ModerationActionResponse>>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let target = req.user_id.parse()?;

    let action = state.moderation().warn(&admin, target, req.reason).await?;
    Ok(Json(ModerationActionResponse::from(&action)))
}

/// POST /api/admin/users/ban
pub async fn ban<R, B>(
    State(state): State<AppState<R, B>>,
    SignedIn(admin): SignedIn,
    JsonBody(req): JsonBody<ModerateUserRequest>,
) -> CommunityResult<Json<ModerationActionResponse>>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let target = req.user_id.parse()?;

    let action = state.moderation().ban(&admin, target, req.reason).await?;
    Ok(Json(ModerationActionResponse::from(&action)))
}

/// POST /api/admin/users/unban
pub async fn unban<R, B>(
    State(state): State<AppState<R, B>>,
    SignedIn(admin): SignedIn,
    JsonBody(req): JsonBody<ModerateUserRequest>,
) -> CommunityResult<Json<ModerationActionResponse>>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let target = req.user_id.parse()?;

    let action = state.moderation().unban(&admin, target).await?;
    Ok(Json(ModerationActionResponse::from(&action)))
}

/// POST /api/admin/posts/delete
pub async fn delete_post<R, B>(
    State(state): State<AppState<R, B>>,
    SignedIn(admin): SignedIn,
    JsonBody(req): JsonBody<ModeratePostRequest>,
) -> CommunityResult<Json<ModerationActionResponse>>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let post_id = req.post_id.parse()?;

    let action = state
        .moderation()
        .delete_post(&admin, post_id, req.reason)
        .await?;
    Ok(Json(ModerationActionResponse::from(&action)))
}

/// GET /api/admin/users
pub async fn list_users<R, B>(
    State(state): State<AppState<R, B>>,
    SignedIn(admin): SignedIn,
) -> CommunityResult<Json<Vec<IdentityOverviewResponse>>>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{

    let identities = state.moderation().list_identities(&admin).await?;
    Ok(Json(
        identities.iter().map(IdentityOverviewResponse::from).collect(),
    ))
}

/// GET /api/admin/users/{id}/actions
pub async fn list_actions<R, B>(
    State(state): State<AppState<R, B>>,
    SignedIn(admin): SignedIn,
    Path(id): Path<String>,
    QueryParams(query): QueryParams<LimitQuery>,
) -> CommunityResult<Json<Vec<ModerationActionResponse>>>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let target: UserId = id.parse()?;

    let actions = state
        .moderation()
        .list_actions(&admin, target, query.limit)
        .await?;
    Ok(Json(
        actions.iter().map(ModerationActionResponse::from).collect(),
    ))
}
