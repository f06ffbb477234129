//! Follow Handlers

use axum::Json;
use axum::extract::{Path, State};
use platform::blob::BlobStore;

use crate::domain::repository::CommunityStore;
use crate::error::CommunityResult;
use crate::presentation::dto::{FollowRequest, FollowResponse, ProfileSummaryResponse};
use crate::presentation::extractors::{JsonBody, QueryParams, SignedIn};
use crate::presentation::handlers::AppState;

/// POST /api/follow
pub async fn follow<R, B>(
    State(state): State<AppState<R, B>>,
    SignedIn(follower): SignedIn,
    JsonBody(req): JsonBody<FollowRequest>,
) -> CommunityResult<Json<FollowResponse>>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    state.follows().follow(&follower, &req.username).await?;
    Ok(Json(FollowResponse { following: true }))
}

/// DELETE /api/follow?username=
pub async fn unfollow<R, B>(
    State(state): State<AppState<R, B>>,
    SignedIn(follower): SignedIn,
    QueryParams(req): QueryParams<FollowRequest>,
) -> CommunityResult<Json<FollowResponse>>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    state.follows().unfollow(&follower, &req.username).await?;
    Ok(Json(FollowResponse { following: false }))
}

/// GET /api/users/{username}/followers
pub async fn followers<R, B>(
    State(state): State<AppState<R, B>>,
    Path(user_name): Path<String>,
) -> CommunityResult<Json<Vec<ProfileSummaryResponse>>>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let list = state.follows().list_followers(&user_name).await?;
    Ok(Json(list.iter().map(ProfileSummaryResponse::from).collect()))
}

/// GET /api/users/{username}/following
pub async fn following<R, B>(
    State(state): State<AppState<R, B>>,
    Path(user_name): Path<String>,
) -> CommunityResult<Json<Vec<ProfileSummaryResponse>>>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let list = state.follows().list_following(&user_name).await?;
    Ok(Json(list.iter().map(ProfileSummaryResponse::from).collect()))
}
