//! Profile Handlers

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use platform::blob::BlobStore;

use crate::application::ProfileUpdateInput;
use crate::domain::repository::CommunityStore;
use crate::error::CommunityResult;
use crate::presentation::dto::{
    ChangePasswordRequest, IdentityResponse, ProfileResponse, UpdateProfileRequest, image_patch,
};
use crate::presentation::extractors::{JsonBody, SignedIn};
use crate::presentation::handlers::{AppState, Viewer};

/// GET /api/users/{username}
pub async fn view<R, B>(
    State(state): State<AppState<R, B>>,
    Extension(viewer): Extension<Viewer>,
    Path(user_name): Path<String>,
) -> CommunityResult<Json<ProfileResponse>>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let view = state.profiles().view(&user_name, viewer.identity()).await?;
    Ok(Json(ProfileResponse::from(&view)))
}

/// PATCH /api/users/update-profile
pub async fn update_profile<R, B>(
    State(state): State<AppState<R, B>>,
    SignedIn(viewer): SignedIn,
    JsonBody(req): JsonBody<UpdateProfileRequest>,
) -> CommunityResult<Json<IdentityResponse>>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{

    let input = ProfileUpdateInput {
        user_name: req.username,
        email: req.email,
        avatar: image_patch(req.avatar)?,
    };

    let updated = state.profiles().update(&viewer, input).await?;
    Ok(Json(IdentityResponse::from(&updated)))
}

/// POST /api/users/change-password
pub async fn change_password<R, B>(
    State(state): State<AppState<R, B>>,
    SignedIn(viewer): SignedIn,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> CommunityResult<StatusCode>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{

    state
        .profiles()
        .change_password(&viewer, req.current_password, req.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
