//! Auth Handlers

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::{StatusCode, header};
use axum::response::{AppendHeaders, IntoResponse, Response};
use platform::blob::BlobStore;

use crate::application::ban_gate::{BAN_SIGNAL_CLEAR, BAN_SIGNAL_SET};
use crate::application::{SignInInput, SignInOutput, SignInUseCase, SignUpInput, SignUpUseCase};
use crate::domain::repository::CommunityStore;
use crate::error::CommunityResult;
use crate::presentation::dto::{
    BannedResponse, IdentityResponse, LoginRequest, RegisterRequest, SessionResponse,
};
use crate::presentation::extractors::JsonBody;
use crate::presentation::handlers::{AppState, Viewer};

/// POST /api/auth/register
pub async fn register<R, B>(
    State(state): State<AppState<R, B>>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> CommunityResult<Response>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let use_case = SignUpUseCase::new(state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(SignUpInput {
            user_name: req.username,
            email: req.email,
            password: req.password,
        })
        .await?;

    let cookies = [
        (
            header::SET_COOKIE,
            state.config.token_cookie().build_set_cookie(&output.token.token),
        ),
        (
            header::SET_COOKIE,
            state.config.ban_cookie().build_set_cookie(BAN_SIGNAL_CLEAR),
        ),
    ];

    Ok((
        StatusCode::CREATED,
        AppendHeaders(cookies),
        Json(SessionResponse {
            authenticated: true,
            user: Some(IdentityResponse::from(&output.identity)),
        }),
    )
        .into_response())
}

/// POST /api/auth/login
pub async fn login<R, B>(
    State(state): State<AppState<R, B>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> CommunityResult<Response>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let use_case = SignInUseCase::new(state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(SignInInput {
            identifier: req.identifier,
            password: req.password,
        })
        .await?;

    match output {
        SignInOutput::Authenticated { identity, token } => {
            let cookies = [
                (
                    header::SET_COOKIE,
                    state.config.token_cookie().build_set_cookie(&token.token),
                ),
                (
                    header::SET_COOKIE,
                    state.config.ban_cookie().build_set_cookie(BAN_SIGNAL_CLEAR),
                ),
            ];

            Ok((
                StatusCode::OK,
                AppendHeaders(cookies),
                Json(SessionResponse {
                    authenticated: true,
                    user: Some(IdentityResponse::from(&identity)),
                }),
            )
                .into_response())
        }
        SignInOutput::Banned { reason } => {
            // No session; the client is pinned to the banned page instead.
            let cookies = [
                (
                    header::SET_COOKIE,
                    state.config.token_cookie().build_delete_cookie(),
                ),
                (
                    header::SET_COOKIE,
                    state.config.ban_cookie().build_set_cookie(BAN_SIGNAL_SET),
                ),
            ];

            Ok((
                StatusCode::FORBIDDEN,
                AppendHeaders(cookies),
                Json(BannedResponse {
                    banned: true,
                    reason: reason.map(|r| r.as_str().to_string()),
                }),
            )
                .into_response())
        }
    }
}

/// POST /api/auth/logout
///
/// Tokens are stateless, so logout only clears the cookies.
pub async fn logout<R, B>(State(state): State<AppState<R, B>>) -> impl IntoResponse
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let cookies = [
        (
            header::SET_COOKIE,
            state.config.token_cookie().build_delete_cookie(),
        ),
        (
            header::SET_COOKIE,
            state.config.ban_cookie().build_set_cookie(BAN_SIGNAL_CLEAR),
        ),
    ];

    (StatusCode::NO_CONTENT, AppendHeaders(cookies))
}

/// GET /api/auth/me
///
/// The session cookie is renewed by the identity middleware.
pub async fn me(Extension(viewer): Extension<Viewer>) -> Json<SessionResponse> {
    Json(SessionResponse {
        authenticated: viewer.identity().is_some(),
        user: viewer.identity().map(IdentityResponse::from),
    })
}
