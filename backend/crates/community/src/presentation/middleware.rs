//! Community Middleware
//!
//! - `resolve_identity`: maps the token cookie to a [`Viewer`] and renews
//!   the session cookie on every resolution.
//! - `ban_gate`: keeps clients carrying the ban signal on the banned page.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use platform::blob::BlobStore;
use platform::cookie::{extract_cookie, to_header_value};

use crate::application::ban_gate::{self, BAN_SIGNAL_SET, BANNED_PATH, GateDecision};
use crate::application::config::CommunityConfig;
use crate::application::{CurrentIdentityUseCase, Resolution};
use crate::domain::repository::CommunityStore;
use crate::presentation::handlers::{AppState, Viewer};

/// Resolve the current identity for API routes
///
/// Never rejects by itself; handlers that need a session take the
/// [`SignedIn`](crate::presentation::extractors::SignedIn) extractor.
pub async fn resolve_identity<R, B>(
    State(state): State<AppState<R, B>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let token = extract_cookie(req.headers(), &state.config.token_cookie_name);

    let use_case = CurrentIdentityUseCase::new(state.repo.clone(), state.config.clone());
    let resolution = use_case
        .execute(token.as_deref())
        .await
        .map_err(IntoResponse::into_response)?;

    let token_cookie = state.config.token_cookie();
    let (viewer, cookies) = match resolution {
        Resolution::Anonymous => (None, Vec::new()),
        Resolution::Rejected => (None, vec![token_cookie.build_delete_cookie()]),
        Resolution::Banned(identity) => {
            tracing::info!(user_id = %identity.id, "Banned identity presented a session");
            (
                None,
                vec![
                    token_cookie.build_delete_cookie(),
                    state.config.ban_cookie().build_set_cookie(BAN_SIGNAL_SET),
                ],
            )
        }
        Resolution::Authenticated { identity, token } => (
            Some(identity),
            vec![token_cookie.build_set_cookie(&token.token)],
        ),
    };

    req.extensions_mut().insert(Viewer(viewer));

    let mut response = next.run(req).await;
    for cookie in cookies {
        response
            .headers_mut()
            .append(header::SET_COOKIE, to_header_value(&cookie));
    }

    Ok(response)
}

/// Redirect page requests of banned clients to the banned surface
///
/// Reads only the cached ban cookie; the store is never consulted here.
pub async fn ban_gate(
    State(config): State<Arc<CommunityConfig>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let signal = extract_cookie(req.headers(), &config.ban_cookie_name);

    match ban_gate::evaluate(req.uri().path(), signal.as_deref()) {
        GateDecision::RedirectToBanned => Redirect::temporary(BANNED_PATH).into_response(),
        GateDecision::Pass => next.run(req).await,
    }
}
