//! Community Router

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};
use platform::blob::{BlobCleaner, BlobStore, HttpBlobStore};

use crate::application::config::CommunityConfig;
use crate::domain::repository::CommunityStore;
use crate::infra::postgres::PgCommunityRepository;
use crate::presentation::handlers::{
    self, AppState, admin, auth, banned, follow, notification, profile,
};
use crate::presentation::middleware::{ban_gate, resolve_identity};

/// Create the community router with the PostgreSQL repository
pub fn community_router(
    repo: PgCommunityRepository,
    config: CommunityConfig,
    cleaner: BlobCleaner<HttpBlobStore>,
) -> Router {
    community_router_generic(repo, config, cleaner)
}

/// Create a community router for any store and blob store implementation
///
/// Routes carry their full `/api/...` paths so the ban gate sees the same
/// paths the client requested.
pub fn community_router_generic<R, B>(
    repo: R,
    config: CommunityConfig,
    cleaner: BlobCleaner<B>,
) -> Router
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let state = AppState::new(repo, config, cleaner);

    // Session establishment runs without identity resolution.
    let sessions = Router::new()
        .route("/api/auth/register", post(auth::register::<R, B>))
        .route("/api/auth/login", post(auth::login::<R, B>))
        .route("/api/auth/logout", post(auth::logout::<R, B>));

    let resolved = Router::new()
        .route("/api/auth/me", get(auth::me))
        // Admin
        .route("/api/admin/users", get(admin::list_users::<R, B>))
        .route("/api/admin/users/warn", post(admin::warn::<R, B>))
        .route("/api/admin/users/ban", post(admin::ban::<R, B>))
        .route("/api/admin/users/unban", post(admin::unban::<R, B>))
        .route(
            "/api/admin/users/{id}/actions",
            get(admin::list_actions::<R, B>),
        )
        .route("/api/admin/posts/delete", post(admin::delete_post::<R, B>))
        // Follow graph
        .route(
            "/api/follow",
            post(follow::follow::<R, B>).delete(follow::unfollow::<R, B>),
        )
        .route(
            "/api/users/{username}/followers",
            get(follow::followers::<R, B>),
        )
        .route(
            "/api/users/{username}/following",
            get(follow::following::<R, B>),
        )
        // Notifications
        .route("/api/notifications", get(notification::list::<R, B>))
        .route(
            "/api/notifications/read",
            post(notification::mark_read::<R, B>),
        )
        .route("/api/notifications/clear", post(notification::clear::<R, B>))
        // Posts
        .route(
            "/api/posts",
            post(handlers::post::create::<R, B>).get(handlers::post::list::<R, B>),
        )
        .route(
            "/api/posts/{id}",
            get(handlers::post::get::<R, B>)
                .patch(handlers::post::edit::<R, B>)
                .delete(handlers::post::delete::<R, B>),
        )
        .route(
            "/api/feed/following",
            get(handlers::post::following_feed::<R, B>),
        )
        .route("/api/categories", get(handlers::post::categories::<R, B>))
        .route(
            "/api/users/{username}/posts",
            get(handlers::post::by_author::<R, B>),
        )
        // Profile
        .route(
            "/api/users/update-profile",
            patch(profile::update_profile::<R, B>),
        )
        .route(
            "/api/users/change-password",
            post(profile::change_password::<R, B>),
        )
        .route("/api/users/{username}", get(profile::view::<R, B>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            resolve_identity::<R, B>,
        ));

    Router::new()
        .merge(sessions)
        .merge(resolved)
        .route("/banned", get(banned::page))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            ban_gate,
        ))
        .with_state(state)
}
