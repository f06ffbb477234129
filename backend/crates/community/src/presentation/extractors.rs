//! Request Extractors
//!
//! Rejections are reported as [`CommunityError`] so every failure renders
//! as the same problem JSON.

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::domain::entity::Identity;
use crate::error::CommunityError;
use crate::presentation::handlers::Viewer;

/// Signed-in identity of the current request
///
/// Part extractors run before the body is read, so anonymous callers get
/// `Unauthenticated` even when the body is malformed.
#[derive(Debug, Clone)]
pub struct SignedIn(pub Identity);

impl<S> FromRequestParts<S> for SignedIn
where
    S: Send + Sync,
{
    type Rejection = CommunityError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Viewer>()
            .and_then(|viewer| viewer.identity().cloned())
            .map(SignedIn)
            .ok_or(CommunityError::Unauthenticated)
    }
}

/// JSON body; malformed or incomplete bodies become `Validation`
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = CommunityError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| CommunityError::validation(rejection.body_text()))?;
        Ok(JsonBody(value))
    }
}

/// Query string; bad parameters become `Validation`
#[derive(Debug, Clone)]
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = CommunityError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| CommunityError::validation(rejection.body_text()))?;
        Ok(QueryParams(value))
    }
}
