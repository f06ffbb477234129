//! Post Handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use kernel::id::PostId;
use platform::blob::BlobStore;

use crate::application::{CreatePostInput, EditPostInput};
use crate::domain::repository::CommunityStore;
use crate::error::CommunityResult;
use crate::presentation::dto::{
    CategoryResponse, CreatePostRequest, EditPostRequest, PostListQuery, PostResponse,
    PublishResponse, id_patch, image_option, image_patch,
};
use crate::presentation::extractors::{JsonBody, QueryParams, SignedIn};
use crate::presentation::handlers::AppState;

/// POST /api/posts
pub async fn create<R, B>(
    State(state): State<AppState<R, B>>,
    SignedIn(author): SignedIn,
    JsonBody(req): JsonBody<CreatePostRequest>,
) -> CommunityResult<impl IntoResponse>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{

    let input = CreatePostInput {
        title: req.title,
        description: req.description,
        image: image_option(req.image)?,
        category_id: req.category_id.map(|raw| raw.parse()).transpose()?,
    };

    let published = state.posts().create(&author, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(PublishResponse {
            post: PostResponse::from(&published.post),
            notified: published.notified,
        }),
    ))
}

/// GET /api/posts?category=
pub async fn list<R, B>(
    State(state): State<AppState<R, B>>,
    QueryParams(query): QueryParams<PostListQuery>,
) -> CommunityResult<Json<Vec<PostResponse>>>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let posts = state.posts().list_recent(query.category.as_deref()).await?;
    Ok(Json(posts.iter().map(PostResponse::from).collect()))
}

/// GET /api/posts/{id}
pub async fn get<R, B>(
    State(state): State<AppState<R, B>>,
    Path(id): Path<String>,
) -> CommunityResult<Json<PostResponse>>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let id: PostId = id.parse()?;
    let post = state.posts().get(id).await?;
    Ok(Json(PostResponse::from(&post)))
}

/// PATCH /api/posts/{id}
pub async fn edit<R, B>(
    State(state): State<AppState<R, B>>,
    SignedIn(actor): SignedIn,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<EditPostRequest>,
) -> CommunityResult<Json<PostResponse>>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let id: PostId = id.parse()?;

    let input = EditPostInput {
        title: req.title,
        description: req.description,
        image: image_patch(req.image)?,
        category_id: id_patch(req.category_id)?,
    };

    let post = state.posts().edit(&actor, id, input).await?;
    Ok(Json(PostResponse::from(&post)))
}

/// DELETE /api/posts/{id}
pub async fn delete<R, B>(
    State(state): State<AppState<R, B>>,
    SignedIn(actor): SignedIn,
    Path(id): Path<String>,
) -> CommunityResult<StatusCode>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let id: PostId = id.parse()?;

    state.posts().delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/feed/following
pub async fn following_feed<R, B>(
    State(state): State<AppState<R, B>>,
    SignedIn(viewer): SignedIn,
) -> CommunityResult<Json<Vec<PostResponse>>>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let posts = state.posts().following_feed(Some(&viewer)).await?;
    Ok(Json(posts.iter().map(PostResponse::from).collect()))
}

/// GET /api/users/{username}/posts
pub async fn by_author<R, B>(
    State(state): State<AppState<R, B>>,
    Path(user_name): Path<String>,
) -> CommunityResult<Json<Vec<PostResponse>>>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let posts = state.posts().list_by_author(&user_name).await?;
    Ok(Json(posts.iter().map(PostResponse::from).collect()))
}

/// GET /api/categories
pub async fn categories<R, B>(
    State(state): State<AppState<R, B>>,
) -> CommunityResult<Json<Vec<CategoryResponse>>>
where
    R: CommunityStore,
    B: BlobStore + Send + Sync + 'static,
{
    let categories = state.posts().list_categories().await?;
    Ok(Json(categories.iter().map(CategoryResponse::from).collect()))
}
