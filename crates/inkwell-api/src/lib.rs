pub mod access;
pub mod auth;
pub mod comments;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod posts;
pub mod views;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tracing::error;

use inkwell_db::Database;
use inkwell_types::models::{Comment, CommentId, Post, PostId};

use crate::auth::AppState;
use crate::error::ApiError;

/// Every blog route. Listing pages and the account pages are public; the
/// rest sit behind [`middleware::require_auth`].
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(posts::index))
        .route("/comments/{post_id}/", get(comments::comments))
        .route("/users/register/", get(auth::register_page).post(auth::register))
        .route("/users/login/", get(auth::login_page).post(auth::login))
        .route("/users/logout/", post(auth::logout))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/new_post/", get(posts::new_post_page).post(posts::new_post))
        .route("/edit_post/{post_id}/", get(posts::edit_post_page).post(posts::edit_post))
        .route("/delete_post/{post_id}/", get(posts::delete_post_page).post(posts::delete_post))
        .route("/add_comment/{post_id}/", get(comments::add_comment_page).post(comments::add_comment))
        .route(
            "/delete_comment/{comment_id}/",
            get(comments::delete_comment_page).post(comments::delete_comment),
        )
        .route_layer(from_fn(middleware::require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .layer(from_fn_with_state(state.clone(), middleware::identify))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Run a store call on the blocking pool.
pub(crate) async fn db_call<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
        .map_err(ApiError::from)
}

pub(crate) async fn load_post(state: &AppState, id: PostId) -> Result<Post, ApiError> {
    db_call(state, move |db| db.get_post(id))
        .await?
        .ok_or(ApiError::NotFound)
}

pub(crate) async fn load_comment(state: &AppState, id: CommentId) -> Result<Comment, ApiError> {
    db_call(state, move |db| db.get_comment(id))
        .await?
        .ok_or(ApiError::NotFound)
}
