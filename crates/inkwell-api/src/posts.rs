use axum::{
    Extension, Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::info;

use inkwell_types::forms::{DeletePostConfirmation, FieldErrors, PostForm};
use inkwell_types::models::PostId;

use crate::access::ensure_owner;
use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::IdPath;
use crate::middleware::{Identity, Viewer};
use crate::views::{DeletePostTemplate, EditPostTemplate, IndexTemplate, Nav, NewPostTemplate, PostItem, render};
use crate::{db_call, load_post};

/// GET / — every post, newest first. Open to anonymous viewers.
pub async fn index(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Response, ApiError> {
    let posts = db_call(&state, |db| db.list_posts()).await?;

    let viewer_id = viewer.user_id();
    let page = IndexTemplate {
        nav: Nav::from(&viewer),
        posts: posts.into_iter().map(|p| PostItem::new(p, viewer_id)).collect(),
    };
    Ok(render(&page)?.into_response())
}

pub async fn new_post_page(Extension(user): Extension<Identity>) -> Result<Response, ApiError> {
    let page = NewPostTemplate::new(Nav::from(&user), &PostForm::default(), &FieldErrors::new());
    Ok(render(&page)?.into_response())
}

/// POST /new_post/ — the owner is always the session user, never a form
/// field.
pub async fn new_post(
    State(state): State<AppState>,
    Extension(user): Extension<Identity>,
    Form(form): Form<PostForm>,
) -> Result<Response, ApiError> {
    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => {
            let page = NewPostTemplate::new(Nav::from(&user), &form, &errors);
            return Ok(render(&page)?.into_response());
        }
    };

    let owner = user.user_id;
    let id = db_call(&state, move |db| db.create_post(&owner, &valid)).await?;

    info!("Post {} created by {}", id, user.username);
    Ok(Redirect::to("/").into_response())
}

pub async fn edit_post_page(
    State(state): State<AppState>,
    IdPath(post_id): IdPath<PostId>,
    Extension(user): Extension<Identity>,
) -> Result<Response, ApiError> {
    let post = load_post(&state, post_id).await?;
    ensure_owner(post.owner_id, &user)?;

    let page = EditPostTemplate::prefilled(Nav::from(&user), post);
    Ok(render(&page)?.into_response())
}

pub async fn edit_post(
    State(state): State<AppState>,
    IdPath(post_id): IdPath<PostId>,
    Extension(user): Extension<Identity>,
    Form(form): Form<PostForm>,
) -> Result<Response, ApiError> {
    let post = load_post(&state, post_id).await?;
    ensure_owner(post.owner_id, &user)?;

    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => {
            let page = EditPostTemplate::rejected(Nav::from(&user), post, &form, &errors);
            return Ok(render(&page)?.into_response());
        }
    };

    let updated = db_call(&state, move |db| db.update_post(post_id, &valid)).await?;
    if !updated {
        // Deleted between the ownership check and the write.
        return Err(ApiError::NotFound);
    }

    info!("Post {} edited by {}", post_id, user.username);
    Ok(Redirect::to("/").into_response())
}

pub async fn delete_post_page(
    State(state): State<AppState>,
    IdPath(post_id): IdPath<PostId>,
    Extension(user): Extension<Identity>,
) -> Result<Response, ApiError> {
    let post = load_post(&state, post_id).await?;
    ensure_owner(post.owner_id, &user)?;

    let page = DeletePostTemplate { nav: Nav::from(&user), post };
    Ok(render(&page)?.into_response())
}

/// POST /delete_post/{id}/ — only a submission carrying the `delete` button
/// removes the post; anything else shows the confirmation again.
pub async fn delete_post(
    State(state): State<AppState>,
    IdPath(post_id): IdPath<PostId>,
    Extension(user): Extension<Identity>,
    Form(confirm): Form<DeletePostConfirmation>,
) -> Result<Response, ApiError> {
    let post = load_post(&state, post_id).await?;
    ensure_owner(post.owner_id, &user)?;

    if !confirm.confirmed() {
        let page = DeletePostTemplate { nav: Nav::from(&user), post };
        return Ok(render(&page)?.into_response());
    }

    let removed = db_call(&state, move |db| db.delete_post(post_id))
        .await?
        .ok_or(ApiError::NotFound)?;

    info!(
        "Post {} ('{}') deleted by {} with {} comments",
        post_id, post, user.username, removed
    );
    Ok(Redirect::to("/").into_response())
}
