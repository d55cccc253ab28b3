use axum::{
    Extension, Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::info;

use inkwell_types::forms::{CommentForm, DeleteCommentConfirmation, FieldErrors};
use inkwell_types::models::{CommentId, PostId};

use crate::access::ensure_owner;
use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::IdPath;
use crate::middleware::{Identity, Viewer};
use crate::views::{
    AddCommentTemplate, CommentItem, CommentsTemplate, DeleteCommentTemplate, Nav, PostItem, render,
};
use crate::{db_call, load_comment, load_post};

fn comments_url(post_id: PostId) -> String {
    format!("/comments/{post_id}/")
}

/// GET /comments/{post_id}/ — the post followed by its comments, newest
/// first. Open to anonymous viewers.
pub async fn comments(
    State(state): State<AppState>,
    IdPath(post_id): IdPath<PostId>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Response, ApiError> {
    let post = load_post(&state, post_id).await?;
    let comments = db_call(&state, move |db| db.list_comments(post_id)).await?;

    let viewer_id = viewer.user_id();
    let page = CommentsTemplate {
        nav: Nav::from(&viewer),
        post: PostItem::new(post, viewer_id),
        comments: comments
            .into_iter()
            .map(|c| CommentItem::new(c, viewer_id))
            .collect(),
    };
    Ok(render(&page)?.into_response())
}

pub async fn add_comment_page(
    State(state): State<AppState>,
    IdPath(post_id): IdPath<PostId>,
    Extension(user): Extension<Identity>,
) -> Result<Response, ApiError> {
    let post = load_post(&state, post_id).await?;

    let page = AddCommentTemplate::new(Nav::from(&user), post, &CommentForm::default(), &FieldErrors::new());
    Ok(render(&page)?.into_response())
}

/// POST /add_comment/{post_id}/ — post and owner come from the path and the
/// session, the form only supplies the text.
pub async fn add_comment(
    State(state): State<AppState>,
    IdPath(post_id): IdPath<PostId>,
    Extension(user): Extension<Identity>,
    Form(form): Form<CommentForm>,
) -> Result<Response, ApiError> {
    let post = load_post(&state, post_id).await?;

    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => {
            let page = AddCommentTemplate::new(Nav::from(&user), post, &form, &errors);
            return Ok(render(&page)?.into_response());
        }
    };

    let owner = user.user_id;
    let id = db_call(&state, move |db| db.create_comment(post_id, &owner, &valid)).await?;

    info!("Comment {} on post {} added by {}", id, post_id, user.username);
    Ok(Redirect::to(&comments_url(post_id)).into_response())
}

pub async fn delete_comment_page(
    State(state): State<AppState>,
    IdPath(comment_id): IdPath<CommentId>,
    Extension(user): Extension<Identity>,
) -> Result<Response, ApiError> {
    let comment = load_comment(&state, comment_id).await?;
    ensure_owner(comment.owner_id, &user)?;
    let post = load_post(&state, comment.post_id).await?;

    let page = DeleteCommentTemplate { nav: Nav::from(&user), post, comment };
    Ok(render(&page)?.into_response())
}

/// POST /delete_comment/{comment_id}/ — requires the `submit` button.
pub async fn delete_comment(
    State(state): State<AppState>,
    IdPath(comment_id): IdPath<CommentId>,
    Extension(user): Extension<Identity>,
    Form(confirm): Form<DeleteCommentConfirmation>,
) -> Result<Response, ApiError> {
    let comment = load_comment(&state, comment_id).await?;
    ensure_owner(comment.owner_id, &user)?;

    if !confirm.confirmed() {
        let post = load_post(&state, comment.post_id).await?;
        let page = DeleteCommentTemplate { nav: Nav::from(&user), post, comment };
        return Ok(render(&page)?.into_response());
    }

    let post_id = comment.post_id;
    if !db_call(&state, move |db| db.delete_comment(comment_id)).await? {
        return Err(ApiError::NotFound);
    }

    info!("Comment {} ('{}') deleted by {}", comment_id, comment, user.username);
    Ok(Redirect::to(&comments_url(post_id)).into_response())
}
