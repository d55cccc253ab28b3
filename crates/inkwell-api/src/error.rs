use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use askama::Template;
use thiserror::Error;
use tracing::error;

use crate::views::{ErrorTemplate, NotFoundTemplate};

/// Request-level failures. None of these outlive the request that raised
/// them.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,

    /// The requester is not the owner. Rendered exactly like `NotFound`.
    #[error("access denied")]
    AccessDenied,

    /// No session on a route that needs one. `next` is the path to return
    /// to after logging in.
    #[error("authentication required")]
    Unauthenticated { next: String },

    #[error("template rendering failed: {0}")]
    Render(#[from] askama::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub fn login_url(next: &str) -> String {
    format!("/users/login/?next={}", urlencoding::encode(next))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound | ApiError::AccessDenied => {
                let body = NotFoundTemplate
                    .render()
                    .unwrap_or_else(|_| "Not Found".to_string());
                (StatusCode::NOT_FOUND, Html(body)).into_response()
            }
            ApiError::Unauthenticated { next } => Redirect::to(&login_url(&next)).into_response(),
            ApiError::Render(e) => {
                error!("Template error: {}", e);
                server_error()
            }
            ApiError::Internal(e) => {
                error!("Request failed: {:#}", e);
                server_error()
            }
        }
    }
}

fn server_error() -> Response {
    let body = ErrorTemplate
        .render()
        .unwrap_or_else(|_| "Internal Server Error".to_string());
    (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn access_denied_looks_like_not_found() {
        let denied = ApiError::AccessDenied.into_response();
        let missing = ApiError::NotFound.into_response();
        assert_eq!(denied.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.status(), denied.status());
    }

    #[test]
    fn unauthenticated_redirects_to_login_with_next() {
        let resp = ApiError::Unauthenticated { next: "/edit_post/3/".into() }.into_response();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/users/login/?next=%2Fedit_post%2F3%2F"
        );
    }

    #[test]
    fn internal_errors_are_500() {
        let resp = ApiError::Internal(anyhow::anyhow!("disk full")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
