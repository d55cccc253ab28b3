use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;
use uuid::Uuid;

use inkwell_types::api::Claims;

use crate::auth::{AppState, SESSION_COOKIE};
use crate::error::ApiError;

/// The signed-in user behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
        }
    }
}

/// Who is looking at a page, if anyone. Inserted on every request by
/// [`identify`].
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<Identity>);

impl Viewer {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|i| i.user_id)
    }
}

pub fn decode_token(token: &str, secret: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| debug!("Rejected session token: {}", e))
    .ok()
    .map(|data| data.claims)
}

/// Resolve the session cookie into a [`Viewer`]. Never rejects: a missing,
/// expired or forged token simply yields an anonymous viewer.
pub async fn identify(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| decode_token(cookie.value(), &state.jwt_secret))
        .map(Identity::from);

    req.extensions_mut().insert(Viewer(identity));
    next.run(req).await
}

/// Gate for routes that need a signed-in user. Exposes the [`Identity`] to
/// handlers, or redirects to the login page with a `next` back to here.
pub async fn require_auth(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let identity = req
        .extensions()
        .get::<Viewer>()
        .and_then(|viewer| viewer.0.clone());

    match identity {
        Some(identity) => {
            req.extensions_mut().insert(identity);
            Ok(next.run(req).await)
        }
        None => {
            let next_path = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| "/".to_string());
            Err(ApiError::Unauthenticated { next: next_path })
        }
    }
}
