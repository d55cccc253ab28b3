use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{
    Extension, Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{info, warn};
use uuid::Uuid;

use inkwell_db::Database;
use inkwell_types::api::{Claims, LoginForm, NextQuery, RegisterForm, safe_next};
use inkwell_types::forms::FieldErrors;

use crate::db_call;
use crate::error::ApiError;
use crate::middleware::{Identity, Viewer};
use crate::views::{LoginTemplate, Nav, RegisterTemplate, render};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    /// Lifetime of an issued session token, in days.
    pub session_days: i64,
}

pub const SESSION_COOKIE: &str = "inkwell_session";

const BAD_CREDENTIALS: &str = "Please enter a correct username and password.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";

pub async fn register_page(Extension(viewer): Extension<Viewer>) -> Result<Response, ApiError> {
    let page = RegisterTemplate::new(Nav::from(&viewer), &RegisterForm::default(), &FieldErrors::new());
    Ok(render(&page)?.into_response())
}

pub async fn register(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, ApiError> {
    let mut errors = form.validate().err().unwrap_or_default();
    let username = form.username.trim().to_string();

    if errors.for_field("username").is_empty() {
        let lookup = username.clone();
        let taken = db_call(&state, move |db| db.get_user_by_username(&lookup))
            .await?
            .is_some();
        if taken {
            errors.add("username", USERNAME_TAKEN);
        }
    }

    if !errors.is_empty() {
        let page = RegisterTemplate::new(Nav::from(&viewer), &form, &errors);
        return Ok(render(&page)?.into_response());
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(form.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();

    let user_id = Uuid::new_v4();
    let name = username.clone();
    let created = db_call(&state, move |db| db.create_user(&user_id, &name, &password_hash)).await?;
    if !created {
        // Lost a race with another registration for the same name.
        errors.add("username", USERNAME_TAKEN);
        let page = RegisterTemplate::new(Nav::from(&viewer), &form, &errors);
        return Ok(render(&page)?.into_response());
    }

    info!("Registered user {} ({})", username, user_id);

    let identity = Identity { user_id, username };
    let jar = jar.add(session_cookie(issue_token(&state, &identity)?));
    Ok((jar, Redirect::to("/")).into_response())
}

pub async fn login_page(
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<NextQuery>,
) -> Result<Response, ApiError> {
    let next = safe_next(query.next.as_deref()).to_string();
    let page = LoginTemplate::new(Nav::from(&viewer), "", next, None);
    Ok(render(&page)?.into_response())
}

pub async fn login(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    let next = safe_next(form.next.as_deref()).to_string();
    let username = form.username.trim().to_string();

    let lookup = username.clone();
    let user = db_call(&state, move |db| db.get_user_by_username(&lookup)).await?;

    let identity = user.and_then(|user| {
        let parsed = PasswordHash::new(&user.password).ok()?;
        Argon2::default()
            .verify_password(form.password.as_bytes(), &parsed)
            .ok()?;
        match user.id.parse() {
            Ok(user_id) => Some(Identity { user_id, username: user.username }),
            Err(e) => {
                warn!("Corrupt user id '{}': {}", user.id, e);
                None
            }
        }
    });

    let Some(identity) = identity else {
        warn!("Failed login for '{}'", username);
        let page = LoginTemplate::new(Nav::from(&viewer), &username, next, Some(BAD_CREDENTIALS));
        return Ok(render(&page)?.into_response());
    };

    info!("User {} logged in", identity.username);
    let jar = jar.add(session_cookie(issue_token(&state, &identity)?));
    Ok((jar, Redirect::to(&next)).into_response())
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/"))
}

fn issue_token(state: &AppStateInner, identity: &Identity) -> Result<String, ApiError> {
    let token = create_token(&state.jwt_secret, identity.user_id, &identity.username, state.session_days)?;
    Ok(token)
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn create_token(
    secret: &str,
    user_id: Uuid,
    username: &str,
    valid_days: i64,
) -> anyhow::Result<String> {
    let expires = chrono::Duration::try_days(valid_days)
        .and_then(|lifetime| chrono::Utc::now().checked_add_signed(lifetime))
        .ok_or_else(|| anyhow::anyhow!("session lifetime of {} days is out of range", valid_days))?;
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: expires.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
