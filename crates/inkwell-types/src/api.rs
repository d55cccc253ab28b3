use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::forms::FieldErrors;

// -- JWT Claims --

/// Claims carried by the session token. Shared by the login handlers that
/// issue it and the middleware that verifies it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 32;
pub const PASSWORD_MIN_CHARS: usize = 8;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

impl RegisterForm {
    /// Shape checks only. Whether the username is free is decided by the
    /// store.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        let username = self.username.trim();
        let len = username.chars().count();
        if username.is_empty() {
            errors.add("username", "This field is required.");
        } else if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) {
            errors.add(
                "username",
                format!(
                    "Usernames must be between {USERNAME_MIN_CHARS} and {USERNAME_MAX_CHARS} characters."
                ),
            );
        } else if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        if self.password.chars().count() < PASSWORD_MIN_CHARS {
            errors.add(
                "password",
                format!("This password is too short. It must contain at least {PASSWORD_MIN_CHARS} characters."),
            );
        }
        if self.password != self.password_confirm {
            errors.add("password_confirm", "The two password fields didn't match.");
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Only same-site absolute paths are accepted as post-login targets.
/// Browsers drop tab and newline characters from URLs, so `/\t/host` would
/// become `//host`; any control character sends the user home instead.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control) =>
        {
            path
        }
        _ => "/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(username: &str, password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            username: username.into(),
            password: password.into(),
            password_confirm: confirm.into(),
        }
    }

    #[test]
    fn register_accepts_well_formed_input() {
        assert!(register("alice", "correct horse", "correct horse").validate().is_ok());
    }

    #[test]
    fn register_rejects_bad_usernames() {
        for name in ["", "ab", &"x".repeat(33), "bad name", "semi;colon"] {
            let errors = register(name, "password1", "password1").validate().unwrap_err();
            assert_eq!(errors.for_field("username").len(), 1, "username {name:?}");
        }
    }

    #[test]
    fn register_checks_password_length_and_confirmation() {
        let errors = register("alice", "short", "other").validate().unwrap_err();
        assert_eq!(errors.for_field("password").len(), 1);
        assert_eq!(errors.for_field("password_confirm").len(), 1);
    }

    #[test]
    fn next_must_be_a_local_path() {
        assert_eq!(safe_next(Some("/new_post/")), "/new_post/");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example/")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(Some("/\t/evil.example")), "/");
        assert_eq!(safe_next(Some("/\r\n/evil.example")), "/");
        assert_eq!(safe_next(Some("/%09/encoded-stays-literal")), "/%09/encoded-stays-literal");
        assert_eq!(safe_next(None), "/");
    }
}
