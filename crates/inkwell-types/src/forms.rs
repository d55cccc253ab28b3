//! Submitted form payloads and their validation.
//!
//! Every field is optional at the deserialization layer so that a missing
//! field surfaces as a "required" error on the re-rendered form instead of a
//! rejected request.

use serde::Deserialize;

pub const TITLE_MAX_CHARS: usize = 200;
pub const POST_TEXT_MAX_CHARS: usize = 2500;
pub const COMMENT_TEXT_MAX_CHARS: usize = 1000;

const REQUIRED: &str = "This field is required.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Errors collected while validating one form, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Messages attached to `field`, in the order they were added.
    pub fn for_field(&self, field: &str) -> Vec<String> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.clone())
            .collect()
    }

    fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Strip surrounding whitespace, then enforce presence and a maximum length
/// counted in characters.
fn clean_text(
    errors: &mut FieldErrors,
    field: &'static str,
    raw: &str,
    max_chars: usize,
) -> String {
    let value = raw.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
        return String::new();
    }

    let count = value.chars().count();
    if count > max_chars {
        errors.add(
            field,
            format!("Ensure this value has at most {max_chars} characters (it has {count})."),
        );
    }
    value.to_string()
}

// -- Posts --

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
}

/// A post payload that passed validation. Fields are already trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPost {
    pub title: String,
    pub text: String,
}

impl PostForm {
    pub fn validate(&self) -> Result<ValidPost, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = clean_text(&mut errors, "title", &self.title, TITLE_MAX_CHARS);
        let text = clean_text(&mut errors, "text", &self.text, POST_TEXT_MAX_CHARS);
        errors.into_result(ValidPost { title, text })
    }
}

// -- Comments --

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidComment {
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<ValidComment, FieldErrors> {
        let mut errors = FieldErrors::new();
        let text = clean_text(&mut errors, "text", &self.text, COMMENT_TEXT_MAX_CHARS);
        errors.into_result(ValidComment { text })
    }
}

// -- Delete confirmations --

/// Body of the delete-post confirmation. The button is named `delete`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeletePostConfirmation {
    pub delete: Option<String>,
}

impl DeletePostConfirmation {
    pub fn confirmed(&self) -> bool {
        self.delete.as_deref().is_some_and(|v| !v.is_empty())
    }
}

/// Body of the delete-comment confirmation. The button is named `submit`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteCommentConfirmation {
    pub submit: Option<String>,
}

impl DeleteCommentConfirmation {
    pub fn confirmed(&self) -> bool {
        self.submit.as_deref().is_some_and(|v| !v.is_empty())
    }
}
