use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub type PostId = i64;
pub type CommentId = i64;

/// A blog post. `owner_id` is `None` only for rows whose owner was never
/// recorded; such posts cannot be edited or deleted by anyone.
#[derive(Debug, Clone)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub owner_id: Option<Uuid>,
    pub owner_username: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub owner_id: Option<Uuid>,
    pub owner_username: Option<String>,
}

impl Post {
    pub fn author(&self) -> &str {
        self.owner_username.as_deref().unwrap_or("anonymous")
    }
}

impl Comment {
    pub fn author(&self) -> &str {
        self.owner_username.as_deref().unwrap_or("anonymous")
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Comments display as a 100-character preview of their text.
impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text.char_indices().nth(100) {
            Some((cut, _)) => f.write_str(&self.text[..cut]),
            None => f.write_str(&self.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(text: &str) -> Comment {
        Comment {
            id: 1,
            post_id: 1,
            text: text.to_string(),
            created_at: Utc::now(),
            owner_id: None,
            owner_username: None,
        }
    }

    #[test]
    fn comment_display_is_truncated_to_100_chars() {
        let long = "é".repeat(150);
        let shown = comment(&long).to_string();
        assert_eq!(shown.chars().count(), 100);

        assert_eq!(comment("short").to_string(), "short");
    }

    #[test]
    fn ownerless_rows_show_anonymous_author() {
        let c = comment("hi");
        assert_eq!(c.author(), "anonymous");
    }
}
