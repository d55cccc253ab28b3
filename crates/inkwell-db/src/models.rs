//! Database row types: these map directly to SQLite rows.
//! Conversion into the inkwell-types models happens here so callers never
//! see raw TEXT columns.
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use inkwell_types::models::{Comment, Post};

/// Fixed-width UTC format: lexicographic order on the column equals
/// chronological order.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') has no timezone suffix.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .ok()
}

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
}

pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub created_at: String,
    pub owner_id: Option<String>,
    pub owner_username: Option<String>,
}

pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub text: String,
    pub created_at: String,
    pub owner_id: Option<String>,
    pub owner_username: Option<String>,
}

fn parse_owner(raw: Option<String>, table: &str, id: i64) -> Option<Uuid> {
    let raw = raw?;
    match raw.parse() {
        Ok(uid) => Some(uid),
        Err(e) => {
            warn!("Corrupt owner_id '{}' on {} {}: {}", raw, table, id, e);
            None
        }
    }
}

fn parse_created_at(raw: &str, table: &str, id: i64) -> DateTime<Utc> {
    parse_timestamp(raw).unwrap_or_else(|| {
        warn!("Corrupt created_at '{}' on {} {}", raw, table, id);
        DateTime::default()
    })
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            created_at: parse_created_at(&row.created_at, "post", row.id),
            owner_id: parse_owner(row.owner_id, "post", row.id),
            owner_username: row.owner_username,
            title: row.title,
            text: row.text,
        }
    }
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            post_id: row.post_id,
            created_at: parse_created_at(&row.created_at, "comment", row.id),
            owner_id: parse_owner(row.owner_id, "comment", row.id),
            owner_username: row.owner_username,
            text: row.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formatted_timestamps_sort_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2024, 9, 1, 9, 5, 0).unwrap();
        let later = earlier + chrono::Duration::microseconds(1);
        assert!(format_timestamp(earlier) < format_timestamp(later));
        assert_eq!(parse_timestamp(&format_timestamp(later)), Some(later));
    }

    #[test]
    fn parses_sqlite_default_format() {
        let parsed = parse_timestamp("2024-09-01 09:05:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 9, 1, 9, 5, 0).unwrap());
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn corrupt_owner_becomes_ownerless() {
        let row = PostRow {
            id: 7,
            title: "t".into(),
            text: "x".into(),
            created_at: "2024-09-01 09:05:00".into(),
            owner_id: Some("not-a-uuid".into()),
            owner_username: None,
        };
        let post = Post::from(row);
        assert_eq!(post.owner_id, None);
        assert_eq!(post.title, "t");
    }
}
