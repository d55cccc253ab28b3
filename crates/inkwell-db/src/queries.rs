use crate::models::{CommentRow, PostRow, UserRow, format_timestamp};
use crate::Database;
use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, Row};
use tracing::debug;
use uuid::Uuid;

use inkwell_types::forms::{ValidComment, ValidPost};
use inkwell_types::models::{Comment, CommentId, Post, PostId};

const POST_COLUMNS: &str =
    "p.id, p.title, p.text, p.created_at, p.owner_id, u.username";
const COMMENT_COLUMNS: &str =
    "c.id, c.post_id, c.text, c.created_at, c.owner_id, u.username";

impl Database {
    // -- Users --

    /// Returns `false` when the username is already taken.
    pub fn create_user(&self, id: &Uuid, username: &str, password_hash: &str) -> Result<bool> {
        let now = format_timestamp(Utc::now());
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, username, password, created_at) VALUES (?1, ?2, ?3, ?4)",
                (id.to_string(), username, password_hash, now),
            );
            match inserted {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    debug!("Username '{}' already taken", username);
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    // -- Posts --

    /// All posts, newest first. Posts created within the same microsecond
    /// fall back to insertion order, newest first.
    pub fn list_posts(&self) -> Result<Vec<Post>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {POST_COLUMNS}
                 FROM posts p
                 LEFT JOIN users u ON p.owner_id = u.id
                 ORDER BY p.created_at DESC, p.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], post_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(Post::from).collect())
        })
    }

    pub fn get_post(&self, id: PostId) -> Result<Option<Post>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {POST_COLUMNS}
                 FROM posts p
                 LEFT JOIN users u ON p.owner_id = u.id
                 WHERE p.id = ?1"
            );
            let row = conn.query_row(&sql, [id], post_row).optional()?;
            Ok(row.map(Post::from))
        })
    }

    /// Insert a post owned by `owner`. The creation time is taken here and
    /// never written again.
    pub fn create_post(&self, owner: &Uuid, post: &ValidPost) -> Result<PostId> {
        let now = format_timestamp(Utc::now());
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (title, text, created_at, owner_id) VALUES (?1, ?2, ?3, ?4)",
                (&post.title, &post.text, now, owner.to_string()),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Replace title and text. Returns false when no post has this id.
    pub fn update_post(&self, id: PostId, post: &ValidPost) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE posts SET title = ?1, text = ?2 WHERE id = ?3",
                (&post.title, &post.text, id),
            )?;
            Ok(changed > 0)
        })
    }

    /// Delete a post together with every comment on it, atomically.
    /// Returns the number of comments removed, or `None` if the post did
    /// not exist (in which case nothing is touched).
    pub fn delete_post(&self, id: PostId) -> Result<Option<usize>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let comments = tx.execute("DELETE FROM comments WHERE post_id = ?1", [id])?;
            let posts = tx.execute("DELETE FROM posts WHERE id = ?1", [id])?;
            if posts == 0 {
                // Dropping the transaction rolls it back.
                return Ok(None);
            }
            tx.commit()?;
            debug!("Post {} deleted with {} comments", id, comments);
            Ok(Some(comments))
        })
    }

    // -- Comments --

    /// Comments on one post, newest first.
    pub fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {COMMENT_COLUMNS}
                 FROM comments c
                 LEFT JOIN users u ON c.owner_id = u.id
                 WHERE c.post_id = ?1
                 ORDER BY c.created_at DESC, c.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([post_id], comment_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(Comment::from).collect())
        })
    }

    pub fn get_comment(&self, id: CommentId) -> Result<Option<Comment>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {COMMENT_COLUMNS}
                 FROM comments c
                 LEFT JOIN users u ON c.owner_id = u.id
                 WHERE c.id = ?1"
            );
            let row = conn.query_row(&sql, [id], comment_row).optional()?;
            Ok(row.map(Comment::from))
        })
    }

    /// Attach a comment to `post_id`. Fails if the post does not exist.
    pub fn create_comment(
        &self,
        post_id: PostId,
        owner: &Uuid,
        comment: &ValidComment,
    ) -> Result<CommentId> {
        let now = format_timestamp(Utc::now());
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (post_id, text, created_at, owner_id) VALUES (?1, ?2, ?3, ?4)",
                (post_id, &comment.text, now, owner.to_string()),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn delete_comment(&self, id: CommentId) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM comments WHERE id = ?1", [id])?;
            Ok(removed > 0)
        })
    }
}

fn post_row(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        title: row.get(1)?,
        text: row.get(2)?,
        created_at: row.get(3)?,
        owner_id: row.get(4)?,
        owner_username: row.get(5)?,
    })
}

fn comment_row(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        text: row.get(2)?,
        created_at: row.get(3)?,
        owner_id: row.get(4)?,
        owner_username: row.get(5)?,
    })
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password FROM users WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with_users() -> (Database, Uuid, Uuid) {
        let db = Database::open_in_memory().unwrap();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        db.create_user(&alice, "alice", "hash").unwrap();
        db.create_user(&bob, "bob", "hash").unwrap();
        (db, alice, bob)
    }

    fn post(title: &str, text: &str) -> ValidPost {
        ValidPost {
            title: title.into(),
            text: text.into(),
        }
    }

    fn comment(text: &str) -> ValidComment {
        ValidComment { text: text.into() }
    }

    #[test]
    fn create_then_get_post() {
        let (db, alice, _) = db_with_users();
        let id = db.create_post(&alice, &post("Hello", "World")).unwrap();

        let fetched = db.get_post(id).unwrap().unwrap();
        assert_eq!(fetched.title, "Hello");
        assert_eq!(fetched.text, "World");
        assert_eq!(fetched.owner_id, Some(alice));
        assert_eq!(fetched.owner_username.as_deref(), Some("alice"));
    }

    #[test]
    fn missing_rows_are_none() {
        let (db, _, _) = db_with_users();
        assert!(db.get_post(42).unwrap().is_none());
        assert!(db.get_comment(42).unwrap().is_none());
        assert!(!db.update_post(42, &post("a", "b")).unwrap());
        assert_eq!(db.delete_post(42).unwrap(), None);
        assert!(!db.delete_comment(42).unwrap());
    }

    #[test]
    fn posts_are_listed_newest_first() {
        let (db, alice, bob) = db_with_users();
        let first = db.create_post(&alice, &post("first", "1")).unwrap();
        let second = db.create_post(&bob, &post("second", "2")).unwrap();
        let third = db.create_post(&alice, &post("third", "3")).unwrap();

        let posts = db.list_posts().unwrap();
        let ids: Vec<_> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![third, second, first]);
        assert!(posts.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[test]
    fn update_keeps_owner_and_timestamp() {
        let (db, alice, _) = db_with_users();
        let id = db.create_post(&alice, &post("Hello", "World")).unwrap();
        let before = db.get_post(id).unwrap().unwrap();

        assert!(db.update_post(id, &post("Hello2", "World")).unwrap());

        let after = db.get_post(id).unwrap().unwrap();
        assert_eq!(after.title, "Hello2");
        assert_eq!(after.owner_id, before.owner_id);
        assert_eq!(after.created_at, before.created_at);
    }

    #[test]
    fn deleting_a_post_cascades_to_its_comments_only() {
        let (db, alice, bob) = db_with_users();
        let doomed = db.create_post(&alice, &post("doomed", "x")).unwrap();
        let kept = db.create_post(&alice, &post("kept", "y")).unwrap();

        let c1 = db.create_comment(doomed, &alice, &comment("one")).unwrap();
        let c2 = db.create_comment(doomed, &bob, &comment("two")).unwrap();
        let survivor = db.create_comment(kept, &bob, &comment("three")).unwrap();

        assert_eq!(db.delete_post(doomed).unwrap(), Some(2));

        assert!(db.get_post(doomed).unwrap().is_none());
        assert!(db.list_comments(doomed).unwrap().is_empty());
        assert!(db.get_comment(c1).unwrap().is_none());
        assert!(db.get_comment(c2).unwrap().is_none());
        assert_eq!(db.list_comments(kept).unwrap().len(), 1);
        assert!(db.get_comment(survivor).unwrap().is_some());
    }

    #[test]
    fn comments_are_scoped_to_their_post_and_newest_first() {
        let (db, alice, bob) = db_with_users();
        let p = db.create_post(&alice, &post("p", "x")).unwrap();
        let other = db.create_post(&alice, &post("other", "y")).unwrap();

        let older = db.create_comment(p, &bob, &comment("older")).unwrap();
        db.create_comment(other, &bob, &comment("elsewhere")).unwrap();
        let newer = db.create_comment(p, &alice, &comment("newer")).unwrap();

        let listed = db.list_comments(p).unwrap();
        let ids: Vec<_> = listed.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![newer, older]);
        assert_eq!(listed[0].owner_username.as_deref(), Some("alice"));
        assert!(listed.iter().all(|c| c.post_id == p));
    }

    #[test]
    fn comment_on_missing_post_is_rejected() {
        let (db, alice, _) = db_with_users();
        assert!(db.create_comment(999, &alice, &comment("orphan")).is_err());
    }

    #[test]
    fn delete_comment_removes_only_that_comment() {
        let (db, alice, _) = db_with_users();
        let p = db.create_post(&alice, &post("p", "x")).unwrap();
        let a = db.create_comment(p, &alice, &comment("a")).unwrap();
        let b = db.create_comment(p, &alice, &comment("b")).unwrap();

        assert!(db.delete_comment(a).unwrap());

        let ids: Vec<_> = db.list_comments(p).unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![b]);
    }

    #[test]
    fn usernames_are_unique() {
        let (db, _, _) = db_with_users();
        assert!(!db.create_user(&Uuid::new_v4(), "alice", "hash").unwrap());
        let row = db.get_user_by_username("bob").unwrap().unwrap();
        assert_eq!(row.username, "bob");
        assert!(db.get_user_by_username("carol").unwrap().is_none());
    }
}
