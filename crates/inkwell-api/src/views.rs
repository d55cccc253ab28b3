//! Page templates. Each struct is compiled against a file under
//! `templates/`; handlers fill them in and hand them to [`render`].

use askama::Template;
use axum::response::Html;
use uuid::Uuid;

use inkwell_types::api::RegisterForm;
use inkwell_types::forms::{CommentForm, FieldErrors, PostForm};
use inkwell_types::models::{Comment, Post};

use crate::error::ApiError;
use crate::middleware::{Identity, Viewer};

const DATE_FORMAT: &str = "%b %-d, %Y %H:%M";

pub fn render<T: Template>(page: &T) -> Result<Html<String>, ApiError> {
    Ok(Html(page.render()?))
}

/// Navigation bar state shared by every page.
pub struct Nav {
    pub signed_in: bool,
    pub username: String,
}

impl From<&Viewer> for Nav {
    fn from(viewer: &Viewer) -> Self {
        match &viewer.0 {
            Some(identity) => Nav::from(identity),
            None => Nav {
                signed_in: false,
                username: String::new(),
            },
        }
    }
}

impl From<&Identity> for Nav {
    fn from(identity: &Identity) -> Self {
        Nav {
            signed_in: true,
            username: identity.username.clone(),
        }
    }
}

fn owned_by(owner: Option<Uuid>, viewer: Option<Uuid>) -> bool {
    matches!((owner, viewer), (Some(o), Some(v)) if o == v)
}

pub struct PostItem {
    pub post: Post,
    pub date_added: String,
    pub can_manage: bool,
}

impl PostItem {
    pub fn new(post: Post, viewer: Option<Uuid>) -> Self {
        Self {
            date_added: post.created_at.format(DATE_FORMAT).to_string(),
            can_manage: owned_by(post.owner_id, viewer),
            post,
        }
    }
}

pub struct CommentItem {
    pub comment: Comment,
    pub date_added: String,
    pub can_manage: bool,
}

impl CommentItem {
    pub fn new(comment: Comment, viewer: Option<Uuid>) -> Self {
        Self {
            date_added: comment.created_at.format(DATE_FORMAT).to_string(),
            can_manage: owned_by(comment.owner_id, viewer),
            comment,
        }
    }
}

// -- Posts --

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub nav: Nav,
    pub posts: Vec<PostItem>,
}

#[derive(Template)]
#[template(path = "new_post.html")]
pub struct NewPostTemplate {
    pub nav: Nav,
    pub title: String,
    pub text: String,
    pub title_errors: Vec<String>,
    pub text_errors: Vec<String>,
}

impl NewPostTemplate {
    pub fn new(nav: Nav, form: &PostForm, errors: &FieldErrors) -> Self {
        Self {
            nav,
            title: form.title.clone(),
            text: form.text.clone(),
            title_errors: errors.for_field("title"),
            text_errors: errors.for_field("text"),
        }
    }
}

#[derive(Template)]
#[template(path = "edit_post.html")]
pub struct EditPostTemplate {
    pub nav: Nav,
    pub post: Post,
    pub title: String,
    pub text: String,
    pub title_errors: Vec<String>,
    pub text_errors: Vec<String>,
}

impl EditPostTemplate {
    /// Pre-filled with the stored post.
    pub fn prefilled(nav: Nav, post: Post) -> Self {
        Self {
            nav,
            title: post.title.clone(),
            text: post.text.clone(),
            title_errors: Vec::new(),
            text_errors: Vec::new(),
            post,
        }
    }

    /// Re-displays a rejected submission.
    pub fn rejected(nav: Nav, post: Post, form: &PostForm, errors: &FieldErrors) -> Self {
        Self {
            nav,
            post,
            title: form.title.clone(),
            text: form.text.clone(),
            title_errors: errors.for_field("title"),
            text_errors: errors.for_field("text"),
        }
    }
}

#[derive(Template)]
#[template(path = "delete_post.html")]
pub struct DeletePostTemplate {
    pub nav: Nav,
    pub post: Post,
}

// -- Comments --

#[derive(Template)]
#[template(path = "comments.html")]
pub struct CommentsTemplate {
    pub nav: Nav,
    pub post: PostItem,
    pub comments: Vec<CommentItem>,
}

#[derive(Template)]
#[template(path = "add_comment.html")]
pub struct AddCommentTemplate {
    pub nav: Nav,
    pub post: Post,
    pub text: String,
    pub text_errors: Vec<String>,
}

impl AddCommentTemplate {
    pub fn new(nav: Nav, post: Post, form: &CommentForm, errors: &FieldErrors) -> Self {
        Self {
            nav,
            post,
            text: form.text.clone(),
            text_errors: errors.for_field("text"),
        }
    }
}

#[derive(Template)]
#[template(path = "delete_comment.html")]
pub struct DeleteCommentTemplate {
    pub nav: Nav,
    pub post: Post,
    pub comment: Comment,
}

// -- Accounts --

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub nav: Nav,
    pub username: String,
    pub username_errors: Vec<String>,
    pub password_errors: Vec<String>,
    pub password_confirm_errors: Vec<String>,
}

impl RegisterTemplate {
    /// Passwords are never echoed back into the form.
    pub fn new(nav: Nav, form: &RegisterForm, errors: &FieldErrors) -> Self {
        Self {
            nav,
            username: form.username.clone(),
            username_errors: errors.for_field("username"),
            password_errors: errors.for_field("password"),
            password_confirm_errors: errors.for_field("password_confirm"),
        }
    }
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub username: String,
    pub next: String,
    pub errors: Vec<String>,
}

impl LoginTemplate {
    pub fn new(nav: Nav, username: &str, next: String, error: Option<&str>) -> Self {
        Self {
            nav,
            username: username.to_string(),
            next,
            errors: error.map(str::to_string).into_iter().collect(),
        }
    }
}

// -- Errors --

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate;

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post(owner: Option<Uuid>) -> Post {
        Post {
            id: 5,
            title: "<b>Hello</b>".into(),
            text: "World".into(),
            created_at: Utc::now(),
            owner_id: owner,
            owner_username: owner.map(|_| "alice".to_string()),
        }
    }

    #[test]
    fn manage_links_only_for_owner() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        assert!(PostItem::new(post(Some(alice)), Some(alice)).can_manage);
        assert!(!PostItem::new(post(Some(alice)), Some(bob)).can_manage);
        assert!(!PostItem::new(post(Some(alice)), None).can_manage);
        assert!(!PostItem::new(post(None), Some(bob)).can_manage);
    }

    #[test]
    fn index_escapes_user_content() {
        let page = IndexTemplate {
            nav: Nav::from(&Viewer::default()),
            posts: vec![PostItem::new(post(None), None)],
        };
        let html = page.render().unwrap();
        assert!(html.contains("&lt;b&gt;Hello"));
        assert!(!html.contains("<b>Hello</b>"));
        assert!(html.contains("anonymous"));
    }

    #[test]
    fn new_post_shows_field_errors() {
        let form = PostForm::default();
        let errors = form.validate().unwrap_err();
        let html = NewPostTemplate::new(Nav::from(&Viewer::default()), &form, &errors)
            .render()
            .unwrap();
        assert!(html.contains("This field is required."));
    }
}
