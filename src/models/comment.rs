//! Moderated degree comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A comment row as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub degree_id: String,
    pub user_name: String,
    #[serde(default)]
    pub user_email: Option<String>,
    pub comment_text: String,
    #[serde(default)]
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

/// Row sent on submission.
///
/// Carries no `is_approved` field, so the backend default (unapproved)
/// applies to every inserted comment.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewComment {
    pub degree_id: String,
    pub user_name: String,
    pub user_email: Option<String>,
    pub comment_text: String,
}

/// Editable comment form state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentForm {
    pub name: String,
    pub email: String,
    pub text: String,
}

impl CommentForm {
    pub fn new(name: impl Into<String>, email: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            text: text.into(),
        }
    }

    /// Check required fields and build the row to insert.
    ///
    /// Name and text must be non-empty after trimming; a blank email is
    /// sent as `null`.
    pub fn to_new_comment(&self, degree_id: &str) -> Result<NewComment> {
        let name = self.name.trim();
        let text = self.text.trim();
        if name.is_empty() || text.is_empty() {
            return Err(AppError::validation("Please fill in all required fields"));
        }
        let email = self.email.trim();

        Ok(NewComment {
            degree_id: degree_id.to_string(),
            user_name: name.to_string(),
            user_email: (!email.is_empty()).then(|| email.to_string()),
            comment_text: text.to_string(),
        })
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.email.is_empty() && self.text.is_empty()
    }
}
