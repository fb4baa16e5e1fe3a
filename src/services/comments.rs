// src/services/comments.rs

//! Per-degree moderated comments.

use std::sync::Arc;

use crate::backend::{CatalogBackend, Direction, Query};
use crate::error::Result;
use crate::models::{Comment, CommentForm};

pub const DEGREE_COMMENTS: &str = "degree_comments";

/// Shown after a successful submission.
pub const PENDING_MODERATION_NOTICE: &str =
    "Your comment has been submitted for review and will appear once approved.";

/// Reads approved comments and submits new ones for moderation.
#[derive(Clone)]
pub struct CommentService {
    backend: Arc<dyn CatalogBackend>,
}

impl CommentService {
    pub fn new(backend: Arc<dyn CatalogBackend>) -> Self {
        Self { backend }
    }

    /// Approved comments for a degree, newest first. Fail-soft.
    pub async fn list(&self, degree_id: &str) -> Vec<Comment> {
        let query = Query::table(DEGREE_COMMENTS)
            .eq("degree_id", degree_id)
            .eq("is_approved", true)
            .order_by("created_at", Direction::Descending);

        match self.backend.select(&query).await {
            Ok(rows) => rows
                .into_iter()
                .filter_map(|row| match serde_json::from_value(row) {
                    Ok(comment) => Some(comment),
                    Err(e) => {
                        log::warn!("Skipping unreadable comment for degree {degree_id}: {e}");
                        None
                    }
                })
                .collect(),
            Err(e) => {
                log::warn!("Failed to fetch comments for degree {degree_id}: {e}");
                Vec::new()
            }
        }
    }

    /// Submit the form as a pending comment on `degree_id`.
    ///
    /// Validation happens before any request is made. On success the form
    /// is cleared; on any failure it is left untouched so the user can
    /// retry. The new comment is not added to any listing: it stays hidden
    /// until approved.
    pub async fn submit(&self, degree_id: &str, form: &mut CommentForm) -> Result<()> {
        let row = form.to_new_comment(degree_id)?;

        if let Err(e) = self
            .backend
            .insert(DEGREE_COMMENTS, serde_json::to_value(&row)?)
            .await
        {
            log::error!("Error submitting comment for degree {degree_id}: {e}");
            return Err(e);
        }

        log::info!("Comment by {} submitted for moderation", row.user_name);
        form.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::backend::MemoryBackend;
    use crate::error::AppError;

    fn comment_rows() -> Vec<serde_json::Value> {
        vec![
            json!({"id": "c1", "degree_id": "d1", "user_name": "Ravi", "comment_text": "Old", "is_approved": true, "created_at": "2024-01-01T00:00:00Z"}),
            json!({"id": "c2", "degree_id": "d1", "user_name": "Mina", "comment_text": "New", "is_approved": true, "created_at": "2024-02-01T00:00:00Z"}),
            json!({"id": "c3", "degree_id": "d1", "user_name": "Spam", "comment_text": "Hidden", "is_approved": false, "created_at": "2024-03-01T00:00:00Z"}),
            json!({"id": "c4", "degree_id": "d2", "user_name": "Elsewhere", "comment_text": "Other", "is_approved": true, "created_at": "2024-03-01T00:00:00Z"}),
        ]
    }

    fn service() -> (Arc<MemoryBackend>, CommentService) {
        let backend = Arc::new(MemoryBackend::new().with_table(DEGREE_COMMENTS, comment_rows()));
        (backend.clone(), CommentService::new(backend))
    }

    #[tokio::test]
    async fn test_lists_only_approved_newest_first() {
        let (_, comments) = service();
        let ids: Vec<_> = comments.list("d1").await.into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["c2", "c1"]);
    }

    #[tokio::test]
    async fn test_empty_name_rejected_without_request() {
        let (backend, comments) = service();
        let mut form = CommentForm::new("", "", "Very useful");

        let result = comments.submit("d1", &mut form).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(backend.inserts().await.is_empty());
        assert_eq!(form, CommentForm::new("", "", "Very useful"));
    }

    #[tokio::test]
    async fn test_submission_is_pending_and_not_listed() {
        let (backend, comments) = service();
        let before = comments.list("d1").await;
        let mut form = CommentForm::new("Asha", "", "Thanks for the papers");

        comments.submit("d1", &mut form).await.unwrap();

        let inserts = backend.inserts().await;
        assert_eq!(inserts.len(), 1);
        let (table, row) = &inserts[0];
        assert_eq!(table, DEGREE_COMMENTS);
        assert!(row.get("is_approved").is_none());
        assert_eq!(row["user_email"], serde_json::Value::Null);
        assert!(form.is_empty());
        assert_eq!(comments.list("d1").await, before);
    }

    #[tokio::test]
    async fn test_failed_insert_keeps_form() {
        let (backend, comments) = service();
        backend.set_failing(true);
        let mut form = CommentForm::new("Asha", "a@example.com", "Retry me");

        assert!(comments.submit("d1", &mut form).await.is_err());
        assert_eq!(form, CommentForm::new("Asha", "a@example.com", "Retry me"));
    }

    #[tokio::test]
    async fn test_unreadable_rows_are_skipped() {
        let mut rows = comment_rows();
        rows.push(json!({"id": "c5", "degree_id": "d1", "is_approved": true, "created_at": "2024-04-01T00:00:00Z"}));
        let comments = CommentService::new(Arc::new(MemoryBackend::new().with_table(DEGREE_COMMENTS, rows)));

        let ids: Vec<_> = comments.list("d1").await.into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["c2", "c1"]);
    }

    #[tokio::test]
    async fn test_list_failure_is_empty() {
        let (backend, comments) = service();
        backend.set_failing(true);
        assert!(comments.list("d1").await.is_empty());
    }
}
