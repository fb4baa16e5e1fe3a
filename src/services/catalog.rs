// src/services/catalog.rs

//! Catalog read operations.
//!
//! Every listing is fail-soft: a backend error or an unreadable row is
//! logged and the caller gets whatever could be read (usually nothing),
//! never an error. Navigation state is therefore never disturbed by an
//! outage.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::json;

use crate::backend::{CatalogBackend, Direction, INCREMENT_DOWNLOAD_COUNT, Query};
use crate::error::Result;
use crate::models::{BackendConfig, Degree, Resource, SearchConfig, Semester, Subject, University};
use crate::navigation::FetchScope;
use crate::services::search::SEARCH_COLUMNS;
use crate::utils::url::is_absolute;

pub const UNIVERSITIES: &str = "universities";
pub const DEGREES: &str = "degrees";
pub const SEMESTERS: &str = "semesters";
pub const SUBJECTS: &str = "subjects";

/// Rows fetched for one view.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Listing {
    #[default]
    Empty,
    Universities(Vec<University>),
    Degrees(Vec<Degree>),
    Semesters(Vec<Semester>),
    Subjects(Vec<Subject>),
    Resources(Vec<Resource>),
}

impl Listing {
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Universities(rows) => rows.len(),
            Self::Degrees(rows) => rows.len(),
            Self::Semesters(rows) => rows.len(),
            Self::Subjects(rows) => rows.len(),
            Self::Resources(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scoped, read-only access to the catalog.
#[derive(Clone)]
pub struct CatalogClient {
    backend: Arc<dyn CatalogBackend>,
    resource_table: String,
    storage_bucket: String,
    recent_limit: usize,
    search_limit: usize,
}

impl CatalogClient {
    pub fn new(backend: Arc<dyn CatalogBackend>, backend_config: &BackendConfig, search: &SearchConfig) -> Self {
        Self {
            backend,
            resource_table: backend_config.resource_table.clone(),
            storage_bucket: backend_config.storage_bucket.clone(),
            recent_limit: search.recent_limit,
            search_limit: search.search_limit,
        }
    }

    /// Run the fetch a navigation transition asked for.
    ///
    /// `search` only affects the home listing.
    pub async fn fetch(&self, scope: &FetchScope, search: Option<&str>) -> Listing {
        match scope {
            FetchScope::RecentResources => Listing::Resources(self.list_recent_resources(search).await),
            FetchScope::Universities => Listing::Universities(self.list_universities().await),
            FetchScope::Degrees { university_id } => {
                Listing::Degrees(self.list_degrees(university_id.as_deref()).await)
            }
            FetchScope::Semesters { degree_id } => Listing::Semesters(self.list_semesters(degree_id).await),
            FetchScope::Subjects { semester_id } => Listing::Subjects(self.list_subjects(semester_id).await),
            FetchScope::Resources { subject_id } => {
                Listing::Resources(self.list_subject_resources(subject_id).await)
            }
        }
    }

    /// Active universities by name.
    pub async fn list_universities(&self) -> Vec<University> {
        let query = Query::table(UNIVERSITIES)
            .eq("is_active", true)
            .order_by("name", Direction::Ascending);
        self.fetch_rows("list universities", &query).await
    }

    /// Active degrees by name, optionally limited to one university.
    pub async fn list_degrees(&self, university_id: Option<&str>) -> Vec<Degree> {
        let mut query = Query::table(DEGREES).eq("is_active", true);
        if let Some(id) = university_id {
            query = query.eq("university_id", id);
        }
        let query = query.order_by("name", Direction::Ascending);
        self.fetch_rows("list degrees", &query).await
    }

    /// Active semesters of a degree by semester number.
    pub async fn list_semesters(&self, degree_id: &str) -> Vec<Semester> {
        let query = Query::table(SEMESTERS)
            .eq("degree_id", degree_id)
            .eq("is_active", true)
            .order_by("semester_number", Direction::Ascending);
        self.fetch_rows("list semesters", &query).await
    }

    /// Active subjects of a semester by name.
    pub async fn list_subjects(&self, semester_id: &str) -> Vec<Subject> {
        let query = Query::table(SUBJECTS)
            .eq("semester_id", semester_id)
            .eq("is_active", true)
            .order_by("name", Direction::Ascending);
        self.fetch_rows("list subjects", &query).await
    }

    /// Published resources of a subject, newest first.
    pub async fn list_subject_resources(&self, subject_id: &str) -> Vec<Resource> {
        let query = Query::table(&self.resource_table)
            .eq("subject_id", subject_id)
            .eq("is_published", true)
            .order_by("created_at", Direction::Descending);
        self.fetch_rows("list subject resources", &query).await
    }

    /// Home listing: featured resources, or search results when `search`
    /// holds a non-blank term. The two predicates are never combined.
    pub async fn list_recent_resources(&self, search: Option<&str>) -> Vec<Resource> {
        let term = search.map(str::trim).filter(|t| !t.is_empty());
        let query = Query::table(&self.resource_table).eq("is_published", true);
        let query = match term {
            Some(term) => query
                .contains_any(&SEARCH_COLUMNS, term)
                .limit(self.search_limit),
            None => query.eq("show_in_recent", true).limit(self.recent_limit),
        }
        .order_by("created_at", Direction::Descending);
        self.fetch_rows("list recent resources", &query).await
    }

    /// Bump a resource's download counter.
    pub async fn increment_download_count(&self, resource_id: i64) -> Result<()> {
        self.backend
            .rpc(INCREMENT_DOWNLOAD_COUNT, json!({ "resource_id": resource_id }))
            .await
    }

    /// Absolute URL for a stored file path; absolute URLs pass through.
    pub fn resolve_download_url(&self, file_path: &str) -> Result<String> {
        if is_absolute(file_path) {
            return Ok(file_path.to_string());
        }
        self.backend.public_url(&self.storage_bucket, file_path)
    }

    async fn fetch_rows<T: DeserializeOwned>(&self, operation: &str, query: &Query) -> Vec<T> {
        let rows = match self.backend.select(query).await {
            Ok(rows) => rows,
            Err(e) => {
                log::warn!("Failed to {operation}: {e}");
                return Vec::new();
            }
        };

        let total = rows.len();
        let parsed: Vec<T> = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value(row) {
                Ok(value) => Some(value),
                Err(e) => {
                    log::warn!("Skipping unreadable row in {operation}: {e}");
                    None
                }
            })
            .collect();

        log::debug!("{operation}: {} of {total} rows", parsed.len());
        parsed
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::backend::MemoryBackend;

    const TABLE: &str = "Exam-prep";

    fn resource_rows() -> Vec<Value> {
        vec![
            json!({"id": 1, "title": "Calculus II Finals", "resource_type": "question_paper", "is_published": true, "show_in_recent": false, "subject_id": "x1", "download_count": 5, "created_at": "2024-03-01T00:00:00Z"}),
            json!({"id": 2, "title": "Physics Midterm", "resource_type": "notes", "is_published": true, "show_in_recent": true, "subject_id": "x1", "download_count": 0, "created_at": "2024-03-02T00:00:00Z"}),
            json!({"id": 3, "title": "Draft calculus notes", "resource_type": "notes", "is_published": false, "show_in_recent": true, "subject_id": "x1", "created_at": "2024-03-03T00:00:00Z"}),
            json!({"id": 4, "title": "Linear Algebra", "description": "Covers CALCULUS prerequisites", "is_published": true, "show_in_recent": true, "subject_id": "x2", "created_at": "2024-03-04T00:00:00Z"}),
        ]
    }

    fn client_with(backend: MemoryBackend) -> (Arc<MemoryBackend>, CatalogClient) {
        let backend = Arc::new(backend);
        let client = CatalogClient::new(
            backend.clone(),
            &BackendConfig::default(),
            &SearchConfig::default(),
        );
        (backend, client)
    }

    fn ids(resources: &[Resource]) -> Vec<i64> {
        resources.iter().map(|r| r.id).collect()
    }

    #[tokio::test]
    async fn test_search_matches_title_only_for_calculus() {
        let rows = vec![
            json!({"id": 1, "title": "Calculus II Finals", "is_published": true}),
            json!({"id": 2, "title": "Physics Midterm", "is_published": true}),
        ];
        let (_, client) = client_with(MemoryBackend::new().with_table(TABLE, rows));
        let found = client.list_recent_resources(Some("calculus")).await;
        assert_eq!(ids(&found), vec![1]);
    }

    #[tokio::test]
    async fn test_search_spans_columns_and_skips_unpublished() {
        let (_, client) = client_with(MemoryBackend::new().with_table(TABLE, resource_rows()));
        let found = client.list_recent_resources(Some("calculus")).await;
        assert_eq!(ids(&found), vec![4, 1]);
    }

    #[tokio::test]
    async fn test_empty_term_restores_recent_listing() {
        let (_, client) = client_with(MemoryBackend::new().with_table(TABLE, resource_rows()));
        let recent = client.list_recent_resources(Some("   ")).await;
        assert_eq!(ids(&recent), vec![4, 2]);
        assert_eq!(recent, client.list_recent_resources(None).await);
    }

    #[tokio::test]
    async fn test_recent_limit_applies() {
        let rows: Vec<Value> = (0..10)
            .map(|i| json!({"id": i, "title": format!("Paper {i}"), "is_published": true, "show_in_recent": true}))
            .collect();
        let (_, client) = client_with(MemoryBackend::new().with_table(TABLE, rows));
        assert_eq!(client.list_recent_resources(None).await.len(), 6);
        assert_eq!(client.list_recent_resources(Some("paper")).await.len(), 10);
    }

    #[tokio::test]
    async fn test_subject_resources_newest_first() {
        let (_, client) = client_with(MemoryBackend::new().with_table(TABLE, resource_rows()));
        assert_eq!(ids(&client.list_subject_resources("x1").await), vec![2, 1]);
    }

    #[tokio::test]
    async fn test_degrees_scoped_and_sorted() {
        let rows = vec![
            json!({"id": "d1", "name": "Zoology", "code": "ZOO", "university_id": "u1", "is_active": true}),
            json!({"id": "d2", "name": "Accounting", "code": "ACC", "university_id": "u1", "is_active": true}),
            json!({"id": "d3", "name": "Botany", "code": "BOT", "university_id": "u2", "is_active": true}),
            json!({"id": "d4", "name": "Archived", "code": "ARC", "university_id": "u1", "is_active": false}),
            json!({"id": "d5", "name": "Global Studies", "code": "GLB", "university_id": null, "is_active": true}),
        ];
        let (_, client) = client_with(MemoryBackend::new().with_table(DEGREES, rows));

        let scoped: Vec<_> = client.list_degrees(Some("u1")).await.into_iter().map(|d| d.id).collect();
        assert_eq!(scoped, vec!["d2", "d1"]);

        let all: Vec<_> = client.list_degrees(None).await.into_iter().map(|d| d.id).collect();
        assert_eq!(all, vec!["d2", "d3", "d5", "d1"]);
    }

    #[tokio::test]
    async fn test_semesters_sorted_by_number() {
        let rows = vec![
            json!({"id": "s2", "degree_id": "d1", "semester_number": 2, "name": "Second", "is_active": true}),
            json!({"id": "s10", "degree_id": "d1", "semester_number": 10, "name": "Tenth", "is_active": true}),
            json!({"id": "s1", "degree_id": "d1", "semester_number": 1, "name": "First", "is_active": true}),
            json!({"id": "o1", "degree_id": "d2", "semester_number": 1, "name": "Other", "is_active": true}),
        ];
        let (_, client) = client_with(MemoryBackend::new().with_table(SEMESTERS, rows));
        let numbers: Vec<_> = client
            .list_semesters("d1")
            .await
            .into_iter()
            .map(|s| s.semester_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 10]);
    }

    #[tokio::test]
    async fn test_fetch_failure_yields_empty_list() {
        let (backend, client) = client_with(MemoryBackend::new().with_table(TABLE, resource_rows()));
        backend.set_failing(true);

        assert!(client.list_recent_resources(None).await.is_empty());
        assert!(client.list_universities().await.is_empty());
        let listing = client
            .fetch(&FetchScope::Subjects { semester_id: "s1".into() }, None)
            .await;
        assert_eq!(listing, Listing::Subjects(Vec::new()));
    }

    #[tokio::test]
    async fn test_unreadable_rows_are_skipped() {
        let rows = vec![
            json!({"id": "u1", "name": "Alpha", "code": "A", "is_active": true}),
            json!({"id": "u2", "code": "B", "is_active": true}),
        ];
        let (_, client) = client_with(MemoryBackend::new().with_table(UNIVERSITIES, rows));
        assert_eq!(client.list_universities().await.len(), 1);
    }

    #[test]
    fn test_resolve_download_url() {
        let backend = MemoryBackend::new().with_storage_base("https://files.example.com/public");
        let (_, client) = client_with(backend);
        assert_eq!(
            client.resolve_download_url("2024/calc.pdf").unwrap(),
            "https://files.example.com/public/question-papers/2024/calc.pdf"
        );
        assert_eq!(
            client.resolve_download_url("https://cdn.example.com/calc.pdf").unwrap(),
            "https://cdn.example.com/calc.pdf"
        );
    }
}
