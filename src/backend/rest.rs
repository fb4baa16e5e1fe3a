//! PostgREST + Storage backend over HTTP.
//!
//! Maps `Query` onto the REST dialect served by hosted Postgres platforms:
//!
//! ```text
//! GET  {url}/rest/v1/{table}?select=*&col=eq.v&or=(a.ilike.*t*,b.ilike.*t*)&order=col.asc&limit=n
//! POST {url}/rest/v1/{table}            (Prefer: return=minimal)
//! POST {url}/rest/v1/rpc/{function}
//!      {url}/storage/v1/object/public/{bucket}/{path}
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use url::Url;

use crate::backend::{CatalogBackend, Direction, Query};
use crate::error::{AppError, Result};
use crate::models::BackendConfig;
use crate::utils::{http, url as url_utils};

/// Characters with meaning inside a PostgREST `or=(...)` group.
const RESERVED: [char; 5] = [',', '(', ')', '*', '"'];

/// ILIKE wildcards (and their escape) that must match literally.
const LIKE_SPECIAL: [char; 3] = ['%', '_', '\\'];

/// HTTP implementation of `CatalogBackend`.
#[derive(Clone)]
pub struct RestBackend {
    client: Client,
    base_url: Url,
}

impl RestBackend {
    /// Create a backend client from configuration.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url)?;
        let client = http::create_async_client(config)?;
        Ok(Self { client, base_url })
    }

    /// Build `{base}/rest/v1/{segments...}`.
    fn rest_endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::config("backend.url cannot be used as a base URL"))?
            .pop_if_empty()
            .extend(["rest", "v1"])
            .extend(segments);
        Ok(url)
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::backend(status.as_u16(), body))
    }
}

/// Translate a query into PostgREST query-string pairs.
pub fn query_pairs(query: &Query) -> Vec<(String, String)> {
    let mut pairs = vec![("select".to_string(), "*".to_string())];

    for filter in &query.filters {
        let condition = match &filter.value {
            Value::Null => "is.null".to_string(),
            Value::String(s) => format!("eq.{s}"),
            other => format!("eq.{other}"),
        };
        pairs.push((filter.column.clone(), condition));
    }

    if let Some(text) = &query.text_match {
        let term = sanitize_term(&text.term);
        let group = text
            .columns
            .iter()
            .map(|column| format!("{column}.ilike.*{term}*"))
            .collect::<Vec<_>>()
            .join(",");
        pairs.push(("or".to_string(), format!("({group})")));
    }

    if let Some(order) = &query.order {
        let dir = match order.direction {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        };
        pairs.push(("order".to_string(), format!("{}.{dir}", order.column)));
    }

    if let Some(limit) = query.limit {
        pairs.push(("limit".to_string(), limit.to_string()));
    }

    pairs
}

fn sanitize_term(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if RESERVED.contains(&c) {
            continue;
        }
        if LIKE_SPECIAL.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[async_trait]
impl CatalogBackend for RestBackend {
    async fn select(&self, query: &Query) -> Result<Vec<Value>> {
        let url = self.rest_endpoint(&[&query.table])?;
        log::debug!("GET {} {:?}", url, query_pairs(query));

        let response = self
            .client
            .get(url)
            .query(&query_pairs(query))
            .send()
            .await?;
        let rows = Self::check(response).await?.json::<Vec<Value>>().await?;
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<()> {
        let url = self.rest_endpoint(&[table])?;
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn rpc(&self, function: &str, args: Value) -> Result<()> {
        let url = self.rest_endpoint(&["rpc", function])?;
        log::debug!("POST {}", url);

        let response = self.client.post(url).json(&args).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> Result<String> {
        url_utils::storage_public_url(&self.base_url, bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(url: &str) -> RestBackend {
        let config = BackendConfig {
            url: url.to_string(),
            anon_key: "anon".to_string(),
            ..BackendConfig::default()
        };
        RestBackend::new(&config).unwrap()
    }

    #[test]
    fn test_query_pairs_for_scoped_listing() {
        let query = Query::table("semesters")
            .eq("degree_id", "d1")
            .eq("is_active", true)
            .order_by("semester_number", Direction::Ascending);

        assert_eq!(
            query_pairs(&query),
            vec![
                ("select".to_string(), "*".to_string()),
                ("degree_id".to_string(), "eq.d1".to_string()),
                ("is_active".to_string(), "eq.true".to_string()),
                ("order".to_string(), "semester_number.asc".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_pairs_for_search() {
        let query = Query::table("Exam-prep")
            .eq("is_published", true)
            .contains_any(&["title", "course"], "calc(ulus), *")
            .order_by("created_at", Direction::Descending)
            .limit(50);

        let pairs = query_pairs(&query);
        assert!(pairs.contains(&(
            "or".to_string(),
            "(title.ilike.*calculus *,course.ilike.*calculus *)".to_string()
        )));
        assert!(pairs.contains(&("order".to_string(), "created_at.desc".to_string())));
        assert!(pairs.contains(&("limit".to_string(), "50".to_string())));
    }

    #[test]
    fn test_search_term_wildcards_match_literally() {
        let query = Query::table("Exam-prep").contains_any(&["title"], r#"50%_"off""#);
        assert!(query_pairs(&query).contains(&(
            "or".to_string(),
            r"(title.ilike.*50\%\_off*)".to_string()
        )));
    }

    #[test]
    fn test_null_filter_uses_is() {
        let query = Query::table("degrees").eq("university_id", Value::Null);
        assert!(query_pairs(&query).contains(&("university_id".to_string(), "is.null".to_string())));
    }

    #[test]
    fn test_rest_endpoint_encodes_table() {
        let backend = backend("https://demo.supabase.co/");
        let url = backend.rest_endpoint(&["Exam-prep"]).unwrap();
        assert_eq!(url.as_str(), "https://demo.supabase.co/rest/v1/Exam-prep");

        let rpc = backend
            .rest_endpoint(&["rpc", "increment_download_count"])
            .unwrap();
        assert_eq!(
            rpc.as_str(),
            "https://demo.supabase.co/rest/v1/rpc/increment_download_count"
        );
    }

    #[test]
    fn test_public_url() {
        let backend = backend("https://demo.supabase.co");
        assert_eq!(
            backend
                .public_url("question-papers", "2024/calculus final.pdf")
                .unwrap(),
            "https://demo.supabase.co/storage/v1/object/public/question-papers/2024/calculus%20final.pdf"
        );
    }
}
