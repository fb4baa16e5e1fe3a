// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, InvalidHeaderValue};

use crate::error::{AppError, Result};
use crate::models::BackendConfig;

/// Create a configured asynchronous HTTP client.
///
/// Every request carries the project's anonymous key, both as `apikey`
/// and as a bearer token.
pub fn create_async_client(config: &BackendConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .default_headers(auth_headers(&config.anon_key)?)
        .build()?;
    Ok(client)
}

/// Create a plain client for fetching public files.
pub fn create_download_client(config: &BackendConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

fn auth_headers(anon_key: &str) -> Result<HeaderMap> {
    let invalid = |_: InvalidHeaderValue| AppError::config("backend.anon_key contains invalid header characters");

    let mut headers = HeaderMap::new();
    let mut key = HeaderValue::from_str(anon_key).map_err(invalid)?;
    key.set_sensitive(true);
    headers.insert("apikey", key);

    let mut bearer = HeaderValue::from_str(&format!("Bearer {anon_key}")).map_err(invalid)?;
    bearer.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer);

    Ok(headers)
}
