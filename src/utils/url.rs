// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

use crate::error::{AppError, Result};

/// Whether a stored file path is already a full URL.
///
/// # Examples
/// ```
/// use examshelf::utils::url::is_absolute;
///
/// assert!(is_absolute("https://cdn.example.com/a.pdf"));
/// assert!(!is_absolute("2024/a.pdf"));
/// ```
pub fn is_absolute(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Public URL of an object in a storage bucket.
pub fn storage_public_url(base: &Url, bucket: &str, path: &str) -> Result<String> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| AppError::config("backend.url cannot be used as a base URL"))?
        .pop_if_empty()
        .extend(["storage", "v1", "object", "public", bucket])
        .extend(path.split('/').filter(|s| !s.is_empty()));
    Ok(url.to_string())
}

/// Turn a display title into a safe filename, keeping the extension of
/// the source path when the title has none.
pub fn file_name_for(title: &str, source: &str) -> String {
    let mut name: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if name.is_empty() {
        name = "download".to_string();
    }

    let source_path = source.split(['?', '#']).next().unwrap_or(source);
    let extension = source_path
        .rsplit('/')
        .next()
        .and_then(|last| last.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.len() <= 5);

    match extension {
        Some(ext) if !name.to_lowercase().ends_with(&format!(".{}", ext.to_lowercase())) => {
            format!("{name}.{ext}")
        }
        _ => name,
    }
}
