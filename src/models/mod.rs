// src/models/mod.rs

//! Domain models for the catalog browser.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod catalog;
mod comment;
mod config;
mod resource;

// Re-export all public types
pub use catalog::{Degree, Semester, Subject, University};
pub use comment::{Comment, CommentForm, NewComment};
pub use config::{BackendConfig, Config, DownloadConfig, ENV_ANON_KEY, ENV_BACKEND_URL, SearchConfig};
pub use resource::{Resource, ResourceType, TypeFilter};
