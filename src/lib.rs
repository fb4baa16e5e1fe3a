// src/lib.rs

//! examshelf: browse a university exam-resource catalog.
//!
//! Drill down Home → Universities → Degrees → Semesters → Subjects →
//! Resources, search recent resources, download files, and read or submit
//! moderated degree comments.

pub mod backend;
pub mod browser;
pub mod error;
pub mod models;
pub mod navigation;
pub mod services;
pub mod utils;
