//! Service layer for the catalog browser.
//!
//! This module contains the business logic for:
//! - Scoped catalog reads (`CatalogClient`)
//! - The home-view search overlay (`SearchState`, `Debouncer`)
//! - Moderated degree comments (`CommentService`)
//! - Resource downloads (`Downloader`, `DownloadSink`)

mod catalog;
mod comments;
mod download;
mod search;

pub use catalog::{CatalogClient, Listing};
pub use comments::{CommentService, PENDING_MODERATION_NOTICE};
pub use download::{DownloadOutcome, DownloadSink, Downloader, LocalDownloads};
pub use search::{Debouncer, SEARCH_COLUMNS, SearchState};
