// src/browser/mod.rs

//! Catalog browser session.
//!
//! Couples the `Navigator` with the services: every transition dispatches
//! exactly the fetch it returns and replaces the current listing with the
//! result. Fetches are awaited before the next command is handled, so a
//! response can never land on a view it was not requested for.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::{AppError, Result};
use crate::models::{Comment, CommentForm, Resource, TypeFilter};
use crate::navigation::{FetchScope, Navigator, View};
use crate::services::{
    CatalogClient, CommentService, Debouncer, DownloadOutcome, Downloader, Listing, SearchState,
};

pub struct Browser {
    catalog: CatalogClient,
    comments: CommentService,
    downloader: Downloader,
    navigator: Navigator,
    listing: Listing,
    search: SearchState,
    debouncer: Debouncer,
    search_rx: mpsc::UnboundedReceiver<String>,
}

impl Browser {
    /// Create a browser on the home view. Call `reload` to fetch it.
    pub fn new(
        catalog: CatalogClient,
        comments: CommentService,
        downloader: Downloader,
        search_delay: Duration,
    ) -> Self {
        let (debouncer, search_rx) = Debouncer::new(search_delay);
        Self {
            catalog,
            comments,
            downloader,
            navigator: Navigator::new(),
            listing: Listing::Empty,
            search: SearchState::default(),
            debouncer,
            search_rx,
        }
    }

    pub fn view(&self) -> View {
        self.navigator.view()
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    /// Re-run the current view's fetch.
    pub async fn reload(&mut self) {
        let scope = self.navigator.current_scope();
        self.dispatch(scope).await;
    }

    /// Go home, resetting the search overlay.
    pub async fn home(&mut self) {
        self.discard_pending_search();
        self.search = SearchState::default();
        let scope = self.navigator.go_home();
        self.dispatch(scope).await;
    }

    pub async fn open_universities(&mut self) -> Result<()> {
        let scope = self.navigator.open_universities()?;
        self.discard_pending_search();
        self.dispatch(scope).await;
        Ok(())
    }

    /// List every degree without picking a university.
    pub async fn browse_degrees(&mut self) -> Result<()> {
        let scope = self.navigator.browse_degrees()?;
        self.discard_pending_search();
        self.dispatch(scope).await;
        Ok(())
    }

    /// Select the `index`-th entry of the current listing and drill down.
    pub async fn open(&mut self, index: usize) -> Result<()> {
        let missing = || AppError::validation(format!("no entry #{}", index + 1));
        let scope = match &self.listing {
            Listing::Universities(rows) => {
                let university = rows.get(index).cloned().ok_or_else(missing)?;
                self.navigator.select_university(university)?
            }
            Listing::Degrees(rows) => {
                let degree = rows.get(index).cloned().ok_or_else(missing)?;
                self.navigator.select_degree(degree)?
            }
            Listing::Semesters(rows) => {
                let semester = rows.get(index).cloned().ok_or_else(missing)?;
                self.navigator.select_semester(semester)?
            }
            Listing::Subjects(rows) => {
                let subject = rows.get(index).cloned().ok_or_else(missing)?;
                self.navigator.select_subject(subject)?
            }
            Listing::Resources(_) | Listing::Empty => {
                return Err(AppError::navigation(self.view(), "open an entry"));
            }
        };
        self.dispatch(scope).await;
        Ok(())
    }

    /// One level up.
    pub async fn back(&mut self) -> Result<()> {
        let scope = self.navigator.back()?;
        self.after_leaving(scope).await;
        Ok(())
    }

    /// Jump to an ancestor view.
    pub async fn back_to(&mut self, view: View) -> Result<()> {
        let scope = self.navigator.back_to(view)?;
        self.after_leaving(scope).await;
        Ok(())
    }

    /// Feed a keystroke's worth of search text. The fetch happens once the
    /// input has been idle for the debounce delay (see `settle_search`).
    pub fn search_input(&mut self, text: impl Into<String>) -> Result<()> {
        self.require_home("search")?;
        self.debouncer.input(text);
        Ok(())
    }

    /// Wait for pending search input to settle and apply it.
    ///
    /// Returns `false` when nothing was pending. If several terms settled
    /// meanwhile, only the newest is fetched.
    pub async fn settle_search(&mut self) -> bool {
        let mut term = match self.search_rx.try_recv() {
            Ok(term) => term,
            Err(_) if self.debouncer.is_pending() => match self.search_rx.recv().await {
                Some(term) => term,
                None => return false,
            },
            Err(_) => return false,
        };
        while let Ok(newer) = self.search_rx.try_recv() {
            term = newer;
        }
        self.debouncer.cancel();

        if self.view() != View::Home {
            log::debug!("Dropping search '{term}' settled outside the home view");
            return false;
        }
        self.search.set_term(term);
        self.dispatch(FetchScope::RecentResources).await;
        true
    }

    /// Change the type filter. Applied locally; nothing is re-fetched.
    pub fn set_type_filter(&mut self, filter: TypeFilter) -> Result<()> {
        self.require_home("filter by type")?;
        self.search.set_type_filter(filter);
        Ok(())
    }

    /// Resources currently shown: type-filtered on the home view, all of
    /// them on a subject's resource view.
    pub fn visible_resources(&self) -> Vec<&Resource> {
        match (&self.listing, self.view()) {
            (Listing::Resources(rows), View::Home) => self.search.apply(rows),
            (Listing::Resources(rows), _) => rows.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Download the `index`-th visible resource.
    pub async fn download(&self, index: usize) -> Result<DownloadOutcome> {
        let resource = self
            .visible_resources()
            .get(index)
            .copied()
            .ok_or_else(|| AppError::validation(format!("no resource #{}", index + 1)))?;
        self.downloader.download_resource(resource).await
    }

    /// Approved comments on the selected degree.
    pub async fn comments(&self) -> Result<Vec<Comment>> {
        let degree_id = self.selected_degree_id("read comments")?;
        Ok(self.comments.list(degree_id).await)
    }

    /// Submit a comment on the selected degree.
    pub async fn submit_comment(&self, form: &mut CommentForm) -> Result<()> {
        let degree_id = self.selected_degree_id("comment")?;
        self.comments.submit(degree_id, form).await
    }

    async fn after_leaving(&mut self, scope: FetchScope) {
        self.discard_pending_search();
        if scope == FetchScope::RecentResources {
            self.search = SearchState::default();
        }
        self.dispatch(scope).await;
    }

    /// Forget typed search text that has not been applied yet, whether its
    /// timer is still running or has already fired.
    fn discard_pending_search(&mut self) {
        self.debouncer.cancel();
        while let Ok(term) = self.search_rx.try_recv() {
            log::debug!("Dropping unapplied search '{term}'");
        }
    }

    async fn dispatch(&mut self, scope: FetchScope) {
        self.listing = self.catalog.fetch(&scope, self.search.active_term()).await;
        log::debug!("{} view: {} entries", self.view(), self.listing.len());
    }

    fn selected_degree_id(&self, action: &str) -> Result<&str> {
        self.navigator
            .selection()
            .degree()
            .map(|d| d.id.as_str())
            .ok_or_else(|| AppError::navigation(self.view(), action))
    }

    fn require_home(&self, action: &str) -> Result<()> {
        if self.view() == View::Home {
            Ok(())
        } else {
            Err(AppError::navigation(self.view(), action))
        }
    }
}
