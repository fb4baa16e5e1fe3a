//! Drill-down navigation state machine.
//!
//! The browser moves through six views:
//!
//! ```text
//! Home ─┬─> Universities ──select──> Degrees ──select──> Semesters ──select──> Subjects ──select──> Resources
//!       └───────────────browse─────────^
//! ```
//!
//! The selection chain `(University?, Degree?, Semester?, Subject?)` is owned
//! here. Every transition returns the single `FetchScope` the destination view
//! needs, with the ancestor ids baked into it, so callers never reuse rows
//! fetched under a previous ancestor.
//!
//! Invariant: selections deeper than the current view's level are `None`,
//! a semester implies a degree, a subject implies a semester. The university
//! may be skipped.
//!
//! `back` leaves the current view and drops the selection that entered it,
//! so the parent shows nothing picked. `back_to` jumps over several levels
//! and keeps the target's own pick (leaving Resources for Degrees keeps the
//! degree).

use std::fmt;

use crate::error::{AppError, Result};
use crate::models::{Degree, Semester, Subject, University};

/// One screen of the drill-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Home,
    Universities,
    Degrees,
    Semesters,
    Subjects,
    Resources,
}

impl View {
    pub const ALL: [Self; 6] = [
        Self::Home,
        Self::Universities,
        Self::Degrees,
        Self::Semesters,
        Self::Subjects,
        Self::Resources,
    ];

    /// Depth in the chain. A view may keep the selection made at its own
    /// level; everything deeper is cleared.
    fn level(self) -> u8 {
        match self {
            Self::Home => 0,
            Self::Universities => 1,
            Self::Degrees => 2,
            Self::Semesters => 3,
            Self::Subjects => 4,
            Self::Resources => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Universities => "Universities",
            Self::Degrees => "Degrees",
            Self::Semesters => "Semesters",
            Self::Subjects => "Subjects",
            Self::Resources => "Resources",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The data a view needs, scoped by the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchScope {
    /// Home: recent/featured resources (or search results)
    RecentResources,
    Universities,
    Degrees { university_id: Option<String> },
    Semesters { degree_id: String },
    Subjects { semester_id: String },
    Resources { subject_id: String },
}

/// The selection chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    university: Option<University>,
    degree: Option<Degree>,
    semester: Option<Semester>,
    subject: Option<Subject>,
}

impl Selection {
    pub fn university(&self) -> Option<&University> {
        self.university.as_ref()
    }

    pub fn degree(&self) -> Option<&Degree> {
        self.degree.as_ref()
    }

    pub fn semester(&self) -> Option<&Semester> {
        self.semester.as_ref()
    }

    pub fn subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }

    /// Drop every selection deeper than `level`.
    fn truncate(&mut self, level: u8) {
        if level < 1 {
            self.university = None;
        }
        if level < 2 {
            self.degree = None;
        }
        if level < 3 {
            self.semester = None;
        }
        if level < 4 {
            self.subject = None;
        }
    }

    /// Deepest level holding a selection (0 when empty).
    fn depth(&self) -> u8 {
        if self.subject.is_some() {
            4
        } else if self.semester.is_some() {
            3
        } else if self.degree.is_some() {
            2
        } else if self.university.is_some() {
            1
        } else {
            0
        }
    }

    /// No gaps below the (optional) university.
    fn is_prefix(&self) -> bool {
        (self.subject.is_none() || self.semester.is_some())
            && (self.semester.is_none() || self.degree.is_some())
    }
}

/// Owns the current view and selection chain and guards every transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    view: View,
    selection: Selection,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            view: View::Home,
            selection: Selection::default(),
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Scope of the current view, for reloading it.
    pub fn current_scope(&self) -> FetchScope {
        // Every ancestor of the current view is selected.
        let id_of = |id: Option<&String>| id.cloned().unwrap_or_default();
        match self.view {
            View::Home => FetchScope::RecentResources,
            View::Universities => FetchScope::Universities,
            View::Degrees => FetchScope::Degrees {
                university_id: self.selection.university.as_ref().map(|u| u.id.clone()),
            },
            View::Semesters => FetchScope::Semesters {
                degree_id: id_of(self.selection.degree.as_ref().map(|d| &d.id)),
            },
            View::Subjects => FetchScope::Subjects {
                semester_id: id_of(self.selection.semester.as_ref().map(|s| &s.id)),
            },
            View::Resources => FetchScope::Resources {
                subject_id: id_of(self.selection.subject.as_ref().map(|s| &s.id)),
            },
        }
    }

    /// Return to the home view, clearing the whole chain.
    pub fn go_home(&mut self) -> FetchScope {
        self.selection = Selection::default();
        self.enter(View::Home)
    }

    /// Home → Universities.
    pub fn open_universities(&mut self) -> Result<FetchScope> {
        self.require(&[View::Home], "open universities")?;
        self.selection = Selection::default();
        Ok(self.enter(View::Universities))
    }

    /// Home/Universities → Degrees without choosing a university.
    pub fn browse_degrees(&mut self) -> Result<FetchScope> {
        self.require(&[View::Home, View::Universities], "browse all degrees")?;
        self.selection = Selection::default();
        Ok(self.enter(View::Degrees))
    }

    /// Universities → Degrees, scoped to `university`.
    pub fn select_university(&mut self, university: University) -> Result<FetchScope> {
        self.require(&[View::Universities], "select a university")?;
        self.selection = Selection {
            university: Some(university),
            ..Selection::default()
        };
        Ok(self.enter(View::Degrees))
    }

    /// Degrees → Semesters.
    pub fn select_degree(&mut self, degree: Degree) -> Result<FetchScope> {
        self.require(&[View::Degrees], "select a degree")?;
        if let Some(university) = &self.selection.university {
            if degree.university_id.as_deref() != Some(university.id.as_str()) {
                return Err(AppError::validation(format!(
                    "degree {} does not belong to university {}",
                    degree.id, university.id
                )));
            }
        }
        self.selection.degree = Some(degree);
        self.selection.truncate(2);
        Ok(self.enter(View::Semesters))
    }

    /// Semesters → Subjects.
    pub fn select_semester(&mut self, semester: Semester) -> Result<FetchScope> {
        self.require(&[View::Semesters], "select a semester")?;
        let degree_id = self.selection.degree.as_ref().map(|d| d.id.as_str());
        if degree_id != Some(semester.degree_id.as_str()) {
            return Err(AppError::validation(format!(
                "semester {} does not belong to the selected degree",
                semester.id
            )));
        }
        self.selection.semester = Some(semester);
        self.selection.truncate(3);
        Ok(self.enter(View::Subjects))
    }

    /// Subjects → Resources.
    pub fn select_subject(&mut self, subject: Subject) -> Result<FetchScope> {
        self.require(&[View::Subjects], "select a subject")?;
        let semester_id = self.selection.semester.as_ref().map(|s| s.id.as_str());
        if semester_id != Some(subject.semester_id.as_str()) {
            return Err(AppError::validation(format!(
                "subject {} does not belong to the selected semester",
                subject.id
            )));
        }
        self.selection.subject = Some(subject);
        Ok(self.enter(View::Resources))
    }

    /// View one level up the current path, if any.
    pub fn parent(&self) -> Option<View> {
        match self.view {
            View::Home => None,
            View::Universities => Some(View::Home),
            View::Degrees if self.selection.university.is_some() => Some(View::Universities),
            View::Degrees => Some(View::Home),
            View::Semesters => Some(View::Degrees),
            View::Subjects => Some(View::Semesters),
            View::Resources => Some(View::Subjects),
        }
    }

    /// Move exactly one level up, clearing the selection that entered the
    /// view being left and everything below it.
    pub fn back(&mut self) -> Result<FetchScope> {
        let parent = self
            .parent()
            .ok_or_else(|| AppError::navigation(self.view, "go back"))?;
        if parent == View::Home {
            return Ok(self.go_home());
        }
        self.selection.truncate(parent.level() - 1);
        Ok(self.enter(parent))
    }

    /// Jump to an ancestor on the current path, keeping that view's own
    /// selection and clearing everything deeper.
    pub fn back_to(&mut self, target: View) -> Result<FetchScope> {
        if !self.ancestors().contains(&target) {
            return Err(AppError::navigation(
                self.view,
                format!("go back to {target}"),
            ));
        }
        if target == View::Home {
            return Ok(self.go_home());
        }
        self.selection.truncate(target.level());
        Ok(self.enter(target))
    }

    /// Views above the current one, nearest first.
    pub fn ancestors(&self) -> Vec<View> {
        let mut path = Vec::new();
        let mut probe = self.clone();
        while let Some(parent) = probe.parent() {
            path.push(parent);
            probe.view = parent;
        }
        path
    }

    /// Names of the selected chain, outermost first.
    pub fn breadcrumbs(&self) -> Vec<String> {
        let s = &self.selection;
        [
            s.university.as_ref().map(|u| u.name.clone()),
            s.degree.as_ref().map(|d| d.name.clone()),
            s.semester.as_ref().map(|s| s.name.clone()),
            s.subject.as_ref().map(|s| s.name.clone()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Whether the selection is consistent with the current view.
    pub fn is_consistent(&self) -> bool {
        let s = &self.selection;
        let ancestors_present = match self.view {
            View::Home | View::Universities | View::Degrees => true,
            View::Semesters => s.degree.is_some(),
            View::Subjects => s.semester.is_some(),
            View::Resources => s.subject.is_some(),
        };
        s.is_prefix() && ancestors_present && s.depth() <= self.view.level().min(4)
    }

    fn require(&self, allowed: &[View], action: &str) -> Result<()> {
        if allowed.contains(&self.view) {
            Ok(())
        } else {
            Err(AppError::navigation(self.view, action))
        }
    }

    fn enter(&mut self, view: View) -> FetchScope {
        log::debug!("navigate {} -> {}", self.view, view);
        self.view = view;
        debug_assert!(self.is_consistent(), "inconsistent navigation state: {self:?}");
        self.current_scope()
    }
}
