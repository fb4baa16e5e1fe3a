//! Downloadable resource rows and the client-side type filter.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A published exam resource (question paper, solved paper, notes).
///
/// Most columns are nullable in the backend; the resource may hang off a
/// degree, a subject, or both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub resource_type: Option<ResourceType>,
    #[serde(default)]
    pub download_count: Option<i64>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub degree_id: Option<String>,
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub is_published: Option<bool>,
    #[serde(default)]
    pub show_in_recent: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Resource {
    /// Title for display and for the saved filename.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("Untitled resource")
    }

    pub fn downloads(&self) -> i64 {
        self.download_count.unwrap_or(0)
    }
}

/// Kind of resource, stored as a free-form string column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceType {
    QuestionPaper,
    SolvedPaper,
    Notes,
    /// Any value the client does not recognize
    Other(String),
}

impl ResourceType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::QuestionPaper => "question_paper",
            Self::SolvedPaper => "solved_paper",
            Self::Notes => "notes",
            Self::Other(raw) => raw,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &str {
        match self {
            Self::QuestionPaper => "Question Papers",
            Self::SolvedPaper => "Solved Papers",
            Self::Notes => "Notes",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for ResourceType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "question_paper" => Self::QuestionPaper,
            "solved_paper" => Self::SolvedPaper,
            "notes" => Self::Notes,
            _ => Self::Other(raw),
        }
    }
}

impl From<ResourceType> for String {
    fn from(kind: ResourceType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client-side filter over `resource_type`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TypeFilter {
    #[default]
    All,
    Only(ResourceType),
}

impl TypeFilter {
    /// Filters offered to the user, in display order.
    pub fn choices() -> [Self; 4] {
        [
            Self::All,
            Self::Only(ResourceType::QuestionPaper),
            Self::Only(ResourceType::SolvedPaper),
            Self::Only(ResourceType::Notes),
        ]
    }

    pub fn matches(&self, resource: &Resource) -> bool {
        match self {
            Self::All => true,
            Self::Only(kind) => resource.resource_type.as_ref() == Some(kind),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => "All Resources",
            Self::Only(kind) => kind.label(),
        }
    }
}

impl FromStr for TypeFilter {
    type Err = AppError;

    /// Only the recognized values `all`, `question_paper`, `solved_paper`
    /// and `notes` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "question_paper" => Ok(Self::Only(ResourceType::QuestionPaper)),
            "solved_paper" => Ok(Self::Only(ResourceType::SolvedPaper)),
            "notes" => Ok(Self::Only(ResourceType::Notes)),
            other => Err(AppError::validation(format!(
                "unknown resource type '{other}'"
            ))),
        }
    }
}
