//! University, Degree, Semester, and Subject rows.
//!
//! These are read-only copies of backend rows. The four types form the
//! drill-down chain: a degree optionally belongs to a university, a semester
//! to a degree, a subject to a semester.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A university offering degree programs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct University {
    pub id: String,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A degree program. `university_id` is empty for global degrees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Degree {
    pub id: String,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub university_id: Option<String>,
    #[serde(default = "active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Degree {
    /// Whether this degree is listed without any university.
    pub fn is_global(&self) -> bool {
        self.university_id.is_none()
    }
}

/// A numbered semester within a degree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Semester {
    pub id: String,
    pub degree_id: String,
    pub semester_number: i32,
    pub name: String,
    #[serde(default = "active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A subject taught in a semester.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subject {
    pub id: String,
    pub semester_id: String,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn active() -> bool {
    true
}
