//! Course catalog: record types and the `CourseStore` read/write interface.
//!
//! The agent core only consumes this interface; `catalog::db` provides the
//! SQLite-backed implementation used by the binary and most tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod db;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum StoreError {
    Db(String),
    /// A write referenced a course id that does not exist.
    UnknownCourse(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Db(s) => write!(f, "store: {}", s),
            StoreError::UnknownCourse(id) => write!(f, "store: unknown course '{}'", id),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Db(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Course records
// ---------------------------------------------------------------------------

/// One module (chapter) of a course programme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instructor {
    pub name: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Testimonial {
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub quote: String,
}

/// Full course record as served to the agent tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseDetails {
    pub id: String,
    pub label: String,
    pub description: String,
    /// Display string, e.g. "Niveau débutant".
    pub level: String,
    pub duration: String,
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default)]
    pub modules: Vec<ModuleInfo>,
    #[serde(default)]
    pub instructors: Vec<Instructor>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub testimonials: Vec<Testimonial>,
    #[serde(default)]
    pub enrolled: u32,
    #[serde(default)]
    pub rating: f32,
}

impl CourseDetails {
    pub fn summary(&self) -> CourseSummary {
        CourseSummary {
            id: self.id.clone(),
            label: self.label.clone(),
            level: self.level.clone(),
            description: self.description.clone(),
            enrolled: self.enrolled,
            rating: self.rating,
        }
    }
}

/// Catalog listing entry (no programme details).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseSummary {
    pub id: String,
    pub label: String,
    pub level: String,
    pub description: String,
    pub enrolled: u32,
    pub rating: f32,
}

// ---------------------------------------------------------------------------
// Registrations
// ---------------------------------------------------------------------------

/// Registration form payload. Validated by the tool before it reaches the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRegistration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub course_id: String,
    #[serde(default)]
    pub whatsapp: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub id: String,
    pub course_id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Store interface
// ---------------------------------------------------------------------------

/// Read/write contract the tools consume. Implementations must be safe to
/// share across async tasks behind an `Arc` (calls run under
/// `spawn_blocking`).
pub trait CourseStore: Send + Sync {
    fn course_by_id(&self, id: &str) -> Result<Option<CourseDetails>, StoreError>;

    fn list_courses(&self) -> Result<Vec<CourseSummary>, StoreError>;

    /// Courses whose label, description, skills or module text contain
    /// `needle` (case-insensitive). Order is unspecified.
    fn courses_matching(&self, needle: &str) -> Result<Vec<CourseDetails>, StoreError>;

    /// Insert one registration. Fails with `UnknownCourse` (and writes
    /// nothing) when `course_id` does not resolve.
    fn create_registration(&self, reg: &NewRegistration) -> Result<RegistrationRecord, StoreError>;
}

/// Case-insensitive containment over the searchable text of a course.
pub fn course_matches(course: &CourseDetails, needle_lower: &str) -> bool {
    course.label.to_lowercase().contains(needle_lower)
        || course.description.to_lowercase().contains(needle_lower)
        || course
            .skills
            .iter()
            .any(|s| s.to_lowercase().contains(needle_lower))
        || course.modules.iter().any(|m| {
            m.title.to_lowercase().contains(needle_lower)
                || m.description.to_lowercase().contains(needle_lower)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course() -> CourseDetails {
        CourseDetails {
            id: "python".into(),
            label: "Python pour la Data".into(),
            description: "Manipuler des données avec pandas.".into(),
            level: "Niveau débutant".into(),
            duration: "5 jours".into(),
            format: "Distanciel".into(),
            price: None,
            modules: vec![ModuleInfo {
                title: "Introduction à Python".into(),
                description: "Syntaxe et types de base.".into(),
                topics: vec!["variables".into()],
            }],
            instructors: vec![],
            skills: vec!["Python".into(), "SQL".into()],
            certifications: vec![],
            testimonials: vec![],
            enrolled: 120,
            rating: 4.7,
        }
    }

    #[test]
    fn matches_label_description_skill_module() {
        let c = course();
        assert!(course_matches(&c, "python"));
        assert!(course_matches(&c, "pandas"));
        assert!(course_matches(&c, "sql"));
        assert!(course_matches(&c, "syntaxe"));
        assert!(!course_matches(&c, "kubernetes"));
    }

    #[test]
    fn summary_projects_listing_fields() {
        let s = course().summary();
        assert_eq!(s.id, "python");
        assert_eq!(s.enrolled, 120);
        assert!(s.label.contains("Python"));
    }
}
