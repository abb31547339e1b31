//! `check_prerequisites` tool: fit assessment for a course given declared
//! skills and a free-text description of the user's experience.

use std::sync::Arc;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{CourseDetails, CourseStore};
use crate::config::PrereqTuning;
use crate::tools::context::ToolCtx;
use crate::tools::registry::{BoxFuture, Tool, ToolError, execution_error, parse_params};

#[derive(Debug, Deserialize)]
struct Params {
    #[serde(default)]
    course_id: Option<String>,
    #[serde(default)]
    user_experience: Option<String>,
    #[serde(default)]
    user_skills: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    ExcellentFit,
    Suitable,
    Challenging,
}

/// Assessment returned to the composer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrereqAssessment {
    pub course_id: String,
    pub course_label: String,
    pub level: String,
    pub recommendation: Recommendation,
    pub confidence: f32,
    pub notes: Vec<String>,
    pub preparation: Vec<String>,
}

fn years_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+\s*(ans?|années?)").expect("years pattern"))
}

/// Whether the free text claims prior experience ("3 ans de Python",
/// "je maîtrise Docker", ...). Substring checks over the lowercased text.
pub fn mentions_experience(text: &str) -> bool {
    let lower = text.to_lowercase();
    const PHRASES: &[&str] = &[
        "expérience",
        "je connais",
        "je maîtrise",
        "je pratique",
        "j'utilise",
        "j'ai déjà",
        "j'ai travaillé",
        "autodidacte",
    ];
    PHRASES.iter().any(|p| lower.contains(p)) || years_pattern().is_match(&lower)
}

fn is_introductory(level: &str) -> bool {
    level.to_lowercase().contains("débutant")
}

/// Declared skills that also appear in the course's skill list
/// (case-insensitive containment either way).
fn overlapping_skills(course: &CourseDetails, declared: &[String]) -> Vec<String> {
    course
        .skills
        .iter()
        .filter(|skill| {
            let s = skill.to_lowercase();
            declared.iter().any(|d| {
                let d = d.trim().to_lowercase();
                !d.is_empty() && (s.contains(&d) || d.contains(&s))
            })
        })
        .cloned()
        .collect()
}

/// Classify fit and derive confidence, notes and preparation suggestions.
pub fn assess(
    course: &CourseDetails,
    user_experience: Option<&str>,
    user_skills: &[String],
    tuning: &PrereqTuning,
) -> PrereqAssessment {
    let overlap = overlapping_skills(course, user_skills);
    let experienced = user_experience.map(mentions_experience).unwrap_or(false);

    let recommendation = if is_introductory(&course.level) {
        Recommendation::ExcellentFit
    } else if overlap.is_empty() && !experienced {
        Recommendation::Challenging
    } else {
        Recommendation::Suitable
    };

    let mut confidence = match recommendation {
        Recommendation::ExcellentFit => tuning.excellent_confidence,
        Recommendation::Suitable => tuning.base_confidence,
        Recommendation::Challenging => tuning.challenging_confidence,
    };
    if !overlap.is_empty() {
        confidence = (confidence + tuning.overlap_bonus).min(1.0);
    }

    let mut notes = Vec::new();
    let mut preparation = Vec::new();
    match recommendation {
        Recommendation::ExcellentFit => {
            notes.push("Formation accessible sans prérequis techniques.".to_string());
        }
        Recommendation::Suitable => {
            notes.push(format!(
                "Votre profil correspond au niveau attendu ({}).",
                course.level
            ));
        }
        Recommendation::Challenging => {
            notes.push(format!(
                "Le programme suppose des bases solides ({}).",
                course.level
            ));
            let basics: Vec<&str> = course.skills.iter().take(3).map(String::as_str).collect();
            if !basics.is_empty() {
                preparation.push(format!("Revoir les fondamentaux: {}.", basics.join(", ")));
            }
            preparation
                .push("Échanger avec un conseiller pour valider votre parcours.".to_string());
        }
    }
    if !overlap.is_empty() {
        notes.push(format!("Compétences déjà acquises: {}.", overlap.join(", ")));
    }
    if experienced {
        notes.push("Votre expérience déclarée est un bon point de départ.".to_string());
    }

    PrereqAssessment {
        course_id: course.id.clone(),
        course_label: course.label.clone(),
        level: course.level.clone(),
        recommendation,
        confidence,
        notes,
        preparation,
    }
}

pub struct CheckPrerequisites {
    store: Arc<dyn CourseStore>,
    tuning: PrereqTuning,
}

impl CheckPrerequisites {
    pub fn new(store: Arc<dyn CourseStore>, tuning: PrereqTuning) -> Self {
        Self { store, tuning }
    }
}

impl Tool for CheckPrerequisites {
    fn name(&self) -> &str {
        "check_prerequisites"
    }

    fn description(&self) -> &str {
        "Évalue l'adéquation entre le profil de l'utilisateur (compétences, \
         expérience) et les prérequis d'une formation."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "course_id": {
                    "type": "string",
                    "description": "Identifiant de la formation. Par défaut, la \
                        formation en cours de discussion."
                },
                "user_experience": {
                    "type": "string",
                    "description": "Description libre de l'expérience de l'utilisateur."
                },
                "user_skills": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Compétences déclarées par l'utilisateur."
                }
            },
            "required": []
        })
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a ToolCtx,
        args: &'a Value,
    ) -> BoxFuture<'a, Result<Value, ToolError>> {
        let store = Arc::clone(&self.store);
        let tuning = self.tuning;

        Box::pin(async move {
            let params: Params = parse_params(args)?;
            let course_id = params
                .course_id
                .or_else(|| ctx.course_id.clone())
                .ok_or_else(|| {
                    ToolError::InvalidParameters(
                        "missing 'course_id' and no course in context".to_string(),
                    )
                })?;

            let lookup_id = course_id.clone();
            let result =
                tokio::task::spawn_blocking(move || store.course_by_id(&lookup_id)).await;

            let course = match result {
                Ok(Ok(Some(course))) => course,
                Ok(Ok(None)) => {
                    return Err(execution_error(
                        "check_prerequisites",
                        format!("course '{course_id}' not found"),
                    ));
                }
                Ok(Err(e)) => return Err(execution_error("check_prerequisites", e)),
                Err(e) => {
                    return Err(execution_error(
                        "check_prerequisites",
                        format!("task error: {e}"),
                    ));
                }
            };

            let skills = params.user_skills.unwrap_or_default();
            let assessment = assess(
                &course,
                params.user_experience.as_deref(),
                &skills,
                &tuning,
            );
            serde_json::to_value(&assessment).map_err(|e| execution_error("check_prerequisites", e))
        })
    }
}
