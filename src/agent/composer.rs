//! Response composer: render tool results and/or conversational templates
//! into the final reply.
//!
//! Any successful tool result makes the reply data-driven (one formatted
//! section per result, call order, confidence 0.9). Otherwise a template is
//! picked by keyword, with a hand-assigned confidence per template.

use serde_json::Value;

use crate::agent::AgentResponse;
use crate::agent::context::ToolCallRecord;
use crate::catalog::{CourseDetails, CourseSummary};
use crate::tools::prereq::{PrereqAssessment, Recommendation};
use crate::tools::register::RegistrationOutcome;
use crate::tools::search::SearchHit;

const DATA_DRIVEN_CONFIDENCE: f32 = 0.9;
const DESCRIPTION_PREVIEW_CHARS: usize = 100;

pub struct ResponseComposer {
    /// Max search results rendered (top of the relevance ranking).
    max_results: usize,
}

impl Default for ResponseComposer {
    fn default() -> Self {
        Self::new(3)
    }
}

impl ResponseComposer {
    pub fn new(max_results: usize) -> Self {
        Self {
            max_results: max_results.max(1),
        }
    }

    /// Build the reply for one turn from the executed tool calls.
    pub fn compose(
        &self,
        message: &str,
        course_id: Option<&str>,
        tool_calls: Vec<ToolCallRecord>,
    ) -> AgentResponse {
        let sections: Vec<String> = tool_calls
            .iter()
            .filter_map(|call| {
                let value = call.result_value()?;
                self.format_tool(&call.name, value)
            })
            .collect();

        if !sections.is_empty() {
            return AgentResponse {
                message: sections.join("\n\n"),
                tool_calls,
                confidence: DATA_DRIVEN_CONFIDENCE,
                metadata: None,
            };
        }

        let (message, confidence, template) = template_reply(message, course_id);
        AgentResponse {
            message,
            tool_calls,
            confidence,
            metadata: Some(serde_json::json!({ "template": template })),
        }
    }

    /// Render one successful tool result. Unknown names or unexpected result
    /// shapes contribute no section.
    fn format_tool(&self, name: &str, value: &Value) -> Option<String> {
        match name {
            "get_course_info" => {
                let course: CourseDetails = serde_json::from_value(value.clone()).ok()?;
                Some(format_course_info(&course))
            }
            "search_courses" => {
                let hits: Vec<SearchHit> = serde_json::from_value(value.clone()).ok()?;
                Some(format_search_results(hits, self.max_results))
            }
            "get_all_courses" => {
                let courses: Vec<CourseSummary> = serde_json::from_value(value.clone()).ok()?;
                Some(format_catalog(&courses))
            }
            "check_prerequisites" => {
                let assessment: PrereqAssessment = serde_json::from_value(value.clone()).ok()?;
                Some(format_assessment(&assessment))
            }
            "create_registration" => {
                let outcome: RegistrationOutcome = serde_json::from_value(value.clone()).ok()?;
                Some(format_registration(&outcome))
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-tool formatting
// ---------------------------------------------------------------------------

fn preview(text: &str) -> String {
    if text.chars().count() <= DESCRIPTION_PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
    format!("{}…", cut.trim_end())
}

fn format_course_info(course: &CourseDetails) -> String {
    let mut out = format!("**{}**\n\n", course.label);
    out.push_str(&format!("Niveau : {}\n", course.level));
    out.push_str(&format!("Durée : {}\n", course.duration));
    out.push_str(&format!("Format : {}\n", course.format));

    if !course.modules.is_empty() {
        out.push_str("\nProgramme :\n");
        for (i, module) in course.modules.iter().enumerate() {
            out.push_str(&format!("{}. {} — {}", i + 1, module.title, module.description));
            if !module.topics.is_empty() {
                let topics: Vec<&str> =
                    module.topics.iter().take(3).map(String::as_str).collect();
                out.push_str(&format!(" ({})", topics.join(", ")));
            }
            out.push('\n');
        }
    }

    if !course.instructors.is_empty() {
        out.push_str("\nFormateurs :\n");
        for instructor in &course.instructors {
            out.push_str(&format!("{}, {}\n", instructor.name, instructor.title));
        }
    }

    if !course.skills.is_empty() {
        out.push_str("\nCompétences visées :\n");
        for skill in &course.skills {
            out.push_str(&format!("- {}\n", skill));
        }
    }

    if !course.certifications.is_empty() {
        out.push_str("\nCertifications :\n");
        for cert in &course.certifications {
            out.push_str(&format!("- {}\n", cert));
        }
    }

    if let Some(t) = course.testimonials.first() {
        out.push_str(&format!("\nTémoignage : « {} » — {}\n", t.quote, t.author));
    }

    out.trim_end().to_string()
}

/// Sort descending by score (stable: ties keep store order), keep the top
/// `max_results`.
fn format_search_results(mut hits: Vec<SearchHit>, max_results: usize) -> String {
    if hits.is_empty() {
        return "Aucune formation ne correspond à cette recherche.".to_string();
    }
    hits.sort_by(|a, b| b.score.cmp(&a.score));
    hits.truncate(max_results);

    let mut out = String::from("Formations correspondantes :\n");
    for hit in &hits {
        out.push_str(&format!("• {} — {}", hit.label, preview(&hit.description)));
        if !hit.matched_skills.is_empty() {
            out.push_str(&format!(" — compétences : {}", hit.matched_skills.join(", ")));
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

fn format_catalog(courses: &[CourseSummary]) -> String {
    if courses.is_empty() {
        return "Le catalogue est vide pour le moment.".to_string();
    }
    let mut out = String::from("Notre catalogue :\n");
    for course in courses {
        out.push_str(&format!(
            "• {} ({}) — {} — {} inscrits / {:.1}/5\n",
            course.label,
            course.level,
            preview(&course.description),
            course.enrolled,
            course.rating,
        ));
    }
    out.trim_end().to_string()
}

fn format_assessment(a: &PrereqAssessment) -> String {
    let headline = match a.recommendation {
        Recommendation::ExcellentFit => "✅ Formation accessible",
        Recommendation::Suitable => "👍 Profil adapté",
        Recommendation::Challenging => "⚠️ Préparation recommandée",
    };
    let mut out = format!("{} — {}\n", headline, a.course_label);
    out.push_str(&format!("Confiance : {:.0}%\n", a.confidence * 100.0));
    for note in &a.notes {
        out.push_str(&format!("- {}\n", note));
    }
    if !a.preparation.is_empty() {
        out.push_str("\nPour vous préparer :\n");
        for step in &a.preparation {
            out.push_str(&format!("- {}\n", step));
        }
    }
    out.trim_end().to_string()
}

fn format_registration(outcome: &RegistrationOutcome) -> String {
    if outcome.registered {
        let dossier = outcome.registration_id.as_deref().unwrap_or("—");
        format!(
            "✅ Votre inscription est enregistrée (dossier {dossier}).\n\n\
             Prochaines étapes :\n\
             - Vous recevrez un e-mail de confirmation sous 24 h.\n\
             - Un conseiller vous contactera pour finaliser le financement.\n\
             - Les accès à la plateforme arrivent une semaine avant la session."
        )
    } else {
        format!(
            "❌ L'inscription n'a pas pu être enregistrée ({}). \
             Merci de réessayer ou de contacter notre équipe.",
            outcome.error.as_deref().unwrap_or("erreur inconnue")
        )
    }
}

// ---------------------------------------------------------------------------
// Template fallback
// ---------------------------------------------------------------------------

/// Template reply for turns with no usable tool result. Returns (text,
/// confidence, template key).
fn template_reply(message: &str, course_id: Option<&str>) -> (String, f32, &'static str) {
    let lower = message.to_lowercase();
    let contains_any = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if contains_any(&["bonjour", "bonsoir", "salut", "hello"]) {
        let text = match course_id {
            Some(_) => {
                "Bonjour ! Je peux vous renseigner sur cette formation : programme, \
                 durée, prérequis, tarifs ou inscription. Que souhaitez-vous savoir ?"
            }
            None => {
                "Bonjour ! Je suis l'assistant du centre de formation. Je peux vous \
                 présenter le catalogue, détailler une formation ou vous aider à \
                 vous inscrire. Comment puis-je vous aider ?"
            }
        };
        return (text.to_string(), 0.95, "greeting");
    }

    if contains_any(&["tarif", "prix", "coût", "combien"]) {
        let text = match course_id {
            Some(_) => {
                "Le tarif de cette formation figure sur sa fiche, et la plupart de \
                 nos sessions sont finançables via CPF ou OPCO. Un conseiller peut \
                 vous établir un devis personnalisé."
            }
            None => {
                "Nos tarifs dépendent de la formation choisie ; la plupart des \
                 sessions sont finançables via CPF ou OPCO. Dites-moi quelle \
                 formation vous intéresse et je vous donnerai le détail."
            }
        };
        return (text.to_string(), 0.9, "pricing");
    }

    if contains_any(&["inscri"]) {
        let text =
            "Pour vous inscrire, remplissez le formulaire d'inscription avec vos \
             coordonnées : un conseiller vous rappelle sous 24 h pour valider votre \
             dossier et le financement.";
        return (text.to_string(), 0.92, "registration");
    }

    if course_id.is_some() && contains_any(&["formation", "cours", "programme"]) {
        let text =
            "Je peux détailler le programme, les formateurs, les prérequis ou les \
             modalités de cette formation. Que souhaitez-vous approfondir ?";
        return (text.to_string(), 0.85, "course");
    }

    (
        "Je peux vous renseigner sur nos formations : catalogue, programmes, \
         prérequis, tarifs et inscriptions. Posez-moi votre question !"
            .to_string(),
        0.7,
        "default",
    )
}
