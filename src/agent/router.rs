//! Intent router: map a user message + session context to tool invocations.
//!
//! Matching is an ordered rule table of `(applies, tool, params)` entries
//! over the lowercased message: conservative keyword matching, no
//! classifier. Ambiguous messages emit zero intents and the composer falls
//! back to conversational templates.

use serde_json::Value;

/// Message views handed to rules: raw text (forwarded to tools that want the
/// user's own words) and a lowercased copy for matching.
#[derive(Debug)]
pub struct RouteMessage<'a> {
    pub raw: &'a str,
    pub lowered: String,
}

impl<'a> RouteMessage<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self {
            raw,
            lowered: raw.to_lowercase(),
        }
    }

    fn contains_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.lowered.contains(n))
    }
}

#[derive(Debug, Clone)]
pub struct RouteCtx<'a> {
    pub course_id: Option<&'a str>,
}

/// One resolved intent: which tool to run, with which parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolIntent {
    pub tool: &'static str,
    pub params: Value,
}

/// One row of the rule table.
struct Rule {
    tool: &'static str,
    applies: fn(&RouteMessage<'_>, &RouteCtx<'_>) -> bool,
    params: fn(&RouteMessage<'_>, &RouteCtx<'_>) -> Value,
}

/// Vocabulary the rules match on. Keep lowercase.
const COURSE_KEYWORDS: &[&str] = &[
    "programme",
    "module",
    "formateur",
    "durée",
    "prérequis",
    "compétence",
    "certificat",
    "niveau",
    "témoignage",
    "avis",
    "inscription",
    "tarif",
    "prix",
];

const TECH_KEYWORDS: &[&str] = &[
    "python",
    "aws",
    "docker",
    "design",
    "sécurité",
    "ia",
    "github",
    "terraform",
];

const ALL_COURSES_PHRASES: &[&str] = &[
    "toutes les formations",
    "toutes vos formations",
    "liste des formations",
    "quelles formations",
    "catalogue",
];

const PREREQ_PHRASES: &[&str] = &["prérequis", "pré-requis", "niveau requis", "faut-il", "dois-je"];

fn matched_tech_keyword(msg: &RouteMessage<'_>) -> Option<&'static str> {
    TECH_KEYWORDS.iter().find(|k| msg.lowered.contains(*k)).copied()
}

fn course_info_params(_msg: &RouteMessage<'_>, ctx: &RouteCtx<'_>) -> Value {
    serde_json::json!({ "course_id": ctx.course_id })
}

fn rules() -> Vec<Rule> {
    vec![
        // Course-scoped vocabulary while a course is in focus: make sure the
        // reply is grounded in the current course record.
        Rule {
            tool: "get_course_info",
            applies: |msg, ctx| ctx.course_id.is_some() && msg.contains_any(COURSE_KEYWORDS),
            params: course_info_params,
        },
        Rule {
            tool: "search_courses",
            applies: |msg, _ctx| {
                msg.lowered.contains("formation") && matched_tech_keyword(msg).is_some()
            },
            params: |msg, _ctx| {
                serde_json::json!({ "query": matched_tech_keyword(msg).unwrap_or_default() })
            },
        },
        Rule {
            tool: "get_all_courses",
            applies: |msg, _ctx| msg.contains_any(ALL_COURSES_PHRASES),
            params: |_msg, _ctx| serde_json::json!({}),
        },
        Rule {
            tool: "check_prerequisites",
            applies: |msg, ctx| ctx.course_id.is_some() && msg.contains_any(PREREQ_PHRASES),
            params: |msg, ctx| {
                serde_json::json!({
                    "course_id": ctx.course_id,
                    "user_experience": msg.raw,
                })
            },
        },
    ]
}

/// Rule-table router. Construct once, reuse across turns.
pub struct IntentRouter {
    rules: Vec<Rule>,
}

impl Default for IntentRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentRouter {
    pub fn new() -> Self {
        Self { rules: rules() }
    }

    /// Resolve the tool calls for one turn, in emission order. With a course
    /// in focus, `get_course_info` always comes first; no (tool, params)
    /// pair is emitted twice.
    pub fn route(&self, message: &str, ctx: &RouteCtx<'_>) -> Vec<ToolIntent> {
        let msg = RouteMessage::new(message);
        let mut intents: Vec<ToolIntent> = Vec::new();

        if ctx.course_id.is_some() {
            intents.push(ToolIntent {
                tool: "get_course_info",
                params: course_info_params(&msg, ctx),
            });
        }

        for rule in &self.rules {
            if !(rule.applies)(&msg, ctx) {
                continue;
            }
            let intent = ToolIntent {
                tool: rule.tool,
                params: (rule.params)(&msg, ctx),
            };
            if !intents.contains(&intent) {
                intents.push(intent);
            }
        }

        intents
    }
}
