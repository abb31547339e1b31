//! `create_registration` tool: insert one lead-form registration.
//!
//! A form pointing at an unknown course is a user-visible failure (rendered
//! by the composer), not a handler error; only store trouble surfaces as one.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{CourseStore, NewRegistration, StoreError};
use crate::tools::context::ToolCtx;
use crate::tools::registry::{BoxFuture, Tool, ToolError, execution_error, parse_params};

#[derive(Debug, Deserialize)]
struct Params {
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    #[serde(default)]
    course_id: Option<String>,
    #[serde(default)]
    whatsapp: bool,
}

/// Outcome returned to the composer: either a dossier id or a retryable failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationOutcome {
    pub registered: bool,
    pub course_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn non_empty(value: &str, field: &str) -> Result<(), ToolError> {
    if value.trim().is_empty() {
        return Err(ToolError::InvalidParameters(format!(
            "'{field}' must not be empty"
        )));
    }
    Ok(())
}

pub struct CreateRegistration {
    store: Arc<dyn CourseStore>,
}

impl CreateRegistration {
    pub fn new(store: Arc<dyn CourseStore>) -> Self {
        Self { store }
    }
}

impl Tool for CreateRegistration {
    fn name(&self) -> &str {
        "create_registration"
    }

    fn description(&self) -> &str {
        "Enregistre une demande d'inscription à une formation (nom, e-mail, \
         téléphone)."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "first_name": { "type": "string" },
                "last_name": { "type": "string" },
                "email": { "type": "string" },
                "phone": { "type": "string" },
                "course_id": {
                    "type": "string",
                    "description": "Identifiant de la formation. Par défaut, la \
                        formation en cours de discussion."
                },
                "whatsapp": {
                    "type": "boolean",
                    "description": "L'utilisateur accepte d'être contacté via WhatsApp."
                }
            },
            "required": ["first_name", "last_name", "email", "phone"]
        })
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a ToolCtx,
        args: &'a Value,
    ) -> BoxFuture<'a, Result<Value, ToolError>> {
        let store = Arc::clone(&self.store);

        Box::pin(async move {
            let params: Params = parse_params(args)?;
            non_empty(&params.first_name, "first_name")?;
            non_empty(&params.last_name, "last_name")?;
            non_empty(&params.phone, "phone")?;
            non_empty(&params.email, "email")?;
            if !params.email.contains('@') {
                return Err(ToolError::InvalidParameters(
                    "'email' must be a valid address".to_string(),
                ));
            }
            let course_id = params
                .course_id
                .or_else(|| ctx.course_id.clone())
                .ok_or_else(|| {
                    ToolError::InvalidParameters(
                        "missing 'course_id' and no course in context".to_string(),
                    )
                })?;

            let reg = NewRegistration {
                first_name: params.first_name.trim().to_string(),
                last_name: params.last_name.trim().to_string(),
                email: params.email.trim().to_string(),
                phone: params.phone.trim().to_string(),
                course_id: course_id.clone(),
                whatsapp: params.whatsapp,
            };
            let result = tokio::task::spawn_blocking(move || store.create_registration(&reg)).await;

            let outcome = match result {
                Ok(Ok(record)) => RegistrationOutcome {
                    registered: true,
                    course_id,
                    registration_id: Some(record.id),
                    error: None,
                },
                Ok(Err(StoreError::UnknownCourse(id))) => RegistrationOutcome {
                    registered: false,
                    course_id,
                    registration_id: None,
                    error: Some(format!("formation inconnue: {id}")),
                },
                Ok(Err(e)) => return Err(execution_error("create_registration", e)),
                Err(e) => {
                    return Err(execution_error(
                        "create_registration",
                        format!("task error: {e}"),
                    ));
                }
            };

            serde_json::to_value(&outcome).map_err(|e| execution_error("create_registration", e))
        })
    }
}
