//! Summarization stage.
//!
//! Produces a narrative summary of the transcript. Prompt resolution order is
//! caller override, then the account's active summary prompt row, then the
//! built-in default. Summarization failure never aborts the pipeline; the
//! stage degrades to a fixed error string so downstream stages can still run
//! on the transcript alone.

use crate::error::Error;
use call_ai::types::completion::CompletionRequest;
use call_ai::CompletionModel;
use entity::prompt_type::PromptType;
use entity::Id;
use entity_api::prompt;
use log::*;
use sea_orm::DatabaseConnection;

/// Default system prompt used when the account has no active summary prompt.
pub const DEFAULT_SUMMARY_PROMPT: &str = "Eres un analista de calidad de un centro de atención \
telefónica. Resume la siguiente transcripción de una llamada comercial en español. El resumen \
debe incluir: el motivo principal de la llamada, la resolución propuesta por el asesor, el \
resultado de la llamada, observaciones sobre la calidad del servicio, el producto o servicio \
tratado, si hubo intento de venta cruzada y las oportunidades de mejora que observes. Sé \
concreto y usa un tono profesional.";

/// Fixed text stored when the model call fails. Kept as data, not an error,
/// so a call with failed summarization can still get behavior scores.
pub const SUMMARY_UNAVAILABLE: &str =
    "Resumen no disponible: el análisis automático falló para esta llamada.";

/// Resolves the system prompt for summarizing one account's call.
pub async fn resolve_prompt(
    db: &DatabaseConnection,
    account_id: Id,
    override_prompt: Option<&str>,
) -> Result<String, Error> {
    if let Some(override_prompt) = override_prompt {
        let trimmed = override_prompt.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }

    if let Some(active) = prompt::find_active(db, account_id, PromptType::Summary).await? {
        return Ok(active.content);
    }

    Ok(DEFAULT_SUMMARY_PROMPT.to_string())
}

/// Summarizes a transcript with the given system prompt.
///
/// Temperature favors some narrative variability; this is qualitative text,
/// not a scored decision.
pub async fn summarize(
    model: &dyn CompletionModel,
    system_prompt: &str,
    transcript_text: &str,
) -> String {
    let request = CompletionRequest::new(transcript_text)
        .with_system(system_prompt)
        .with_temperature(0.7);

    match model.complete(request).await {
        Ok(summary) => summary.trim().to_string(),
        Err(e) => {
            warn!("Summarization failed, storing placeholder: {e}");
            SUMMARY_UNAVAILABLE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use call_ai::{Error as CallAiError, MockCompletionModel};

    #[tokio::test]
    async fn summarize_returns_trimmed_model_output() {
        let mut model = MockCompletionModel::new();
        model
            .expect_complete()
            .withf(|request| {
                request.system.as_deref() == Some(DEFAULT_SUMMARY_PROMPT)
                    && request.temperature > 0.5
            })
            .returning(|_| Ok("  El cliente llamó por su factura.  ".to_string()));

        let summary = summarize(&model, DEFAULT_SUMMARY_PROMPT, "[00:01] Asesor: Buenos días").await;
        assert_eq!(summary, "El cliente llamó por su factura.");
    }

    #[tokio::test]
    async fn summarize_degrades_to_placeholder_on_failure() {
        let mut model = MockCompletionModel::new();
        model
            .expect_complete()
            .returning(|_| Err(CallAiError::Network("503".to_string())));

        let summary = summarize(&model, DEFAULT_SUMMARY_PROMPT, "texto").await;
        assert_eq!(summary, SUMMARY_UNAVAILABLE);
    }
}
