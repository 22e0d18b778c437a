//! Behavior analysis engine.
//!
//! Evaluates a call transcript against the account's active behavior rubrics,
//! one model call per rubric. The engine is run-once per call: an existing
//! feedback row with a non-empty evaluation list short-circuits re-analysis
//! so scores stay auditable across repeated visits. Every rubric always gets
//! exactly one evaluation, falling back to a deterministic `no cumple` when
//! both the capable model and the economy retry fail.

use crate::error::Error;
use call_ai::types::completion::{CompletionRequest, ModelTier};
use call_ai::CompletionModel;
use entity::behavior_evaluation::{BehaviorEvaluation, Evaluation};
use entity::{behaviors, Id};
use crate::{behavior, call};
use entity_api::feedback_record;
use log::*;
use regex::Regex;
use sea_orm::DatabaseConnection;
use std::sync::OnceLock;

/// Truncation marker inserted where transcript text was cut to fit the
/// prompt budget.
pub const TRUNCATION_MARKER: &str = "[... transcripción truncada ...]";

/// Character cap applied to the transcript in the simplified retry prompt.
const RETRY_TRANSCRIPT_CAP: usize = 4_000;

const EVALUATION_SYSTEM_PROMPT: &str = "Eres un evaluador de calidad de llamadas de un centro \
de atención telefónica. Evalúas si el asesor cumple un comportamiento específico según la \
transcripción. Responde únicamente con un objeto JSON, sin texto adicional, con esta forma \
exacta: {\"evaluation\": \"cumple\" o \"no cumple\", \"comments\": \"justificación breve\"}.";

/// Language-dependent correction heuristics, injectable so the phrase tables
/// can be tuned per tenant without touching the engine.
#[derive(Debug, Clone)]
pub struct CorrectionConfig {
    /// Comment phrases that contradict a `cumple` verdict.
    pub negation_phrases: Vec<String>,
    /// Extracts the required sub-condition count from the rubric criterion.
    pub required_count_pattern: Regex,
    /// Extract the admitted sub-condition count from the model's comments.
    pub achieved_count_patterns: Vec<Regex>,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        let negation_phrases = [
            "no se identificó",
            "no se identifico",
            "no cumple con el mínimo",
            "no cumple con el minimo",
            "no cumplió",
            "no cumplio",
            "no se evidenció",
            "no se evidencio",
            "no realizó",
            "no realizo",
            "no mencionó",
            "no menciono",
            "no saludó",
            "no saludo",
            "no verificó",
            "no verifico",
            "no ofreció",
            "no ofrecio",
            "incumple",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        // Patterns are fixed at compile time; construction cannot fail.
        Self {
            negation_phrases,
            required_count_pattern: Regex::new(r"(?i)al menos (\d+)").unwrap(),
            achieved_count_patterns: vec![
                Regex::new(r"(?i)(?:solo|sólo|únicamente) cumpli[oó] con (\d+)").unwrap(),
                Regex::new(r"(?i)cumpli[oó] (?:con )?(\d+) de \d+").unwrap(),
                Regex::new(r"(?i)(?:solo|sólo|únicamente) (?:mencion[oó]|present[oó]) (\d+)")
                    .unwrap(),
            ],
        }
    }
}

/// Evaluation fields parsed out of the model's raw response.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEvaluation {
    pub evaluation: Evaluation,
    pub comments: String,
}

fn fenced_json_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Pattern is fixed at compile time; construction cannot fail.
        Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap()
    })
}

/// Extracts a JSON object from raw model text.
///
/// Tries, in order: a fenced code block, a bare object delimited by the
/// outermost braces, and the text as-is.
pub fn extract_json(raw: &str) -> Option<serde_json::Value> {
    if let Some(captures) = fenced_json_pattern().captures(raw) {
        if let Some(fenced) = captures.get(1) {
            if let Ok(value) = serde_json::from_str(fenced.as_str()) {
                return Some(value);
            }
        }
    }

    if let (Some(open), Some(close)) = (raw.find('{'), raw.rfind('}')) {
        if open < close {
            if let Ok(value) = serde_json::from_str(&raw[open..=close]) {
                return Some(value);
            }
        }
    }

    serde_json::from_str(raw.trim()).ok()
}

/// Parses and validates one evaluation response.
///
/// Returns `None` when no JSON can be extracted, the verdict is not one of
/// the two allowed values, or required fields are missing.
pub fn parse_evaluation(raw: &str) -> Option<ParsedEvaluation> {
    let value = extract_json(raw)?;
    let evaluation = Evaluation::parse(value.get("evaluation")?.as_str()?)?;
    let comments = value
        .get("comments")
        .and_then(|comments| comments.as_str())
        .unwrap_or("")
        .trim()
        .to_string();

    Some(ParsedEvaluation {
        evaluation,
        comments,
    })
}

/// Overrides a `cumple` verdict that the model's own comments contradict.
///
/// Fires when the comments contain a known negation phrase, or when the
/// rubric requires meeting at least N sub-conditions and the comments admit
/// meeting fewer.
pub fn apply_consistency_correction(
    evaluation: Evaluation,
    comments: &str,
    criterion: &str,
    config: &CorrectionConfig,
) -> Evaluation {
    if evaluation == Evaluation::NoCumple {
        return evaluation;
    }

    let lowered = comments.to_lowercase();
    if config
        .negation_phrases
        .iter()
        .any(|phrase| lowered.contains(phrase.as_str()))
    {
        debug!("Consistency correction: negation phrase contradicts 'cumple'");
        return Evaluation::NoCumple;
    }

    if let Some(required) = config
        .required_count_pattern
        .captures(criterion)
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
    {
        let achieved = config
            .achieved_count_patterns
            .iter()
            .filter_map(|pattern| {
                pattern
                    .captures(comments)
                    .and_then(|captures| captures.get(1))
                    .and_then(|m| m.as_str().parse::<u32>().ok())
            })
            .next();

        if let Some(achieved) = achieved {
            if achieved < required {
                debug!(
                    "Consistency correction: comments admit {achieved} of {required} required"
                );
                return Evaluation::NoCumple;
            }
        }
    }

    Evaluation::Cumple
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Builds the evaluation prompt for one rubric, truncating the transcript
/// (never the instructional scaffolding) to stay within the length budget.
pub fn build_evaluation_prompt(
    behavior: &behaviors::Model,
    transcript: &str,
    length_budget: usize,
) -> String {
    let scaffold = format!(
        "Comportamiento a evaluar: {}\nDescripción: {}\nCriterio de evaluación: {}\n\n\
         Transcripción de la llamada:\n",
        behavior.name, behavior.description, behavior.prompt
    );

    let scaffold_chars = scaffold.chars().count();
    let transcript_chars = transcript.chars().count();

    if scaffold_chars + transcript_chars <= length_budget {
        format!("{scaffold}{transcript}")
    } else {
        let marker_chars = TRUNCATION_MARKER.chars().count() + 1;
        let room = length_budget.saturating_sub(scaffold_chars + marker_chars);
        format!(
            "{scaffold}{}\n{TRUNCATION_MARKER}",
            truncate_chars(transcript, room)
        )
    }
}

fn build_retry_prompt(behavior: &behaviors::Model, transcript: &str) -> String {
    format!(
        "Evalúa si el asesor cumple con \"{}\" en esta llamada. Responde solo con JSON: \
         {{\"evaluation\": \"cumple\" o \"no cumple\", \"comments\": \"justificación breve\"}}\n\n\
         Llamada:\n{}",
        behavior.name,
        truncate_chars(transcript, RETRY_TRANSCRIPT_CAP)
    )
}

async fn evaluate_one(
    model: &dyn CompletionModel,
    behavior: &behaviors::Model,
    transcript: &str,
    config: &CorrectionConfig,
    length_budget: usize,
) -> BehaviorEvaluation {
    let prompt = build_evaluation_prompt(behavior, transcript, length_budget);
    let request = CompletionRequest::new(prompt).with_system(EVALUATION_SYSTEM_PROMPT);

    let first_attempt = match model.complete(request).await {
        Ok(raw) => match parse_evaluation(&raw) {
            Some(parsed) => return finish(parsed, behavior, config, false),
            None => {
                warn!(
                    "Unparseable evaluation response for behavior '{}', retrying simplified",
                    behavior.name
                );
                "respuesta no interpretable".to_string()
            }
        },
        Err(e) => {
            warn!(
                "Evaluation of behavior '{}' failed ({e}), retrying with economy model",
                behavior.name
            );
            e.to_string()
        }
    };

    let retry_request =
        CompletionRequest::new(build_retry_prompt(behavior, transcript)).with_tier(ModelTier::Economy);

    match model.complete(retry_request).await {
        Ok(raw) => match parse_evaluation(&raw) {
            Some(parsed) => finish(parsed, behavior, config, true),
            None => fallback(behavior, "la respuesta del modelo no fue interpretable"),
        },
        Err(e) => {
            error!(
                "Retry evaluation of behavior '{}' also failed: {e}",
                behavior.name
            );
            fallback(behavior, &first_attempt)
        }
    }
}

fn finish(
    parsed: ParsedEvaluation,
    behavior: &behaviors::Model,
    config: &CorrectionConfig,
    simplified: bool,
) -> BehaviorEvaluation {
    let criterion = format!("{} {}", behavior.description, behavior.prompt);
    let evaluation =
        apply_consistency_correction(parsed.evaluation, &parsed.comments, &criterion, config);

    let comments = if simplified {
        format!("{} (análisis simplificado)", parsed.comments)
    } else {
        parsed.comments
    };

    BehaviorEvaluation {
        behavior_name: behavior.name.clone(),
        evaluation,
        comments,
    }
}

fn fallback(behavior: &behaviors::Model, detail: &str) -> BehaviorEvaluation {
    BehaviorEvaluation {
        behavior_name: behavior.name.clone(),
        evaluation: Evaluation::NoCumple,
        comments: format!("No se pudo evaluar este comportamiento automáticamente: {detail}"),
    }
}

/// Evaluates every rubric against the transcript.
///
/// Always returns exactly one evaluation per input behavior, in input order,
/// even when every model call fails. Evaluations are independent; a failure
/// on one rubric never affects the others.
pub async fn evaluate_behaviors(
    model: &dyn CompletionModel,
    behaviors: &[behaviors::Model],
    transcript: &str,
    config: &CorrectionConfig,
    length_budget: usize,
) -> Vec<BehaviorEvaluation> {
    let mut evaluations = Vec::with_capacity(behaviors.len());

    for behavior in behaviors {
        let evaluation = evaluate_one(model, behavior, transcript, config, length_budget).await;
        debug!(
            "Behavior '{}' evaluated as {}",
            behavior.name, evaluation.evaluation
        );
        evaluations.push(evaluation);
    }

    evaluations
}

/// Runs behavior analysis for one call and persists the results.
///
/// Short-circuits when the call's feedback row already carries evaluations.
/// Fails fast when no active behaviors are resolvable for the account.
pub async fn analyze_call(
    db: &DatabaseConnection,
    model: &dyn CompletionModel,
    call_id: Id,
    selected_behavior_ids: Option<&[Id]>,
    config: &CorrectionConfig,
    length_budget: usize,
) -> Result<entity::feedback::Model, Error> {
    if let Some(existing) = feedback_record::find_by_call_id(db, call_id).await? {
        if !existing.behaviors_analysis.is_empty() {
            info!("Call {call_id} already has behavior analysis, returning existing feedback");
            return Ok(existing);
        }
    }

    let call = call::find_by_id(db, call_id).await?;
    let transcript = call
        .transcription
        .clone()
        .filter(|transcription| !transcription.trim().is_empty())
        .ok_or_else(|| Error::invalid("Call has no transcription to analyze"))?;

    let behaviors = match selected_behavior_ids {
        Some(ids) if !ids.is_empty() => {
            behavior::find_active_by_ids(db, call.account_id, ids).await?
        }
        _ => behavior::find_active_for_account(db, call.account_id).await?,
    };

    if behaviors.is_empty() {
        return Err(Error::invalid(
            "No active behaviors configured for this account",
        ));
    }

    info!(
        "Analyzing call {call_id} against {} active behaviors",
        behaviors.len()
    );

    let evaluations = evaluate_behaviors(model, &behaviors, &transcript, config, length_budget).await;

    crate::feedback::apply_behavior_results(db, call_id, call.summary.as_deref(), evaluations).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use call_ai::{Error as CallAiError, MockCompletionModel};

    fn test_behavior(name: &str, criterion: &str) -> behaviors::Model {
        behaviors::Model {
            id: entity::Id::new_v4(),
            account_id: None,
            name: name.to_string(),
            description: format!("Descripción de {name}"),
            prompt: criterion.to_string(),
            is_active: true,
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        }
    }

    #[test]
    fn extract_json_handles_fenced_blocks() {
        let raw = "Claro, aquí está:\n```json\n{\"evaluation\": \"cumple\", \"comments\": \"ok\"}\n```";
        let value = extract_json(raw).unwrap();
        assert_eq!(value["evaluation"], "cumple");
    }

    #[test]
    fn extract_json_handles_bare_objects_with_surrounding_prose() {
        let raw = "La evaluación es: {\"evaluation\": \"no cumple\", \"comments\": \"falta saludo\"} espero sirva";
        let value = extract_json(raw).unwrap();
        assert_eq!(value["evaluation"], "no cumple");
    }

    #[test]
    fn extract_json_rejects_malformed_text() {
        assert!(extract_json("no hay json aquí").is_none());
        assert!(extract_json("{rotó: el json").is_none());
    }

    #[test]
    fn parse_evaluation_rejects_unknown_verdicts() {
        let raw = r#"{"evaluation": "parcial", "comments": "más o menos"}"#;
        assert!(parse_evaluation(raw).is_none());
    }

    #[test]
    fn negation_phrase_overrides_cumple_verdict() {
        let config = CorrectionConfig::default();
        let corrected = apply_consistency_correction(
            Evaluation::Cumple,
            "El asesor no verificó los datos del cliente",
            "Verificar identidad",
            &config,
        );
        assert_eq!(corrected, Evaluation::NoCumple);
    }

    #[test]
    fn n_of_m_shortfall_overrides_cumple_verdict() {
        let config = CorrectionConfig::default();
        let corrected = apply_consistency_correction(
            Evaluation::Cumple,
            "El asesor solo cumplió con 1 argumento de venta",
            "Debe presentar al menos 2 argumentos de venta",
            &config,
        );
        assert_eq!(corrected, Evaluation::NoCumple);
    }

    #[test]
    fn consistent_cumple_verdict_is_preserved() {
        let config = CorrectionConfig::default();
        let corrected = apply_consistency_correction(
            Evaluation::Cumple,
            "El asesor saludó y se identificó correctamente",
            "Saludo inicial",
            &config,
        );
        assert_eq!(corrected, Evaluation::Cumple);
    }

    #[test]
    fn prompt_truncation_preserves_scaffolding_and_marks_the_cut() {
        let behavior = test_behavior("Saludo inicial", "Debe saludar");
        let transcript = "palabra ".repeat(5_000);
        let prompt = build_evaluation_prompt(&behavior, &transcript, 2_000);

        assert!(prompt.chars().count() <= 2_000);
        assert!(prompt.contains("Saludo inicial"));
        assert!(prompt.contains("Criterio de evaluación"));
        assert!(prompt.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn short_transcripts_are_not_truncated() {
        let behavior = test_behavior("Saludo inicial", "Debe saludar");
        let prompt = build_evaluation_prompt(&behavior, "Asesor: buenos días", 12_000);
        assert!(!prompt.contains(TRUNCATION_MARKER));
        assert!(prompt.ends_with("Asesor: buenos días"));
    }

    #[tokio::test]
    async fn engine_produces_one_evaluation_per_behavior_under_total_failure() {
        let mut model = MockCompletionModel::new();
        model
            .expect_complete()
            .returning(|_| Err(CallAiError::Network("503".to_string())));

        let behaviors = vec![
            test_behavior("Saludo inicial", "Debe saludar"),
            test_behavior("Escucha activa", "Debe parafrasear"),
            test_behavior("Cierre", "Debe cerrar la llamada"),
        ];

        let evaluations = evaluate_behaviors(
            &model,
            &behaviors,
            "transcripción",
            &CorrectionConfig::default(),
            12_000,
        )
        .await;

        assert_eq!(evaluations.len(), 3);
        for (behavior, evaluation) in behaviors.iter().zip(&evaluations) {
            assert_eq!(evaluation.behavior_name, behavior.name);
            assert_eq!(evaluation.evaluation, Evaluation::NoCumple);
            assert!(evaluation.comments.contains("No se pudo evaluar"));
        }
    }

    #[tokio::test]
    async fn failed_first_attempt_retries_on_economy_tier() {
        let mut model = MockCompletionModel::new();
        model
            .expect_complete()
            .withf(|request| request.tier == ModelTier::Capable)
            .times(1)
            .returning(|_| Err(CallAiError::Timeout("deadline".to_string())));
        model
            .expect_complete()
            .withf(|request| request.tier == ModelTier::Economy && request.system.is_none())
            .times(1)
            .returning(|_| {
                Ok(r#"{"evaluation": "cumple", "comments": "Saluda al inicio"}"#.to_string())
            });

        let behaviors = vec![test_behavior("Saludo inicial", "Debe saludar")];
        let evaluations = evaluate_behaviors(
            &model,
            &behaviors,
            "transcripción",
            &CorrectionConfig::default(),
            12_000,
        )
        .await;

        assert_eq!(evaluations.len(), 1);
        assert_eq!(evaluations[0].evaluation, Evaluation::Cumple);
        assert!(evaluations[0].comments.ends_with("(análisis simplificado)"));
    }

    #[cfg(feature = "mock")]
    #[tokio::test]
    async fn existing_evaluations_short_circuit_reanalysis() {
        use entity::behavior_evaluation::BehaviorEvaluations;
        use entity::phrase_list::PhraseList;
        use sea_orm::{DatabaseBackend, MockDatabase};

        let now = chrono::Utc::now();
        let existing = entity::feedback::Model {
            id: entity::Id::new_v4(),
            call_id: entity::Id::new_v4(),
            score: 50,
            positive: PhraseList::default(),
            negative: PhraseList::default(),
            opportunities: PhraseList::default(),
            behaviors_analysis: BehaviorEvaluations(vec![BehaviorEvaluation {
                behavior_name: "Saludo inicial".to_string(),
                evaluation: Evaluation::Cumple,
                comments: "Saluda y se identifica".to_string(),
            }]),
            sentiment: None,
            topics: None,
            entities: None,
            created_at: now.into(),
            updated_at: now.into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .into_connection();

        // No expectations: any completion call would panic.
        let model = MockCompletionModel::new();

        let result = analyze_call(
            &db,
            &model,
            existing.call_id,
            None,
            &CorrectionConfig::default(),
            12_000,
        )
        .await
        .unwrap();

        assert_eq!(result.id, existing.id);
        assert_eq!(result.behaviors_analysis, existing.behaviors_analysis);
    }

    #[tokio::test]
    async fn correction_is_applied_to_parsed_responses() {
        let mut model = MockCompletionModel::new();
        model.expect_complete().returning(|_| {
            Ok(
                r#"{"evaluation": "cumple", "comments": "El asesor no verificó los datos del cliente"}"#
                    .to_string(),
            )
        });

        let behaviors = vec![test_behavior("Verificación", "Debe verificar identidad")];
        let evaluations = evaluate_behaviors(
            &model,
            &behaviors,
            "transcripción",
            &CorrectionConfig::default(),
            12_000,
        )
        .await;

        assert_eq!(evaluations[0].evaluation, Evaluation::NoCumple);
    }
}
