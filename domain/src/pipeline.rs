//! Pipeline orchestration.
//!
//! The invocation boundary between the web layer and the core pipeline:
//! transcription, summarization, general feedback and automatic behavior
//! analysis for one call. The call row's status and progress are the durable
//! record of where a call is; a restarted process can pick up from that row.
//! Partial success is always preferred: a failed summary or feedback stage
//! never prevents the stages that can still run.

use crate::behavior_analysis::{self, CorrectionConfig};
use crate::error::Error;
use crate::gateway::completion::CompletionClient;
use crate::gateway::speech::{download_audio, SpeechClient};
use crate::transcript::{KeywordClassifier, Transcript, TRANSCRIPTION_PROMPT};
use crate::{feedback, summary};
use call_ai::types::transcript::TranscribeRequest;
use call_ai::{CompletionModel, Transcriber};
use entity::call_status::CallStatus;
use entity::prompt_type::PromptType;
use entity::Id;
use crate::{call, prompt, usage};
use log::*;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use service::config::Config;
use std::sync::Arc;
use std::time::Duration;

/// Audio below this size is treated as having no analyzable content, without
/// spending a transcription call on it.
const MIN_AUDIO_BYTES: usize = 10 * 1024;

/// Summary stored when the recording has no analyzable conversation.
pub const NO_CONTENT_SUMMARY: &str =
    "La llamada no contiene contenido válido para analizar (audio vacío o de un solo hablante).";

/// One pipeline invocation.
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub call_id: Id,
    pub audio_url: String,
    pub summary_prompt_override: Option<String>,
    pub feedback_prompt_override: Option<String>,
    pub selected_behavior_ids: Option<Vec<Id>>,
}

impl ProcessRequest {
    pub fn new(call_id: Id, audio_url: impl Into<String>) -> Self {
        Self {
            call_id,
            audio_url: audio_url.into(),
            summary_prompt_override: None,
            feedback_prompt_override: None,
            selected_behavior_ids: None,
        }
    }
}

/// What one pipeline invocation produced.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub success: bool,
    pub call_id: Id,
    pub message: String,
    pub has_valid_content: bool,
    pub transcription_length: usize,
    pub segments_count: usize,
}

impl ProcessOutcome {
    fn failed(call_id: Id, message: impl Into<String>) -> Self {
        Self {
            success: false,
            call_id,
            message: message.into(),
            has_valid_content: false,
            transcription_length: 0,
            segments_count: 0,
        }
    }
}

/// Owns the AI gateway clients and runs the pipeline stages for one call at a
/// time. Shared behind an `Arc` so upload tasks can fire processing without
/// blocking on it.
pub struct Processor {
    db: Arc<DatabaseConnection>,
    completion: Arc<dyn CompletionModel + Send + Sync>,
    transcriber: Arc<dyn Transcriber + Send + Sync>,
    classifier: KeywordClassifier,
    correction: CorrectionConfig,
    prompt_length_budget: usize,
    download_timeout: Duration,
}

impl Processor {
    /// Builds the processor and its gateway clients from configuration.
    pub fn from_config(config: &Config, db: Arc<DatabaseConnection>) -> Result<Self, Error> {
        let completion_key = config
            .completion_api_key()
            .ok_or_else(|| Error::internal("COMPLETION_API_KEY is not configured"))?;
        let speech_key = config
            .speech_api_key()
            .ok_or_else(|| Error::internal("SPEECH_API_KEY is not configured"))?;

        let completion = CompletionClient::new(
            completion_key,
            config.completion_api_base_url(),
            &config.capable_model,
            &config.economy_model,
        )?;
        let transcriber = SpeechClient::new(
            speech_key,
            config.speech_api_base_url(),
            &config.speech_model,
        )?;

        Ok(Self::new(
            db,
            Arc::new(completion),
            Arc::new(transcriber),
            config.prompt_length_budget,
            Duration::from_secs(config.audio_download_timeout_secs),
        ))
    }

    /// Assembles a processor from already-built model clients.
    pub fn new(
        db: Arc<DatabaseConnection>,
        completion: Arc<dyn CompletionModel + Send + Sync>,
        transcriber: Arc<dyn Transcriber + Send + Sync>,
        prompt_length_budget: usize,
        download_timeout: Duration,
    ) -> Self {
        Self {
            db,
            completion,
            transcriber,
            classifier: KeywordClassifier::default(),
            correction: CorrectionConfig::default(),
            prompt_length_budget,
            download_timeout,
        }
    }

    /// Fire-and-forget processing; the caller is not blocked on completion.
    ///
    /// There is no cancellation: a caller disconnecting does not stop the
    /// analysis, which is what makes "upload now, analyze later" work.
    pub fn spawn(self: &Arc<Self>, request: ProcessRequest) {
        let processor = self.clone();
        let call_id = request.call_id;
        tokio::spawn(async move {
            match processor.process(request).await {
                Ok(outcome) if !outcome.success => {
                    warn!("Background processing of call {call_id} ended early: {}", outcome.message)
                }
                Ok(_) => info!("Background processing of call {call_id} finished"),
                Err(e) => error!("Background processing of call {call_id} failed: {e}"),
            }
        });
    }

    /// Runs behavior analysis on demand for a call that already has a
    /// transcript. Idempotent: an existing non-empty evaluation list is
    /// returned as is.
    pub async fn analyze(
        &self,
        call_id: Id,
        selected_behavior_ids: Option<Vec<Id>>,
    ) -> Result<feedback::Model, Error> {
        behavior_analysis::analyze_call(
            &self.db,
            self.completion.as_ref(),
            call_id,
            selected_behavior_ids.as_deref(),
            &self.correction,
            self.prompt_length_budget,
        )
        .await
    }

    /// Runs the full pipeline for one call.
    ///
    /// Infrastructure failures move the call to `error` and are reported in
    /// the outcome rather than as an `Err`; `Err` is reserved for invalid
    /// invocations (unknown call id, no audio URL).
    pub async fn process(&self, request: ProcessRequest) -> Result<ProcessOutcome, Error> {
        let call_id = request.call_id;
        let call = call::find_by_id(&self.db, call_id).await?;

        if request.audio_url.trim().is_empty() {
            return Err(Error::invalid("The call has no audio URL to process"));
        }

        info!("Processing call {call_id} ('{}')", call.title);
        call::update_stage(&self.db, call_id, CallStatus::Transcribing, 20).await?;

        let audio = match download_audio(&request.audio_url, self.download_timeout).await {
            Ok(audio) => audio,
            Err(e) => {
                let detail = format!("Transcripción no disponible: no se pudo descargar el audio ({e})");
                call::mark_error(&self.db, call_id, detail.clone()).await?;
                return Ok(ProcessOutcome::failed(call_id, detail));
            }
        };

        if audio.len() < MIN_AUDIO_BYTES {
            info!("Call {call_id} audio is too small to contain a conversation");
            call::update_summary(&self.db, call_id, NO_CONTENT_SUMMARY.to_string()).await?;
            call::update_stage(&self.db, call_id, CallStatus::Complete, 100).await?;
            return Ok(ProcessOutcome {
                success: true,
                call_id,
                message: "Audio sin contenido analizable".to_string(),
                has_valid_content: false,
                transcription_length: 0,
                segments_count: 0,
            });
        }

        let transcribe_request = TranscribeRequest::new(call.filename.clone(), audio)
            .with_prompt(TRANSCRIPTION_PROMPT)
            .with_language("es");

        let raw = match self.transcriber.transcribe(transcribe_request).await {
            Ok(raw) => raw,
            Err(e) => {
                let detail = format!("Transcripción no disponible: {e}");
                call::mark_error(&self.db, call_id, detail.clone()).await?;
                return Ok(ProcessOutcome::failed(call_id, detail));
            }
        };

        let transcript = Transcript::reconstruct(&raw, &self.classifier);
        let rendered = transcript.render();
        let duration = raw
            .duration_seconds
            .or_else(|| raw.segments.last().map(|segment| segment.end));

        call::update_transcription(&self.db, call_id, rendered.clone(), duration).await?;
        call::update_stage(&self.db, call_id, CallStatus::Transcribing, 50).await?;

        if let Some(seconds) = duration.filter(|seconds| *seconds > 0.0) {
            if let Err(e) = usage::record(&self.db, call.account_id, call_id, seconds).await {
                warn!("Could not record usage for call {call_id}: {e}");
            }
        }

        if !transcript.has_valid_content() {
            info!("Call {call_id} transcript has no valid two-sided conversation");
            call::update_summary(&self.db, call_id, NO_CONTENT_SUMMARY.to_string()).await?;
            call::update_stage(&self.db, call_id, CallStatus::Complete, 100).await?;
            return Ok(ProcessOutcome {
                success: true,
                call_id,
                message: "Transcripción sin contenido válido".to_string(),
                has_valid_content: false,
                transcription_length: rendered.chars().count(),
                segments_count: transcript.segments_count,
            });
        }

        call::update_stage(&self.db, call_id, CallStatus::Analyzing, 70).await?;

        let summary_prompt = summary::resolve_prompt(
            &self.db,
            call.account_id,
            request.summary_prompt_override.as_deref(),
        )
        .await?;
        let summary_text =
            summary::summarize(self.completion.as_ref(), &summary_prompt, &rendered).await;
        call::update_summary(&self.db, call_id, summary_text.clone()).await?;
        call::update_stage(&self.db, call_id, CallStatus::Analyzing, 85).await?;

        self.run_general_feedback(&request, &call.account_id, &rendered)
            .await;
        call::update_stage(&self.db, call_id, CallStatus::Analyzing, 95).await?;

        match self
            .analyze(call_id, request.selected_behavior_ids.clone())
            .await
        {
            Ok(result) => debug!(
                "Call {call_id} behavior analysis complete with score {}",
                result.score
            ),
            // Partial success: a call without behavior scores still keeps its
            // transcript, summary and general feedback.
            Err(e) => warn!("Behavior analysis for call {call_id} did not run: {e}"),
        }

        call::update_stage(&self.db, call_id, CallStatus::Complete, 100).await?;
        info!("Call {call_id} processed");

        Ok(ProcessOutcome {
            success: true,
            call_id,
            message: "Análisis completado".to_string(),
            has_valid_content: true,
            transcription_length: rendered.chars().count(),
            segments_count: transcript.segments_count,
        })
    }

    async fn run_general_feedback(
        &self,
        request: &ProcessRequest,
        account_id: &Id,
        transcript_text: &str,
    ) {
        let call_id = request.call_id;

        let result = async {
            let system_prompt = resolve_feedback_prompt(
                &self.db,
                *account_id,
                request.feedback_prompt_override.as_deref(),
            )
            .await?;
            let recent = feedback::recent_phrases(&self.db, *account_id).await?;
            let general = feedback::generate_general_feedback(
                self.completion.as_ref(),
                &system_prompt,
                transcript_text,
                &recent,
            )
            .await?;

            let call = call::find_by_id(&self.db, call_id).await?;
            feedback::apply_general_feedback(&self.db, &call, general).await
        }
        .await;

        if let Err(e) = result {
            // Partial success: general feedback is advisory, not load-bearing.
            warn!("General feedback for call {call_id} was skipped: {e}");
        }
    }
}

/// Prompt resolution for the general feedback path: caller override, then
/// the account's active feedback prompt, then the built-in default.
pub async fn resolve_feedback_prompt(
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

    if let Some(active) = prompt::find_active(db, account_id, PromptType::Feedback).await? {
        return Ok(active.content);
    }

    Ok(feedback::DEFAULT_FEEDBACK_PROMPT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_request_defaults_to_no_overrides() {
        let call_id = Id::new_v4();
        let request = ProcessRequest::new(call_id, "https://store/audio.mp3");
        assert_eq!(request.call_id, call_id);
        assert!(request.summary_prompt_override.is_none());
        assert!(request.feedback_prompt_override.is_none());
        assert!(request.selected_behavior_ids.is_none());
    }

    #[test]
    fn failed_outcomes_carry_no_transcript_stats() {
        let outcome = ProcessOutcome::failed(Id::new_v4(), "sin audio");
        assert!(!outcome.success);
        assert!(!outcome.has_valid_content);
        assert_eq!(outcome.transcription_length, 0);
    }
}
