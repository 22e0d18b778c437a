//! Speech-to-text API client and audio download helper.
//!
//! The client targets an OpenAI-style `/audio/transcriptions` endpoint with
//! `verbose_json` output so segment-level timestamps come back for the
//! diarization heuristic. Audio download is done here too, with its own
//! timeout budget, so transport failures are reported distinctly from
//! provider failures.

use crate::error::Error as DomainError;
use async_trait::async_trait;
use call_ai::types::transcript::{RawSegment, RawTranscript, TranscribeRequest};
use call_ai::{Error, Transcriber};
use log::*;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    text: String,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    segments: Vec<VerboseSegment>,
}

#[derive(Debug, Deserialize)]
struct VerboseSegment {
    text: String,
    start: f64,
    end: f64,
}

/// Speech-to-text API client
pub struct SpeechClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl SpeechClient {
    /// Create a new speech client with the given API key and base URL
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Result<Self, Error> {
        let mut headers = reqwest::header::HeaderMap::new();

        let mut header_value =
            reqwest::header::HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(
                |e| {
                    warn!("Failed to create auth header: {:?}", e);
                    Error::Configuration("Invalid API key format".to_string())
                },
            )?;
        header_value.set_sensitive(true);
        headers.insert("authorization", header_value);

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            model: model.to_string(),
        })
    }

    fn mime_for_filename(filename: &str) -> &'static str {
        match filename.rsplit('.').next().map(|ext| ext.to_lowercase()) {
            Some(ext) if ext == "wav" => "audio/wav",
            Some(ext) if ext == "m4a" => "audio/mp4",
            _ => "audio/mpeg",
        }
    }
}

#[async_trait]
impl Transcriber for SpeechClient {
    async fn transcribe(&self, request: TranscribeRequest) -> Result<RawTranscript, Error> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        debug!(
            "Transcribing {} ({} bytes)",
            request.filename,
            request.bytes.len()
        );

        let file_part = reqwest::multipart::Part::bytes(request.bytes)
            .file_name(request.filename.clone())
            .mime_str(Self::mime_for_filename(&request.filename))
            .map_err(|e| Error::Serialization(format!("Invalid audio mime type: {e}")))?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment");

        if let Some(prompt) = request.prompt {
            form = form.text("prompt", prompt);
        }
        if let Some(language) = request.language {
            form = form.text("language", language);
        }

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!("Transcription request failed: {:?}", e);
                if e.is_timeout() {
                    Error::Timeout(e.to_string())
                } else {
                    Error::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            let parsed: VerboseTranscription = response.json().await.map_err(|e| {
                warn!("Failed to parse transcription response: {:?}", e);
                Error::Deserialization(format!("Invalid transcription response: {e}"))
            })?;

            Ok(RawTranscript {
                text: parsed.text,
                segments: parsed
                    .segments
                    .into_iter()
                    .map(|segment| RawSegment {
                        text: segment.text.trim().to_string(),
                        start: segment.start,
                        end: segment.end,
                    })
                    .collect(),
                duration_seconds: parsed.duration,
                language: parsed.language,
            })
        } else {
            let error_text = response.text().await.unwrap_or_default();
            error!("Speech API {status}: {error_text}");
            if status.is_server_error() {
                Err(Error::Network(format!("{status}: {error_text}")))
            } else {
                Err(Error::Provider(format!("{status}: {error_text}")))
            }
        }
    }

    fn provider_id(&self) -> &str {
        "openai_whisper"
    }
}

/// Downloads call audio with a bounded timeout.
///
/// A dedicated client is built per download so the timeout budget applies to
/// the whole transfer, not only connection establishment.
pub async fn download_audio(url: &str, timeout: Duration) -> Result<Vec<u8>, DomainError> {
    let client = reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(timeout)
        .build()?;

    debug!("Downloading audio from {url}");

    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(DomainError::internal(format!(
            "Audio download failed with status {}",
            response.status()
        )));
    }

    let bytes = response.bytes().await?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_is_derived_from_extension() {
        assert_eq!(SpeechClient::mime_for_filename("llamada.wav"), "audio/wav");
        assert_eq!(SpeechClient::mime_for_filename("llamada.m4a"), "audio/mp4");
        assert_eq!(SpeechClient::mime_for_filename("llamada.mp3"), "audio/mpeg");
        assert_eq!(SpeechClient::mime_for_filename("sin_extension"), "audio/mpeg");
    }

    #[tokio::test]
    async fn transcribe_parses_verbose_json_segments() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/audio/transcriptions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "text": "Buenos días. Quiero información.",
                    "duration": 12.5,
                    "language": "spanish",
                    "segments": [
                        {"text": " Buenos días.", "start": 0.0, "end": 2.1},
                        {"text": " Quiero información.", "start": 5.4, "end": 7.0}
                    ]
                }"#,
            )
            .create_async()
            .await;

        let client = SpeechClient::new("test-key", &server.url(), "whisper-1").unwrap();
        let transcript = client
            .transcribe(TranscribeRequest::new("llamada.mp3", vec![0u8; 16]))
            .await
            .unwrap();

        assert_eq!(transcript.segments.len(), 2);
        assert_eq!(transcript.segments[0].text, "Buenos días.");
        assert_eq!(transcript.duration_seconds, Some(12.5));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn download_audio_fails_on_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/audio/missing.mp3")
            .with_status(404)
            .create_async()
            .await;

        let url = format!("{}/audio/missing.mp3", server.url());
        let result = download_audio(&url, Duration::from_secs(5)).await;
        assert!(result.is_err());
    }
}
