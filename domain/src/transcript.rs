//! Transcript reconstruction: speaker attribution and rendering.
//!
//! The speech provider returns timed segments without speaker labels. This
//! module attributes each segment to the advisor or the client using a
//! pluggable heuristic, inserts explicit silence markers for long gaps, and
//! renders the dialogue as `[mm:ss] Speaker: text` lines. It also decides
//! whether the transcript has enough substance to be worth analyzing.

use call_ai::types::transcript::{RawTranscript, Speaker};

/// Domain-priming prompt sent with the transcription request. Describes the
/// expected call structure so the provider biases toward the right vocabulary.
pub const TRANSCRIPTION_PROMPT: &str = "Esta es una llamada de un centro de atención telefónica \
entre un asesor comercial y un cliente. El asesor saluda, se identifica, ofrece productos o \
servicios, maneja objeciones y cierra la llamada. El cliente pregunta, objeta o acepta.";

/// A gap this long since the last speaker change is treated as a probable
/// speaker switch.
const SPEAKER_SWITCH_GAP_SECONDS: f64 = 3.0;

/// Gaps between segments longer than this are rendered as explicit markers.
const SILENCE_MARKER_GAP_SECONDS: f64 = 2.0;

/// One speaker-attributed line of the reconstructed dialogue.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueLine {
    pub speaker: Speaker,
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// Speaker attribution strategy for one segment.
///
/// Kept behind a trait so the keyword tables can be swapped for a proper
/// diarization model without touching the reconstruction shape.
pub trait SpeakerClassifier {
    fn classify(&self, text: &str, prior: Speaker, gap_seconds: f64) -> Speaker;
}

/// Keyword-and-gap heuristic classifier tuned for Spanish sales calls.
///
/// Advisor-indicative phrases outrank client-indicative ones; when neither
/// matches, a long gap since the previous segment flips the speaker, and a
/// short gap keeps it.
pub struct KeywordClassifier {
    advisor_keywords: Vec<&'static str>,
    client_keywords: Vec<&'static str>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self {
            advisor_keywords: vec![
                "le habla",
                "mi nombre es",
                "le saluda",
                "buenos días, le",
                "buenas tardes, le",
                "en qué puedo ayudar",
                "le ofrezco",
                "le comento",
                "tenemos una promoción",
                "le parece",
                "nuestra empresa",
                "el plan incluye",
                "permítame",
                "con gusto",
                "algo más en que pueda",
            ],
            client_keywords: vec![
                "no me interesa",
                "cuánto cuesta",
                "cuánto me cuesta",
                "ya tengo",
                "no tengo tiempo",
                "déjeme pensarlo",
                "lo voy a pensar",
                "muy caro",
                "está caro",
                "quién habla",
                "de dónde me llama",
                "no gracias",
                "mándeme la información",
                "yo le aviso",
            ],
        }
    }
}

impl SpeakerClassifier for KeywordClassifier {
    fn classify(&self, text: &str, prior: Speaker, gap_seconds: f64) -> Speaker {
        let lowered = text.to_lowercase();

        if self.advisor_keywords.iter().any(|kw| lowered.contains(kw)) {
            return Speaker::Advisor;
        }
        if self.client_keywords.iter().any(|kw| lowered.contains(kw)) {
            return Speaker::Client;
        }

        if gap_seconds > SPEAKER_SWITCH_GAP_SECONDS {
            match prior {
                Speaker::Advisor => Speaker::Client,
                _ => Speaker::Advisor,
            }
        } else {
            prior
        }
    }
}

/// Result of reconstructing a provider transcript into dialogue.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub lines: Vec<DialogueLine>,
    pub segments_count: usize,
}

impl Transcript {
    /// Attributes speakers to raw segments and inserts silence markers.
    ///
    /// The first segment defaults to the advisor since the advisor opens
    /// outbound calls by convention.
    pub fn reconstruct(raw: &RawTranscript, classifier: &dyn SpeakerClassifier) -> Self {
        let mut lines = Vec::with_capacity(raw.segments.len());
        let mut prior = Speaker::Advisor;
        let mut prior_end = 0.0f64;

        for (index, segment) in raw.segments.iter().enumerate() {
            let text = segment.text.trim();
            if text.is_empty() {
                continue;
            }

            let gap = (segment.start - prior_end).max(0.0);

            if index > 0 && gap > SILENCE_MARKER_GAP_SECONDS {
                lines.push(DialogueLine {
                    speaker: Speaker::Silence,
                    text: format!("{} segundos", gap.round() as i64),
                    start: prior_end,
                    end: segment.start,
                });
            }

            let speaker = if index == 0 {
                Speaker::Advisor
            } else {
                classifier.classify(text, prior, gap)
            };

            lines.push(DialogueLine {
                speaker,
                text: text.to_string(),
                start: segment.start,
                end: segment.end,
            });

            prior = speaker;
            prior_end = segment.end;
        }

        Transcript {
            lines,
            segments_count: raw.segments.len(),
        }
    }

    /// Renders the dialogue as the stored transcript text.
    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(|line| match line.speaker {
                Speaker::Silence => format!("Silencio: {}", line.text),
                speaker => format!(
                    "[{}] {}: {}",
                    format_timestamp(line.start),
                    speaker,
                    line.text
                ),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether the transcript is substantive enough to spend analysis budget
    /// on.
    ///
    /// Requires at least two conversational lines and both speaker roles. A
    /// deliberately low bar that filters out junk recordings (voicemail,
    /// dead air, one-sided audio).
    pub fn has_valid_content(&self) -> bool {
        let conversational: Vec<&DialogueLine> = self
            .lines
            .iter()
            .filter(|line| line.speaker != Speaker::Silence)
            .collect();

        conversational.len() >= 2
            && conversational
                .iter()
                .any(|line| line.speaker == Speaker::Advisor)
            && conversational
                .iter()
                .any(|line| line.speaker == Speaker::Client)
    }
}

/// Formats a second offset as `mm:ss`.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as i64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use call_ai::types::transcript::RawSegment;

    fn raw(segments: Vec<(&str, f64, f64)>) -> RawTranscript {
        RawTranscript {
            text: segments
                .iter()
                .map(|(text, _, _)| *text)
                .collect::<Vec<_>>()
                .join(" "),
            segments: segments
                .into_iter()
                .map(|(text, start, end)| RawSegment {
                    text: text.to_string(),
                    start,
                    end,
                })
                .collect(),
            duration_seconds: None,
            language: Some("spanish".to_string()),
        }
    }

    #[test]
    fn first_segment_is_attributed_to_the_advisor() {
        let transcript = Transcript::reconstruct(
            &raw(vec![("Aló, con quién tengo el gusto", 0.0, 2.0)]),
            &KeywordClassifier::default(),
        );
        assert_eq!(transcript.lines[0].speaker, Speaker::Advisor);
    }

    #[test]
    fn keywords_override_gap_heuristic() {
        let transcript = Transcript::reconstruct(
            &raw(vec![
                ("Buenos días, le habla Carlos de la empresa", 0.0, 3.0),
                ("No me interesa, gracias", 3.2, 5.0),
                ("Le comento que tenemos una promoción", 5.1, 8.0),
            ]),
            &KeywordClassifier::default(),
        );
        let speakers: Vec<Speaker> = transcript.lines.iter().map(|l| l.speaker).collect();
        assert_eq!(
            speakers,
            vec![Speaker::Advisor, Speaker::Client, Speaker::Advisor]
        );
    }

    #[test]
    fn long_gap_without_keywords_switches_speaker() {
        let transcript = Transcript::reconstruct(
            &raw(vec![
                ("Buenos días", 0.0, 1.0),
                ("Sí, dígame", 5.0, 6.0),
            ]),
            &KeywordClassifier::default(),
        );
        assert_eq!(transcript.lines[0].speaker, Speaker::Advisor);
        // gap of 4s > 3s switch threshold; a silence marker is also emitted
        let conversational: Vec<&DialogueLine> = transcript
            .lines
            .iter()
            .filter(|l| l.speaker != Speaker::Silence)
            .collect();
        assert_eq!(conversational[1].speaker, Speaker::Client);
    }

    #[test]
    fn gaps_over_two_seconds_become_silence_markers() {
        let transcript = Transcript::reconstruct(
            &raw(vec![("Buenos días", 0.0, 1.0), ("Sí, dígame", 6.0, 7.0)]),
            &KeywordClassifier::default(),
        );
        let rendered = transcript.render();
        assert!(rendered.contains("Silencio: 5 segundos"));
    }

    #[test]
    fn render_formats_minute_second_timestamps() {
        let transcript = Transcript::reconstruct(
            &raw(vec![("Para finalizar, le comento el precio", 83.0, 86.0)]),
            &KeywordClassifier::default(),
        );
        assert!(transcript.render().starts_with("[01:23] Asesor:"));
    }

    #[test]
    fn one_sided_transcript_is_not_valid_content() {
        let transcript = Transcript::reconstruct(
            &raw(vec![
                ("Buenos días, le habla Carlos", 0.0, 2.0),
                ("Le comento que tenemos una promoción", 2.1, 5.0),
            ]),
            &KeywordClassifier::default(),
        );
        assert!(!transcript.has_valid_content());
    }

    #[test]
    fn single_line_is_not_valid_content() {
        let transcript = Transcript::reconstruct(
            &raw(vec![("Buzón de voz", 0.0, 2.0)]),
            &KeywordClassifier::default(),
        );
        assert!(!transcript.has_valid_content());
    }

    #[test]
    fn two_sided_dialogue_is_valid_content() {
        let transcript = Transcript::reconstruct(
            &raw(vec![
                ("Buenos días, le habla Carlos", 0.0, 2.0),
                ("Cuánto cuesta el plan", 2.2, 4.0),
            ]),
            &KeywordClassifier::default(),
        );
        assert!(transcript.has_valid_content());
    }

    #[test]
    fn silence_markers_do_not_count_as_conversational_lines() {
        let transcript = Transcript::reconstruct(
            &raw(vec![
                ("Buenos días, le habla Carlos", 0.0, 2.0),
                ("Le comento sobre el plan", 10.0, 12.0),
            ]),
            &KeywordClassifier::default(),
        );
        assert!(!transcript.has_valid_content());
    }
}
