//! Types for text-completion requests.

use serde::{Deserialize, Serialize};

/// Cost tier used to select the concrete model for a request.
///
/// The behavior engine sends first attempts to the capable tier and retries
/// failures on the economy tier with a simplified prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    Capable,
    Economy,
}

/// A single synchronous completion request.
///
/// `system` carries the instructional scaffolding; `user` carries the
/// transcript or task content. Sampling knobs default to deterministic-ish
/// values suitable for scored decisions; narrative stages raise the
/// temperature explicitly.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub user: String,
    pub tier: ModelTier,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub frequency_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
}

impl CompletionRequest {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            system: None,
            user: user.into(),
            tier: ModelTier::Capable,
            temperature: 0.2,
            max_tokens: None,
            frequency_penalty: None,
            presence_penalty: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_tier(mut self, tier: ModelTier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Biases sampling against repeating previously generated phrasing.
    pub fn with_repetition_penalties(mut self, frequency: f32, presence: f32) -> Self {
        self.frequency_penalty = Some(frequency);
        self.presence_penalty = Some(presence);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_to_capable_low_temperature() {
        let request = CompletionRequest::new("evaluate this");
        assert_eq!(request.tier, ModelTier::Capable);
        assert!(request.temperature < 0.5);
        assert!(request.system.is_none());
        assert!(request.frequency_penalty.is_none());
    }

    #[test]
    fn builder_applies_overrides() {
        let request = CompletionRequest::new("summarize")
            .with_system("Eres un analista")
            .with_tier(ModelTier::Economy)
            .with_temperature(0.8)
            .with_repetition_penalties(1.0, 1.0);
        assert_eq!(request.tier, ModelTier::Economy);
        assert_eq!(request.system.as_deref(), Some("Eres un analista"));
        assert_eq!(request.frequency_penalty, Some(1.0));
        assert_eq!(request.presence_penalty, Some(1.0));
    }
}
