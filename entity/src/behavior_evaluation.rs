//! JSON-embedded behavior evaluation results.
//!
//! Evaluations are stored as a JSONB list inside the feedback row rather than
//! joined rows: a call's evaluation set is written once by the behavior
//! analysis engine and then treated as final.

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Binary verdict for one behavior rubric.
///
/// The engine coerces any other model output to one of these two values;
/// anything else is a validation failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Evaluation {
    #[serde(rename = "cumple")]
    Cumple,
    #[serde(rename = "no cumple")]
    NoCumple,
}

impl Evaluation {
    /// Parses a model-provided verdict string, tolerating case and padding.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "cumple" => Some(Evaluation::Cumple),
            "no cumple" => Some(Evaluation::NoCumple),
            _ => None,
        }
    }
}

impl std::fmt::Display for Evaluation {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Evaluation::Cumple => write!(fmt, "cumple"),
            Evaluation::NoCumple => write!(fmt, "no cumple"),
        }
    }
}

/// The engine's verdict for one (call, behavior) pair.
///
/// The behavior name is denormalized on purpose: evaluations must stay
/// readable even if the rubric is later renamed or deactivated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BehaviorEvaluation {
    pub behavior_name: String,
    pub evaluation: Evaluation,
    pub comments: String,
}

/// Ordered list of evaluations, one per behavior analyzed, stored as JSONB.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, ToSchema,
)]
pub struct BehaviorEvaluations(pub Vec<BehaviorEvaluation>);

impl BehaviorEvaluations {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BehaviorEvaluation> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluation_parses_known_verdicts() {
        assert_eq!(Evaluation::parse("cumple"), Some(Evaluation::Cumple));
        assert_eq!(Evaluation::parse(" No Cumple "), Some(Evaluation::NoCumple));
        assert_eq!(Evaluation::parse("parcial"), None);
    }

    #[test]
    fn evaluation_serializes_to_spanish_labels() {
        let json = serde_json::to_string(&Evaluation::NoCumple).unwrap();
        assert_eq!(json, "\"no cumple\"");
        let back: Evaluation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Evaluation::NoCumple);
    }
}
