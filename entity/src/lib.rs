use uuid::Uuid;

// Core entities
pub mod accounts;
pub mod behaviors;
pub mod calls;
pub mod feedback;
pub mod prompts;
pub mod usage_tracking;

// Enums and JSON-embedded value types
pub mod behavior_evaluation;
pub mod call_result;
pub mod call_status;
pub mod phrase_list;
pub mod product_type;
pub mod prompt_type;

/// A type alias that represents any Entity's internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = Uuid;
