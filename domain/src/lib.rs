//! Domain layer of the call-quality analysis pipeline.
//!
//! This module re-exports various items from the `entity_api` crate so that
//! consumers of the `domain` crate do not need to directly depend on it. The
//! pipeline stages (upload → transcription → summarization → behavior
//! analysis → feedback aggregation) live here, together with the HTTP
//! gateways to the completion, speech and object-storage providers.

pub use entity_api::query::{IntoQueryFilterMap, QueryFilterMap};

// Re-exports from `entity` crate via `entity_api`
pub use entity_api::{
    accounts, behavior_evaluation, behaviors, call_result, call_status, calls, phrase_list,
    product_type, prompt_type, prompts, usage_tracking, Id,
};

pub mod behavior;
pub mod behavior_analysis;
pub mod call;
pub mod error;
pub mod feedback;
pub mod pipeline;
pub mod prompt;
pub mod summary;
pub mod transcript;
pub mod upload;
pub mod usage;

pub mod gateway;
