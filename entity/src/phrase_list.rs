//! JSON-embedded list of short feedback phrases.
//!
//! Positive findings, negative findings, improvement opportunities, topics and
//! entities are all stored as JSONB arrays on the feedback/calls rows rather
//! than joined tables, since they are only ever read and written as a whole.

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, ToSchema,
)]
pub struct PhraseList(pub Vec<String>);

impl PhraseList {
    pub fn new(phrases: Vec<String>) -> Self {
        Self(phrases)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl From<Vec<String>> for PhraseList {
    fn from(phrases: Vec<String>) -> Self {
        Self(phrases)
    }
}
