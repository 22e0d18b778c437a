//! CRUD operations for the feedback table.
//!
//! The feedback row is the one entity two pipeline paths write concurrently,
//! so every write goes through `upsert_patch`: read the existing row for the
//! call, merge only the fields present in the patch, and update in place.
//! This keeps the one-row-per-call invariant and lets either path finish
//! first without clobbering the other's fields.

use super::error::{EntityApiErrorKind, Error};
use entity::behavior_evaluation::BehaviorEvaluations;
use entity::feedback::{ActiveModel, Column, Entity, Model, Relation};
use entity::phrase_list::PhraseList;
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*,
    ActiveValue::{Set, Unchanged},
    DatabaseConnection, JoinType, QueryOrder, QuerySelect, TryIntoModel,
};

/// Fields one pipeline path wants to write. `None` means "leave as is".
#[derive(Debug, Clone, Default)]
pub struct FeedbackPatch {
    pub score: Option<i32>,
    pub positive: Option<PhraseList>,
    pub negative: Option<PhraseList>,
    pub opportunities: Option<PhraseList>,
    pub behaviors_analysis: Option<BehaviorEvaluations>,
    pub sentiment: Option<String>,
    pub topics: Option<PhraseList>,
    pub entities: Option<PhraseList>,
}

pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

pub async fn find_by_call_id(
    db: &DatabaseConnection,
    call_id: Id,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::CallId.eq(call_id))
        .one(db)
        .await?)
}

/// Most recent feedback rows for an account, newest first. Used as the
/// anti-repetition snapshot for general feedback generation.
pub async fn find_recent_for_account(
    db: &DatabaseConnection,
    account_id: Id,
    limit: u64,
) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .join(JoinType::InnerJoin, Relation::Calls.def())
        .filter(entity::calls::Column::AccountId.eq(account_id))
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await?)
}

/// Read-merge-write upsert keyed by call id.
///
/// Inserts a fresh row when none exists; otherwise updates only the fields
/// the patch carries. The read and the write are not atomic; the unique
/// index on call_id backstops duplicate inserts under a true race.
pub async fn upsert_patch(
    db: &DatabaseConnection,
    call_id: Id,
    patch: FeedbackPatch,
) -> Result<Model, Error> {
    let now = chrono::Utc::now();

    match find_by_call_id(db, call_id).await? {
        Some(existing) => {
            debug!("Patching existing feedback {} for call {call_id}", existing.id);

            let active_model = ActiveModel {
                id: Unchanged(existing.id),
                call_id: Unchanged(existing.call_id),
                score: patch.score.map_or(Unchanged(existing.score), Set),
                positive: patch.positive.map_or(Unchanged(existing.positive), Set),
                negative: patch.negative.map_or(Unchanged(existing.negative), Set),
                opportunities: patch
                    .opportunities
                    .map_or(Unchanged(existing.opportunities), Set),
                behaviors_analysis: patch
                    .behaviors_analysis
                    .map_or(Unchanged(existing.behaviors_analysis), Set),
                sentiment: match patch.sentiment {
                    Some(sentiment) => Set(Some(sentiment)),
                    None => Unchanged(existing.sentiment),
                },
                topics: match patch.topics {
                    Some(topics) => Set(Some(topics)),
                    None => Unchanged(existing.topics),
                },
                entities: match patch.entities {
                    Some(entities) => Set(Some(entities)),
                    None => Unchanged(existing.entities),
                },
                created_at: Unchanged(existing.created_at),
                updated_at: Set(now.into()),
            };

            Ok(active_model.update(db).await?.try_into_model()?)
        }
        None => {
            debug!("Creating feedback for call {call_id}");

            let active_model = ActiveModel {
                call_id: Set(call_id),
                score: Set(patch.score.unwrap_or(0)),
                positive: Set(patch.positive.unwrap_or_default()),
                negative: Set(patch.negative.unwrap_or_default()),
                opportunities: Set(patch.opportunities.unwrap_or_default()),
                behaviors_analysis: Set(patch.behaviors_analysis.unwrap_or_default()),
                sentiment: Set(patch.sentiment),
                topics: Set(patch.topics),
                entities: Set(patch.entities),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
                ..Default::default()
            };

            Ok(active_model.save(db).await?.try_into_model()?)
        }
    }
}

pub async fn delete_by_call_id(db: &DatabaseConnection, call_id: Id) -> Result<(), Error> {
    if let Some(model) = find_by_call_id(db, call_id).await? {
        Entity::delete_by_id(model.id).exec(db).await?;
    }
    Ok(())
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use entity::behavior_evaluation::{BehaviorEvaluation, Evaluation};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn existing_row() -> Model {
        let now = chrono::Utc::now();
        Model {
            id: Id::new_v4(),
            call_id: Id::new_v4(),
            score: 67,
            positive: PhraseList::default(),
            negative: PhraseList::default(),
            opportunities: PhraseList::default(),
            behaviors_analysis: BehaviorEvaluations(vec![BehaviorEvaluation {
                behavior_name: "Cierre".to_string(),
                evaluation: Evaluation::Cumple,
                comments: "Cierra resumiendo acuerdos".to_string(),
            }]),
            sentiment: None,
            topics: None,
            entities: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    // The patch must only touch the columns it carries; the behavior path's
    // score and evaluations survive a later general-feedback write.
    #[tokio::test]
    async fn upsert_patch_updates_only_the_patched_columns() {
        let existing = existing_row();
        let updated = Model {
            positive: PhraseList::new(vec!["Tono cordial".to_string()]),
            ..existing.clone()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .append_query_results([vec![updated.clone()]])
            .into_connection();

        let patch = FeedbackPatch {
            positive: Some(PhraseList::new(vec!["Tono cordial".to_string()])),
            ..Default::default()
        };

        let result = upsert_patch(&db, existing.call_id, patch).await.unwrap();
        assert_eq!(result.positive, updated.positive);
        assert_eq!(result.behaviors_analysis, existing.behaviors_analysis);

        let log = db.into_transaction_log();
        let update_statement = format!("{:?}", log[1]);
        let set_clause = update_statement
            .split("RETURNING")
            .next()
            .unwrap_or_default();
        assert!(set_clause.contains("\"positive\""));
        assert!(!set_clause.contains("\"score\""));
        assert!(!set_clause.contains("\"behaviors_analysis\""));
    }

    #[tokio::test]
    async fn upsert_patch_inserts_when_no_row_exists() {
        let call_id = Id::new_v4();
        let inserted = Model {
            call_id,
            score: 75,
            behaviors_analysis: BehaviorEvaluations::default(),
            ..existing_row()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<Model>::new()])
            .append_query_results([vec![inserted.clone()]])
            .into_connection();

        let patch = FeedbackPatch {
            score: Some(75),
            ..Default::default()
        };

        let result = upsert_patch(&db, call_id, patch).await.unwrap();
        assert_eq!(result.score, 75);
        assert_eq!(result.call_id, call_id);
    }
}
