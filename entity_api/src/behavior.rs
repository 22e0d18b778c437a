//! CRUD operations for behaviors table.

use super::error::{EntityApiErrorKind, Error};
use entity::behaviors::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*,
    ActiveValue::{Set, Unchanged},
    Condition, DatabaseConnection, QueryOrder, TryIntoModel,
};

pub async fn create(db: &DatabaseConnection, behavior_model: Model) -> Result<Model, Error> {
    debug!("Creating new behavior: {}", behavior_model.name);

    let now = chrono::Utc::now();

    let active_model = ActiveModel {
        account_id: Set(behavior_model.account_id),
        name: Set(behavior_model.name),
        description: Set(behavior_model.description),
        prompt: Set(behavior_model.prompt),
        is_active: Set(behavior_model.is_active),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    Ok(active_model.save(db).await?.try_into_model()?)
}

pub async fn update(db: &DatabaseConnection, id: Id, model: Model) -> Result<Model, Error> {
    let result = Entity::find_by_id(id).one(db).await?;

    match result {
        Some(existing) => {
            debug!("Updating behavior: {id}");

            let active_model = ActiveModel {
                id: Unchanged(existing.id),
                account_id: Unchanged(existing.account_id),
                name: Set(model.name),
                description: Set(model.description),
                prompt: Set(model.prompt),
                is_active: Set(model.is_active),
                created_at: Unchanged(existing.created_at),
                updated_at: Set(chrono::Utc::now().into()),
            };

            Ok(active_model.update(db).await?.try_into_model()?)
        }
        None => {
            debug!("Behavior with id {id} not found");
            Err(Error {
                source: None,
                error_kind: EntityApiErrorKind::RecordNotFound,
            })
        }
    }
}

pub async fn find_by_id(db: &DatabaseConnection, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

/// All behaviors visible to an account: its own plus global ones.
pub async fn find_for_account(db: &DatabaseConnection, account_id: Id) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(
            Condition::any()
                .add(Column::AccountId.eq(account_id))
                .add(Column::AccountId.is_null()),
        )
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?)
}

/// Active behaviors eligible for analyzing a call of the given account.
pub async fn find_active_for_account(
    db: &DatabaseConnection,
    account_id: Id,
) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::IsActive.eq(true))
        .filter(
            Condition::any()
                .add(Column::AccountId.eq(account_id))
                .add(Column::AccountId.is_null()),
        )
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?)
}

/// Subset of the active set matching the requested ids, preserving the
/// active/scope invariant even when the caller names specific behaviors.
pub async fn find_active_by_ids(
    db: &DatabaseConnection,
    account_id: Id,
    ids: &[Id],
) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::Id.is_in(ids.iter().copied()))
        .filter(Column::IsActive.eq(true))
        .filter(
            Condition::any()
                .add(Column::AccountId.eq(account_id))
                .add(Column::AccountId.is_null()),
        )
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?)
}
