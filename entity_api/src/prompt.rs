//! Query operations for prompts table.

use super::error::Error;
use entity::prompt_type::PromptType;
use entity::prompts::{Column, Entity, Model};
use entity::Id;
use sea_orm::{entity::prelude::*, DatabaseConnection, QueryOrder};

/// The active prompt of the given type for an account, if any. When several
/// are active the most recently created wins.
pub async fn find_active(
    db: &DatabaseConnection,
    account_id: Id,
    prompt_type: PromptType,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::AccountId.eq(account_id))
        .filter(Column::PromptType.eq(prompt_type))
        .filter(Column::IsActive.eq(true))
        .order_by_desc(Column::CreatedAt)
        .one(db)
        .await?)
}
