use domain::Id;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub(crate) struct IndexParams {
    #[param(value_type = Uuid)]
    pub(crate) account_id: Id,
}
