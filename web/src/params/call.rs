use domain::Id;
use sea_orm::Value;
use serde::Deserialize;
use utoipa::IntoParams;

use domain::{IntoQueryFilterMap, QueryFilterMap};

#[derive(Debug, Deserialize, IntoParams)]
pub(crate) struct IndexParams {
    #[param(value_type = Uuid)]
    pub(crate) account_id: Id,
    /// Optional exact-title filter
    pub(crate) title: Option<String>,
}

impl IntoQueryFilterMap for IndexParams {
    fn into_query_filter_map(self) -> QueryFilterMap {
        let mut query_filter_map = QueryFilterMap::new();
        query_filter_map.insert(
            "account_id".to_string(),
            Some(Value::Uuid(Some(Box::new(self.account_id)))),
        );
        query_filter_map.insert(
            "title".to_string(),
            self.title.map(|title| Value::String(Some(Box::new(title)))),
        );

        query_filter_map
    }
}
