//! Query bridge between web-layer filter params and SeaORM queries.

use crate::error::Error;
use sea_orm::strum::IntoEnumIterator;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Value};
use std::collections::HashMap;

/// `QueryFilterMap` is a data structure that serves as a bridge for translating
/// filter parameters between different layers of the application. It is a
/// wrapper around a `HashMap` where the keys are filter parameter names (as
/// `String`) and the values are optional `Value` types from `sea_orm`.
///
/// This structure is particularly useful in scenarios where you need to pass
/// filter parameters from a web request down to the database query layer in a
/// type-safe and organized manner.
pub struct QueryFilterMap {
    map: HashMap<String, Option<Value>>,
}

impl QueryFilterMap {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        // HashMap.get returns an Option and so we need to "flatten" this to a single Option
        self.map
            .get(key)
            .and_then(|inner_option| inner_option.clone())
    }

    pub fn insert(&mut self, key: String, value: Option<Value>) {
        self.map.insert(key, value);
    }
}

impl Default for QueryFilterMap {
    fn default() -> Self {
        Self::new()
    }
}

/// `IntoQueryFilterMap` is a trait that provides a method for converting a
/// struct into a `QueryFilterMap`, typically implemented by web-layer params
/// structs so controllers can hand filters to `find_by` without knowing about
/// SeaORM columns.
pub trait IntoQueryFilterMap {
    fn into_query_filter_map(self) -> QueryFilterMap;
}

/// Find all records of an entity matching the given query filter map.
pub async fn find_by<E, C>(
    db: &DatabaseConnection,
    query_filter_map: QueryFilterMap,
) -> Result<Vec<E::Model>, Error>
where
    E: EntityTrait,
    C: ColumnTrait + IntoEnumIterator,
{
    let mut query = E::find();

    // We iterate through the entity's defined columns so that we only attempt
    // to filter by columns that exist.
    for column in C::iter() {
        if let Some(value) = query_filter_map.get(&column.to_string()) {
            query = query.filter(column.eq(value));
        }
    }

    Ok(query.all(db).await?)
}
