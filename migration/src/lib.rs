pub use sea_orm_migration::prelude::*;

mod m20240315_120000_create_schema_and_base_db_setup;
mod m20240315_121000_base_migration;
mod m20240801_000000_add_call_classification_fields;
mod m20240901_000000_add_default_behavior_catalog;
mod m20250210_000000_add_call_sorting_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240315_120000_create_schema_and_base_db_setup::Migration),
            Box::new(m20240315_121000_base_migration::Migration),
            Box::new(m20240801_000000_add_call_classification_fields::Migration),
            Box::new(m20240901_000000_add_default_behavior_catalog::Migration),
            Box::new(m20250210_000000_add_call_sorting_indexes::Migration),
        ]
    }
}
