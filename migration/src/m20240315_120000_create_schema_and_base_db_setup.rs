use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create the platform's schema
        manager
            .get_connection()
            .execute_unprepared("CREATE SCHEMA IF NOT EXISTS call_qa;")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("SET search_path TO call_qa, public;")
            .await?;

        // Create the base DB privileges for the user that will execute all
        // platform queries
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DO $$ BEGIN
                    GRANT ALL PRIVILEGES ON DATABASE call_qa TO call_qa;
                    GRANT ALL ON SCHEMA call_qa TO call_qa;

                    ALTER DEFAULT PRIVILEGES IN SCHEMA call_qa GRANT ALL ON TABLES TO call_qa;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA call_qa GRANT ALL ON SEQUENCES TO call_qa;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA call_qa GRANT ALL ON FUNCTIONS TO call_qa;
                END $$;
            "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Revoke default privileges first
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DO $$ BEGIN
                    ALTER DEFAULT PRIVILEGES IN SCHEMA call_qa REVOKE ALL ON FUNCTIONS FROM call_qa;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA call_qa REVOKE ALL ON SEQUENCES FROM call_qa;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA call_qa REVOKE ALL ON TABLES FROM call_qa;
                    REVOKE ALL ON SCHEMA call_qa FROM call_qa;
                    REVOKE ALL PRIVILEGES ON DATABASE call_qa FROM call_qa;
                END $$;
            "#,
            )
            .await?;

        // Drop the schema (CASCADE will remove all objects in it)
        manager
            .get_connection()
            .execute_unprepared("DROP SCHEMA IF EXISTS call_qa CASCADE;")
            .await?;

        Ok(())
    }
}
