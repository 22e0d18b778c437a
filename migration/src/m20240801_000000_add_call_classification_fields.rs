use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Commercial outcome enum, in the wording the classifier emits
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE TYPE call_qa.call_result AS ENUM (
                    'venta',
                    'no venta'
                )",
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared("ALTER TYPE call_qa.call_result OWNER TO call_qa")
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "CREATE TYPE call_qa.product_type AS ENUM (
                    'fijo',
                    'móvil'
                )",
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared("ALTER TYPE call_qa.product_type OWNER TO call_qa")
            .await?;

        // Classification columns stay NULL until the feedback stage runs
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                ALTER TABLE call_qa.calls
                    ADD COLUMN sentiment varchar(255),
                    ADD COLUMN topics jsonb,
                    ADD COLUMN entities jsonb,
                    ADD COLUMN result call_qa.call_result,
                    ADD COLUMN product call_qa.product_type,
                    ADD COLUMN non_sale_reason varchar(255)
            "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                ALTER TABLE call_qa.calls
                    DROP COLUMN IF EXISTS non_sale_reason,
                    DROP COLUMN IF EXISTS product,
                    DROP COLUMN IF EXISTS result,
                    DROP COLUMN IF EXISTS entities,
                    DROP COLUMN IF EXISTS topics,
                    DROP COLUMN IF EXISTS sentiment
            "#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared("DROP TYPE IF EXISTS call_qa.product_type")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("DROP TYPE IF EXISTS call_qa.call_result")
            .await?;

        Ok(())
    }
}
