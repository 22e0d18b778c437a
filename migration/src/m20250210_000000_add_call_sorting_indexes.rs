use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create indexes for the calls list views
        manager
            .create_index(
                Index::create()
                    .name("calls_account_id")
                    .table((Alias::new("call_qa"), Alias::new("calls")))
                    .col(Alias::new("account_id"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("calls_created_at")
                    .table((Alias::new("call_qa"), Alias::new("calls")))
                    .col(Alias::new("created_at"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("calls_status")
                    .table((Alias::new("call_qa"), Alias::new("calls")))
                    .col(Alias::new("status"))
                    .to_owned(),
            )
            .await?;

        // The anti-repetition snapshot reads recent feedback per account
        // through a join on calls, ordered by creation time
        manager
            .create_index(
                Index::create()
                    .name("feedback_created_at")
                    .table((Alias::new("call_qa"), Alias::new("feedback")))
                    .col(Alias::new("created_at"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("usage_tracking_account_id")
                    .table((Alias::new("call_qa"), Alias::new("usage_tracking")))
                    .col(Alias::new("account_id"))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table) in [
            ("usage_tracking_account_id", "usage_tracking"),
            ("feedback_created_at", "feedback"),
            ("calls_status", "calls"),
            ("calls_created_at", "calls"),
            ("calls_account_id", "calls"),
        ] {
            manager
                .drop_index(
                    Index::drop()
                        .name(name)
                        .table((Alias::new("call_qa"), Alias::new(table)))
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }
}
