use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Pipeline stage enum for calls
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE TYPE call_qa.call_status AS ENUM (
                    'pending',
                    'transcribing',
                    'analyzing',
                    'complete',
                    'error'
                )",
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared("ALTER TYPE call_qa.call_status OWNER TO call_qa")
            .await?;

        // Stage selector for stored prompt overrides
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE TYPE call_qa.prompt_type AS ENUM (
                    'summary',
                    'feedback'
                )",
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared("ALTER TYPE call_qa.prompt_type OWNER TO call_qa")
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE call_qa.accounts (
                    id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
                    name varchar(255) NOT NULL,
                    slug varchar(255) NOT NULL,
                    created_at timestamptz NOT NULL DEFAULT now(),
                    updated_at timestamptz NOT NULL DEFAULT now(),
                    CONSTRAINT accounts_slug_key UNIQUE (slug)
                )
            "#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE call_qa.calls (
                    id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
                    account_id uuid NOT NULL,
                    title varchar(255) NOT NULL,
                    filename varchar(255) NOT NULL,
                    audio_url text,
                    duration_seconds double precision,
                    status call_qa.call_status NOT NULL DEFAULT 'pending',
                    progress integer NOT NULL DEFAULT 0,
                    transcription text,
                    summary text,
                    created_at timestamptz NOT NULL DEFAULT now(),
                    updated_at timestamptz NOT NULL DEFAULT now(),
                    CONSTRAINT calls_account_id_fkey FOREIGN KEY (account_id)
                        REFERENCES call_qa.accounts (id) ON DELETE CASCADE,
                    CONSTRAINT calls_account_id_title_key UNIQUE (account_id, title)
                )
            "#,
            )
            .await?;

        // account_id NULL marks a behavior from the shared global catalog
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE call_qa.behaviors (
                    id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
                    account_id uuid,
                    name varchar(255) NOT NULL,
                    description text NOT NULL,
                    prompt text NOT NULL,
                    is_active boolean NOT NULL DEFAULT true,
                    created_at timestamptz NOT NULL DEFAULT now(),
                    updated_at timestamptz NOT NULL DEFAULT now(),
                    CONSTRAINT behaviors_account_id_fkey FOREIGN KEY (account_id)
                        REFERENCES call_qa.accounts (id) ON DELETE CASCADE
                )
            "#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE call_qa.prompts (
                    id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
                    account_id uuid NOT NULL,
                    prompt_type call_qa.prompt_type NOT NULL,
                    content text NOT NULL,
                    is_active boolean NOT NULL DEFAULT true,
                    created_at timestamptz NOT NULL DEFAULT now(),
                    updated_at timestamptz NOT NULL DEFAULT now(),
                    CONSTRAINT prompts_account_id_fkey FOREIGN KEY (account_id)
                        REFERENCES call_qa.accounts (id) ON DELETE CASCADE
                )
            "#,
            )
            .await?;

        // One feedback row per call; the pipeline and the behavior analysis
        // path both write through an upsert on call_id
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE call_qa.feedback (
                    id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
                    call_id uuid NOT NULL,
                    score integer NOT NULL DEFAULT 0,
                    positive jsonb NOT NULL DEFAULT '[]'::jsonb,
                    negative jsonb NOT NULL DEFAULT '[]'::jsonb,
                    opportunities jsonb NOT NULL DEFAULT '[]'::jsonb,
                    behaviors_analysis jsonb NOT NULL DEFAULT '[]'::jsonb,
                    sentiment varchar(255),
                    topics jsonb,
                    entities jsonb,
                    created_at timestamptz NOT NULL DEFAULT now(),
                    updated_at timestamptz NOT NULL DEFAULT now(),
                    CONSTRAINT feedback_call_id_fkey FOREIGN KEY (call_id)
                        REFERENCES call_qa.calls (id) ON DELETE CASCADE,
                    CONSTRAINT feedback_call_id_key UNIQUE (call_id)
                )
            "#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE call_qa.usage_tracking (
                    id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
                    account_id uuid NOT NULL,
                    call_id uuid NOT NULL,
                    audio_seconds double precision NOT NULL DEFAULT 0,
                    created_at timestamptz NOT NULL DEFAULT now(),
                    CONSTRAINT usage_tracking_account_id_fkey FOREIGN KEY (account_id)
                        REFERENCES call_qa.accounts (id) ON DELETE CASCADE,
                    CONSTRAINT usage_tracking_call_id_fkey FOREIGN KEY (call_id)
                        REFERENCES call_qa.calls (id) ON DELETE CASCADE
                )
            "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            "usage_tracking",
            "feedback",
            "prompts",
            "behaviors",
            "calls",
            "accounts",
        ] {
            manager
                .get_connection()
                .execute_unprepared(&format!("DROP TABLE IF EXISTS call_qa.{table}"))
                .await?;
        }

        manager
            .get_connection()
            .execute_unprepared("DROP TYPE IF EXISTS call_qa.prompt_type")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("DROP TYPE IF EXISTS call_qa.call_status")
            .await?;

        Ok(())
    }
}
