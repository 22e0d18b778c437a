use chrono::Utc;
use sea_orm_migration::sea_orm::{DbBackend, Statement, Value};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// NOTE: We use raw SQL here to avoid issues with entity type changes in future migrations.
// Using the ORM can break if new fields are added later, but raw SQL remains compatible.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let now = Utc::now();

        let behaviors: [(&str, &str, &str); 4] = [
            (
                "Saludo inicial",
                "El asesor abre la llamada correctamente.",
                "Evalúa si el asesor saluda, menciona el nombre de la empresa y se identifica con su nombre al inicio de la llamada.",
            ),
            (
                "Escucha activa",
                "El asesor demuestra escucha activa durante la conversación.",
                "Evalúa si el asesor parafrasea lo dicho por el cliente, hace preguntas de seguimiento y no interrumpe.",
            ),
            (
                "Manejo de objeciones",
                "El asesor gestiona las objeciones del cliente.",
                "Evalúa si el asesor reconoce la objeción, ofrece al menos 2 argumentos relevantes y verifica si la objeción quedó resuelta.",
            ),
            (
                "Cierre de la llamada",
                "El asesor cierra la llamada de forma completa.",
                "Evalúa si el asesor resume los acuerdos, confirma los próximos pasos y se despide cordialmente.",
            ),
        ];

        // account_id NULL places these in the global catalog visible to
        // every account
        let sql = r#"
            INSERT INTO call_qa.behaviors (
                account_id, name, description, prompt, is_active, created_at, updated_at
            ) VALUES (NULL, $1, $2, $3, true, $4, $5)
        "#;

        for (name, description, prompt) in behaviors {
            db.execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                vec![
                    Value::String(Some(Box::new(name.to_owned()))),
                    Value::String(Some(Box::new(description.to_owned()))),
                    Value::String(Some(Box::new(prompt.to_owned()))),
                    Value::ChronoDateTimeUtc(Some(Box::new(now))),
                    Value::ChronoDateTimeUtc(Some(Box::new(now))),
                ],
            ))
            .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DELETE FROM call_qa.behaviors WHERE account_id IS NULL")
            .await?;

        Ok(())
    }
}
