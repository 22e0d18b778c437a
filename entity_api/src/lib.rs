use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

pub use entity::{
    accounts, behavior_evaluation, behaviors, call_result, call_status, calls, feedback,
    phrase_list, product_type, prompt_type, prompts, usage_tracking, Id,
};

pub mod behavior;
pub mod call;
pub mod error;
pub mod feedback_record;
pub mod prompt;
pub mod query;
pub mod usage;

/// Seeds a development database with a demo account, a default behavior set
/// and default prompts. Used by the `seed_db` binary only.
pub async fn seed_database(db: &DatabaseConnection) {
    let now = chrono::Utc::now();

    let demo_account = accounts::ActiveModel {
        name: Set("Demo Contact Center".to_owned()),
        slug: Set("demo-contact-center".to_owned()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .save(db)
    .await
    .unwrap();

    let account_id = demo_account.id.clone().unwrap();

    let default_behaviors: [(&str, &str, &str); 4] = [
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

    for (name, description, prompt) in default_behaviors {
        behaviors::ActiveModel {
            account_id: Set(Some(account_id)),
            name: Set(name.to_owned()),
            description: Set(description.to_owned()),
            prompt: Set(prompt.to_owned()),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .save(db)
        .await
        .unwrap();
    }

    prompts::ActiveModel {
        account_id: Set(account_id),
        prompt_type: Set(prompt_type::PromptType::Summary),
        content: Set(
            "Resume la llamada indicando el problema principal, la resolución propuesta y el desenlace."
                .to_owned(),
        ),
        is_active: Set(false),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .save(db)
    .await
    .unwrap();
}
