//! Upload coordination.
//!
//! Validates incoming audio files, deduplicates by derived title, stores the
//! binary, inserts the call row and fires off background processing. Failures
//! are isolated per file; a bad file never aborts its batch. Large batches
//! are chunked with bounded parallelism inside each chunk as backpressure
//! against the storage backend.

use crate::error::Error;
use crate::gateway::object_store::ObjectStoreClient;
use crate::pipeline::{ProcessRequest, Processor};
use entity::call_status::CallStatus;
use entity::{calls, Id};
use entity_api::call;
use log::*;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use service::config::Config;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

const ALLOWED_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a"];

/// One file received from the upload endpoint.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Batch tunables, lifted out of `Config` so the coordinator logic stays
/// testable without a full configuration.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_bytes: usize,
    pub chunk_size: usize,
    pub concurrency: usize,
    pub chunk_delay: Duration,
}

impl UploadLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_bytes: config.max_upload_bytes(),
            chunk_size: config.upload_chunk_size.max(1),
            concurrency: config.upload_concurrency.max(1),
            chunk_delay: Duration::from_millis(config.upload_chunk_delay_ms),
        }
    }
}

/// Terminal state of one file in a batch.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadStatus {
    Uploaded { call_id: Id },
    Duplicate,
    Invalid { reason: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub filename: String,
    pub title: String,
    #[serde(flatten)]
    pub status: UploadStatus,
}

/// Per-batch result counts plus the per-file outcomes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub uploaded: usize,
    pub duplicates: usize,
    pub invalid: usize,
    pub failed: usize,
    pub outcomes: Vec<UploadOutcome>,
}

impl BatchSummary {
    fn tally(outcomes: Vec<UploadOutcome>) -> Self {
        let mut summary = BatchSummary::default();
        for outcome in &outcomes {
            match outcome.status {
                UploadStatus::Uploaded { .. } => summary.uploaded += 1,
                UploadStatus::Duplicate => summary.duplicates += 1,
                UploadStatus::Invalid { .. } => summary.invalid += 1,
                UploadStatus::Failed { .. } => summary.failed += 1,
            }
        }
        summary.outcomes = outcomes;
        summary
    }
}

fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Validates file type and size. Accepts any `audio/*` content type or a
/// known audio extension.
pub fn validate(file: &UploadedFile, max_bytes: usize) -> Result<(), String> {
    let type_ok = file
        .content_type
        .as_deref()
        .map(|content_type| content_type.starts_with("audio/"))
        .unwrap_or(false)
        || extension(&file.filename)
            .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false);

    if !type_ok {
        return Err(format!(
            "Tipo de archivo no soportado: {} (se aceptan mp3, wav, m4a)",
            file.filename
        ));
    }

    if file.bytes.is_empty() {
        return Err("El archivo está vacío".to_string());
    }

    if file.bytes.len() > max_bytes {
        return Err(format!(
            "El archivo supera el tamaño máximo de {} MB",
            max_bytes / (1024 * 1024)
        ));
    }

    Ok(())
}

/// Title a call gets from its filename: the name without the extension.
pub fn derive_title(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => filename.to_string(),
    }
}

fn sanitize(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Collision-resistant object key: account folder plus a millisecond
/// timestamp prefix on the sanitized filename.
pub fn storage_key(account_id: Id, filename: &str) -> String {
    format!(
        "{account_id}/{}_{}",
        chrono::Utc::now().timestamp_millis(),
        sanitize(filename)
    )
}

async fn upload_one(
    db: Arc<DatabaseConnection>,
    store: Arc<ObjectStoreClient>,
    processor: Arc<Processor>,
    account_id: Id,
    file: UploadedFile,
    max_bytes: usize,
) -> UploadOutcome {
    let title = derive_title(&file.filename);

    if let Err(reason) = validate(&file, max_bytes) {
        return UploadOutcome {
            filename: file.filename,
            title,
            status: UploadStatus::Invalid { reason },
        };
    }

    match call::find_by_title(&db, account_id, &title).await {
        Ok(Some(_)) => {
            info!("Skipping duplicate upload '{title}' for account {account_id}");
            return UploadOutcome {
                filename: file.filename,
                title,
                status: UploadStatus::Duplicate,
            };
        }
        Ok(None) => {}
        Err(e) => {
            return UploadOutcome {
                filename: file.filename,
                title,
                status: UploadStatus::Failed {
                    reason: format!("No se pudo verificar duplicados: {e}"),
                },
            };
        }
    }

    let key = storage_key(account_id, &file.filename);
    let content_type = file
        .content_type
        .clone()
        .unwrap_or_else(|| "audio/mpeg".to_string());

    let audio_url = match store.put(&key, file.bytes, &content_type).await {
        Ok(url) => url,
        Err(e) => {
            return UploadOutcome {
                filename: file.filename,
                title,
                status: UploadStatus::Failed {
                    reason: format!("No se pudo almacenar el audio: {e}"),
                },
            };
        }
    };

    let now = chrono::Utc::now();
    let call_model = calls::Model {
        id: Id::new_v4(),
        account_id,
        title: title.clone(),
        filename: file.filename.clone(),
        audio_url: Some(audio_url.clone()),
        duration_seconds: None,
        status: CallStatus::Transcribing,
        progress: 10,
        transcription: None,
        summary: None,
        sentiment: None,
        topics: None,
        entities: None,
        result: None,
        product: None,
        non_sale_reason: None,
        created_at: now.into(),
        updated_at: now.into(),
    };

    let created = match call::create(&db, call_model).await {
        Ok(created) => created,
        Err(e) => {
            // Without a call row the stored audio would be orphaned. This is
            // also the branch a same-title race inside one sub-batch lands in
            // when the unique constraint rejects the second insert.
            if let Err(cleanup) = store.delete(&key).await {
                warn!("Could not remove stored audio {key} after failed insert: {cleanup}");
            }
            return UploadOutcome {
                filename: file.filename,
                title,
                status: UploadStatus::Failed {
                    reason: format!("No se pudo registrar la llamada: {e}"),
                },
            };
        }
    };

    processor.spawn(ProcessRequest::new(created.id, audio_url));

    UploadOutcome {
        filename: file.filename,
        title,
        status: UploadStatus::Uploaded {
            call_id: created.id,
        },
    }
}

/// Uploads a batch of files for one account.
///
/// Files are processed in chunks; within a chunk, sub-batches run with
/// bounded parallelism and are awaited together. A short delay separates
/// chunks. Always returns a summary, never an error: per-file failures are
/// reported in their outcome.
pub async fn upload_batch(
    db: Arc<DatabaseConnection>,
    store: Arc<ObjectStoreClient>,
    processor: Arc<Processor>,
    account_id: Id,
    files: Vec<UploadedFile>,
    limits: UploadLimits,
) -> Result<BatchSummary, Error> {
    info!(
        "Uploading batch of {} files for account {account_id}",
        files.len()
    );

    let total_chunks = files.len().div_ceil(limits.chunk_size);
    let mut outcomes = Vec::with_capacity(files.len());

    let mut chunks = Vec::with_capacity(total_chunks);
    let mut files = files.into_iter().peekable();
    while files.peek().is_some() {
        chunks.push(files.by_ref().take(limits.chunk_size).collect::<Vec<_>>());
    }

    for (chunk_index, chunk) in chunks.into_iter().enumerate() {
        if chunk_index > 0 {
            tokio::time::sleep(limits.chunk_delay).await;
        }

        let mut sub_batches = Vec::new();
        let mut chunk = chunk.into_iter().peekable();
        while chunk.peek().is_some() {
            sub_batches.push(chunk.by_ref().take(limits.concurrency).collect::<Vec<_>>());
        }

        for sub_batch in sub_batches {
            let mut join_set = JoinSet::new();
            for file in sub_batch {
                let db = db.clone();
                let store = store.clone();
                let processor = processor.clone();
                join_set.spawn(upload_one(db, store, processor, account_id, file, limits.max_bytes));
            }

            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(e) => {
                        error!("Upload task panicked: {e}");
                        return Err(Error::internal("Upload task failed to complete"));
                    }
                }
            }
        }
    }

    Ok(BatchSummary::tally(outcomes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(filename: &str, content_type: Option<&str>, size: usize) -> UploadedFile {
        UploadedFile {
            filename: filename.to_string(),
            content_type: content_type.map(str::to_string),
            bytes: vec![0u8; size],
        }
    }

    #[test]
    fn validation_accepts_audio_content_types_and_known_extensions() {
        assert!(validate(&file("llamada.mp3", None, 100), 1_000).is_ok());
        assert!(validate(&file("llamada.bin", Some("audio/ogg"), 100), 1_000).is_ok());
        assert!(validate(&file("llamada.M4A", None, 100), 1_000).is_ok());
    }

    #[test]
    fn validation_rejects_unsupported_types() {
        let result = validate(&file("notas.pdf", Some("application/pdf"), 100), 1_000);
        assert!(result.unwrap_err().contains("no soportado"));
    }

    #[test]
    fn validation_rejects_oversized_and_empty_files() {
        assert!(validate(&file("llamada.mp3", None, 2_000), 1_000).is_err());
        assert!(validate(&file("llamada.mp3", None, 0), 1_000).is_err());
    }

    #[test]
    fn title_is_the_filename_without_extension() {
        assert_eq!(derive_title("ventas_2024-03-01.mp3"), "ventas_2024-03-01");
        assert_eq!(derive_title("sin_extension"), "sin_extension");
        assert_eq!(derive_title(".oculto"), ".oculto");
    }

    #[test]
    fn storage_keys_are_account_scoped_and_sanitized() {
        let account_id = Id::new_v4();
        let key = storage_key(account_id, "llamada con ñ y espacios.mp3");
        assert!(key.starts_with(&format!("{account_id}/")));
        assert!(key.ends_with("_llamada_con___y_espacios.mp3"));
        assert!(!key.contains(' '));
    }

    #[test]
    fn batch_summary_tallies_outcomes() {
        let outcomes = vec![
            UploadOutcome {
                filename: "a.mp3".to_string(),
                title: "a".to_string(),
                status: UploadStatus::Uploaded {
                    call_id: Id::new_v4(),
                },
            },
            UploadOutcome {
                filename: "b.mp3".to_string(),
                title: "b".to_string(),
                status: UploadStatus::Duplicate,
            },
            UploadOutcome {
                filename: "c.pdf".to_string(),
                title: "c".to_string(),
                status: UploadStatus::Invalid {
                    reason: "tipo".to_string(),
                },
            },
        ];

        let summary = BatchSummary::tally(outcomes);
        assert_eq!(summary.uploaded, 1);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.invalid, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.outcomes.len(), 3);
    }
}

#[cfg(all(test, feature = "mock"))]
mod coordinator_tests {
    use super::*;
    use call_ai::{MockCompletionModel, MockTranscriber};
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, RuntimeErr};

    fn audio_file(filename: &str) -> UploadedFile {
        UploadedFile {
            filename: filename.to_string(),
            content_type: Some("audio/mpeg".to_string()),
            bytes: vec![0u8; 64],
        }
    }

    fn existing_call(account_id: Id, title: &str) -> calls::Model {
        let now = chrono::Utc::now();
        calls::Model {
            id: Id::new_v4(),
            account_id,
            title: title.to_string(),
            filename: format!("{title}.mp3"),
            audio_url: Some("https://store/audio.mp3".to_string()),
            duration_seconds: None,
            status: CallStatus::Complete,
            progress: 100,
            transcription: None,
            summary: None,
            sentiment: None,
            topics: None,
            entities: None,
            result: None,
            product: None,
            non_sale_reason: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn test_processor(db: Arc<DatabaseConnection>) -> Arc<Processor> {
        Arc::new(Processor::new(
            db,
            Arc::new(MockCompletionModel::new()),
            Arc::new(MockTranscriber::new()),
            12_000,
            Duration::from_secs(5),
        ))
    }

    // A title that already exists for the account ends as Duplicate: the
    // audio is never stored and no second call row is inserted.
    #[tokio::test]
    async fn duplicate_title_skips_storage_and_insert() {
        let account_id = Id::new_v4();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![existing_call(account_id, "llamada_enero")]])
                .into_connection(),
        );

        let mut server = mockito::Server::new_async().await;
        let put = server
            .mock("POST", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let store =
            Arc::new(ObjectStoreClient::new("key", &server.url(), "call-audio").unwrap());
        let processor = test_processor(db.clone());

        let outcome = upload_one(
            db.clone(),
            store,
            processor.clone(),
            account_id,
            audio_file("llamada_enero.mp3"),
            1_000_000,
        )
        .await;

        assert_eq!(outcome.status, UploadStatus::Duplicate);
        assert_eq!(outcome.title, "llamada_enero");
        put.assert_async().await;

        drop(processor);
        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        assert_eq!(log.len(), 1);
    }

    // When the insert is rejected after the audio was already stored, the
    // coordinator removes the stored object again.
    #[tokio::test]
    async fn failed_insert_removes_the_stored_audio() {
        let account_id = Id::new_v4();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<calls::Model>::new()])
                .append_query_errors([DbErr::Query(RuntimeErr::Internal(
                    "duplicate key value violates unique constraint".to_string(),
                ))])
                .into_connection(),
        );

        let mut server = mockito::Server::new_async().await;
        let object_path = mockito::Matcher::Regex("^/object/call-audio/.+".to_string());
        let put = server
            .mock("POST", object_path.clone())
            .with_status(200)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", object_path)
            .with_status(200)
            .create_async()
            .await;

        let store =
            Arc::new(ObjectStoreClient::new("key", &server.url(), "call-audio").unwrap());
        let processor = test_processor(db.clone());

        let outcome = upload_one(
            db.clone(),
            store,
            processor,
            account_id,
            audio_file("llamada_enero.mp3"),
            1_000_000,
        )
        .await;

        assert!(matches!(outcome.status, UploadStatus::Failed { .. }));
        put.assert_async().await;
        delete.assert_async().await;
    }
}
