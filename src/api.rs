//! HTTP surface: a single `POST /` endpoint

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::{header, Method},
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ServerConfig;
use crate::error::ServiceError;
use crate::models::{Anonymizer, UtilityEvaluator};
use crate::storage::UploadStore;
use crate::types::{ColumnRoles, FormFields, ModelEvaluationRequest, PrivacyParams, FILE_FIELD};

#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
    store: UploadStore,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let store = UploadStore::new(config.upload_dir.clone());
        Self {
            config: Arc::new(config),
            store,
        }
    }

    pub fn store(&self) -> &UploadStore {
        &self.store
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", post(process_file))
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        .with_state(state)
}

struct UploadedFile {
    name: String,
    contents: Bytes,
}

async fn read_form(mut multipart: Multipart) -> Result<(Option<UploadedFile>, FormFields), ServiceError> {
    let mut file = None;
    let mut fields = FormFields::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == FILE_FIELD {
            let file_name = field.file_name().unwrap_or_default().to_owned();
            let contents = field.bytes().await?;
            file = Some(UploadedFile {
                name: file_name,
                contents,
            });
        } else {
            fields.insert(name, field.text().await?);
        }
    }

    Ok((file, fields))
}

async fn process_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServiceError> {
    let multipart = multipart.map_err(|rejection| ServiceError::Multipart {
        status: rejection.status(),
        message: rejection.body_text(),
    })?;
    let (file, fields) = read_form(multipart).await?;

    let file = file.ok_or(ServiceError::MissingFile)?;
    if file.name.is_empty() {
        return Err(ServiceError::EmptyFilename);
    }

    if fields.wants_anonymization() {
        anonymize(&state, file, &fields).await
    } else {
        evaluate(&state, file, &fields).await
    }
}

async fn anonymize(state: &AppState, file: UploadedFile, fields: &FormFields) -> Result<Response, ServiceError> {
    // Параметры проверяются до записи на диск
    let params = PrivacyParams::parse(fields.get("epsilon"))?;
    let roles = ColumnRoles::from_fields(fields);

    let upload = state.store.save(&file.name, &file.contents).await?;
    let output = state.store.output_path(&upload);
    tracing::info!(
        "Anonymize request: {} ({} bytes), epsilon={}",
        upload.file_name,
        file.contents.len(),
        params.epsilon
    );

    let anonymizer = Anonymizer::new(params, roles);
    let limits = state.config.limits;
    let (input, target) = (upload.path.clone(), output.clone());
    let report =
        tokio::task::spawn_blocking(move || anonymizer.anonymize_file(&input, &target, limits)).await??;
    tracing::info!(
        "Anonymized {} rows: numerical={:?}, binary={:?}, skipped={:?}",
        report.rows,
        report.noised_numerical,
        report.noised_binary,
        report.skipped_binary
    );

    if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
        return Err(ServiceError::OutputMissing);
    }
    let contents = tokio::fs::read(&output).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", upload.attachment_name()),
            ),
        ],
        contents,
    )
        .into_response())
}

async fn evaluate(state: &AppState, file: UploadedFile, fields: &FormFields) -> Result<Response, ServiceError> {
    let request = ModelEvaluationRequest::from_fields(fields)?;

    let upload = state.store.save(&file.name, &file.contents).await?;
    tracing::info!(
        "Evaluate request: {} ({} bytes), algorithm={:?}",
        upload.file_name,
        file.contents.len(),
        request.algorithm
    );

    let evaluator = UtilityEvaluator::new(request);
    let limits = state.config.limits;
    let input = upload.path.clone();
    let scores = tokio::task::spawn_blocking(move || evaluator.evaluate_file(&input, limits)).await??;
    tracing::info!("Scores: baseline={:.4}, private={:.4}", scores.accuracy1, scores.accuracy2);

    Ok(Json(scores).into_response())
}
