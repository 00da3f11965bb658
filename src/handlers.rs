use std::sync::Arc;

use actix_multipart::{Multipart, MultipartError};
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;

use crate::config::Settings;
use crate::error::{ApiError, ApiResult, PredictionError};
use crate::inference::Classifier;
use crate::models::{PredictionRecord, SuccessResponse, WelcomeResponse};
use crate::policy::ClassificationPolicy;
use crate::preprocess::preprocess;
use crate::store::PredictionStore;

const ALLOWED_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// Everything a request needs, built once in `main`.
pub struct AppState {
    pub classifier: Arc<dyn Classifier>,
    pub policy: ClassificationPolicy,
    pub store: PredictionStore,
    pub image_size: u32,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(settings: &Settings, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier,
            policy: ClassificationPolicy::new(settings.confidence_threshold),
            store: PredictionStore::open(&settings.predictions_path),
            image_size: settings.image_size,
            max_upload_bytes: settings.max_upload_bytes,
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/predict").route(web::post().to(predict)))
        .service(web::resource("/predict/histories").route(web::get().to(histories)));
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(WelcomeResponse {
        message: "Welcome to the Cancer Prediction API!",
    })
}

struct UploadedImage {
    bytes: Vec<u8>,
    content_type: String,
}

/// Drain the multipart stream, keeping the first `image` field. Every field
/// counts toward the upload limit.
async fn read_upload(
    mut payload: Multipart,
    max_bytes: usize,
) -> ApiResult<Option<UploadedImage>> {
    let mut upload: Option<UploadedImage> = None;
    let mut total = 0usize;

    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(field) => field,
            Err(e) => return Err(multipart_error(e, upload.is_some())),
        };

        let is_image = upload.is_none() && field.content_disposition().get_name() == Some("image");
        let content_type = field.content_type().essence_str().to_string();
        let mut bytes = Vec::new();

        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|e| multipart_error(e, true))?;
            total += data.len();
            if total > max_bytes {
                return Err(ApiError::PayloadTooLarge(max_bytes));
            }
            if is_image {
                bytes.extend_from_slice(&data);
            }
        }

        if is_image {
            upload = Some(UploadedImage {
                bytes,
                content_type,
            });
        }
    }

    Ok(upload)
}

fn multipart_error(err: MultipartError, in_body: bool) -> ApiError {
    match err {
        MultipartError::NoContentType | MultipartError::ParseContentType | MultipartError::Boundary
            if !in_body =>
        {
            log::debug!("Request is not a multipart upload: {}", err);
            ApiError::NoFile
        }
        MultipartError::Payload(e) => ApiError::Internal(format!("upload stream: {}", e)),
        err => ApiError::MalformedUpload(err.to_string()),
    }
}

pub async fn predict(state: web::Data<AppState>, payload: Multipart) -> ApiResult<HttpResponse> {
    let upload = read_upload(payload, state.max_upload_bytes)
        .await?
        .ok_or(ApiError::NoFile)?;

    if !ALLOWED_TYPES.contains(&upload.content_type.as_str()) {
        return Err(ApiError::InvalidFileType);
    }
    log::debug!(
        "Received {} upload of {} bytes",
        upload.content_type,
        upload.bytes.len()
    );

    let worker = state.clone();
    let decision = web::block(move || -> Result<_, PredictionError> {
        let tensor = preprocess(&upload.bytes, worker.image_size)?;
        let scores = worker.classifier.classify(&tensor)?;
        Ok(worker.policy.decide(&scores)?)
    })
    .await??;

    let record = PredictionRecord::new(decision.label, decision.suggestion);
    log::info!(
        "Prediction {}: {} ({:.2}%)",
        record.id,
        record.result,
        decision.confidence
    );

    let worker = state.clone();
    let stored = record.clone();
    web::block(move || worker.store.append(stored)).await??;

    Ok(HttpResponse::Created().json(SuccessResponse::new(
        Some("Model is predicted successfully"),
        record,
    )))
}

pub async fn histories(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let worker = state.clone();
    let records = web::block(move || worker.store.load()).await??;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(None, records)))
}
