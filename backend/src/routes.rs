use std::path::PathBuf;

use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::{Either, HttpResponse, web};
use futures::{StreamExt, TryStreamExt};
use log::{info, warn};
use serde_json::json;
use uuid::Uuid;

use shared::{
    ContactRequest, DetectionResponse, FeedbackRequest, HistoryEntry, HistoryResponse,
    is_valid_email,
};

use crate::auth::middleware::AuthenticatedUser;
use crate::auth::routes::{check_auth, login, logout, register};
use crate::classifier::Classifier;
use crate::db::models::DetectionResult;
use crate::db::repository::Repository;
use crate::error::ApiError;
use crate::export::ExportSink;
use crate::storage::{ImageStore, StorageError, image_store::MAX_UPLOAD_BYTES};

pub fn configure_routes(cfg: &mut web::ServiceConfig, upload_dir: PathBuf) {
    cfg.service(web::resource("/register").route(web::post().to(register)))
        .service(web::resource("/login").route(web::post().to(login)))
        .service(
            web::resource("/logout")
                .route(web::get().to(logout))
                .route(web::post().to(logout)),
        )
        .service(web::resource("/check_auth").route(web::get().to(check_auth)))
        .service(web::resource("/upload").route(web::post().to(handle_upload)))
        .service(web::resource("/detection_history").route(web::get().to(detection_history)))
        .service(web::resource("/results/{id}").route(web::get().to(get_result)))
        .service(web::resource("/feedback").route(web::post().to(submit_feedback)))
        .service(web::resource("/contact").route(web::post().to(submit_contact)))
        .service(Files::new("/static/uploads", upload_dir));
}

/// Pull the uploaded file out of the multipart payload. The extension is
/// resolved from the part headers before any bytes are read, so a
/// disallowed type is rejected without buffering the body; the size cap is
/// enforced while streaming.
async fn read_upload(payload: &mut Multipart) -> Result<(Vec<u8>, &'static str), ApiError> {
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ApiError::Validation(format!("malformed upload payload: {}", e)))?
    {
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(str::to_string));
        // Non-file form fields ride along in browser submissions.
        if file_name.is_none() {
            continue;
        }

        let mime_type = field.content_type().map(|mime| mime.essence_str().to_string());
        let extension = ImageStore::resolve_extension(mime_type.as_deref(), file_name.as_deref())
            .map_err(|_| ApiError::InvalidFileType)?;

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|e| ApiError::Validation(format!("malformed upload payload: {}", e)))?;
            if data.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(ApiError::FileTooLarge);
            }
            data.extend_from_slice(&chunk);
        }

        if data.is_empty() {
            return Err(ApiError::MissingFile);
        }
        return Ok((data, extension));
    }

    Err(ApiError::MissingFile)
}

async fn handle_upload(
    user: AuthenticatedUser,
    mut payload: Multipart,
    repo: web::Data<Repository>,
    store: web::Data<ImageStore>,
    classifier: web::Data<dyn Classifier>,
    exporter: web::Data<dyn ExportSink>,
) -> Result<HttpResponse, ApiError> {
    let (data, extension) = read_upload(&mut payload).await?;

    let image = image::load_from_memory(&data)
        .map_err(|e| ApiError::Validation(format!("could not decode image: {}", e)))?;

    let stored = store.save(&data, extension).map_err(|e| match e {
        StorageError::FileTooLarge => ApiError::FileTooLarge,
        StorageError::InvalidFormat => ApiError::InvalidFileType,
        StorageError::Io(io) => ApiError::Internal(io.to_string()),
    })?;

    // Synchronous by design; a real model would move off the request pool.
    let classification = classifier
        .classify(&image)
        .map_err(|e| ApiError::Classification(e.to_string()))?;

    let result = repo
        .insert_result(
            user.0.id,
            &stored.relative_path,
            &classification.label.to_string(),
            classification.confidence,
        )
        .await?;

    if let Err(e) = exporter.record_result(&result) {
        warn!("Failed to mirror detection result {} to CSV: {}", result.id, e);
    }

    info!(
        "Stored detection result {} for user {}: {} ({:.2})",
        result.id, user.0.username, result.prediction, result.confidence
    );

    Ok(HttpResponse::Ok().json(DetectionResponse {
        id: result.id,
        prediction: classification.label,
        confidence: classification.confidence,
        image_url: stored.url,
        description: classification.label.description().to_string(),
    }))
}

fn history_entry(result: DetectionResult) -> HistoryEntry {
    HistoryEntry {
        id: result.id,
        prediction: result.prediction,
        confidence: result.confidence,
        image_path: format!("/{}", result.image_path),
        timestamp: result.created_at,
    }
}

async fn detection_history(
    user: AuthenticatedUser,
    repo: web::Data<Repository>,
) -> Result<HttpResponse, ApiError> {
    let results = repo.results_for_user(user.0.id).await?;
    Ok(HttpResponse::Ok().json(HistoryResponse {
        results: results.into_iter().map(history_entry).collect(),
    }))
}

async fn get_result(
    user: AuthenticatedUser,
    path: web::Path<String>,
    repo: web::Data<Repository>,
) -> Result<HttpResponse, ApiError> {
    let result_id = Uuid::parse_str(&path.into_inner())
        .map_err(|_| ApiError::Validation("invalid result id".into()))?;

    // Owner-scoped lookup: someone else's result is a 404, not a 403, so
    // result ids cannot be probed for existence.
    match repo.get_result(user.0.id, result_id).await? {
        Some(result) => Ok(HttpResponse::Ok().json(history_entry(result))),
        None => Err(ApiError::NotFound),
    }
}

type Body<T> = Either<web::Json<T>, web::Form<T>>;

async fn submit_feedback(
    user: AuthenticatedUser,
    body: Body<FeedbackRequest>,
    repo: web::Data<Repository>,
    exporter: web::Data<dyn ExportSink>,
) -> Result<HttpResponse, ApiError> {
    let form = body.into_inner();
    let message = form.message.trim();
    if message.is_empty() {
        return Err(ApiError::Validation("please provide feedback".into()));
    }

    let feedback = repo.insert_feedback(Some(user.0.id), message).await?;
    if let Err(e) = exporter.record_feedback(&feedback) {
        warn!("Failed to mirror feedback {} to CSV: {}", feedback.id, e);
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "thank you for your feedback" })))
}

async fn submit_contact(
    body: Body<ContactRequest>,
    repo: web::Data<Repository>,
    exporter: web::Data<dyn ExportSink>,
) -> Result<HttpResponse, ApiError> {
    let form = body.into_inner();

    let name = form.name.trim();
    let email = form.email.trim();
    let subject = form.subject.trim();
    let message = form.message.trim();

    if name.is_empty() || email.is_empty() || subject.is_empty() || message.is_empty() {
        return Err(ApiError::Validation(
            "please fill in all required fields".into(),
        ));
    }
    if !is_valid_email(email) {
        return Err(ApiError::Validation("invalid email address".into()));
    }

    let contact = repo.insert_contact(name, email, subject, message).await?;
    if let Err(e) = exporter.record_contact(&contact) {
        warn!("Failed to mirror contact message {} to CSV: {}", contact.id, e);
    }

    info!("New contact form submission from {}", contact.email);

    Ok(HttpResponse::Ok().json(json!({ "message": "thank you for contacting us" })))
}
