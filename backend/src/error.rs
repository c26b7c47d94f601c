use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use log::error;
use serde_json::json;

use crate::db::repository::RepositoryError;
use crate::storage::image_store::MAX_UPLOAD_BYTES;

/// Top-level error taxonomy for the HTTP surface. Everything a handler can
/// fail with maps onto one of these, and `ResponseError` turns each into the
/// `{"error": ...}` JSON body the clients expect.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("authentication required")]
    Unauthorized,
    #[error("no file provided")]
    MissingFile,
    #[error("file type not allowed, please upload JPG, JPEG or PNG files")]
    InvalidFileType,
    #[error("file too large, the limit is {} bytes", MAX_UPLOAD_BYTES)]
    FileTooLarge,
    #[error("classification failed: {0}")]
    Classification(String),
    #[error("not found")]
    NotFound,
    #[error("database error")]
    Database(#[from] RepositoryError),
    #[error("internal server error")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MissingFile | ApiError::InvalidFileType => {
                StatusCode::BAD_REQUEST
            }
            ApiError::InvalidCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Classification(_) => StatusCode::BAD_GATEWAY,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!("request failed: {self:?}");
        }
        // Internal failures are logged above; the client only ever sees a
        // generic message for them.
        let message = match self {
            ApiError::Database(_) | ApiError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = ApiError::Internal("secret path /var/db".into());
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = actix_web::body::to_bytes(resp.into_body());
        let body = futures::executor::block_on(body).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "internal server error");
    }

    #[test]
    fn upload_errors_map_to_client_status_codes() {
        assert_eq!(ApiError::MissingFile.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::InvalidFileType.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::FileTooLarge.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::Classification("model offline".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }
}
