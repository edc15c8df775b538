//! API error types with structured JSON responses.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::crop::CropError;
use crate::disease::DiseaseError;
use crate::report::ReportError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::PayloadTooLarge(detail) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", detail)
            }
            ApiError::ServiceUnavailable(detail) => {
                (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", detail)
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "Internal server error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            success: false,
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<CropError> for ApiError {
    fn from(err: CropError) -> Self {
        match err {
            CropError::UnknownCrop(_) => ApiError::BadRequest("Invalid crop selection".into()),
            CropError::MissingParameter(_) | CropError::InvalidParameter(_) => {
                ApiError::BadRequest(err.to_string())
            }
            CropError::ModelLoad(_) => ApiError::ServiceUnavailable(err.to_string()),
            CropError::Inference(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<DiseaseError> for ApiError {
    fn from(err: DiseaseError) -> Self {
        match err {
            DiseaseError::Decode(_) => {
                ApiError::BadRequest(format!("Error processing image: {err}"))
            }
            DiseaseError::NotReady(_) | DiseaseError::ModelLoad(_) => {
                ApiError::ServiceUnavailable("Prediction service unavailable".into())
            }
            DiseaseError::ShapeMismatch { .. } | DiseaseError::Inference(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

/// Body rejections keep their status class but use the structured body.
fn rejection(status: StatusCode, text: String) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(text)
    } else {
        ApiError::BadRequest(text)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        rejection(err.status(), err.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(err: MultipartRejection) -> Self {
        rejection(err.status(), err.body_text())
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("worker task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn bad_request_returns_400_with_message() {
        let response = ApiError::BadRequest("No file uploaded".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert_eq!(json["error"]["message"], "No file uploaded");
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let response = ApiError::Internal("stack trace".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"]["message"], "Internal server error occurred");
    }

    #[tokio::test]
    async fn unavailable_returns_503() {
        let response = ApiError::ServiceUnavailable("down".into()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn payload_too_large_returns_413() {
        let response = ApiError::PayloadTooLarge("big".into()).into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn crop_errors_map_to_client_messages() {
        let err: ApiError = CropError::UnknownCrop("wheat".into()).into();
        assert!(matches!(err, ApiError::BadRequest(ref m) if m == "Invalid crop selection"));

        let err: ApiError = CropError::MissingParameter("N").into();
        assert!(matches!(err, ApiError::BadRequest(ref m) if m == "Missing parameter: N"));

        let err: ApiError = CropError::ModelLoad("gone".into()).into();
        assert!(matches!(err, ApiError::ServiceUnavailable(_)));
    }

    #[test]
    fn decode_error_is_client_error() {
        let err: ApiError = DiseaseError::Decode("bad magic".into()).into();
        match err {
            ApiError::BadRequest(m) => assert!(m.starts_with("Error processing image:")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
