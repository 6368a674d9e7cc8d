use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use display_store::error::{ImportError, PhotoError, StoreError};
use display_store::record::RecordId;
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::warn;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessage {
    #[serde(serialize_with = "serialize_status")]
    pub status_code: StatusCode,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Photo(#[from] PhotoError),
    #[error(transparent)]
    Multipart(#[from] MultipartError),
    #[error("no record with id {0}")]
    NotFound(RecordId),
    #[error("request contains no file upload")]
    MissingUpload,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Store(e) => store_error_response(e),
            ApiError::Import(e) => match e {
                ImportError::Store(e) => store_error_response(e),
                ImportError::UnsupportedFormat(_) => {
                    warn!(error = ?e, "rejected import upload");
                    ErrorMessage::from((StatusCode::BAD_REQUEST, e.to_string())).into_response()
                }
                e => {
                    warn!(error = ?e, "could not parse import upload");
                    ErrorMessage::from((StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
                        .into_response()
                }
            },
            ApiError::Photo(e) => match e {
                PhotoError::Io(e) => {
                    warn!(error = ?e, "photo i/o error");
                    ErrorMessage::from((StatusCode::INTERNAL_SERVER_ERROR, "could not store photo"))
                        .into_response()
                }
                PhotoError::Missing(path) => {
                    warn!(path = %path.display(), "photo file referenced by record is missing");
                    ErrorMessage::from((StatusCode::NOT_FOUND, "photo not found")).into_response()
                }
                e => ErrorMessage::from((StatusCode::BAD_REQUEST, e.to_string())).into_response(),
            },
            ApiError::Multipart(e) => {
                warn!(error = ?e, "malformed multipart request");
                ErrorMessage::from((e.status(), e.body_text())).into_response()
            }
            ApiError::NotFound(id) => {
                ErrorMessage::from((StatusCode::NOT_FOUND, format!("no record with id {id}")))
                    .into_response()
            }
            ApiError::MissingUpload => {
                ErrorMessage::from((StatusCode::BAD_REQUEST, "request contains no file upload"))
                    .into_response()
            }
        }
    }
}

fn store_error_response(e: StoreError) -> Response {
    match e {
        StoreError::UnknownId(id) => {
            ErrorMessage::from((StatusCode::NOT_FOUND, format!("no record with id {id}")))
                .into_response()
        }
        StoreError::DuplicateId(_) => {
            ErrorMessage::from((StatusCode::CONFLICT, e.to_string())).into_response()
        }
        StoreError::BlankId => {
            ErrorMessage::from((StatusCode::BAD_REQUEST, e.to_string())).into_response()
        }
        StoreError::Io(_) | StoreError::Csv(_) => {
            warn!(error = ?e, "record store error");
            ErrorMessage::from((StatusCode::INTERNAL_SERVER_ERROR, "record store unavailable"))
                .into_response()
        }
    }
}

fn serialize_status<S>(value: &StatusCode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u16(value.as_u16())
}

impl From<(StatusCode, String)> for ErrorMessage {
    fn from((status_code, message): (StatusCode, String)) -> Self {
        Self {
            status_code,
            message,
        }
    }
}

impl From<(StatusCode, &str)> for ErrorMessage {
    fn from((status_code, message): (StatusCode, &str)) -> Self {
        Self {
            status_code,
            message: message.into(),
        }
    }
}

impl IntoResponse for ErrorMessage {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(error: impl Into<ApiError>) -> StatusCode {
        error.into().into_response().status()
    }

    #[test]
    fn error_message_serializes_numeric_status() {
        let message = ErrorMessage::from((StatusCode::NOT_FOUND, "photo not found"));
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            serde_json::json!({ "statusCode": 404, "message": "photo not found" })
        );
    }

    #[test]
    fn errors_map_to_status_codes() {
        assert_eq!(status_of(StoreError::UnknownId("1".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(StoreError::DuplicateId("1".into())), StatusCode::CONFLICT);
        assert_eq!(
            status_of(ImportError::UnsupportedFormat("a.pdf".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ImportError::MissingHeader),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(ImportError::Store(StoreError::BlankId)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(PhotoError::EmptyUpload), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(PhotoError::Missing("data/images/1.png".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(ApiError::MissingUpload), StatusCode::BAD_REQUEST);
    }
}
