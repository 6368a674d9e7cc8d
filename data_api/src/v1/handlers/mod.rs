pub mod import;
pub mod map;
pub mod photos;
pub mod records;

use crate::v1::error::ApiError;
use axum::extract::Multipart;

/// First file part of a multipart body, as `(file name, bytes)`.
pub async fn read_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart.next_field().await? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await?;
        return Ok((file_name, bytes.to_vec()));
    }
    Err(ApiError::MissingUpload)
}
