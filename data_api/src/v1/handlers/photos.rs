use crate::v1::error::ApiError;
use crate::v1::handlers::read_upload;
use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use display_store::photo::{PhotoStore, content_type};
use display_store::record::{AssetRecord, RecordId};
use display_store::store::RecordStore;
use tracing::warn;

pub async fn upload_photo(
    State(store): State<RecordStore>,
    State(photos): State<PhotoStore>,
    Path(id): Path<RecordId>,
    multipart: Multipart,
) -> Result<Json<AssetRecord>, ApiError> {
    let Some(previous) = store.get(&id)? else {
        return Err(ApiError::NotFound(id));
    };

    let (file_name, bytes) = read_upload(multipart).await?;
    let path = photos.save(&id, &file_name, &bytes).await?;
    let updated = store.set_photo(&id, &path)?;
    if let Err(e) = photos.remove_superseded(&previous.photo_path, &path).await {
        warn!(error = ?e, %id, "could not remove superseded photo");
    }
    Ok(Json(updated))
}

pub async fn get_photo(
    State(store): State<RecordStore>,
    State(photos): State<PhotoStore>,
    Path(id): Path<RecordId>,
) -> Result<impl IntoResponse, ApiError> {
    let record = store.get(&id)?.ok_or_else(|| ApiError::NotFound(id.clone()))?;
    if record.photo_path.trim().is_empty() {
        return Err(ApiError::NotFound(id));
    }

    let path = std::path::Path::new(&record.photo_path);
    let bytes = photos.read(path).await?;
    Ok(([(CONTENT_TYPE, content_type(path))], bytes))
}
