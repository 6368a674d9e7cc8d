use crate::v1::api_models::{GridRow, RecordFields, StatusUpdate};
use crate::v1::error::ApiError;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Local;
use display_store::geocoder::{Geocode, NominatimGeocoder};
use display_store::record::{AssetRecord, RecordId, sort_by_number};
use display_store::store::{GridEdit, RecordStore};
use tracing::info;

pub async fn list_records(
    State(store): State<RecordStore>,
) -> Result<Json<Vec<AssetRecord>>, ApiError> {
    let mut records = store.load()?;
    sort_by_number(&mut records);
    Ok(Json(records))
}

pub async fn get_record(
    State(store): State<RecordStore>,
    Path(id): Path<RecordId>,
) -> Result<Json<AssetRecord>, ApiError> {
    store
        .get(&id)?
        .map(Json)
        .ok_or(ApiError::NotFound(id))
}

/// Manual entry. Coordinates typed in by the user win over a lookup; without them the
/// address is geocoded.
pub async fn create_record(
    State(store): State<RecordStore>,
    State(geocoder): State<NominatimGeocoder>,
    Json(fields): Json<RecordFields>,
) -> Result<(StatusCode, Json<AssetRecord>), ApiError> {
    let mut record = fields.into_new_record(Local::now().date_naive());
    if record.latitude == 0.0 {
        let found = match record.address_query() {
            Some(query) => geocoder.geocode(&query).await.coordinates(),
            None => None,
        };
        record.set_coordinates(found);
    }

    let created = store.insert(record)?;
    info!(name: "record.created", id = %created.id, "created record");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn save_grid(
    State(store): State<RecordStore>,
    Json(rows): Json<Vec<GridRow>>,
) -> Result<Json<Vec<AssetRecord>>, ApiError> {
    let edits = rows.into_iter().map(GridEdit::from).collect();
    let mut records = store.replace_all(edits)?;
    sort_by_number(&mut records);
    Ok(Json(records))
}

pub async fn delete_record(
    State(store): State<RecordStore>,
    Path(id): Path<RecordId>,
) -> Result<StatusCode, ApiError> {
    store.remove(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_status(
    State(store): State<RecordStore>,
    Path(id): Path<RecordId>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<AssetRecord>, ApiError> {
    Ok(Json(store.set_status(&id, update.status)?))
}
