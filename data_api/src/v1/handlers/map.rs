use crate::v1::error::ApiError;
use axum::Json;
use axum::extract::State;
use display_store::Config;
use display_store::map::MapView;
use display_store::store::RecordStore;
use std::sync::Arc;

pub async fn get_map(
    State(store): State<RecordStore>,
    State(config): State<Arc<Config>>,
) -> Result<Json<MapView>, ApiError> {
    let records = store.load()?;
    Ok(Json(MapView::from_records(&records, &config.map)))
}
