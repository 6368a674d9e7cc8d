use crate::v1::error::ApiError;
use crate::v1::handlers::read_upload;
use axum::Json;
use axum::extract::{Multipart, State};
use display_store::Config;
use display_store::geocoder::NominatimGeocoder;
use display_store::importer::{ImportReport, Importer};
use display_store::store::RecordStore;
use std::sync::Arc;

pub async fn import_spreadsheet(
    State(store): State<RecordStore>,
    State(geocoder): State<NominatimGeocoder>,
    State(config): State<Arc<Config>>,
    multipart: Multipart,
) -> Result<Json<ImportReport>, ApiError> {
    let (file_name, bytes) = read_upload(multipart).await?;
    let importer = Importer::new(store, geocoder, config.import.default_city.as_str());
    Ok(Json(importer.import(&file_name, &bytes).await?))
}
