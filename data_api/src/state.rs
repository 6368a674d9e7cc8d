use axum::extract::FromRef;
use display_store::Config;
use display_store::geocoder::NominatimGeocoder;
use display_store::photo::PhotoStore;
use display_store::store::RecordStore;
use std::sync::Arc;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub store: RecordStore,
    pub photos: PhotoStore,
    /// One geocoder per process so every request shares its rate gate.
    pub geocoder: NominatimGeocoder,
    pub config: Arc<Config>,
}
