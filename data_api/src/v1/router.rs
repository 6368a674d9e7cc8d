use crate::state::AppState;
use crate::v1::handlers::import::import_spreadsheet;
use crate::v1::handlers::map::get_map;
use crate::v1::handlers::photos::{get_photo, upload_photo};
use crate::v1::handlers::records::{
    create_record, delete_record, get_record, list_records, save_grid, set_status,
};
use axum::Router;
use axum::routing::{get, post, put};

pub fn router() -> Router<AppState> {
    Router::<AppState>::new()
        .route(
            "/records",
            get(list_records).post(create_record).put(save_grid),
        )
        .route("/records/{id}", get(get_record).delete(delete_record))
        .route("/records/{id}/status", put(set_status))
        .route("/records/{id}/photo", get(get_photo).put(upload_photo))
        .route("/map", get(get_map))
        .route("/import", post(import_spreadsheet))
}
