// Route definitions

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::AppState;

mod api;

pub fn create_router(app_state: AppState) -> Router {
    let api_router = Router::new()
        // Search & facets
        .route("/vehicles", get(api::search_vehicles))
        .route("/vehicles/export", get(api::export_vehicles))
        .route("/vehicles/batch", get(api::get_vehicles_batch))
        .route("/vehicles/:id", get(api::get_vehicle))
        .route("/makes", get(api::get_makes))
        .route("/models/:make", get(api::get_models))
        .route("/ranges", get(api::get_ranges))
        // Dealerships
        .route("/dealerships", get(api::get_dealerships))
        .route("/dealerships/:id", get(api::get_dealership))
        // Saved searches
        .route(
            "/saved-searches",
            get(api::get_saved_searches).post(api::create_saved_search),
        )
        .route(
            "/saved-searches/:id",
            put(api::rename_saved_search).delete(api::delete_saved_search),
        )
        .route("/saved-searches/:id/run", post(api::run_saved_search))
        // Saved / compared vehicle sets
        .route("/selections/:set", get(api::get_selection))
        .route(
            "/selections/:set/:id",
            post(api::toggle_selection).delete(api::remove_selection),
        )
        .route("/compare", get(api::compare_vehicles))
        .with_state(app_state);

    Router::new()
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
}
