// Handlers for backend API endpoints

use axum::{
    extract::{Json as JsonExtract, Path, Query, RawQuery, State},
    http::header,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    comparison::{self, ComparisonTable},
    error::{AppResult, MarketError},
    export,
    filter::VehicleFilter,
    models::{
        Dealership, DealershipId, NewSavedSearch, SavedSearch, SavedSearchId, ValueRange,
        Vehicle, VehicleId,
    },
    query,
    selection::{SelectionSet, ToggleOutcome},
};

const SIMILAR_LIMIT: usize = 3;

// --- Response Wrappers ---

#[derive(Serialize)]
struct GenericResponse {
    success: bool,
    message: Option<String>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    count: usize,
    // Canonical query string for shareable links
    query: String,
    summary: Vec<String>,
    filters: VehicleFilter,
    vehicles: Vec<Vehicle>,
}

#[derive(Serialize)]
pub struct VehicleDetailResponse {
    vehicle: Vehicle,
    dealership: Option<Dealership>,
    similar: Vec<Vehicle>,
    saved: bool,
    compared: bool,
}

#[derive(Serialize)]
pub struct RangesResponse {
    year: ValueRange<i32>,
    price: ValueRange<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSearchView {
    #[serde(flatten)]
    search: SavedSearch,
    summary: Vec<String>,
    query: String,
}

impl From<SavedSearch> for SavedSearchView {
    fn from(search: SavedSearch) -> Self {
        Self {
            summary: search.filters.describe(),
            query: query::to_query_string(&search.filters),
            search,
        }
    }
}

#[derive(Serialize)]
pub struct RunSavedSearchResponse {
    search: SavedSearchView,
    count: usize,
    vehicles: Vec<Vehicle>,
}

#[derive(Serialize)]
pub struct SelectionResponse {
    set: SelectionSet,
    ids: Vec<VehicleId>,
}

#[derive(Serialize)]
pub struct ToggleResponse {
    set: SelectionSet,
    id: VehicleId,
    outcome: ToggleOutcome,
    ids: Vec<VehicleId>,
}

// --- Request Structs ---

#[derive(Deserialize)]
pub struct BatchQuery {
    ids: String,
}

#[derive(Deserialize)]
pub struct CompareQuery {
    vehicles: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateSavedSearchRequest {
    name: String,
    #[serde(default)]
    filters: VehicleFilter,
}

#[derive(Deserialize, Debug)]
pub struct RenameSavedSearchRequest {
    name: String,
}

// --- Helpers ---

fn parse_id_list(raw: &str) -> Result<Vec<VehicleId>, MarketError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<VehicleId>()
                .map_err(|_| MarketError::validation(format!("'{s}' is not a valid vehicle id")))
        })
        .collect()
}

fn filter_from_raw_query(raw: Option<String>) -> Result<VehicleFilter, MarketError> {
    match raw {
        Some(q) => query::from_query_string(&q),
        None => Ok(VehicleFilter::default()),
    }
}

// --- API Handlers ---

pub async fn search_vehicles(
    State(app_state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> AppResult<Json<SearchResponse>> {
    let filters = filter_from_raw_query(raw_query)?;
    tracing::info!("[HANDLER] /api/vehicles - Search with filters: {:?}", filters);

    let vehicles = if filters.is_empty() {
        app_state.vehicles.get_all().await
    } else {
        app_state.vehicles.search(&filters).await
    };

    tracing::info!("[HANDLER] /api/vehicles - {} vehicles found.", vehicles.len());
    Ok(Json(SearchResponse {
        count: vehicles.len(),
        query: query::to_query_string(&filters),
        summary: filters.describe(),
        filters,
        vehicles,
    }))
}

pub async fn export_vehicles(
    State(app_state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> AppResult<impl IntoResponse> {
    let filters = filter_from_raw_query(raw_query)?;
    let vehicles = app_state.vehicles.search(&filters).await;
    let csv = export::vehicles_to_csv(&vehicles)?;
    tracing::info!("[HANDLER] /api/vehicles/export - Exported {} vehicles.", vehicles.len());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"vehicles.csv\""),
        ],
        csv,
    ))
}

pub async fn get_vehicles_batch(
    State(app_state): State<AppState>,
    Query(batch): Query<BatchQuery>,
) -> AppResult<Json<Vec<Vehicle>>> {
    let ids = parse_id_list(&batch.ids)?;
    Ok(Json(app_state.vehicles.get_by_ids(&ids).await))
}

pub async fn get_vehicle(
    State(app_state): State<AppState>,
    Path(id): Path<VehicleId>,
) -> AppResult<Json<VehicleDetailResponse>> {
    tracing::info!("[HANDLER] /api/vehicles/:id - Request received for vehicle {}", id);
    let vehicle = app_state.vehicles.get_by_id(id).await?;

    let (dealership, similar) = futures::join!(
        app_state.dealerships.get_by_id(vehicle.dealership_id),
        app_state.vehicles.similar_to(id, SIMILAR_LIMIT),
    );

    let dealership = match dealership {
        Ok(d) => Some(d),
        Err(e) => {
            tracing::warn!(vehicle = id, dealership = vehicle.dealership_id, "Dealership lookup failed: {}", e);
            None
        }
    };

    Ok(Json(VehicleDetailResponse {
        saved: app_state.selections.contains(SelectionSet::Saved, id)?,
        compared: app_state.selections.contains(SelectionSet::Compared, id)?,
        similar: similar?,
        dealership,
        vehicle,
    }))
}

pub async fn get_makes(State(app_state): State<AppState>) -> Json<Vec<String>> {
    let makes = app_state.vehicles.makes();
    tracing::info!("[HANDLER] /api/makes - Returning {} makes.", makes.len());
    Json(makes)
}

pub async fn get_models(
    State(app_state): State<AppState>,
    Path(make): Path<String>,
) -> Json<Vec<String>> {
    let models = app_state.vehicles.models_for_make(&make);
    tracing::info!("[HANDLER] /api/models/:make - {} models for make '{}'.", models.len(), make);
    Json(models)
}

pub async fn get_ranges(State(app_state): State<AppState>) -> AppResult<Json<RangesResponse>> {
    Ok(Json(RangesResponse {
        year: app_state.vehicles.year_range()?,
        price: app_state.vehicles.price_range()?,
    }))
}

pub async fn get_dealerships(State(app_state): State<AppState>) -> Json<Vec<Dealership>> {
    Json(app_state.dealerships.get_all().await)
}

pub async fn get_dealership(
    State(app_state): State<AppState>,
    Path(id): Path<DealershipId>,
) -> AppResult<Json<Dealership>> {
    Ok(Json(app_state.dealerships.get_by_id(id).await?))
}

pub async fn get_saved_searches(State(app_state): State<AppState>) -> Json<Vec<SavedSearchView>> {
    let searches = app_state.saved_searches.get_all().await;
    Json(searches.into_iter().map(SavedSearchView::from).collect())
}

pub async fn create_saved_search(
    State(app_state): State<AppState>,
    JsonExtract(request): JsonExtract<CreateSavedSearchRequest>,
) -> AppResult<Json<SavedSearchView>> {
    tracing::info!("API call: create_saved_search '{}'", request.name);
    // Snapshot the result count at save time
    let result_count = app_state.vehicles.search(&request.filters).await.len();
    let created = app_state
        .saved_searches
        .create(NewSavedSearch {
            name: request.name,
            filters: request.filters,
            result_count,
        })
        .await?;
    Ok(Json(created.into()))
}

pub async fn rename_saved_search(
    State(app_state): State<AppState>,
    Path(id): Path<SavedSearchId>,
    JsonExtract(request): JsonExtract<RenameSavedSearchRequest>,
) -> AppResult<Json<SavedSearchView>> {
    let renamed = app_state.saved_searches.rename(id, &request.name).await?;
    Ok(Json(renamed.into()))
}

pub async fn delete_saved_search(
    State(app_state): State<AppState>,
    Path(id): Path<SavedSearchId>,
) -> AppResult<impl IntoResponse> {
    app_state.saved_searches.delete(id).await?;
    Ok(Json(GenericResponse {
        success: true,
        message: Some("Saved search deleted successfully".to_string()),
    }))
}

pub async fn run_saved_search(
    State(app_state): State<AppState>,
    Path(id): Path<SavedSearchId>,
) -> AppResult<Json<RunSavedSearchResponse>> {
    let search = app_state.saved_searches.mark_run(id).await?;
    let vehicles = app_state.vehicles.search(&search.filters).await;
    tracing::info!("API call: run_saved_search {} matched {} vehicles", id, vehicles.len());
    Ok(Json(RunSavedSearchResponse {
        search: search.into(),
        count: vehicles.len(),
        vehicles,
    }))
}

pub async fn get_selection(
    State(app_state): State<AppState>,
    Path(set): Path<String>,
) -> AppResult<Json<SelectionResponse>> {
    let set: SelectionSet = set.parse()?;
    Ok(Json(SelectionResponse {
        set,
        ids: app_state.selections.ids(set)?,
    }))
}

pub async fn toggle_selection(
    State(app_state): State<AppState>,
    Path((set, id)): Path<(String, VehicleId)>,
) -> AppResult<Json<ToggleResponse>> {
    let set: SelectionSet = set.parse()?;
    // Only ids that exist can be added; stale ids can still be toggled off
    if !app_state.selections.contains(set, id)? {
        app_state.vehicles.get_by_id(id).await?;
    }
    let outcome = app_state.selections.toggle(set, id)?;
    Ok(Json(ToggleResponse {
        set,
        id,
        outcome,
        ids: app_state.selections.ids(set)?,
    }))
}

pub async fn remove_selection(
    State(app_state): State<AppState>,
    Path((set, id)): Path<(String, VehicleId)>,
) -> AppResult<Json<SelectionResponse>> {
    let set: SelectionSet = set.parse()?;
    app_state.selections.remove(set, id)?;
    Ok(Json(SelectionResponse {
        set,
        ids: app_state.selections.ids(set)?,
    }))
}

pub async fn compare_vehicles(
    State(app_state): State<AppState>,
    Query(params): Query<CompareQuery>,
) -> AppResult<Json<ComparisonTable>> {
    // Ids from the link win; otherwise fall back to the persisted compare set
    let ids = match params.vehicles.as_deref().map(parse_id_list).transpose()? {
        Some(ids) if !ids.is_empty() => ids,
        _ => app_state.selections.ids(SelectionSet::Compared)?,
    };
    let vehicles = app_state.vehicles.get_by_ids(&ids).await;
    tracing::info!("API call: compare_vehicles ids={:?} loaded={}", ids, vehicles.len());
    Ok(Json(comparison::compare(&vehicles)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        comparison::{Attribute, Highlight},
        dataset::Dataset,
        error::AppError,
        latency::Latency,
        store::MemoryStore,
    };
    use axum::http::StatusCode;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn vehicle(id: VehicleId, make: &str, model: &str, mileage: u32, dealership_id: u32) -> Vehicle {
        Vehicle {
            id,
            year: 2020,
            make: make.into(),
            model: model.into(),
            price: 20000.0 + f64::from(id),
            mileage,
            color: "Gray".into(),
            body_type: "Sedan".into(),
            fuel_type: "Gasoline".into(),
            transmission: "Automatic".into(),
            condition: Some("Used".into()),
            vin: format!("VIN{id}"),
            dealership_id,
            date_added: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            listing_url: format!("https://example.com/{id}"),
            images: vec![format!("https://example.com/{id}.jpg")],
            features: vec!["Bluetooth".into()],
        }
    }

    fn state() -> AppState {
        let dataset = Dataset {
            vehicles: vec![
                vehicle(1, "Honda", "Civic", 32000, 1),
                vehicle(2, "Toyota", "Corolla", 45000, 1),
                vehicle(3, "Honda", "Accord", 28000, 99),
                vehicle(4, "Mazda", "3", 51000, 1),
            ],
            dealerships: vec![Dealership {
                id: 1,
                name: "Downtown Auto".into(),
                address: "10 King St".into(),
                phone: "555-0101".into(),
                website: "https://downtown.example.com".into(),
                vehicle_count: 3,
            }],
            saved_searches: Vec::new(),
        };
        AppState::new(dataset, Arc::new(MemoryStore::new()), Latency::none())
    }

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[tokio::test]
    async fn search_decodes_query_string() {
        let Json(response) = search_vehicles(
            State(state()),
            RawQuery(Some("make[]=Honda&model=civ".into())),
        )
        .await
        .unwrap();
        assert_eq!(response.count, 1);
        assert_eq!(response.vehicles[0].id, 1);
        assert_eq!(response.query, "make%5B%5D=Honda&model=civ");
    }

    #[tokio::test]
    async fn search_without_query_returns_everything() {
        let Json(response) = search_vehicles(State(state()), RawQuery(None)).await.unwrap();
        assert_eq!(response.count, 4);
    }

    #[tokio::test]
    async fn bad_numeric_query_is_bad_request() {
        let err = search_vehicles(State(state()), RawQuery(Some("minYear=abc".into())))
            .await
            .err()
            .unwrap();
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn detail_tolerates_missing_dealership() {
        let Json(detail) = get_vehicle(State(state()), Path(3)).await.unwrap();
        assert!(detail.dealership.is_none());
        assert_eq!(detail.similar.iter().map(|v| v.id).collect::<Vec<_>>(), vec![1, 2, 4]);

        let Json(detail) = get_vehicle(State(state()), Path(1)).await.unwrap();
        assert_eq!(detail.dealership.unwrap().name, "Downtown Auto");
    }

    #[tokio::test]
    async fn unknown_vehicle_is_404() {
        let err = get_vehicle(State(state()), Path(42)).await.err().unwrap();
        assert_eq!(status_of(err), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn compare_falls_back_to_persisted_set() {
        let state = state();
        for id in [1, 2, 3] {
            toggle_selection(State(state.clone()), Path(("compared".into(), id)))
                .await
                .unwrap();
        }

        let Json(table) = compare_vehicles(State(state.clone()), Query(CompareQuery { vehicles: None }))
            .await
            .unwrap();
        assert_eq!(table.vehicle_ids, vec![1, 2, 3]);

        let mileage = table.rows.iter().find(|r| r.attribute == Attribute::Mileage).unwrap();
        let marks: Vec<_> = mileage.cells.iter().map(|c| c.highlight).collect();
        assert_eq!(marks, vec![None, Some(Highlight::Worst), Some(Highlight::Best)]);
    }

    #[tokio::test]
    async fn fourth_compare_is_conflict() {
        let state = state();
        for id in [1, 2, 3] {
            toggle_selection(State(state.clone()), Path(("compared".into(), id)))
                .await
                .unwrap();
        }
        let err = toggle_selection(State(state.clone()), Path(("compared".into(), 4)))
            .await
            .err()
            .unwrap();
        assert_eq!(status_of(err), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn compare_single_vehicle_is_unprocessable() {
        let err = compare_vehicles(
            State(state()),
            Query(CompareQuery {
                vehicles: Some("2".into()),
            }),
        )
        .await
        .err()
        .unwrap();
        assert_eq!(status_of(err), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn toggling_unknown_vehicle_is_404() {
        let err = toggle_selection(State(state()), Path(("saved".into(), 77)))
            .await
            .err()
            .unwrap();
        assert_eq!(status_of(err), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn saved_search_snapshot_and_run() {
        let state = state();
        let Json(created) = create_saved_search(
            State(state.clone()),
            JsonExtract(CreateSavedSearchRequest {
                name: "Hondas".into(),
                filters: VehicleFilter {
                    make: vec!["Honda".into()],
                    ..Default::default()
                },
            }),
        )
        .await
        .unwrap();
        assert_eq!(created.search.result_count, 2);
        assert_eq!(created.query, "make%5B%5D=Honda");

        let Json(run) = run_saved_search(State(state.clone()), Path(created.search.id))
            .await
            .unwrap();
        assert_eq!(run.count, 2);
    }

    #[test]
    fn id_lists_parse_and_reject_garbage() {
        assert_eq!(parse_id_list("1, 2,,3").unwrap(), vec![1, 2, 3]);
        assert!(parse_id_list("1,x").is_err());
    }
}
