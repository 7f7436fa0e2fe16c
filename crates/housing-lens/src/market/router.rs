use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::HousingType;
use super::history::HistoryStore;
use super::service::{HousingQuery, HousingQueryService, QueryError};

/// Router builder exposing the housing query endpoints.
pub fn housing_router<H>(service: Arc<HousingQueryService<H>>) -> Router
where
    H: HistoryStore + 'static,
{
    Router::new()
        .route("/api/v1/housing/cities", get(catalog_handler::<H>))
        .route("/api/v1/housing/records", get(records_handler::<H>))
        .route("/api/v1/housing/query", post(query_handler::<H>))
        .route(
            "/api/v1/housing/affordability",
            get(affordability_handler::<H>),
        )
        .route("/api/v1/housing/history", get(history_handler::<H>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordsParams {
    #[serde(default)]
    city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AffordabilityParams {
    annual_income: f64,
    #[serde(default)]
    housing_type: Option<HousingType>,
}

fn error_response(error: QueryError) -> Response {
    let status = match &error {
        QueryError::InvalidQuery(_) | QueryError::Affordability(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        QueryError::History(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

pub(crate) async fn catalog_handler<H>(
    State(service): State<Arc<HousingQueryService<H>>>,
) -> Response
where
    H: HistoryStore + 'static,
{
    (StatusCode::OK, Json(service.catalog())).into_response()
}

pub(crate) async fn records_handler<H>(
    State(service): State<Arc<HousingQueryService<H>>>,
    Query(params): Query<RecordsParams>,
) -> Response
where
    H: HistoryStore + 'static,
{
    let records = service.records(params.city.as_deref());
    (StatusCode::OK, Json(json!({ "records": records }))).into_response()
}

pub(crate) async fn query_handler<H>(
    State(service): State<Arc<HousingQueryService<H>>>,
    Json(query): Json<HousingQuery>,
) -> Response
where
    H: HistoryStore + 'static,
{
    match service.run(query) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn affordability_handler<H>(
    State(service): State<Arc<HousingQueryService<H>>>,
    Query(params): Query<AffordabilityParams>,
) -> Response
where
    H: HistoryStore + 'static,
{
    match service.affordability(params.annual_income, params.housing_type) {
        Ok(map) => (StatusCode::OK, Json(map)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn history_handler<H>(
    State(service): State<Arc<HousingQueryService<H>>>,
) -> Response
where
    H: HistoryStore + 'static,
{
    match service.history() {
        Ok(entries) => (StatusCode::OK, Json(json!({ "entries": entries }))).into_response(),
        Err(error) => error_response(error),
    }
}
