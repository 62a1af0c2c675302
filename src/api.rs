//! HTTP API serving one county's monthly series as JSON, open to any origin.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;

use crate::store::CountyStore;
use crate::structures::SearchResultPayload;

pub const MISSING_PARAMS: &str = "You must supply the county and state URL parameters";

/// First value of each parameter wins; repeats are ignored.
#[derive(Debug, Default)]
pub struct CountyParams {
    county: Option<String>,
    state: Option<String>,
}

impl CountyParams {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = CountyParams::default();
        for (k, v) in pairs {
            match k.as_str() {
                "county" if params.county.is_none() => params.county = Some(v),
                "state" if params.state.is_none() => params.state = Some(v),
                _ => {}
            }
        }
        params
    }
}

pub fn router(store: CountyStore) -> Router {
    Router::new()
        .route("/", get(county_data).options(preflight))
        .with_state(store)
}

pub async fn serve(listener: TcpListener, store: CountyStore) -> std::io::Result<()> {
    axum::serve(listener, router(store)).await
}

/// Lets browsers on any origin GET with a Content-Type header, caching the
/// answer for an hour.
async fn preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
            (header::ACCESS_CONTROL_MAX_AGE, "3600"),
        ],
    )
}

async fn county_data(
    State(store): State<CountyStore>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let params = CountyParams::from_pairs(pairs);
    let cors = [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")];
    let (county, state) = match (params.county, params.state) {
        (Some(county), Some(state)) => (county, state.trim().to_uppercase()),
        _ => return (StatusCode::BAD_REQUEST, cors, MISSING_PARAMS).into_response(),
    };
    log::info!("Looking up {}, {}", county, state);

    let rows = match store.county_series(&county, &state) {
        Ok(rows) => rows,
        Err(e) => {
            log::error!("Store lookup failed for {}, {}: {:?}", county, state, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, cors, "Lookup failed").into_response();
        }
    };
    match SearchResultPayload::from_rows(&rows) {
        Some(payload) => (cors, Json(payload)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            cors,
            format!("No unemployment data for {}, {}", county, state),
        )
            .into_response(),
    }
}
