//! `/producers` handlers.

use agro_core::{
    CreateProducerInput, DashboardData, ProducerResponse, UpdateProducerInput, DEFAULT_PAGE,
};
use agro_db::{CropCatalog, ProducerStore};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// `?page=&limit=`; absent values fall back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn create<S, C>(
    State(state): State<AppState<S, C>>,
    body: Result<Json<CreateProducerInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ProducerResponse>), ApiError>
where
    S: ProducerStore,
    C: CropCatalog,
{
    let Json(input) = body?;
    let created = state.service.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list<S, C>(
    State(state): State<AppState<S, C>>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<Vec<ProducerResponse>>, ApiError>
where
    S: ProducerStore,
    C: CropCatalog,
{
    let Query(params) = params?;
    let page = params.page.unwrap_or(DEFAULT_PAGE);
    let limit = params.limit.unwrap_or(state.default_page_limit);

    debug!(page, limit, "GET /producers");
    Ok(Json(state.service.find_all(page, limit).await?))
}

pub async fn dashboard<S, C>(
    State(state): State<AppState<S, C>>,
) -> Result<Json<DashboardData>, ApiError>
where
    S: ProducerStore,
    C: CropCatalog,
{
    Ok(Json(state.service.get_dashboard_data().await?))
}

pub async fn find_one<S, C>(
    State(state): State<AppState<S, C>>,
    Path(id): Path<String>,
) -> Result<Json<ProducerResponse>, ApiError>
where
    S: ProducerStore,
    C: CropCatalog,
{
    Ok(Json(state.service.find_one(&id).await?))
}

pub async fn update<S, C>(
    State(state): State<AppState<S, C>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateProducerInput>, JsonRejection>,
) -> Result<Json<ProducerResponse>, ApiError>
where
    S: ProducerStore,
    C: CropCatalog,
{
    let Json(input) = body?;
    Ok(Json(state.service.update(&id, input).await?))
}

pub async fn remove<S, C>(
    State(state): State<AppState<S, C>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    S: ProducerStore,
    C: CropCatalog,
{
    state.service.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
