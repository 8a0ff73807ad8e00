//! Liveness endpoint.

use agro_db::{CropCatalog, ProducerStore};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub status: &'static str,
    pub database: &'static str,
}

/// 200 when the store answers a ping, 503 otherwise.
pub async fn status<S, C>(State(state): State<AppState<S, C>>) -> (StatusCode, Json<StatusBody>)
where
    S: ProducerStore,
    C: CropCatalog,
{
    if state.service.is_healthy().await {
        (
            StatusCode::OK,
            Json(StatusBody {
                status: "ok",
                database: "up",
            }),
        )
    } else {
        tracing::warn!("Status check failed: database unreachable");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(StatusBody {
                status: "degraded",
                database: "down",
            }),
        )
    }
}
