use agro_core::Crop;
use agro_db::{CropCatalog, ProducerStore};
use axum::extract::State;
use axum::Json;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn list<S, C>(State(state): State<AppState<S, C>>) -> Result<Json<Vec<Crop>>, ApiError>
where
    S: ProducerStore,
    C: CropCatalog,
{
    Ok(Json(state.service.list_crops().await?))
}
