//! Router assembly.

mod crops;
mod producers;
mod system;

use agro_db::{CropCatalog, ProducerStore};
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Builds the application router over `state`.
pub fn build_router<S, C>(state: AppState<S, C>) -> Router
where
    S: ProducerStore + 'static,
    C: CropCatalog + 'static,
{
    Router::new()
        .route(
            "/producers",
            get(producers::list::<S, C>).post(producers::create::<S, C>),
        )
        .route("/producers/dashboard", get(producers::dashboard::<S, C>))
        .route(
            "/producers/{id}",
            get(producers::find_one::<S, C>)
                .patch(producers::update::<S, C>)
                .delete(producers::remove::<S, C>),
        )
        .route("/crops", get(crops::list::<S, C>))
        .route("/status", get(system::status::<S, C>))
        .with_state(state)
}
