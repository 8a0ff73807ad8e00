//! Shared handler state.

use std::sync::Arc;

use agro_service::ProducerService;

/// State cloned into every handler.
///
/// Generic over the store so tests can serve from memory.
#[derive(Debug)]
pub struct AppState<S, C> {
    pub service: Arc<ProducerService<S, C>>,
    pub default_page_limit: i64,
}

impl<S, C> AppState<S, C> {
    pub fn new(service: ProducerService<S, C>, default_page_limit: i64) -> Self {
        AppState {
            service: Arc::new(service),
            default_page_limit,
        }
    }
}

// Manual impl: `Arc` clones without `S: Clone`.
impl<S, C> Clone for AppState<S, C> {
    fn clone(&self) -> Self {
        AppState {
            service: Arc::clone(&self.service),
            default_page_limit: self.default_page_limit,
        }
    }
}
