use std::sync::Arc;

use crate::db::CollectionStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CollectionStore>,
}

impl AppState {
    /// Creates application state around a store handle
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self { store }
    }
}
