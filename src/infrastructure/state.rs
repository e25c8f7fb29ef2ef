//! Application state containing the circulation engine and shared resources

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::infrastructure::SeaOrmCirculationStore;
use crate::services::CirculationEngine;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    /// Circulation engine, stateless between calls
    pub engine: Arc<CirculationEngine>,
}

impl AppState {
    pub fn new(db: DatabaseConnection) -> Self {
        let store = Arc::new(SeaOrmCirculationStore::new(db.clone()));
        let engine = Arc::new(CirculationEngine::new(store));

        Self { db, engine }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

// Allow handlers that only need the database to extract it directly
impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
