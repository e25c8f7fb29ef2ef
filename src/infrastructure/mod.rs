pub mod repositories;
pub mod state;

pub use repositories::SeaOrmCirculationStore;
pub use state::AppState;
