pub mod circulation_service;
pub mod report_service;
pub mod scan_session;

pub use circulation_service::CirculationEngine;
pub use scan_session::{ScanCoordinator, ScanFeedback, ScanSession};
