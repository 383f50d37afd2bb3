pub mod handlers;
pub mod router;
pub mod models;
pub mod repository;
pub mod services;

// Re-export the core surface for external use
pub use models::*;
pub use repository::{AppointmentRepository, RepositoryError};
pub use services::booking::AppointmentBookingService;
