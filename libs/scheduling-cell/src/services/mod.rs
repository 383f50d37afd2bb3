// libs/scheduling-cell/src/services/mod.rs
pub mod booking;
pub mod conflict;
pub mod idempotency;
pub mod lifecycle;
