//! Reservation Module
//!
//! Conflict-checked table booking:
//!
//! - **scheduler**: two-hour window overlap test and first-free auto-assignment

pub mod scheduler;

// Re-exports
pub use scheduler::{
    BookedReservation, RESERVATION_DURATION_MS, ReservationError, ReservationResult,
    ReservationScheduler, ReserveTable, TIME_FORMAT, overlaps, parse_reservation_time,
};
