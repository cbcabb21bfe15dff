//! MySQL repositories

pub mod field;
pub mod reservation;
