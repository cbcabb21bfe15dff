//! Event admin dynamic filter compiler
//!
//! Compiles user-authored JSON filters into parameterized MySQL fragments,
//! resolving field codes through a scope-aware field catalog.

pub mod app;
pub mod core;
pub mod data;
pub mod utils;
