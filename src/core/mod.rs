//! Core types and constants for the location sharing engine

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
