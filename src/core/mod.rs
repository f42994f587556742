//! Core traits and types shared across the crate

pub mod driver;
pub mod types;
