//! Foundational data structures, error types, and schema descriptors.

pub mod context;
pub mod descriptor;
pub mod error;
pub mod models;
pub mod value;
