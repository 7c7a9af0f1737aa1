//! Shared protocol constants and the error taxonomy.

pub mod constants;
pub mod errors;
