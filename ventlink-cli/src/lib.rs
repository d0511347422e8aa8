//! Library entry for ventlink-cli used by integration tests.

pub mod commands;

pub use commands::*;
