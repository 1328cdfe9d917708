//! Subcommand implementations.

pub mod clear;
pub mod columns;
pub mod limit;
pub mod query;
pub mod sort;
pub mod status;
