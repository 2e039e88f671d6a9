//! Subcommand implementations.

pub mod analyze;
pub mod evaluate;
pub mod hash;
