//! Subcommand modules for the `igevo` binary.

pub mod rhomb;
pub mod tree;
