//! Subcommand modules for the `sruscan` binary.

pub mod cluster;
pub mod search;
