//! Subcommands of the `bf` binary.

pub mod list;
pub mod run;
