//! Subcommand modules for the `exsplit` binary.

pub mod jobs;
pub mod pp_track;
