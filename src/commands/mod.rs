//! CLI commands

pub mod compare;
pub mod list;
pub mod scan;
