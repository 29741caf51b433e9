//! CLI subcommand implementations.

pub mod employees;
pub mod export;
pub mod history;
pub mod import;
pub mod register;
pub mod status;
pub mod util;
