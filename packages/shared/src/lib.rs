//! Utilities shared by the Genkan packages: logging setup and time handling.

pub mod logger;
pub mod time;
