//! Infrastructure layer: wire DTOs and the in-memory room registry.

pub mod dto;
pub mod repository;
