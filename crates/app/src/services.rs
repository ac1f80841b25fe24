//! Application services: one per use-case area.

pub mod discovery_service;
pub mod switch_service;
