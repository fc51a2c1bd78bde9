// src/core/mod.rs

pub mod aggregate;
pub mod orchestrator;
pub mod session;
pub mod types;
