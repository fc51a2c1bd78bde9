// src/lib.rs — Library root for issuecost

pub mod api;
pub mod core;
pub mod estimator;
pub mod github;
pub mod infra;
pub mod provider;
