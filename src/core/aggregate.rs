// src/core/aggregate.rs — Batch-level totals

use super::types::{round1, round2, BatchResult, RepoResult, RepoStatus};

/// Fold per-repository results into a BatchResult. Pure: order and
/// length of `repos` are preserved; only success entries contribute to
/// the grand totals, so failed repositories stay visible but count zero.
pub fn aggregate(repos: Vec<RepoResult>, hourly_rate: f64) -> BatchResult {
    let successes = || repos.iter().filter(|r| r.status == RepoStatus::Success);

    let total_issues = successes().map(|r| r.issue_count).sum();
    let total_hours = round1(successes().map(|r| r.total_hours).sum());
    let total_cost = round2(successes().map(|r| r.total_cost).sum());

    BatchResult {
        repos,
        total_issues,
        total_hours,
        total_cost,
        hourly_rate,
    }
}
