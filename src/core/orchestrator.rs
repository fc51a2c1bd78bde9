// src/core/orchestrator.rs — Batch analysis coordinator
//
// One background task per session. Repositories run strictly one at a
// time, and issues within a repository one at a time: this keeps both
// external APIs under their rate limits and makes progress a simple
// monotone ratio. Failures are isolated at the repository boundary;
// only an internal fault (or cancellation) sets the session to error.

use std::sync::Arc;

use super::aggregate::aggregate;
use super::session::{ProgressReporter, SessionStore};
use super::types::{IssueEstimate, RepoResult, RepoTarget};
use crate::estimator::ComplexityEstimator;
use crate::github::{parse_repo_url, IssueFetcher};
use crate::infra::errors::IssueCostError;

/// Most repositories a single batch may contain.
pub const MAX_REPOS_PER_BATCH: usize = 5;

/// Validated form of a StartAnalysis request.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub targets: Vec<RepoTarget>,
    pub hourly_rate: f64,
}

/// Validate the raw request synchronously, before any session exists:
/// 1–5 syntactically valid repository URLs, no duplicates, positive rate.
pub fn validate_request(
    repo_urls: &[String],
    hourly_rate: f64,
) -> Result<AnalysisRequest, IssueCostError> {
    if repo_urls.is_empty() {
        return Err(IssueCostError::Validation(
            "at least one repository URL is required".into(),
        ));
    }
    if repo_urls.len() > MAX_REPOS_PER_BATCH {
        return Err(IssueCostError::Validation(format!(
            "at most {MAX_REPOS_PER_BATCH} repositories per batch (got {})",
            repo_urls.len()
        )));
    }
    if !hourly_rate.is_finite() || hourly_rate <= 0.0 {
        return Err(IssueCostError::Validation(
            "hourly rate must be a positive number".into(),
        ));
    }

    let mut targets = Vec::with_capacity(repo_urls.len());
    for url in repo_urls {
        let target = parse_repo_url(url)?;
        if targets.iter().any(|t: &RepoTarget| t.key() == target.key()) {
            return Err(IssueCostError::Validation(format!(
                "duplicate repository '{target}'"
            )));
        }
        targets.push(target);
    }

    Ok(AnalysisRequest {
        targets,
        hourly_rate,
    })
}

pub struct AnalysisOrchestrator {
    store: Arc<SessionStore>,
    fetcher: Arc<dyn IssueFetcher>,
    estimator: Arc<ComplexityEstimator>,
}

impl AnalysisOrchestrator {
    pub fn new(
        store: Arc<SessionStore>,
        fetcher: Arc<dyn IssueFetcher>,
        estimator: Arc<ComplexityEstimator>,
    ) -> Self {
        Self {
            store,
            fetcher,
            estimator,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Create a session for a validated request and run the batch in the
    /// background. Returns the session id immediately.
    ///
    /// The worker runs under a supervisor task: if it panics, the
    /// session is finalized as an error instead of staying at running
    /// forever while clients keep polling.
    pub fn start(self: &Arc<Self>, request: AnalysisRequest) -> String {
        let session_id = self.store.create();
        let reporter = ProgressReporter::new(Arc::clone(&self.store), session_id.clone());

        let orchestrator = Arc::clone(self);
        let id = session_id.clone();
        let worker_reporter = reporter.clone();
        let worker = tokio::spawn(async move {
            orchestrator.run_batch(&worker_reporter, request).await;
        });

        tokio::spawn(async move {
            match worker.await {
                Ok(()) => tracing::info!(session = %id, "analysis session finished"),
                Err(e) => {
                    tracing::error!(session = %id, error = %e, "analysis worker panicked");
                    reporter.fail("Internal error during analysis");
                }
            }
        });

        session_id
    }

    /// The batch loop. Every exit path finalizes the session so pollers
    /// are never left waiting.
    pub async fn run_batch(&self, reporter: &ProgressReporter, request: AnalysisRequest) {
        let repo_count = request.targets.len();
        let mut results: Vec<RepoResult> = Vec::with_capacity(repo_count);

        reporter.update(0, format!("Analyzing {repo_count} repositories"));

        for (index, target) in request.targets.iter().enumerate() {
            if reporter.is_cancelled() {
                reporter.fail("Analysis cancelled");
                return;
            }

            let slice = ProgressSlice::new(index, repo_count);
            reporter.update(slice.start(), format!("Fetching issues for {target}"));

            let result = self
                .analyze_repo(reporter, target, request.hourly_rate, slice)
                .await;
            match result {
                Ok(Some(repo_result)) => results.push(repo_result),
                Ok(None) => {
                    // Cancelled mid-repository; fail() was already called
                    return;
                }
                Err(e) => {
                    tracing::warn!(repo = %target, error = %e, "repository analysis failed");
                    results.push(RepoResult::error(target, e.to_string()));
                }
            }
        }

        let batch = aggregate(results, request.hourly_rate);
        tracing::info!(
            repos = repo_count,
            issues = batch.total_issues,
            total_cost = batch.total_cost,
            "batch complete"
        );
        reporter.complete(batch);
    }

    /// One repository: fetch, then estimate each issue in order.
    /// Ok(None) signals cancellation; Err is caught by the caller and
    /// recorded as an error RepoResult.
    async fn analyze_repo(
        &self,
        reporter: &ProgressReporter,
        target: &RepoTarget,
        hourly_rate: f64,
        slice: ProgressSlice,
    ) -> Result<Option<RepoResult>, IssueCostError> {
        let issues = self.fetcher.fetch_issues(target).await?;
        let issue_count = issues.len();
        reporter.update(
            slice.after_fetch(),
            format!("Found {issue_count} open issues in {target}"),
        );

        let mut estimates: Vec<IssueEstimate> = Vec::with_capacity(issue_count);
        for (i, issue) in issues.iter().enumerate() {
            if reporter.is_cancelled() {
                reporter.fail("Analysis cancelled");
                return Ok(None);
            }

            reporter.update(
                slice.at_issue(i, issue_count),
                format!("Analyzing issue #{} in {target}", issue.number),
            );

            // Infallible: degrades to the fallback estimate internally
            let model_estimate = self.estimator.estimate(issue).await;
            estimates.push(IssueEstimate::from_model(issue, model_estimate, hourly_rate));

            reporter.update(
                slice.at_issue(i + 1, issue_count),
                format!("Analyzed issue {}/{} in {target}", i + 1, issue_count),
            );
        }

        Ok(Some(RepoResult::success(target, estimates)))
    }
}

/// Progress share of one repository within the batch: repository i of N
/// owns [i*100/N, (i+1)*100/N). The fetch advances through the first
/// tenth of the slice, issue estimates through the rest. Total unit
/// counts are only known after each fetch, so slices keep the reported
/// percentage monotone without knowing issue counts up front.
#[derive(Debug, Clone, Copy)]
struct ProgressSlice {
    start: f64,
    width: f64,
}

impl ProgressSlice {
    fn new(index: usize, total: usize) -> Self {
        let width = 100.0 / total as f64;
        Self {
            start: index as f64 * width,
            width,
        }
    }

    fn start(&self) -> u8 {
        self.start.round() as u8
    }

    fn after_fetch(&self) -> u8 {
        (self.start + self.width * 0.1).round() as u8
    }

    fn at_issue(&self, done: usize, total: usize) -> u8 {
        if total == 0 {
            return ((self.start + self.width).min(100.0)).round() as u8;
        }
        let fraction = 0.1 + 0.9 * (done as f64 / total as f64);
        ((self.start + self.width * fraction).min(100.0)).round() as u8
    }
}
