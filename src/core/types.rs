// src/core/types.rs — Domain types for batch issue analysis

use serde::{Deserialize, Serialize};

/// A repository requested for analysis, resolved from its URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoTarget {
    pub url: String,
    pub owner: String,
    pub name: String,
}

impl RepoTarget {
    /// Duplicate detection key: owner/name, case-insensitive
    /// (GitHub treats them as such).
    pub fn key(&self) -> String {
        format!("{}/{}", self.owner.to_lowercase(), self.name.to_lowercase())
    }
}

impl std::fmt::Display for RepoTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// One open issue as returned by the tracker, stripped to the fields
/// the estimator and exporter need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    /// Raw body text; may be empty.
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub labels: Vec<String>,
    pub url: String,
}

/// Complexity tier assigned by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Complexity {
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl Complexity {
    /// Plausible hour range for the tier; model output is clamped to it.
    pub fn hour_range(self) -> (f64, f64) {
        match self {
            Complexity::Low => (1.0, 6.0),
            Complexity::Medium => (6.0, 15.0),
            Complexity::High => (15.0, 25.0),
            Complexity::VeryHigh => (25.0, 40.0),
        }
    }

    pub fn midpoint_hours(self) -> f64 {
        let (lo, hi) = self.hour_range();
        (lo + hi) / 2.0
    }

    /// Case-insensitive tier lookup by display name.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Complexity::Low),
            "medium" => Some(Complexity::Medium),
            "high" => Some(Complexity::High),
            "very high" | "veryhigh" | "very_high" => Some(Complexity::VeryHigh),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Complexity::Low => "Low",
            Complexity::Medium => "Medium",
            Complexity::High => "High",
            Complexity::VeryHigh => "Very High",
        }
    }
}

/// How the estimate was obtained, so consumers can audit degraded output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    /// Strict JSON parse of the model response succeeded.
    Parsed,
    /// Strict parse failed; tier and hours recovered from the raw text.
    Recovered,
    /// Model call or both parse stages failed; fixed default substituted.
    Fallback,
}

/// Model output after the parse pipeline: tier, hours, and reasoning,
/// tagged with how trustworthy the extraction was.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEstimate {
    pub complexity: Complexity,
    pub hours: f64,
    /// Untrusted free text. Renderers must escape it.
    pub reasoning: String,
    pub source: EstimateSource,
}

/// Final per-issue estimate with the cost derived from the batch rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueEstimate {
    pub issue_number: u64,
    pub title: String,
    pub complexity: Complexity,
    pub estimated_hours: f64,
    /// Always estimated_hours * hourly_rate, rounded to cents.
    pub estimated_cost: f64,
    pub labels: Vec<String>,
    pub url: String,
    /// Untrusted free text from the model.
    pub reasoning: String,
    pub source: EstimateSource,
}

impl IssueEstimate {
    pub fn from_model(issue: &Issue, estimate: ModelEstimate, hourly_rate: f64) -> Self {
        let estimated_hours = round1(estimate.hours);
        Self {
            issue_number: issue.number,
            title: issue.title.clone(),
            complexity: estimate.complexity,
            estimated_hours,
            estimated_cost: round2(estimated_hours * hourly_rate),
            labels: issue.labels.clone(),
            url: issue.url.clone(),
            reasoning: estimate.reasoning,
            source: estimate.source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoStatus {
    Success,
    Error,
}

/// Outcome of one repository within a batch. Present in the BatchResult
/// whether the repository succeeded or failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoResult {
    pub status: RepoStatus,
    pub owner: String,
    pub name: String,
    pub estimates: Vec<IssueEstimate>,
    pub issue_count: usize,
    pub total_hours: f64,
    pub total_cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl RepoResult {
    pub fn success(target: &RepoTarget, estimates: Vec<IssueEstimate>) -> Self {
        let total_hours = round1(estimates.iter().map(|e| e.estimated_hours).sum());
        let total_cost = round2(estimates.iter().map(|e| e.estimated_cost).sum());
        Self {
            status: RepoStatus::Success,
            owner: target.owner.clone(),
            name: target.name.clone(),
            issue_count: estimates.len(),
            estimates,
            total_hours,
            total_cost,
            error_detail: None,
        }
    }

    pub fn error(target: &RepoTarget, detail: impl Into<String>) -> Self {
        Self {
            status: RepoStatus::Error,
            owner: target.owner.clone(),
            name: target.name.clone(),
            estimates: Vec::new(),
            issue_count: 0,
            total_hours: 0.0,
            total_cost: 0.0,
            error_detail: Some(detail.into()),
        }
    }
}

/// Aggregated outcome of a whole batch, attached to the session at
/// the terminal transition and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub repos: Vec<RepoResult>,
    pub total_issues: usize,
    pub total_hours: f64,
    pub total_cost: f64,
    pub hourly_rate: f64,
}

pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complexity_from_name() {
        assert_eq!(Complexity::from_name("low"), Some(Complexity::Low));
        assert_eq!(Complexity::from_name(" Medium "), Some(Complexity::Medium));
        assert_eq!(Complexity::from_name("HIGH"), Some(Complexity::High));
        assert_eq!(Complexity::from_name("Very High"), Some(Complexity::VeryHigh));
        assert_eq!(Complexity::from_name("epic"), None);
    }

    #[test]
    fn test_complexity_serde_names() {
        assert_eq!(
            serde_json::to_string(&Complexity::VeryHigh).unwrap(),
            "\"Very High\""
        );
        assert_eq!(
            serde_json::from_str::<Complexity>("\"Low\"").unwrap(),
            Complexity::Low
        );
    }

    #[test]
    fn test_hour_ranges_are_contiguous() {
        assert_eq!(Complexity::Low.hour_range().1, Complexity::Medium.hour_range().0);
        assert_eq!(Complexity::Medium.hour_range().1, Complexity::High.hour_range().0);
        assert_eq!(Complexity::High.hour_range().1, Complexity::VeryHigh.hour_range().0);
    }

    #[test]
    fn test_issue_estimate_cost_derived_from_rate() {
        let issue = Issue {
            number: 7,
            title: "Fix login".into(),
            body: String::new(),
            labels: vec!["bug".into()],
            url: "https://github.com/acme/widgets/issues/7".into(),
        };
        let est = IssueEstimate::from_model(
            &issue,
            ModelEstimate {
                complexity: Complexity::Low,
                hours: 2.5,
                reasoning: "small".into(),
                source: EstimateSource::Parsed,
            },
            80.0,
        );
        assert_eq!(est.estimated_hours, 2.5);
        assert!((est.estimated_cost - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_repo_result_success_sums() {
        let target = RepoTarget {
            url: "https://github.com/acme/widgets".into(),
            owner: "acme".into(),
            name: "widgets".into(),
        };
        let issue = Issue {
            number: 1,
            title: "a".into(),
            body: String::new(),
            labels: vec![],
            url: "u".into(),
        };
        let estimates: Vec<IssueEstimate> = [3.0, 4.0]
            .iter()
            .map(|&h| {
                IssueEstimate::from_model(
                    &issue,
                    ModelEstimate {
                        complexity: Complexity::Low,
                        hours: h,
                        reasoning: String::new(),
                        source: EstimateSource::Parsed,
                    },
                    50.0,
                )
            })
            .collect();
        let result = RepoResult::success(&target, estimates);
        assert_eq!(result.issue_count, 2);
        assert!((result.total_hours - 7.0).abs() < 1e-9);
        assert!((result.total_cost - 350.0).abs() < 1e-9);
        assert!(result.error_detail.is_none());
    }

    #[test]
    fn test_repo_result_error_is_empty() {
        let target = RepoTarget {
            url: "https://github.com/acme/gone".into(),
            owner: "acme".into(),
            name: "gone".into(),
        };
        let result = RepoResult::error(&target, "not found");
        assert_eq!(result.status, RepoStatus::Error);
        assert_eq!(result.issue_count, 0);
        assert_eq!(result.error_detail.as_deref(), Some("not found"));
    }

    #[test]
    fn test_repo_target_key_case_insensitive() {
        let a = RepoTarget {
            url: "x".into(),
            owner: "Acme".into(),
            name: "Widgets".into(),
        };
        let b = RepoTarget {
            url: "y".into(),
            owner: "acme".into(),
            name: "widgets".into(),
        };
        assert_eq!(a.key(), b.key());
    }
}
