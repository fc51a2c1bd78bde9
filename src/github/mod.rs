// src/github/mod.rs — Issue tracker client (GitHub REST v3)

use async_trait::async_trait;

use crate::core::types::{Issue, RepoTarget};
use crate::infra::config::GithubConfig;
use crate::infra::errors::IssueCostError;

/// Seam between the orchestrator and the tracker, so tests can run
/// against canned issue lists.
#[async_trait]
pub trait IssueFetcher: Send + Sync {
    /// All open, non-pull-request issues for one repository.
    async fn fetch_issues(&self, target: &RepoTarget) -> Result<Vec<Issue>, IssueCostError>;
}

/// Parse a repository URL into a RepoTarget. Accepts full GitHub URLs
/// (with or without scheme, trailing slash, or `.git`) and the bare
/// `owner/repo` shorthand.
pub fn parse_repo_url(input: &str) -> Result<RepoTarget, IssueCostError> {
    let raw = input.trim().trim_end_matches('/');
    if raw.is_empty() {
        return Err(IssueCostError::Validation(
            "repository URL must not be empty".into(),
        ));
    }

    let path = if let Some(idx) = raw.find("github.com/") {
        &raw[idx + "github.com/".len()..]
    } else if !raw.contains("://") && !raw.contains('.') {
        raw
    } else {
        return Err(IssueCostError::Validation(format!(
            "'{input}' is not a GitHub repository URL"
        )));
    };

    let mut parts = path.split('/');
    let (owner, name) = match (parts.next(), parts.next()) {
        (Some(o), Some(n)) if !o.is_empty() && !n.is_empty() => (o, n),
        _ => {
            return Err(IssueCostError::Validation(format!(
                "'{input}' is missing an owner or repository name"
            )))
        }
    };

    let name = name.trim_end_matches(".git");
    let valid =
        |s: &str| s.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid(owner) || !valid(name) || name.is_empty() {
        return Err(IssueCostError::Validation(format!(
            "'{input}' contains an invalid owner or repository name"
        )));
    }

    Ok(RepoTarget {
        url: format!("https://github.com/{owner}/{name}"),
        owner: owner.to_string(),
        name: name.to_string(),
    })
}

/// Whether pagination should continue after a page of `batch_len`
/// entries. Stops on a partial or empty page, or at the safety cap.
fn has_next_page(batch_len: usize, per_page: u32, page: u32, max_pages: u32) -> bool {
    batch_len == per_page as usize && page < max_pages
}

/// One issue entry from the listing endpoint. The endpoint conflates
/// pull requests with issues; PRs carry a `pull_request` key.
#[derive(Debug, serde::Deserialize)]
struct RawIssue {
    number: u64,
    title: String,
    body: Option<String>,
    #[serde(default)]
    labels: Vec<RawLabel>,
    html_url: String,
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, serde::Deserialize)]
struct RawLabel {
    name: String,
}

impl RawIssue {
    fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    fn into_issue(self) -> Issue {
        Issue {
            number: self.number,
            title: self.title,
            body: self.body.unwrap_or_default(),
            labels: self.labels.into_iter().map(|l| l.name).collect(),
            url: self.html_url,
        }
    }
}

pub struct GithubClient {
    client: reqwest::Client,
    config: GithubConfig,
}

impl GithubClient {
    pub fn new(config: GithubConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn fetch_page(
        &self,
        target: &RepoTarget,
        page: u32,
    ) -> Result<Vec<RawIssue>, IssueCostError> {
        let url = format!(
            "{}/repos/{}/{}/issues",
            self.config.api_base, target.owner, target.name
        );

        let mut request = self
            .client
            .get(&url)
            .header("accept", "application/vnd.github.v3+json")
            .header("user-agent", concat!("issuecost/", env!("CARGO_PKG_VERSION")))
            .query(&[
                ("state", "open".to_string()),
                ("per_page", self.config.per_page.to_string()),
                ("page", page.to_string()),
            ]);
        if let Some(token) = &self.config.token {
            request = request.header("authorization", format!("token {token}"));
        }

        let response = request.send().await.map_err(|e| IssueCostError::Network {
            service: "github".into(),
            message: e.to_string(),
        })?;

        let status = response.status();
        match status.as_u16() {
            200 => {}
            404 => {
                return Err(IssueCostError::RepoNotFound {
                    owner: target.owner.clone(),
                    name: target.name.clone(),
                })
            }
            403 | 429 => {
                let retry_after_ms = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(|s| s * 1000)
                    .unwrap_or(60_000);
                return Err(IssueCostError::RateLimited {
                    service: "github".into(),
                    retry_after_ms,
                });
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                return Err(IssueCostError::Tracker {
                    status: status.as_u16(),
                    message: body.chars().take(200).collect(),
                });
            }
        }

        response
            .json::<Vec<RawIssue>>()
            .await
            .map_err(|e| IssueCostError::Tracker {
                status: status.as_u16(),
                message: format!("malformed issue listing: {e}"),
            })
    }
}

#[async_trait]
impl IssueFetcher for GithubClient {
    async fn fetch_issues(&self, target: &RepoTarget) -> Result<Vec<Issue>, IssueCostError> {
        let mut issues = Vec::new();
        let mut page = 1u32;

        loop {
            let batch = self.fetch_page(target, page).await?;
            let batch_len = batch.len();

            issues.extend(
                batch
                    .into_iter()
                    .filter(|i| !i.is_pull_request())
                    .map(RawIssue::into_issue),
            );

            if !has_next_page(batch_len, self.config.per_page, page, self.config.max_pages) {
                break;
            }
            page += 1;
        }

        tracing::debug!(
            repo = %target,
            count = issues.len(),
            pages = page,
            "fetched open issues"
        );
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_url() {
        let t = parse_repo_url("https://github.com/acme/widgets").unwrap();
        assert_eq!(t.owner, "acme");
        assert_eq!(t.name, "widgets");
        assert_eq!(t.url, "https://github.com/acme/widgets");
    }

    #[test]
    fn test_parse_trailing_slash_and_git_suffix() {
        let t = parse_repo_url("https://github.com/acme/widgets.git/").unwrap();
        assert_eq!(t.name, "widgets");

        let t = parse_repo_url("http://github.com/rust-lang/rust/").unwrap();
        assert_eq!(t.owner, "rust-lang");
        assert_eq!(t.name, "rust");
    }

    #[test]
    fn test_parse_shorthand() {
        let t = parse_repo_url("acme/widgets").unwrap();
        assert_eq!(t.owner, "acme");
        assert_eq!(t.name, "widgets");
        assert_eq!(t.url, "https://github.com/acme/widgets");
    }

    #[test]
    fn test_parse_url_with_extra_path_segments() {
        // Deep links still resolve to the repository
        let t = parse_repo_url("https://github.com/acme/widgets/issues/42").unwrap();
        assert_eq!(t.owner, "acme");
        assert_eq!(t.name, "widgets");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_repo_url("").is_err());
        assert!(parse_repo_url("https://gitlab.com/acme/widgets").is_err());
        assert!(parse_repo_url("https://github.com/only-owner").is_err());
        assert!(parse_repo_url("not a url at all").is_err());
    }

    #[test]
    fn test_pagination_stops_on_partial_page() {
        assert!(!has_next_page(99, 100, 1, 30));
        assert!(!has_next_page(0, 100, 1, 30));
    }

    #[test]
    fn test_pagination_continues_on_full_page() {
        assert!(has_next_page(100, 100, 1, 30));
    }

    #[test]
    fn test_pagination_respects_safety_cap() {
        // A full final page at the cap must not loop forever
        assert!(!has_next_page(100, 100, 30, 30));
    }

    #[test]
    fn test_pull_request_filtering() {
        let raw: Vec<RawIssue> = serde_json::from_value(serde_json::json!([
            {
                "number": 1,
                "title": "Real issue",
                "body": "text",
                "labels": [{"name": "bug"}],
                "html_url": "https://github.com/acme/widgets/issues/1"
            },
            {
                "number": 2,
                "title": "A pull request",
                "body": null,
                "labels": [],
                "html_url": "https://github.com/acme/widgets/pull/2",
                "pull_request": {"url": "https://api.github.com/repos/acme/widgets/pulls/2"}
            }
        ]))
        .unwrap();

        let issues: Vec<Issue> = raw
            .into_iter()
            .filter(|i| !i.is_pull_request())
            .map(RawIssue::into_issue)
            .collect();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].number, 1);
        assert_eq!(issues[0].labels, vec!["bug"]);
        // Null body becomes empty string
        assert_eq!(issues[0].body, "text");
    }
}
