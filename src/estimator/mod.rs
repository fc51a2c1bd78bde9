// src/estimator/mod.rs — Per-issue complexity estimation
//
// The parse pipeline is the resilience contract of the whole service:
// estimate() never returns Err for anything the model did or failed to
// do. Strict JSON parse first, then a lenient text scan, then a fixed
// fallback estimate tagged as such.

use serde::Deserialize;
use std::sync::Arc;

use crate::core::types::{Complexity, EstimateSource, Issue, ModelEstimate};
use crate::provider::{CompletionRequest, ModelProvider};

const SYSTEM_PROMPT: &str =
    "You are an expert software project manager who estimates task complexity and costs.";

/// Body text beyond this length adds noise, not signal.
const MAX_BODY_CHARS: usize = 2000;

pub struct ComplexityEstimator {
    provider: Arc<dyn ModelProvider>,
    fallback_hours: f64,
    max_tokens: u32,
    temperature: f32,
}

impl ComplexityEstimator {
    pub fn new(provider: Arc<dyn ModelProvider>, fallback_hours: f64) -> Self {
        Self {
            provider,
            fallback_hours,
            max_tokens: 1024,
            temperature: 0.3,
        }
    }

    pub fn with_model_params(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// Estimate one issue. Infallible by contract: provider failures and
    /// unparsable responses degrade to the fallback estimate.
    pub async fn estimate(&self, issue: &Issue) -> ModelEstimate {
        let request = CompletionRequest {
            system: Some(SYSTEM_PROMPT.into()),
            prompt: build_prompt(issue),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        match self.provider.complete(request).await {
            Ok(text) => parse_response(&text, self.fallback_hours),
            Err(e) => {
                tracing::warn!(issue = issue.number, error = %e, "model call failed, using fallback estimate");
                fallback_estimate(
                    format!("Fallback estimate: model call failed ({e}). Manual review recommended."),
                    self.fallback_hours,
                )
            }
        }
    }
}

/// Deterministic prompt from title, truncated body, and labels.
pub fn build_prompt(issue: &Issue) -> String {
    let body = if issue.body.is_empty() {
        "No description provided"
    } else {
        let end = issue
            .body
            .char_indices()
            .nth(MAX_BODY_CHARS)
            .map(|(i, _)| i)
            .unwrap_or(issue.body.len());
        &issue.body[..end]
    };
    let labels = if issue.labels.is_empty() {
        "None".to_string()
    } else {
        issue.labels.join(", ")
    };

    format!(
        r#"Analyze this GitHub issue and estimate its complexity and the development hours needed.

**Issue Title:** {title}

**Description:**
{body}

**Labels:** {labels}

Classify the complexity as one of:
- "Low": simple bug fixes, documentation updates, minor UI changes (1-6 hours)
- "Medium": feature additions, moderate refactoring, integration tasks (6-15 hours)
- "High": complex features, architectural changes, major refactoring (15-25 hours)
- "Very High": cross-cutting redesigns, new subsystems, large migrations (25-40 hours)

Then give realistic development hours within the chosen range, and a short
reasoning covering the main tasks, technical challenges, and assumptions.

Respond ONLY with a valid JSON object in this exact format:
{{
    "complexity": "Low|Medium|High|Very High",
    "estimated_hours": <number>,
    "reasoning": "<free text>"
}}"#,
        title = issue.title,
    )
}

#[derive(Debug, Deserialize)]
struct EstimateSchema {
    complexity: String,
    estimated_hours: f64,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Strict, then lenient, then fallback.
pub fn parse_response(text: &str, fallback_hours: f64) -> ModelEstimate {
    if let Some(estimate) = parse_strict(text) {
        return estimate;
    }
    if let Some(estimate) = parse_lenient(text) {
        tracing::debug!("strict parse failed, recovered estimate from raw text");
        return estimate;
    }
    tracing::warn!(
        head = text.chars().take(120).collect::<String>(),
        "model response unparsable, using fallback estimate"
    );
    fallback_estimate(
        "Fallback estimate: model response could not be parsed. Manual review recommended.".into(),
        fallback_hours,
    )
}

/// Strict parse: strip markdown fences, locate the JSON object, require
/// a known tier and a usable hour count. Hours are clamped to the
/// tier's range so one hallucinated number cannot skew a whole batch.
fn parse_strict(text: &str) -> Option<ModelEstimate> {
    let json = extract_json(text)?;
    let schema: EstimateSchema = serde_json::from_str(json).ok()?;

    let complexity = Complexity::from_name(&schema.complexity)?;
    if !schema.estimated_hours.is_finite() || schema.estimated_hours <= 0.0 {
        return None;
    }
    let (lo, hi) = complexity.hour_range();
    let hours = schema.estimated_hours.clamp(lo, hi);

    Some(ModelEstimate {
        complexity,
        hours,
        reasoning: schema
            .reasoning
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| "No detailed reasoning provided.".into()),
        source: EstimateSource::Parsed,
    })
}

/// Lenient recovery: find a tier name in the raw text, then the first
/// number near the word "hour"; default to the tier midpoint otherwise.
fn parse_lenient(text: &str) -> Option<ModelEstimate> {
    let lower = text.to_lowercase();

    // "very high" must be probed before "high"
    let complexity = [
        ("very high", Complexity::VeryHigh),
        ("high", Complexity::High),
        ("medium", Complexity::Medium),
        ("low", Complexity::Low),
    ]
    .into_iter()
    .find(|(name, _)| lower.contains(name))
    .map(|(_, c)| c)?;

    let (lo, hi) = complexity.hour_range();
    let hours = extract_hours(&lower)
        .map(|h| h.clamp(lo, hi))
        .unwrap_or_else(|| complexity.midpoint_hours());

    Some(ModelEstimate {
        complexity,
        hours,
        reasoning: format!(
            "Recovered estimate: response was not valid JSON; tier inferred from text. Raw response: {}",
            text.chars().take(500).collect::<String>()
        ),
        source: EstimateSource::Recovered,
    })
}

/// First number immediately preceding the word "hour" ("8 hours",
/// "about 12.5 hours").
fn extract_hours(lower: &str) -> Option<f64> {
    let idx = lower.find("hour")?;
    let prefix = &lower[..idx];
    let number: String = prefix
        .chars()
        .rev()
        .skip_while(|c| c.is_whitespace())
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    number.parse::<f64>().ok().filter(|h| *h > 0.0)
}

/// Strip a ```json fence if present, else take the outermost braces.
fn extract_json(text: &str) -> Option<&str> {
    let inner = if let Some(start) = text.find("```json") {
        let rest = &text[start + 7..];
        let end = rest.find("```")?;
        &rest[..end]
    } else if let Some(start) = text.find("```") {
        let rest = &text[start + 3..];
        let end = rest.find("```")?;
        &rest[..end]
    } else {
        text
    };

    let open = inner.find('{')?;
    let close = inner.rfind('}')?;
    (close > open).then(|| &inner[open..=close])
}

fn fallback_estimate(reasoning: String, fallback_hours: f64) -> ModelEstimate {
    ModelEstimate {
        complexity: Complexity::Medium,
        hours: fallback_hours,
        reasoning,
        source: EstimateSource::Fallback,
    }
}
