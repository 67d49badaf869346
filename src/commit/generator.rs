//! Diff-to-commit-message pipeline.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::ai::AiClient;
use crate::commit::conventional::validate;
use crate::commit::error::GenerateError;
use crate::commit::parse::parse_candidates;
use crate::commit::prompts::generate_user_prompt;
use crate::data::check::ValidationReport;

/// Candidates returned by the model together with their classification.
#[derive(Debug, Clone)]
pub struct GeneratedCommits {
    /// Candidates in the order the model produced them.
    pub commits: Vec<String>,
    /// Grammar classification of `commits`.
    pub report: ValidationReport,
}

/// Turns diffs into validated commit message candidates.
pub struct CommitGenerator {
    client: Option<Arc<dyn AiClient>>,
    system_prompt: String,
}

impl CommitGenerator {
    /// Creates a generator. `client` is `None` when no API key is configured.
    pub fn new(client: Option<Arc<dyn AiClient>>, system_prompt: impl Into<String>) -> Self {
        Self {
            client,
            system_prompt: system_prompt.into(),
        }
    }

    /// Whether an upstream client is available.
    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Whether a non-empty system prompt was supplied.
    pub fn has_system_prompt(&self) -> bool {
        !self.system_prompt.is_empty()
    }

    /// Fails fast when no upstream client is available.
    pub fn ensure_configured(&self) -> Result<&dyn AiClient, GenerateError> {
        self.client.as_deref().ok_or(GenerateError::MissingApiKey)
    }

    /// Asks the model for commit messages describing `diff`.
    pub async fn generate(&self, diff: &str) -> Result<GeneratedCommits, GenerateError> {
        let client = self.ensure_configured()?;
        let user_prompt = generate_user_prompt(diff);

        let completion = client.send_request(&self.system_prompt, &user_prompt).await;
        let raw = match completion {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                error!(kind = e.kind(), error = %e, "Error generating commit message");
                return Err(e.into());
            }
        };
        debug!(raw = %raw, "Completion received");

        let commits = parse_candidates(&raw).map_err(|e| {
            error!(raw = %raw, "{e}");
            GenerateError::from_candidate_error(e, raw.clone())
        })?;

        let report = validate(&commits);
        if report.has_warnings() {
            warn!(
                non_conforming = report.summary.non_conforming,
                total = report.summary.total,
                "Generated commit messages do not all match Conventional Commit format"
            );
        }
        let meta = client.get_metadata();
        info!(
            count = commits.len(),
            provider = %meta.provider,
            model = %meta.model,
            "Generated commit messages"
        );

        Ok(GeneratedCommits { commits, report })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ai::test_utils::ConfigurableMockAiClient;
    use crate::ai::AiError;

    fn generator_with(mock: ConfigurableMockAiClient) -> CommitGenerator {
        CommitGenerator::new(Some(Arc::new(mock)), "SYSTEM")
    }

    #[tokio::test]
    async fn returns_candidates_unchanged() {
        let generator =
            generator_with(ConfigurableMockAiClient::replying(r#"["feat(api): add x", "fix: y"]"#));
        let out = generator.generate("diff").await.unwrap();
        assert_eq!(out.commits, vec!["feat(api): add x", "fix: y"]);
        assert!(out.report.warnings().is_empty());
    }

    #[tokio::test]
    async fn surrounding_whitespace_is_trimmed_before_parsing() {
        let generator = generator_with(ConfigurableMockAiClient::replying("\n  [\"docs: z\"]\n\n"));
        let out = generator.generate("diff").await.unwrap();
        assert_eq!(out.commits, vec!["docs: z"]);
    }

    #[tokio::test]
    async fn nonconforming_candidates_are_kept_with_warnings() {
        let generator = generator_with(ConfigurableMockAiClient::replying(r#"["added stuff"]"#));
        let out = generator.generate("diff").await.unwrap();
        assert_eq!(out.commits, vec!["added stuff"]);
        assert_eq!(
            out.report.warnings(),
            vec!["Commit message does not fully match Conventional Commit format: added stuff"]
        );
    }

    #[tokio::test]
    async fn sends_system_prompt_and_templated_diff() {
        let mock = ConfigurableMockAiClient::replying("[]");
        let prompts = mock.prompt_handle();
        let generator = generator_with(mock);

        generator.generate("+added line").await.unwrap();

        assert_eq!(prompts.request_count(), 1);
        let (system, user) = &prompts.prompts()[0];
        assert_eq!(system, "SYSTEM");
        assert_eq!(
            user,
            "Generate commit message(s) for this git diff:\n\n+added line"
        );
    }

    #[tokio::test]
    async fn not_json_carries_trimmed_raw() {
        let generator = generator_with(ConfigurableMockAiClient::replying("  not json  "));
        let err = generator.generate("diff").await.unwrap_err();
        assert!(matches!(err, GenerateError::MalformedResponse { ref raw } if raw == "not json"));
    }

    #[tokio::test]
    async fn wrong_shape_carries_raw() {
        let generator = generator_with(ConfigurableMockAiClient::replying(r#"["feat: a", 5]"#));
        let err = generator.generate("diff").await.unwrap_err();
        assert!(
            matches!(err, GenerateError::ShapeMismatch { ref raw } if raw == r#"["feat: a", 5]"#)
        );
    }

    #[tokio::test]
    async fn upstream_failure_is_wrapped() {
        let generator = generator_with(ConfigurableMockAiClient::new(vec![Err(
            AiError::RateLimited("quota".to_string()),
        )]));
        let err = generator.generate("diff").await.unwrap_err();
        assert!(matches!(err, GenerateError::Upstream(AiError::RateLimited(_))));
    }

    #[tokio::test]
    async fn unconfigured_generator_never_calls_upstream() {
        let generator = CommitGenerator::new(None, "");
        assert!(!generator.is_configured());
        assert!(!generator.has_system_prompt());
        let err = generator.generate("diff").await.unwrap_err();
        assert!(matches!(err, GenerateError::MissingApiKey));
    }
}
