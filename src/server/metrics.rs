//! Request counters exposed on `GET /metrics`.
//!
//! Counters are plain atomics owned by the application state and rendered
//! in the Prometheus text exposition format on demand.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::server::rate_limit::RateLimiter;

/// Metric name prefix.
const PREFIX: &str = "omni_commit";

/// Failure reasons tracked for `/generate`, in exposition order.
const FAILURE_REASONS: [&str; 5] = [
    "missing_api_key",
    "missing_diff",
    "malformed_response",
    "shape_mismatch",
    "upstream",
];

/// Causes of `upstream` failures, in exposition order.
const UPSTREAM_KINDS: [&str; 5] = [
    "transport",
    "authentication",
    "upstream_rate_limited",
    "api",
    "invalid_response",
];

/// Lightweight atomic counters, no allocations, no locking.
#[derive(Debug, Default)]
pub struct Metrics {
    generate_requests: AtomicU64,
    generate_successes: AtomicU64,
    generate_failures: [AtomicU64; FAILURE_REASONS.len()],
    upstream_failures: [AtomicU64; UPSTREAM_KINDS.len()],
    commit_messages: AtomicU64,
    format_warnings: AtomicU64,
    health_checks: AtomicU64,
}

impl Metrics {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts an incoming `/generate` request.
    pub fn inc_generate_requests(&self) {
        self.generate_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a successful generation and what it returned.
    pub fn record_success(&self, commits: usize, warnings: usize) {
        self.generate_successes.fetch_add(1, Ordering::Relaxed);
        self.commit_messages
            .fetch_add(commits as u64, Ordering::Relaxed);
        self.format_warnings
            .fetch_add(warnings as u64, Ordering::Relaxed);
    }

    /// Counts a failed generation under `reason`.
    ///
    /// Unknown reasons are ignored.
    pub fn record_failure(&self, reason: &str) {
        bump(&FAILURE_REASONS, &self.generate_failures, reason);
    }

    /// Counts the cause of an `upstream` failure. Unknown kinds are ignored.
    pub fn record_upstream_failure(&self, kind: &str) {
        bump(&UPSTREAM_KINDS, &self.upstream_failures, kind);
    }

    /// Counts a `/health` request.
    pub fn inc_health_checks(&self) {
        self.health_checks.fetch_add(1, Ordering::Relaxed);
    }

    /// Renders all counters plus the limiters' rejection counts.
    pub fn render(&self, limiters: &[&RateLimiter]) -> String {
        let mut out = String::new();

        counter(
            &mut out,
            "generate_requests_total",
            "Requests received on /generate.",
            &[("", self.generate_requests.load(Ordering::Relaxed))],
        );
        counter(
            &mut out,
            "generate_success_total",
            "Requests on /generate answered with commit messages.",
            &[("", self.generate_successes.load(Ordering::Relaxed))],
        );

        let failures = labelled("reason", &FAILURE_REASONS, &self.generate_failures);
        counter(
            &mut out,
            "generate_failures_total",
            "Requests on /generate that failed, by reason.",
            &borrowed(&failures),
        );

        let upstream = labelled("kind", &UPSTREAM_KINDS, &self.upstream_failures);
        counter(
            &mut out,
            "upstream_failures_total",
            "Upstream failures on /generate, by cause.",
            &borrowed(&upstream),
        );

        counter(
            &mut out,
            "commit_messages_total",
            "Commit messages returned to callers.",
            &[("", self.commit_messages.load(Ordering::Relaxed))],
        );
        counter(
            &mut out,
            "format_warnings_total",
            "Returned commit messages not matching Conventional Commit format.",
            &[("", self.format_warnings.load(Ordering::Relaxed))],
        );
        counter(
            &mut out,
            "health_checks_total",
            "Requests received on /health.",
            &[("", self.health_checks.load(Ordering::Relaxed))],
        );

        let rejected: Vec<(String, u64)> = limiters
            .iter()
            .map(|l| (format!("scope=\"{}\"", l.scope()), l.rejected()))
            .collect();
        counter(
            &mut out,
            "rate_limited_total",
            "Requests rejected by the rate limiter, by scope.",
            &borrowed(&rejected),
        );

        out
    }
}

fn bump(names: &[&str], counters: &[AtomicU64], name: &str) {
    if let Some(idx) = names.iter().position(|n| *n == name) {
        counters[idx].fetch_add(1, Ordering::Relaxed);
    }
}

fn labelled(label: &str, names: &[&str], counters: &[AtomicU64]) -> Vec<(String, u64)> {
    names
        .iter()
        .zip(counters)
        .map(|(name, count)| (format!("{label}=\"{name}\""), count.load(Ordering::Relaxed)))
        .collect()
}

fn borrowed(samples: &[(String, u64)]) -> Vec<(&str, u64)> {
    samples.iter().map(|(l, v)| (l.as_str(), *v)).collect()
}

fn counter(out: &mut String, name: &str, help: &str, samples: &[(&str, u64)]) {
    let _ = writeln!(out, "# HELP {PREFIX}_{name} {help}");
    let _ = writeln!(out, "# TYPE {PREFIX}_{name} counter");
    for (labels, value) in samples {
        if labels.is_empty() {
            let _ = writeln!(out, "{PREFIX}_{name} {value}");
        } else {
            let _ = writeln!(out, "{PREFIX}_{name}{{{labels}}} {value}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::rate_limit::{RateLimit, TimeUnit};

    #[test]
    fn failure_reasons_are_counted() {
        let metrics = Metrics::new();
        metrics.record_failure("shape_mismatch");
        metrics.record_failure("shape_mismatch");
        metrics.record_failure("no_such_reason");

        let text = metrics.render(&[]);
        assert!(text.contains("omni_commit_generate_failures_total{reason=\"shape_mismatch\"} 2"));
        assert!(!text.contains("no_such_reason"));
    }

    #[test]
    fn upstream_causes_do_not_inflate_failure_total() {
        let metrics = Metrics::new();
        metrics.record_failure("upstream");
        metrics.record_upstream_failure("authentication");

        let text = metrics.render(&[]);
        let failure_sum: u64 = text
            .lines()
            .filter(|l| l.starts_with("omni_commit_generate_failures_total{"))
            .filter_map(|l| l.rsplit(' ').next()?.parse::<u64>().ok())
            .sum();
        assert_eq!(failure_sum, 1);
        assert!(text.contains("omni_commit_upstream_failures_total{kind=\"authentication\"} 1"));
        assert!(!text.contains("reason=\"authentication\""));
    }

    #[test]
    fn exposition_format() {
        let metrics = Metrics::new();
        metrics.inc_generate_requests();
        metrics.inc_generate_requests();
        metrics.record_success(3, 1);
        metrics.record_failure("missing_diff");
        metrics.inc_health_checks();

        let limiter = RateLimiter::new("generate", vec![RateLimit::per(1, TimeUnit::Minute)]);
        let _ = limiter.check("c");
        let _ = limiter.check("c");

        insta::assert_snapshot!(metrics.render(&[&limiter]), @r#"
        # HELP omni_commit_generate_requests_total Requests received on /generate.
        # TYPE omni_commit_generate_requests_total counter
        omni_commit_generate_requests_total 2
        # HELP omni_commit_generate_success_total Requests on /generate answered with commit messages.
        # TYPE omni_commit_generate_success_total counter
        omni_commit_generate_success_total 1
        # HELP omni_commit_generate_failures_total Requests on /generate that failed, by reason.
        # TYPE omni_commit_generate_failures_total counter
        omni_commit_generate_failures_total{reason="missing_api_key"} 0
        omni_commit_generate_failures_total{reason="missing_diff"} 1
        omni_commit_generate_failures_total{reason="malformed_response"} 0
        omni_commit_generate_failures_total{reason="shape_mismatch"} 0
        omni_commit_generate_failures_total{reason="upstream"} 0
        # HELP omni_commit_upstream_failures_total Upstream failures on /generate, by cause.
        # TYPE omni_commit_upstream_failures_total counter
        omni_commit_upstream_failures_total{kind="transport"} 0
        omni_commit_upstream_failures_total{kind="authentication"} 0
        omni_commit_upstream_failures_total{kind="upstream_rate_limited"} 0
        omni_commit_upstream_failures_total{kind="api"} 0
        omni_commit_upstream_failures_total{kind="invalid_response"} 0
        # HELP omni_commit_commit_messages_total Commit messages returned to callers.
        # TYPE omni_commit_commit_messages_total counter
        omni_commit_commit_messages_total 3
        # HELP omni_commit_format_warnings_total Returned commit messages not matching Conventional Commit format.
        # TYPE omni_commit_format_warnings_total counter
        omni_commit_format_warnings_total 1
        # HELP omni_commit_health_checks_total Requests received on /health.
        # TYPE omni_commit_health_checks_total counter
        omni_commit_health_checks_total 1
        # HELP omni_commit_rate_limited_total Requests rejected by the rate limiter, by scope.
        # TYPE omni_commit_rate_limited_total counter
        omni_commit_rate_limited_total{scope="generate"} 1
        "#);
    }
}
