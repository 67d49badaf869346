//! Per-client request rate limiting.
//!
//! Limits use the `"<n> per [<k>] <unit>"` notation (`"10 per minute"`,
//! `"5 per 2 hours"`, `"10/minute"`); several limits are joined with `;`.
//! Each [`RateLimiter`] keeps a sliding-window log of admitted requests per
//! client address and admits a request only when every one of its limits
//! still has room.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::warn;

use crate::server::error::ServiceError;

/// Client table size above which idle clients are swept.
const SWEEP_THRESHOLD: usize = 4096;

/// Key used when the peer address is unavailable.
const UNKNOWN_CLIENT: &str = "unknown";

/// Granularity of a rate limit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    /// One second.
    Second,
    /// Sixty seconds.
    Minute,
    /// Sixty minutes.
    Hour,
    /// Twenty-four hours.
    Day,
}

impl TimeUnit {
    fn seconds(self) -> u64 {
        match self {
            Self::Second => 1,
            Self::Minute => 60,
            Self::Hour => 60 * 60,
            Self::Day => 24 * 60 * 60,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = RateLimitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_suffix('s').unwrap_or(s) {
            "second" | "sec" => Ok(Self::Second),
            "minute" | "min" => Ok(Self::Minute),
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            _ => Err(RateLimitParseError::UnknownUnit(s.to_string())),
        }
    }
}

/// Errors from parsing rate limit notation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateLimitParseError {
    /// The string did not have the `<n> per [<k>] <unit>` shape.
    #[error("Invalid rate limit '{0}': expected '<n> per [<k>] <unit>'")]
    Malformed(String),
    /// The unit was not second/minute/hour/day.
    #[error("Unknown rate limit unit '{0}'")]
    UnknownUnit(String),
    /// A count of zero can never admit anything.
    #[error("Rate limit '{0}' must allow at least one request per at least one unit")]
    Zero(String),
}

/// A single limit: `amount` requests per `multiple` × `unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Requests admitted per window.
    pub amount: u32,
    /// Number of units in the window.
    pub multiple: u32,
    /// Window unit.
    pub unit: TimeUnit,
}

impl RateLimit {
    /// Creates `amount` requests per one `unit`.
    pub const fn per(amount: u32, unit: TimeUnit) -> Self {
        Self {
            amount,
            multiple: 1,
            unit,
        }
    }

    /// Length of the sliding window.
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.unit.seconds() * u64::from(self.multiple))
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} per {} {}", self.amount, self.multiple, self.unit.as_str())
    }
}

impl FromStr for RateLimit {
    type Err = RateLimitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let malformed = || RateLimitParseError::Malformed(s.trim().to_string());

        let (amount, window) = normalized
            .split_once('/')
            .or_else(|| normalized.split_once(" per "))
            .ok_or_else(malformed)?;

        let amount: u32 = amount.trim().parse().map_err(|_| malformed())?;
        let tokens: Vec<&str> = window.split_whitespace().collect();
        let (multiple, unit) = match tokens.as_slice() {
            [unit] => (1, unit.parse()?),
            [multiple, unit] => (multiple.parse().map_err(|_| malformed())?, unit.parse()?),
            _ => return Err(malformed()),
        };

        if amount == 0 || multiple == 0 {
            return Err(RateLimitParseError::Zero(s.trim().to_string()));
        }

        Ok(Self {
            amount,
            multiple,
            unit,
        })
    }
}

/// Parses a `;`-separated list of limits. Empty segments are ignored.
pub fn parse_rate_limits(list: &str) -> Result<Vec<RateLimit>, RateLimitParseError> {
    list.split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect()
}

/// Rejection details for a request over its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitExceeded {
    /// The limit that had no room left.
    pub limit: RateLimit,
    /// Time until that limit admits another request.
    pub retry_after: Duration,
}

/// Sliding-window log limiter for one group of routes.
pub struct RateLimiter {
    scope: &'static str,
    limits: Vec<RateLimit>,
    clients: Mutex<HashMap<String, VecDeque<Instant>>>,
    rejected: AtomicU64,
}

impl RateLimiter {
    /// Creates a limiter named `scope` enforcing every limit in `limits`.
    pub fn new(scope: &'static str, limits: Vec<RateLimit>) -> Self {
        Self {
            scope,
            limits,
            clients: Mutex::new(HashMap::new()),
            rejected: AtomicU64::new(0),
        }
    }

    /// Name used in logs and metrics.
    pub fn scope(&self) -> &'static str {
        self.scope
    }

    /// Number of requests rejected so far.
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Admits or rejects a request from `client` now.
    pub fn check(&self, client: &str) -> Result<(), RateLimitExceeded> {
        self.check_at(client, Instant::now())
    }

    /// Admits or rejects a request from `client` at `now`.
    ///
    /// Admitted requests count against every limit; rejected ones count
    /// against none.
    pub fn check_at(&self, client: &str, now: Instant) -> Result<(), RateLimitExceeded> {
        if self.limits.is_empty() {
            return Ok(());
        }

        let longest = self
            .limits
            .iter()
            .map(RateLimit::period)
            .max()
            .unwrap_or_default();

        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        if clients.len() > SWEEP_THRESHOLD {
            clients.retain(|_, hits| hits.back().is_some_and(|last| now.duration_since(*last) < longest));
        }

        let hits = clients.entry(client.to_string()).or_default();
        while hits.front().is_some_and(|first| now.duration_since(*first) >= longest) {
            hits.pop_front();
        }

        for limit in &self.limits {
            let period = limit.period();
            let start = hits.partition_point(|hit| now.duration_since(*hit) >= period);
            let in_window = hits.len() - start;
            if in_window >= limit.amount as usize {
                let oldest = hits[start];
                let retry_after = period.saturating_sub(now.duration_since(oldest));
                self.rejected.fetch_add(1, Ordering::Relaxed);
                return Err(RateLimitExceeded {
                    limit: *limit,
                    retry_after,
                });
            }
        }

        hits.push_back(now);
        Ok(())
    }
}

/// Middleware enforcing `limiter` on the routes it wraps.
pub async fn enforce(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_key(&request);
    match limiter.check(&client) {
        Ok(()) => next.run(request).await,
        Err(exceeded) => {
            warn!(
                scope = limiter.scope(),
                client = %client,
                limit = %exceeded.limit,
                retry_after_secs = exceeded.retry_after.as_secs(),
                "Rate limit exceeded"
            );
            ServiceError::RateLimited(exceeded).into_response()
        }
    }
}

/// Identifies the caller by peer IP address.
fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| UNKNOWN_CLIENT.to_string(), |ConnectInfo(addr)| addr.ip().to_string())
}
