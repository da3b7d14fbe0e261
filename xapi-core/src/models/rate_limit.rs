//! Rate-limit metadata parsed from response headers.
//!
//! The API reports quotas through header families named
//! `x-<type>-limit`, `x-<type>-remaining` and `x-<type>-reset`. Several
//! families can be present on one response (for example the per-endpoint
//! window plus a 24 hour app or user cap).

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Header families the API is known to send, in reporting order.
pub const KNOWN_RATE_LIMIT_TYPES: [&str; 3] = ["rate-limit", "app-limit-24hour", "user-limit-24hour"];

static RATE_LIMIT_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^x-(.+)-(limit|remaining|reset)$").expect("Invalid regex")
});

// ============================================================================
// Rate Limit
// ============================================================================

/// One rate-limit window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    /// Header family, e.g. `rate-limit` or `app-limit-24hour`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Requests allowed in the window.
    pub limit: u64,
    /// Requests left in the window.
    pub remaining: u64,
    /// When the window resets, as unix seconds.
    pub reset_at: i64,
}

impl RateLimit {
    /// Returns true if no requests are left in the window.
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// The reset instant as a timestamp, if representable.
    pub fn reset_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.reset_at, 0)
    }

    /// Whole seconds until the window resets, never negative.
    pub fn reset_in(&self) -> u64 {
        self.reset_in_at(Utc::now())
    }

    /// Whole seconds from `now` until the window resets, rounded up.
    pub fn reset_in_at(&self, now: DateTime<Utc>) -> u64 {
        let remaining_ms = self
            .reset_at
            .saturating_mul(1000)
            .saturating_sub(now.timestamp_millis());
        if remaining_ms <= 0 {
            return 0;
        }
        u64::try_from(remaining_ms.div_euclid(1000) + i64::from(remaining_ms % 1000 != 0))
            .unwrap_or(0)
    }
}

// ============================================================================
// Rate Limits
// ============================================================================

/// All rate-limit windows reported on one response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimits {
    limits: Vec<RateLimit>,
}

impl RateLimits {
    /// Collects every `x-<type>-limit|remaining|reset` family from headers.
    ///
    /// Known families come first in [`KNOWN_RATE_LIMIT_TYPES`] order, the
    /// rest follow in the order they were first seen. A family member that
    /// is missing or not a number counts as 0.
    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut limits: Vec<RateLimit> = Vec::new();

        for (name, value) in headers {
            let Some(caps) = RATE_LIMIT_HEADER_RE.captures(name) else {
                continue;
            };
            let kind = caps[1].to_ascii_lowercase();
            let field = caps[2].to_ascii_lowercase();

            let idx = match limits.iter().position(|l| l.kind == kind) {
                Some(idx) => idx,
                None => {
                    limits.push(RateLimit {
                        kind,
                        limit: 0,
                        remaining: 0,
                        reset_at: 0,
                    });
                    limits.len() - 1
                }
            };

            let value = value.trim();
            let entry = &mut limits[idx];
            match field.as_str() {
                "limit" => entry.limit = value.parse().unwrap_or(0),
                "remaining" => entry.remaining = value.parse().unwrap_or(0),
                _ => entry.reset_at = value.parse().unwrap_or(0),
            }
        }

        limits.sort_by_key(|l| {
            KNOWN_RATE_LIMIT_TYPES
                .iter()
                .position(|known| *known == l.kind)
                .unwrap_or(KNOWN_RATE_LIMIT_TYPES.len())
        });

        Self { limits }
    }

    /// All windows.
    pub fn all(&self) -> &[RateLimit] {
        &self.limits
    }

    /// Returns true if no rate-limit headers were present.
    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    /// Looks up a window by family.
    pub fn get(&self, kind: &str) -> Option<&RateLimit> {
        self.limits.iter().find(|l| l.kind == kind)
    }

    /// The window that governs when requests may resume.
    ///
    /// Among exhausted windows this is the one that resets last. With no
    /// exhausted window it is the first one reported.
    pub fn effective(&self) -> Option<&RateLimit> {
        self.limits
            .iter()
            .filter(|l| l.is_exhausted())
            .max_by_key(|l| l.reset_at)
            .or_else(|| self.limits.first())
    }

    /// Seconds until the effective window resets, if any window is known.
    pub fn retry_after_at(&self, now: DateTime<Utc>) -> Option<u64> {
        self.effective().map(|l| l.reset_in_at(now))
    }
}

impl IntoIterator for RateLimits {
    type Item = RateLimit;
    type IntoIter = std::vec::IntoIter<RateLimit>;

    fn into_iter(self) -> Self::IntoIter {
        self.limits.into_iter()
    }
}
