//! Sliding-window usage ledger and rate-limit evaluation.
//!
//! DESIGN
//! ======
//! Eligibility is never stored; it is recomputed on every selection attempt
//! from `(usage_history, rate_limit, now)`. The ledger is a plain vector of
//! epoch-millisecond timestamps. Callers prune before counting, and the
//! pruned vector is what gets persisted, so retained history is always the
//! count for the largest window.
//!
//! TRADE-OFFS
//! ==========
//! Recomputing counts on each check is O(history) rather than O(1) running
//! counters, but makes the ledger a pure function of its inputs: no counter
//! can drift from the history that justifies it, and import/export of raw
//! timestamps reproduces identical decisions.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::model::ApiKey;

/// Fixed retention ceiling for usage history. History older than the
/// largest supported window is never consulted, so a `requests_per_day` cap
/// and 24h retention are equivalent.
pub const RETENTION_MS: u64 = 86_400_000;

/// Current time as epoch milliseconds.
#[must_use]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Drop ledger entries older than the retention ceiling. Idempotent.
pub fn prune(history: &mut Vec<u64>, now_ms: u64) {
    history.retain(|&t| now_ms.saturating_sub(t) < RETENTION_MS);
}

/// Count ledger entries inside the window ending at `now_ms`.
#[must_use]
pub fn count_within(history: &[u64], now_ms: u64, window_ms: u64) -> u64 {
    history
        .iter()
        .map(|&t| u64::from(now_ms.saturating_sub(t) < window_ms))
        .sum()
}

/// True iff any configured cap is met or exceeded for this key right now.
///
/// Unset caps never trigger; a key without a `rate_limit` block is never
/// limited. A `tokens_per_minute` cap is a numeric budget consuming one
/// unit per hit in this engine.
#[must_use]
pub fn is_limited(key: &ApiKey, now_ms: u64) -> bool {
    let Some(limit) = &key.rate_limit else {
        return false;
    };
    limit
        .caps()
        .any(|(kind, cap)| count_within(&key.usage_history, now_ms, kind.window_ms()) >= cap)
}

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;
