//! First-fit API key selection.
//!
//! DESIGN
//! ======
//! The pool is scanned in its stored order and the first key whose caps are
//! not exhausted wins. This is a deliberate first-fit policy: earlier keys
//! absorb traffic until their windows fill, later keys are overflow. It is
//! not round-robin and not least-recently-used, and must not silently
//! become either — operators order the pool on purpose.

use crate::model::ApiKey;
use crate::rate_limit;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    /// An empty pool is a configuration error, not a rate-limit condition.
    #[error("key pool is empty")]
    EmptyPool,
    #[error("all keys are rate-limited")]
    AllKeysRateLimited,
}

/// Pick the first eligible key in the pool, returning its index.
///
/// Each key's ledger is pruned in place before its caps are tested, so a
/// caller that persists the pool after a successful choice also persists
/// the trimmed history.
///
/// # Errors
///
/// `EmptyPool` if there is nothing to scan; `AllKeysRateLimited` if every
/// key's caps are exhausted right now.
pub fn choose(pool: &mut [ApiKey], now_ms: u64) -> Result<usize, SelectError> {
    if pool.is_empty() {
        return Err(SelectError::EmptyPool);
    }
    for (index, key) in pool.iter_mut().enumerate() {
        rate_limit::prune(&mut key.usage_history, now_ms);
        if !rate_limit::is_limited(key, now_ms) {
            return Ok(index);
        }
    }
    Err(SelectError::AllKeysRateLimited)
}

#[cfg(test)]
#[path = "selector_test.rs"]
mod tests;
