//! Endpoint configuration data model.
//!
//! DESIGN
//! ======
//! These types mirror the persisted/import-export JSON shape exactly, so a
//! full collection can round-trip through export and import without loss.
//! Timestamps (`last_used`, `usage_history`) are epoch milliseconds, never
//! formatted strings, so eligibility decisions survive serialization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// ENDPOINT
// =============================================================================

/// A configured proxy route: path prefixes mapped to a target origin, plus
/// header injection, CORS policy, and an authentication strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    /// Globally unique identity, immutable after creation.
    pub id: String,
    /// At least one non-blank path prefix, in configured order.
    pub path_prefixes: Vec<String>,
    /// Absolute URL of the proxied origin.
    pub target_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers_to_add: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_config: Option<AuthConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors_config: Option<CorsConfig>,
}

impl Endpoint {
    /// Validate the configuration invariants for create/update.
    ///
    /// # Errors
    ///
    /// Returns a human-readable description of the first violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("endpoint id must not be blank".to_owned());
        }
        if self.target_url.trim().is_empty() {
            return Err("target_url must not be blank".to_owned());
        }
        if self.path_prefixes.is_empty() {
            return Err("at least one path prefix is required".to_owned());
        }
        if self.path_prefixes.iter().any(|p| p.trim().is_empty()) {
            return Err("path prefixes must not be blank".to_owned());
        }
        if let Some(AuthConfig::ApiKey { name, values, .. }) = &self.auth_config {
            if name.trim().is_empty() {
                return Err("api_key auth requires a non-blank name".to_owned());
            }
            if values.is_empty() {
                return Err("api_key auth requires at least one key".to_owned());
            }
            if values.iter().any(|key| key.value.trim().is_empty()) {
                return Err("api_key values must not be blank".to_owned());
            }
        }
        Ok(())
    }

    /// Key pool, if this endpoint authenticates with API keys.
    #[must_use]
    pub fn key_pool(&self) -> Option<&[ApiKey]> {
        match &self.auth_config {
            Some(AuthConfig::ApiKey { values, .. }) => Some(values),
            _ => None,
        }
    }

    /// Mutable key pool, if this endpoint authenticates with API keys.
    pub fn key_pool_mut(&mut self) -> Option<&mut Vec<ApiKey>> {
        match &mut self.auth_config {
            Some(AuthConfig::ApiKey { values, .. }) => Some(values),
            _ => None,
        }
    }
}

// =============================================================================
// AUTHENTICATION
// =============================================================================

/// Where an API key is placed on the outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyLocation {
    Header,
    Query,
}

/// Authentication strategy. Tags other than `none` and `api_key` are
/// reserved and rejected at deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    None,
    ApiKey {
        /// Header or query-parameter name carrying the key.
        name: String,
        #[serde(rename = "in")]
        location: KeyLocation,
        /// Ordered credential pool. Order is significant: selection is
        /// first-fit over this sequence, exactly as configured.
        values: Vec<ApiKey>,
    },
}

/// One credential in an endpoint's pool, with its usage ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    /// The secret itself.
    pub value: String,
    /// Monotonic hit counter.
    #[serde(default)]
    pub usage: u64,
    /// Epoch-millisecond timestamp of the most recent hit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,
    /// Epoch-millisecond hit timestamps; sliding windows are recomputed
    /// from this on every selection. Append-only except for pruning.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub usage_history: Vec<u64>,
}

impl ApiKey {
    /// A fresh key with zero usage.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            usage: 0,
            last_used: None,
            rate_limit: None,
            usage_history: Vec::new(),
        }
    }
}

// =============================================================================
// RATE LIMIT POLICY
// =============================================================================

/// The closed set of named window kinds a cap can apply to.
///
/// Both historical policy shapes (`{minute, hour, day}` and
/// `{minute, tokens_per_minute, day}`) are subsets of this one enum, so a
/// single policy struct covers either without two competing definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    RequestsPerMinute,
    RequestsPerHour,
    RequestsPerDay,
    TokensPerMinute,
}

impl LimitKind {
    pub const ALL: [Self; 4] = [
        Self::RequestsPerMinute,
        Self::RequestsPerHour,
        Self::RequestsPerDay,
        Self::TokensPerMinute,
    ];

    /// Sliding-window width the cap is evaluated against.
    #[must_use]
    pub fn window_ms(self) -> u64 {
        match self {
            Self::RequestsPerMinute | Self::TokensPerMinute => 60_000,
            Self::RequestsPerHour => 3_600_000,
            Self::RequestsPerDay => 86_400_000,
        }
    }
}

/// Per-key caps. Every field is optional; unset caps never trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_minute: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_hour: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_day: Option<u64>,
    /// Token budget per minute. This engine consumes one unit per hit;
    /// per-call token accounting belongs to the forwarding layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_per_minute: Option<u64>,
}

impl RateLimit {
    /// The cap configured for one window kind, if any.
    #[must_use]
    pub fn cap(&self, kind: LimitKind) -> Option<u64> {
        match kind {
            LimitKind::RequestsPerMinute => self.requests_per_minute,
            LimitKind::RequestsPerHour => self.requests_per_hour,
            LimitKind::RequestsPerDay => self.requests_per_day,
            LimitKind::TokensPerMinute => self.tokens_per_minute,
        }
    }

    /// Iterate the configured caps in declaration order.
    pub fn caps(&self) -> impl Iterator<Item = (LimitKind, u64)> + '_ {
        LimitKind::ALL
            .into_iter()
            .filter_map(|kind| self.cap(kind).map(|cap| (kind, cap)))
    }
}

// =============================================================================
// CORS
// =============================================================================

/// Per-endpoint CORS policy, carried for the transport layer to emit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_methods: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_headers: Option<Vec<String>>,
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
