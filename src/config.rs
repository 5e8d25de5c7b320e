use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::TrackerDbError;

/// How long a proxy trusts its cached column values.
pub const DEFAULT_PROPERTY_CACHE_TTL: Duration = Duration::from_secs(30);

/// Settings shared by every engine adapter.
///
/// ```rust
/// use tracker_sql::prelude::*;
///
/// let config = DatabaseConfig::from_json_str(
///     r#"{ "property_cache_ttl_ms": 5000, "dialect": { "literal_escapes": "Concat" } }"#,
/// )?;
/// assert_eq!(config.property_cache_ttl(), std::time::Duration::from_secs(5));
/// # Ok::<(), TrackerDbError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub dialect: Dialect,
    pub property_cache_ttl_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            property_cache_ttl_ms: duration_millis(DEFAULT_PROPERTY_CACHE_TTL),
        }
    }
}

impl DatabaseConfig {
    #[must_use]
    pub fn builder() -> DatabaseConfigBuilder {
        DatabaseConfigBuilder::default()
    }

    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    #[must_use]
    pub fn property_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.property_cache_ttl_ms)
    }

    /// Parse a JSON configuration document; missing keys take their defaults.
    ///
    /// # Errors
    /// Returns `TrackerDbError::ConfigError` if the JSON is malformed.
    pub fn from_json_str(json: &str) -> Result<Self, TrackerDbError> {
        serde_json::from_str(json).map_err(|e| TrackerDbError::ConfigError(e.to_string()))
    }
}

fn duration_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)
}

/// Fluent builder for [`DatabaseConfig`].
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfigBuilder {
    config: DatabaseConfig,
}

impl DatabaseConfigBuilder {
    #[must_use]
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.config.dialect = dialect;
        self
    }

    #[must_use]
    pub fn property_cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.property_cache_ttl_ms = duration_millis(ttl);
        self
    }

    #[must_use]
    pub fn build(self) -> DatabaseConfig {
        self.config
    }
}
