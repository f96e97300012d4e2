//! Configuration types for the job queue resource.
//!
//! Provides typed configuration for the Batch client endpoint, the status
//! waits performed by every lifecycle operation, and provider-level tag
//! handling (default tags and ignored tags).

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default overall timeout of a status wait.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Default delay before the first status fetch.
pub const DEFAULT_WAIT_DELAY: Duration = Duration::from_secs(10);

/// Default minimum interval between two status fetches.
pub const DEFAULT_WAIT_MIN_INTERVAL: Duration = Duration::from_secs(3);

/// Configuration for the HTTP Batch client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchClientConfig {
    /// AWS region for the Batch service
    pub region: String,
    /// Optional custom endpoint URL (for testing)
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl Default for BatchClientConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            endpoint_url: None,
        }
    }
}

impl BatchClientConfig {
    /// Creates a new BatchClientConfig with the specified region.
    pub fn with_region(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            endpoint_url: None,
        }
    }

    /// Overrides the service endpoint.
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Creates a new BatchClientConfig from AWS SDK config.
    pub fn from_aws_config(config: &aws_config::SdkConfig) -> Self {
        Self {
            region: config
                .region()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "us-east-1".to_string()),
            endpoint_url: config.endpoint_url().map(str::to_string),
        }
    }

    /// Returns the Batch service endpoint URL.
    pub fn endpoint(&self) -> String {
        self.endpoint_url
            .clone()
            .unwrap_or_else(|| format!("https://batch.{}.amazonaws.com", self.region))
    }
}

/// Timing parameters of a status wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitConfig {
    /// Overall time budget, including the initial delay.
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Delay before the first status fetch.
    #[serde(with = "duration_secs")]
    pub delay: Duration,
    /// Lower bound of the interval between two fetches.
    #[serde(with = "duration_secs")]
    pub min_interval: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_WAIT_TIMEOUT,
            delay: DEFAULT_WAIT_DELAY,
            min_interval: DEFAULT_WAIT_MIN_INTERVAL,
        }
    }
}

impl WaitConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }
}

/// Tag keys the provider never manages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IgnoreTagsConfig {
    /// Exact keys to ignore
    #[serde(default)]
    pub keys: Vec<String>,
    /// Key prefixes to ignore
    #[serde(default)]
    pub key_prefixes: Vec<String>,
}

impl IgnoreTagsConfig {
    /// Returns true if `key` matches an ignored key or prefix.
    pub fn ignores(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key) || self.key_prefixes.iter().any(|p| key.starts_with(p))
    }
}

/// Provider-wide tag configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TagsConfig {
    /// Tags applied to every resource unless the resource overrides them
    #[serde(default)]
    pub default_tags: BTreeMap<String, String>,
    /// Tags that are neither written nor reported
    #[serde(default)]
    pub ignore_tags: IgnoreTagsConfig,
}

impl TagsConfig {
    pub fn with_default_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_tags.insert(key.into(), value.into());
        self
    }

    pub fn with_ignored_key(mut self, key: impl Into<String>) -> Self {
        self.ignore_tags.keys.push(key.into());
        self
    }

    pub fn with_ignored_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.ignore_tags.key_prefixes.push(prefix.into());
        self
    }
}

/// Configuration of a [`JobQueueResource`](crate::JobQueueResource).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Timing of every status wait
    #[serde(default)]
    pub wait: WaitConfig,
    /// Default and ignored tags
    #[serde(default)]
    pub tags: TagsConfig,
}

impl ResourceConfig {
    pub fn with_wait(mut self, wait: WaitConfig) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_tags(mut self, tags: TagsConfig) -> Self {
        self.tags = tags;
        self
    }
}

/// Serializes a [`Duration`] as seconds.
///
/// Whole seconds are written as integers and anything finer as a fractional
/// number, so `0.5` means 500ms.
mod duration_secs {
    use std::fmt;
    use std::time::Duration;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        if duration.subsec_nanos() == 0 {
            serializer.serialize_u64(duration.as_secs())
        } else {
            serializer.serialize_f64(duration.as_secs_f64())
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        deserializer.deserialize_any(SecondsVisitor)
    }

    struct SecondsVisitor;

    impl<'de> Visitor<'de> for SecondsVisitor {
        type Value = Duration;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative number of seconds")
        }

        fn visit_u64<E: de::Error>(self, secs: u64) -> Result<Duration, E> {
            Ok(Duration::from_secs(secs))
        }

        fn visit_i64<E: de::Error>(self, secs: i64) -> Result<Duration, E> {
            u64::try_from(secs)
                .map(Duration::from_secs)
                .map_err(|_| E::invalid_value(de::Unexpected::Signed(secs), &self))
        }

        fn visit_f64<E: de::Error>(self, secs: f64) -> Result<Duration, E> {
            Duration::try_from_secs_f64(secs)
                .map_err(|_| E::invalid_value(de::Unexpected::Float(secs), &self))
        }
    }
}
