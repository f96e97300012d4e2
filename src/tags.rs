//! Key/value tag handling.
//!
//! [`KeyValueTags`] carries a resource's tags through the provider's tag
//! rules: default tags are merged under resource tags, keys reserved by AWS
//! (`aws:` prefix) and keys from the ignore configuration are never managed,
//! and tag changes are applied as an untag/tag pair computed from the old and
//! new sets.

use std::collections::BTreeMap;

use crate::client::BatchClient;
use crate::config::{IgnoreTagsConfig, TagsConfig};
use crate::error::JobQueueError;

/// Prefix of tag keys reserved by AWS.
pub const AWS_TAG_KEY_PREFIX: &str = "aws:";

/// An ordered set of string tags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyValueTags(BTreeMap<String, String>);

impl KeyValueTags {
    pub fn new(tags: BTreeMap<String, String>) -> Self {
        Self(tags)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    /// Merges provider default tags under these tags; resource values win.
    pub fn merge_defaults(&self, config: &TagsConfig) -> Self {
        let mut merged = config.default_tags.clone();
        merged.extend(self.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self(merged)
    }

    /// Drops keys reserved by AWS.
    pub fn ignore_aws(&self) -> Self {
        self.filter(|key| !key.starts_with(AWS_TAG_KEY_PREFIX))
    }

    /// Drops keys matched by the ignore configuration.
    pub fn ignore_config(&self, config: &IgnoreTagsConfig) -> Self {
        self.filter(|key| !config.ignores(key))
    }

    /// Drops default tags whose value is unchanged, leaving what the resource itself declares.
    pub fn remove_defaults(&self, config: &TagsConfig) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(k, v)| config.default_tags.get(*k) != Some(*v))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Tags present in `self` that are missing from, or differ in, `other`.
    pub fn updated(&self, other: &KeyValueTags) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(k, v)| other.0.get(*k) != Some(*v))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Keys present in `self` but absent from `other`.
    pub fn removed_keys(&self, other: &KeyValueTags) -> Vec<String> {
        self.0
            .keys()
            .filter(|k| !other.0.contains_key(*k))
            .cloned()
            .collect()
    }

    fn filter(&self, keep: impl Fn(&str) -> bool) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(k, _)| keep(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, String>> for KeyValueTags {
    fn from(tags: BTreeMap<String, String>) -> Self {
        Self(tags)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyValueTags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Applies the difference between two tag sets to a resource.
///
/// Removed keys are untagged first, then new or changed values are tagged.
/// Keys reserved by AWS are left alone. Nothing is sent when the sets agree.
pub async fn update_tags(
    client: &dyn BatchClient,
    resource_arn: &str,
    old_tags: &KeyValueTags,
    new_tags: &KeyValueTags,
) -> Result<(), JobQueueError> {
    let old_tags = old_tags.ignore_aws();
    let new_tags = new_tags.ignore_aws();

    let removed = old_tags.removed_keys(&new_tags);
    if !removed.is_empty() {
        tracing::debug!(resource_arn = resource_arn, keys = ?removed, "Untagging resource");
        client
            .untag_resource(resource_arn, &removed)
            .await
            .map_err(|e| tag_error("untagging", resource_arn, e))?;
    }

    let updated = new_tags.updated(&old_tags);
    if !updated.is_empty() {
        tracing::debug!(resource_arn = resource_arn, count = updated.len(), "Tagging resource");
        client
            .tag_resource(resource_arn, updated.as_map())
            .await
            .map_err(|e| tag_error("tagging", resource_arn, e))?;
    }

    Ok(())
}

fn tag_error(action: &str, resource_arn: &str, error: JobQueueError) -> JobQueueError {
    match error {
        JobQueueError::Api {
            message,
            operation,
            aws_error,
            ..
        } => JobQueueError::Api {
            message: format!("error {} resource ({}): {}", action, resource_arn, message),
            operation,
            resource_name: resource_arn.to_string(),
            aws_error,
        },
        other => other,
    }
}
