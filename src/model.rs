//! Desired and persisted job queue state.
//!
//! [`JobQueueSpec`] is what the user declares. [`JobQueueModel`] is what the
//! orchestration engine stores after each operation: the declared fields as
//! last observed, plus the ARN and the merged tag set.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::TagsConfig;
use crate::tags::KeyValueTags;
use crate::types::{sort_compute_environment_order, ComputeEnvironmentOrder, JobQueueDetail, JobQueueState};

/// Desired state of a job queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobQueueSpec {
    /// Queue name; changing it requires replacing the queue
    pub name: String,
    pub priority: i64,
    pub state: JobQueueState,
    /// Compute environments in dispatch preference order
    #[serde(with = "order_list")]
    pub compute_environment_order: Vec<ComputeEnvironmentOrder>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl JobQueueSpec {
    pub fn new(name: impl Into<String>, priority: i64, state: JobQueueState) -> Self {
        Self {
            name: name.into(),
            priority,
            state,
            compute_environment_order: Vec::new(),
            tags: BTreeMap::new(),
        }
    }

    pub fn with_compute_environment(mut self, compute_environment: impl Into<String>, order: i64) -> Self {
        self.compute_environment_order
            .push(ComputeEnvironmentOrder::new(compute_environment, order));
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// The full tag set to apply: provider defaults merged under resource tags.
    pub fn tags_all(&self, config: &TagsConfig) -> KeyValueTags {
        KeyValueTags::new(self.tags.clone())
            .merge_defaults(config)
            .ignore_config(&config.ignore_tags)
    }

    /// The compute environment order sorted ascending by order value.
    pub fn sorted_compute_environment_order(&self) -> Vec<ComputeEnvironmentOrder> {
        sorted(&self.compute_environment_order)
    }
}

/// Persisted state of a job queue.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobQueueModel {
    /// Resource id; the ARN once the queue exists
    pub id: String,
    pub arn: String,
    pub name: String,
    pub priority: i64,
    pub state: JobQueueState,
    #[serde(with = "order_list")]
    pub compute_environment_order: Vec<ComputeEnvironmentOrder>,
    /// Tags declared on the resource, excluding provider defaults
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Every tag on the queue, including provider defaults
    #[serde(default)]
    pub tags_all: BTreeMap<String, String>,
}

impl JobQueueModel {
    /// Builds the persisted state from a described queue.
    ///
    /// The compute environment order is sorted by order value; tags reserved
    /// by AWS and ignored tags are dropped.
    pub fn from_detail(id: impl Into<String>, mut detail: JobQueueDetail, config: &TagsConfig) -> Self {
        sort_compute_environment_order(&mut detail.compute_environment_order);

        let tags_all = KeyValueTags::new(detail.tags)
            .ignore_aws()
            .ignore_config(&config.ignore_tags);
        let tags = tags_all.remove_defaults(config);

        Self {
            id: id.into(),
            arn: detail.job_queue_arn,
            name: detail.job_queue_name,
            priority: detail.priority,
            state: detail.state,
            compute_environment_order: detail.compute_environment_order,
            tags: tags.into_map(),
            tags_all: tags_all.into_map(),
        }
    }

    /// Returns true if priority, state or compute environment order differ
    /// from the desired state. Tags are not considered.
    pub fn has_queue_changes(&self, spec: &JobQueueSpec) -> bool {
        self.priority != spec.priority
            || self.state != spec.state
            || sorted(&self.compute_environment_order) != spec.sorted_compute_environment_order()
    }

    /// The identifier used to address the queue in API calls.
    pub fn queue_identifier(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Sorts by order value, breaking ties by environment so equal sets compare equal.
fn sorted(entries: &[ComputeEnvironmentOrder]) -> Vec<ComputeEnvironmentOrder> {
    let mut entries = entries.to_vec();
    entries.sort_by(|a, b| {
        a.order
            .cmp(&b.order)
            .then_with(|| a.compute_environment.cmp(&b.compute_environment))
    });
    entries
}

/// Stores compute environment order entries as `{compute_environment, order}`.
mod order_list {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::types::ComputeEnvironmentOrder;

    #[derive(Serialize, Deserialize)]
    struct Entry {
        compute_environment: String,
        order: i64,
    }

    pub fn serialize<S: Serializer>(
        entries: &[ComputeEnvironmentOrder],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        entries
            .iter()
            .map(|e| Entry {
                compute_environment: e.compute_environment.clone(),
                order: e.order,
            })
            .collect::<Vec<_>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<ComputeEnvironmentOrder>, D::Error> {
        Ok(Vec::<Entry>::deserialize(deserializer)?
            .into_iter()
            .map(|e| ComputeEnvironmentOrder::new(e.compute_environment, e.order))
            .collect())
    }
}
