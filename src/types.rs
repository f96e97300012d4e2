//! AWS Batch job queue wire types.
//!
//! Request and response shapes for the job queue operations, using the
//! camelCase JSON field names of the AWS Batch REST API.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::JobQueueError;

/// Enablement state of a job queue.
///
/// A queue in the `DISABLED` state accepts no new jobs; jobs already
/// queued are allowed to finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobQueueState {
    #[default]
    Enabled,
    Disabled,
}

impl JobQueueState {
    /// Returns the API string for this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "ENABLED",
            Self::Disabled => "DISABLED",
        }
    }
}

impl fmt::Display for JobQueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobQueueState {
    type Err = JobQueueError;

    /// Parses a state case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("ENABLED") {
            Ok(Self::Enabled)
        } else if s.eq_ignore_ascii_case("DISABLED") {
            Ok(Self::Disabled)
        } else {
            Err(JobQueueError::validation(format!(
                "expected state to be one of [DISABLED ENABLED], got {}",
                s
            )))
        }
    }
}

/// Lifecycle status reported by the service for a job queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobQueueStatus {
    Creating,
    Updating,
    Deleting,
    Deleted,
    Valid,
    Invalid,
}

impl JobQueueStatus {
    /// Returns the API string for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creating => "CREATING",
            Self::Updating => "UPDATING",
            Self::Deleting => "DELETING",
            Self::Deleted => "DELETED",
            Self::Valid => "VALID",
            Self::Invalid => "INVALID",
        }
    }
}

impl fmt::Display for JobQueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a queue's compute environment order.
///
/// Environments with a lower `order` are tried first when jobs are dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeEnvironmentOrder {
    pub order: i64,
    pub compute_environment: String,
}

impl ComputeEnvironmentOrder {
    pub fn new(compute_environment: impl Into<String>, order: i64) -> Self {
        Self {
            order,
            compute_environment: compute_environment.into(),
        }
    }
}

/// Sorts a compute environment order list ascending by `order`.
///
/// The sort is stable, so entries sharing an order keep their relative position.
pub fn sort_compute_environment_order(entries: &mut [ComputeEnvironmentOrder]) {
    entries.sort_by_key(|entry| entry.order);
}

/// Request body for `CreateJobQueue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobQueueInput {
    pub job_queue_name: String,
    pub state: JobQueueState,
    pub priority: i64,
    pub compute_environment_order: Vec<ComputeEnvironmentOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

/// Response body for `CreateJobQueue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobQueueOutput {
    pub job_queue_name: String,
    pub job_queue_arn: String,
}

/// Request body for `UpdateJobQueue`.
///
/// Only the fields that are set are changed; disabling a queue sends the
/// state alone.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobQueueInput {
    pub job_queue: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<JobQueueState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_environment_order: Option<Vec<ComputeEnvironmentOrder>>,
}

impl UpdateJobQueueInput {
    /// Builds the request that only flips a queue to `DISABLED`.
    pub fn disable(job_queue: impl Into<String>) -> Self {
        Self {
            job_queue: job_queue.into(),
            state: Some(JobQueueState::Disabled),
            ..Default::default()
        }
    }
}

/// Response body for `UpdateJobQueue`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobQueueOutput {
    #[serde(default)]
    pub job_queue_name: Option<String>,
    #[serde(default)]
    pub job_queue_arn: Option<String>,
}

/// Request body for `DescribeJobQueues`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeJobQueuesInput {
    pub job_queues: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl DescribeJobQueuesInput {
    /// Describes a single queue by name or ARN.
    pub fn single(job_queue: impl Into<String>) -> Self {
        Self {
            job_queues: vec![job_queue.into()],
            next_token: None,
        }
    }
}

/// Response body for `DescribeJobQueues`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeJobQueuesOutput {
    #[serde(default)]
    pub job_queues: Vec<JobQueueDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// A job queue as described by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobQueueDetail {
    pub job_queue_name: String,
    pub job_queue_arn: String,
    pub state: JobQueueState,
    /// Missing while the service has not reported a status yet.
    #[serde(default)]
    pub status: Option<JobQueueStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
    pub priority: i64,
    #[serde(default)]
    pub compute_environment_order: Vec<ComputeEnvironmentOrder>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}
