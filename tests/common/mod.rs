//! Shared test utilities for integration tests.
//!
//! Provides an in-memory Batch service that moves job queues through their
//! lifecycle statuses the way AWS Batch does, plus proptest strategies for
//! desired state.

#![allow(dead_code)] // These utilities are used by other integration test files

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use aws_batch_job_queue::client::BatchClient;
use aws_batch_job_queue::types::{
    CreateJobQueueInput, CreateJobQueueOutput, DescribeJobQueuesInput, DescribeJobQueuesOutput,
    UpdateJobQueueInput, UpdateJobQueueOutput,
};
use aws_batch_job_queue::{
    ComputeEnvironmentOrder, JobQueueDetail, JobQueueError, JobQueueSpec, JobQueueState,
    JobQueueStatus,
};
use proptest::prelude::*;

pub const ACCOUNT_ARN_PREFIX: &str = "arn:aws:batch:us-east-1:123456789012:job-queue/";

/// Operation names in the order the fake received them.
pub type CallLog = Vec<String>;

struct FakeQueue {
    detail: JobQueueDetail,
    /// Describes left before a transitional status settles
    settle_after: usize,
    /// Status the queue settles into
    settles_to: JobQueueStatus,
}

/// An in-memory AWS Batch job queue service.
///
/// Transitional statuses (`CREATING`, `UPDATING`, `DELETING`) settle after a
/// configurable number of describes. Compute environment order is returned
/// reversed to exercise client-side sorting.
pub struct FakeBatchService {
    queues: Mutex<Vec<FakeQueue>>,
    calls: Mutex<CallLog>,
    settle_after: usize,
    stuck: bool,
}

impl FakeBatchService {
    pub fn new() -> Self {
        Self::with_settle_after(2)
    }

    /// Transitional statuses settle after `describes` describe calls.
    pub fn with_settle_after(describes: usize) -> Self {
        Self {
            queues: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            settle_after: describes,
            stuck: false,
        }
    }

    /// A service whose transitional statuses never settle.
    pub fn stuck() -> Self {
        Self {
            stuck: true,
            ..Self::new()
        }
    }

    /// Inserts a queue directly, bypassing the create call.
    pub fn seed(&self, detail: JobQueueDetail) {
        self.queues.lock().unwrap().push(FakeQueue {
            detail,
            settle_after: 0,
            settles_to: JobQueueStatus::Valid,
        });
    }

    pub fn calls(&self) -> CallLog {
        self.calls.lock().unwrap().clone()
    }

    /// Calls other than describes.
    pub fn mutating_calls(&self) -> CallLog {
        self.calls()
            .into_iter()
            .filter(|c| c != "DescribeJobQueues")
            .collect()
    }

    pub fn tags_of(&self, name: &str) -> Option<BTreeMap<String, String>> {
        self.queues
            .lock()
            .unwrap()
            .iter()
            .find(|q| q.detail.job_queue_name == name)
            .map(|q| q.detail.tags.clone())
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn transition(&self, queue: &mut FakeQueue, status: JobQueueStatus, settles_to: JobQueueStatus) {
        queue.detail.status = Some(status);
        queue.settle_after = self.settle_after;
        queue.settles_to = settles_to;
    }

    fn matches(detail: &JobQueueDetail, id: &str) -> bool {
        detail.job_queue_name == id || detail.job_queue_arn == id
    }
}

#[async_trait]
impl BatchClient for FakeBatchService {
    async fn create_job_queue(
        &self,
        input: CreateJobQueueInput,
    ) -> Result<CreateJobQueueOutput, JobQueueError> {
        self.record("CreateJobQueue");
        let mut queues = self.queues.lock().unwrap();
        if queues.iter().any(|q| q.detail.job_queue_name == input.job_queue_name) {
            return Err(JobQueueError::api(
                "CreateJobQueue",
                &input.job_queue_name,
                "Object already exists",
            ));
        }

        let arn = format!("{}{}", ACCOUNT_ARN_PREFIX, input.job_queue_name);
        let mut order = input.compute_environment_order;
        order.reverse();
        let mut queue = FakeQueue {
            detail: JobQueueDetail {
                job_queue_name: input.job_queue_name.clone(),
                job_queue_arn: arn.clone(),
                state: input.state,
                status: None,
                status_reason: None,
                priority: input.priority,
                compute_environment_order: order,
                tags: input.tags.unwrap_or_default(),
            },
            settle_after: 0,
            settles_to: JobQueueStatus::Valid,
        };
        self.transition(&mut queue, JobQueueStatus::Creating, JobQueueStatus::Valid);
        queues.push(queue);

        Ok(CreateJobQueueOutput {
            job_queue_name: input.job_queue_name,
            job_queue_arn: arn,
        })
    }

    async fn update_job_queue(
        &self,
        input: UpdateJobQueueInput,
    ) -> Result<UpdateJobQueueOutput, JobQueueError> {
        self.record("UpdateJobQueue");
        let mut queues = self.queues.lock().unwrap();
        let Some(queue) = queues.iter_mut().find(|q| Self::matches(&q.detail, &input.job_queue)) else {
            return Err(JobQueueError::api("UpdateJobQueue", &input.job_queue, "Job queue not found"));
        };

        if let Some(state) = input.state {
            queue.detail.state = state;
        }
        if let Some(priority) = input.priority {
            queue.detail.priority = priority;
        }
        if let Some(mut order) = input.compute_environment_order {
            order.reverse();
            queue.detail.compute_environment_order = order;
        }
        let (name, arn) = (queue.detail.job_queue_name.clone(), queue.detail.job_queue_arn.clone());
        self.transition(queue, JobQueueStatus::Updating, JobQueueStatus::Valid);

        Ok(UpdateJobQueueOutput {
            job_queue_name: Some(name),
            job_queue_arn: Some(arn),
        })
    }

    async fn delete_job_queue(&self, job_queue: &str) -> Result<(), JobQueueError> {
        self.record("DeleteJobQueue");
        let mut queues = self.queues.lock().unwrap();
        let Some(queue) = queues.iter_mut().find(|q| Self::matches(&q.detail, job_queue)) else {
            return Err(JobQueueError::api("DeleteJobQueue", job_queue, "Job queue not found"));
        };
        if queue.detail.state != JobQueueState::Disabled {
            return Err(JobQueueError::api(
                "DeleteJobQueue",
                job_queue,
                "Cannot delete, found existing JobQueue in ENABLED state",
            ));
        }
        self.transition(queue, JobQueueStatus::Deleting, JobQueueStatus::Deleted);
        Ok(())
    }

    async fn describe_job_queues(
        &self,
        input: DescribeJobQueuesInput,
    ) -> Result<DescribeJobQueuesOutput, JobQueueError> {
        self.record("DescribeJobQueues");
        let mut queues = self.queues.lock().unwrap();

        let mut found = Vec::new();
        for queue in queues.iter_mut() {
            if !input.job_queues.iter().any(|id| Self::matches(&queue.detail, id)) {
                continue;
            }
            found.push(queue.detail.clone());
            if !self.stuck {
                if queue.settle_after > 0 {
                    queue.settle_after -= 1;
                } else {
                    queue.detail.status = Some(queue.settles_to);
                }
            }
        }
        queues.retain(|q| q.detail.status != Some(JobQueueStatus::Deleted));

        Ok(DescribeJobQueuesOutput {
            job_queues: found,
            next_token: None,
        })
    }

    async fn tag_resource(
        &self,
        resource_arn: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<(), JobQueueError> {
        self.record("TagResource");
        let mut queues = self.queues.lock().unwrap();
        let queue = queues
            .iter_mut()
            .find(|q| q.detail.job_queue_arn == resource_arn)
            .ok_or_else(|| JobQueueError::api("TagResource", resource_arn, "Resource not found"))?;
        queue
            .detail
            .tags
            .extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    async fn untag_resource(
        &self,
        resource_arn: &str,
        tag_keys: &[String],
    ) -> Result<(), JobQueueError> {
        self.record("UntagResource");
        let mut queues = self.queues.lock().unwrap();
        let queue = queues
            .iter_mut()
            .find(|q| q.detail.job_queue_arn == resource_arn)
            .ok_or_else(|| JobQueueError::api("UntagResource", resource_arn, "Resource not found"))?;
        for key in tag_keys {
            queue.detail.tags.remove(key);
        }
        Ok(())
    }
}

/// A described queue in the `VALID` status.
pub fn valid_detail(name: &str, order: Vec<ComputeEnvironmentOrder>) -> JobQueueDetail {
    JobQueueDetail {
        job_queue_name: name.to_string(),
        job_queue_arn: format!("{}{}", ACCOUNT_ARN_PREFIX, name),
        state: JobQueueState::Enabled,
        status: Some(JobQueueStatus::Valid),
        status_reason: None,
        priority: 1,
        compute_environment_order: order,
        tags: BTreeMap::new(),
    }
}

/// Strategy for valid queue names.
pub fn name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9_-]{0,40}"
}

/// Strategy for 1 to 3 compute environments with distinct order values.
pub fn compute_environment_order_strategy() -> impl Strategy<Value = Vec<ComputeEnvironmentOrder>> {
    prop::collection::btree_set(0i64..100, 1..=3)
        .prop_flat_map(|orders| {
            let len = orders.len();
            (Just(orders), prop::collection::vec("[a-z]{1,8}", len))
        })
        .prop_flat_map(|(orders, names)| {
            let entries: Vec<ComputeEnvironmentOrder> = orders
                .into_iter()
                .zip(names)
                .enumerate()
                .map(|(i, (order, name))| ComputeEnvironmentOrder::new(format!("ce-{i}-{name}"), order))
                .collect();
            Just(entries).prop_shuffle()
        })
}

/// Strategy for small tag maps without reserved keys.
pub fn tags_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[a-z]{1,8}", "[a-zA-Z0-9]{0,8}", 0..4)
}

/// Strategy for complete valid desired states.
pub fn spec_strategy() -> impl Strategy<Value = JobQueueSpec> {
    (
        name_strategy(),
        0i64..1000,
        prop_oneof![Just(JobQueueState::Enabled), Just(JobQueueState::Disabled)],
        compute_environment_order_strategy(),
        tags_strategy(),
    )
        .prop_map(|(name, priority, state, order, tags)| JobQueueSpec {
            name,
            priority,
            state,
            compute_environment_order: order,
            tags,
        })
}
