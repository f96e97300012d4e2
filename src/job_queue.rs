//! The job queue resource lifecycle.
//!
//! [`JobQueueResource`] maps declared job queue state onto AWS Batch calls.
//! Every mutating call is followed by a status wait, because Batch applies
//! job queue changes asynchronously:
//!
//! - create: `CREATING`/`UPDATING` until `VALID`
//! - update: `UPDATING` until `VALID`, then tags are reconciled separately
//! - delete: disable and wait for `VALID`, then delete and wait for `DELETED`

use crate::client::{BatchClient, SharedBatchClient};
use crate::config::{ResourceConfig, WaitConfig};
use crate::error::JobQueueError;
use crate::model::{JobQueueModel, JobQueueSpec};
use crate::tags::{update_tags, KeyValueTags};
use crate::types::{
    CreateJobQueueInput, DescribeJobQueuesInput, JobQueueDetail, JobQueueStatus, UpdateJobQueueInput,
};
use crate::validation::validate_spec;
use crate::waiter::StatusWaiter;

/// Manages a single AWS Batch job queue.
pub struct JobQueueResource {
    client: SharedBatchClient,
    config: ResourceConfig,
}

impl JobQueueResource {
    /// Creates a resource with the default wait and tag configuration.
    pub fn new(client: SharedBatchClient) -> Self {
        Self::with_config(client, ResourceConfig::default())
    }

    pub fn with_config(client: SharedBatchClient, config: ResourceConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    /// Creates the queue and waits until it is `VALID`.
    ///
    /// # Returns
    ///
    /// The read-back state, whose id is the ARN returned by the create call.
    pub async fn create(&self, spec: &JobQueueSpec) -> Result<JobQueueModel, JobQueueError> {
        validate_spec(spec)?;

        let tags = spec.tags_all(&self.config.tags).ignore_aws();
        let input = CreateJobQueueInput {
            job_queue_name: spec.name.clone(),
            state: spec.state,
            priority: spec.priority,
            compute_environment_order: spec.compute_environment_order.clone(),
            tags: (!tags.is_empty()).then(|| tags.into_map()),
        };

        let output = self
            .client
            .create_job_queue(input)
            .await
            .map_err(|e| with_queue_name(e, &spec.name))?;

        self.waiter(
            [JobQueueStatus::Creating, JobQueueStatus::Updating],
            [JobQueueStatus::Valid],
        )
        .wait(|| refresh_status(self.client.as_ref(), &spec.name))
        .await
        .map_err(|e| e.with_wait_context("Error waiting for JobQueue state to be \"VALID\""))?;

        let arn = output.job_queue_arn;
        tracing::debug!(arn = %arn, name = %spec.name, "JobQueue created");

        self.read_back(&arn).await
    }

    /// Reads the queue addressed by `id` (a name or ARN).
    ///
    /// # Returns
    ///
    /// `None` if the queue no longer exists; the caller should forget it.
    pub async fn read(&self, id: &str) -> Result<Option<JobQueueModel>, JobQueueError> {
        let Some(detail) = find_job_queue(self.client.as_ref(), id).await? else {
            tracing::warn!(id = id, "Batch Job Queue not found, removing from state");
            return Ok(None);
        };

        Ok(Some(JobQueueModel::from_detail(id, detail, &self.config.tags)))
    }

    /// Moves the queue from `prior` to the desired state.
    ///
    /// The update call is only issued when priority, state or compute
    /// environment order changed. Tag differences are applied on their own.
    pub async fn update(
        &self,
        spec: &JobQueueSpec,
        prior: &JobQueueModel,
    ) -> Result<JobQueueModel, JobQueueError> {
        validate_spec(spec)?;
        if spec.name != prior.name {
            return Err(JobQueueError::validation(format!(
                "job queue name cannot change from {:?} to {:?}; the queue must be replaced",
                prior.name, spec.name
            )));
        }

        if prior.has_queue_changes(spec) {
            tracing::debug!(name = %spec.name, "Updating Batch Job Queue");
            let input = UpdateJobQueueInput {
                job_queue: spec.name.clone(),
                state: Some(spec.state),
                priority: Some(spec.priority),
                compute_environment_order: Some(spec.compute_environment_order.clone()),
            };
            self.client
                .update_job_queue(input)
                .await
                .map_err(|e| with_queue_name(e, &spec.name))?;

            self.waiter([JobQueueStatus::Updating], [JobQueueStatus::Valid])
                .wait(|| refresh_status(self.client.as_ref(), &spec.name))
                .await?;
        }

        let old_tags = KeyValueTags::new(prior.tags_all.clone());
        let new_tags = spec.tags_all(&self.config.tags);
        if old_tags != new_tags {
            update_tags(self.client.as_ref(), &prior.arn, &old_tags, &new_tags)
                .await
                .map_err(|e| prefix_context(e, "error updating tags"))?;
        }

        self.read_back(&prior.id).await
    }

    /// Disables the queue, waits, then deletes it and waits for `DELETED`.
    ///
    /// The delete call is never issued if disabling fails.
    pub async fn delete(&self, prior: &JobQueueModel) -> Result<(), JobQueueError> {
        let name = prior.queue_identifier();

        tracing::debug!(name = name, "Disabling Batch Job Queue");
        self.disable(name)
            .await
            .map_err(|e| prefix_context(e, &format!("error disabling Batch Job Queue ({})", name)))?;

        tracing::debug!(name = name, "Deleting Batch Job Queue");
        self.delete_disabled(name)
            .await
            .map_err(|e| prefix_context(e, &format!("error deleting Batch Job Queue ({})", name)))?;

        Ok(())
    }

    /// Imports an existing queue by ARN.
    pub async fn import(&self, arn: &str) -> Result<Option<JobQueueModel>, JobQueueError> {
        let seeded = JobQueueModel {
            id: arn.to_string(),
            arn: arn.to_string(),
            ..Default::default()
        };
        tracing::debug!(arn = arn, "Importing Batch Job Queue");
        self.read(&seeded.id).await
    }

    async fn disable(&self, name: &str) -> Result<(), JobQueueError> {
        self.client
            .update_job_queue(UpdateJobQueueInput::disable(name))
            .await
            .map_err(|e| with_queue_name(e, name))?;

        self.waiter([JobQueueStatus::Updating], [JobQueueStatus::Valid])
            .wait(|| refresh_status(self.client.as_ref(), name))
            .await?;
        Ok(())
    }

    async fn delete_disabled(&self, name: &str) -> Result<(), JobQueueError> {
        self.client
            .delete_job_queue(name)
            .await
            .map_err(|e| with_queue_name(e, name))?;

        // A disabled queue may still report VALID until the service starts deleting it.
        self.waiter(
            [JobQueueStatus::Valid, JobQueueStatus::Deleting],
            [JobQueueStatus::Deleted],
        )
        .wait(|| refresh_status(self.client.as_ref(), name))
        .await?;
        Ok(())
    }

    async fn read_back(&self, id: &str) -> Result<JobQueueModel, JobQueueError> {
        self.read(id).await?.ok_or_else(|| JobQueueError::ResourceNotFound {
            message: format!("Batch Job Queue ({}) disappeared while being reconciled", id),
            resource_id: Some(id.to_string()),
        })
    }

    fn waiter<const P: usize, const T: usize>(
        &self,
        pending: [JobQueueStatus; P],
        target: [JobQueueStatus; T],
    ) -> StatusWaiter<JobQueueStatus> {
        StatusWaiter::new(pending, target, self.wait_config())
    }

    fn wait_config(&self) -> WaitConfig {
        self.config.wait
    }
}

/// Looks up a single queue by name or ARN.
///
/// Returns `None` when the service knows no such queue and an
/// [`JobQueueError::AmbiguousName`] when more than one matches.
pub async fn find_job_queue(
    client: &dyn BatchClient,
    id: &str,
) -> Result<Option<JobQueueDetail>, JobQueueError> {
    let output = client
        .describe_job_queues(DescribeJobQueuesInput::single(id))
        .await?;

    let mut queues = output.job_queues;
    match queues.len() {
        0 => {
            tracing::debug!(id = id, "Job Queue is already gone");
            Ok(None)
        }
        1 => Ok(queues.pop()),
        count => Err(JobQueueError::AmbiguousName {
            name: id.to_string(),
            count,
        }),
    }
}

/// Fetches the current status of a queue; a missing queue reports `DELETED`.
pub async fn refresh_status(
    client: &dyn BatchClient,
    id: &str,
) -> Result<JobQueueStatus, JobQueueError> {
    match find_job_queue(client, id).await? {
        None => Ok(JobQueueStatus::Deleted),
        Some(detail) => detail.status.ok_or_else(|| {
            JobQueueError::api("DescribeJobQueues", id, "job queue reported no status")
        }),
    }
}

/// Makes sure an API error names the queue it was about.
fn with_queue_name(error: JobQueueError, name: &str) -> JobQueueError {
    match error {
        JobQueueError::Api {
            message,
            operation,
            aws_error,
            ..
        } => JobQueueError::Api {
            message,
            operation,
            resource_name: name.to_string(),
            aws_error,
        },
        other => other,
    }
}

/// Prefixes API and wait failures with operation context.
fn prefix_context(error: JobQueueError, context: &str) -> JobQueueError {
    match error {
        JobQueueError::Api {
            message,
            operation,
            resource_name,
            aws_error,
        } => JobQueueError::Api {
            message: format!("{}: {}", context, message),
            operation,
            resource_name,
            aws_error,
        },
        wait @ JobQueueError::WaitForState { .. } => wait.with_wait_context(context),
        other => other,
    }
}
