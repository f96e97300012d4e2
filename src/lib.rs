//! # AWS Batch Job Queue Resource
//!
//! Declarative lifecycle management for AWS Batch job queues: create, read,
//! update, delete and import, with the status polling that Batch's
//! asynchronous API requires.
//!
//! ## Overview
//!
//! A job queue is declared as a [`JobQueueSpec`] (name, priority, state,
//! compute environment order and tags). [`JobQueueResource`] turns that
//! declaration into the minimal set of Batch API calls and waits until the
//! service reports the queue as `VALID` before returning. The state handed
//! back after every operation is a [`JobQueueModel`], which is what an
//! orchestration engine persists between runs.
//!
//! ### Key Features
//!
//! - **Status Waits**: Every mutating call is followed by a bounded poll
//!   ([`StatusWaiter`]) with an initial delay, a minimum poll interval and an
//!   overall timeout.
//! - **Minimal Updates**: The update call is only issued when priority, state
//!   or compute environment order changed; tags are reconciled on their own.
//! - **Safe Deletes**: Queues are disabled and validated before deletion.
//! - **Stable Reads**: Compute environment order is always reported sorted by
//!   order value.
//! - **Tag Handling**: Provider default tags, AWS-reserved tags and ignored tags
//!   are handled the same way on every operation.
//!
//! ## Getting Started
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use aws_batch_job_queue::{HttpBatchClient, JobQueueResource, JobQueueSpec, JobQueueState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), aws_batch_job_queue::JobQueueError> {
//!     let client = Arc::new(HttpBatchClient::from_env().await?);
//!     let resource = JobQueueResource::new(client);
//!
//!     let spec = JobQueueSpec::new("analytics", 10, JobQueueState::Enabled)
//!         .with_compute_environment("arn:aws:batch:us-east-1:123456789012:compute-environment/spot", 0)
//!         .with_compute_environment("arn:aws:batch:us-east-1:123456789012:compute-environment/ondemand", 1)
//!         .with_tag("team", "data");
//!
//!     let created = resource.create(&spec).await?;
//!     println!("created {}", created.arn);
//!
//!     resource.delete(&created).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Status Waits
//!
//! | Operation | Pending | Target |
//! |---|---|---|
//! | create | `CREATING`, `UPDATING` | `VALID` |
//! | update | `UPDATING` | `VALID` |
//! | delete (disable phase) | `UPDATING` | `VALID` |
//! | delete (delete phase) | `VALID`, `DELETING` | `DELETED` |
//!
//! A queue that can no longer be described counts as `DELETED`. Waits default
//! to a 10 minute timeout, a 10 second initial delay and a 3 second minimum
//! interval; see [`WaitConfig`].

pub mod client;
pub mod config;
pub mod error;
pub mod job_queue;
pub mod model;
pub mod tags;
pub mod types;
pub mod validation;
pub mod waiter;

pub use client::{BatchClient, HttpBatchClient, SharedBatchClient};
pub use config::{BatchClientConfig, IgnoreTagsConfig, ResourceConfig, TagsConfig, WaitConfig};
pub use error::{AwsError, JobQueueError, WaitFailureKind};
pub use job_queue::JobQueueResource;
pub use model::{JobQueueModel, JobQueueSpec};
pub use tags::KeyValueTags;
pub use types::{ComputeEnvironmentOrder, JobQueueDetail, JobQueueState, JobQueueStatus};
pub use waiter::StatusWaiter;
