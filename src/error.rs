//! Error types for the AWS Batch job queue resource.
//!
//! This module defines the error hierarchy for the failure modes of the
//! job queue lifecycle: API call failures, status wait failures, data
//! integrity problems on lookup, and invalid desired state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for job queue operations.
#[derive(Debug, Error)]
pub enum JobQueueError {
    /// An AWS Batch API call failed.
    #[error("{operation} failed for job queue {resource_name:?}: {message}")]
    Api {
        /// Error message describing what went wrong
        message: String,
        /// The API operation that failed, e.g. `CreateJobQueue`
        operation: String,
        /// The job queue name or ARN the call targeted
        resource_name: String,
        /// Optional underlying AWS error details
        aws_error: Option<AwsError>,
    },

    /// Waiting for the queue to reach a target status failed.
    #[error("{message}: {kind} (last status: {last_status}, expected: {target})")]
    WaitForState {
        /// Context describing which wait failed
        message: String,
        /// Why the wait stopped
        kind: WaitFailureKind,
        /// The comma separated target statuses
        target: String,
        /// The last status observed before the wait stopped
        last_status: String,
        /// The refresh error, when the wait stopped because a lookup failed
        #[source]
        source: Option<Box<JobQueueError>>,
    },

    /// More than one job queue matched a single identifier.
    #[error("Multiple Job Queues with name {name} ({count} matches)")]
    AmbiguousName {
        /// The identifier that was looked up
        name: String,
        /// How many queues the lookup returned
        count: usize,
    },

    /// The desired state is invalid.
    #[error("Validation error: {message}")]
    Validation {
        /// Error message describing the validation failure
        message: String,
    },

    /// The service rejected the request because of rate limiting.
    #[error("Throttling error: {message}")]
    Throttling {
        /// Error message describing the throttling
        message: String,
        /// Suggested delay before retrying, if the service provided one
        retry_after_ms: Option<u64>,
    },

    /// The service reported that the addressed resource does not exist.
    #[error("Resource not found: {message}")]
    ResourceNotFound {
        /// Error message from the service
        message: String,
        /// The resource identifier, if known
        resource_id: Option<String>,
    },

    /// AWS credentials could not be resolved.
    #[error("Credentials error: {message}")]
    Credentials {
        /// Error message from the credentials provider
        message: String,
        /// Whether resolving credentials again may succeed
        is_retriable: bool,
    },

    /// A request could not be signed with SigV4.
    #[error("Signing error: {message}")]
    Signing {
        /// Error message describing the signing failure
        message: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {message}")]
    SerDes {
        /// Error message describing the serialization failure
        message: String,
    },
}

/// Why a status wait stopped without reaching its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitFailureKind {
    /// The timeout elapsed before a target status was observed.
    Timeout,
    /// A status that is neither pending nor a target was observed.
    UnexpectedState,
    /// The status lookup itself failed.
    RefreshFailed,
}

impl std::fmt::Display for WaitFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout while waiting for state"),
            Self::UnexpectedState => write!(f, "unexpected state"),
            Self::RefreshFailed => write!(f, "status refresh failed"),
        }
    }
}

impl JobQueueError {
    /// Creates a new Api error without AWS error details.
    pub fn api(
        operation: impl Into<String>,
        resource_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Api {
            message: message.into(),
            operation: operation.into(),
            resource_name: resource_name.into(),
            aws_error: None,
        }
    }

    /// Creates a new Validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new Credentials error.
    pub fn credentials(message: impl Into<String>, is_retriable: bool) -> Self {
        Self::Credentials {
            message: message.into(),
            is_retriable,
        }
    }

    /// Creates a new Signing error.
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }

    /// Creates a new SerDes error.
    pub fn serdes(message: impl Into<String>) -> Self {
        Self::SerDes {
            message: message.into(),
        }
    }

    /// Replaces the context message of a wait failure, leaving other errors untouched.
    pub fn with_wait_context(self, context: impl Into<String>) -> Self {
        match self {
            Self::WaitForState {
                kind,
                target,
                last_status,
                source,
                ..
            } => Self::WaitForState {
                message: context.into(),
                kind,
                target,
                last_status,
                source,
            },
            other => other,
        }
    }

    /// Returns true if this error came from a status wait.
    pub fn is_wait_failure(&self) -> bool {
        matches!(self, Self::WaitForState { .. })
    }

    /// Returns true if a status wait ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::WaitForState {
                kind: WaitFailureKind::Timeout,
                ..
            }
        )
    }

    /// Returns true if a status wait observed a status outside the pending and target sets.
    pub fn is_unexpected_state(&self) -> bool {
        matches!(
            self,
            Self::WaitForState {
                kind: WaitFailureKind::UnexpectedState,
                ..
            }
        )
    }

    /// Returns true if this is an API call failure.
    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    /// Returns true if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns true if this is a throttling error.
    pub fn is_throttling(&self) -> bool {
        matches!(self, Self::Throttling { .. })
    }

    /// Returns true if the service reported the resource as missing.
    pub fn is_resource_not_found(&self) -> bool {
        matches!(self, Self::ResourceNotFound { .. })
    }

    /// Returns true if AWS credentials could not be resolved.
    pub fn is_credentials(&self) -> bool {
        matches!(self, Self::Credentials { .. })
    }

    /// Returns true if retrying the same call may succeed.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Credentials { is_retriable, .. } => *is_retriable,
            Self::Throttling { .. } => true,
            _ => false,
        }
    }

    /// Returns true if the lookup matched more than one queue.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::AmbiguousName { .. })
    }

    /// Returns the retry-after hint of a throttling error.
    pub fn get_retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::Throttling { retry_after_ms, .. } => *retry_after_ms,
            _ => None,
        }
    }
}

/// AWS error details attached to API failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsError {
    /// The AWS error code, e.g. `ClientException`
    pub code: String,
    /// The AWS error message
    pub message: String,
    /// The request ID if available
    pub request_id: Option<String>,
}

impl From<serde_json::Error> for JobQueueError {
    fn from(error: serde_json::Error) -> Self {
        Self::SerDes {
            message: error.to_string(),
        }
    }
}
