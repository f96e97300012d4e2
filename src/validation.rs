//! Validation of desired job queue state.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::JobQueueError;
use crate::model::JobQueueSpec;
use crate::types::ComputeEnvironmentOrder;

/// Most compute environments a single queue may reference.
pub const MAX_COMPUTE_ENVIRONMENTS: usize = 3;

static BATCH_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-zA-Z][0-9a-zA-Z_\-]{0,127}$").expect("valid regex"));

/// Checks an AWS Batch resource name.
///
/// Names are up to 128 letters, numbers, underscores and dashes and must start
/// with a letter or number.
pub fn validate_batch_name(name: &str) -> Result<(), JobQueueError> {
    if BATCH_NAME.is_match(name) {
        Ok(())
    } else {
        Err(JobQueueError::validation(format!(
            "\"name\" ({:?}) must be up to 128 letters (uppercase and lowercase), numbers, \
             underscores and dashes, and must start with an alphanumeric.",
            name
        )))
    }
}

/// Checks a compute environment order list: 1 to 3 entries, each with a
/// non-empty environment and a non-negative order.
pub fn validate_compute_environment_order(
    entries: &[ComputeEnvironmentOrder],
) -> Result<(), JobQueueError> {
    if entries.is_empty() {
        return Err(JobQueueError::validation(
            "\"compute_environment_order\" requires at least 1 item",
        ));
    }
    if entries.len() > MAX_COMPUTE_ENVIRONMENTS {
        return Err(JobQueueError::validation(format!(
            "\"compute_environment_order\" supports at most {} items, got {}",
            MAX_COMPUTE_ENVIRONMENTS,
            entries.len()
        )));
    }

    let mut seen = HashSet::new();
    for entry in entries {
        if entry.compute_environment.is_empty() {
            return Err(JobQueueError::validation(
                "\"compute_environment\" must not be empty",
            ));
        }
        if entry.order < 0 {
            return Err(JobQueueError::validation(format!(
                "expected \"order\" to be at least (0), got {}",
                entry.order
            )));
        }
        if !seen.insert(entry.order) {
            tracing::warn!(
                order = entry.order,
                compute_environment = %entry.compute_environment,
                "Duplicate compute environment order value"
            );
        }
    }
    Ok(())
}

/// Validates a full desired state.
pub fn validate_spec(spec: &JobQueueSpec) -> Result<(), JobQueueError> {
    validate_batch_name(&spec.name)?;
    validate_compute_environment_order(&spec.compute_environment_order)
}
