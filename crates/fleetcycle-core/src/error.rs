//! Error types for a maintenance run.

use std::time::Duration;

use thiserror::Error;

use crate::types::{CommandStatus, InstanceId};

/// Result type alias for provider collaborator calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failure reported by a cloud collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The addressed resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other API or transport failure.
    #[error("api error: {0}")]
    Api(String),
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }
}

/// Result type alias for orchestration operations.
pub type CycleResult<T> = Result<T, CycleError>;

/// Errors that abort a maintenance run.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("{op} failed for {target}: {source}")]
    Provider {
        op: &'static str,
        target: String,
        #[source]
        source: ProviderError,
    },

    #[error("{op} for {target} did not answer within {timeout:?}")]
    ApiTimeout {
        op: &'static str,
        target: String,
        timeout: Duration,
    },

    #[error("remote-command agent of instance {instance} has not been started or activated")]
    AgentNotRegistered { instance: InstanceId },

    #[error("instance {instance} is not online for remote command (ping status {ping_status})")]
    AgentOffline {
        instance: InstanceId,
        ping_status: String,
    },

    #[error("command {command_id} on instance {instance} ended with status {status}")]
    CommandFailed {
        instance: InstanceId,
        command_id: String,
        status: CommandStatus,
    },

    #[error("run exceeded its deadline of {budget:?}")]
    DeadlineExceeded { budget: Duration },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CycleError {
    /// Wrap a provider failure with the operation and resource it addressed.
    pub fn provider(op: &'static str, target: impl Into<String>, source: ProviderError) -> Self {
        CycleError::Provider {
            op,
            target: target.into(),
            source,
        }
    }

    /// Whether this wraps a provider "does not exist" answer.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CycleError::Provider { source, .. } if source.is_not_found())
    }
}
