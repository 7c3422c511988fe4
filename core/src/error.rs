//! Error types for the task API client.
//!
//! # Design
//! Every non-2xx response collapses into `RequestFailed`, tagged with the
//! operation that failed and the status code. The display string doubles as
//! the message shown in the error banner, so it is written for end users.

use std::fmt;

use thiserror::Error;

/// The API operation a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Create,
    Update,
    Delete,
}

impl Operation {
    /// Human-readable failure message for this operation.
    pub fn failure_message(self) -> &'static str {
        match self {
            Operation::List => "Failed to load tasks",
            Operation::Create => "Failed to create task",
            Operation::Update => "Failed to update task",
            Operation::Delete => "Failed to delete task",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::List => "list",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Errors returned by `TaskClient` parse methods and by hosts executing
/// requests on its behalf.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server answered with a status outside `200..=299`.
    #[error("{} (HTTP {status})", .op.failure_message())]
    RequestFailed { op: Operation, status: u16 },

    /// A 2xx response body could not be deserialized into the expected type.
    #[error("{}: malformed response ({message})", .op.failure_message())]
    Deserialization { op: Operation, message: String },

    /// The request payload could not be serialized to JSON.
    #[error("{}: could not encode request ({message})", .op.failure_message())]
    Serialization { op: Operation, message: String },

    /// The host could not complete the round-trip at all.
    #[error("{}: {message}", .op.failure_message())]
    Transport { op: Operation, message: String },
}

impl ApiError {
    pub fn operation(&self) -> Operation {
        match self {
            ApiError::RequestFailed { op, .. }
            | ApiError::Deserialization { op, .. }
            | ApiError::Serialization { op, .. }
            | ApiError::Transport { op, .. } => *op,
        }
    }

    /// Status code of a rejected request, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}
