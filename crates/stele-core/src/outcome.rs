//! Command outcome envelope shared by the CLI and other embedders.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diagnostics::commands;
use crate::engine::StorageError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub status: CommandStatus,
    pub message: String,
    #[serde(default)]
    pub details: Value,
}

impl ExecutionOutcome {
    pub fn success(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::Ok,
            message: message.into(),
            details,
        }
    }

    pub fn user_error(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::UserError,
            message: message.into(),
            details,
        }
    }

    pub fn failure(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::Failure,
            message: message.into(),
            details,
        }
    }

    /// Classifies an error: bad input and lookups that found nothing are user
    /// errors, a damaged or incompatible store is a failure.
    pub fn from_error(err: &anyhow::Error) -> Self {
        let (code, status) = match err.downcast_ref::<StorageError>() {
            Some(storage) => {
                let status = match storage {
                    StorageError::IndexCorrupt(_)
                    | StorageError::BrokenPath { .. }
                    | StorageError::MissingMeta(_)
                    | StorageError::IncompatibleFormat { .. } => CommandStatus::Failure,
                    _ => CommandStatus::UserError,
                };
                (storage.code(), status)
            }
            None => (commands::GENERIC, CommandStatus::Failure),
        };
        Self {
            status,
            message: format!("{err:#}"),
            details: serde_json::json!({ "code": code }),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.status {
            CommandStatus::Ok => 0,
            CommandStatus::UserError => 1,
            CommandStatus::Failure => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommandStatus {
    Ok,
    UserError,
    Failure,
}
