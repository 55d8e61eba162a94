use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

use crate::api::models::ContactId;

/// The five remote operations, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn failure_message(self) -> &'static str {
        match self {
            Operation::List => "Failed to fetch contacts",
            Operation::Get => "Failed to fetch contact",
            Operation::Create => "Failed to create contact",
            Operation::Update => "Failed to update contact",
            Operation::Delete => "Failed to delete contact",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.failure_message())
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{operation}: no contact with id {id}")]
    NotFound { operation: Operation, id: ContactId },

    #[error("{operation}")]
    Remote {
        operation: Operation,
        status: Option<StatusCode>,
        #[source]
        source: Option<reqwest::Error>,
    },
}

impl ApiError {
    pub fn status(operation: Operation, status: StatusCode) -> Self {
        ApiError::Remote { operation, status: Some(status), source: None }
    }

    pub fn transport(operation: Operation, source: reqwest::Error) -> Self {
        ApiError::Remote { operation, status: source.status(), source: Some(source) }
    }

    pub fn operation(&self) -> Operation {
        match self {
            ApiError::NotFound { operation, .. } | ApiError::Remote { operation, .. } => *operation,
        }
    }
}
