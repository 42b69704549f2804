//! Core error types for Admin RS

use std::collections::BTreeMap;
use thiserror::Error;

/// Core error type for all service operations
#[derive(Error, Debug)]
pub enum AdminError {
    #[error("{entity} with {field}={value} not found")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AdminError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl ToString) -> Self {
        AdminError::NotFound {
            entity,
            field,
            value: value.to_string(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AdminError::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AdminError::Forbidden {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AdminError::Conflict {
            message: message.into(),
        }
    }

    /// Single-field validation failure
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        AdminError::Validation(errors)
    }

    pub fn status_code(&self) -> u16 {
        match self {
            AdminError::NotFound { .. } => 404,
            AdminError::Unauthorized { .. } => 401,
            AdminError::Forbidden { .. } => 403,
            AdminError::Validation(_) => 422,
            AdminError::Conflict { .. } => 409,
            AdminError::Database(_) | AdminError::Internal(_) | AdminError::Config(_) => 500,
        }
    }
}

/// Validation errors collection
///
/// Field errors are kept in a sorted map so rendered messages are stable.
#[derive(Error, Debug, Default, Clone, PartialEq, Eq)]
#[error("{}", self.full_messages().join(", "))]
pub struct ValidationErrors {
    /// field_name -> Vec<error_messages>
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn full_messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .flat_map(|(field, messages)| {
                messages.iter().map(move |msg| format!("{} {}", field, msg))
            })
            .collect()
    }
}

impl From<validator::ValidationErrors> for ValidationErrors {
    fn from(source: validator::ValidationErrors) -> Self {
        let mut errors = ValidationErrors::new();
        for (field, field_errors) in source.field_errors() {
            for error in field_errors {
                let message = match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("is invalid ({})", error.code),
                };
                errors.add(field.to_string(), message);
            }
        }
        errors
    }
}
