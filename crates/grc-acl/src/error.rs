// GRC ACL
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Error handling for the access control engine

use thiserror::Error;

/// Access control error types
#[derive(Error, Debug)]
pub enum AclError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Invalid permission table: {message}")]
    InvalidTable { message: String },

    #[error("Propagation mismatch: {role} on {model} {action}: expected {expected}, got {actual}")]
    PropagationMismatch {
        role: String,
        model: String,
        action: String,
        expected: bool,
        actual: bool,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl AclError {
    /// Get the error type identifier
    pub fn error_type(&self) -> &'static str {
        match self {
            AclError::NotFound { .. } => "not_found",
            AclError::Conflict { .. } => "conflict",
            AclError::Forbidden { .. } => "forbidden",
            AclError::Validation { .. } => "validation",
            AclError::InvalidTable { .. } => "invalid_table",
            AclError::PropagationMismatch { .. } => "propagation_mismatch",
            AclError::Config { .. } => "config",
            AclError::Io(_) => "io_error",
            AclError::Json(_) => "json_error",
            AclError::Toml(_) => "toml_error",
        }
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        AclError::NotFound { message: message.into() }
    }

    pub(crate) fn conflict(message: impl Into<String>) -> Self {
        AclError::Conflict { message: message.into() }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        AclError::Validation { message: message.into() }
    }

    pub(crate) fn invalid_table(message: impl Into<String>) -> Self {
        AclError::InvalidTable { message: message.into() }
    }
}

/// Result type for access control operations
pub type AclResult<T> = Result<T, AclError>;
