//! Error types for reconciliation.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Faults raised by a remote accessor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The addressed resource does not exist remotely.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote service rejected the call.
    #[error("service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// The call never produced a response (connect, timeout, ...).
    #[error("transport: {0}")]
    Transport(String),

    /// The response could not be decoded into the expected record.
    #[error("decode: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }
}

/// Remote operations a reconciler can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Lookup,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Lookup => "lookup",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error-kind tag carried by every [`ReconcileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    RemoteAccess,
    CapabilityMissing,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::RemoteAccess => "remote_access",
            ErrorKind::CapabilityMissing => "capability_missing",
        }
    }
}

/// Errors that abort a reconciliation.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Missing or invalid input, detected before any remote call.
    #[error("invalid value for '{field}': {reason}")]
    Configuration { field: &'static str, reason: String },

    /// A remote call failed. Never retried at this layer.
    #[error("Encountered fatal error calling {operation} for {kind} '{key}': {source}")]
    RemoteAccess {
        operation: Operation,
        kind: &'static str,
        key: String,
        #[source]
        source: RemoteError,
    },

    /// A backend was requested that this build or configuration cannot provide.
    #[error("capability missing: {0}")]
    CapabilityMissing(String),
}

impl ReconcileError {
    pub fn config(field: &'static str, reason: impl Into<String>) -> Self {
        ReconcileError::Configuration {
            field,
            reason: reason.into(),
        }
    }

    pub fn remote(
        operation: Operation,
        kind: &'static str,
        key: impl Into<String>,
        source: RemoteError,
    ) -> Self {
        ReconcileError::RemoteAccess {
            operation,
            kind,
            key: key.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ReconcileError::Configuration { .. } => ErrorKind::Configuration,
            ReconcileError::RemoteAccess { .. } => ErrorKind::RemoteAccess,
            ReconcileError::CapabilityMissing(_) => ErrorKind::CapabilityMissing,
        }
    }
}

/// Result type for reconciliation.
pub type Result<T> = std::result::Result<T, ReconcileError>;
