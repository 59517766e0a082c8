use sqlx;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Role;
use crate::donation::Status;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Represents an SQL error.
    #[error("SQLx error")]
    Sqlx { source: sqlx::Error },

    /// Represents an ID that could not be parsed.
    #[error("Invalid ID: {0}")]
    InvalidId(String),

    /// Represents an ID no donation carries.
    #[error("No donation with ID {0}")]
    NonExistentId(Uuid),

    /// Represents a creation-time validation failure.
    #[error("Invalid donation: {source}")]
    InvalidDonation {
        #[from]
        source: ValidationError,
    },

    /// Represents an actor attempting an action its role does not allow.
    #[error("A {role} may not {action}")]
    NotPermitted { role: Role, action: &'static str },

    /// Represents a conditional write that found the donation in a different
    /// status than expected.
    #[error("Donation {id} is no longer {expected}")]
    StatusConflict { id: Uuid, expected: Status },

    /// Represents a claim on a donation whose deadline has passed.
    #[error("Donation {0} has expired")]
    Expired(Uuid),

    /// Represents a transition the lifecycle does not define.
    #[error("Cannot move a donation from {from} to {to}")]
    IllegalTransition { from: Status, to: Status },

    /// Represents an unrecognized filter parameter.
    #[error("Unrecognized {field} filter: {value}")]
    InvalidFilter { field: &'static str, value: String },

    /// Represents a stored value outside the closed vocabulary.
    #[error("Unrecognized {column} value in the database: {value}")]
    UnrecognizedValue {
        column: &'static str,
        value: String,
    },
}

/// Enumerates creation-time input errors. These block the request at the
/// boundary, before any persistence call.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    MissingField(&'static str),

    #[error("quantity must be greater than zero, got {0}")]
    NonPositiveQuantity(f64),

    #[error("availableUntil must be in the future")]
    DeadlineNotInFuture,
}

/// Enumerates errors returned by the email subsystem. These are always
/// absorbed at the point of delivery and never affect a committed donation.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Represents a failure to reach the email service.
    #[error("Failed to reach the email service")]
    Request { source: reqwest::Error },

    /// Represents a message the email service refused.
    #[error("Email service rejected the message (status {status})")]
    Rejected { status: u16 },
}
