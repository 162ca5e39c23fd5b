//! Error types for the export pipeline.

use crate::models::UserId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MigrationError>;

/// Every way the pipeline can reject a dump. None of them are recoverable:
/// the operator fixes the source data and re-runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MigrationError {
    /// Statement starts with `INSERT INTO` but carries no backtick-quoted table name
    #[error("Malformed INSERT statement (no table name): {snippet}")]
    MalformedStatement { snippet: String },

    /// Value list could not be tokenized, or a row has the wrong shape
    #[error("Failed to decode row {row} of table {table}: {message}")]
    TupleDecode {
        table: String,
        row: usize,
        message: String,
    },

    /// Two rows in `users` share a primary key
    #[error("Duplicate user id {id} in table {table}")]
    DuplicateKey { table: String, id: UserId },

    /// A relationship row points at an id that is not in the registry
    #[error("Row {row} of table {table} references unknown user id {id}")]
    UnknownUserReference {
        table: String,
        row: usize,
        id: UserId,
    },

    /// A required table has no INSERT statement in the dump
    #[error("Required table {0} not found in dump")]
    MissingTable(String),

    /// Usernames must be unique for the email rename to be collision free
    #[error("Username {username} is used by both user {first} and user {second}")]
    DuplicateUsername {
        username: String,
        first: UserId,
        second: UserId,
    },

    /// A renamed email landed on an address another account already owns
    #[error("Email {email} of user {id} collides with another account after renaming")]
    EmailCollision { email: String, id: UserId },
}

impl MigrationError {
    pub fn tuple_decode(table: impl Into<String>, row: usize, message: impl Into<String>) -> Self {
        MigrationError::TupleDecode {
            table: table.into(),
            row,
            message: message.into(),
        }
    }

    pub fn unknown_user(table: impl Into<String>, row: usize, id: UserId) -> Self {
        MigrationError::UnknownUserReference {
            table: table.into(),
            row,
            id,
        }
    }
}
