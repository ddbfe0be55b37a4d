//! Error types for doctor-state

use thiserror::Error;

/// Errors raised while connecting to or preparing the database
#[derive(Error, Debug)]
pub enum StateError {
    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Query(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),
}

impl From<surrealdb::Error> for StateError {
    fn from(err: surrealdb::Error) -> Self {
        StateError::Query(err.to_string())
    }
}

/// Errors returned by [`crate::DiagnosticStore`] operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// No session with this ID exists
    #[error("diagnostic session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// A session with this ID was already saved
    #[error("diagnostic session already exists: {session_id}")]
    DuplicateSession { session_id: String },

    /// A report with this ID was already saved
    #[error("diagnostic report already exists: {report_id}")]
    DuplicateReport { report_id: String },

    /// The session is not in the state the transition requires
    #[error("diagnostic session {session_id} is {status}, expected {expected}")]
    InvalidSessionState {
        session_id: String,
        status: String,
        expected: String,
    },

    /// Backend failure (query, decode, lock poisoning)
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<StateError> for StorageError {
    fn from(err: StateError) -> Self {
        StorageError::Backend(err.to_string())
    }
}
