//! Doctor-State: persistence for diagnostic sessions and reports
//!
//! This crate is the persistence collaborator of the diagnostic engine. It
//! defines the records that cross the storage boundary and the
//! [`DiagnosticStore`] trait, with two implementations:
//!
//! - [`fakes::MemoryDiagnosticStore`]: in-process store for tests
//! - [`SurrealDiagnosticStore`]: SurrealDB backend (`mem://`, `surrealkv://`, `ws(s)://`)
//!
//! ## Layer 0 - Data/Persistence
//!
//! Every write is a single-record atomic operation. Cross-record ordering
//! (report before session completion) is the caller's responsibility.

mod config;
mod error;
pub mod fakes;
pub mod migrations;
mod schema;
pub mod storage_traits;
pub mod surreal_store;

pub use config::StoreConfig;
pub use error::{StateError, StorageError};
pub use storage_traits::{
    AccessLevel, DiagnosticReport, DiagnosticSession, DiagnosticStore, ReportFinding, ReportId,
    SessionId, SessionStatus, SessionType, Severity, StorageResult,
};
pub use surreal_store::SurrealDiagnosticStore;

/// Result type for doctor-state connection and schema operations
pub type Result<T> = std::result::Result<T, StateError>;
