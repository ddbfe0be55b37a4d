//! SurrealDB schema initialization
//!
//! Defines the diagnostic tables with their unique and lookup indexes.
//! Safe to call multiple times (idempotent).

use crate::error::StateError;
use crate::Result;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

/// Initialize all diagnostic tables
pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    info!("Initializing diagnostic schema");

    init_sessions_table(db).await?;
    init_reports_table(db).await?;

    info!("Diagnostic schema initialization complete");
    Ok(())
}

/// Initialize `diagnostic_sessions`
///
/// Schema:
/// ```text
/// TABLE diagnostic_sessions {
///   session_id:     STRING (unique)
///   stack_id:       STRING (indexed)
///   session_type:   STRING (self_requested | routine | anomaly_triggered | operator_initiated)
///   access_level:   STRING (structural | content | full)
///   status:         STRING (active | completed | cancelled)
///   consent_given:  BOOL
///   started_at:     DATETIME (indexed)
///   completed_at:   DATETIME?
/// }
/// ```
///
/// Status transitions (active → completed | cancelled) are enforced by the
/// conditional UPDATE in the store, not by the schema.
async fn init_sessions_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing diagnostic_sessions table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS diagnostic_sessions
            SCHEMALESS
            PERMISSIONS
                FOR select FULL
                FOR create FULL
                FOR update FULL
                FOR delete NONE;

        DEFINE INDEX IF NOT EXISTS idx_session_id ON TABLE diagnostic_sessions
            COLUMNS session_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_session_stack ON TABLE diagnostic_sessions
            COLUMNS stack_id, started_at;
    "#;

    db.query(sql)
        .await
        .and_then(|res| res.check())
        .map_err(|e| StateError::SchemaSetup(e.to_string()))?;
    debug!("diagnostic_sessions table initialized");
    Ok(())
}

/// Initialize `diagnostic_reports`
///
/// Schema:
/// ```text
/// TABLE diagnostic_reports {
///   report_id:   STRING (unique)
///   stack_id:    STRING (indexed)
///   session_id:  STRING (indexed, references diagnostic_sessions.session_id)
///   findings:    ARRAY<OBJECT>
///   summary:     STRING
///   created_at:  DATETIME (indexed)
/// }
/// ```
///
/// Reports are immutable: updates and deletes are not permitted.
async fn init_reports_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing diagnostic_reports table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS diagnostic_reports
            SCHEMALESS
            PERMISSIONS
                FOR select FULL
                FOR create FULL
                FOR update NONE
                FOR delete NONE;

        DEFINE INDEX IF NOT EXISTS idx_report_id ON TABLE diagnostic_reports
            COLUMNS report_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_report_session ON TABLE diagnostic_reports
            COLUMNS session_id;
        DEFINE INDEX IF NOT EXISTS idx_report_stack ON TABLE diagnostic_reports
            COLUMNS stack_id, created_at;
    "#;

    db.query(sql)
        .await
        .and_then(|res| res.check())
        .map_err(|e| StateError::SchemaSetup(e.to_string()))?;
    debug!("diagnostic_reports table initialized");
    Ok(())
}
