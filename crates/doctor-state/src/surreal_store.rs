//! SurrealDB-backed DiagnosticStore implementation
//!
//! Uses `schema::SessionRow` and `schema::ReportRow` for persistence,
//! converting to/from `storage_traits` records at the boundary.

use async_trait::async_trait;
use chrono::Utc;
use surrealdb::engine::any::Any;
use surrealdb::sql::Datetime as SurrealDatetime;
use surrealdb::Surreal;
use tracing::{debug, info, instrument};

use crate::config::StoreConfig;
use crate::error::{StateError, StorageError};
use crate::migrations;
use crate::schema::{ReportRow, SessionRow};
use crate::storage_traits::{
    DiagnosticReport, DiagnosticSession, DiagnosticStore, ReportId, SessionId, SessionStatus,
    StorageResult,
};

const DEFAULT_NAMESPACE: &str = "doctor";
const DEFAULT_DATABASE: &str = "main";
const LOCAL_DB_PATH: &str = ".doctor/db";

fn backend(err: surrealdb::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

/// `LIMIT` must be a positive i64; oversized limits mean "everything".
fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// SurrealDB-backed implementation of [`DiagnosticStore`].
#[derive(Clone)]
pub struct SurrealDiagnosticStore {
    db: Surreal<Any>,
}

impl SurrealDiagnosticStore {
    /// Create an in-memory instance for testing.
    ///
    /// Connects to `mem://`, selects `doctor/main`, and runs `init_schema`.
    pub async fn in_memory() -> crate::Result<Self> {
        let store = Self::connect("mem://").await?;
        info!("SurrealDiagnosticStore connected (in-memory)");
        Ok(store)
    }

    /// Connect to any SurrealDB URL (`mem://`, `surrealkv://path`, `ws://host`).
    pub async fn connect(url: &str) -> crate::Result<Self> {
        let db = surrealdb::engine::any::connect(url)
            .await
            .map_err(|e| StateError::Connection(format!("Failed to connect to {url}: {e}")))?;

        db.use_ns(DEFAULT_NAMESPACE)
            .use_db(DEFAULT_DATABASE)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        Self::from_client(db).await
    }

    /// Wrap an already connected handle with namespace and database selected.
    ///
    /// Runs `init_schema`, which is a no-op for tables that already exist.
    pub async fn from_client(db: Surreal<Any>) -> crate::Result<Self> {
        migrations::init_schema(&db).await?;
        Ok(Self { db })
    }

    /// Connect to a remote instance with credentials.
    #[instrument(
        skip(config),
        fields(
            endpoint = %config.endpoint,
            namespace = %config.namespace,
            database = %config.database
        )
    )]
    pub async fn connect_remote(config: &StoreConfig) -> crate::Result<Self> {
        use surrealdb::opt::auth::{Database, Root};

        let db = surrealdb::engine::any::connect(config.endpoint.as_str())
            .await
            .map_err(|e| {
                StateError::Connection(format!("Failed to connect to {}: {}", config.endpoint, e))
            })?;

        if config.is_root {
            db.signin(Root {
                username: &config.username,
                password: &config.password,
            })
            .await
            .map_err(|e| StateError::Connection(format!("Root auth failed: {e}")))?;
        } else {
            db.signin(Database {
                namespace: &config.namespace,
                database: &config.database,
                username: &config.username,
                password: &config.password,
            })
            .await
            .map_err(|e| StateError::Connection(format!("DB auth failed: {e}")))?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        migrations::init_schema(&db).await?;
        info!("SurrealDiagnosticStore connected (remote, root={})", config.is_root);
        Ok(Self { db })
    }

    /// Create from environment variables.
    ///
    /// Resolution order: [`StoreConfig::from_env`] credentials, then
    /// `SURREALDB_URL`, then local persistence under `.doctor/db`.
    pub async fn from_env() -> crate::Result<Self> {
        if let Ok(config) = StoreConfig::from_env() {
            return Self::connect_remote(&config).await;
        }

        if let Ok(url) = std::env::var("SURREALDB_URL") {
            let store = Self::connect(&url).await?;
            info!("SurrealDiagnosticStore connected ({})", url);
            return Ok(store);
        }

        std::fs::create_dir_all(LOCAL_DB_PATH).map_err(|e| {
            StateError::Connection(format!(
                "Failed to create database directory {}: {}",
                LOCAL_DB_PATH, e
            ))
        })?;
        let url = format!("surrealkv://{}", LOCAL_DB_PATH);
        info!(
            "No remote config or SURREALDB_URL found, using local persistence: {}",
            url
        );
        Self::connect(&url).await
    }

    // -- private helpers -----------------------------------------------------

    async fn fetch_session(&self, sid: &str) -> StorageResult<Option<SessionRow>> {
        let mut res = self
            .db
            .query("SELECT * FROM diagnostic_sessions WHERE session_id = $sid")
            .bind(("sid", sid.to_string()))
            .await
            .map_err(backend)?;

        let rows: Vec<SessionRow> = res.take(0).map_err(backend)?;
        Ok(rows.into_iter().next())
    }

    /// Conditional update: only rows still `active` are transitioned.
    #[instrument(skip_all, fields(session_id = %id, status = %target))]
    async fn finish(
        &self,
        id: &SessionId,
        target: SessionStatus,
    ) -> StorageResult<DiagnosticSession> {
        let mut res = self
            .db
            .query(
                "UPDATE diagnostic_sessions SET status = $status, completed_at = $completed_at \
                 WHERE session_id = $sid AND status = 'active' RETURN AFTER",
            )
            .bind(("status", target.as_str().to_string()))
            .bind(("completed_at", SurrealDatetime::from(Utc::now())))
            .bind(("sid", id.0.clone()))
            .await
            .map_err(backend)?;

        let rows: Vec<SessionRow> = res.take(0).map_err(backend)?;
        if let Some(row) = rows.into_iter().next() {
            debug!(session_id = %id, status = %target, "session finished");
            return row.into_session();
        }

        // Nothing matched: either unknown or already terminal.
        match self.fetch_session(&id.0).await? {
            None => Err(StorageError::SessionNotFound {
                session_id: id.0.clone(),
            }),
            Some(row) => Err(StorageError::InvalidSessionState {
                session_id: id.0.clone(),
                status: row.status,
                expected: SessionStatus::Active.to_string(),
            }),
        }
    }
}

#[async_trait]
impl DiagnosticStore for SurrealDiagnosticStore {
    #[instrument(skip_all, fields(session_id = %session.id, stack_id = %session.stack_id))]
    async fn save_session(&self, session: &DiagnosticSession) -> StorageResult<()> {
        if self.fetch_session(&session.id.0).await?.is_some() {
            return Err(StorageError::DuplicateSession {
                session_id: session.id.0.clone(),
            });
        }

        debug!(session_id = %session.id, "creating session");
        let _created: Option<SessionRow> = self
            .db
            .create("diagnostic_sessions")
            .content(SessionRow::from_session(session))
            .await
            .map_err(backend)?;

        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> StorageResult<Option<DiagnosticSession>> {
        self.fetch_session(&id.0)
            .await?
            .map(SessionRow::into_session)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn list_sessions(
        &self,
        stack_id: &str,
        limit: usize,
    ) -> StorageResult<Vec<DiagnosticSession>> {
        let mut res = self
            .db
            .query(
                "SELECT * FROM diagnostic_sessions WHERE stack_id = $stack \
                 ORDER BY started_at DESC LIMIT $limit",
            )
            .bind(("stack", stack_id.to_string()))
            .bind(("limit", limit_param(limit)))
            .await
            .map_err(backend)?;

        let rows: Vec<SessionRow> = res.take(0).map_err(backend)?;
        rows.into_iter().map(SessionRow::into_session).collect()
    }

    async fn complete_session(&self, id: &SessionId) -> StorageResult<DiagnosticSession> {
        self.finish(id, SessionStatus::Completed).await
    }

    async fn cancel_session(&self, id: &SessionId) -> StorageResult<DiagnosticSession> {
        self.finish(id, SessionStatus::Cancelled).await
    }

    #[instrument(skip_all, fields(report_id = %report.id, session_id = %report.session_id))]
    async fn save_report(&self, report: &DiagnosticReport) -> StorageResult<()> {
        if self.get_report(&report.id).await?.is_some() {
            return Err(StorageError::DuplicateReport {
                report_id: report.id.0.clone(),
            });
        }

        debug!(report_id = %report.id, session_id = %report.session_id, "creating report");
        let _created: Option<ReportRow> = self
            .db
            .create("diagnostic_reports")
            .content(ReportRow::from_report(report))
            .await
            .map_err(backend)?;

        Ok(())
    }

    async fn get_report(&self, id: &ReportId) -> StorageResult<Option<DiagnosticReport>> {
        let mut res = self
            .db
            .query("SELECT * FROM diagnostic_reports WHERE report_id = $rid")
            .bind(("rid", id.0.clone()))
            .await
            .map_err(backend)?;

        let rows: Vec<ReportRow> = res.take(0).map_err(backend)?;
        Ok(rows.into_iter().next().map(ReportRow::into_report))
    }

    #[instrument(skip(self, session_id))]
    async fn list_reports(
        &self,
        stack_id: &str,
        session_id: Option<&SessionId>,
        limit: usize,
    ) -> StorageResult<Vec<DiagnosticReport>> {
        let rows: Vec<ReportRow> = if let Some(sid) = session_id {
            let mut res = self
                .db
                .query(
                    "SELECT * FROM diagnostic_reports \
                     WHERE stack_id = $stack AND session_id = $sid \
                     ORDER BY created_at DESC LIMIT $limit",
                )
                .bind(("stack", stack_id.to_string()))
                .bind(("sid", sid.0.clone()))
                .bind(("limit", limit_param(limit)))
                .await
                .map_err(backend)?;
            res.take(0).map_err(backend)?
        } else {
            let mut res = self
                .db
                .query(
                    "SELECT * FROM diagnostic_reports WHERE stack_id = $stack \
                     ORDER BY created_at DESC LIMIT $limit",
                )
                .bind(("stack", stack_id.to_string()))
                .bind(("limit", limit_param(limit)))
                .await
                .map_err(backend)?;
            res.take(0).map_err(backend)?
        };

        Ok(rows.into_iter().map(ReportRow::into_report).collect())
    }
}
