pub mod types;

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::ApiError;
use types::{CallbackOutcome, PendingRequest, RequestStatus, TaskKind};

/// Persistent record of every task handed to the agent side.
///
/// SQLite keeps the pending→terminal transition serialized per identifier:
/// the update is conditional on `status = 'pending'`, so a duplicate or
/// racing callback touches zero rows instead of overwriting a result.
#[derive(Clone)]
pub struct RequestStore {
    db: Arc<Mutex<Connection>>,
}

impl RequestStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = Connection::open(path)?;
        Self::init_schema(&db)?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory()?;
        Self::init_schema(&db)?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    fn init_schema(db: &Connection) -> rusqlite::Result<()> {
        db.execute(
            "CREATE TABLE IF NOT EXISTS pending_requests (
                request_id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                requester TEXT NOT NULL,
                payload TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                result TEXT,
                error TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                completed_at DATETIME
            )",
            [],
        )?;
        db.execute(
            "CREATE INDEX IF NOT EXISTS idx_pending_requests_status_created
             ON pending_requests(status, created_at)",
            [],
        )?;
        Ok(())
    }

    pub async fn create_request(
        &self,
        request_id: &str,
        kind: TaskKind,
        requester: &str,
        payload: &str,
    ) -> Result<()> {
        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO pending_requests (request_id, kind, requester, payload, status)
             VALUES (?1, ?2, ?3, ?4, 'pending')",
            params![request_id, kind.as_str(), requester, payload],
        )?;
        Ok(())
    }

    pub async fn get_request(&self, request_id: &str) -> Result<Option<PendingRequest>> {
        let db = self.db.lock().await;
        let row = db
            .query_row(
                "SELECT request_id, kind, requester, payload, status, result, error,
                        created_at, completed_at
                 FROM pending_requests WHERE request_id = ?1",
                params![request_id],
                row_to_request,
            )
            .optional()?;
        Ok(row)
    }

    /// Apply the one allowed mutation: pending → completed/failed.
    ///
    /// The conditional update is the whole dedup story. A second callback
    /// for the same id matches zero rows and is rejected with
    /// `AlreadyCompleted`; an id that was never created yields
    /// `UnknownRequest`.
    pub async fn complete_request(
        &self,
        request_id: &str,
        outcome: CallbackOutcome,
        body: &str,
    ) -> Result<PendingRequest, ApiError> {
        let db = self.db.lock().await;

        let (status, result, error) = match outcome {
            CallbackOutcome::Completed => (RequestStatus::Completed, Some(body), None),
            CallbackOutcome::Failed => (RequestStatus::Failed, None, Some(body)),
        };

        let updated = db.execute(
            "UPDATE pending_requests
             SET status = ?1, result = ?2, error = ?3, completed_at = CURRENT_TIMESTAMP
             WHERE request_id = ?4 AND status = 'pending'",
            params![status.as_str(), result, error, request_id],
        )?;

        if updated == 0 {
            let exists = db
                .query_row(
                    "SELECT 1 FROM pending_requests WHERE request_id = ?1",
                    params![request_id],
                    |_| Ok(()),
                )
                .optional()?;
            return match exists {
                Some(_) => Err(ApiError::AlreadyCompleted(request_id.to_string())),
                None => Err(ApiError::UnknownRequest(request_id.to_string())),
            };
        }

        let row = db.query_row(
            "SELECT request_id, kind, requester, payload, status, result, error,
                    created_at, completed_at
             FROM pending_requests WHERE request_id = ?1",
            params![request_id],
            row_to_request,
        )?;
        Ok(row)
    }

    pub async fn list_recent(&self, limit: usize) -> Result<Vec<PendingRequest>> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(
            "SELECT request_id, kind, requester, payload, status, result, error,
                    created_at, completed_at
             FROM pending_requests ORDER BY created_at DESC, request_id LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], row_to_request)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }
}

fn row_to_request(row: &Row<'_>) -> rusqlite::Result<PendingRequest> {
    let kind: String = row.get(1)?;
    let status: String = row.get(4)?;
    Ok(PendingRequest {
        request_id: row.get(0)?,
        kind: kind.parse().map_err(|_| {
            rusqlite::Error::InvalidColumnType(
                1,
                format!("unexpected kind value: {kind}"),
                rusqlite::types::Type::Text,
            )
        })?,
        requester: row.get(2)?,
        payload: row.get(3)?,
        status: RequestStatus::from_db(&status)?,
        result: row.get(5)?,
        error: row.get(6)?,
        created_at: row.get(7)?,
        completed_at: row.get(8)?,
    })
}
