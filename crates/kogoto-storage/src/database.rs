// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread, which gives the relay atomic single-row writes without extra locking.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;
use std::time::Duration;

use kogoto_core::KogotoError;
use tracing::debug;

use crate::migrations;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the relay database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` and bring the schema up to date.
    ///
    /// Migrations run on a short-lived blocking connection before the async
    /// connection is opened, so `path` must be a file, not `:memory:`.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, KogotoError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(KogotoError::storage)?;
        }

        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), KogotoError> {
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(KogotoError::storage)?;
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| KogotoError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| KogotoError::storage(format!("failed to open {path}: {e}")))?;

        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            if wal_mode {
                let mode: String =
                    conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
                debug!(journal_mode = %mode, "journal mode set");
            }
            conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA synchronous = NORMAL;")?;
            conn.busy_timeout(BUSY_TIMEOUT)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        Ok(Self { conn })
    }

    /// The async connection all queries run through.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Close the connection, waiting for queued statements to finish.
    pub async fn close(self) -> Result<(), KogotoError> {
        self.conn
            .close()
            .await
            .map_err(|e| KogotoError::storage(format!("failed to close database: {e}")))
    }
}

/// Map a tokio-rusqlite error into the relay's storage error.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> KogotoError {
    KogotoError::storage(format!("database error: {e}"))
}
