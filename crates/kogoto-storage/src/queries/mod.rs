// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.

pub mod complaints;
pub mod history;
pub mod relationships;
pub mod settings;

/// Timestamp expression used for every `*_at` column (RFC 3339, UTC, millis).
pub(crate) const NOW_SQL: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

#[cfg(test)]
pub(crate) async fn setup_db() -> (crate::Database, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let db = crate::Database::open(db_path.to_str().unwrap(), true)
        .await
        .unwrap();
    (db, dir)
}
