// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message history: append-only delivery log.

use kogoto_core::{KogotoError, MessageHistory, NewMessageHistory};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::queries::NOW_SQL;

fn row_to_history(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageHistory> {
    Ok(MessageHistory {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        sent_at: row.get(3)?,
        content: row.get(4)?,
    })
}

/// Append one delivery record.
pub async fn append(db: &Database, entry: &NewMessageHistory) -> Result<MessageHistory, KogotoError> {
    let entry = entry.clone();
    let sql = format!(
        "INSERT INTO message_history (sender_id, receiver_id, sent_at, content)
         VALUES (?1, ?2, {NOW_SQL}, ?3)
         RETURNING id, sender_id, receiver_id, sent_at, content"
    );
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &sql,
                params![entry.sender_id, entry.receiver_id, entry.content],
                row_to_history,
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Newest-first history for one receiver.
pub async fn list_for_receiver(
    db: &Database,
    receiver_id: &str,
    limit: usize,
) -> Result<Vec<MessageHistory>, KogotoError> {
    let receiver_id = receiver_id.to_string();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, sender_id, receiver_id, sent_at, content
                 FROM message_history
                 WHERE receiver_id = ?1
                 ORDER BY sent_at DESC, id DESC
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![receiver_id, limit], row_to_history)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
