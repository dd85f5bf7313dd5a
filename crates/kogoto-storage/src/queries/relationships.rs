// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sender to recipient links.

use kogoto_core::{KogotoError, UserRelationship};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::queries::NOW_SQL;

/// Insert the pair if new, then return the stored link either way.
pub async fn register(
    db: &Database,
    sender_id: &str,
    recipient_id: &str,
) -> Result<UserRelationship, KogotoError> {
    let sender_id = sender_id.to_string();
    let recipient_id = recipient_id.to_string();
    let insert_sql = format!(
        "INSERT INTO user_relationships (sender_id, recipient_id, created_at)
         VALUES (?1, ?2, {NOW_SQL})
         ON CONFLICT (sender_id, recipient_id) DO NOTHING"
    );
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(&insert_sql, params![sender_id, recipient_id])?;
            let link = tx.query_row(
                "SELECT id, sender_id, recipient_id, created_at
                 FROM user_relationships WHERE sender_id = ?1 AND recipient_id = ?2",
                params![sender_id, recipient_id],
                |row| {
                    Ok(UserRelationship {
                        id: row.get(0)?,
                        sender_id: row.get(1)?,
                        recipient_id: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )?;
            tx.commit()?;
            Ok(link)
        })
        .await
        .map_err(map_tr_err)
}

/// Oldest linked recipient for a sender.
pub async fn recipient_for_sender(
    db: &Database,
    sender_id: &str,
) -> Result<Option<String>, KogotoError> {
    lookup(
        db,
        "SELECT recipient_id FROM user_relationships WHERE sender_id = ?1 ORDER BY id ASC LIMIT 1",
        sender_id,
    )
    .await
}

/// Oldest linked sender for a recipient.
pub async fn sender_for_recipient(
    db: &Database,
    recipient_id: &str,
) -> Result<Option<String>, KogotoError> {
    lookup(
        db,
        "SELECT sender_id FROM user_relationships WHERE recipient_id = ?1 ORDER BY id ASC LIMIT 1",
        recipient_id,
    )
    .await
}

async fn lookup(db: &Database, sql: &'static str, key: &str) -> Result<Option<String>, KogotoError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| match conn.query_row(sql, params![key], |row| row.get(0)) {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        })
        .await
        .map_err(map_tr_err)
}
