// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user delivery settings.

use kogoto_core::{KogotoError, SettingsUpdate, UserSettings};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::queries::NOW_SQL;

fn row_to_settings(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserSettings> {
    Ok(UserSettings {
        user_id: row.get(0)?,
        sending_frequency: row.get(1)?,
        sending_time: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

/// Get settings for a user.
pub async fn get(db: &Database, user_id: &str) -> Result<Option<UserSettings>, KogotoError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT user_id, sending_frequency, sending_time, updated_at
                 FROM user_settings WHERE user_id = ?1",
                params![user_id],
                row_to_settings,
            );
            match result {
                Ok(settings) => Ok(Some(settings)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Create or replace both fields in one statement.
pub async fn upsert(db: &Database, update: &SettingsUpdate) -> Result<UserSettings, KogotoError> {
    let user_id = update.user_id.clone();
    let frequency = update.sending_frequency;
    let time = update.sending_time.to_string();
    let sql = format!(
        "INSERT INTO user_settings (user_id, sending_frequency, sending_time, updated_at)
         VALUES (?1, ?2, ?3, {NOW_SQL})
         ON CONFLICT (user_id) DO UPDATE SET
             sending_frequency = excluded.sending_frequency,
             sending_time = excluded.sending_time,
             updated_at = excluded.updated_at
         RETURNING user_id, sending_frequency, sending_time, updated_at"
    );
    db.connection()
        .call(move |conn| conn.query_row(&sql, params![user_id, frequency, time], row_to_settings))
        .await
        .map_err(map_tr_err)
}
