// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Complaint record operations.

use kogoto_core::{ComplaintRecord, KogotoError, NewComplaint, SentimentAnalysis};
use rusqlite::params;
use rusqlite::types::Type;

use crate::database::{Database, map_tr_err};
use crate::queries::NOW_SQL;

const COLUMNS: &str =
    "id, sender_id, event_id, posted_at, original_text, sentiment_analysis, summary, processed";

fn row_to_complaint(row: &rusqlite::Row<'_>) -> rusqlite::Result<ComplaintRecord> {
    let analysis: Option<String> = row.get(5)?;
    let sentiment_analysis = analysis
        .map(|json| {
            serde_json::from_str::<SentimentAnalysis>(&json)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))
        })
        .transpose()?;

    Ok(ComplaintRecord {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        event_id: row.get(2)?,
        posted_at: row.get(3)?,
        original_text: row.get(4)?,
        sentiment_analysis,
        summary: row.get(6)?,
        processed: row.get(7)?,
    })
}

/// Insert a complaint with `processed = 0` and return the stored row.
pub async fn insert_complaint(
    db: &Database,
    complaint: &NewComplaint,
) -> Result<ComplaintRecord, KogotoError> {
    let analysis_json = complaint
        .sentiment_analysis
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(KogotoError::storage)?;
    let complaint = complaint.clone();
    let sql = format!(
        "INSERT INTO complaints (sender_id, event_id, posted_at, original_text, sentiment_analysis, summary)
         VALUES (?1, ?2, {NOW_SQL}, ?3, ?4, ?5)
         RETURNING {COLUMNS}"
    );
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &sql,
                params![
                    complaint.sender_id,
                    complaint.event_id,
                    complaint.original_text,
                    analysis_json,
                    complaint.summary,
                ],
                row_to_complaint,
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Get a complaint by id.
pub async fn get_complaint(db: &Database, id: i64) -> Result<Option<ComplaintRecord>, KogotoError> {
    let sql = format!("SELECT {COLUMNS} FROM complaints WHERE id = ?1");
    db.connection()
        .call(move |conn| match conn.query_row(&sql, params![id], row_to_complaint) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        })
        .await
        .map_err(map_tr_err)
}

/// True when a complaint with this webhook event id exists.
pub async fn exists_for_event(db: &Database, event_id: &str) -> Result<bool, KogotoError> {
    let event_id = event_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM complaints WHERE event_id = ?1)",
                params![event_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Up to `limit` unprocessed complaints, oldest first.
pub async fn list_unprocessed(
    db: &Database,
    limit: usize,
) -> Result<Vec<ComplaintRecord>, KogotoError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let sql = format!(
        "SELECT {COLUMNS} FROM complaints
         WHERE processed = 0
         ORDER BY posted_at ASC, id ASC
         LIMIT ?1"
    );
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![limit], row_to_complaint)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Flip `processed` to 1. Returns false when the row was already processed or missing.
pub async fn mark_processed(db: &Database, id: i64) -> Result<bool, KogotoError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE complaints SET processed = 1 WHERE id = ?1 AND processed = 0",
                params![id],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::setup_db;
    use kogoto_core::Sentiment;

    fn complaint(sender: &str, text: &str) -> NewComplaint {
        NewComplaint {
            sender_id: sender.into(),
            event_id: None,
            original_text: text.into(),
            sentiment_analysis: Some(SentimentAnalysis {
                sentiment: Sentiment::Negative,
                score: 0.8,
            }),
            summary: Some("summary".into()),
        }
    }

    #[tokio::test]
    async fn insert_returns_unprocessed_row() {
        let (db, _dir) = setup_db().await;

        let stored = insert_complaint(&db, &complaint("w1", "tired of housework"))
            .await
            .unwrap();
        assert!(stored.id > 0);
        assert!(!stored.processed);
        assert_eq!(stored.original_text, "tired of housework");
        assert_eq!(
            stored.sentiment_analysis.unwrap().sentiment,
            Sentiment::Negative
        );
        assert!(stored.posted_at.ends_with('Z'));

        let fetched = get_complaint(&db, stored.id).await.unwrap().unwrap();
        assert_eq!(fetched, stored);
        assert!(get_complaint(&db, stored.id + 100).await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn unprocessed_is_oldest_first_and_limited() {
        let (db, _dir) = setup_db().await;
        let mut ids = Vec::new();
        for i in 0..5 {
            let row = insert_complaint(&db, &complaint("w1", &format!("c{i}")))
                .await
                .unwrap();
            ids.push(row.id);
        }

        let pending = list_unprocessed(&db, 3).await.unwrap();
        let got: Vec<i64> = pending.iter().map(|c| c.id).collect();
        assert_eq!(got, ids[..3]);

        assert!(mark_processed(&db, ids[0]).await.unwrap());
        let pending = list_unprocessed(&db, 3).await.unwrap();
        assert_eq!(pending[0].id, ids[1]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn mark_processed_applies_once() {
        let (db, _dir) = setup_db().await;
        let row = insert_complaint(&db, &complaint("w1", "x")).await.unwrap();

        assert!(mark_processed(&db, row.id).await.unwrap());
        assert!(!mark_processed(&db, row.id).await.unwrap());
        assert!(!mark_processed(&db, 9999).await.unwrap());
        assert!(get_complaint(&db, row.id).await.unwrap().unwrap().processed);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn event_id_lookup_and_uniqueness() {
        let (db, _dir) = setup_db().await;
        let mut c = complaint("w1", "x");
        c.event_id = Some("evt-1".into());

        assert!(!exists_for_event(&db, "evt-1").await.unwrap());
        insert_complaint(&db, &c).await.unwrap();
        assert!(exists_for_event(&db, "evt-1").await.unwrap());

        // The unique index rejects a second row for the same event.
        assert!(insert_complaint(&db, &c).await.is_err());

        // Rows without an event id never collide.
        insert_complaint(&db, &complaint("w1", "a")).await.unwrap();
        insert_complaint(&db, &complaint("w1", "b")).await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn missing_analysis_round_trips_as_none() {
        let (db, _dir) = setup_db().await;
        let mut c = complaint("w1", "x");
        c.sentiment_analysis = None;
        c.summary = None;

        let row = insert_complaint(&db, &c).await.unwrap();
        assert!(row.sentiment_analysis.is_none());
        assert!(row.summary.is_none());
        db.close().await.unwrap();
    }
}
