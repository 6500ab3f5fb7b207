// Database queries: plain functions over a rusqlite Connection.
//
// SqliteDatabase wraps these behind the async Database trait; tests call
// them directly against an in-memory connection.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::{DbStats, NewAnalysis, StoredAnalysis, User};
use crate::moderation::labels::LabelSet;

/// Normalize an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// --- Users ---

/// Create a user. Returns `None` when the email is already registered.
pub fn create_user(
    conn: &Connection,
    name: &str,
    email: &str,
    password_hash: &str,
    guardian_email: &str,
) -> Result<Option<i64>> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO users (name, email, password_hash, guardian_email)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            name.trim(),
            normalize_email(email),
            password_hash,
            guardian_email.trim()
        ],
    )?;

    if inserted == 0 {
        return Ok(None);
    }
    Ok(Some(conn.last_insert_rowid()))
}

const USER_COLUMNS: &str = "id, name, email, password_hash, guardian_email, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        guardian_email: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![normalize_email(email)],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn get_user_by_id(conn: &Connection, id: i64) -> Result<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

// --- Analyses ---

/// Record a finished analysis and return its ID.
pub fn insert_analysis(conn: &Connection, analysis: &NewAnalysis<'_>) -> Result<i64> {
    let result = analysis.result;
    let labels_json = serde_json::to_string(&result.detected_labels.to_json())?;
    let steps_json = serde_json::to_string(&result.safe_response_steps)?;

    conn.execute(
        "INSERT INTO analyses
            (user_id, toxicity_score, labels, explanation, support_message,
             safe_response_steps, content_preview, source)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            analysis.user_id,
            result.toxicity_score,
            labels_json,
            result.explanation,
            result.support_message,
            steps_json,
            analysis.content_preview,
            analysis.source,
        ],
    )
    .context("Failed to insert analysis")?;
    Ok(conn.last_insert_rowid())
}

/// Mark an analysis as having triggered a delivered guardian alert.
pub fn mark_guardian_alerted(conn: &Connection, analysis_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE analyses SET guardian_alerted = 1 WHERE id = ?1",
        params![analysis_id],
    )?;
    Ok(())
}

const ANALYSIS_COLUMNS: &str = "id, user_id, created_at, toxicity_score, labels, explanation,
     support_message, safe_response_steps, content_preview, source, guardian_alerted";

fn analysis_from_row(row: &Row<'_>) -> rusqlite::Result<StoredAnalysis> {
    let labels_json: String = row.get(4)?;
    let labels = serde_json::from_str::<serde_json::Value>(&labels_json)
        .map(|v| LabelSet::from_json(&v))
        .unwrap_or_default();
    let steps_json: String = row.get(7)?;
    let safe_response_steps: Vec<String> = serde_json::from_str(&steps_json).unwrap_or_default();
    // Scores are written clamped; clamp again in case the row was edited by hand.
    let score: i64 = row.get(3)?;

    Ok(StoredAnalysis {
        id: row.get(0)?,
        user_id: row.get(1)?,
        created_at: row.get(2)?,
        toxicity_score: crate::moderation::severity::clamp_score(score),
        labels,
        explanation: row.get(5)?,
        support_message: row.get(6)?,
        safe_response_steps,
        content_preview: row.get(8)?,
        source: row.get(9)?,
        guardian_alerted: row.get::<_, i32>(10)? != 0,
    })
}

fn collect_analyses(
    rows: impl Iterator<Item = rusqlite::Result<StoredAnalysis>>,
) -> Result<Vec<StoredAnalysis>> {
    let mut analyses = Vec::new();
    for row in rows {
        analyses.push(row?);
    }
    Ok(analyses)
}

/// A user's analyses, newest first.
pub fn get_user_analyses(conn: &Connection, user_id: i64, limit: u32) -> Result<Vec<StoredAnalysis>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ANALYSIS_COLUMNS}
         FROM analyses
         WHERE user_id = ?1
         ORDER BY created_at DESC, id DESC
         LIMIT ?2"
    ))?;
    let rows = stmt.query_map(params![user_id, limit], analysis_from_row)?;
    collect_analyses(rows)
}

/// Analyses across all users, newest first.
pub fn get_recent_analyses(conn: &Connection, limit: u32) -> Result<Vec<StoredAnalysis>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ANALYSIS_COLUMNS}
         FROM analyses
         ORDER BY created_at DESC, id DESC
         LIMIT ?1"
    ))?;
    let rows = stmt.query_map(params![limit], analysis_from_row)?;
    collect_analyses(rows)
}

pub fn get_stats(conn: &Connection) -> Result<DbStats> {
    let users: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    let (analyses, alerts_sent, last_analysis_at): (i64, i64, Option<String>) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(guardian_alerted), 0), MAX(created_at) FROM analyses",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;
    Ok(DbStats {
        users,
        analyses,
        alerts_sent,
        last_analysis_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;
    use crate::moderation::labels::Category;
    use crate::moderation::result::AnalysisResult;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn add_user(conn: &Connection, email: &str) -> i64 {
        create_user(conn, "Sam", email, "hash", "guardian@example.com")
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_user_roundtrip_normalizes_email() {
        let conn = test_db();
        let id = add_user(&conn, "  Sam@Example.COM ");

        let user = get_user_by_email(&conn, "sam@example.com").unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email, "sam@example.com");
        assert_eq!(user.guardian_email, "guardian@example.com");

        let by_id = get_user_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(by_id.name, "Sam");
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let conn = test_db();
        add_user(&conn, "sam@example.com");
        let dup = create_user(&conn, "Other", "SAM@example.com", "h", "g@example.com").unwrap();
        assert!(dup.is_none());
    }

    #[test]
    fn test_missing_user() {
        let conn = test_db();
        assert!(get_user_by_email(&conn, "nobody@example.com").unwrap().is_none());
        assert!(get_user_by_id(&conn, 42).unwrap().is_none());
    }

    #[test]
    fn test_analysis_roundtrip_recomputes_decision() {
        let conn = test_db();
        let user_id = add_user(&conn, "sam@example.com");

        let mut result = AnalysisResult::safe_default();
        result.toxicity_score = 65;
        result.detected_labels.flag(Category::Grooming);
        result.detected_labels.flag_unrecognized("doxxing");
        result.safe_response_steps = vec!["Block".to_string()];

        let id = insert_analysis(
            &conn,
            &NewAnalysis {
                user_id,
                result: &result,
                content_preview: "hey",
                source: "text",
            },
        )
        .unwrap();
        assert!(id > 0);

        let stored = get_user_analyses(&conn, user_id, 10).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].result(), result);
        assert!(!stored[0].guardian_alerted);
        assert_eq!(stored[0].result().decision(), result.decision());
    }

    #[test]
    fn test_history_newest_first_and_scoped() {
        let conn = test_db();
        let sam = add_user(&conn, "sam@example.com");
        let alex = add_user(&conn, "alex@example.com");
        let result = AnalysisResult::safe_default();

        for (user_id, preview) in [(sam, "first"), (alex, "other"), (sam, "second")] {
            insert_analysis(
                &conn,
                &NewAnalysis {
                    user_id,
                    result: &result,
                    content_preview: preview,
                    source: "text",
                },
            )
            .unwrap();
        }

        let history = get_user_analyses(&conn, sam, 10).unwrap();
        let previews: Vec<&str> = history.iter().map(|a| a.content_preview.as_str()).collect();
        assert_eq!(previews, vec!["second", "first"]);

        assert_eq!(get_user_analyses(&conn, sam, 1).unwrap().len(), 1);
        assert_eq!(get_recent_analyses(&conn, 10).unwrap().len(), 3);
    }

    #[test]
    fn test_stats_count_alerts() {
        let conn = test_db();
        assert_eq!(get_stats(&conn).unwrap().analyses, 0);

        let user_id = add_user(&conn, "sam@example.com");
        let result = AnalysisResult::safe_default();
        let id = insert_analysis(
            &conn,
            &NewAnalysis {
                user_id,
                result: &result,
                content_preview: "",
                source: "empty",
            },
        )
        .unwrap();
        mark_guardian_alerted(&conn, id).unwrap();

        let stats = get_stats(&conn).unwrap();
        assert_eq!(stats.users, 1);
        assert_eq!(stats.analyses, 1);
        assert_eq!(stats.alerts_sent, 1);
        assert!(stats.last_analysis_at.is_some());
    }
}
