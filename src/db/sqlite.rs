// SqliteDatabase: rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Sync.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{DbStats, NewAnalysis, StoredAnalysis, User};
use super::traits::Database;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn stats(&self) -> Result<DbStats> {
        let conn = self.conn.lock().await;
        super::queries::get_stats(&conn)
    }

    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        guardian_email: &str,
    ) -> Result<Option<i64>> {
        let conn = self.conn.lock().await;
        super::queries::create_user(&conn, name, email, password_hash, guardian_email)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().await;
        super::queries::get_user_by_email(&conn, email)
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn.lock().await;
        super::queries::get_user_by_id(&conn, id)
    }

    async fn insert_analysis(&self, analysis: &NewAnalysis<'_>) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::insert_analysis(&conn, analysis)
    }

    async fn mark_guardian_alerted(&self, analysis_id: i64) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::mark_guardian_alerted(&conn, analysis_id)
    }

    async fn get_user_analyses(&self, user_id: i64, limit: u32) -> Result<Vec<StoredAnalysis>> {
        let conn = self.conn.lock().await;
        super::queries::get_user_analyses(&conn, user_id, limit)
    }

    async fn get_recent_analyses(&self, limit: u32) -> Result<Vec<StoredAnalysis>> {
        let conn = self.conn.lock().await;
        super::queries::get_recent_analyses(&conn, limit)
    }
}
