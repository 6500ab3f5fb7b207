// Database trait: async interface the web server and CLI depend on.
//
// SqliteDatabase implements it over rusqlite. Handlers hold an
// `Arc<dyn Database>` and never see a Connection.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{DbStats, NewAnalysis, StoredAnalysis, User};

#[async_trait]
pub trait Database: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    /// Row counts for the status display.
    async fn stats(&self) -> Result<DbStats>;

    // --- Users ---

    /// Create a user; `None` when the email is taken.
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        guardian_email: &str,
    ) -> Result<Option<i64>>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;

    // --- Analyses ---

    /// Record an analysis and return its ID.
    async fn insert_analysis(&self, analysis: &NewAnalysis<'_>) -> Result<i64>;

    async fn mark_guardian_alerted(&self, analysis_id: i64) -> Result<()>;

    /// A user's analyses, newest first.
    async fn get_user_analyses(&self, user_id: i64, limit: u32) -> Result<Vec<StoredAnalysis>>;

    /// Analyses across all users, newest first.
    async fn get_recent_analyses(&self, limit: u32) -> Result<Vec<StoredAnalysis>>;
}
