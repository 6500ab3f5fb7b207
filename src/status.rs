// System status display: DB location and size, row counts, analyzer backend.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use crate::config::{AnalyzerBackend, Config};
use crate::db::Database;

/// Display system status to the terminal.
pub async fn show(db: &Arc<dyn Database>, config: &Config) -> Result<()> {
    let file_size = std::fs::metadata(&config.db_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", config.db_path, file_size);

    let stats = db.stats().await?;
    println!("Users: {}", stats.users);
    println!(
        "Analyses: {} total, {} guardian alerts sent",
        stats.analyses, stats.alerts_sent
    );
    match stats.last_analysis_at {
        Some(at) => println!("Last analysis: {at}"),
        None => println!("Last analysis: never"),
    }

    match config.analyzer_backend {
        AnalyzerBackend::Gemini => {
            let key_state = if config.gemini_api_key.is_empty() {
                "API key missing"
            } else {
                "API key set"
            };
            println!("Analyzer: gemini ({}, {key_state})", config.gemini_model);
        }
        AnalyzerBackend::Heuristic => println!("Analyzer: heuristic (local rules, text only)"),
    }

    match config.mail_api_url {
        Some(ref url) => println!("Guardian alerts: mail API at {url}"),
        None => println!("Guardian alerts: log only (MAIL_API_URL not set)"),
    }

    Ok(())
}

/// Whether the configured database file exists yet.
pub fn database_exists(config: &Config) -> bool {
    Path::new(&config.db_path).exists()
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
