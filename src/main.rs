use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use carecloud::analysis::traits::ImageInput;
use carecloud::config::{AnalyzerBackend, Config};
use carecloud::moderation::labels::{Category, LabelSet};
use carecloud::moderation::result::{AnalysisResult, DecisionPayload};
use carecloud::moderation::severity::clamp_score;
use carecloud::pipeline::submission::{assess, Submission};

/// CareCloud: child-safety content moderation.
///
/// Scores messages and screenshots a child received, decides how serious
/// they are, and alerts the linked guardian when the content is dangerous.
#[derive(Parser)]
#[command(name = "carecloud", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Run the parent dashboard web server
    #[cfg(feature = "web")]
    Serve {
        /// Port to listen on (default: PORT env var, then 8080)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind (default: BIND env var, then 0.0.0.0)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Classify a score and labels without calling any analyzer
    Classify {
        /// Toxicity score (clamped to 0-100)
        #[arg(allow_negative_numbers = true)]
        score: i64,

        /// Flagged label key, repeatable (e.g. --label harassment)
        #[arg(long = "label")]
        labels: Vec<String>,

        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// Analyze a message and/or screenshot with the configured analyzer
    Analyze {
        /// Message text
        text: Option<String>,

        /// Path to a screenshot (png, jpg, gif or webp)
        #[arg(long)]
        image: Option<String>,

        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show recently stored analyses
    History {
        /// Number of analyses to show (default: 20)
        #[arg(long, default_value = "20")]
        limit: u32,

        /// Only show analyses for this account
        #[arg(long)]
        email: Option<String>,
    },

    /// Show system status (DB stats, analyzer, alert delivery)
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("carecloud=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing CareCloud database...");
            let config = Config::load()?;
            let db = carecloud::db::initialize_sqlite(&config.db_path)?;
            let table_count = db.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nCareCloud is ready. Next step: set up your .env file");
            println!("  (AI_INTEGRATIONS_GEMINI_API_KEY and SECRET_KEY are required to serve)");
            println!("\nThen run: cargo run -- serve");
        }

        #[cfg(feature = "web")]
        Commands::Serve { port, bind } => {
            let config = Config::load()?;
            config.require_session_secret()?;

            // The dashboard creates its tables on first start.
            let db = carecloud::db::initialize_sqlite(&config.db_path)?;
            let (analyzer, ocr) = carecloud::analysis::create_collaborators(&config)?;
            let notifier = carecloud::alerts::create_notifier(&config)?;

            let port = port.unwrap_or(config.port);
            let bind = bind.unwrap_or_else(|| config.bind.clone());

            let state = carecloud::web::AppState {
                db,
                config: Arc::new(config),
                analyzer,
                ocr,
                notifier,
                sessions: carecloud::web::session::SessionStore::new(),
            };
            carecloud::web::run_server(state, port, &bind).await?;
        }

        Commands::Classify {
            score,
            labels,
            json,
        } => {
            let mut label_set = LabelSet::new();
            for key in &labels {
                match Category::from_key(key) {
                    Some(category) => label_set.flag(category),
                    None => label_set.flag_unrecognized(key),
                }
            }

            let result = AnalysisResult {
                toxicity_score: clamp_score(score),
                detected_labels: label_set,
                explanation: String::new(),
                support_message: String::new(),
                safe_response_steps: Vec::new(),
            };
            print_decision(&DecisionPayload::new(&result, None), json)?;
        }

        Commands::Analyze { text, image, json } => {
            let config = Config::load()?;
            let (analyzer, ocr) = carecloud::analysis::create_collaborators(&config)?;

            let image = match image {
                Some(path) => Some(read_image(&path)?),
                None => None,
            };
            let submission = Submission {
                text: text.unwrap_or_default(),
                image,
            };

            if config.analyzer_backend == AnalyzerBackend::Heuristic && !json {
                println!("{}", "Using local heuristic analyzer (text only).".dimmed());
            }

            let assessment = assess(analyzer.as_ref(), ocr.as_ref(), &submission).await?;
            print_decision(&DecisionPayload::new(&assessment.result, None), json)?;
        }

        Commands::History { limit, email } => {
            let config = Config::load()?;
            let db = carecloud::db::open_sqlite(&config.db_path)?;

            let analyses = match email {
                Some(email) => {
                    let user = db
                        .get_user_by_email(&email)
                        .await?
                        .with_context(|| format!("No account found for {email}"))?;
                    db.get_user_analyses(user.id, limit).await?
                }
                None => db.get_recent_analyses(limit).await?,
            };
            carecloud::output::terminal::display_history(&analyses);
        }

        Commands::Status => {
            let config = Config::load()?;
            if !carecloud::status::database_exists(&config) {
                println!("No database at {}. Run `carecloud init` first.", config.db_path);
                return Ok(());
            }
            let db = carecloud::db::open_sqlite(&config.db_path)?;
            carecloud::status::show(&db, &config).await?;
        }
    }

    Ok(())
}

fn print_decision(payload: &DecisionPayload, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(payload)?);
    } else {
        carecloud::output::terminal::display_decision(payload);
    }
    Ok(())
}

/// Load a screenshot from disk, inferring its MIME type from the extension.
fn read_image(path: &str) -> Result<ImageInput> {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let mime_type = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        other => anyhow::bail!("Unsupported image type {other:?} (use png, jpg, gif or webp)"),
    };
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read image {path}"))?;
    Ok(ImageInput::new(mime_type, bytes))
}
