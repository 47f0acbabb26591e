use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;

use examguard_lib::{
    db::Database,
    replay::{self, Scenario},
    reporter::{LogReporter, SessionReporter, SqliteReporter},
    settings::{MonitorSettings, SettingsStore},
};

#[derive(Parser)]
#[command(name = "examguard")]
#[command(about = "Exam proctoring alert engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a recorded observation script and print the resulting alerts
    Replay {
        /// Scenario JSON with `steps: [{ at_ms, observation }]`
        scenario: PathBuf,
        /// Settings file (schedule, detector thresholds, alert policy)
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Record the replayed session into this SQLite database
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// List recorded sessions with their counters
    Sessions {
        /// SQLite database written by a previous run
        db: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    examguard_lib::init_logging();

    let cli = Cli::parse();
    match cli.command {
        Commands::Replay {
            scenario,
            settings,
            db,
        } => replay_command(scenario, settings, db).await,
        Commands::Sessions { db } => sessions_command(db).await,
    }
}

async fn replay_command(
    scenario: PathBuf,
    settings: Option<PathBuf>,
    db: Option<PathBuf>,
) -> Result<()> {
    let scenario = Scenario::load(&scenario)?;
    let settings = match settings {
        Some(path) => SettingsStore::new(path)?.get(),
        None => MonitorSettings::default(),
    };

    let reporter: Arc<dyn SessionReporter> = match db {
        Some(path) => Arc::new(SqliteReporter::open(path).await?),
        None => Arc::new(LogReporter),
    };
    let outcome = replay::run_reported(&scenario, &settings, reporter).await?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

async fn sessions_command(db: PathBuf) -> Result<()> {
    let database = Database::new(db)?;

    let mut report = Vec::new();
    for session in database.list_sessions().await? {
        let stats: serde_json::Map<String, serde_json::Value> = database
            .get_session_stats(&session.id)
            .await?
            .into_iter()
            .map(|(counter, count)| (counter.as_str().to_string(), json!(count)))
            .collect();
        let alerts = database.list_alerts(&session.id).await?.len();
        report.push(json!({
            "session": session,
            "stats": stats,
            "alerts": alerts,
        }));
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
