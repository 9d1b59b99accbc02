use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hanabi_client::agent;
use hanabi_client::chooser::CautiousChooser;
use hanabi_client::config::{
    AgentConfig, DEFAULT_DECISION_RETRIES, DEFAULT_HOST, DEFAULT_NAME, DEFAULT_PORT,
};
use hanabi_client::dispatcher::Outcome;
use hanabi_client::session::SessionState;

#[derive(Parser)]
#[command(name = "hanabi-agent")]
#[command(about = "Join a Hanabi game server and play autonomously", long_about = None)]
struct Cli {
    /// Server host
    #[arg(default_value = DEFAULT_HOST)]
    host: String,

    /// Server port
    #[arg(default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Player name
    #[arg(default_value = DEFAULT_NAME)]
    name: String,

    /// Consecutive failed decisions retried with a fresh snapshot
    #[arg(long, default_value_t = DEFAULT_DECISION_RETRIES)]
    retries: u32,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AgentConfig {
        name: cli.name,
        host: cli.host,
        port: cli.port,
        decision_retries: cli.retries,
    };

    let session = Arc::new(SessionState::new());
    {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, stopping");
                session.stop();
            }
        });
    }

    println!("Connecting to {} as '{}'...", config.address(), config.name);

    match agent::connect_and_run(&config, CautiousChooser, session).await {
        Ok(Outcome::GameOver {
            message,
            score,
            score_message,
        }) => {
            println!("{message}");
            println!("Score: {score} {score_message}");
            ExitCode::SUCCESS
        }
        Ok(Outcome::Interrupted) => {
            println!("Interrupted.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
