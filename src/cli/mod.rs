use anyhow::Result;
use clap::{Parser, Subcommand};
use std::env;

pub mod auth;
pub mod init;
pub mod job;
pub mod process;
pub mod serve;
pub mod watch;

use auth::ServiceKind;
use job::JobId;

#[derive(Subcommand)]
enum Command {
    /// Create the local database
    Init {},
    /// Run the API server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "8080")]
        port: String,
    },
    /// Perform OAuth authentication and store the refresh token
    Auth {
        #[arg(long, value_enum)]
        service: ServiceKind,
    },
    /// Register the Gmail push watch for an account
    Watch {
        #[arg(long)]
        email: String,
    },
    /// Run a periodic job
    Job {
        #[arg(long, value_enum)]
        id: JobId,
    },
    /// Run the pipeline once for an account
    Process {
        #[arg(long)]
        email: String,
        /// History cursor to anchor at (required by the history policies)
        #[arg(long)]
        history_id: Option<String>,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    let storage_path = env::var("MAILTAG_STORAGE_PATH").unwrap_or("./".to_string());

    // Handle each sub command
    match args.command {
        Some(Command::Init {}) => {
            init::run(&storage_path).await?;
        }
        Some(Command::Serve { host, port }) => {
            serve::run(host, port).await;
        }
        Some(Command::Auth { service }) => {
            auth::run(service, &storage_path).await?;
        }
        Some(Command::Watch { email }) => {
            watch::run(&email, &storage_path).await?;
        }
        Some(Command::Job { id }) => {
            job::run(id).await?;
        }
        Some(Command::Process { email, history_id }) => {
            process::run(&email, history_id, &storage_path).await?;
        }
        None => {}
    }

    Ok(())
}
