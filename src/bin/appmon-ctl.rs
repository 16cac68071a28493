//! Command-line client for a running appmon daemon.
//!
//! Sends one request over the control socket and prints the JSON response.

use appmon_lib::config::AppPaths;
use appmon_lib::ipc::{send_request, Command, Request};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "appmon-ctl")]
#[command(about = "Query or change limits of a running appmon daemon")]
struct Args {
    /// Control socket path (default: <config dir>/appmon/appmon.sock)
    #[arg(long)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List configured limits
    GetLimits,
    /// Add or change the limit for an application
    SetLimit {
        /// Application key as reported by the active-app source
        #[arg(long)]
        app: String,
        /// Display name (defaults to the key)
        #[arg(long)]
        name: Option<String>,
        /// Minutes of foreground time; 0 or less disables monitoring
        #[arg(long, allow_negative_numbers = true)]
        limit: i64,
    },
    /// Show accumulated foreground seconds
    GetTimers,
}

impl Commands {
    fn into_request(self) -> Request {
        match self {
            Self::GetLimits => Request::new(Command::GetLimits),
            Self::SetLimit { app, name, limit } => Request::set_limit(&app, name.as_deref(), limit),
            Self::GetTimers => Request::new(Command::GetTimers),
        }
    }
}

#[allow(clippy::print_stdout, clippy::print_stderr, reason = "CLI output is the product")]
#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let socket = match args.socket {
        Some(socket) => socket,
        None => match AppPaths::resolve() {
            Ok(paths) => paths.socket,
            Err(e) => {
                eprintln!("Initialization error: {e}");
                return ExitCode::FAILURE;
            }
        },
    };

    let response = match send_request(&socket, &args.command.into_request()).await {
        Ok(response) => response,
        Err(e) => {
            eprintln!("Failed to reach appmon at {}: {e}", socket.display());
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to format response: {e}");
            return ExitCode::FAILURE;
        }
    }

    if response.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
