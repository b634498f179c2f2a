//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::fs_blob_store::FsBlobStore;
use crate::adapters::sqlite_store::SqliteStore;
use crate::adapters::web::{build_router, AppState, SessionGate};
use crate::domain::error::JournalError;
use crate::domain::password;
use crate::ports::config_port::ConfigPort;

#[derive(Parser, Debug)]
#[command(name = "tradelog", about = "Trading journal API server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the API server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Create the database schema and exit
    InitDb {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Output an argon2 hash for a password read from stdin
    HashPassword,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Serve { config } => run_serve(&config),
        Command::InitDb { config } => run_init_db(&config),
        Command::HashPassword => run_hash_password(),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = JournalError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn run_serve(config_path: &PathBuf) -> ExitCode {
    use std::net::SocketAddr;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tradelog=info")),
        )
        .init();

    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    // Stage 2: Open store and ensure schema
    let store = match SqliteStore::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if let Err(e) = store.initialize_schema() {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Stage 3: Upload directory and session gate
    let blobs = match FsBlobStore::from_config(&config) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let gate = match SessionGate::from_config(&config) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let addr: SocketAddr = match config
        .get_string("web", "listen")
        .unwrap_or_else(|| "127.0.0.1:3000".to_string())
        .parse()
    {
        Ok(a) => a,
        Err(_) => {
            let err = JournalError::ConfigInvalid {
                section: "web".into(),
                key: "listen".into(),
                reason: "not a socket address".into(),
            };
            eprintln!("error: {err}");
            return (&err).into();
        }
    };

    // Stage 4: Assemble router and serve
    let uploads_dir = blobs.dir().to_path_buf();
    let state = Arc::new(AppState {
        store: Arc::new(store),
        blobs: Arc::new(blobs),
        gate,
        uploads_dir,
    });
    let router = build_router(state);

    eprintln!("Starting API server on {addr}");

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let served: Result<(), std::io::Error> = runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await
    });

    match served {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: server terminated: {e}");
            ExitCode::from(1)
        }
    }
}

fn run_init_db(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let store = match SqliteStore::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    match store.initialize_schema() {
        Ok(()) => {
            eprintln!("Database schema initialized");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_hash_password() -> ExitCode {
    use std::io::{self, BufRead};

    eprintln!("Enter password to hash:");
    let stdin = io::stdin();
    let line = stdin.lock().lines().next();
    let input = match line {
        Some(Ok(p)) => p,
        Some(Err(e)) => {
            eprintln!("error: failed to read password: {e}");
            return ExitCode::from(1);
        }
        None => String::new(),
    };

    match password::hash_password(&input) {
        Ok(hash) => {
            println!("{hash}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
