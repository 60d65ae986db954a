//! Interactive person registry console.
//!
//! # Responsibility
//! - Parse storage and logging options.
//! - Run the whole console session as one transaction: commit on exit,
//!   roll back on any failure.

use clap::Parser;
use log::{error, info};
use persona_core::{
    default_log_level, init_logging, DbConfig, SqliteConnectionProvider, SqlitePersonRepository,
    TransactionRunner,
};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

mod console;

use console::Console;

#[derive(Debug, Parser)]
#[command(name = "persona")]
#[command(about = "Manage person records inside one transaction", long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "PERSONA_DB", default_value = "persona.sqlite3")]
    db: PathBuf,

    /// Maximum lock wait per statement, in milliseconds
    #[arg(long, default_value_t = 5000)]
    busy_timeout_ms: u64,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when omitted
    #[arg(long)]
    log_dir: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }

    let config =
        DbConfig::new(&cli.db).with_busy_timeout(Duration::from_millis(cli.busy_timeout_ms));
    let provider = SqliteConnectionProvider::new(config);
    let repo = SqlitePersonRepository::new(&provider);
    let runner = TransactionRunner::new(&provider);

    let result = runner.run(|conn| {
        let mut console = Console::new(io::stdin().lock(), io::stdout().lock());
        console.run(&repo, conn)
    });

    match result {
        Ok(executed) => {
            info!("event=session_end module=cli status=ok commands={executed}");
            println!("committed ({executed} commands)");
        }
        Err(err) => {
            error!("event=session_end module=cli status=error error={err}");
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}
