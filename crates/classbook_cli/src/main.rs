//! Command-line transport shell for classbook operations.
//!
//! # Responsibility
//! - Read one JSON request from the positional argument, or stdin when absent.
//! - Execute it against the store configured through flags or `CLASSBOOK_*`
//!   variables.
//! - Print the JSON response envelope to stdout.
//!
//! Exit codes: `0` when every operation succeeded, `1` when the response
//! carries errors, `2` when configuration or store setup fails.

use clap::Parser;
use classbook_core::config::{ENV_BUSY_TIMEOUT_MS, ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL};
use classbook_core::{execute_json, init_from_config, AppConfig, ConfigError, Store};
use log::info;
use std::io::Read;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "classbook")]
#[command(about = "Run classbook job, feature and dice operations", long_about = None)]
struct Cli {
    /// JSON request (`{"operations": [...]}`); read from stdin when omitted
    request: Option<String>,

    /// SQLite database file; an in-memory store is used when unset
    #[arg(long, env = ENV_DB_PATH)]
    db_path: Option<String>,

    /// Longest wait on a store lock, in milliseconds
    #[arg(long, env = ENV_BUSY_TIMEOUT_MS)]
    busy_timeout_ms: Option<String>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, env = ENV_LOG_LEVEL)]
    log_level: Option<String>,

    /// Absolute directory for rotated log files; logging is off when unset
    #[arg(long, env = ENV_LOG_DIR)]
    log_dir: Option<String>,
}

impl Cli {
    /// Validates the raw settings through the core configuration rules.
    fn app_config(&self) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|key| {
            let value = match key {
                ENV_DB_PATH => &self.db_path,
                ENV_BUSY_TIMEOUT_MS => &self.busy_timeout_ms,
                ENV_LOG_LEVEL => &self.log_level,
                ENV_LOG_DIR => &self.log_dir,
                _ => return None,
            };
            value.clone()
        })
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(message) => {
            eprintln!("classbook: {message}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, String> {
    let config = cli.app_config().map_err(|err| err.to_string())?;
    init_from_config(&config.log)?;

    let store = Store::open(&config.store).map_err(|err| format!("cannot open store: {err}"))?;
    info!(
        "event=cli_start module=cli status=ok persistent={}",
        store.path().is_some()
    );

    let raw = match cli.request {
        Some(request) => request,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|err| format!("cannot read request from stdin: {err}"))?;
            buffer
        }
    };

    let response = execute_json(&store, &raw);
    let rendered = serde_json::to_string_pretty(&response)
        .map_err(|err| format!("cannot render response: {err}"))?;
    println!("{rendered}");

    Ok(if response.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn positional_request_and_flags_are_parsed() {
        let cli = Cli::try_parse_from([
            "classbook",
            r#"{"operations": []}"#,
            "--db-path",
            "/tmp/classbook.sqlite3",
            "--busy-timeout-ms",
            "250",
        ])
        .unwrap();

        assert_eq!(cli.request.as_deref(), Some(r#"{"operations": []}"#));
        let config = cli.app_config().unwrap();
        assert_eq!(
            config.store.db_path,
            Some(PathBuf::from("/tmp/classbook.sqlite3"))
        );
        assert_eq!(config.store.busy_timeout, Duration::from_millis(250));
    }

    #[test]
    fn invalid_flag_values_are_config_errors() {
        let cli =
            Cli::try_parse_from(["classbook", "--busy-timeout-ms", "0", "--log-dir", "/tmp/logs"])
                .unwrap();
        assert!(matches!(
            cli.app_config(),
            Err(ConfigError::InvalidValue { key, .. }) if key == ENV_BUSY_TIMEOUT_MS
        ));
    }
}
