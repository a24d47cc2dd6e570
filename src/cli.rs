use chrono::{DateTime, FixedOffset, NaiveDate};
use chrono_tz::Tz;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::DEFAULT_WINDOW_DAYS;
use crate::timestamp::parse_timezone;

/// CLI arguments for smart-task
#[derive(Parser)]
#[command(name = "smart-task")]
#[command(about = "Turn natural-language task messages into tracker records and daily digests")]
#[command(version)]
pub struct Cli {
    /// Reference timezone for dates (IANA timezone, e.g., "Asia/Tokyo")
    #[arg(long, global = true, env = "TASK_TIMEZONE", default_value = "Asia/Tokyo", value_parser = validate_timezone)]
    pub tz: Tz,

    /// Log debug events to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve a due expression ("明日", "金曜", "2025-06-10") to a date
    Normalize {
        value: String,

        /// Reference date (YYYY-MM-DD format, defaults to today in --tz)
        #[arg(long, value_parser = validate_date)]
        today: Option<NaiveDate>,
    },

    /// Print the extraction prompt for a message
    Prompt {
        text: String,

        #[arg(long, value_parser = validate_date)]
        today: Option<NaiveDate>,
    },

    /// Turn a saved model reply into a task store payload
    ParseReply {
        /// Original message, used as title when the reply has none
        #[arg(long)]
        text: String,

        /// File with the model reply (stdin if not specified)
        #[arg(long)]
        input: Option<PathBuf>,

        #[arg(long, value_parser = validate_date)]
        today: Option<NaiveDate>,

        /// Where the task came from
        #[arg(long)]
        source: Option<String>,

        /// Emit a full create-page body for this database
        #[arg(long, env = "NOTION_DATABASE_ID")]
        database_id: Option<String>,
    },

    /// Inspect a saved chat webhook body
    Webhook {
        /// File with the webhook body (stdin if not specified)
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Bucket stored tasks and render the daily digest
    Digest {
        /// File with a task query response or a JSON array of tasks (stdin if not specified)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Reference instant (RFC 3339, defaults to now)
        #[arg(long, value_parser = validate_now)]
        now: Option<DateTime<FixedOffset>>,

        /// Days after today still counted as upcoming
        #[arg(long, env = "DIGEST_WINDOW_DAYS", default_value_t = DEFAULT_WINDOW_DAYS)]
        window: u32,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Wrap the rendered text in a push request for this recipient
        #[arg(long)]
        push_to: Option<String>,
    },

    /// Validate configuration from the environment
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Validate date format (YYYY-MM-DD)
fn validate_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{s}': {e}. Use YYYY-MM-DD format"))
}

/// Validate an RFC 3339 instant
fn validate_now(s: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(s)
        .map_err(|e| format!("Invalid instant '{s}': {e}. Use RFC 3339, e.g. 2025-06-10T08:00:00+09:00"))
}

fn validate_timezone(s: &str) -> Result<Tz, String> {
    parse_timezone(s).ok_or_else(|| format!("Unknown timezone '{s}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_validate_date() {
        assert_eq!(validate_date("2025-06-10"), Ok(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()));
        assert!(validate_date("10/06/2025").is_err());
    }

    #[test]
    fn test_validate_now() {
        assert!(validate_now("2025-06-10T08:00:00+09:00").is_ok());
        assert!(validate_now("2025-06-10").is_err());
    }

    #[test]
    fn test_digest_args() {
        let cli = Cli::try_parse_from([
            "smart-task",
            "digest",
            "--now",
            "2025-06-10T08:00:00+09:00",
            "--window",
            "5",
            "--format",
            "json",
            "--tz",
            "Europe/Moscow",
        ])
        .unwrap();
        assert_eq!(cli.tz, chrono_tz::Europe::Moscow);
        match cli.command {
            Command::Digest { window, format, now, .. } => {
                assert_eq!(window, 5);
                assert_eq!(format, OutputFormat::Json);
                assert!(now.is_some());
            }
            _ => panic!("expected digest"),
        }
    }

    #[test]
    fn test_rejects_unknown_timezone() {
        assert!(Cli::try_parse_from(["smart-task", "--tz", "Mars/Base", "config"]).is_err());
    }
}
