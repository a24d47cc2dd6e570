use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use clap::Parser;
use serde_json::{json, Value};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use smart_task_parser::agenda::bucketize;
use smart_task_parser::cli::{Cli, Command, OutputFormat};
use smart_task_parser::config::Config;
use smart_task_parser::extract::{build_prompt, parse_model_reply};
use smart_task_parser::logging::init_logging;
use smart_task_parser::push::{is_verification_ping, push_payload, text_messages};
use smart_task_parser::render::render_daily_summary;
use smart_task_parser::service::draft_task;
use smart_task_parser::store::{create_page_body, page_properties, query_results, summary_from_record};
use smart_task_parser::timestamp::{normalize, today_in};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let tz = cli.tz;
    let output = match cli.command {
        Command::Normalize { value, today } => {
            let today = today.unwrap_or_else(|| current_date(tz));
            normalize(Some(value.as_str()), today)
                .map(|resolved| resolved.into_owned())
                .unwrap_or_else(|| "null".to_string())
        }
        Command::Prompt { text, today } => build_prompt(&text, today.unwrap_or_else(|| current_date(tz))),
        Command::ParseReply {
            text,
            input,
            today,
            source,
            database_id,
        } => {
            let reply = read_input(input.as_ref())?;
            let extracted = parse_model_reply(&reply).context("Failed to parse model reply")?;
            let today = today.unwrap_or_else(|| current_date(tz));
            let draft = draft_task(extracted, &text, source.as_deref(), today, tz);
            let body = match database_id {
                Some(id) => create_page_body(&id, &draft),
                None => page_properties(&draft),
            };
            serde_json::to_string_pretty(&body)?
        }
        Command::Webhook { input } => {
            let body = read_input(input.as_ref())?;
            let report = if is_verification_ping(&body) {
                json!({ "verification": true, "messages": [] })
            } else {
                let messages = text_messages(&body).context("Webhook body is not valid JSON")?;
                json!({ "verification": false, "messages": messages })
            };
            serde_json::to_string_pretty(&report)?
        }
        Command::Digest {
            input,
            now,
            window,
            format,
            push_to,
        } => {
            let raw = read_input(input.as_ref())?;
            let response: Value = serde_json::from_str(&raw).context("Task input is not valid JSON")?;
            let summaries = query_results(&response)
                .iter()
                .map(summary_from_record)
                .collect::<Vec<_>>();

            let now = now
                .map(|n| n.with_timezone(&tz))
                .unwrap_or_else(|| Utc::now().with_timezone(&tz));
            let buckets = bucketize(summaries, now, window);

            match (format, push_to) {
                (OutputFormat::Json, _) => serde_json::to_string_pretty(&buckets)?,
                (OutputFormat::Text, Some(to)) => {
                    let text = render_daily_summary(&buckets, tz, window);
                    serde_json::to_string_pretty(&push_payload(&to, &text))?
                }
                (OutputFormat::Text, None) => render_daily_summary(&buckets, tz, window),
            }
        }
        Command::Config => {
            let config = Config::from_env().context("Configuration is incomplete")?;
            format!(
                "configuration OK\ntimezone: {}\nwindow days: {}\nquery limit: {}\ndigest recipient: {}",
                config.digest.timezone,
                config.digest.window_days,
                config.digest.query_limit,
                config.digest_recipient().unwrap_or("(not set)"),
            )
        }
    };

    println!("{output}");
    Ok(())
}

fn current_date(tz: Tz) -> NaiveDate {
    today_in(Utc::now(), tz)
}

/// Read a file, or stdin when no path is given
fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}
