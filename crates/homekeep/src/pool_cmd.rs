use anyhow::{Result, bail};
use hk_core::time::display;
use hk_core::{OutputFormat, StatusSnapshot};
use hk_pool::{StatusLog, TickOutcome};
use serde_json::{Value, json};

use crate::app::AppContext;

pub(crate) fn handle_pool_log(
    log: &StatusLog,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    if !log.exists() {
        bail!("No pool log found at {}", log.path().display());
    }
    let snapshots = match limit {
        Some(n) => log.read_recent(n)?,
        None => log.read_all()?,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshots)?),
        OutputFormat::Text => {
            for snapshot in &snapshots {
                println!("{}", format_snapshot(snapshot));
            }
        }
    }
    Ok(())
}

pub(crate) async fn handle_poll_once(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let Some(mut poller) = ctx.build_poller()? else {
        bail!("pool.status_url is not configured");
    };

    let outcome = poller.tick().await;
    let label = outcome_label(outcome);
    match format {
        OutputFormat::Json => println!("{}", json!({ "outcome": label })),
        OutputFormat::Text => println!("{label}"),
    }

    match outcome {
        TickOutcome::Logged => Ok(()),
        TickOutcome::FetchFailed => bail!("failed to read pool status"),
        TickOutcome::AppendFailed => {
            bail!("failed to append to {}", ctx.pool_log.path().display())
        }
    }
}

fn outcome_label(outcome: TickOutcome) -> &'static str {
    match outcome {
        TickOutcome::Logged => "logged",
        TickOutcome::FetchFailed => "fetch-failed",
        TickOutcome::AppendFailed => "append-failed",
    }
}

fn format_snapshot(snapshot: &StatusSnapshot) -> String {
    let mut line = display(&snapshot.logged_at);
    for (key, value) in &snapshot.payload {
        let value = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        line.push_str(&format!("  {key}={value}"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn test_format_snapshot() {
        let ts = FixedOffset::east_opt(7200)
            .unwrap()
            .with_ymd_and_hms(2025, 7, 1, 14, 0, 0)
            .unwrap();
        let payload = json!({"pump": "on", "temp": 28.5})
            .as_object()
            .cloned()
            .unwrap();
        let line = format_snapshot(&StatusSnapshot::new(payload, ts));
        assert!(line.starts_with("2025-07-01 14:00:00"));
        assert!(line.contains("  pump=on"));
        assert!(line.contains("  temp=28.5"));
    }

    #[test]
    fn test_pool_log_missing_file_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let log = StatusLog::new(tmp.path().join("pool.jsonl"));
        let err = handle_pool_log(&log, None, OutputFormat::Text).unwrap_err();
        assert!(err.to_string().starts_with("No pool log found"));
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(outcome_label(TickOutcome::Logged), "logged");
        assert_eq!(outcome_label(TickOutcome::FetchFailed), "fetch-failed");
    }
}
