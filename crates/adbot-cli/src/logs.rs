//! `logs` command: print recent results-log entries.

use adbot_core::AppConfig;

use crate::results_log::{self, LogEntry, Outcome};

/// Prints up to `limit` of the most recent runs, oldest first.
///
/// # Errors
///
/// Returns an error if the results log exists but cannot be read.
pub(crate) fn run_logs(config: &AppConfig, limit: usize) -> anyhow::Result<()> {
    let entries = results_log::read_recent(&config.results_log_path, limit)?;
    if entries.is_empty() {
        println!(
            "no runs logged in {}; run `adbot search` first",
            config.results_log_path.display()
        );
        return Ok(());
    }

    let header = format!("{:<22}{:<8}{:<28}{:<8}KEYWORDS", "WHEN", "METHOD", "OUTCOME", "PROMOS");
    println!("{header}");
    for entry in &entries {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

fn format_entry(entry: &LogEntry) -> String {
    format!(
        "{:<22}{:<8}{:<28}{:<8}{}",
        entry.created_at.format("%Y-%m-%d %H:%M:%S"),
        entry.strategy,
        outcome_display(&entry.outcome),
        entry.annotations.len(),
        entry.keywords.join(", ")
    )
}

fn outcome_display(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Found {
            count,
            interrupted: None,
        } => format!("{count} ads"),
        Outcome::Found {
            count,
            interrupted: Some(kind),
        } => format!("{count} ads (partial: {kind})"),
        Outcome::Empty {
            reason: adbot_core::EmptyReason::NoMatch,
        } => "no match".to_owned(),
        Outcome::Empty {
            reason: adbot_core::EmptyReason::Failed(kind),
        } => format!("failed: {kind}"),
    }
}
