//! Append-only JSON Lines log of acquisition runs.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::Path;

use adbot_acquire::AnnotatedAd;
use adbot_core::{AdRecord, EmptyReason, FailureKind, FetchResult, Strategy};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of how a run ended, without the ads themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub(crate) enum Outcome {
    Found {
        count: usize,
        interrupted: Option<FailureKind>,
    },
    Empty {
        reason: EmptyReason,
    },
}

impl From<&FetchResult> for Outcome {
    fn from(result: &FetchResult) -> Self {
        match result {
            FetchResult::Found { ads, interrupted } => Outcome::Found {
                count: ads.len(),
                interrupted: *interrupted,
            },
            FetchResult::Empty { reason } => Outcome::Empty { reason: *reason },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Annotation {
    pub url: String,
    pub promo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LogEntry {
    pub created_at: DateTime<Utc>,
    pub keywords: Vec<String>,
    pub strategy: Strategy,
    pub outcome: Outcome,
    pub ads: Vec<AdRecord>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl LogEntry {
    pub(crate) fn new(keywords: &[String], strategy: Strategy, result: &FetchResult) -> Self {
        Self {
            created_at: Utc::now(),
            keywords: keywords.to_vec(),
            strategy,
            outcome: Outcome::from(result),
            ads: result.ads().to_vec(),
            annotations: Vec::new(),
        }
    }

    pub(crate) fn with_annotations(mut self, annotated: &[AnnotatedAd]) -> Self {
        self.annotations = annotated
            .iter()
            .filter_map(|a| {
                a.promo.as_ref().map(|promo| Annotation {
                    url: a.ad.url.clone(),
                    promo: promo.clone(),
                })
            })
            .collect();
        self
    }
}

/// Appends one entry as a single JSON line, creating the file if needed.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or written.
pub(crate) fn append(path: &Path, entry: &LogEntry) -> anyhow::Result<()> {
    let line = serde_json::to_string(entry).context("failed to serialize results-log entry")?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open results log {}", path.display()))?;
    writeln!(file, "{line}")
        .with_context(|| format!("failed to write results log {}", path.display()))?;
    Ok(())
}

/// Reads the last `limit` entries, oldest first. A missing file is an empty
/// log; unreadable lines are skipped.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub(crate) fn read_recent(path: &Path, limit: usize) -> anyhow::Result<Vec<LogEntry>> {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to open results log {}", path.display()))
        }
    };

    let mut entries = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("failed to read results log {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<LogEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => tracing::warn!(line = idx + 1, error = %e, "skipping unreadable results-log line"),
        }
    }

    let skip = entries.len().saturating_sub(limit);
    Ok(entries.split_off(skip))
}

#[cfg(test)]
mod tests {
    use super::*;
    use adbot_core::AdSource;
    use std::path::PathBuf;

    fn temp_log(name: &str) -> PathBuf {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        std::env::temp_dir().join(format!("adbot-{name}-{}-{nanos}.jsonl", std::process::id()))
    }

    fn ad(n: u32) -> AdRecord {
        AdRecord {
            title: format!("Офис {n}"),
            description: None,
            price: None,
            price_text: None,
            url: format!("https://www.avito.ru/ofis_{n}"),
            source: AdSource::Scrape,
            external_id: None,
            seller: None,
        }
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let path = temp_log("missing");
        assert!(read_recent(&path, 10).unwrap().is_empty());
    }

    #[test]
    fn appended_entries_read_back_newest_last() {
        let path = temp_log("append");
        let keywords = vec!["Офис".to_owned()];
        for n in 1..=3 {
            let result = FetchResult::from_accumulated(vec![ad(n)], None, 10);
            append(&path, &LogEntry::new(&keywords, Strategy::Scrape, &result)).unwrap();
        }

        let recent = read_recent(&path, 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].ads[0].title, "Офис 2");
        assert_eq!(recent[1].ads[0].title, "Офис 3");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn corrupt_lines_are_skipped() {
        let path = temp_log("corrupt");
        let result = FetchResult::failed(FailureKind::Auth);
        append(&path, &LogEntry::new(&["x".to_owned()], Strategy::Api, &result)).unwrap();
        std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .and_then(|mut f| writeln!(f, "{{not json"))
            .unwrap();

        let recent = read_recent(&path, 10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(
            recent[0].outcome,
            Outcome::Empty {
                reason: EmptyReason::Failed(FailureKind::Auth)
            }
        );
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn outcome_keeps_interruption() {
        let result = FetchResult::from_accumulated(vec![ad(1)], Some(FailureKind::Transport), 10);
        assert_eq!(
            Outcome::from(&result),
            Outcome::Found {
                count: 1,
                interrupted: Some(FailureKind::Transport)
            }
        );
    }

    #[test]
    fn only_successful_annotations_are_kept() {
        let result = FetchResult::from_accumulated(vec![ad(1), ad(2)], None, 10);
        let annotated = vec![
            AnnotatedAd {
                ad: ad(1),
                promo: Some("promo".to_owned()),
            },
            AnnotatedAd {
                ad: ad(2),
                promo: None,
            },
        ];
        let entry =
            LogEntry::new(&["x".to_owned()], Strategy::Scrape, &result).with_annotations(&annotated);
        assert_eq!(
            entry.annotations,
            vec![Annotation {
                url: "https://www.avito.ru/ofis_1".to_owned(),
                promo: "promo".to_owned()
            }]
        );
    }
}
