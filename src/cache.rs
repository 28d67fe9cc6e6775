use crate::errors::AppResult;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tracing::error;

const COUNTER_PREFIX: &str = "quickRecord_";
const RESET_MARKER_KEY: &str = "lastResetDate";

fn counter_key(date: NaiveDate, person: &str) -> String {
    format!("{COUNTER_PREFIX}{date}_{person}")
}

/// String-keyed store holding the per-person daily counters and the last
/// reset marker. Entries look like `quickRecord_2024-03-01_Alice -> "3"`;
/// the rollover sweep is the only eviction mechanism.
#[derive(Debug)]
pub struct CounterCache {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl CounterCache {
    /// Loads the cache file, falling back to an empty cache when the file
    /// is missing or unreadable.
    pub async fn load(path: PathBuf) -> Self {
        let entries = match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(err) => {
                    error!("failed to parse cache file: {err}");
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                error!("failed to read cache file: {err}");
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            entries: BTreeMap::new(),
        }
    }

    pub async fn persist(&self) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let payload = serde_json::to_vec_pretty(&self.entries)?;
        fs::write(&self.path, payload).await?;
        Ok(())
    }

    /// Stored counter for the pair, or 0 when absent or unparsable.
    pub fn count(&self, date: NaiveDate, person: &str) -> u32 {
        self.entries
            .get(&counter_key(date, person))
            .and_then(|value| value.parse().ok())
            .unwrap_or(0)
    }

    pub fn set_count(&mut self, date: NaiveDate, person: &str, value: u32) {
        self.entries
            .insert(counter_key(date, person), value.to_string());
    }

    pub fn last_reset(&self) -> Option<&str> {
        self.entries.get(RESET_MARKER_KEY).map(String::as_str)
    }

    /// Drops every counter entry whose key does not carry today's date and
    /// records the sweep. A second call on the same day is a no-op.
    pub fn purge_stale(&mut self, today: NaiveDate) -> bool {
        let today_key = today.to_string();
        if self.last_reset() == Some(today_key.as_str()) {
            return false;
        }
        self.entries
            .retain(|key, _| !key.starts_with(COUNTER_PREFIX) || key.contains(&today_key));
        self.entries.insert(RESET_MARKER_KEY.to_string(), today_key);
        true
    }
}
