use std::{env, path::PathBuf, time::Duration};

const DEFAULT_API_URL: &str = "http://127.0.0.1:8888";
const DEFAULT_CACHE_PATH: &str = "data/quickrecord.json";
// Days roll over at midnight UTC+8 no matter where the client runs.
const DEFAULT_UTC_OFFSET_HOURS: i32 = 8;
const DEFAULT_RESYNC_DELAY_MS: u64 = 100;
const DEFAULT_PAGE_SIZE: usize = 25;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub cache_path: PathBuf,
    pub utc_offset_hours: i32,
    pub resync_delay: Duration,
    pub page_size: usize,
}

impl Config {
    pub fn from_env() -> Self {
        let api_url = env::var("QUICKRECORD_API_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let cache_path = env::var("QUICKRECORD_CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CACHE_PATH));

        let utc_offset_hours = env::var("QUICKRECORD_UTC_OFFSET")
            .ok()
            .and_then(|value| value.parse::<i32>().ok())
            .unwrap_or(DEFAULT_UTC_OFFSET_HOURS);

        let resync_delay = env::var("QUICKRECORD_RESYNC_DELAY_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RESYNC_DELAY_MS);

        let page_size = env::var("QUICKRECORD_PAGE_SIZE")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Self {
            api_url,
            cache_path,
            utc_offset_hours,
            resync_delay: Duration::from_millis(resync_delay),
            page_size,
        }
    }
}
