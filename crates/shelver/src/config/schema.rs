use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Hard cap on the worker pool, whatever the host reports.
pub const MAX_WORKER_COUNT: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Configuration format version; currently always "1.0".
    pub version: String,
    /// Share root under which the `DOCS<year>/<Mon>` layout lives.
    pub root_directory: String,
    /// SQLite database path. Defaults to `~/.shelver/data/shelver.db`.
    #[serde(default)]
    pub database_path: Option<String>,
    /// Number of documents per worker batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Number of concurrent worker threads.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Wall-clock cutoff after which no further batches start.
    pub cutoff: CutoffConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutoffConfig {
    /// Day of week, e.g. "Saturday" or "sat".
    pub day: String,
    /// Local hour (0-23) at or after which the cutoff applies.
    pub hour: u32,
}

impl CutoffConfig {
    /// Parses the configured day name. `None` for unknown names.
    pub fn weekday(&self) -> Option<Weekday> {
        parse_weekday(&self.day)
    }
}

fn default_batch_size() -> usize {
    50
}

fn default_worker_count() -> usize {
    num_cpus::get().min(MAX_WORKER_COUNT)
}

/// Day-name table, full names and three-letter abbreviations,
/// case-insensitive. Kept local so config parsing never depends on locale.
pub fn parse_weekday(name: &str) -> Option<Weekday> {
    match name.to_ascii_lowercase().as_str() {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weekday_full_names() {
        assert_eq!(parse_weekday("Saturday"), Some(Weekday::Sat));
        assert_eq!(parse_weekday("monday"), Some(Weekday::Mon));
        assert_eq!(parse_weekday("SUNDAY"), Some(Weekday::Sun));
    }

    #[test]
    fn test_parse_weekday_abbreviations() {
        assert_eq!(parse_weekday("sat"), Some(Weekday::Sat));
        assert_eq!(parse_weekday("Fri"), Some(Weekday::Fri));
    }

    #[test]
    fn test_parse_weekday_rejects_unknown() {
        assert_eq!(parse_weekday("someday"), None);
        assert_eq!(parse_weekday(""), None);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(default_batch_size(), 50);
        let workers = default_worker_count();
        assert!(workers >= 1);
        assert!(workers <= MAX_WORKER_COUNT);
    }
}
