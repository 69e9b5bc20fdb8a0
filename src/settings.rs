use std::path::PathBuf;

/// Root directory for the job database and persisted batches.
/// `LEDGERPIPE_DATA_DIR` overrides the default, which also makes tests cheap
/// to isolate.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LEDGERPIPE_DATA_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ledgerpipe")
}

pub fn db_path() -> PathBuf {
    data_dir().join("ledgerpipe.db")
}

/// Directory holding one `<identifier>.json` artifact per finished job.
pub fn jobs_dir() -> PathBuf {
    data_dir().join("jobs")
}
