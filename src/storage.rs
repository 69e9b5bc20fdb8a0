use std::path::{Path, PathBuf};

use crate::error::{ImporterError, Result};
use crate::models::Transaction;

/// The artifact key is derived from the identifier alone, so polling and
/// retrieval never need the configuration again.
pub fn artifact_path(jobs_dir: &Path, identifier: &str) -> PathBuf {
    jobs_dir.join(format!("{identifier}.json"))
}

/// Writes the finished batch as pretty-printed JSON. The write goes through a
/// temp file and a rename, so the artifact is either the full batch or absent.
/// Overwrites any prior artifact for the same identifier.
pub fn save(jobs_dir: &Path, identifier: &str, transactions: &[Transaction]) -> Result<()> {
    std::fs::create_dir_all(jobs_dir).map_err(|e| ImporterError::Persistence(e.to_string()))?;
    let json = serde_json::to_string_pretty(transactions)
        .map_err(|e| ImporterError::Persistence(e.to_string()))?;

    let target = artifact_path(jobs_dir, identifier);
    let staging = jobs_dir.join(format!(".{identifier}.json.tmp"));
    std::fs::write(&staging, format!("{json}\n"))
        .map_err(|e| ImporterError::Persistence(e.to_string()))?;
    std::fs::rename(&staging, &target).map_err(|e| ImporterError::Persistence(e.to_string()))?;
    Ok(())
}

/// Read a persisted batch back; this is the hand-off point for the
/// downstream ledger.
#[allow(dead_code)]
pub fn load(jobs_dir: &Path, identifier: &str) -> Result<Vec<Transaction>> {
    let content = std::fs::read_to_string(artifact_path(jobs_dir, identifier))?;
    serde_json::from_str(&content).map_err(|e| ImporterError::Persistence(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> Vec<Transaction> {
        vec![
            Transaction {
                date: "2025-01-15".to_string(),
                description: "ADOBE CREATIVE".to_string(),
                amount: -50.0,
                currency_code: Some("USD".to_string()),
                source_account: Some("Business Checking".to_string()),
                destination_account: None,
                notes: None,
            },
            Transaction {
                date: "2025-01-17".to_string(),
                description: "STRIPE PAYOUT".to_string(),
                amount: 2500.0,
                currency_code: Some("USD".to_string()),
                source_account: None,
                destination_account: Some("Business Checking".to_string()),
                notes: Some("pending".to_string()),
            },
        ]
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let jobs_dir = dir.path().join("jobs");
        save(&jobs_dir, "job-1", &batch()).unwrap();
        let loaded = load(&jobs_dir, "job-1").unwrap();
        assert_eq!(loaded, batch());
    }

    #[test]
    fn test_save_writes_pretty_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let jobs_dir = dir.path().join("jobs");
        save(&jobs_dir, "job-1", &batch()).unwrap();
        let content = std::fs::read_to_string(artifact_path(&jobs_dir, "job-1")).unwrap();
        assert!(content.starts_with("[\n"));
        assert!(content.contains("\"STRIPE PAYOUT\""));
    }

    #[test]
    fn test_save_overwrites_prior_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let jobs_dir = dir.path().join("jobs");
        save(&jobs_dir, "job-1", &batch()).unwrap();
        let replacement = vec![batch().remove(0)];
        save(&jobs_dir, "job-1", &replacement).unwrap();
        assert_eq!(load(&jobs_dir, "job-1").unwrap(), replacement);
    }

    #[test]
    fn test_save_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let jobs_dir = dir.path().join("jobs");
        save(&jobs_dir, "job-1", &batch()).unwrap();
        let leftovers: Vec<_> = std::fs::read_dir(&jobs_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_save_into_unwritable_dir_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        // a plain file where the jobs directory should be
        let jobs_dir = dir.path().join("jobs");
        std::fs::write(&jobs_dir, "not a directory").unwrap();
        let err = save(&jobs_dir, "job-1", &batch()).unwrap_err();
        assert!(matches!(err, ImporterError::Persistence(_)));
    }
}
