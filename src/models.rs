use serde::{Deserialize, Serialize};

/// Canonical transaction handed to the downstream ledger. One conversion run
/// produces an ordered batch of these, serialized as a JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: String,
    pub description: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    NotStarted,
    Running,
    Done,
    Errored,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Running => "running",
            Self::Done => "done",
            Self::Errored => "errored",
        }
    }

    /// Lenient parse for values read back from the status store; anything
    /// unrecognized collapses to `NotStarted`.
    pub fn parse(value: &str) -> JobStatus {
        match value {
            "running" => Self::Running,
            "done" => Self::Done,
            "errored" => Self::Errored,
            _ => Self::NotStarted,
        }
    }
}

/// Status record returned by the polling and conversion-start surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionStatus {
    pub status: JobStatus,
    pub job_identifier: String,
}

impl ConversionStatus {
    /// Zero-value status used when a poll arrives without an identifier.
    pub fn empty() -> Self {
        Self {
            status: JobStatus::NotStarted,
            job_identifier: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_round_trip() {
        for status in [JobStatus::NotStarted, JobStatus::Running, JobStatus::Done, JobStatus::Errored] {
            assert_eq!(JobStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn test_job_status_parse_unknown_is_not_started() {
        assert_eq!(JobStatus::parse("exploded"), JobStatus::NotStarted);
        assert_eq!(JobStatus::parse(""), JobStatus::NotStarted);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let status = ConversionStatus {
            status: JobStatus::NotStarted,
            job_identifier: "abc".to_string(),
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"not_started\""));
        assert!(json.contains("\"job_identifier\":\"abc\""));
    }

    #[test]
    fn test_transaction_round_trip_is_lossless() {
        let txn = Transaction {
            date: "2025-01-15".to_string(),
            description: "STRIPE PAYOUT".to_string(),
            amount: 2500.0,
            currency_code: Some("USD".to_string()),
            source_account: None,
            destination_account: Some("Business Checking".to_string()),
            notes: None,
        };
        let json = serde_json::to_string_pretty(&txn).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, txn);
    }
}
