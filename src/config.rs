use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ImporterError, Result};
use crate::specifics;

/// Role a raw source column plays in the canonical transaction. Columns
/// without a role (or mapped to `_ignore`) are dropped during conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Date,
    Description,
    Amount,
    AmountDebit,
    AmountCredit,
    SourceAccount,
    DestinationAccount,
    CurrencyCode,
    Note,
    #[serde(rename = "_ignore")]
    Ignore,
}

/// Immutable-per-run description of one conversion: the selected flow, the
/// column role mapping, institution specifics, and source connection
/// parameters. Built upstream, passed by value into the routine manager.
/// The pipeline only writes back discovered account and requisition data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub flow: String,

    // csv flow
    #[serde(default)]
    pub csv_file: Option<String>,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_true")]
    pub has_headers: bool,
    #[serde(default)]
    pub roles: BTreeMap<usize, ColumnRole>,
    #[serde(default)]
    pub specifics: Vec<String>,
    #[serde(default)]
    pub map_all_data: bool,
    #[serde(default)]
    pub default_currency: Option<String>,

    // gocardless flow
    #[serde(default)]
    pub bank: String,
    #[serde(default)]
    pub redirect_url: String,
    /// Local reference -> requisition id, filled in by the link step.
    #[serde(default)]
    pub requisitions: BTreeMap<String, String>,

    // saltedge flow
    #[serde(default)]
    pub connection: String,

    /// Account ids discovered mid-flow; written back for the caller to persist.
    #[serde(default)]
    pub accounts: Vec<String>,
}

fn default_delimiter() -> String {
    "comma".to_string()
}

fn default_true() -> bool {
    true
}

impl Configuration {
    /// Fails fast on anything that would otherwise blow up mid-row: an
    /// unknown specific key never reaches row processing.
    pub fn validate(&self) -> Result<()> {
        for key in &self.specifics {
            if specifics::get_by_key(key).is_none() {
                return Err(ImporterError::UnknownSpecific(key.clone()));
            }
        }
        Ok(())
    }

    pub fn delimiter_byte(&self) -> u8 {
        match self.delimiter.as_str() {
            "semicolon" => b';',
            "tab" => b'\t',
            _ => b',',
        }
    }
}

pub fn load(path: &Path) -> Result<Configuration> {
    let content = std::fs::read_to_string(path)?;
    let config: Configuration = serde_json::from_str(&content)
        .map_err(|e| ImporterError::Configuration(format!("{}: {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}

pub fn save(config: &Configuration, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| ImporterError::Configuration(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}
