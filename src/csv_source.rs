use std::path::Path;

use crate::config::{ColumnRole, Configuration};
use crate::error::{ImporterError, Result};
use crate::models::Transaction;
use crate::specifics::{self, SpecificKind};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn parse_amount(raw: &str) -> f64 {
    let s = raw.replace(',', "").replace('"', "").replace(['$', '€'], "");
    let s = s.trim();
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return -inner.trim().parse::<f64>().unwrap_or(0.0);
    }
    s.parse().unwrap_or(0.0)
}

/// Normalize the date formats seen in bank exports to ISO. Unrecognized
/// values pass through unchanged so the downstream ledger can still flag them.
pub fn parse_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    for format in ["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y"] {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, format) {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }
    None
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// File conversion
// ---------------------------------------------------------------------------

/// Reads the configured delimited file, applies institution specifics to each
/// data row, then projects raw columns into canonical transactions through
/// the role mapping.
pub fn convert(config: &Configuration) -> Result<Vec<Transaction>> {
    let path = config.csv_file.as_deref().ok_or_else(|| {
        ImporterError::Configuration("no csv_file set for the csv flow".to_string())
    })?;
    read_file(Path::new(path), config)
}

fn read_file(path: &Path, config: &Configuration) -> Result<Vec<Transaction>> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(config.delimiter_byte())
        .from_reader(std::io::BufReader::new(file));

    let mut applied: Vec<SpecificKind> = Vec::new();
    for key in &config.specifics {
        applied.push(
            specifics::get_by_key(key).ok_or_else(|| ImporterError::UnknownSpecific(key.clone()))?,
        );
    }

    let mut transactions = Vec::new();
    let mut expected_len: Option<usize> = None;
    let mut header_pending = config.has_headers;

    for (index, record) in rdr.records().enumerate() {
        let record = record?;
        let mut row: Vec<String> = record.iter().map(|f| f.to_string()).collect();

        if header_pending {
            header_pending = false;
            let mut headers = row;
            for specific in &applied {
                headers = specific.run_on_headers(headers);
            }
            expected_len = Some(headers.len());
            continue;
        }
        if row.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        for specific in &applied {
            row = specific.run(row);
        }
        if let Some(expected) = expected_len {
            if row.len() != expected {
                return Err(ImporterError::MalformedRow {
                    index,
                    expected,
                    found: row.len(),
                });
            }
        }
        transactions.push(map_row(&row, config));
    }
    Ok(transactions)
}

fn map_row(row: &[String], config: &Configuration) -> Transaction {
    let mut txn = Transaction {
        date: String::new(),
        description: String::new(),
        amount: 0.0,
        currency_code: config.default_currency.clone(),
        source_account: None,
        destination_account: None,
        notes: None,
    };
    let mut debit: Option<f64> = None;
    let mut credit: Option<f64> = None;

    for (column, role) in &config.roles {
        let Some(value) = row.get(*column) else {
            continue;
        };
        let value = value.trim();
        match role {
            ColumnRole::Date => {
                txn.date = parse_date(value).unwrap_or_else(|| value.to_string());
            }
            ColumnRole::Description => txn.description = value.to_string(),
            ColumnRole::Amount => txn.amount = parse_amount(value),
            ColumnRole::AmountDebit => {
                if !value.is_empty() {
                    debit = Some(parse_amount(value));
                }
            }
            ColumnRole::AmountCredit => {
                if !value.is_empty() {
                    credit = Some(parse_amount(value));
                }
            }
            ColumnRole::SourceAccount => txn.source_account = non_empty(value),
            ColumnRole::DestinationAccount => txn.destination_account = non_empty(value),
            ColumnRole::CurrencyCode => {
                if !value.is_empty() {
                    txn.currency_code = Some(value.to_uppercase());
                }
            }
            ColumnRole::Note => txn.notes = non_empty(value),
            ColumnRole::Ignore => {}
        }
    }

    // Split debit/credit exports carry the sign in the column, not the value.
    if let Some(d) = debit {
        txn.amount = -d.abs();
    }
    if let Some(c) = credit {
        txn.amount = c.abs();
    }

    if config.map_all_data {
        let unmapped: Vec<&str> = row
            .iter()
            .enumerate()
            .filter(|(column, value)| !config.roles.contains_key(column) && !value.trim().is_empty())
            .map(|(_, value)| value.trim())
            .collect();
        if !unmapped.is_empty() {
            txn.notes = Some(match txn.notes {
                Some(notes) => format!("{notes} | {}", unmapped.join(" | ")),
                None => unmapped.join(" | "),
            });
        }
    }

    txn
}
