use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;

use crate::config::Configuration;
use crate::error::{ImporterError, Result};
use crate::models::Transaction;

const BASE_URL: &str = "https://www.saltedge.com/api/v5";

// ---------------------------------------------------------------------------
// Credential precondition
// ---------------------------------------------------------------------------

pub fn credentials() -> Result<(String, String)> {
    let app_id = std::env::var("SALTEDGE_APP_ID").unwrap_or_default();
    let secret = std::env::var("SALTEDGE_SECRET").unwrap_or_default();
    if app_id.trim().is_empty() || secret.trim().is_empty() {
        return Err(ImporterError::Authentication(
            "SALTEDGE_APP_ID and SALTEDGE_SECRET are not both set".to_string(),
        ));
    }
    Ok((app_id.trim().to_string(), secret.trim().to_string()))
}

fn client(app_id: &str, secret: &str) -> Result<Client> {
    let mut headers = HeaderMap::new();
    let app_id = HeaderValue::from_str(app_id)
        .map_err(|_| ImporterError::Authentication("App-id contains invalid characters".to_string()))?;
    let secret = HeaderValue::from_str(secret)
        .map_err(|_| ImporterError::Authentication("Secret contains invalid characters".to_string()))?;
    headers.insert("App-id", app_id);
    headers.insert("Secret", secret);
    Ok(Client::builder().default_headers(headers).build()?)
}

// ---------------------------------------------------------------------------
// API payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiAccount {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub currency_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiTransaction {
    #[serde(default)]
    pub made_on: String,
    pub amount: f64,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub category: Option<String>,
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Fetches every account behind the configured connection and maps its
/// transactions to canonical rows. Discovered account ids are written back
/// into the configuration for the caller to persist.
pub fn convert(config: &mut Configuration) -> Result<Vec<Transaction>> {
    let (app_id, secret) = credentials()?;
    let client = client(&app_id, &secret)?;

    let connection = resolve_connection(config)?;
    let accounts = get_accounts(&client, &connection)?;
    log::debug!("connection {connection} links {} account(s)", accounts.len());
    config.accounts = accounts.iter().map(|a| a.id.clone()).collect();

    let mut transactions = Vec::new();
    for account in &accounts {
        let entries = get_transactions(&client, &connection, &account.id)?;
        transactions.extend(entries.iter().map(|entry| map_entry(account, entry)));
    }
    Ok(transactions)
}

/// A connection id of "0" is the provider's "nothing selected" placeholder.
pub fn resolve_connection(config: &Configuration) -> Result<String> {
    let connection = config.connection.trim();
    if connection.is_empty() || connection == "0" {
        return Err(ImporterError::Import(
            "no connection is linked yet; run `ledgerpipe link` first".to_string(),
        ));
    }
    Ok(connection.to_string())
}

fn get_accounts(client: &Client, connection: &str) -> Result<Vec<ApiAccount>> {
    let url = format!("{BASE_URL}/accounts?connection_id={connection}");
    let response = client.get(&url).send()?;
    if !response.status().is_success() {
        return Err(ImporterError::Import(format!(
            "GET {url} returned {}",
            response.status()
        )));
    }
    let envelope: DataEnvelope<Vec<ApiAccount>> = response
        .json()
        .map_err(|e| ImporterError::Import(format!("malformed accounts payload: {e}")))?;
    Ok(envelope.data)
}

fn get_transactions(client: &Client, connection: &str, account: &str) -> Result<Vec<ApiTransaction>> {
    let url = format!("{BASE_URL}/transactions?connection_id={connection}&account_id={account}");
    let response = client.get(&url).send()?;
    if !response.status().is_success() {
        return Err(ImporterError::Import(format!(
            "GET {url} returned {}",
            response.status()
        )));
    }
    let envelope: DataEnvelope<Vec<ApiTransaction>> = response
        .json()
        .map_err(|e| ImporterError::Import(format!("malformed transactions payload: {e}")))?;
    Ok(envelope.data)
}

// ---------------------------------------------------------------------------
// Payload mapping
// ---------------------------------------------------------------------------

pub fn map_entry(account: &ApiAccount, entry: &ApiTransaction) -> Transaction {
    let account_name = if account.name.is_empty() {
        account.id.clone()
    } else {
        account.name.clone()
    };
    let (source_account, destination_account) = if entry.amount < 0.0 {
        (Some(account_name), None)
    } else {
        (None, Some(account_name))
    };

    Transaction {
        date: entry.made_on.clone(),
        description: entry.description.clone(),
        amount: entry.amount,
        currency_code: entry
            .currency_code
            .clone()
            .or_else(|| account.currency_code.clone())
            .map(|c| c.to_uppercase()),
        source_account,
        destination_account,
        notes: match (entry.status.as_str(), &entry.category) {
            ("pending", _) => Some("pending".to_string()),
            (_, Some(category)) => Some(category.clone()),
            _ => None,
        },
    }
}

/// Verifies the stored connection by fetching its accounts and writing the
/// account ids back. Connections themselves are created upstream during the
/// provider's consent flow.
pub fn link(config: &mut Configuration) -> Result<Vec<String>> {
    let (app_id, secret) = credentials()?;
    let client = client(&app_id, &secret)?;
    let connection = resolve_connection(config).map_err(|_| {
        ImporterError::Configuration(
            "set `connection` to a Salt Edge connection id before linking".to_string(),
        )
    })?;
    let accounts = get_accounts(&client, &connection)?;
    config.accounts = accounts.iter().map(|a| a.id.clone()).collect();
    Ok(config.accounts.clone())
}
