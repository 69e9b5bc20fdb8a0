use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;

use crate::config::Configuration;
use crate::error::{ImporterError, Result};
use crate::models::Transaction;

const BASE_URL: &str = "https://bankaccountdata.gocardless.com/api/v2";

// ---------------------------------------------------------------------------
// Token precondition
// ---------------------------------------------------------------------------

/// Token acquisition happens out-of-band; this adapter only checks the
/// precondition and never attempts a call without it.
pub fn access_token() -> Result<String> {
    match std::env::var("GOCARDLESS_ACCESS_TOKEN") {
        Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(ImporterError::Authentication(
            "GOCARDLESS_ACCESS_TOKEN is not set".to_string(),
        )),
    }
}

fn client(token: &str) -> Result<Client> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
        ImporterError::Authentication("access token contains invalid characters".to_string())
    })?;
    headers.insert(AUTHORIZATION, value);
    Ok(Client::builder().default_headers(headers).build()?)
}

// ---------------------------------------------------------------------------
// API payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Requisition {
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    transactions: TransactionBuckets,
}

#[derive(Debug, Deserialize)]
pub struct TransactionBuckets {
    #[serde(default)]
    pub booked: Vec<ApiTransaction>,
    #[serde(default)]
    pub pending: Vec<ApiTransaction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTransaction {
    pub transaction_amount: AmountBlock,
    #[serde(default)]
    pub booking_date: Option<String>,
    #[serde(default)]
    pub value_date: Option<String>,
    #[serde(default)]
    pub remittance_information_unstructured: Option<String>,
    #[serde(default)]
    pub creditor_name: Option<String>,
    #[serde(default)]
    pub debtor_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AmountBlock {
    pub amount: String,
    pub currency: String,
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Fetches all transactions behind the configured requisition and maps them
/// to canonical rows. The discovered account list is written back into the
/// configuration for the caller to persist.
pub fn convert(config: &mut Configuration) -> Result<Vec<Transaction>> {
    let token = access_token()?;
    let client = client(&token)?;

    let requisition_id = resolve_requisition(config)?;
    let requisition = get_requisition(&client, &requisition_id)?;
    log::debug!(
        "requisition {} ({}) links {} account(s)",
        requisition.id,
        requisition.status,
        requisition.accounts.len()
    );
    config.accounts = requisition.accounts.clone();

    let mut transactions = Vec::new();
    for account in &requisition.accounts {
        let buckets = get_transactions(&client, account)?;
        transactions.extend(map_transactions(account, &buckets));
    }
    Ok(transactions)
}

/// Exactly one stored requisition is usable mid-conversion. Zero means the
/// link step never ran; more than one has no defined selection rule.
pub fn resolve_requisition(config: &Configuration) -> Result<String> {
    if config.requisitions.len() > 1 {
        return Err(ImporterError::Import(format!(
            "expected exactly one requisition, found {}",
            config.requisitions.len()
        )));
    }
    match config.requisitions.values().next() {
        Some(id) => Ok(id.clone()),
        None => Err(ImporterError::Import(
            "no requisition is linked yet; run `ledgerpipe link` first".to_string(),
        )),
    }
}

fn get_requisition(client: &Client, id: &str) -> Result<Requisition> {
    let url = format!("{BASE_URL}/requisitions/{id}/");
    let response = client.get(&url).send()?;
    if !response.status().is_success() {
        return Err(ImporterError::Import(format!(
            "GET {url} returned {}",
            response.status()
        )));
    }
    response
        .json()
        .map_err(|e| ImporterError::Import(format!("malformed requisition payload: {e}")))
}

fn get_transactions(client: &Client, account: &str) -> Result<TransactionBuckets> {
    let url = format!("{BASE_URL}/accounts/{account}/transactions/");
    let response = client.get(&url).send()?;
    if !response.status().is_success() {
        return Err(ImporterError::Import(format!(
            "GET {url} returned {}",
            response.status()
        )));
    }
    let parsed: TransactionsResponse = response
        .json()
        .map_err(|e| ImporterError::Import(format!("malformed transactions payload: {e}")))?;
    Ok(parsed.transactions)
}

// ---------------------------------------------------------------------------
// Payload mapping
// ---------------------------------------------------------------------------

pub fn map_transactions(account: &str, buckets: &TransactionBuckets) -> Vec<Transaction> {
    let mut result = Vec::new();
    for entry in &buckets.booked {
        result.push(map_entry(account, entry, false));
    }
    for entry in &buckets.pending {
        result.push(map_entry(account, entry, true));
    }
    result
}

fn map_entry(account: &str, entry: &ApiTransaction, pending: bool) -> Transaction {
    let amount = entry.transaction_amount.amount.parse::<f64>().unwrap_or(0.0);
    let date = entry
        .booking_date
        .clone()
        .or_else(|| entry.value_date.clone())
        .unwrap_or_default();

    let counterparty = if amount < 0.0 {
        entry.creditor_name.clone()
    } else {
        entry.debtor_name.clone()
    };
    let description = entry
        .remittance_information_unstructured
        .clone()
        .filter(|d| !d.trim().is_empty())
        .or_else(|| counterparty.clone())
        .unwrap_or_else(|| "(no description)".to_string());

    let (source_account, destination_account) = if amount < 0.0 {
        (Some(account.to_string()), counterparty)
    } else {
        (counterparty, Some(account.to_string()))
    };

    Transaction {
        date,
        description,
        amount,
        currency_code: Some(entry.transaction_amount.currency.to_uppercase()),
        source_account,
        destination_account,
        notes: pending.then(|| "pending".to_string()),
    }
}

// ---------------------------------------------------------------------------
// Linking
// ---------------------------------------------------------------------------

pub struct LinkOutcome {
    pub reference: String,
    pub requisition_id: String,
    pub link: Option<String>,
    pub created: bool,
    pub accounts: Vec<String>,
}

/// Reuses the single stored requisition (refreshing its account list), or
/// creates exactly one new requisition under a fresh reference. The end-user
/// consent flow behind the returned link stays out of this crate.
pub fn link(config: &mut Configuration) -> Result<LinkOutcome> {
    let token = access_token()?;
    let client = client(&token)?;

    if config.requisitions.len() > 1 {
        return Err(ImporterError::Import(format!(
            "expected at most one requisition, found {}",
            config.requisitions.len()
        )));
    }
    if let Some((reference, id)) = config
        .requisitions
        .iter()
        .next()
        .map(|(r, i)| (r.clone(), i.clone()))
    {
        let requisition = get_requisition(&client, &id)?;
        config.accounts = requisition.accounts.clone();
        return Ok(LinkOutcome {
            reference,
            requisition_id: id,
            link: requisition.link,
            created: false,
            accounts: requisition.accounts,
        });
    }

    if config.bank.is_empty() {
        return Err(ImporterError::Configuration(
            "no bank selected for the gocardless flow".to_string(),
        ));
    }
    let reference = uuid::Uuid::new_v4().to_string();
    log::debug!("creating requisition with reference {reference}");
    let requisition = create_requisition(&client, &config.bank, &reference, &config.redirect_url)?;
    config
        .requisitions
        .insert(reference.clone(), requisition.id.clone());
    Ok(LinkOutcome {
        reference,
        requisition_id: requisition.id,
        link: requisition.link,
        created: true,
        accounts: Vec::new(),
    })
}

fn create_requisition(
    client: &Client,
    bank: &str,
    reference: &str,
    redirect_url: &str,
) -> Result<Requisition> {
    let url = format!("{BASE_URL}/requisitions/");
    let body = serde_json::json!({
        "institution_id": bank,
        "reference": reference,
        "redirect": redirect_url,
    });
    let response = client.post(&url).json(&body).send()?;
    if !response.status().is_success() {
        return Err(ImporterError::Import(format!(
            "POST {url} returned {}",
            response.status()
        )));
    }
    response
        .json()
        .map_err(|e| ImporterError::Import(format!("malformed requisition payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn config_with_requisitions(pairs: &[(&str, &str)]) -> Configuration {
        let mut requisitions = BTreeMap::new();
        for (reference, id) in pairs {
            requisitions.insert(reference.to_string(), id.to_string());
        }
        Configuration {
            flow: "gocardless".to_string(),
            csv_file: None,
            delimiter: "comma".to_string(),
            has_headers: true,
            roles: BTreeMap::new(),
            specifics: Vec::new(),
            map_all_data: false,
            default_currency: None,
            bank: "SANDBOXFINANCE_SFIN0000".to_string(),
            redirect_url: String::new(),
            requisitions,
            connection: String::new(),
            accounts: Vec::new(),
        }
    }

    #[test]
    fn test_resolve_requisition_reuses_single_reference() {
        let config = config_with_requisitions(&[("ref-1", "req-id-1")]);
        assert_eq!(resolve_requisition(&config).unwrap(), "req-id-1");
    }

    #[test]
    fn test_resolve_requisition_zero_references_needs_linking() {
        let config = config_with_requisitions(&[]);
        let err = resolve_requisition(&config).unwrap_err();
        assert!(matches!(err, ImporterError::Import(msg) if msg.contains("link")));
    }

    #[test]
    fn test_resolve_requisition_multiple_references_is_an_error() {
        let config = config_with_requisitions(&[("ref-1", "a"), ("ref-2", "b")]);
        let err = resolve_requisition(&config).unwrap_err();
        assert!(matches!(err, ImporterError::Import(msg) if msg.contains("exactly one")));
    }

    #[test]
    fn test_map_transactions_booked_and_pending() {
        let buckets: TransactionBuckets = serde_json::from_str(
            r#"{
                "booked": [{
                    "transactionAmount": {"amount": "-12.34", "currency": "eur"},
                    "bookingDate": "2025-01-15",
                    "remittanceInformationUnstructured": "ALBERT HEIJN 1403",
                    "creditorName": "Albert Heijn"
                }],
                "pending": [{
                    "transactionAmount": {"amount": "1500.00", "currency": "EUR"},
                    "valueDate": "2025-01-16",
                    "debtorName": "ACME Corp"
                }]
            }"#,
        )
        .unwrap();
        let transactions = map_transactions("acct-1", &buckets);
        assert_eq!(transactions.len(), 2);

        let booked = &transactions[0];
        assert_eq!(booked.date, "2025-01-15");
        assert_eq!(booked.amount, -12.34);
        assert_eq!(booked.currency_code.as_deref(), Some("EUR"));
        assert_eq!(booked.description, "ALBERT HEIJN 1403");
        assert_eq!(booked.source_account.as_deref(), Some("acct-1"));
        assert_eq!(booked.destination_account.as_deref(), Some("Albert Heijn"));
        assert_eq!(booked.notes, None);

        let pending = &transactions[1];
        assert_eq!(pending.date, "2025-01-16");
        assert_eq!(pending.amount, 1500.0);
        assert_eq!(pending.description, "ACME Corp");
        assert_eq!(pending.source_account.as_deref(), Some("ACME Corp"));
        assert_eq!(pending.destination_account.as_deref(), Some("acct-1"));
        assert_eq!(pending.notes.as_deref(), Some("pending"));
    }

    #[test]
    fn test_map_entry_without_dates_or_description() {
        let buckets: TransactionBuckets = serde_json::from_str(
            r#"{"booked": [{"transactionAmount": {"amount": "0.01", "currency": "EUR"}}]}"#,
        )
        .unwrap();
        let transactions = map_transactions("acct-1", &buckets);
        assert_eq!(transactions[0].date, "");
        assert_eq!(transactions[0].description, "(no description)");
    }
}
