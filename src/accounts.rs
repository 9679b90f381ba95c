//! Seller account credential loading.
//!
//! Credentials live in a Google spreadsheet, one row per store:
//! `store name | client_id | client_secret`, header on row 1. The named
//! worksheet is tried first, then the first sheet of the document. For
//! local development `ACCOUNTS_FILE` points at a JSON array instead.

use anyhow::{bail, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use crate::Settings;

/// Worksheet holding the credential rows.
pub const STORES_WORKSHEET: &str = "마켓정보";

/// One seller account, able to authenticate to the commerce API on its own.
/// Unique by store name; loaded once per session.
#[derive(Debug)]
pub struct Account {
    pub store_name: String,
    pub client_id: String,
    pub client_secret: SecretString,
}

impl Clone for Account {
    fn clone(&self) -> Self {
        Self {
            store_name: self.store_name.clone(),
            client_id: self.client_id.clone(),
            client_secret: SecretString::from(self.client_secret.expose_secret().to_owned()),
        }
    }
}

fn clean(v: &str) -> String {
    v.trim().to_string()
}

// ─────────────────────────────────────────────────────────
// Row parsing
// ─────────────────────────────────────────────────────────

/// Sheet rows → accounts. Row 1 is the header; rows with fewer than three
/// non-empty fields are skipped.
pub fn parse_rows(values: &[Vec<String>]) -> Vec<Account> {
    values
        .iter()
        .skip(1)
        .filter_map(|row| {
            if row.len() < 3 {
                return None;
            }
            let store_name = clean(&row[0]);
            let client_id = clean(&row[1]);
            let client_secret = clean(&row[2]);
            if store_name.is_empty() || client_id.is_empty() || client_secret.is_empty() {
                return None;
            }
            Some(Account {
                store_name,
                client_id,
                client_secret: SecretString::from(client_secret),
            })
        })
        .collect()
}

// ─────────────────────────────────────────────────────────
// Loading
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AccountRow {
    store_name: String,
    client_id: String,
    client_secret: String,
}

impl AccountRow {
    fn into_account(self) -> Option<Account> {
        let store_name = clean(&self.store_name);
        let client_id = clean(&self.client_id);
        let client_secret = clean(&self.client_secret);
        if store_name.is_empty() || client_id.is_empty() || client_secret.is_empty() {
            return None;
        }
        Some(Account {
            store_name,
            client_id,
            client_secret: SecretString::from(client_secret),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

async fn fetch_values(
    client: &reqwest::Client,
    sheets_base: &str,
    spreadsheet_key: &str,
    api_key: &str,
    range: &str,
) -> Result<Vec<Vec<String>>> {
    // Url::parse percent-encodes the non-ASCII worksheet name in the path.
    let url = Url::parse(&format!(
        "{sheets_base}/v4/spreadsheets/{spreadsheet_key}/values/{range}"
    ))
    .context("building sheets URL")?;

    let resp = client
        .get(url)
        .query(&[("key", api_key)])
        .send()
        .await
        .context("sheets request failed")?;
    if !resp.status().is_success() {
        bail!("sheets API returned {}", resp.status());
    }
    let body: ValuesResponse = resp.json().await.context("sheets response parse failed")?;
    Ok(body.values)
}

fn load_accounts_file(path: &str) -> Result<Vec<Account>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading accounts file {path}"))?;
    let rows: Vec<AccountRow> =
        serde_json::from_str(&raw).context("accounts file is not a JSON array of accounts")?;
    Ok(rows.into_iter().filter_map(AccountRow::into_account).collect())
}

/// Load the full account list for this session.
///
/// Missing configuration is fatal for the whole session — no partial
/// operation is attempted.
pub async fn load_accounts(client: &reqwest::Client, settings: &Settings) -> Result<Vec<Account>> {
    if let Some(path) = &settings.accounts_file {
        let accounts = load_accounts_file(path)?;
        info!("loaded {} account(s) from {path}", accounts.len());
        return Ok(accounts);
    }

    let (key, api_key) = match (&settings.spreadsheet_key, &settings.google_api_key) {
        (Some(k), Some(a)) => (k, a),
        _ => bail!(
            "no credential source configured — set SPREADSHEET_KEY and GOOGLE_API_KEY \
             (or ACCOUNTS_FILE for a local JSON file)"
        ),
    };

    let values = match fetch_values(client, &settings.sheets_base, key, api_key, STORES_WORKSHEET).await {
        Ok(v) => v,
        Err(err) => {
            warn!("worksheet '{STORES_WORKSHEET}' fetch failed ({err:#}); falling back to first sheet");
            fetch_values(client, &settings.sheets_base, key, api_key, "A:C").await?
        }
    };

    let accounts = parse_rows(&values);
    info!("loaded {} account(s) from spreadsheet", accounts.len());
    Ok(accounts)
}
