//! Multi-store dispatch-delay tool for the Naver-style commerce API.
//!
//! One operator, many seller accounts. Per order ID:
//!   accounts ──concurrent probes──→ Locator → winning (account, token) → Delay Executor → report row
//!
//! Order IDs are processed strictly one at a time; concurrency exists only
//! inside a single locate call.

pub mod accounts;
pub mod batch;
pub mod commerce;
pub mod server;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::accounts::Account;
use crate::commerce::locator::DEFAULT_MAX_PROBES;

// ─────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Settings {
    /// Commerce API host, no trailing slash.
    pub api_base: String,
    /// Google Sheets API host (overridable for tests).
    pub sheets_base: String,
    /// Spreadsheet holding the credential rows.
    pub spreadsheet_key: Option<String>,
    pub google_api_key: Option<String>,
    /// Local JSON credential file — takes precedence over the sheet.
    pub accounts_file: Option<String>,
    pub bind_addr: String,
    pub request_timeout_secs: u64,
    /// Cap on in-flight probes per locate call.
    pub max_probes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: "https://api.commerce.naver.com".into(),
            sheets_base: "https://sheets.googleapis.com".into(),
            spreadsheet_key: None,
            google_api_key: None,
            accounts_file: None,
            bind_addr: "0.0.0.0:8080".into(),
            request_timeout_secs: 30,
            max_probes: DEFAULT_MAX_PROBES,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let mut s = Self::default();
        if let Ok(v) = env::var("COMMERCE_API_BASE") { s.api_base = v; }
        if let Ok(v) = env::var("SHEETS_API_BASE")   { s.sheets_base = v; }
        s.spreadsheet_key = env::var("SPREADSHEET_KEY").ok();
        s.google_api_key = env::var("GOOGLE_API_KEY").ok();
        s.accounts_file = env::var("ACCOUNTS_FILE").ok();
        if let Ok(v) = env::var("BIND_ADDR") { s.bind_addr = v; }
        if let Ok(v) = env::var("REQUEST_TIMEOUT_SECS") { if let Ok(n) = v.parse() { s.request_timeout_secs = n; } }
        if let Ok(v) = env::var("MAX_PROBES")           { if let Ok(n) = v.parse() { s.max_probes = n; } }
        while s.api_base.ends_with('/') { s.api_base.pop(); }
        while s.sheets_base.ends_with('/') { s.sheets_base.pop(); }
        s
    }
}

// ─────────────────────────────────────────────────────────
// Shared state
// ─────────────────────────────────────────────────────────

/// Session state built once at startup and handed to the HTTP layer.
/// Accounts are immutable for the lifetime of the process.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub accounts: Arc<Vec<Account>>,
    pub http: reqwest::Client,
}

/// Single shared HTTP client; every outbound call inherits the fixed timeout.
pub fn build_http_client(timeout_secs: u64) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let s = Settings::default();
        assert_eq!(s.request_timeout_secs, 30);
        assert_eq!(s.max_probes, 20);
    }
}
