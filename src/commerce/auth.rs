//! OAuth2 client-credentials token issuance.
//!
//! The API authenticates a seller app by a keyed signature over
//! `"{client_id}_{timestamp_ms}"` using the client secret, base64-encoded
//! into the `client_secret_sign` form field. Tokens are short-lived and
//! re-issued on every probe; nothing is cached.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use serde::Deserialize;
use sha2::Sha256;
use tracing::warn;

use crate::accounts::Account;

const TOKEN_PATH: &str = "/external/v1/oauth2/token";

type HmacSha256 = Hmac<Sha256>;

pub fn sign_client_secret(client_id: &str, client_secret: &str, ts_ms: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(client_secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(format!("{client_id}_{ts_ms}").as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Issue a short-lived bearer token for one account.
///
/// Any failure (non-200, transport, parse) yields `None` — the caller
/// treats the account as unusable for this lookup and moves on.
pub async fn issue_token(
    client: &reqwest::Client,
    base_url: &str,
    account: &Account,
) -> Option<String> {
    let ts = Utc::now().timestamp_millis();
    let sign = sign_client_secret(&account.client_id, account.client_secret.expose_secret(), ts);
    let form = [
        ("grant_type", "client_credentials".to_string()),
        ("client_id", account.client_id.clone()),
        ("timestamp", ts.to_string()),
        ("client_secret_sign", sign),
        ("type", "SELF".to_string()),
    ];

    let resp = match client
        .post(format!("{base_url}{TOKEN_PATH}"))
        .form(&form)
        .send()
        .await
    {
        Ok(r) => r,
        Err(err) => {
            warn!("token request failed for {}: {err:?}", account.store_name);
            return None;
        }
    };
    if resp.status() != reqwest::StatusCode::OK {
        warn!(
            "token endpoint returned {} for {}",
            resp.status(),
            account.store_name
        );
        return None;
    }
    match resp.json::<TokenResponse>().await {
        Ok(body) => body.access_token,
        Err(err) => {
            warn!("token response parse failed for {}: {err:?}", account.store_name);
            None
        }
    }
}
