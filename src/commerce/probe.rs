//! Single-account order ownership probe.

use serde_json::{json, Value};
use tracing::{debug, warn};

use super::auth::issue_token;
use crate::accounts::Account;

const ORDER_QUERY_PATH: &str = "/external/v1/pay-order/seller/product-orders/query";

/// A positive probe: the account that owns the order, the token that proved
/// it, and the raw order payload. At most one per lookup.
#[derive(Debug, Clone)]
pub struct LocateResult {
    pub account: Account,
    pub token: String,
    pub payload: Value,
}

/// Ask one account whether it owns `order_id`.
///
/// `None` covers both "token unavailable" and "no matching order" — an
/// empty `data` array is a normal miss, not an error.
pub async fn probe(
    client: &reqwest::Client,
    base_url: &str,
    account: &Account,
    order_id: &str,
) -> Option<LocateResult> {
    let token = issue_token(client, base_url, account).await?;

    let resp = match client
        .post(format!("{base_url}{ORDER_QUERY_PATH}"))
        .bearer_auth(&token)
        .json(&json!({ "productOrderIds": [order_id] }))
        .send()
        .await
    {
        Ok(r) => r,
        Err(err) => {
            warn!("order query failed for {}: {err:?}", account.store_name);
            return None;
        }
    };
    if resp.status() != reqwest::StatusCode::OK {
        debug!(
            "order query returned {} for {}",
            resp.status(),
            account.store_name
        );
        return None;
    }

    let body: Value = match resp.json().await {
        Ok(v) => v,
        Err(err) => {
            warn!("order query parse failed for {}: {err:?}", account.store_name);
            return None;
        }
    };
    let owned = body
        .get("data")
        .and_then(|v| v.as_array())
        .map(|d| !d.is_empty())
        .unwrap_or(false);
    if !owned {
        return None;
    }

    debug!("🎯 {} owns order {order_id}", account.store_name);
    Some(LocateResult {
        account: account.clone(),
        token,
        payload: body,
    })
}
