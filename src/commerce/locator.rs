//! Concurrent owner search across all seller accounts.
//!
//! The true owner of an order ID is unknown ahead of time and there is no
//! index, so every account is probed concurrently and the first positive
//! response wins. The in-flight cap bounds outbound connections only; it
//! is not needed for correctness.

use std::future::Future;

use futures::StreamExt;

use super::probe::{probe, LocateResult};
use crate::accounts::Account;

pub const DEFAULT_MAX_PROBES: usize = 20;

/// Fan `probe_fn` out over `accounts`, first `Some` wins.
///
/// Completions are consumed in arrival order, not submission order. Once a
/// winner arrives the stream is dropped, which abandons the remaining
/// in-flight probes — their results are never observed, so nothing can be
/// double-counted. All misses → `None`.
pub async fn locate_with<F, Fut>(
    accounts: &[Account],
    max_in_flight: usize,
    probe_fn: F,
) -> Option<LocateResult>
where
    F: Fn(Account) -> Fut,
    Fut: Future<Output = Option<LocateResult>>,
{
    let mut probes = futures::stream::iter(accounts.iter().cloned().map(probe_fn))
        .buffer_unordered(max_in_flight.max(1));

    while let Some(hit) = probes.next().await {
        if hit.is_some() {
            return hit;
        }
    }
    None
}

/// Locate the owning account of `order_id` across `accounts`.
pub async fn locate(
    client: &reqwest::Client,
    base_url: &str,
    accounts: &[Account],
    order_id: &str,
    max_in_flight: usize,
) -> Option<LocateResult> {
    locate_with(accounts, max_in_flight, |account| {
        let client = client.clone();
        let base_url = base_url.to_string();
        let order_id = order_id.to_string();
        async move { probe(&client, &base_url, &account, &order_id).await }
    })
    .await
}
