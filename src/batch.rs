//! Sequential batch runner: one order ID fully processed (locate, then
//! delay) before the next begins. Input order is preserved in the report.

use std::collections::HashSet;
use std::time::Instant;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::accounts::Account;
use crate::commerce::delay::execute_delay;
use crate::commerce::locator::locate;

/// Split operator input on newlines and commas; trim, drop blanks, and
/// drop duplicates while preserving first-seen order.
pub fn parse_order_ids(input: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for raw in input.replace(',', "\n").split('\n') {
        let id = raw.trim();
        if id.is_empty() {
            continue;
        }
        if seen.insert(id.to_string()) {
            ids.push(id.to_string());
        }
    }
    ids
}

#[derive(Debug, Clone, Serialize)]
pub struct OutcomeRow {
    pub order_id: String,
    /// Owning store, or "-" when no account claimed the order.
    pub store_name: String,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub rows: Vec<OutcomeRow>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_secs: f64,
}

/// Process a batch of order IDs. Every ID yields exactly one row no matter
/// which failure kind occurred; nothing propagates past this boundary.
pub async fn run_batch(
    client: &reqwest::Client,
    base_url: &str,
    accounts: &[Account],
    order_ids: &[String],
    due_date: NaiveDate,
    reason_text: &str,
    max_in_flight: usize,
) -> BatchReport {
    let batch_id = Uuid::new_v4();
    let started = Instant::now();
    info!(
        "📦 batch {batch_id}: {} order(s), due {due_date}, {} account(s)",
        order_ids.len(),
        accounts.len()
    );

    let mut rows = Vec::with_capacity(order_ids.len());
    for (i, order_id) in order_ids.iter().enumerate() {
        info!("batch {batch_id}: ({}/{}) {order_id}", i + 1, order_ids.len());

        let Some(found) = locate(client, base_url, accounts, order_id, max_in_flight).await else {
            warn!("❌ {order_id}: no account owns this order");
            rows.push(OutcomeRow {
                order_id: order_id.clone(),
                store_name: "-".into(),
                success: false,
                message: "해당 상품주문번호를 찾을 수 없습니다.".into(),
            });
            continue;
        };

        let outcome = execute_delay(client, base_url, &found.token, order_id, due_date, reason_text).await;
        if outcome.success {
            info!("✅ {order_id} ({}): {}", found.account.store_name, outcome.message);
        } else {
            warn!("❌ {order_id} ({}): {}", found.account.store_name, outcome.message);
        }
        rows.push(OutcomeRow {
            order_id: order_id.clone(),
            store_name: found.account.store_name.clone(),
            success: outcome.success,
            message: outcome.message,
        });
    }

    let succeeded = rows.iter().filter(|r| r.success).count();
    let report = BatchReport {
        total: rows.len(),
        succeeded,
        failed: rows.len() - succeeded,
        elapsed_secs: started.elapsed().as_secs_f64(),
        rows,
    };
    info!(
        "🏁 batch {batch_id}: {}/{} succeeded in {:.1}s",
        report.succeeded, report.total, report.elapsed_secs
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::extract::{Form, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use secrecy::SecretString;
    use serde_json::{json, Value};

    // ── Input parsing ──

    #[test]
    fn test_parse_order_ids_mixed_separators() {
        assert_eq!(parse_order_ids("1001, 1002\n1003"), vec!["1001", "1002", "1003"]);
    }

    #[test]
    fn test_parse_order_ids_drops_blanks_and_duplicates() {
        assert_eq!(parse_order_ids("1001,,1001\n\n 1002 ,1001"), vec!["1001", "1002"]);
    }

    #[test]
    fn test_parse_order_ids_empty_input() {
        assert!(parse_order_ids("").is_empty());
        assert!(parse_order_ids(" \n , ").is_empty());
    }

    // ── Batch over a mock marketplace ──

    struct MockCfg {
        owner_client_id: String,
        delay_status: StatusCode,
    }

    async fn token(Form(form): Form<HashMap<String, String>>) -> Json<Value> {
        Json(json!({ "access_token": format!("tok-{}", form["client_id"]) }))
    }

    async fn query(
        State(cfg): State<Arc<MockCfg>>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if auth == format!("Bearer tok-{}", cfg.owner_client_id) {
            Json(json!({ "data": [ { "productOrderId": body["productOrderIds"][0] } ] }))
        } else {
            Json(json!({ "data": [] }))
        }
    }

    async fn delay(State(cfg): State<Arc<MockCfg>>) -> (StatusCode, Json<Value>) {
        (cfg.delay_status, Json(json!({ "message": "server said no" })))
    }

    async fn spawn_marketplace(owner_client_id: &str, delay_status: StatusCode) -> String {
        let cfg = Arc::new(MockCfg {
            owner_client_id: owner_client_id.to_string(),
            delay_status,
        });
        let app = Router::new()
            .route("/external/v1/oauth2/token", post(token))
            .route("/external/v1/pay-order/seller/product-orders/query", post(query))
            .route(
                "/external/v1/pay-order/seller/product-orders/:order_id/delay",
                post(delay),
            )
            .with_state(cfg);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn accounts() -> Vec<Account> {
        ["스토어A", "스토어B"]
            .iter()
            .enumerate()
            .map(|(i, name)| Account {
                store_name: name.to_string(),
                client_id: format!("id-{i}"),
                client_secret: SecretString::from("secret".to_string()),
            })
            .collect()
    }

    fn due() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    #[tokio::test]
    async fn test_run_batch_delays_order_via_owning_store() {
        // 스토어B (id-1) owns everything in this mock.
        let base = spawn_marketplace("id-1", StatusCode::OK).await;
        let client = reqwest::Client::new();
        let ids = vec!["2025121188249131".to_string()];

        let report = run_batch(&client, &base, &accounts(), &ids, due(), "상품준비 중", 20).await;
        assert_eq!(report.total, 1);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(report.rows[0].store_name, "스토어B");
        assert!(report.rows[0].message.contains("PRODUCT_PREPARE"));
    }

    #[tokio::test]
    async fn test_run_batch_reports_unowned_order_as_not_found() {
        // Owner id does not match any configured account.
        let base = spawn_marketplace("id-nobody", StatusCode::OK).await;
        let client = reqwest::Client::new();
        let ids = vec!["1001".to_string()];

        let report = run_batch(&client, &base, &accounts(), &ids, due(), "기타", 20).await;
        assert_eq!(report.failed, 1);
        assert_eq!(report.rows[0].store_name, "-");
        assert!(report.rows[0].message.contains("찾을 수 없습니다"));
    }

    #[tokio::test]
    async fn test_run_batch_captures_mutation_rejection_per_row() {
        let base = spawn_marketplace("id-0", StatusCode::INTERNAL_SERVER_ERROR).await;
        let client = reqwest::Client::new();
        let ids = vec!["1001".to_string(), "1002".to_string()];

        let report = run_batch(&client, &base, &accounts(), &ids, due(), "기타", 20).await;
        assert_eq!(report.total, 2);
        assert_eq!(report.failed, 2);
        for row in &report.rows {
            assert_eq!(row.store_name, "스토어A");
            assert!(row.message.contains("500"));
            assert!(row.message.contains("server said no"));
        }
        // Input order preserved.
        assert_eq!(report.rows[0].order_id, "1001");
        assert_eq!(report.rows[1].order_id, "1002");
    }
}
