//! Dispatch-delay mutation and delay-reason classification.

use chrono::NaiveDate;
use serde_json::json;

// ─────────────────────────────────────────────────────────
// Reason classification
// ─────────────────────────────────────────────────────────

/// Marketplace-defined delay reason codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayReason {
    CustomBuild,
    ReservedDispatch,
    Etc,
    ProductPrepare,
    OverseaDelivery,
    CustomerRequest,
}

impl DelayReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DelayReason::CustomBuild => "CUSTOM_BUILD",
            DelayReason::ReservedDispatch => "RESERVED_DISPATCH",
            DelayReason::Etc => "ETC",
            DelayReason::ProductPrepare => "PRODUCT_PREPARE",
            DelayReason::OverseaDelivery => "OVERSEA_DELIVERY",
            DelayReason::CustomerRequest => "CUSTOMER_REQUEST",
        }
    }

    /// Classify free text into a reason code.
    ///
    /// Ordered substring rules, first match wins. Categories overlap
    /// (text can mention both 해외 and 요청), so rule order is part of
    /// the contract. Substring containment only — no word boundaries.
    pub fn classify(text: &str) -> Self {
        const RULES: &[(&[&str], DelayReason)] = &[
            (&["해외", "현지", "배송중"], DelayReason::OverseaDelivery),
            (&["주문제작", "제작"], DelayReason::CustomBuild),
            (&["예약"], DelayReason::ReservedDispatch),
            (&["고객", "구매자", "요청"], DelayReason::CustomerRequest),
            (&["상품", "준비", "재고"], DelayReason::ProductPrepare),
        ];
        for (terms, code) in RULES {
            if terms.iter().any(|t| text.contains(t)) {
                return *code;
            }
        }
        DelayReason::Etc
    }
}

// ─────────────────────────────────────────────────────────
// Delay mutation
// ─────────────────────────────────────────────────────────

/// Terminal result for one order ID. Single attempt, no retries.
#[derive(Debug, Clone)]
pub struct DelayOutcome {
    pub success: bool,
    pub message: String,
}

/// Due date becomes end-of-day in KST, the marketplace's clock.
pub fn dispatch_due_ts(due_date: NaiveDate) -> String {
    format!("{}T23:59:59.000+09:00", due_date.format("%Y-%m-%d"))
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Apply the delay mutation to an order already confirmed to belong to the
/// token's account.
pub async fn execute_delay(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    order_id: &str,
    due_date: NaiveDate,
    reason_text: &str,
) -> DelayOutcome {
    let reason_code = DelayReason::classify(reason_text);
    let payload = json!({
        "dispatchDueDate": dispatch_due_ts(due_date),
        "delayedDispatchReason": reason_code.as_str(),
        "dispatchDelayedDetailedReason": reason_text,
    });
    let url = format!("{base_url}/external/v1/pay-order/seller/product-orders/{order_id}/delay");

    let resp = match client.post(&url).bearer_auth(token).json(&payload).send().await {
        Ok(r) => r,
        Err(err) => {
            return DelayOutcome {
                success: false,
                message: format!("요청 오류: {err}"),
            }
        }
    };

    let status = resp.status();
    if status == reqwest::StatusCode::OK {
        return DelayOutcome {
            success: true,
            message: format!("발송지연 처리 완료 ({})", reason_code.as_str()),
        };
    }

    let body = resp.text().await.unwrap_or_default();
    let server_msg = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(body);
    DelayOutcome {
        success: false,
        message: format!(
            "API 오류 ({}): {}",
            status.as_u16(),
            truncate_chars(&server_msg, 150)
        ),
    }
}
