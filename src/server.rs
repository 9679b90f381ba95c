//! Operator-facing HTTP surface.
//!
//! `GET /` serves the single-page form, `POST /api/delay` runs one batch
//! synchronously and returns the report, `GET /api/status` reports how
//! many stores are linked. No operator authentication in this version.

use std::net::SocketAddr;

use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::batch::{parse_order_ids, run_batch, BatchReport};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DelayRequest {
    /// Newline/comma separated order IDs.
    pub order_input: String,
    /// "YYYY-MM-DD"; blank → today + 7 days.
    #[serde(default)]
    pub dispatch_due_date: String,
    /// Selected preset reason.
    #[serde(default)]
    pub delay_reason: String,
    /// Optional free-text detail; overrides the preset when non-empty.
    #[serde(default)]
    pub custom_reason: String,
}

#[derive(Debug, Serialize)]
struct StatusBody {
    linked_accounts: usize,
}

/// Default due date: a week out, on the marketplace's clock (KST).
pub fn default_due_date() -> NaiveDate {
    let kst = FixedOffset::east_opt(9 * 3600).expect("KST is a valid offset");
    (Utc::now().with_timezone(&kst) + Duration::days(7)).date_naive()
}

/// Free-text detail wins over the preset; both blank → 기타 사유.
fn effective_reason<'a>(delay_reason: &'a str, custom_reason: &'a str) -> &'a str {
    let custom = custom_reason.trim();
    if !custom.is_empty() {
        return custom;
    }
    let preset = delay_reason.trim();
    if preset.is_empty() {
        "기타 사유"
    } else {
        preset
    }
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../assets/index.html"))
}

async fn status(State(state): State<AppState>) -> Json<StatusBody> {
    Json(StatusBody {
        linked_accounts: state.accounts.len(),
    })
}

async fn delay(
    State(state): State<AppState>,
    Json(req): Json<DelayRequest>,
) -> Result<Json<BatchReport>, (StatusCode, String)> {
    let order_ids = parse_order_ids(&req.order_input);
    if order_ids.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "상품주문번호를 입력해주세요.".into()));
    }

    let due_date = if req.dispatch_due_date.trim().is_empty() {
        default_due_date()
    } else {
        NaiveDate::parse_from_str(req.dispatch_due_date.trim(), "%Y-%m-%d").map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                "발송예정일 형식이 올바르지 않습니다 (YYYY-MM-DD).".to_string(),
            )
        })?
    };
    let reason = effective_reason(&req.delay_reason, &req.custom_reason);

    let report = run_batch(
        &state.http,
        &state.settings.api_base,
        &state.accounts,
        &order_ids,
        due_date,
        reason,
        state.settings.max_probes,
    )
    .await;
    Ok(Json(report))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/status", get(status))
        .route("/api/delay", post(delay))
        .with_state(state)
}

pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("🌐 listening on http://{addr}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::Settings;

    fn state() -> AppState {
        AppState {
            settings: Arc::new(Settings::default()),
            accounts: Arc::new(Vec::new()),
            http: reqwest::Client::new(),
        }
    }

    fn request(order_input: &str, date: &str) -> DelayRequest {
        DelayRequest {
            order_input: order_input.into(),
            dispatch_due_date: date.into(),
            delay_reason: "기타 사유".into(),
            custom_reason: String::new(),
        }
    }

    #[test]
    fn test_effective_reason_custom_overrides_preset() {
        assert_eq!(effective_reason("예약발송", "  고객요청 상세  "), "고객요청 상세");
        assert_eq!(effective_reason("예약발송", "   "), "예약발송");
        assert_eq!(effective_reason("  ", ""), "기타 사유");
    }

    #[test]
    fn test_default_due_date_is_in_the_future() {
        assert!(default_due_date() > Utc::now().date_naive() + Duration::days(5));
    }

    #[tokio::test]
    async fn test_delay_rejects_empty_order_input() {
        let resp = delay(State(state()), Json(request(" \n , ", ""))).await;
        let (code, _) = resp.err().expect("empty input is a 400");
        assert_eq!(code, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delay_rejects_malformed_date() {
        let resp = delay(State(state()), Json(request("1001", "31-12-2025"))).await;
        let (code, msg) = resp.err().expect("bad date is a 400");
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert!(msg.contains("YYYY-MM-DD"));
    }
}
