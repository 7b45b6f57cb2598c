//! Transaction Routes

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};
use transaction_codec::{parse_amount, Transaction};
use uuid::Uuid;

use crate::AppState;

/// Incoming transaction payload; `id` and `timestamp` are assigned here
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub user_id: Option<String>,
    pub amount: Option<Value>,
    pub currency: Option<String>,
    pub location: Option<String>,
}

/// Acknowledgment carrying the assigned transaction id
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub transaction_id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Pull out the required fields, rejecting absent or empty values
fn required_fields(body: NewTransaction) -> Option<(String, Value, String, String)> {
    match (body.user_id, body.amount, body.currency, body.location) {
        (Some(user_id), Some(amount), Some(currency), Some(location))
            if !user_id.is_empty() && !currency.is_empty() && !location.is_empty() =>
        {
            Some((user_id, amount, currency, location))
        }
        _ => None,
    }
}

/// Accept a transaction: validate, assign id and timestamp, audit, and
/// forward onto the transaction stream
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewTransaction>,
) -> Response {
    let Some((user_id, raw_amount, currency, location)) = required_fields(body) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing required fields");
    };

    let amount = match parse_amount(&raw_amount) {
        Ok(amount) => amount,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    let txn = Transaction {
        id: Uuid::new_v4().to_string(),
        user_id,
        amount,
        currency,
        location,
        timestamp: Utc::now(),
    };

    // Audit first, stream second: the audit list is a courtesy record of
    // what was accepted, not a delivery guarantee
    match serde_json::to_value(&txn) {
        Ok(entry) => {
            if let Err(e) = state.store.push_recent(&txn.user_id, entry, state.audit_capacity) {
                error!("Failed to audit transaction {}: {}", txn.id, e);
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Storage failure");
            }
        }
        Err(e) => {
            error!("Failed to serialize transaction {}: {}", txn.id, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Serialization failure");
        }
    }

    if let Err(e) = state.publisher.publish_transaction(&txn).await {
        error!("Failed to forward transaction {}: {}", txn.id, e);
        return error_response(StatusCode::BAD_GATEWAY, "Failed to forward transaction");
    }

    counter!("transactions_accepted_total").increment(1);
    info!("Transaction {} accepted for user {}", txn.id, txn.user_id);

    (
        StatusCode::OK,
        Json(CreatedResponse {
            transaction_id: txn.id,
        }),
    )
        .into_response()
}

/// Query parameters for the recent-transactions endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentQuery {
    pub user_id: String,
    /// Maximum number of records to return
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

/// Response for the recent-transactions endpoint
#[derive(Debug, Serialize)]
pub struct RecentResponse {
    pub data: Vec<Value>,
    pub meta: RecentMeta,
}

#[derive(Debug, Serialize)]
pub struct RecentMeta {
    pub count: usize,
    pub limit: usize,
}

/// Get the audit list of a user's recently accepted transactions
pub async fn recent(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecentQuery>,
) -> Response {
    let limit = params.limit.min(state.audit_capacity);

    match state.store.recent(&params.user_id, limit) {
        Ok(data) => Json(RecentResponse {
            meta: RecentMeta {
                count: data.len(),
                limit,
            },
            data,
        })
        .into_response(),
        Err(e) => {
            error!("Failed to read audit list for {}: {}", params.user_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Storage failure")
        }
    }
}
