// src/handlers/transaction.rs
use std::collections::HashMap;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use sqlx::{types::Json as JsonColumn, PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};

use crate::dtos::catalog::PageMeta;
use crate::dtos::transaction::{StatusLogEntry, TransactionResponse, UpdateTransactionStatusRequest};
use crate::error::AppError;
use crate::handlers::game::like_pattern;
use crate::middleware::auth::AuthContext;
use crate::models::transaction::{Transaction, TransactionStatus, TRANSACTION_COLUMNS};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::validation::QueryParams;

const STATUSES: [&str; 5] = ["pending", "processing", "success", "failed", "canceled"];

#[derive(Debug)]
struct TransactionFilter {
    status: Option<TransactionStatus>,
    user_id: Option<i64>,
    search: Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    per_page: i64,
    page: i64,
}

impl TransactionFilter {
    fn from_params(params: &HashMap<String, String>) -> Result<Self, AppError> {
        let mut q = QueryParams::new(params);
        let filter = Self {
            status: q.one_of("status", &STATUSES).and_then(|s| TransactionStatus::parse(&s)),
            user_id: q.parse::<i64>("user_id", "must be an integer"),
            search: q.text("q", 255),
            from: q.parse::<NaiveDate>("from", "must be a date (YYYY-MM-DD)"),
            to: q.parse::<NaiveDate>("to", "must be a date (YYYY-MM-DD)"),
            per_page: q.int_in("limit", 1, 100).unwrap_or(20),
            page: q.int_in("page", 1, i64::from(i32::MAX)).unwrap_or(1),
        };
        q.finish()?;
        Ok(filter)
    }

    fn push_from_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" FROM transactions t WHERE TRUE");
        if let Some(status) = self.status {
            qb.push(" AND t.status = ").push_bind(status.as_str());
        }
        if let Some(user_id) = self.user_id {
            qb.push(" AND t.user_id = ").push_bind(user_id);
        }
        if let Some(term) = &self.search {
            let pattern = like_pattern(term);
            qb.push(" AND (t.ref_id ILIKE ").push_bind(pattern.clone());
            qb.push(" OR t.game_user_id ILIKE ").push_bind(pattern.clone());
            qb.push(" OR t.product_name ILIKE ").push_bind(pattern).push(")");
        }
        if let Some(from) = self.from {
            qb.push(" AND t.created_at::date >= ").push_bind(from);
        }
        if let Some(to) = self.to {
            qb.push(" AND t.created_at::date <= ").push_bind(to);
        }
    }
}

async fn find_transaction(pool: &PgPool, id: i64) -> Result<Transaction, AppError> {
    sqlx::query_as::<_, Transaction>(&format!("SELECT {TRANSACTION_COLUMNS} FROM transactions t WHERE t.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Transaction not found"))
}

// GET /admin/transactions
#[instrument(skip(state))]
pub async fn list_transactions(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<TransactionResponse>, PageMeta>, AppError> {
    let filter = TransactionFilter::from_params(&params)?;

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
    filter.push_from_where(&mut count);
    let total: i64 = count.build_query_scalar::<i64>().fetch_one(&state.db_pool).await?;

    let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {TRANSACTION_COLUMNS}"));
    filter.push_from_where(&mut select);
    select
        .push(" ORDER BY t.created_at DESC, t.id DESC LIMIT ")
        .push_bind(filter.per_page)
        .push(" OFFSET ")
        .push_bind((filter.page - 1) * filter.per_page);
    let rows: Vec<Transaction> = select.build_query_as::<Transaction>().fetch_all(&state.db_pool).await?;

    let meta = PageMeta::new(filter.page, filter.per_page, total, rows.len(), None);
    Ok(ApiResponse::with_meta(rows.into_iter().map(Into::into).collect(), meta))
}

// GET /admin/transactions/{id}
#[instrument(skip(state))]
pub async fn get_transaction(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<ApiResponse<TransactionResponse>, AppError> {
    Ok(ApiResponse::ok(find_transaction(&state.db_pool, id).await?.into()))
}

// PUT /admin/transactions/{id}/status
// Final statuses are locked; the update only applies if nobody changed the status meanwhile.
#[instrument(skip(state, auth, payload), fields(admin = %auth.username))]
pub async fn update_transaction_status(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UpdateTransactionStatusRequest>,
) -> Result<ApiResponse<TransactionResponse>, AppError> {
    let current = find_transaction(&state.db_pool, id).await?;
    if current.status.is_final() {
        return Err(AppError::conflict(format!(
            "Transaction is already {} and cannot be changed",
            current.status.as_str()
        )));
    }

    let entry = StatusLogEntry {
        from: current.status,
        to: payload.status,
        by: auth.username.clone(),
        at: Utc::now(),
        note: payload.note,
    };

    let updated = sqlx::query_as::<_, Transaction>(&format!(
        "UPDATE transactions AS t SET
            status = $1,
            serial_number = COALESCE($2, t.serial_number),
            provider_order_id = COALESCE($3, t.provider_order_id),
            log = COALESCE(t.log, '[]'::jsonb) || $4,
            updated_at = now()
         WHERE t.id = $5 AND t.status = $6
         RETURNING {TRANSACTION_COLUMNS}"
    ))
    .bind(payload.status.as_str())
    .bind(payload.serial_number)
    .bind(payload.provider_order_id)
    .bind(JsonColumn(vec![entry]))
    .bind(id)
    .bind(current.status.as_str())
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::conflict("Transaction status changed concurrently, reload and retry"))?;

    info!(id, from = current.status.as_str(), to = updated.status.as_str(), "Transaction status updated");
    Ok(ApiResponse::ok(updated.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn filter_parses_status_and_dates() {
        let f = TransactionFilter::from_params(&params(&[
            ("status", "pending"),
            ("from", "2025-08-01"),
            ("to", "2025-08-31"),
        ]))
        .unwrap();
        assert_eq!(f.status, Some(TransactionStatus::Pending));
        assert_eq!(f.from, NaiveDate::from_ymd_opt(2025, 8, 1));

        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        f.push_from_where(&mut qb);
        assert!(qb.sql().contains("t.created_at::date <= $3"));
    }

    #[test]
    fn filter_rejects_unknown_status_and_bad_date() {
        match TransactionFilter::from_params(&params(&[("status", "refunded"), ("from", "yesterday")])) {
            Err(AppError::ValidationError { errors, .. }) => {
                assert!(errors.contains_key("status"));
                assert!(errors.contains_key("from"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
