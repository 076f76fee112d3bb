// src/handlers/voucher.rs
use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, instrument};

use crate::dtos::voucher::{
    CreateVoucherRequest, SetVoucherGamesRequest, UpdateVoucherRequest, VoucherCheckResponse,
    VoucherDetailResponse, VoucherResponse,
};
use crate::error::{map_constraint_violation, AppError};
use crate::handlers::game::find_active_game;
use crate::middleware::auth::Viewer;
use crate::models::voucher::{Voucher, VOUCHER_COLUMNS};
use crate::promotions::{check_voucher, eligible_vouchers, VoucherRejection, VoucherUsage};
use crate::response::{ApiResponse, Deleted};
use crate::state::AppState;
use crate::validation::QueryParams;

const CODE_TAKEN: &str = "Voucher code already exists";

#[derive(sqlx::FromRow)]
struct UsageCount {
    voucher_id: i64,
    total: i64,
    by_user: i64,
}

/// Redemption counts per voucher. `by_user` is only filled in for a known viewer.
async fn usage_counts(
    pool: &PgPool,
    voucher_ids: &[i64],
    user_id: Option<i64>,
) -> Result<HashMap<i64, VoucherUsage>, AppError> {
    if voucher_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, UsageCount>(
        "SELECT voucher_id, COUNT(*) AS total,
                COUNT(*) FILTER (WHERE user_id = $2) AS by_user
         FROM voucher_usages
         WHERE voucher_id = ANY($1)
         GROUP BY voucher_id",
    )
    .bind(voucher_ids)
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| {
            let usage = VoucherUsage { total: r.total, by_user: user_id.map(|_| r.by_user) };
            (r.voucher_id, usage)
        })
        .collect())
}

fn usage_or_empty(counts: &HashMap<i64, VoucherUsage>, id: i64, user_id: Option<i64>) -> VoucherUsage {
    counts.get(&id).copied().unwrap_or(VoucherUsage {
        total: 0,
        by_user: user_id.map(|_| 0),
    })
}

async fn game_ids_of(pool: &PgPool, voucher_id: i64) -> Result<Vec<i64>, AppError> {
    let ids = sqlx::query_scalar::<_, i64>("SELECT game_id FROM game_voucher WHERE voucher_id = $1 ORDER BY game_id")
        .bind(voucher_id)
        .fetch_all(pool)
        .await?;
    Ok(ids)
}

async fn replace_games(tx: &mut Transaction<'_, Postgres>, voucher_id: i64, game_ids: &[i64]) -> Result<(), AppError> {
    sqlx::query("DELETE FROM game_voucher WHERE voucher_id = $1")
        .bind(voucher_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query(
        "INSERT INTO game_voucher (game_id, voucher_id)
         SELECT DISTINCT UNNEST($1::BIGINT[]), $2",
    )
    .bind(game_ids)
    .bind(voucher_id)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_constraint_violation(e, "Game is already linked"))?;
    Ok(())
}

async fn detail(pool: &PgPool, voucher: Voucher) -> Result<VoucherDetailResponse, AppError> {
    let game_ids = game_ids_of(pool, voucher.id).await?;
    let total_usage = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM voucher_usages WHERE voucher_id = $1")
        .bind(voucher.id)
        .fetch_one(pool)
        .await?;
    Ok(VoucherDetailResponse { voucher: voucher.into(), game_ids, total_usage })
}

async fn find_voucher(pool: &PgPool, id: i64) -> Result<Voucher, AppError> {
    sqlx::query_as::<_, Voucher>(&format!("SELECT {VOUCHER_COLUMNS} FROM vouchers v WHERE v.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Voucher not found"))
}

// GET /v1/vouchers
#[instrument(skip(state, viewer))]
pub async fn list_vouchers(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<ApiResponse<Vec<VoucherResponse>>, AppError> {
    let mut q = QueryParams::new(&params);
    let game_slug = q.text("game", 255);
    let amount = q.non_negative_decimal("amount");
    q.finish()?;

    let now = Utc::now();
    let vouchers = match game_slug {
        Some(slug) => {
            let game = find_active_game(&state.db_pool, &slug).await?;
            sqlx::query_as::<_, Voucher>(&format!(
                "SELECT {VOUCHER_COLUMNS} FROM vouchers v
                 JOIN game_voucher gv ON gv.voucher_id = v.id
                 WHERE gv.game_id = $1 AND v.is_active AND v.start_date <= $2 AND v.end_date >= $2
                 ORDER BY v.end_date, v.id"
            ))
            .bind(game.id)
            .bind(now)
            .fetch_all(&state.db_pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Voucher>(&format!(
                "SELECT {VOUCHER_COLUMNS} FROM vouchers v
                 WHERE v.is_active AND v.start_date <= $1 AND v.end_date >= $1
                 ORDER BY v.end_date, v.id"
            ))
            .bind(now)
            .fetch_all(&state.db_pool)
            .await?
        }
    };

    let user_id = viewer.0.as_ref().map(|ctx| ctx.user_id);
    let ids: Vec<i64> = vouchers.iter().map(|v| v.id).collect();
    let counts = usage_counts(&state.db_pool, &ids, user_id).await?;

    let data = eligible_vouchers(&vouchers, now, amount, |v| usage_or_empty(&counts, v.id, user_id))
        .into_iter()
        .cloned()
        .map(VoucherResponse::from)
        .collect();
    Ok(ApiResponse::ok(data))
}

// GET /v1/vouchers/{code}/check
#[instrument(skip(state, viewer))]
pub async fn check_voucher_code(
    Path(code): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<ApiResponse<VoucherCheckResponse>, AppError> {
    let mut q = QueryParams::new(&params);
    let game_slug = q.text("game", 255);
    let amount = q.non_negative_decimal("amount");
    q.finish()?;

    let voucher = sqlx::query_as::<_, Voucher>(&format!("SELECT {VOUCHER_COLUMNS} FROM vouchers v WHERE v.code = $1"))
        .bind(code.trim())
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Voucher not found"))?;

    let user_id = viewer.0.as_ref().map(|ctx| ctx.user_id);
    let counts = usage_counts(&state.db_pool, &[voucher.id], user_id).await?;
    let usage = usage_or_empty(&counts, voucher.id, user_id);

    let mut outcome = check_voucher(&voucher, Utc::now(), amount, usage);
    if outcome.is_ok() {
        if let Some(slug) = game_slug {
            let game = find_active_game(&state.db_pool, &slug).await?;
            let linked = game_ids_of(&state.db_pool, voucher.id).await?;
            if !linked.contains(&game.id) {
                outcome = Err(VoucherRejection::NotValidForGame);
            }
        }
    }

    Ok(ApiResponse::ok(VoucherCheckResponse::new(voucher, outcome)))
}

// GET /admin/vouchers
#[instrument(skip(state))]
pub async fn admin_list_vouchers(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<VoucherResponse>>, AppError> {
    let vouchers = sqlx::query_as::<_, Voucher>(&format!(
        "SELECT {VOUCHER_COLUMNS} FROM vouchers v ORDER BY v.created_at DESC, v.id DESC"
    ))
    .fetch_all(&state.db_pool)
    .await?;

    Ok(ApiResponse::ok(vouchers.into_iter().map(Into::into).collect()))
}

// GET /admin/vouchers/{id}
#[instrument(skip(state))]
pub async fn admin_get_voucher(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<ApiResponse<VoucherDetailResponse>, AppError> {
    let voucher = find_voucher(&state.db_pool, id).await?;
    Ok(ApiResponse::ok(detail(&state.db_pool, voucher).await?))
}

// POST /admin/vouchers
#[instrument(skip(state, payload))]
pub async fn create_voucher(
    State(state): State<AppState>,
    Json(payload): Json<CreateVoucherRequest>,
) -> Result<(StatusCode, ApiResponse<VoucherDetailResponse>), AppError> {
    payload.validate()?;

    let mut tx = state.db_pool.begin().await?;
    let voucher = sqlx::query_as::<_, Voucher>(&format!(
        "INSERT INTO vouchers AS v (code, description, discount_type, discount_value, start_date, end_date,
            min_purchase, total_usage_limit, user_usage_limit, is_active)
         VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 0), COALESCE($8, 1), COALESCE($9, 1), COALESCE($10, TRUE))
         RETURNING {VOUCHER_COLUMNS}"
    ))
    .bind(payload.code.trim())
    .bind(&payload.description)
    .bind(payload.discount_type.as_str())
    .bind(payload.discount_value)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.min_purchase)
    .bind(payload.total_usage_limit)
    .bind(payload.user_usage_limit)
    .bind(payload.is_active)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| map_constraint_violation(e, CODE_TAKEN))?;

    if !payload.game_ids.is_empty() {
        replace_games(&mut tx, voucher.id, &payload.game_ids).await?;
    }
    tx.commit().await?;

    info!(id = voucher.id, code = %voucher.code, "Voucher created");
    Ok((StatusCode::CREATED, ApiResponse::ok(detail(&state.db_pool, voucher).await?)))
}

// PUT /admin/vouchers/{id}
#[instrument(skip(state, payload))]
pub async fn update_voucher(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateVoucherRequest>,
) -> Result<ApiResponse<VoucherDetailResponse>, AppError> {
    let current = find_voucher(&state.db_pool, id).await?;
    payload.validate(&current)?;

    let voucher = sqlx::query_as::<_, Voucher>(&format!(
        "UPDATE vouchers AS v SET
            code = COALESCE($1, v.code),
            description = COALESCE($2, v.description),
            discount_type = COALESCE($3, v.discount_type),
            discount_value = COALESCE($4, v.discount_value),
            start_date = COALESCE($5, v.start_date),
            end_date = COALESCE($6, v.end_date),
            min_purchase = COALESCE($7, v.min_purchase),
            total_usage_limit = COALESCE($8, v.total_usage_limit),
            user_usage_limit = COALESCE($9, v.user_usage_limit),
            is_active = COALESCE($10, v.is_active),
            updated_at = now()
         WHERE v.id = $11
         RETURNING {VOUCHER_COLUMNS}"
    ))
    .bind(payload.code.as_deref().map(str::trim))
    .bind(payload.description)
    .bind(payload.discount_type.map(|t| t.as_str()))
    .bind(payload.discount_value)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.min_purchase)
    .bind(payload.total_usage_limit)
    .bind(payload.user_usage_limit)
    .bind(payload.is_active)
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, CODE_TAKEN))?
    .ok_or_else(|| AppError::not_found("Voucher not found"))?;

    info!(id, "Voucher updated");
    Ok(ApiResponse::ok(detail(&state.db_pool, voucher).await?))
}

// PUT /admin/vouchers/{id}/games
#[instrument(skip(state, payload))]
pub async fn set_voucher_games(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<SetVoucherGamesRequest>,
) -> Result<ApiResponse<VoucherDetailResponse>, AppError> {
    let voucher = find_voucher(&state.db_pool, id).await?;

    let mut tx = state.db_pool.begin().await?;
    replace_games(&mut tx, id, &payload.game_ids).await?;
    tx.commit().await?;

    info!(id, games = payload.game_ids.len(), "Voucher games replaced");
    Ok(ApiResponse::ok(detail(&state.db_pool, voucher).await?))
}

// DELETE /admin/vouchers/{id}
#[instrument(skip(state))]
pub async fn delete_voucher(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<ApiResponse<Deleted>, AppError> {
    let result = sqlx::query("DELETE FROM vouchers WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Voucher not found"));
    }
    info!(id, "Voucher deleted");
    Ok(ApiResponse::ok(Deleted::new(id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_usage_row_means_unused() {
        let counts = HashMap::new();
        assert_eq!(usage_or_empty(&counts, 4, Some(9)), VoucherUsage { total: 0, by_user: Some(0) });
        assert_eq!(usage_or_empty(&counts, 4, None), VoucherUsage { total: 0, by_user: None });
    }
}
