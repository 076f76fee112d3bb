// src/handlers/payment_method.rs
use axum::{extract::{Path, State}, http::StatusCode, Json};
use tracing::{info, instrument};

use crate::dtos::payment_method::{
    CreatePaymentMethodRequest, PaymentMethodResponse, UpdatePaymentMethodRequest,
};
use crate::error::{map_constraint_violation, AppError};
use crate::models::payment_method::{PaymentMethod, PAYMENT_METHOD_COLUMNS};
use crate::response::{ApiResponse, Deleted};
use crate::state::AppState;

// GET /v1/payment-methods
#[instrument(skip(state))]
pub async fn list_payment_methods(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<PaymentMethodResponse>>, AppError> {
    let methods = sqlx::query_as::<_, PaymentMethod>(&format!(
        "SELECT {PAYMENT_METHOD_COLUMNS} FROM payment_methods WHERE is_active ORDER BY name, id"
    ))
    .fetch_all(&state.db_pool)
    .await?;

    let storage = &state.config.storage_url;
    Ok(ApiResponse::ok(methods.into_iter().map(|m| PaymentMethodResponse::new(m, storage)).collect()))
}

// GET /admin/payment-methods
#[instrument(skip(state))]
pub async fn admin_list_payment_methods(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<PaymentMethodResponse>>, AppError> {
    let methods = sqlx::query_as::<_, PaymentMethod>(&format!(
        r#"SELECT {PAYMENT_METHOD_COLUMNS} FROM payment_methods ORDER BY "group", name, id"#
    ))
    .fetch_all(&state.db_pool)
    .await?;

    let storage = &state.config.storage_url;
    Ok(ApiResponse::ok(methods.into_iter().map(|m| PaymentMethodResponse::new(m, storage)).collect()))
}

// POST /admin/payment-methods
#[instrument(skip(state, payload))]
pub async fn create_payment_method(
    State(state): State<AppState>,
    Json(payload): Json<CreatePaymentMethodRequest>,
) -> Result<(StatusCode, ApiResponse<PaymentMethodResponse>), AppError> {
    payload.validate()?;

    let method = sqlx::query_as::<_, PaymentMethod>(&format!(
        r#"INSERT INTO payment_methods (image_path, name, provider, code, "group", type, fee_flat,
            fee_percent, min_amount, max_amount, is_active)
         VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 0), COALESCE($8, 0), COALESCE($9, 0),
            COALESCE($10, 0), COALESCE($11, TRUE))
         RETURNING {PAYMENT_METHOD_COLUMNS}"#
    ))
    .bind(payload.image_path)
    .bind(payload.name.trim())
    .bind(&payload.provider)
    .bind(&payload.code)
    .bind(&payload.group)
    .bind(&payload.method_type)
    .bind(payload.fee_flat)
    .bind(payload.fee_percent)
    .bind(payload.min_amount)
    .bind(payload.max_amount)
    .bind(payload.is_active)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Payment method already exists"))?;

    info!(id = method.id, code = %method.code, "Payment method created");
    Ok((StatusCode::CREATED, ApiResponse::ok(PaymentMethodResponse::new(method, &state.config.storage_url))))
}

// PUT /admin/payment-methods/{id}
#[instrument(skip(state, payload))]
pub async fn update_payment_method(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdatePaymentMethodRequest>,
) -> Result<ApiResponse<PaymentMethodResponse>, AppError> {
    payload.validate()?;

    let method = sqlx::query_as::<_, PaymentMethod>(&format!(
        r#"UPDATE payment_methods SET
            image_path = COALESCE($1, image_path),
            name = COALESCE($2, name),
            provider = COALESCE($3, provider),
            code = COALESCE($4, code),
            "group" = COALESCE($5, "group"),
            type = COALESCE($6, type),
            fee_flat = COALESCE($7, fee_flat),
            fee_percent = COALESCE($8, fee_percent),
            min_amount = COALESCE($9, min_amount),
            max_amount = COALESCE($10, max_amount),
            is_active = COALESCE($11, is_active),
            updated_at = now()
         WHERE id = $12
         RETURNING {PAYMENT_METHOD_COLUMNS}"#
    ))
    .bind(payload.image_path)
    .bind(payload.name.as_deref().map(str::trim))
    .bind(payload.provider)
    .bind(payload.code)
    .bind(payload.group)
    .bind(payload.method_type)
    .bind(payload.fee_flat)
    .bind(payload.fee_percent)
    .bind(payload.min_amount)
    .bind(payload.max_amount)
    .bind(payload.is_active)
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Payment method already exists"))?
    .ok_or_else(|| AppError::not_found("Payment method not found"))?;

    Ok(ApiResponse::ok(PaymentMethodResponse::new(method, &state.config.storage_url)))
}

// DELETE /admin/payment-methods/{id}
#[instrument(skip(state))]
pub async fn delete_payment_method(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<ApiResponse<Deleted>, AppError> {
    let result = sqlx::query("DELETE FROM payment_methods WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Payment method not found"));
    }
    info!(id, "Payment method deleted");
    Ok(ApiResponse::ok(Deleted::new(id)))
}
