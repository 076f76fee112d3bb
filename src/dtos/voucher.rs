// src/dtos/voucher.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::voucher::{DiscountType, Voucher};
use crate::promotions::VoucherRejection;
use crate::validation::Validator;

fn check_discount(v: &mut Validator, discount_type: DiscountType, value: Decimal) {
    match discount_type {
        DiscountType::Percentage => v.percentage("discount_value", value),
        DiscountType::Flat => v.non_negative("discount_value", value),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateVoucherRequest {
    pub code: String,
    #[serde(default)]
    pub description: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub min_purchase: Option<Decimal>,
    pub total_usage_limit: Option<i32>,
    pub user_usage_limit: Option<i32>,
    pub is_active: Option<bool>,
    /// Games the voucher applies to.
    #[serde(default)]
    pub game_ids: Vec<i64>,
}

impl CreateVoucherRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.required_text("code", &self.code, 64);
        check_discount(&mut v, self.discount_type, self.discount_value);
        v.check(self.end_date >= self.start_date, "end_date", "must be after or equal to start_date");
        if let Some(min) = self.min_purchase {
            v.non_negative("min_purchase", min);
        }
        v.check(self.total_usage_limit.unwrap_or(1) >= 0, "total_usage_limit", "must be at least 0");
        v.check(self.user_usage_limit.unwrap_or(1) >= 0, "user_usage_limit", "must be at least 0");
        v.finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateVoucherRequest {
    pub code: Option<String>,
    pub description: Option<String>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub min_purchase: Option<Decimal>,
    pub total_usage_limit: Option<i32>,
    pub user_usage_limit: Option<i32>,
    pub is_active: Option<bool>,
}

impl UpdateVoucherRequest {
    pub fn validate(&self, current: &Voucher) -> Result<(), AppError> {
        let mut v = Validator::new();
        if let Some(code) = &self.code {
            v.required_text("code", code, 64);
        }
        check_discount(
            &mut v,
            self.discount_type.unwrap_or(current.discount_type),
            self.discount_value.unwrap_or(current.discount_value),
        );
        let start = self.start_date.unwrap_or(current.start_date);
        let end = self.end_date.unwrap_or(current.end_date);
        v.check(end >= start, "end_date", "must be after or equal to start_date");
        if let Some(min) = self.min_purchase {
            v.non_negative("min_purchase", min);
        }
        if let Some(limit) = self.total_usage_limit {
            v.check(limit >= 0, "total_usage_limit", "must be at least 0");
        }
        if let Some(limit) = self.user_usage_limit {
            v.check(limit >= 0, "user_usage_limit", "must be at least 0");
        }
        v.finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct SetVoucherGamesRequest {
    pub game_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct VoucherResponse {
    pub id: i64,
    pub code: String,
    pub description: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub min_purchase: Decimal,
    pub total_usage_limit: i32,
    pub user_usage_limit: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Voucher> for VoucherResponse {
    fn from(v: Voucher) -> Self {
        Self {
            id: v.id,
            code: v.code,
            description: v.description,
            discount_type: v.discount_type,
            discount_value: v.discount_value,
            start_date: v.start_date,
            end_date: v.end_date,
            min_purchase: v.min_purchase,
            total_usage_limit: v.total_usage_limit,
            user_usage_limit: v.user_usage_limit,
            is_active: v.is_active,
            created_at: v.created_at,
            updated_at: v.updated_at,
        }
    }
}

/// Admin view, with the games the voucher is scoped to.
#[derive(Debug, Serialize)]
pub struct VoucherDetailResponse {
    #[serde(flatten)]
    pub voucher: VoucherResponse,
    pub game_ids: Vec<i64>,
    pub total_usage: i64,
}

#[derive(Debug, Serialize)]
pub struct VoucherCheckResponse {
    pub code: String,
    pub eligible: bool,
    pub reason: Option<VoucherRejection>,
    pub message: String,
    pub voucher: VoucherResponse,
}

impl VoucherCheckResponse {
    pub fn new(voucher: Voucher, outcome: Result<(), VoucherRejection>) -> Self {
        let (eligible, reason, message) = match outcome {
            Ok(()) => (true, None, "Voucher can be used".to_string()),
            Err(rejection) => (false, Some(rejection), rejection.message().to_string()),
        };
        Self {
            code: voucher.code.clone(),
            eligible,
            reason,
            message,
            voucher: voucher.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request(kind: DiscountType, value: i64) -> CreateVoucherRequest {
        let now = Utc::now();
        CreateVoucherRequest {
            code: "HEMAT10".into(),
            description: String::new(),
            discount_type: kind,
            discount_value: Decimal::from(value),
            start_date: now,
            end_date: now + Duration::days(7),
            min_purchase: None,
            total_usage_limit: Some(100),
            user_usage_limit: Some(1),
            is_active: None,
            game_ids: vec![],
        }
    }

    #[test]
    fn percentage_discount_is_capped() {
        assert!(request(DiscountType::Percentage, 150).validate().is_err());
        assert!(request(DiscountType::Percentage, 15).validate().is_ok());
        assert!(request(DiscountType::Flat, 15000).validate().is_ok());
    }

    #[test]
    fn check_response_explains_rejection() {
        let now = Utc::now();
        let voucher = Voucher {
            id: 1,
            code: "HEMAT10".into(),
            description: String::new(),
            discount_type: DiscountType::Flat,
            discount_value: Decimal::from(5000),
            start_date: now - Duration::days(2),
            end_date: now - Duration::days(1),
            min_purchase: Decimal::ZERO,
            total_usage_limit: 10,
            user_usage_limit: 1,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let resp = VoucherCheckResponse::new(voucher, Err(VoucherRejection::Expired));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["eligible"], false);
        assert_eq!(value["reason"], "expired");
        assert_eq!(value["message"], "Voucher has expired");
    }
}
