// src/dtos/payment_method.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::media::resolve_display_url;
use crate::models::payment_method::PaymentMethod;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct CreatePaymentMethodRequest {
    pub image_path: Option<String>,
    pub name: String,
    pub provider: String,
    pub code: String,
    pub group: String,
    #[serde(rename = "type")]
    pub method_type: String,
    pub fee_flat: Option<Decimal>,
    pub fee_percent: Option<Decimal>,
    pub min_amount: Option<i64>,
    pub max_amount: Option<i64>,
    pub is_active: Option<bool>,
}

impl CreatePaymentMethodRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.required_text("name", &self.name, 255);
        v.required_text("provider", &self.provider, 64);
        v.required_text("code", &self.code, 64);
        v.required_text("group", &self.group, 64);
        v.required_text("type", &self.method_type, 64);
        if let Some(fee) = self.fee_flat {
            v.non_negative("fee_flat", fee);
        }
        if let Some(fee) = self.fee_percent {
            v.percentage("fee_percent", fee);
        }
        let min = self.min_amount.unwrap_or(0);
        v.check(min >= 0, "min_amount", "must be at least 0");
        if let Some(max) = self.max_amount {
            v.check(max == 0 || max >= min, "max_amount", "must be 0 or at least min_amount");
        }
        v.finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentMethodRequest {
    pub image_path: Option<String>,
    pub name: Option<String>,
    pub provider: Option<String>,
    pub code: Option<String>,
    pub group: Option<String>,
    #[serde(rename = "type")]
    pub method_type: Option<String>,
    pub fee_flat: Option<Decimal>,
    pub fee_percent: Option<Decimal>,
    pub min_amount: Option<i64>,
    pub max_amount: Option<i64>,
    pub is_active: Option<bool>,
}

impl UpdatePaymentMethodRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.required_text("name", name, 255);
        }
        if let Some(fee) = self.fee_flat {
            v.non_negative("fee_flat", fee);
        }
        if let Some(fee) = self.fee_percent {
            v.percentage("fee_percent", fee);
        }
        if let Some(min) = self.min_amount {
            v.check(min >= 0, "min_amount", "must be at least 0");
        }
        v.finish()
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentMethodResponse {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub provider: String,
    pub code: String,
    pub group: String,
    #[serde(rename = "type")]
    pub method_type: String,
    pub fee_flat: Decimal,
    pub fee_percent: Decimal,
    pub min_amount: i64,
    pub max_amount: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentMethodResponse {
    pub fn new(pm: PaymentMethod, storage_base: &str) -> Self {
        Self {
            image_url: resolve_display_url(pm.image_path.as_deref(), storage_base),
            id: pm.id,
            name: pm.name,
            provider: pm.provider,
            code: pm.code,
            group: pm.group,
            method_type: pm.method_type,
            fee_flat: pm.fee_flat,
            fee_percent: pm.fee_percent,
            min_amount: pm.min_amount,
            max_amount: pm.max_amount,
            is_active: pm.is_active,
            created_at: pm.created_at,
            updated_at: pm.updated_at,
        }
    }
}
