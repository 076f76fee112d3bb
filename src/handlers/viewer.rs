// src/handlers/viewer.rs
//! Loads what the price resolver needs for a request: the viewer's role and
//! the flash sales attached to the products on the page.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use crate::config::Config;
use crate::dtos::catalog::{PricingInfo, RoleInfo};
use crate::error::AppError;
use crate::middleware::auth::Viewer;
use crate::models::role::Role;
use crate::pricing::FlashSaleOffer;

#[derive(Debug, Clone)]
pub struct ViewerPricing {
    pub role: Option<Role>,
    pub profit_percentage: Decimal,
    pub authenticated: bool,
    /// True when the guest role priced this request.
    pub is_guest_default: bool,
}

impl ViewerPricing {
    pub fn role_info(&self) -> Option<RoleInfo> {
        self.role.as_ref().map(|r| RoleInfo {
            id: r.id,
            name: r.name.clone(),
            profit_percentage: self.profit_percentage,
        })
    }

    pub fn pricing_info(&self) -> PricingInfo {
        let price_calculation = if self.profit_percentage > Decimal::ZERO {
            format!("Base price + {}% profit margin", self.profit_percentage.normalize())
        } else {
            "Base price (no profit margin)".to_string()
        };
        PricingInfo {
            user_authenticated: self.authenticated,
            user_role: self
                .role
                .as_ref()
                .map(|r| r.name.clone())
                .unwrap_or_else(|| "guest".to_string()),
            profit_percentage: self.profit_percentage,
            price_calculation,
            is_guest_default: self.is_guest_default,
        }
    }
}

const ROLE_COLUMNS: &str = "r.id, r.name, r.profit_percentage, r.created_at, r.updated_at";

/// Role of the signed-in user, falling back to the configured guest role.
/// Without a guest role the markup is zero.
pub async fn resolve_viewer(pool: &PgPool, config: &Config, viewer: &Viewer) -> Result<ViewerPricing, AppError> {
    if let Some(ctx) = &viewer.0 {
        let role = sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM users u JOIN roles r ON r.id = u.role_id
             WHERE u.id = $1 AND u.is_active"
        ))
        .bind(ctx.user_id)
        .fetch_optional(pool)
        .await?;

        if let Some(role) = role {
            return Ok(ViewerPricing {
                profit_percentage: role.profit_percentage,
                role: Some(role),
                authenticated: true,
                is_guest_default: false,
            });
        }
    }

    let guest = sqlx::query_as::<_, Role>(&format!("SELECT {ROLE_COLUMNS} FROM roles r WHERE r.name = $1"))
        .bind(&config.guest_role_name)
        .fetch_optional(pool)
        .await?;

    Ok(ViewerPricing {
        profit_percentage: guest.as_ref().map(|r| r.profit_percentage).unwrap_or(Decimal::ZERO),
        role: guest,
        authenticated: viewer.0.is_some(),
        is_guest_default: true,
    })
}

#[derive(FromRow)]
struct OfferRow {
    product_id: i64,
    #[sqlx(flatten)]
    offer: FlashSaleOffer,
}

/// Flash sales per product in attachment order. Sales already over are not loaded;
/// the resolver still checks the full window.
pub async fn load_offers(
    pool: &PgPool,
    product_ids: &[i64],
    now: DateTime<Utc>,
) -> Result<HashMap<i64, Vec<FlashSaleOffer>>, AppError> {
    if product_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, OfferRow>(
        "SELECT fsp.product_id, fs.id, fs.name, fs.start_date, fs.end_date, fs.is_active,
                fsp.discounted_price, fsp.stock
         FROM flash_sale_product fsp
         JOIN flash_sales fs ON fs.id = fsp.flash_sale_id
         WHERE fsp.product_id = ANY($1) AND fs.is_active AND fs.end_date >= $2
         ORDER BY fsp.product_id, fsp.created_at, fs.id",
    )
    .bind(product_ids)
    .bind(now)
    .fetch_all(pool)
    .await?;

    let mut by_product: HashMap<i64, Vec<FlashSaleOffer>> = HashMap::new();
    for row in rows {
        by_product.entry(row.product_id).or_default().push(row.offer);
    }
    Ok(by_product)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(name: &str, pct: i64) -> Role {
        Role {
            id: 3,
            name: name.to_string(),
            profit_percentage: Decimal::from(pct),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn pricing_info_describes_markup() {
        let v = ViewerPricing {
            profit_percentage: Decimal::from(10),
            role: Some(role("gold", 10)),
            authenticated: true,
            is_guest_default: false,
        };
        let info = v.pricing_info();
        assert_eq!(info.user_role, "gold");
        assert_eq!(info.price_calculation, "Base price + 10% profit margin");
        assert_eq!(v.role_info().unwrap().name, "gold");
    }

    #[test]
    fn pricing_info_without_guest_role() {
        let v = ViewerPricing {
            profit_percentage: Decimal::ZERO,
            role: None,
            authenticated: false,
            is_guest_default: true,
        };
        let info = v.pricing_info();
        assert_eq!(info.user_role, "guest");
        assert_eq!(info.price_calculation, "Base price (no profit margin)");
        assert!(v.role_info().is_none());
    }
}
