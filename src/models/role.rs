use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    /// Markup over base price, 0..=100.
    pub profit_percentage: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        self.name == ADMIN_ROLE
    }
}
