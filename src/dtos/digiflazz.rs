// src/dtos/digiflazz.rs
use serde::{Deserialize, Serialize};

use crate::dtos::catalog::GameBrief;

#[derive(Debug, Serialize)]
pub struct BrandResponse {
    pub brand: String,
    /// Active games whose brand matches.
    pub games: Vec<GameBrief>,
}

#[derive(Debug, Serialize)]
pub struct ProductTypesResponse {
    pub game: GameBrief,
    pub brand: String,
    pub types: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SyncProductsRequest {
    pub game_id: i64,
    /// A product type from the price list, or `ALL`.
    pub product_type: String,
}

#[derive(Debug, Default, Serialize)]
pub struct SyncSummary {
    pub brand: String,
    pub product_type: String,
    pub product_category_id: i64,
    pub created: usize,
    pub updated: usize,
    pub total: usize,
}
