//! Digiflazz price-list client
//!
//! Digiflazz is the upstream supplier for most top-up SKUs. Admins pull its
//! prepaid price list and upsert matching products for a game; brands are
//! matched case-insensitively against `games.brand`.

use std::collections::BTreeSet;
use std::time::Duration;

use md5::{Digest, Md5};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::DigiflazzConfig;
use crate::error::AppError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);
const RATE_LIMIT_CODE: &str = "83";

/// Product type selector meaning "every type for the brand".
pub const ALL_TYPES: &str = "ALL";

/// One row of the prepaid price list. Rows missing any of these fields are skipped.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PriceListItem {
    pub product_name: String,
    pub brand: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub buyer_sku_code: String,
    pub price: Decimal,
    pub seller_product_status: bool,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PriceListEnvelope {
    data: Value,
}

/// `md5(username ‖ api_key ‖ suffix)` as lowercase hex.
pub fn sign(username: &str, api_key: &str, suffix: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(username.as_bytes());
    hasher.update(api_key.as_bytes());
    hasher.update(suffix.as_bytes());
    hex::encode(hasher.finalize())
}

/// Trimmed, upper-cased brand for comparison.
pub fn normalize_brand(brand: &str) -> String {
    brand.trim().to_uppercase()
}

/// Parses the `data` array, dropping malformed rows. A non-array `data`
/// is how the API reports errors, so it is surfaced instead.
pub fn parse_price_list(body: &Value) -> Result<Vec<PriceListItem>, AppError> {
    let field = |name: &str| {
        body.pointer(&format!("/data/{name}"))
            .or_else(|| body.get(name))
            .and_then(Value::as_str)
    };
    let rate_limited = field("rc") == Some(RATE_LIMIT_CODE)
        || field("message").is_some_and(|m| m.contains("limitasi"));
    if rate_limited {
        return Err(AppError::rate_limited(
            "Digiflazz API rate limit reached. Please wait a few minutes and try again.",
        ));
    }

    let envelope: PriceListEnvelope = serde_json::from_value(body.clone())
        .map_err(|_| AppError::upstream("Invalid Digiflazz response format"))?;

    let rows = envelope
        .data
        .as_array()
        .ok_or_else(|| AppError::upstream("Invalid Digiflazz response format"))?;

    let items: Vec<PriceListItem> = rows
        .iter()
        .filter_map(|row| serde_json::from_value(row.clone()).ok())
        .collect();

    if items.len() < rows.len() {
        warn!(skipped = rows.len() - items.len(), "Skipped malformed Digiflazz rows");
    }
    Ok(items)
}

/// Distinct normalized brands, sorted.
pub fn available_brands(items: &[PriceListItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| normalize_brand(&item.brand))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct product types offered for `brand`, sorted, original casing kept.
pub fn types_for_brand(items: &[PriceListItem], brand: &str) -> Vec<String> {
    let wanted = normalize_brand(brand);
    items
        .iter()
        .filter(|item| normalize_brand(&item.brand) == wanted)
        .map(|item| item.product_type.trim().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Rows to upsert for `brand`, restricted to `product_type` unless it is `ALL`.
pub fn select_for_sync<'a>(
    items: &'a [PriceListItem],
    brand: &str,
    product_type: &str,
) -> Vec<&'a PriceListItem> {
    let wanted = normalize_brand(brand);
    items
        .iter()
        .filter(|item| normalize_brand(&item.brand) == wanted)
        .filter(|item| product_type == ALL_TYPES || item.product_type.trim() == product_type)
        .collect()
}

#[derive(Clone)]
pub struct DigiflazzClient {
    http: reqwest::Client,
    config: DigiflazzConfig,
}

impl DigiflazzClient {
    pub fn new(config: DigiflazzConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http, config }
    }

    /// Fetches the prepaid price list, retrying transport failures and 5xx responses.
    pub async fn price_list(&self) -> Result<Vec<PriceListItem>, AppError> {
        let url = format!("{}/price-list", self.config.base_url.trim_end_matches('/'));
        let payload = serde_json::json!({
            "cmd": "prepaid",
            "username": self.config.username,
            "sign": sign(&self.config.username, &self.config.api_key, "pricelist"),
        });

        let mut last_error = AppError::upstream("Cannot connect to Digiflazz API");
        for attempt in 1..=MAX_ATTEMPTS {
            match self.http.post(&url).json(&payload).send().await {
                Ok(resp) if resp.status().is_server_error() => {
                    warn!(attempt, status = %resp.status(), "Digiflazz returned server error");
                    last_error = AppError::upstream(format!(
                        "Cannot connect to Digiflazz API. Status: {}",
                        resp.status().as_u16()
                    ));
                }
                Ok(resp) if !resp.status().is_success() => {
                    return Err(AppError::upstream(format!(
                        "Cannot connect to Digiflazz API. Status: {}",
                        resp.status().as_u16()
                    )));
                }
                Ok(resp) => {
                    let body: Value = resp
                        .json()
                        .await
                        .map_err(|e| AppError::upstream(format!("Invalid Digiflazz response: {e}")))?;
                    let items = parse_price_list(&body)?;
                    info!(count = items.len(), "Fetched Digiflazz price list");
                    return Ok(items);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Digiflazz request failed");
                    last_error = AppError::upstream(format!("Cannot connect to Digiflazz API: {e}"));
                }
            }

            if attempt < MAX_ATTEMPTS {
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(brand: &str, kind: &str, sku: &str) -> PriceListItem {
        PriceListItem {
            product_name: format!("{brand} {sku}"),
            brand: brand.to_string(),
            product_type: kind.to_string(),
            buyer_sku_code: sku.to_string(),
            price: Decimal::from(10000),
            seller_product_status: true,
            category: Some("Games".to_string()),
            desc: None,
        }
    }

    #[test]
    fn test_signature_is_md5_hex() {
        // md5("") is well known; concatenation of empty parts must match it.
        assert_eq!(sign("", "", ""), "d41d8cd98f00b204e9800998ecf8427e");
        let sig = sign("user", "key", "pricelist");
        assert_eq!(sig.len(), 32);
        assert_eq!(sig, sign("userkey", "", "pricelist"));
    }

    #[test]
    fn test_listed_type_selects_untrimmed_rows() {
        let items = vec![item("MOBILE LEGENDS", "Umum ", "ML86"), item("MOBILE LEGENDS", "Membership", "MLWDP")];
        let types = types_for_brand(&items, "mobile legends");
        assert_eq!(types, vec!["Membership".to_string(), "Umum".to_string()]);

        let selected = select_for_sync(&items, "MOBILE LEGENDS", &types[1]);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].buyer_sku_code, "ML86");
    }

    #[test]
    fn test_parse_skips_malformed_rows() {
        let body = json!({
            "data": [
                { "product_name": "ML 86", "brand": "MOBILE LEGENDS", "type": "Umum",
                  "buyer_sku_code": "ML86", "price": 19500, "seller_product_status": true },
                { "brand": "MOBILE LEGENDS" },
                "garbage"
            ]
        });
        let items = parse_price_list(&body).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].buyer_sku_code, "ML86");
        assert_eq!(items[0].price, Decimal::from(19500));
    }

    #[test]
    fn test_rate_limit_is_detected() {
        let body = json!({ "data": { "rc": "83", "message": "Anda terkena limitasi" } });
        assert!(matches!(parse_price_list(&body), Err(AppError::RateLimited(_))));

        let body = json!({ "data": { "rc": "99", "message": "terkena limitasi pricelist" } });
        assert!(matches!(parse_price_list(&body), Err(AppError::RateLimited(_))));
    }

    #[test]
    fn test_non_array_data_is_upstream_error() {
        let body = json!({ "data": { "rc": "41", "message": "Signature anda salah" } });
        assert!(matches!(parse_price_list(&body), Err(AppError::Upstream(_))));
        assert!(matches!(parse_price_list(&json!({})), Err(AppError::Upstream(_))));
    }

    #[test]
    fn test_brands_and_types() {
        let items = vec![
            item(" mobile legends ", "Umum", "ML1"),
            item("MOBILE LEGENDS", "Membership", "ML2"),
            item("FREE FIRE", "Umum", "FF1"),
            item("Mobile Legends", "Umum", "ML3"),
        ];
        assert_eq!(available_brands(&items), vec!["FREE FIRE", "MOBILE LEGENDS"]);
        assert_eq!(types_for_brand(&items, "mobile legends"), vec!["Membership", "Umum"]);
    }

    #[test]
    fn test_select_for_sync_by_type() {
        let items = vec![
            item("MOBILE LEGENDS", "Umum", "ML1"),
            item("MOBILE LEGENDS", "Membership", "ML2"),
            item("FREE FIRE", "Umum", "FF1"),
        ];
        let all: Vec<&str> = select_for_sync(&items, "Mobile Legends", ALL_TYPES)
            .iter()
            .map(|i| i.buyer_sku_code.as_str())
            .collect();
        assert_eq!(all, vec!["ML1", "ML2"]);

        let umum = select_for_sync(&items, "MOBILE LEGENDS", "Umum");
        assert_eq!(umum.len(), 1);
        assert_eq!(umum[0].buyer_sku_code, "ML1");
    }
}
