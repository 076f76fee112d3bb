//! Price resolution
//!
//! Turns a product's cost basis into the price shown to a viewer:
//! role markup first, then an active flash sale overriding it.
//! All arithmetic happens in `Decimal`; displayed prices are whole currency units.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use serde::Serialize;

use crate::promotions::is_within_window;

/// Discount percentages keep two decimal places.
const PERCENT_PLACES: u32 = 2;

/// Rounds to the nearest whole currency unit, half away from zero.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// `base_price × (1 + profit_percentage / 100)`, unrounded.
pub fn role_price(base_price: Decimal, profit_percentage: Decimal) -> Decimal {
    base_price * (Decimal::ONE + profit_percentage / Decimal::ONE_HUNDRED)
}

/// Percentage saved going from `original` to `discounted`, two decimals.
/// Zero when `original` is not positive.
pub fn discount_percentage(original: Decimal, discounted: Decimal) -> Decimal {
    if original <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    ((original - discounted) / original * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(PERCENT_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// A flash sale as attached to one product, pivot columns included.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct FlashSaleOffer {
    pub id: i64,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub discounted_price: Decimal,
    /// `None` is unlimited.
    pub stock: Option<i32>,
}

impl FlashSaleOffer {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && is_within_window(self.start_date, self.end_date, now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlashSaleQuote {
    pub id: i64,
    pub name: String,
    pub discounted_price: Decimal,
    pub original_price: Decimal,
    pub discount_percentage: Decimal,
    pub stock: Option<i32>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub base_price: Decimal,
    /// Role-adjusted price, unrounded.
    pub role_price: Decimal,
    pub flash_sale: Option<FlashSaleQuote>,
    pub final_price: Decimal,
}

impl PriceQuote {
    /// Role price as displayed.
    pub fn product_price(&self) -> Decimal {
        round_currency(self.role_price)
    }
}

/// First live offer in attachment order. Not the cheapest one.
pub fn select_offer(offers: &[FlashSaleOffer], now: DateTime<Utc>) -> Option<&FlashSaleOffer> {
    offers.iter().find(|offer| offer.is_live(now))
}

/// Prices `offer` against an already computed role price, whether or not it is live.
pub fn quote_offer(role_price: Decimal, offer: &FlashSaleOffer) -> FlashSaleQuote {
    FlashSaleQuote {
        id: offer.id,
        name: offer.name.clone(),
        discounted_price: round_currency(offer.discounted_price),
        original_price: round_currency(role_price),
        discount_percentage: discount_percentage(role_price, offer.discounted_price),
        stock: offer.stock,
        start_date: offer.start_date,
        end_date: offer.end_date,
        is_active: offer.is_active,
    }
}

pub fn resolve_price(
    base_price: Decimal,
    profit_percentage: Decimal,
    offers: &[FlashSaleOffer],
    now: DateTime<Utc>,
) -> PriceQuote {
    let role_price = role_price(base_price, profit_percentage);

    let flash_sale = select_offer(offers, now).map(|offer| quote_offer(role_price, offer));

    let final_price = match &flash_sale {
        Some(quote) => quote.discounted_price,
        None => round_currency(role_price),
    };

    PriceQuote {
        base_price,
        role_price,
        flash_sale,
        final_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap()
    }

    fn offer(id: i64, price: Decimal, start: i64, end: i64) -> FlashSaleOffer {
        FlashSaleOffer {
            id,
            name: format!("Sale {id}"),
            start_date: now() + Duration::hours(start),
            end_date: now() + Duration::hours(end),
            is_active: true,
            discounted_price: price,
            stock: None,
        }
    }

    #[test]
    fn test_role_markup() {
        assert_eq!(role_price(d("100000"), d("10")), d("110000"));
        assert_eq!(role_price(d("15000"), d("0")), d("15000"));
        assert_eq!(role_price(d("999"), d("100")), d("1998"));
    }

    #[test]
    fn test_no_flash_sale_rounds_role_price() {
        // 12345 * 1.05 = 12962.25
        let quote = resolve_price(d("12345"), d("5"), &[], now());
        assert_eq!(quote.role_price, d("12962.25"));
        assert_eq!(quote.final_price, d("12962"));
        assert!(quote.flash_sale.is_none());
    }

    #[test]
    fn test_half_rounds_away_from_zero() {
        assert_eq!(round_currency(d("10.5")), d("11"));
        assert_eq!(round_currency(d("10.49")), d("10"));
    }

    #[test]
    fn test_flash_sale_overrides_role_price() {
        let offers = vec![offer(7, d("90000"), -1, 1)];
        let quote = resolve_price(d("100000"), d("10"), &offers, now());

        assert_eq!(quote.role_price, d("110000"));
        let flash = quote.flash_sale.as_ref().unwrap();
        assert_eq!(flash.id, 7);
        assert_eq!(flash.discount_percentage, d("18.18"));
        assert_eq!(flash.original_price, d("110000"));
        assert_eq!(quote.final_price, d("90000"));
    }

    #[test]
    fn test_zero_base_price_has_no_division() {
        let quote = resolve_price(d("0"), d("20"), &[], now());
        assert_eq!(quote.role_price, d("0"));
        assert_eq!(quote.final_price, d("0"));

        let offers = vec![offer(1, d("0"), -1, 1)];
        let quote = resolve_price(d("0"), d("20"), &offers, now());
        assert_eq!(quote.flash_sale.unwrap().discount_percentage, d("0"));
        assert_eq!(quote.final_price, d("0"));
    }

    #[test]
    fn test_first_live_offer_wins_over_cheaper_one() {
        let offers = vec![
            offer(1, d("5000"), 2, 3),  // not started
            offer(2, d("9000"), -1, 1), // live, first
            offer(3, d("1000"), -1, 1), // live, cheaper
        ];
        let quote = resolve_price(d("10000"), d("0"), &offers, now());
        assert_eq!(quote.flash_sale.unwrap().id, 2);
        assert_eq!(quote.final_price, d("9000"));
    }

    #[test]
    fn test_inactive_or_expired_offers_are_ignored() {
        let mut inactive = offer(1, d("100"), -1, 1);
        inactive.is_active = false;
        let expired = offer(2, d("100"), -3, -1);

        let quote = resolve_price(d("1000"), d("10"), &[inactive, expired], now());
        assert!(quote.flash_sale.is_none());
        assert_eq!(quote.final_price, d("1100"));
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let starts_now = offer(1, d("500"), 0, 1);
        let ends_now = offer(2, d("600"), -1, 0);
        assert!(starts_now.is_live(now()));
        assert!(ends_now.is_live(now()));
    }

    #[test]
    fn test_flash_price_is_rounded_and_stock_kept() {
        let mut o = offer(4, d("89999.5"), -1, 1);
        o.stock = Some(25);
        let quote = resolve_price(d("100000"), d("0"), &[o], now());
        let flash = quote.flash_sale.unwrap();
        assert_eq!(flash.discounted_price, d("90000"));
        assert_eq!(flash.stock, Some(25));
        assert_eq!(quote.final_price, d("90000"));
    }

    #[test]
    fn test_discount_percentage_non_negative_when_cheaper() {
        for (role, flash) in [(d("100"), d("100")), (d("100"), d("1")), (d("3"), d("2"))] {
            assert!(discount_percentage(role, flash) >= Decimal::ZERO);
        }
        // A flash price above the role price shows as a negative discount.
        assert_eq!(discount_percentage(d("100"), d("110")), d("-10"));
    }

    #[test]
    fn test_quote_offer_prices_upcoming_sale() {
        let upcoming = offer(9, d("45000"), 2, 4);
        let quote = quote_offer(role_price(d("50000"), d("0")), &upcoming);
        assert_eq!(quote.original_price, d("50000"));
        assert_eq!(quote.discount_percentage, d("10"));
        assert_eq!(quote.discounted_price, d("45000"));
    }
}
