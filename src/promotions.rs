//! Time-window and usage filters for flash sales and vouchers.
//!
//! Pure functions over already-loaded rows; nothing here touches the database.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::voucher::Voucher;

/// `start <= now <= end`.
pub fn is_within_window(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    start <= now && now <= end
}

/// Seconds until `target`, clamped at zero.
pub fn seconds_until(target: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (target - now).num_seconds().max(0)
}

/// Redemption counts for one voucher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoucherUsage {
    pub total: i64,
    /// `None` when the viewer is anonymous; the per-user limit is then not checked.
    pub by_user: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherRejection {
    Inactive,
    NotStarted,
    Expired,
    BelowMinimumPurchase,
    TotalLimitReached,
    UserLimitReached,
    NotValidForGame,
}

impl VoucherRejection {
    pub fn message(self) -> &'static str {
        match self {
            VoucherRejection::Inactive => "Voucher is not active",
            VoucherRejection::NotStarted => "Voucher is not valid yet",
            VoucherRejection::Expired => "Voucher has expired",
            VoucherRejection::BelowMinimumPurchase => "Purchase amount is below the voucher minimum",
            VoucherRejection::TotalLimitReached => "Voucher usage limit has been reached",
            VoucherRejection::UserLimitReached => "You have already used this voucher the maximum number of times",
            VoucherRejection::NotValidForGame => "Voucher is not valid for this game",
        }
    }
}

/// Active flag and date window only.
pub fn check_voucher_window(voucher: &Voucher, now: DateTime<Utc>) -> Result<(), VoucherRejection> {
    if now > voucher.end_date {
        return Err(VoucherRejection::Expired);
    }
    if !voucher.is_active {
        return Err(VoucherRejection::Inactive);
    }
    if now < voucher.start_date {
        return Err(VoucherRejection::NotStarted);
    }
    Ok(())
}

/// Window, minimum purchase (when an amount is known) and usage limits, in that order.
pub fn check_voucher(
    voucher: &Voucher,
    now: DateTime<Utc>,
    purchase_amount: Option<Decimal>,
    usage: VoucherUsage,
) -> Result<(), VoucherRejection> {
    check_voucher_window(voucher, now)?;

    if let Some(amount) = purchase_amount {
        if amount < voucher.min_purchase {
            return Err(VoucherRejection::BelowMinimumPurchase);
        }
    }

    if usage.total >= i64::from(voucher.total_usage_limit) {
        return Err(VoucherRejection::TotalLimitReached);
    }

    if let Some(by_user) = usage.by_user {
        if by_user >= i64::from(voucher.user_usage_limit) {
            return Err(VoucherRejection::UserLimitReached);
        }
    }

    Ok(())
}

/// Keeps the vouchers that pass `check_voucher`, preserving order.
pub fn eligible_vouchers<'a, F>(
    vouchers: &'a [Voucher],
    now: DateTime<Utc>,
    purchase_amount: Option<Decimal>,
    usage_of: F,
) -> Vec<&'a Voucher>
where
    F: Fn(&Voucher) -> VoucherUsage,
{
    vouchers
        .iter()
        .filter(|v| check_voucher(v, now, purchase_amount, usage_of(v)).is_ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::voucher::DiscountType;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap()
    }

    fn voucher(code: &str, start_h: i64, end_h: i64) -> Voucher {
        Voucher {
            id: 1,
            code: code.to_string(),
            description: String::new(),
            discount_type: DiscountType::Flat,
            discount_value: Decimal::from(5000),
            start_date: now() + Duration::hours(start_h),
            end_date: now() + Duration::hours(end_h),
            min_purchase: Decimal::from(20000),
            total_usage_limit: 10,
            user_usage_limit: 1,
            is_active: true,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn test_window_is_inclusive() {
        assert!(is_within_window(now(), now(), now()));
        assert!(!is_within_window(now() + Duration::seconds(1), now() + Duration::hours(1), now()));
        assert!(!is_within_window(now() - Duration::hours(1), now() - Duration::seconds(1), now()));
    }

    #[test]
    fn test_seconds_until_clamps() {
        assert_eq!(seconds_until(now() + Duration::seconds(90), now()), 90);
        assert_eq!(seconds_until(now() - Duration::seconds(90), now()), 0);
    }

    #[test]
    fn test_expired_voucher_rejected_even_if_active() {
        let mut v = voucher("OLD", -48, -1);
        v.is_active = true;
        assert_eq!(check_voucher_window(&v, now()), Err(VoucherRejection::Expired));

        v.is_active = false;
        assert_eq!(check_voucher_window(&v, now()), Err(VoucherRejection::Expired));
    }

    #[test]
    fn test_inactive_and_future_vouchers() {
        let mut v = voucher("OFF", -1, 1);
        v.is_active = false;
        assert_eq!(check_voucher_window(&v, now()), Err(VoucherRejection::Inactive));

        let soon = voucher("SOON", 1, 2);
        assert_eq!(check_voucher_window(&soon, now()), Err(VoucherRejection::NotStarted));
    }

    #[test]
    fn test_min_purchase_only_checked_with_amount() {
        let v = voucher("MIN", -1, 1);
        let usage = VoucherUsage::default();
        assert_eq!(check_voucher(&v, now(), None, usage), Ok(()));
        assert_eq!(
            check_voucher(&v, now(), Some(Decimal::from(19999)), usage),
            Err(VoucherRejection::BelowMinimumPurchase)
        );
        assert_eq!(check_voucher(&v, now(), Some(Decimal::from(20000)), usage), Ok(()));
    }

    #[test]
    fn test_usage_limits() {
        let v = voucher("LIM", -1, 1);
        let full = VoucherUsage { total: 10, by_user: Some(0) };
        assert_eq!(check_voucher(&v, now(), None, full), Err(VoucherRejection::TotalLimitReached));

        let used_by_me = VoucherUsage { total: 3, by_user: Some(1) };
        assert_eq!(check_voucher(&v, now(), None, used_by_me), Err(VoucherRejection::UserLimitReached));

        let anonymous = VoucherUsage { total: 3, by_user: None };
        assert_eq!(check_voucher(&v, now(), None, anonymous), Ok(()));
    }

    #[test]
    fn test_eligible_vouchers_filters_and_keeps_order() {
        let vouchers = vec![
            voucher("A", -1, 1),
            voucher("EXPIRED", -5, -1),
            voucher("B", -2, 3),
            voucher("FUTURE", 1, 3),
        ];
        let kept = eligible_vouchers(&vouchers, now(), None, |_| VoucherUsage::default());
        let codes: Vec<&str> = kept.iter().map(|v| v.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B"]);
    }
}
