//! Cart totals, percentage discounts and coupon eligibility.
//!
//! All amounts are minor currency units (paise). Discounts round half away
//! from zero to the nearest unit.

use chrono::{DateTime, Utc};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub quantity: i32,
    pub unit_price: i64,
}

/// Σ quantity × unit price.
pub fn cart_total<'a, I>(lines: I) -> i64
where
    I: IntoIterator<Item = &'a CartLine>,
{
    lines
        .into_iter()
        .map(|line| i64::from(line.quantity) * line.unit_price)
        .sum()
}

/// Σ quantity.
pub fn item_count<'a, I>(lines: I) -> i64
where
    I: IntoIterator<Item = &'a CartLine>,
{
    lines.into_iter().map(|line| i64::from(line.quantity)).sum()
}

/// `round(total × pct / 100)`; `pct` is clamped to 0..=100.
pub fn discount_amount(total: i64, pct: i32) -> i64 {
    let pct = i64::from(pct.clamp(0, 100));
    let scaled = total * pct;
    if scaled >= 0 {
        (scaled + 50) / 100
    } else {
        (scaled - 50) / 100
    }
}

pub fn discounted_total(total: i64, pct: i32) -> i64 {
    total - discount_amount(total, pct)
}

/// The fields of a coupon that decide whether it applies.
#[derive(Debug, Clone)]
pub struct CouponRule {
    pub discount_percentage: i32,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponRejection {
    Unknown,
    Inactive,
    Expired,
}

impl From<CouponRejection> for AppError {
    fn from(reason: CouponRejection) -> Self {
        let msg = match reason {
            CouponRejection::Unknown => "Invalid coupon code",
            CouponRejection::Inactive => "Coupon is no longer active",
            CouponRejection::Expired => "Coupon has expired",
        };
        AppError::BadRequest(msg.into())
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

pub fn check_coupon(coupon: &CouponRule, now: DateTime<Utc>) -> Result<(), CouponRejection> {
    if !coupon.is_active {
        return Err(CouponRejection::Inactive);
    }
    match coupon.expires_at {
        Some(expiry) if expiry <= now => Err(CouponRejection::Expired),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn line(quantity: i32, unit_price: i64) -> CartLine {
        CartLine {
            quantity,
            unit_price,
        }
    }

    #[test]
    fn two_jars_with_ten_percent_off() {
        let lines = [line(2, 59_900)];
        let total = cart_total(&lines);
        assert_eq!(total, 119_800);
        assert_eq!(discount_amount(total, 10), 11_980);
        assert_eq!(discounted_total(total, 10), 107_820);
    }

    #[test]
    fn total_sums_every_line() {
        let lines = [line(1, 250), line(3, 1_000), line(2, 99)];
        assert_eq!(cart_total(&lines), 250 + 3_000 + 198);
        assert_eq!(item_count(&lines), 6);
        assert_eq!(cart_total(&[] as &[CartLine]), 0);
    }

    #[test]
    fn discount_rounds_half_up() {
        // 12.5 -> 13, 12.4 -> 12
        assert_eq!(discount_amount(125, 10), 13);
        assert_eq!(discount_amount(124, 10), 12);
        assert_eq!(discount_amount(1, 50), 1);
        assert_eq!(discount_amount(999, 0), 0);
        assert_eq!(discount_amount(999, 100), 999);
    }

    #[test]
    fn discounted_total_never_increases_with_percentage() {
        for total in [0_i64, 1, 99, 119_800, 1_234_567] {
            let mut previous = discounted_total(total, 0);
            assert_eq!(previous, total);
            for pct in 1..=100 {
                let current = discounted_total(total, pct);
                assert!(current <= previous, "total {total} pct {pct}");
                assert_eq!(current, total - discount_amount(total, pct));
                previous = current;
            }
            assert_eq!(previous, 0);
        }
    }

    #[test]
    fn out_of_range_percentages_are_clamped() {
        assert_eq!(discounted_total(1_000, -5), 1_000);
        assert_eq!(discounted_total(1_000, 150), 0);
    }

    #[test]
    fn coupon_eligibility() {
        let now = Utc::now();
        let mut rule = CouponRule {
            discount_percentage: 10,
            is_active: true,
            expires_at: None,
        };
        assert!(check_coupon(&rule, now).is_ok());

        rule.expires_at = Some(now - Duration::days(1));
        assert_eq!(check_coupon(&rule, now), Err(CouponRejection::Expired));

        rule.expires_at = Some(now + Duration::days(1));
        rule.is_active = false;
        assert_eq!(check_coupon(&rule, now), Err(CouponRejection::Inactive));
    }

    #[test]
    fn codes_normalize_to_upper_case() {
        assert_eq!(normalize_code("  welcome10 "), "WELCOME10");
        assert_eq!(normalize_code(""), "");
    }

    #[test]
    fn coupon_expiring_later_is_valid() {
        let now = Utc::now();
        let rule = CouponRule {
            discount_percentage: 15,
            is_active: true,
            expires_at: Some(now + Duration::minutes(5)),
        };
        assert!(check_coupon(&rule, now).is_ok());
        assert_eq!(
            check_coupon(&rule, now + Duration::minutes(5)),
            Err(CouponRejection::Expired)
        );
    }
}
