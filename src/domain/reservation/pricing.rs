//! Stay pricing: loyalty discount tiers and the quote for a new booking

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::model::StayWindow;

/// Loyalty tiers as `(minimum visits, percent off)`, highest first.
pub const DISCOUNT_TIERS: [(u32, u32); 4] = [(15, 20), (10, 15), (5, 10), (3, 5)];

/// Percent discount for a guest with `visits` confirmed stays.
pub fn discount_percent(visits: u32) -> Decimal {
    DISCOUNT_TIERS
        .iter()
        .find(|(min_visits, _)| visits >= *min_visits)
        .map(|(_, pct)| Decimal::from(*pct))
        .unwrap_or(Decimal::ZERO)
}

fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub nights: i64,
    pub nightly_price: Decimal,
    pub subtotal: Decimal,
    pub discount_percent: Decimal,
    pub discount: Decimal,
    pub taxes: Decimal,
    pub total: Decimal,
}

impl Quote {
    /// Price a stay. Taxes apply to the discounted subtotal.
    pub fn compute(window: &StayWindow, nightly_price: Decimal, visits: u32, tax_rate_percent: Decimal) -> Self {
        let nights = window.nights();
        let subtotal = nightly_price * Decimal::from(nights);
        let discount_percent = discount_percent(visits);
        let discount = round_cents(subtotal * discount_percent / Decimal::ONE_HUNDRED);
        let taxes = round_cents((subtotal - discount) * tax_rate_percent / Decimal::ONE_HUNDRED);
        Self {
            nights,
            nightly_price,
            subtotal,
            discount_percent,
            discount,
            taxes,
            total: subtotal - discount + taxes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn window(nights: u32) -> StayWindow {
        let checkin = Utc.with_ymd_and_hms(2026, 5, 1, 15, 0, 0).unwrap();
        StayWindow::new(checkin, checkin + chrono::Duration::days(nights as i64)).unwrap()
    }

    #[test]
    fn no_discount_without_visits() {
        assert_eq!(discount_percent(0), Decimal::ZERO);
        assert_eq!(discount_percent(2), Decimal::ZERO);
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(discount_percent(3), Decimal::from(5));
        assert_eq!(discount_percent(5), Decimal::from(10));
        assert_eq!(discount_percent(9), Decimal::from(10));
        assert_eq!(discount_percent(10), Decimal::from(15));
        assert_eq!(discount_percent(15), Decimal::from(20));
        assert_eq!(discount_percent(500), Decimal::from(20));
    }

    #[test]
    fn discount_is_monotonic_in_visits() {
        let mut previous = Decimal::ZERO;
        for visits in 0..40 {
            let pct = discount_percent(visits);
            assert!(pct >= previous, "tier dropped at {} visits", visits);
            previous = pct;
        }
    }

    #[test]
    fn quote_for_first_time_guest() {
        let q = Quote::compute(&window(2), Decimal::new(100, 0), 0, Decimal::ZERO);
        assert_eq!(q.nights, 2);
        assert_eq!(q.subtotal, Decimal::new(200, 0));
        assert_eq!(q.discount, Decimal::ZERO);
        assert_eq!(q.total, Decimal::new(200, 0));
    }

    #[test]
    fn quote_applies_discount_then_tax() {
        // 3 nights x 120.00 = 360.00, 10% off = 36.00, 18% tax on 324.00 = 58.32
        let q = Quote::compute(&window(3), Decimal::new(12000, 2), 6, Decimal::from(18));
        assert_eq!(q.discount, Decimal::new(3600, 2));
        assert_eq!(q.taxes, Decimal::new(5832, 2));
        assert_eq!(q.total, Decimal::new(38232, 2));
    }
}
