//! Money and quantity arithmetic using rust_decimal for precision
//!
//! 金额两位小数、库存量三位小数，全部用 `Decimal` 计算，
//! 序列化时金额字段按字符串输出（统计类数值字段除外）。

use rust_decimal::prelude::*;

/// 金额小数位（欧分精度）
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// 库存量小数位（克/毫升精度）
pub const STOCK_DECIMAL_PLACES: u32 = 3;

/// 账单固定税率 5%
pub const TAX_RATE_PERCENT: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Round a monetary value to 2 decimal places (half-up)
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a stock quantity to 3 decimal places (half-up)
#[inline]
pub fn round_stock(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(STOCK_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert Decimal to f64 for number-typed JSON fields, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    round_money(value).to_f64().unwrap_or_default()
}

/// 账单税额 = 小计 × 5%
pub fn bill_tax(subtotal: Decimal) -> Decimal {
    round_money(subtotal * TAX_RATE_PERCENT / Decimal::ONE_HUNDRED)
}

/// 备餐时长（分钟，1 位小数）
///
/// 入参是订单创建与出餐的 Unix 毫秒时间戳。
pub fn prep_minutes(created_at: i64, ready_at: i64) -> f64 {
    let elapsed_ms = ready_at.saturating_sub(created_at);
    let minutes = Decimal::from(elapsed_ms) / Decimal::from(60_000);
    minutes
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(num: i64, scale: u32) -> Decimal {
        Decimal::new(num, scale)
    }

    #[test]
    fn test_round_money_half_up() {
        assert_eq!(round_money(dec(12345, 3)), dec(1235, 2)); // 12.345 -> 12.35
        assert_eq!(round_money(dec(12344, 3)), dec(1234, 2)); // 12.344 -> 12.34
        assert_eq!(round_money(dec(-12345, 3)), dec(-1235, 2));
    }

    #[test]
    fn test_round_stock_keeps_three_places() {
        assert_eq!(round_stock(dec(15005, 4)), dec(1501, 3)); // 1.5005 -> 1.501
        assert_eq!(round_stock(dec(250, 3)), dec(250, 3));
    }

    #[test]
    fn test_bill_tax_five_percent() {
        assert_eq!(bill_tax(dec(10000, 2)), dec(500, 2)); // 100.00 -> 5.00
        assert_eq!(bill_tax(dec(2850, 2)), dec(143, 2)); // 28.50 -> 1.425 -> 1.43
        assert_eq!(bill_tax(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_prep_minutes_rounded_to_one_decimal() {
        // 12 min 30 s -> 12.5
        assert_eq!(prep_minutes(0, 750_000), 12.5);
        // 7 min 3 s -> 7.05 -> 7.1
        assert_eq!(prep_minutes(0, 423_000), 7.1);
        assert_eq!(prep_minutes(1_000, 1_000), 0.0);
        // 时钟回拨时不出负值
        assert_eq!(prep_minutes(10_000, 5_000), 0.0);
    }

    #[test]
    fn test_to_f64_rounds_first() {
        assert_eq!(to_f64(dec(12345, 3)), 12.35);
        assert_eq!(to_f64(Decimal::ZERO), 0.0);
    }
}
