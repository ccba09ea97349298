//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! redb 不限制字符串长度，上限在写入前由这里统一把关。

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: restaurant, category, menu item, table, ingredient, etc.
pub const MAX_NAME_LEN: usize = 200;

/// Short identifiers: phone, unit, customer name, etc.
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// 单行菜品数量上限，防止误输入
pub const MAX_QUANTITY: u32 = 999;

/// Waiter PIN is a fixed 4-digit string
pub const PIN_LEN: usize = 4;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that a string is within the length limit; empty is allowed.
pub fn validate_text_len(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate a waiter PIN: exactly four ASCII digits.
pub fn validate_pin(pin: &str) -> Result<(), AppError> {
    if pin.len() != PIN_LEN || !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::validation("PIN must be exactly 4 digits"));
    }
    Ok(())
}

/// Validate a per-line order quantity against the input cap.
///
/// 零数量的业务拒绝在引擎里，这里只拦明显的误输入。
pub fn validate_quantity(qty: u32) -> Result<(), AppError> {
    if qty > MAX_QUANTITY {
        return Err(AppError::validation(format!(
            "qty {qty} exceeds the per-line limit {MAX_QUANTITY}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Mesa 1", "name", MAX_NAME_LEN).is_ok());
        assert!(validate_required_text("", "name", MAX_NAME_LEN).is_err());
        assert!(validate_required_text("   ", "name", MAX_NAME_LEN).is_err());
        assert!(validate_required_text(&"x".repeat(201), "name", MAX_NAME_LEN).is_err());
    }

    #[test]
    fn test_text_len_allows_empty() {
        assert!(validate_text_len("", "phone", MAX_SHORT_TEXT_LEN).is_ok());
        assert!(validate_text_len("600123456", "phone", MAX_SHORT_TEXT_LEN).is_ok());
        assert!(validate_text_len(&"x".repeat(101), "phone", MAX_SHORT_TEXT_LEN).is_err());
    }

    #[test]
    fn test_pin_shape() {
        assert!(validate_pin("1234").is_ok());
        assert!(validate_pin("0000").is_ok());
        assert!(validate_pin("123").is_err());
        assert!(validate_pin("12345").is_err());
        assert!(validate_pin("12a4").is_err());
    }

    #[test]
    fn test_quantity_cap() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_QUANTITY).is_ok());
        assert!(validate_quantity(MAX_QUANTITY + 1).is_err());
    }
}
