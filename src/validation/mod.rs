use bigdecimal::BigDecimal;
use std::fmt;
use uuid::Uuid;

use crate::domain::{OperationType, MONEY_SCALE};

pub const WALLET_ID_MAX_LEN: usize = 64;
pub const OPERATION_TYPE_MAX_LEN: usize = 16;

/// Largest amount accepted for a single operation.
pub const MAX_OPERATION_AMOUNT: i64 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .map(|ch| if ch.is_whitespace() { ' ' } else { ch })
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.len() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

pub fn validate_enum(field: &'static str, value: &str, allowed: &[&str]) -> ValidationResult {
    if allowed.iter().all(|candidate| value != *candidate) {
        return Err(ValidationError::new(
            field,
            format!("must be one of: {}", allowed.join(", ")),
        ));
    }

    Ok(())
}

pub fn parse_wallet_id(raw: &str) -> Result<Uuid, ValidationError> {
    let raw = sanitize_string(raw);
    validate_required("wallet_id", &raw)?;
    validate_max_len("wallet_id", &raw, WALLET_ID_MAX_LEN)?;

    Uuid::parse_str(&raw).map_err(|_| ValidationError::new("wallet_id", "must be a valid UUID"))
}

pub fn parse_operation_type(raw: &str) -> Result<OperationType, ValidationError> {
    let raw = sanitize_string(raw);
    validate_required("operation_type", &raw)?;
    validate_max_len("operation_type", &raw, OPERATION_TYPE_MAX_LEN)?;
    validate_enum("operation_type", &raw, OperationType::ALL)?;

    raw.parse()
        .map_err(|e: String| ValidationError::new("operation_type", e))
}

pub fn validate_positive_amount(amount: &BigDecimal) -> ValidationResult {
    if amount <= &BigDecimal::from(0) {
        return Err(ValidationError::new("amount", "must be greater than zero"));
    }

    Ok(())
}

pub fn validate_amount_limit(amount: &BigDecimal) -> ValidationResult {
    if amount > &BigDecimal::from(MAX_OPERATION_AMOUNT) {
        return Err(ValidationError::new(
            "amount",
            format!("must be at most {}", MAX_OPERATION_AMOUNT),
        ));
    }

    Ok(())
}

/// Rejects amounts that would lose digits when stored at the money scale.
pub fn validate_amount_scale(amount: &BigDecimal) -> ValidationResult {
    if amount.with_scale(MONEY_SCALE) != *amount {
        return Err(ValidationError::new(
            "amount",
            format!("must have at most {} decimal places", MONEY_SCALE),
        ));
    }

    Ok(())
}

pub fn validate_operation_amount(amount: &BigDecimal) -> ValidationResult {
    validate_positive_amount(amount)?;
    validate_amount_limit(amount)?;
    validate_amount_scale(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).expect("valid decimal")
    }

    #[test]
    fn validates_required_field() {
        assert!(validate_required("field", "value").is_ok());
        assert!(validate_required("field", "   ").is_err());
    }

    #[test]
    fn validates_max_len() {
        assert!(validate_max_len("field", "abc", 3).is_ok());
        assert!(validate_max_len("field", "abcd", 3).is_err());
    }

    #[test]
    fn validates_enum_values() {
        assert!(validate_enum("operation_type", "DEPOSIT", OperationType::ALL).is_ok());
        assert!(validate_enum("operation_type", "TRANSFER", OperationType::ALL).is_err());
    }

    #[test]
    fn sanitizes_string() {
        assert_eq!(sanitize_string("  hello\tworld  "), "hello world");
        assert_eq!(sanitize_string("single"), "single");
        assert_eq!(sanitize_string(" \n "), "");
        assert_eq!(sanitize_string("ab\u{0000}cd\u{0007}"), "abcd");
        assert_eq!(sanitize_string("a\r\nb"), "a b");
    }

    #[test]
    fn parses_wallet_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_wallet_id(&id.to_string()), Ok(id));
        assert_eq!(parse_wallet_id(&format!(" {} ", id)), Ok(id));

        let err = parse_wallet_id("invalid-uuid").unwrap_err();
        assert_eq!(err.field, "wallet_id");
        assert_eq!(err.message, "must be a valid UUID");
        assert!(parse_wallet_id("").is_err());
        assert!(parse_wallet_id(&"a".repeat(65)).is_err());
    }

    #[test]
    fn parses_operation_type() {
        assert_eq!(parse_operation_type("DEPOSIT"), Ok(OperationType::Deposit));
        assert_eq!(parse_operation_type(" WITHDRAW "), Ok(OperationType::Withdraw));
        assert!(parse_operation_type("INVALID").is_err());
        assert!(parse_operation_type("deposit").is_err());
    }

    #[test]
    fn validates_positive_amount() {
        assert!(validate_positive_amount(&dec("1.23")).is_ok());
        assert!(validate_positive_amount(&BigDecimal::from(0)).is_err());
        assert!(validate_positive_amount(&BigDecimal::from(-1)).is_err());
    }

    #[test]
    fn validates_amount_limit() {
        assert!(validate_amount_limit(&dec("1000000000")).is_ok());
        assert!(validate_amount_limit(&dec("1000000000.01")).is_err());
    }

    #[test]
    fn validates_amount_scale() {
        assert!(validate_amount_scale(&dec("10")).is_ok());
        assert!(validate_amount_scale(&dec("10.5")).is_ok());
        assert!(validate_amount_scale(&dec("10.25")).is_ok());
        assert!(validate_amount_scale(&dec("10.250")).is_ok());
        assert!(validate_amount_scale(&dec("10.251")).is_err());
    }
}
