// src/common/money.rs
// Valores monetários são gravados em NUMERIC(14,2).

use rust_decimal::Decimal;
use validator::ValidationError;

const MAX_INTEGER_DIGITS: u32 = 12;
const MAX_SCALE: u32 = 2;

/// |valor| < 10^12 e no máximo 2 casas decimais (zeros à direita não contam).
pub fn check_fits_column(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.abs() >= Decimal::from(10_i64.pow(MAX_INTEGER_DIGITS)) {
        return Err(range_error("amount_too_large"));
    }
    if amount.normalize().scale() > MAX_SCALE {
        return Err(range_error("amount_precision"));
    }
    Ok(())
}

pub(crate) fn range_error(message: &'static str) -> ValidationError {
    let mut err = ValidationError::new("range");
    err.message = Some(message.into());
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn accepts_values_that_fit_numeric_14_2() {
        for ok in ["0", "50000", "999999999999.99", "-999999999999.99", "12.50", "12.500"] {
            assert!(check_fits_column(&dec(ok)).is_ok(), "{ok}");
        }
    }

    #[test]
    fn rejects_overflowing_magnitude() {
        let err = check_fits_column(&dec("1000000000000")).unwrap_err();
        assert_eq!(err.message.as_deref(), Some("amount_too_large"));
        assert!(check_fits_column(&dec("1000000000000000")).is_err());
    }

    #[test]
    fn rejects_more_than_two_decimals() {
        let err = check_fits_column(&dec("10.005")).unwrap_err();
        assert_eq!(err.message.as_deref(), Some("amount_precision"));
    }
}
