//! Custom `validator` rules for decimal amounts and identifiers.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use validator::ValidationError;

lazy_static! {
    static ref FIELD_KEY: Regex = Regex::new(r"^[a-z][a-z0-9_]{0,63}$").expect("valid regex");
}

pub fn positive_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("must_be_positive"))
    }
}

pub fn non_negative_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if *value >= Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("must_not_be_negative"))
    }
}

pub fn percentage(value: &Decimal) -> Result<(), ValidationError> {
    if *value >= Decimal::ZERO && *value <= Decimal::ONE_HUNDRED {
        Ok(())
    } else {
        Err(ValidationError::new("must_be_between_0_and_100"))
    }
}

pub fn valid_ply(value: i32) -> Result<(), ValidationError> {
    match value {
        3 | 5 | 7 => Ok(()),
        _ => Err(ValidationError::new("ply_must_be_3_5_or_7")),
    }
}

/// snake_case key, starting with a letter.
pub fn field_key(value: &str) -> Result<(), ValidationError> {
    if FIELD_KEY.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("field_key_must_be_snake_case"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case("ink_colour", true)]
    #[case("speed2", true)]
    #[case("InkColour", false)]
    #[case("2speed", false)]
    #[case("ink-colour", false)]
    #[case("", false)]
    fn field_keys(#[case] key: &str, #[case] ok: bool) {
        assert_eq!(field_key(key).is_ok(), ok);
    }

    #[test]
    fn decimal_bounds() {
        assert!(positive_decimal(&dec!(0.01)).is_ok());
        assert!(positive_decimal(&Decimal::ZERO).is_err());
        assert!(non_negative_decimal(&Decimal::ZERO).is_ok());
        assert!(non_negative_decimal(&dec!(-1)).is_err());
        assert!(percentage(&dec!(18)).is_ok());
        assert!(percentage(&dec!(100.01)).is_err());
    }

    #[test]
    fn ply_values() {
        assert!(valid_ply(5).is_ok());
        assert!(valid_ply(4).is_err());
    }
}
