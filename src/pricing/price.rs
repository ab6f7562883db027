use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Canonical number of fractional digits for stored prices
pub const PRICE_SCALE: u32 = 6;

/// Errors raised by the Price value type
///
/// These are invariant violations (bad input data), not recoverable
/// conditions: callers are expected to fail fast.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("Invalid price amount: {0}")]
    InvalidAmount(String),

    #[error("Minor units exceed the representable range")]
    MinorUnitsOutOfRange,

    #[error("Division by zero price")]
    DivisionByZero,
}

/// Exact decimal price amount at a fixed scale
///
/// All arithmetic is decimal (`rust_decimal`), never binary floating point.
/// Conversions truncate toward zero; instances are immutable and every
/// operation returns a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Price {
    amount: Decimal,
    scale: u32,
}

impl Price {
    /// Parse a decimal string into a price at the canonical scale
    pub fn from_str_amount(value: &str) -> Result<Self, PriceError> {
        Self::from_str_amount_at(value, PRICE_SCALE)
    }

    /// Parse a decimal string into a price at an explicit scale
    pub fn from_str_amount_at(value: &str, scale: u32) -> Result<Self, PriceError> {
        let decimal = Decimal::from_str(value.trim())
            .map_err(|_| PriceError::InvalidAmount(value.to_string()))?;

        Ok(Self {
            amount: normalize(decimal, scale),
            scale,
        })
    }

    /// Build a price from a minor-unit integer (amount x 10^scale)
    pub fn from_minor(minor: i64, scale: u32) -> Self {
        Self {
            amount: normalize(Decimal::new(minor, scale), scale),
            scale,
        }
    }

    /// Canonical string value at this price's scale
    pub fn value(&self) -> String {
        self.amount.to_string()
    }

    /// The scale this price was normalized to
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Whether the amount is zero once truncated to the given scale
    pub fn is_zero(&self, scale: Option<u32>) -> bool {
        let precision = scale.unwrap_or(self.scale);
        self.amount
            .round_dp_with_strategy(precision, RoundingStrategy::ToZero)
            .is_zero()
    }

    /// Divide by another price, truncating the quotient at `scale`
    pub fn divided_by(&self, divisor: &Price, scale: u32) -> Result<Decimal, PriceError> {
        let quotient = self
            .amount
            .checked_div(divisor.amount)
            .ok_or(PriceError::DivisionByZero)?;

        Ok(normalize(quotient, scale))
    }

    /// Minor-unit integer representation at the given scale, truncating
    /// toward zero
    pub fn to_minor(&self, scale: u32) -> Result<i64, PriceError> {
        let scaled = normalize(self.amount, scale);

        i64::try_from(scaled.mantissa()).map_err(|_| PriceError::MinorUnitsOutOfRange)
    }

    /// Minor units at the canonical scale
    pub fn to_minor_canonical(&self) -> Result<i64, PriceError> {
        self.to_minor(self.scale)
    }

    /// String value truncated to `precision` fractional digits
    pub fn rounded(&self, precision: u32) -> String {
        normalize(self.amount, precision).to_string()
    }

    /// Display-friendly value (two fractional digits)
    pub fn formatted(&self) -> String {
        self.rounded(2)
    }

    /// The underlying decimal amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Truncate toward zero at `scale`, then pad the scale back out so the
/// canonical string form always carries exactly `scale` fractional digits
fn normalize(value: Decimal, scale: u32) -> Decimal {
    let mut truncated = value.round_dp_with_strategy(scale, RoundingStrategy::ToZero);
    truncated.rescale(scale);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_string_round_trips_canonical_value() {
        let price = Price::from_str_amount("72.5").unwrap();
        assert_eq!(price.value(), "72.500000");

        let reparsed = Price::from_str_amount(&price.value()).unwrap();
        assert_eq!(reparsed.value(), "72.500000");
    }

    #[test]
    fn test_from_string_truncates_excess_digits_toward_zero() {
        let price = Price::from_str_amount("1.9999999").unwrap();
        assert_eq!(price.value(), "1.999999");

        let negative = Price::from_str_amount("-1.9999999").unwrap();
        assert_eq!(negative.value(), "-1.999999");
    }

    #[test]
    fn test_from_string_rejects_garbage() {
        assert!(matches!(
            Price::from_str_amount("not-a-number"),
            Err(PriceError::InvalidAmount(_))
        ));
        assert!(Price::from_str_amount("").is_err());
        assert!(Price::from_str_amount("12.3.4").is_err());
    }

    #[test]
    fn test_minor_round_trip() {
        for minor in [0i64, 1, -1, 72_500_000, 123_456_789, -987_654_321] {
            let price = Price::from_minor(minor, PRICE_SCALE);
            assert_eq!(price.to_minor(PRICE_SCALE).unwrap(), minor);
        }
    }

    #[test]
    fn test_minor_round_trip_at_other_scales() {
        let price = Price::from_minor(12345, 2);
        assert_eq!(price.value(), "123.45");
        assert_eq!(price.to_minor(2).unwrap(), 12345);
    }

    #[test]
    fn test_to_minor_truncates() {
        let price = Price::from_str_amount("10.123456").unwrap();
        assert_eq!(price.to_minor(2).unwrap(), 1012);
        assert_eq!(price.to_minor(0).unwrap(), 10);
    }

    #[test]
    fn test_is_zero_respects_scale() {
        let tiny = Price::from_str_amount("0.0000004").unwrap();
        assert!(tiny.is_zero(Some(6)));

        let small = Price::from_str_amount("0.000001").unwrap();
        assert!(!small.is_zero(Some(6)));
        assert!(small.is_zero(Some(2)));
    }

    #[test]
    fn test_divided_by_truncates_quotient() {
        let end = Price::from_str_amount("75").unwrap();
        let start = Price::from_str_amount("70").unwrap();
        let ratio = end.divided_by(&start, 12).unwrap();
        // 75 / 70 = 1.0714285714285714... truncated at 12
        assert_eq!(ratio.to_string(), "1.071428571428");
    }

    #[test]
    fn test_divided_by_zero_errors() {
        let end = Price::from_str_amount("75").unwrap();
        let zero = Price::from_str_amount("0").unwrap();
        assert_eq!(end.divided_by(&zero, 12), Err(PriceError::DivisionByZero));
    }

    #[test]
    fn test_rounded_truncates_for_display() {
        let price = Price::from_str_amount("10.679999").unwrap();
        assert_eq!(price.rounded(2), "10.67");
        assert_eq!(price.formatted(), "10.67");
    }
}
