use crate::pricing::{Price, PRICE_SCALE};
use rust_decimal::{Decimal, RoundingStrategy};

/// Percentage-change engine for price comparisons
///
/// Quotients are computed at a high internal scale and only rounded once,
/// half-up, at the output precision. Binary floats never enter this path:
/// compounding float error is exactly what makes percentage displays drift.
#[derive(Debug, Clone)]
pub struct PriceChangeCalculator {
    /// Internal scale for the division step
    scale: u32,
    /// Scale at which a start price counts as zero (division guard)
    zero_scale: u32,
    /// Fractional digits of the emitted percentage
    precision: u32,
}

impl Default for PriceChangeCalculator {
    fn default() -> Self {
        Self {
            scale: 12,
            zero_scale: PRICE_SCALE,
            precision: 6,
        }
    }
}

impl PriceChangeCalculator {
    pub fn new(scale: u32, zero_scale: u32, precision: u32) -> Self {
        Self {
            scale,
            zero_scale,
            precision,
        }
    }

    /// Percentage change from `start` to `end`: `(end / start) - 1`
    ///
    /// `None` when either price is missing or the start price is zero at the
    /// configured zero scale.
    pub fn percentage(&self, start: Option<&Price>, end: Option<&Price>) -> Option<Decimal> {
        let (start, end) = match (start, end) {
            (Some(start), Some(end)) => (start, end),
            _ => return None,
        };

        if start.is_zero(Some(self.zero_scale)) {
            return None;
        }

        // Guarded above; a zero divisor cannot reach the division
        let ratio = end.divided_by(start, self.scale).ok()?;
        let change = ratio - Decimal::ONE;

        Some(self.round(change, self.precision))
    }

    /// Human-readable rendering: `None` becomes the literal `"none"`,
    /// otherwise the percentage x 100 at two fractional digits with a
    /// trailing `%`
    pub fn formatted(&self, percentage: Option<&Decimal>) -> String {
        match percentage {
            None => "none".to_string(),
            Some(value) => {
                let scaled = *value * Decimal::ONE_HUNDRED;
                format!("{}%", self.round(scaled, 2))
            }
        }
    }

    /// Half-up rounding at `precision`, normalizing negative zero and
    /// padding the scale so output always carries `precision` digits
    fn round(&self, value: Decimal, precision: u32) -> Decimal {
        let mut rounded =
            value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);

        if rounded.is_zero() {
            rounded = Decimal::ZERO;
        }

        rounded.rescale(precision);
        rounded
    }
}
