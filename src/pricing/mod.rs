mod change;
mod period;
mod price;

pub use change::PriceChangeCalculator;
pub use period::PerformancePeriod;
pub use price::{Price, PriceError, PRICE_SCALE};
