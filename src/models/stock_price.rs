use crate::pricing::{Price, PRICE_SCALE};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Closing/reference price for one company on one calendar date
///
/// At most one row exists per `(company_id, traded_on)`. The amount is
/// stored as minor units (amount x 10^6) in a BIGINT column so it round
/// trips losslessly through the Price value type. `stock_import_id` is
/// informational lineage only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StockPrice {
    pub id: i64,
    pub company_id: i64,
    pub stock_import_id: Option<String>,
    pub traded_on: NaiveDate,
    pub price: i64,
}

impl StockPrice {
    /// The stored minor units as a Price value
    pub fn price_value(&self) -> Price {
        Price::from_minor(self.price, PRICE_SCALE)
    }
}
