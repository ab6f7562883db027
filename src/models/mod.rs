mod company;
mod stock_import;
mod stock_price;
mod user;

pub use company::Company;
pub use stock_import::{StockImport, StockImportStatus};
pub use stock_price::StockPrice;
pub use user::{ApiToken, User};
