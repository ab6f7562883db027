mod api_token_repository;
mod company_repository;
mod stock_import_repository;
mod stock_price_repository;
mod user_repository;

pub use api_token_repository::ApiTokenRepository;
pub use company_repository::CompanyRepository;
pub use stock_import_repository::{NewStockImport, StockImportRepository};
pub use stock_price_repository::{PriceRow, StockPriceRepository};
pub use user_repository::UserRepository;
