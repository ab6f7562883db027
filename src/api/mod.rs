mod handlers;
mod server;

pub use handlers::{ApiError, AuthUser};
pub use server::{router, serve};
