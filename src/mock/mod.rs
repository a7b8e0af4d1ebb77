pub mod api;
pub mod server;

pub use api::{MockState, RateLimiter};
pub use server::{router, serve, start_server};
