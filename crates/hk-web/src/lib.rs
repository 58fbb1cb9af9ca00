//! HTTP boundary: the axum router for the shopping list and pool log, the
//! HTML dashboards and the listener lifecycle.

mod error;
mod render;
mod routes;
mod server;

pub use error::ApiError;
pub use render::{escape_html, pool_dashboard, rebuy_dashboard};
pub use routes::{AppState, router};
pub use server::HttpServer;
