//! Route registry with dynamic handler dispatch.
//!
//! Paths map to zero-argument handlers returning a string. Unknown paths
//! yield [`routing::NOT_FOUND`]. The registry can be used directly, via
//! action names, or served over HTTP.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::RouterConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{Handler, RouteRegistry, RouterError, NOT_FOUND};
