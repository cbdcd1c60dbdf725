//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (assign request ID)
//!     → routing::RouteRegistry (exact path dispatch)
//!     → files.rs (static files under the mount)
//!     → echo.rs or 404 sentinel (fallback)
//!     → Send to client
//! ```

pub mod echo;
pub mod files;
pub mod request;
pub mod server;

pub use request::{RequestIdExt, UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
