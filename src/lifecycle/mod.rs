//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Ctrl+C received → trigger() → server stops accepting → drains → exits
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
