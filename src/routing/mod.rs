//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! register(path, handler)
//!     → registry.rs (path → Arc<dyn Handler>)
//!
//! dispatch(path)
//!     → registry.rs (exact lookup)
//!     → Return: handler() or NOT_FOUND sentinel
//!
//! call("add" | "get", path, handler)
//!     → action.rs (parse action name, reject unknown)
//!     → Operation → registry.rs
//! ```
//!
//! # Design Decisions
//! - Exact path match, no prefixes or patterns
//! - Unknown path is a value (sentinel), not an error
//! - Unknown action name is an error, returned to the caller

pub mod action;
pub mod registry;

pub use action::{Action, Operation, RouterError};
pub use registry::{Handler, NamedHandler, Route, RouteRegistry, StaticText, NOT_FOUND};
