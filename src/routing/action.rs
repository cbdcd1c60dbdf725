//! Action-tagged access to a [`RouteRegistry`].
//!
//! Callers that only have an action name (CLI arguments, scripted input)
//! go through [`RouteRegistry::call`]. Everything else should call
//! `register`/`dispatch` directly or build an [`Operation`].

use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::routing::registry::{Handler, RouteRegistry};

/// Usage errors raised by the action interface.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("No handler supplied for route {0}")]
    MissingHandler(String),
}

/// The two things a registry can be asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Register,
    Dispatch,
}

impl FromStr for Action {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" | "register" => Ok(Action::Register),
            "get" | "dispatch" => Ok(Action::Dispatch),
            other => Err(RouterError::InvalidAction(other.to_string())),
        }
    }
}

/// A fully specified request against a registry.
pub enum Operation {
    Register {
        path: String,
        handler: Arc<dyn Handler>,
    },
    Dispatch {
        path: String,
    },
}

impl Operation {
    pub fn action(&self) -> Action {
        match self {
            Operation::Register { .. } => Action::Register,
            Operation::Dispatch { .. } => Action::Dispatch,
        }
    }
}

impl RouteRegistry {
    /// Apply an operation. Registration yields `None`; dispatch yields the body.
    pub fn apply(&mut self, op: Operation) -> Option<String> {
        match op {
            Operation::Register { path, handler } => {
                self.register_shared(path, handler);
                None
            }
            Operation::Dispatch { path } => Some(self.dispatch(&path)),
        }
    }

    /// Run an operation named by `action`.
    ///
    /// Unknown action names fail with [`RouterError::InvalidAction`] and
    /// leave the registry untouched.
    pub fn call(
        &mut self,
        action: &str,
        path: &str,
        handler: Option<Arc<dyn Handler>>,
    ) -> Result<Option<String>, RouterError> {
        let op = match action.parse::<Action>()? {
            Action::Register => {
                let handler =
                    handler.ok_or_else(|| RouterError::MissingHandler(path.to_string()))?;
                Operation::Register {
                    path: path.to_string(),
                    handler,
                }
            }
            Action::Dispatch => Operation::Dispatch {
                path: path.to_string(),
            },
        };

        Ok(self.apply(op))
    }
}
