//! Errors
//!
//! Rendering itself never fails: unhandled props and children are dropped.
//! The errors here come from the API surface around it.

use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Unknown tag. name: '{0}'")]
    UnknownTag(String),

    #[error("Children already attached")]
    ChildrenAlreadyAttached,

    #[error("Invalid render config. cause: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

/// Check a platform invariant, logging and panicking when it does not hold.
///
/// Used where a caller wired a helper to the wrong kind of node, which is a
/// programming error rather than a recoverable condition.
#[track_caller]
pub fn platform_assert(condition: bool, message: &str) {
    if !condition {
        error!("{}", message);
        panic!("{}", message);
    }
}
