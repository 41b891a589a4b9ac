//! View state machines, one per surface.
//!
//! Each router owns its surface's state as a single enum and changes it
//! only through `apply`, which reports what happened to the event. Network
//! results arrive as events tagged with the id they were requested for;
//! a tag that no longer matches the active view is [`Transition::Stale`].

pub mod customer;
pub mod farmer;
pub mod restaurant;

use crate::error::{ApiError, Notice};

#[derive(Debug, Clone, PartialEq)]
pub enum Load<T> {
    Loading,
    Ready(T),
    Failed(Notice),
}

impl<T> Load<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn from_result(result: Result<T, Notice>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(notice) => Self::Failed(notice),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// The event means nothing in the current state.
    Ignored,
    /// A response for an id the view has moved away from.
    Stale,
}

/// Convert a backend result for delivery as an event.
pub(crate) fn noticed<T>(result: Result<T, ApiError>) -> Result<T, Notice> {
    result.map_err(|e| Notice::from(&e))
}
