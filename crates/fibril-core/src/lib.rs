#![doc = r"Fiber reconciler, cooperative scheduler and positional hooks for Fibril."]

pub mod collections;
pub mod commit;
pub mod element;
pub mod fiber;
pub mod hooks;
pub mod platform;
pub mod scheduler;

mod reconciler;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

pub use commit::{CommitSummary, CommittedEffect};
pub use element::{
    create_element, event_name, Component, Element, ElementKind, Event, EventHandler,
    PropValue, Props, RenderFn, SharedStr, EVENT_PREFIX, TEXT_VALUE_PROP,
};
pub use fiber::{EffectTag, Fiber, FiberId, FiberKind, FiberTree};
pub use hooks::{
    Cleanup, EffectTiming, HookContext, HookList, PendingEffect, StateAction, StateSetter,
    UpdateHandle, UpdateScheduler,
};
pub use platform::{Deadline, Host, HostError, SliceCallback, TimeSlicer};
pub use scheduler::{Renderer, RendererConfig};

use std::fmt;

/// Failure of a render pass. The pass is discarded; the committed tree stays
/// as it was, except for host mutations already applied by a failed commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The host could not create or initialise a node.
    Create(HostError),
    /// The host rejected a mutation while committing.
    Commit(HostError),
    /// Internal tree bookkeeping went wrong.
    Invariant(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Create(err) => write!(f, "failed to create host node: {err}"),
            RenderError::Commit(err) => write!(f, "failed to commit: {err}"),
            RenderError::Invariant(message) => write!(f, "fiber tree invariant violated: {message}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Create(err) | RenderError::Commit(err) => Some(err),
            RenderError::Invariant(_) => None,
        }
    }
}
