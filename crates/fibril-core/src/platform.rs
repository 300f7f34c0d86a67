//! Platform abstraction traits for the Fibril renderer.
//!
//! The renderer never touches an output surface or an event loop directly.
//! A [`Host`] realises nodes and mutates them, and a [`TimeSlicer`] grants the
//! scheduler bounded slices of execution time.

use std::fmt;
use std::time::Duration;

use crate::element::{EventHandler, PropValue};

/// Errors reported by host adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    UnknownHandle { handle: String },
    NotAChild { parent: String, child: String },
    Rejected(String),
}

impl HostError {
    pub fn unknown(handle: &impl fmt::Debug) -> Self {
        HostError::UnknownHandle {
            handle: format!("{handle:?}"),
        }
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::UnknownHandle { handle } => write!(f, "unknown host node {handle}"),
            HostError::NotAChild { parent, child } => {
                write!(f, "host node {child} is not a child of {parent}")
            }
            HostError::Rejected(reason) => write!(f, "host rejected operation: {reason}"),
        }
    }
}

impl std::error::Error for HostError {}

/// Target environment primitives used during reconciliation and commit.
///
/// Handles are opaque references to realised output objects. The renderer
/// clones them freely, so they should be cheap (ids or reference-counted
/// pointers).
pub trait Host {
    type Handle: Clone + fmt::Debug + 'static;

    fn create_node(&mut self, tag: &str) -> Result<Self::Handle, HostError>;

    fn create_text_node(&mut self) -> Result<Self::Handle, HostError>;

    fn set_property(
        &mut self,
        node: &Self::Handle,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError>;

    fn remove_property(&mut self, node: &Self::Handle, name: &str) -> Result<(), HostError>;

    fn add_event_handler(
        &mut self,
        node: &Self::Handle,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError>;

    fn remove_event_handler(
        &mut self,
        node: &Self::Handle,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError>;

    fn append_child(&mut self, parent: &Self::Handle, child: &Self::Handle)
        -> Result<(), HostError>;

    fn remove_child(&mut self, parent: &Self::Handle, child: &Self::Handle)
        -> Result<(), HostError>;

    /// Disposes of a node that was created for a render pass which never
    /// committed. The node has never been attached.
    fn release_node(&mut self, node: &Self::Handle) -> Result<(), HostError> {
        let _ = node;
        Ok(())
    }
}

/// Time budget of a granted slice.
pub trait Deadline {
    /// Time left before the scheduler should yield back to the host.
    fn time_remaining(&self) -> Duration;
}

pub type SliceCallback = Box<dyn FnOnce(&dyn Deadline) + 'static>;

/// Grants the scheduler slices of execution time.
///
/// Implementations must invoke the callback later, from the thread that owns
/// the renderer, and never from inside `request_time_slice` itself.
pub trait TimeSlicer {
    fn request_time_slice(&self, callback: SliceCallback);
}
