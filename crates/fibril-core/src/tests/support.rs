//! Minimal host and slicer used by the in-crate unit tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

use crate::element::{EventHandler, PropValue};
use crate::platform::{Deadline, Host, HostError, SliceCallback, TimeSlicer};

/// Host that records every call as a short line of text.
#[derive(Default)]
pub(crate) struct LogHost {
    next: usize,
    pub(crate) log: Vec<String>,
    fail_tag: Option<&'static str>,
    fail_append: bool,
}

impl LogHost {
    /// Host that rejects every `create_node` for `tag`.
    pub(crate) fn failing_tag(tag: &'static str) -> Self {
        Self {
            fail_tag: Some(tag),
            ..Self::default()
        }
    }

    /// Host whose `append_child` always fails.
    pub(crate) fn failing_append() -> Self {
        Self {
            fail_append: true,
            ..Self::default()
        }
    }

    pub(crate) fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.log)
    }
}

impl Host for LogHost {
    type Handle = usize;

    fn create_node(&mut self, tag: &str) -> Result<usize, HostError> {
        if self.fail_tag == Some(tag) {
            return Err(HostError::Rejected(format!("no <{tag}> here")));
        }
        self.next += 1;
        self.log.push(format!("create {tag} {}", self.next));
        Ok(self.next)
    }

    fn create_text_node(&mut self) -> Result<usize, HostError> {
        self.next += 1;
        self.log.push(format!("text {}", self.next));
        Ok(self.next)
    }

    fn set_property(&mut self, node: &usize, name: &str, value: &PropValue) -> Result<(), HostError> {
        self.log.push(format!("set {node} {name}={value}"));
        Ok(())
    }

    fn remove_property(&mut self, node: &usize, name: &str) -> Result<(), HostError> {
        self.log.push(format!("unset {node} {name}"));
        Ok(())
    }

    fn add_event_handler(
        &mut self,
        node: &usize,
        event: &str,
        _handler: &EventHandler,
    ) -> Result<(), HostError> {
        self.log.push(format!("listen {node} {event}"));
        Ok(())
    }

    fn remove_event_handler(
        &mut self,
        node: &usize,
        event: &str,
        _handler: &EventHandler,
    ) -> Result<(), HostError> {
        self.log.push(format!("unlisten {node} {event}"));
        Ok(())
    }

    fn append_child(&mut self, parent: &usize, child: &usize) -> Result<(), HostError> {
        if self.fail_append {
            return Err(HostError::NotAChild {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }
        self.log.push(format!("append {parent} {child}"));
        Ok(())
    }

    fn remove_child(&mut self, parent: &usize, child: &usize) -> Result<(), HostError> {
        self.log.push(format!("remove {parent} {child}"));
        Ok(())
    }

    fn release_node(&mut self, node: &usize) -> Result<(), HostError> {
        self.log.push(format!("release {node}"));
        Ok(())
    }
}

/// Deadline that allows `units` checks before reporting no time left.
pub(crate) struct Budget {
    left: Cell<usize>,
}

impl Budget {
    pub(crate) fn new(units: usize) -> Self {
        Self {
            left: Cell::new(units),
        }
    }
}

impl Deadline for Budget {
    fn time_remaining(&self) -> Duration {
        let left = self.left.get();
        if left <= 1 {
            self.left.set(0);
            return Duration::ZERO;
        }
        self.left.set(left - 1);
        Duration::MAX
    }
}

/// Slicer that holds requests until a test grants them.
#[derive(Default)]
pub(crate) struct QueueSlicer {
    queue: RefCell<VecDeque<SliceCallback>>,
}

impl QueueSlicer {
    pub(crate) fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Grants the oldest request a slice of `units` fibers.
    pub(crate) fn grant(&self, units: usize) -> bool {
        let next = self.queue.borrow_mut().pop_front();
        match next {
            Some(callback) => {
                callback(&Budget::new(units));
                true
            }
            None => false,
        }
    }

    pub(crate) fn drain(&self) {
        while self.grant(usize::MAX) {}
    }
}

impl TimeSlicer for QueueSlicer {
    fn request_time_slice(&self, callback: SliceCallback) {
        self.queue.borrow_mut().push_back(callback);
    }
}
