//! In-memory host that records every mutation it receives.

use std::fmt::{self, Write as _};

use fibril_core::collections::{HashMap, OrderedMap};
use fibril_core::{EventHandler, Host, HostError, PropValue, TEXT_VALUE_PROP};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(usize);

impl NodeHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// One call received through the [`Host`] trait.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostOp {
    CreateNode { node: NodeHandle, tag: String },
    CreateText { node: NodeHandle },
    SetProperty { node: NodeHandle, name: String, value: String },
    RemoveProperty { node: NodeHandle, name: String },
    AddEventHandler { node: NodeHandle, event: String },
    RemoveEventHandler { node: NodeHandle, event: String },
    AppendChild { parent: NodeHandle, child: NodeHandle },
    RemoveChild { parent: NodeHandle, child: NodeHandle },
    ReleaseNode { node: NodeHandle },
}

impl HostOp {
    pub fn kind(&self) -> &'static str {
        match self {
            HostOp::CreateNode { .. } => "createNode",
            HostOp::CreateText { .. } => "createTextNode",
            HostOp::SetProperty { .. } => "setProperty",
            HostOp::RemoveProperty { .. } => "removeProperty",
            HostOp::AddEventHandler { .. } => "addEventHandler",
            HostOp::RemoveEventHandler { .. } => "removeEventHandler",
            HostOp::AppendChild { .. } => "appendChild",
            HostOp::RemoveChild { .. } => "removeChild",
            HostOp::ReleaseNode { .. } => "releaseNode",
        }
    }

    /// Whether the op attaches or detaches a node.
    pub fn is_structural(&self) -> bool {
        matches!(self, HostOp::AppendChild { .. } | HostOp::RemoveChild { .. })
    }
}

impl fmt::Display for HostOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostOp::CreateNode { node, tag } => write!(f, "createNode {node} <{tag}>"),
            HostOp::CreateText { node } => write!(f, "createTextNode {node}"),
            HostOp::SetProperty { node, name, value } => {
                write!(f, "setProperty {node} {name}={value:?}")
            }
            HostOp::RemoveProperty { node, name } => write!(f, "removeProperty {node} {name}"),
            HostOp::AddEventHandler { node, event } => write!(f, "addEventHandler {node} {event}"),
            HostOp::RemoveEventHandler { node, event } => {
                write!(f, "removeEventHandler {node} {event}")
            }
            HostOp::AppendChild { parent, child } => write!(f, "appendChild {parent} {child}"),
            HostOp::RemoveChild { parent, child } => write!(f, "removeChild {parent} {child}"),
            HostOp::ReleaseNode { node } => write!(f, "releaseNode {node}"),
        }
    }
}

struct RecordedNode {
    /// `None` for text nodes.
    tag: Option<String>,
    props: OrderedMap<String, PropValue>,
    listeners: HashMap<String, Vec<EventHandler>>,
    children: Vec<NodeHandle>,
    parent: Option<NodeHandle>,
    released: bool,
}

impl RecordedNode {
    fn new(tag: Option<String>) -> Self {
        Self {
            tag,
            props: OrderedMap::default(),
            listeners: HashMap::default(),
            children: Vec::new(),
            parent: None,
            released: false,
        }
    }
}

/// A host keeping its node tree in memory and logging each operation.
#[derive(Default)]
pub struct RecordingHost {
    nodes: Vec<RecordedNode>,
    ops: Vec<HostOp>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached node to render into. Not recorded as an op.
    pub fn create_container(&mut self, tag: &str) -> NodeHandle {
        self.alloc(Some(tag.to_string()))
    }

    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Tag of `node`, or `None` for text nodes and unknown handles.
    pub fn tag(&self, node: NodeHandle) -> Option<&str> {
        self.nodes.get(node.0).and_then(|n| n.tag.as_deref())
    }

    pub fn is_text(&self, node: NodeHandle) -> bool {
        self.nodes.get(node.0).is_some_and(|n| n.tag.is_none())
    }

    pub fn property(&self, node: NodeHandle, name: &str) -> Option<&PropValue> {
        self.nodes.get(node.0).and_then(|n| n.props.get(name))
    }

    pub fn children(&self, node: NodeHandle) -> &[NodeHandle] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `node` was handed back through [`Host::release_node`].
    pub fn is_released(&self, node: NodeHandle) -> bool {
        self.nodes.get(node.0).is_some_and(|n| n.released)
    }

    /// Number of nodes created and not released.
    pub fn live_nodes(&self) -> usize {
        self.nodes.iter().filter(|n| !n.released).count()
    }

    pub fn parent(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    /// Handlers currently registered on `node` for `event`, in registration order.
    pub fn handlers(&self, node: NodeHandle, event: &str) -> Vec<EventHandler> {
        self.nodes
            .get(node.0)
            .and_then(|n| n.listeners.get(event))
            .cloned()
            .unwrap_or_default()
    }

    /// Concatenated text of every attached text node below `node`.
    pub fn text_content(&self, node: NodeHandle) -> String {
        let mut text = String::new();
        self.collect_text(node, &mut text);
        text
    }

    fn collect_text(&self, node: NodeHandle, out: &mut String) {
        let Some(recorded) = self.nodes.get(node.0) else {
            return;
        };
        if recorded.tag.is_none() {
            if let Some(value) = recorded.props.get(TEXT_VALUE_PROP) {
                let _ = write!(out, "{value}");
            }
        }
        for child in &recorded.children {
            self.collect_text(*child, out);
        }
    }

    /// First attached node below `root` (pre-order) with the given tag.
    pub fn find(&self, root: NodeHandle, tag: &str) -> Option<NodeHandle> {
        self.find_all(root, tag).into_iter().next()
    }

    pub fn find_all(&self, root: NodeHandle, tag: &str) -> Vec<NodeHandle> {
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if self.tag(node) == Some(tag) {
                found.push(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        found
    }

    pub fn dump_tree(&self, root: Option<NodeHandle>) -> String {
        let mut output = String::new();
        match root {
            Some(root) => self.dump_node(&mut output, root, 0),
            None => output.push_str("(no root)\n"),
        }
        output
    }

    fn dump_node(&self, output: &mut String, node: NodeHandle, depth: usize) {
        let indent = "  ".repeat(depth);
        let Some(recorded) = self.nodes.get(node.0) else {
            let _ = writeln!(output, "{indent}[{}] (missing)", node.0);
            return;
        };
        match &recorded.tag {
            Some(tag) => {
                let _ = write!(output, "{indent}[{}] <{tag}>", node.0);
                for (name, value) in &recorded.props {
                    let _ = write!(output, " {name}={value:?}");
                }
                let mut events: Vec<_> = recorded.listeners.keys().collect();
                events.sort();
                for event in events {
                    let _ = write!(output, " on:{event}");
                }
                output.push('\n');
            }
            None => {
                let text = recorded
                    .props
                    .get(TEXT_VALUE_PROP)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                let _ = writeln!(output, "{indent}[{}] {text:?}", node.0);
            }
        }
        for child in &recorded.children {
            self.dump_node(output, *child, depth + 1);
        }
    }

    fn alloc(&mut self, tag: Option<String>) -> NodeHandle {
        let handle = NodeHandle(self.nodes.len());
        self.nodes.push(RecordedNode::new(tag));
        handle
    }

    fn node_mut(&mut self, node: &NodeHandle) -> Result<&mut RecordedNode, HostError> {
        self.nodes
            .get_mut(node.0)
            .ok_or_else(|| HostError::unknown(node))
    }

    fn detach(&mut self, child: NodeHandle) {
        if let Some(parent) = self.nodes[child.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != child);
        }
    }
}

impl Host for RecordingHost {
    type Handle = NodeHandle;

    fn create_node(&mut self, tag: &str) -> Result<NodeHandle, HostError> {
        let node = self.alloc(Some(tag.to_string()));
        self.ops.push(HostOp::CreateNode {
            node,
            tag: tag.to_string(),
        });
        Ok(node)
    }

    fn create_text_node(&mut self) -> Result<NodeHandle, HostError> {
        let node = self.alloc(None);
        self.ops.push(HostOp::CreateText { node });
        Ok(node)
    }

    fn set_property(
        &mut self,
        node: &NodeHandle,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError> {
        self.node_mut(node)?
            .props
            .insert(name.to_string(), value.clone());
        self.ops.push(HostOp::SetProperty {
            node: *node,
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn remove_property(&mut self, node: &NodeHandle, name: &str) -> Result<(), HostError> {
        self.node_mut(node)?.props.shift_remove(name);
        self.ops.push(HostOp::RemoveProperty {
            node: *node,
            name: name.to_string(),
        });
        Ok(())
    }

    fn add_event_handler(
        &mut self,
        node: &NodeHandle,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        self.node_mut(node)?
            .listeners
            .entry(event.to_string())
            .or_default()
            .push(handler.clone());
        self.ops.push(HostOp::AddEventHandler {
            node: *node,
            event: event.to_string(),
        });
        Ok(())
    }

    fn remove_event_handler(
        &mut self,
        node: &NodeHandle,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        let recorded = self.node_mut(node)?;
        if let Some(handlers) = recorded.listeners.get_mut(event) {
            handlers.retain(|h| !h.ptr_eq(handler));
            if handlers.is_empty() {
                recorded.listeners.remove(event);
            }
        }
        self.ops.push(HostOp::RemoveEventHandler {
            node: *node,
            event: event.to_string(),
        });
        Ok(())
    }

    fn append_child(&mut self, parent: &NodeHandle, child: &NodeHandle) -> Result<(), HostError> {
        self.node_mut(child)?;
        self.node_mut(parent)?;
        if parent == child {
            return Err(HostError::Rejected(format!("cannot append {child} to itself")));
        }
        self.detach(*child);
        self.nodes[parent.0].children.push(*child);
        self.nodes[child.0].parent = Some(*parent);
        self.ops.push(HostOp::AppendChild {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }

    fn remove_child(&mut self, parent: &NodeHandle, child: &NodeHandle) -> Result<(), HostError> {
        self.node_mut(child)?;
        let recorded = self.node_mut(parent)?;
        let Some(position) = recorded.children.iter().position(|c| c == child) else {
            return Err(HostError::NotAChild {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        };
        recorded.children.remove(position);
        self.nodes[child.0].parent = None;
        self.ops.push(HostOp::RemoveChild {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }

    fn release_node(&mut self, node: &NodeHandle) -> Result<(), HostError> {
        let recorded = self.node_mut(node)?;
        if recorded.parent.is_some() {
            return Err(HostError::Rejected(format!("{node} is still attached")));
        }
        recorded.released = true;
        recorded.props.clear();
        recorded.listeners.clear();
        self.ops.push(HostOp::ReleaseNode { node: *node });
        Ok(())
    }
}

impl fmt::Debug for RecordingHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingHost")
            .field("nodes", &self.nodes.len())
            .field("ops", &self.ops.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/host_tests.rs"]
mod tests;
