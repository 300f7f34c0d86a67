//! Arena-backed fiber trees.
//!
//! Each render pass builds a fresh [`FiberTree`]. Fibers reference each other
//! by [`FiberId`] through `parent`/`child`/`sibling` links, and a fiber's
//! `alternate` indexes the corresponding fiber of the last committed tree.

use std::fmt::{self, Write as _};
use std::rc::Rc;

use crate::element::{ElementKind, Props, TEXT_VALUE_PROP};
use crate::hooks::HookList;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FiberId(usize);

impl FiberId {
    /// The root fiber of every tree.
    pub const ROOT: FiberId = FiberId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mutation a fiber requires at commit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EffectTag {
    #[default]
    None,
    Placement,
    Update,
    /// Only ever reported for fibers of the current tree collected in the
    /// pass's deletion list; current fibers are not mutated.
    Deletion,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FiberKind {
    /// The fiber wrapping the render target.
    Root,
    Element(ElementKind),
}

impl FiberKind {
    pub fn label(&self) -> String {
        match self {
            FiberKind::Root => "#root".to_string(),
            FiberKind::Element(kind) => kind.label(),
        }
    }

    pub fn matches(&self, kind: &ElementKind) -> bool {
        matches!(self, FiberKind::Element(own) if own == kind)
    }

    pub fn is_component(&self) -> bool {
        matches!(self, FiberKind::Element(ElementKind::Component(_)))
    }
}

pub struct Fiber<N> {
    pub(crate) kind: FiberKind,
    pub(crate) props: Rc<Props>,
    pub(crate) handle: Option<N>,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) alternate: Option<FiberId>,
    pub(crate) tag: EffectTag,
    pub(crate) hooks: Option<HookList>,
}

impl<N> Fiber<N> {
    pub(crate) fn new(kind: FiberKind, props: Rc<Props>, parent: Option<FiberId>) -> Self {
        Self {
            kind,
            props,
            handle: None,
            parent,
            child: None,
            sibling: None,
            alternate: None,
            tag: EffectTag::None,
            hooks: None,
        }
    }

    pub fn kind(&self) -> &FiberKind {
        &self.kind
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn handle(&self) -> Option<&N> {
        self.handle.as_ref()
    }

    pub fn parent(&self) -> Option<FiberId> {
        self.parent
    }

    pub fn child(&self) -> Option<FiberId> {
        self.child
    }

    pub fn sibling(&self) -> Option<FiberId> {
        self.sibling
    }

    pub fn alternate(&self) -> Option<FiberId> {
        self.alternate
    }

    pub fn tag(&self) -> EffectTag {
        self.tag
    }

    pub fn hooks(&self) -> Option<&HookList> {
        self.hooks.as_ref()
    }
}

impl<N: fmt::Debug> fmt::Debug for Fiber<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fiber")
            .field("kind", &self.kind.label())
            .field("handle", &self.handle)
            .field("parent", &self.parent)
            .field("child", &self.child)
            .field("sibling", &self.sibling)
            .field("alternate", &self.alternate)
            .field("tag", &self.tag)
            .finish()
    }
}

pub struct FiberTree<N> {
    fibers: Vec<Fiber<N>>,
}

impl<N> FiberTree<N> {
    pub(crate) fn with_root(target: N, props: Rc<Props>, alternate: Option<FiberId>) -> Self {
        let mut root = Fiber::new(FiberKind::Root, props, None);
        root.handle = Some(target);
        root.alternate = alternate;
        Self { fibers: vec![root] }
    }

    pub fn root(&self) -> &Fiber<N> {
        self.get(FiberId::ROOT)
    }

    /// Panics if `id` was not allocated by this tree.
    pub fn get(&self, id: FiberId) -> &Fiber<N> {
        &self.fibers[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: FiberId) -> &mut Fiber<N> {
        &mut self.fibers[id.0]
    }

    pub(crate) fn push(&mut self, fiber: Fiber<N>) -> FiberId {
        let id = FiberId(self.fibers.len());
        self.fibers.push(fiber);
        id
    }

    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    pub fn children(&self, id: FiberId) -> Children<'_, N> {
        Children {
            tree: self,
            next: self.get(id).child,
        }
    }

    /// Depth-first successor of `id`: its first child, otherwise the next
    /// sibling of the nearest ancestor that has one.
    pub fn next_unit(&self, id: FiberId) -> Option<FiberId> {
        if let Some(child) = self.get(id).child {
            return Some(child);
        }
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let fiber = self.get(current);
            if let Some(sibling) = fiber.sibling {
                return Some(sibling);
            }
            cursor = fiber.parent;
        }
        None
    }

    /// Handle of the closest ancestor of `id` that owns one.
    pub fn host_parent(&self, id: FiberId) -> Option<&N> {
        let mut cursor = self.get(id).parent;
        while let Some(current) = cursor {
            let fiber = self.get(current);
            if let Some(handle) = fiber.handle.as_ref() {
                return Some(handle);
            }
            cursor = fiber.parent;
        }
        None
    }

    /// Fibers in depth-first pre-order starting at the root.
    pub fn preorder(&self) -> Preorder<'_, N> {
        Preorder {
            tree: self,
            stack: vec![FiberId::ROOT],
        }
    }

    /// Handles created by this pass, in allocation order. Only `Placement`
    /// fibers own a fresh node; `Update` fibers share the committed one.
    pub(crate) fn placed_handles(&self) -> impl Iterator<Item = &N> + '_ {
        self.fibers
            .iter()
            .filter(|fiber| fiber.tag == EffectTag::Placement)
            .filter_map(|fiber| fiber.handle.as_ref())
    }

    /// Clears tags and alternate links once the tree has been committed.
    pub(crate) fn settle(&mut self) {
        for fiber in &mut self.fibers {
            fiber.tag = EffectTag::None;
            fiber.alternate = None;
        }
    }

    /// Renders the tree as an indented outline, one fiber per line.
    pub fn dump(&self) -> String {
        let mut output = String::new();
        let mut stack = vec![(FiberId::ROOT, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let fiber = self.get(id);
            let _ = write!(output, "{}[{}] {}", "  ".repeat(depth), id.0, fiber.kind.label());
            if let Some(text) = fiber.props.str(TEXT_VALUE_PROP) {
                let _ = write!(output, " {text:?}");
            }
            if fiber.tag != EffectTag::None {
                let _ = write!(output, " ({:?})", fiber.tag);
            }
            output.push('\n');
            let children: Vec<FiberId> = self.children(id).collect();
            for child in children.into_iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        output
    }
}

impl<N> fmt::Debug for FiberTree<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump())
    }
}

pub struct Children<'a, N> {
    tree: &'a FiberTree<N>,
    next: Option<FiberId>,
}

impl<N> Iterator for Children<'_, N> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        let id = self.next?;
        self.next = self.tree.get(id).sibling;
        Some(id)
    }
}

pub struct Preorder<'a, N> {
    tree: &'a FiberTree<N>,
    stack: Vec<FiberId>,
}

impl<N> Iterator for Preorder<'_, N> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        let id = self.stack.pop()?;
        let fiber = self.tree.get(id);
        if id != FiberId::ROOT {
            if let Some(sibling) = fiber.sibling {
                self.stack.push(sibling);
            }
        }
        if let Some(child) = fiber.child {
            self.stack.push(child);
        }
        Some(id)
    }
}

#[cfg(test)]
#[path = "tests/fiber_tests.rs"]
mod tests;
