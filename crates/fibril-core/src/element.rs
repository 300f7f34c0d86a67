//! Declarative nodes.
//!
//! An [`Element`] describes desired output: a kind (host tag, text, or
//! function component), a property map and an ordered list of children.
//! Elements are immutable once built and cheap to clone; fibers share their
//! property maps instead of copying them.

use std::fmt;
use std::rc::Rc;

use crate::collections::OrderedMap;
use crate::hooks::HookContext;

pub type SharedStr = Rc<str>;

/// Property holding the content of a text node.
pub const TEXT_VALUE_PROP: &str = "nodeValue";

/// Properties whose name starts with this prefix and whose value is a
/// [`PropValue::Handler`] are registered as event handlers instead of being
/// set as properties.
pub const EVENT_PREFIX: &str = "on";

/// Returns the host event name for an event property (`onClick` -> `click`).
pub fn event_name(prop: &str) -> Option<String> {
    prop.strip_prefix(EVENT_PREFIX)
        .filter(|rest| !rest.is_empty())
        .map(str::to_ascii_lowercase)
}

/// Payload delivered to an [`EventHandler`] by the host.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub name: SharedStr,
    pub detail: Option<PropValue>,
}

impl Event {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<PropValue>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Callback registered on a host node. Handlers compare by identity, so a
/// closure rebuilt on every render is re-registered on every commit.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    pub fn new(handler: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(handler))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0))
    }
}

/// A property value. Equality is strict: scalars compare by value, handlers
/// by identity, and values of different variants are never equal.
#[derive(Clone, Debug)]
pub enum PropValue {
    Str(SharedStr),
    Int(i64),
    Float(f64),
    Bool(bool),
    Handler(EventHandler),
}

impl PropValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            PropValue::Handler(handler) => Some(handler),
            _ => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Str(a), PropValue::Str(b)) => a == b,
            (PropValue::Int(a), PropValue::Int(b)) => a == b,
            (PropValue::Float(a), PropValue::Float(b)) => a == b,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Handler(a), PropValue::Handler(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Str(value) => f.write_str(value),
            PropValue::Int(value) => write!(f, "{value}"),
            PropValue::Float(value) => write!(f, "{value}"),
            PropValue::Bool(value) => write!(f, "{value}"),
            PropValue::Handler(_) => f.write_str("<handler>"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.into())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value.into())
    }
}

impl From<SharedStr> for PropValue {
    fn from(value: SharedStr) -> Self {
        PropValue::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(value.into())
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<EventHandler> for PropValue {
    fn from(value: EventHandler) -> Self {
        PropValue::Handler(value)
    }
}

pub type RenderFn = fn(&mut HookContext<'_>, &Props) -> Element;

/// A function component. Two components are the same kind iff they share a
/// render function.
#[derive(Clone, Copy)]
pub struct Component {
    name: &'static str,
    render: RenderFn,
}

impl Component {
    pub const fn new(name: &'static str, render: RenderFn) -> Self {
        Self { name, render }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn invoke(&self, hooks: &mut HookContext<'_>, props: &Props) -> Element {
        (self.render)(hooks, props)
    }

    fn address(&self) -> usize {
        self.render as usize
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for Component {}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.name).finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Host(SharedStr),
    Text,
    Component(Component),
}

impl ElementKind {
    pub fn label(&self) -> String {
        match self {
            ElementKind::Host(tag) => tag.to_string(),
            ElementKind::Text => "#text".to_string(),
            ElementKind::Component(component) => format!("<{}>", component.name()),
        }
    }
}

impl From<&str> for ElementKind {
    fn from(tag: &str) -> Self {
        ElementKind::Host(tag.into())
    }
}

impl From<Component> for ElementKind {
    fn from(component: Component) -> Self {
        ElementKind::Component(component)
    }
}

/// Property map plus the ordered children of an element.
#[derive(Clone, Debug, Default)]
pub struct Props {
    values: OrderedMap<SharedStr, PropValue>,
    children: Vec<Element>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn for_root(element: Element) -> Self {
        Self {
            values: OrderedMap::default(),
            children: vec![element],
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.values.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropValue::as_str)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(PropValue::Int(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.values.iter().map(|(name, value)| (&**name, value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn insert(&mut self, name: &str, value: impl Into<PropValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn push_child(&mut self, child: impl Into<Element>) {
        self.children.push(child.into());
    }
}

/// An immutable declarative node.
#[derive(Clone)]
pub struct Element {
    kind: ElementKind,
    props: Rc<Props>,
}

impl Element {
    pub fn new(kind: impl Into<ElementKind>, props: Props) -> Self {
        Self {
            kind: kind.into(),
            props: Rc::new(props),
        }
    }

    pub fn host(tag: &str) -> Self {
        Self::new(tag, Props::new())
    }

    pub fn text(value: impl fmt::Display) -> Self {
        let mut props = Props::new();
        props.insert(TEXT_VALUE_PROP, value.to_string());
        Self::new(ElementKind::Text, props)
    }

    pub fn component(component: Component) -> Self {
        Self::new(component, Props::new())
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub(crate) fn shared_props(&self) -> Rc<Props> {
        Rc::clone(&self.props)
    }

    pub fn children(&self) -> &[Element] {
        self.props.children()
    }

    pub fn prop(mut self, name: &str, value: impl Into<PropValue>) -> Self {
        Rc::make_mut(&mut self.props).insert(name, value);
        self
    }

    /// Registers `handler` for `event` (stored as the `on<event>` property).
    pub fn on(self, event: &str, handler: impl Fn(&Event) + 'static) -> Self {
        let name = format!("{EVENT_PREFIX}{event}");
        self.prop(&name, EventHandler::new(handler))
    }

    pub fn child(mut self, child: impl Into<Element>) -> Self {
        Rc::make_mut(&mut self.props).push_child(child);
        self
    }

    pub fn children_from<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Element>,
    {
        let props = Rc::make_mut(&mut self.props);
        for child in children {
            props.push_child(child);
        }
        self
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("kind", &self.kind)
            .field("props", &self.props)
            .finish()
    }
}

impl From<&str> for Element {
    fn from(value: &str) -> Self {
        Element::text(value)
    }
}

impl From<String> for Element {
    fn from(value: String) -> Self {
        Element::text(value)
    }
}

impl From<i64> for Element {
    fn from(value: i64) -> Self {
        Element::text(value)
    }
}

impl From<i32> for Element {
    fn from(value: i32) -> Self {
        Element::text(value)
    }
}

impl From<f64> for Element {
    fn from(value: f64) -> Self {
        Element::text(value)
    }
}

impl From<bool> for Element {
    fn from(value: bool) -> Self {
        Element::text(value)
    }
}

impl From<Component> for Element {
    fn from(component: Component) -> Self {
        Element::component(component)
    }
}

/// Builds an element from a kind, a property list and children. Children that
/// are not elements already (strings, numbers, booleans) become text nodes.
pub fn create_element<K, V, P, C>(kind: impl Into<ElementKind>, props: P, children: C) -> Element
where
    K: AsRef<str>,
    V: Into<PropValue>,
    P: IntoIterator<Item = (K, V)>,
    C: IntoIterator,
    C::Item: Into<Element>,
{
    let mut built = Props::new();
    for (name, value) in props {
        built.insert(name.as_ref(), value);
    }
    for child in children {
        built.push_child(child);
    }
    Element::new(kind, built)
}

#[cfg(test)]
#[path = "tests/element_tests.rs"]
mod tests;
