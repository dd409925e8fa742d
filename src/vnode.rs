//! The immutable vnode model.
//!
//! A [`VNode`] is never mutated once built. The reconciler only ever reads it and
//! either reuses or discards the backing [`crate::component::ComponentNode`] it produced.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::host::HostAdapter;

/// A single-cell mutable holder, written by the reconciler at mount and cleared at
/// unmount of the exact host node it targeted.
pub type NodeRef<H> = Rc<RefCell<Option<<H as HostAdapter>::Node>>>;

/// Create a fresh, empty ref cell. Mirrors `createRef()`.
pub fn create_ref<H: HostAdapter>() -> NodeRef<H> {
    Rc::new(RefCell::new(None))
}

/// Sibling discriminator. `None` participates in positional (not keyed) matching.
#[derive(Clone, Debug, Eq, Hash)]
pub enum Key {
    None,
    Str(Rc<str>),
    Num(i64),
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::None, Key::None) => true,
            (Key::Str(a), Key::Str(b)) => a == b,
            (Key::Num(a), Key::Num(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(Rc::from(s))
    }
}
impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(Rc::from(s.as_str()))
    }
}
impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Num(n)
    }
}

/// A prop value. Primitives compare by value (`===` semantics on primitives),
/// handlers/refs/opaque values compare by identity.
#[derive(Clone)]
pub enum PropValue<H: HostAdapter> {
    Text(Rc<str>),
    Number(f64),
    Bool(bool),
    Handler(Rc<dyn Fn(Rc<dyn Any + Send>)>),
    NodeRef(NodeRef<H>),
    Any(Rc<dyn Any>),
    /// A context provider's current or default value, type-erased but carrying
    /// its own equality check so the reconciler can decide whether to notify
    /// subscribers without knowing the concrete type (see `context.rs`).
    Context(Rc<dyn crate::context::ErasedContextValue>),
}

impl<H: HostAdapter> fmt::Debug for PropValue<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Text(s) => f.debug_tuple("Text").field(s).finish(),
            PropValue::Number(n) => f.debug_tuple("Number").field(n).finish(),
            PropValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            PropValue::Handler(_) => f.debug_tuple("Handler").finish(),
            PropValue::NodeRef(_) => f.debug_tuple("NodeRef").finish(),
            PropValue::Any(_) => f.debug_tuple("Any").finish(),
            PropValue::Context(_) => f.debug_tuple("Context").finish(),
        }
    }
}

impl<H: HostAdapter> PartialEq for PropValue<H> {
    /// Mirrors JS `===`: primitives by value, everything else by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Text(a), PropValue::Text(b)) => a == b,
            (PropValue::Number(a), PropValue::Number(b)) => a == b,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Handler(a), PropValue::Handler(b)) => Rc::ptr_eq(a, b),
            (PropValue::NodeRef(a), PropValue::NodeRef(b)) => Rc::ptr_eq(a, b),
            (PropValue::Any(a), PropValue::Any(b)) => Rc::ptr_eq(a, b),
            (PropValue::Context(a), PropValue::Context(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// The string-keyed prop bag host (and fragment/error-boundary/context-provider)
/// vnodes carry. `key` is lifted out of this bag onto [`VNode::key`] at construction
/// time; `ref` stays in the bag under the name `"ref"`.
pub type Props<H> = IndexMap<Box<str>, PropValue<H>>;

/// What a vnode's children, or a component's return value, may be (spec GLOSSARY
/// "renderable content"). Nested lists are flattened at use by
/// [`crate::diff_util::flatten_children`], not eagerly here.
#[derive(Clone)]
pub enum Renderable<H: HostAdapter> {
    /// `null` / `bool` — occupies no child slot.
    Empty,
    Text(Rc<str>),
    Node(Rc<VNode<H>>),
    List(Rc<[Renderable<H>]>),
}

impl<H: HostAdapter> Renderable<H> {
    pub fn node(v: VNode<H>) -> Self {
        Renderable::Node(Rc::new(v))
    }
}

impl<H: HostAdapter> From<VNode<H>> for Renderable<H> {
    fn from(v: VNode<H>) -> Self {
        Renderable::Node(Rc::new(v))
    }
}
impl<H: HostAdapter> From<&str> for Renderable<H> {
    fn from(s: &str) -> Self {
        Renderable::Text(Rc::from(s))
    }
}
impl<H: HostAdapter> From<String> for Renderable<H> {
    fn from(s: String) -> Self {
        Renderable::Text(Rc::from(s.as_str()))
    }
}
impl<H: HostAdapter> From<f64> for Renderable<H> {
    fn from(n: f64) -> Self {
        Renderable::Text(Rc::from(format_number(n).as_str()))
    }
}
impl<H: HostAdapter> From<bool> for Renderable<H> {
    fn from(_: bool) -> Self {
        Renderable::Empty
    }
}
impl<H: HostAdapter> From<Vec<Renderable<H>>> for Renderable<H> {
    fn from(v: Vec<Renderable<H>>) -> Self {
        Renderable::List(Rc::from(v))
    }
}

/// Canonical string representation used both for text-vnode creation and for the
/// "text and number with identical string representation are interchangeable"
/// boundary behavior.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// A unique, process-wide identifier for a context, used to find the nearest
/// matching [`crate::context::ContextProviderState`] on the ancestor walk.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ContextId(pub(crate) usize);

impl ContextId {
    pub(crate) fn next() -> Self {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static NEXT: AtomicUsize = AtomicUsize::new(1);
        ContextId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// What a vnode renders as, dispatched on by the reconciler.
pub enum NodeType<H: HostAdapter> {
    /// A host tag string, e.g. `"div"`.
    Host(Rc<str>),
    /// The distinguished fragment marker: renders its children transparently.
    Fragment,
    /// The distinguished error-boundary marker.
    ErrorBoundary,
    /// A context provider, created by [`crate::context::ContextHandle::provider`].
    ContextProvider(ContextId),
    /// A user function component.
    Component(Rc<dyn crate::any_component::AnyComponent<H>>),
}

impl<H: HostAdapter> Clone for NodeType<H> {
    fn clone(&self) -> Self {
        match self {
            NodeType::Host(t) => NodeType::Host(t.clone()),
            NodeType::Fragment => NodeType::Fragment,
            NodeType::ErrorBoundary => NodeType::ErrorBoundary,
            NodeType::ContextProvider(id) => NodeType::ContextProvider(*id),
            NodeType::Component(c) => NodeType::Component(c.clone()),
        }
    }
}

/// An immutable description of what to render.
pub struct VNode<H: HostAdapter> {
    pub node_type: NodeType<H>,
    pub key: Key,
    pub props: Props<H>,
    pub children: Renderable<H>,
}

/// Discriminator used by [`isValidElement`](is_valid_element)-equivalent checks and
/// by the reconciler's type-match arm: both vnodes must share the same `type`
/// for an update to apply in place instead of a full remount.
impl<H: HostAdapter> VNode<H> {
    pub fn is_same_type(&self, other: &VNode<H>) -> bool {
        match (&self.node_type, &other.node_type) {
            (NodeType::Host(a), NodeType::Host(b)) => a == b,
            (NodeType::Fragment, NodeType::Fragment) => true,
            (NodeType::ErrorBoundary, NodeType::ErrorBoundary) => true,
            (NodeType::ContextProvider(a), NodeType::ContextProvider(b)) => a == b,
            (NodeType::Component(a), NodeType::Component(b)) => a.is_same_component(b.as_ref()),
            _ => false,
        }
    }

    pub fn get_ref(&self) -> Option<&NodeRef<H>> {
        match self.props.get("ref") {
            Some(PropValue::NodeRef(r)) => Some(r),
            _ => None,
        }
    }
}

/// `createElement(type, props?, ...children)`. Because Rust has no
/// variadic call syntax, the trailing-arguments collapsing the JS contract performs
/// is expressed here as a single `children: Renderable<H>` parameter — callers that
/// want several children pass `Renderable::List(...)`, which is exactly what nested
/// sequences flatten to anyway.
pub fn create_host_element<H: HostAdapter>(
    tag: impl Into<Rc<str>>,
    mut props: Props<H>,
    children: impl Into<Renderable<H>>,
) -> VNode<H> {
    let key = take_key(&mut props);
    VNode {
        node_type: NodeType::Host(tag.into()),
        key,
        props,
        children: children.into(),
    }
}

/// Builds a `Fragment` vnode. Fragments may carry a key so they participate in
/// keyed list matching like any other vnode.
pub fn create_fragment<H: HostAdapter>(key: Key, children: impl Into<Renderable<H>>) -> VNode<H> {
    VNode {
        node_type: NodeType::Fragment,
        key,
        props: Props::new(),
        children: children.into(),
    }
}

/// Builds an `ErrorBoundary` vnode. `handler` is invoked with the boxed
/// panic payload caught from a descendant's render, effect body, or cleanup.
pub fn create_error_boundary<H: HostAdapter>(
    handler: Rc<dyn Fn(Rc<dyn Any + Send>)>,
    children: impl Into<Renderable<H>>,
) -> VNode<H> {
    let mut props = Props::new();
    props.insert(
        "handler".into(),
        PropValue::Handler(handler),
    );
    VNode {
        node_type: NodeType::ErrorBoundary,
        key: Key::None,
        props,
        children: children.into(),
    }
}

fn take_key<H: HostAdapter>(props: &mut Props<H>) -> Key {
    match props.shift_remove("key") {
        Some(PropValue::Text(s)) => Key::Str(s),
        Some(PropValue::Number(n)) => Key::Num(n as i64),
        _ => Key::None,
    }
}

/// `isValidElement(x)` is, in Rust, just "is this actually a `VNode`" —
/// trivially true for anything of type `VNode<H>`. Useful when a caller is
/// holding a `Renderable<H>` and wants to know whether it wraps an element.
pub fn is_valid_element<H: HostAdapter>(r: &Renderable<H>) -> bool {
    matches!(r, Renderable::Node(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestHost;

    #[test]
    fn key_is_lifted_out_of_props() {
        let mut props: Props<TestHost> = Props::new();
        props.insert("key".into(), PropValue::Text(Rc::from("a")));
        props.insert("id".into(), PropValue::Text(Rc::from("x")));
        let vnode = create_host_element::<TestHost>("div", props, Renderable::Empty);
        assert_eq!(vnode.key, Key::Str(Rc::from("a")));
        assert!(!vnode.props.contains_key("key"));
        assert!(vnode.props.contains_key("id"));
    }

    #[test]
    fn empty_props_yields_empty_map() {
        let vnode =
            create_host_element::<TestHost>("div", Props::new(), Renderable::Empty);
        assert!(vnode.props.is_empty());
    }
}
