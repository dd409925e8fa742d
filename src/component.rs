//! The reconciler-internal backing tree. Every
//! live `VNode` has exactly one corresponding `ComponentNode`, stored in the
//! root's arena and addressed by [`ComponentId`] — a stable id into a slab,
//! not a pointer.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::any_component::AnyComponent;
use crate::context::ContextProviderState;
use crate::host::HostAdapter;
use crate::hooks::HookState;
use crate::vnode::Renderable;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ComponentId(pub(crate) usize);

/// What a mounted node actually is, beyond its vnode.
/// `Text`/`Host` carry the live host node(s); `Component` carries
/// hook state; everything carries the child list it last committed against.
pub(crate) enum ComponentKind<H: HostAdapter> {
    Text {
        node: H::Node,
    },
    Host {
        node: H::Node,
        children: Vec<ComponentId>,
    },
    Fragment {
        children: Vec<ComponentId>,
    },
    ErrorBoundary {
        children: Vec<ComponentId>,
    },
    ContextProvider {
        state: Rc<ContextProviderState>,
        children: Vec<ComponentId>,
    },
    Component {
        instance: Rc<dyn AnyComponent<H>>,
        hooks: HookState,
        children: Vec<ComponentId>,
    },
}

pub(crate) struct ComponentNode<H: HostAdapter> {
    pub parent: Option<ComponentId>,
    pub depth: u32,
    /// The renderable slot (a `Text` or a `Node`) this component instance was
    /// last built from — compared against the incoming slot on update to decide
    /// bail-out / type-match / type-mismatch.
    pub prev: Renderable<H>,
    pub kind: ComponentKind<H>,
    /// The flattened list of actual host nodes this subtree occupies, in
    /// document order — used to find "the node after which the next sibling
    /// subtree should be inserted" during a parent's child walk.
    pub dom_roots: SmallVec<[H::Node; 1]>,
    /// Whether this node's own host element (if any) and its children were
    /// created in the SVG-like namespace — inherited from the parent and
    /// turned on by a host tag that is an SVG root. Fixed at mount time: a
    /// node whose tag can't change without a full remount never needs this
    /// recomputed.
    pub is_svg: bool,
}

impl<H: HostAdapter> ComponentNode<H> {
    pub fn children(&self) -> &[ComponentId] {
        match &self.kind {
            ComponentKind::Text { .. } => &[],
            ComponentKind::Host { children, .. }
            | ComponentKind::Fragment { children }
            | ComponentKind::ErrorBoundary { children }
            | ComponentKind::ContextProvider { children, .. }
            | ComponentKind::Component { children, .. } => children,
        }
    }

    pub fn children_mut(&mut self) -> &mut Vec<ComponentId> {
        match &mut self.kind {
            ComponentKind::Text { .. } => unreachable!("text nodes have no children"),
            ComponentKind::Host { children, .. }
            | ComponentKind::Fragment { children }
            | ComponentKind::ErrorBoundary { children }
            | ComponentKind::ContextProvider { children, .. }
            | ComponentKind::Component { children, .. } => children,
        }
    }
}
