//! The host adapter seam. The reconciler never touches a concrete host
//! tree directly — it only calls through this trait.

use crate::vnode::Props;

/// Everything the reconciler needs from a host tree implementation. A real
/// implementation would back `Node` with a DOM element handle; `tests/support`
/// backs it with an in-memory tree for assertions without a browser.
pub trait HostAdapter: Sized + 'static {
    /// An opaque handle to a host-tree node. Cloning a handle must be cheap (it is
    /// cloned into `dom_roots`/ref cells freely); identity, not structural value,
    /// is what the reconciler and host adapter care about.
    type Node: Clone + PartialEq + 'static;

    /// Create a new, detached host element for `tag` in the given namespace.
    /// `svg` is `true` when the element is created as part of an SVG-like
    /// subtree (the tag itself is the SVG root, or an ancestor host tag
    /// already toggled it on) — implementations backed by a real DOM use it
    /// to pick `createElementNS` vs `createElement`.
    fn create_element(&self, tag: &str, svg: bool) -> Self::Node;

    /// Create a new, detached host text node with the given data.
    fn create_text_node(&self, data: &str) -> Self::Node;

    /// Overwrite a text node's data in place.
    fn set_text(&self, node: &Self::Node, data: &str);

    /// Reconcile `node`'s host-visible properties from `prev` (empty on first
    /// mount) to `next`. Implementations decide internally which entries are
    /// attributes, properties, or event listeners, and must ignore reserved
    /// entries they don't understand (e.g. `"ref"`) — the host, not the
    /// reconciler, owns that mapping.
    fn apply_props(&self, node: &Self::Node, prev: &Props<Self>, next: &Props<Self>);

    /// Insert `node` as a child of `parent`, immediately after `after` (or as the
    /// first child if `after` is `None`). Must be a no-op if `node` is already
    /// positioned there so the reconciler can call it unconditionally
    /// during a reorder without checking current position first.
    fn insert(&self, parent: &Self::Node, node: &Self::Node, after: Option<&Self::Node>);

    /// Detach `node` from its current parent, wherever that is.
    fn remove(&self, node: &Self::Node);
}
