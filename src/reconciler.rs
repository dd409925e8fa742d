//! The diff/mount/unmount algorithm plus the component render call. This is
//! the one module allowed to see every other module's internals at once —
//! `Root`'s arena, `HookState`'s cells, and `ContextProviderState` all meet
//! here.

use std::collections::VecDeque;
use std::rc::Rc;

use fxhash::FxHashMap;
use smallvec::{smallvec, SmallVec};

use crate::any_component::RenderOutcome;
use crate::component::{ComponentId, ComponentKind, ComponentNode};
use crate::context::{ContextId, ContextProviderState, RenderCtx};
use crate::host::HostAdapter;
use crate::hooks::{HookCell, HookState};
use crate::scheduler::{Root, UnhandledPanic};
use crate::vnode::{Key, NodeType, PropValue, Props, Renderable, VNode};

// ---------------------------------------------------------------------------
// Top-level entry points, called only from `scheduler.rs`.
// ---------------------------------------------------------------------------

/// First mount, or a full re-render of the existing tree against a new root
/// element.
pub(crate) fn render_root<H: HostAdapter>(root: &mut Root<H>, element: VNode<H>) {
    let container = root.container.clone();
    let slot = Renderable::node(element);
    match root.root {
        Some(old_id) => {
            let new_id = diff_slot(root, old_id, &slot, &container, None, None, 0);
            root.root = Some(new_id);
        }
        None => {
            let id = mount_renderable(root, &slot, &container, None, None, 0);
            root.root = Some(id);
        }
    }
}

/// `unmountComponentAtNode`.
pub(crate) fn unmount_root<H: HostAdapter>(root: &mut Root<H>) {
    if let Some(id) = root.root.take() {
        unmount_subtree(root, id);
    }
}

/// Re-render a single dirty component found during a flush. Unlike
/// a fresh mount or a parent-driven update, nothing on the call stack already
/// knows this component's host parent or insertion point, so both are
/// recovered by walking the tree.
pub(crate) fn rerender_component<H: HostAdapter>(root: &mut Root<H>, id: ComponentId) {
    let parent_host = nearest_host_parent(root, id);
    let anchor = anchor_before(root, id);
    let depth = root.arena[id.0].depth;
    render_component_into(root, id, &parent_host, anchor, depth);
}

// ---------------------------------------------------------------------------
// Position recovery — only needed at `rerender_component`'s entry point.
// Everywhere else, the caller already knows the right anchor and threads it
// down explicitly, since a freshly-mounted id isn't registered in its
// parent's children list yet and a position lookup for it would come up empty.
// ---------------------------------------------------------------------------

fn nearest_host_parent<H: HostAdapter>(root: &Root<H>, id: ComponentId) -> H::Node {
    let mut current = root.arena.get(id.0).and_then(|n| n.parent);
    while let Some(cur) = current {
        match root.arena.get(cur.0) {
            Some(node) => {
                if let ComponentKind::Host { node: host_node, .. } = &node.kind {
                    return host_node.clone();
                }
                current = node.parent;
            }
            None => break,
        }
    }
    root.container.clone()
}

fn anchor_before<H: HostAdapter>(root: &Root<H>, id: ComponentId) -> Option<H::Node> {
    let parent_id = root.arena.get(id.0).and_then(|n| n.parent)?;
    let parent_node = root.arena.get(parent_id.0)?;
    let siblings = parent_node.children();
    if let Some(pos) = siblings.iter().position(|c| *c == id) {
        for sib in siblings[..pos].iter().rev() {
            if let Some(last) = root.dom_roots_of(*sib).last() {
                return Some(last.clone());
            }
        }
    }
    match &parent_node.kind {
        ComponentKind::Host { .. } => None,
        _ => anchor_before(root, parent_id),
    }
}

/// Reposition `id`'s dom roots so each one immediately follows `anchor`,
/// returning the new running anchor. `HostAdapter::insert` is a no-op if a
/// node is already there, so this is safe to call unconditionally on every
/// child after any diff, moved or not.
fn place_after<H: HostAdapter>(
    root: &Root<H>,
    parent_host: &H::Node,
    id: ComponentId,
    mut anchor: Option<H::Node>,
) -> Option<H::Node> {
    for node in root.dom_roots_of(id).iter() {
        root.host.insert(parent_host, node, anchor.as_ref());
        anchor = Some(node.clone());
    }
    anchor
}

fn collect_dom_roots<H: HostAdapter>(root: &Root<H>, children: &[ComponentId]) -> SmallVec<[H::Node; 1]> {
    let mut out = SmallVec::new();
    for child in children {
        out.extend(root.dom_roots_of(*child));
    }
    out
}

/// Recompute `id`'s `dom_roots` from its current children, then keep walking
/// up through transparent ancestors (fragments, error boundaries, context
/// providers, components) whose own `dom_roots` are just a concatenation of
/// their children's. Stops at a `Host`/`Text` node, whose `dom_roots` is
/// always just itself.
fn recompute_dom_roots_upward<H: HostAdapter>(root: &mut Root<H>, id: ComponentId) {
    let mut current = Some(id);
    while let Some(cur) = current {
        let Some(node) = root.arena.get(cur.0) else { break };
        if matches!(node.kind, ComponentKind::Host { .. } | ComponentKind::Text { .. }) {
            break;
        }
        let children = node.children().to_vec();
        let roots = collect_dom_roots(root, &children);
        if let Some(node) = root.arena.get_mut(cur.0) {
            node.dom_roots = roots;
        }
        current = root.arena.get(cur.0).and_then(|n| n.parent);
    }
}

fn slot_key<H: HostAdapter>(r: &Renderable<H>) -> Key {
    match r {
        Renderable::Node(v) => v.key.clone(),
        _ => Key::None,
    }
}

fn is_same_slot_type<H: HostAdapter>(prev: &Renderable<H>, next: &Renderable<H>) -> bool {
    match (prev, next) {
        (Renderable::Text(_), Renderable::Text(_)) => true,
        (Renderable::Node(a), Renderable::Node(b)) => a.is_same_type(b),
        _ => false,
    }
}

/// The SVG-like namespace flag `parent` mounted its own children under,
/// `false` at the document root. A host tag never changes without a full
/// remount, so this is stable for as long as `parent`'s identity is.
fn inherited_svg<H: HostAdapter>(root: &Root<H>, parent: Option<ComponentId>) -> bool {
    parent.and_then(|p| root.arena.get(p.0)).map(|n| n.is_svg).unwrap_or(false)
}

/// The SVG root tag: a host vnode whose tag is this one turns the namespace
/// flag on for itself and everything beneath it.
const SVG_ROOT_TAG: &str = "svg";

// ---------------------------------------------------------------------------
// Mounting
// ---------------------------------------------------------------------------

fn placeholder_node<H: HostAdapter>(
    parent: Option<ComponentId>,
    depth: u32,
    slot: Renderable<H>,
    is_svg: bool,
) -> ComponentNode<H> {
    ComponentNode {
        parent,
        depth,
        prev: slot,
        kind: ComponentKind::Fragment { children: Vec::new() },
        dom_roots: SmallVec::new(),
        is_svg,
    }
}

fn mount_renderable<H: HostAdapter>(
    root: &mut Root<H>,
    item: &Renderable<H>,
    parent_host: &H::Node,
    anchor: Option<H::Node>,
    parent: Option<ComponentId>,
    depth: u32,
) -> ComponentId {
    match item {
        Renderable::Text(s) => {
            let node = root.host.create_text_node(s);
            root.host.insert(parent_host, &node, anchor.as_ref());
            root.next_id(ComponentNode {
                parent,
                depth,
                prev: item.clone(),
                kind: ComponentKind::Text { node: node.clone() },
                dom_roots: smallvec![node],
                is_svg: inherited_svg(root, parent),
            })
        }
        Renderable::Node(vnode) => mount_vnode(root, vnode.clone(), item.clone(), parent_host, anchor, parent, depth),
        Renderable::List(_) | Renderable::Empty => {
            unreachable!("callers flatten children before mounting")
        }
    }
}

/// Mount children in order, threading the running insertion anchor from one
/// to the next.
fn mount_children<H: HostAdapter>(
    root: &mut Root<H>,
    out: &mut Vec<ComponentId>,
    items: &[Renderable<H>],
    parent_host: &H::Node,
    mut anchor: Option<H::Node>,
    parent: Option<ComponentId>,
    depth: u32,
) -> Option<H::Node> {
    for item in items {
        let id = mount_renderable(root, item, parent_host, anchor.clone(), parent, depth);
        if let Some(last) = root.dom_roots_of(id).last() {
            anchor = Some(last.clone());
        }
        out.push(id);
    }
    anchor
}

/// Mount a single vnode. A placeholder slot is reserved in the arena first so
/// the mounted subtree's own id is available to hand to its children as their
/// `parent` before the real content exists — mirrors the way a component's
/// hooks need their owning id for the schedule closure before `HookState`
/// itself is built.
fn mount_vnode<H: HostAdapter>(
    root: &mut Root<H>,
    vnode: Rc<VNode<H>>,
    slot: Renderable<H>,
    parent_host: &H::Node,
    anchor: Option<H::Node>,
    parent: Option<ComponentId>,
    depth: u32,
) -> ComponentId {
    let inherited = inherited_svg(root, parent);
    let self_svg = match &vnode.node_type {
        NodeType::Host(tag) => inherited || tag.as_ref() == SVG_ROOT_TAG,
        _ => inherited,
    };
    let id = root.next_id(placeholder_node(parent, depth, slot.clone(), self_svg));

    match &vnode.node_type {
        NodeType::Host(tag) => {
            let node = root.host.create_element(tag, self_svg);
            root.host.apply_props(&node, &Props::new(), &vnode.props);
            if let Some(r) = vnode.get_ref() {
                *r.borrow_mut() = Some(node.clone());
            }
            let items = crate::diff_util::flatten_children(&vnode.children);
            let mut children = Vec::new();
            mount_children(root, &mut children, &items, &node, None, Some(id), depth + 1);
            root.host.insert(parent_host, &node, anchor.as_ref());
            root.arena[id.0] = ComponentNode {
                parent,
                depth,
                prev: slot,
                kind: ComponentKind::Host { node: node.clone(), children },
                dom_roots: smallvec![node],
                is_svg: self_svg,
            };
        }
        NodeType::Fragment => {
            let items = crate::diff_util::flatten_children(&vnode.children);
            let mut children = Vec::new();
            mount_children(root, &mut children, &items, parent_host, anchor, Some(id), depth + 1);
            let dom_roots = collect_dom_roots(root, &children);
            root.arena[id.0] = ComponentNode {
                parent,
                depth,
                prev: slot,
                kind: ComponentKind::Fragment { children },
                dom_roots,
                is_svg: self_svg,
            };
        }
        NodeType::ErrorBoundary => {
            let items = crate::diff_util::flatten_children(&vnode.children);
            let mut children = Vec::new();
            mount_children(root, &mut children, &items, parent_host, anchor, Some(id), depth + 1);
            let dom_roots = collect_dom_roots(root, &children);
            root.arena[id.0] = ComponentNode {
                parent,
                depth,
                prev: slot,
                kind: ComponentKind::ErrorBoundary { children },
                dom_roots,
                is_svg: self_svg,
            };
        }
        NodeType::ContextProvider(context_id) => {
            let value = crate::context::erased_value_from_props(&vnode.props);
            let state = Rc::new(ContextProviderState::new(*context_id, value));
            let items = crate::diff_util::flatten_children(&vnode.children);
            let mut children = Vec::new();
            mount_children(root, &mut children, &items, parent_host, anchor, Some(id), depth + 1);
            let dom_roots = collect_dom_roots(root, &children);
            root.arena[id.0] = ComponentNode {
                parent,
                depth,
                prev: slot,
                kind: ComponentKind::ContextProvider { state, children },
                dom_roots,
                is_svg: self_svg,
            };
        }
        NodeType::Component(instance) => {
            let instance = instance.clone();
            let schedule = root.schedule_fn(id);
            let hooks = HookState::new(schedule);
            root.arena[id.0] = ComponentNode {
                parent,
                depth,
                prev: slot,
                kind: ComponentKind::Component { instance, hooks, children: Vec::new() },
                dom_roots: SmallVec::new(),
                is_svg: self_svg,
            };
            render_component_into(root, id, parent_host, anchor, depth);
        }
    }

    id
}

// ---------------------------------------------------------------------------
// Diffing
// ---------------------------------------------------------------------------

/// Match old children against new slots, updating/mounting/unmounting as
/// needed, then commit the new order's host positions. Keyed slots match by
/// key; unkeyed slots match positionally against the remaining unkeyed pool,
/// in order — equivalent to a linear left-to-right scan, just done in O(n)
/// via the auxiliary maps instead of O(n²).
fn diff_children<H: HostAdapter>(
    root: &mut Root<H>,
    old_children: Vec<ComponentId>,
    new_items: &[Renderable<H>],
    parent_host: &H::Node,
    mut anchor: Option<H::Node>,
    parent: Option<ComponentId>,
    depth: u32,
) -> (Vec<ComponentId>, Option<H::Node>) {
    let mut keyed: FxHashMap<Key, VecDeque<usize>> = FxHashMap::default();
    let mut unkeyed: VecDeque<usize> = VecDeque::new();
    for (i, old_id) in old_children.iter().enumerate() {
        let key = root.arena.get(old_id.0).map(|n| slot_key(&n.prev)).unwrap_or(Key::None);
        match key {
            Key::None => unkeyed.push_back(i),
            k => keyed.entry(k).or_default().push_back(i),
        }
    }

    let mut consumed = vec![false; old_children.len()];
    let mut new_ids = Vec::with_capacity(new_items.len());

    for item in new_items {
        let key = slot_key(item);
        let matched = match &key {
            Key::None => unkeyed.pop_front(),
            k => keyed.get_mut(k).and_then(|q| q.pop_front()),
        };
        let id = match matched {
            Some(old_index) => {
                consumed[old_index] = true;
                diff_slot(root, old_children[old_index], item, parent_host, anchor.clone(), parent, depth)
            }
            None => mount_renderable(root, item, parent_host, None, parent, depth),
        };
        new_ids.push(id);
    }

    for (i, old_id) in old_children.iter().enumerate() {
        if !consumed[i] {
            unmount_subtree(root, *old_id);
        }
    }

    for id in &new_ids {
        anchor = place_after(root, parent_host, *id, anchor);
    }

    (new_ids, anchor)
}

/// Decide bail-out / type-match / type-mismatch for one slot. On mismatch the
/// old subtree is torn down and a fresh one mounted in
/// its place; the replacement's host position doesn't matter here since the
/// enclosing `diff_children` repositions every child afterward regardless.
/// `oldVNode === newVNode`: if the incoming slot is the exact same `Rc` the
/// previous render produced (a hoisted literal, a `useMemo`-returned vnode
/// passed straight through), skip the diff entirely. Load-bearing: it's what
/// lets an unchanged subtree opt out of re-rendering by identity alone.
fn same_renderable<H: HostAdapter>(a: &Renderable<H>, b: &Renderable<H>) -> bool {
    match (a, b) {
        (Renderable::Node(x), Renderable::Node(y)) => Rc::ptr_eq(x, y),
        (Renderable::Text(x), Renderable::Text(y)) => Rc::ptr_eq(x, y),
        (Renderable::Empty, Renderable::Empty) => true,
        _ => false,
    }
}

fn diff_slot<H: HostAdapter>(
    root: &mut Root<H>,
    old_id: ComponentId,
    new_item: &Renderable<H>,
    parent_host: &H::Node,
    anchor: Option<H::Node>,
    parent: Option<ComponentId>,
    depth: u32,
) -> ComponentId {
    let identical = root.arena.get(old_id.0).map(|n| same_renderable(&n.prev, new_item)).unwrap_or(false);
    if identical {
        return old_id;
    }

    let same_type = root
        .arena
        .get(old_id.0)
        .map(|n| is_same_slot_type(&n.prev, new_item))
        .unwrap_or(false);
    if same_type {
        update_in_place(root, old_id, new_item, parent_host, anchor, depth);
        old_id
    } else {
        unmount_subtree(root, old_id);
        mount_renderable(root, new_item, parent_host, None, parent, depth)
    }
}

fn update_in_place<H: HostAdapter>(
    root: &mut Root<H>,
    id: ComponentId,
    new_item: &Renderable<H>,
    parent_host: &H::Node,
    anchor: Option<H::Node>,
    depth: u32,
) {
    match new_item {
        Renderable::Text(s) => update_text(root, id, s),
        Renderable::Node(vnode) => {
            let vnode = vnode.clone();
            let slot = new_item.clone();
            match vnode.node_type.clone() {
                NodeType::Host(_) => update_host(root, id, vnode, slot, depth),
                NodeType::Fragment | NodeType::ErrorBoundary => {
                    let children = vnode.children.clone();
                    update_children_only(root, id, &children, slot, parent_host, anchor, depth);
                }
                NodeType::ContextProvider(context_id) => {
                    update_context_provider(root, id, context_id, &vnode, slot, parent_host, anchor, depth);
                }
                NodeType::Component(instance) => {
                    update_component(root, id, instance, slot, parent_host, anchor, depth);
                }
            }
        }
        _ => unreachable!("flattened children are never Empty or List"),
    }
}

fn update_text<H: HostAdapter>(root: &mut Root<H>, id: ComponentId, s: &Rc<str>) {
    let (changed, host_node) = {
        let node = &mut root.arena[id.0];
        let changed = match &node.prev {
            Renderable::Text(prev) => prev.as_ref() != s.as_ref(),
            _ => true,
        };
        node.prev = Renderable::Text(s.clone());
        let host_node = match &node.kind {
            ComponentKind::Text { node } => node.clone(),
            _ => unreachable!(),
        };
        (changed, host_node)
    };
    if changed {
        root.host.set_text(&host_node, s);
    }
}

fn update_host<H: HostAdapter>(root: &mut Root<H>, id: ComponentId, vnode: Rc<VNode<H>>, slot: Renderable<H>, depth: u32) {
    let host_node = match &root.arena[id.0].kind {
        ComponentKind::Host { node, .. } => node.clone(),
        _ => unreachable!(),
    };
    {
        let prev_props: &Props<H> = match &root.arena[id.0].prev {
            Renderable::Node(v) => &v.props,
            _ => unreachable!(),
        };
        root.host.apply_props(&host_node, prev_props, &vnode.props);
    }
    if let Some(r) = vnode.get_ref() {
        *r.borrow_mut() = Some(host_node.clone());
    }

    let old_children = root.arena[id.0].children().to_vec();
    let items = crate::diff_util::flatten_children(&vnode.children);
    let (new_children, _) = diff_children(root, old_children, &items, &host_node, None, Some(id), depth + 1);

    let node = &mut root.arena[id.0];
    *node.children_mut() = new_children;
    node.prev = slot;
}

fn update_children_only<H: HostAdapter>(
    root: &mut Root<H>,
    id: ComponentId,
    new_children_renderable: &Renderable<H>,
    slot: Renderable<H>,
    parent_host: &H::Node,
    anchor: Option<H::Node>,
    depth: u32,
) {
    let old_children = root.arena[id.0].children().to_vec();
    let items = crate::diff_util::flatten_children(new_children_renderable);
    let (new_children, _) = diff_children(root, old_children, &items, parent_host, anchor, Some(id), depth + 1);

    let node = &mut root.arena[id.0];
    *node.children_mut() = new_children;
    node.prev = slot;

    recompute_dom_roots_upward(root, id);
}

fn update_context_provider<H: HostAdapter>(
    root: &mut Root<H>,
    id: ComponentId,
    context_id: ContextId,
    vnode: &Rc<VNode<H>>,
    slot: Renderable<H>,
    parent_host: &H::Node,
    anchor: Option<H::Node>,
    depth: u32,
) {
    let value = crate::context::erased_value_from_props(&vnode.props);
    if let ComponentKind::ContextProvider { state, .. } = &root.arena[id.0].kind {
        debug_assert_eq!(state.context_id, context_id);
        state.set_value(value);
    }
    let children = vnode.children.clone();
    update_children_only(root, id, &children, slot, parent_host, anchor, depth);
}

/// `memo` bail-out: if the incoming instance's props compare equal
/// to the previous instance's, the new instance still replaces the old one
/// (so the *next* update compares against the latest props) but nothing
/// re-renders.
fn update_component<H: HostAdapter>(
    root: &mut Root<H>,
    id: ComponentId,
    new_instance: Rc<dyn crate::any_component::AnyComponent<H>>,
    slot: Renderable<H>,
    parent_host: &H::Node,
    anchor: Option<H::Node>,
    depth: u32,
) {
    let bail_out = match &root.arena[id.0].kind {
        ComponentKind::Component { instance, .. } => new_instance.props_unchanged(instance.as_ref()),
        _ => false,
    };

    {
        let node = &mut root.arena[id.0];
        if let ComponentKind::Component { instance, .. } = &mut node.kind {
            *instance = new_instance;
        }
        node.prev = slot;
    }

    if !bail_out {
        render_component_into(root, id, parent_host, anchor, depth);
    }
}

// ---------------------------------------------------------------------------
// Component render — shared by mount and update, since a
// fresh mount is just an update against an empty previous child list.
// ---------------------------------------------------------------------------

fn render_component_into<H: HostAdapter>(
    root: &mut Root<H>,
    id: ComponentId,
    parent_host: &H::Node,
    anchor: Option<H::Node>,
    depth: u32,
) {
    let instance = match &root.arena[id.0].kind {
        ComponentKind::Component { instance, .. } => instance.clone(),
        _ => unreachable!(),
    };

    let mut hooks = match &mut root.arena[id.0].kind {
        ComponentKind::Component { hooks, .. } => std::mem::replace(hooks, HookState::new(Rc::new(|| {}))),
        _ => unreachable!(),
    };
    hooks.reset_cursor();

    let find_provider = make_find_provider(root, id);
    let render_ctx = RenderCtx { component_id: id.0, find_provider };

    let outcome = crate::context::with_render_ctx(render_ctx, || {
        crate::hooks::with_hook_scope(&mut hooks, || instance.render())
    });

    if let ComponentKind::Component { hooks: slot, .. } = &mut root.arena[id.0].kind {
        *slot = hooks;
    }

    match outcome {
        RenderOutcome::Rendered(rendered) => {
            let items = crate::diff_util::flatten_children(&rendered);
            let old_children = root.arena[id.0].children().to_vec();
            let (new_children, _) = diff_children(root, old_children, &items, parent_host, anchor, Some(id), depth + 1);
            *root.arena[id.0].children_mut() = new_children;
            queue_effects(root, id);
            recompute_dom_roots_upward(root, id);
        }
        RenderOutcome::Panicked(payload) => {
            handle_panic(root, id, instance.name(), payload);
        }
    }
}

/// Build the ancestor-lookup closure `use_context` calls through.
/// The raw pointer is sound because it is only ever invoked synchronously,
/// within the exact render call that built it — the same single-threaded,
/// non-reentrant argument `hooks.rs`'s `with_current` relies on.
fn make_find_provider<H: HostAdapter>(
    root: &mut Root<H>,
    id: ComponentId,
) -> Rc<dyn Fn(ContextId) -> Option<Rc<ContextProviderState>>> {
    let root_ptr: *const Root<H> = root;
    Rc::new(move |context_id: ContextId| {
        // Safety: see module doc comment on `make_find_provider`.
        let root = unsafe { &*root_ptr };
        let mut current = root.arena.get(id.0).and_then(|n| n.parent);
        while let Some(cur) = current {
            let Some(node) = root.arena.get(cur.0) else { break };
            if let ComponentKind::ContextProvider { state, .. } = &node.kind {
                if state.context_id == context_id {
                    return Some(state.clone());
                }
            }
            current = node.parent;
        }
        None
    })
}

fn queue_effects<H: HostAdapter>(root: &mut Root<H>, id: ComponentId) {
    let (has_layout, has_post) = match &root.arena[id.0].kind {
        ComponentKind::Component { hooks, .. } => {
            let has_layout = hooks
                .cells
                .iter()
                .any(|c| matches!(c, HookCell::LayoutEffect(e) if e.dirty));
            let has_post = hooks.cells.iter().any(|c| matches!(c, HookCell::Effect(e) if e.dirty));
            (has_layout, has_post)
        }
        _ => (false, false),
    };
    if has_layout {
        root.queue_layout_effects(id);
    }
    if has_post {
        root.queue_post_effects(id);
    }
}

// ---------------------------------------------------------------------------
// Unmount
// ---------------------------------------------------------------------------

/// Remove `id`'s host nodes from the document, then clean up everything below
/// it. Only the top-level call touches the host tree — a removed ancestor
/// node already takes its whole subtree out of the document with it.
fn unmount_subtree<H: HostAdapter>(root: &mut Root<H>, id: ComponentId) {
    for node in root.dom_roots_of(id).iter() {
        root.host.remove(node);
    }
    cleanup_subtree(root, id);
}

fn cleanup_subtree<H: HostAdapter>(root: &mut Root<H>, id: ComponentId) {
    let children = root.arena.get(id.0).map(|n| n.children().to_vec()).unwrap_or_default();
    for child in children {
        cleanup_subtree(root, child);
    }
    if !root.arena.contains(id.0) {
        return;
    }
    // Capture the parent before removal: the error-boundary walk for a
    // cleanup panic starts from here, and `id` itself won't be in the arena
    // to look it up from by the time a cleanup body runs.
    let parent = root.arena[id.0].parent;
    let node = root.arena.remove(id.0);
    if let Renderable::Node(v) = &node.prev {
        if let Some(r) = v.get_ref() {
            *r.borrow_mut() = None;
        }
    }
    if let ComponentKind::Component { instance, mut hooks, .. } = node.kind {
        run_all_cleanups(root, parent, instance.name(), &mut hooks);
    }
}

fn run_all_cleanups<H: HostAdapter>(root: &mut Root<H>, parent: Option<ComponentId>, name: &'static str, hooks: &mut HookState) {
    for cell in hooks.cells.iter_mut() {
        match cell {
            HookCell::Effect(e) | HookCell::LayoutEffect(e) => {
                if let Some(cleanup) = e.cleanup.take() {
                    if let Err(payload) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(cleanup)) {
                        handle_panic_from(root, parent, name, payload);
                    }
                }
            }
            HookCell::Context(c) => {
                if let Some(unsub) = c.unsubscribe.take() {
                    unsub();
                }
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Error boundary walk
// ---------------------------------------------------------------------------

/// Entry point for a panic raised by `id` itself (render, effect body while
/// still mounted): starts the ancestor walk at `id`'s parent.
pub(crate) fn handle_panic<H: HostAdapter>(root: &mut Root<H>, id: ComponentId, name: &'static str, payload: Box<dyn std::any::Any + Send>) {
    let parent = root.arena.get(id.0).and_then(|n| n.parent);
    handle_panic_from(root, parent, name, payload);
}

/// The ancestor walk itself, parameterized on the starting ancestor rather
/// than the panicking id — needed for cleanup panics, where the panicking
/// component has already been removed from the arena by the time its
/// cleanup runs (see `cleanup_subtree`).
fn handle_panic_from<H: HostAdapter>(
    root: &mut Root<H>,
    mut current: Option<ComponentId>,
    name: &'static str,
    payload: Box<dyn std::any::Any + Send>,
) {
    let mut payload: Rc<dyn std::any::Any + Send> = Rc::from(payload);
    while let Some(cur) = current {
        let handler = root.arena.get(cur.0).and_then(|node| match &node.kind {
            ComponentKind::ErrorBoundary { .. } => match &node.prev {
                Renderable::Node(v) => match v.props.get("handler") {
                    Some(PropValue::Handler(h)) => Some(h.clone()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        });
        let next = root.arena.get(cur.0).and_then(|n| n.parent);
        if let Some(handler) = handler {
            let for_handler = payload.clone();
            match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler(for_handler))) {
                Ok(()) => return,
                Err(new_payload) => {
                    // A panicking handler's payload replaces the original;
                    // the walk continues at the boundary's own parent.
                    payload = Rc::from(new_payload);
                }
            }
        }
        current = next;
    }
    log::error!("unhandled panic from component `{name}`, no error boundary above it");
    root.unhandled.push(UnhandledPanic { component: name, payload });
}
