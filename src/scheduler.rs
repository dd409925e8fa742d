//! The root scheduler. Owns the component arena and the host, and exposes the
//! handful of operations a renderer needs: schedule, flush update, flush
//! layout effects, flush post-commit effects, render, and the `act` test
//! helper.
//!
//! Update requests flow through an `mpsc` channel into a dirty set, much like
//! a message queue feeding a diffing pass, generalized here to a `Root` that
//! has no notion of async tasks or suspense, since those are out of this
//! core's scope.

use std::any::Any;
use std::collections::BTreeSet;
use std::future::Future;
use std::rc::Rc;

use futures_channel::mpsc;
use slab::Slab;
use smallvec::SmallVec;

use crate::component::{ComponentId, ComponentKind, ComponentNode};
use crate::host::HostAdapter;
use crate::hooks::HookCell;
use crate::vnode::VNode;

/// Dirty-queue entry: depth first so a re-render always processes parents
/// before children.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
struct DirtyEntry {
    depth: u32,
    id: usize,
}

/// What reached the root unboundaried.
pub struct UnhandledPanic {
    pub component: &'static str,
    pub payload: Rc<dyn Any + Send>,
}

pub struct Root<H: HostAdapter> {
    pub(crate) host: H,
    pub(crate) arena: Slab<ComponentNode<H>>,
    pub(crate) root: Option<ComponentId>,
    pub(crate) container: H::Node,

    sender: mpsc::UnboundedSender<ComponentId>,
    receiver: mpsc::UnboundedReceiver<ComponentId>,
    dirty: BTreeSet<DirtyEntry>,

    pending_layout_effects: Vec<ComponentId>,
    pending_post_effects: Vec<ComponentId>,

    act_depth: u32,
    /// Unhandled panics collected during the current flush, surfaced to the
    /// caller of `flush`/`act` once draining settles.
    pub unhandled: Vec<UnhandledPanic>,
}

impl<H: HostAdapter> Root<H> {
    pub fn new(host: H, container: H::Node) -> Self {
        let (sender, receiver) = mpsc::unbounded();
        Root {
            host,
            arena: Slab::new(),
            root: None,
            container,
            sender,
            receiver,
            dirty: BTreeSet::new(),
            pending_layout_effects: Vec::new(),
            pending_post_effects: Vec::new(),
            act_depth: 0,
            unhandled: Vec::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn container(&self) -> &H::Node {
        &self.container
    }

    /// Build a schedule callback for a component at `depth`, closed over its id
    /// and this root's sender. Hook setters call it to schedule an update
    /// without knowing anything about the tree they live in.
    pub(crate) fn schedule_fn(&self, id: ComponentId) -> Rc<dyn Fn()> {
        let sender = self.sender.clone();
        Rc::new(move || {
            let _ = sender.unbounded_send(id);
        })
    }

    pub(crate) fn queue_layout_effects(&mut self, id: ComponentId) {
        self.pending_layout_effects.push(id);
    }

    pub(crate) fn queue_post_effects(&mut self, id: ComponentId) {
        self.pending_post_effects.push(id);
    }

    fn drain_channel_into_dirty(&mut self) {
        while let Ok(Some(id)) = self.receiver.try_next() {
            if let Some(node) = self.arena.get(id.0) {
                self.dirty.insert(DirtyEntry {
                    depth: node.depth,
                    id: id.0,
                });
            }
        }
    }

    /// `render(element, container)`: first mount, or re-run of the
    /// whole tree if a root already exists. Flushes layout effects before
    /// returning, same as a real paint boundary; post-commit effects are not
    /// waited on here — they drain on the next `act`/flush.
    pub fn render(&mut self, element: VNode<H>) {
        crate::reconciler::render_root(self, element);
        self.run_layout_effects();
    }

    /// `unmountComponentAtNode`.
    pub fn unmount(&mut self) {
        crate::reconciler::unmount_root(self);
    }

    /// "Flush update": drain the dirty set, re-rendering each
    /// component depth-first, re-walking insertion points as children move.
    /// Returns once no new updates were scheduled by this pass.
    ///
    /// A parent re-render that cascades down through a child already counts
    /// as that child's render for this flush, so any of the child's own
    /// dirty entries still sitting in the set afterward are dropped rather
    /// than re-rendering it a second time.
    pub fn flush_update(&mut self) {
        loop {
            self.drain_channel_into_dirty();
            let Some(entry) = self.dirty.iter().next().copied() else {
                break;
            };
            self.dirty.remove(&entry);
            if self.arena.contains(entry.id) {
                crate::reconciler::rerender_component(self, ComponentId(entry.id));
                self.drop_dirty_descendants_of(ComponentId(entry.id));
            }
        }
    }

    fn drop_dirty_descendants_of(&mut self, ancestor: ComponentId) {
        self.dirty.retain(|entry| !self.is_descendant_of(ComponentId(entry.id), ancestor));
    }

    fn is_descendant_of(&self, id: ComponentId, ancestor: ComponentId) -> bool {
        let mut current = self.arena.get(id.0).and_then(|n| n.parent);
        while let Some(cur) = current {
            if cur == ancestor {
                return true;
            }
            current = self.arena.get(cur.0).and_then(|n| n.parent);
        }
        false
    }

    /// "Flush layout effects": runs synchronously, before paint.
    pub fn run_layout_effects(&mut self) {
        let mut ids = std::mem::take(&mut self.pending_layout_effects);
        ids.sort_by_key(|id| self.arena.get(id.0).map(|n| n.depth).unwrap_or(u32::MAX));
        for id in ids {
            self.run_effects_for(id, EffectPhase::Layout);
        }
    }

    /// "Flush post-commit effects": runs after paint, in practice here
    /// immediately after layout effects since this core has no paint concept.
    pub fn run_post_effects(&mut self) {
        let mut ids = std::mem::take(&mut self.pending_post_effects);
        ids.sort_by_key(|id| self.arena.get(id.0).map(|n| n.depth).unwrap_or(u32::MAX));
        for id in ids {
            self.run_effects_for(id, EffectPhase::PostCommit);
        }
    }

    fn run_effects_for(&mut self, id: ComponentId, phase: EffectPhase) {
        let Some(ComponentKind::Component { hooks, .. }) = self.arena.get(id.0).map(|n| &n.kind) else {
            return;
        };
        let dirty_indices: Vec<usize> = hooks
            .cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| match (phase, cell) {
                (EffectPhase::Layout, HookCell::LayoutEffect(e)) if e.dirty => Some(i),
                (EffectPhase::PostCommit, HookCell::Effect(e)) if e.dirty => Some(i),
                _ => None,
            })
            .collect();
        let name = match self.arena.get(id.0).map(|n| &n.kind) {
            Some(ComponentKind::Component { instance, .. }) => instance.name(),
            _ => "<unknown>",
        };

        for idx in dirty_indices {
            // `cleanup`/`body` are taken as owned values so this borrow of
            // `self.arena` ends before the panic-handling calls below, which
            // need the whole `self` to walk the error-boundary chain.
            let Some((cleanup, body)) = self.arena.get_mut(id.0).and_then(|node| {
                let ComponentKind::Component { hooks, .. } = &mut node.kind else {
                    return None;
                };
                let effect = match hooks.cells.get_mut(idx)? {
                    HookCell::Effect(e) | HookCell::LayoutEffect(e) => e,
                    _ => return None,
                };
                effect.dirty = false;
                Some((effect.cleanup.take(), effect.pending.take()))
            }) else {
                continue;
            };

            if let Some(cleanup) = cleanup {
                if let Err(payload) =
                    std::panic::catch_unwind(std::panic::AssertUnwindSafe(cleanup))
                {
                    crate::reconciler::handle_panic(self, id, name, payload);
                }
            }
            if let Some(body) = body {
                match std::panic::catch_unwind(std::panic::AssertUnwindSafe(body)) {
                    Ok(new_cleanup) => {
                        if let Some(node) = self.arena.get_mut(id.0) {
                            if let ComponentKind::Component { hooks, .. } = &mut node.kind {
                                if let Some(HookCell::Effect(e) | HookCell::LayoutEffect(e)) =
                                    hooks.cells.get_mut(idx)
                                {
                                    e.cleanup = new_cleanup;
                                }
                            }
                        }
                    }
                    Err(payload) => {
                        crate::reconciler::handle_panic(self, id, name, payload);
                    }
                }
            }
        }
    }

    /// Counted re-entrant flush-everything helper. Nested calls
    /// only flush once the outermost call returns.
    pub fn act<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.act_depth += 1;
        let result = f(self);
        self.act_depth -= 1;
        if self.act_depth == 0 {
            self.drain_all();
        }
        result
    }

    /// `act`'s async form: `callback` may return a promise-like future. The
    /// drain is deferred until that future settles — rejected or not, it
    /// still drains once it does. There's no real I/O in this core, so
    /// driving the future to completion is just polling it with a waker
    /// that does nothing; a future that is never woken simply never settles.
    pub fn act_async<R, Fut>(&mut self, f: impl FnOnce(&mut Self) -> Fut) -> R
    where
        Fut: std::future::Future<Output = R>,
    {
        self.act_depth += 1;
        let fut = f(self);
        let mut fut = Box::pin(fut);
        let waker = futures_util::task::noop_waker();
        let mut cx = std::task::Context::from_waker(&waker);
        let result = loop {
            match fut.as_mut().poll(&mut cx) {
                std::task::Poll::Ready(value) => break value,
                std::task::Poll::Pending => continue,
            }
        };
        self.act_depth -= 1;
        if self.act_depth == 0 {
            self.drain_all();
        }
        result
    }

    fn drain_all(&mut self) {
        loop {
            self.drain_channel_into_dirty();
            if self.dirty.is_empty()
                && self.pending_layout_effects.is_empty()
                && self.pending_post_effects.is_empty()
            {
                break;
            }
            self.flush_update();
            self.run_layout_effects();
            self.run_post_effects();
        }
    }

    pub(crate) fn next_id(&mut self, node: ComponentNode<H>) -> ComponentId {
        ComponentId(self.arena.insert(node))
    }

    pub(crate) fn dom_roots_of(&self, id: ComponentId) -> SmallVec<[H::Node; 1]> {
        self.arena
            .get(id.0)
            .map(|n| n.dom_roots.clone())
            .unwrap_or_default()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum EffectPhase {
    Layout,
    PostCommit,
}
