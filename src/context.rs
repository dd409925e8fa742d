//! `createContext`/Provider/`useContext`.
//!
//! A provider is not an ordinary user function component — it is a distinguished
//! node kind the reconciler special-cases so it can read the incoming vnode's
//! raw `value` prop directly: "value present means use it, otherwise fall back
//! to the default" needs dynamic, presence-or-absence prop inspection that a
//! statically-typed component's `P` can't express generically.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

pub use crate::vnode::ContextId;
use crate::host::HostAdapter;
use crate::vnode::{Key, NodeType, PropValue, Props, Renderable, VNode};

/// A context value, type-erased but still comparable to another erased value of
/// the same underlying type. Lets the reconciler decide whether a `Provider`'s
/// value changed without knowing `T`.
pub trait ErasedContextValue {
    fn as_any(&self) -> &dyn Any;
    fn eq_erased(&self, other: &dyn ErasedContextValue) -> bool;
}

struct Concrete<T>(T);

impl<T: PartialEq + 'static> ErasedContextValue for Concrete<T> {
    fn as_any(&self) -> &dyn Any {
        &self.0
    }
    fn eq_erased(&self, other: &dyn ErasedContextValue) -> bool {
        match other.as_any().downcast_ref::<T>() {
            Some(o) => &self.0 == o,
            None => false,
        }
    }
}

/// A reference to a context, returned by [`create_context`]. Clone freely; all
/// clones refer to the same underlying [`ContextId`].
pub struct ContextHandle<T> {
    pub(crate) id: ContextId,
    pub default: T,
}

impl<T: Clone> Clone for ContextHandle<T> {
    fn clone(&self) -> Self {
        ContextHandle {
            id: self.id,
            default: self.default.clone(),
        }
    }
}

/// `createContext(defaultValue)`.
pub fn create_context<T: Clone + PartialEq + 'static>(default: T) -> ContextHandle<T> {
    ContextHandle {
        id: ContextId::next(),
        default,
    }
}

impl<T: Clone + PartialEq + 'static> ContextHandle<T> {
    /// Build a `Provider` vnode carrying an explicit value. The default is
    /// embedded alongside it (under the reserved `"default"` key) so the
    /// reconciler can resolve a value purely from the vnode, without needing the
    /// statically-typed handle back.
    pub fn provider<H: HostAdapter>(&self, value: T, children: impl Into<Renderable<H>>) -> VNode<H> {
        let mut props = Props::new();
        props.insert(
            "value".into(),
            PropValue::Context(Rc::new(Concrete(value))),
        );
        props.insert(
            "default".into(),
            PropValue::Context(Rc::new(Concrete(self.default.clone()))),
        );
        VNode {
            node_type: NodeType::ContextProvider(self.id),
            key: Key::None,
            props,
            children: children.into(),
        }
    }

    /// Build a `Provider` vnode with no explicit value — descendants see
    /// `default` (props without a `value` key fall back to the context's
    /// default value).
    pub fn provider_default<H: HostAdapter>(&self, children: impl Into<Renderable<H>>) -> VNode<H> {
        let mut props = Props::new();
        props.insert(
            "default".into(),
            PropValue::Context(Rc::new(Concrete(self.default.clone()))),
        );
        VNode {
            node_type: NodeType::ContextProvider(self.id),
            key: Key::None,
            props,
            children: children.into(),
        }
    }
}

/// Resolve the value a `ContextProvider` vnode carries: `"value"` if present,
/// else `"default"`.
pub(crate) fn erased_value_from_props<H: HostAdapter>(
    props: &Props<H>,
) -> Rc<dyn ErasedContextValue> {
    let entry = props.get("value").or_else(|| props.get("default"));
    match entry {
        Some(PropValue::Context(v)) => v.clone(),
        _ => panic!("ContextProvider vnode missing both `value` and `default`"),
    }
}

/// Live state for one mounted `ContextProvider`. Subscribers are component ids
/// paired with their schedule callback so a value
/// change can notify each subscribing component without the provider knowing
/// anything about the tree shape.
pub struct ContextProviderState {
    pub context_id: ContextId,
    value: RefCell<Rc<dyn ErasedContextValue>>,
    subscribers: RefCell<Vec<(usize, Rc<dyn Fn()>)>>,
}

impl ContextProviderState {
    pub(crate) fn new(context_id: ContextId, initial: Rc<dyn ErasedContextValue>) -> Self {
        ContextProviderState {
            context_id,
            value: RefCell::new(initial),
            subscribers: RefCell::new(Vec::new()),
        }
    }

    /// Update the live value, notifying subscribers only if it actually changed.
    pub(crate) fn set_value(&self, next: Rc<dyn ErasedContextValue>) {
        let changed = !self.value.borrow().eq_erased(next.as_ref());
        *self.value.borrow_mut() = next;
        if changed {
            for (_, notify) in self.subscribers.borrow().iter() {
                notify();
            }
        }
    }

    pub(crate) fn current<T: Clone + 'static>(&self) -> Option<T> {
        self.value.borrow().as_any().downcast_ref::<T>().cloned()
    }

    pub(crate) fn subscribe(&self, subscriber: usize, notify: Rc<dyn Fn()>) {
        let mut subs = self.subscribers.borrow_mut();
        if !subs.iter().any(|(id, _)| *id == subscriber) {
            subs.push((subscriber, notify));
        }
    }

    pub(crate) fn unsubscribe(&self, subscriber: usize) {
        self.subscribers.borrow_mut().retain(|(id, _)| *id != subscriber);
    }
}

/// What the reconciler makes available to a component's render call so hooks can
/// reach outside their own `HookState` — specifically, so `use_context` can walk
/// ancestors for a matching provider without the hook machinery knowing anything
/// about the component tree's storage.
#[derive(Clone)]
pub(crate) struct RenderCtx {
    pub component_id: usize,
    pub find_provider: Rc<dyn Fn(ContextId) -> Option<Rc<ContextProviderState>>>,
}

thread_local! {
    static RENDER_CTX: RefCell<Vec<RenderCtx>> = RefCell::new(Vec::new());
}

pub(crate) fn with_render_ctx<R>(ctx: RenderCtx, f: impl FnOnce() -> R) -> R {
    RENDER_CTX.with(|s| s.borrow_mut().push(ctx));
    struct Guard;
    impl Drop for Guard {
        fn drop(&mut self) {
            RENDER_CTX.with(|s| {
                s.borrow_mut().pop();
            });
        }
    }
    let _guard = Guard;
    f()
}

pub(crate) fn current_render_ctx() -> Option<RenderCtx> {
    RENDER_CTX.with(|s| s.borrow().last().cloned())
}

pub(crate) fn find_provider_for(ctx: &RenderCtx, id: ContextId) -> Option<Rc<ContextProviderState>> {
    (ctx.find_provider)(id)
}
