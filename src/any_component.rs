//! Type-erased storage for user function components: a component is a
//! `fn(&P) -> Renderable<H>` plus a `P` value, stored behind a trait object so
//! the reconciler's tree is homogeneous.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use crate::host::HostAdapter;
use crate::vnode::{Key, NodeType, Props, Renderable, VNode};

/// The outcome of invoking a component's render function. A caught panic is
/// the only way Rust can observe a user-code exception, so it becomes part of
/// the result here rather than an ambient side channel.
pub enum RenderOutcome<H: HostAdapter> {
    Rendered(Renderable<H>),
    Panicked(Box<dyn Any + Send>),
}

/// Type-erased component instance: one per mounted `Component` vnode's lifetime.
/// `render` always re-reads `self`'s currently-stored props (there is exactly one
/// live instance per vnode generation; the reconciler swaps it out wholesale on
/// type-match update after an optional memo check — see `reconciler.rs`).
pub trait AnyComponent<H: HostAdapter> {
    /// Invoke the underlying function with this instance's stored props,
    /// catching any panic from the user-supplied render call.
    fn render(&self) -> RenderOutcome<H>;

    /// Diagnostic name, used only in panic messages and log lines.
    fn name(&self) -> &'static str;

    /// Is `other` the same function pointer (same component identity) as `self`?
    /// Used by the reconciler's "same type" check.
    fn is_same_component(&self, other: &dyn AnyComponent<H>) -> bool;

    /// Given `other` is known to be `is_same_component`, should re-render be
    /// skipped because props are unchanged? Always `false` unless constructed via
    /// [`memo`].
    fn props_unchanged(&self, other: &dyn AnyComponent<H>) -> bool;

    fn clone_rc(&self) -> Rc<dyn AnyComponent<H>>;

    fn as_any(&self) -> &dyn Any;
}

struct Typed<H: HostAdapter, P> {
    render_fn: fn(&P) -> Renderable<H>,
    props: P,
    name: &'static str,
    memoized: bool,
    eq: Option<fn(&P, &P) -> bool>,
}

impl<H: HostAdapter, P: Clone + 'static> AnyComponent<H> for Typed<H, P> {
    fn render(&self) -> RenderOutcome<H> {
        let f = self.render_fn;
        let props = &self.props;
        match catch_unwind(AssertUnwindSafe(|| f(props))) {
            Ok(rendered) => RenderOutcome::Rendered(rendered),
            Err(payload) => RenderOutcome::Panicked(coerce_send(payload)),
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn is_same_component(&self, other: &dyn AnyComponent<H>) -> bool {
        match other.as_any().downcast_ref::<Typed<H, P>>() {
            Some(o) => self.render_fn as usize == o.render_fn as usize,
            None => false,
        }
    }

    fn props_unchanged(&self, other: &dyn AnyComponent<H>) -> bool {
        if !self.memoized {
            return false;
        }
        let eq = match self.eq {
            Some(eq) => eq,
            None => return false,
        };
        match other.as_any().downcast_ref::<Typed<H, P>>() {
            Some(o) => eq(&self.props, &o.props),
            None => false,
        }
    }

    fn clone_rc(&self) -> Rc<dyn AnyComponent<H>> {
        Rc::new(Typed {
            render_fn: self.render_fn,
            props: self.props.clone(),
            name: self.name,
            memoized: self.memoized,
            eq: self.eq,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `Box<dyn Any + Send>` is what `catch_unwind` hands back; our payloads are
/// never actually sent across threads (the whole model is single-threaded), so
/// this widening is just a type-system formality to satisfy `catch_unwind`'s
/// bound, matching what `any_props.rs` does at its own catch site.
fn coerce_send(payload: Box<dyn Any + 'static>) -> Box<dyn Any + Send> {
    struct Wrap(Box<dyn Any>);
    unsafe impl Send for Wrap {}
    Box::new(Wrap(payload)) as Box<dyn Any + Send>
}

/// Build a plain (never memoized) component vnode's type-erased payload.
pub fn component<H, P>(
    render_fn: fn(&P) -> Renderable<H>,
    props: P,
    name: &'static str,
) -> Rc<dyn AnyComponent<H>>
where
    H: HostAdapter,
    P: Clone + 'static,
{
    Rc::new(Typed {
        render_fn,
        props,
        name,
        memoized: false,
        eq: None,
    })
}

fn wrap<H: HostAdapter>(instance: Rc<dyn AnyComponent<H>>) -> VNode<H> {
    VNode {
        node_type: NodeType::Component(instance),
        key: Key::None,
        props: Props::new(),
        children: Renderable::Empty,
    }
}

/// `createElement(Component, props)` for a user function
/// component, as opposed to a host tag.
pub fn create_component_element<H, P>(render_fn: fn(&P) -> Renderable<H>, props: P, name: &'static str) -> VNode<H>
where
    H: HostAdapter,
    P: Clone + 'static,
{
    wrap(component(render_fn, props, name))
}

/// A component function wrapped by [`crate::memo`]. Re-render is skipped when a
/// type-match update's incoming props compare equal to the previous props.
pub struct Memoized<H: HostAdapter, P> {
    pub(crate) render_fn: fn(&P) -> Renderable<H>,
}

/// `memo(Component)`: wrap a component so an update is skipped whenever
/// its new props compare equal (via `PartialEq`) to its previous ones.
pub fn memo<H, P>(render_fn: fn(&P) -> Renderable<H>) -> Memoized<H, P>
where
    H: HostAdapter,
    P: PartialEq + Clone + 'static,
{
    Memoized { render_fn }
}

impl<H: HostAdapter, P: PartialEq + Clone + 'static> Memoized<H, P> {
    fn instance(&self, props: P, name: &'static str) -> Rc<dyn AnyComponent<H>> {
        Rc::new(Typed {
            render_fn: self.render_fn,
            props,
            name,
            memoized: true,
            eq: Some(PartialEq::eq),
        })
    }

    /// `createElement(memo(Component), props)`.
    pub fn create_element(&self, props: P, name: &'static str) -> VNode<H> {
        wrap(self.instance(props, name))
    }
}
