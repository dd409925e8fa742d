#![doc = include_str!("../README.md")]

//! Renderer-agnostic reconciler core: vnodes, hooks, context, diffing, and
//! the root scheduler. A `HostAdapter` implementation is the only thing a
//! concrete renderer needs to supply.

pub(crate) mod any_component;
pub(crate) mod component;
pub mod context;
pub(crate) mod diff_util;
pub mod host;
pub mod hooks;
pub(crate) mod reconciler;
pub mod scheduler;
pub mod test_support;
pub mod vnode;

pub use any_component::{create_component_element as create_component, memo, Memoized};
pub use component::ComponentId;
pub use context::{create_context, ContextHandle};
pub use diff_util::flatten_children as to_child_array;
pub use host::HostAdapter;
pub use hooks::{use_callback, use_context, use_effect, use_layout_effect, use_memo, use_reducer, use_ref, use_state};
pub use scheduler::{Root, UnhandledPanic};
pub use vnode::{
    create_error_boundary as error_boundary, create_fragment as fragment, create_host_element as create_element,
    create_ref, is_valid_element, Key, NodeRef, NodeType, PropValue, Props, Renderable,
};

/// `render(element, container)`: build or re-render a tree into an
/// existing [`Root`].
pub fn render<H: HostAdapter>(root: &mut Root<H>, element: vnode::VNode<H>) {
    root.render(element);
}

/// `unmountComponentAtNode(container)`.
pub fn unmount<H: HostAdapter>(root: &mut Root<H>) {
    root.unmount();
}

/// `act(callback)`: drains updates, layout effects, and
/// post-commit effects once every nested call has returned.
pub fn act<H: HostAdapter, R>(root: &mut Root<H>, f: impl FnOnce(&mut Root<H>) -> R) -> R {
    root.act(f)
}

/// `act(async callback)`: same as [`act`], but the drain waits for the
/// returned future to settle first.
pub fn act_async<H: HostAdapter, R, Fut>(root: &mut Root<H>, f: impl FnOnce(&mut Root<H>) -> Fut) -> R
where
    Fut: std::future::Future<Output = R>,
{
    root.act_async(f)
}
