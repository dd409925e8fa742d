//! Hook state machine. Hook cells live in an index-ordered vector
//! owned by the component; a cursor walks it on every render and is reset to zero
//! before the render function runs. Which cell is "current" is a process-global
//! scoped slot — a `thread_local!` push/pop stack holding a raw pointer to the
//! currently rendering component's `HookState` for the duration of its render
//! call only.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::context::ContextId;

pub(crate) const ERR_HOOK_MISMATCH: &str =
    "Hook type mismatch. Hooks must be called in same order on each render.";
pub(crate) const ERR_HOOK_OUTSIDE: &str = "Hook called outside of component";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum HookTag {
    State,
    Reducer,
    Ref,
    Memo,
    Callback,
    Effect,
    LayoutEffect,
    Context,
}

pub(crate) enum HookCell {
    State(Box<dyn Any>),
    Reducer(Box<dyn Any>),
    Ref(Box<dyn Any>),
    Memo(Box<dyn Any>, Box<dyn Any>),
    Callback(Box<dyn Any>, Box<dyn Any>),
    Effect(EffectCell),
    LayoutEffect(EffectCell),
    Context(ContextCell),
}

impl HookCell {
    fn tag(&self) -> HookTag {
        match self {
            HookCell::State(_) => HookTag::State,
            HookCell::Reducer(_) => HookTag::Reducer,
            HookCell::Ref(_) => HookTag::Ref,
            HookCell::Memo(..) => HookTag::Memo,
            HookCell::Callback(..) => HookTag::Callback,
            HookCell::Effect(_) => HookTag::Effect,
            HookCell::LayoutEffect(_) => HookTag::LayoutEffect,
            HookCell::Context(_) => HookTag::Context,
        }
    }
}

pub(crate) struct EffectCell {
    /// `None` means "no deps array" — runs on every render.
    pub deps: Option<Box<dyn Any>>,
    pub pending: Option<Box<dyn FnOnce() -> Option<Box<dyn FnOnce()>>>>,
    pub cleanup: Option<Box<dyn FnOnce()>>,
    pub dirty: bool,
}

pub(crate) struct ContextCell {
    pub context_id: ContextId,
    pub unsubscribe: Option<Box<dyn FnOnce()>>,
}

/// All hook cells belonging to one component instance, plus the render cursor.
pub struct HookState {
    pub(crate) cells: Vec<HookCell>,
    pub(crate) cursor: usize,
    /// Set by the scheduler's notify callback; hook setters call this to mark the
    /// owning component dirty without knowing anything about the tree they live in.
    pub(crate) schedule: Rc<dyn Fn()>,
}

impl HookState {
    pub(crate) fn new(schedule: Rc<dyn Fn()>) -> Self {
        HookState {
            cells: Vec::new(),
            cursor: 0,
            schedule,
        }
    }

    pub(crate) fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    fn next_cell(&mut self, tag: HookTag, make: impl FnOnce() -> HookCell) -> &mut HookCell {
        let idx = self.cursor;
        self.cursor += 1;
        if idx < self.cells.len() {
            if self.cells[idx].tag() != tag {
                panic!("{ERR_HOOK_MISMATCH}");
            }
        } else {
            debug_assert_eq!(idx, self.cells.len());
            self.cells.push(make());
        }
        &mut self.cells[idx]
    }
}

thread_local! {
    static STACK: RefCell<Vec<*mut HookState>> = RefCell::new(Vec::new());
}

/// Push `state` as the current hook state for the duration of `f`, restoring the
/// previous one on every exit path including unwind, even if `f` panics.
pub(crate) fn with_hook_scope<R>(state: &mut HookState, f: impl FnOnce() -> R) -> R {
    let ptr: *mut HookState = state;
    STACK.with(|s| s.borrow_mut().push(ptr));
    struct PopGuard;
    impl Drop for PopGuard {
        fn drop(&mut self) {
            STACK.with(|s| {
                s.borrow_mut().pop();
            });
        }
    }
    let _guard = PopGuard;
    f()
}

fn with_current<R>(f: impl FnOnce(&mut HookState) -> R) -> R {
    let ptr = STACK.with(|s| s.borrow().last().copied());
    match ptr {
        // Safety: `ptr` was pushed by `with_hook_scope` and is guaranteed live for
        // the entire dynamic extent of the call that pushed it (the guard pops it
        // on every exit, including unwind, before the borrow could dangle), and
        // rendering is strictly single-threaded and non-reentrant on the same
        // component, so no other code observes `*ptr` concurrently.
        Some(ptr) => f(unsafe { &mut *ptr }),
        None => panic!("{ERR_HOOK_OUTSIDE}"),
    }
}

/// A `use_state` setter. `.set(value)` replaces the state outright;
/// `.update(f)` applies `f` to the current value and stores the result —
/// the functional-updater form. Stable Rust can't dispatch a single call
/// signature on "is the argument a plain value or a function", so the two
/// forms are separate methods rather than one overloaded call operator.
pub struct Setter<T> {
    slot: Rc<RefCell<T>>,
    schedule: Rc<dyn Fn()>,
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Setter {
            slot: self.slot.clone(),
            schedule: self.schedule.clone(),
        }
    }
}

impl<T: 'static> Setter<T> {
    /// Store `value` as the state for the next render.
    pub fn set(&self, value: T) {
        *self.slot.borrow_mut() = value;
        (self.schedule)();
    }

    /// Store the result of applying `f` to the current value.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.slot.borrow());
        *self.slot.borrow_mut() = next;
        (self.schedule)();
    }
}

/// `useState`. Returns the current value and a setter that schedules
/// an update and stores the new value for the *next* render.
pub fn use_state<T: Clone + 'static>(initial: impl FnOnce() -> T) -> (T, Setter<T>) {
    with_current(|hs| {
        let schedule = hs.schedule.clone();
        let cell = hs.next_cell(HookTag::State, || HookCell::State(Box::new(Rc::new(RefCell::new(initial())) as Rc<RefCell<T>>)));
        let slot = match cell {
            HookCell::State(b) => b
                .downcast_ref::<Rc<RefCell<T>>>()
                .expect("hook type mismatch at runtime")
                .clone(),
            _ => unreachable!(),
        };
        let current = slot.borrow().clone();
        let setter = Setter { slot, schedule };
        (current, setter)
    })
}

/// `useReducer`. `dispatch` only schedules a re-render when the reducer
/// actually produces a new value (compared by equality, standing in for
/// `Object.is`) — dispatching an action that leaves the state unchanged
/// is a no-op.
pub fn use_reducer<S: Clone + PartialEq + 'static, A: 'static>(
    reducer: fn(&S, A) -> S,
    initial: impl FnOnce() -> S,
) -> (S, impl Fn(A) + Clone) {
    with_current(|hs| {
        let schedule = hs.schedule.clone();
        let cell = hs.next_cell(HookTag::Reducer, || {
            HookCell::Reducer(Box::new(Rc::new(RefCell::new(initial())) as Rc<RefCell<S>>))
        });
        let slot = match cell {
            HookCell::Reducer(b) => b
                .downcast_ref::<Rc<RefCell<S>>>()
                .expect("hook type mismatch at runtime")
                .clone(),
            _ => unreachable!(),
        };
        let current = slot.borrow().clone();
        let dispatch_slot = slot.clone();
        let dispatch = move |action: A| {
            let next = {
                let cur = dispatch_slot.borrow();
                reducer(&cur, action)
            };
            let changed = next != *dispatch_slot.borrow();
            if changed {
                *dispatch_slot.borrow_mut() = next;
                (schedule)();
            }
        };
        (current, dispatch)
    })
}

/// `useRef`: a mutable cell whose identity is stable across renders
/// and whose writes never schedule a re-render.
pub fn use_ref<T: 'static>(initial: impl FnOnce() -> T) -> Rc<RefCell<T>> {
    with_current(|hs| {
        let cell = hs.next_cell(HookTag::Ref, || {
            HookCell::Ref(Box::new(Rc::new(RefCell::new(initial()))))
        });
        match cell {
            HookCell::Ref(b) => b
                .downcast_ref::<Rc<RefCell<T>>>()
                .expect("hook type mismatch at runtime")
                .clone(),
            _ => unreachable!(),
        }
    })
}

/// `useMemo`: recomputes only when `deps` compares unequal to the
/// previous call's deps (or on first render).
pub fn use_memo<T: Clone + 'static, D: PartialEq + Clone + 'static>(
    compute: impl FnOnce() -> T,
    deps: D,
) -> T {
    with_current(|hs| {
        let idx = hs.cursor;
        hs.cursor += 1;
        if idx < hs.cells.len() {
            if hs.cells[idx].tag() != HookTag::Memo {
                panic!("{ERR_HOOK_MISMATCH}");
            }
            let recompute = match &hs.cells[idx] {
                HookCell::Memo(_, prev_deps) => prev_deps
                    .downcast_ref::<D>()
                    .map(|p| p != &deps)
                    .unwrap_or(true),
                _ => unreachable!(),
            };
            if recompute {
                hs.cells[idx] = HookCell::Memo(Box::new(compute()), Box::new(deps));
            }
        } else {
            hs.cells.push(HookCell::Memo(Box::new(compute()), Box::new(deps)));
        }
        match &hs.cells[idx] {
            HookCell::Memo(value, _) => value
                .downcast_ref::<T>()
                .expect("hook type mismatch at runtime")
                .clone(),
            _ => unreachable!(),
        }
    })
}

/// `useCallback(f, deps)`: `useMemo(|| f, deps)` specialized to
/// closures, identical semantics, kept as its own entry point per spec's external
/// interface list.
pub fn use_callback<F: Clone + 'static, D: PartialEq + Clone + 'static>(callback: F, deps: D) -> F {
    with_current(|hs| {
        let idx = hs.cursor;
        hs.cursor += 1;
        if idx < hs.cells.len() {
            if hs.cells[idx].tag() != HookTag::Callback {
                panic!("{ERR_HOOK_MISMATCH}");
            }
            let replace = match &hs.cells[idx] {
                HookCell::Callback(_, prev_deps) => prev_deps
                    .downcast_ref::<D>()
                    .map(|p| p != &deps)
                    .unwrap_or(true),
                _ => unreachable!(),
            };
            if replace {
                hs.cells[idx] = HookCell::Callback(Box::new(callback.clone()), Box::new(deps));
            }
        } else {
            hs.cells
                .push(HookCell::Callback(Box::new(callback.clone()), Box::new(deps)));
        }
        match &hs.cells[idx] {
            HookCell::Callback(value, _) => value
                .downcast_ref::<F>()
                .expect("hook type mismatch at runtime")
                .clone(),
            _ => unreachable!(),
        }
    })
}

fn use_effect_impl<D: PartialEq + Clone + 'static>(
    body: impl FnOnce() -> Option<Box<dyn FnOnce()>> + 'static,
    deps: Option<D>,
    tag: HookTag,
) {
    with_current(|hs| {
        let idx = hs.cursor;
        hs.cursor += 1;
        let deps_box: Option<Box<dyn Any>> = deps.clone().map(|d| Box::new(d) as Box<dyn Any>);
        let should_run = if idx < hs.cells.len() {
            let existing_tag = hs.cells[idx].tag();
            if existing_tag != tag {
                panic!("{ERR_HOOK_MISMATCH}");
            }
            let existing = match &hs.cells[idx] {
                HookCell::Effect(c) | HookCell::LayoutEffect(c) => c,
                _ => unreachable!(),
            };
            match (&deps, existing.deps.as_ref()) {
                (None, _) => true,
                (Some(d), Some(prev)) => prev
                    .downcast_ref::<D>()
                    .map(|p| p != d)
                    .unwrap_or(true),
                (Some(_), None) => true,
            }
        } else {
            true
        };

        if should_run {
            let new_cell = EffectCell {
                deps: deps_box,
                pending: Some(Box::new(body)),
                cleanup: None,
                dirty: true,
            };
            let wrapped = match tag {
                HookTag::Effect => HookCell::Effect(new_cell),
                HookTag::LayoutEffect => HookCell::LayoutEffect(new_cell),
                _ => unreachable!(),
            };
            if idx < hs.cells.len() {
                hs.cells[idx] = wrapped;
            } else {
                hs.cells.push(wrapped);
            }
        } else if idx >= hs.cells.len() {
            unreachable!("should_run is always true on first render");
        }
    })
}

/// `useEffect`: scheduled to run after paint (post-commit phase).
pub fn use_effect<D: PartialEq + Clone + 'static>(
    body: impl FnOnce() -> Option<Box<dyn FnOnce()>> + 'static,
    deps: Option<D>,
) {
    use_effect_impl(body, deps, HookTag::Effect);
}

/// `useLayoutEffect`: runs synchronously after host mutations, before
/// paint.
pub fn use_layout_effect<D: PartialEq + Clone + 'static>(
    body: impl FnOnce() -> Option<Box<dyn FnOnce()>> + 'static,
    deps: Option<D>,
) {
    use_effect_impl(body, deps, HookTag::LayoutEffect);
}

pub(crate) fn current_cursor_hook_count() -> usize {
    with_current(|hs| hs.cells.len())
}

/// `useContext`. Walks ancestors (via the reconciler-supplied
/// render context) for the nearest `ContextProvider` matching `ctx`'s id,
/// subscribing this component to future value changes; falls back to the
/// context's default value if no provider is found.
pub fn use_context<T: Clone + 'static>(ctx: &crate::context::ContextHandle<T>) -> T {
    let (idx, schedule, prev_unsub) = with_current(|hs| {
        let idx = hs.cursor;
        hs.cursor += 1;
        if idx < hs.cells.len() {
            if hs.cells[idx].tag() != HookTag::Context {
                panic!("{ERR_HOOK_MISMATCH}");
            }
        } else {
            hs.cells.push(HookCell::Context(ContextCell {
                context_id: ctx.id,
                unsubscribe: None,
            }));
        }
        let prev_unsub = match &mut hs.cells[idx] {
            HookCell::Context(cell) => cell.unsubscribe.take(),
            _ => unreachable!(),
        };
        (idx, hs.schedule.clone(), prev_unsub)
    });
    if let Some(unsub) = prev_unsub {
        unsub();
    }

    let render_ctx = crate::context::current_render_ctx();
    let found = render_ctx.and_then(|rc| {
        crate::context::find_provider_for(&rc, ctx.id).map(|provider| (rc.component_id, provider))
    });

    match found {
        Some((component_id, provider)) => {
            provider.subscribe(component_id, schedule);
            let value = provider.current::<T>().unwrap_or_else(|| ctx.default.clone());
            let provider_for_unsub = provider.clone();
            with_current(|hs| {
                if let HookCell::Context(cell) = &mut hs.cells[idx] {
                    cell.unsubscribe = Some(Box::new(move || {
                        provider_for_unsub.unsubscribe(component_id)
                    }));
                }
            });
            value
        }
        None => ctx.default.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_mismatch_panics_with_exact_message() {
        let schedule: Rc<dyn Fn()> = Rc::new(|| {});
        let mut hs = HookState::new(schedule);
        with_hook_scope(&mut hs, || {
            let _ = use_state(|| 1i32);
        });
        hs.reset_cursor();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            with_hook_scope(&mut hs, || {
                let _ = use_ref(|| 1i32);
            });
        }));
        assert!(result.is_err());
        let payload = result.unwrap_err();
        let msg = payload.downcast_ref::<&str>().copied().unwrap_or("");
        assert_eq!(msg, ERR_HOOK_MISMATCH);
    }

    #[test]
    fn hook_outside_component_panics() {
        let result = std::panic::catch_unwind(|| {
            let _ = use_state(|| 1i32);
        });
        assert!(result.is_err());
    }
}
