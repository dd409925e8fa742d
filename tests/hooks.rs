#[path = "support/fake_host.rs"]
mod fake_host;

use std::cell::RefCell;
use std::rc::Rc;

use fake_host::TestHost;
use reconciler_core::hooks::Setter;
use reconciler_core::{act, create_component, create_element, render, use_effect, use_ref, use_state, HostAdapter, Props, Renderable, Root};

fn new_root() -> Root<TestHost> {
    let container = TestHost.create_element("root", false);
    Root::new(TestHost, container)
}

#[test]
fn use_state_rerenders_on_setter_call() {
    thread_local! {
        static SETTER: RefCell<Option<Setter<i32>>> = RefCell::new(None);
    }

    fn render_fn(_: &()) -> Renderable<TestHost> {
        SETTER.with(|cell| {
            let (count, set_count) = use_state(|| 0i32);
            *cell.borrow_mut() = Some(set_count);
            create_element::<TestHost>("span", Props::new(), count.to_string()).into()
        })
    }

    let mut root = new_root();
    render(&mut root, create_component(render_fn, (), "Counter"));
    assert_eq!(root.container().to_markup(), "<root><span>0</span></root>");

    act(&mut root, |_| {
        SETTER.with(|cell| {
            if let Some(set) = cell.borrow().as_ref() {
                set.set(5);
            }
        });
    });

    assert_eq!(root.container().to_markup(), "<root><span>5</span></root>");
}

#[test]
fn use_state_setter_accepts_a_functional_updater() {
    thread_local! {
        static SETTER: RefCell<Option<Setter<i32>>> = RefCell::new(None);
    }

    fn render_fn(_: &()) -> Renderable<TestHost> {
        SETTER.with(|cell| {
            let (count, set_count) = use_state(|| 0i32);
            *cell.borrow_mut() = Some(set_count);
            create_element::<TestHost>("span", Props::new(), count.to_string()).into()
        })
    }

    let mut root = new_root();
    render(&mut root, create_component(render_fn, (), "Counter"));

    act(&mut root, |_| {
        SETTER.with(|cell| {
            if let Some(set) = cell.borrow().as_ref() {
                set.update(|c| c + 1);
                set.update(|c| c + 1);
            }
        });
    });

    assert_eq!(root.container().to_markup(), "<root><span>2</span></root>");
}

#[test]
fn use_ref_identity_is_stable_across_renders() {
    thread_local! {
        static SEEN_PTRS: RefCell<Vec<usize>> = RefCell::new(Vec::new());
        static SETTER: RefCell<Option<Setter<i32>>> = RefCell::new(None);
    }

    fn render_fn(_: &()) -> Renderable<TestHost> {
        let cell = use_ref(|| 0i32);
        SEEN_PTRS.with(|seen| seen.borrow_mut().push(Rc::as_ptr(&cell) as usize));
        let (count, set_count) = use_state(|| 0i32);
        SETTER.with(|s| *s.borrow_mut() = Some(set_count));
        create_element::<TestHost>("span", Props::new(), count.to_string()).into()
    }

    let mut root = new_root();
    render(&mut root, create_component(render_fn, (), "RefHolder"));
    act(&mut root, |_| {
        SETTER.with(|cell| {
            if let Some(set) = cell.borrow().as_ref() {
                set.set(1);
            }
        });
    });

    SEEN_PTRS.with(|seen| {
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], seen[1]);
    });
}

#[test]
fn use_effect_runs_after_commit_and_cleans_up_on_unmount() {
    thread_local! {
        static LOG: RefCell<Vec<&'static str>> = RefCell::new(Vec::new());
    }

    fn render_fn(_: &()) -> Renderable<TestHost> {
        use_effect(
            || {
                LOG.with(|log| log.borrow_mut().push("mounted"));
                Some(Box::new(|| LOG.with(|log| log.borrow_mut().push("cleaned"))) as Box<dyn FnOnce()>)
            },
            Some(()),
        );
        create_element::<TestHost>("span", Props::new(), "hi").into()
    }

    let mut root = new_root();
    act(&mut root, |root| render(root, create_component(render_fn, (), "Effectful")));
    LOG.with(|log| assert_eq!(*log.borrow(), vec!["mounted"]));

    root.unmount();
    LOG.with(|log| assert_eq!(*log.borrow(), vec!["mounted", "cleaned"]));
}
