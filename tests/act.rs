#[path = "support/fake_host.rs"]
mod fake_host;

use std::cell::RefCell;

use fake_host::TestHost;
use reconciler_core::hooks::Setter;
use reconciler_core::{act, create_component, create_element, render, use_effect, use_state, HostAdapter, Props, Renderable, Root};

fn new_root() -> Root<TestHost> {
    let container = TestHost.create_element("root", false);
    Root::new(TestHost, container)
}

thread_local! {
    static SET_OUTER: RefCell<Option<Setter<i32>>> = RefCell::new(None);
    static SET_INNER: RefCell<Option<Setter<i32>>> = RefCell::new(None);
    static EFFECT_LOG: RefCell<Vec<i32>> = RefCell::new(Vec::new());
}

fn inner(_: &()) -> Renderable<TestHost> {
    let (value, set_value) = use_state(|| 0i32);
    SET_INNER.with(|cell| *cell.borrow_mut() = Some(set_value));
    use_effect(
        move || {
            EFFECT_LOG.with(|log| log.borrow_mut().push(value));
            None
        },
        Some(value),
    );
    create_element::<TestHost>("b", Props::new(), value.to_string()).into()
}

fn outer(_: &()) -> Renderable<TestHost> {
    let (value, set_value) = use_state(|| 0i32);
    SET_OUTER.with(|cell| *cell.borrow_mut() = Some(set_value));
    create_element::<TestHost>(
        "div",
        Props::new(),
        Renderable::from(vec![
            value.to_string().into(),
            create_component(inner, (), "Inner").into(),
        ]),
    )
    .into()
}

#[test]
fn nested_act_calls_flush_only_once_outermost_returns() {
    let mut root = new_root();
    act(&mut root, |root| render(root, create_component(outer, (), "Outer")));
    EFFECT_LOG.with(|log| assert_eq!(*log.borrow(), vec![0]));

    act(&mut root, |root| {
        act(root, |root| {
            SET_OUTER.with(|cell| cell.borrow().as_ref().unwrap().set(1));
            assert_eq!(root.container().to_markup(), "<root><div>0<b>0</b></div></root>");
        });
        assert_eq!(root.container().to_markup(), "<root><div>0<b>0</b></div></root>");
        SET_INNER.with(|cell| cell.borrow().as_ref().unwrap().set(2));
    });

    assert_eq!(root.container().to_markup(), "<root><div>1<b>2</b></div></root>");
    EFFECT_LOG.with(|log| assert_eq!(*log.borrow(), vec![0, 2]));
}

#[test]
fn act_returns_callback_value() {
    let mut root = new_root();
    render(&mut root, create_component(outer, (), "Outer"));
    let value = act(&mut root, |_| 7);
    assert_eq!(value, 7);
}
