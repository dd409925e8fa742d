#[path = "support/fake_host.rs"]
mod fake_host;

use std::cell::RefCell;
use std::rc::Rc;

use fake_host::TestHost;
use reconciler_core::{create_component, create_element, error_boundary, render, HostAdapter, Props, Renderable, Root};

fn new_root() -> Root<TestHost> {
    let container = TestHost.create_element("root", false);
    Root::new(TestHost, container)
}

fn exploding_child(_: &()) -> Renderable<TestHost> {
    panic!("boom")
}

#[test]
fn panic_is_caught_by_nearest_ancestor_boundary() {
    thread_local! {
        static CAUGHT: RefCell<Option<String>> = RefCell::new(None);
    }

    let handler: Rc<dyn Fn(Rc<dyn std::any::Any + Send>)> = Rc::new(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "<unknown panic>".to_string());
        CAUGHT.with(|cell| *cell.borrow_mut() = Some(message));
    });

    let mut root = new_root();
    render(
        &mut root,
        error_boundary(handler, create_component(exploding_child, (), "Exploding")),
    );

    CAUGHT.with(|cell| assert_eq!(cell.borrow().as_deref(), Some("boom")));
    assert!(root.unhandled.is_empty());
}

#[test]
fn panic_with_no_boundary_reaches_root_unhandled() {
    let mut root = new_root();
    render(&mut root, create_component(exploding_child, (), "Exploding"));

    assert_eq!(root.unhandled.len(), 1);
    assert_eq!(root.unhandled[0].component, "Exploding");
}

#[test]
fn sibling_outside_boundary_is_unaffected_by_sibling_panic() {
    let mut root = new_root();
    let tree = create_element::<TestHost>(
        "div",
        Props::new(),
        Renderable::from(vec![
            error_boundary(Rc::new(|_| {}), create_component(exploding_child, (), "Exploding")).into(),
            create_element::<TestHost>("span", Props::new(), "ok").into(),
        ]),
    );
    render(&mut root, tree);

    assert_eq!(root.container().to_markup(), "<root><div><span>ok</span></div></root>");
}
