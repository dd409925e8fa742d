#[path = "support/fake_host.rs"]
mod fake_host;

use std::rc::Rc;

use fake_host::TestHost;
use reconciler_core::{create_element, render, HostAdapter, Props, PropValue, Renderable, Root};

fn new_root() -> Root<TestHost> {
    let container = TestHost.create_element("root", false);
    Root::new(TestHost, container)
}

#[test]
fn mount_renders_attributes_and_text() {
    let mut root = new_root();
    let mut props = Props::new();
    props.insert("class".into(), PropValue::Text(Rc::from("a")));
    let el = create_element::<TestHost>("div", props, "hi");
    render(&mut root, el);

    assert_eq!(root.container().to_markup(), "<root><div class=\"a\">hi</div></root>");
}

#[test]
fn update_diffs_attributes_in_place() {
    let mut root = new_root();

    let mut props = Props::new();
    props.insert("class".into(), PropValue::Text(Rc::from("a")));
    render(&mut root, create_element::<TestHost>("div", props, Renderable::Empty));
    let first_div = root.container().to_markup();
    assert_eq!(first_div, "<root><div class=\"a\"></div></root>");

    let mut props = Props::new();
    props.insert("class".into(), PropValue::Text(Rc::from("b")));
    props.insert("id".into(), PropValue::Text(Rc::from("x")));
    render(&mut root, create_element::<TestHost>("div", props, Renderable::Empty));

    assert_eq!(
        root.container().to_markup(),
        "<root><div class=\"b\" id=\"x\"></div></root>"
    );
}

#[test]
fn type_mismatch_remounts() {
    let mut root = new_root();
    render(&mut root, create_element::<TestHost>("div", Props::new(), Renderable::Empty));
    assert_eq!(root.container().to_markup(), "<root><div></div></root>");

    render(&mut root, create_element::<TestHost>("span", Props::new(), Renderable::Empty));
    assert_eq!(root.container().to_markup(), "<root><span></span></root>");
}
