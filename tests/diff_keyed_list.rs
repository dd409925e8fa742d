#[path = "support/fake_host.rs"]
mod fake_host;

use std::rc::Rc;

use fake_host::TestHost;
use reconciler_core::vnode::VNode;
use reconciler_core::{create_element, render, HostAdapter, Props, PropValue, Renderable, Root};

fn new_root() -> Root<TestHost> {
    let container = TestHost.create_element("root", false);
    Root::new(TestHost, container)
}

fn li(key: &str, text: &str) -> VNode<TestHost> {
    let mut props = Props::new();
    props.insert("key".into(), PropValue::Text(Rc::from(key)));
    create_element::<TestHost>("li", props, text)
}

fn list(items: Vec<VNode<TestHost>>) -> VNode<TestHost> {
    let children: Vec<Renderable<TestHost>> = items.into_iter().map(Into::into).collect();
    create_element::<TestHost>("ul", Props::new(), Renderable::from(children))
}

#[test]
fn keyed_reorder_preserves_and_repositions() {
    let mut root = new_root();
    render(&mut root, list(vec![li("a", "A"), li("b", "B"), li("c", "C")]));
    assert_eq!(
        root.container().to_markup(),
        "<root><ul><li>A</li><li>B</li><li>C</li></ul></root>"
    );

    render(&mut root, list(vec![li("c", "C"), li("a", "A"), li("b", "B")]));
    assert_eq!(
        root.container().to_markup(),
        "<root><ul><li>C</li><li>A</li><li>B</li></ul></root>"
    );
}

#[test]
fn keyed_insertion_and_removal() {
    let mut root = new_root();
    render(&mut root, list(vec![li("a", "A"), li("b", "B")]));

    render(&mut root, list(vec![li("a", "A"), li("z", "Z"), li("b", "B")]));
    assert_eq!(
        root.container().to_markup(),
        "<root><ul><li>A</li><li>Z</li><li>B</li></ul></root>"
    );

    render(&mut root, list(vec![li("z", "Z")]));
    assert_eq!(root.container().to_markup(), "<root><ul><li>Z</li></ul></root>");
}

#[test]
fn unkeyed_children_match_positionally() {
    let mut root = new_root();
    let unkeyed = |text: &str| create_element::<TestHost>("li", Props::new(), text);
    render(
        &mut root,
        create_element::<TestHost>(
            "ul",
            Props::new(),
            Renderable::from(vec![unkeyed("one").into(), unkeyed("two").into()]),
        ),
    );
    assert_eq!(root.container().to_markup(), "<root><ul><li>one</li><li>two</li></ul></root>");

    render(
        &mut root,
        create_element::<TestHost>(
            "ul",
            Props::new(),
            Renderable::from(vec![unkeyed("ONE").into(), unkeyed("TWO").into(), unkeyed("THREE").into()]),
        ),
    );
    assert_eq!(
        root.container().to_markup(),
        "<root><ul><li>ONE</li><li>TWO</li><li>THREE</li></ul></root>"
    );
}
