#[path = "support/fake_host.rs"]
mod fake_host;

use std::cell::RefCell;

use fake_host::TestHost;
use reconciler_core::hooks::Setter;
use reconciler_core::{act, create_component, create_context, create_element, render, use_context, use_state, ContextHandle, HostAdapter, Props, Renderable, Root};

fn new_root() -> Root<TestHost> {
    let container = TestHost.create_element("root", false);
    Root::new(TestHost, container)
}

thread_local! {
    static COUNTER_CTX: ContextHandle<i32> = create_context(0i32);
}

fn consumer(_: &()) -> Renderable<TestHost> {
    let value = COUNTER_CTX.with(|ctx| use_context(ctx));
    create_element::<TestHost>("span", Props::new(), value.to_string()).into()
}

#[test]
fn provider_value_overrides_default() {
    let mut root = new_root();
    let tree = COUNTER_CTX.with(|ctx| ctx.provider(42, create_component(consumer, (), "Consumer")));
    render(&mut root, tree);
    assert_eq!(root.container().to_markup(), "<root><span>42</span></root>");
}

#[test]
fn consumer_without_provider_falls_back_to_default() {
    let mut root = new_root();
    render(&mut root, create_component(consumer, (), "Consumer"));
    assert_eq!(root.container().to_markup(), "<root><span>0</span></root>");
}

#[test]
fn provider_value_change_renotifies_subscribed_consumer() {
    thread_local! {
        static SETTER: RefCell<Option<Setter<i32>>> = RefCell::new(None);
    }

    fn provider_host(_: &()) -> Renderable<TestHost> {
        let (value, set_value) = use_state(|| 1i32);
        SETTER.with(|cell| *cell.borrow_mut() = Some(set_value));
        COUNTER_CTX.with(|ctx| ctx.provider(value, create_component(consumer, (), "Consumer")).into())
    }

    let mut root = new_root();
    render(&mut root, create_component(provider_host, (), "ProviderHost"));
    assert_eq!(root.container().to_markup(), "<root><span>1</span></root>");

    act(&mut root, |_| {
        SETTER.with(|cell| {
            if let Some(set) = cell.borrow().as_ref() {
                set.set(99);
            }
        });
    });

    assert_eq!(root.container().to_markup(), "<root><span>99</span></root>");
}
