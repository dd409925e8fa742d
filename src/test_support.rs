//! An in-memory host adapter used only by this crate's own tests (both the
//! `#[cfg(test)]` unit tests scattered through `src/` and the integration
//! suite under `tests/`) — no browser, no real DOM, just enough of a tree to
//! assert markup and ordering against.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::{Rc, Weak};

use crate::host::HostAdapter;
use crate::vnode::{Props, PropValue};

#[derive(Clone)]
pub struct TestNode(Rc<RefCell<NodeData>>);

impl PartialEq for TestNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

struct NodeData {
    parent: Option<Weak<RefCell<NodeData>>>,
    kind: NodeKind,
}

enum NodeKind {
    Element {
        tag: Box<str>,
        attrs: Vec<(Box<str>, String)>,
        children: Vec<TestNode>,
    },
    Text(String),
}

impl TestNode {
    /// A depth-first HTML-ish rendering, attributes sorted by insertion order,
    /// useful for `assert_eq!` against an expected markup string in tests.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        match &self.0.borrow().kind {
            NodeKind::Text(s) => out.push_str(s),
            NodeKind::Element { tag, attrs, children } => {
                let _ = write!(out, "<{tag}");
                for (k, v) in attrs {
                    let _ = write!(out, " {k}=\"{v}\"");
                }
                out.push('>');
                for child in children {
                    child.write_markup(out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    pub fn child_count(&self) -> usize {
        match &self.0.borrow().kind {
            NodeKind::Element { children, .. } => children.len(),
            NodeKind::Text(_) => 0,
        }
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) {
        match &self.0.borrow().kind {
            NodeKind::Text(s) => out.push_str(s),
            NodeKind::Element { children, .. } => {
                for child in children {
                    child.write_text(out);
                }
            }
        }
    }
}

/// Whether `node` is already `parent`'s child immediately following `after`
/// (or, when `after` is `None`, already the first child) — lets `insert`
/// behave as the no-op `place_after` relies on instead of always detaching
/// and reinserting.
fn already_positioned(parent: &TestNode, node: &TestNode, after: Option<&TestNode>) -> bool {
    let pdata = parent.0.borrow();
    let NodeKind::Element { children, .. } = &pdata.kind else {
        return false;
    };
    let Some(idx) = children.iter().position(|c| c == node) else {
        return false;
    };
    match after {
        None => idx == 0,
        Some(a) => idx > 0 && &children[idx - 1] == a,
    }
}

fn detach(node: &TestNode) {
    let parent = node.0.borrow_mut().parent.take();
    if let Some(weak) = parent {
        if let Some(parent_rc) = weak.upgrade() {
            if let NodeKind::Element { children, .. } = &mut parent_rc.borrow_mut().kind {
                children.retain(|c| !Rc::ptr_eq(&c.0, &node.0));
            }
        }
    }
}

/// Render a single prop down to the attribute string the markup dump shows.
/// `ref`/`key` never reach here (`key` is lifted off by `take_key`, `ref` is
/// filtered below); handlers, refs, and opaque/context values carry no
/// printable host representation.
fn render_attr<H: HostAdapter>(value: &PropValue<H>) -> Option<String> {
    match value {
        PropValue::Text(s) => Some(s.to_string()),
        PropValue::Number(n) => Some(crate::vnode::format_number(*n)),
        PropValue::Bool(b) => Some(b.to_string()),
        PropValue::Handler(_) | PropValue::NodeRef(_) | PropValue::Any(_) | PropValue::Context(_) => None,
    }
}

pub struct TestHost;

impl HostAdapter for TestHost {
    type Node = TestNode;

    fn create_element(&self, tag: &str, _svg: bool) -> Self::Node {
        TestNode(Rc::new(RefCell::new(NodeData {
            parent: None,
            kind: NodeKind::Element {
                tag: tag.into(),
                attrs: Vec::new(),
                children: Vec::new(),
            },
        })))
    }

    fn create_text_node(&self, data: &str) -> Self::Node {
        TestNode(Rc::new(RefCell::new(NodeData {
            parent: None,
            kind: NodeKind::Text(data.to_string()),
        })))
    }

    fn set_text(&self, node: &Self::Node, data: &str) {
        if let NodeKind::Text(s) = &mut node.0.borrow_mut().kind {
            *s = data.to_string();
        }
    }

    fn apply_props(&self, node: &Self::Node, prev: &Props<Self>, next: &Props<Self>) {
        let mut data = node.0.borrow_mut();
        let NodeKind::Element { attrs, .. } = &mut data.kind else {
            return;
        };
        for key in prev.keys() {
            if key.as_ref() == "ref" || !next.contains_key(key) {
                attrs.retain(|(k, _)| k.as_ref() != key.as_ref());
            }
        }
        for (key, value) in next.iter() {
            if key.as_ref() == "ref" {
                continue;
            }
            match render_attr(value) {
                Some(rendered) => match attrs.iter_mut().find(|(k, _)| k.as_ref() == key.as_ref()) {
                    Some(slot) => slot.1 = rendered,
                    None => attrs.push((key.clone(), rendered)),
                },
                None => attrs.retain(|(k, _)| k.as_ref() != key.as_ref()),
            }
        }
    }

    fn insert(&self, parent: &Self::Node, node: &Self::Node, after: Option<&Self::Node>) {
        if already_positioned(parent, node, after) {
            return;
        }
        detach(node);
        {
            let mut pdata = parent.0.borrow_mut();
            let NodeKind::Element { children, .. } = &mut pdata.kind else {
                panic!("cannot insert into a text node");
            };
            let pos = match after {
                None => 0,
                Some(a) => children.iter().position(|c| c == a).map(|i| i + 1).unwrap_or(children.len()),
            };
            children.insert(pos.min(children.len()), node.clone());
        }
        node.0.borrow_mut().parent = Some(Rc::downgrade(&parent.0));
    }

    fn remove(&self, node: &Self::Node) {
        detach(node);
    }
}
