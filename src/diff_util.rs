//! Small pure helpers shared by the hook machinery and the reconciler.

use crate::host::HostAdapter;
use crate::vnode::{Props, Renderable};

/// Shallow-equal on a prop bag: same length, every key present in both with `===`
/// (here, [`crate::vnode::PropValue`]'s `PartialEq`) values. Used by [`crate::memo`]
/// and by bail-out checks that compare a whole props snapshot at once.
pub fn shallow_equal<H: HostAdapter>(a: &Props<H>, b: &Props<H>) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|(k, v)| b.get(k) == Some(v))
}

/// Pairwise dependency-array comparison. Rust's static typing replaces a
/// heterogeneous deps array with a single `D: PartialEq` tuple type per call
/// site; this is a thin, explicitly-named wrapper over that comparison.
pub fn deps_equal<D: PartialEq>(a: &D, b: &D) -> bool {
    a == b
}

/// Flatten nested children into a single ordered sequence with `Empty` entries
/// dropped.
pub fn flatten_children<H: HostAdapter>(children: &Renderable<H>) -> Vec<Renderable<H>> {
    let mut out = Vec::new();
    flatten_into(children, &mut out);
    out
}

fn flatten_into<H: HostAdapter>(node: &Renderable<H>, out: &mut Vec<Renderable<H>>) {
    match node {
        Renderable::Empty => {}
        Renderable::List(items) => {
            for item in items.iter() {
                flatten_into(item, out);
            }
        }
        other => out.push(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestHost;
    use crate::vnode::{create_host_element, PropValue};
    use std::rc::Rc;

    #[test]
    fn shallow_equal_detects_value_and_length_changes() {
        let mut a: Props<TestHost> = Props::new();
        a.insert("x".into(), PropValue::Number(1.0));
        let mut b = a.clone();
        assert!(shallow_equal(&a, &b));

        b.insert("x".into(), PropValue::Number(2.0));
        assert!(!shallow_equal(&a, &b));

        b.insert("y".into(), PropValue::Bool(true));
        a.insert("x".into(), PropValue::Number(2.0));
        assert!(!shallow_equal(&a, &b));
    }

    #[test]
    fn flatten_drops_empty_and_splices_lists() {
        let leaf: Renderable<TestHost> =
            create_host_element::<TestHost>("span", Props::new(), Renderable::Empty).into();
        let nested = Renderable::List(Rc::from(vec![
            Renderable::Empty,
            leaf.clone(),
            Renderable::List(Rc::from(vec![Renderable::Text(Rc::from("hi")), Renderable::Empty])),
        ]));
        let flat = flatten_children(&nested);
        assert_eq!(flat.len(), 2);
        assert!(matches!(flat[0], Renderable::Node(_)));
        assert!(matches!(flat[1], Renderable::Text(_)));
    }

    #[test]
    fn deps_equal_wraps_partial_eq() {
        assert!(deps_equal(&(1, "a"), &(1, "a")));
        assert!(!deps_equal(&(1, "a"), &(1, "b")));
    }
}
