use super::*;
use crate::element::{Element, ElementKind};

fn host(tag: &str) -> FiberKind {
    FiberKind::Element(ElementKind::Host(tag.into()))
}

/// root
/// └─ div
///    ├─ h1
///    │  └─ #text
///    └─ p
fn sample() -> (FiberTree<&'static str>, [FiberId; 4]) {
    let mut tree = FiberTree::with_root("container", Rc::new(Props::new()), None);
    let div = tree.push(Fiber::new(host("div"), Rc::new(Props::new()), Some(FiberId::ROOT)));
    let h1 = tree.push(Fiber::new(host("h1"), Rc::new(Props::new()), Some(div)));
    let text_props = Element::text("hi").props().clone();
    let text = tree.push(Fiber::new(
        FiberKind::Element(ElementKind::Text),
        Rc::new(text_props),
        Some(h1),
    ));
    let p = tree.push(Fiber::new(host("p"), Rc::new(Props::new()), Some(div)));

    tree.get_mut(FiberId::ROOT).child = Some(div);
    tree.get_mut(div).child = Some(h1);
    tree.get_mut(h1).child = Some(text);
    tree.get_mut(h1).sibling = Some(p);
    tree.get_mut(div).handle = Some("div");
    (tree, [div, h1, text, p])
}

#[test]
fn next_unit_walks_depth_first() {
    let (tree, [div, h1, text, p]) = sample();
    assert_eq!(tree.next_unit(FiberId::ROOT), Some(div));
    assert_eq!(tree.next_unit(div), Some(h1));
    assert_eq!(tree.next_unit(h1), Some(text));
    assert_eq!(tree.next_unit(text), Some(p));
    assert_eq!(tree.next_unit(p), None);
}

#[test]
fn preorder_matches_next_unit_chain() {
    let (tree, _) = sample();
    let mut chain = vec![FiberId::ROOT];
    while let Some(next) = tree.next_unit(*chain.last().unwrap()) {
        chain.push(next);
    }
    assert_eq!(tree.preorder().collect::<Vec<_>>(), chain);
    assert_eq!(chain.len(), tree.len());
}

#[test]
fn host_parent_skips_fibers_without_handles() {
    let (tree, [div, h1, text, p]) = sample();
    assert_eq!(tree.host_parent(div), Some(&"container"));
    assert_eq!(tree.host_parent(h1), Some(&"div"));
    // h1 has no handle in this fixture.
    assert_eq!(tree.host_parent(text), Some(&"div"));
    assert_eq!(tree.host_parent(p), Some(&"div"));
    assert_eq!(tree.host_parent(FiberId::ROOT), None);
}

#[test]
fn children_iterates_siblings() {
    let (tree, [div, h1, _, p]) = sample();
    assert_eq!(tree.children(div).collect::<Vec<_>>(), [h1, p]);
    assert_eq!(tree.children(p).count(), 0);
}

#[test]
fn settle_clears_tags_and_alternates() {
    let (mut tree, [div, ..]) = sample();
    tree.get_mut(div).tag = EffectTag::Placement;
    tree.get_mut(div).alternate = Some(FiberId::ROOT);
    tree.settle();
    assert!(tree.preorder().all(|id| tree.get(id).tag() == EffectTag::None));
    assert_eq!(tree.get(div).alternate(), None);
}

#[test]
fn dump_outlines_tree() {
    let (mut tree, [_, h1, ..]) = sample();
    tree.get_mut(h1).tag = EffectTag::Update;
    assert_eq!(
        tree.dump(),
        "[0] #root\n  [1] div\n    [2] h1 (Update)\n      [3] #text \"hi\"\n    [4] p\n"
    );
}

#[test]
fn fiber_kind_matching() {
    assert!(host("div").matches(&ElementKind::Host("div".into())));
    assert!(!host("div").matches(&ElementKind::Text));
    assert!(!FiberKind::Root.matches(&ElementKind::Host("div".into())));
    assert!(!host("div").is_component());
    assert_eq!(FiberId(3).to_string(), "#3");
}
