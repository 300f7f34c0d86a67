use super::*;
use crate::element::{Element, EventHandler};
use crate::hooks::{EffectTiming, UpdateHandle};
use crate::reconciler::{perform_unit_of_work, WorkContext};
use crate::test_support::LogHost;
use std::rc::Rc;

fn render_pass(
    host: &mut LogHost,
    current: Option<&FiberTree<usize>>,
    element: Element,
) -> (FiberTree<usize>, Vec<FiberId>) {
    let alternate = current.map(|_| FiberId::ROOT);
    let mut tree = FiberTree::with_root(0, Rc::new(Props::for_root(element)), alternate);
    let mut deletions = Vec::new();
    let mut pending = Vec::new();
    let updater = UpdateHandle::detached();
    let mut cx = WorkContext {
        host,
        current,
        wip: &mut tree,
        deletions: &mut deletions,
        pending_effects: &mut pending,
        updater: &updater,
        timing: EffectTiming::DuringRender,
    };
    let mut next = Some(FiberId::ROOT);
    while let Some(id) = next {
        next = perform_unit_of_work(&mut cx, id).expect("unit of work");
    }
    (tree, deletions)
}

/// Renders and commits `element`, returning the new current tree.
fn mount(
    host: &mut LogHost,
    current: Option<&FiberTree<usize>>,
    element: Element,
) -> (FiberTree<usize>, CommitSummary) {
    let (mut tree, deletions) = render_pass(host, current, element);
    let summary = commit_root(host, current, &mut tree, &deletions).expect("commit");
    (tree, summary)
}

#[test]
fn initial_commit_appends_in_preorder() {
    let mut host = LogHost::default();
    let (_, summary) = mount(
        &mut host,
        None,
        Element::host("div")
            .child(Element::host("h1").child("title"))
            .child(Element::host("p")),
    );

    let appends: Vec<_> = host
        .take()
        .into_iter()
        .filter(|line| line.starts_with("append"))
        .collect();
    assert_eq!(appends, ["append 0 1", "append 1 2", "append 2 3", "append 1 4"]);
    assert_eq!(summary.count(EffectTag::Placement), 4);
    assert_eq!(summary.count(EffectTag::Update), 0);
}

#[test]
fn identical_rerender_touches_nothing() {
    let mut host = LogHost::default();
    let app = || Element::host("div").prop("id", "x").child("same");
    let (first, _) = mount(&mut host, None, app());
    host.take();

    let (_, summary) = mount(&mut host, Some(&first), app());
    assert!(host.take().is_empty());
    assert_eq!(summary.tags(), [EffectTag::Update, EffectTag::Update]);
}

#[test]
fn update_diffs_properties() {
    let mut host = LogHost::default();
    let (first, _) = mount(
        &mut host,
        None,
        Element::host("div").prop("id", "a").prop("title", "t"),
    );
    host.take();

    mount(
        &mut host,
        Some(&first),
        Element::host("div").prop("id", "b").prop("hidden", true),
    );
    assert_eq!(host.take(), ["unset 1 title", "set 1 id=b", "set 1 hidden=true"]);
}

#[test]
fn deletions_run_before_placements() {
    let mut host = LogHost::default();
    let (first, _) = mount(
        &mut host,
        None,
        Element::host("div").child(Element::host("p")),
    );
    host.take();

    let (second, summary) = mount(
        &mut host,
        Some(&first),
        Element::host("div").child(Element::host("span")),
    );
    assert_eq!(host.take(), ["create span 3", "remove 1 2", "append 1 3"]);
    assert_eq!(
        summary.tags(),
        [EffectTag::Deletion, EffectTag::Update, EffectTag::Placement]
    );
    assert!(second.preorder().all(|id| second.get(id).tag() == EffectTag::None));
}

fn wrapper(_: &mut crate::hooks::HookContext<'_>, _: &Props) -> Element {
    Element::host("section").child("inner")
}

#[test]
fn deleting_component_removes_its_first_host_node() {
    let mut host = LogHost::default();
    let wrapped = crate::element::Component::new("Wrapper", wrapper);
    let (first, _) = mount(
        &mut host,
        None,
        Element::host("div").child(Element::component(wrapped)),
    );
    host.take();

    let (_, summary) = mount(&mut host, Some(&first), Element::host("div"));
    assert_eq!(host.take(), ["remove 1 2"]);
    assert_eq!(summary.effects()[0].fiber, "<Wrapper>");
}

#[test]
fn handlers_are_swapped_on_identity_change() {
    let mut host = LogHost::default();
    let shared = EventHandler::new(|_| {});
    let button = |handler: EventHandler| Element::host("button").prop("onClick", handler);

    let (first, _) = mount(&mut host, None, button(shared.clone()));
    assert!(host.take().contains(&"listen 1 click".to_string()));

    let (second, _) = mount(&mut host, Some(&first), button(shared));
    assert!(host.take().is_empty());

    mount(&mut host, Some(&second), button(EventHandler::new(|_| {})));
    assert_eq!(host.take(), ["unlisten 1 click", "listen 1 click"]);
}

#[test]
fn removed_handler_is_unregistered() {
    let mut host = LogHost::default();
    let (first, _) = mount(
        &mut host,
        None,
        Element::host("button").on("Click", |_| {}),
    );
    host.take();
    mount(&mut host, Some(&first), Element::host("button"));
    assert_eq!(host.take(), ["unlisten 1 click"]);
}

#[test]
fn apply_props_against_empty_sets_everything() {
    let mut host = LogHost::default();
    let next = Element::host("a").prop("href", "/").prop("tabindex", 2i64);
    apply_props(&mut host, &7, &Props::new(), next.props()).expect("apply");
    assert_eq!(host.take(), ["set 7 href=/", "set 7 tabindex=2"]);
}

#[test]
fn host_failure_surfaces_as_commit_error() {
    let mut host = LogHost::failing_append();
    let (mut tree, deletions) = render_pass(&mut host, None, Element::host("div"));
    let err = commit_root(&mut host, None, &mut tree, &deletions).unwrap_err();
    assert!(matches!(err, RenderError::Commit(HostError::NotAChild { .. })));
}
