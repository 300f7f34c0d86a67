use super::*;
use crate::hooks::HookContext;

fn empty(_: &mut HookContext<'_>, _: &Props) -> Element {
    Element::host("div")
}

fn other(_: &mut HookContext<'_>, _: &Props) -> Element {
    Element::host("span")
}

#[test]
fn create_element_wraps_primitive_children_in_text_nodes() {
    let element = create_element(
        "div",
        [("id", PropValue::from("main"))],
        vec![Element::from("hello"), Element::from(42i64), Element::host("p")],
    );

    assert_eq!(element.kind(), &ElementKind::Host("div".into()));
    assert_eq!(element.props().str("id"), Some("main"));
    let kinds: Vec<_> = element.children().iter().map(|c| c.kind().label()).collect();
    assert_eq!(kinds, ["#text", "#text", "p"]);
    assert_eq!(element.children()[0].props().str(TEXT_VALUE_PROP), Some("hello"));
    assert_eq!(element.children()[1].props().str(TEXT_VALUE_PROP), Some("42"));
    assert!(element.children()[2].children().is_empty());
}

#[test]
fn text_elements_have_no_children() {
    let text = Element::text("Count: 0");
    assert_eq!(text.kind(), &ElementKind::Text);
    assert!(text.children().is_empty());
    assert_eq!(text.props().len(), 1);
}

#[test]
fn props_keep_declaration_order() {
    let element = Element::host("input")
        .prop("value", "x")
        .prop("type", "text")
        .prop("autofocus", true);
    let names: Vec<_> = element.props().iter().map(|(name, _)| name).collect();
    assert_eq!(names, ["value", "type", "autofocus"]);
}

#[test]
fn builders_do_not_touch_shared_clones() {
    let base = Element::host("div").prop("id", "a");
    let extended = base.clone().prop("id", "b").child("x");
    assert_eq!(base.props().str("id"), Some("a"));
    assert!(base.children().is_empty());
    assert_eq!(extended.props().str("id"), Some("b"));
    assert_eq!(extended.children().len(), 1);
}

#[test]
fn on_stores_handler_under_event_prop() {
    let element = Element::host("button").on("Click", |_| {});
    let value = element.props().get("onClick").expect("handler prop");
    assert!(value.as_handler().is_some());
    assert_eq!(event_name("onClick").as_deref(), Some("click"));
    assert_eq!(event_name("on"), None);
    assert_eq!(event_name("title"), None);
}

#[test]
fn prop_values_compare_strictly() {
    assert_eq!(PropValue::from(1i64), PropValue::Int(1));
    assert_ne!(PropValue::from(1i64), PropValue::from("1"));
    assert_ne!(PropValue::Int(1), PropValue::Float(1.0));

    let handler = EventHandler::new(|_| {});
    assert_eq!(
        PropValue::Handler(handler.clone()),
        PropValue::Handler(handler)
    );
    assert_ne!(
        PropValue::Handler(EventHandler::new(|_| {})),
        PropValue::Handler(EventHandler::new(|_| {}))
    );
}

#[test]
fn components_compare_by_render_function() {
    let a = Component::new("A", empty);
    let renamed = Component::new("Renamed", empty);
    let b = Component::new("B", other);

    assert_eq!(a, renamed);
    assert_ne!(a, b);
    assert_eq!(ElementKind::from(a), ElementKind::Component(renamed));
    assert_eq!(Element::from(b).kind().label(), "<B>");
}

#[test]
fn event_carries_optional_detail() {
    let event = Event::new("input").with_detail("abc");
    assert_eq!(&*event.name, "input");
    assert_eq!(event.detail, Some(PropValue::from("abc")));
}
