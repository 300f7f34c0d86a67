//! Counter demo: an `App` with a heading and a `Counter` whose effect mirrors
//! the count into a window title. Rendered into an in-memory host and driven
//! by scripted clicks.

use std::cell::RefCell;

use fibril_core::{Cleanup, Component, Element, Event, HookContext, Props};
use fibril_runtime_std::StdRuntime;
use fibril_testing::{NodeHandle, RecordingHost};

const DEFAULT_TITLE: &str = "Mini React App";

thread_local! {
    static TITLE: RefCell<String> = RefCell::new(DEFAULT_TITLE.to_string());
}

fn set_title(title: String) {
    log::info!("title -> {title:?}");
    TITLE.with(|slot| *slot.borrow_mut() = title);
}

fn current_title() -> String {
    TITLE.with(|slot| slot.borrow().clone())
}

fn counter(cx: &mut HookContext<'_>, _: &Props) -> Element {
    let (count, set_count) = cx.use_state_value(0i64);

    cx.use_effect(Some(count), move || {
        set_title(format!("Count: {count}"));
        Cleanup::new(|| set_title(DEFAULT_TITLE.to_string()))
    });

    let decrement = set_count.clone();
    Element::host("div")
        .child(Element::host("p").child(format!("Count: {count}")))
        .child(
            Element::host("button")
                .on("Click", move |_| set_count.update(|n| n + 1))
                .child("Increment"),
        )
        .child(
            Element::host("button")
                .on("Click", move |_| decrement.update(|n| n - 1))
                .child("Decrement"),
        )
}

fn app(_: &mut HookContext<'_>, _: &Props) -> Element {
    Element::host("div")
        .prop("className", "app")
        .child(Element::host("h1").child("React Framework"))
        .child(Element::component(COUNTER))
}

const COUNTER: Component = Component::new("Counter", counter);
const APP: Component = Component::new("App", app);

fn click(runtime: &StdRuntime<RecordingHost>, root: NodeHandle, label: &str) {
    let handlers = runtime.with_host(|host| {
        host.find_all(root, "button")
            .into_iter()
            .find(|button| host.text_content(*button) == label)
            .map(|button| host.handlers(button, "click"))
            .unwrap_or_default()
    });
    if handlers.is_empty() {
        log::warn!("no button labelled {label:?}");
    }
    let event = Event::new("click");
    for handler in handlers {
        handler.call(&event);
    }
}

fn report(runtime: &StdRuntime<RecordingHost>, root: NodeHandle) {
    let ops = runtime.with_host(RecordingHost::take_ops);
    println!("host ops: {}", ops.len());
    for op in &ops {
        println!("  {op}");
    }
    println!("title: {}", current_title());
    print!("{}", runtime.with_host(|host| host.dump_tree(Some(root))));
}

fn main() {
    env_logger::init();

    println!("=== Fibril Counter Demo ===");

    let mut host = RecordingHost::new();
    let root = host.create_container("#root");
    let runtime = StdRuntime::new(host, root);

    runtime.render(Element::component(APP));
    match runtime.run_until_idle() {
        Some(summary) => println!("initial commit: {} effects", summary.effects().len()),
        None => log::error!("initial render did not commit"),
    }
    report(&runtime, root);

    for label in ["Increment", "Increment", "Decrement"] {
        println!("\n-- click {label} --");
        click(&runtime, root, label);
        runtime.run_until_idle();
        report(&runtime, root);
    }

    println!("\n-- unmount --");
    runtime.render(Element::host("p").child("Goodbye"));
    runtime.run_until_idle();
    report(&runtime, root);
}
