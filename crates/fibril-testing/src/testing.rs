use std::rc::Rc;

use fibril_core::{CommitSummary, Element, Event, Renderer, RendererConfig};

use crate::host::{HostOp, NodeHandle, RecordingHost};
use crate::slicer::ManualSlicer;

/// Headless harness for driving a renderer in tests.
///
/// `TestRenderer` owns a [`RecordingHost`] with a `#root` container and a
/// [`ManualSlicer`], so tests decide exactly when and how much work runs.
pub struct TestRenderer {
    slicer: Rc<ManualSlicer>,
    renderer: Renderer<RecordingHost>,
    container: NodeHandle,
}

impl TestRenderer {
    pub fn new() -> Self {
        Self::with_config(RendererConfig::default())
    }

    pub fn with_config(config: RendererConfig) -> Self {
        let mut host = RecordingHost::new();
        let container = host.create_container("#root");
        let slicer = Rc::new(ManualSlicer::new());
        let renderer = Renderer::with_config(host, container, slicer.clone(), config);
        Self {
            slicer,
            renderer,
            container,
        }
    }

    /// Schedules `element` without running any work.
    pub fn render(&self, element: Element) {
        self.renderer.render(element);
    }

    /// Schedules `element` and runs until idle.
    pub fn mount(&self, element: Element) {
        self.render(element);
        self.run_until_idle();
    }

    pub fn run_until_idle(&self) -> usize {
        self.slicer.run_until_idle()
    }

    /// Grants one slice allowing `units` units of work.
    pub fn step(&self, units: usize) -> bool {
        self.slicer.grant_units(units)
    }

    pub fn renderer(&self) -> &Renderer<RecordingHost> {
        &self.renderer
    }

    pub fn slicer(&self) -> &ManualSlicer {
        &self.slicer
    }

    pub fn container(&self) -> NodeHandle {
        self.container
    }

    pub fn is_idle(&self) -> bool {
        self.renderer.is_idle()
    }

    pub fn last_commit(&self) -> Option<CommitSummary> {
        self.renderer.last_commit()
    }

    pub fn with_host<R>(&self, f: impl FnOnce(&mut RecordingHost) -> R) -> R {
        self.renderer.with_host(f)
    }

    pub fn take_ops(&self) -> Vec<HostOp> {
        self.with_host(RecordingHost::take_ops)
    }

    pub fn text_content(&self) -> String {
        self.with_host(|host| host.text_content(self.container))
    }

    pub fn find(&self, tag: &str) -> Option<NodeHandle> {
        self.with_host(|host| host.find(self.container, tag))
    }

    pub fn dump_host(&self) -> String {
        self.with_host(|host| host.dump_tree(Some(self.container)))
    }

    pub fn dump_fibers(&self) -> String {
        self.renderer.dump_tree()
    }

    /// Delivers `event` to every handler registered on `node` for it and
    /// returns how many ran. Handlers run outside the host borrow, so they may
    /// set state.
    pub fn dispatch(&self, node: NodeHandle, event: &Event) -> usize {
        let handlers = self.with_host(|host| host.handlers(node, &event.name));
        for handler in &handlers {
            handler.call(event);
        }
        handlers.len()
    }

    /// Dispatches a `click` to the first node with `tag`.
    pub fn click(&self, tag: &str) -> usize {
        match self.find(tag) {
            Some(node) => self.dispatch(node, &Event::new("click")),
            None => {
                log::warn!("no <{tag}> to click");
                0
            }
        }
    }
}

impl Default for TestRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `TestRenderer`.
pub fn run_test_render<R>(f: impl FnOnce(&TestRenderer) -> R) -> R {
    let renderer = TestRenderer::new();
    f(&renderer)
}

#[cfg(test)]
#[path = "tests/testing_tests.rs"]
mod tests;
