//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides concrete implementations of the platform
//! abstraction traits defined in `fibril-core`. Applications can
//! construct a [`StdRuntime`] around their host and pump it from their
//! event loop to render with wall-clock time slices.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use fibril_core::{
    CommitSummary, Deadline, Element, Host, Renderer, RendererConfig, SliceCallback, TimeSlicer,
};

/// Wall-clock budget granted to each slice unless configured otherwise.
pub const DEFAULT_SLICE_BUDGET: Duration = Duration::from_millis(8);

/// Deadline measured against [`Instant::now`].
#[derive(Debug, Clone, Copy)]
pub struct InstantDeadline {
    deadline: Instant,
}

impl InstantDeadline {
    pub fn after(budget: Duration) -> Self {
        Self::at(Instant::now() + budget)
    }

    pub fn at(deadline: Instant) -> Self {
        Self { deadline }
    }
}

impl Deadline for InstantDeadline {
    fn time_remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// Time slicer that queues requests until the owning event loop pumps it.
///
/// The slicer lives on the thread that owns the renderer. An event loop that
/// sleeps on another thread should forward the waker through its own proxy.
pub struct StdTimeSlicer {
    queue: RefCell<VecDeque<SliceCallback>>,
    budget: Duration,
    slice_requested: Cell<bool>,
    slice_waker: RefCell<Option<Rc<dyn Fn()>>>,
}

impl StdTimeSlicer {
    pub fn new() -> Self {
        Self::with_budget(DEFAULT_SLICE_BUDGET)
    }

    pub fn with_budget(budget: Duration) -> Self {
        Self {
            queue: RefCell::new(VecDeque::new()),
            budget,
            slice_requested: Cell::new(false),
            slice_waker: RefCell::new(None),
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.borrow().is_empty()
    }

    /// Returns whether a slice has been requested since the last call.
    pub fn take_slice_request(&self) -> bool {
        self.slice_requested.replace(false)
    }

    /// Registers a waker that will be invoked whenever a new slice is requested.
    pub fn set_slice_waker(&self, waker: impl Fn() + 'static) {
        *self.slice_waker.borrow_mut() = Some(Rc::new(waker));
    }

    /// Clears any registered slice waker.
    pub fn clear_slice_waker(&self) {
        *self.slice_waker.borrow_mut() = None;
    }

    /// Grants a fresh slice to every request queued when the call starts and
    /// returns how many ran. Requests made by those slices wait for the next
    /// call.
    pub fn run_pending(&self) -> usize {
        let batch: Vec<SliceCallback> = self.queue.borrow_mut().drain(..).collect();
        let count = batch.len();
        for callback in batch {
            callback(&InstantDeadline::after(self.budget));
        }
        count
    }

    /// Pumps until no request is left. Returns the number of slices granted.
    pub fn run_until_idle(&self) -> usize {
        let mut slices = 0;
        loop {
            let ran = self.run_pending();
            if ran == 0 {
                return slices;
            }
            slices += ran;
        }
    }

    fn wake(&self) {
        let waker = self.slice_waker.borrow().clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdTimeSlicer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdTimeSlicer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdTimeSlicer")
            .field("budget", &self.budget)
            .field("queued", &self.queue.borrow().len())
            .field("slice_requested", &self.slice_requested.get())
            .finish()
    }
}

impl TimeSlicer for StdTimeSlicer {
    fn request_time_slice(&self, callback: SliceCallback) {
        self.queue.borrow_mut().push_back(callback);
        self.slice_requested.set(true);
        self.wake();
    }
}

/// Convenience container bundling a renderer with the standard slicer.
pub struct StdRuntime<H: Host + 'static> {
    slicer: Rc<StdTimeSlicer>,
    renderer: Renderer<H>,
}

impl<H: Host + 'static> StdRuntime<H> {
    /// Creates a runtime rendering into `target` on `host`.
    pub fn new(host: H, target: H::Handle) -> Self {
        Self::with_config(host, target, DEFAULT_SLICE_BUDGET, RendererConfig::default())
    }

    pub fn with_config(
        host: H,
        target: H::Handle,
        budget: Duration,
        config: RendererConfig,
    ) -> Self {
        let slicer = Rc::new(StdTimeSlicer::with_budget(budget));
        let renderer = Renderer::with_config(host, target, slicer.clone(), config);
        Self { slicer, renderer }
    }

    pub fn render(&self, element: Element) {
        self.renderer.render(element);
    }

    /// Returns the renderer driven by this runtime.
    pub fn renderer(&self) -> &Renderer<H> {
        &self.renderer
    }

    /// Returns the slicer implementation.
    pub fn slicer(&self) -> Rc<StdTimeSlicer> {
        Rc::clone(&self.slicer)
    }

    /// Grants one round of slices; call once per event-loop iteration.
    pub fn pump(&self) -> usize {
        self.slicer.run_pending()
    }

    /// Pumps until the renderer has nothing left to do and returns the last
    /// commit, if any.
    pub fn run_until_idle(&self) -> Option<CommitSummary> {
        let slices = self.slicer.run_until_idle();
        log::debug!("settled after {slices} slices");
        self.renderer.last_commit()
    }

    pub fn with_host<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        self.renderer.with_host(f)
    }
}

impl<H: Host + 'static> fmt::Debug for StdRuntime<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("slicer", &self.slicer)
            .field("idle", &self.renderer.is_idle())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    use fibril_core::{Component, Deadline, Element, HookContext, Props, StateSetter};
    use fibril_testing::RecordingHost;

    use super::{InstantDeadline, StdRuntime, StdTimeSlicer};
    use fibril_core::TimeSlicer;

    thread_local! {
        static SETTER: std::cell::RefCell<Option<StateSetter<u32>>> =
            std::cell::RefCell::new(None);
    }

    fn counter(cx: &mut HookContext<'_>, _: &Props) -> Element {
        let (count, set_count) = cx.use_state_value(0u32);
        SETTER.with(|slot| *slot.borrow_mut() = Some(set_count));
        Element::host("p").child(format!("Count: {count}"))
    }

    const COUNTER: Component = Component::new("Counter", counter);

    #[test]
    fn instant_deadline_runs_out() {
        let expired = InstantDeadline::after(Duration::ZERO);
        assert_eq!(expired.time_remaining(), Duration::ZERO);
        let generous = InstantDeadline::after(Duration::from_secs(60));
        assert!(generous.time_remaining() > Duration::from_secs(1));
    }

    #[test]
    fn slicer_defers_and_wakes() {
        let slicer = StdTimeSlicer::with_budget(Duration::from_millis(2));
        let wakes = Rc::new(Cell::new(0));
        let counted = Rc::clone(&wakes);
        slicer.set_slice_waker(move || counted.set(counted.get() + 1));

        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        slicer.request_time_slice(Box::new(move |_: &dyn Deadline| flag.set(true)));

        assert!(!ran.get());
        assert!(slicer.take_slice_request());
        assert!(!slicer.take_slice_request());
        assert_eq!(wakes.get(), 1);
        assert_eq!(slicer.run_pending(), 1);
        assert!(ran.get());
        assert!(!slicer.has_pending());

        slicer.clear_slice_waker();
        slicer.request_time_slice(Box::new(|_: &dyn Deadline| {}));
        assert_eq!(wakes.get(), 1);
        assert!(slicer.take_slice_request());
    }

    #[test]
    fn std_runtime_renders_and_rerenders_on_state_change() {
        let mut host = RecordingHost::new();
        let root = host.create_container("#root");
        let runtime = StdRuntime::new(host, root);

        runtime.render(Element::component(COUNTER));
        assert!(runtime.slicer().take_slice_request());
        let summary = runtime.run_until_idle().expect("initial commit");
        assert!(!summary.is_empty());
        assert_eq!(runtime.with_host(|host| host.text_content(root)), "Count: 0");

        SETTER.with(|slot| slot.borrow().as_ref().expect("mounted").update(|n| n + 1));
        assert!(runtime.slicer().take_slice_request());
        runtime.run_until_idle();
        assert_eq!(runtime.with_host(|host| host.text_content(root)), "Count: 1");
        assert!(runtime.renderer().is_idle());
    }
}
