use std::cell::{Cell, RefCell};
use std::mem;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::commit::{self, CommitSummary};
use crate::element::{Element, Props};
use crate::fiber::{FiberId, FiberTree};
use crate::hooks::{EffectTiming, PendingEffect, UpdateHandle, UpdateScheduler};
use crate::platform::{Deadline, Host, TimeSlicer};
use crate::reconciler::{self, WorkContext};

/// Tunables for a [`Renderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererConfig {
    /// The work loop yields once a slice has less than this much time left.
    pub yield_threshold: Duration,
    pub effect_timing: EffectTiming,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            yield_threshold: Duration::from_millis(1),
            effect_timing: EffectTiming::DuringRender,
        }
    }
}

struct RootState<N> {
    current: Option<FiberTree<N>>,
    wip: Option<FiberTree<N>>,
    deletions: Vec<FiberId>,
    next_unit: Option<FiberId>,
    pending_effects: Vec<PendingEffect>,
}

impl<N> RootState<N> {
    fn new() -> Self {
        Self {
            current: None,
            wip: None,
            deletions: Vec::new(),
            next_unit: None,
            pending_effects: Vec::new(),
        }
    }
}

struct RendererInner<H: Host> {
    this: Weak<RendererInner<H>>,
    config: RendererConfig,
    slicer: Rc<dyn TimeSlicer>,
    host: RefCell<H>,
    target: H::Handle,
    root: RefCell<RootState<H::Handle>>,
    pending_root: RefCell<Option<Element>>,
    update_requested: Cell<bool>,
    slice_requested: Cell<bool>,
    last_commit: RefCell<Option<CommitSummary>>,
}

impl<H: Host + 'static> RendererInner<H> {
    fn update_handle(&self) -> UpdateHandle {
        let weak: Weak<dyn UpdateScheduler> = self.this.clone();
        UpdateHandle::new(weak)
    }

    fn request_slice(&self) {
        if self.slice_requested.replace(true) {
            return;
        }
        let weak = self.this.clone();
        self.slicer.request_time_slice(Box::new(move |deadline: &dyn Deadline| {
            if let Some(inner) = weak.upgrade() {
                inner.work_loop(deadline);
            }
        }));
    }

    fn has_restart(&self) -> bool {
        self.pending_root.borrow().is_some()
            || (self.update_requested.get() && self.root.borrow().current.is_some())
    }

    fn has_pending_work(&self) -> bool {
        if self.has_restart() {
            return true;
        }
        let root = self.root.borrow();
        root.wip.is_some() || root.next_unit.is_some()
    }

    fn work_loop(&self, deadline: &dyn Deadline) {
        self.slice_requested.set(false);
        loop {
            self.start_pending_pass();
            let Some(unit) = self.root.borrow().next_unit else {
                break;
            };
            if let Err(err) = self.perform_unit(unit) {
                log::error!("render pass failed: {err}");
                self.abandon_pass();
                break;
            }
            if deadline.time_remaining() < self.config.yield_threshold {
                log::trace!("yielding after fiber {unit}");
                break;
            }
        }

        let finished = {
            let root = self.root.borrow();
            root.wip.is_some() && root.next_unit.is_none()
        };
        if finished && !self.has_restart() {
            self.commit();
        }
        if self.has_pending_work() {
            self.request_slice();
        }
    }

    /// Starts a new pass if a render or an update is waiting, discarding any
    /// uncommitted work-in-progress tree.
    fn start_pending_pass(&self) {
        let element = self.pending_root.borrow_mut().take();
        let (discarded, discarded_effects) = {
            let mut root = self.root.borrow_mut();
            let props = match element {
                Some(element) => {
                    self.update_requested.set(false);
                    Rc::new(Props::for_root(element))
                }
                None => match root.current.as_ref() {
                    Some(current) if self.update_requested.get() => {
                        self.update_requested.set(false);
                        Rc::clone(&current.root().props)
                    }
                    _ => return,
                },
            };
            let alternate = root.current.as_ref().map(|_| FiberId::ROOT);
            let fresh = FiberTree::with_root(self.target.clone(), props, alternate);
            let discarded = root.wip.replace(fresh);
            root.deletions.clear();
            root.next_unit = Some(FiberId::ROOT);
            (discarded, mem::take(&mut root.pending_effects))
        };
        drop(discarded_effects);
        if let Some(discarded) = discarded {
            log::debug!("superseding uncommitted render pass");
            self.release_uncommitted(&discarded);
        }
    }

    fn perform_unit(&self, unit: FiberId) -> Result<(), crate::RenderError> {
        let updater = self.update_handle();
        let mut root = self.root.borrow_mut();
        let RootState {
            current,
            wip,
            deletions,
            next_unit,
            pending_effects,
        } = &mut *root;
        let Some(wip) = wip.as_mut() else {
            *next_unit = None;
            return Ok(());
        };
        let mut host = self.host.borrow_mut();
        let mut cx = WorkContext {
            host: &mut *host,
            current: current.as_ref(),
            wip,
            deletions,
            pending_effects,
            updater: &updater,
            timing: self.config.effect_timing,
        };
        *next_unit = reconciler::perform_unit_of_work(&mut cx, unit)?;
        log::trace!("performed fiber {unit}");
        Ok(())
    }

    fn abandon_pass(&self) {
        let (wip, effects) = {
            let mut root = self.root.borrow_mut();
            root.next_unit = None;
            root.deletions.clear();
            (root.wip.take(), mem::take(&mut root.pending_effects))
        };
        drop(effects);
        if let Some(wip) = wip {
            self.release_uncommitted(&wip);
        }
    }

    fn release_uncommitted(&self, tree: &FiberTree<H::Handle>) {
        let mut host = self.host.borrow_mut();
        for handle in tree.placed_handles() {
            if let Err(err) = host.release_node(handle) {
                log::warn!("failed to release {handle:?}: {err}");
            }
        }
    }

    fn commit(&self) {
        let outcome = {
            let mut root = self.root.borrow_mut();
            let Some(mut wip) = root.wip.take() else {
                return;
            };
            let deletions = mem::take(&mut root.deletions);
            let effects = mem::take(&mut root.pending_effects);
            let result = {
                let mut host = self.host.borrow_mut();
                commit::commit_root(&mut *host, root.current.as_ref(), &mut wip, &deletions)
            };
            match result {
                Ok(summary) => {
                    let previous = root.current.replace(wip);
                    Ok((summary, previous, effects))
                }
                Err(err) => Err((err, wip, effects)),
            }
        };

        match outcome {
            Ok((summary, previous, effects)) => {
                log::debug!(
                    "committed {} effects ({} deletions)",
                    summary.effects().len(),
                    summary.count(crate::EffectTag::Deletion)
                );
                // Releases hook cells of unmounted components, running their cleanups.
                drop(previous);
                for effect in effects {
                    effect.run();
                }
                *self.last_commit.borrow_mut() = Some(summary);
            }
            Err((err, wip, effects)) => {
                log::error!("commit failed: {err}");
                drop(effects);
                drop(wip);
            }
        }
    }
}

// Setters may fire while a unit of work holds the root borrow, so this only
// touches cells and the slicer.
impl<H: Host + 'static> UpdateScheduler for RendererInner<H> {
    fn schedule_update(&self, component: &'static str) {
        log::trace!("update requested by `{component}`");
        self.update_requested.set(true);
        self.request_slice();
    }
}

/// Owns the root of one render target: the committed tree, the tree under
/// construction, and the host it is rendered into.
pub struct Renderer<H: Host + 'static> {
    inner: Rc<RendererInner<H>>,
}

impl<H: Host + 'static> Renderer<H> {
    pub fn new(host: H, target: H::Handle, slicer: Rc<dyn TimeSlicer>) -> Self {
        Self::with_config(host, target, slicer, RendererConfig::default())
    }

    pub fn with_config(
        host: H,
        target: H::Handle,
        slicer: Rc<dyn TimeSlicer>,
        config: RendererConfig,
    ) -> Self {
        let inner = Rc::new_cyclic(|this| RendererInner {
            this: this.clone(),
            config,
            slicer,
            host: RefCell::new(host),
            target,
            root: RefCell::new(RootState::new()),
            pending_root: RefCell::new(None),
            update_requested: Cell::new(false),
            slice_requested: Cell::new(false),
            last_commit: RefCell::new(None),
        });
        Self { inner }
    }

    /// Schedules `element` to be rendered into the target. The pass starts on
    /// the next granted slice and supersedes any pass still in flight.
    pub fn render(&self, element: Element) {
        *self.inner.pending_root.borrow_mut() = Some(element);
        self.inner.request_slice();
    }

    /// Re-renders the committed tree, as a state setter would.
    pub fn schedule_update(&self) {
        UpdateScheduler::schedule_update(&*self.inner, "<renderer>");
    }

    pub fn update_handle(&self) -> UpdateHandle {
        self.inner.update_handle()
    }

    pub fn config(&self) -> RendererConfig {
        self.inner.config
    }

    pub fn target(&self) -> &H::Handle {
        &self.inner.target
    }

    pub fn has_pending_work(&self) -> bool {
        self.inner.has_pending_work()
    }

    pub fn is_idle(&self) -> bool {
        !self.has_pending_work()
    }

    /// Whether a time slice has been requested and not yet granted.
    pub fn awaiting_slice(&self) -> bool {
        self.inner.slice_requested.get()
    }

    pub fn last_commit(&self) -> Option<CommitSummary> {
        self.inner.last_commit.borrow().clone()
    }

    /// Runs `f` with the host. Must not be called from inside a component or
    /// an effect while a pass is running.
    pub fn with_host<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        f(&mut self.inner.host.borrow_mut())
    }

    pub fn with_current_tree<R>(&self, f: impl FnOnce(Option<&FiberTree<H::Handle>>) -> R) -> R {
        f(self.inner.root.borrow().current.as_ref())
    }

    pub fn with_work_in_progress<R>(
        &self,
        f: impl FnOnce(Option<&FiberTree<H::Handle>>) -> R,
    ) -> R {
        f(self.inner.root.borrow().wip.as_ref())
    }

    pub fn dump_tree(&self) -> String {
        self.with_current_tree(|tree| match tree {
            Some(tree) => tree.dump(),
            None => "(nothing committed)\n".to_string(),
        })
    }
}

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod tests;
