//! Positional hooks for function components.
//!
//! A [`HookContext`] is bound to one component fiber for the duration of a
//! single render. Every hook call consumes the next slot of the fiber's
//! [`HookList`]; slots are matched by position only, so components must call
//! their hooks unconditionally and in a fixed order.
//!
//! Hook cells are reference counted and shared between a fiber and its
//! successor in the next pass. An effect's pending cleanup runs when its cell
//! is released, which happens once the owning component is unmounted.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};

/// When effects registered with [`HookContext::use_effect`] run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EffectTiming {
    /// Synchronously inside the render that reconciles the component.
    #[default]
    DuringRender,
    /// After the pass that rendered the component has been committed. Effects
    /// of a pass that gets superseded never run.
    AfterCommit,
}

/// Receives update requests from state setters.
pub trait UpdateScheduler {
    fn schedule_update(&self, component: &'static str);
}

/// Weak bridge from state setters back to the renderer that owns them.
#[derive(Clone, Default)]
pub struct UpdateHandle(Option<Weak<dyn UpdateScheduler>>);

impl UpdateHandle {
    pub fn new(scheduler: Weak<dyn UpdateScheduler>) -> Self {
        Self(Some(scheduler))
    }

    /// A handle wired to nothing; updates are reported and dropped.
    pub fn detached() -> Self {
        Self(None)
    }

    pub fn is_connected(&self) -> bool {
        self.0
            .as_ref()
            .map(|weak| weak.strong_count() > 0)
            .unwrap_or(false)
    }

    pub fn schedule_update(&self, component: &'static str) {
        match self.0.as_ref().and_then(Weak::upgrade) {
            Some(scheduler) => scheduler.schedule_update(component),
            None => log::error!(
                "no update scheduler found for `{component}`; state change will apply on its next render"
            ),
        }
    }
}

impl fmt::Debug for UpdateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateHandle")
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// A queued state change.
pub enum StateAction<T> {
    Replace(T),
    Update(Box<dyn FnOnce(&T) -> T>),
}

impl<T> StateAction<T> {
    fn apply(self, previous: &T) -> T {
        match self {
            StateAction::Replace(value) => value,
            StateAction::Update(update) => update(previous),
        }
    }
}

impl<T> fmt::Debug for StateAction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateAction::Replace(_) => f.write_str("Replace(..)"),
            StateAction::Update(_) => f.write_str("Update(..)"),
        }
    }
}

struct StateCell<T> {
    value: RefCell<T>,
    queue: RefCell<Vec<StateAction<T>>>,
}

impl<T: 'static> StateCell<T> {
    fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
            queue: RefCell::new(Vec::new()),
        }
    }

    /// Folds queued actions into the value in arrival order.
    fn drain_queue(&self) {
        loop {
            let actions = mem::take(&mut *self.queue.borrow_mut());
            if actions.is_empty() {
                return;
            }
            for action in actions {
                let next = action.apply(&self.value.borrow());
                *self.value.borrow_mut() = next;
            }
        }
    }
}

/// Setter returned by [`HookContext::use_state`]. Setting never mutates the
/// state directly: the action is queued and folded during the next render of
/// the owning component.
pub struct StateSetter<T> {
    cell: Rc<StateCell<T>>,
    updater: UpdateHandle,
    component: &'static str,
}

impl<T: 'static> StateSetter<T> {
    pub fn set(&self, value: T) {
        self.dispatch(StateAction::Replace(value));
    }

    pub fn update(&self, update: impl FnOnce(&T) -> T + 'static) {
        self.dispatch(StateAction::Update(Box::new(update)));
    }

    pub fn dispatch(&self, action: StateAction<T>) {
        self.cell.queue.borrow_mut().push(action);
        self.updater.schedule_update(self.component);
    }

    pub fn pending(&self) -> usize {
        self.cell.queue.borrow().len()
    }
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
            updater: self.updater.clone(),
            component: self.component,
        }
    }
}

impl<T> fmt::Debug for StateSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter")
            .field("component", &self.component)
            .finish()
    }
}

/// Cleanup returned by an effect. `()` converts into "no cleanup".
#[derive(Default)]
pub struct Cleanup(Option<Box<dyn FnOnce()>>);

impl Cleanup {
    pub fn new(cleanup: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(cleanup)))
    }

    pub fn none() -> Self {
        Self(None)
    }

    fn run(self) {
        if let Some(cleanup) = self.0 {
            cleanup();
        }
    }
}

impl From<()> for Cleanup {
    fn from(_: ()) -> Self {
        Cleanup::none()
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0.is_some() {
            "Cleanup(Some)"
        } else {
            "Cleanup(None)"
        })
    }
}

enum DepsSnapshot {
    /// The effect has never run.
    Unset,
    /// Last run had no dependency list.
    Untracked,
    Tracked(Box<dyn Any>),
}

impl DepsSnapshot {
    fn from_deps<D: 'static>(deps: Option<D>) -> Self {
        match deps {
            Some(deps) => DepsSnapshot::Tracked(Box::new(deps)),
            None => DepsSnapshot::Untracked,
        }
    }

    fn should_run<D: PartialEq + 'static>(&self, next: Option<&D>) -> bool {
        match (self, next) {
            (_, None) => true,
            (DepsSnapshot::Unset | DepsSnapshot::Untracked, _) => true,
            (DepsSnapshot::Tracked(previous), Some(next)) => previous
                .downcast_ref::<D>()
                .map(|previous| previous != next)
                .unwrap_or(true),
        }
    }
}

struct EffectCell {
    deps: RefCell<DepsSnapshot>,
    cleanup: RefCell<Cleanup>,
}

impl EffectCell {
    fn new() -> Self {
        Self {
            deps: RefCell::new(DepsSnapshot::Unset),
            cleanup: RefCell::new(Cleanup::none()),
        }
    }

    fn run(&self, effect: Box<dyn FnOnce() -> Cleanup>, deps: DepsSnapshot) {
        let previous = mem::take(&mut *self.cleanup.borrow_mut());
        previous.run();
        let cleanup = effect();
        *self.cleanup.borrow_mut() = cleanup;
        *self.deps.borrow_mut() = deps;
    }
}

impl Drop for EffectCell {
    fn drop(&mut self) {
        mem::take(self.cleanup.get_mut()).run();
    }
}

/// An effect deferred until its pass commits.
pub struct PendingEffect {
    cell: Rc<EffectCell>,
    effect: Box<dyn FnOnce() -> Cleanup>,
    deps: DepsSnapshot,
}

impl PendingEffect {
    pub fn run(self) {
        self.cell.run(self.effect, self.deps);
    }
}

impl fmt::Debug for PendingEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PendingEffect")
    }
}

#[derive(Clone)]
enum HookSlot {
    State(Rc<dyn Any>),
    Effect(Rc<EffectCell>),
}

impl HookSlot {
    fn kind(&self) -> &'static str {
        match self {
            HookSlot::State(_) => "state",
            HookSlot::Effect(_) => "effect",
        }
    }
}

/// The ordered hook slots of one component instance.
#[derive(Clone, Default)]
pub struct HookList {
    slots: Vec<HookSlot>,
}

impl HookList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl fmt::Debug for HookList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.slots.iter().map(HookSlot::kind))
            .finish()
    }
}

/// Hook access for one component invocation.
pub struct HookContext<'a> {
    component: &'static str,
    hooks: &'a mut HookList,
    cursor: usize,
    updater: UpdateHandle,
    timing: EffectTiming,
    pending: Vec<PendingEffect>,
}

impl<'a> HookContext<'a> {
    /// Binds a context to `hooks` with the cursor at the first slot.
    pub fn bind(
        component: &'static str,
        hooks: &'a mut HookList,
        updater: UpdateHandle,
        timing: EffectTiming,
    ) -> Self {
        Self {
            component,
            hooks,
            cursor: 0,
            updater,
            timing,
            pending: Vec::new(),
        }
    }

    /// A context with no renderer behind it: effects run during render and
    /// setters only queue.
    pub fn detached(component: &'static str, hooks: &'a mut HookList) -> Self {
        Self::bind(
            component,
            hooks,
            UpdateHandle::detached(),
            EffectTiming::DuringRender,
        )
    }

    pub fn component(&self) -> &'static str {
        self.component
    }

    /// Number of hooks consumed so far in this invocation.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the current state and its setter, initialising the slot with
    /// `init` on first use.
    pub fn use_state<T, F>(&mut self, init: F) -> (T, StateSetter<T>)
    where
        T: Clone + 'static,
        F: FnOnce() -> T,
    {
        let index = self.next_index();
        let existing = match self.hooks.slots.get(index) {
            Some(HookSlot::State(any)) => Rc::clone(any).downcast::<StateCell<T>>().ok(),
            _ => None,
        };
        let cell = match existing {
            Some(cell) => cell,
            None => {
                let cell = Rc::new(StateCell::new(init()));
                self.install(index, HookSlot::State(cell.clone()));
                cell
            }
        };
        cell.drain_queue();
        let value = cell.value.borrow().clone();
        let setter = StateSetter {
            cell,
            updater: self.updater.clone(),
            component: self.component,
        };
        (value, setter)
    }

    pub fn use_state_value<T>(&mut self, initial: T) -> (T, StateSetter<T>)
    where
        T: Clone + 'static,
    {
        self.use_state(move || initial)
    }

    /// Runs `effect` when `deps` changed since its last run, or on every render
    /// when `deps` is `None`. The previous cleanup runs first.
    pub fn use_effect<D, R, F>(&mut self, deps: Option<D>, effect: F)
    where
        D: PartialEq + 'static,
        R: Into<Cleanup>,
        F: FnOnce() -> R + 'static,
    {
        let index = self.next_index();
        let existing = match self.hooks.slots.get(index) {
            Some(HookSlot::Effect(cell)) => Some(Rc::clone(cell)),
            _ => None,
        };
        let cell = match existing {
            Some(cell) => cell,
            None => {
                let cell = Rc::new(EffectCell::new());
                self.install(index, HookSlot::Effect(cell.clone()));
                cell
            }
        };
        if !cell.deps.borrow().should_run(deps.as_ref()) {
            return;
        }
        let effect: Box<dyn FnOnce() -> Cleanup> = Box::new(move || effect().into());
        let deps = DepsSnapshot::from_deps(deps);
        match self.timing {
            EffectTiming::DuringRender => cell.run(effect, deps),
            EffectTiming::AfterCommit => self.pending.push(PendingEffect { cell, effect, deps }),
        }
    }

    /// Ends the invocation, returning effects deferred to commit.
    pub fn finish(self) -> Vec<PendingEffect> {
        if self.cursor < self.hooks.slots.len() {
            log::warn!(
                "`{}` called {} hooks but previously called {}",
                self.component,
                self.cursor,
                self.hooks.slots.len()
            );
        }
        self.pending
    }

    fn next_index(&mut self) -> usize {
        let index = self.cursor;
        self.cursor += 1;
        index
    }

    fn install(&mut self, index: usize, slot: HookSlot) {
        if index < self.hooks.slots.len() {
            log::warn!(
                "`{}` changed hook order: slot {index} was a {} hook, replacing with a {} hook",
                self.component,
                self.hooks.slots[index].kind(),
                slot.kind()
            );
            self.hooks.slots[index] = slot;
        } else {
            self.hooks.slots.push(slot);
        }
    }
}

impl fmt::Debug for HookContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookContext")
            .field("component", &self.component)
            .field("cursor", &self.cursor)
            .field("hooks", &self.hooks)
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/hooks_tests.rs"]
mod tests;
