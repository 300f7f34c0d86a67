//! Applies a finished work-in-progress tree to the host.

use crate::element::{event_name, PropValue, Props};
use crate::fiber::{EffectTag, FiberId, FiberTree};
use crate::platform::{Host, HostError};
use crate::RenderError;

/// One mutation applied during a commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommittedEffect {
    pub tag: EffectTag,
    pub fiber: String,
}

/// Effects applied by one commit, in application order: deletions first,
/// then placements and updates in tree pre-order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitSummary {
    effects: Vec<CommittedEffect>,
}

impl CommitSummary {
    pub fn effects(&self) -> &[CommittedEffect] {
        &self.effects
    }

    pub fn tags(&self) -> Vec<EffectTag> {
        self.effects.iter().map(|effect| effect.tag).collect()
    }

    pub fn count(&self, tag: EffectTag) -> usize {
        self.effects.iter().filter(|effect| effect.tag == tag).count()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    fn record(&mut self, tag: EffectTag, fiber: String) {
        self.effects.push(CommittedEffect { tag, fiber });
    }
}

/// Commits `wip` against `current`. Tags of `wip` are consumed; the caller
/// promotes `wip` to be the new current tree.
pub(crate) fn commit_root<H: Host>(
    host: &mut H,
    current: Option<&FiberTree<H::Handle>>,
    wip: &mut FiberTree<H::Handle>,
    deletions: &[FiberId],
) -> Result<CommitSummary, RenderError> {
    let mut summary = CommitSummary::default();

    if let Some(current) = current {
        for &id in deletions {
            commit_deletion(host, current, id)?;
            summary.record(EffectTag::Deletion, current.get(id).kind().label());
        }
    }

    let mut stack: Vec<FiberId> = wip.root().child().into_iter().collect();
    while let Some(id) = stack.pop() {
        let fiber = wip.get(id);
        if let Some(sibling) = fiber.sibling() {
            stack.push(sibling);
        }
        if let Some(child) = fiber.child() {
            stack.push(child);
        }
        match fiber.tag() {
            EffectTag::Placement => {
                if let Some(handle) = fiber.handle() {
                    let parent = wip
                        .host_parent(id)
                        .ok_or_else(|| missing_parent(id))?;
                    host.append_child(parent, handle)
                        .map_err(RenderError::Commit)?;
                }
            }
            EffectTag::Update => {
                if let Some(handle) = fiber.handle() {
                    let previous = match (fiber.alternate(), current) {
                        (Some(alternate), Some(current)) => current.get(alternate).props(),
                        _ => return Err(missing_alternate(id)),
                    };
                    apply_props(host, handle, previous, fiber.props())
                        .map_err(RenderError::Commit)?;
                }
            }
            EffectTag::None | EffectTag::Deletion => continue,
        }
        summary.record(fiber.tag(), fiber.kind().label());
    }

    wip.settle();
    Ok(summary)
}

/// Detaches the first handle found at or below `id` from its host parent.
/// Component fibers own no handle, so the walk descends through first
/// children until it finds one.
fn commit_deletion<H: Host>(
    host: &mut H,
    current: &FiberTree<H::Handle>,
    id: FiberId,
) -> Result<(), RenderError> {
    let mut cursor = Some(id);
    while let Some(fiber_id) = cursor {
        let fiber = current.get(fiber_id);
        if let Some(handle) = fiber.handle() {
            let parent = current
                .host_parent(fiber_id)
                .ok_or_else(|| missing_parent(fiber_id))?;
            return host
                .remove_child(parent, handle)
                .map_err(RenderError::Commit);
        }
        cursor = fiber.child();
    }
    Ok(())
}

/// Diffs `previous` against `next` on `handle`.
///
/// Properties missing from `next` are removed, changed ones are set. Event
/// properties unregister the old handler before registering the new one.
pub(crate) fn apply_props<H: Host>(
    host: &mut H,
    handle: &H::Handle,
    previous: &Props,
    next: &Props,
) -> Result<(), HostError> {
    for (name, value) in previous.iter() {
        if next.contains(name) {
            continue;
        }
        match (event_name(name), value) {
            (Some(event), PropValue::Handler(handler)) => {
                host.remove_event_handler(handle, &event, handler)?
            }
            _ => host.remove_property(handle, name)?,
        }
    }

    for (name, value) in next.iter() {
        let old = previous.get(name);
        if old == Some(value) {
            continue;
        }
        let event = event_name(name);
        if let (Some(event), Some(PropValue::Handler(old))) = (event.as_deref(), old) {
            host.remove_event_handler(handle, event, old)?;
        }
        match (event, value) {
            (Some(event), PropValue::Handler(handler)) => {
                host.add_event_handler(handle, &event, handler)?
            }
            _ => host.set_property(handle, name, value)?,
        }
    }
    Ok(())
}

fn missing_parent(id: FiberId) -> RenderError {
    RenderError::Invariant(format!("fiber {id} has no ancestor with a host node"))
}

fn missing_alternate(id: FiberId) -> RenderError {
    RenderError::Invariant(format!("updated fiber {id} has no alternate"))
}

#[cfg(test)]
#[path = "tests/commit_tests.rs"]
mod tests;
