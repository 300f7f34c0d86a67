//! Positional two-tree reconciliation.

use std::rc::Rc;

use crate::commit::apply_props;
use crate::element::{Element, ElementKind, Props};
use crate::fiber::{EffectTag, Fiber, FiberId, FiberKind, FiberTree};
use crate::hooks::{EffectTiming, HookContext, HookList, PendingEffect, UpdateHandle};
use crate::platform::Host;
use crate::RenderError;

/// Everything a unit of work may read or write.
pub(crate) struct WorkContext<'a, H: Host> {
    pub(crate) host: &'a mut H,
    pub(crate) current: Option<&'a FiberTree<H::Handle>>,
    pub(crate) wip: &'a mut FiberTree<H::Handle>,
    pub(crate) deletions: &'a mut Vec<FiberId>,
    pub(crate) pending_effects: &'a mut Vec<PendingEffect>,
    pub(crate) updater: &'a UpdateHandle,
    pub(crate) timing: EffectTiming,
}

/// Reconciles the fiber `id` and returns the next fiber to process.
pub(crate) fn perform_unit_of_work<H: Host>(
    cx: &mut WorkContext<'_, H>,
    id: FiberId,
) -> Result<Option<FiberId>, RenderError> {
    let kind = cx.wip.get(id).kind.clone();
    match kind {
        FiberKind::Element(ElementKind::Component(component)) => {
            let props = Rc::clone(&cx.wip.get(id).props);
            let mut hooks = cx
                .wip
                .get(id)
                .alternate
                .zip(cx.current)
                .and_then(|(alternate, current)| current.get(alternate).hooks.clone())
                .unwrap_or_else(HookList::new);
            let rendered = {
                let mut hook_cx =
                    HookContext::bind(component.name(), &mut hooks, cx.updater.clone(), cx.timing);
                let rendered = component.invoke(&mut hook_cx, &props);
                cx.pending_effects.extend(hook_cx.finish());
                rendered
            };
            cx.wip.get_mut(id).hooks = Some(hooks);
            reconcile_children(cx, id, std::slice::from_ref(&rendered));
        }
        FiberKind::Element(ElementKind::Host(_) | ElementKind::Text) | FiberKind::Root => {
            if cx.wip.get(id).handle.is_none() {
                let handle = create_handle(cx.host, cx.wip.get(id))?;
                cx.wip.get_mut(id).handle = Some(handle);
            }
            let props = Rc::clone(&cx.wip.get(id).props);
            reconcile_children(cx, id, props.children());
        }
    }
    Ok(cx.wip.next_unit(id))
}

fn create_handle<H: Host>(host: &mut H, fiber: &Fiber<H::Handle>) -> Result<H::Handle, RenderError> {
    let handle = match &fiber.kind {
        FiberKind::Element(ElementKind::Text) => host.create_text_node(),
        FiberKind::Element(ElementKind::Host(tag)) => host.create_node(tag),
        other => {
            return Err(RenderError::Invariant(format!(
                "{} fiber has no host node",
                other.label()
            )))
        }
    }
    .map_err(RenderError::Create)?;
    apply_props(host, &handle, &Props::new(), &fiber.props).map_err(RenderError::Create)?;
    Ok(handle)
}

/// Compares `elements` against the alternate's children by position only.
///
/// Same kind at the same index keeps the old handle (`Update`); any other
/// element is created fresh (`Placement`) and any unmatched old fiber is
/// queued for deletion. An insertion in the middle of a list therefore
/// re-creates every following sibling.
pub(crate) fn reconcile_children<H: Host>(
    cx: &mut WorkContext<'_, H>,
    parent: FiberId,
    elements: &[Element],
) {
    let current = cx.current;
    let mut old = cx
        .wip
        .get(parent)
        .alternate
        .zip(current)
        .and_then(|(alternate, current)| current.get(alternate).child);
    let mut previous: Option<FiberId> = None;
    let mut index = 0;

    while index < elements.len() || old.is_some() {
        let element = elements.get(index);
        let old_fiber = old.zip(current).map(|(id, tree)| (id, tree.get(id)));

        let same_kind = match (element, old_fiber) {
            (Some(element), Some((_, fiber))) => fiber.kind.matches(element.kind()),
            _ => false,
        };

        let created = match (element, old_fiber) {
            (Some(element), Some((old_id, fiber))) if same_kind => {
                let mut next = Fiber::new(fiber.kind.clone(), element.shared_props(), Some(parent));
                next.handle = fiber.handle.clone();
                next.alternate = Some(old_id);
                next.tag = EffectTag::Update;
                Some(cx.wip.push(next))
            }
            (Some(element), _) => {
                let mut next = Fiber::new(
                    FiberKind::Element(element.kind().clone()),
                    element.shared_props(),
                    Some(parent),
                );
                next.tag = EffectTag::Placement;
                Some(cx.wip.push(next))
            }
            (None, _) => None,
        };

        if let Some((old_id, _)) = old_fiber {
            if !same_kind {
                cx.deletions.push(old_id);
            }
        }
        old = old_fiber.and_then(|(_, fiber)| fiber.sibling);

        if let Some(id) = created {
            match previous {
                Some(prev) => cx.wip.get_mut(prev).sibling = Some(id),
                None => cx.wip.get_mut(parent).child = Some(id),
            }
            previous = Some(id);
        }
        index += 1;
    }
}

#[cfg(test)]
#[path = "tests/reconciler_tests.rs"]
mod tests;
