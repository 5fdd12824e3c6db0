//! Accessible proxies and the custom focus chain.
//!
//! Each node keeps its proxies in the order they were first described. That
//! order is the node's focus chain; it is pushed to the toolkit again whenever
//! a proxy comes or goes.

use std::str::FromStr;
use log::{debug, error};
use crate::engine::errors::ScriptError;
use crate::engine::events::AccessStatus;
use crate::engine::registry::{AccessProxy, NodeKey, ObjectRegistry};
use crate::render::backend::{AccessAction, ObjectId, PointerEvent, ProxyId, SceneToolkit};

/// Attach, update or drop the accessible description of `part` on `node`.
///
/// An empty `text` removes the proxy.
pub fn describe(
    reg: &mut ObjectRegistry,
    tk: &mut dyn SceneToolkit,
    node: NodeKey,
    part: &str,
    text: &str,
) -> Result<(), ScriptError> {
    let record = reg
        .get_mut(node)
        .ok_or_else(|| ScriptError::NotExist(format!("no node for part '{part}'")))?;
    let object = record.object;

    if text.is_empty() {
        if release_proxy(reg, tk, node, part) {
            rebuild_focus_chain(reg, tk, node);
        }
        return Ok(());
    }

    if let Some(existing) = record.access_chain.iter_mut().find(|p| p.part == part) {
        existing.description = text.to_string();
        tk.set_proxy_description(existing.proxy, text);
        return Ok(());
    }

    if !tk.part_exists(object, part) {
        return Err(ScriptError::NotExist(format!("part '{part}' does not exist")));
    }

    let proxy = tk.register_proxy(object, part).map_err(|e| {
        error!("Unable to create an accessible proxy for {}: {}", part, e);
        ScriptError::Fault(e.to_string())
    })?;
    tk.set_proxy_description(proxy, text);

    record.access_chain.push(AccessProxy {
        proxy,
        part: part.to_string(),
        description: text.to_string(),
    });
    reg.bind_proxy(proxy, node);

    rebuild_focus_chain(reg, tk, node);
    Ok(())
}

/// Unregister the proxy of `part` on `node`, if it has one. The caller
/// rebuilds the focus chain.
pub fn release_proxy(reg: &mut ObjectRegistry, tk: &mut dyn SceneToolkit, node: NodeKey, part: &str) -> bool {
    let Some(record) = reg.get_mut(node) else {
        return false;
    };
    let Some(idx) = record.access_chain.iter().position(|p| p.part == part) else {
        return false;
    };

    let removed = record.access_chain.remove(idx);
    tk.unregister_proxy(removed.proxy);
    reg.unbind_proxy(removed.proxy);
    debug!("Released proxy {} of part '{}'", removed.proxy, part);
    true
}

/// Replace the toolkit's custom focus order for `node` with its access chain.
pub fn rebuild_focus_chain(reg: &ObjectRegistry, tk: &mut dyn SceneToolkit, node: NodeKey) {
    let Some(record) = reg.get(node) else {
        return;
    };

    tk.focus_chain_clear(record.object);
    for proxy in &record.access_chain {
        tk.focus_chain_append(record.object, proxy.proxy);
    }
}

/// Press and release the centre of the part behind `proxy`.
pub fn activate(reg: &ObjectRegistry, tk: &mut dyn SceneToolkit, proxy: ProxyId) -> Result<(), ScriptError> {
    let record = reg
        .proxy_owner(proxy)
        .and_then(|owner| reg.get(owner))
        .ok_or_else(|| ScriptError::NotExist(format!("{proxy} is not registered")))?;
    let part = record
        .access_chain
        .iter()
        .find(|p| p.proxy == proxy)
        .ok_or_else(|| ScriptError::NotExist(format!("{proxy} is not registered")))?;

    let rect = tk
        .part_geometry(record.object, &part.part)
        .ok_or_else(|| ScriptError::NotExist(format!("part '{}' does not exist", part.part)))?;
    let (x, y) = rect.offset_by(&tk.geometry(record.object)).center();
    let timestamp = (tk.now() * 1000.0) as u32;

    debug!("Activating {} at {}x{}", part.part, x, y);
    tk.feed_pointer(PointerEvent::Down, x, y, timestamp);
    tk.feed_pointer(PointerEvent::Move, x, y, timestamp);
    tk.feed_pointer(PointerEvent::Up, x, y, timestamp);
    Ok(())
}

/// Map a toolkit result for `action` onto the status reported to the host.
pub fn action_status(tk: &dyn SceneToolkit, object: ObjectId, action: &AccessAction, ok: bool) -> AccessStatus {
    match action {
        AccessAction::Highlight { .. } if !ok => AccessStatus::Error,
        AccessAction::Highlight { .. } if tk.has_highlight(object) => AccessStatus::Done,
        AccessAction::Highlight { .. } => AccessStatus::Last,
        AccessAction::HighlightNext if !ok => AccessStatus::Last,
        AccessAction::HighlightPrev if !ok => AccessStatus::First,
        _ if !ok => AccessStatus::Error,
        _ => AccessStatus::Done,
    }
}

/// Dispatch `action` on `object` and report the resulting status.
pub fn dispatch(tk: &mut dyn SceneToolkit, object: ObjectId, action: AccessAction) -> AccessStatus {
    let ok = tk.dispatch_action(object, &action);
    let status = action_status(tk, object, &action, ok);
    debug!("Access action {:?} on {}: {}", action, object, status);
    status
}

/// Named operations accepted by `operate_accessibility`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessOperation {
    /// `set,hl`
    SetHighlight,
    /// `unset,hl`
    UnsetHighlight,
    /// `next,hl`
    NextHighlight,
    /// `prev,hl`
    PrevHighlight,
}

impl FromStr for AccessOperation {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "set,hl" => Ok(AccessOperation::SetHighlight),
            "unset,hl" => Ok(AccessOperation::UnsetHighlight),
            "next,hl" => Ok(AccessOperation::NextHighlight),
            "prev,hl" => Ok(AccessOperation::PrevHighlight),
            "" => Err(ScriptError::Invalid("empty accessibility operation".to_string())),
            other => Err(ScriptError::Invalid(format!("unknown accessibility operation '{other}'"))),
        }
    }
}

/// Run a named accessibility operation on `part` of `node`.
pub fn operate(
    reg: &ObjectRegistry,
    tk: &mut dyn SceneToolkit,
    node: NodeKey,
    part: &str,
    operation: AccessOperation,
) -> Result<AccessStatus, ScriptError> {
    let record = reg
        .get(node)
        .ok_or_else(|| ScriptError::NotExist(format!("no node for part '{part}'")))?;

    let status = match operation {
        AccessOperation::SetHighlight => {
            let proxy = record
                .proxy_for(part)
                .ok_or_else(|| ScriptError::NotExist(format!("part '{part}' has no accessible proxy")))?;
            if tk.highlight_proxy(proxy.proxy) {
                AccessStatus::Done
            } else {
                AccessStatus::Error
            }
        }
        AccessOperation::UnsetHighlight => dispatch(tk, record.object, AccessAction::Unhighlight),
        AccessOperation::NextHighlight => dispatch(tk, record.object, AccessAction::HighlightNext),
        AccessOperation::PrevHighlight => dispatch(tk, record.object, AccessAction::HighlightPrev),
    };

    Ok(status)
}
