//! Signal and event routing.
//!
//! Outbound, part emissions are normalized against their node and handed to
//! the host's [`OutputSink`]. Inbound, injected pointer events are debounced
//! and accessibility events become toolkit actions on the root layout.

use log::{debug, error};
use crate::engine::access;
use crate::engine::errors::ScriptError;
use crate::engine::events::{AccessOp, EventKind, EventOutcome, OutputSink, SignalEvent};
use crate::engine::registry::ObjectRegistry;
use crate::render::backend::{AccessAction, ObjectId, PointerEvent, SceneToolkit, ScrollPhase};
use crate::render::Rect;

/// An event injected by the widget host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputEvent {
    pub kind: EventKind,
    pub x: i32,
    pub y: i32,
    /// Button state for `action`, gesture phase for `scroll`.
    pub down: i32,
    /// Host timestamp in seconds.
    pub timestamp: f64,
}

/// Debounce state for injected pointer buttons.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointerState {
    pub mouse_down: bool,
}

/// Express `part` (relative to its node) as fractions of a `width` x `height` node.
///
/// Returns `(sx, sy, ex, ey)`; an axis of size zero yields zeros.
pub fn normalize(width: i32, height: i32, part: &Rect) -> (f64, f64, f64, f64) {
    let (sx, ex) = if width != 0 {
        (
            part.x as f64 / width as f64,
            (part.x + part.width) as f64 / width as f64,
        )
    } else {
        (0.0, 0.0)
    };

    let (sy, ey) = if height != 0 {
        (
            part.y as f64 / height as f64,
            (part.y + part.height) as f64 / height as f64,
        )
    } else {
        (0.0, 0.0)
    };

    (sx, sy, ex, ey)
}

/// Forward an emission of `source` on `object` to the sink. Returns false when
/// the object does not belong to this registry.
pub fn route_signal(
    reg: &ObjectRegistry,
    tk: &dyn SceneToolkit,
    sink: &mut dyn OutputSink,
    object: ObjectId,
    emission: &str,
    source: &str,
) -> bool {
    if reg.by_object(object).is_none() {
        error!("Signal {} from unknown object {}", emission, object);
        return false;
    }

    let node = tk.geometry(object);
    let part = tk.part_geometry(object, source).unwrap_or_default();
    let (sx, sy, ex, ey) = normalize(node.width, node.height, &part);

    debug!("Signal emit: source[{}], emission[{}]", source, emission);
    sink.emit_signal(&SignalEvent {
        source: source.to_string(),
        emission: emission.to_string(),
        sx,
        sy,
        ex,
        ey,
    });
    true
}

/// Deliver an injected event.
pub fn feed_event(
    reg: &ObjectRegistry,
    tk: &mut dyn SceneToolkit,
    pointer: &mut PointerState,
    stale_after: f64,
    event: &InputEvent,
) -> Result<EventOutcome, ScriptError> {
    match event.kind {
        EventKind::Pointer(kind) => Ok(feed_pointer(tk, pointer, stale_after, kind, event)),
        EventKind::Access(op) => {
            let root = reg
                .root()
                .and_then(|key| reg.get(key))
                .ok_or_else(|| ScriptError::NotExist("no layout is loaded".to_string()))?;
            let action = access_action(op, event)?;
            Ok(EventOutcome::Access(access::dispatch(tk, root.object, action)))
        }
        EventKind::Key(key) => Err(ScriptError::NotImplemented(format!("key event {:?}", key))),
    }
}

fn access_action(op: AccessOp, event: &InputEvent) -> Result<AccessAction, ScriptError> {
    let action = match op {
        AccessOp::Highlight => AccessAction::Highlight { x: event.x, y: event.y },
        AccessOp::HighlightNext => AccessAction::HighlightNext,
        AccessOp::HighlightPrev => AccessAction::HighlightPrev,
        AccessOp::Activate => AccessAction::Activate,
        AccessOp::Action if event.down != 0 => AccessAction::ActionDown,
        AccessOp::Action => AccessAction::ActionUp,
        AccessOp::Scroll => {
            let phase = match event.down {
                0 => ScrollPhase::Begin,
                1 => ScrollPhase::Move,
                2 => ScrollPhase::End,
                other => return Err(ScriptError::Invalid(format!("unknown scroll phase {other}"))),
            };
            AccessAction::Scroll { x: event.x, y: event.y, phase }
        }
        AccessOp::Unhighlight => AccessAction::Unhighlight,
    };

    Ok(action)
}

fn feed_pointer(
    tk: &mut dyn SceneToolkit,
    state: &mut PointerState,
    stale_after: f64,
    kind: PointerEvent,
    event: &InputEvent,
) -> EventOutcome {
    let age = tk.now() - event.timestamp;
    if age > stale_after && !state.mouse_down {
        debug!("Discarding {:?}, {:.3}s old", kind, age);
        return EventOutcome::Discarded;
    }

    let (x, y) = (event.x, event.y);
    let timestamp = (event.timestamp * 1000.0) as u32;

    match kind {
        PointerEvent::Down | PointerEvent::Up => {
            let pressing = kind == PointerEvent::Down;
            if state.mouse_down == pressing {
                return EventOutcome::Suppressed;
            }
            tk.feed_pointer(PointerEvent::Move, x, y, timestamp);
            tk.feed_pointer(kind, x, y, timestamp);
            state.mouse_down = pressing;
        }
        other => tk.feed_pointer(other, x, y, timestamp),
    }

    EventOutcome::Handled
}
