//! Event types crossing the script port.
//!
//! Inbound events arrive from the widget host as a raw `u32` event type: one
//! class bit in the high byte ([`EventClass`]) and one operation in the low
//! bits. [`EventKind::from_raw`] decodes that pair. Outbound, the port reports
//! part emissions to an [`OutputSink`] as normalized [`SignalEvent`]s.
//!
//! # Main Types
//!
//! - [`EventKind`]: decoded inbound event.
//! - [`EventOutcome`]: what the router did with an inbound event.
//! - [`AccessStatus`]: result of an accessibility action.
//! - [`SignalEvent`]: a part emission with its box normalized to the node.

use std::fmt::Display;
use bitflags::bitflags;
use crate::engine::errors::ScriptError;
use crate::render::backend::PointerEvent;

bitflags! {
    /// Event class carried in the high byte of a raw event type.
    pub struct EventClass: u32 {
        const POINTER = 0x0100_0000;
        const ACCESS  = 0x0200_0000;
        const KEY     = 0x0400_0000;
    }
}

/// Bits of a raw event type reserved for the class.
pub const EVENT_CLASS_MASK: u32 = 0xFF00_0000;

pub const POINTER_DOWN: u32 = 0x01;
pub const POINTER_UP: u32 = 0x02;
pub const POINTER_MOVE: u32 = 0x04;
pub const POINTER_IN: u32 = 0x08;
pub const POINTER_OUT: u32 = 0x10;

pub const ACCESS_HIGHLIGHT: u32 = 0x01;
pub const ACCESS_HIGHLIGHT_NEXT: u32 = 0x02;
pub const ACCESS_HIGHLIGHT_PREV: u32 = 0x04;
pub const ACCESS_ACTIVATE: u32 = 0x08;
pub const ACCESS_ACTION: u32 = 0x10;
pub const ACCESS_SCROLL: u32 = 0x20;
pub const ACCESS_UNHIGHLIGHT: u32 = 0x40;

pub const KEY_DOWN: u32 = 0x01;
pub const KEY_UP: u32 = 0x02;
pub const KEY_FOCUS_IN: u32 = 0x04;
pub const KEY_FOCUS_OUT: u32 = 0x08;

/// Accessibility operations that can be injected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessOp {
    Highlight,
    HighlightNext,
    HighlightPrev,
    Activate,
    /// Press or release, depending on the `down` argument
    Action,
    /// Gesture phase comes from the `down` argument
    Scroll,
    Unhighlight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyEvent {
    Down,
    Up,
    FocusIn,
    FocusOut,
}

/// A decoded inbound event type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Pointer(PointerEvent),
    Access(AccessOp),
    Key(KeyEvent),
}

impl EventKind {
    /// Decode a raw event type. Exactly one class bit and one known operation
    /// must be set.
    pub fn from_raw(raw: u32) -> Result<EventKind, ScriptError> {
        let invalid = || ScriptError::Invalid(format!("unknown event type {raw:#010x}"));

        let class = EventClass::from_bits(raw & EVENT_CLASS_MASK).ok_or_else(invalid)?;
        let op = raw & !EVENT_CLASS_MASK;

        let kind = if class == EventClass::POINTER {
            EventKind::Pointer(match op {
                POINTER_DOWN => PointerEvent::Down,
                POINTER_UP => PointerEvent::Up,
                POINTER_MOVE => PointerEvent::Move,
                POINTER_IN => PointerEvent::In,
                POINTER_OUT => PointerEvent::Out,
                _ => return Err(invalid()),
            })
        } else if class == EventClass::ACCESS {
            EventKind::Access(match op {
                ACCESS_HIGHLIGHT => AccessOp::Highlight,
                ACCESS_HIGHLIGHT_NEXT => AccessOp::HighlightNext,
                ACCESS_HIGHLIGHT_PREV => AccessOp::HighlightPrev,
                ACCESS_ACTIVATE => AccessOp::Activate,
                ACCESS_ACTION => AccessOp::Action,
                ACCESS_SCROLL => AccessOp::Scroll,
                ACCESS_UNHIGHLIGHT => AccessOp::Unhighlight,
                _ => return Err(invalid()),
            })
        } else if class == EventClass::KEY {
            EventKind::Key(match op {
                KEY_DOWN => KeyEvent::Down,
                KEY_UP => KeyEvent::Up,
                KEY_FOCUS_IN => KeyEvent::FocusIn,
                KEY_FOCUS_OUT => KeyEvent::FocusOut,
                _ => return Err(invalid()),
            })
        } else {
            return Err(invalid());
        };

        Ok(kind)
    }

    /// Encode back into the raw host representation.
    pub fn raw(&self) -> u32 {
        match self {
            EventKind::Pointer(event) => {
                EventClass::POINTER.bits()
                    | match event {
                        PointerEvent::Down => POINTER_DOWN,
                        PointerEvent::Up => POINTER_UP,
                        PointerEvent::Move => POINTER_MOVE,
                        PointerEvent::In => POINTER_IN,
                        PointerEvent::Out => POINTER_OUT,
                    }
            }
            EventKind::Access(op) => {
                EventClass::ACCESS.bits()
                    | match op {
                        AccessOp::Highlight => ACCESS_HIGHLIGHT,
                        AccessOp::HighlightNext => ACCESS_HIGHLIGHT_NEXT,
                        AccessOp::HighlightPrev => ACCESS_HIGHLIGHT_PREV,
                        AccessOp::Activate => ACCESS_ACTIVATE,
                        AccessOp::Action => ACCESS_ACTION,
                        AccessOp::Scroll => ACCESS_SCROLL,
                        AccessOp::Unhighlight => ACCESS_UNHIGHLIGHT,
                    }
            }
            EventKind::Key(key) => {
                EventClass::KEY.bits()
                    | match key {
                        KeyEvent::Down => KEY_DOWN,
                        KeyEvent::Up => KEY_UP,
                        KeyEvent::FocusIn => KEY_FOCUS_IN,
                        KeyEvent::FocusOut => KEY_FOCUS_OUT,
                    }
            }
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Pointer(event) => write!(f, "pointer {:?}", event),
            EventKind::Access(op) => write!(f, "access {:?}", op),
            EventKind::Key(key) => write!(f, "key {:?}", key),
        }
    }
}

/// Result of an accessibility action as reported to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessStatus {
    Done,
    /// Navigation hit the start of the chain
    First,
    /// Navigation hit the end of the chain, or nothing could be highlighted
    Last,
    Error,
}

impl Display for AccessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessStatus::Done => write!(f, "done"),
            AccessStatus::First => write!(f, "first"),
            AccessStatus::Last => write!(f, "last"),
            AccessStatus::Error => write!(f, "error"),
        }
    }
}

/// What happened to an injected event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    /// Forwarded to the toolkit
    Handled,
    /// Dropped because it was too old
    Discarded,
    /// Dropped because the button was already in that state
    Suppressed,
    Access(AccessStatus),
}

/// A part emission, with the part box expressed as fractions of its node.
#[derive(Clone, Debug, PartialEq)]
pub struct SignalEvent {
    pub source: String,
    pub emission: String,
    pub sx: f64,
    pub sy: f64,
    pub ex: f64,
    pub ey: f64,
}

/// Host-side consumer of script emissions.
pub trait OutputSink {
    fn emit_signal(&mut self, event: &SignalEvent);
}

impl<F> OutputSink for F
where
    F: FnMut(&SignalEvent),
{
    fn emit_signal(&mut self, event: &SignalEvent) {
        self(event)
    }
}
