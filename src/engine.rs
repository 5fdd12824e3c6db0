//! Scripted scene object model.
//!
//! The [`ScriptPort`] owns the toolkit and one [`ScriptHandle`] per widget
//! instance; handles turn update verbs into scene mutations.

pub mod access;
pub mod config;
pub mod errors;
pub mod events;
pub mod font;
pub mod handle;
pub mod image_option;
pub mod port;
pub mod registry;
pub mod router;
pub mod swallow;

pub use config::{ScriptConfig, ScriptConfigError};
pub use errors::{status_of, ScriptError, STATUS_SUCCESS};
pub use events::{AccessStatus, EventKind, EventOutcome, OutputSink, SignalEvent};
pub use handle::{HandleId, ScriptHandle};
pub use image_option::{FillMode, ImageOption};
pub use port::ScriptPort;
