pub mod backend;

/// Toolkit implementations shipped with the crate.
pub mod backends {
    /// In-memory toolkit for headless hosts and tests
    pub mod null;
}

mod rect;

pub use rect::Rect;
