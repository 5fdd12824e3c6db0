//! Rectangle geometry shared between the script port and the toolkit.
//!
//! A [`Rect`] describes the position and size of an object or part in pixels.
//! Part rectangles returned by [`SceneToolkit::part_geometry`] are relative to
//! the owning object, object rectangles returned by
//! [`SceneToolkit::geometry`] are relative to the canvas.
//!
//! [`SceneToolkit::part_geometry`]: crate::render::backend::SceneToolkit::part_geometry
//! [`SceneToolkit::geometry`]: crate::render::backend::SceneToolkit::geometry
//!
//! # Examples
//!
//! ```
//! use scene_script::render::Rect;
//!
//! let mut rect = Rect::new(0, 0, 200, 100);
//! rect.resize(40, 20);
//! rect.translate(10, 10);
//! assert_eq!(rect.center(), (30, 20));
//! ```

/// Position and size in pixels.
#[derive(Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct Rect {
    /// Horizontal offset in pixels.
    pub x: i32,

    /// Vertical offset in pixels.
    pub y: i32,

    /// Width in pixels.
    pub width: i32,

    /// Height in pixels.
    pub height: i32,
}

impl std::fmt::Debug for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Rect {{ x: {}, y: {}, width: {}, height: {} }}",
            self.x, self.y, self.width, self.height
        )
    }
}

impl Rect {
    /// Creates a new [`Rect`] with the given position and size.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Creates a rectangle at the origin with the given size.
    pub fn sized(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Resizes the rectangle to the given width and height.
    pub fn resize(&mut self, width: i32, height: i32) {
        self.width = width;
        self.height = height;
    }

    /// Moves the rectangle's origin to `(x, y)` in pixels.
    pub fn translate(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    /// Returns the rectangle shifted by the origin of `outer`.
    pub fn offset_by(&self, outer: &Rect) -> Rect {
        Rect::new(self.x + outer.x, self.y + outer.y, self.width, self.height)
    }

    /// Center point, rounded towards the origin.
    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// True when either dimension is zero or negative.
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}
