use std::any::Any;
use std::fmt;
use crate::render::Rect;

/// Identity of a live object inside the presentation toolkit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

/// Identity of an accessible proxy registered with the toolkit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyId(pub u64);

impl fmt::Display for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proxy#{}", self.0)
    }
}

/// Failures reported by the toolkit when constructing scene objects.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("group {group} does not exist in {path}")]
    UnknownGroup { path: String, group: String },

    #[error("resource is corrupt: {0}")]
    Corrupt(String),

    #[error("object construction failed")]
    Construction,

    #[error("out of memory")]
    OutOfMemory,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// One RGBA quadruple of a color class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgba {
    pub r: i32,
    pub g: i32,
    pub b: i32,
    pub a: i32,
}

/// Object, outline and shadow colors applied as one color class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColorClass {
    pub object: Rgba,
    pub outline: Rgba,
    pub shadow: Rgba,
}

/// Pointer events the script port feeds into the toolkit's canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerEvent {
    Down,
    Up,
    Move,
    In,
    Out,
}

/// Phase of an accessibility scroll gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollPhase {
    Begin,
    Move,
    End,
}

/// Discrete accessibility actions dispatched on a layout object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AccessAction {
    /// Highlight whatever is under `(x, y)`
    Highlight { x: i32, y: i32 },
    HighlightNext,
    HighlightPrev,
    Activate,
    ActionDown,
    ActionUp,
    Scroll { x: i32, y: i32, phase: ScrollPhase },
    Unhighlight,
}

/// Placement of an image object inside the slot that swallows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageLayout {
    /// Size of the image object in pixels.
    pub size: (i32, i32),
    /// Region of the object the image pixels are stretched over.
    pub fill: Rect,
    /// Aspect ratio the swallowing slot should preserve, if any.
    pub aspect_hint: Option<(i32, i32)>,
    /// Apply the rotation embedded in the image file.
    pub honor_orientation: bool,
}

/// Presentation toolkit interface. Calls occur on the toolkit's owning thread.
///
/// The script port never draws; everything visible goes through this trait.
/// Part rectangles are relative to their object, object rectangles are in
/// canvas coordinates.
pub trait SceneToolkit {
    /// Name of the toolkit, for logging.
    fn name(&self) -> &str;

    /// Returns a type-erased reference to the toolkit.
    fn as_any(&self) -> &dyn Any;

    /// Returns a mutable type-erased reference to the toolkit.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Set the global scale factor for layouts.
    fn set_scale(&mut self, scale: f64);

    /// Current toolkit clock in seconds.
    fn now(&self) -> f64;

    /// Load `group` from the layout file at `path` as a new object.
    fn load_layout(&mut self, path: &str, group: &str) -> Result<ObjectId, LoadError>;

    /// Load the image at `path` as a new object.
    fn load_image(&mut self, path: &str) -> Result<ObjectId, LoadError>;

    /// Natural pixel size of a loaded image.
    fn image_size(&self, image: ObjectId) -> (i32, i32);

    fn apply_image_layout(&mut self, image: ObjectId, layout: &ImageLayout);

    /// Delete an object. Deleting a swallowed object also unswallows it.
    fn delete_object(&mut self, object: ObjectId);

    fn resize(&mut self, object: ObjectId, width: i32, height: i32);

    fn geometry(&self, object: ObjectId) -> Rect;

    fn part_exists(&self, object: ObjectId, part: &str) -> bool;

    fn part_geometry(&self, object: ObjectId, part: &str) -> Option<Rect>;

    fn part_swallow(&mut self, object: ObjectId, part: &str, content: ObjectId);

    fn part_unswallow(&mut self, object: ObjectId, content: ObjectId);

    /// Object currently swallowed by `part`, if any.
    fn part_swallowed(&self, object: ObjectId, part: &str) -> Option<ObjectId>;

    fn part_text_set(&mut self, object: ObjectId, part: &str, text: &str);

    fn color_class_set(&mut self, object: ObjectId, class: &str, colors: &ColorClass) -> bool;

    fn text_class_set(&mut self, object: ObjectId, class: &str, font: &str, size: i32);

    /// Emit `emission` into the object's program engine with `source` as the source.
    fn signal_emit(&mut self, object: ObjectId, emission: &str, source: &str);

    fn part_drag_value_set(&mut self, object: ObjectId, part: &str, x: f64, y: f64) -> bool;

    /// Feed a pointer event into the canvas. `timestamp` is in milliseconds.
    fn feed_pointer(&mut self, event: PointerEvent, x: i32, y: i32, timestamp: u32);

    /// Register an accessible proxy for `part` of `object`.
    fn register_proxy(&mut self, object: ObjectId, part: &str) -> Result<ProxyId, LoadError>;

    fn unregister_proxy(&mut self, proxy: ProxyId);

    fn set_proxy_description(&mut self, proxy: ProxyId, description: &str);

    /// Drop the custom focus order of `object`.
    fn focus_chain_clear(&mut self, object: ObjectId);

    fn focus_chain_append(&mut self, object: ObjectId, proxy: ProxyId);

    fn highlight_proxy(&mut self, proxy: ProxyId) -> bool;

    fn dispatch_action(&mut self, object: ObjectId, action: &AccessAction) -> bool;

    /// True when something inside `object` currently holds the highlight.
    fn has_highlight(&self, object: ObjectId) -> bool;
}
