use std::fmt::Display;
use log::{debug, error, warn};
use uuid::Uuid;
use crate::engine::access::{self, AccessOperation};
use crate::engine::errors::ScriptError;
use crate::engine::events::{AccessStatus, EventOutcome, OutputSink};
use crate::engine::font::FontSettings;
use crate::engine::image_option::ImageOption;
use crate::engine::registry::{NodeKey, NodeRecord, ObjectRegistry};
use crate::engine::router::{self, InputEvent, PointerState};
use crate::engine::swallow::{self, SlotSource};
use crate::render::backend::{ColorClass, ObjectId, ProxyId, Rgba, SceneToolkit};

/// Identity of a script handle (one per widget instance).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandleId(Uuid);

impl HandleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for HandleId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse twelve whitespace separated integers into object, outline and shadow colors.
fn parse_color_class(rgba: &str) -> Result<ColorClass, ScriptError> {
    let invalid = || ScriptError::Invalid(format!("expected 12 color components, got '{rgba}'"));

    let values = rgba
        .split_whitespace()
        .map(str::parse::<i32>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;
    let [r1, g1, b1, a1, r2, g2, b2, a2, r3, g3, b3, a3]: [i32; 12] =
        values.try_into().map_err(|_| invalid())?;

    Ok(ColorClass {
        object: Rgba { r: r1, g: g1, b: b1, a: a1 },
        outline: Rgba { r: r2, g: g2, b: b2, a: a2 },
        shadow: Rgba { r: r3, g: g3, b: b3, a: a3 },
    })
}

/// Scene state of one widget instance.
///
/// The handle owns the registry of every node it created. Verbs address nodes
/// by id, with `None` standing for the root layout.
pub struct ScriptHandle {
    file: String,
    group: String,
    category: Option<String>,
    width: i32,
    height: i32,
    sink: Box<dyn OutputSink>,
    registry: ObjectRegistry,
    pointer: PointerState,
}

impl ScriptHandle {
    pub fn new(file: &str, group: &str, sink: Box<dyn OutputSink>) -> Self {
        Self {
            file: file.to_string(),
            group: group.to_string(),
            category: None,
            width: 0,
            height: 0,
            sink,
            registry: ObjectRegistry::new(),
            pointer: PointerState::default(),
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Root dimensions as last loaded or resized.
    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer
    }

    pub fn is_loaded(&self) -> bool {
        self.registry.root().is_some()
    }

    /// Toolkit object behind `id`, if it exists.
    pub fn object_of(&self, id: Option<&str>) -> Option<ObjectId> {
        self.registry.find(id).and_then(|key| self.registry.get(key)).map(|r| r.object)
    }

    fn node(&self, id: Option<&str>) -> Result<(NodeKey, ObjectId), ScriptError> {
        self.registry
            .find(id)
            .and_then(|key| self.registry.get(key).map(|r| (key, r.object)))
            .ok_or_else(|| ScriptError::NotExist(format!("object {} does not exist", id.unwrap_or("<root>"))))
    }

    pub fn update_color(
        &mut self,
        tk: &mut dyn SceneToolkit,
        id: Option<&str>,
        part: &str,
        rgba: &str,
    ) -> Result<(), ScriptError> {
        let (_, object) = self.node(id)?;
        let colors = parse_color_class(rgba)?;

        if !tk.color_class_set(object, part, &colors) {
            warn!("Failed to set color class {} on {}", part, object);
        }
        Ok(())
    }

    pub fn update_text(
        &mut self,
        tk: &mut dyn SceneToolkit,
        id: Option<&str>,
        part: &str,
        text: &str,
    ) -> Result<(), ScriptError> {
        let (key, object) = self.node(id)?;
        if !tk.part_exists(object, part) {
            return Err(ScriptError::NotExist(format!("part '{part}' does not exist")));
        }

        tk.part_text_set(object, part, text);
        access::describe(&mut self.registry, tk, key, part, text)
    }

    pub fn update_image(
        &mut self,
        tk: &mut dyn SceneToolkit,
        id: Option<&str>,
        part: &str,
        path: &str,
        option: &str,
    ) -> Result<(), ScriptError> {
        let (key, _) = self.node(id)?;
        let option = ImageOption::parse(option);
        debug!("Image option {:?} for {}", option, part);

        swallow::set_slot_content(&mut self.registry, tk, key, part, SlotSource::Image { path, option: &option })
            .map(|_| ())
    }

    /// `option` is accepted for host compatibility and currently unused.
    pub fn update_accessibility(
        &mut self,
        tk: &mut dyn SceneToolkit,
        id: Option<&str>,
        part: &str,
        text: &str,
        _option: &str,
    ) -> Result<(), ScriptError> {
        let (key, _) = self.node(id)?;
        access::describe(&mut self.registry, tk, key, part, text)
    }

    pub fn operate_accessibility(
        &mut self,
        tk: &mut dyn SceneToolkit,
        id: Option<&str>,
        part: &str,
        operation: &str,
        _option: &str,
    ) -> Result<AccessStatus, ScriptError> {
        let (key, _) = self.node(id)?;
        let operation: AccessOperation = operation.parse()?;
        access::operate(&self.registry, tk, key, part, operation)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_script(
        &mut self,
        tk: &mut dyn SceneToolkit,
        font: &FontSettings,
        text_class: &str,
        src_id: Option<&str>,
        target_id: Option<&str>,
        part: &str,
        path: &str,
        group: &str,
    ) -> Result<(), ScriptError> {
        let (key, _) = self.node(src_id)?;
        let target_id = target_id.filter(|id| !id.is_empty());

        let created = swallow::set_slot_content(
            &mut self.registry,
            tk,
            key,
            part,
            SlotSource::Layout { path, group, target_id },
        )?;

        if let Some(object) = created.and_then(|k| self.registry.get(k)).map(|r| r.object) {
            font.apply(tk, object, text_class);
        }
        Ok(())
    }

    pub fn update_signal(
        &mut self,
        tk: &mut dyn SceneToolkit,
        id: Option<&str>,
        part: &str,
        signal: &str,
    ) -> Result<(), ScriptError> {
        let (_, object) = self.node(id)?;
        tk.signal_emit(object, signal, part);
        Ok(())
    }

    pub fn update_drag(
        &mut self,
        tk: &mut dyn SceneToolkit,
        id: Option<&str>,
        part: &str,
        x: f64,
        y: f64,
    ) -> Result<(), ScriptError> {
        let (_, object) = self.node(id)?;
        if !tk.part_drag_value_set(object, part, x, y) {
            warn!("Failed to set drag value of {} to {}x{}", part, x, y);
        }
        Ok(())
    }

    pub fn update_size(
        &mut self,
        tk: &mut dyn SceneToolkit,
        id: Option<&str>,
        width: i32,
        height: i32,
    ) -> Result<(), ScriptError> {
        let (_, object) = self.node(id)?;
        tk.resize(object, width, height);

        if id.is_none() {
            self.width = width;
            self.height = height;
        }
        Ok(())
    }

    /// Replace the category; `None` or an empty string clears it.
    /// Categories belong to the whole handle, so `_obj` is not resolved.
    pub fn update_category(&mut self, _obj: Option<&str>, category: Option<&str>) -> Result<(), ScriptError> {
        self.category = category.filter(|c| !c.is_empty()).map(str::to_string);
        Ok(())
    }

    /// Load the root layout at `width` x `height`.
    pub fn load(
        &mut self,
        tk: &mut dyn SceneToolkit,
        font: &FontSettings,
        text_class: &str,
        width: i32,
        height: i32,
    ) -> Result<(), ScriptError> {
        if self.is_loaded() {
            return Err(ScriptError::Invalid(format!("{} is already loaded", self.file)));
        }

        let object = tk.load_layout(&self.file, &self.group).map_err(|e| {
            error!("Could not load {} from {}: {}", self.group, self.file, e);
            ScriptError::from(e)
        })?;

        if let Err(e) = self.registry.insert(NodeRecord::new(object, None, None)) {
            tk.delete_object(object);
            return Err(e);
        }

        font.apply(tk, object, text_class);
        tk.resize(object, width, height);
        self.width = width;
        self.height = height;

        debug!("Loaded {}:{} as {} ({}x{})", self.file, self.group, object, width, height);
        Ok(())
    }

    /// Tear down the root and everything below it.
    pub fn unload(&mut self, tk: &mut dyn SceneToolkit) -> Result<(), ScriptError> {
        let mut released = 0;
        while let Some(root) = self.registry.root() {
            released += swallow::destroy_node(&mut self.registry, tk, root);
        }
        self.pointer = PointerState::default();

        debug!("Unloaded {}, {} proxies released", self.file, released);
        Ok(())
    }

    /// Apply the text class to every node of this handle.
    pub fn apply_font(&self, tk: &mut dyn SceneToolkit, font: &FontSettings, text_class: &str) {
        for key in self.registry.keys() {
            if let Some(record) = self.registry.get(key) {
                font.apply(tk, record.object, text_class);
            }
        }
    }

    /// Forward a toolkit emission to the host sink.
    pub fn on_signal(&mut self, tk: &dyn SceneToolkit, object: ObjectId, emission: &str, source: &str) -> bool {
        router::route_signal(&self.registry, tk, self.sink.as_mut(), object, emission, source)
    }

    pub fn activate_proxy(&mut self, tk: &mut dyn SceneToolkit, proxy: ProxyId) -> Result<(), ScriptError> {
        access::activate(&self.registry, tk, proxy)
    }

    pub fn feed_event(
        &mut self,
        tk: &mut dyn SceneToolkit,
        stale_after: f64,
        event: &InputEvent,
    ) -> Result<EventOutcome, ScriptError> {
        router::feed_event(&self.registry, tk, &mut self.pointer, stale_after, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::ScriptConfig;
    use crate::engine::events::SignalEvent;
    use crate::render::backends::null::NullToolkit;
    use crate::render::backend::LoadError;

    fn handle() -> (ScriptHandle, NullToolkit, FontSettings) {
        let sink = Box::new(|_: &SignalEvent| {});
        let font = FontSettings::new(&ScriptConfig::default());
        (ScriptHandle::new("main.edj", "main", sink), NullToolkit::new(), font)
    }

    #[test]
    fn color_needs_twelve_integers() {
        let (mut h, mut tk, font) = handle();
        h.load(&mut tk, &font, "tizen", 10, 10).unwrap();
        let root = h.object_of(None).unwrap();

        h.update_color(&mut tk, None, "bg", "1 2 3 4 5 6 7 8 9 10 11 12").unwrap();
        let colors = tk.object(root).unwrap().color_classes["bg"];
        assert_eq!(colors.outline, Rgba { r: 5, g: 6, b: 7, a: 8 });

        for bad in ["", "1 2 3", "1 2 3 4 5 6 7 8 9 10 11 12 13", "1 2 3 4 5 6 7 8 9 10 11 x"] {
            assert!(matches!(h.update_color(&mut tk, None, "bg", bad), Err(ScriptError::Invalid(_))), "{bad}");
        }
    }

    #[test]
    fn verbs_on_unknown_ids_are_not_exist() {
        let (mut h, mut tk, font) = handle();
        h.load(&mut tk, &font, "tizen", 10, 10).unwrap();

        assert!(matches!(h.update_signal(&mut tk, Some("nope"), "p", "s"), Err(ScriptError::NotExist(_))));
        assert!(matches!(h.update_text(&mut tk, Some("nope"), "p", "t"), Err(ScriptError::NotExist(_))));
        assert!(h.update_category(None, Some("news")).is_ok());
        assert_eq!(h.category(), Some("news"));
        h.update_category(Some("ignored"), None).unwrap();
        assert_eq!(h.category(), None);
    }

    #[test]
    fn text_on_a_missing_part_is_not_exist() {
        let (mut h, mut tk, font) = handle();
        h.load(&mut tk, &font, "tizen", 10, 10).unwrap();
        tk.hide_part("ghost");

        assert!(matches!(h.update_text(&mut tk, None, "ghost", "x"), Err(ScriptError::NotExist(_))));
    }

    #[test]
    fn second_load_is_invalid() {
        let (mut h, mut tk, font) = handle();
        h.load(&mut tk, &font, "tizen", 200, 100).unwrap();
        assert_eq!(h.size(), (200, 100));

        assert!(matches!(h.load(&mut tk, &font, "tizen", 1, 1), Err(ScriptError::Invalid(_))));
        assert_eq!(tk.live_objects(), 1);

        h.unload(&mut tk).unwrap();
        h.load(&mut tk, &font, "tizen", 1, 1).unwrap();
    }

    #[test]
    fn load_failures_map_to_errors() {
        let (mut h, mut tk, font) = handle();
        tk.fail_path("main.edj", || LoadError::OutOfMemory);

        assert!(matches!(h.load(&mut tk, &font, "tizen", 1, 1), Err(ScriptError::Memory)));
        assert!(!h.is_loaded());
    }

    #[test]
    fn resizing_the_root_updates_the_handle() {
        let (mut h, mut tk, font) = handle();
        h.load(&mut tk, &font, "tizen", 200, 100).unwrap();

        h.update_size(&mut tk, None, 300, 150).unwrap();
        assert_eq!(h.size(), (300, 150));
        assert_eq!(tk.geometry(h.object_of(None).unwrap()).width, 300);
    }

    #[test]
    fn drag_and_signal_reach_the_toolkit() {
        let (mut h, mut tk, font) = handle();
        h.load(&mut tk, &font, "tizen", 10, 10).unwrap();
        let root = h.object_of(None).unwrap();

        h.update_signal(&mut tk, None, "button", "show").unwrap();
        h.update_drag(&mut tk, None, "scroller", 0.5, 1.0).unwrap();

        let obj = tk.object(root).unwrap();
        assert_eq!(obj.signals, vec![("show".to_string(), "button".to_string())]);
        assert_eq!(obj.drags["scroller"], (0.5, 1.0));
    }
}
