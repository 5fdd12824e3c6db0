use crate::render::backend::{
    AccessAction, ColorClass, ImageLayout, LoadError, ObjectId, PointerEvent, ProxyId, SceneToolkit,
};
use crate::render::Rect;
use std::any::Any;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Natural size reported for every image the null toolkit loads.
pub const NULL_IMAGE_SIZE: (i32, i32) = (64, 48);

/// What a null object was created from.
#[derive(Clone, Debug, PartialEq)]
pub enum NullObjectKind {
    Layout { path: String, group: String },
    Image { path: String },
}

/// State of one object living in the null toolkit.
#[derive(Clone, Debug)]
pub struct NullObject {
    pub kind: NullObjectKind,
    pub geometry: Rect,
    pub texts: HashMap<String, String>,
    pub swallowed: HashMap<String, ObjectId>,
    pub color_classes: HashMap<String, ColorClass>,
    pub text_classes: HashMap<String, (String, i32)>,
    pub signals: Vec<(String, String)>,
    pub drags: HashMap<String, (f64, f64)>,
    pub image_layout: Option<ImageLayout>,
}

impl NullObject {
    fn new(kind: NullObjectKind) -> Self {
        Self {
            kind,
            geometry: Rect::default(),
            texts: HashMap::new(),
            swallowed: HashMap::new(),
            color_classes: HashMap::new(),
            text_classes: HashMap::new(),
            signals: Vec::new(),
            drags: HashMap::new(),
            image_layout: None,
        }
    }
}

/// A pointer event as it reached the null canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FedPointer {
    pub event: PointerEvent,
    pub x: i32,
    pub y: i32,
    pub timestamp: u32,
}

/// Null toolkit that keeps the scene in memory and draws nothing.
///
/// Every call is recorded so that headless hosts and tests can inspect what
/// the script port did. Failures can be injected per path or per part.
pub struct NullToolkit {
    next_id: u64,
    scale: f64,
    clock: f64,
    objects: BTreeMap<ObjectId, NullObject>,
    proxies: BTreeMap<ProxyId, (ObjectId, String, String)>,
    focus_chains: HashMap<ObjectId, Vec<ProxyId>>,
    highlighted: Option<ProxyId>,
    pointer_log: Vec<FedPointer>,
    action_log: Vec<AccessAction>,
    action_result: bool,
    highlight_available: bool,
    part_rects: HashMap<(ObjectId, String), Rect>,
    missing_parts: HashSet<String>,
    failing_paths: HashMap<String, fn() -> LoadError>,
    unregistered: usize,
}

impl Default for NullToolkit {
    fn default() -> Self {
        Self::new()
    }
}

impl NullToolkit {
    /// Creates an empty null toolkit with its clock at zero.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            scale: 1.0,
            clock: 0.0,
            objects: BTreeMap::new(),
            proxies: BTreeMap::new(),
            focus_chains: HashMap::new(),
            highlighted: None,
            pointer_log: Vec::new(),
            action_log: Vec::new(),
            action_result: true,
            highlight_available: true,
            part_rects: HashMap::new(),
            missing_parts: HashSet::new(),
            failing_paths: HashMap::new(),
            unregistered: 0,
        }
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Set the value returned by [`SceneToolkit::now`].
    pub fn set_now(&mut self, seconds: f64) {
        self.clock = seconds;
    }

    /// Make every load of `path` fail with the error built by `error`.
    pub fn fail_path(&mut self, path: &str, error: fn() -> LoadError) {
        self.failing_paths.insert(path.to_string(), error);
    }

    /// Pretend that no object has a part called `part`.
    pub fn hide_part(&mut self, part: &str) {
        self.missing_parts.insert(part.to_string());
    }

    pub fn set_part_geometry(&mut self, object: ObjectId, part: &str, rect: Rect) {
        self.part_rects.insert((object, part.to_string()), rect);
    }

    /// Place an object on the canvas without resizing it.
    pub fn move_object(&mut self, object: ObjectId, x: i32, y: i32) {
        if let Some(obj) = self.objects.get_mut(&object) {
            obj.geometry.translate(x, y);
        }
    }

    /// Result returned by [`SceneToolkit::dispatch_action`].
    pub fn set_action_result(&mut self, ok: bool) {
        self.action_result = ok;
    }

    /// Whether a successful highlight action leaves something highlighted.
    pub fn set_highlight_available(&mut self, available: bool) {
        self.highlight_available = available;
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn object(&self, object: ObjectId) -> Option<&NullObject> {
        self.objects.get(&object)
    }

    pub fn live_objects(&self) -> usize {
        self.objects.len()
    }

    pub fn live_proxies(&self) -> usize {
        self.proxies.len()
    }

    /// Number of proxies unregistered since creation.
    pub fn unregistered_proxies(&self) -> usize {
        self.unregistered
    }

    pub fn proxy_description(&self, proxy: ProxyId) -> Option<&str> {
        self.proxies.get(&proxy).map(|(_, _, description)| description.as_str())
    }

    pub fn focus_chain(&self, object: ObjectId) -> &[ProxyId] {
        self.focus_chains.get(&object).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn highlighted(&self) -> Option<ProxyId> {
        self.highlighted
    }

    pub fn pointer_log(&self) -> &[FedPointer] {
        &self.pointer_log
    }

    pub fn action_log(&self) -> &[AccessAction] {
        &self.action_log
    }

    fn load(&mut self, path: &str, kind: NullObjectKind) -> Result<ObjectId, LoadError> {
        if let Some(error) = self.failing_paths.get(path) {
            return Err(error());
        }

        let id = ObjectId(self.allocate());
        self.objects.insert(id, NullObject::new(kind));
        Ok(id)
    }
}

impl SceneToolkit for NullToolkit {
    fn name(&self) -> &str {
        "NullToolkit"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    fn now(&self) -> f64 {
        self.clock
    }

    fn load_layout(&mut self, path: &str, group: &str) -> Result<ObjectId, LoadError> {
        self.load(path, NullObjectKind::Layout { path: path.to_string(), group: group.to_string() })
    }

    fn load_image(&mut self, path: &str) -> Result<ObjectId, LoadError> {
        let id = self.load(path, NullObjectKind::Image { path: path.to_string() })?;
        if let Some(obj) = self.objects.get_mut(&id) {
            obj.geometry.resize(NULL_IMAGE_SIZE.0, NULL_IMAGE_SIZE.1);
        }
        Ok(id)
    }

    fn image_size(&self, image: ObjectId) -> (i32, i32) {
        match self.objects.get(&image) {
            Some(NullObject { kind: NullObjectKind::Image { .. }, .. }) => NULL_IMAGE_SIZE,
            _ => (0, 0),
        }
    }

    fn apply_image_layout(&mut self, image: ObjectId, layout: &ImageLayout) {
        if let Some(obj) = self.objects.get_mut(&image) {
            obj.geometry.resize(layout.size.0, layout.size.1);
            obj.image_layout = Some(*layout);
        }
    }

    fn delete_object(&mut self, object: ObjectId) {
        if self.objects.remove(&object).is_none() {
            return;
        }

        for obj in self.objects.values_mut() {
            obj.swallowed.retain(|_, content| *content != object);
        }
        self.focus_chains.remove(&object);
        self.part_rects.retain(|(owner, _), _| *owner != object);
    }

    fn resize(&mut self, object: ObjectId, width: i32, height: i32) {
        if let Some(obj) = self.objects.get_mut(&object) {
            obj.geometry.resize(width, height);
        }
    }

    fn geometry(&self, object: ObjectId) -> Rect {
        self.objects.get(&object).map(|obj| obj.geometry).unwrap_or_default()
    }

    fn part_exists(&self, object: ObjectId, part: &str) -> bool {
        self.objects.contains_key(&object) && !self.missing_parts.contains(part)
    }

    fn part_geometry(&self, object: ObjectId, part: &str) -> Option<Rect> {
        if !self.part_exists(object, part) {
            return None;
        }
        Some(self.part_rects.get(&(object, part.to_string())).copied().unwrap_or_default())
    }

    fn part_swallow(&mut self, object: ObjectId, part: &str, content: ObjectId) {
        if let Some(obj) = self.objects.get_mut(&object) {
            obj.swallowed.insert(part.to_string(), content);
        }
    }

    fn part_unswallow(&mut self, object: ObjectId, content: ObjectId) {
        if let Some(obj) = self.objects.get_mut(&object) {
            obj.swallowed.retain(|_, swallowed| *swallowed != content);
        }
    }

    fn part_swallowed(&self, object: ObjectId, part: &str) -> Option<ObjectId> {
        self.objects.get(&object)?.swallowed.get(part).copied()
    }

    fn part_text_set(&mut self, object: ObjectId, part: &str, text: &str) {
        if let Some(obj) = self.objects.get_mut(&object) {
            obj.texts.insert(part.to_string(), text.to_string());
        }
    }

    fn color_class_set(&mut self, object: ObjectId, class: &str, colors: &ColorClass) -> bool {
        match self.objects.get_mut(&object) {
            Some(obj) => {
                obj.color_classes.insert(class.to_string(), *colors);
                true
            }
            None => false,
        }
    }

    fn text_class_set(&mut self, object: ObjectId, class: &str, font: &str, size: i32) {
        if let Some(obj) = self.objects.get_mut(&object) {
            obj.text_classes.insert(class.to_string(), (font.to_string(), size));
        }
    }

    fn signal_emit(&mut self, object: ObjectId, emission: &str, source: &str) {
        if let Some(obj) = self.objects.get_mut(&object) {
            obj.signals.push((emission.to_string(), source.to_string()));
        }
    }

    fn part_drag_value_set(&mut self, object: ObjectId, part: &str, x: f64, y: f64) -> bool {
        if !self.part_exists(object, part) {
            return false;
        }
        if let Some(obj) = self.objects.get_mut(&object) {
            obj.drags.insert(part.to_string(), (x, y));
        }
        true
    }

    fn feed_pointer(&mut self, event: PointerEvent, x: i32, y: i32, timestamp: u32) {
        self.pointer_log.push(FedPointer { event, x, y, timestamp });
    }

    fn register_proxy(&mut self, object: ObjectId, part: &str) -> Result<ProxyId, LoadError> {
        if !self.part_exists(object, part) {
            return Err(LoadError::Construction);
        }

        let id = ProxyId(self.allocate());
        self.proxies.insert(id, (object, part.to_string(), String::new()));
        Ok(id)
    }

    fn unregister_proxy(&mut self, proxy: ProxyId) {
        if self.proxies.remove(&proxy).is_some() {
            self.unregistered += 1;
        }
        for chain in self.focus_chains.values_mut() {
            chain.retain(|p| *p != proxy);
        }
        if self.highlighted == Some(proxy) {
            self.highlighted = None;
        }
    }

    fn set_proxy_description(&mut self, proxy: ProxyId, description: &str) {
        if let Some((_, _, current)) = self.proxies.get_mut(&proxy) {
            *current = description.to_string();
        }
    }

    fn focus_chain_clear(&mut self, object: ObjectId) {
        self.focus_chains.remove(&object);
    }

    fn focus_chain_append(&mut self, object: ObjectId, proxy: ProxyId) {
        self.focus_chains.entry(object).or_default().push(proxy);
    }

    fn highlight_proxy(&mut self, proxy: ProxyId) -> bool {
        if !self.proxies.contains_key(&proxy) {
            return false;
        }
        self.highlighted = Some(proxy);
        true
    }

    fn dispatch_action(&mut self, object: ObjectId, action: &AccessAction) -> bool {
        self.action_log.push(*action);
        if !self.action_result || !self.objects.contains_key(&object) {
            return false;
        }

        match action {
            AccessAction::Highlight { .. } if self.highlight_available => {
                self.highlighted = self.focus_chain(object).first().copied();
            }
            AccessAction::Highlight { .. } | AccessAction::Unhighlight => {
                self.highlighted = None;
            }
            _ => {}
        }
        true
    }

    fn has_highlight(&self, object: ObjectId) -> bool {
        self.highlighted
            .and_then(|proxy| self.proxies.get(&proxy))
            .map(|(owner, _, _)| *owner == object)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deleting_an_object_unswallows_it() {
        let mut tk = NullToolkit::new();
        let layout = tk.load_layout("main.edj", "main").unwrap();
        let image = tk.load_image("icon.png").unwrap();

        tk.part_swallow(layout, "icon", image);
        assert_eq!(tk.part_swallowed(layout, "icon"), Some(image));

        tk.delete_object(image);
        assert_eq!(tk.part_swallowed(layout, "icon"), None);
        assert_eq!(tk.live_objects(), 1);
    }

    #[test]
    fn injected_failures_are_returned_per_path() {
        let mut tk = NullToolkit::new();
        tk.fail_path("broken.edj", || LoadError::Corrupt("broken.edj".into()));

        assert!(matches!(tk.load_layout("broken.edj", "main"), Err(LoadError::Corrupt(_))));
        assert!(tk.load_layout("fine.edj", "main").is_ok());
    }

    #[test]
    fn unregister_drops_proxy_from_focus_chains() {
        let mut tk = NullToolkit::new();
        let layout = tk.load_layout("main.edj", "main").unwrap();
        let proxy = tk.register_proxy(layout, "title").unwrap();
        tk.focus_chain_append(layout, proxy);

        tk.unregister_proxy(proxy);
        assert!(tk.focus_chain(layout).is_empty());
        assert_eq!(tk.unregistered_proxies(), 1);
    }

    #[test]
    fn hidden_parts_refuse_proxies() {
        let mut tk = NullToolkit::new();
        let layout = tk.load_layout("main.edj", "main").unwrap();
        tk.hide_part("ghost");

        assert!(!tk.part_exists(layout, "ghost"));
        assert!(tk.register_proxy(layout, "ghost").is_err());
    }
}
