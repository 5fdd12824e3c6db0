use std::collections::HashMap;
use log::{debug, error, warn};
use crate::engine::config::{ScriptConfig, ScriptConfigError};
use crate::engine::errors::ScriptError;
use crate::engine::events::{AccessStatus, EventKind, EventOutcome, OutputSink};
use crate::engine::font::FontSettings;
use crate::engine::handle::{HandleId, ScriptHandle};
use crate::engine::router::InputEvent;
use crate::render::backend::{ObjectId, ProxyId, SceneToolkit};

/// Script type served by this port.
pub const MAGIC_ID: &str = "edje";

/// Process-scoped script port.
///
/// Owns the toolkit and every live handle. Creating the port is `init`,
/// consuming it with [`ScriptPort::fini`] is `fini`; nothing can be called
/// outside that bracket.
pub struct ScriptPort {
    config: ScriptConfig,
    toolkit: Box<dyn SceneToolkit>,
    handles: HashMap<HandleId, ScriptHandle>,
    font: FontSettings,
}

impl ScriptPort {
    /// Start the port with default configuration and the given layout scale.
    /// A scale that does not validate falls back to the default one.
    pub fn init(toolkit: Box<dyn SceneToolkit>, scale: f64) -> Self {
        let config = ScriptConfig::builder().scale(scale).build().unwrap_or_else(|e| {
            warn!("Ignoring {}, using the default config", e);
            ScriptConfig::default()
        });
        Self::start(toolkit, config)
    }

    pub fn init_with_config(toolkit: Box<dyn SceneToolkit>, config: ScriptConfig) -> Result<Self, ScriptConfigError> {
        config.validate()?;
        Ok(Self::start(toolkit, config))
    }

    fn start(mut toolkit: Box<dyn SceneToolkit>, config: ScriptConfig) -> Self {
        debug!("Script port on {} with scale {}", toolkit.name(), config.scale);
        toolkit.set_scale(config.scale);

        Self {
            font: FontSettings::new(&config),
            config,
            toolkit,
            handles: HashMap::new(),
        }
    }

    /// Destroy every remaining handle and hand the toolkit back.
    pub fn fini(mut self) -> Box<dyn SceneToolkit> {
        let ids: Vec<HandleId> = self.handles.keys().copied().collect();
        for id in ids {
            if let Err(e) = self.destroy(id) {
                error!("Failed to destroy handle {}: {}", id, e);
            }
        }
        self.toolkit
    }

    pub fn magic_id(&self) -> &'static str {
        MAGIC_ID
    }

    pub fn config(&self) -> &ScriptConfig {
        &self.config
    }

    pub fn font(&self) -> &FontSettings {
        &self.font
    }

    pub fn toolkit(&self) -> &dyn SceneToolkit {
        self.toolkit.as_ref()
    }

    pub fn toolkit_mut(&mut self) -> &mut dyn SceneToolkit {
        self.toolkit.as_mut()
    }

    pub fn handle(&self, id: HandleId) -> Option<&ScriptHandle> {
        self.handles.get(&id)
    }

    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }

    fn handle_mut(&mut self, id: HandleId) -> Result<(&mut ScriptHandle, &mut (dyn SceneToolkit + 'static)), ScriptError> {
        let handle = self
            .handles
            .get_mut(&id)
            .ok_or_else(|| ScriptError::Invalid(format!("unknown handle {id}")))?;
        Ok((handle, self.toolkit.as_mut()))
    }

    /// Register a new handle for the layout `group` in `file`.
    pub fn create(&mut self, file: &str, group: &str, sink: Box<dyn OutputSink>) -> HandleId {
        let id = HandleId::new();
        self.handles.insert(id, ScriptHandle::new(file, group, sink));
        debug!("Created handle {} for {}:{}", id, file, group);
        id
    }

    /// Unload if needed and forget the handle.
    pub fn destroy(&mut self, id: HandleId) -> Result<(), ScriptError> {
        let mut handle = self
            .handles
            .remove(&id)
            .ok_or_else(|| ScriptError::Invalid(format!("unknown handle {id}")))?;
        handle.unload(self.toolkit.as_mut())?;
        debug!("Destroyed handle {}", id);
        Ok(())
    }

    pub fn load(&mut self, id: HandleId, width: i32, height: i32) -> Result<(), ScriptError> {
        let handle = self
            .handles
            .get_mut(&id)
            .ok_or_else(|| ScriptError::Invalid(format!("unknown handle {id}")))?;
        handle.load(self.toolkit.as_mut(), &self.font, &self.config.text_class, width, height)
    }

    pub fn unload(&mut self, id: HandleId) -> Result<(), ScriptError> {
        let (handle, tk) = self.handle_mut(id)?;
        handle.unload(tk)
    }

    pub fn update_color(&mut self, id: HandleId, obj: Option<&str>, part: &str, rgba: &str) -> Result<(), ScriptError> {
        let (handle, tk) = self.handle_mut(id)?;
        handle.update_color(tk, obj, part, rgba)
    }

    pub fn update_text(&mut self, id: HandleId, obj: Option<&str>, part: &str, text: &str) -> Result<(), ScriptError> {
        let (handle, tk) = self.handle_mut(id)?;
        handle.update_text(tk, obj, part, text)
    }

    pub fn update_image(
        &mut self,
        id: HandleId,
        obj: Option<&str>,
        part: &str,
        path: &str,
        option: &str,
    ) -> Result<(), ScriptError> {
        let (handle, tk) = self.handle_mut(id)?;
        handle.update_image(tk, obj, part, path, option)
    }

    pub fn update_accessibility(
        &mut self,
        id: HandleId,
        obj: Option<&str>,
        part: &str,
        text: &str,
        option: &str,
    ) -> Result<(), ScriptError> {
        let (handle, tk) = self.handle_mut(id)?;
        handle.update_accessibility(tk, obj, part, text, option)
    }

    pub fn operate_accessibility(
        &mut self,
        id: HandleId,
        obj: Option<&str>,
        part: &str,
        operation: &str,
        option: &str,
    ) -> Result<AccessStatus, ScriptError> {
        let (handle, tk) = self.handle_mut(id)?;
        handle.operate_accessibility(tk, obj, part, operation, option)
    }

    pub fn update_script(
        &mut self,
        id: HandleId,
        src_id: Option<&str>,
        target_id: Option<&str>,
        part: &str,
        path: &str,
        group: &str,
    ) -> Result<(), ScriptError> {
        let handle = self
            .handles
            .get_mut(&id)
            .ok_or_else(|| ScriptError::Invalid(format!("unknown handle {id}")))?;
        handle.update_script(
            self.toolkit.as_mut(),
            &self.font,
            &self.config.text_class,
            src_id,
            target_id,
            part,
            path,
            group,
        )
    }

    pub fn update_signal(&mut self, id: HandleId, obj: Option<&str>, part: &str, signal: &str) -> Result<(), ScriptError> {
        let (handle, tk) = self.handle_mut(id)?;
        handle.update_signal(tk, obj, part, signal)
    }

    pub fn update_drag(&mut self, id: HandleId, obj: Option<&str>, part: &str, x: f64, y: f64) -> Result<(), ScriptError> {
        let (handle, tk) = self.handle_mut(id)?;
        handle.update_drag(tk, obj, part, x, y)
    }

    pub fn update_size(&mut self, id: HandleId, obj: Option<&str>, width: i32, height: i32) -> Result<(), ScriptError> {
        let (handle, tk) = self.handle_mut(id)?;
        handle.update_size(tk, obj, width, height)
    }

    pub fn update_category(&mut self, id: HandleId, obj: Option<&str>, category: Option<&str>) -> Result<(), ScriptError> {
        let (handle, _) = self.handle_mut(id)?;
        handle.update_category(obj, category)
    }

    /// Inject a host event. `timestamp` is in seconds on the toolkit clock.
    pub fn feed_event(
        &mut self,
        id: HandleId,
        event_type: u32,
        x: i32,
        y: i32,
        down: i32,
        timestamp: f64,
    ) -> Result<EventOutcome, ScriptError> {
        let event = InputEvent {
            kind: EventKind::from_raw(event_type)?,
            x,
            y,
            down,
            timestamp,
        };
        let stale_after = self.config.stale_pointer_threshold;
        let (handle, tk) = self.handle_mut(id)?;
        handle.feed_event(tk, stale_after, &event)
    }

    /// Toolkit callback: `source` of `object` emitted `emission`.
    pub fn dispatch_signal(
        &mut self,
        id: HandleId,
        object: ObjectId,
        emission: &str,
        source: &str,
    ) -> Result<(), ScriptError> {
        let (handle, tk) = self.handle_mut(id)?;
        if handle.on_signal(tk, object, emission, source) {
            Ok(())
        } else {
            Err(ScriptError::NotExist(format!("{object} does not belong to handle {id}")))
        }
    }

    /// Toolkit callback: a screen reader activated `proxy`.
    pub fn activate_proxy(&mut self, id: HandleId, proxy: ProxyId) -> Result<(), ScriptError> {
        let (handle, tk) = self.handle_mut(id)?;
        handle.activate_proxy(tk, proxy)
    }

    /// System font notification. Reapplies the text class to every loaded node
    /// when the font actually changed.
    pub fn on_font_changed(&mut self, font: Option<&str>, size: i32) {
        if !self.font.update(font, size) {
            return;
        }

        let tk = self.toolkit.as_mut();
        for handle in self.handles.values() {
            handle.apply_font(tk, &self.font, &self.config.text_class);
        }
    }
}
