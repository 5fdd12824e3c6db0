use log::debug;
use crate::engine::config::ScriptConfig;
use crate::render::backend::{ObjectId, SceneToolkit};

/// Cached system font, applied to every layout through one text class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontSettings {
    pub font: Option<String>,
    pub size: i32,
}

impl FontSettings {
    pub fn new(config: &ScriptConfig) -> Self {
        Self {
            font: config.default_font.clone(),
            size: config.default_font_size,
        }
    }

    /// Store a new font. Returns true when anything changed.
    pub fn update(&mut self, font: Option<&str>, size: i32) -> bool {
        let font = font.filter(|f| !f.is_empty()).map(str::to_string).or_else(|| self.font.clone());
        if font == self.font && size == self.size {
            return false;
        }

        debug!("Font changed to {:?} ({})", font, size);
        self.font = font;
        self.size = size;
        true
    }

    /// Apply the text class to `object`. Nothing happens until a font is known.
    pub fn apply(&self, tk: &mut dyn SceneToolkit, object: ObjectId, class: &str) {
        if let Some(font) = &self.font {
            tk.text_class_set(object, class, font, self.size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::null::NullToolkit;

    #[test]
    fn update_reports_changes_only() {
        let mut font = FontSettings::new(&ScriptConfig::default());
        assert_eq!(font.font, None);

        assert!(font.update(Some("Sans"), -100));
        assert!(!font.update(Some("Sans"), -100));
        assert!(font.update(None, 24));
        assert_eq!(font.font.as_deref(), Some("Sans"));
        assert_eq!(font.size, 24);
    }

    #[test]
    fn apply_waits_for_a_font() {
        let mut tk = NullToolkit::new();
        let object = tk.load_layout("main.edj", "main").unwrap();
        let mut font = FontSettings::new(&ScriptConfig::default());

        font.apply(&mut tk, object, "tizen");
        assert!(tk.object(object).unwrap().text_classes.is_empty());

        font.update(Some("Serif"), 12);
        font.apply(&mut tk, object, "tizen");
        assert_eq!(
            tk.object(object).unwrap().text_classes.get("tizen"),
            Some(&("Serif".to_string(), 12))
        );
    }
}
