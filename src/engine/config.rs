//! Script port configuration.
//!
//! `ScriptConfig` controls the process-wide behaviour of a
//! [`ScriptPort`](crate::engine::port::ScriptPort): the layout scale applied on
//! `init`, the text class that follows the system font, and the staleness
//! window for injected pointer events.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use scene_script::ScriptConfig;
//! let cfg = ScriptConfig::default();
//! assert_eq!(cfg.text_class, "tizen");
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use scene_script::ScriptConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = ScriptConfig::builder()
//!     .scale(1.5)
//!     .default_font("Sans")
//!     .stale_pointer_threshold(0.25)
//!     .build()?;
//! # Ok(()) }
//! ```
//!
//! # Errors
//!
//! Builder validation returns [`ScriptConfigError`] for a non-positive scale,
//! a negative staleness window or an empty text class.

use std::fmt;

/// Text class that tracks the system font.
pub const DEFAULT_TEXT_CLASS: &str = "tizen";

/// Font size meaning "toolkit default, scaled".
pub const DEFAULT_FONT_SIZE: i32 = -100;

#[derive(Debug, Clone)]
pub struct ScriptConfig {
    pub scale: f64,
    pub text_class: String,
    /// Pointer events older than this many seconds are dropped unless a button is held.
    pub stale_pointer_threshold: f64,
    pub default_font: Option<String>,
    pub default_font_size: i32,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            text_class: DEFAULT_TEXT_CLASS.to_string(),
            stale_pointer_threshold: 0.1,
            default_font: None,
            default_font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl ScriptConfig {
    pub fn builder() -> ScriptConfigBuilder {
        ScriptConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), ScriptConfigError> {
        validate(self)
    }
}

/// Builder for [`ScriptConfig`].
#[derive(Debug, Clone, Default)]
pub struct ScriptConfigBuilder {
    inner: ScriptConfig,
}

impl ScriptConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut ScriptConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn scale(self, scale: f64) -> Self { self.map(|c| c.scale = scale) }
    pub fn text_class<S: Into<String>>(self, class: S) -> Self { self.map(|c| c.text_class = class.into()) }
    pub fn stale_pointer_threshold(self, seconds: f64) -> Self { self.map(|c| c.stale_pointer_threshold = seconds) }
    pub fn default_font<S: Into<String>>(self, font: S) -> Self { self.map(|c| c.default_font = Some(font.into())) }
    pub fn default_font_size(self, size: i32) -> Self { self.map(|c| c.default_font_size = size) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut ScriptConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<ScriptConfig, ScriptConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptConfigError {
    InvalidScale(f64),
    InvalidThreshold(f64),
    EmptyTextClass,
}

impl fmt::Display for ScriptConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptConfigError::InvalidScale(s) =>
                write!(f, "scale {s} must be a finite value above zero"),
            ScriptConfigError::InvalidThreshold(t) =>
                write!(f, "stale_pointer_threshold {t} must be a finite, non-negative number of seconds"),
            ScriptConfigError::EmptyTextClass =>
                write!(f, "text_class must not be empty"),
        }
    }
}
impl std::error::Error for ScriptConfigError {}

fn validate(c: &ScriptConfig) -> Result<(), ScriptConfigError> {
    if !c.scale.is_finite() || c.scale <= 0.0 {
        return Err(ScriptConfigError::InvalidScale(c.scale));
    }
    if !c.stale_pointer_threshold.is_finite() || c.stale_pointer_threshold < 0.0 {
        return Err(ScriptConfigError::InvalidThreshold(c.stale_pointer_threshold));
    }
    if c.text_class.is_empty() {
        return Err(ScriptConfigError::EmptyTextClass);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(ScriptConfig::builder().build().is_ok());
    }

    #[test]
    fn builder_applies_fields() {
        let cfg = ScriptConfig::builder()
            .scale(2.0)
            .text_class("custom")
            .default_font("Sans")
            .default_font_size(18)
            .build()
            .unwrap();

        assert_eq!(cfg.scale, 2.0);
        assert_eq!(cfg.text_class, "custom");
        assert_eq!(cfg.default_font.as_deref(), Some("Sans"));
        assert_eq!(cfg.default_font_size, 18);
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            ScriptConfig::builder().scale(0.0).build().unwrap_err(),
            ScriptConfigError::InvalidScale(0.0)
        );
        assert!(matches!(
            ScriptConfig::builder().scale(f64::NAN).build(),
            Err(ScriptConfigError::InvalidScale(_))
        ));
        assert_eq!(
            ScriptConfig::builder().stale_pointer_threshold(-1.0).build().unwrap_err(),
            ScriptConfigError::InvalidThreshold(-1.0)
        );
        assert_eq!(
            ScriptConfig::builder().text_class("").build().unwrap_err(),
            ScriptConfigError::EmptyTextClass
        );
    }
}
