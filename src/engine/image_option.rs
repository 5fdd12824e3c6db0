//! Image directive mini-language.
//!
//! Image updates carry an option string such as
//! `"aspect=true;fill=over-size;size=120x80"`. [`ImageOption::parse`] decodes it
//! with a small character state machine: each key is matched greedily against
//! the keyword table, backtracking to the start of the key on a mismatch and
//! trying the next keyword. A key that matches nothing is skipped up to the
//! next `;`, so a bad directive never hides the ones that follow it.
//!
//! ```
//! use scene_script::image_option::{FillMode, ImageOption};
//!
//! let opt = ImageOption::parse("bogus=1; aspect=true;fill=in-size");
//! assert!(opt.aspect);
//! assert_eq!(opt.fill, FillMode::InSize);
//! ```

use crate::render::backend::ImageLayout;
use crate::render::Rect;

/// How an aspect-preserving image is fitted into its slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillMode {
    #[default]
    Disabled,
    /// Scale to fit inside the slot
    InSize,
    /// Scale to cover the slot, cropping the overflow
    OverSize,
}

/// Decoded image directives for a single image update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageOption {
    pub orient: bool,
    pub aspect: bool,
    pub fill: FillMode,
    /// Explicit width, `-1` when unset.
    pub width: i32,
    /// Explicit height, `-1` when unset.
    pub height: i32,
}

impl Default for ImageOption {
    fn default() -> Self {
        Self {
            orient: false,
            aspect: false,
            fill: FillMode::Disabled,
            width: -1,
            height: -1,
        }
    }
}

type Handler = fn(&mut ImageOption, &str);

const KEYWORDS: [(&str, Handler); 4] = [
    ("aspect", parse_aspect),
    ("orient", parse_orient),
    ("size", parse_size),
    ("fill", parse_fill),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Start,
    Token,
    Data,
    Ignore,
    Error,
    End,
}

fn strip_leading_spaces(value: &str) -> &str {
    value.trim_start_matches(' ')
}

fn parse_aspect(opt: &mut ImageOption, value: &str) {
    opt.aspect = strip_leading_spaces(value).eq_ignore_ascii_case("true");
}

fn parse_orient(opt: &mut ImageOption, value: &str) {
    opt.orient = strip_leading_spaces(value).eq_ignore_ascii_case("true");
}

fn parse_size(opt: &mut ImageOption, value: &str) {
    let Some((w, h)) = strip_leading_spaces(value).split_once('x') else {
        return;
    };

    if let (Ok(width), Ok(height)) = (w.parse::<i32>(), h.parse::<i32>()) {
        opt.width = width;
        opt.height = height;
    }
}

fn parse_fill(opt: &mut ImageOption, value: &str) {
    let value = strip_leading_spaces(value);
    opt.fill = if value.eq_ignore_ascii_case("in-size") {
        FillMode::InSize
    } else if value.eq_ignore_ascii_case("over-size") {
        FillMode::OverSize
    } else {
        FillMode::Disabled
    };
}

impl ImageOption {
    /// Parse a `key=value;...` directive string. Never fails: unknown keys and
    /// malformed values leave the defaults in place.
    pub fn parse(option: &str) -> ImageOption {
        let mut opt = ImageOption::default();
        let bytes = option.as_bytes();
        let at = |pos: usize| bytes.get(pos).copied().unwrap_or(0);

        let mut state = State::Start;
        let mut pos = 0;
        let mut tag = 0;
        let mut idx = 0;
        let mut token_start = 0;
        let mut value_start = 0;

        while state != State::End {
            let c = at(pos);
            match state {
                State::Start => {
                    if c == 0 {
                        state = State::End;
                        continue;
                    }
                    if c.is_ascii_alphabetic() {
                        // re-read this character as the first one of the key
                        state = State::Token;
                        token_start = pos;
                        tag = 0;
                        idx = 0;
                        continue;
                    }
                    pos += 1;
                }
                State::Token => {
                    let keyword = KEYWORDS[tag].0.as_bytes();
                    if idx == keyword.len() && matches!(c, b' ' | b'\t' | b'=') {
                        if c == b'=' {
                            value_start = pos + 1;
                            state = State::Data;
                        } else {
                            state = State::Ignore;
                        }
                        idx = 0;
                        pos += 1;
                    } else if c == 0 {
                        state = State::End;
                    } else if idx < keyword.len() && keyword[idx] == c {
                        idx += 1;
                        pos += 1;
                    } else {
                        pos = token_start;
                        idx = 0;
                        tag += 1;
                        if tag == KEYWORDS.len() {
                            tag = 0;
                            state = State::Error;
                        }
                    }
                }
                State::Ignore => {
                    match c {
                        b'=' => {
                            value_start = pos + 1;
                            state = State::Data;
                        }
                        b';' => state = State::Start,
                        0 => state = State::End,
                        _ => {}
                    }
                    pos += 1;
                }
                State::Data => {
                    if c == b';' || c == 0 {
                        (KEYWORDS[tag].1)(&mut opt, &option[value_start..pos]);
                        state = if c == 0 { State::End } else { State::Start };
                    }
                    pos += 1;
                }
                State::Error => {
                    match c {
                        b';' => state = State::Start,
                        0 => state = State::End,
                        _ => {}
                    }
                    pos += 1;
                }
                State::End => {}
            }
        }

        opt
    }

    /// True when an explicit `size` directive was given.
    pub fn has_size(&self) -> bool {
        self.width >= 0 && self.height >= 0
    }

    /// Compute how an image with `natural` pixel size is placed into a slot
    /// whose geometry is `part`.
    pub fn layout_for(&self, natural: (i32, i32), part: Option<Rect>) -> ImageLayout {
        let (w, h) = if self.has_size() { (self.width, self.height) } else { natural };

        let plain = ImageLayout {
            size: (w, h),
            fill: Rect::sized(w, h),
            aspect_hint: None,
            honor_orientation: self.orient,
        };

        if !self.aspect || w <= 0 || h <= 0 {
            return plain;
        }

        let scale_into = |part: &Rect| -> Option<f64> {
            let sx = part.width as f64 / w as f64;
            let sy = part.height as f64 / h as f64;
            match self.fill {
                FillMode::InSize => Some(sx.min(sy)),
                FillMode::OverSize => Some(sx.max(sy)),
                FillMode::Disabled => None,
            }
        };

        let fitted = part
            .filter(|part| !part.is_empty())
            .and_then(|part| scale_into(&part).map(|scale| (part, scale)));

        match fitted {
            Some((part, scale)) => {
                let fw = (w as f64 * scale).round() as i32;
                let fh = (h as f64 * scale).round() as i32;
                ImageLayout {
                    size: (part.width, part.height),
                    fill: Rect::new((part.width - fw) / 2, (part.height - fh) / 2, fw, fh),
                    aspect_hint: None,
                    honor_orientation: self.orient,
                }
            }
            None => ImageLayout {
                aspect_hint: Some((w, h)),
                ..plain
            },
        }
    }
}

impl From<&str> for ImageOption {
    fn from(option: &str) -> Self {
        ImageOption::parse(option)
    }
}
