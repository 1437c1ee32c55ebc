//! # Annotation Module
//!
//! Positioned text overlays (watermarks and visible signature marks).
//!
//! An [`AnnotationSpec`] describes *what* to draw and *where*; the
//! [`compositor`] turns it into one `/Watermark` annotation per selected page
//! and returns a new [`Document`](crate::document::Document). Overlays are
//! purely cosmetic: they never change the page count and are never covered by
//! a signature.
//!
//! ```
//! use pdfseal::annotation::{AnnotationSpec, Position};
//!
//! let spec = AnnotationSpec::new("CONFIDENTIAL")
//!     .with_position(Position::Center)
//!     .with_rotation(45.0)
//!     .with_opacity(0.3)
//!     .with_pages("odd".parse().unwrap());
//! assert!(spec.validate().is_ok());
//! assert_eq!(
//!     spec.metadata_suffix(),
//!     "[fs:12|c:black|pos:center|rot:45|op:0.3]"
//! );
//! ```

pub mod compositor;
pub mod pages;

pub use compositor::apply_annotation;
pub use pages::{PageSelection, describe_pages};

use crate::error::AnnotationError;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_FONT_SIZE: f64 = 12.0;
pub const DEFAULT_COLOR: &str = "black";

/// Named anchor for an overlay, relative to the page's media box.
///
/// Anchors refer to the unrotated media box. A page's `/Rotate` is not
/// applied, so on a page displayed at 90 degrees `TopLeft` lands in the
/// visual top-right corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::TopLeft => "top-left",
            Position::TopRight => "top-right",
            Position::BottomLeft => "bottom-left",
            Position::BottomRight => "bottom-right",
            Position::Center => "center",
        }
    }
}

impl FromStr for Position {
    type Err = AnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "topleft" => Ok(Position::TopLeft),
            "topright" => Ok(Position::TopRight),
            "bottomleft" => Ok(Position::BottomLeft),
            "bottomright" => Ok(Position::BottomRight),
            "center" | "centre" | "middle" => Ok(Position::Center),
            _ => Err(AnnotationError::InvalidPosition(s.to_string())),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An RGB color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color::rgb8(0, 0, 0);

    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        }
    }

    /// Parse a named color or a `#RGB` / `#RRGGBB` hex value (the `#` is
    /// optional).
    pub fn parse(value: &str) -> Result<Self, AnnotationError> {
        let trimmed = value.trim();
        if let Some(color) = named_color(&trimmed.to_ascii_lowercase()) {
            return Ok(color);
        }
        parse_hex_color(trimmed).ok_or_else(|| AnnotationError::InvalidColor(value.to_string()))
    }
}

fn named_color(name: &str) -> Option<Color> {
    let color = match name {
        "black" => Color::rgb8(0, 0, 0),
        "white" => Color::rgb8(255, 255, 255),
        "red" => Color::rgb8(255, 0, 0),
        "green" => Color::rgb8(0, 128, 0),
        "lime" => Color::rgb8(0, 255, 0),
        "blue" => Color::rgb8(0, 0, 255),
        "navy" => Color::rgb8(0, 0, 128),
        "yellow" => Color::rgb8(255, 255, 0),
        "orange" => Color::rgb8(255, 165, 0),
        "purple" => Color::rgb8(128, 0, 128),
        "magenta" => Color::rgb8(255, 0, 255),
        "cyan" => Color::rgb8(0, 255, 255),
        "maroon" => Color::rgb8(128, 0, 0),
        "gray" | "grey" => Color::rgb8(128, 128, 128),
        "lightgray" | "lightgrey" => Color::rgb8(211, 211, 211),
        "darkgray" | "darkgrey" => Color::rgb8(169, 169, 169),
        _ => return None,
    };
    Some(color)
}

fn parse_hex_color(value: &str) -> Option<Color> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let expand = |i: usize| channel(&hex[i..i + 1].repeat(2));
            Some(Color::rgb8(expand(0)?, expand(1)?, expand(2)?))
        }
        6 => Some(Color::rgb8(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        _ => None,
    }
}

/// Options for one text overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationSpec {
    pub text: String,
    pub font_size: f64,
    /// Named color or hex value; parsed by [`Color::parse`].
    pub color: String,
    pub position: Position,
    /// Explicit baseline origin; used only when both coordinates are set.
    pub x_position: Option<f64>,
    pub y_position: Option<f64>,
    pub pages: PageSelection,
    /// Degrees, counter-clockwise, about the centre of the text.
    pub rotation: f64,
    pub opacity: f64,
}

impl Default for AnnotationSpec {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: DEFAULT_FONT_SIZE,
            color: DEFAULT_COLOR.to_string(),
            position: Position::default(),
            x_position: None,
            y_position: None,
            pages: PageSelection::All,
            rotation: 0.0,
            opacity: 1.0,
        }
    }
}

impl AnnotationSpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_coordinates(mut self, x: f64, y: f64) -> Self {
        self.x_position = Some(x);
        self.y_position = Some(y);
        self
    }

    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    /// Explicit coordinates, when both are present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.x_position.zip(self.y_position)
    }

    /// Check numeric ranges and the color, returning the parsed color.
    pub fn validate(&self) -> Result<Color, AnnotationError> {
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(AnnotationError::InvalidSpec(format!(
                "font size must be positive, got {}",
                self.font_size
            )));
        }
        if !self.opacity.is_finite() || !(0.0..=1.0).contains(&self.opacity) {
            return Err(AnnotationError::InvalidSpec(format!(
                "opacity must be between 0 and 1, got {}",
                self.opacity
            )));
        }
        if !self.rotation.is_finite() {
            return Err(AnnotationError::InvalidSpec(
                "rotation must be a finite number of degrees".to_string(),
            ));
        }
        if let Some((x, y)) = self.coordinates() {
            if !x.is_finite() || !y.is_finite() {
                return Err(AnnotationError::InvalidSpec(
                    "coordinates must be finite".to_string(),
                ));
            }
        }
        Color::parse(&self.color)
    }

    /// Cosmetic settings rendered as `[fs:..|c:..|pos:..|rot:..|op:..]`.
    ///
    /// Appended to a signature's visible text for display. It is not part of
    /// the signed content.
    pub fn metadata_suffix(&self) -> String {
        let position = match self.coordinates() {
            Some((x, y)) => format!("{x},{y}"),
            None => self.position.to_string(),
        };
        format!(
            "[fs:{}|c:{}|pos:{}|rot:{}|op:{}]",
            self.font_size, self.color, position, self.rotation, self.opacity
        )
    }
}
