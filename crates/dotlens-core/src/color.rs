//! Color handling for Dotlens scenes
//!
//! This module provides the [`Color`] type which wraps the `DynamicColor` type
//! from the color crate. Graphviz accepts a few spellings CSS does not
//! (`"H S V"` triples, `/scheme/name` prefixes), so [`Color::from_graphviz`]
//! normalizes those before handing the string to the CSS parser.

use std::{
    hash::{Hash, Hasher},
    str::FromStr,
};

use color::DynamicColor;

/// Wrapper around the `DynamicColor` type from the color crate
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    color: DynamicColor,
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl Color {
    /// Create a new `Color` from a CSS color string such as `"#ff0000"` or `"red"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dotlens_core::color::Color;
    ///
    /// let red = Color::new("#ff0000").unwrap();
    /// let blue = Color::new("blue").unwrap();
    /// ```
    pub fn new(color_str: &str) -> Result<Self, String> {
        match DynamicColor::from_str(color_str) {
            Ok(color) => Ok(Self { color }),
            Err(err) => Err(format!("invalid color `{color_str}`: {err}")),
        }
    }

    /// Parses a color as written in a DOT attribute or an xdot `C`/`c` op.
    ///
    /// Accepts everything [`Color::new`] accepts, plus:
    /// - HSV triples with components in `0..=1`, separated by spaces or commas
    ///   (`"0.650 0.700 0.700"`)
    /// - color scheme prefixes (`"/x11/lightgrey"`), which are dropped
    ///
    /// # Examples
    ///
    /// ```
    /// use dotlens_core::color::Color;
    ///
    /// let grey = Color::from_graphviz("/x11/lightgrey").unwrap();
    /// let hsv = Color::from_graphviz("0.0 1.0 1.0").unwrap();
    /// assert_eq!(hsv, Color::new("#ff0000").unwrap());
    /// # let _ = grey;
    /// ```
    pub fn from_graphviz(value: &str) -> Result<Self, String> {
        let trimmed = value.trim();
        let name = match trimmed.strip_prefix('/') {
            Some(rest) => rest.rsplit('/').next().unwrap_or(rest),
            None => trimmed,
        };

        if let Some(hex) = hsv_to_hex(name) {
            return Self::new(&hex);
        }
        Self::new(name)
    }

    /// Returns a sanitized, ID-safe string representation of this color.
    ///
    /// The result contains only alphanumeric characters and underscores, and
    /// starts with a letter, so it can be used in SVG marker ids.
    pub fn to_id_safe_string(self) -> String {
        let color_str = self.to_string();
        let mut sanitized = color_str
            .replace('#', "hex")
            .replace(['(', ')', ',', ' ', ';', '.', '%', '/'], "_");

        if sanitized.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            sanitized = format!("c_{sanitized}");
        }

        sanitized
    }

    /// Creates a new color with the specified alpha value.
    pub fn with_alpha(self, alpha: f32) -> Self {
        Color {
            color: self.color.with_alpha(alpha),
        }
    }

    /// Returns the alpha (transparency) component of this color.
    pub fn alpha(&self) -> f32 {
        self.color.components[3]
    }
}

/// Converts a Graphviz `"H S V"` string into a `#rrggbb` hex string.
fn hsv_to_hex(value: &str) -> Option<String> {
    let parts: Vec<f32> = value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .map(str::parse::<f32>)
        .collect::<Result<_, _>>()
        .ok()?;
    let [h, s, v] = parts.as_slice() else {
        return None;
    };
    let (h, s, v) = (h.clamp(0.0, 1.0), s.clamp(0.0, 1.0), v.clamp(0.0, 1.0));

    let sector = h * 6.0;
    let i = sector.floor();
    let f = sector - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match (i as i32).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    let to_byte = |c: f32| (c * 255.0).round() as u8;
    Some(format!(
        "#{:02x}{:02x}{:02x}",
        to_byte(r),
        to_byte(g),
        to_byte(b)
    ))
}

impl Default for Color {
    fn default() -> Self {
        Self::new("black").expect("'black' is a valid CSS color")
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.color)
    }
}

impl From<&Color> for svg::node::Value {
    fn from(color: &Color) -> Self {
        Self::from(color.to_string())
    }
}
