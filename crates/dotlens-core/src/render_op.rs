//! Render operations: the drawing payload attached to graph elements.
//!
//! A layout pass turns every element's xdot draw attributes into a vector of
//! [`RenderOp`]s. Each op has a [`RenderOpKind`] with a single-character xdot
//! code, a list of integer coordinates or parameters, and an optional string
//! payload (text content, color, font or style name, image path).
//!
//! | Code      | Kind                      | Integers                  | Text      |
//! |-----------|---------------------------|---------------------------|-----------|
//! | `E` / `e` | filled / unfilled ellipse | cx, cy, rx, ry            |           |
//! | `P` / `p` | filled / unfilled polygon | n, x1, y1 … xn, yn        |           |
//! | `L`       | polyline                  | n, x1, y1 … xn, yn        |           |
//! | `b` / `B` | filled / unfilled bezier  | n, x1, y1 … xn, yn        |           |
//! | `T`       | text                      | x, y, align, width        | content   |
//! | `C` / `c` | fill / pen color          |                           | color     |
//! | `F`       | font                      | size                      | font name |
//! | `S`       | style                     |                           | style     |
//! | `I`       | image                     | x, y, w, h                | path      |
//! | `t`       | font characteristics      | flags                     |           |
//!
//! Coordinates are in layout space (bottom-left origin).

use std::fmt;

/// The kind of a render operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderOpKind {
    FilledEllipse,
    UnfilledEllipse,
    FilledPolygon,
    UnfilledPolygon,
    Polyline,
    FilledBezier,
    UnfilledBezier,
    Text,
    FillColor,
    PenColor,
    Font,
    Style,
    Image,
    FontCharacteristics,
}

impl RenderOpKind {
    /// The xdot op code for this kind.
    pub fn code(self) -> char {
        match self {
            Self::FilledEllipse => 'E',
            Self::UnfilledEllipse => 'e',
            Self::FilledPolygon => 'P',
            Self::UnfilledPolygon => 'p',
            Self::Polyline => 'L',
            Self::FilledBezier => 'b',
            Self::UnfilledBezier => 'B',
            Self::Text => 'T',
            Self::FillColor => 'C',
            Self::PenColor => 'c',
            Self::Font => 'F',
            Self::Style => 'S',
            Self::Image => 'I',
            Self::FontCharacteristics => 't',
        }
    }

    /// Looks a kind up by its xdot op code.
    pub fn from_code(code: char) -> Option<Self> {
        let kind = match code {
            'E' => Self::FilledEllipse,
            'e' => Self::UnfilledEllipse,
            'P' => Self::FilledPolygon,
            'p' => Self::UnfilledPolygon,
            'L' => Self::Polyline,
            'b' => Self::FilledBezier,
            'B' => Self::UnfilledBezier,
            'T' => Self::Text,
            'C' => Self::FillColor,
            'c' => Self::PenColor,
            'F' => Self::Font,
            'S' => Self::Style,
            'I' => Self::Image,
            't' => Self::FontCharacteristics,
            _ => return None,
        };
        Some(kind)
    }

    /// True for kinds whose integers are a point count followed by that many points.
    pub fn has_point_list(self) -> bool {
        matches!(
            self,
            Self::FilledPolygon
                | Self::UnfilledPolygon
                | Self::Polyline
                | Self::FilledBezier
                | Self::UnfilledBezier
        )
    }

    /// True for kinds that paint their interior with the current fill color.
    pub fn is_filled(self) -> bool {
        matches!(
            self,
            Self::FilledEllipse | Self::FilledPolygon | Self::FilledBezier
        )
    }

    /// True for kinds that change drawing state instead of drawing.
    pub fn is_state(self) -> bool {
        matches!(
            self,
            Self::FillColor | Self::PenColor | Self::Font | Self::Style | Self::FontCharacteristics
        )
    }
}

impl fmt::Display for RenderOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One drawing instruction.
///
/// # Examples
///
/// ```
/// use dotlens_core::render_op::{RenderOp, RenderOpKind};
///
/// let ellipse = RenderOp::new(RenderOpKind::UnfilledEllipse, vec![27, 18, 27, 18]);
/// let label = RenderOp::with_text(RenderOpKind::Text, vec![27, 14, 0, 7], "a");
///
/// assert_eq!(ellipse.kind().code(), 'e');
/// assert_eq!(label.text(), Some("a"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOp {
    kind: RenderOpKind,
    integers: Vec<i32>,
    text: Option<String>,
}

impl RenderOp {
    pub fn new(kind: RenderOpKind, integers: Vec<i32>) -> Self {
        Self {
            kind,
            integers,
            text: None,
        }
    }

    pub fn with_text(kind: RenderOpKind, integers: Vec<i32>, text: impl Into<String>) -> Self {
        Self {
            kind,
            integers,
            text: Some(text.into()),
        }
    }

    /// Builds a point-list op (`P`, `p`, `L`, `b`, `B`), prefixing the point count.
    pub fn from_points(kind: RenderOpKind, points: &[(i32, i32)]) -> Self {
        let mut integers = Vec::with_capacity(points.len() * 2 + 1);
        integers.push(points.len() as i32);
        for &(x, y) in points {
            integers.push(x);
            integers.push(y);
        }
        Self::new(kind, integers)
    }

    pub fn kind(&self) -> RenderOpKind {
        self.kind
    }

    pub fn integers(&self) -> &[i32] {
        &self.integers
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// The coordinate pairs of a point-list op.
    ///
    /// Returns an empty vector for other kinds. A count larger than the
    /// available integers is clamped to the pairs actually present.
    pub fn points(&self) -> Vec<(i32, i32)> {
        if !self.kind.has_point_list() {
            return Vec::new();
        }
        let Some((&count, coords)) = self.integers.split_first() else {
            return Vec::new();
        };
        coords
            .chunks_exact(2)
            .take(count.max(0) as usize)
            .map(|pair| (pair[0], pair[1]))
            .collect()
    }

    /// Integer at `index`, or 0 when the op carries fewer integers.
    pub fn integer(&self, index: usize) -> i32 {
        self.integers.get(index).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for code in "EePpLbBTCcFSIt".chars() {
            let kind = RenderOpKind::from_code(code).unwrap();
            assert_eq!(kind.code(), code);
        }
        assert!(RenderOpKind::from_code('X').is_none());
    }

    #[test]
    fn test_bezier_fill_semantics() {
        assert!(RenderOpKind::FilledBezier.is_filled());
        assert_eq!(RenderOpKind::FilledBezier.code(), 'b');
        assert!(!RenderOpKind::UnfilledBezier.is_filled());
        assert_eq!(RenderOpKind::UnfilledBezier.code(), 'B');
    }

    #[test]
    fn test_points() {
        let op = RenderOp::from_points(RenderOpKind::FilledPolygon, &[(0, 0), (10, 0), (5, 8)]);
        assert_eq!(op.integers()[0], 3);
        assert_eq!(op.points(), vec![(0, 0), (10, 0), (5, 8)]);
    }

    #[test]
    fn test_points_clamped_to_available() {
        let op = RenderOp::new(RenderOpKind::Polyline, vec![5, 1, 2, 3, 4]);
        assert_eq!(op.points(), vec![(1, 2), (3, 4)]);
    }

    #[test]
    fn test_points_non_list_kind() {
        let op = RenderOp::new(RenderOpKind::FilledEllipse, vec![1, 2, 3, 4]);
        assert!(op.points().is_empty());
        assert_eq!(op.integer(2), 3);
        assert_eq!(op.integer(9), 0);
    }
}
