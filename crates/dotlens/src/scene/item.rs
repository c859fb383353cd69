//! Scene items and the primitives they are drawn with.
//!
//! Render ops are interpreted in order against a small drawing state (pen
//! and fill color, font, line style). State ops change the state; drawing
//! ops emit a [`Primitive`] in scene coordinates carrying the state at that
//! point.

use dotlens_core::{
    color::Color,
    geometry::{Bounds, Point, Size},
    graph::ChangeTarget,
    render_op::{RenderOp, RenderOpKind},
};
use log::trace;

use super::CanvasTransform;

const DEFAULT_FONT_NAME: &str = "Times-Roman";
const DEFAULT_FONT_SIZE: f32 = 14.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    Invisible,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
    pub style: LineStyle,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            color: Color::default(),
            width: 1.0,
            style: LineStyle::Solid,
        }
    }
}

impl Stroke {
    pub fn is_visible(&self) -> bool {
        self.style != LineStyle::Invisible
    }
}

/// Horizontal text alignment relative to the text position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    #[default]
    Middle,
    End,
}

impl TextAnchor {
    /// From the xdot alignment code: -1 left, 0 center, 1 right.
    pub fn from_align(align: i32) -> Self {
        match align.signum() {
            -1 => Self::Start,
            1 => Self::End,
            _ => Self::Middle,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub name: String,
    /// Size in scene units.
    pub size: f32,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            name: DEFAULT_FONT_NAME.to_string(),
            size: DEFAULT_FONT_SIZE,
        }
    }
}

/// One drawing primitive in scene coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Ellipse {
        center: Point,
        rx: f32,
        ry: f32,
        stroke: Stroke,
        fill: Option<Color>,
    },
    Polygon {
        points: Vec<Point>,
        stroke: Stroke,
        fill: Option<Color>,
    },
    Polyline {
        points: Vec<Point>,
        stroke: Stroke,
    },
    /// Cubic bezier spline: a start point followed by groups of three.
    Bezier {
        points: Vec<Point>,
        stroke: Stroke,
        fill: Option<Color>,
    },
    Text {
        position: Point,
        anchor: TextAnchor,
        text: String,
        font: FontSpec,
        color: Color,
        /// Layout width of the text in scene units.
        width: f32,
    },
    Image {
        bounds: Bounds,
        path: String,
    },
}

impl Primitive {
    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            Self::Ellipse { center, rx, ry, .. } => {
                Some(Bounds::new_from_center(*center, Size::new(rx * 2.0, ry * 2.0)))
            }
            Self::Polygon { points, .. } | Self::Polyline { points, .. } | Self::Bezier { points, .. } => {
                Bounds::from_points(points)
            }
            Self::Text {
                position,
                anchor,
                font,
                width,
                ..
            } => {
                let left = match anchor {
                    TextAnchor::Start => position.x(),
                    TextAnchor::Middle => position.x() - width / 2.0,
                    TextAnchor::End => position.x() - width,
                };
                // The position is the baseline.
                let top_left = Point::new(left, position.y() - font.size);
                Some(Bounds::new_from_top_left(top_left, Size::new(*width, font.size * 1.2)))
            }
            Self::Image { bounds, .. } => Some(*bounds),
        }
    }
}

/// The scene representation of one graph element.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneItem {
    key: ChangeTarget,
    z: f64,
    selected: bool,
    primitives: Vec<Primitive>,
    bounds: Option<Bounds>,
}

impl SceneItem {
    pub fn new(key: ChangeTarget, z: f64, selected: bool, primitives: Vec<Primitive>) -> Self {
        let bounds = primitives
            .iter()
            .filter_map(Primitive::bounds)
            .reduce(|a, b| a.merge(&b));
        Self {
            key,
            z,
            selected,
            primitives,
            bounds,
        }
    }

    pub fn key(&self) -> ChangeTarget {
        self.key
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub(super) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Union of the primitive bounds; `None` when nothing is drawn.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// Paint order among items of equal z.
    pub(super) fn layer(&self) -> u8 {
        match self.key {
            ChangeTarget::Graph => 0,
            ChangeTarget::Subgraph(_) => 1,
            ChangeTarget::Edge(_) => 2,
            ChangeTarget::Node(_) => 3,
        }
    }
}

/// Drawing state threaded through one element's ops.
#[derive(Debug, Clone, Default)]
pub(super) struct DrawState {
    pub stroke: Stroke,
    pub fill: Option<Color>,
    pub font: FontSpec,
}

impl DrawState {
    /// Applies a state op. Unparseable colors keep the previous value.
    pub fn apply(&mut self, op: &RenderOp, transform: &CanvasTransform) {
        let text = op.text().unwrap_or_default();
        match op.kind() {
            RenderOpKind::PenColor => match Color::from_graphviz(text) {
                Ok(color) => self.stroke.color = color,
                Err(err) => trace!(color = text, error:% = err; "Ignoring pen color"),
            },
            RenderOpKind::FillColor => match Color::from_graphviz(text) {
                Ok(color) => self.fill = Some(color),
                Err(err) => trace!(color = text, error:% = err; "Ignoring fill color"),
            },
            RenderOpKind::Font => {
                self.font = FontSpec {
                    name: text.to_string(),
                    size: transform.scale_y(f64::from(op.integer(0))),
                };
            }
            RenderOpKind::Style => self.apply_style(text),
            _ => {}
        }
    }

    fn apply_style(&mut self, style: &str) {
        let style = style.trim();
        if let Some(width) = style
            .strip_prefix("setlinewidth(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            if let Ok(width) = width.trim().parse::<f32>() {
                self.stroke.width = width;
            }
            return;
        }
        match style {
            "solid" => self.stroke.style = LineStyle::Solid,
            "dashed" => self.stroke.style = LineStyle::Dashed,
            "dotted" => self.stroke.style = LineStyle::Dotted,
            "invis" | "invisible" => self.stroke.style = LineStyle::Invisible,
            "bold" => self.stroke.width = 2.0,
            _ => {}
        }
    }

    fn fill_for(&self, kind: RenderOpKind) -> Option<Color> {
        if kind.is_filled() {
            Some(self.fill.unwrap_or_default())
        } else {
            None
        }
    }
}

/// Interprets `ops` into primitives.
pub(super) fn build_primitives(ops: &[RenderOp], transform: &CanvasTransform) -> Vec<Primitive> {
    let mut state = DrawState::default();
    let mut primitives = Vec::new();
    for op in ops {
        if op.kind().is_state() {
            state.apply(op, transform);
            continue;
        }
        if let Some(primitive) = draw_primitive(op, &state, transform) {
            primitives.push(primitive);
        }
    }
    primitives
}

fn draw_primitive(op: &RenderOp, state: &DrawState, transform: &CanvasTransform) -> Option<Primitive> {
    let kind = op.kind();
    let points = || -> Vec<Point> {
        op.points()
            .into_iter()
            .map(|(x, y)| transform.map_i32(x, y))
            .collect()
    };
    let primitive = match kind {
        RenderOpKind::FilledEllipse | RenderOpKind::UnfilledEllipse => Primitive::Ellipse {
            center: transform.map_i32(op.integer(0), op.integer(1)),
            rx: transform.scale_x(f64::from(op.integer(2))),
            ry: transform.scale_y(f64::from(op.integer(3))),
            stroke: state.stroke.clone(),
            fill: state.fill_for(kind),
        },
        RenderOpKind::FilledPolygon | RenderOpKind::UnfilledPolygon => Primitive::Polygon {
            points: points(),
            stroke: state.stroke.clone(),
            fill: state.fill_for(kind),
        },
        RenderOpKind::Polyline => Primitive::Polyline {
            points: points(),
            stroke: state.stroke.clone(),
        },
        RenderOpKind::FilledBezier | RenderOpKind::UnfilledBezier => Primitive::Bezier {
            points: points(),
            stroke: state.stroke.clone(),
            fill: state.fill_for(kind),
        },
        RenderOpKind::Text => Primitive::Text {
            position: transform.map_i32(op.integer(0), op.integer(1)),
            anchor: TextAnchor::from_align(op.integer(2)),
            text: op.text().unwrap_or_default().to_string(),
            font: state.font.clone(),
            color: state.stroke.color,
            width: transform.scale_x(f64::from(op.integer(3))),
        },
        RenderOpKind::Image => {
            let (x, y, w, h) = (op.integer(0), op.integer(1), op.integer(2), op.integer(3));
            let top_left = transform.map_i32(x, y + h);
            let size = Size::new(transform.scale_x(f64::from(w)), transform.scale_y(f64::from(h)));
            Primitive::Image {
                bounds: Bounds::new_from_top_left(top_left, size),
                path: op.text().unwrap_or_default().to_string(),
            }
        }
        _ => return None,
    };
    Some(primitive)
}
