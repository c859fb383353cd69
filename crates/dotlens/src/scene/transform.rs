//! Layout-space to scene-space mapping.

use dotlens_core::{
    geometry::{Point, Size},
    graph::Graph,
};

use crate::config::SceneConfig;

/// Scales, flips and offsets layout coordinates.
///
/// Layout space has its origin at the bottom-left of the canvas; the scene
/// has it at the top-left, with a margin around the drawing:
///
/// ```text
/// scene_x = x * scale_x + margin_x
/// scene_y = (canvas_height - y) * scale_y + margin_y
/// ```
///
/// # Examples
///
/// ```
/// use dotlens::scene::CanvasTransform;
///
/// let transform = CanvasTransform::new(1.0, 1.0, 50.0, 50.0, 300.0, 400.0);
/// let point = transform.map(10.0, 20.0);
/// assert_eq!((point.x(), point.y()), (60.0, 430.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransform {
    scale_x: f64,
    scale_y: f64,
    margin_x: f64,
    margin_y: f64,
    canvas_width: f64,
    canvas_height: f64,
}

impl Default for CanvasTransform {
    fn default() -> Self {
        Self::new(1.0, 1.0, 0.0, 0.0, 0.0, 0.0)
    }
}

impl CanvasTransform {
    pub fn new(
        scale_x: f64,
        scale_y: f64,
        margin_x: f64,
        margin_y: f64,
        canvas_width: f64,
        canvas_height: f64,
    ) -> Self {
        Self {
            scale_x,
            scale_y,
            margin_x,
            margin_y,
            canvas_width,
            canvas_height,
        }
    }

    /// The transform for `graph`: its own scale times the detail factor,
    /// with the configured margin on every side.
    pub fn from_graph(graph: &Graph, config: &SceneConfig) -> Self {
        let scale = graph.scale() * config.detail_level.factor();
        Self::new(
            scale,
            scale,
            config.margin,
            config.margin,
            graph.width(),
            graph.height(),
        )
    }

    pub fn map(&self, x: f64, y: f64) -> Point {
        Point::new(
            (x * self.scale_x + self.margin_x) as f32,
            ((self.canvas_height - y) * self.scale_y + self.margin_y) as f32,
        )
    }

    pub fn map_i32(&self, x: i32, y: i32) -> Point {
        self.map(f64::from(x), f64::from(y))
    }

    /// A horizontal layout length in scene units.
    pub fn scale_x(&self, length: f64) -> f32 {
        (length * self.scale_x) as f32
    }

    /// A vertical layout length in scene units.
    pub fn scale_y(&self, length: f64) -> f32 {
        (length * self.scale_y) as f32
    }

    pub fn margin_x(&self) -> f64 {
        self.margin_x
    }

    pub fn margin_y(&self) -> f64 {
        self.margin_y
    }

    pub fn canvas_height(&self) -> f64 {
        self.canvas_height
    }

    /// The scaled canvas plus margins.
    pub fn scene_size(&self) -> Size {
        Size::new(
            (self.canvas_width * self.scale_x + 2.0 * self.margin_x) as f32,
            (self.canvas_height * self.scale_y + 2.0 * self.margin_y) as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::config::DetailLevel;

    #[test]
    fn test_flip_and_margin() {
        let transform = CanvasTransform::new(1.0, 1.0, 50.0, 50.0, 300.0, 400.0);
        let point = transform.map(10.0, 20.0);
        assert_approx_eq!(f32, point.x(), 60.0);
        assert_approx_eq!(f32, point.y(), 430.0);

        let origin = transform.map(0.0, 0.0);
        assert_approx_eq!(f32, origin.y(), 450.0);
        let top = transform.map(0.0, 400.0);
        assert_approx_eq!(f32, top.y(), 50.0);
    }

    #[test]
    fn test_from_graph_applies_detail_level() {
        let mut graph = Graph::new("g", true);
        graph.set_canvas_size(100.0, 200.0);
        graph.set_scale(2.0);
        let config = SceneConfig {
            margin: 10.0,
            detail_level: DetailLevel::High,
        };

        let transform = CanvasTransform::from_graph(&graph, &config);
        assert_approx_eq!(f32, transform.scale_x(1.0), 2.6);
        let size = transform.scene_size();
        assert_approx_eq!(f32, size.width(), 280.0);
        assert_approx_eq!(f32, size.height(), 540.0);

        let p = transform.map(10.0, 200.0);
        assert_approx_eq!(f32, p.x(), 36.0);
        assert_approx_eq!(f32, p.y(), 10.0);
    }
}
