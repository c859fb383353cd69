//! SVG export of a [`Scene`].
//!
//! One `<g>` per scene item, in paint order, with the element id and kind
//! as attributes so the output can be styled or scripted. Selected items get
//! the `selected` class.

use std::{fmt::Write as _, fs::File, io::Write};

use log::{debug, error, info};
use svg::{
    Document,
    node::{Text as SvgText, element as svg_element},
};

use dotlens_core::{geometry::Point, graph::ChangeTarget};

use super::{Error, Exporter};
use crate::scene::{LineStyle, Primitive, Scene, SceneItem, TextAnchor};

/// SVG exporter writing to `file_name`.
#[derive(Debug, Clone)]
pub struct Svg {
    pub file_name: String,
}

impl Svg {
    pub fn new(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
        }
    }

    /// Renders the scene as an SVG document sized to the scene.
    pub fn render_scene(&self, scene: &Scene) -> Document {
        let size = scene.size();
        let mut doc = Document::new()
            .set("viewBox", format!("0 0 {} {}", size.width(), size.height()))
            .set("width", size.width())
            .set("height", size.height());

        let background = scene.background();
        doc = doc.add(
            svg_element::Rectangle::new()
                .set("x", 0)
                .set("y", 0)
                .set("width", size.width())
                .set("height", size.height())
                .set("fill", &background)
                .set("fill-opacity", background.alpha()),
        );

        for item in scene.items() {
            doc = doc.add(render_item(item));
        }
        debug!(items = scene.len(); "SVG document rendered");
        doc
    }

    /// Writes an SVG document to the specified file
    pub fn write_document(&self, doc: Document) -> Result<(), Error> {
        info!(file_name = self.file_name; "Creating SVG file");
        let mut f = match File::create(&self.file_name) {
            Ok(file) => file,
            Err(err) => {
                error!(file_name = self.file_name, err:err; "Failed to create SVG file");
                return Err(Error::Io(err));
            }
        };

        if let Err(err) = write!(f, "{doc}") {
            error!(file_name = self.file_name, err:err; "Failed to write SVG content");
            return Err(Error::Io(err));
        }
        Ok(())
    }
}

impl Exporter for Svg {
    fn export_scene(&mut self, scene: &Scene) -> Result<(), Error> {
        let doc = self.render_scene(scene);
        self.write_document(doc)
    }
}

/// The SVG text of `scene`.
pub fn to_svg_string(scene: &Scene) -> String {
    Svg::new("").render_scene(scene).to_string()
}

/// Sets stroke presentation attributes.
macro_rules! apply_stroke {
    ($element:expr, $stroke:expr) => {{
        let mut elem = $element
            .set("stroke", $stroke.color.to_string())
            .set("stroke-opacity", $stroke.color.alpha())
            .set("stroke-width", $stroke.width);
        if let Some(dasharray) = dash_array($stroke.style) {
            elem = elem.set("stroke-dasharray", dasharray);
        }
        elem
    }};
}

/// Sets the fill, or `none` for outlines.
macro_rules! apply_fill {
    ($element:expr, $fill:expr) => {{
        match $fill {
            Some(color) => $element
                .set("fill", color.to_string())
                .set("fill-opacity", color.alpha()),
            None => $element.set("fill", "none"),
        }
    }};
}

fn dash_array(style: LineStyle) -> Option<&'static str> {
    match style {
        LineStyle::Dashed => Some("5,2"),
        LineStyle::Dotted => Some("1,5"),
        LineStyle::Solid | LineStyle::Invisible => None,
    }
}

fn render_item(item: &SceneItem) -> svg_element::Group {
    let (kind, id) = match item.key() {
        ChangeTarget::Graph => ("graph", None),
        ChangeTarget::Node(id) => ("node", Some(id)),
        ChangeTarget::Edge(id) => ("edge", Some(id)),
        ChangeTarget::Subgraph(id) => ("subgraph", Some(id)),
    };
    let mut class = kind.to_string();
    if item.is_selected() {
        class.push_str(" selected");
    }

    let mut group = svg_element::Group::new().set("class", class);
    if let Some(id) = id {
        group = group.set("data-id", id.to_string());
    }
    for primitive in item.primitives() {
        if let Some(node) = render_primitive(primitive) {
            group = group.add(node);
        }
    }
    group
}

/// The SVG node of one primitive; `None` for invisible strokes.
fn render_primitive(primitive: &Primitive) -> Option<Box<dyn svg::Node>> {
    let node: Box<dyn svg::Node> = match primitive {
        Primitive::Ellipse {
            center,
            rx,
            ry,
            stroke,
            fill,
        } => {
            if !stroke.is_visible() {
                return None;
            }
            let ellipse = svg_element::Ellipse::new()
                .set("cx", center.x())
                .set("cy", center.y())
                .set("rx", *rx)
                .set("ry", *ry);
            let ellipse = apply_stroke!(ellipse, stroke);
            Box::new(apply_fill!(ellipse, fill))
        }
        Primitive::Polygon { points, stroke, fill } => {
            if !stroke.is_visible() {
                return None;
            }
            let polygon = svg_element::Polygon::new().set("points", point_list(points));
            let polygon = apply_stroke!(polygon, stroke);
            Box::new(apply_fill!(polygon, fill))
        }
        Primitive::Polyline { points, stroke } => {
            if !stroke.is_visible() {
                return None;
            }
            let polyline = svg_element::Polyline::new()
                .set("points", point_list(points))
                .set("fill", "none");
            Box::new(apply_stroke!(polyline, stroke))
        }
        Primitive::Bezier { points, stroke, fill } => {
            if !stroke.is_visible() || points.is_empty() {
                return None;
            }
            let path = svg_element::Path::new().set("d", bezier_path_data(points, fill.is_some()));
            let path = apply_stroke!(path, stroke);
            Box::new(apply_fill!(path, fill))
        }
        Primitive::Text {
            position,
            anchor,
            text,
            font,
            color,
            ..
        } => {
            let anchor = match anchor {
                TextAnchor::Start => "start",
                TextAnchor::Middle => "middle",
                TextAnchor::End => "end",
            };
            let rendered = svg_element::Text::new("")
                .set("x", position.x())
                .set("y", position.y())
                .set("text-anchor", anchor)
                .set("font-family", font.name.as_str())
                .set("font-size", font.size)
                .set("fill", color.to_string())
                .set("fill-opacity", color.alpha())
                .add(SvgText::new(text.as_str()));
            Box::new(rendered)
        }
        Primitive::Image { bounds, path } => Box::new(
            svg_element::Image::new()
                .set("x", bounds.min_x())
                .set("y", bounds.min_y())
                .set("width", bounds.width())
                .set("height", bounds.height())
                .set("href", path.as_str()),
        ),
    };
    Some(node)
}

/// `M x y C ...` through every group of three control points.
fn bezier_path_data(points: &[Point], closed: bool) -> String {
    let mut data = String::new();
    if let Some((first, rest)) = points.split_first() {
        let _ = write!(data, "M {} {}", first.x(), first.y());
        for curve in rest.chunks_exact(3) {
            let _ = write!(
                data,
                " C {} {}, {} {}, {} {}",
                curve[0].x(),
                curve[0].y(),
                curve[1].x(),
                curve[1].y(),
                curve[2].x(),
                curve[2].y()
            );
        }
    }
    if closed {
        data.push_str(" Z");
    }
    data
}

fn point_list(points: &[Point]) -> String {
    let mut out = String::new();
    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{},{}", point.x(), point.y());
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dotlens_core::identifier::Id;

    use super::*;
    use crate::scene::ApproximateMeasure;

    fn scene_for(source: &str) -> Scene {
        let graph = dotlens_parser::parse(source).unwrap();
        let mut scene = Scene::default().with_text_measure(Arc::new(ApproximateMeasure));
        scene.rebuild(&graph);
        scene
    }

    const LAID_OUT: &str = r#"digraph g {
        graph [bb="0,0,54,108"];
        a [_draw_="S 6 -dashed c 7 -#ff0000 e 27 90 27 18", _ldraw_="F 14 11 -Times-Roman c 7 -#000000 T 27 86 0 7 1 -a"];
        b [_draw_="C 5 -green P 4 0 0 0 36 54 36 54 0"];
        a -> b [_draw_="c 7 -#000000 B 4 27 72 27 60 27 48 27 36"];
    }"#;

    #[test]
    fn test_document_structure() {
        let svg = to_svg_string(&scene_for(LAID_OUT));
        assert!(svg.contains("viewBox=\"0 0 154 208\""));
        assert!(svg.contains("<ellipse"));
        assert!(svg.contains("stroke-dasharray=\"5,2\""));
        assert!(svg.contains("<polygon"));
        assert!(svg.contains("<path"));
        assert!(svg.contains("data-id=\"a-&gt;b\"") || svg.contains("data-id=\"a->b\""));
        assert!(svg.contains(">a</text>") || svg.contains(">a<"));
        assert!(svg.contains("text-anchor=\"middle\""));
    }

    #[test]
    fn test_invisible_primitives_are_skipped() {
        let svg = to_svg_string(&scene_for(r#"digraph { graph [bb="0,0,10,10"]; a [_draw_="S 5 -invis e 5 5 5 5"] }"#));
        assert!(!svg.contains("<ellipse"));
    }

    #[test]
    fn test_selected_class() {
        let mut graph = dotlens_parser::parse(LAID_OUT).unwrap();
        graph.select_node(Id::new("a")).unwrap();
        let mut scene = Scene::default().with_text_measure(Arc::new(ApproximateMeasure));
        scene.rebuild(&graph);
        assert!(to_svg_string(&scene).contains("class=\"node selected\""));
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.svg");
        let mut exporter = Svg::new(path.to_str().unwrap());
        exporter.export_scene(&scene_for(LAID_OUT)).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<svg"));
    }
}
