//! In-process layered layout.
//!
//! Nodes are ranked and ordered with the Sugiyama algorithm from
//! `rust-sugiyama`, then every element gets the xdot draw attributes a
//! Graphviz run would have produced: node outlines and labels, straight
//! edge splines with arrowheads, cluster boxes and the graph label. The
//! output therefore flows through the same render-op path as an external
//! layout.
//!
//! Geometry is computed top-down and flipped into the bottom-left layout
//! space when the ops are written.

use std::collections::{HashMap, HashSet};

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};
use rust_sugiyama::configure::Config;

use dotlens_core::{
    element::{DRAW_ATTRIBUTES, GraphElement},
    geometry::{Bounds, Point, Size},
    graph::Graph,
    identifier::Id,
    render_op::{RenderOp, RenderOpKind},
};
use dotlens_parser::xdot::write_render_ops;

use super::{CancelToken, LayoutEngine, LayoutError};

const NODE_HEIGHT: f32 = 36.0;
const MIN_NODE_WIDTH: f32 = 54.0;
const NODE_SEP: f32 = 18.0;
const RANK_SEP: f32 = 36.0;
const PAD: f32 = 4.0;
const CLUSTER_PAD: f32 = 8.0;
const ARROW_LENGTH: f32 = 10.0;
const ARROW_HALF_WIDTH: f32 = 3.5;
const VERTEX_SPACING: f32 = 10.0;
const POINTS_PER_INCH: f32 = 72.0;

/// Lays out graphs without Graphviz.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedEngine;

impl EmbeddedEngine {
    pub fn new() -> Self {
        Self
    }
}

impl LayoutEngine for EmbeddedEngine {
    fn layout(&self, graph: &Graph, cancel: &CancelToken) -> Result<Graph, LayoutError> {
        cancel.check()?;
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count();
            "Running embedded layout"
        );

        let sizes: IndexMap<Id, Size> = graph
            .nodes()
            .map(|node| (node.id(), node_size(node.id(), node.element())))
            .collect();
        let centers = place_nodes(graph, &sizes)?;
        cancel.check()?;

        let node_bounds: HashMap<Id, Bounds> = centers
            .iter()
            .filter_map(|(id, center)| Some((*id, Bounds::new_from_center(*center, *sizes.get(id)?))))
            .collect();
        let clusters = cluster_bounds(graph, &node_bounds);
        let edges: Vec<(Id, EdgeGeometry)> = graph
            .edges()
            .filter_map(|edge| {
                let source = *node_bounds.get(&edge.source())?;
                let target = *node_bounds.get(&edge.target())?;
                let shapes = (
                    graph.node(edge.source()).map_or("", |n| n.element().shape()),
                    graph.node(edge.target()).map_or("", |n| n.element().shape()),
                );
                Some((edge.id(), EdgeGeometry::new(edge.element(), source, target, shapes, graph.directed())))
            })
            .collect();

        let mut extent = node_bounds
            .values()
            .chain(clusters.values())
            .copied()
            .chain(edges.iter().filter_map(|(_, geometry)| geometry.label_bounds))
            .reduce(|a, b| a.merge(&b))
            .unwrap_or_default();

        let root_label = LabelText::new(graph.root(), graph.root().label());
        if let Some(label) = &root_label {
            let size = label.size();
            let below = Point::new(extent.center().x(), extent.max_y() + size.height() / 2.0 + PAD);
            extent = extent.merge(&Bounds::new_from_center(below, size));
        }

        let space = Space {
            min_x: extent.min_x() - PAD,
            min_y: extent.min_y() - PAD,
            height: extent.height() + 2.0 * PAD,
        };
        let width = extent.width() + 2.0 * PAD;
        let height = space.height;

        let mut out = graph.clone();
        cancel.check()?;

        for (id, bounds) in &node_bounds {
            if let Some(node) = out.node_mut(*id) {
                let element = node.element_mut();
                let draws = node_draws(*id, element, *bounds, &space);
                let center = space.point(bounds.center());
                element.set_attribute("pos", &format!("{},{}", center.0, center.1));
                element.set_attribute("width", &inches(bounds.width()));
                element.set_attribute("height", &inches(bounds.height()));
                apply_draws(element, draws);
            }
        }

        for (id, geometry) in &edges {
            if let Some(edge) = out.edge_mut(*id) {
                let element = edge.element_mut();
                element.set_attribute("pos", &geometry.pos(&space));
                let draws = geometry.draws(element, &space);
                apply_draws(element, draws);
            }
        }

        for (id, bounds) in &clusters {
            if let Some(subgraph) = out.subgraph_mut(*id) {
                let element = subgraph.element_mut();
                element.set_attribute("bb", &space.bb(*bounds));
                let draws = cluster_draws(element, *bounds, &space);
                apply_draws(element, draws);
            }
        }

        let canvas = Bounds::new_from_top_left(Point::new(space.min_x, space.min_y), Size::new(width, height));
        let root = out.root_mut();
        root.set_attribute("bb", &space.bb(canvas));
        let mut draw = Vec::new();
        if let Some(bgcolor) = root.attributes().value("bgcolor") {
            draw.push(RenderOp::with_text(RenderOpKind::FillColor, Vec::new(), bgcolor));
            draw.push(RenderOp::with_text(RenderOpKind::PenColor, Vec::new(), "transparent"));
            draw.push(RenderOp::from_points(RenderOpKind::FilledPolygon, &space.rect(canvas)));
        }
        let mut ldraw = Vec::new();
        if let Some(label) = &root_label {
            let center = Point::new(extent.center().x(), extent.max_y() - label.size().height() / 2.0);
            ldraw = label.ops(root, center, &space);
        }
        apply_draws(root, vec![("_draw_", draw), ("_ldraw_", ldraw)]);

        out.set_canvas_size(f64::from(width.round()), f64::from(height.round()));
        out.take_changes();
        debug!(width, height, clusters = clusters.len(); "Embedded layout finished");
        Ok(out)
    }
}

/// Maps top-down geometry into bottom-left layout space.
struct Space {
    min_x: f32,
    min_y: f32,
    height: f32,
}

impl Space {
    fn point(&self, p: Point) -> (i32, i32) {
        let x = p.x() - self.min_x;
        let y = self.height - (p.y() - self.min_y);
        (x.round() as i32, y.round() as i32)
    }

    fn rect(&self, b: Bounds) -> Vec<(i32, i32)> {
        [
            Point::new(b.min_x(), b.max_y()),
            Point::new(b.min_x(), b.min_y()),
            Point::new(b.max_x(), b.min_y()),
            Point::new(b.max_x(), b.max_y()),
        ]
        .into_iter()
        .map(|p| self.point(p))
        .collect()
    }

    fn bb(&self, b: Bounds) -> String {
        let (llx, lly) = self.point(Point::new(b.min_x(), b.max_y()));
        let (urx, ury) = self.point(Point::new(b.max_x(), b.min_y()));
        format!("{llx},{lly},{urx},{ury}")
    }
}

fn inches(points: f32) -> String {
    format!("{:.2}", points / POINTS_PER_INCH)
}

/// The display text of a node: `\N` stands for the node name.
fn node_label(id: Id, element: &GraphElement) -> String {
    let name = id.to_string();
    match element.label() {
        "" => name,
        label => label.replace("\\N", &name),
    }
}

fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.55
}

/// A possibly multi-line label with its font.
struct LabelText {
    lines: Vec<String>,
    font_size: f32,
}

impl LabelText {
    fn new(element: &GraphElement, text: &str) -> Option<Self> {
        if text.is_empty() {
            return None;
        }
        let lines = text
            .replace("\\n", "\n")
            .lines()
            .map(str::to_string)
            .collect::<Vec<_>>();
        if lines.is_empty() {
            return None;
        }
        Some(Self {
            lines,
            font_size: element.font_size() as f32,
        })
    }

    fn line_height(&self) -> f32 {
        self.font_size * 1.2
    }

    fn size(&self) -> Size {
        let width = self
            .lines
            .iter()
            .map(|line| text_width(line, self.font_size))
            .fold(0.0, f32::max);
        Size::new(width, self.line_height() * self.lines.len() as f32)
    }

    /// Font, color and one centered `T` op per line.
    fn ops(&self, element: &GraphElement, center: Point, space: &Space) -> Vec<RenderOp> {
        let mut ops = vec![
            RenderOp::with_text(RenderOpKind::Font, vec![self.font_size.round() as i32], element.font_name()),
            RenderOp::with_text(RenderOpKind::PenColor, Vec::new(), element.font_color()),
        ];
        let top = center.y() - self.size().height() / 2.0;
        for (i, line) in self.lines.iter().enumerate() {
            // Baseline sits a third of the font size above the line's bottom.
            let baseline = top + (i + 1) as f32 * self.line_height() - self.font_size / 3.0;
            let (x, y) = space.point(Point::new(center.x(), baseline));
            let width = text_width(line, self.font_size).round() as i32;
            ops.push(RenderOp::with_text(RenderOpKind::Text, vec![x, y, 0, width], line.as_str()));
        }
        ops
    }
}

fn node_size(id: Id, element: &GraphElement) -> Size {
    let shape = element.shape();
    if shape == "point" {
        return Size::new(6.0, 6.0);
    }
    let label = LabelText::new(element, &node_label(id, element));
    let text = label.as_ref().map(LabelText::size).unwrap_or_default();
    let width = MIN_NODE_WIDTH.max(text.width() + 24.0);
    let height = NODE_HEIGHT.max(text.height() + 12.0);
    match shape {
        "circle" | "doublecircle" | "square" => {
            let side = width.max(height);
            Size::new(side, side)
        }
        _ => Size::new(width, height),
    }
}

fn is_box_shape(shape: &str) -> bool {
    matches!(shape, "box" | "rect" | "rectangle" | "square")
}

fn style_parts(element: &GraphElement) -> Vec<&str> {
    element
        .style()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Pen and style ops shared by node and cluster outlines.
fn outline_state(element: &GraphElement, styles: &[&str]) -> Vec<RenderOp> {
    let mut ops = Vec::new();
    for style in styles {
        if matches!(*style, "dashed" | "dotted" | "bold") {
            ops.push(RenderOp::with_text(RenderOpKind::Style, Vec::new(), *style));
        }
    }
    ops.push(RenderOp::with_text(RenderOpKind::PenColor, Vec::new(), element.color()));
    ops
}

fn fill_color(element: &GraphElement) -> &str {
    element
        .attributes()
        .value("fillcolor")
        .or_else(|| element.attributes().value("color"))
        .unwrap_or("lightgrey")
}

fn node_draws(id: Id, element: &GraphElement, bounds: Bounds, space: &Space) -> Vec<(&'static str, Vec<RenderOp>)> {
    let styles = style_parts(element);
    if styles.contains(&"invis") {
        return vec![("_draw_", Vec::new()), ("_ldraw_", Vec::new())];
    }
    let filled = styles.contains(&"filled");
    let shape = element.shape();

    let mut draw = outline_state(element, &styles);
    if filled {
        draw.push(RenderOp::with_text(RenderOpKind::FillColor, Vec::new(), fill_color(element)));
    }
    let (cx, cy) = space.point(bounds.center());
    let rx = (bounds.width() / 2.0).round() as i32;
    let ry = (bounds.height() / 2.0).round() as i32;
    match shape {
        "plaintext" | "plain" | "none" => {}
        "point" => {
            draw.push(RenderOp::with_text(RenderOpKind::FillColor, Vec::new(), element.color()));
            draw.push(RenderOp::new(RenderOpKind::FilledEllipse, vec![cx, cy, rx, ry]));
        }
        shape if is_box_shape(shape) => {
            let kind = if filled {
                RenderOpKind::FilledPolygon
            } else {
                RenderOpKind::UnfilledPolygon
            };
            draw.push(RenderOp::from_points(kind, &space.rect(bounds)));
        }
        _ => {
            let kind = if filled {
                RenderOpKind::FilledEllipse
            } else {
                RenderOpKind::UnfilledEllipse
            };
            draw.push(RenderOp::new(kind, vec![cx, cy, rx, ry]));
        }
    }

    let ldraw = match (shape, LabelText::new(element, &node_label(id, element))) {
        ("point", _) | (_, None) => Vec::new(),
        (_, Some(label)) => label.ops(element, bounds.center(), space),
    };
    vec![("_draw_", draw), ("_ldraw_", ldraw)]
}

fn cluster_draws(element: &GraphElement, bounds: Bounds, space: &Space) -> Vec<(&'static str, Vec<RenderOp>)> {
    let styles = style_parts(element);
    if styles.contains(&"invis") {
        return vec![("_draw_", Vec::new()), ("_ldraw_", Vec::new())];
    }
    let mut draw = outline_state(element, &styles);
    let fill = element
        .attributes()
        .value("bgcolor")
        .or_else(|| styles.contains(&"filled").then(|| fill_color(element)));
    let kind = match fill {
        Some(color) => {
            draw.push(RenderOp::with_text(RenderOpKind::FillColor, Vec::new(), color));
            RenderOpKind::FilledPolygon
        }
        None => RenderOpKind::UnfilledPolygon,
    };
    draw.push(RenderOp::from_points(kind, &space.rect(bounds)));

    let ldraw = match LabelText::new(element, element.label()) {
        Some(label) => {
            let top = bounds.min_y() + CLUSTER_PAD / 2.0 + label.size().height() / 2.0;
            label.ops(element, Point::new(bounds.center().x(), top), space)
        }
        None => Vec::new(),
    };
    vec![("_draw_", draw), ("_ldraw_", ldraw)]
}

/// Writes each draw attribute and replaces the element's render ops with
/// their concatenation in draw-attribute order.
fn apply_draws(element: &mut GraphElement, draws: Vec<(&'static str, Vec<RenderOp>)>) {
    let mut by_key: HashMap<&str, Vec<RenderOp>> = draws.into_iter().collect();
    let mut all = Vec::new();
    for key in DRAW_ATTRIBUTES {
        match by_key.remove(key) {
            Some(ops) if !ops.is_empty() => {
                element.set_attribute(key, &write_render_ops(&ops));
                all.extend(ops);
            }
            _ => {
                element.remove_attribute(key);
            }
        }
    }
    trace!(id = element.id(), ops = all.len(); "Draw attributes written");
    element.set_render_ops(all);
}

/// Point where the segment from the center toward `toward` leaves the node outline.
fn boundary_point(bounds: Bounds, shape: &str, toward: Point) -> Point {
    let center = bounds.center();
    let (dx, dy) = (toward.x() - center.x(), toward.y() - center.y());
    if dx.abs() < f32::EPSILON && dy.abs() < f32::EPSILON {
        return center;
    }
    let (rx, ry) = (bounds.width() / 2.0, bounds.height() / 2.0);
    let t = if is_box_shape(shape) {
        let tx = if dx.abs() > f32::EPSILON { rx / dx.abs() } else { f32::INFINITY };
        let ty = if dy.abs() > f32::EPSILON { ry / dy.abs() } else { f32::INFINITY };
        tx.min(ty)
    } else {
        1.0 / ((dx / rx).powi(2) + (dy / ry).powi(2)).sqrt()
    };
    let t = t.min(1.0);
    Point::new(center.x() + dx * t, center.y() + dy * t)
}

/// Spline, arrowhead and label position of one edge, top-down.
struct EdgeGeometry {
    spline: Vec<Point>,
    arrow: Option<[Point; 3]>,
    label_bounds: Option<Bounds>,
}

impl EdgeGeometry {
    fn new(element: &GraphElement, source: Bounds, target: Bounds, shapes: (&str, &str), directed: bool) -> Self {
        let label = LabelText::new(element, element.label()).map(|l| l.size());

        if source == target {
            let c = source.center();
            let (rx, ry) = (source.width() / 2.0, source.height() / 2.0);
            let spline = vec![
                Point::new(c.x() + rx * 0.8, c.y() - ry * 0.6),
                Point::new(c.x() + rx + 24.0, c.y() - ry - 12.0),
                Point::new(c.x() + rx + 24.0, c.y() + ry + 12.0),
                Point::new(c.x() + rx * 0.8, c.y() + ry * 0.6),
            ];
            let label_bounds = label.map(|size| {
                Bounds::new_from_center(Point::new(c.x() + rx + 30.0 + size.width() / 2.0, c.y()), size)
            });
            return Self {
                spline,
                arrow: None,
                label_bounds,
            };
        }

        let start = boundary_point(source, shapes.0, target.center());
        let tip = boundary_point(target, shapes.1, source.center());
        let length = start.distance(tip).max(f32::EPSILON);
        let (ux, uy) = ((tip.x() - start.x()) / length, (tip.y() - start.y()) / length);

        let (end, arrow) = if directed && length > ARROW_LENGTH {
            let base = Point::new(tip.x() - ux * ARROW_LENGTH, tip.y() - uy * ARROW_LENGTH);
            let (px, py) = (-uy * ARROW_HALF_WIDTH, ux * ARROW_HALF_WIDTH);
            let arrow = [
                Point::new(base.x() + px, base.y() + py),
                tip,
                Point::new(base.x() - px, base.y() - py),
            ];
            (base, Some(arrow))
        } else {
            (tip, None)
        };

        let third = |k: f32| Point::new(start.x() + (end.x() - start.x()) * k, start.y() + (end.y() - start.y()) * k);
        let spline = vec![start, third(1.0 / 3.0), third(2.0 / 3.0), end];
        let label_bounds = label.map(|size| {
            let mid = start.midpoint(end);
            Bounds::new_from_center(Point::new(mid.x() + 4.0 + size.width() / 2.0, mid.y()), size)
        });
        Self {
            spline,
            arrow,
            label_bounds,
        }
    }

    fn pos(&self, space: &Space) -> String {
        let mut parts = Vec::new();
        if let Some(arrow) = &self.arrow {
            let (x, y) = space.point(arrow[1]);
            parts.push(format!("e,{x},{y}"));
        }
        for point in &self.spline {
            let (x, y) = space.point(*point);
            parts.push(format!("{x},{y}"));
        }
        parts.join(" ")
    }

    fn draws(&self, element: &GraphElement, space: &Space) -> Vec<(&'static str, Vec<RenderOp>)> {
        let styles = style_parts(element);
        if styles.contains(&"invis") {
            return vec![("_draw_", Vec::new()), ("_hdraw_", Vec::new()), ("_ldraw_", Vec::new())];
        }
        let points: Vec<(i32, i32)> = self.spline.iter().map(|p| space.point(*p)).collect();
        let mut draw = outline_state(element, &styles);
        draw.push(RenderOp::from_points(RenderOpKind::UnfilledBezier, &points));

        let hdraw = match &self.arrow {
            Some(arrow) => {
                let points: Vec<(i32, i32)> = arrow.iter().map(|p| space.point(*p)).collect();
                vec![
                    RenderOp::with_text(RenderOpKind::Style, Vec::new(), "solid"),
                    RenderOp::with_text(RenderOpKind::PenColor, Vec::new(), element.color()),
                    RenderOp::with_text(RenderOpKind::FillColor, Vec::new(), element.color()),
                    RenderOp::from_points(RenderOpKind::FilledPolygon, &points),
                ]
            }
            None => Vec::new(),
        };

        let ldraw = match (LabelText::new(element, element.label()), self.label_bounds) {
            (Some(label), Some(bounds)) => label.ops(element, bounds.center(), space),
            _ => Vec::new(),
        };
        vec![("_draw_", draw), ("_hdraw_", hdraw), ("_ldraw_", ldraw)]
    }
}

/// Bounds of every cluster subgraph, padded around its members and nested
/// clusters, with room for the label on top.
fn cluster_bounds(graph: &Graph, nodes: &HashMap<Id, Bounds>) -> IndexMap<Id, Bounds> {
    fn visit(
        graph: &Graph,
        id: Id,
        nodes: &HashMap<Id, Bounds>,
        done: &mut IndexMap<Id, Option<Bounds>>,
        visiting: &mut HashSet<Id>,
    ) -> Option<Bounds> {
        if let Some(bounds) = done.get(&id) {
            return *bounds;
        }
        if !visiting.insert(id) {
            return None;
        }
        let subgraph = graph.subgraph(id)?;
        let mut inner: Option<Bounds> = None;
        let mut merge = |b: Bounds| {
            inner = Some(inner.map_or(b, |acc| acc.merge(&b)));
        };
        for node in subgraph.nodes() {
            if let Some(b) = nodes.get(&node) {
                merge(*b);
            }
        }
        for child in subgraph.subgraphs() {
            if let Some(b) = visit(graph, child, nodes, done, visiting) {
                merge(b);
            }
        }
        visiting.remove(&id);

        let bounds = if id.to_string().starts_with("cluster") {
            inner.map(|b| {
                let label = LabelText::new(subgraph.element(), subgraph.element().label())
                    .map_or(0.0, |l| l.size().height() + CLUSTER_PAD / 2.0);
                Bounds::new_from_top_left(
                    Point::new(b.min_x() - CLUSTER_PAD, b.min_y() - CLUSTER_PAD - label),
                    Size::new(b.width() + 2.0 * CLUSTER_PAD, b.height() + 2.0 * CLUSTER_PAD + label),
                )
            })
        } else {
            inner
        };
        done.insert(id, bounds);
        bounds
    }

    let mut done = IndexMap::new();
    let mut visiting = HashSet::new();
    for subgraph in graph.subgraphs() {
        visit(graph, subgraph.id(), nodes, &mut done, &mut visiting);
    }
    done.into_iter()
        .filter(|(id, _)| id.to_string().starts_with("cluster"))
        .filter_map(|(id, bounds)| Some((id, bounds?)))
        .collect()
}

/// Node centers, top-down, with sources on upper ranks.
fn place_nodes(graph: &Graph, sizes: &IndexMap<Id, Size>) -> Result<HashMap<Id, Point>, LayoutError> {
    let index: IndexMap<Id, u32> = sizes
        .keys()
        .enumerate()
        .map(|(i, id)| (*id, i as u32))
        .collect();

    let mut edge_set: IndexSet<(u32, u32)> = IndexSet::new();
    for edge in graph.edges() {
        if let (Some(&source), Some(&target)) = (index.get(&edge.source()), index.get(&edge.target())) {
            // Skip self-loops
            if source != target {
                edge_set.insert((source, target));
            }
        }
    }

    let max_width = sizes.values().map(|s| s.width()).fold(MIN_NODE_WIDTH, f32::max);
    let row = NODE_HEIGHT + RANK_SEP;
    let mut centers = HashMap::new();
    let mut offset = 0.0_f32;

    if !edge_set.is_empty() {
        let edges: Vec<(u32, u32)> = edge_set.iter().copied().collect();
        let layouts = std::panic::catch_unwind(move || {
            let config = Config {
                minimum_length: 1,
                vertex_spacing: VERTEX_SPACING as f64,
                ..Default::default()
            };
            rust_sugiyama::from_edges(&edges, &config)
        })
        .map_err(|err| {
            let message = if let Some(msg) = err.downcast_ref::<String>() {
                format!("layered layout panicked: {msg}")
            } else if let Some(msg) = err.downcast_ref::<&str>() {
                format!("layered layout panicked: {msg}")
            } else {
                "layered layout panicked with unknown error".to_string()
            };
            LayoutError::Engine(message)
        })?;

        let x_scale = (max_width + NODE_SEP) / VERTEX_SPACING;
        for (coords, _, _) in &layouts {
            let placed: Vec<(Id, f32, f32)> = coords
                .iter()
                .filter_map(|&(id, (x, y))| {
                    let node = *index.get_index(id)?.0;
                    Some((node, x as f32, y as f32))
                })
                .collect();
            if placed.is_empty() {
                continue;
            }

            let mut ys: Vec<f32> = placed.iter().map(|(_, _, y)| *y).collect();
            ys.sort_by(f32::total_cmp);
            ys.dedup_by(|a, b| (*a - *b).abs() < 0.5);
            let rank_of = |y: f32| ys.partition_point(|v| *v < y - 0.5);
            let ranks: HashMap<Id, usize> = placed.iter().map(|(id, _, y)| (*id, rank_of(*y))).collect();

            // Orient so most edges point down.
            let (mut down, mut up) = (0, 0);
            for edge in graph.edges() {
                if let (Some(s), Some(t)) = (ranks.get(&edge.source()), ranks.get(&edge.target())) {
                    if s < t {
                        down += 1;
                    } else if s > t {
                        up += 1;
                    }
                }
            }
            let last = ys.len().saturating_sub(1);
            let level = |rank: usize| if up > down { last - rank } else { rank };

            let min_x = placed.iter().map(|(_, x, _)| *x).fold(f32::INFINITY, f32::min);
            let mut right = offset;
            for (id, x, _) in &placed {
                let cx = offset + (x - min_x) * x_scale + max_width / 2.0;
                let cy = level(ranks[id]) as f32 * row + NODE_HEIGHT / 2.0;
                right = right.max(cx + max_width / 2.0);
                centers.insert(*id, Point::new(cx, cy));
            }
            trace!(nodes = placed.len(), ranks = ys.len(); "Component placed");
            offset = right + NODE_SEP;
        }
    }

    // Isolated nodes share the top rank, after every component.
    for (id, size) in sizes {
        if !centers.contains_key(id) {
            centers.insert(*id, Point::new(offset + size.width() / 2.0, NODE_HEIGHT / 2.0));
            offset += size.width() + NODE_SEP;
        }
    }
    Ok(centers)
}
