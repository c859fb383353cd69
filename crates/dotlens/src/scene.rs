//! Scene synchronization.
//!
//! A [`Scene`] holds one [`SceneItem`] per drawn graph element, in scene
//! coordinates (top-left origin, scaled, with a margin). It is fed by the
//! graph's change events: [`Scene::sync`] rebuilds only the items named by
//! the events, unless the canvas transform or background changed, in which
//! case every item is rebuilt.
//!
//! Items are keyed by [`ChangeTarget`] and never hold references into the
//! graph; they are rebuilt from the graph's current data.
//!
//! The graph label is placed differently from other text: its position is
//! the left edge of the text, and its font shrinks until the measured text
//! fits the width the layout reserved for it.

mod index;
mod item;
mod text;
mod transform;

pub use index::{CellIndex, DEFAULT_CELL_SIZE};
pub use item::{FontSpec, LineStyle, Primitive, SceneItem, Stroke, TextAnchor};
pub use text::{ApproximateMeasure, CosmicTextMeasure, TextMeasure, default_measure};
pub use transform::CanvasTransform;

use std::{fmt, sync::Arc};

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace, warn};

use dotlens_core::{
    attributes::defaults,
    color::Color,
    element::GraphElement,
    geometry::{Point, Size},
    graph::{Change, ChangeEvent, ChangeTarget, Graph},
    identifier::Id,
    render_op::RenderOpKind,
};

use crate::config::{DetailLevel, SceneConfig};

/// What a [`Scene::sync`] call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Every item was rebuilt.
    pub full_rebuild: bool,
    /// Items rebuilt or restyled, in event order.
    pub updated: Vec<ChangeTarget>,
    pub removed: Vec<ChangeTarget>,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        !self.full_rebuild && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Screen-space mirror of a graph.
pub struct Scene {
    config: SceneConfig,
    configured_background: Option<Color>,
    background: Color,
    transform: CanvasTransform,
    items: IndexMap<ChangeTarget, SceneItem>,
    index: CellIndex,
    measure: Arc<dyn TextMeasure>,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("background", &self.background)
            .field("transform", &self.transform)
            .field("items", &self.items.len())
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}

impl Scene {
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            configured_background: None,
            background: default_background(),
            transform: CanvasTransform::default(),
            items: IndexMap::new(),
            index: CellIndex::default(),
            measure: default_measure(),
        }
    }

    /// Background used when the graph sets no `bgcolor`.
    pub fn with_background(mut self, color: Option<Color>) -> Self {
        self.configured_background = color;
        self
    }

    pub fn with_text_measure(mut self, measure: Arc<dyn TextMeasure>) -> Self {
        self.measure = measure;
        self
    }

    pub fn transform(&self) -> &CanvasTransform {
        &self.transform
    }

    /// Scene width and height including margins.
    pub fn size(&self) -> Size {
        self.transform.scene_size()
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn item(&self, key: ChangeTarget) -> Option<&SceneItem> {
        self.items.get(&key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in paint order: ascending z, then graph, subgraphs, edges, nodes.
    pub fn items(&self) -> Vec<&SceneItem> {
        let mut items: Vec<&SceneItem> = self.items.values().collect();
        items.sort_by(|a, b| a.z().total_cmp(&b.z()).then(a.layer().cmp(&b.layer())));
        items
    }

    /// The topmost non-graph item whose bounds contain `point`.
    pub fn item_at(&self, point: Point) -> Option<&SceneItem> {
        self.index
            .candidates(point)
            .filter_map(|key| self.items.get(&key))
            .filter(|item| item.bounds().is_some_and(|b| b.contains(point)))
            .max_by(|a, b| a.z().total_cmp(&b.z()).then(a.layer().cmp(&b.layer())))
    }

    /// Center of a node's item, for scrolling it into view.
    pub fn center_of(&self, node: Id) -> Option<Point> {
        self.items
            .get(&ChangeTarget::Node(node))
            .and_then(SceneItem::bounds)
            .map(|b| b.center())
    }

    pub fn set_configured_background(&mut self, color: Option<Color>, graph: &Graph) {
        self.configured_background = color;
        self.rebuild(graph);
    }

    pub fn set_detail_level(&mut self, level: DetailLevel, graph: &Graph) {
        self.config.detail_level = level;
        self.rebuild(graph);
    }

    /// Rebuilds every item from `graph`.
    pub fn rebuild(&mut self, graph: &Graph) {
        self.transform = CanvasTransform::from_graph(graph, &self.config);
        self.background = self.background_for(graph);
        self.items.clear();

        self.insert_item(graph, ChangeTarget::Graph);
        let keys = graph
            .subgraphs()
            .map(|s| ChangeTarget::Subgraph(s.id()))
            .chain(graph.edges().map(|e| ChangeTarget::Edge(e.id())))
            .chain(graph.nodes().map(|n| ChangeTarget::Node(n.id())))
            .collect::<Vec<_>>();
        for key in keys {
            self.insert_item(graph, key);
        }
        self.reindex();
        debug!(items = self.items.len(); "Scene rebuilt");
    }

    /// Applies `events` drained from `graph`.
    pub fn sync(&mut self, graph: &Graph, events: &[ChangeEvent]) -> SyncReport {
        let transform = CanvasTransform::from_graph(graph, &self.config);
        let background = self.background_for(graph);
        if transform != self.transform || background != self.background {
            self.rebuild(graph);
            return SyncReport {
                full_rebuild: true,
                ..SyncReport::default()
            };
        }

        let mut updated = IndexSet::new();
        let mut removed = IndexSet::new();
        for event in events {
            let key = event.target;
            match event.change {
                Change::Removed => {
                    if self.items.shift_remove(&key).is_some() {
                        removed.insert(key);
                    }
                    updated.shift_remove(&key);
                }
                Change::Renamed { from } => {
                    let old = retarget(key, from);
                    if self.items.shift_remove(&old).is_some() {
                        removed.insert(old);
                    }
                    self.insert_item(graph, key);
                    updated.insert(key);
                }
                Change::SelectionChanged => {
                    let selected = element_of(graph, key).is_some_and(GraphElement::is_selected);
                    if let Some(item) = self.items.get_mut(&key) {
                        item.set_selected(selected);
                        updated.insert(key);
                    }
                }
                Change::Added | Change::Modified => {
                    if self.insert_item(graph, key) {
                        removed.shift_remove(&key);
                        updated.insert(key);
                    }
                }
            }
        }
        self.reindex();

        let report = SyncReport {
            full_rebuild: false,
            updated: updated.into_iter().collect(),
            removed: removed.into_iter().collect(),
        };
        trace!(updated = report.updated.len(), removed = report.removed.len(); "Scene synced");
        report
    }

    /// Builds the item for `key` from the graph's current data, replacing
    /// any previous one. Returns false when the element no longer exists.
    fn insert_item(&mut self, graph: &Graph, key: ChangeTarget) -> bool {
        let Some(element) = element_of(graph, key) else {
            self.items.shift_remove(&key);
            return false;
        };
        let primitives = match key {
            ChangeTarget::Graph => self.graph_primitives(graph),
            _ => item::build_primitives(element.render_ops(), &self.transform),
        };
        let item = SceneItem::new(key, element.z(), element.is_selected(), primitives);
        self.items.insert(key, item);
        true
    }

    /// Graph-level ops, with labels placed by their left edge and shrunk to
    /// fit the width the layout reserved.
    fn graph_primitives(&self, graph: &Graph) -> Vec<Primitive> {
        let root = graph.root();
        let (shapes, labels): (Vec<_>, Vec<_>) = root
            .render_ops()
            .iter()
            .cloned()
            .partition(|op| op.kind() != RenderOpKind::Text);
        let mut primitives = item::build_primitives(&shapes, &self.transform);

        let color = Color::from_graphviz(root.font_color()).unwrap_or_default();
        let font_name = root.font_name();
        let t = &self.transform;
        for op in labels {
            let text = op.text().unwrap_or_default();
            let (x, y) = (f64::from(op.integer(0)), f64::from(op.integer(1)));
            let (align, width) = (f64::from(op.integer(2)), f64::from(op.integer(3)));
            let left = t.scale_x(x + align * width / 2.0 - width / 2.0) + t.margin_x() as f32;
            let top = t.scale_y(t.canvas_height() - y) + t.margin_y() as f32;
            let available = t.scale_x(width);

            let mut size = root.font_size() as f32;
            while size > 1.0 && self.measure.text_width(text, font_name, size) > available {
                size -= 1.0;
            }
            primitives.push(Primitive::Text {
                position: Point::new(left, top),
                anchor: TextAnchor::Start,
                text: text.to_string(),
                font: FontSpec {
                    name: font_name.to_string(),
                    size,
                },
                color,
                width: available,
            });
        }
        primitives
    }

    fn background_for(&self, graph: &Graph) -> Color {
        if let Some(value) = graph.root().attributes().value("bgcolor") {
            match Color::from_graphviz(value) {
                Ok(color) => return color,
                Err(err) => warn!(bgcolor = value, error:% = err; "Ignoring graph background"),
            }
        }
        self.configured_background.unwrap_or_else(default_background)
    }

    fn reindex(&mut self) {
        self.index.rebuild(self.items.values());
    }
}

fn default_background() -> Color {
    Color::from_graphviz(defaults::BACKGROUND_COLOR).unwrap_or_default()
}

fn element_of(graph: &Graph, key: ChangeTarget) -> Option<&GraphElement> {
    match key {
        ChangeTarget::Graph => Some(graph.root()),
        ChangeTarget::Node(id) => graph.node(id).map(|n| n.element()),
        ChangeTarget::Edge(id) => graph.edge(id).map(|e| e.element()),
        ChangeTarget::Subgraph(id) => graph.subgraph(id).map(|s| s.element()),
    }
}

/// The same kind of target under another id.
fn retarget(key: ChangeTarget, id: Id) -> ChangeTarget {
    match key {
        ChangeTarget::Graph => ChangeTarget::Graph,
        ChangeTarget::Node(_) => ChangeTarget::Node(id),
        ChangeTarget::Edge(_) => ChangeTarget::Edge(id),
        ChangeTarget::Subgraph(_) => ChangeTarget::Subgraph(id),
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn scene() -> Scene {
        Scene::default().with_text_measure(Arc::new(ApproximateMeasure))
    }

    fn parse(source: &str) -> Graph {
        dotlens_parser::parse(source).unwrap()
    }

    const LAID_OUT: &str = r#"digraph g {
        graph [bb="0,0,54,108"];
        a [_draw_="c 7 -#000000 e 27 90 27 18", _ldraw_="F 14 11 -Times-Roman c 7 -#000000 T 27 86 0 7 1 -a"];
        b [_draw_="c 7 -#000000 e 27 18 27 18"];
        a -> b [_draw_="c 7 -#000000 B 4 27 72 27 60 27 48 27 36"];
    }"#;

    #[test]
    fn test_rebuild_maps_every_element() {
        let graph = parse(LAID_OUT);
        let mut scene = scene();
        scene.rebuild(&graph);

        assert_eq!(scene.len(), 4);
        let size = scene.size();
        assert_approx_eq!(f32, size.width(), 154.0);
        assert_approx_eq!(f32, size.height(), 208.0);

        let center = scene.center_of(Id::new("a")).unwrap();
        assert_approx_eq!(f32, center.x(), 77.0);
        assert_approx_eq!(f32, center.y(), 68.0);

        let kinds: Vec<u8> = scene.items().iter().map(|i| i.layer()).collect();
        assert_eq!(kinds, [0, 2, 3, 3]);
    }

    #[test]
    fn test_item_at_picks_nodes() {
        let graph = parse(LAID_OUT);
        let mut scene = scene();
        scene.rebuild(&graph);

        let hit = scene.item_at(Point::new(77.0, 68.0)).unwrap();
        assert_eq!(hit.key(), ChangeTarget::Node(Id::new("a")));
        assert!(scene.item_at(Point::new(5.0, 5.0)).is_none());
    }

    #[test]
    fn test_item_at_with_huge_geometry() {
        let graph = parse(
            r#"digraph g {
                graph [bb="0,0,100,100"];
                big [_draw_="e 0 0 300000 300000"];
                a [z=2, _draw_="e 50 50 10 10"];
            }"#,
        );
        let mut scene = scene();
        scene.rebuild(&graph);
        assert!(scene.index.cell_count() <= 1);

        let center = scene.center_of(Id::new("a")).unwrap();
        let hit = scene.item_at(center).unwrap();
        assert_eq!(hit.key(), ChangeTarget::Node(Id::new("a")));
        let far = scene.item_at(Point::new(center.x() + 5000.0, center.y())).unwrap();
        assert_eq!(far.key(), ChangeTarget::Node(Id::new("big")));
    }

    #[test]
    fn test_sync_touches_only_changed_items() {
        let mut graph = parse(LAID_OUT);
        let mut scene = scene();
        scene.rebuild(&graph);

        graph.set_attribute(Id::new("b"), "color", "red").unwrap();
        graph.remove_edge(Id::new("a->b")).unwrap();
        let events = graph.take_changes();
        let report = scene.sync(&graph, &events);

        assert!(!report.full_rebuild);
        assert_eq!(report.updated, [ChangeTarget::Node(Id::new("b"))]);
        assert_eq!(report.removed, [ChangeTarget::Edge(Id::new("a->b"))]);
        assert!(scene.item(ChangeTarget::Edge(Id::new("a->b"))).is_none());
    }

    #[test]
    fn test_sync_rename_and_selection() {
        let mut graph = parse(LAID_OUT);
        let mut scene = scene();
        scene.rebuild(&graph);

        graph.rename_node(Id::new("a"), Id::new("z")).unwrap();
        graph.select_node(Id::new("b")).unwrap();
        let events = graph.take_changes();
        let report = scene.sync(&graph, &events);

        assert!(report.removed.contains(&ChangeTarget::Node(Id::new("a"))));
        assert!(scene.item(ChangeTarget::Node(Id::new("z"))).is_some());
        assert!(scene.item(ChangeTarget::Node(Id::new("b"))).unwrap().is_selected());
    }

    #[test]
    fn test_canvas_change_forces_full_rebuild() {
        let mut graph = parse(LAID_OUT);
        let mut scene = scene();
        scene.rebuild(&graph);

        graph.set_canvas_size(200.0, 108.0);
        let report = scene.sync(&graph, &[]);
        assert!(report.full_rebuild);
        assert_approx_eq!(f32, scene.size().width(), 300.0);
    }

    #[test]
    fn test_background_precedence() {
        let graph = parse(LAID_OUT);
        let mut scene = scene().with_background(Some(Color::new("navy").unwrap()));
        scene.rebuild(&graph);
        assert_eq!(scene.background(), Color::new("navy").unwrap());

        let graph = parse(r#"digraph { bgcolor="yellow"; a }"#);
        scene.rebuild(&graph);
        assert_eq!(scene.background(), Color::new("yellow").unwrap());

        let mut plain = Scene::default();
        plain.rebuild(&parse("digraph { a }"));
        assert_eq!(plain.background(), Color::new("white").unwrap());
    }

    #[test]
    fn test_graph_label_shrinks_to_fit() {
        let graph = parse(
            r#"digraph {
                graph [bb="0,0,200,100", fontsize=20, fontname="Helvetica",
                       _ldraw_="F 20 9 -Helvetica c 7 -#000000 T 100 10 0 40 10 -Long title"];
            }"#,
        );
        let mut scene = scene();
        scene.rebuild(&graph);

        let item = scene.item(ChangeTarget::Graph).unwrap();
        let Some(Primitive::Text { position, font, anchor, .. }) = item.primitives().last() else {
            panic!("expected graph label");
        };
        assert_eq!(*anchor, TextAnchor::Start);
        assert_eq!(font.name, "Helvetica");
        // 10 characters at 0.55 em must fit in 40 units.
        assert!(ApproximateMeasure.text_width("Long title", "", font.size) <= 40.0);
        assert!(font.size < 20.0);
        assert_approx_eq!(f32, position.x(), 130.0);
        assert_approx_eq!(f32, position.y(), 140.0);
    }
}
