//! The editing façade over a graph and its scene.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver, Sender},
};

use log::{debug, info, trace, warn};

use dotlens_core::{
    GraphError,
    attributes::AttributeStore,
    engine::LayoutMethod,
    geometry::Point,
    graph::{Change, ChangeEvent, ChangeTarget, Graph},
    identifier::Id,
};

use crate::{
    config::AppConfig,
    error::DotlensError,
    export::{Exporter, dot, svg::Svg},
    layout::{self, CancelToken, LayoutJob},
    scene::Scene,
};

/// Smallest and largest zoom factor.
const ZOOM_RANGE: (f64, f64) = (0.1, 10.0);
const ZOOM_IN_STEP: f64 = 1.1;
const ZOOM_OUT_STEP: f64 = 0.9;

/// A load whose layout runs in the background.
#[derive(Debug)]
struct PendingLoad {
    job: LayoutJob,
    source: Graph,
    path: Option<PathBuf>,
}

/// Owns a laid-out [`Graph`] and the [`Scene`] mirroring it.
///
/// Every edit runs against a copy of the graph. The copy is laid out, the
/// layout is merged back into it, and only then does it replace the current
/// graph, so a failed edit or layout leaves the view untouched. The change
/// events of a committed edit drive [`Scene::sync`] and are forwarded to
/// every [`subscribe`](Self::subscribe)r.
///
/// # Examples
///
/// ```
/// use dotlens::{GraphView, config::AppConfig};
/// use dotlens_core::{attributes::AttributeStore, engine::LayoutMethod};
///
/// let mut config = AppConfig::default();
/// config.layout.method = LayoutMethod::Embedded;
///
/// let mut view = GraphView::new(config);
/// let graph = dotlens_parser::parse("digraph g { a -> b }").unwrap();
/// view.load_graph(graph).unwrap();
///
/// let c = view.add_node(AttributeStore::from_iter([("id", "c")])).unwrap();
/// assert!(view.graph().node(c).is_some());
/// assert_eq!(view.graph().node_count(), 3);
/// ```
#[derive(Debug)]
pub struct GraphView {
    config: AppConfig,
    graph: Graph,
    scene: Scene,
    source_path: Option<PathBuf>,
    read_only: bool,
    pending: Option<PendingLoad>,
    subscribers: Vec<Sender<ChangeEvent>>,
    zoom: f64,
}

impl Default for GraphView {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl GraphView {
    /// Creates an empty view.
    ///
    /// An invalid configured background color is logged and ignored.
    pub fn new(config: AppConfig) -> Self {
        let background = config.style.background_color().unwrap_or_else(|err| {
            warn!(err:% = err; "Ignoring configured background color");
            None
        });
        let scene = Scene::new(config.scene.clone()).with_background(background);
        Self {
            config,
            graph: Graph::default(),
            scene,
            source_path: None,
            read_only: false,
            pending: None,
            subscribers: Vec::new(),
            zoom: 1.0,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The file the current graph was loaded from.
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Rejects every edit with [`DotlensError::ReadOnly`]. Selection and
    /// export still work.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Overrides the external layout command; `None` restores the default.
    pub fn set_layout_command(&mut self, command: Option<String>) {
        self.config.layout.command = command;
    }

    pub fn set_layout_method(&mut self, method: LayoutMethod) {
        self.config.layout.method = method;
    }

    /// Sets the background used when the graph has no `bgcolor`.
    ///
    /// # Errors
    ///
    /// Returns [`DotlensError::Config`] for a color Graphviz would not accept.
    pub fn set_background_color(&mut self, color: Option<String>) -> Result<(), DotlensError> {
        let mut style = self.config.style.clone();
        style.set_background_color(color);
        let parsed = style.background_color().map_err(DotlensError::Config)?;
        self.config.style = style;
        self.scene.set_configured_background(parsed, &self.graph);
        Ok(())
    }

    /// Returns a receiver for the change events of every committed edit.
    ///
    /// Receivers may be dropped at any time.
    pub fn subscribe(&mut self) -> Receiver<ChangeEvent> {
        let (sender, receiver) = mpsc::channel();
        self.subscribers.push(sender);
        receiver
    }

    /// Reads, parses and lays out a DOT file, replacing the current graph.
    ///
    /// # Errors
    ///
    /// I/O, parse and layout failures. The previous graph is kept on error.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), DotlensError> {
        let path = path.as_ref();
        info!(path:? = path; "Loading graph file");
        let graph = read_graph(path)?;
        let laid_out = self.layout_now(&graph)?;
        self.install(graph, &laid_out, Some(path.to_path_buf()));
        Ok(())
    }

    /// Lays out an in-memory graph and replaces the current one with it.
    pub fn load_graph(&mut self, graph: Graph) -> Result<(), DotlensError> {
        let laid_out = self.layout_now(&graph)?;
        self.install(graph, &laid_out, None);
        Ok(())
    }

    /// Loads the current source file again. Does nothing for graphs that did
    /// not come from a file.
    pub fn reload(&mut self) -> Result<(), DotlensError> {
        match self.source_path.clone() {
            Some(path) => self.load_file(path),
            None => Ok(()),
        }
    }

    /// Parses `path` and starts laying it out in the background.
    ///
    /// A load already in progress is cancelled. Finish with
    /// [`poll_load`](Self::poll_load).
    ///
    /// # Errors
    ///
    /// I/O and parse errors are reported immediately; layout errors are
    /// reported by `poll_load`.
    pub fn begin_load(&mut self, path: impl AsRef<Path>) -> Result<(), DotlensError> {
        let path = path.as_ref();
        let graph = read_graph(path)?;
        self.start_job(graph, Some(path.to_path_buf()))
    }

    /// Starts laying out an in-memory graph in the background.
    pub fn begin_load_graph(&mut self, graph: Graph) -> Result<(), DotlensError> {
        self.start_job(graph, None)
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Installs the background layout if it has finished.
    ///
    /// Returns `None` while the layout is running or when nothing is pending.
    pub fn poll_load(&mut self) -> Option<Result<(), DotlensError>> {
        let result = self.pending.as_mut()?.job.try_take()?;
        let pending = self.pending.take()?;
        Some(match result {
            Ok(laid_out) => {
                self.install(pending.source, &laid_out, pending.path);
                Ok(())
            }
            Err(err) => {
                warn!(err:% = err; "Background layout failed");
                Err(err.into())
            }
        })
    }

    /// Cancels the background load, if any. The current graph is kept.
    pub fn cancel_load(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.job.cancel();
            debug!("Background load cancelled");
        }
    }

    pub fn add_node(&mut self, attrs: AttributeStore) -> Result<Id, DotlensError> {
        self.edit(|g| g.add_node(attrs))
    }

    pub fn add_node_to_subgraph(
        &mut self,
        attrs: AttributeStore,
        subgraph: Id,
    ) -> Result<Id, DotlensError> {
        self.edit(|g| g.add_node_to_subgraph(attrs, subgraph))
    }

    pub fn add_existing_node_to_subgraph(
        &mut self,
        node: Id,
        subgraph: Id,
    ) -> Result<(), DotlensError> {
        self.edit(|g| g.add_existing_node_to_subgraph(node, subgraph))
    }

    pub fn remove_node_from_subgraph(&mut self, node: Id, subgraph: Id) -> Result<(), DotlensError> {
        self.edit(|g| g.remove_node_from_subgraph(node, subgraph))
    }

    pub fn move_existing_node_to_main_graph(&mut self, node: Id) -> Result<(), DotlensError> {
        self.edit(|g| g.move_existing_node_to_main_graph(node))
    }

    pub fn remove_node(&mut self, node: Id) -> Result<(), DotlensError> {
        self.edit(|g| g.remove_node(node))
    }

    pub fn rename_node(&mut self, old: Id, new: Id) -> Result<(), DotlensError> {
        self.edit(|g| g.rename_node(old, new))
    }

    pub fn add_edge(
        &mut self,
        source: Id,
        target: Id,
        attrs: AttributeStore,
    ) -> Result<Id, DotlensError> {
        self.edit(|g| g.add_edge(source, target, attrs))
    }

    pub fn remove_edge(&mut self, edge: Id) -> Result<(), DotlensError> {
        self.edit(|g| g.remove_edge(edge))
    }

    pub fn add_subgraph(&mut self, attrs: AttributeStore) -> Result<Id, DotlensError> {
        self.edit(|g| g.add_subgraph(attrs))
    }

    pub fn add_subgraph_to_subgraph(&mut self, child: Id, parent: Id) -> Result<(), DotlensError> {
        self.edit(|g| g.add_subgraph_to_subgraph(child, parent))
    }

    pub fn remove_subgraph(&mut self, subgraph: Id) -> Result<(), DotlensError> {
        self.edit(|g| g.remove_subgraph(subgraph))
    }

    pub fn rename_subgraph(&mut self, old: Id, new: Id) -> Result<(), DotlensError> {
        self.edit(|g| g.rename_subgraph(old, new))
    }

    /// Removes whichever node, edge or subgraph has this id.
    pub fn remove_element(&mut self, id: Id) -> Result<(), DotlensError> {
        self.edit(|g| g.remove_element(id))
    }

    /// Sets an attribute and re-lays out the graph if the value changed.
    pub fn set_attribute(&mut self, element: Id, key: &str, value: &str) -> Result<bool, DotlensError> {
        self.edit(|g| g.set_attribute(element, key, value))
    }

    pub fn remove_attribute(&mut self, element: Id, key: &str) -> Result<bool, DotlensError> {
        self.edit(|g| g.remove_attribute(element, key))
    }

    pub fn set_graph_attributes(&mut self, attrs: &AttributeStore) -> Result<bool, DotlensError> {
        self.edit(|g| Ok(g.set_graph_attributes(attrs)))
    }

    /// Selects a node. Selection does not trigger a layout.
    pub fn select_node(&mut self, node: Id) -> Result<(), DotlensError> {
        self.graph.select_node(node)?;
        self.publish_changes();
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.graph.clear_selection();
        self.publish_changes();
    }

    /// The first element whose scene item contains `point`.
    pub fn element_at(&self, point: Point) -> Option<ChangeTarget> {
        self.scene.item_at(point).map(|item| item.key())
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Sets the zoom factor, clamped to `0.1..=10`.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(ZOOM_RANGE.0, ZOOM_RANGE.1);
        trace!(zoom = self.zoom; "Zoom changed");
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom * ZOOM_IN_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom * ZOOM_OUT_STEP);
    }

    /// Where a viewport should center to show `node` at the current zoom.
    pub fn center_on_node(&self, node: Id) -> Option<Point> {
        let center = self.scene.center_of(node)?;
        let zoom = self.zoom as f32;
        Some(Point::new(center.x() * zoom, center.y() * zoom))
    }

    /// Writes the scene as SVG.
    pub fn export_svg(&self, path: impl AsRef<Path>) -> Result<(), DotlensError> {
        let file_name = path.as_ref().to_string_lossy();
        let mut exporter = Svg::new(&file_name);
        exporter.export_scene(&self.scene)?;
        Ok(())
    }

    /// Writes the graph as DOT without layout attributes.
    pub fn save_dot(&self, path: impl AsRef<Path>) -> Result<(), DotlensError> {
        dot::save_dot(&self.graph, path)?;
        Ok(())
    }

    fn layout_now(&self, graph: &Graph) -> Result<Graph, DotlensError> {
        let engine = layout::build_engine(&self.config.layout);
        Ok(engine.layout(graph, &CancelToken::new())?)
    }

    fn start_job(&mut self, graph: Graph, path: Option<PathBuf>) -> Result<(), DotlensError> {
        self.cancel_load();
        let engine = layout::build_engine(&self.config.layout);
        let job = LayoutJob::spawn(engine, graph.clone())?;
        self.pending = Some(PendingLoad {
            job,
            source: graph,
            path,
        });
        Ok(())
    }

    /// Merges the layout into the source graph, replaces the current graph
    /// with it and rebuilds the scene.
    ///
    /// The source keeps its original attribute keys, so layout output does
    /// not leak into saved documents.
    fn install(&mut self, mut source: Graph, laid_out: &Graph, path: Option<PathBuf>) {
        source.update_with_graph(laid_out);
        source.take_changes();
        self.graph = source;
        self.source_path = path;
        self.scene.rebuild(&self.graph);
        info!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            subgraphs = self.graph.subgraph_count();
            "Graph loaded"
        );
        self.notify(&[ChangeEvent::new(ChangeTarget::Graph, Change::Modified)]);
    }

    /// Applies `mutate` to a copy of the graph, lays the copy out and commits
    /// it. Edits that queue no events skip the layout.
    fn edit<T>(
        &mut self,
        mutate: impl FnOnce(&mut Graph) -> Result<T, GraphError>,
    ) -> Result<T, DotlensError> {
        if self.read_only {
            return Err(DotlensError::ReadOnly);
        }

        let mut working = self.graph.clone();
        let value = mutate(&mut working)?;
        if !working.has_changes() {
            trace!("Edit changed nothing");
            return Ok(value);
        }

        let fresh = self.layout_now(&working)?;
        working.update_with_graph(&fresh);
        let events = working.take_changes();

        self.graph = working;
        let report = self.scene.sync(&self.graph, &events);
        debug!(
            events = events.len(),
            full_rebuild = report.full_rebuild,
            updated = report.updated.len(),
            removed = report.removed.len();
            "Edit committed"
        );
        self.notify(&events);
        Ok(value)
    }

    fn publish_changes(&mut self) {
        let events = self.graph.take_changes();
        if events.is_empty() {
            return;
        }
        self.scene.sync(&self.graph, &events);
        self.notify(&events);
    }

    fn notify(&mut self, events: &[ChangeEvent]) {
        self.subscribers
            .retain(|subscriber| events.iter().all(|event| subscriber.send(*event).is_ok()));
    }
}

fn read_graph(path: &Path) -> Result<Graph, DotlensError> {
    let source = fs::read_to_string(path)?;
    match dotlens_parser::parse(&source) {
        Ok(graph) => Ok(graph),
        Err(err) => Err(DotlensError::new_parse_error(err, source)),
    }
}

#[cfg(test)]
mod tests {
    use dotlens_core::color::Color;

    use super::*;

    fn embedded_view() -> GraphView {
        let mut config = AppConfig::default();
        config.layout.method = LayoutMethod::Embedded;
        GraphView::new(config)
    }

    fn loaded_view(source: &str) -> GraphView {
        let mut view = embedded_view();
        view.load_graph(dotlens_parser::parse(source).unwrap()).unwrap();
        view
    }

    #[test]
    fn test_edit_relayouts_and_syncs_scene() {
        let mut view = loaded_view("digraph { a -> b }");
        let c = view
            .add_node(AttributeStore::from_iter([("id", "c"), ("label", "C")]))
            .unwrap();

        let node = view.graph().node(c).unwrap();
        assert!(!node.element().render_ops().is_empty());
        assert!(view.scene().item(ChangeTarget::Node(c)).is_some());
        assert!(!view.graph().has_changes());
    }

    #[test]
    fn test_failed_edit_keeps_graph() {
        let mut view = loaded_view("digraph { a -> b }");
        let err = view.add_edge(Id::new("a"), Id::new("missing"), AttributeStore::new());
        assert!(matches!(err, Err(DotlensError::Graph(GraphError::NotFound { .. }))));
        assert_eq!(view.graph().edge_count(), 1);
    }

    #[test]
    fn test_read_only_rejects_edits() {
        let mut view = loaded_view("digraph { a }");
        view.set_read_only(true);
        assert!(matches!(
            view.remove_node(Id::new("a")),
            Err(DotlensError::ReadOnly)
        ));
        assert!(view.select_node(Id::new("a")).is_ok());
    }

    #[test]
    fn test_subscribers_receive_events() {
        let mut view = loaded_view("digraph { a }");
        let receiver = view.subscribe();
        view.remove_node(Id::new("a")).unwrap();

        let events: Vec<ChangeEvent> = receiver.try_iter().collect();
        assert!(events.contains(&ChangeEvent::new(
            ChangeTarget::Node(Id::new("a")),
            Change::Removed
        )));
        assert!(view.scene().item(ChangeTarget::Node(Id::new("a"))).is_none());
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let mut view = loaded_view("digraph { a }");
        drop(view.subscribe());
        view.select_node(Id::new("a")).unwrap();
        assert!(view.subscribers.is_empty());
    }

    #[test]
    fn test_selection_does_not_relayout() {
        let mut view = loaded_view("digraph { a; b }");
        let before = view.graph().node(Id::new("a")).unwrap().element().attributes().value("pos").map(str::to_string);
        view.select_node(Id::new("a")).unwrap();

        assert_eq!(view.graph().selected_nodes(), vec![Id::new("a")]);
        assert!(view.scene().item(ChangeTarget::Node(Id::new("a"))).unwrap().is_selected());
        let after = view.graph().node(Id::new("a")).unwrap().element().attributes().value("pos").map(str::to_string);
        assert_eq!(before, after);

        view.clear_selection();
        assert!(view.graph().selected_nodes().is_empty());
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut view = embedded_view();
        view.set_zoom(50.0);
        assert_eq!(view.zoom(), 10.0);
        view.zoom_in();
        assert_eq!(view.zoom(), 10.0);
        view.set_zoom(0.1);
        view.zoom_out();
        assert_eq!(view.zoom(), 0.1);
    }

    #[test]
    fn test_center_on_node_scales_with_zoom() {
        let mut view = loaded_view("digraph { a }");
        let base = view.center_on_node(Id::new("a")).unwrap();
        view.set_zoom(2.0);
        let zoomed = view.center_on_node(Id::new("a")).unwrap();
        assert!((zoomed.x() - base.x() * 2.0).abs() < 1e-3);
        assert!(view.center_on_node(Id::new("nope")).is_none());
    }

    #[test]
    fn test_invalid_background_color() {
        let mut view = loaded_view("digraph { a }");
        assert!(matches!(
            view.set_background_color(Some("not-a-color".to_string())),
            Err(DotlensError::Config(_))
        ));
        view.set_background_color(Some("#102030".to_string())).unwrap();
        assert_eq!(
            view.scene().background(),
            Color::from_graphviz("#102030").unwrap()
        );
    }

    #[test]
    fn test_background_load() {
        let mut view = embedded_view();
        view.begin_load_graph(dotlens_parser::parse("digraph { a -> b -> c }").unwrap())
            .unwrap();
        assert!(view.is_loading());

        let result = loop {
            if let Some(result) = view.poll_load() {
                break result;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        };
        assert!(result.is_ok());
        assert!(!view.is_loading());
        assert_eq!(view.graph().node_count(), 3);
    }

    #[test]
    fn test_cancel_load_keeps_graph() {
        let mut view = loaded_view("digraph { a }");
        view.begin_load_graph(dotlens_parser::parse("digraph { x; y }").unwrap())
            .unwrap();
        view.cancel_load();
        assert!(!view.is_loading());
        assert!(view.poll_load().is_none());
        assert!(view.graph().node(Id::new("a")).is_some());
    }
}
