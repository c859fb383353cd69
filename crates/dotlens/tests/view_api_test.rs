//! Integration tests for the GraphView API

use std::fs;

use dotlens::{
    DotlensError, GraphView,
    attributes::AttributeStore,
    config::AppConfig,
    engine::LayoutMethod,
    graph::{Change, ChangeTarget},
    identifier::Id,
};

fn embedded_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.layout.method = LayoutMethod::Embedded;
    config
}

#[test]
fn test_load_file_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("graph.dot");
    fs::write(&input, "digraph g { a -> b; b -> c; a -> c [label=skip] }").unwrap();

    let mut view = GraphView::new(embedded_config());
    view.load_file(&input).expect("Failed to load graph");
    assert_eq!(view.graph().node_count(), 3);
    assert_eq!(view.source_path(), Some(input.as_path()));

    let svg_path = dir.path().join("graph.svg");
    view.export_svg(&svg_path).expect("Failed to export SVG");
    let svg = fs::read_to_string(&svg_path).unwrap();
    assert!(svg.contains("<svg"), "Output should contain SVG tag");
    assert!(svg.contains("</svg>"), "Output should be complete SVG");

    let dot_path = dir.path().join("saved.dot");
    view.save_dot(&dot_path).expect("Failed to save DOT");
    let saved = fs::read_to_string(&dot_path).unwrap();
    assert!(saved.contains("\"a\" -> \"c\""));
    assert!(!saved.contains("_draw_"));
}

#[test]
fn test_failed_load_keeps_previous_graph() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.dot");
    let bad = dir.path().join("bad.dot");
    fs::write(&good, "digraph { a -> b }").unwrap();
    fs::write(&bad, "digraph { a -> }").unwrap();

    let mut view = GraphView::new(embedded_config());
    view.load_file(&good).unwrap();
    let items = view.scene().len();

    let result = view.load_file(&bad);
    assert!(matches!(result, Err(DotlensError::Parse { .. })));
    assert!(matches!(
        view.load_file(dir.path().join("missing.dot")),
        Err(DotlensError::Io(_))
    ));

    assert_eq!(view.graph().node_count(), 2);
    assert_eq!(view.scene().len(), items);
    assert_eq!(view.source_path(), Some(good.as_path()));
}

#[test]
fn test_reload_picks_up_file_changes() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("graph.dot");
    fs::write(&input, "digraph { a }").unwrap();

    let mut view = GraphView::new(embedded_config());
    view.load_file(&input).unwrap();
    fs::write(&input, "digraph { a -> b }").unwrap();
    view.reload().unwrap();
    assert_eq!(view.graph().edge_count(), 1);
}

#[test]
fn test_editing_session() {
    let mut view = GraphView::new(embedded_config());
    view.load_graph(dotlens_parser::parse("digraph { a -> b }").unwrap())
        .unwrap();
    let events = view.subscribe();

    let cluster = view
        .add_subgraph(AttributeStore::from_iter([("id", "cluster_x"), ("label", "X")]))
        .unwrap();
    let c = view
        .add_node_to_subgraph(AttributeStore::from_iter([("id", "c")]), cluster)
        .unwrap();
    let edge = view.add_edge(Id::new("b"), c, AttributeStore::new()).unwrap();
    assert_eq!(edge, "b->c");
    assert!(view.scene().item(ChangeTarget::Subgraph(cluster)).is_some());

    view.rename_node(c, Id::new("d")).unwrap();
    assert!(view.graph().node(Id::new("d")).is_some());
    assert!(view.scene().item(ChangeTarget::Node(c)).is_none());
    assert!(view.scene().item(ChangeTarget::Node(Id::new("d"))).is_some());

    view.set_attribute(Id::new("a"), "label", "Alpha").unwrap();
    let label = view.graph().node(Id::new("a")).unwrap().element().label();
    assert_eq!(label, "Alpha");

    view.move_existing_node_to_main_graph(Id::new("d")).unwrap();
    assert!(view.graph().subgraphs_of(Id::new("d")).is_empty());

    view.remove_element(cluster).unwrap();
    assert!(view.scene().item(ChangeTarget::Subgraph(cluster)).is_none());

    let received: Vec<_> = events.try_iter().collect();
    assert!(received.iter().any(|e| e.change == Change::Added));
    assert!(
        received
            .iter()
            .any(|e| matches!(e.change, Change::Renamed { from } if from == c))
    );
    assert!(received.iter().any(|e| e.change == Change::Removed));
}

#[test]
fn test_graph_attributes_restyle_scene() {
    let mut view = GraphView::new(embedded_config());
    view.load_graph(dotlens_parser::parse("digraph { a }").unwrap())
        .unwrap();
    let before = view.scene().background();

    let changed = view
        .set_graph_attributes(&AttributeStore::from_iter([("bgcolor", "lightblue")]))
        .unwrap();
    assert!(changed);
    assert_ne!(view.scene().background(), before);
}

#[test]
fn test_element_at_finds_node() {
    let mut view = GraphView::new(embedded_config());
    view.load_graph(dotlens_parser::parse("digraph { a }").unwrap())
        .unwrap();
    let center = view.scene().center_of(Id::new("a")).unwrap();
    assert_eq!(
        view.element_at(center),
        Some(ChangeTarget::Node(Id::new("a")))
    );
}
