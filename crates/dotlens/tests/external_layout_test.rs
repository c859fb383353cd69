//! Layout through a child process, using `cat` on a canned xdot file as
//! the layout command.

#![cfg(unix)]

use dotlens::{
    GraphView,
    config::AppConfig,
    engine::LayoutMethod,
    graph::ChangeTarget,
    identifier::Id,
    layout::{CancelToken, ExternalEngine, LayoutEngine, LayoutError},
    render_op::RenderOpKind,
};
use dotlens_core::engine::LayoutAlgorithm;

fn fixture_command() -> String {
    format!(
        "cat {}/tests/fixtures/two_nodes.xdot",
        env!("CARGO_MANIFEST_DIR")
    )
}

#[test]
fn test_canned_layout_is_applied() {
    let mut config = AppConfig::default();
    config.layout.method = LayoutMethod::External;
    config.layout.command = Some(fixture_command());

    let mut view = GraphView::new(config);
    view.load_graph(dotlens_parser::parse("digraph g { a -> b }").unwrap())
        .unwrap();

    let graph = view.graph();
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.width(), 62.0);
    assert_eq!(graph.height(), 116.0);
    for id in ["a", "b"] {
        let node = graph.node(Id::new(id)).unwrap();
        assert!(
            node.element()
                .render_ops()
                .iter()
                .any(|op| op.kind() == RenderOpKind::UnfilledEllipse)
        );
        assert!(view.scene().item(ChangeTarget::Node(Id::new(id))).is_some());
    }
}

#[test]
fn test_saved_file_keeps_only_source_attributes() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("g.dot");
    let saved = dir.path().join("saved.dot");
    std::fs::write(&source, "digraph g { a -> b }").unwrap();

    let mut config = AppConfig::default();
    config.layout.method = LayoutMethod::External;
    config.layout.command = Some(fixture_command());
    let mut view = GraphView::new(config);
    view.load_file(&source).unwrap();
    assert_eq!(view.graph().width(), 62.0);
    assert!(!view.graph().node(Id::new("a")).unwrap().element().render_ops().is_empty());

    view.save_dot(&saved).unwrap();
    let text = std::fs::read_to_string(&saved).unwrap();
    for key in ["pos=", "width=", "height=", "bb=", "xdotversion", "_draw_", "_ldraw_"] {
        assert!(!text.contains(key), "`{key}` leaked into:\n{text}");
    }
    assert!(text.contains("\"a\" -> \"b\""));
}

#[test]
fn test_missing_command() {
    let engine = ExternalEngine::new(LayoutAlgorithm::Dot)
        .with_command(Some("dotlens-no-such-layout-program -Txdot".to_string()));
    let graph = dotlens_parser::parse("digraph { a }").unwrap();
    assert!(matches!(
        engine.layout(&graph, &CancelToken::new()),
        Err(LayoutError::CommandNotFound { .. })
    ));
}

#[test]
fn test_failing_command() {
    let engine = ExternalEngine::new(LayoutAlgorithm::Dot).with_command(Some("false".to_string()));
    let graph = dotlens_parser::parse("digraph { a }").unwrap();
    assert!(matches!(
        engine.layout(&graph, &CancelToken::new()),
        Err(LayoutError::ExitStatus { .. })
    ));
}

#[test]
fn test_garbage_output() {
    let engine = ExternalEngine::new(LayoutAlgorithm::Dot).with_command(Some("echo {{{".to_string()));
    let graph = dotlens_parser::parse("digraph { a }").unwrap();
    assert!(matches!(
        engine.layout(&graph, &CancelToken::new()),
        Err(LayoutError::InvalidOutput { .. })
    ));
}
