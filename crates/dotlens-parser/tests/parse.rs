use dotlens_core::identifier::Id;
use dotlens_core::render_op::RenderOpKind;
use dotlens_parser::error::{ErrorCode, Severity};
use dotlens_parser::parse;

fn codes(source: &str) -> Vec<ErrorCode> {
    parse(source)
        .expect_err("source should not parse")
        .diagnostics()
        .iter()
        .filter_map(|d| d.code())
        .collect()
}

#[test]
fn test_simple_digraph() {
    let graph = parse("digraph G { a -> b; b -> c }").expect("Failed to parse");

    assert_eq!(graph.name(), "G");
    assert!(graph.directed());
    assert!(!graph.strict());
    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 2);

    let ids: Vec<String> = graph.nodes().map(|n| n.id().to_string()).collect();
    assert_eq!(ids, ["a", "b", "c"]);

    let edge = graph.edge(Id::new("a->b")).expect("edge a->b");
    assert_eq!(edge.source(), Id::new("a"));
    assert_eq!(edge.target(), Id::new("b"));
    assert!(!graph.has_changes());
}

#[test]
fn test_keywords_are_case_insensitive() {
    let graph = parse("DiGraph G { Node [shape=box] A; EDGE [color=red] A -> B }").unwrap();
    assert!(graph.directed());
    assert_eq!(graph.node(Id::new("A")).unwrap().element().shape(), "box");
    assert_eq!(graph.edge(Id::new("A->B")).unwrap().element().color(), "red");
}

#[test]
fn test_node_defaults_are_scoped() {
    let graph = parse(
        "digraph {
            node [shape=box];
            a;
            subgraph s { node [color=red]; b }
            c
        }",
    )
    .unwrap();

    let a = graph.node(Id::new("a")).unwrap().element();
    let b = graph.node(Id::new("b")).unwrap().element();
    let c = graph.node(Id::new("c")).unwrap().element();
    assert_eq!(a.shape(), "box");
    assert_eq!(b.shape(), "box");
    assert_eq!(b.attributes().get("color"), "red");
    assert_eq!(c.shape(), "box");
    assert!(!c.attributes().contains("color"));
}

#[test]
fn test_defaults_apply_only_at_creation() {
    let graph = parse("graph { a; node [shape=box]; a [label=x]; b }").unwrap();
    let a = graph.node(Id::new("a")).unwrap().element();
    assert!(!a.attributes().contains("shape"));
    assert_eq!(a.label(), "x");
    assert_eq!(graph.node(Id::new("b")).unwrap().element().shape(), "box");
}

#[test]
fn test_subgraph_membership() {
    let graph = parse(
        "digraph {
            subgraph cluster_0 {
                label = \"outer\";
                x;
                subgraph inner { graph [style=dashed] y }
            }
            z
        }",
    )
    .unwrap();

    let outer = graph.subgraph(Id::new("cluster_0")).unwrap();
    assert_eq!(outer.nodes().collect::<Vec<_>>(), [Id::new("x")]);
    assert_eq!(outer.subgraphs().collect::<Vec<_>>(), [Id::new("inner")]);
    assert_eq!(outer.element().label(), "outer");

    let inner = graph.subgraph(Id::new("inner")).unwrap();
    assert_eq!(inner.nodes().collect::<Vec<_>>(), [Id::new("y")]);
    assert_eq!(inner.element().style(), "dashed");

    assert!(graph.subgraphs_of(Id::new("z")).is_empty());
}

#[test]
fn test_reopened_subgraph_is_reused() {
    let graph = parse("graph { subgraph s { a } subgraph s { b } }").unwrap();
    assert_eq!(graph.subgraph_count(), 1);
    assert_eq!(graph.subgraph(Id::new("s")).unwrap().nodes().count(), 2);
}

#[test]
fn test_subgraph_endpoints_expand() {
    let graph = parse("digraph { a -> { b c } -> d }").unwrap();
    assert_eq!(graph.edge_count(), 4);
    for (s, t) in [("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")] {
        assert!(
            graph
                .edges()
                .any(|e| e.source() == Id::new(s) && e.target() == Id::new(t)),
            "missing edge {s} -> {t}"
        );
    }
    let anonymous = graph.subgraph(Id::from_anonymous(0)).expect("anonymous subgraph");
    assert_eq!(anonymous.nodes().count(), 2);
}

#[test]
fn test_parallel_edges_get_distinct_ids() {
    let graph = parse("digraph { a -> b; a -> b }").unwrap();
    assert_eq!(graph.edge_count(), 2);
    assert!(graph.edge(Id::new("a->b")).is_some());
    assert!(graph.edge(Id::new("a->b#1")).is_some());
}

#[test]
fn test_strict_graph_merges_edges() {
    let graph = parse("strict digraph { a -> b; a -> b [color=red]; b -> a }").unwrap();
    assert!(graph.strict());
    assert_eq!(graph.edge_count(), 2);
    assert_eq!(graph.edge(Id::new("a->b")).unwrap().element().color(), "red");

    let undirected = parse("strict graph { a -- b; b -- a }").unwrap();
    assert_eq!(undirected.edge_count(), 1);
}

#[test]
fn test_explicit_edge_ids() {
    let graph = parse("digraph { a -> b [id=first]; b -> c [id=first] }").unwrap();
    assert!(graph.edge(Id::new("first")).is_some());
    assert!(graph.edge(Id::new("b->c")).is_some());
}

#[test]
fn test_ports_become_edge_attributes() {
    let graph = parse("digraph { a:n -> b:s:w }").unwrap();
    let edge = graph.edges().next().unwrap().element();
    assert_eq!(edge.attributes().get("tailport"), "n");
    assert_eq!(edge.attributes().get("headport"), "s:w");
}

#[test]
fn test_string_forms() {
    let graph = parse(
        r#"digraph {
            a [label="line1\nline2"];
            b [label=<<b>bold</b>>];
            c [label="multi" + "part"];
            d [label="say \"hi\""];
        }"#,
    )
    .unwrap();

    let label = |id: &str| graph.node(Id::new(id)).unwrap().element().label().to_string();
    assert_eq!(label("a"), r"line1\nline2");
    assert_eq!(label("b"), "<<b>bold</b>>");
    assert_eq!(label("c"), "multipart");
    assert_eq!(label("d"), "say \"hi\"");
}

#[test]
fn test_original_attribute_keys() {
    let graph = parse("digraph { a [color=red, label=A] }").unwrap();
    let keys = graph
        .node(Id::new("a"))
        .unwrap()
        .element()
        .original_attribute_keys()
        .unwrap();
    assert!(keys.contains("color"));
    assert!(keys.contains("label"));
    assert!(keys.contains("id"));
}

#[test]
fn test_comments_are_ignored() {
    let graph = parse(
        "# generated
        digraph {
            // a line comment
            a /* inline */ -> b
        }",
    )
    .unwrap();
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn test_laid_out_xdot() {
    let source = include_str!("fixtures/two_nodes.xdot");
    let graph = parse(source).expect("Failed to parse xdot");

    assert_eq!(graph.width(), 62.0);
    assert_eq!(graph.height(), 116.0);
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);

    for id in ["a", "b"] {
        let node = graph.node(Id::new(id)).unwrap();
        assert!(
            node.element()
                .render_ops()
                .iter()
                .any(|op| op.kind() == RenderOpKind::UnfilledEllipse),
            "node {id} has no ellipse"
        );
        let text = node
            .element()
            .render_ops()
            .iter()
            .find(|op| op.kind() == RenderOpKind::Text)
            .unwrap();
        assert_eq!(text.text(), Some(id));
    }

    let a = graph.node(Id::new("a")).unwrap().element();
    assert_eq!(a.render_ops()[1].integers(), &[27, 98, 27, 18]);
    assert_eq!(a.attributes().get("label"), r"\N");

    let edge = graph.edge(Id::new("a->b")).unwrap().element();
    let kinds: Vec<RenderOpKind> = edge.render_ops().iter().map(|op| op.kind()).collect();
    assert!(kinds.contains(&RenderOpKind::UnfilledBezier));
    assert!(kinds.contains(&RenderOpKind::FilledPolygon));

    assert_eq!(graph.root().render_ops().len(), 3);
}

#[test]
fn test_edge_operator_mismatch() {
    assert_eq!(codes("graph { a -> b }"), [ErrorCode::E200]);
    assert_eq!(codes("digraph { a -- b }"), [ErrorCode::E200]);
}

#[test]
fn test_malformed_draw_attribute() {
    assert_eq!(codes("digraph { a [_draw_=\"e 1 2\"] }"), [ErrorCode::E301]);
    assert_eq!(codes("digraph { a [_draw_=\"Q 1\"] }"), [ErrorCode::E300]);
    assert_eq!(codes("digraph { a [_ldraw_=\"T 1 2 0 5 9 -ab\"] }"), [ErrorCode::E302]);
}

#[test]
fn test_lexer_errors_are_all_reported() {
    let err = parse("digraph { a ! b ? c }").unwrap_err();
    assert_eq!(err.diagnostics().len(), 2);
    assert!(
        err.diagnostics()
            .iter()
            .all(|d| d.severity() == Severity::Error && d.code() == Some(ErrorCode::E002))
    );
}

#[test]
fn test_unterminated_string() {
    assert_eq!(codes("digraph { a -> \"b }"), [ErrorCode::E001]);
}

#[test]
fn test_syntax_error() {
    assert_eq!(codes("digraph { a -> }"), [ErrorCode::E100]);
    assert_eq!(codes("digraph {"), [ErrorCode::E101]);
}

#[test]
fn test_edge_id_taken_by_a_node_is_replaced() {
    let graph = parse("digraph { a -> b [id=a] }").unwrap();
    assert_eq!(graph.node_count(), 2);
    let edge = graph.edges().next().unwrap();
    assert_eq!(edge.id(), Id::new("a->b"));
}

#[test]
fn test_subgraph_named_like_a_node() {
    let err = parse("digraph { a; subgraph a { b } }").unwrap_err();
    assert!(
        err.diagnostics()
            .iter()
            .any(|d| d.severity() == Severity::Error && d.message().contains("already exists"))
    );
}

#[test]
fn test_malformed_bounding_box_is_a_warning() {
    let graph = parse("digraph { graph [bb=\"0,0,oops\"] a }").unwrap();
    assert_eq!(graph.width(), 0.0);
    assert_eq!(graph.height(), 0.0);
}

mod generated {
    use proptest::prelude::*;

    use dotlens_core::identifier::Id;
    use dotlens_parser::parse;

    const KEYWORDS: [&str; 6] = ["node", "edge", "graph", "digraph", "subgraph", "strict"];

    fn plain_id() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,6}".prop_filter("keywords are not ids", |s| !KEYWORDS.contains(&s.as_str()))
    }

    proptest! {
        #[test]
        fn quoted_labels_survive(label in "[a-zA-Z0-9 _.,:;!?()-]{0,24}") {
            let source = format!("digraph {{ a [label=\"{label}\"] }}");
            let graph = parse(&source).unwrap();
            let node = graph.node(Id::new("a")).unwrap();
            prop_assert_eq!(node.element().attributes().value("label"), Some(label.as_str()));
        }

        #[test]
        fn edge_chains_create_each_node_once(names in prop::collection::vec(plain_id(), 1..8)) {
            let source = format!("digraph {{ {} }}", names.join(" -> "));
            let graph = parse(&source).unwrap();

            let mut distinct = names.clone();
            distinct.sort();
            distinct.dedup();
            prop_assert_eq!(graph.node_count(), distinct.len());
            prop_assert_eq!(graph.edge_count(), names.len() - 1);
        }
    }
}
