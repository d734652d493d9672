use std::path::Path;

use schema_graph::config::{CompileOptions, Config, TruncationPolicy};
use schema_graph::document::{DocumentFormat, load_document, parse_document};
use schema_graph::layout::{bounds_for, count_collisions, node_size};
use schema_graph::{
    DepthMode, EdgeKind, NodeKind, Position, SchemaGraph, Size, VisibilityState, build_graph, compile,
    compute_layout,
};
use serde_json::{Value, json};

fn fixture(name: &str) -> Value {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    load_document(&path).expect("fixture load failed")
}

fn untruncated() -> CompileOptions {
    CompileOptions {
        truncation: TruncationPolicy::Off,
        ..CompileOptions::default()
    }
}

fn ids(graph: &SchemaGraph) -> Vec<&str> {
    graph.nodes.iter().map(|node| node.id.as_str()).collect()
}

fn has_node(graph: &SchemaGraph, id: &str) -> bool {
    graph.node(id).is_some()
}

fn structural_children<'a>(graph: &'a SchemaGraph, source: &str) -> Vec<&'a str> {
    graph
        .edges
        .iter()
        .filter(|edge| edge.kind == EdgeKind::Structural && edge.source == source)
        .map(|edge| edge.target.as_str())
        .collect()
}

fn assert_references_resolve(graph: &SchemaGraph) {
    for edge in graph.edges.iter().filter(|edge| edge.kind == EdgeKind::Reference) {
        assert!(has_node(graph, &edge.source), "dangling source {}", edge.source);
        assert!(has_node(graph, &edge.target), "dangling target {}", edge.target);
        assert_ne!(edge.source, edge.target);
    }
}

#[test]
fn two_properties_under_an_expanded_root() {
    let graph = compile(&fixture("person.json"), &VisibilityState::new(), &untruncated());
    assert_eq!(
        ids(&graph),
        vec!["root:root", "property:root.properties.name", "property:root.properties.age"]
    );
    assert_eq!(
        structural_children(&graph, "root:root"),
        vec!["property:root.properties.name", "property:root.properties.age"]
    );
    assert_eq!(graph.edges.len(), 2);

    let required: Vec<bool> = graph.nodes[1..]
        .iter()
        .map(|node| match &node.kind {
            NodeKind::SchemaProperty(data) => data.required,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(required, vec![true, false]);
}

#[test]
fn wide_sibling_sets_overflow_past_the_threshold() {
    let options = CompileOptions {
        max_individual: 5,
        ..untruncated()
    };
    let graph = compile(&fixture("wide.json"), &VisibilityState::new(), &options);
    let children = structural_children(&graph, "root:root");
    assert_eq!(children.len(), 5);
    assert_eq!(
        &children[..4],
        &[
            "property:root.properties.p1",
            "property:root.properties.p2",
            "property:root.properties.p3",
            "property:root.properties.p4",
        ]
    );

    let overflow = graph
        .nodes
        .iter()
        .find_map(|node| match &node.kind {
            NodeKind::GroupedOverflow(data) => Some(data),
            _ => None,
        })
        .expect("overflow node");
    let names: Vec<&str> = overflow.entries.iter().map(|entry| entry.name.as_str()).collect();
    assert_eq!(names, vec!["p5", "p6", "p7", "p8"]);
    assert!(overflow.entries[1].required);
}

#[test]
fn sets_at_the_threshold_stay_individual() {
    let options = CompileOptions {
        max_individual: 8,
        ..untruncated()
    };
    let graph = compile(&fixture("wide.json"), &VisibilityState::new(), &options);
    assert_eq!(structural_children(&graph, "root:root").len(), 8);
    assert!(
        !graph
            .nodes
            .iter()
            .any(|node| matches!(node.kind, NodeKind::GroupedOverflow(_)))
    );
}

#[test]
fn expanded_entries_are_promoted_out_of_overflow() {
    let options = CompileOptions {
        max_individual: 5,
        ..untruncated()
    };
    let state = VisibilityState::new().expand("root.properties.p7");
    let graph = compile(&fixture("wide.json"), &state, &options);
    let children = structural_children(&graph, "root:root");
    assert_eq!(children.len(), 5);
    assert!(has_node(&graph, "property:root.properties.p7"));
    assert!(!has_node(&graph, "property:root.properties.p4"));
    // p7 is open, so its items are generated.
    assert!(graph.has_edge(
        "property:root.properties.p7",
        "items:root.properties.p7.items",
        EdgeKind::Items
    ));

    let overflow = graph
        .node("overflow:root.properties.~overflow")
        .expect("overflow node");
    let NodeKind::GroupedOverflow(data) = &overflow.kind else {
        panic!("unexpected kind");
    };
    let names: Vec<&str> = data.entries.iter().map(|entry| entry.name.as_str()).collect();
    assert_eq!(names, vec!["p4", "p5", "p6", "p8"]);
}

#[test]
fn unexpanded_endpoint_is_consolidated() {
    let state = VisibilityState::new().expand("root.paths");
    let graph = compile(&fixture("users_api.json"), &state, &untruncated());
    let endpoint = graph.node("endpoint:root.paths./users").expect("endpoint");
    let NodeKind::Endpoint(data) = &endpoint.kind else {
        panic!("unexpected kind");
    };
    let methods: Vec<&str> = data.methods.iter().map(|method| method.method.as_str()).collect();
    assert_eq!(methods, vec!["get", "post"]);
    assert!(endpoint.collapsed);
    assert!(!graph.nodes.iter().any(|node| matches!(node.kind, NodeKind::Method(_))));
}

#[test]
fn expanded_endpoint_becomes_method_nodes() {
    let state = VisibilityState::new()
        .expand("root.paths")
        .expand("root.paths./users");
    let graph = compile(&fixture("users_api.json"), &state, &untruncated());
    assert!(!has_node(&graph, "endpoint:root.paths./users"));
    for (id, label) in [
        ("method:root.paths./users.get", "GET /users"),
        ("method:root.paths./users.post", "POST /users"),
    ] {
        let node = graph.node(id).expect(id);
        assert_eq!(node.label(), label);
        assert!(graph.has_edge("paths:root.paths", id, EdgeKind::Structural));
    }
    // The sibling path stays consolidated.
    assert!(has_node(&graph, "endpoint:root.paths./orders"));
}

#[test]
fn reference_edge_requires_an_expanded_target() {
    let doc = fixture("users_api.json");
    let expanded = VisibilityState::new()
        .expand("root.components")
        .expand("root.components.schemas.Order")
        .expand("root.components.schemas.User");
    let graph = compile(&doc, &expanded, &untruncated());
    assert!(graph.has_edge(
        "property:root.components.schemas.Order.properties.owner",
        "object:root.components.schemas.User",
        EdgeKind::Reference
    ));
    assert_references_resolve(&graph);

    let collapsed = expanded.toggled("root.components.schemas.User", true);
    let graph = compile(&doc, &collapsed, &untruncated());
    assert!(graph.node_by_path("root.components.schemas.User").is_none());
    assert!(!graph.edges.iter().any(|edge| edge.kind == EdgeKind::Reference));

    let container = graph.node("components:root.components").expect("components");
    let NodeKind::ComponentsContainer(data) = &container.kind else {
        panic!("unexpected kind");
    };
    let listed: Vec<(&str, bool)> = data
        .schemas
        .iter()
        .map(|entry| (entry.name.as_str(), entry.materialized))
        .collect();
    assert_eq!(listed, vec![("User", false), ("Order", true)]);
}

#[test]
fn collapsed_endpoint_points_at_schemas_it_uses() {
    let state = VisibilityState::new()
        .expand("root.paths")
        .expand("root.components")
        .expand("root.components.schemas.User");
    let graph = compile(&fixture("users_api.json"), &state, &untruncated());
    assert!(graph.has_edge(
        "endpoint:root.paths./users",
        "object:root.components.schemas.User",
        EdgeKind::Reference
    ));
    // Order is not materialized, so /orders gets no edge.
    assert!(
        !graph
            .edges
            .iter()
            .any(|edge| edge.source == "endpoint:root.paths./orders")
    );
}

fn five_levels() -> Value {
    json!({
        "type": "object",
        "properties": {"a": {"properties": {"b": {"properties": {"c": {"properties": {
            "d": {"properties": {"e": {"type": "string"}}}
        }}}}}}}
    })
}

#[test]
fn explicit_expansion_restarts_the_relative_depth_budget() {
    let b = "root.properties.a.properties.b";
    let c = format!("{b}.properties.c");
    let d = format!("{c}.properties.d");
    let options = CompileOptions {
        max_depth: 2,
        cascade: true,
        ..untruncated()
    };

    let cascaded = compile(&five_levels(), &VisibilityState::new(), &options);
    let stopped = cascaded.node(&format!("object:{b}")).unwrap();
    assert!(stopped.more_levels);
    assert!(!has_node(&cascaded, &format!("object:{c}")));

    let state = VisibilityState::new().expand(b);
    let graph = compile(&five_levels(), &state, &options);
    let reopened = graph.node(&format!("object:{b}")).unwrap();
    assert!(!reopened.collapsed);
    assert!(!reopened.more_levels);
    assert!(has_node(&graph, &format!("object:{c}")));
    let limit = graph.node(&format!("object:{d}")).unwrap();
    assert!(limit.more_levels);
    assert!(limit.collapsed);
    assert!(!has_node(&graph, &format!("property:{d}.properties.e")));
}

#[test]
fn absolute_depth_ignores_explicit_expansion_past_the_limit() {
    let b = "root.properties.a.properties.b";
    let options = CompileOptions {
        max_depth: 2,
        cascade: true,
        depth_mode: DepthMode::Absolute,
        ..untruncated()
    };
    let state = VisibilityState::new().expand(b);
    let graph = compile(&five_levels(), &state, &options);
    let stopped = graph.node(&format!("object:{b}")).unwrap();
    assert!(stopped.more_levels);
    assert!(stopped.collapsed);
    assert!(!has_node(&graph, &format!("object:{b}.properties.c")));
}

#[test]
fn overflowed_property_keeps_its_reference() {
    let doc = json!({
        "type": "object",
        "properties": {
            "p1": {"type": "string"},
            "p2": {"type": "string"},
            "p3": {"type": "string"},
            "p4": {"type": "string"},
            "owner": {"$ref": "#/definitions/User"}
        },
        "definitions": {"User": {"type": "object", "properties": {"id": {"type": "string"}}}}
    });
    let options = CompileOptions {
        max_individual: 3,
        ..untruncated()
    };
    let state = VisibilityState::new()
        .expand("root.definitions")
        .expand("root.definitions.User");
    let graph = compile(&doc, &state, &options);
    assert!(!has_node(&graph, "property:root.properties.owner"));
    assert!(graph.has_edge(
        "overflow:root.properties.~overflow",
        "object:root.definitions.User",
        EdgeKind::Reference
    ));
    assert_references_resolve(&graph);
}

#[test]
fn same_name_in_two_containers_resolves_by_pointer() {
    let doc = json!({
        "type": "object",
        "properties": {
            "legacy": {"$ref": "#/definitions/User"},
            "current": {"$ref": "#/$defs/User"}
        },
        "definitions": {"User": {"type": "object", "properties": {"id": {"type": "integer"}}}},
        "$defs": {"User": {"type": "object", "properties": {"id": {"type": "string"}}}}
    });
    let state = VisibilityState::new()
        .expand("root.definitions")
        .expand("root.definitions.User")
        .expand("root.$defs")
        .expand("root.$defs.User");
    let graph = compile(&doc, &state, &untruncated());
    assert!(graph.has_edge(
        "property:root.properties.legacy",
        "object:root.definitions.User",
        EdgeKind::Reference
    ));
    assert!(graph.has_edge(
        "property:root.properties.current",
        "object:root.$defs.User",
        EdgeKind::Reference
    ));
    assert!(!graph.has_edge(
        "property:root.properties.legacy",
        "object:root.$defs.User",
        EdgeKind::Reference
    ));
}

#[test]
fn components_pointer_does_not_resolve_to_swagger_definitions() {
    let doc = json!({
        "swagger": "2.0",
        "paths": {"/users": {"get": {"responses": {"200": {
            "description": "ok",
            "schema": {"$ref": "#/components/schemas/User"}
        }}}}},
        "definitions": {"User": {"type": "object", "properties": {"id": {"type": "string"}}}}
    });
    let state = VisibilityState::new()
        .expand("root.paths")
        .expand("root.definitions")
        .expand("root.definitions.User");
    let graph = compile(&doc, &state, &untruncated());
    assert!(has_node(&graph, "object:root.definitions.User"));
    assert!(!graph
        .edges
        .iter()
        .any(|edge| edge.kind == EdgeKind::Reference));
}

#[test]
fn composition_members_under_an_open_node_report_references() {
    let doc = json!({
        "type": "object",
        "properties": {"pet": {
            "properties": {"name": {"type": "string"}},
            "allOf": [{"properties": {"owner": {"$ref": "#/definitions/User"}}}]
        }},
        "definitions": {"User": {"type": "object", "properties": {"id": {"type": "string"}}}}
    });
    let state = VisibilityState::new()
        .expand("root.properties.pet")
        .expand("root.definitions")
        .expand("root.definitions.User");
    let graph = compile(&doc, &state, &untruncated());
    assert!(!graph.node("object:root.properties.pet").unwrap().collapsed);
    assert!(graph.has_edge(
        "object:root.properties.pet",
        "object:root.definitions.User",
        EdgeKind::Reference
    ));
}

#[test]
fn identical_inputs_compile_identically() {
    let doc = fixture("users_api.json");
    let state = VisibilityState::new()
        .expand("root.paths")
        .expand("root.paths./users")
        .expand("root.components");
    let config = Config::default();
    let first = build_graph(&doc, &state, &config);
    let second = build_graph(&doc, &state, &config);
    assert_eq!(first, second);
}

#[test]
fn collapsed_ancestor_hides_expanded_descendants() {
    let doc = fixture("nested.json");
    let state = VisibilityState::new()
        .collapse("root.properties.a")
        .expand("root.properties.a.properties.b")
        .expand("root.properties.a.properties.b.properties.c");
    let graph = compile(&doc, &state, &untruncated());
    let a = graph.node("object:root.properties.a").expect("a");
    assert!(a.collapsed);
    assert!(
        !graph
            .nodes
            .iter()
            .any(|node| node.source_path.starts_with("root.properties.a."))
    );

    let graph = compile(&doc, &state.clone().collapse("root"), &untruncated());
    assert_eq!(ids(&graph), vec!["root:root"]);
}

#[test]
fn self_referential_definitions_stay_finite() {
    let state = VisibilityState::new()
        .expand("root.definitions")
        .expand("root.definitions.Node")
        .expand("root.definitions.User");
    let graph = compile(&fixture("nested.json"), &state, &untruncated());
    assert!(graph.has_edge(
        "property:root.definitions.Node.properties.next",
        "object:root.definitions.Node",
        EdgeKind::Reference
    ));
    assert!(graph.has_edge(
        "property:root.properties.self",
        "object:root.definitions.Node",
        EdgeKind::Reference
    ));
    assert!(graph.has_edge(
        "property:root.properties.user",
        "object:root.definitions.User",
        EdgeKind::Reference
    ));
    assert_references_resolve(&graph);
}

#[test]
fn pass_through_chains_collapse_into_one_node() {
    let doc = fixture("nested.json");
    let state = VisibilityState::new()
        .expand("root.properties.a")
        .expand("root.properties.a.properties.b")
        .expand("root.properties.a.properties.b.properties.c");
    let c = "object:root.properties.a.properties.b.properties.c";

    let graph = compile(&doc, &state, &CompileOptions::default());
    let chain = graph.node("chain:root.properties.a").expect("chain node");
    assert_eq!(chain.label(), "a.b");
    assert!(!has_node(&graph, "object:root.properties.a"));
    assert!(!has_node(&graph, "object:root.properties.a.properties.b"));
    assert!(graph.has_edge("root:root", "chain:root.properties.a", EdgeKind::Structural));
    assert!(graph.has_edge("chain:root.properties.a", c, EdgeKind::Structural));

    let reconnect = CompileOptions {
        truncation: TruncationPolicy::Reconnect,
        ..CompileOptions::default()
    };
    let graph = compile(&doc, &state, &reconnect);
    assert!(graph.has_edge("root:root", c, EdgeKind::Structural));
    let elided: Vec<&str> = graph
        .node(c)
        .expect("c")
        .elided
        .iter()
        .map(|entry| entry.label.as_str())
        .collect();
    assert_eq!(elided, vec!["a", "b"]);
}

#[test]
fn laid_out_graph_is_collision_free() {
    let doc = fixture("users_api.json");
    let state = VisibilityState::new()
        .expand("root.paths")
        .expand("root.paths./users")
        .expand("root.paths./users.get")
        .expand("root.paths./users.post")
        .expand("root.components")
        .expand("root.components.schemas.User")
        .expand("root.components.schemas.Order");
    let config = Config::default();
    let graph = build_graph(&doc, &state, &config);
    let sizes: Vec<Size> = graph
        .nodes
        .iter()
        .map(|node| node_size(node, &config.layout.size))
        .collect();
    let bounds = bounds_for(&graph, &sizes);
    assert_eq!(
        count_collisions(&bounds, config.layout.collision.min_distance),
        0
    );
    assert_references_resolve(&graph);
}

#[test]
fn anchored_nodes_survive_relayout() {
    let doc = fixture("person.json");
    let config = Config::default();
    let mut graph = build_graph(&doc, &VisibilityState::new(), &config);
    let pinned = Position::new(-500.0, 900.0);
    graph.anchor_nodes(&[("property:root.properties.age".to_string(), pinned)]);
    let graph = compute_layout(graph, &config.layout);
    assert_eq!(
        graph.node("property:root.properties.age").expect("age").position,
        pinned
    );
}

#[test]
fn yaml_and_json_sources_agree() {
    let yaml = r#"
title: Person
type: object
properties:
  name:
    type: string
  age:
    type: number
required: [name]
"#;
    let from_yaml = parse_document(yaml, DocumentFormat::Yaml).unwrap();
    let from_json = fixture("person.json");
    let state = VisibilityState::new();
    assert_eq!(
        compile(&from_yaml, &state, &untruncated()),
        compile(&from_json, &state, &untruncated())
    );
}

#[test]
fn unrecognized_input_yields_a_root_only_graph() {
    for doc in [json!([1, 2, 3]), Value::Null, json!("schema")] {
        let graph = build_graph(&doc, &VisibilityState::new(), &Config::default());
        assert_eq!(ids(&graph), vec!["root:root"]);
        assert!(graph.edges.is_empty());
    }
}
