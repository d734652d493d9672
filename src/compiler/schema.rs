use serde_json::{Map, Value};

use super::{
    Emitted, FragmentError, GraphBuilder, contain, extend_unique, schema_object,
    summarize_overflow,
};
use crate::document::{
    self, enum_values, has_schema_children, items, properties, required_names, string_field,
    type_label,
};
use crate::ir::{
    ArrayItemData, ComponentEntry, ComponentsData, DocumentKind, EdgeKind, NodeKind,
    ObjectGroupData, PropertyData, RootData,
};
use crate::path;
use crate::references::{collect_references, reference_name};

const DEFINITION_KEYS: [&str; 2] = ["definitions", "$defs"];

/// Plain JSON-Schema documents: root, its properties/items, and any
/// `definitions` / `$defs` container.
pub(super) fn walk(builder: &mut GraphBuilder<'_>, document: &Value) {
    let definitions: Vec<(&str, &Map<String, Value>)> = DEFINITION_KEYS
        .iter()
        .filter_map(|key| document::object_field(document, key).map(|map| (*key, map)))
        .filter(|(_, map)| !map.is_empty())
        .collect();

    let root_kind = NodeKind::Root(RootData {
        document_kind: DocumentKind::JsonSchema,
        title: string_field(document, "title"),
        version: None,
        type_label: type_label(document),
    });
    let has_children = has_schema_children(document) || !definitions.is_empty();
    let root = builder.emit(
        None,
        EdgeKind::Structural,
        root_kind,
        path::ROOT.to_string(),
        has_children,
    );
    builder.record_references(&root, document);
    if !root.is_open() {
        return;
    }

    let owner = string_field(document, "title").unwrap_or_else(|| path::ROOT.to_string());
    walk_children(builder, &root, document, path::ROOT, &owner);

    for (key, schemas) in definitions {
        let container_path = path::join(path::ROOT, key);
        walk_components(builder, &root, key, &container_path, &container_path, schemas);
    }
}

/// Emits the properties and array items of an open schema node.
pub(super) fn walk_children(
    builder: &mut GraphBuilder<'_>,
    parent: &Emitted,
    schema: &Value,
    schema_path: &str,
    owner: &str,
) {
    if let Some(props) = properties(schema) {
        let container_path = path::join(schema_path, "properties");
        let required = required_names(schema);
        let entries: Vec<(&String, &Value)> = props.iter().collect();
        let decision = builder.group(&entries, |(name, _)| path::join(&container_path, name));

        for idx in &decision.individual {
            let (name, fragment) = entries[*idx];
            let entry_path = path::join(&container_path, name);
            let is_required = required.contains(&name.as_str());
            contain(walk_property(
                builder,
                parent,
                name,
                fragment,
                entry_path,
                is_required,
            ));
        }

        if decision.has_overflow() {
            let mut summaries = Vec::with_capacity(decision.overflow.len());
            let mut targets = Vec::new();
            for idx in &decision.overflow {
                let (name, fragment) = entries[*idx];
                summaries.push(summarize_overflow(
                    name,
                    fragment,
                    required.contains(&name.as_str()),
                    path::join(&container_path, name),
                ));
                extend_unique(&mut targets, collect_references(fragment, true));
            }
            builder.emit_overflow(parent, &container_path, summaries, targets);
        }
    }

    if let Some(item_schema) = items(schema) {
        let items_path = path::join(schema_path, "items");
        contain(walk_items(builder, parent, owner, item_schema, items_path));
    }
}

fn walk_property(
    builder: &mut GraphBuilder<'_>,
    parent: &Emitted,
    name: &str,
    fragment: &Value,
    entry_path: String,
    required: bool,
) -> Result<(), FragmentError> {
    let fragment = schema_object(fragment, &entry_path)?;
    let kind = schema_node_kind(name, fragment, required);
    let node = builder.emit(
        Some(parent),
        EdgeKind::Structural,
        kind,
        entry_path,
        has_schema_children(fragment),
    );
    builder.record_references(&node, fragment);
    if node.is_open() {
        walk_children(builder, &node, fragment, &node.path, name);
    }
    Ok(())
}

fn walk_items(
    builder: &mut GraphBuilder<'_>,
    parent: &Emitted,
    owner: &str,
    fragment: &Value,
    items_path: String,
) -> Result<(), FragmentError> {
    let fragment = schema_object(fragment, &items_path)?;
    let kind = NodeKind::ArrayItem(ArrayItemData {
        owner: owner.to_string(),
        type_label: type_label(fragment),
        property_count: properties(fragment).map(Map::len).unwrap_or(0),
        reference: direct_reference(fragment),
    });
    let node = builder.emit(
        Some(parent),
        EdgeKind::Items,
        kind,
        items_path,
        has_schema_children(fragment),
    );
    builder.record_references(&node, fragment);
    if node.is_open() {
        walk_children(builder, &node, fragment, &node.path, &format!("{owner}[]"));
    }
    Ok(())
}

/// Object-shaped fragments become groups; everything else is a property row.
fn schema_node_kind(name: &str, fragment: &Value, required: bool) -> NodeKind {
    let description = string_field(fragment, "description");
    if let Some(props) = properties(fragment) {
        return NodeKind::ObjectGroup(ObjectGroupData {
            name: name.to_string(),
            required,
            property_count: props.len(),
            description,
        });
    }
    NodeKind::SchemaProperty(PropertyData {
        name: name.to_string(),
        type_label: type_label(fragment),
        required,
        description,
        format: string_field(fragment, "format"),
        enum_values: enum_values(fragment),
        reference: direct_reference(fragment),
    })
}

fn direct_reference(fragment: &Value) -> Option<String> {
    fragment
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(reference_name)
}

/// A container of named schemas (`components.schemas`, `definitions`, `$defs`).
///
/// The container always lists every schema. A schema only gets a node of its
/// own when the container is open and the schema itself opens (explicit
/// expansion, or cascade within the depth budget); only those nodes are
/// targets for reference edges.
pub(super) fn walk_components(
    builder: &mut GraphBuilder<'_>,
    parent: &Emitted,
    label: &str,
    container_path: &str,
    schemas_path: &str,
    schemas: &Map<String, Value>,
) {
    let container_depth = parent.gate.child_depth;
    let container_gate = builder
        .visibility()
        .gate(container_path, container_depth, !schemas.is_empty());
    let child_depth = container_gate.child_depth;

    let entries: Vec<(&String, &Value)> = schemas.iter().collect();
    let candidates: Vec<usize> = if container_gate.open {
        (0..entries.len())
            .filter(|idx| {
                let schema_path = path::join(schemas_path, entries[*idx].0);
                builder
                    .visibility()
                    .gate(&schema_path, child_depth, true)
                    .open
            })
            .collect()
    } else {
        Vec::new()
    };
    let decision = builder.group(&candidates, |idx| path::join(schemas_path, entries[*idx].0));
    let materialized: Vec<usize> = decision
        .individual
        .iter()
        .map(|pos| candidates[*pos])
        .collect();

    let listing = entries
        .iter()
        .enumerate()
        .map(|(idx, (name, fragment))| ComponentEntry {
            name: (*name).clone(),
            type_label: if fragment.is_object() {
                type_label(fragment)
            } else {
                "invalid".to_string()
            },
            path: path::join(schemas_path, name),
            materialized: materialized.contains(&idx),
        })
        .collect();
    let container = builder.emit(
        Some(parent),
        EdgeKind::Structural,
        NodeKind::ComponentsContainer(ComponentsData {
            label: label.to_string(),
            schemas: listing,
        }),
        container_path.to_string(),
        !schemas.is_empty(),
    );
    if !container.is_open() {
        return;
    }

    for idx in &materialized {
        let (name, fragment) = entries[*idx];
        contain(walk_component_schema(
            builder,
            &container,
            name,
            fragment,
            path::join(schemas_path, name),
        ));
    }

    if decision.has_overflow() {
        let mut summaries = Vec::with_capacity(decision.overflow.len());
        let mut targets = Vec::new();
        for pos in &decision.overflow {
            let (name, fragment) = entries[candidates[*pos]];
            summaries.push(summarize_overflow(
                name,
                fragment,
                false,
                path::join(schemas_path, name),
            ));
            extend_unique(&mut targets, collect_references(fragment, true));
        }
        builder.emit_overflow(&container, schemas_path, summaries, targets);
    }
}

fn walk_component_schema(
    builder: &mut GraphBuilder<'_>,
    container: &Emitted,
    name: &str,
    fragment: &Value,
    schema_path: String,
) -> Result<(), FragmentError> {
    let fragment = schema_object(fragment, &schema_path)?;
    let kind = schema_node_kind(name, fragment, false);
    let node = builder.emit(
        Some(container),
        EdgeKind::Structural,
        kind,
        schema_path,
        has_schema_children(fragment),
    );
    builder.register_target(&node);
    builder.record_references(&node, fragment);
    if node.is_open() {
        walk_children(builder, &node, fragment, &node.path, name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::compiler::compile;
    use crate::config::{CompileOptions, TruncationPolicy};
    use crate::ir::{EdgeKind, NodeKind};
    use crate::visibility::VisibilityState;
    use serde_json::json;

    fn options() -> CompileOptions {
        CompileOptions {
            truncation: TruncationPolicy::Off,
            ..CompileOptions::default()
        }
    }

    #[test]
    fn array_items_hang_off_an_items_edge() {
        let doc = json!({
            "type": "object",
            "properties": {
                "tags": {"type": "array", "items": {"type": "object", "properties": {"label": {"type": "string"}}}}
            }
        });
        let state = VisibilityState::new()
            .expand("root.properties.tags")
            .expand("root.properties.tags.items");
        let graph = compile(&doc, &state, &options());
        assert!(graph.has_edge(
            "property:root.properties.tags",
            "items:root.properties.tags.items",
            EdgeKind::Items
        ));
        assert!(
            graph
                .node("property:root.properties.tags.items.properties.label")
                .is_some()
        );
    }

    #[test]
    fn collapsed_object_is_flagged() {
        let doc = json!({
            "properties": {"address": {"type": "object", "properties": {"city": {"type": "string"}}}}
        });
        let graph = compile(&doc, &VisibilityState::new(), &options());
        let address = graph.node("object:root.properties.address").unwrap();
        assert!(address.collapsed);
        assert!(address.has_children);
        assert_eq!(graph.nodes.len(), 2);
    }

    #[test]
    fn malformed_property_drops_only_itself() {
        let doc = json!({"properties": {"a": null, "b": {"type": "string"}, "c": true}});
        let graph = compile(&doc, &VisibilityState::new(), &options());
        assert!(graph.node("property:root.properties.a").is_none());
        assert!(graph.node("property:root.properties.b").is_some());
        assert!(graph.node("property:root.properties.c").is_some());
    }

    #[test]
    fn definitions_become_a_components_container() {
        let doc = json!({
            "properties": {"owner": {"$ref": "#/definitions/User"}},
            "definitions": {"User": {"type": "object", "properties": {"id": {"type": "string"}}}}
        });
        let state = VisibilityState::new()
            .expand("root.definitions")
            .expand("root.definitions.User");
        let graph = compile(&doc, &state, &options());
        let container = graph.node("components:root.definitions").unwrap();
        let NodeKind::ComponentsContainer(data) = &container.kind else {
            panic!("unexpected kind {:?}", container.kind);
        };
        assert!(data.schemas[0].materialized);
        assert!(graph.has_edge(
            "property:root.properties.owner",
            "object:root.definitions.User",
            EdgeKind::Reference
        ));
    }

    #[test]
    fn cascade_opens_unset_children_until_the_budget() {
        let doc = json!({
            "properties": {"a": {"properties": {"b": {"properties": {"c": {"properties": {"d": {"type": "string"}}}}}}}}
        });
        let options = CompileOptions {
            cascade: true,
            max_depth: 2,
            ..options()
        };
        let graph = compile(&doc, &VisibilityState::new(), &options);
        let b = graph
            .node("object:root.properties.a.properties.b")
            .unwrap();
        assert!(b.more_levels);
        assert!(b.collapsed);
        assert!(
            graph
                .node("object:root.properties.a.properties.b.properties.c")
                .is_none()
        );
    }
}
