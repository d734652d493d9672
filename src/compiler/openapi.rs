use serde_json::Value;

use super::schema::{walk_children, walk_components};
use super::{Emitted, FragmentError, GraphBuilder, contain, extend_unique};
use crate::document::{bool_field, has_schema_children, object_field, string_field, type_label};
use crate::ir::{
    ContentTypeData, DocumentKind, EdgeKind, EndpointData, InfoData, MethodData, MethodSummary,
    NodeKind, OverflowEntry, ParameterSummary, ParametersData, PathsData, RequestBodyData,
    ResponseData, RootData, SecurityData, ServersData, TagsData,
};
use crate::path;
use crate::references::{collect_references, reference_name};

const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Upper bound on chained local `$ref`s followed for parameters and bodies.
const MAX_REF_HOPS: usize = 8;

pub(super) fn walk(builder: &mut GraphBuilder<'_>, document: &Value) {
    let info = document.get("info");
    let spec_version = string_field(document, "openapi")
        .map(|version| format!("openapi {version}"))
        .or_else(|| string_field(document, "swagger").map(|version| format!("swagger {version}")))
        .unwrap_or_else(|| "openapi".to_string());
    let root_kind = NodeKind::Root(RootData {
        document_kind: DocumentKind::OpenApi,
        title: info.and_then(|info| string_field(info, "title")),
        version: info.and_then(|info| string_field(info, "version")),
        type_label: spec_version,
    });
    let component_schemas = document
        .pointer("/components/schemas")
        .and_then(Value::as_object);
    let swagger_definitions = object_field(document, "definitions");
    let has_children = ["info", "servers", "tags", "security", "paths", "host"]
        .iter()
        .any(|key| document.get(key).is_some())
        || component_schemas.is_some()
        || swagger_definitions.is_some();

    let root = builder.emit(
        None,
        EdgeKind::Structural,
        root_kind,
        path::ROOT.to_string(),
        has_children,
    );
    if !root.is_open() {
        return;
    }

    contain(walk_info(builder, &root, document));
    contain(walk_servers(builder, &root, document));
    contain(walk_tags(builder, &root, document));
    contain(walk_security(builder, &root, document));
    contain(walk_paths(builder, &root, document));

    if let Some(schemas) = component_schemas {
        let container_path = path::join(path::ROOT, "components");
        let schemas_path = path::join(&container_path, "schemas");
        walk_components(
            builder,
            &root,
            "components",
            &container_path,
            &schemas_path,
            schemas,
        );
    }
    if let Some(definitions) = swagger_definitions {
        let container_path = path::join(path::ROOT, "definitions");
        walk_components(
            builder,
            &root,
            "definitions",
            &container_path,
            &container_path,
            definitions,
        );
    }
}

/// Whether a top-level region opens; a closed one is emitted header-only.
fn region_open(
    builder: &GraphBuilder<'_>,
    root: &Emitted,
    region_path: &str,
    has_details: bool,
) -> bool {
    builder
        .visibility()
        .gate(region_path, GraphBuilder::child_depth(Some(root)), has_details)
        .open
}

fn walk_info(
    builder: &mut GraphBuilder<'_>,
    root: &Emitted,
    document: &Value,
) -> Result<(), FragmentError> {
    let Some(info) = document.get("info") else {
        return Ok(());
    };
    let info_path = path::join(path::ROOT, "info");
    if !info.is_object() {
        return Err(FragmentError::NotAnObject { path: info_path });
    }
    let description = string_field(info, "description");
    let contact = info.get("contact").and_then(|contact| {
        string_field(contact, "name")
            .or_else(|| string_field(contact, "email"))
            .or_else(|| string_field(contact, "url"))
    });
    let license = info
        .get("license")
        .and_then(|license| string_field(license, "name"));
    let has_details = description.is_some() || contact.is_some() || license.is_some();
    let open = region_open(builder, root, &info_path, has_details);
    let kind = NodeKind::Info(InfoData {
        title: string_field(info, "title").unwrap_or_else(|| "untitled".to_string()),
        version: string_field(info, "version"),
        description: description.filter(|_| open),
        contact: contact.filter(|_| open),
        license: license.filter(|_| open),
    });
    builder.emit(Some(root), EdgeKind::Structural, kind, info_path, has_details);
    Ok(())
}

fn walk_servers(
    builder: &mut GraphBuilder<'_>,
    root: &Emitted,
    document: &Value,
) -> Result<(), FragmentError> {
    let servers_path = path::join(path::ROOT, "servers");
    let mut urls = match document.get("servers") {
        None => Vec::new(),
        Some(Value::Array(servers)) => servers
            .iter()
            .filter_map(|server| string_field(server, "url"))
            .collect(),
        Some(_) => {
            return Err(FragmentError::Malformed {
                path: servers_path,
                keyword: "servers",
            });
        }
    };
    // Swagger 2.0 spells the server as host + basePath.
    if let Some(host) = string_field(document, "host") {
        let scheme = document
            .get("schemes")
            .and_then(Value::as_array)
            .and_then(|schemes| schemes.first())
            .and_then(Value::as_str)
            .unwrap_or("https");
        let base_path = string_field(document, "basePath").unwrap_or_default();
        urls.push(format!("{scheme}://{host}{base_path}"));
    }
    if urls.is_empty() && document.get("servers").is_none() {
        return Ok(());
    }
    emit_region(builder, root, servers_path, urls, |count, urls| {
        NodeKind::Servers(ServersData { count, urls })
    });
    Ok(())
}

fn walk_tags(
    builder: &mut GraphBuilder<'_>,
    root: &Emitted,
    document: &Value,
) -> Result<(), FragmentError> {
    let Some(tags) = document.get("tags") else {
        return Ok(());
    };
    let tags_path = path::join(path::ROOT, "tags");
    let Some(tags) = tags.as_array() else {
        return Err(FragmentError::Malformed {
            path: tags_path,
            keyword: "tags",
        });
    };
    let names = tags
        .iter()
        .filter_map(|tag| match tag {
            Value::String(name) => Some(name.clone()),
            other => string_field(other, "name"),
        })
        .collect();
    emit_region(builder, root, tags_path, names, |count, tags| {
        NodeKind::Tags(TagsData { count, tags })
    });
    Ok(())
}

fn walk_security(
    builder: &mut GraphBuilder<'_>,
    root: &Emitted,
    document: &Value,
) -> Result<(), FragmentError> {
    let security_path = path::join(path::ROOT, "security");
    let mut schemes: Vec<String> = Vec::new();
    match document.get("security") {
        None => {}
        Some(Value::Array(requirements)) => {
            for requirement in requirements.iter().filter_map(Value::as_object) {
                for name in requirement.keys() {
                    if !schemes.contains(name) {
                        schemes.push(name.clone());
                    }
                }
            }
        }
        Some(_) => {
            return Err(FragmentError::Malformed {
                path: security_path,
                keyword: "security",
            });
        }
    }
    let declared = document
        .pointer("/components/securitySchemes")
        .or_else(|| document.get("securityDefinitions"))
        .and_then(Value::as_object);
    if schemes.is_empty()
        && let Some(declared) = declared
    {
        schemes.extend(declared.keys().cloned());
    }
    if schemes.is_empty() && document.get("security").is_none() {
        return Ok(());
    }
    emit_region(builder, root, security_path, schemes, |count, schemes| {
        NodeKind::Security(SecurityData { count, schemes })
    });
    Ok(())
}

/// A listing region (servers, tags, security): the entries are only carried
/// while the region is open.
fn emit_region(
    builder: &mut GraphBuilder<'_>,
    root: &Emitted,
    region_path: String,
    entries: Vec<String>,
    kind: impl FnOnce(usize, Vec<String>) -> NodeKind,
) {
    let count = entries.len();
    let open = region_open(builder, root, &region_path, count > 0);
    let entries = if open { entries } else { Vec::new() };
    builder.emit(
        Some(root),
        EdgeKind::Structural,
        kind(count, entries),
        region_path,
        count > 0,
    );
}

fn walk_paths(
    builder: &mut GraphBuilder<'_>,
    root: &Emitted,
    document: &Value,
) -> Result<(), FragmentError> {
    let Some(paths) = document.get("paths") else {
        return Ok(());
    };
    let paths_path = path::join(path::ROOT, "paths");
    let Some(paths) = paths.as_object() else {
        return Err(FragmentError::NotAnObject { path: paths_path });
    };
    let container = builder.emit(
        Some(root),
        EdgeKind::Structural,
        NodeKind::Paths(PathsData {
            path_count: paths.len(),
        }),
        paths_path,
        !paths.is_empty(),
    );
    if !container.is_open() {
        return Ok(());
    }

    let entries: Vec<(&String, &Value)> = paths.iter().collect();
    let visibility = *builder.visibility();
    let entry_depth = GraphBuilder::child_depth(Some(&container));
    // An open endpoint is replaced by one method box per operation.
    let decision = builder.group_weighted(
        &entries,
        |(route, _)| path::join(&container.path, route),
        |(route, item)| {
            let methods = operations(item).len();
            let endpoint_path = path::join(&container.path, route);
            if visibility.gate(&endpoint_path, entry_depth, methods > 0).open {
                methods
            } else {
                1
            }
        },
    );
    for idx in &decision.individual {
        let (route, item) = entries[*idx];
        contain(walk_endpoint(builder, &container, document, route, item));
    }
    if decision.has_overflow() {
        let mut summaries = Vec::with_capacity(decision.overflow.len());
        let mut targets = Vec::new();
        for idx in &decision.overflow {
            let (route, item) = entries[*idx];
            let methods: Vec<String> = operations(item)
                .iter()
                .map(|(method, _)| method.to_ascii_uppercase())
                .collect();
            summaries.push(OverflowEntry {
                name: route.clone(),
                type_label: methods.join(", "),
                required: false,
                path: path::join(&container.path, route),
            });
            extend_unique(&mut targets, endpoint_references(document, item));
        }
        builder.emit_overflow(&container, &container.path, summaries, targets);
    }
    Ok(())
}

/// HTTP operations of a path item, in document order.
fn operations(item: &Value) -> Vec<(&str, &Value)> {
    let Some(item) = item.as_object() else {
        return Vec::new();
    };
    item.iter()
        .filter(|(key, op)| HTTP_METHODS.contains(&key.as_str()) && op.is_object())
        .map(|(key, op)| (key.as_str(), op))
        .collect()
}

/// Consolidated endpoint node when the path is not open; one method node per
/// operation, each hanging off the paths container, when it is.
fn walk_endpoint(
    builder: &mut GraphBuilder<'_>,
    container: &Emitted,
    document: &Value,
    route: &str,
    item: &Value,
) -> Result<(), FragmentError> {
    let endpoint_path = path::join(&container.path, route);
    if !item.is_object() {
        return Err(FragmentError::NotAnObject {
            path: endpoint_path,
        });
    }
    let ops = operations(item);
    let path_params = item.get("parameters");
    let gate = builder.visibility().gate(
        &endpoint_path,
        GraphBuilder::child_depth(Some(container)),
        !ops.is_empty(),
    );

    if !gate.open {
        let methods = ops
            .iter()
            .map(|(method, op)| MethodSummary {
                method: method.to_string(),
                summary: string_field(op, "summary"),
                operation_id: string_field(op, "operationId"),
                deprecated: bool_field(op, "deprecated"),
            })
            .collect();
        let node = builder.emit(
            Some(container),
            EdgeKind::Structural,
            NodeKind::Endpoint(EndpointData {
                path: route.to_string(),
                methods,
            }),
            endpoint_path,
            !ops.is_empty(),
        );
        builder.record_reference_names(&node, endpoint_references(document, item));
        return Ok(());
    }

    // Methods are edged from the container but take their depth budget from
    // the endpoint they expand.
    let via_endpoint = Emitted {
        id: container.id.clone(),
        path: endpoint_path.clone(),
        gate,
    };
    for (method, op) in ops {
        let method_path = path::join(&endpoint_path, method);
        contain(walk_method(
            builder,
            &via_endpoint,
            document,
            route,
            method,
            op,
            path_params,
            method_path,
        ));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn walk_method(
    builder: &mut GraphBuilder<'_>,
    parent: &Emitted,
    document: &Value,
    route: &str,
    method: &str,
    op: &Value,
    path_params: Option<&Value>,
    method_path: String,
) -> Result<(), FragmentError> {
    let params = merged_parameters(document, path_params, op.get("parameters"), &method_path)?;
    let request_body = request_body(document, op, &params);
    let responses: Vec<(&String, &Value)> = object_field(op, "responses")
        .map(|responses| responses.iter().collect())
        .unwrap_or_default();

    let visible_params: Vec<&Value> = params
        .iter()
        .copied()
        .filter(|param| string_field(param, "in").as_deref() != Some("body"))
        .collect();
    let kind = NodeKind::Method(MethodData {
        method: method.to_string(),
        path: route.to_string(),
        summary: string_field(op, "summary"),
        operation_id: string_field(op, "operationId"),
        deprecated: bool_field(op, "deprecated"),
        parameter_count: visible_params.len(),
        has_request_body: request_body.is_some(),
        response_codes: responses.iter().map(|(code, _)| (*code).clone()).collect(),
    });
    let has_children =
        !visible_params.is_empty() || request_body.is_some() || !responses.is_empty();
    let node = builder.emit(
        Some(parent),
        EdgeKind::Structural,
        kind,
        method_path,
        has_children,
    );
    if !node.is_open() {
        let names = operation_references(document, op, path_params);
        builder.record_reference_names(&node, names);
        return Ok(());
    }

    if !visible_params.is_empty() {
        let summaries = visible_params
            .iter()
            .map(|param| ParameterSummary {
                name: string_field(param, "name").unwrap_or_default(),
                location: string_field(param, "in").unwrap_or_default(),
                required: bool_field(param, "required"),
                type_label: param
                    .get("schema")
                    .map(type_label)
                    .unwrap_or_else(|| type_label(param)),
            })
            .collect();
        let params_node = builder.emit(
            Some(&node),
            EdgeKind::Structural,
            NodeKind::Parameters(ParametersData {
                parameters: summaries,
            }),
            path::join(&node.path, "parameters"),
            false,
        );
        let mut names = Vec::new();
        for param in &visible_params {
            if let Some(schema) = param.get("schema") {
                extend_unique(&mut names, collect_references(schema, true));
            }
        }
        builder.record_reference_names(&params_node, names);
    }

    if let Some(body) = request_body {
        let body_path = path::join(&node.path, "requestBody");
        let content = content_entries(&body);
        let kind = NodeKind::RequestBody(RequestBodyData {
            required: body.required,
            description: body.description.clone(),
            content_types: content.iter().map(|(media, _)| media.clone()).collect(),
        });
        let body_node = builder.emit(
            Some(&node),
            EdgeKind::Structural,
            kind,
            body_path,
            !content.is_empty(),
        );
        walk_payload(builder, &body_node, &content, "body");
    }

    for (status, response) in responses {
        let response_path = path::join_all(&node.path, &["responses", status.as_str()]);
        let response = resolve_local(document, response);
        if !response.is_object() {
            tracing::debug!(path = %response_path, "dropping non-object response");
            continue;
        }
        let content = response_content(response);
        let kind = NodeKind::Response(ResponseData {
            status: status.clone(),
            description: string_field(response, "description"),
            content_types: content.iter().map(|(media, _)| media.clone()).collect(),
        });
        let response_node = builder.emit(
            Some(&node),
            EdgeKind::Structural,
            kind,
            response_path,
            !content.is_empty(),
        );
        walk_payload(builder, &response_node, &content, status);
    }
    Ok(())
}

/// Content types of an open request body or response; a closed one reports
/// every schema reference underneath it instead.
fn walk_payload(
    builder: &mut GraphBuilder<'_>,
    parent: &Emitted,
    content: &[(String, Option<&Value>)],
    owner: &str,
) {
    if !parent.is_open() {
        let mut names = Vec::new();
        for schema in content.iter().filter_map(|(_, schema)| *schema) {
            extend_unique(&mut names, collect_references(schema, true));
        }
        builder.record_reference_names(parent, names);
        return;
    }
    for (media, schema) in content {
        let content_path = path::join_all(&parent.path, &["content", media.as_str()]);
        let kind = NodeKind::ContentType(ContentTypeData {
            media_type: media.clone(),
            type_label: schema.map(type_label).unwrap_or_else(|| "any".to_string()),
            reference: schema
                .and_then(|schema| schema.get("$ref"))
                .and_then(Value::as_str)
                .and_then(reference_name),
        });
        let node = builder.emit(
            Some(parent),
            EdgeKind::Structural,
            kind,
            content_path,
            schema.is_some_and(has_schema_children),
        );
        let Some(schema) = *schema else {
            continue;
        };
        builder.record_references(&node, schema);
        if node.is_open() {
            let schema_path = path::join(&node.path, "schema");
            walk_children(builder, &node, schema, &schema_path, owner);
        }
    }
}

struct RequestBody<'d> {
    required: bool,
    description: Option<String>,
    /// `content` map (3.x) or a lone `schema` (2.0 `in: body` parameter).
    source: &'d Value,
    consumes: Option<String>,
}

fn request_body<'d>(
    document: &'d Value,
    op: &'d Value,
    params: &[&'d Value],
) -> Option<RequestBody<'d>> {
    if let Some(body) = op.get("requestBody") {
        let body = resolve_local(document, body);
        if !body.is_object() {
            return None;
        }
        return Some(RequestBody {
            required: bool_field(body, "required"),
            description: string_field(body, "description"),
            source: body,
            consumes: None,
        });
    }
    let param = params
        .iter()
        .copied()
        .find(|param| string_field(param, "in").as_deref() == Some("body"))?;
    let consumes = op
        .get("consumes")
        .or_else(|| document.get("consumes"))
        .and_then(Value::as_array)
        .and_then(|media| media.first())
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(RequestBody {
        required: bool_field(param, "required"),
        description: string_field(param, "description"),
        source: param,
        consumes,
    })
}

fn content_entries<'d>(body: &RequestBody<'d>) -> Vec<(String, Option<&'d Value>)> {
    if let Some(content) = object_field(body.source, "content") {
        return content
            .iter()
            .map(|(media, entry)| (media.clone(), entry.get("schema")))
            .collect();
    }
    match body.source.get("schema") {
        Some(schema) => vec![(
            body.consumes
                .clone()
                .unwrap_or_else(|| "application/json".to_string()),
            Some(schema),
        )],
        None => Vec::new(),
    }
}

fn response_content(response: &Value) -> Vec<(String, Option<&Value>)> {
    if let Some(content) = object_field(response, "content") {
        return content
            .iter()
            .map(|(media, entry)| (media.clone(), entry.get("schema")))
            .collect();
    }
    match response.get("schema") {
        Some(schema) => vec![("application/json".to_string(), Some(schema))],
        None => Vec::new(),
    }
}

/// Path-level parameters overridden by operation-level ones sharing
/// `(name, in)`.
fn merged_parameters<'d>(
    document: &'d Value,
    path_params: Option<&'d Value>,
    op_params: Option<&'d Value>,
    method_path: &str,
) -> Result<Vec<&'d Value>, FragmentError> {
    let mut merged: Vec<&Value> = Vec::new();
    for list in [path_params, op_params].into_iter().flatten() {
        let Some(list) = list.as_array() else {
            return Err(FragmentError::Malformed {
                path: method_path.to_string(),
                keyword: "parameters",
            });
        };
        for param in list {
            let param = resolve_local(document, param);
            if !param.is_object() {
                continue;
            }
            let key = (string_field(param, "name"), string_field(param, "in"));
            let existing = merged.iter().position(|existing| {
                (string_field(existing, "name"), string_field(existing, "in")) == key
            });
            match existing {
                Some(pos) => merged[pos] = param,
                None => merged.push(param),
            }
        }
    }
    Ok(merged)
}

/// Follows local non-schema `$ref`s (`#/components/parameters/...`,
/// `#/components/responses/...`) to the object they name.
fn resolve_local<'d>(document: &'d Value, fragment: &'d Value) -> &'d Value {
    let mut current = fragment;
    for _ in 0..MAX_REF_HOPS {
        let Some(pointer) = current
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(|pointer| pointer.strip_prefix('#'))
        else {
            break;
        };
        match document.pointer(pointer) {
            Some(target) => current = target,
            None => break,
        }
    }
    current
}

/// Every schema reference reachable from the operations of a path item.
fn endpoint_references(document: &Value, item: &Value) -> Vec<String> {
    let path_params = item.get("parameters");
    let mut targets = Vec::new();
    for (_, op) in operations(item) {
        extend_unique(
            &mut targets,
            operation_references(document, op, path_params),
        );
    }
    targets
}

/// Every schema reference reachable from one operation.
fn operation_references(document: &Value, op: &Value, path_params: Option<&Value>) -> Vec<String> {
    let mut names = Vec::new();
    let params = merged_parameters(document, path_params, op.get("parameters"), "")
        .unwrap_or_default();
    for param in &params {
        if let Some(schema) = param.get("schema") {
            extend_unique(&mut names, collect_references(schema, true));
        }
    }
    if let Some(body) = request_body(document, op, &params) {
        for schema in content_entries(&body).into_iter().filter_map(|(_, schema)| schema) {
            extend_unique(&mut names, collect_references(schema, true));
        }
    }
    if let Some(responses) = object_field(op, "responses") {
        for response in responses.values() {
            let response = resolve_local(document, response);
            for schema in response_content(response)
                .into_iter()
                .filter_map(|(_, schema)| schema)
            {
                extend_unique(&mut names, collect_references(schema, true));
            }
        }
    }
    names
}
