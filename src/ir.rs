use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    JsonSchema,
    OpenApi,
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootData {
    pub document_kind: DocumentKind,
    pub title: Option<String>,
    pub version: Option<String>,
    pub type_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyData {
    pub name: String,
    pub type_label: String,
    pub required: bool,
    pub description: Option<String>,
    pub format: Option<String>,
    pub enum_values: Vec<String>,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectGroupData {
    pub name: String,
    pub required: bool,
    pub property_count: usize,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayItemData {
    pub owner: String,
    pub type_label: String,
    pub property_count: usize,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoData {
    pub title: String,
    pub version: Option<String>,
    /// The rest is only filled in while the region is expanded.
    pub description: Option<String>,
    pub contact: Option<String>,
    pub license: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServersData {
    pub count: usize,
    /// Empty while collapsed.
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsData {
    pub path_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSummary {
    pub method: String,
    pub summary: Option<String>,
    pub operation_id: Option<String>,
    pub deprecated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointData {
    pub path: String,
    pub methods: Vec<MethodSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodData {
    pub method: String,
    pub path: String,
    pub summary: Option<String>,
    pub operation_id: Option<String>,
    pub deprecated: bool,
    pub parameter_count: usize,
    pub has_request_body: bool,
    pub response_codes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    pub status: String,
    pub description: Option<String>,
    pub content_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBodyData {
    pub required: bool,
    pub description: Option<String>,
    pub content_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeData {
    pub media_type: String,
    pub type_label: String,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSummary {
    pub name: String,
    pub location: String,
    pub required: bool,
    pub type_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametersData {
    pub parameters: Vec<ParameterSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagsData {
    pub count: usize,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityData {
    pub count: usize,
    pub schemes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentEntry {
    pub name: String,
    pub type_label: String,
    pub path: String,
    /// A node exists for this schema in the current pass.
    pub materialized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentsData {
    pub label: String,
    pub schemas: Vec<ComponentEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverflowEntry {
    pub name: String,
    pub type_label: String,
    pub required: bool,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverflowData {
    pub entries: Vec<OverflowEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElidedEntry {
    pub label: String,
    pub type_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainData {
    pub entries: Vec<ElidedEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "kebab-case")]
pub enum NodeKind {
    Root(RootData),
    SchemaProperty(PropertyData),
    ObjectGroup(ObjectGroupData),
    ArrayItem(ArrayItemData),
    Info(InfoData),
    Servers(ServersData),
    Paths(PathsData),
    Endpoint(EndpointData),
    Method(MethodData),
    Response(ResponseData),
    RequestBody(RequestBodyData),
    ContentType(ContentTypeData),
    Parameters(ParametersData),
    Tags(TagsData),
    Security(SecurityData),
    ComponentsContainer(ComponentsData),
    GroupedOverflow(OverflowData),
    TruncatedChain(ChainData),
}

impl NodeKind {
    /// Short tag used as the id prefix.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Root(_) => "root",
            NodeKind::SchemaProperty(_) => "property",
            NodeKind::ObjectGroup(_) => "object",
            NodeKind::ArrayItem(_) => "items",
            NodeKind::Info(_) => "info",
            NodeKind::Servers(_) => "servers",
            NodeKind::Paths(_) => "paths",
            NodeKind::Endpoint(_) => "endpoint",
            NodeKind::Method(_) => "method",
            NodeKind::Response(_) => "response",
            NodeKind::RequestBody(_) => "request-body",
            NodeKind::ContentType(_) => "content",
            NodeKind::Parameters(_) => "parameters",
            NodeKind::Tags(_) => "tags",
            NodeKind::Security(_) => "security",
            NodeKind::ComponentsContainer(_) => "components",
            NodeKind::GroupedOverflow(_) => "overflow",
            NodeKind::TruncatedChain(_) => "chain",
        }
    }

    pub fn label(&self) -> String {
        match self {
            NodeKind::Root(data) => data.title.clone().unwrap_or_else(|| "root".to_string()),
            NodeKind::SchemaProperty(data) => data.name.clone(),
            NodeKind::ObjectGroup(data) => data.name.clone(),
            NodeKind::ArrayItem(data) => format!("{}[]", data.owner),
            NodeKind::Info(data) => data.title.clone(),
            NodeKind::Servers(_) => "servers".to_string(),
            NodeKind::Paths(_) => "paths".to_string(),
            NodeKind::Endpoint(data) => data.path.clone(),
            NodeKind::Method(data) => format!("{} {}", data.method.to_ascii_uppercase(), data.path),
            NodeKind::Response(data) => data.status.clone(),
            NodeKind::RequestBody(_) => "request body".to_string(),
            NodeKind::ContentType(data) => data.media_type.clone(),
            NodeKind::Parameters(_) => "parameters".to_string(),
            NodeKind::Tags(_) => "tags".to_string(),
            NodeKind::Security(_) => "security".to_string(),
            NodeKind::ComponentsContainer(data) => data.label.clone(),
            NodeKind::GroupedOverflow(data) => format!("+{} more", data.entries.len()),
            NodeKind::TruncatedChain(data) => data
                .entries
                .iter()
                .map(|entry| entry.label.as_str())
                .collect::<Vec<_>>()
                .join("."),
        }
    }

    pub fn type_label(&self) -> Option<&str> {
        match self {
            NodeKind::Root(data) => Some(data.type_label.as_str()),
            NodeKind::SchemaProperty(data) => Some(data.type_label.as_str()),
            NodeKind::ObjectGroup(_) => Some("object"),
            NodeKind::ArrayItem(data) => Some(data.type_label.as_str()),
            NodeKind::ContentType(data) => Some(data.type_label.as_str()),
            _ => None,
        }
    }

    /// One line per summarized entry; the size estimator gives each a row.
    pub fn detail_lines(&self) -> Vec<String> {
        match self {
            NodeKind::Root(data) => data.version.iter().map(|v| format!("v{v}")).collect(),
            NodeKind::SchemaProperty(data) => {
                let mut lines = vec![data.type_label.clone()];
                if let Some(format) = &data.format {
                    lines.push(format!("format: {format}"));
                }
                if !data.enum_values.is_empty() {
                    lines.push(format!("enum: {}", data.enum_values.join(" | ")));
                }
                lines
            }
            NodeKind::ObjectGroup(data) => vec![format!("{} properties", data.property_count)],
            NodeKind::ArrayItem(data) => vec![data.type_label.clone()],
            NodeKind::Info(data) => {
                let mut lines: Vec<String> =
                    data.version.iter().map(|v| format!("v{v}")).collect();
                lines.extend(data.description.iter().cloned());
                lines.extend(data.contact.iter().map(|contact| format!("contact: {contact}")));
                lines.extend(data.license.iter().map(|license| format!("license: {license}")));
                lines
            }
            NodeKind::Servers(data) => region_lines(&data.urls, data.count, "servers"),
            NodeKind::Paths(data) => vec![format!("{} paths", data.path_count)],
            NodeKind::Endpoint(data) => data
                .methods
                .iter()
                .map(|method| match &method.summary {
                    Some(summary) => format!("{} {}", method.method.to_ascii_uppercase(), summary),
                    None => method.method.to_ascii_uppercase(),
                })
                .collect(),
            NodeKind::Method(data) => {
                let mut lines = Vec::new();
                if let Some(summary) = &data.summary {
                    lines.push(summary.clone());
                }
                if !data.response_codes.is_empty() {
                    lines.push(data.response_codes.join(" "));
                }
                lines
            }
            NodeKind::Response(data) => {
                let mut lines: Vec<String> = data.description.iter().cloned().collect();
                lines.extend(data.content_types.iter().cloned());
                lines
            }
            NodeKind::RequestBody(data) => data.content_types.clone(),
            NodeKind::ContentType(data) => vec![data.type_label.clone()],
            NodeKind::Parameters(data) => data
                .parameters
                .iter()
                .map(|param| format!("{} ({}): {}", param.name, param.location, param.type_label))
                .collect(),
            NodeKind::Tags(data) => region_lines(&data.tags, data.count, "tags"),
            NodeKind::Security(data) => region_lines(&data.schemes, data.count, "schemes"),
            NodeKind::ComponentsContainer(data) => data
                .schemas
                .iter()
                .map(|entry| format!("{}: {}", entry.name, entry.type_label))
                .collect(),
            NodeKind::GroupedOverflow(data) => data
                .entries
                .iter()
                .map(|entry| {
                    let marker = if entry.required { "*" } else { "" };
                    format!("{}{}: {}", entry.name, marker, entry.type_label)
                })
                .collect(),
            NodeKind::TruncatedChain(data) => data
                .entries
                .iter()
                .map(|entry| format!("{}: {}", entry.label, entry.type_label))
                .collect(),
        }
    }

    /// Kinds that carry meaning of their own and are never elided.
    pub fn is_structural_waypoint(&self) -> bool {
        matches!(
            self,
            NodeKind::SchemaProperty(_) | NodeKind::ObjectGroup(_) | NodeKind::ArrayItem(_)
        )
    }
}

/// Listed entries of an expanded region, or a count while it is collapsed.
fn region_lines(entries: &[String], count: usize, noun: &str) -> Vec<String> {
    if entries.is_empty() && count > 0 {
        return vec![format!("{count} {noun}")];
    }
    entries.to_vec()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub position: Position,
    pub source_path: String,
    /// Size reported by the rendering surface, when it has measured the node.
    pub measured: Option<Size>,
    /// Placed by the editor (dragged); layout keeps it where it is.
    pub anchored: bool,
    /// Has children in the document that are not generated in this pass.
    pub collapsed: bool,
    pub has_children: bool,
    pub more_levels: bool,
    /// Labels of pass-through ancestors removed by truncation.
    pub elided: Vec<ElidedEntry>,
}

impl GraphNode {
    pub fn new(id: String, kind: NodeKind, source_path: String) -> Self {
        Self {
            id,
            kind,
            position: Position::default(),
            source_path,
            measured: None,
            anchored: false,
            collapsed: false,
            has_children: false,
            more_levels: false,
            elided: Vec::new(),
        }
    }

    pub fn label(&self) -> String {
        self.kind.label()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Structural,
    Reference,
    Items,
}

impl EdgeKind {
    /// Parent-contains-child edges; these define the layout tree.
    pub fn is_containment(self) -> bool {
        matches!(self, EdgeKind::Structural | EdgeKind::Items)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaGraph {
    pub document_kind: DocumentKind,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<Edge>,
}

impl SchemaGraph {
    pub fn empty(document_kind: DocumentKind) -> Self {
        Self {
            document_kind,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_by_path(&self, path: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.source_path == path)
    }

    pub fn index_by_id(&self) -> HashMap<&str, usize> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.id.as_str(), idx))
            .collect()
    }

    pub fn children_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |edge| edge.kind.is_containment() && edge.source == id)
            .map(|edge| edge.target.as_str())
    }

    pub fn has_edge(&self, source: &str, target: &str, kind: EdgeKind) -> bool {
        self.edges
            .iter()
            .any(|edge| edge.kind == kind && edge.source == source && edge.target == target)
    }

    /// Apply positions from a `(id, position)` listing, e.g. an animation frame.
    pub fn apply_positions(&mut self, positions: &[(String, Position)]) {
        let index: HashMap<&str, Position> = positions
            .iter()
            .map(|(id, position)| (id.as_str(), *position))
            .collect();
        for node in &mut self.nodes {
            if let Some(position) = index.get(node.id.as_str()) {
                node.position = *position;
            }
        }
    }

    /// Marks nodes the editor has dragged; layout keeps them where they are.
    /// Ids that no longer exist are ignored.
    pub fn anchor_nodes(&mut self, anchors: &[(String, Position)]) {
        let index: HashMap<&str, Position> = anchors
            .iter()
            .map(|(id, position)| (id.as_str(), *position))
            .collect();
        for node in &mut self.nodes {
            if let Some(position) = index.get(node.id.as_str()) {
                node.position = *position;
                node.anchored = true;
            }
        }
    }

    /// Records sizes reported by the rendering surface.
    pub fn apply_measurements(&mut self, sizes: &[(String, Size)]) {
        let index: HashMap<&str, Size> = sizes
            .iter()
            .map(|(id, size)| (id.as_str(), *size))
            .collect();
        for node in &mut self.nodes {
            if let Some(size) = index.get(node.id.as_str()) {
                node.measured = Some(*size);
            }
        }
    }

    pub fn positions(&self) -> Vec<(String, Position)> {
        self.nodes
            .iter()
            .map(|node| (node.id.clone(), node.position))
            .collect()
    }
}
