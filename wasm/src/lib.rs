use schema_graph::config::{Config, parse_config};
use schema_graph::graph_dump::GraphDump;
use schema_graph::{VisibilityState, build_graph};
use serde_json::Value;
use wasm_bindgen::prelude::*;

fn to_js(error: impl ToString) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn build_dump(
    document_json: &str,
    visibility_json: Option<String>,
    options_json: Option<String>,
) -> Result<String, String> {
    let document: Value = serde_json::from_str(document_json).map_err(|err| err.to_string())?;
    let visibility = match visibility_json {
        Some(raw) => serde_json::from_str::<VisibilityState>(&raw).map_err(|err| err.to_string())?,
        None => VisibilityState::new(),
    };
    let config = match options_json {
        Some(raw) => parse_config(&raw).map_err(|err| err.to_string())?,
        None => Config::default(),
    };
    let graph = build_graph(&document, &visibility, &config);
    let dump = GraphDump::from_graph(&graph, &config.layout.size);
    serde_json::to_string(&dump).map_err(|err| err.to_string())
}

/// Compiles and lays out a JSON Schema / OpenAPI document, returning the
/// positioned graph as JSON.
#[wasm_bindgen]
pub fn build_schema_graph(
    document_json: &str,
    visibility_json: Option<String>,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    build_dump(document_json, visibility_json, options_json).map_err(to_js)
}

#[cfg(test)]
mod tests {
    use super::build_dump;
    use serde_json::Value;

    #[test]
    fn builds_openapi_graph_with_expanded_paths() {
        let doc = r#"{
            "openapi": "3.0.0",
            "info": {"title": "Pets", "version": "1"},
            "paths": {"/pets": {"get": {"responses": {"200": {"description": "ok"}}}}}
        }"#;
        let out = build_dump(
            doc,
            Some(r#"{"root.paths": "expanded"}"#.to_string()),
            Some(r#"{"compile": {"maxIndividual": 4}}"#.to_string()),
        )
        .expect("graph should build");
        let dump: Value = serde_json::from_str(&out).unwrap();
        let ids: Vec<&str> = dump["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|node| node["id"].as_str())
            .collect();
        assert!(ids.contains(&"endpoint:root.paths./pets"));
    }

    #[test]
    fn rejects_invalid_visibility() {
        assert!(build_dump("{}", Some("[1]".to_string()), None).is_err());
    }
}
