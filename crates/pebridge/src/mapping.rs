//! Operation routing: property ids to HTTP routes.
//!
//! The route table is built once at startup from configuration defaults,
//! then overlaid with path templates published in the agent's fact
//! document (fetched via the external `store-dump` tool). After startup
//! the table is read-only shared state; lookups take no locks.
//!
//! The fact lookup is best-effort by design: a missing tool, a non-zero
//! exit, or malformed output all leave the defaults in place and never
//! prevent the bridge from starting.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;

use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::BridgeConfig;

/// How a route fills the outbound HTTP request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    /// No request body (GET-style operations)
    None,
    /// Forward the envelope `body` object as JSON
    Envelope,
    /// Forward the `body` object nested inside the envelope body
    Nested,
}

/// One routed operation.
#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    pub base_url: String,
    pub path_template: String,
    /// Body fields that must be present as strings before dispatching;
    /// they also feed `{key}` substitution in the path template.
    pub required_fields: &'static [&'static str],
    pub body: BodyMode,
    /// Body array fields forwarded as comma-joined query parameters.
    pub query_fields: &'static [&'static str],
}

/// Routing table for all recognized request properties.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, Route>,
}

impl RouteTable {
    /// Build the default table from configuration.
    pub fn from_config(config: &BridgeConfig) -> Self {
        let mut routes = HashMap::new();

        routes.insert(
            "function.tools.request".to_string(),
            Route {
                method: Method::GET,
                base_url: trim_base(&config.function_base_url),
                path_template: config.function_tools_path.clone(),
                required_fields: &[],
                body: BodyMode::None,
                query_fields: &["tags"],
            },
        );
        routes.insert(
            "function.call.request".to_string(),
            Route {
                method: Method::POST,
                base_url: trim_base(&config.function_base_url),
                path_template: config.function_call_path.clone(),
                required_fields: &[],
                body: BodyMode::Envelope,
                query_fields: &[],
            },
        );
        routes.insert(
            "persist.get.request".to_string(),
            Route {
                method: Method::GET,
                base_url: trim_base(&config.persist_base_url),
                path_template: config.persist_get_path.clone(),
                required_fields: &["collection", "id"],
                body: BodyMode::None,
                query_fields: &[],
            },
        );
        routes.insert(
            "persist.put.request".to_string(),
            Route {
                method: Method::PUT,
                base_url: trim_base(&config.persist_base_url),
                path_template: config.persist_put_path.clone(),
                required_fields: &["collection", "id"],
                body: BodyMode::Nested,
                query_fields: &[],
            },
        );
        routes.insert(
            "planner.plan.request".to_string(),
            Route {
                method: Method::POST,
                base_url: trim_base(&config.planner_base_url),
                path_template: config.planner_plan_path.clone(),
                required_fields: &[],
                body: BodyMode::Envelope,
                query_fields: &[],
            },
        );

        Self { routes }
    }

    /// Look up the route for a request property id.
    pub fn resolve(&self, property_id: &str) -> Option<&Route> {
        self.routes.get(property_id)
    }

    /// Overlay path templates from the agent fact document.
    ///
    /// Properties the table does not route are ignored.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) {
        for (property_id, path) in overrides {
            if let Some(route) = self.routes.get_mut(property_id) {
                debug!(property_id = %property_id, path = %path, "mapping override applied");
                route.path_template = path.clone();
            }
        }
    }
}

fn trim_base(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Replace every `{key}` placeholder in `template` with its value.
///
/// Unmatched placeholders are left verbatim; the caller supplies whatever
/// keys the route requires.
pub fn substitute(template: &str, values: &HashMap<&str, String>) -> String {
    let mut path = template.to_string();
    for (key, value) in values {
        path = path.replace(&format!("{{{key}}}"), value);
    }
    path
}

/// Fetch path-template overrides from the agent fact store.
///
/// Runs `store-dump` once, with the corpus/collection/id triple in the
/// child environment, and extracts every
/// `functionBlocks[].properties[].mapsTo.openapi.path` entry keyed by
/// property id. Any failure degrades to an empty map.
pub fn load_fact_overrides(agent_id: &str, corpus_id: &str) -> HashMap<String, String> {
    let facts_id = format!("facts:agent:{}", agent_id.replace('/', "|"));

    let output = match Command::new(store_dump_path())
        .env("CORPUS_ID", corpus_id)
        .env("COLLECTION", "agent-facts")
        .env("ID", &facts_id)
        .output()
    {
        Ok(output) => output,
        Err(error) => {
            warn!(error = %error, "store-dump unavailable, keeping default mappings");
            return HashMap::new();
        }
    };

    if !output.status.success() || output.stdout.is_empty() {
        warn!(status = ?output.status.code(), "store-dump produced no usable facts");
        return HashMap::new();
    }

    parse_fact_overrides(&output.stdout)
}

/// Prefer a `store-dump` binary next to the current executable, then PATH.
fn store_dump_path() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        let sibling = exe.with_file_name("store-dump");
        if sibling.is_file() {
            return sibling;
        }
    }
    PathBuf::from("store-dump")
}

fn parse_fact_overrides(stdout: &[u8]) -> HashMap<String, String> {
    let document: FactDocument = match serde_json::from_slice(stdout) {
        Ok(document) => document,
        Err(error) => {
            warn!(error = %error, "unparseable fact document, keeping default mappings");
            return HashMap::new();
        }
    };

    let mut overrides = HashMap::new();
    for block in document.function_blocks {
        for property in block.properties {
            if let Some(path) = property
                .maps_to
                .and_then(|m| m.openapi)
                .and_then(|o| o.path)
            {
                overrides.insert(property.id, path);
            }
        }
    }
    overrides
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FactDocument {
    #[serde(default)]
    function_blocks: Vec<FunctionBlock>,
}

#[derive(Debug, Deserialize)]
struct FunctionBlock {
    #[serde(default)]
    properties: Vec<PropertyMapping>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertyMapping {
    id: String,
    #[serde(default)]
    maps_to: Option<MapsTo>,
}

#[derive(Debug, Deserialize)]
struct MapsTo {
    #[serde(default)]
    openapi: Option<OpenapiRef>,
}

#[derive(Debug, Deserialize)]
struct OpenapiRef {
    #[serde(default)]
    path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn substitute_fills_placeholders() {
        let values = HashMap::from([
            ("collection", "notes".to_string()),
            ("id", "n1".to_string()),
        ]);
        assert_eq!(
            substitute("/persist/{collection}/{id}", &values),
            "/persist/notes/n1"
        );
    }

    #[test]
    fn substitute_leaves_unmatched_placeholders_verbatim() {
        let values = HashMap::from([("collection", "notes".to_string())]);
        assert_eq!(
            substitute("/persist/{collection}/{id}", &values),
            "/persist/notes/{id}"
        );
        assert_eq!(substitute("/fixed/route", &values), "/fixed/route");
    }

    #[test]
    fn default_routes_cover_all_request_properties() {
        let table = RouteTable::from_config(&BridgeConfig::default());
        for property in [
            "function.tools.request",
            "function.call.request",
            "persist.get.request",
            "persist.put.request",
            "planner.plan.request",
        ] {
            assert!(table.resolve(property).is_some(), "{property}");
        }
        assert!(table.resolve("unknown.op").is_none());
    }

    #[test]
    fn persist_put_defaults_to_static_template() {
        let table = RouteTable::from_config(&BridgeConfig::default());
        let route = table.resolve("persist.put.request").unwrap();
        assert_eq!(route.method, Method::PUT);
        assert_eq!(route.path_template, "/persist/{collection}/{id}");
        assert_eq!(route.required_fields, ["collection", "id"]);
    }

    #[test]
    fn absent_fact_tool_keeps_defaults() {
        // No store-dump binary exists in the test environment
        let overrides = load_fact_overrides("fountain.coach/agent/test", "agents");
        assert!(overrides.is_empty());

        let mut table = RouteTable::from_config(&BridgeConfig::default());
        table.apply_overrides(&overrides);
        let route = table.resolve("persist.put.request").unwrap();
        assert_eq!(route.path_template, "/persist/{collection}/{id}");
    }

    #[test]
    fn fact_document_paths_are_extracted() {
        let document = br#"{
            "functionBlocks": [
                {
                    "properties": [
                        {"id": "function.tools.request", "mapsTo": {"openapi": {"path": "/v2/tools"}}},
                        {"id": "function.call.request", "mapsTo": {"openapi": {"path": "/v2/call"}}},
                        {"id": "function.docs", "mapsTo": {}}
                    ]
                }
            ]
        }"#;
        let overrides = parse_fact_overrides(document);
        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides["function.tools.request"], "/v2/tools");
    }

    #[test]
    fn malformed_fact_document_yields_no_overrides() {
        assert!(parse_fact_overrides(b"not json").is_empty());
        assert!(parse_fact_overrides(br#"{"functionBlocks": "oops"}"#).is_empty());
    }

    #[test]
    fn overrides_only_touch_routed_properties() {
        let mut table = RouteTable::from_config(&BridgeConfig::default());
        let overrides = HashMap::from([
            ("function.tools.request".to_string(), "/v2/tools".to_string()),
            ("unknown.request".to_string(), "/nowhere".to_string()),
        ]);
        table.apply_overrides(&overrides);

        let route = table.resolve("function.tools.request").unwrap();
        assert_eq!(route.path_template, "/v2/tools");
        assert!(table.resolve("unknown.request").is_none());
    }

    #[test]
    fn trailing_slash_is_trimmed_from_bases() {
        let config = BridgeConfig {
            persist_base_url: "http://127.0.0.1:8040/".to_string(),
            ..BridgeConfig::default()
        };
        let table = RouteTable::from_config(&config);
        let route = table.resolve("persist.get.request").unwrap();
        assert_eq!(route.base_url, "http://127.0.0.1:8040");
    }
}
