//! Tools advertised to the MCP client.
//!
//! The catalogue is plain data. Each entry names an editor command that
//! `tools/call` forwards verbatim; the bridge never inspects the schemas.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One entry of a `tools/list` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(default = "empty_object_schema")]
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

fn empty_object_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

/// Tools exposed when configuration does not override them.
pub fn builtin_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "get_project_info",
            "Get project information",
            empty_object_schema(),
        ),
        ToolDescriptor::new(
            "get_project_settings",
            "Get project settings",
            json!({
                "type": "object",
                "properties": {
                    "category": {
                        "type": "string",
                        "description": "Settings category (e.g., \"input\")"
                    }
                }
            }),
        ),
        ToolDescriptor::new(
            "get_node_properties",
            "Get properties of a node",
            json!({
                "type": "object",
                "properties": {
                    "node_path": {
                        "type": "string",
                        "description": "Path to the node"
                    }
                },
                "required": ["node_path"]
            }),
        ),
        ToolDescriptor::new(
            "find_nodes",
            "Find nodes in the scene",
            json!({
                "type": "object",
                "properties": {
                    "name_pattern": {
                        "type": "string",
                        "description": "Name pattern to search for"
                    },
                    "type": {
                        "type": "string",
                        "description": "Node type to filter by"
                    }
                }
            }),
        ),
    ]
}

/// Body of a `tools/list` reply.
pub fn list_result(tools: &[ToolDescriptor]) -> Value {
    json!({ "tools": tools })
}
