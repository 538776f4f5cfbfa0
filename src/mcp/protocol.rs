// src/mcp/protocol.rs

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// MCP revision this server speaks.
pub const PROTOCOL_VERSION: &str = "2025-06-18";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
}

/// `params` of a `tools/call` request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default = "empty_arguments")]
    pub arguments: Value,
}

fn default_jsonrpc() -> String {
    "2.0".to_string()
}

fn empty_arguments() -> Value {
    Value::Object(Map::new())
}

impl Request {
    pub fn is_notification(&self) -> bool {
        self.id.is_null()
    }

    /// Rewrites a direct tool invocation (`"method": "<tool name>"`) into the
    /// equivalent `tools/call` request.
    pub fn into_tool_call(self) -> Request {
        let arguments = self.params.unwrap_or_else(empty_arguments);
        Request {
            jsonrpc: self.jsonrpc,
            id: self.id,
            params: Some(json!({ "name": self.method, "arguments": arguments })),
            method: "tools/call".to_string(),
        }
    }
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(ErrorObject { code, message }),
        }
    }
}

// Standard JSON-RPC error codes
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}
