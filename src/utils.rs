//! Utility functions for the Polkadot MCP server

use serde::de::DeserializeOwned;
use serde_json::{from_value, Value};

use crate::mcp::protocol::{error_codes, Response};

/// Helper function to extract a required argument from a JSON object
pub fn get_required_arg<T: DeserializeOwned>(
    args: &Value,
    key: &str,
    req_id: &Value,
) -> Result<T, Response> {
    from_value(args.get(key).cloned().unwrap_or(Value::Null)).map_err(|_| {
        Response::error(
            req_id.clone(),
            error_codes::INVALID_PARAMS,
            format!("Missing or invalid required argument: '{}'", key),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_typed_arguments() {
        let args = json!({ "chainId": 0, "chainName": "Polkadot" });
        let id = json!(1);
        assert_eq!(get_required_arg::<i64>(&args, "chainId", &id).unwrap(), 0);
        assert_eq!(
            get_required_arg::<String>(&args, "chainName", &id).unwrap(),
            "Polkadot"
        );
    }

    #[test]
    fn missing_or_mistyped_argument_is_invalid_params() {
        let args = json!({ "chainId": "zero" });
        let id = json!(3);
        for key in ["chainId", "chainName"] {
            let err = get_required_arg::<i64>(&args, key, &id).unwrap_err();
            let error = err.error.unwrap();
            assert_eq!(error.code, error_codes::INVALID_PARAMS);
            assert_eq!(
                error.message,
                format!("Missing or invalid required argument: '{}'", key)
            );
        }
    }
}
