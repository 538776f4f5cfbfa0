// src/blockchain/models.rs
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use super::resolver::NetworkError;
use super::units;
use super::services::subscan::SubscanError;
use super::services::transfer::TransferError;

// --- Error types for tool operations ---

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Network constants validation failed: {0}")]
    Network(#[from] NetworkError),
    #[error("Missing SUBSCAN_API_KEY environment variable")]
    MissingCredential,
    #[error("Missing required parameters: {0}")]
    MissingParameters(String),
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error(transparent)]
    Subscan(#[from] SubscanError),
}

impl From<ToolError> for ToolResponse {
    fn from(err: ToolError) -> Self {
        ToolResponse::error(err.to_string())
    }
}

// --- Token Models ---

/// A token holding as reported by Subscan, amounts still in smallest units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub symbol: String,
    /// Raw balance as a decimal integer string
    #[serde(deserialize_with = "raw_amount")]
    pub balance: String,
    #[serde(default)]
    pub decimals: u32,
    /// USD price per whole token, as a decimal string
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

// Subscan is not consistent about quoting numeric fields. Unquoted balances
// are only taken when they are exact integers; anything serde_json had to
// read as a float has already lost digits.
fn raw_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let raw = match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => match (n.as_u64(), n.as_i64()) {
            (Some(v), _) => v.to_string(),
            (None, Some(v)) => v.to_string(),
            (None, None) => {
                return Err(serde::de::Error::custom(format!(
                    "balance {} is not an exact integer; expected a quoted amount",
                    n
                )))
            }
        },
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected string or number, got {}",
                other
            )))
        }
    };
    units::check_raw(&raw).map_err(serde::de::Error::custom)?;
    Ok(raw)
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string, number or null, got {}",
            other
        ))),
    }
}

/// Holdings split into the chain's native token and everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTokens {
    #[serde(default)]
    pub native: Vec<TokenBalance>,
    #[serde(default)]
    pub assets: Vec<TokenBalance>,
}

impl AccountTokens {
    /// Native holdings first, then other assets.
    pub fn into_ordered(self) -> impl Iterator<Item = TokenBalance> {
        self.native.into_iter().chain(self.assets)
    }
}

/// A holding in human units, as returned to tool callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResult {
    pub token_name: String,
    pub token_amount: String,
    #[serde(rename = "tokenAmountInUSD", skip_serializing_if = "Option::is_none")]
    pub token_amount_in_usd: Option<String>,
}

// --- Transaction Models ---

/// Description of an unsigned balance transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSpec {
    pub rpc: String,
    pub section: String,
    pub method: String,
    pub args: Vec<String>,
}

// --- Tool payloads ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Error,
}

/// Uniform `{status, data}` envelope every tool returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub status: ToolStatus,
    pub data: Value,
}

impl ToolResponse {
    pub fn success<T: Serialize>(data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                status: ToolStatus::Success,
                data,
            },
            Err(e) => Self::error(format!("Failed to serialize result: {}", e)),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Error,
            data: json!({ "message": message.into() }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }

    /// Error message, when this is an error payload.
    pub fn message(&self) -> Option<&str> {
        match self.status {
            ToolStatus::Error => self.data.get("message").and_then(Value::as_str),
            ToolStatus::Success => None,
        }
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| {
            r#"{"status":"error","data":{"message":"Failed to serialize response"}}"#.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_payload_shape() {
        let response = ToolResponse::from(ToolError::MissingCredential);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "status": "error",
                "data": { "message": "Missing SUBSCAN_API_KEY environment variable" }
            })
        );
        assert_eq!(
            response.message(),
            Some("Missing SUBSCAN_API_KEY environment variable")
        );
    }

    #[test]
    fn token_result_omits_missing_usd_value() {
        let token = TokenResult {
            token_name: "DOT".into(),
            token_amount: "1.5".into(),
            token_amount_in_usd: None,
        };
        assert_eq!(
            serde_json::to_value(&token).unwrap(),
            json!({ "tokenName": "DOT", "tokenAmount": "1.5" })
        );
    }

    #[test]
    fn token_balance_accepts_unquoted_numbers() {
        let token: TokenBalance = serde_json::from_value(json!({
            "symbol": "KSM",
            "balance": 1200000000000u64,
            "decimals": 12,
            "price": 31.5
        }))
        .unwrap();
        assert_eq!(token.balance, "1200000000000");
        assert_eq!(token.price.as_deref(), Some("31.5"));
        assert_eq!(token.category, None);
    }

    #[test]
    fn token_balance_keeps_large_quoted_balances_exact() {
        let token: TokenBalance = serde_json::from_value(json!({
            "symbol": "GLMR",
            "balance": "25000000000000000000000",
            "decimals": 18
        }))
        .unwrap();
        assert_eq!(token.balance, "25000000000000000000000");
    }

    #[test]
    fn token_balance_rejects_balances_that_are_not_exact_integers() {
        let oversized: Value =
            serde_json::from_str(r#"{"symbol":"GLMR","balance":25000000000000000000000,"decimals":18}"#)
                .unwrap();
        let err = serde_json::from_value::<TokenBalance>(oversized).unwrap_err();
        assert!(err.to_string().contains("not an exact integer"), "{err}");

        for balance in [json!("1.5"), json!("abc"), json!("1\u{e9}"), json!(1.5)] {
            let result = serde_json::from_value::<TokenBalance>(json!({
                "symbol": "DOT",
                "balance": balance,
                "decimals": 10
            }));
            assert!(result.is_err(), "balance {balance} should be rejected");
        }
    }

    #[test]
    fn ordered_tokens_put_native_first() {
        let token = |symbol: &str| TokenBalance {
            symbol: symbol.into(),
            balance: "0".into(),
            decimals: 0,
            price: None,
            category: None,
        };
        let tokens = AccountTokens {
            native: vec![token("DOT")],
            assets: vec![token("USDT"), token("USDC")],
        };
        let symbols: Vec<String> = tokens.into_ordered().map(|t| t.symbol).collect();
        assert_eq!(symbols, ["DOT", "USDT", "USDC"]);
    }
}
