//! JSON-RPC bridge to a user's wallet.
//!
//! The bridge forwards EIP-1193 `request({ method, params })` calls to the
//! wallet and answers with JSON-RPC 2.0 envelopes. Error codes are translated
//! into [`ProviderError`] here and nowhere else.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::error::ProviderError;
use crate::network::{AddChainParameters, ChainId};
use crate::provider::{ProviderHandle, ProviderSource, WalletProvider};

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    /// `Some(Null)` for an explicit `"result": null`, `None` when absent.
    #[serde(default, deserialize_with = "present")]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Wallet provider reached through a JSON-RPC bridge endpoint.
#[derive(Debug)]
pub struct JsonRpcWalletProvider {
    client: reqwest::Client,
    endpoint: Url,
    next_id: AtomicU64,
}

impl JsonRpcWalletProvider {
    pub fn new(client: reqwest::Client, endpoint: Url) -> Self {
        Self {
            client,
            endpoint,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError> {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        tracing::debug!(method, endpoint = %self.endpoint, "Sending wallet request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Transport(format!(
                "bridge answered HTTP {}",
                status.as_u16()
            )));
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        parse_envelope(envelope)
    }
}

fn parse_envelope(envelope: RpcResponse) -> Result<serde_json::Value, ProviderError> {
    if let Some(error) = envelope.error {
        return Err(ProviderError::from_code(
            error.code,
            error.message,
            error.data.as_ref(),
        ));
    }
    envelope.result.ok_or_else(|| {
        ProviderError::InvalidResponse("envelope has neither result nor error".to_string())
    })
}

#[async_trait]
impl WalletProvider for JsonRpcWalletProvider {
    async fn active_chain(&self) -> Result<ChainId, ProviderError> {
        let result = self.request("eth_chainId", json!([])).await?;
        let raw = result.as_str().ok_or_else(|| {
            ProviderError::InvalidResponse(format!("eth_chainId returned {result}"))
        })?;
        raw.parse::<ChainId>()
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderError> {
        self.request(
            "wallet_switchEthereumChain",
            json!([{ "chainId": chain_id.to_hex() }]),
        )
        .await
        .map(|_| ())
    }

    async fn add_chain(&self, params: &AddChainParameters) -> Result<(), ProviderError> {
        let params = serde_json::to_value(params)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        self.request("wallet_addEthereumChain", json!([params]))
            .await
            .map(|_| ())
    }
}

/// Yields a bridge-backed provider when a bridge URL is configured, and no
/// provider otherwise.
#[derive(Debug, Clone)]
pub struct BridgeProviderSource {
    client: reqwest::Client,
    endpoint: Option<Url>,
}

impl BridgeProviderSource {
    pub fn new(endpoint: Option<Url>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(format!("HTTP client init failed: {e}")))?;
        Ok(Self { client, endpoint })
    }
}

impl ProviderSource for BridgeProviderSource {
    fn current(&self) -> Option<ProviderHandle> {
        let endpoint = self.endpoint.clone()?;
        Some(Arc::new(JsonRpcWalletProvider::new(
            self.client.clone(),
            endpoint,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn envelope(raw: serde_json::Value) -> RpcResponse {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn request_envelope_is_jsonrpc_2() {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 7,
            method: "wallet_switchEthereumChain",
            params: json!([{ "chainId": "0xa045c" }]),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "wallet_switchEthereumChain",
                "params": [{ "chainId": "0xa045c" }],
            })
        );
    }

    #[test]
    fn error_envelopes_translate_codes() {
        let rejected = envelope(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": 4001, "message": "User rejected the request." }
        }));
        assert_eq!(parse_envelope(rejected), Err(ProviderError::UserRejected));

        let unknown = envelope(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "error": { "code": 4902, "message": "Unrecognized chain ID \"0xa045c\"." }
        }));
        assert_eq!(parse_envelope(unknown), Err(ProviderError::UnrecognizedChain));

        let wrapped = envelope(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "error": {
                "code": -32603,
                "message": "Internal JSON-RPC error.",
                "data": { "originalError": { "code": 4902 } }
            }
        }));
        assert_eq!(parse_envelope(wrapped), Err(ProviderError::UnrecognizedChain));
    }

    #[test]
    fn null_result_is_success() {
        let ok = envelope(json!({ "jsonrpc": "2.0", "id": 4, "result": null }));
        assert_eq!(parse_envelope(ok), Ok(serde_json::Value::Null));
    }

    #[test]
    fn envelope_without_result_or_error_is_invalid() {
        for raw in [
            json!({}),
            json!({ "status": "queued" }),
            json!({ "jsonrpc": "2.0", "id": 5 }),
        ] {
            assert!(
                matches!(
                    parse_envelope(envelope(raw.clone())),
                    Err(ProviderError::InvalidResponse(_))
                ),
                "accepted {raw}"
            );
        }
    }

    #[test]
    fn source_without_endpoint_has_no_provider() {
        let source = BridgeProviderSource::new(None, Duration::from_secs(1)).unwrap();
        assert!(source.current().is_none());

        let endpoint = Url::parse("http://127.0.0.1:8545/wallet").unwrap();
        let source = BridgeProviderSource::new(Some(endpoint), Duration::from_secs(1)).unwrap();
        assert!(source.current().is_some());
    }
}
