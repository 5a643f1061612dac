//! Odoo JSON-RPC gateway.
//!
//! Every remote operation goes through a single envelope: a POST to
//! `{endpoint}/jsonrpc` with `method: "call"` and a `{service, method,
//! args}` params object. Service `"common"` handles authentication,
//! service `"object"` carries all `execute_kw` data operations.
//!
//! The gateway is a trait so the sync chain can be exercised against
//! scripted responses without a server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::error::{OdooError, OdooResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Request sent to the Odoo `/jsonrpc` endpoint.
#[derive(Debug, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: RpcParams,
    pub id: u64,
}

#[derive(Debug, Serialize)]
pub struct RpcParams {
    pub service: String,
    pub method: String,
    pub args: Vec<Value>,
}

impl RpcRequest {
    pub fn new(service: &str, method: &str, args: Vec<Value>) -> Self {
        RpcRequest {
            jsonrpc: "2.0",
            method: "call",
            params: RpcParams {
                service: service.to_string(),
                method: method.to_string(),
                args,
            },
            id: 1,
        }
    }
}

/// Response from the Odoo `/jsonrpc` endpoint. Exactly one of `result`
/// and `error` is present; an absent `result` deserializes as Null.
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<RpcErrorData>,
}

/// Structured debug payload Odoo attaches to server-side errors.
#[derive(Debug, Deserialize)]
pub struct RpcErrorData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub debug: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub exception_type: Option<String>,
}

/// The remote procedure gateway the sync chain is built on.
///
/// One attempt per call, no retry; a failure propagates to the stage
/// that issued it and is handled there.
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Execute a named remote method and return the raw `result` value
    /// (`Value::Null` when the server omitted it).
    async fn call(
        &self,
        endpoint: &str,
        service: &str,
        method: &str,
        args: Vec<Value>,
    ) -> OdooResult<Value>;
}

/// HTTP implementation of [`RpcClient`] backed by reqwest.
pub struct HttpRpcClient {
    client: reqwest::Client,
}

impl HttpRpcClient {
    /// Build the transport with the request timeout applied. A builder
    /// failure surfaces rather than falling back to a client without
    /// the timeout.
    pub fn new() -> OdooResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| OdooError::Transport(format!("http client setup failed: {err}")))?;
        Ok(HttpRpcClient { client })
    }

    fn map_send_error(err: reqwest::Error) -> OdooError {
        if err.is_timeout() {
            return OdooError::Timeout(REQUEST_TIMEOUT.as_secs());
        }
        // reqwest folds TLS failures into connect errors; keep them
        // distinguishable by message inspection, which is the best the
        // client surface offers.
        let message = err.to_string();
        if err.is_connect() {
            if message.contains("tls") || message.contains("certificate") {
                OdooError::Tls(message)
            } else {
                OdooError::Unreachable(message)
            }
        } else {
            OdooError::Transport(message)
        }
    }
}

#[async_trait]
impl RpcClient for HttpRpcClient {
    async fn call(
        &self,
        endpoint: &str,
        service: &str,
        method: &str,
        args: Vec<Value>,
    ) -> OdooResult<Value> {
        let url = format!("{}/jsonrpc", endpoint.trim_end_matches('/'));
        let request = RpcRequest::new(service, method, args);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let response: RpcResponse = response
            .json()
            .await
            .map_err(|e| OdooError::Protocol(format!("invalid JSON-RPC response: {e}")))?;

        if let Some(error) = response.error {
            let detail = error
                .data
                .as_ref()
                .and_then(|d| d.message.clone())
                .unwrap_or(error.message);
            return Err(OdooError::Server {
                code: error.code,
                message: detail,
            });
        }

        Ok(response.result)
    }
}

/// In-memory gateway for exercising the chain without a server.
pub mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;

    use crate::error::{OdooError, OdooResult};

    use super::RpcClient;

    /// A call the scripted client has served, for order assertions.
    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedCall {
        pub service: String,
        pub method: String,
        pub args: Vec<Value>,
    }

    /// Serves a fixed queue of responses in order and records every
    /// call it receives. Running past the script is a test bug and
    /// panics.
    pub struct ScriptedRpc {
        script: Mutex<VecDeque<OdooResult<Value>>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedRpc {
        pub fn new(script: Vec<OdooResult<Value>>) -> Self {
            ScriptedRpc {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RpcClient for ScriptedRpc {
        async fn call(
            &self,
            _endpoint: &str,
            service: &str,
            method: &str,
            args: Vec<Value>,
        ) -> OdooResult<Value> {
            self.calls.lock().unwrap().push(RecordedCall {
                service: service.to_string(),
                method: method.to_string(),
                args,
            });
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("unscripted call: {service}.{method}"))
        }
    }

    /// Fails every call with a transport error, as if the host were
    /// unreachable.
    pub struct OfflineRpc;

    #[async_trait]
    impl RpcClient for OfflineRpc {
        async fn call(
            &self,
            _endpoint: &str,
            service: &str,
            method: &str,
            _args: Vec<Value>,
        ) -> OdooResult<Value> {
            Err(OdooError::Unreachable(format!(
                "offline: {service}.{method}"
            )))
        }
    }
}
