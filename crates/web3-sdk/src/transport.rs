//! Transport layer for RPC communication

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::SdkError;

/// Transport trait for RPC communication (object-safe)
///
/// A JSON `null` result is returned as `Value::Null`; the client decides
/// whether that means "not found".
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send an RPC request and get the JSON result
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, SdkError>;

    /// Send several requests as one JSON-RPC batch.
    ///
    /// Results come back in request order; a failed element does not fail
    /// the whole batch.
    async fn request_batch(
        &self,
        calls: Vec<(String, Vec<Value>)>,
    ) -> Result<Vec<Result<Value, SdkError>>, SdkError> {
        let mut out = Vec::with_capacity(calls.len());
        for (method, params) in calls {
            out.push(self.request_json(&method, params).await);
        }
        Ok(out)
    }
}

/// Open a transport for `url`, chosen by scheme.
pub async fn connect(url: &str) -> Result<Box<dyn Transport>, SdkError> {
    let parsed =
        url::Url::parse(url).map_err(|e| SdkError::Transport(format!("invalid RPC URL {url:?}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(Box::new(HttpTransport::new(url))),
        #[cfg(feature = "ws")]
        "ws" | "wss" => Ok(Box::new(WsTransport::connect(url).await?)),
        other => Err(SdkError::Transport(format!(
            "unsupported RPC URL scheme {other:?}"
        ))),
    }
}

/// Helper to deserialize response
pub fn deserialize_response<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, SdkError> {
    serde_json::from_value(value).map_err(|e| SdkError::Serialization(e.to_string()))
}

// ==================== Wire format ====================

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

impl JsonRpcResponse {
    fn into_result(self) -> Result<Value, SdkError> {
        if let Some(error) = self.error {
            return Err(SdkError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }

    fn id_u64(&self) -> Option<u64> {
        self.id.as_ref().and_then(Value::as_u64)
    }
}

fn request_object(id: u64, method: &str, params: &[Value]) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    })
}

/// Match batch responses (any order) back to the request ids.
fn order_batch(
    first_id: u64,
    count: usize,
    responses: Vec<JsonRpcResponse>,
) -> Vec<Result<Value, SdkError>> {
    let mut by_id: HashMap<u64, JsonRpcResponse> = responses
        .into_iter()
        .filter_map(|r| r.id_u64().map(|id| (id, r)))
        .collect();
    (0..count as u64)
        .map(|i| match by_id.remove(&(first_id + i)) {
            Some(resp) => resp.into_result(),
            None => Err(SdkError::Transport(format!(
                "batch response missing id {}",
                first_id + i
            ))),
        })
        .collect()
}

// ==================== Mock ====================

#[derive(Default)]
struct MockState {
    fixed: HashMap<String, Value>,
    queued: HashMap<String, VecDeque<Result<Value, (i64, String)>>>,
    defaults: HashMap<String, Value>,
    requests: Vec<(String, Vec<Value>)>,
}

/// In-memory transport for tests.
///
/// Lookup order per method: queued responses (consumed), fixed responses,
/// then the built-in defaults. Clones share state, so a test can keep a
/// handle after moving one into a [`Client`](crate::Client).
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        let mut defaults = HashMap::new();

        defaults.insert("eth_chainId".to_string(), Value::String("0x1".to_string()));
        defaults.insert("net_version".to_string(), Value::String("1".to_string()));
        defaults.insert("eth_gasPrice".to_string(), Value::String("0x3b9aca00".to_string())); // 1 gwei
        defaults.insert(
            "eth_maxPriorityFeePerGas".to_string(),
            Value::String("0x3b9aca00".to_string()),
        );
        defaults.insert("eth_blockNumber".to_string(), Value::String("0x100".to_string()));
        defaults.insert(
            "eth_getBalance".to_string(),
            Value::String("0xde0b6b3a7640000".to_string()), // 1 ETH
        );
        defaults.insert("eth_getTransactionCount".to_string(), Value::String("0x0".to_string()));
        defaults.insert("eth_estimateGas".to_string(), Value::String("0x5208".to_string())); // 21000
        defaults.insert(
            "eth_sendRawTransaction".to_string(),
            Value::String(
                "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b".to_string(),
            ),
        );
        defaults.insert("eth_call".to_string(), Value::String("0x".to_string()));
        defaults.insert("eth_getCode".to_string(), Value::String("0x".to_string()));
        defaults.insert("eth_getTransactionReceipt".to_string(), Value::Null);
        defaults.insert("eth_getTransactionByHash".to_string(), Value::Null);

        Self {
            state: Arc::new(Mutex::new(MockState {
                defaults,
                ..Default::default()
            })),
        }
    }

    /// Set a fixed response for a method
    pub fn set_response(&self, method: &str, response: Value) {
        self.state.lock().fixed.insert(method.to_string(), response);
    }

    /// Queue a one-shot response for a method
    pub fn push_response(&self, method: &str, response: Value) {
        self.state
            .lock()
            .queued
            .entry(method.to_string())
            .or_default()
            .push_back(Ok(response));
    }

    /// Queue a one-shot RPC error for a method
    pub fn push_error(&self, method: &str, code: i64, message: &str) {
        self.state
            .lock()
            .queued
            .entry(method.to_string())
            .or_default()
            .push_back(Err((code, message.to_string())));
    }

    /// Clear fixed and queued responses
    pub fn clear_responses(&self) {
        let mut state = self.state.lock();
        state.fixed.clear();
        state.queued.clear();
    }

    /// Every request seen so far, in order
    pub fn requests(&self) -> Vec<(String, Vec<Value>)> {
        self.state.lock().requests.clone()
    }

    /// Params of the most recent call to `method`
    pub fn last_params(&self, method: &str) -> Option<Vec<Value>> {
        self.state
            .lock()
            .requests
            .iter()
            .rev()
            .find(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
    }

    /// Number of calls made to `method`
    pub fn call_count(&self, method: &str) -> usize {
        self.state.lock().requests.iter().filter(|(m, _)| m == method).count()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, SdkError> {
        let mut state = self.state.lock();
        state.requests.push((method.to_string(), params));

        if let Some(next) = state.queued.get_mut(method).and_then(VecDeque::pop_front) {
            return next.map_err(|(code, message)| SdkError::Rpc { code, message });
        }
        if let Some(response) = state.fixed.get(method) {
            return Ok(response.clone());
        }
        if let Some(response) = state.defaults.get(method) {
            return Ok(response.clone());
        }

        Err(SdkError::Rpc {
            code: -32601,
            message: format!("Method not found: {}", method),
        })
    }
}

// ==================== HTTP ====================

/// HTTP(S) transport
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    request_id: AtomicU64,
}

impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            request_id: AtomicU64::new(1),
        }
    }

    fn next_ids(&self, n: u64) -> u64 {
        self.request_id.fetch_add(n, Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, SdkError> {
        let id = self.next_ids(1);
        debug!(method, id, "rpc request");

        let response: JsonRpcResponse = self
            .client
            .post(&self.url)
            .json(&request_object(id, method, &params))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let result = response.into_result();
        debug!(method, id, ok = result.is_ok(), "rpc response");
        result
    }

    async fn request_batch(
        &self,
        calls: Vec<(String, Vec<Value>)>,
    ) -> Result<Vec<Result<Value, SdkError>>, SdkError> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }
        let first_id = self.next_ids(calls.len() as u64);
        let body: Vec<Value> = calls
            .iter()
            .enumerate()
            .map(|(i, (method, params))| request_object(first_id + i as u64, method, params))
            .collect();
        debug!(size = calls.len(), first_id, "rpc batch request");

        let responses: Vec<JsonRpcResponse> = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(order_batch(first_id, calls.len(), responses))
    }
}

// ==================== WebSocket ====================

#[cfg(feature = "ws")]
mod ws {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use tokio::net::TcpStream;
    use tokio_tungstenite::{
        connect_async, tungstenite::protocol::Message as WsMessage, MaybeTlsStream,
        WebSocketStream,
    };

    type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

    /// WebSocket transport.
    ///
    /// Requests are serialized over one connection; non-matching frames
    /// (e.g. subscription notifications) are skipped.
    pub struct WsTransport {
        socket: tokio::sync::Mutex<Socket>,
        request_id: AtomicU64,
    }

    impl WsTransport {
        /// Connect to a `ws://` or `wss://` endpoint
        pub async fn connect(url: &str) -> Result<Self, SdkError> {
            let (socket, _) = connect_async(url)
                .await
                .map_err(|e| SdkError::Transport(format!("websocket connect to {url}: {e}")))?;
            Ok(Self {
                socket: tokio::sync::Mutex::new(socket),
                request_id: AtomicU64::new(1),
            })
        }

        async fn roundtrip(&self, payload: Value) -> Result<Value, SdkError> {
            let mut socket = self.socket.lock().await;
            socket
                .send(WsMessage::Text(payload.to_string()))
                .await
                .map_err(|e| SdkError::Transport(e.to_string()))?;

            loop {
                let frame = socket
                    .next()
                    .await
                    .ok_or_else(|| SdkError::Transport("websocket closed".to_string()))?
                    .map_err(|e| SdkError::Transport(e.to_string()))?;
                let text = match frame {
                    WsMessage::Text(text) => text,
                    WsMessage::Binary(bin) => String::from_utf8_lossy(&bin).into_owned(),
                    WsMessage::Close(_) => {
                        return Err(SdkError::Transport("websocket closed".to_string()))
                    }
                    _ => continue,
                };
                let value: Value = serde_json::from_str(&text)?;
                // Subscription notifications carry no id
                if value.is_array() || value.get("id").is_some_and(|id| !id.is_null()) {
                    return Ok(value);
                }
            }
        }
    }

    #[async_trait]
    impl Transport for WsTransport {
        async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, SdkError> {
            let id = self.request_id.fetch_add(1, Ordering::SeqCst);
            debug!(method, id, "ws rpc request");
            let raw = self.roundtrip(request_object(id, method, &params)).await?;
            let response: JsonRpcResponse = deserialize_response(raw)?;
            response.into_result()
        }

        async fn request_batch(
            &self,
            calls: Vec<(String, Vec<Value>)>,
        ) -> Result<Vec<Result<Value, SdkError>>, SdkError> {
            if calls.is_empty() {
                return Ok(Vec::new());
            }
            let first_id = self.request_id.fetch_add(calls.len() as u64, Ordering::SeqCst);
            let body: Vec<Value> = calls
                .iter()
                .enumerate()
                .map(|(i, (method, params))| request_object(first_id + i as u64, method, params))
                .collect();
            let raw = self.roundtrip(Value::Array(body)).await?;
            let responses: Vec<JsonRpcResponse> = deserialize_response(raw)?;
            Ok(order_batch(first_id, calls.len(), responses))
        }
    }
}

#[cfg(feature = "ws")]
pub use ws::WsTransport;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transport_default_responses() {
        let transport = MockTransport::new();

        let result = transport.request_json("eth_chainId", vec![]).await.unwrap();
        assert_eq!(result, Value::String("0x1".to_string()));

        let result = transport.request_json("eth_gasPrice", vec![]).await.unwrap();
        assert_eq!(result, Value::String("0x3b9aca00".to_string()));
    }

    #[tokio::test]
    async fn test_mock_transport_custom_response() {
        let transport = MockTransport::new();
        transport.set_response("eth_chainId", Value::String("0x5".to_string()));

        let result = transport.request_json("eth_chainId", vec![]).await.unwrap();
        assert_eq!(result, Value::String("0x5".to_string()));
    }

    #[tokio::test]
    async fn test_mock_transport_queue_before_fixed() {
        let transport = MockTransport::new();
        transport.set_response("eth_blockNumber", Value::String("0x2".to_string()));
        transport.push_response("eth_blockNumber", Value::String("0x1".to_string()));

        let first = transport.request_json("eth_blockNumber", vec![]).await.unwrap();
        let second = transport.request_json("eth_blockNumber", vec![]).await.unwrap();
        assert_eq!(first, "0x1");
        assert_eq!(second, "0x2");
    }

    #[tokio::test]
    async fn test_mock_transport_queued_error() {
        let transport = MockTransport::new();
        transport.push_error("eth_call", -32000, "execution reverted");

        let err = transport.request_json("eth_call", vec![]).await.unwrap_err();
        assert!(matches!(err, SdkError::Rpc { code: -32000, .. }));
        // Falls back to the default afterwards
        assert!(transport.request_json("eth_call", vec![]).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_transport_records_requests() {
        let transport = MockTransport::new();
        let handle = transport.clone();
        transport
            .request_json("eth_getBalance", vec![Value::from("0xabc"), Value::from("latest")])
            .await
            .unwrap();

        assert_eq!(handle.call_count("eth_getBalance"), 1);
        assert_eq!(
            handle.last_params("eth_getBalance").unwrap(),
            vec![Value::from("0xabc"), Value::from("latest")]
        );
    }

    #[tokio::test]
    async fn test_mock_transport_unknown_method() {
        let transport = MockTransport::new();
        let result = transport.request_json("unknown_method", vec![]).await;
        assert!(matches!(result, Err(SdkError::Rpc { code: -32601, .. })));
    }

    #[tokio::test]
    async fn test_default_batch_preserves_order() {
        let transport = MockTransport::new();
        let results = transport
            .request_batch(vec![
                ("net_version".to_string(), vec![]),
                ("nope".to_string(), vec![]),
                ("eth_chainId".to_string(), vec![]),
            ])
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap(), "1");
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap(), "0x1");
    }

    #[test]
    fn test_order_batch_by_id() {
        let responses: Vec<JsonRpcResponse> = serde_json::from_value(serde_json::json!([
            {"jsonrpc": "2.0", "id": 8, "result": "0x2"},
            {"jsonrpc": "2.0", "id": 7, "result": "0x1"},
            {"jsonrpc": "2.0", "id": 9, "error": {"code": -32000, "message": "boom"}}
        ]))
        .unwrap();
        let ordered = order_batch(7, 3, responses);
        assert_eq!(ordered[0].as_ref().unwrap(), "0x1");
        assert_eq!(ordered[1].as_ref().unwrap(), "0x2");
        assert!(matches!(ordered[2], Err(SdkError::Rpc { code: -32000, .. })));
    }

    #[test]
    fn test_null_result_is_null() {
        let resp: JsonRpcResponse =
            serde_json::from_value(serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": null}))
                .unwrap();
        assert_eq!(resp.into_result().unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_connect_rejects_unknown_scheme() {
        let err = connect("ftp://example.com").await.err().unwrap();
        assert!(err.to_string().contains("unsupported RPC URL scheme"));
    }
}
