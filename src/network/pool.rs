// src/network/pool.rs

//! Pool WebSocket transport
//!
//! Accepts miner connections and carries JSON-RPC text frames between them
//! and the [`StratumServer`]. Requests are answered with
//! `{"id", "result", "error"}`; notifications queued by the server for a
//! connection are written to it as they arrive.
use crate::stratum::{PoolMessage, StratumServer, StratumShare};
use crate::utils::error::MinerError;
use crate::utils::logging::POOL_TARGET;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tungstenite::protocol::Message;

/// Size in bytes of the per-job extra-nonce prefix
const EXTRA_NONCE1_SIZE: usize = 4;

/// WebSocket listener in front of a pool server
pub struct PoolListener {
    server: Arc<StratumServer>,
    listen_addr: String,
}

impl PoolListener {
    /// Creates a listener
    ///
    /// # Arguments
    /// * `server` - Pool server handling miner requests
    /// * `listen_addr` - Socket address to bind (e.g., "0.0.0.0:3333")
    pub fn new(server: Arc<StratumServer>, listen_addr: impl Into<String>) -> Self {
        PoolListener {
            server,
            listen_addr: listen_addr.into(),
        }
    }

    /// Accepts connections until `shutdown` resolves
    ///
    /// # Errors
    /// Returns `MinerError` if the address cannot be bound
    pub async fn run(&self, shutdown: impl Future<Output = ()>) -> Result<(), MinerError> {
        let listener = TcpListener::bind(&self.listen_addr).await.map_err(|e| {
            MinerError::ConnectionError(format!("Failed to bind {}: {}", self.listen_addr, e))
        })?;
        log::info!(target: POOL_TARGET, "Pool listening on {}", self.listen_addr);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let server = self.server.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(server, stream, peer).await {
                                    log::warn!(target: POOL_TARGET, "Connection {} ended: {}", peer, e);
                                }
                            });
                        }
                        Err(e) => log::error!(target: POOL_TARGET, "Accept failed: {}", e),
                    }
                }
                _ = &mut shutdown => {
                    log::info!(target: POOL_TARGET, "Pool listener shutting down");
                    return Ok(());
                }
            }
        }
    }
}

/// Registers a miner for the connection and serves it until either side
/// closes
async fn handle_connection(
    server: Arc<StratumServer>,
    stream: TcpStream,
    peer: SocketAddr,
) -> Result<(), MinerError> {
    let ws = tokio_tungstenite::accept_async(stream).await?;

    let miner_id = format!("{:08x}", rand::random::<u32>());
    let (outbox, inbox) = mpsc::unbounded_channel();
    server.add_miner_with_outbox(&miner_id, &peer.to_string(), outbox);

    let result = serve(&server, &miner_id, ws, inbox).await;
    server.remove_miner(&miner_id);
    result
}

async fn serve(
    server: &Arc<StratumServer>,
    miner_id: &str,
    ws: WebSocketStream<TcpStream>,
    mut inbox: mpsc::UnboundedReceiver<PoolMessage>,
) -> Result<(), MinerError> {
    let (mut sink, mut source) = ws.split();
    loop {
        tokio::select! {
            incoming = source.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let reply = dispatch(server, miner_id, text.as_str()).await;
                        sink.send(Message::Text(reply.to_string().into())).await?;
                    }
                    Some(Ok(Message::Ping(payload))) => sink.send(Message::Pong(payload)).await?,
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                }
            }
            pushed = inbox.recv() => {
                match pushed {
                    Some(message) => {
                        sink.send(Message::Text(message.to_json().to_string().into())).await?;
                    }
                    // miner was evicted by the server
                    None => return Ok(()),
                }
            }
        }
    }
}

/// Handles one JSON-RPC request and builds its reply
async fn dispatch(server: &Arc<StratumServer>, miner_id: &str, text: &str) -> Value {
    let request: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => return reply(Value::Null, Err(format!("Parse error: {}", e))),
    };
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request.get("method").and_then(Value::as_str).unwrap_or_default();
    let params = request.get("params").cloned().unwrap_or(Value::Null);

    let result = match method {
        "mining.subscribe" => Ok(json!([
            miner_id,
            EXTRA_NONCE1_SIZE,
            server.settings().extra_nonce2_size
        ])),
        "mining.authorize" => authorize(server, miner_id, &params).await,
        "mining.submit" => submit(server, miner_id, &params).await,
        other => Err(format!("Unknown method: {}", other)),
    };
    reply(id, result)
}

async fn authorize(server: &Arc<StratumServer>, miner_id: &str, params: &Value) -> Result<Value, String> {
    let username = param_str(params, 0)?.to_string();
    let password = params.get(1).and_then(Value::as_str).unwrap_or_default().to_string();

    // job generation reads the ledger, which may block
    let server = server.clone();
    let miner_id = miner_id.to_string();
    let authorized = tokio::task::spawn_blocking(move || {
        server.authorize_miner(&miner_id, &username, &password)
    })
    .await
    .map_err(|e| e.to_string())?;
    Ok(Value::Bool(authorized))
}

async fn submit(server: &Arc<StratumServer>, miner_id: &str, params: &Value) -> Result<Value, String> {
    // [username, job_id, extra_nonce2, ntime, nonce]
    let share = StratumShare {
        job_id: param_str(params, 1)?.to_string(),
        extra_nonce2: param_str(params, 2)?.to_string(),
        nonce: param_str(params, 4)?.to_string(),
        miner_id: miner_id.to_string(),
    };

    let server = server.clone();
    let miner_id = miner_id.to_string();
    let response = tokio::task::spawn_blocking(move || server.submit_share(&miner_id, &share))
        .await
        .map_err(|e| e.to_string())?;

    if response.accepted {
        Ok(Value::Bool(true))
    } else {
        Err(response.reason.unwrap_or_else(|| "Rejected".to_string()))
    }
}

fn param_str(params: &Value, index: usize) -> Result<&str, String> {
    params
        .get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("Missing parameter {}", index))
}

fn reply(id: Value, result: Result<Value, String>) -> Value {
    match result {
        Ok(value) => json!({ "id": id, "result": value, "error": null }),
        Err(message) => json!({ "id": id, "result": null, "error": message }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use crate::miner::digest::sha256d_hex;
    use crate::stratum::{OpenAuthenticator, PoolSettings};
    use tokio_tungstenite::MaybeTlsStream;

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    fn server() -> Arc<StratumServer> {
        Arc::new(StratumServer::new(
            PoolSettings::default(),
            Arc::new(MemoryLedger::new(1.0)),
            Arc::new(OpenAuthenticator),
        ))
    }

    #[tokio::test]
    async fn test_subscribe_reply() {
        let server = server();
        let reply = dispatch(&server, "m1", r#"{"id":1,"method":"mining.subscribe","params":[]}"#).await;
        assert_eq!(reply["id"], 1);
        assert_eq!(reply["result"][0], "m1");
        assert_eq!(reply["result"][2], 4);
        assert!(reply["error"].is_null());
    }

    #[tokio::test]
    async fn test_authorize_and_reject_unknown_job() {
        let server = server();
        server.add_miner("m1", "peer");
        let reply = dispatch(
            &server,
            "m1",
            r#"{"id":2,"method":"mining.authorize","params":["worker","x"]}"#,
        )
        .await;
        assert_eq!(reply["result"], true);

        let reply = dispatch(
            &server,
            "m1",
            r#"{"id":3,"method":"mining.submit","params":["worker","missing","00000000","0","1f"]}"#,
        )
        .await;
        assert!(reply["result"].is_null());
        assert_eq!(reply["error"], "Job not found");
    }

    #[tokio::test]
    async fn test_malformed_requests() {
        let server = server();
        let reply = dispatch(&server, "m1", "not json").await;
        assert!(reply["error"].as_str().unwrap().starts_with("Parse error"));

        let reply = dispatch(&server, "m1", r#"{"id":4,"method":"mining.fly"}"#).await;
        assert_eq!(reply["error"], "Unknown method: mining.fly");

        let reply = dispatch(&server, "m1", r#"{"id":5,"method":"mining.submit","params":[]}"#).await;
        assert_eq!(reply["error"], "Missing parameter 1");
    }

    async fn send(ws: &mut Client, request: Value) {
        ws.send(Message::Text(request.to_string().into())).await.unwrap();
    }

    /// Reads frames until one matches `wanted`
    async fn read_until(ws: &mut Client, wanted: impl Fn(&Value) -> bool) -> Value {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    let value: Value = serde_json::from_str(text.as_str()).unwrap();
                    if wanted(&value) {
                        return value;
                    }
                }
                Some(Ok(_)) => {}
                other => panic!("connection ended: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_share_built_from_notify_is_accepted() {
        let server = Arc::new(StratumServer::new(
            PoolSettings {
                pool_difficulty: 0.0,
                pool_address: "GXCpool".to_string(),
                ..Default::default()
            },
            Arc::new(MemoryLedger::new(1_000_000.0)),
            Arc::new(OpenAuthenticator),
        ));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepting = server.clone();
        tokio::spawn(async move {
            let (stream, peer) = listener.accept().await.unwrap();
            handle_connection(accepting, stream, peer).await
        });
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}", addr))
            .await
            .unwrap();

        send(&mut ws, json!({"id": 1, "method": "mining.subscribe", "params": []})).await;
        let subscribed = read_until(&mut ws, |v| v["id"] == 1).await;
        let extra_nonce2_size = subscribed["result"][2].as_u64().unwrap() as usize;

        send(&mut ws, json!({"id": 2, "method": "mining.authorize", "params": ["worker", "x"]})).await;
        assert_eq!(read_until(&mut ws, |v| v["id"] == 2).await["result"], true);
        let notify = read_until(&mut ws, |v| v["method"] == "mining.notify").await;

        let params = &notify["params"];
        let field = |i: usize| params[i].as_str().unwrap().to_string();
        let job_id = field(0);
        let prefix = format!(
            "{}{}{}{}",
            field(1),
            field(2),
            params[3].as_i64().unwrap(),
            field(7)
        );
        let extra_nonce1 = field(6);
        let extra_nonce2 = format!("{:0width$x}", 7, width = extra_nonce2_size * 2);
        let nonce = (0..u64::MAX)
            .find(|n| {
                sha256d_hex(&format!("{}{}{}{}", prefix, n, extra_nonce1, extra_nonce2))
                    .starts_with("0000")
            })
            .unwrap();

        send(
            &mut ws,
            json!({
                "id": 3,
                "method": "mining.submit",
                "params": ["worker", job_id, extra_nonce2, params[3].to_string(), format!("{:x}", nonce)]
            }),
        )
        .await;
        let submitted = read_until(&mut ws, |v| v["id"] == 3).await;
        assert_eq!(submitted["result"], true);
        assert!(submitted["error"].is_null());
        assert_eq!(server.stats().shares_accepted, 1);
    }
}
