//! Translation between MCP requests and editor commands.
//!
//! `initialize`, `ping` and `tools/list` are answered locally. `tools/call`
//! becomes an editor command named after the tool, and the editor's result
//! comes back as a single text content item.
//!
//! All state lives in one [`Bridge`] driven by [`Bridge::run`]: downstream
//! lines, upstream events and completed tool calls are handled one at a
//! time from a single `select!` loop.

use std::future::Future;

use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use godot_mcp_client::ConnectionManager;
use godot_mcp_core::catalog::{self, ToolDescriptor};
use godot_mcp_core::{
    codes, decode_request, encode_response, JsonRpcRequest, JsonRpcResponse, UpstreamResult,
    MCP_PROTOCOL_VERSION,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::oneshot;

use crate::config::BridgeConfig;
use crate::error::BridgeError;

const INITIALIZE: &str = "initialize";
const PING: &str = "ping";
const TOOLS_LIST: &str = "tools/list";
const TOOLS_CALL: &str = "tools/call";

/// What to do with one downstream line.
#[derive(Debug)]
pub enum Dispatch {
    /// Answer now.
    Reply(JsonRpcResponse),
    /// Answer once the editor replies, if ever.
    Pending(PendingReply),
    /// Notification; nothing to send back.
    Silent,
}

/// A forwarded `tools/call` waiting on its editor result.
#[derive(Debug)]
pub struct PendingReply {
    id: Value,
    tool: String,
    rx: oneshot::Receiver<UpstreamResult>,
}

impl PendingReply {
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Wait for the editor and build the downstream reply.
    ///
    /// Never completes if the command was lost with its connection. Yields
    /// `None` if the connection manager was dropped first.
    pub async fn into_response(self) -> Option<JsonRpcResponse> {
        match self.rx.await {
            Ok(result) => Some(translate_result(self.id, result)),
            Err(_) => {
                tracing::debug!(id = %self.id, tool = %self.tool, "tool call abandoned");
                None
            }
        }
    }
}

/// Map an editor result to the `tools/call` reply for `id`.
pub fn translate_result(id: Value, result: UpstreamResult) -> JsonRpcResponse {
    match result.into_outcome() {
        Ok(data) => {
            let text = serde_json::to_string_pretty(&data).unwrap_or_else(|_| data.to_string());
            JsonRpcResponse::success(
                id,
                json!({
                    "content": [
                        { "type": "text", "text": text }
                    ]
                }),
            )
        }
        Err(e) => JsonRpcResponse::error(id, e.code, e.message),
    }
}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

pub struct Bridge {
    upstream: ConnectionManager,
    tools: Vec<ToolDescriptor>,
    server_name: String,
    server_version: String,
}

impl Bridge {
    pub fn new(config: &BridgeConfig, upstream: ConnectionManager) -> Self {
        Self {
            upstream,
            tools: config.tools(),
            server_name: config.server_name.clone(),
            server_version: config.server_version.clone(),
        }
    }

    pub fn upstream(&self) -> &ConnectionManager {
        &self.upstream
    }

    /// Decode and handle one downstream line.
    pub fn dispatch(&mut self, line: &str) -> Dispatch {
        tracing::debug!(line, "downstream message");
        match decode_request(line) {
            Ok(request) => self.handle_request(request),
            Err(e) => {
                tracing::warn!(error = %e, "rejecting downstream message");
                e.into_response().map_or(Dispatch::Silent, Dispatch::Reply)
            }
        }
    }

    fn handle_request(&mut self, request: JsonRpcRequest) -> Dispatch {
        let notification = request.is_notification();
        let id = request.reply_id();
        tracing::debug!(method = %request.method, %id, notification, "handling request");

        let reply = match request.method.as_str() {
            INITIALIZE => JsonRpcResponse::success(id, self.initialize_result()),
            PING => JsonRpcResponse::success(id, json!({})),
            TOOLS_LIST => JsonRpcResponse::success(id, catalog::list_result(&self.tools)),
            TOOLS_CALL => return self.call_tool(id, notification, request.params),
            other => JsonRpcResponse::error(
                id,
                codes::METHOD_NOT_FOUND,
                format!("Unknown method: {other}"),
            ),
        };

        if notification {
            return Dispatch::Silent;
        }
        Dispatch::Reply(reply)
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {
                "tools": {},
                "resources": {}
            },
            "serverInfo": {
                "name": self.server_name,
                "version": self.server_version
            }
        })
    }

    fn call_tool(&mut self, id: Value, notification: bool, params: Option<Value>) -> Dispatch {
        let params = match params.map(serde_json::from_value::<ToolCallParams>) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return self.reject_call(id, notification, format!("Invalid tool call: {e}"));
            }
            None => {
                return self.reject_call(id, notification, "Missing tool call params".to_string());
            }
        };
        let arguments = params.arguments.unwrap_or_else(|| json!({}));

        if notification {
            tracing::info!(tool = %params.name, "forwarding tool call notification");
            self.upstream.send(&params.name, arguments, None);
            return Dispatch::Silent;
        }

        let (tx, rx) = oneshot::channel();
        let command_id = self.upstream.send(&params.name, arguments, Some(tx));
        tracing::info!(
            tool = %params.name,
            %id,
            command_id = command_id.as_ref().map(|c| c.as_str()),
            "forwarding tool call"
        );
        Dispatch::Pending(PendingReply {
            id,
            tool: params.name,
            rx,
        })
    }

    fn reject_call(&self, id: Value, notification: bool, message: String) -> Dispatch {
        tracing::warn!(%id, %message, "rejecting tool call");
        if notification {
            return Dispatch::Silent;
        }
        Dispatch::Reply(JsonRpcResponse::error(id, codes::INVALID_PARAMS, message))
    }

    /// Serve `input` until it closes or `shutdown` resolves.
    ///
    /// Starts the upstream connection first and closes it on the way out.
    /// Tool calls still waiting on the editor at that point get no reply.
    pub async fn run<R, W, S>(
        mut self,
        input: R,
        mut output: W,
        shutdown: S,
    ) -> Result<(), BridgeError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        S: Future<Output = ()>,
    {
        let mut lines = input.lines();
        let mut replies: FuturesUnordered<BoxFuture<'static, Option<JsonRpcResponse>>> =
            FuturesUnordered::new();
        tokio::pin!(shutdown);

        tracing::info!(url = %self.upstream.url(), "bridge starting");
        self.upstream.start();

        let outcome = loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutting down");
                    break Ok(());
                }
                line = lines.next_line() => match line {
                    Ok(Some(line)) => match self.dispatch(&line) {
                        Dispatch::Reply(reply) => {
                            if let Err(e) = write_reply(&mut output, &reply).await {
                                break Err(e);
                            }
                        }
                        Dispatch::Pending(pending) => replies.push(pending.into_response().boxed()),
                        Dispatch::Silent => {}
                    },
                    Ok(None) => {
                        tracing::info!("client closed input");
                        break Ok(());
                    }
                    Err(e) => break Err(BridgeError::Read(e)),
                },
                event = self.upstream.next_event() => self.upstream.handle_event(event),
                Some(reply) = replies.next(), if !replies.is_empty() => {
                    if let Some(reply) = reply {
                        if let Err(e) = write_reply(&mut output, &reply).await {
                            break Err(e);
                        }
                    }
                }
            }
        };

        if !replies.is_empty() {
            tracing::info!(unanswered = replies.len(), "dropping unanswered tool calls");
        }
        self.upstream.shutdown();
        outcome
    }
}

async fn write_reply<W>(output: &mut W, reply: &JsonRpcResponse) -> Result<(), BridgeError>
where
    W: AsyncWrite + Unpin,
{
    let mut line = encode_response(reply)?;
    line.push('\n');
    output
        .write_all(line.as_bytes())
        .await
        .map_err(BridgeError::Write)?;
    output.flush().await.map_err(BridgeError::Write)?;
    tracing::debug!(id = %reply.id, error = reply.is_error(), "reply sent");
    Ok(())
}
