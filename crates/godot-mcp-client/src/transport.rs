//! Pluggable transport for the upstream link.
//!
//! The connection manager only needs "open a link to this URL" and a
//! text-frame sink/stream pair back. [`WsConnector`] provides that over
//! tokio-tungstenite; tests substitute an in-memory connector.

use std::pin::Pin;

use futures_util::future::{self, BoxFuture};
use futures_util::stream::BoxStream;
use futures_util::{Sink, SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use crate::error::TransportError;

/// Write half of a link: accepts whole text frames.
pub type BoxSink = Pin<Box<dyn Sink<String, Error = TransportError> + Send>>;

/// An open upstream link.
pub struct Link {
    pub sink: BoxSink,
    /// Whole decoded text frames. Ends when the peer closes.
    pub stream: BoxStream<'static, Result<String, TransportError>>,
}

/// Opens upstream links.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<Link, TransportError>>;
}

/// WebSocket connector.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<Link, TransportError>> {
        let url = url.to_string();
        Box::pin(async move {
            let (ws, _response) = tokio_tungstenite::connect_async(url).await?;
            let (sink, stream) = ws.split();

            let sink = sink.with(|text: String| {
                future::ready(Ok::<_, TransportError>(Message::Text(text.into())))
            });

            // Control frames are answered by tungstenite; only payloads go up.
            let stream = stream.filter_map(|msg| {
                future::ready(match msg {
                    Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                    Ok(Message::Binary(bytes)) => {
                        Some(Ok(String::from_utf8_lossy(&bytes).into_owned()))
                    }
                    Ok(_) => None,
                    Err(e) => Some(Err(TransportError::from(e))),
                })
            });

            Ok::<_, TransportError>(Link {
                sink: Box::pin(sink),
                stream: stream.boxed(),
            })
        })
    }
}
