//! WebSocket 传输实现（tokio-tungstenite）
//!
//! 每次会话启动一个后台任务：建立连接后上报 `Opened`，随后在同一任务中
//! 收发文本帧。句柄关闭时丢弃发送端，任务发送 Close 后退出。

use crate::error::TransportError;
use crate::transport::{Connector, TransportEvent, TransportEvents, TransportHandle};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tracing::{debug, warn};

/// 生产环境使用的 WebSocket 连接器。
#[derive(Debug, Default, Clone)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn open(
        &self,
        url: &str,
        events: TransportEvents,
    ) -> Result<Box<dyn TransportHandle>, TransportError> {
        let request = url
            .into_client_request()
            .map_err(|err| TransportError::InvalidUrl(format!("{url}: {err}")))?;
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_socket(request, events, outbound_rx));
        Ok(Box::new(WsTransport {
            outbound: Some(outbound),
        }))
    }
}

struct WsTransport {
    outbound: Option<mpsc::UnboundedSender<String>>,
}

impl TransportHandle for WsTransport {
    fn send(&mut self, text: String) -> Result<(), TransportError> {
        let sender = self.outbound.as_ref().ok_or(TransportError::Closed)?;
        sender.send(text).map_err(|_| TransportError::Closed)
    }

    fn close(&mut self) {
        self.outbound.take();
    }
}

async fn run_socket(
    request: Request,
    events: TransportEvents,
    mut outbound: mpsc::UnboundedReceiver<String>,
) {
    let generation = events.generation();
    let connect = tokio_tungstenite::connect_async(request);
    tokio::pin!(connect);

    // 握手期间到达的发送请求先缓存；发送端被丢弃说明会话已被放弃。
    let mut pending = Vec::new();
    let stream = loop {
        tokio::select! {
            result = &mut connect => match result {
                Ok((stream, _response)) => break stream,
                Err(err) => {
                    events.emit(TransportEvent::Error(err.to_string()));
                    return;
                }
            },
            message = outbound.recv() => match message {
                Some(text) => pending.push(text),
                None => {
                    debug!(target: "uav.ingest", generation, "transport_abandoned_while_connecting");
                    return;
                }
            },
        }
    };

    if !events.emit(TransportEvent::Opened) {
        return;
    }
    let (mut sink, mut source) = stream.split();
    for text in pending {
        if let Err(err) = sink.send(Message::text(text)).await {
            events.emit(TransportEvent::Error(err.to_string()));
            return;
        }
    }

    loop {
        tokio::select! {
            message = outbound.recv() => match message {
                Some(text) => {
                    if let Err(err) = sink.send(Message::text(text)).await {
                        events.emit(TransportEvent::Error(err.to_string()));
                        return;
                    }
                }
                None => {
                    if let Err(err) = sink.close().await {
                        debug!(target: "uav.ingest", generation, error = %err, "websocket_close_failed");
                    }
                    return;
                }
            },
            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    events.emit(TransportEvent::Text(text.as_str().to_owned()));
                }
                Some(Ok(Message::Binary(data))) => {
                    events.emit(TransportEvent::Text(String::from_utf8_lossy(&data).into_owned()));
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(target: "uav.ingest", generation, close_frame = ?frame, "websocket_close_received");
                    events.emit(TransportEvent::Closed);
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(target: "uav.ingest", generation, error = %err, "websocket_read_failed");
                    events.emit(TransportEvent::Error(err.to_string()));
                    return;
                }
                None => {
                    events.emit(TransportEvent::Closed);
                    return;
                }
            },
        }
    }
}
