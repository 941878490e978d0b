use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use uav_ingest::{
    Connector, ManagerEvent, TransportEvent, TransportEvents, TransportHandle, WsConnector,
};

const WAIT: Duration = Duration::from_secs(5);

async fn loopback() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    (listener, format!("ws://{addr}/ws/uav-telemetry"))
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<ManagerEvent>) -> Option<TransportEvent> {
    let event = timeout(WAIT, events.recv()).await.expect("event in time")?;
    match event {
        ManagerEvent::Transport { generation, event } => {
            assert_eq!(generation, 7);
            Some(event)
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn buffered_send_text_and_server_close() {
    let (listener, url) = loopback().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut socket = tokio_tungstenite::accept_async(stream).await.expect("handshake");
        let first = socket.next().await.expect("frame").expect("message");
        socket
            .send(Message::text("CONNECTED\nversion:1.2\n\n\0"))
            .await
            .expect("send");
        socket.close(None).await.expect("close");
        first
    });

    let (sender, mut events) = mpsc::unbounded_channel();
    let mut handle = WsConnector
        .open(&url, TransportEvents::new(7, sender))
        .expect("open");
    handle
        .send("CONNECT\naccept-version:1.2\n\n\0".to_string())
        .expect("buffered send");

    assert_eq!(next_event(&mut events).await, Some(TransportEvent::Opened));
    assert_eq!(
        next_event(&mut events).await,
        Some(TransportEvent::Text("CONNECTED\nversion:1.2\n\n\0".to_string()))
    );
    assert_eq!(next_event(&mut events).await, Some(TransportEvent::Closed));
    // 会话任务退出后事件出口被释放
    assert_eq!(next_event(&mut events).await, None);

    let first = server.await.expect("server");
    assert_eq!(first, Message::text("CONNECT\naccept-version:1.2\n\n\0"));
}

#[tokio::test]
async fn handle_close_ends_session_without_event() {
    let (listener, url) = loopback().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut socket = tokio_tungstenite::accept_async(stream).await.expect("handshake");
        socket.next().await
    });

    let (sender, mut events) = mpsc::unbounded_channel();
    let mut handle = WsConnector
        .open(&url, TransportEvents::new(7, sender))
        .expect("open");
    assert_eq!(next_event(&mut events).await, Some(TransportEvent::Opened));

    handle.close();
    assert_eq!(next_event(&mut events).await, None);
    assert!(handle.send("late".to_string()).is_err());

    let received = timeout(WAIT, server).await.expect("server in time").expect("server");
    assert!(matches!(received, Some(Ok(Message::Close(_))) | None));
}

#[tokio::test]
async fn refused_connection_reports_error() {
    let (listener, url) = loopback().await;
    drop(listener);

    let (sender, mut events) = mpsc::unbounded_channel();
    let _handle = WsConnector
        .open(&url, TransportEvents::new(7, sender))
        .expect("open");
    assert!(matches!(next_event(&mut events).await, Some(TransportEvent::Error(_))));
}

#[tokio::test]
async fn invalid_url_is_rejected_up_front() {
    let (sender, _events) = mpsc::unbounded_channel();
    let result = WsConnector.open("not a url", TransportEvents::new(7, sender));
    assert!(result.is_err());
}
