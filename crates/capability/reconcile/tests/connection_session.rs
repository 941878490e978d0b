use domain::DeviceStatus;
use std::sync::Arc;
use uav_ingest::{
    ConnectionConfig, ConnectionManager, Connector, ManagerEvent, TransportError, TransportEvent,
    TransportEvents, TransportHandle,
};
use uav_reconcile::Reconciler;

struct NullHandle;

impl TransportHandle for NullHandle {
    fn send(&mut self, _text: String) -> Result<(), TransportError> {
        Ok(())
    }

    fn close(&mut self) {}
}

struct NullConnector;

impl Connector for NullConnector {
    fn open(
        &self,
        _url: &str,
        _events: TransportEvents,
    ) -> Result<Box<dyn TransportHandle>, TransportError> {
        Ok(Box::new(NullHandle))
    }
}

fn text(generation: u64, chunk: &str) -> ManagerEvent {
    ManagerEvent::Transport {
        generation,
        event: TransportEvent::Text(chunk.to_string()),
    }
}

fn online_session(reconciler: Arc<Reconciler>) -> ConnectionManager {
    let config = ConnectionConfig::new("ws://localhost:8080/ws/uav-telemetry", "/topic/uav-telemetry");
    let (mut manager, _events) = ConnectionManager::new(config, Arc::new(NullConnector), reconciler);
    manager.activate();
    let generation = manager.generation();
    manager.handle_event(ManagerEvent::Transport {
        generation,
        event: TransportEvent::Opened,
    });
    manager.handle_event(text(generation, "CONNECTED\nversion:1.2\n\n\0"));
    manager.handle_event(text(
        generation,
        "MESSAGE\ndestination:/topic/uav-telemetry\n\n{\"uavCode\":\"U\",\"status\":\"ONLINE\",\"lat\":1,\"lng\":2,\"batteryPercent\":90}\0",
    ));
    manager
}

#[tokio::test]
async fn manager_deactivate_marks_devices_disconnected() {
    let reconciler = Arc::new(Reconciler::new());
    let mut manager = online_session(reconciler.clone());
    assert_eq!(reconciler.classify("U"), DeviceStatus::Online);

    manager.deactivate();

    assert!(!reconciler.is_connected());
    assert_eq!(reconciler.classify("U"), DeviceStatus::Disconnected);
    assert!(reconciler.record("U").is_some());
}

#[tokio::test]
async fn handle_deactivate_marks_devices_disconnected_before_returning() {
    let reconciler = Arc::new(Reconciler::new());
    let mut manager = online_session(reconciler.clone());
    let handle = manager.handle();

    handle.deactivate();
    assert_eq!(reconciler.classify("U"), DeviceStatus::Disconnected);

    let generation = manager.generation();
    manager.handle_event(text(generation, "CONNECTED\nversion:1.2\n\n\0"));
    assert!(!reconciler.is_connected());
    assert_eq!(reconciler.classify("U"), DeviceStatus::Disconnected);
}
