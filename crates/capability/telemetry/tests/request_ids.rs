use uav_telemetry::{metrics, new_request_ids, record_frame_received, record_subscriptions_sent};

#[test]
fn request_ids_non_empty() {
    let ids = new_request_ids();
    assert!(!ids.request_id.is_empty());
    assert!(!ids.trace_id.is_empty());
    assert_ne!(ids.request_id, ids.trace_id);
}

#[test]
fn counters_accumulate() {
    let before = metrics().snapshot();
    record_frame_received();
    record_subscriptions_sent(3);
    let after = metrics().snapshot();
    assert!(after.frames_received > before.frames_received);
    assert!(after.subscriptions_sent >= before.subscriptions_sent + 3);
}
