use uav_protocol::{Command, Frame, HeartBeat, decode, encode, split_frames};

fn headers(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[test]
fn encode_layout_without_body() {
    let wire = encode(
        &Command::Connect,
        &headers(&[("accept-version", "1.2,1.1,1.0"), ("heart-beat", "10000,10000")]),
        None,
    );
    assert_eq!(
        wire,
        "CONNECT\naccept-version:1.2,1.1,1.0\nheart-beat:10000,10000\n\n\0"
    );
}

#[test]
fn round_trip_preserves_command_headers_and_body() {
    let sent = headers(&[
        ("destination", "/topic/uav-telemetry/UAV-1"),
        ("message-id", "abc:def:1"),
        ("content-type", "application/json"),
    ]);
    let body = "{\"uavCode\":\"UAV-1\",\n\"lat\":31.2}";
    let frame = decode(&encode(&Command::Message, &sent, Some(body)));

    assert_eq!(frame.command(), &Command::Message);
    assert_eq!(frame.headers(), sent.as_slice());
    assert_eq!(frame.header("message-id"), Some("abc:def:1"));
    assert_eq!(frame.body(), body);
}

#[test]
fn round_trip_through_builder() {
    let frame = Frame::subscribe("sub-3", "/topic/uav-telemetry/UAV-9");
    let decoded = decode(&frame.encode());
    assert_eq!(decoded, frame);
    assert_eq!(decoded.header("ack"), Some("auto"));
}

#[test]
fn decode_without_blank_line_has_empty_body() {
    let frame = decode("ERROR\nmessage:broker down");
    assert_eq!(frame.command(), &Command::Error);
    assert_eq!(frame.header("message"), Some("broker down"));
    assert_eq!(frame.body(), "");
}

#[test]
fn decode_ignores_everything_after_nul() {
    let frame = decode("CONNECTED\nversion:1.2\n\n\0MESSAGE\n\nbody\0");
    assert_eq!(frame.command(), &Command::Connected);
    assert_eq!(frame.header("version"), Some("1.2"));
    assert_eq!(frame.body(), "");
}

#[test]
fn decode_malformed_input_yields_empty_command() {
    let frame = decode("");
    assert_eq!(frame.command(), &Command::Other(String::new()));
    assert!(frame.headers().is_empty());

    let frame = decode("\nkey:value\n\n");
    assert_eq!(frame.command(), &Command::Other(String::new()));
}

#[test]
fn decode_keeps_first_repeated_header() {
    let frame = decode("MESSAGE\ndestination:/a\ndestination:/b\n\n{}");
    assert_eq!(frame.header("destination"), Some("/a"));
    assert_eq!(frame.headers().len(), 1);
}

#[test]
fn builder_header_replaces_existing_name() {
    let frame = Frame::new(Command::Subscribe)
        .with_header("id", "1")
        .with_header("id", "2");
    assert_eq!(frame.headers().len(), 1);
    assert_eq!(frame.header("id"), Some("2"));
}

#[test]
fn split_frames_drops_heartbeats() {
    let chunk = "\nMESSAGE\n\n{\"uavCode\":\"A\"}\0\n\nMESSAGE\n\n{\"uavCode\":\"B\"}\0\n";
    let frames = split_frames(chunk);
    assert_eq!(frames.len(), 2);
    assert_eq!(decode(frames[0]).body(), "{\"uavCode\":\"A\"}");
    assert_eq!(decode(frames[1]).body(), "{\"uavCode\":\"B\"}");

    assert!(split_frames("\n").is_empty());
}

#[test]
fn heart_beat_parses_and_formats() {
    let heart_beat: HeartBeat = "0, 4000".parse().expect("heart-beat");
    assert_eq!(heart_beat, HeartBeat::new(0, 4000));
    assert_eq!(heart_beat.to_string(), "0,4000");
    assert!("4000".parse::<HeartBeat>().is_err());
}

#[test]
fn heart_beat_outgoing_interval_negotiation() {
    let client = HeartBeat::new(10000, 10000);
    assert_eq!(client.outgoing_interval(&HeartBeat::new(0, 5000)), Some(10000));
    assert_eq!(client.outgoing_interval(&HeartBeat::new(0, 20000)), Some(20000));
    assert_eq!(client.outgoing_interval(&HeartBeat::new(5000, 0)), None);
    assert_eq!(HeartBeat::new(0, 10000).outgoing_interval(&HeartBeat::new(0, 5000)), None);
}
