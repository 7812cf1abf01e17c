#![allow(clippy::unwrap_used)]
// Integration tests for `MqttSession` against a minimal in-process broker.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use homeai_api::MqttSession;
use homeai_api::mqtt::{BrokerAddress, BrokerOptions, DEFAULT_FILTERS};

// ── Helpers ─────────────────────────────────────────────────────────

/// Read one control packet as (fixed header byte, body).
async fn read_packet(stream: &mut TcpStream) -> (u8, Vec<u8>) {
    let header = stream.read_u8().await.unwrap();
    let mut len = 0usize;
    let mut shift = 0;
    loop {
        let byte = stream.read_u8().await.unwrap();
        len |= usize::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
    }
    let mut body = vec![0; len];
    stream.read_exact(&mut body).await.unwrap();
    (header, body)
}

/// Topic filters carried in a SUBSCRIBE body.
fn subscribed_filters(body: &[u8]) -> Vec<String> {
    let mut filters = Vec::new();
    let mut rest = &body[2..]; // packet id
    while rest.len() >= 2 {
        let len = usize::from(u16::from_be_bytes([rest[0], rest[1]]));
        filters.push(String::from_utf8(rest[2..2 + len].to_vec()).unwrap());
        rest = &rest[2 + len + 1..]; // requested QoS
    }
    filters
}

fn retained_publish(topic: &str, payload: &[u8]) -> Vec<u8> {
    let remaining = 2 + topic.len() + payload.len();
    let mut packet = vec![0x31, u8::try_from(remaining).unwrap()];
    packet.extend_from_slice(&u16::try_from(topic.len()).unwrap().to_be_bytes());
    packet.extend_from_slice(topic.as_bytes());
    packet.extend_from_slice(payload);
    packet
}

/// Accept one client: CONNACK, wait for SUBSCRIBE, SUBACK, then replay one
/// retained publish. Reports the subscribed filters.
async fn spawn_broker(
    topic: &'static str,
    payload: &'static [u8],
) -> (u16, oneshot::Receiver<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let (header, _) = read_packet(&mut stream).await;
        assert_eq!(header >> 4, 1, "expected CONNECT");
        stream.write_all(&[0x20, 0x02, 0x00, 0x00]).await.unwrap();

        let body = loop {
            let (header, body) = read_packet(&mut stream).await;
            if header >> 4 == 8 {
                break body;
            }
        };
        let filters = subscribed_filters(&body);

        let mut suback = vec![0x90, u8::try_from(2 + filters.len()).unwrap(), body[0], body[1]];
        suback.extend(std::iter::repeat_n(0x00, filters.len()));
        stream.write_all(&suback).await.unwrap();
        stream.write_all(&retained_publish(topic, payload)).await.unwrap();
        let _ = tx.send(filters);

        // Hold the connection open until the client goes away.
        while stream.read_u8().await.is_ok() {}
    });

    (port, rx)
}

// ── Session ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_subscribes_and_delivers_retained_state() {
    let (port, subscribed) = spawn_broker("tele/porch/STATE", br#"{"POWER":"ON"}"#).await;
    let mut options = BrokerOptions::new(BrokerAddress {
        host: "127.0.0.1".into(),
        port,
    });
    options.connect_timeout = Duration::from_secs(5);

    let session = MqttSession::connect(options, &DEFAULT_FILTERS, CancellationToken::new())
        .await
        .unwrap();
    let mut rx = session.messages();

    let filters = tokio::time::timeout(Duration::from_secs(5), subscribed)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(filters, DEFAULT_FILTERS);

    let msg = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(msg.topic, "tele/porch/STATE");
    assert_eq!(msg.payload_str(), r#"{"POWER":"ON"}"#);
    assert!(session.is_connected());

    session.disconnect();
}
