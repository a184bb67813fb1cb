//! Throughput checks for the codec and the broadcast path
//!
//! Each test prints its timing and asserts a generous upper bound so it only
//! fails on a real regression.

use server::router::Router;
use server::session_registry::{ConnectionHandle, SessionRegistry};
use shared::{decode, encode, ClientState, InboundMessage, OutboundMessage, Position};
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

fn test_addr() -> SocketAddr {
    "127.0.0.1:3001".parse().unwrap()
}

/// Benchmarks decoding of inbound frames
#[test]
fn benchmark_inbound_decoding() {
    let frames = [
        r#"{"type":"position_update","position":{"x":12.5,"y":-40.25}}"#,
        r#"{"type":"chat_message","message":"hello everyone, how is it going?"}"#,
        r#"{"type":"emote","name":"wave"}"#,
    ];
    let iterations = 30_000;
    let start = Instant::now();

    for i in 0..iterations {
        let message = decode(frames[i % frames.len()]).unwrap();
        assert!(!message.message_type().is_empty());
    }

    let duration = start.elapsed();
    println!(
        "Inbound decoding: {} frames in {:?} ({:.2} μs/frame)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 5 seconds
    assert!(duration.as_millis() < 5000);
}

/// Benchmarks encoding of a large initial state
#[test]
fn benchmark_initial_state_encoding() {
    let states: Vec<ClientState> = (1..=500)
        .map(|n| ClientState {
            id: format!("client_{}", n),
            position: Position::new(n as f64 * 1.5, n as f64 * -0.5),
        })
        .collect();
    let message = OutboundMessage::InitialState { states };

    let iterations = 500;
    let start = Instant::now();
    let mut total_bytes = 0;

    for _ in 0..iterations {
        total_bytes += encode(&message).unwrap().len();
    }

    let duration = start.elapsed();
    println!(
        "Initial state encoding: {} x 500 clients in {:?} ({} bytes total)",
        iterations, duration, total_bytes
    );

    assert!(duration.as_millis() < 5000);
}

/// Benchmarks router fan-out to many in-memory connections
#[test]
fn benchmark_broadcast_fanout() {
    let clients = 200;
    let broadcasts = 100;

    let router = Router::new(None);
    let mut registry = SessionRegistry::new();
    let mut receivers = Vec::new();
    let mut ids = Vec::new();

    for _ in 0..clients {
        let (tx, rx) = mpsc::channel::<Message>(broadcasts + 2);
        receivers.push(rx);
        ids.push(
            router
                .admit(&mut registry, ConnectionHandle::new(test_addr(), tx))
                .unwrap(),
        );
    }

    let start = Instant::now();
    let mut delivered = 0;

    for i in 0..broadcasts {
        let sender = ids[i % ids.len()];
        delivered += router.handle_inbound(
            &mut registry,
            &sender,
            InboundMessage::PositionUpdate {
                position: Position::new(i as f64, i as f64),
            },
        );
    }

    let duration = start.elapsed();
    println!(
        "Broadcast fan-out: {} broadcasts to {} clients in {:?} ({:.2} μs/broadcast)",
        broadcasts,
        clients,
        duration,
        duration.as_micros() as f64 / broadcasts as f64
    );

    assert_eq!(delivered, clients * broadcasts);
    for rx in &mut receivers {
        let mut count = 0;
        while rx.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, broadcasts + 2);
    }
    assert!(duration.as_millis() < 5000);
}

/// Benchmarks broadcast when most recipients are backed up
#[test]
fn benchmark_broadcast_with_slow_consumers() {
    let clients = 100;
    let router = Router::new(None);
    let mut registry = SessionRegistry::new();
    let mut receivers = Vec::new();
    let mut ids = Vec::new();

    for _ in 0..clients {
        // Room for admission plus one broadcast
        let (tx, rx) = mpsc::channel::<Message>(3);
        receivers.push(rx);
        ids.push(
            router
                .admit(&mut registry, ConnectionHandle::new(test_addr(), tx))
                .unwrap(),
        );
    }

    let start = Instant::now();
    let mut delivered = 0;
    for i in 0..1000 {
        delivered += router.handle_inbound(
            &mut registry,
            &ids[0],
            InboundMessage::ChatMessage {
                text: format!("message {}", i),
            },
        );
    }
    let duration = start.elapsed();

    println!(
        "Saturated broadcast: 1000 broadcasts, {} delivered in {:?}",
        delivered, duration
    );

    // Only the first broadcast fits; the rest are dropped without blocking
    assert_eq!(delivered, clients);
    assert_eq!(registry.len(), clients);
    assert!(duration.as_millis() < 5000);
}
