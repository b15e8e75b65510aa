mod common;

use common::{init_tracing, loopback_transport, sample_event};
use ev_bridge_core::{BindingTransport, Encoding, EncodingSender};
use ev_bridge_error::transport::TransportError;
use ev_bridge_error::{EvError, TransportResult};
use ev_bridge_sdk::{channel, Converter, Event, Message, Receiver, Sender, SpecVersion, JSON};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn receive_loop_decodes_and_stops_on_cancel() {
    init_tracing();
    let transport = loopback_transport(8);
    let cancel = CancellationToken::new();
    transport
        .send(&cancel, sample_event("1").into())
        .await
        .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let loop_cancel = cancel.clone();
    let result = transport
        .start_receiver(cancel.clone(), move |event| {
            sink.lock().unwrap().push(event);
            loop_cancel.cancel();
            Ok(())
        })
        .await;
    assert!(result.unwrap_err().is_cancellation());

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].context.id().as_deref(), Some("1"));
}

#[tokio::test]
async fn second_receive_loop_is_rejected() {
    init_tracing();
    let transport = Arc::new(loopback_transport(1));
    let cancel = CancellationToken::new();

    let bg = transport.clone();
    let bg_cancel = cancel.clone();
    let task = tokio::spawn(async move { bg.start_receiver(bg_cancel, |_event| Ok(())).await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = transport
        .start_receiver(cancel.clone(), |_event| Ok(()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EvError::Transport(TransportError::AlreadyReceiving)
    ));

    cancel.cancel();
    assert!(task.await.unwrap().unwrap_err().is_cancellation());
}

#[tokio::test]
async fn undecodable_messages_are_dropped_without_stopping_the_loop() {
    init_tracing();
    let transport = loopback_transport(8);
    let cancel = CancellationToken::new();

    let garbage = Message::Structured {
        format: &JSON,
        bytes: bytes::Bytes::from_static(b"not json"),
    };
    transport.send(&cancel, garbage).await.unwrap();
    transport
        .send(&cancel, sample_event("2").into())
        .await
        .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let loop_cancel = cancel.clone();
    let result = transport
        .start_receiver(cancel.clone(), move |event| {
            sink.lock().unwrap().push(event);
            loop_cancel.cancel();
            Ok(())
        })
        .await;
    assert!(result.unwrap_err().is_cancellation());

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].context.id().as_deref(), Some("2"));
}

struct FixedConverter;

#[async_trait::async_trait]
impl Converter for FixedConverter {
    async fn convert(&self, _message: Message) -> TransportResult<Event> {
        Ok(sample_event("converted"))
    }
}

#[tokio::test]
async fn converter_salvages_undecodable_messages() {
    init_tracing();
    let (tx, rx) = channel(4);
    let transport = BindingTransport::new(Arc::new(tx), Arc::new(rx))
        .with_converter(Arc::new(FixedConverter));
    assert!(transport.has_converter());
    let cancel = CancellationToken::new();

    let garbage = Message::Structured {
        format: &JSON,
        bytes: bytes::Bytes::from_static(b"not json"),
    };
    transport.send(&cancel, garbage).await.unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let loop_cancel = cancel.clone();
    let result = transport
        .start_receiver(cancel.clone(), move |event| {
            sink.lock().unwrap().push(event);
            loop_cancel.cancel();
            Ok(())
        })
        .await;
    assert!(result.unwrap_err().is_cancellation());

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].context.id().as_deref(), Some("converted"));
}

fn legacy_event() -> Event {
    let mut event = Event::new(SpecVersion::V01);
    event.context.set_event_type("com.example.test").unwrap();
    event.context.set_source("urn:test").unwrap();
    event.context.set_id("legacy").unwrap();
    event
}

#[tokio::test]
async fn encoding_sender_forces_structured_v10_on_the_wire() {
    init_tracing();
    let (tx, rx) = channel(4);
    let sender = EncodingSender::new(Arc::new(tx), Encoding::StructuredV10);
    let cancel = CancellationToken::new();

    sender.send(&cancel, legacy_event().into()).await.unwrap();
    match rx.receive(&cancel).await.unwrap() {
        Message::Structured { bytes, .. } => {
            let blob: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(blob["specversion"], serde_json::json!("1.0"));
            assert_eq!(blob["type"], serde_json::json!("com.example.test"));
        }
        other => panic!("unexpected representation: {}", other.representation()),
    }
}

#[tokio::test]
async fn encoding_sender_forces_binary_v03_on_the_wire() {
    init_tracing();
    let (tx, rx) = channel(4);
    let sender = EncodingSender::new(Arc::new(tx), Encoding::BinaryV03);
    let cancel = CancellationToken::new();

    sender.send(&cancel, legacy_event().into()).await.unwrap();
    match rx.receive(&cancel).await.unwrap() {
        Message::Binary(record) => {
            assert_eq!(record.version(), SpecVersion::V03);
            assert!(record
                .attributes()
                .iter()
                .all(|(attr, _)| attr.version() == SpecVersion::V03));
        }
        other => panic!("unexpected representation: {}", other.representation()),
    }
}
