use ev_bridge_core::BindingTransport;
use ev_bridge_sdk::{channel, Event, SpecVersion};
use serde_json::json;
use std::sync::{Arc, Once};
use tracing::Level;

static INIT_TRACING: Once = Once::new();

pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_target(false)
            .without_time()
            .try_init();
    });
}

/// Minimal well-formed event used across the integration tests.
pub fn sample_event(id: &str) -> Event {
    let mut event = Event::new(SpecVersion::V10);
    event.context.set_event_type("com.example.test").unwrap();
    event.context.set_source("urn:test").unwrap();
    event.context.set_id(id).unwrap();
    event.set_data(json!({"id": 1, "message": "hi"}));
    event
}

/// Transport whose sender feeds its own receiver through an in-process
/// channel. Everything sent comes back on the receive loop.
pub fn loopback_transport(capacity: usize) -> BindingTransport {
    let (tx, rx) = channel(capacity);
    BindingTransport::new(Arc::new(tx), Arc::new(rx))
}
