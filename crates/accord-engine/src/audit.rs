use std::sync::Arc;

use tracing::info;

use accord_types::events::RoomEvent;

/// Receives a copy of every recorded room event. Optional collaborator:
/// correctness never depends on it, and sink failures stay internal.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &RoomEvent);
}

/// Cheap cloneable handle; a disabled handle drops events.
#[derive(Clone)]
pub struct AuditHandle {
    sink: Option<Arc<dyn AuditSink>>,
}

impl AuditHandle {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink: Some(sink) }
    }

    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn record(&self, event: &RoomEvent) {
        if let Some(sink) = &self.sink {
            sink.record(event);
        }
    }
}

/// Emits room events to the tracing pipeline as JSON lines.
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn record(&self, event: &RoomEvent) {
        match serde_json::to_string(event) {
            Ok(json) => info!(target: "accord::audit", room = %event.room_id(), "{}", json),
            Err(e) => info!(
                target: "accord::audit",
                room = %event.room_id(),
                "event not serializable: {} ({:?})",
                e,
                event
            ),
        }
    }
}

/// Test sink that keeps every event for assertions.
#[cfg(test)]
pub struct RecordingSink(pub std::sync::Mutex<Vec<RoomEvent>>);

#[cfg(test)]
impl RecordingSink {
    pub fn new() -> Self {
        Self(std::sync::Mutex::new(Vec::new()))
    }
}

#[cfg(test)]
impl AuditSink for RecordingSink {
    fn record(&self, event: &RoomEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}
