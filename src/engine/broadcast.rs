//! Built-in fan-out engine.
//!
//! [`BroadcastEngine`] is the default [`SyncEngine`]: it relays every
//! frame to all other sessions in the room and folds well-formed JSON
//! update frames into a retained record map, so the room always has a
//! current document to snapshot. It deliberately implements no merge
//! algorithm; concurrent edits to the same record resolve last-writer-wins.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use super::{EngineFactory, Frame, SyncEngine};
use crate::domain::{DocumentState, SessionId};

/// Fan-out relay engine with a retained document.
#[derive(Debug)]
pub struct BroadcastEngine {
    inner: Mutex<EngineInner>,
}

#[derive(Debug)]
struct EngineInner {
    document: DocumentState,
    peers: HashMap<SessionId, mpsc::UnboundedSender<Frame>>,
}

impl BroadcastEngine {
    /// Creates an engine seeded with the given document.
    #[must_use]
    pub fn new(document: DocumentState) -> Self {
        Self {
            inner: Mutex::new(EngineInner {
                document,
                peers: HashMap::new(),
            }),
        }
    }
}

impl SyncEngine for BroadcastEngine {
    fn connect(&self, session_id: SessionId, outbound: mpsc::UnboundedSender<Frame>) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        inner.peers.insert(session_id, outbound);
    }

    fn disconnect(&self, session_id: SessionId) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        inner.peers.remove(&session_id);
    }

    fn handle_message(&self, from: SessionId, frame: Frame) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };

        if let Frame::Text(text) = &frame
            && let Ok(value) = serde_json::from_str::<serde_json::Value>(text)
        {
            apply_update(&mut inner.document, &value);
        }

        // Relay to everyone else; a closed receiver just means that
        // connection is tearing down and will disconnect shortly.
        for (peer, sender) in &inner.peers {
            if *peer != from {
                let _ = sender.send(frame.clone());
            }
        }
    }

    fn snapshot(&self) -> DocumentState {
        match self.inner.lock() {
            Ok(inner) => inner.document.clone(),
            Err(_) => DocumentState::empty(),
        }
    }

    fn active_sessions(&self) -> usize {
        match self.inner.lock() {
            Ok(inner) => inner.peers.len(),
            Err(_) => 0,
        }
    }
}

/// Folds one client frame into the retained document.
///
/// Recognized shapes:
/// - `{"type": "put", "records": {<id>: <record>, ...}}` upserts records.
/// - `{"type": "delete", "ids": [<id>, ...]}` removes records.
///
/// Anything else is relayed but leaves the document untouched.
fn apply_update(document: &mut DocumentState, value: &serde_json::Value) {
    let serde_json::Value::Object(map) = &mut document.data else {
        return;
    };

    match value.get("type").and_then(|t| t.as_str()) {
        Some("put") => {
            if let Some(records) = value.get("records").and_then(|r| r.as_object()) {
                for (id, record) in records {
                    map.insert(id.clone(), record.clone());
                }
            }
        }
        Some("delete") => {
            if let Some(ids) = value.get("ids").and_then(|i| i.as_array()) {
                for id in ids {
                    if let Some(id) = id.as_str() {
                        map.remove(id);
                    }
                }
            }
        }
        _ => {}
    }
}

/// Default factory producing [`BroadcastEngine`] instances.
#[derive(Debug, Default)]
pub struct BroadcastEngineFactory;

impl EngineFactory for BroadcastEngineFactory {
    fn create(&self, initial: Option<DocumentState>) -> Arc<dyn SyncEngine> {
        Arc::new(BroadcastEngine::new(
            initial.unwrap_or_else(DocumentState::empty),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn put_frame(id: &str, x: i64) -> Frame {
        Frame::Text(
            serde_json::json!({"type": "put", "records": {id: {"x": x}}}).to_string(),
        )
    }

    #[tokio::test]
    async fn relays_to_other_peers_only() {
        let engine = BroadcastEngine::new(DocumentState::empty());
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let a = SessionId::new();
        let b = SessionId::new();
        engine.connect(a, tx_a);
        engine.connect(b, tx_b);

        engine.handle_message(a, put_frame("shape:1", 5));

        let Some(frame) = rx_b.recv().await else {
            panic!("peer b should receive the frame");
        };
        assert!(matches!(frame, Frame::Text(_)));
        assert!(rx_a.try_recv().is_err(), "sender must not get an echo");
    }

    #[test]
    fn put_and_delete_mutate_snapshot() {
        let engine = BroadcastEngine::new(DocumentState::empty());
        let session = SessionId::new();

        engine.handle_message(session, put_frame("shape:1", 1));
        engine.handle_message(session, put_frame("shape:2", 2));
        let snapshot = engine.snapshot();
        let Some(records) = snapshot.data.as_object() else {
            panic!("document data must be an object");
        };
        assert_eq!(records.len(), 2);

        engine.handle_message(
            session,
            Frame::Text(serde_json::json!({"type": "delete", "ids": ["shape:1"]}).to_string()),
        );
        let snapshot = engine.snapshot();
        let Some(records) = snapshot.data.as_object() else {
            panic!("document data must be an object");
        };
        assert_eq!(records.len(), 1);
        assert!(records.contains_key("shape:2"));
    }

    #[test]
    fn malformed_frames_leave_document_untouched() {
        let engine = BroadcastEngine::new(DocumentState::empty());
        let session = SessionId::new();

        engine.handle_message(session, Frame::Text("not json".to_string()));
        engine.handle_message(session, Frame::Binary(vec![0xde, 0xad]));

        assert!(engine.snapshot().is_empty());
    }

    #[test]
    fn disconnect_drops_peer_from_count() {
        let engine = BroadcastEngine::new(DocumentState::empty());
        let (tx, _rx) = mpsc::unbounded_channel();
        let session = SessionId::new();
        engine.connect(session, tx);
        assert_eq!(engine.active_sessions(), 1);
        engine.disconnect(session);
        assert_eq!(engine.active_sessions(), 0);
    }

    #[test]
    fn factory_seeds_from_snapshot() {
        let factory = BroadcastEngineFactory;
        let initial = DocumentState {
            schema_version: 1,
            data: serde_json::json!({"shape:9": {"x": 9}}),
        };
        let engine = factory.create(Some(initial.clone()));
        assert_eq!(engine.snapshot(), initial);

        let empty = factory.create(None);
        assert!(empty.snapshot().is_empty());
    }
}
