//! Remote Debugger
//!
//! Streams notifications to a WebSocket observer that renders the live graph.
//!
//! # Transport
//!
//! The engine is single-threaded and must never wait on the observer, so the
//! debugger owns a worker thread running a current-thread `tokio` runtime.
//! Hooks only enqueue a [`DebugEvent`] on an unbounded channel; the worker
//! connects, then encodes and sends events in order. When the
//! debugger is dropped the channel closes, the worker flushes what is queued
//! and closes the socket.
//!
//! If the connection cannot be established the worker logs a warning and
//! discards events until the channel closes.

use std::thread::{self, JoinHandle};

use dashmap::DashSet;
use futures_util::SinkExt;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::tungstenite::Message;

use super::{DebugEvent, Debugger, ObjectKind, ObjectRef};
use crate::config::{DebuggerConfig, WireEncoding};
use crate::error::{Error, Result};

/// Debugger that forwards events to a WebSocket server.
pub struct RemoteDebugger {
    sender: Option<UnboundedSender<DebugEvent>>,

    /// Objects already announced with [`DebugEvent::NewObject`].
    known_objects: DashSet<(ObjectKind, u64)>,

    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RemoteDebugger {
    /// Start the worker thread and begin connecting to `config.url`.
    ///
    /// Returns immediately; connection errors are only logged.
    pub fn connect(config: &DebuggerConfig) -> Result<Self> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let url = config.url.clone();
        let encoding = config.encoding;

        let worker = thread::Builder::new()
            .name("sluice-debugger".to_string())
            .spawn(move || run_worker(url, encoding, receiver))
            .map_err(|e| Error::Debugger(e.to_string()))?;

        Ok(Self {
            sender: Some(sender),
            known_objects: DashSet::new(),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Close the channel and wait for queued events to be sent.
    pub fn shutdown(mut self) {
        self.close(true);
    }

    fn close(&mut self, wait: bool) {
        self.sender.take();
        if let Some(worker) = self.worker.lock().take() {
            if wait && worker.join().is_err() {
                tracing::warn!("debugger worker panicked");
            }
        }
    }

    fn send(&self, event: DebugEvent) {
        if let Some(sender) = &self.sender {
            // A closed channel means the worker is gone; nothing to do.
            let _ = sender.send(event);
        }
    }

    fn announce(&self, object: ObjectRef) {
        if self.known_objects.insert((object.kind, object.id)) {
            self.send(DebugEvent::NewObject { object });
        }
    }
}

impl Drop for RemoteDebugger {
    fn drop(&mut self) {
        self.close(false);
    }
}

impl Debugger for RemoteDebugger {
    fn notify_value_change(&self, name: &str, value: &str) {
        self.send(DebugEvent::ValueChange {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn notify_rv_assigned_to(&self, name: &str) {
        self.send(DebugEvent::RvAssignedTo {
            name: name.to_string(),
        });
    }

    fn notify_new_operator(&self, name: &str) {
        self.send(DebugEvent::NewOperator {
            name: name.to_string(),
        });
    }

    fn add_edge_from(&self, node: ObjectRef, edge: ObjectRef) {
        self.announce(node);
        self.announce(edge);
        self.send(DebugEvent::EdgeFrom { node, edge });
    }

    fn add_edge_to(&self, edge: ObjectRef, node: ObjectRef) {
        self.announce(edge);
        self.announce(node);
        self.send(DebugEvent::EdgeTo { edge, node });
    }
}

/// Encode an event as one WebSocket frame.
pub(crate) fn encode(event: &DebugEvent, encoding: WireEncoding) -> Result<Message> {
    match encoding {
        WireEncoding::Json => serde_json::to_string(event)
            .map(Message::Text)
            .map_err(|e| Error::Debugger(e.to_string())),
        WireEncoding::Msgpack => rmp_serde::to_vec_named(event)
            .map(Message::Binary)
            .map_err(|e| Error::Debugger(e.to_string())),
    }
}

fn run_worker(url: String, encoding: WireEncoding, mut receiver: UnboundedReceiver<DebugEvent>) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::warn!(error = %e, "debugger runtime failed to start");
            return;
        }
    };

    runtime.block_on(async move {
        let mut socket = match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((socket, _)) => socket,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "debugger connection failed");
                while receiver.recv().await.is_some() {}
                return;
            }
        };
        tracing::debug!(url = %url, "debugger connected");

        while let Some(event) = receiver.recv().await {
            let message = match encode(&event, encoding) {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!(event = event.name(), error = %e, "debugger encode failed");
                    continue;
                }
            };
            if let Err(e) = socket.send(message).await {
                tracing::warn!(error = %e, "debugger send failed");
                while receiver.recv().await.is_some() {}
                return;
            }
        }

        if let Err(e) = socket.close(None).await {
            tracing::debug!(error = %e, "debugger close failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u64) -> ObjectRef {
        ObjectRef {
            kind: ObjectKind::Node,
            id,
            type_name: "i32",
        }
    }

    #[test]
    fn json_frames_are_text() {
        let event = DebugEvent::ValueChange {
            name: "a".into(),
            value: "3".into(),
        };
        match encode(&event, WireEncoding::Json).unwrap() {
            Message::Text(text) => {
                let json: serde_json::Value = serde_json::from_str(&text).unwrap();
                assert_eq!(json["event"], "value_change");
                assert_eq!(json["value"], "3");
            }
            other => panic!("expected text frame, got {:?}", other),
        }
    }

    #[test]
    fn msgpack_frames_are_binary() {
        let event = DebugEvent::NewObject { object: node(1) };
        match encode(&event, WireEncoding::Msgpack).unwrap() {
            Message::Binary(bytes) => {
                let value: serde_json::Value = rmp_serde::from_slice(&bytes).unwrap();
                assert_eq!(value["event"], "new_object");
                assert_eq!(value["object"]["id"], 1);
            }
            other => panic!("expected binary frame, got {:?}", other),
        }
    }

    #[test]
    fn unreachable_observer_does_not_block() {
        let config = DebuggerConfig {
            url: "ws://127.0.0.1:1".to_string(),
            ..DebuggerConfig::default()
        };
        let debugger = RemoteDebugger::connect(&config).unwrap();
        debugger.notify_value_change("a", "1");
        debugger.add_edge_from(node(1), node(2));
        debugger.shutdown();
    }

    #[test]
    fn objects_are_announced_once() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let debugger = RemoteDebugger {
            sender: Some(sender),
            known_objects: DashSet::new(),
            worker: Mutex::new(None),
        };
        let edge = ObjectRef {
            kind: ObjectKind::Edge,
            id: 1,
            type_name: "fn(i32) -> i32",
        };

        debugger.add_edge_from(node(1), edge);
        debugger.add_edge_to(edge, node(2));

        let mut names = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            names.push(event.name());
        }
        assert_eq!(
            names,
            vec!["new_object", "new_object", "edge_from", "new_object", "edge_to"]
        );
    }
}
