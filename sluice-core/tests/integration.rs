//! Integration Tests for Pipelines
//!
//! These tests build pipelines through the public facade and check the values
//! that arrive downstream after a write.

use std::cell::RefCell;
use std::rc::Rc;

use futures_util::StreamExt;
use tokio_tungstenite::tungstenite::Message;

use sluice_core::config::{DebuggerConfig, DebuggerMode, WireEncoding};
use sluice_core::{ReactiveContext, RecordingDebugger, RemoteDebugger};

/// A map edge converts and scales the source value.
#[test]
fn map_scales_value() {
    let rc = ReactiveContext::new();
    let a = rc.rv::<i32>("a");
    let b = rc.rv::<f32>("b");

    rc.from(&a).map(|n| n as f32 * 0.5).into(&b);

    a.set(5);
    assert_eq!(b.get(), 2.5);
}

/// `to` creates the destination handle.
#[test]
fn map_to_fresh_handle() {
    let rc = ReactiveContext::new();
    let a = rc.rv::<i32>("a");

    let b = rc.from(&a).map(|n| n * 2).to();

    a.set(5);
    assert_eq!(b.get(), 10);
}

/// Listeners on a destination see the propagated value.
#[test]
fn listener_observes_downstream_value() {
    let rc = ReactiveContext::new();
    let a = rc.rv::<i32>("a");
    let b = rc.rv::<String>("b");
    let seen = Rc::new(RefCell::new(Vec::new()));

    rc.from(&a).map(|n| format!("#{n}")).into(&b);
    let s = seen.clone();
    b.on_changed(move |v| s.borrow_mut().push(v.clone()));

    a.set(1);
    a.set(2);
    assert_eq!(*seen.borrow(), vec!["#1".to_string(), "#2".to_string()]);
}

/// Split scatters a sequence across destinations by position.
#[test]
fn split_scatters_by_position() {
    let rc = ReactiveContext::new();
    let a = rc.rv::<Vec<i32>>("a");
    let b = rc.rv::<i32>("b");
    let c = rc.rv::<i32>("c");

    rc.from(&a)
        .split([rc.destination(&b), rc.destination(&c)])
        .unwrap();

    a.set(vec![1, 2]);
    assert_eq!(b.get(), 1);
    assert_eq!(c.get(), 2);
}

/// A destination past the end of the sequence receives the default value.
#[test]
fn split_fills_missing_elements_with_default() {
    let rc = ReactiveContext::new();
    let a = rc.rv::<Vec<i32>>("a");
    let b = rc.rv::<i32>("b");
    let c = rc.rv::<i32>("c");
    let d = rc.rv_with::<i32>("d", 9);

    rc.from(&a)
        .split([
            rc.destination(&b),
            rc.destination(&c),
            rc.destination(&d),
        ])
        .unwrap();

    a.set(vec![1, 2]);
    assert_eq!((b.get(), c.get(), d.get()), (1, 2, 0));
}

/// Merge re-reads every source on each write.
#[test]
fn merge_reads_all_sources() {
    let rc = ReactiveContext::new();
    let a = rc.rv::<i32>("a");
    let b = rc.rv::<i32>("b");
    let c = rc.rv::<Vec<i32>>("c");

    rc.merge([rc.from(&a), rc.from(&b)]).into(&c);

    a.set(3);
    assert_eq!(c.get(), vec![3, 0]);
    b.set(7);
    assert_eq!(c.get(), vec![3, 7]);
    a.set(5);
    assert_eq!(c.get(), vec![5, 7]);
}

/// A source listed twice in one merge is read twice but written once.
#[test]
fn merge_of_repeated_source_writes_destination_once() {
    let rc = ReactiveContext::new();
    let a = rc.rv::<i32>("a");
    let c = rc.rv::<Vec<i32>>("c");
    let writes = Rc::new(RefCell::new(0));

    rc.merge([rc.from(&a), rc.from(&a)]).into(&c);
    let w = writes.clone();
    c.on_changed(move |_| *w.borrow_mut() += 1);

    a.set(3);
    assert_eq!(c.get(), vec![3, 3]);
    assert_eq!(*writes.borrow(), 1);
}

/// A second merge into the same destination replaces the first.
#[test]
fn merge_rebind_replaces_sources() {
    let rc = ReactiveContext::new();
    let a = rc.rv::<i32>("a");
    let b = rc.rv::<i32>("b");
    let c = rc.rv::<Vec<i32>>("c");

    rc.merge([rc.from(&a), rc.from(&b)]).into(&c);
    rc.merge([rc.from(&b)]).into(&c);

    a.set(1);
    assert_eq!(c.get(), Vec::<i32>::new());
    b.set(2);
    assert_eq!(c.get(), vec![2]);
    assert_eq!(rc.graph().connection_count(), 1);
}

/// Join gathers differently typed sources into a tuple.
#[test]
fn join_heterogeneous_sources() {
    let rc = ReactiveContext::new();
    let a = rc.rv::<f32>("a");
    let b = rc.rv::<char>("b");
    let c = rc.rv::<(f32, char)>("c");

    rc.join((rc.from(&a), rc.from(&b))).into(&c);

    a.set(4.0);
    assert_eq!(c.get(), (4.0, '\0'));
    b.set('b');
    assert_eq!(c.get(), (4.0, 'b'));
}

/// Join works for sources of the same type too.
#[test]
fn join_homogeneous_sources() {
    let rc = ReactiveContext::new();
    let a = rc.rv::<i32>("a");
    let b = rc.rv::<i32>("b");
    let c = rc.rv::<(i32, i32)>("c");

    rc.join((rc.from(&a), rc.from(&b))).into(&c);
    let product = rc
        .join((rc.from(&a), rc.from(&b)))
        .hidden_node()
        .map(|(x, y)| x * y)
        .to();

    a.set(3);
    b.set(4);
    assert_eq!(c.get(), (3, 4));
    assert_eq!(product.get(), 12);
}

/// Merge into a hidden node, then split back out.
#[test]
fn merge_then_split_through_hidden_node() {
    let rc = ReactiveContext::new();
    let a = rc.rv::<i32>("a");
    let b = rc.rv::<i32>("b");
    let d = rc.rv::<i32>("d");
    let e = rc.rv::<i32>("e");

    rc.merge([rc.from(&a), rc.from(&b)])
        .hidden_node()
        .split([rc.destination(&d), rc.destination(&e)])
        .unwrap();

    a.set(3);
    assert_eq!((d.get(), e.get()), (3, 0));
    b.set(5);
    assert_eq!((d.get(), e.get()), (3, 5));
}

/// Dropping an intermediate handle keeps its node in the chain.
#[test]
fn chain_survives_dropped_intermediate_handle() {
    let rc = ReactiveContext::new();
    let a = rc.rv::<i32>("a");
    let c = rc.rv::<i32>("c");

    {
        let b = rc.rv::<i32>("b");
        rc.from(&a).map(|n| n + 1).into(&b);
        rc.from(&b).map(|n| n * 2).into(&c);
    }

    a.set(1);
    assert_eq!(c.get(), 4);
}

/// A hidden node between two maps composes them.
#[test]
fn hidden_node_composes_maps() {
    let rc = ReactiveContext::new();
    let a = rc.rv::<i32>("a");
    let b = rc.rv::<String>("b");

    rc.from(&a)
        .map(|n| n * 2)
        .hidden_node()
        .map(|n| format!("{n}!"))
        .into(&b);

    a.set(21);
    assert_eq!(b.get(), "42!");
}

/// The last pipeline into a destination wins.
#[test]
fn last_wiring_wins() {
    let rc = ReactiveContext::new();
    let a = rc.rv::<i32>("a");
    let b = rc.rv::<i32>("b");
    let c = rc.rv::<i32>("c");

    rc.from(&a).map(|n| n + 1).into(&c);
    rc.from(&b).map(|n| n * 10).into(&c);

    a.set(1);
    assert_eq!(c.get(), 0);
    b.set(2);
    assert_eq!(c.get(), 20);
    assert!(rc.graph().outgoing(a.id()).is_empty());
}

/// Flatten removes one level of nesting.
#[test]
fn flatten_concatenates_in_order() {
    let rc = ReactiveContext::new();
    let a = rc.rv::<Vec<Vec<i32>>>("a");

    let b = rc.flatten(&a).to();

    a.set(vec![vec![1, 2, 3], vec![4, 5], vec![6]]);
    assert_eq!(b.get(), vec![1, 2, 3, 4, 5, 6]);
}

/// Fresh handles hold the default value until written.
#[test]
fn fresh_handles_hold_default() {
    let rc = ReactiveContext::new();
    let a = rc.rv::<i32>("a");
    let b = rc.rv::<Vec<String>>("b");
    let c = rc.rv::<(f32, char)>("c");

    assert_eq!(a.get(), 0);
    assert!(b.get().is_empty());
    assert_eq!(c.get(), (0.0, '\0'));
}

/// Wiring does not evaluate the edge; only writes do.
#[test]
fn connecting_does_not_propagate() {
    let rc = ReactiveContext::new();
    let a = rc.rv_with::<i32>("a", 5);
    let b = rc.rv::<i32>("b");

    rc.from(&a).map(|n| n + 1).into(&b);
    assert_eq!(b.get(), 0);

    a.update(|n| *n);
    assert_eq!(b.get(), 6);
}

/// Fan-out edges run in registration order, depth first.
#[test]
fn fan_out_runs_depth_first_in_registration_order() {
    let recorder = Rc::new(RecordingDebugger::new());
    let rc = ReactiveContext::with_debugger(recorder.clone());
    let a = rc.rv::<i32>("a");
    let b = rc.rv::<i32>("b");
    let c = rc.rv::<i32>("c");
    let d = rc.rv::<i32>("d");

    rc.from(&a).map(|n| n + 1).into(&b);
    rc.from(&b).map(|n| n + 1).into(&c);
    rc.from(&a).map(|n| n - 1).into(&d);
    recorder.take();

    a.set(10);

    let written: Vec<_> = recorder
        .take()
        .into_iter()
        .filter_map(|event| match event {
            sluice_core::debug::DebugEvent::ValueChange { name, .. } => Some(name),
            _ => None,
        })
        .collect();
    assert_eq!(written, vec!["a", "b", "c", "d"]);
    assert_eq!((b.get(), c.get(), d.get()), (11, 12, 9));
}

/// The remote debugger streams JSON frames to a WebSocket server.
#[test]
fn remote_debugger_streams_to_server() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    listener.set_nonblocking(true).unwrap();

    let server = std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
            let mut frames = Vec::new();
            while let Some(Ok(message)) = socket.next().await {
                match message {
                    Message::Text(text) => frames.push(text),
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            frames
        })
    });

    let config = DebuggerConfig {
        mode: DebuggerMode::Remote,
        url: format!("ws://{addr}"),
        encoding: WireEncoding::Json,
    };
    let debugger = Rc::new(RemoteDebugger::connect(&config).unwrap());
    {
        let rc = ReactiveContext::with_debugger(debugger.clone());
        let a = rc.rv::<i32>("a");
        let b = rc.rv::<i32>("b");
        rc.from(&a).map(|n| n + 1).into(&b);
        a.set(1);
    }
    Rc::try_unwrap(debugger)
        .ok()
        .expect("graph dropped its debugger")
        .shutdown();

    let frames = server.join().unwrap();
    let events: Vec<serde_json::Value> = frames
        .iter()
        .map(|frame| serde_json::from_str(frame).unwrap())
        .collect();
    let names: Vec<&str> = events
        .iter()
        .map(|event| event["event"].as_str().unwrap())
        .collect();

    assert_eq!(
        names,
        vec![
            "rv_assigned_to",
            "rv_assigned_to",
            "new_operator",
            "new_object",
            "new_object",
            "edge_from",
            "new_object",
            "edge_to",
            "value_change",
            "value_change",
        ]
    );
    assert_eq!(events[9]["name"], "b");
    assert_eq!(events[9]["value"], "2");
}
