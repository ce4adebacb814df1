use simple_lorawan::{
    config::{node::MAX_EVENTS_PER_RUN, NodeConfig},
    mac::{DataRate, EventCode, EventKind, MacEngine, TxRxFlags, MAX_LEN_FRAME},
    node::{Node, NodeError, Registry},
};

use mock::{engine, probe, MockError, PendingFrame};

fn kind_setters() -> [(EventKind, fn(&Node<'_, mock::MockEngine, 4>, fn())); 15] {
    [
        (EventKind::ScanTimeout, |n, h| n.set_scan_timeout_handler(h)),
        (EventKind::BeaconFound, |n, h| n.set_beacon_found_handler(h)),
        (EventKind::BeaconMissed, |n, h| n.set_beacon_missed_handler(h)),
        (EventKind::BeaconTracked, |n, h| n.set_beacon_tracked_handler(h)),
        (EventKind::Joining, |n, h| n.set_joining_handler(h)),
        (EventKind::Joined, |n, h| n.set_joined_handler(h)),
        (EventKind::Rfu1, |n, h| n.set_rfu1_handler(h)),
        (EventKind::JoinFailed, |n, h| n.set_join_failed_handler(h)),
        (EventKind::RejoinFailed, |n, h| n.set_rejoin_failed_handler(h)),
        (EventKind::TxComplete, |n, h| n.set_tx_complete_handler(h)),
        (EventKind::LostTsync, |n, h| n.set_lost_tsync_handler(h)),
        (EventKind::Reset, |n, h| n.set_reset_handler(h)),
        (EventKind::RxComplete, |n, h| n.set_rx_complete_handler(h)),
        (EventKind::LinkDead, |n, h| n.set_link_dead_handler(h)),
        (EventKind::LinkAlive, |n, h| n.set_link_alive_handler(h)),
    ]
}

#[test]
fn test_node_creation_resets_engine() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    assert_eq!(engine.borrow().resets, 1);
    assert_eq!(engine.borrow().data_rate, Some((DataRate::SF7, 14)));
    assert_eq!(node.spread_factor(), Ok(DataRate::SF7));
    assert!(registry.contains(node.id()));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_node_with_config() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let config = NodeConfig {
        default_port: 42,
        tx_power_dbm: 10,
        data_rate: DataRate::SF9,
    };
    let node = Node::with_config(&engine, &registry, config).unwrap();

    assert_eq!(engine.borrow().data_rate, Some((DataRate::SF9, 10)));

    node.send(b"x").unwrap();
    assert_eq!(engine.borrow().pending.as_ref().unwrap().port, 42);
}

#[test]
fn test_each_kind_reaches_only_its_handler() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    for (kind, set) in kind_setters() {
        set(&node, || probe::record("kind"));
        engine.borrow_mut().emit_next(&[kind.into()]);
        node.process().unwrap();
        assert_eq!(probe::take_log(), vec!["kind"], "{:?}", kind);
        node.clear_handler(kind);

        // Every other kind is now silent for this node.
        for other in EventKind::ALL {
            engine.borrow_mut().emit_next(&[other.into()]);
            node.process().unwrap();
        }
        assert!(probe::take_log().is_empty(), "{:?}", kind);
    }
}

#[test]
fn test_handlers_are_kind_specific() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    node.set_joined_handler(|| probe::record("joined"));
    node.set_joining_handler(|| probe::record("joining"));
    node.set_link_dead_handler(|| probe::record("link dead"));

    engine.borrow_mut().emit_next(&[
        EventKind::Joining.into(),
        EventKind::BeaconFound.into(),
        EventKind::Joined.into(),
        EventKind::LinkDead.into(),
    ]);
    node.process().unwrap();

    assert_eq!(probe::take_log(), vec!["joining", "joined", "link dead"]);
}

#[test]
fn test_generic_handler_runs_first() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    node.set_event_handler(|event| probe::record(format!("event {}", event.0)));
    node.set_joined_handler(|| probe::record("joined"));

    engine.borrow_mut().emit_next(&[EventKind::Joined.into()]);
    node.process().unwrap();

    assert_eq!(probe::take_log(), vec!["event 6", "joined"]);
}

#[test]
fn test_unknown_codes_reach_generic_handler_only() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    node.set_event_handler(|event| probe::record(format!("event {}", event.0)));
    for (_, set) in kind_setters() {
        set(&node, || probe::record("kind"));
    }

    engine.borrow_mut().emit_next(&[EventCode(0), EventCode(16), EventCode(255)]);
    node.process().unwrap();

    assert_eq!(probe::take_log(), vec!["event 0", "event 16", "event 255"]);
}

#[test]
fn test_downlink_with_port() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    node.set_receive_handler(probe::record_rx);
    node.set_tx_complete_handler(|| probe::record("tx complete"));

    engine
        .borrow_mut()
        .set_downlink(TxRxFlags::ACK, Some(5), &[0x01, 0x02, 0x03]);
    engine.borrow_mut().emit_next(&[EventKind::TxComplete.into()]);
    node.process().unwrap();

    assert_eq!(probe::take_rx(), vec![(5, vec![0x01, 0x02, 0x03])]);
    assert_eq!(probe::take_log(), vec!["rx", "tx complete"]);
}

#[test]
fn test_downlink_without_port_flag() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    node.set_receive_handler(probe::record_rx);

    engine.borrow_mut().set_downlink(0, None, b"hi");
    engine.borrow_mut().emit_next(&[EventKind::TxComplete.into()]);
    node.process().unwrap();

    assert_eq!(probe::take_rx(), vec![(0, b"hi".to_vec())]);
}

#[test]
fn test_tx_complete_without_downlink() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    node.set_receive_handler(probe::record_rx);
    node.set_tx_complete_handler(|| probe::record("tx complete"));

    engine
        .borrow_mut()
        .set_flags(TxRxFlags::ACK | TxRxFlags::NOPORT | TxRxFlags::DNW1);
    engine.borrow_mut().emit_next(&[EventKind::TxComplete.into()]);
    node.process().unwrap();

    assert!(probe::take_rx().is_empty());
    assert_eq!(probe::take_log(), vec!["tx complete"]);
}

#[test]
fn test_out_of_contract_downlink_is_dropped() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    node.set_receive_handler(probe::record_rx);
    node.set_tx_complete_handler(|| probe::record("tx complete"));

    // Longer than the frame buffer can hold
    let frame = [0u8; 100];
    engine
        .borrow_mut()
        .set_raw_frame(TxRxFlags::PORT, &frame, 9, MAX_LEN_FRAME + 1);
    engine.borrow_mut().emit_next(&[EventKind::TxComplete.into()]);
    node.process().unwrap();

    assert!(probe::take_rx().is_empty());
    assert_eq!(probe::take_log(), vec!["tx complete"]);

    // Runs past the end of the buffer
    engine
        .borrow_mut()
        .set_raw_frame(TxRxFlags::PORT, &[0u8; 16], 12, 10);
    engine.borrow_mut().emit_next(&[EventKind::TxComplete.into()]);
    node.process().unwrap();

    assert!(probe::take_rx().is_empty());
    assert_eq!(probe::take_log(), vec!["tx complete"]);
}

#[test]
fn test_downlink_only_on_tx_complete() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    node.set_receive_handler(probe::record_rx);

    engine.borrow_mut().set_downlink(0, Some(3), b"data");
    engine
        .borrow_mut()
        .emit_next(&[EventKind::RxComplete.into(), EventKind::Joined.into()]);
    node.process().unwrap();

    assert!(probe::take_rx().is_empty());
}

#[test]
fn test_send_variants() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    node.transmit(7, b"abc", true).unwrap();
    assert_eq!(
        engine.borrow_mut().pending.take(),
        Some(PendingFrame {
            port: 7,
            payload: b"abc".to_vec(),
            confirmed: true,
        })
    );

    node.send(b"de").unwrap();
    assert_eq!(
        engine.borrow_mut().pending.take(),
        Some(PendingFrame {
            port: 1,
            payload: b"de".to_vec(),
            confirmed: false,
        })
    );

    node.send_to_port(9, b"f").unwrap();
    assert_eq!(
        engine.borrow_mut().pending.take(),
        Some(PendingFrame {
            port: 9,
            payload: b"f".to_vec(),
            confirmed: false,
        })
    );

    node.send_with_ack(b"g", true).unwrap();
    assert_eq!(
        engine.borrow_mut().pending.take(),
        Some(PendingFrame {
            port: 1,
            payload: b"g".to_vec(),
            confirmed: true,
        })
    );
}

#[test]
fn test_send_full_frame_and_empty_payload() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    let full = [0xA5u8; MAX_LEN_FRAME];
    node.send(&full).unwrap();
    assert_eq!(engine.borrow().pending.as_ref().unwrap().payload, full.to_vec());

    node.send(&[]).unwrap();
    assert!(engine.borrow().pending.as_ref().unwrap().payload.is_empty());
}

#[test]
fn test_send_oversized_payload() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    let payload = [0u8; MAX_LEN_FRAME + 1];
    assert_eq!(
        node.send(&payload),
        Err(NodeError::PayloadTooLarge {
            len: MAX_LEN_FRAME + 1,
            max: MAX_LEN_FRAME,
        })
    );
    assert!(engine.borrow().pending.is_none());
}

#[test]
fn test_send_engine_error() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    engine.borrow_mut().refuse_transmit = true;
    assert_eq!(node.send(b"x"), Err(NodeError::Engine(MockError::Busy)));
}

#[test]
fn test_handler_overwrite_and_clear() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    node.set_joined_handler(|| probe::record("first"));
    node.set_joined_handler(|| probe::record("second"));
    engine.borrow_mut().emit_next(&[EventKind::Joined.into()]);
    node.process().unwrap();
    assert_eq!(probe::take_log(), vec!["second"]);

    node.clear_handler(EventKind::Joined);
    engine.borrow_mut().emit_next(&[EventKind::Joined.into()]);
    node.process().unwrap();
    assert!(probe::take_log().is_empty());

    node.set_event_handler(|_| probe::record("event"));
    node.clear_event_handler();
    node.set_receive_handler(probe::record_rx);
    node.clear_receive_handler();
    engine.borrow_mut().set_downlink(0, Some(1), b"z");
    engine.borrow_mut().emit_next(&[EventKind::TxComplete.into()]);
    node.process().unwrap();
    assert!(probe::take_log().is_empty());
    assert!(probe::take_rx().is_empty());
}

#[test]
fn test_link_check_passthrough() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    node.disable_link_check().unwrap();
    assert!(!engine.borrow().link_check);
    assert_eq!(node.link_check_enabled(), Ok(false));

    node.enable_link_check().unwrap();
    assert!(engine.borrow().link_check);
    assert_eq!(node.link_check_enabled(), Ok(true));

    node.set_link_check(false).unwrap();
    assert_eq!(node.link_check_enabled(), Ok(false));
}

#[test]
fn test_set_spread_factor_uses_configured_power() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    node.set_spread_factor(DataRate::SF10).unwrap();
    assert_eq!(engine.borrow().data_rate, Some((DataRate::SF10, 14)));
    assert_eq!(node.spread_factor(), Ok(DataRate::SF10));
}

#[test]
fn test_time_until_next_send() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    assert_eq!(node.time_until_next_send(), Ok(0));
    engine.borrow_mut().duty_wait = 1234;
    assert_eq!(node.time_until_next_send(), Ok(1234));
}

#[test]
fn test_process_without_events() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    node.set_event_handler(|_| probe::record("event"));
    node.process().unwrap();
    node.process().unwrap();

    assert_eq!(engine.borrow().runs, 2);
    assert!(probe::take_log().is_empty());
}

#[test]
fn test_process_while() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    let mut remaining = 3;
    node.process_while(|| {
        remaining -= 1;
        remaining >= 0
    })
    .unwrap();

    assert_eq!(engine.borrow().runs, 3);
}

#[test]
fn test_on_event_delivers_to_one_node() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let a = Node::new(&engine, &registry).unwrap();
    let b = Node::new(&engine, &registry).unwrap();

    a.set_joined_handler(|| probe::record("a"));
    b.set_joined_handler(|| probe::record("b"));

    b.on_event(EventKind::Joined.into());
    assert_eq!(probe::take_log(), vec!["b"]);
    assert_eq!(engine.borrow().runs, 0);
}

#[test]
fn test_queries_while_engine_busy() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    let held = engine.borrow_mut();
    assert_eq!(node.link_check_enabled(), Err(NodeError::Reentrant));
    assert_eq!(node.spread_factor(), Err(NodeError::Reentrant));
    assert_eq!(node.time_until_next_send(), Err(NodeError::Reentrant));
    drop(held);

    assert_eq!(node.spread_factor(), Ok(DataRate::SF7));
}

#[test]
fn test_downlink_read_when_emitted() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    node.set_receive_handler(probe::record_rx);
    node.set_tx_complete_handler(|| probe::record("tx complete"));

    // The engine stages the next uplink in the same buffer before the
    // quantum ends.
    engine.borrow_mut().reuse_buffer = true;
    engine.borrow_mut().set_downlink(0, Some(7), &[0xAA, 0xBB]);
    engine
        .borrow_mut()
        .emit_next(&[EventKind::TxComplete.into(), EventKind::LinkAlive.into()]);
    node.process().unwrap();

    assert_eq!(probe::take_rx(), vec![(7, vec![0xAA, 0xBB])]);
    assert_eq!(probe::take_log(), vec!["rx", "tx complete"]);
    assert_eq!(engine.borrow().frame().data_len, 0);
}

#[test]
fn test_event_overflow_is_reported() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    node.set_joined_handler(|| probe::record("joined"));

    let burst = [EventCode::from(EventKind::Joined); MAX_EVENTS_PER_RUN + 2];
    engine.borrow_mut().emit_next(&burst);
    assert_eq!(node.process(), Err(NodeError::EventOverflow { dropped: 2 }));
    assert_eq!(probe::take_log().len(), MAX_EVENTS_PER_RUN);

    // A quantum that fits is delivered in full.
    engine
        .borrow_mut()
        .emit_next(&[EventCode::from(EventKind::Joined); MAX_EVENTS_PER_RUN]);
    assert_eq!(node.process(), Ok(()));
    assert_eq!(probe::take_log().len(), MAX_EVENTS_PER_RUN);
}

#[test]
fn test_downlink_of_full_frame() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    node.set_receive_handler(probe::record_rx);

    let payload: Vec<u8> = (0..MAX_LEN_FRAME as u8).collect();
    engine.borrow_mut().set_downlink(TxRxFlags::ACK, Some(200), &payload);
    engine.borrow_mut().emit_next(&[EventKind::TxComplete.into()]);
    node.process().unwrap();

    assert_eq!(probe::take_rx(), vec![(200, payload)]);
}

#[test]
fn test_downlink_length_limit() {
    let engine = engine();
    let registry: Registry<4> = Registry::new();
    let node = Node::new(&engine, &registry).unwrap();

    node.set_receive_handler(probe::record_rx);

    // Port byte at offset 8, payload from 9; the buffer is long enough for
    // both lengths, so only the frame capacity limit applies.
    let mut frame = vec![0u8; 9 + MAX_LEN_FRAME + 1];
    frame[8] = 4;

    engine
        .borrow_mut()
        .set_raw_frame(TxRxFlags::PORT, &frame, 9, MAX_LEN_FRAME);
    engine.borrow_mut().emit_next(&[EventKind::TxComplete.into()]);
    node.process().unwrap();
    assert_eq!(probe::take_rx(), vec![(4, vec![0u8; MAX_LEN_FRAME])]);

    engine
        .borrow_mut()
        .set_raw_frame(TxRxFlags::PORT, &frame, 9, MAX_LEN_FRAME + 1);
    engine.borrow_mut().emit_next(&[EventKind::TxComplete.into()]);
    node.process().unwrap();
    assert!(probe::take_rx().is_empty());
}
