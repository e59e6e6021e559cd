//! Integration tests for the full watcher workflow
//!
//! These tests drive the public surface end to end:
//! - list reconciliation across successive snapshots
//! - user edits turning into wire-shaped commands
//! - decoded buffers feeding the monitor readouts

use watchvis_rs::decode::{decode, encode_timestamp, Classified, KindMemory};
use watchvis_rs::protocol::{ClientMessage, ControlEnvelope, WatcherCommand};
use watchvis_rs::sync::{GroupEdit, WatcherSync};
use watchvis_rs::types::{WatcherDescriptor, WatcherKind};

fn list_json(names_and_codes: &[(&str, &str)], timestamp: u64) -> String {
    let watchers: Vec<serde_json::Value> = names_and_codes
        .iter()
        .map(|(name, code)| {
            serde_json::json!({
                "name": name,
                "type": code,
                "watched": false,
                "controlled": false,
                "logged": 0,
                "value": 0.0,
                "monitor": 0,
                "logFileName": format!("{name}.bin"),
            })
        })
        .collect();
    serde_json::json!({
        "watcher": {
            "watchers": watchers,
            "timestamp": timestamp,
            "sampleRate": 44_100,
        }
    })
    .to_string()
}

#[test]
fn test_list_responses_reconcile_group_set() {
    let mut sync = WatcherSync::new();

    let env: ControlEnvelope =
        serde_json::from_str(&list_json(&[("gain", "f"), ("mode", "j")], 44_100)).unwrap();
    sync.on_list_received(&env.watcher.unwrap());

    let names: Vec<_> = sync.groups().iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, ["gain", "mode"]);
    assert_eq!(sync.sample_rate(), 44_100);

    // "mode" disappears, "phase" joins; "gain" keeps its identity
    sync.groups_mut()[0].value_input = "0.5".to_string();
    let env: ControlEnvelope =
        serde_json::from_str(&list_json(&[("gain", "f"), ("phase", "d")], 88_200)).unwrap();
    sync.on_list_received(&env.watcher.unwrap());

    let names: Vec<_> = sync.groups().iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, ["gain", "phase"]);
    assert_eq!(sync.group("gain").unwrap().value_input, "0.5");
    assert_eq!(sync.latest_timestamp(), 88_200);
}

#[test]
fn test_edits_serialize_to_wire_shape() {
    let mut sync = WatcherSync::new();
    let env: ControlEnvelope =
        serde_json::from_str(&list_json(&[("gain", "f"), ("mode", "j")], 44_100)).unwrap();
    sync.on_list_received(&env.watcher.unwrap());

    let cmd = sync.on_user_edit("gain", GroupEdit::Watched(true), 100.0).unwrap();
    let json = serde_json::to_value(ClientMessage::command(cmd)).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"watcher": [{"cmd": "watch", "watchers": ["gain"]}]})
    );

    // masked write to the integer variable: stage a mask, then edit the value
    sync.on_user_edit("mode", GroupEdit::Mask("0xFF".to_string()), 100.0);
    let cmd = sync
        .on_user_edit("mode", GroupEdit::Value("0x2A".to_string()), 100.0)
        .unwrap();
    let json = serde_json::to_value(ClientMessage::command(cmd)).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"watcher": [{
            "cmd": "setMask",
            "watchers": ["mode"],
            "values": [42.0],
            "masks": [255]
        }]})
    );

    // log start is scheduled two seconds past the board's position
    let cmd = sync.on_user_edit("gain", GroupEdit::Logged(true), 100.0).unwrap();
    let json = serde_json::to_value(&cmd).unwrap();
    assert_eq!(json["timestamps"], serde_json::json!([44_100 + 2 * 44_100]));
}

#[test]
fn test_decoded_monitor_feeds_readouts() {
    let mut sync = WatcherSync::new();
    let env: ControlEnvelope =
        serde_json::from_str(&list_json(&[("gain", "f"), ("mode", "j")], 44_100)).unwrap();
    sync.on_list_received(&env.watcher.unwrap());

    // a single-sample payload after the timestamp head is a monitor event
    let mut buffer = encode_timestamp(WatcherKind::U32, 96_000);
    buffer.push(42.0);
    match decode(WatcherKind::U32, &buffer).unwrap() {
        Classified::Monitor { timestamp, value } => {
            sync.record_monitor(1, timestamp, value);
        }
        other => panic!("expected monitor, got {:?}", other),
    }

    let g = sync.group("mode").unwrap();
    assert_eq!(g.monitor_timestamp, "96000");
    assert_eq!(g.monitor_value, "42");
}

#[test]
fn test_kind_memory_tracks_channel_types() {
    let mut sync = WatcherSync::new();
    let mut kinds = KindMemory::new();

    let env: ControlEnvelope =
        serde_json::from_str(&list_json(&[("gain", "f"), ("mode", "j")], 44_100)).unwrap();
    sync.on_list_received(&env.watcher.unwrap());

    for (index, group) in sync.groups().iter().enumerate() {
        let kind = group.type_code.chars().next().and_then(WatcherKind::from_code);
        kinds.record(index, kind);
    }

    // untagged buffers on a known channel resolve to the recorded kind
    assert_eq!(kinds.resolve(0, None), Some(WatcherKind::F32));
    assert_eq!(kinds.resolve(1, None), Some(WatcherKind::U32));
    assert!(kinds.compat_mode());
}

#[test]
fn test_command_batch_round_trip() {
    let msg = ClientMessage::Commands {
        watcher: vec![
            WatcherCommand::watch("a", true),
            WatcherCommand::monitor("b", 1000),
        ],
    };
    let json = serde_json::to_string(&msg).unwrap();
    let parsed: ClientMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, msg);
}

#[test]
fn test_descriptor_accepts_numeric_flags() {
    // some firmware revisions report flags as 0/1 instead of booleans
    let desc: WatcherDescriptor = serde_json::from_str(
        r#"{"name": "x", "type": "i", "watched": 1, "logged": 0}"#,
    )
    .unwrap();
    assert!(desc.watched);
    assert!(!desc.logged);
    assert_eq!(desc.kind(), Some(WatcherKind::I32));
}
