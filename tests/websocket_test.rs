//! Wire-format tests for the broadcast message schema.

use serde_json::Value;
use updown::types::{
    EpochEndData, EpochResult, EpochStartData, HeartbeatData, Outcome, PricePoint, ServerMessage,
    SnapshotData,
};

#[test]
fn test_init_message_full_payload() {
    let msg = ServerMessage::Init {
        data: SnapshotData {
            price: Some(20.5),
            epoch: 1,
            time_remaining: 9_950,
            reference_price: Some(20.5),
            history: vec![
                PricePoint {
                    price: 20.0,
                    timestamp: 100,
                    epoch: 0,
                },
                PricePoint {
                    price: 20.5,
                    timestamp: 9_900,
                    epoch: 0,
                },
            ],
            epoch_results: vec![EpochResult {
                epoch: 0,
                start_price: 20.0,
                end_price: 20.5,
                outcome: None,
                timestamp: 10_000,
            }],
            boundaries: vec![10_000, 20_000, 30_000],
            pyth_connected: true,
        },
    };

    let json = serde_json::to_string(&msg).unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["type"], "init");
    let data = &value["data"];
    assert_eq!(data["price"], 20.5);
    assert_eq!(data["epoch"], 1);
    assert_eq!(data["referencePrice"], 20.5);
    assert_eq!(data["history"].as_array().unwrap().len(), 2);
    assert_eq!(data["history"][0]["price"], 20.0);
    assert_eq!(data["epochResults"][0]["outcome"], Value::Null);
    assert_eq!(data["epochResults"][0]["startPrice"], 20.0);
    assert_eq!(
        data["boundaries"],
        serde_json::json!([10_000, 20_000, 30_000])
    );
    assert_eq!(data["pythConnected"], true);
}

#[test]
fn test_epoch_end_then_start_pair() {
    let end = ServerMessage::EpochEnd {
        data: EpochEndData {
            epoch: 4,
            price: 101.0,
            ref_price: Some(100.0),
            history_index: Some(37),
            outcome: Some(Outcome::Up),
            boundaries: vec![50_000, 60_000],
        },
    };
    let start = ServerMessage::EpochStart {
        data: EpochStartData {
            epoch: 5,
            ref_price: Some(101.0),
            time_remaining: 10_000,
            boundaries: vec![50_000, 60_000],
        },
    };

    let end_json: Value = serde_json::from_str(&serde_json::to_string(&end).unwrap()).unwrap();
    let start_json: Value = serde_json::from_str(&serde_json::to_string(&start).unwrap()).unwrap();

    assert_eq!(end_json["type"], "epoch_end");
    assert_eq!(end_json["data"]["outcome"], "up");
    assert_eq!(end_json["data"]["historyIndex"], 37);
    // The new epoch's reference price is the ended epoch's settlement price.
    assert_eq!(start_json["type"], "epoch_start");
    assert_eq!(start_json["data"]["refPrice"], end_json["data"]["price"]);
    assert_eq!(
        start_json["data"]["epoch"].as_i64().unwrap(),
        end_json["data"]["epoch"].as_i64().unwrap() + 1
    );
}

#[test]
fn test_outcome_wire_values() {
    assert_eq!(serde_json::to_string(&Outcome::Up).unwrap(), "\"up\"");
    assert_eq!(serde_json::to_string(&Outcome::Down).unwrap(), "\"down\"");

    let parsed: Outcome = serde_json::from_str("\"down\"").unwrap();
    assert_eq!(parsed, Outcome::Down);
}

#[test]
fn test_heartbeat_payload_keys() {
    let msg = ServerMessage::Heartbeat {
        data: HeartbeatData {
            server_time: 1_704_067_200_000,
            subscribers: 7,
        },
    };

    let value: Value = serde_json::from_str(&serde_json::to_string(&msg).unwrap()).unwrap();
    assert_eq!(value["type"], "heartbeat");
    assert_eq!(value["data"]["serverTime"], 1_704_067_200_000i64);
    assert_eq!(value["data"]["subscribers"], 7);
}

#[test]
fn test_payload_keys_are_camel_case() {
    let msg = ServerMessage::EpochEnd {
        data: EpochEndData {
            epoch: 0,
            price: 1.0,
            ref_price: None,
            history_index: None,
            outcome: None,
            boundaries: vec![],
        },
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"refPrice\""));
    assert!(json.contains("\"historyIndex\""));
    assert!(!json.contains("ref_price"));
    assert!(!json.contains("history_index"));
}
