use mist::protocol::payload::{DataSchema, HealthPing, SchemaField};
use mist::{ErrorKind, Message, Payload};
use serde_json::{json, Value};

fn round_trip(msg: &Message) -> Message {
    Message::decode(&msg.encode().unwrap()).unwrap()
}

fn with_field(key: &str, value: Value) -> Message {
    let mut payload = Payload::new();
    payload.insert(key.to_string(), value);
    Message::new("rust", "data.entities", payload)
}

#[test]
fn test_numeric_fidelity() {
    let values = [
        json!(9999999999999i64),
        json!(-42),
        json!(0),
        json!(0.123456789012345),
        json!(1.5e10),
        json!(9007199254740993u64),
        json!(i64::MIN),
        json!(u64::MAX),
    ];
    for value in values {
        let back = round_trip(&with_field("n", value.clone()));
        assert_eq!(back.payload["n"], value, "value {} changed", value);
    }
}

#[test]
fn test_numbers_from_foreign_encoders() {
    let msg = Message::decode(
        br#"{"type":"trace.alert","timestamp_ns":1700000000123456789,"payload":{"value":1.5e10,"threshold":0.123456789012345,"count":9999999999999}}"#,
    )
    .unwrap();
    assert_eq!(msg.timestamp_ns, 1_700_000_000_123_456_789);
    assert_eq!(msg.payload["value"].as_f64(), Some(1.5e10));
    assert_eq!(msg.payload["threshold"].as_f64(), Some(0.123456789012345));
    assert_eq!(msg.payload["count"].as_i64(), Some(9_999_999_999_999));
}

#[test]
fn test_large_string_payload() {
    let big = "A".repeat(1024 * 1024);
    let back = round_trip(&with_field("blob", json!(big)));
    assert_eq!(back.payload["blob"].as_str().map(str::len), Some(1024 * 1024));
    assert_eq!(back.payload["blob"], json!(big));
}

#[test]
fn test_unicode_and_control_characters() {
    let text = "héllo 世界 🚀 \u{0000}\u{0007}\u{001f}\t\r\n\"quoted\" back\\slash \u{2028}";
    let msg = with_field("text", json!(text));
    let encoded = msg.encode().unwrap();
    assert!(!encoded.contains(&b'\n'));
    assert_eq!(Message::decode(&encoded).unwrap().payload["text"], json!(text));
}

#[test]
fn test_deeply_nested_payload() {
    let mut value = json!("leaf");
    for depth in 0..64 {
        value = json!({ "depth": depth, "child": value, "list": [1, [2, [3]]] });
    }
    let back = round_trip(&with_field("tree", value.clone()));
    assert_eq!(back.payload["tree"], value);
}

#[test]
fn test_full_envelope_round_trip() {
    let mut payload = Payload::new();
    payload.insert("nested".into(), json!({"a": [1, 2.5, null, true, "x"]}));
    let msg = Message::new("python", "infer.request", payload).with_id("fixed-id");
    let back = round_trip(&msg);
    assert_eq!(back, msg);
    assert_eq!(back.timestamp_ns, msg.timestamp_ns);
}

#[test]
fn test_defaults_for_partial_envelopes() {
    let msg = Message::decode(br#"{"type":"health.ping"}"#).unwrap();
    assert_eq!(msg.version, "1");
    assert_eq!(msg.id, "");
    assert_eq!(msg.source, "");
    assert_eq!(msg.timestamp_ns, 0);
    assert!(msg.payload.is_empty());

    let ping: HealthPing = msg.decode_payload().unwrap();
    assert_eq!(ping.from, "");
}

#[test]
fn test_repeated_keys_take_last_value() {
    let msg = Message::decode(br#"{"id":"a","id":"b","type":"x.y"}"#).unwrap();
    assert_eq!(msg.id, "b");
    assert_eq!(msg.message_type, "x.y");

    let msg = Message::decode(br#"{"payload":{"n":1},"source":"go","payload":{"n":2}}"#).unwrap();
    assert_eq!(msg.payload["n"], json!(2));
    assert_eq!(msg.source, "go");
}

#[test]
fn test_malformed_envelopes() {
    let inputs: [&[u8]; 5] = [
        b"not json",
        b"[]",
        b"\"str\"",
        b"{\"payload\": \"x\"}",
        b"{\"id\": 7}",
    ];
    for input in inputs {
        let err = Message::decode(input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedEnvelope);
    }
}

#[test]
fn test_typed_schema_payload() {
    let schema = DataSchema {
        name: "users".into(),
        fields: vec![
            SchemaField {
                name: "id".into(),
                field_type: "int".into(),
                required: true,
            },
            SchemaField {
                name: "email".into(),
                field_type: "string".into(),
                required: false,
            },
        ],
    };
    let msg = Message::from_payload("schemaflux", "data.schema", &schema).unwrap();
    assert_eq!(msg.payload["fields"][0]["type"], json!("int"));
    assert_eq!(msg.payload["fields"][1]["required"], json!(false));
    assert_eq!(round_trip(&msg).decode_payload::<DataSchema>().unwrap(), schema);
}
