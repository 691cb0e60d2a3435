use cpsim_core::{
    format::{
        frame::{Call, CallError, CallResult, Frame},
        message::{DecodeErrorKind, EncodeDecode},
    },
    v16::{
        action::Action,
        messages::{BootNotificationResponse, StatusNotificationRequest},
        protocol_error::ProtocolError,
        types::{ChargePointErrorCode, ChargePointStatus, RegistrationStatus},
    },
};
use serde_json::json;

type V16Frame = Frame<ProtocolError>;

#[test]
fn call_encodes_as_four_element_array() {
    let call = Call::new(
        "19223201".to_string(),
        "StatusNotification",
        StatusNotificationRequest {
            connector_id: 1,
            status: ChargePointStatus::Available,
            error_code: ChargePointErrorCode::NoError,
            info: None,
            timestamp: None,
            vendor_id: None,
            vendor_error_code: None,
        },
    );
    let value: serde_json::Value = serde_json::from_str(&call.encode()).unwrap();
    assert_eq!(
        value,
        json!([2, "19223201", "StatusNotification", {"connectorId": 1, "status": "Available", "errorCode": "NoError"}])
    );
}

#[test]
fn call_error_uses_wire_spelling() {
    let err = CallError::new("a".to_string(), ProtocolError::OccurrenceConstraintViolation)
        .with_description("too many keys");
    let value: serde_json::Value = serde_json::from_str(&err.encode()).unwrap();
    assert_eq!(
        value,
        json!([4, "a", "OccurenceConstraintViolation", "too many keys", {}])
    );
}

#[test]
fn decode_round_trips_each_frame_kind() {
    let frames: Vec<V16Frame> = vec![
        Call {
            unique_id: "1".into(),
            action: "Heartbeat".into(),
            payload: json!({}),
        }
        .into(),
        CallResult::new(
            "2".into(),
            BootNotificationResponse {
                status: RegistrationStatus::Accepted,
                current_time: "2024-01-01T00:00:00Z".parse().unwrap(),
                interval: 30,
            },
        )
        .into(),
        CallError {
            unique_id: "3".into(),
            error_code: ProtocolError::NotImplemented,
            error_description: "nope".into(),
            error_details: json!({"hint": 1}),
        }
        .into(),
    ];
    for frame in frames {
        assert_eq!(V16Frame::decode(&frame.encode()).unwrap(), frame);
    }
}

#[test]
fn decode_accepts_both_occurrence_spellings() {
    for code in ["OccurenceConstraintViolation", "OccurrenceConstraintViolation"] {
        let raw = format!(r#"[4,"x","{code}","",{{}}]"#);
        match V16Frame::decode(&raw).unwrap() {
            Frame::CallError(e) => {
                assert_eq!(e.error_code, ProtocolError::OccurrenceConstraintViolation)
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

#[test]
fn unknown_error_code_falls_back_to_generic() {
    let frame = V16Frame::decode(r#"[4,"x","SomethingNew","",{}]"#).unwrap();
    assert!(matches!(frame, Frame::CallError(e) if e.error_code == ProtocolError::GenericError));
}

#[test]
fn decode_rejects_malformed_structure() {
    let cases = [
        ("not json", None),
        (r#"{"a":1}"#, None),
        (r#"[5,"id",{}]"#, Some("id")),
        (r#"[2.0,"id","Heartbeat",{}]"#, Some("id")),
        (r#"[2,"id","Heartbeat"]"#, Some("id")),
        (r#"[3,"id",{},{}]"#, Some("id")),
        (r#"[3,17,{}]"#, None),
        (r#"[2,"id",5,{}]"#, Some("id")),
        (r#"[4,"id",1,"",{}]"#, Some("id")),
    ];
    for (raw, uid) in cases {
        let err = V16Frame::decode(raw).unwrap_err();
        assert_eq!(err.unique_id.as_deref(), uid, "{raw}");
    }
}

#[test]
fn decode_error_keeps_call_context() {
    let err = V16Frame::decode(r#"[2,"abc",7,{}]"#).unwrap_err();
    assert!(err.is_call());
    assert_eq!(err.kind, DecodeErrorKind::InvalidAction);

    let err = V16Frame::decode(r#"[3,"abc"]"#).unwrap_err();
    assert!(!err.is_call());
    assert!(matches!(
        err.kind,
        DecodeErrorKind::WrongLength { message_type: 3, expected: 3, actual: 2 }
    ));
}

#[test]
fn action_names_round_trip() {
    for name in ["RemoteStartTransaction", "GetConfiguration", "DataTransfer", "Heartbeat"] {
        assert_eq!(Action::from(name).as_str(), name);
    }
    assert_eq!(Action::from("UpdateFirmware"), Action::Unknown("UpdateFirmware".into()));
    assert!(Action::from("Authorize").is_charge_point_initiated());
    assert!(!Action::from("Reset").is_charge_point_initiated());
}
