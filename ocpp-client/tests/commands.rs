mod harness;

use cpsim_client::v16::{SessionState, TimerId};
use cpsim_core::v16::{
    messages::{
        AuthorizeRequest, AuthorizeResponse, ChangeAvailabilityRequest, ChangeAvailabilityResponse,
        ChangeConfigurationRequest, ChangeConfigurationResponse, DataTransferRequest,
        DataTransferResponse, GetConfigurationRequest, GetConfigurationResponse, HeartbeatRequest,
        RemoteStartTransactionRequest, RemoteStartTransactionResponse,
        RemoteStopTransactionRequest, ResetRequest, ResetResponse, StartTransactionRequest,
        StartTransactionResponse, StopTransactionRequest, StopTransactionResponse,
        UnlockConnectorRequest, UnlockConnectorResponse,
    },
    protocol_error::ProtocolError,
    types::{
        AvailabilityStatus, AvailabilityType, ChargePointStatus, ConfigurationStatus,
        DataTransferStatus, IdTagInfo, Reason, RegistrationStatus, RemoteStartStopStatus,
        ResetStatus, ResetType, UnlockStatus,
    },
};
use serde_json::{json, Value};

use harness::sans_io::CoreHarness;

fn registered(overrides: Vec<(&str, &str)>) -> CoreHarness {
    let mut h = CoreHarness::new(overrides);
    h.boot_accepted(300);
    h
}

fn remote_start(h: &mut CoreHarness, connector_id: Option<usize>, id_tag: &str) -> String {
    h.send_call(
        "RemoteStartTransaction",
        RemoteStartTransactionRequest {
            connector_id,
            id_tag: id_tag.into(),
            charging_profile: None,
        },
    )
}

/// Remote start without authorization, confirmed with `transaction_id`.
fn remote_charging(h: &mut CoreHarness, connector_id: usize, transaction_id: i32) {
    let uid = remote_start(h, Some(connector_id), "REMOTE");
    let res: RemoteStartTransactionResponse = h.expect_result(&uid);
    assert_eq!(res.status, RemoteStartStopStatus::Accepted);
    h.ack_status(ChargePointStatus::Preparing);
    let (uid, _) = h.expect_call::<StartTransactionRequest>("StartTransaction");
    h.respond(
        &uid,
        StartTransactionResponse {
            transaction_id,
            id_tag_info: IdTagInfo::accepted(),
        },
    );
    h.ack_status(ChargePointStatus::Charging);
}

#[test]
fn unknown_action_is_not_implemented() {
    let mut h = registered(vec![]);
    let uid = h.send_call("FlyToTheMoon", json!({}));
    assert_eq!(h.expect_error(&uid), ProtocolError::NotImplemented);
}

#[test]
fn charge_point_actions_are_not_accepted_as_commands() {
    let mut h = registered(vec![]);
    let uid = h.send_call("Heartbeat", json!({}));
    assert_eq!(h.expect_error(&uid), ProtocolError::NotSupported);
}

#[test]
fn bad_payload_is_a_formation_violation() {
    let mut h = registered(vec![]);
    let uid = h.send_call("RemoteStopTransaction", json!({"transactionId": "seven"}));
    assert_eq!(h.expect_error(&uid), ProtocolError::FormationViolation);
}

#[test]
fn remote_start_authorizes_first_by_default() {
    let mut h = registered(vec![]);
    let uid = remote_start(&mut h, Some(2), "ABC123");
    let res: RemoteStartTransactionResponse = h.expect_result(&uid);
    assert_eq!(res.status, RemoteStartStopStatus::Accepted);
    h.ack_status(ChargePointStatus::Preparing);
    let (uid, req) = h.expect_call::<AuthorizeRequest>("Authorize");
    assert_eq!(req.id_tag, "ABC123");
    h.respond(
        &uid,
        AuthorizeResponse {
            id_tag_info: IdTagInfo::accepted(),
        },
    );
    let (_, start) = h.expect_call::<StartTransactionRequest>("StartTransaction");
    assert_eq!(start.connector_id, 2);
}

#[test]
fn remote_start_without_connector_picks_the_first_available() {
    let mut h = registered(vec![("AuthorizeRemoteTxRequests", "false")]);
    let actions = h.cp.simulate_fault(1, None);
    h.apply(actions);
    h.ack_status(ChargePointStatus::Faulted);

    let uid = remote_start(&mut h, None, "ABC123");
    let _: RemoteStartTransactionResponse = h.expect_result(&uid);
    let status = h.ack_status(ChargePointStatus::Preparing);
    assert_eq!(status.connector_id, 2);
    let (_, start) = h.expect_call::<StartTransactionRequest>("StartTransaction");
    assert_eq!(start.connector_id, 2);
}

#[test]
fn remote_start_rejections_leave_state_alone() {
    let mut h = registered(vec![("AuthorizeRemoteTxRequests", "false")]);
    let uid = remote_start(&mut h, Some(3), "ABC123");
    assert_eq!(h.expect_error(&uid), ProtocolError::PropertyConstraintViolation);
    let uid = remote_start(&mut h, Some(0), "ABC123");
    assert_eq!(h.expect_error(&uid), ProtocolError::PropertyConstraintViolation);

    remote_charging(&mut h, 1, 7);
    let uid = remote_start(&mut h, Some(1), "ABC123");
    assert_eq!(h.expect_error(&uid), ProtocolError::NotSupported);
    h.expect_silence();
    assert_eq!(h.cp.connector_status(1), Some(ChargePointStatus::Charging));
    assert_eq!(h.cp.transaction(1).map(|t| t.transaction_id), Some(7));
}

#[test]
fn remote_stop_for_unknown_transaction_is_an_error() {
    let mut h = registered(vec![("AuthorizeRemoteTxRequests", "false")]);
    remote_charging(&mut h, 1, 7);
    let uid = h.send_call("RemoteStopTransaction", RemoteStopTransactionRequest { transaction_id: 8 });
    assert_eq!(h.expect_error(&uid), ProtocolError::GenericError);
    h.expect_silence();
    assert_eq!(h.cp.connector_status(1), Some(ChargePointStatus::Charging));
}

#[test]
fn unlock_stops_a_running_transaction() {
    let mut h = registered(vec![("AuthorizeRemoteTxRequests", "false")]);
    remote_charging(&mut h, 1, 7);
    let uid = h.send_call("UnlockConnector", UnlockConnectorRequest { connector_id: 1 });
    let res: UnlockConnectorResponse = h.expect_result(&uid);
    assert_eq!(res.status, UnlockStatus::Unlocked);
    let (_, stop) = h.expect_call::<StopTransactionRequest>("StopTransaction");
    assert_eq!(stop.reason, Some(Reason::UnlockCommand));

    let uid = h.send_call("UnlockConnector", UnlockConnectorRequest { connector_id: 5 });
    let res: UnlockConnectorResponse = h.expect_result(&uid);
    assert_eq!(res.status, UnlockStatus::NotSupported);
}

#[test]
fn get_configuration_lists_known_and_unknown_keys() {
    let mut h = registered(vec![]);
    let uid = h.send_call(
        "GetConfiguration",
        GetConfigurationRequest {
            key: Some(vec!["HeartbeatInterval".into(), "NoSuchKey".into(), "NumberOfConnectors".into()]),
        },
    );
    let res: GetConfigurationResponse = h.expect_result(&uid);
    let keys = res.configuration_key.unwrap();
    assert_eq!(keys.len(), 2);
    // boot accepted with interval 300
    assert_eq!((keys[0].value.as_deref(), keys[0].readonly), (Some("300"), false));
    assert_eq!((keys[1].value.as_deref(), keys[1].readonly), (Some("2"), true));
    assert_eq!(res.unknown_key, Some(vec!["NoSuchKey".to_string()]));

    let uid = h.send_call("GetConfiguration", GetConfigurationRequest { key: None });
    let res: GetConfigurationResponse = h.expect_result(&uid);
    assert_eq!(res.configuration_key.unwrap().len(), 11);
    assert_eq!(res.unknown_key, None);
}

#[test]
fn get_configuration_enforces_the_key_limit() {
    let mut h = registered(vec![("GetConfigurationMaxKeys", "2")]);
    let keys: Vec<Value> = ["HeartbeatInterval", "NumberOfConnectors", "AuthorizeRequired"]
        .iter()
        .map(|k| json!(k))
        .collect();
    let uid = h.send_call("GetConfiguration", json!({ "key": keys }));
    assert_eq!(h.expect_error(&uid), ProtocolError::OccurrenceConstraintViolation);
}

#[test]
fn change_configuration_validates_and_applies() {
    let mut h = registered(vec![]);
    let change = |h: &mut CoreHarness, key: &str, value: &str| {
        let uid = h.send_call(
            "ChangeConfiguration",
            ChangeConfigurationRequest {
                key: key.into(),
                value: value.into(),
            },
        );
        h.expect_result::<ChangeConfigurationResponse>(&uid).status
    };
    assert_eq!(change(&mut h, "Foo", "1"), ConfigurationStatus::NotSupported);
    assert_eq!(change(&mut h, "NumberOfConnectors", "4"), ConfigurationStatus::Rejected);
    assert_eq!(change(&mut h, "HeartbeatInterval", "abc"), ConfigurationStatus::Rejected);
    assert_eq!(change(&mut h, "MeterValuesSampledData", "Voltage"), ConfigurationStatus::Rejected);
    assert_eq!(change(&mut h, "MeterValuesSampledData", ""), ConfigurationStatus::Rejected);
    assert_eq!(h.timer(TimerId::Heartbeat), Some(300));

    assert_eq!(change(&mut h, "HeartbeatInterval", "45"), ConfigurationStatus::Accepted);
    assert_eq!(h.timer(TimerId::Heartbeat), Some(45));
    h.advance(45);
    h.expect_call::<HeartbeatRequest>("Heartbeat");
}

#[test]
fn change_availability_defers_busy_connectors() {
    let mut h = registered(vec![("AuthorizeRemoteTxRequests", "false")]);
    remote_charging(&mut h, 1, 7);

    let uid = h.send_call(
        "ChangeAvailability",
        ChangeAvailabilityRequest {
            connector_id: 0,
            kind: AvailabilityType::Inoperative,
        },
    );
    let res: ChangeAvailabilityResponse = h.expect_result(&uid);
    assert_eq!(res.status, AvailabilityStatus::Scheduled);
    let status = h.ack_status(ChargePointStatus::Unavailable);
    assert_eq!(status.connector_id, 2);
    assert_eq!(h.cp.connector_status(1), Some(ChargePointStatus::Charging));

    let actions = h.cp.unplug(1);
    h.apply(actions);
    let (uid, _) = h.expect_call::<StopTransactionRequest>("StopTransaction");
    h.respond(&uid, StopTransactionResponse { id_tag_info: None });
    h.ack_status(ChargePointStatus::Finishing);
    h.ack_status(ChargePointStatus::Unavailable);

    let uid = h.send_call(
        "ChangeAvailability",
        ChangeAvailabilityRequest {
            connector_id: 2,
            kind: AvailabilityType::Operative,
        },
    );
    let res: ChangeAvailabilityResponse = h.expect_result(&uid);
    assert_eq!(res.status, AvailabilityStatus::Accepted);
    h.ack_status(ChargePointStatus::Available);

    let uid = h.send_call(
        "ChangeAvailability",
        ChangeAvailabilityRequest {
            connector_id: 9,
            kind: AvailabilityType::Operative,
        },
    );
    let res: ChangeAvailabilityResponse = h.expect_result(&uid);
    assert_eq!(res.status, AvailabilityStatus::Rejected);
}

#[test]
fn data_transfer_checks_the_vendor() {
    let mut h = registered(vec![]);
    let transfer = |h: &mut CoreHarness, vendor_id: &str| {
        let uid = h.send_call(
            "DataTransfer",
            DataTransferRequest {
                vendor_id: vendor_id.into(),
                message_id: None,
                data: None,
            },
        );
        h.expect_result::<DataTransferResponse>(&uid).status
    };
    assert_eq!(transfer(&mut h, harness::VENDOR), DataTransferStatus::Accepted);
    assert_eq!(transfer(&mut h, "Other"), DataTransferStatus::UnknownVendorId);
}

#[test]
fn reset_stops_transactions_then_reconnects() {
    let mut h = registered(vec![("AuthorizeRemoteTxRequests", "false")]);
    remote_charging(&mut h, 1, 7);

    let uid = h.send_call("Reset", ResetRequest { kind: ResetType::Hard });
    let res: ResetResponse = h.expect_result(&uid);
    assert_eq!(res.status, ResetStatus::Accepted);
    let (uid, stop) = h.expect_call::<StopTransactionRequest>("StopTransaction");
    assert_eq!(stop.reason, Some(Reason::HardReset));
    assert_eq!(h.closes, 0);

    h.respond(&uid, StopTransactionResponse { id_tag_info: None });
    assert_eq!(h.closes, 1);
    assert_eq!(h.connects.len(), 2);
    assert_eq!(h.cp.session_state(), SessionState::Connecting);
    assert_eq!(h.cp.connector_status(1), Some(ChargePointStatus::Available));

    h.outbox.clear();
    h.connected();
    let (uid, _) = h.expect_call::<Value>("BootNotification");
    h.respond(&uid, CoreHarness::boot_response(RegistrationStatus::Accepted, 300));
    h.ack_status(ChargePointStatus::Available);
    h.ack_status(ChargePointStatus::Available);
}

#[test]
fn idle_reset_reconnects_right_away() {
    let mut h = registered(vec![]);
    let uid = h.send_call("Reset", ResetRequest { kind: ResetType::Soft });
    let _: ResetResponse = h.expect_result(&uid);
    h.expect_silence();
    assert_eq!((h.closes, h.connects.len()), (1, 2));
}

#[test]
fn auto_start_key_follows_authorize_required() {
    let mut h = registered(vec![]);
    let read = |h: &mut CoreHarness, key: &str| {
        let uid = h.send_call("GetConfiguration", GetConfigurationRequest { key: Some(vec![key.into()]) });
        let res: GetConfigurationResponse = h.expect_result(&uid);
        res.configuration_key.unwrap()[0].value.clone().unwrap()
    };
    assert_eq!(read(&mut h, "evb_AutoStart"), "0");

    let uid = h.send_call(
        "ChangeConfiguration",
        ChangeConfigurationRequest {
            key: "evb_AutoStart".into(),
            value: "1".into(),
        },
    );
    let res: ChangeConfigurationResponse = h.expect_result(&uid);
    assert_eq!(res.status, ConfigurationStatus::Accepted);
    assert_eq!(read(&mut h, "AuthorizeRequired"), "false");

    let actions = h.cp.plug_in(1, "ABC123".into());
    h.apply(actions);
    h.ack_status(ChargePointStatus::Preparing);
    let (_, start) = h.expect_call::<StartTransactionRequest>("StartTransaction");
    assert_eq!(start.id_tag, "ABC123");

    let uid = h.send_call(
        "ChangeConfiguration",
        ChangeConfigurationRequest {
            key: "AuthorizeRequired".into(),
            value: "true".into(),
        },
    );
    let _: ChangeConfigurationResponse = h.expect_result(&uid);
    assert_eq!(read(&mut h, "evb_AutoStart"), "0");
}
