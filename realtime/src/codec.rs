// Frame codec for the duplex telemetry protocol
//
// Outbound frames are `[1, 1, seq, command]`; inbound frames are
// `[ack, requestId, sequence, body]` with `body.dt` discriminating the
// payload. Inbound decoding is best-effort: anything malformed decodes to
// `None` and the caller drops it without interrupting the stream.

use groundlink_common::{EventRecord, ParameterUpdate};
use serde_json::{json, Value};

/// Control messages sent to the telemetry source.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundCommand {
    /// Subscribe to the listed qualified names. An empty list is the blanket
    /// keepalive refresh.
    SubscribeParameters(Vec<String>),
    UnsubscribeParameters(Vec<String>),
    SubscribeEvents,
    UnsubscribeEvents,
}

impl OutboundCommand {
    pub fn verb(&self) -> &'static str {
        match self {
            OutboundCommand::SubscribeParameters(_) => "subscribe-parameters",
            OutboundCommand::UnsubscribeParameters(_) => "unsubscribe-parameters",
            OutboundCommand::SubscribeEvents => "subscribe-events",
            OutboundCommand::UnsubscribeEvents => "unsubscribe-events",
        }
    }

    /// Subscribe-class commands are superseded by a resubscription sweep.
    pub fn is_subscribe(&self) -> bool {
        matches!(
            self,
            OutboundCommand::SubscribeParameters(_) | OutboundCommand::SubscribeEvents
        )
    }
}

fn name_list(names: &[String]) -> Value {
    Value::Array(names.iter().map(|n| json!({ "name": n })).collect())
}

/// Encode one outbound frame. `seq` advances once per send attempt, not per
/// successful send.
pub fn encode_frame(seq: u64, command: &OutboundCommand) -> String {
    let body = match command {
        OutboundCommand::SubscribeParameters(names) => json!({
            "parameter": "subscribe",
            "data": {
                "list": name_list(names),
                "sendFromCache": false,
            }
        }),
        OutboundCommand::UnsubscribeParameters(names) => json!({
            "parameter": "unsubscribe",
            "data": {
                "list": name_list(names),
            }
        }),
        OutboundCommand::SubscribeEvents => json!({ "events": "subscribe" }),
        OutboundCommand::UnsubscribeEvents => json!({ "events": "unsubscribe" }),
    };
    Value::Array(vec![json!(1), json!(1), json!(seq), body]).to_string()
}

/// A decoded inbound frame.
#[derive(Debug)]
pub enum InboundFrame {
    Parameters(Vec<ParameterUpdate>),
    Event(EventRecord),
}

/// Decode one inbound frame. Frames shorter than four elements, frames with
/// an unrecognized payload discriminator, and frames that fail to parse all
/// decode to `None`.
pub fn decode_frame(text: &str) -> Option<InboundFrame> {
    let value: Value = serde_json::from_str(text).ok()?;
    let parts = value.as_array()?;
    if parts.len() < 4 {
        return None;
    }

    let body = parts[3].as_object()?;
    match body.get("dt").and_then(Value::as_str)? {
        "PARAMETER" => {
            let list = body.get("data")?.get("parameter")?.clone();
            let updates: Vec<ParameterUpdate> = serde_json::from_value(list).ok()?;
            Some(InboundFrame::Parameters(updates))
        }
        "EVENT" => {
            let data = body.get("data")?.clone();
            Some(InboundFrame::Event(EventRecord { data }))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_frame_carries_names_and_no_cache_flag() {
        let command = OutboundCommand::SubscribeParameters(vec![
            "/power/battery1/voltage".to_string(),
            "/thermal/sensor3".to_string(),
        ]);
        let frame: Value = serde_json::from_str(&encode_frame(17, &command)).unwrap();

        assert_eq!(frame[0], 1);
        assert_eq!(frame[1], 1);
        assert_eq!(frame[2], 17);
        assert_eq!(frame[3]["parameter"], "subscribe");
        assert_eq!(frame[3]["data"]["sendFromCache"], false);
        assert_eq!(
            frame[3]["data"]["list"][1]["name"],
            "/thermal/sensor3"
        );
    }

    #[test]
    fn event_verbs_encode_without_payload() {
        let frame: Value =
            serde_json::from_str(&encode_frame(1, &OutboundCommand::SubscribeEvents)).unwrap();
        assert_eq!(frame[3]["events"], "subscribe");

        let frame: Value =
            serde_json::from_str(&encode_frame(2, &OutboundCommand::UnsubscribeEvents)).unwrap();
        assert_eq!(frame[3]["events"], "unsubscribe");
    }

    #[test]
    fn short_frames_are_dropped() {
        assert!(decode_frame("[1, 2, 3]").is_none());
        assert!(decode_frame("[]").is_none());
    }

    #[test]
    fn unknown_discriminator_is_dropped() {
        let raw = r#"[1, 0, 5, {"dt": "TIME", "data": {}}]"#;
        assert!(decode_frame(raw).is_none());
    }

    #[test]
    fn garbage_is_dropped() {
        assert!(decode_frame("not json").is_none());
        assert!(decode_frame("{\"dt\": \"PARAMETER\"}").is_none());
    }

    #[test]
    fn parameter_frame_decodes_updates() {
        let raw = r#"[1, 0, 9, {"dt": "PARAMETER", "data": {"parameter": [
            {"id": {"name": "/power/battery1/voltage"},
             "engValue": {"type": "FLOAT", "floatValue": 12.3}}
        ]}}]"#;

        match decode_frame(raw) {
            Some(InboundFrame::Parameters(updates)) => {
                assert_eq!(updates.len(), 1);
                assert_eq!(updates[0].id.name, "/power/battery1/voltage");
            }
            other => panic!("expected parameter frame, got {other:?}"),
        }
    }

    #[test]
    fn event_frame_decodes_body_as_is() {
        let raw = r#"[1, 0, 10, {"dt": "EVENT", "data": {"severity": "INFO", "message": "mode change"}}]"#;

        match decode_frame(raw) {
            Some(InboundFrame::Event(record)) => {
                assert_eq!(record.message(), Some("mode change"));
                assert_eq!(record.severity(), Some("INFO"));
            }
            other => panic!("expected event frame, got {other:?}"),
        }
    }
}
