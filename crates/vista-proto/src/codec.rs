// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! CBOR encode/decode for [`Message`].
//!
//! Decoding runs in two phases: the frame is parsed into a generic
//! [`ciborium::Value`], the `type` string is inspected, and only known kinds
//! are deserialized into their typed variant. Unknown kinds come back as
//! [`Message::Unknown`] instead of an error so a newer server cannot stall
//! an older client.

use ciborium::Value;
use thiserror::Error;
use tracing::warn;

use crate::Message;

/// Errors raised while encoding or decoding a message frame.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The frame is not well-formed CBOR.
    #[error("malformed cbor: {0}")]
    Malformed(String),
    /// The frame is CBOR but not a map with a text `type` entry.
    #[error("frame has no `type` field")]
    MissingType,
    /// The `type` is known but the fields do not match its schema.
    #[error("invalid `{kind}` message: {reason}")]
    Schema {
        /// Wire `type` string.
        kind: String,
        /// Deserializer message.
        reason: String,
    },
    /// Serialization failed (e.g. encoding [`Message::Unknown`]).
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Encode one message into a CBOR frame.
pub fn encode(msg: &Message) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    ciborium::ser::into_writer(msg, &mut out).map_err(|e| CodecError::Encode(e.to_string()))?;
    Ok(out)
}

/// Decode one CBOR frame into a message.
///
/// Binary fields are copied out of the frame exactly once, at their declared
/// byte-string length.
pub fn decode(frame: &[u8]) -> Result<Message, CodecError> {
    let value: Value =
        ciborium::de::from_reader(frame).map_err(|e| CodecError::Malformed(e.to_string()))?;
    let kind = message_kind(&value).ok_or(CodecError::MissingType)?;
    if !Message::is_known_kind(kind) {
        warn!(kind, "skipping unknown message kind");
        return Ok(Message::Unknown {
            kind: kind.to_string(),
        });
    }
    value.deserialized::<Message>().map_err(|e| CodecError::Schema {
        kind: kind.to_string(),
        reason: e.to_string(),
    })
}

/// Read the `type` entry of a decoded frame.
pub fn message_kind(value: &Value) -> Option<&str> {
    let Value::Map(entries) = value else {
        return None;
    };
    entries.iter().find_map(|(k, v)| match (k, v) {
        (Value::Text(k), Value::Text(kind)) if k == "type" => Some(kind.as_str()),
        _ => None,
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::*;
    use bytes::Bytes;

    fn roundtrip(msg: &Message) -> Message {
        decode(&encode(msg).expect("encode")).expect("decode")
    }

    fn frame_with(entries: Vec<(&str, Value)>) -> Vec<u8> {
        let map = Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (Value::Text(k.into()), v))
                .collect(),
        );
        let mut out = Vec::new();
        ciborium::ser::into_writer(&map, &mut out).expect("encode map");
        out
    }

    #[test]
    fn frame_message_uses_wire_tag() {
        let bytes = encode(&Message::Frame(FrameMessage::new("/a"))).expect("encode");
        let value: Value = ciborium::de::from_reader(bytes.as_slice()).expect("cbor");
        assert_eq!(message_kind(&value), Some("frame"));
    }

    #[test]
    fn frame_defaults_fill_missing_fields() {
        let bytes = frame_with(vec![
            ("type", Value::Text("frame".into())),
            ("name", Value::Text("/world".into())),
        ]);
        let Message::Frame(frame) = decode(&bytes).expect("decode") else {
            panic!("expected frame");
        };
        assert_eq!(frame.wxyz, [1.0, 0.0, 0.0, 0.0]);
        assert!(frame.show_axes);
        assert!((frame.axes_length - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn camera_up_direction_reads_its_field() {
        let up = Value::Array(vec![Value::Float(0.0), Value::Float(1.0), Value::Float(0.0)]);
        let bytes = frame_with(vec![
            ("type", Value::Text("set_camera_up_direction".into())),
            ("up_direction", up),
        ]);
        let msg = decode(&bytes).expect("decode");
        assert_eq!(
            msg,
            Message::SetCameraUpDirection(SetCameraUpDirectionMessage {
                up_direction: [0.0, 1.0, 0.0],
            })
        );
    }

    #[test]
    fn unknown_kind_is_skipped_not_failed() {
        let bytes = frame_with(vec![
            ("type", Value::Text("holo_projector".into())),
            ("name", Value::Text("/x".into())),
        ]);
        let msg = decode(&bytes).expect("decode");
        assert_eq!(msg, Message::Unknown { kind: "holo_projector".into() });
    }

    #[test]
    fn missing_type_is_an_error() {
        let bytes = frame_with(vec![("name", Value::Text("/x".into()))]);
        assert!(matches!(decode(&bytes), Err(CodecError::MissingType)));
    }

    #[test]
    fn malformed_frame_is_an_error() {
        assert!(matches!(decode(&[0xff, 0x00]), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn schema_mismatch_names_the_kind() {
        let bytes = frame_with(vec![
            ("type", Value::Text("set_position".into())),
            ("name", Value::Text("/x".into())),
            ("position", Value::Text("nope".into())),
        ]);
        match decode(&bytes) {
            Err(CodecError::Schema { kind, .. }) => assert_eq!(kind, "set_position"),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn binary_fields_survive_exactly() {
        let positions: Vec<u8> = (0u8..24).collect();
        let msg = Message::PointCloud(PointCloudMessage {
            name: "/pc".into(),
            position: Bytes::from(positions.clone()),
            color: Bytes::from_static(&[1, 2, 3, 4, 5, 6]),
            point_size: 0.05,
        });
        let Message::PointCloud(pc) = roundtrip(&msg) else {
            panic!("expected point cloud");
        };
        assert_eq!(pc.position.as_ref(), positions.as_slice());
        assert_eq!(pc.color.len(), 6);
    }

    #[test]
    fn gui_add_flattens_props() {
        let msg = Message::GuiAddSlider(GuiAdd {
            order: 2.0,
            id: "s".into(),
            label: "Speed".into(),
            container_id: "root".into(),
            hint: Some("how fast".into()),
            props: SliderProps {
                min: 0.0,
                max: 10.0,
                step: 0.5,
                initial_value: 3.0,
                precision: 1,
                marks: None,
            },
        });
        let bytes = encode(&msg).expect("encode");
        let value: Value = ciborium::de::from_reader(bytes.as_slice()).expect("cbor");
        let Value::Map(entries) = &value else {
            panic!("expected map");
        };
        assert!(entries
            .iter()
            .any(|(k, _)| matches!(k, Value::Text(t) if t == "initial_value")));
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn gui_update_config_carries_tagged_props() {
        let msg = Message::GuiUpdateConfig(GuiUpdateConfigMessage {
            id: "dd".into(),
            config: GuiProps::Dropdown(DropdownProps {
                options: vec!["a".into(), "b".into()],
                initial_value: Some("b".into()),
            }),
        });
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn outbound_messages_roundtrip() {
        let camera = Message::ViewerCamera(ViewerCameraMessage {
            wxyz: [1.0, 0.0, 0.0, 0.0],
            position: [1.0, 2.0, 3.0],
            aspect: 1.5,
            fov: 0.9,
            look_at: [0.0; 3],
            up_direction: [0.0, 0.0, 1.0],
        });
        let pointer = Message::ScenePointer(ScenePointerMessage {
            event_type: PointerEventKind::Scribble,
            ray_origin: vec![[0.0; 3], [1.0; 3]],
            ray_direction: vec![[0.0, 0.0, -1.0]; 2],
        });
        let update = Message::GuiUpdate(GuiUpdateMessage {
            id: "cb".into(),
            value: Value::Bool(false),
        });
        for msg in [camera, pointer, update, Message::ResetScene] {
            assert_eq!(roundtrip(&msg), msg);
        }
    }

    #[test]
    fn encoding_unknown_fails() {
        let msg = Message::Unknown { kind: "x".into() };
        assert!(matches!(encode(&msg), Err(CodecError::Encode(_))));
    }
}
