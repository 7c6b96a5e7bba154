//! Codec trait and the JSON implementation.
//!
//! A codec converts between Rust frame types and the bytes of a
//! transport message. The rest of the server only talks to the [`Codec`]
//! trait, so the wire encoding stays swappable even though JSON is the
//! only format the browser clients speak today.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes frames to UTF-8 text and decodes them back from bytes.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a frame into the text body of a transport message.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a received message body into a frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed,
    /// truncated, or don't match any known frame shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// JSON text frames are what the browser clients produce with
/// `JSON.stringify` and consume with `JSON.parse`, and they keep every
/// message readable in DevTools.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientFrame, Color, GameEvent, GameId, LobbyRequest, ServerFrame};

    #[test]
    fn test_encode_decode_round_trip() {
        let codec = JsonCodec;
        let frame = ServerFrame::Event(GameEvent::Update {
            x: 9,
            y: 9,
            color: Color::Black,
        });

        let text = codec.encode(&frame).unwrap();
        let decoded: ServerFrame = codec.decode(text.as_bytes()).unwrap();
        assert_eq!(frame, decoded);
    }

    #[test]
    fn test_decode_client_frame_from_raw_text() {
        let codec = JsonCodec;
        let frame: ClientFrame = codec.decode(br#"{"action":"join","gameId":2}"#).unwrap();
        assert_eq!(
            frame,
            ClientFrame::Lobby(LobbyRequest::Join { game_id: GameId(2) })
        );
    }

    #[test]
    fn test_decode_garbage_returns_error() {
        let codec = JsonCodec;
        let result: Result<ClientFrame, _> = codec.decode(b"\xff\xfe not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
