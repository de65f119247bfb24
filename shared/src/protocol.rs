//! Wire protocol: `_command`-tagged JSON messages in length-prefixed frames.
//!
//! Every frame is a 4-byte big-endian payload length followed by that many
//! bytes of UTF-8 JSON. A stream read never has to guess where one message
//! ends and the next begins, which matters because TCP is free to coalesce or
//! split writes.
//!
//! Requests and replies share the `_command` tag, so a reply to `status` is
//! `{"_command":"status","turn":0,"players":[...]}`.

use crate::types::{GameState, Position, Uid, Unit};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest payload either side will read or write (16 MiB). `status`
/// snapshots are the largest messages.
pub const MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// Largest client request the server accepts (64 KiB). A snapshot entry is
/// never larger than the `register` frame that created it, so a server with
/// at most `MAX_FRAME_SIZE / MAX_REQUEST_SIZE` players always fits its
/// snapshot in one frame.
pub const MAX_REQUEST_SIZE: u32 = 64 * 1024;

/// Requests sent from a client to the server.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "_command", rename_all = "lowercase")]
pub enum ClientMessage {
    Register {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        units: Option<Vec<Unit>>,
    },
    Status,
    Finish,
    Quit,
    /// `mover` only needs `x`/`y`; a full unit record is accepted and the
    /// extra fields ignored.
    Move { mover: Position, x: i32, y: i32 },
    Attack {
        attacker: Position,
        defender: Position,
    },
}

impl ClientMessage {
    /// The `_command` tag, for logging.
    pub fn command(&self) -> &'static str {
        match self {
            ClientMessage::Register { .. } => "register",
            ClientMessage::Status => "status",
            ClientMessage::Finish => "finish",
            ClientMessage::Quit => "quit",
            ClientMessage::Move { .. } => "move",
            ClientMessage::Attack { .. } => "attack",
        }
    }
}

/// Replies sent from the server to a client.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "_command", rename_all = "lowercase")]
pub enum ServerMessage {
    Register { uid: Uid },
    Status(GameState),
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    #[error("frame too large: {len} bytes (max {max})")]
    FrameTooLarge { len: usize, max: u32 },
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(message)?)
}

pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Writes one frame. The prefix and payload go out in a single write.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let len = payload.len();
    if len > MAX_FRAME_SIZE as usize {
        return Err(ProtocolError::FrameTooLarge {
            len,
            max: MAX_FRAME_SIZE,
        });
    }

    let mut frame = Vec::with_capacity(4 + len);
    frame.extend_from_slice(&(len as u32).to_be_bytes());
    frame.extend_from_slice(payload);

    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one frame of at most [`MAX_FRAME_SIZE`] bytes.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    read_frame_limited(reader, MAX_FRAME_SIZE).await
}

/// Reads one frame, rejecting payloads longer than `max`.
///
/// Returns `Ok(None)` only when the peer closes the stream exactly on a frame
/// boundary. A stream that ends inside the length prefix or the payload is an
/// I/O error.
pub async fn read_frame_limited<R>(
    reader: &mut R,
    max: u32,
) -> Result<Option<Vec<u8>>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    let mut filled = 0;
    while filled < len_buf.len() {
        let n = reader.read(&mut len_buf[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("stream closed after {} of 4 length bytes", filled),
            )
            .into());
        }
        filled += n;
    }

    let len = u32::from_be_bytes(len_buf);
    if len > max {
        return Err(ProtocolError::FrameTooLarge {
            len: len as usize,
            max,
        });
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

pub async fn write_message<W, T>(writer: &mut W, message: &T) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = encode(message)?;
    write_frame(writer, &payload).await
}

pub async fn read_message<R, T>(reader: &mut R) -> Result<Option<T>, ProtocolError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    read_message_limited(reader, MAX_FRAME_SIZE).await
}

pub async fn read_message_limited<R, T>(
    reader: &mut R,
    max: u32,
) -> Result<Option<T>, ProtocolError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    match read_frame_limited(reader, max).await? {
        Some(payload) => Ok(Some(decode(&payload)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Player;
    use tokio_test::io::Builder;

    fn framed(json: &str) -> Vec<u8> {
        let mut frame = (json.len() as u32).to_be_bytes().to_vec();
        frame.extend_from_slice(json.as_bytes());
        frame
    }

    #[test]
    fn test_decode_register_with_roster() {
        let json = r#"{"_command":"register","units":[{"x":1,"y":2,"hp":10,"speed":5,
            "minreach":1,"maxreach":3,"weapon":"spear","armor":["shield"],
            "formation":"line","uclass":"infantry"}]}"#;
        let message: ClientMessage = decode(json.as_bytes()).unwrap();

        match message {
            ClientMessage::Register { units: Some(units) } => {
                assert_eq!(units.len(), 1);
                assert_eq!(units[0].x, 1);
                assert_eq!(units[0].class, "infantry");
                assert_eq!(units[0].armor, vec!["shield".to_string()]);
            }
            other => panic!("Unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_register_without_roster() {
        let message: ClientMessage = decode(br#"{"_command":"register"}"#).unwrap();
        assert_eq!(message, ClientMessage::Register { units: None });
    }

    #[test]
    fn test_decode_payloadless_commands() {
        for (json, expected) in [
            (r#"{"_command":"status"}"#, ClientMessage::Status),
            (r#"{"_command":"finish"}"#, ClientMessage::Finish),
            (r#"{"_command":"quit"}"#, ClientMessage::Quit),
        ] {
            let message: ClientMessage = decode(json.as_bytes()).unwrap();
            assert_eq!(message, expected);
            assert_eq!(message.command(), &json[13..json.len() - 2]);
        }
    }

    #[test]
    fn test_decode_move_accepts_full_unit_as_mover() {
        let json = r#"{"_command":"move","mover":{"x":0,"y":0,"hp":3,"speed":5,
            "minreach":1,"maxreach":1,"weapon":"","armor":[],"formation":"",
            "uclass":""},"x":3,"y":4}"#;
        let message: ClientMessage = decode(json.as_bytes()).unwrap();
        assert_eq!(
            message,
            ClientMessage::Move {
                mover: Position::new(0, 0),
                x: 3,
                y: 4
            }
        );
    }

    #[test]
    fn test_decode_rejects_unknown_command() {
        let result: Result<ClientMessage, _> = decode(br#"{"_command":"teleport"}"#);
        assert!(matches!(result, Err(ProtocolError::Json(_))));
    }

    #[test]
    fn test_decode_rejects_missing_tag() {
        let result: Result<ClientMessage, _> = decode(br#"{"x":1}"#);
        assert!(matches!(result, Err(ProtocolError::Json(_))));
    }

    #[test]
    fn test_decode_rejects_move_missing_target() {
        let result: Result<ClientMessage, _> =
            decode(br#"{"_command":"move","mover":{"x":0,"y":0},"x":3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_status_reply_shape() {
        let reply = ServerMessage::Status(GameState {
            turn: None,
            players: vec![Player::new(2, vec![])],
        });
        let json: serde_json::Value = serde_json::from_slice(&encode(&reply).unwrap()).unwrap();

        assert_eq!(json["_command"], "status");
        assert!(json["turn"].is_null());
        assert_eq!(json["players"][0]["uid"], 2);
    }

    #[tokio::test]
    async fn test_read_message_from_stream() {
        let mut stream = Builder::new()
            .read(&framed(r#"{"_command":"status"}"#))
            .build();

        let message: Option<ClientMessage> = read_message(&mut stream).await.unwrap();
        assert_eq!(message, Some(ClientMessage::Status));
    }

    #[tokio::test]
    async fn test_read_frames_split_across_reads() {
        let frame = framed(r#"{"_command":"finish"}"#);
        let mut stream = Builder::new()
            .read(&frame[..2])
            .read(&frame[2..7])
            .read(&frame[7..])
            .build();

        let message: Option<ClientMessage> = read_message(&mut stream).await.unwrap();
        assert_eq!(message, Some(ClientMessage::Finish));
    }

    #[tokio::test]
    async fn test_read_coalesced_frames() {
        let mut bytes = framed(r#"{"_command":"status"}"#);
        bytes.extend(framed(r#"{"_command":"quit"}"#));
        let mut stream = Builder::new().read(&bytes).build();

        let first: Option<ClientMessage> = read_message(&mut stream).await.unwrap();
        let second: Option<ClientMessage> = read_message(&mut stream).await.unwrap();
        let end: Option<ClientMessage> = read_message(&mut stream).await.unwrap();

        assert_eq!(first, Some(ClientMessage::Status));
        assert_eq!(second, Some(ClientMessage::Quit));
        assert_eq!(end, None);
    }

    #[tokio::test]
    async fn test_clean_close_is_none() {
        let mut stream = Builder::new().build();
        let frame = read_frame(&mut stream).await.unwrap();
        assert!(frame.is_none());
    }

    #[tokio::test]
    async fn test_truncated_payload_is_error() {
        let frame = framed(r#"{"_command":"status"}"#);
        let mut stream = Builder::new().read(&frame[..frame.len() - 3]).build();
        let result = read_frame(&mut stream).await;
        assert!(matches!(result, Err(ProtocolError::Io(_))));
    }

    #[tokio::test]
    async fn test_close_inside_length_prefix_is_error() {
        let frame = framed(r#"{"_command":"status"}"#);
        let mut stream = Builder::new().read(&frame[..2]).build();
        let result = read_frame(&mut stream).await;
        match result {
            Err(ProtocolError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("Expected an I/O error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_request_limit_is_tighter_than_frame_limit() {
        let mut stream = Builder::new()
            .read(&(MAX_REQUEST_SIZE + 1).to_be_bytes())
            .build();
        let result = read_frame_limited(&mut stream, MAX_REQUEST_SIZE).await;
        assert!(matches!(
            result,
            Err(ProtocolError::FrameTooLarge {
                max: MAX_REQUEST_SIZE,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_oversized_prefix_is_rejected() {
        let mut stream = Builder::new()
            .read(&(MAX_FRAME_SIZE + 1).to_be_bytes())
            .build();
        let result = read_frame(&mut stream).await;
        assert!(matches!(result, Err(ProtocolError::FrameTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_oversized_write_is_rejected() {
        let payload = vec![b' '; MAX_FRAME_SIZE as usize + 1];
        let mut sink = Vec::new();
        let result = write_frame(&mut sink, &payload).await;
        assert!(matches!(result, Err(ProtocolError::FrameTooLarge { .. })));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_write_message_frames_json() {
        let expected = framed(r#"{"_command":"register","uid":7}"#);
        let mut stream = Builder::new().write(&expected).build();

        write_message(&mut stream, &ServerMessage::Register { uid: 7 })
            .await
            .unwrap();
    }
}
