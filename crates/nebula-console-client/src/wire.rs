//! Wire format.
//!
//! Every message is a 4-byte big-endian length followed by a MessagePack
//! payload (struct fields encoded by name). One request is answered by exactly
//! one response; the console never pipelines.

use std::io::{ErrorKind, Read, Write};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::value::ExecutionResponse;

/// Largest payload accepted in either direction.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase")]
pub enum Request {
    Authenticate { username: String, password: String },
    Execute { session_id: i64, stmt: String },
    Signout { session_id: i64 },
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::Authenticate { .. } => "authenticate",
            Request::Execute { .. } => "execute",
            Request::Signout { .. } => "signout",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    Auth {
        error_code: i32,
        session_id: i64,
        error_msg: Option<String>,
    },
    Execution(ExecutionResponse),
    Ack,
}

/// Read one frame. `Ok(None)` means the peer closed the stream cleanly
/// before a new frame started.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>, ClientError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(ClientError::FrameTooLarge {
            len,
            max: MAX_FRAME_LEN,
        });
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(Some(buf))
}

pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), ClientError> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(ClientError::FrameTooLarge {
            len: payload.len(),
            max: MAX_FRAME_LEN,
        });
    }
    let len = payload.len() as u32;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

/// Encode and write one message.
pub fn send<W: Write, T: Serialize>(writer: &mut W, message: &T) -> Result<(), ClientError> {
    let bytes = rmp_serde::to_vec_named(message)?;
    write_frame(writer, &bytes)
}

/// Read and decode one message; `Ok(None)` on clean end of stream.
pub fn recv<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<Option<T>, ClientError> {
    match read_frame(reader)? {
        Some(bytes) => Ok(Some(rmp_serde::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{DataSet, Value};
    use proptest::prelude::*;
    use std::io::Cursor;

    #[test]
    fn request_survives_framing() {
        let req = Request::Execute {
            session_id: 42,
            stmt: "SHOW SPACES".to_string(),
        };
        let mut buf = Vec::new();
        send(&mut buf, &req).unwrap();

        let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
        assert_eq!(len, buf.len() - 4);

        let decoded: Request = recv(&mut Cursor::new(buf)).unwrap().unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn nested_values_survive_framing() {
        let resp = Response::Execution(ExecutionResponse {
            error_code: 0,
            latency_in_us: 17,
            data: vec![DataSet::new(["v"]).with_row([Value::List(vec![
                Value::from(1),
                Value::from(2.5),
                Value::from("x"),
            ])])],
            space_name: Some("nba".to_string()),
            error_msg: None,
        });
        let mut buf = Vec::new();
        send(&mut buf, &resp).unwrap();

        let decoded: Response = recv(&mut Cursor::new(buf)).unwrap().unwrap();
        assert_eq!(decoded, resp);
    }

    #[test]
    fn empty_stream_is_clean_close() {
        let decoded: Option<Response> = recv(&mut Cursor::new(Vec::new())).unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let mut buf = 10u32.to_be_bytes().to_vec();
        buf.extend_from_slice(b"abc");
        let err = read_frame(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, ClientError::Io(_)));
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let buf = ((MAX_FRAME_LEN as u32) + 1).to_be_bytes().to_vec();
        let err = read_frame(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, ClientError::FrameTooLarge { .. }));
    }

    proptest! {
        #[test]
        fn garbage_payload_never_panics(payload in proptest::collection::vec(any::<u8>(), 0..256)) {
            let mut buf = Vec::new();
            write_frame(&mut buf, &payload).unwrap();
            prop_assert_eq!(buf.len(), payload.len() + 4);

            let mut cursor = Cursor::new(buf);
            let _ = recv::<_, Response>(&mut cursor);
            prop_assert!(read_frame(&mut cursor).unwrap().is_none());
        }
    }
}
