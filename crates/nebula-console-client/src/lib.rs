//! Client side of the Nebula console RPC channel.
//!
//! The console core only needs three things from the server:
//!
//! - authenticate once and obtain a session,
//! - execute one opaque query string at a time,
//! - sign out exactly once when the console is done.
//!
//! This crate provides those pieces:
//!
//! - [`value`]: the result data model (tagged values, data sets, responses)
//! - [`wire`]: length-prefixed MessagePack framing and the request/response envelopes
//! - [`Connection`] / [`Session`]: a blocking TCP session implementing [`Executor`]
//!
//! There is no pooling, retrying or reconnection. A transport failure is
//! reported to the caller and the session is considered dead.

mod error;
mod session;
pub mod value;
pub mod wire;

pub use error::ClientError;
pub use session::{Connection, Executor, Session};
pub use value::{
    DataSet, Date, DateTime, Edge, ExecutionResponse, NullKind, Path, Row, Step, Value, Vertex,
    SUCCEEDED,
};
