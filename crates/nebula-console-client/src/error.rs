use thiserror::Error;

/// Errors raised by the transport layer.
///
/// Every variant means the RPC could not be completed. A query the server
/// rejected is *not* an error here: it comes back as an
/// [`ExecutionResponse`](crate::ExecutionResponse) with a non-zero error code.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode request: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("failed to decode message: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },

    #[error("unexpected response to `{request}` request")]
    UnexpectedResponse { request: &'static str },

    #[error("authentication failed ({code}): {message}")]
    AuthFailed { code: i32, message: String },

    #[error("connection closed by server")]
    Closed,
}
