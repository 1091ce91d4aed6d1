use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::value::{ExecutionResponse, SUCCEEDED};
use crate::wire::{self, Request, Response};

/// Anything that can run one query and hand back the server's response.
///
/// `Err` is reserved for transport failures; a query the server rejected is
/// returned as `Ok` with a non-zero error code.
pub trait Executor {
    fn execute(&mut self, stmt: &str) -> Result<ExecutionResponse, ClientError>;
}

/// An open, not yet authenticated TCP connection.
pub struct Connection {
    stream: TcpStream,
}

impl Connection {
    /// Connect to `host:port`, trying every resolved address in turn.
    ///
    /// `timeout` bounds the connect attempt and every later socket read and
    /// write; `None` blocks indefinitely.
    pub fn connect(host: &str, port: u16, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut last_err = None;
        for addr in (host, port).to_socket_addrs()? {
            let attempt = match timeout {
                Some(t) => TcpStream::connect_timeout(&addr, t),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    debug!(%addr, "connected");
                    stream.set_read_timeout(timeout)?;
                    stream.set_write_timeout(timeout)?;
                    stream.set_nodelay(true)?;
                    return Ok(Self { stream });
                }
                Err(e) => {
                    debug!(%addr, error = %e, "connect attempt failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err
            .unwrap_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    format!("no address resolved for {host}:{port}"),
                )
            })
            .into())
    }

    /// Authenticate and turn the connection into a [`Session`].
    pub fn authenticate(mut self, username: &str, password: &str) -> Result<Session, ClientError> {
        let request = Request::Authenticate {
            username: username.to_string(),
            password: password.to_string(),
        };
        match round_trip(&mut self.stream, &request)? {
            Response::Auth {
                error_code,
                session_id,
                error_msg,
            } => {
                if error_code != SUCCEEDED {
                    return Err(ClientError::AuthFailed {
                        code: error_code,
                        message: error_msg.unwrap_or_default(),
                    });
                }
                debug!(session_id, username, "authenticated");
                Ok(Session {
                    stream: self.stream,
                    session_id,
                    signed_out: false,
                    poisoned: false,
                })
            }
            _ => Err(ClientError::UnexpectedResponse {
                request: request.name(),
            }),
        }
    }
}

/// An authenticated session.
///
/// The session is signed out exactly once: explicitly through
/// [`Session::sign_out`], or best-effort when it is dropped. After a transport
/// error the stream position is unknown and the drop-time sign-out is skipped.
pub struct Session {
    stream: TcpStream,
    session_id: i64,
    signed_out: bool,
    poisoned: bool,
}

impl Session {
    pub fn id(&self) -> i64 {
        self.session_id
    }

    /// True once a transport error has left the stream unusable.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn sign_out(mut self) -> Result<(), ClientError> {
        self.signed_out = true;
        if self.poisoned {
            return Err(ClientError::Closed);
        }
        self.send_signout()
    }

    fn send_signout(&mut self) -> Result<(), ClientError> {
        let request = Request::Signout {
            session_id: self.session_id,
        };
        match self.call(&request)? {
            Response::Ack => {
                info!(session_id = self.session_id, "signed out");
                Ok(())
            }
            _ => Err(ClientError::UnexpectedResponse {
                request: request.name(),
            }),
        }
    }

    fn call(&mut self, request: &Request) -> Result<Response, ClientError> {
        let result = round_trip(&mut self.stream, request);
        if result.is_err() {
            self.poisoned = true;
        }
        result
    }
}

impl Executor for Session {
    fn execute(&mut self, stmt: &str) -> Result<ExecutionResponse, ClientError> {
        let request = Request::Execute {
            session_id: self.session_id,
            stmt: stmt.to_string(),
        };
        match self.call(&request)? {
            Response::Execution(resp) => Ok(resp),
            _ => Err(ClientError::UnexpectedResponse {
                request: request.name(),
            }),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.signed_out {
            return;
        }
        if self.poisoned {
            debug!(session_id = self.session_id, "skipping sign out on a broken stream");
            return;
        }
        self.signed_out = true;
        if let Err(e) = self.send_signout() {
            warn!(session_id = self.session_id, error = %e, "sign out on drop failed");
        }
    }
}

fn round_trip(stream: &mut TcpStream, request: &Request) -> Result<Response, ClientError> {
    wire::send(stream, request)?;
    wire::recv(stream)?.ok_or(ClientError::Closed)
}
