//! Error types for the Bolt v3 driver.

use std::io;
use std::net::SocketAddr;

use crate::client::Response;

/// Errors that can occur while driving a Bolt connection.
#[derive(Debug, thiserror::Error)]
pub enum BoltError {
    /// The transport terminated unexpectedly.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The peer violated the wire protocol. The connection is defunct
    /// and must be closed.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server answered a request with FAILURE.
    #[error(transparent)]
    Failure(#[from] Failure),

    /// Transaction misuse: operating on a closed transaction, explicit
    /// commit/rollback of an auto-commit transaction, or starting a
    /// transaction while another is in progress.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// A transaction option could not be converted to its wire form.
    #[error("invalid value for {option}: {reason}")]
    InvalidOption {
        option: &'static str,
        reason: String,
    },

    /// Any other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl BoltError {
    /// Classifies an I/O error: disconnection kinds become
    /// [`BoltError::ConnectionLost`], everything else stays `Io`.
    pub(crate) fn from_io(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::WriteZero => Self::ConnectionLost(e.to_string()),
            _ => Self::Io(e),
        }
    }

    /// Returns true for [`BoltError::ConnectionLost`].
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Self::ConnectionLost(_))
    }
}

/// A server FAILURE reply.
///
/// Carries the server-assigned status `code` (e.g.
/// `Neo.ClientError.Statement.SyntaxError`), the human-readable message,
/// the address of the server that sent it, and a handle to the response
/// the FAILURE terminated.
#[derive(Debug, Clone, thiserror::Error)]
#[error("server failure {code}: {message}")]
pub struct Failure {
    pub code: String,
    pub message: String,
    pub remote_address: Option<SocketAddr>,
    pub response: Response,
}
