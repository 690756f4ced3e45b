//! Client-side Bolt handshake: magic preamble and version negotiation.

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::BoltError;
use crate::version::{self, BOLT_MAGIC, PROTOCOL_VERSION};

/// Performs the client-side Bolt handshake.
///
/// Sends the magic preamble and the version proposal block (offering
/// 3.0 only), then reads the server's 4-byte reply. Errors if the server
/// rejects all proposals or picks a version other than 3.0.
pub async fn client_handshake<S>(stream: &mut S) -> Result<(u8, u8), BoltError>
where
    S: AsyncReadExt + AsyncWriteExt + Unpin,
{
    stream
        .write_all(&BOLT_MAGIC)
        .await
        .map_err(BoltError::from_io)?;
    stream
        .write_all(&version::client_proposals())
        .await
        .map_err(BoltError::from_io)?;
    stream.flush().await.map_err(BoltError::from_io)?;

    let mut reply = [0u8; 4];
    stream
        .read_exact(&mut reply)
        .await
        .map_err(BoltError::from_io)?;

    match version::parse_negotiated(&reply) {
        Some(negotiated) if negotiated == PROTOCOL_VERSION => Ok(negotiated),
        Some((major, minor)) => Err(BoltError::Protocol(format!(
            "server selected unsupported version {major}.{minor}"
        ))),
        None => Err(BoltError::Protocol(
            "server rejected all proposed versions".into(),
        )),
    }
}
