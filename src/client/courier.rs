//! Request writer, reply dispatcher, and the outstanding-response queue.

use std::collections::VecDeque;
use std::net::SocketAddr;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tracing::debug;

use super::response::Response;
use super::summary::{Outcome, Summary};
use crate::chunk::{ChunkReader, ChunkWriter};
use crate::error::{BoltError, Failure};
use crate::message::decode::decode_server_message;
use crate::message::encode::encode_client_message;
use crate::message::{ClientMessage, ServerMessage};
use crate::types::{BoltDict, BoltValue};

/// The fixed string that replaces credentials in log output.
pub const CREDENTIAL_MASK: &str = "*******";

/// Owns the duplex stream and the queue of outstanding responses.
///
/// Every request is chunk-encoded into the outbound buffer by a
/// `write_*` method, which also appends a fresh [`Response`] to the
/// queue and returns its handle; nothing reaches the network until
/// [`send`]. Inbound messages are dispatched strictly to the queue
/// head: RECORD appends to it, any summary resolves and dequeues it.
/// The server replies in request order, so queue order is all the
/// correlation needed.
///
/// [`send`]: Courier::send
#[derive(Debug)]
pub struct Courier<S> {
    reader: ChunkReader<ReadHalf<S>>,
    writer: ChunkWriter<WriteHalf<S>>,
    responses: VecDeque<Response>,
    local_address: Option<SocketAddr>,
    remote_address: Option<SocketAddr>,
    defunct: bool,
}

impl<S: AsyncRead + AsyncWrite> Courier<S> {
    pub fn new(stream: S) -> Self {
        Self::with_addresses(stream, None, None)
    }

    pub fn with_addresses(
        stream: S,
        local_address: Option<SocketAddr>,
        remote_address: Option<SocketAddr>,
    ) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            reader: ChunkReader::new(read_half),
            writer: ChunkWriter::new(write_half),
            responses: VecDeque::new(),
            local_address,
            remote_address,
            defunct: false,
        }
    }

    /// The local port, used to tell connections apart in log output.
    pub fn local_channel_id(&self) -> u16 {
        self.local_address.map(|addr| addr.port()).unwrap_or(0)
    }

    pub fn local_address(&self) -> Option<SocketAddr> {
        self.local_address
    }

    pub fn remote_address(&self) -> Option<SocketAddr> {
        self.remote_address
    }

    /// True once the peer has violated the protocol; the connection
    /// must not be used further.
    pub fn is_defunct(&self) -> bool {
        self.defunct
    }

    /// Number of requests awaiting a reply.
    pub fn outstanding(&self) -> usize {
        self.responses.len()
    }

    pub fn write_hello(&mut self, extras: BoltDict) -> Response {
        debug!(
            "[#{:04X}] C: HELLO {:?}",
            self.local_channel_id(),
            redact_credentials(&extras)
        );
        self.enqueue_request(&ClientMessage::Hello { extras })
    }

    pub fn write_goodbye(&mut self) -> Response {
        debug!("[#{:04X}] C: GOODBYE", self.local_channel_id());
        self.enqueue_request(&ClientMessage::Goodbye)
    }

    pub fn write_reset(&mut self) -> Response {
        debug!("[#{:04X}] C: RESET", self.local_channel_id());
        self.enqueue_request(&ClientMessage::Reset)
    }

    pub fn write_run(&mut self, cypher: &str, parameters: BoltDict, extras: BoltDict) -> Response {
        debug!(
            "[#{:04X}] C: RUN {:?} {:?} {:?}",
            self.local_channel_id(),
            cypher,
            parameters,
            extras
        );
        self.enqueue_request(&ClientMessage::Run {
            cypher: cypher.to_owned(),
            parameters,
            extras,
        })
    }

    pub fn write_begin(&mut self, extras: BoltDict) -> Response {
        debug!("[#{:04X}] C: BEGIN {:?}", self.local_channel_id(), extras);
        self.enqueue_request(&ClientMessage::Begin { extras })
    }

    pub fn write_commit(&mut self) -> Response {
        debug!("[#{:04X}] C: COMMIT", self.local_channel_id());
        self.enqueue_request(&ClientMessage::Commit)
    }

    pub fn write_rollback(&mut self) -> Response {
        debug!("[#{:04X}] C: ROLLBACK", self.local_channel_id());
        self.enqueue_request(&ClientMessage::Rollback)
    }

    pub fn write_discard_all(&mut self) -> Response {
        debug!("[#{:04X}] C: DISCARD_ALL", self.local_channel_id());
        self.enqueue_request(&ClientMessage::DiscardAll)
    }

    pub fn write_pull_all(&mut self) -> Response {
        debug!("[#{:04X}] C: PULL_ALL", self.local_channel_id());
        self.enqueue_request(&ClientMessage::PullAll)
    }

    fn enqueue_request(&mut self, message: &ClientMessage) -> Response {
        let mut buf = BytesMut::new();
        encode_client_message(&mut buf, message);
        self.writer.enqueue(&buf);
        let response = Response::new();
        self.responses.push_back(response.clone());
        response
    }

    /// Flushes all buffered requests to the transport.
    pub async fn send(&mut self) -> Result<(), BoltError> {
        debug!("[#{:04X}] C: <SEND>", self.local_channel_id());
        self.writer.flush().await
    }

    /// Reads and dispatches replies until every outstanding response is
    /// resolved.
    pub async fn fetch_all(&mut self) -> Result<(), BoltError> {
        self.fetch_until(|| false).await
    }

    /// Reads and dispatches replies while the queue is non-empty and
    /// `stop` returns false; `stop` is checked before each read.
    ///
    /// Consuming a FAILURE resolves and dequeues the head response and
    /// then returns the failure as an error instead of reading on.
    pub async fn fetch_until(&mut self, stop: impl Fn() -> bool) -> Result<(), BoltError> {
        while !self.responses.is_empty() && !stop() {
            match self.read_reply().await? {
                ServerMessage::Record { data } => {
                    if let Some(head) = self.responses.front() {
                        head.put_record(data);
                    }
                }
                ServerMessage::Success { metadata } => {
                    if let Some(response) = self.responses.pop_front() {
                        response.put_summary(Outcome::Summary(Summary::new(metadata, true)));
                    }
                }
                ServerMessage::Ignored => {
                    if let Some(response) = self.responses.pop_front() {
                        response.put_summary(Outcome::Ignored);
                    }
                }
                ServerMessage::Failure { metadata } => {
                    let summary = Summary::new(metadata, false);
                    let code = summary.code().unwrap_or_default().to_owned();
                    let message = summary.message().unwrap_or_default().to_owned();
                    if let Some(response) = self.responses.pop_front() {
                        response.put_summary(Outcome::Summary(summary));
                        return Err(Failure {
                            code,
                            message,
                            remote_address: self.remote_address,
                            response,
                        }
                        .into());
                    }
                }
            }
        }
        Ok(())
    }

    async fn read_reply(&mut self) -> Result<ServerMessage, BoltError> {
        let data = self.reader.read_message().await?;
        let message = match decode_server_message(&data) {
            Ok(message) => message,
            Err(e) => {
                self.defunct = true;
                return Err(e);
            }
        };
        match &message {
            ServerMessage::Success { metadata } => {
                debug!("[#{:04X}] S: SUCCESS {:?}", self.local_channel_id(), metadata);
            }
            ServerMessage::Record { data } => {
                debug!("[#{:04X}] S: RECORD {:?}", self.local_channel_id(), data);
            }
            ServerMessage::Ignored => {
                debug!("[#{:04X}] S: IGNORED", self.local_channel_id());
            }
            ServerMessage::Failure { metadata } => {
                debug!("[#{:04X}] S: FAILURE {:?}", self.local_channel_id(), metadata);
            }
        }
        Ok(message)
    }

    /// Shuts down the write half of the transport.
    pub async fn shutdown(&mut self) -> Result<(), BoltError> {
        self.writer.shutdown().await
    }
}

/// Copies HELLO extras with the `credentials` entry replaced by
/// [`CREDENTIAL_MASK`], for logging.
pub(crate) fn redact_credentials(extras: &BoltDict) -> BoltDict {
    let mut logged = extras.clone();
    if logged.contains_key("credentials") {
        logged.insert(
            "credentials".to_owned(),
            BoltValue::String(CREDENTIAL_MASK.to_owned()),
        );
    }
    logged
}
