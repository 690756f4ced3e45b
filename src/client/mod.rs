//! The Bolt v3 session engine: connection lifecycle, pipelined request
//! courier, transactions, and lazy result streams.

mod connection;
mod courier;
mod record;
mod response;
mod result;
mod summary;
mod transaction;

pub use connection::{Auth, BoltConnection, DEFAULT_USER_AGENT};
pub use courier::{CREDENTIAL_MASK, Courier};
pub use record::{Record, RecordKey};
pub use response::Response;
pub use result::QueryResult;
pub use summary::{Bookmark, Outcome, Summary};
pub use transaction::{Transaction, TxOptions};

#[cfg(test)]
pub(crate) mod testkit {
    //! A scripted peer for driving the engine over an in-memory duplex
    //! stream: replies are pre-encoded with the crate's own codec, and
    //! requests the engine flushed can be read back and asserted on.

    use std::time::Duration;

    use bytes::BytesMut;
    use tokio::io::{AsyncReadExt, DuplexStream};

    use crate::chunk::{ChunkReader, ChunkWriter};
    use crate::message::decode::decode_client_message;
    use crate::message::encode::encode_server_message;
    use crate::message::{ClientMessage, ServerMessage};
    use crate::types::{BoltDict, BoltValue};

    /// Writes the given replies into the pipe, ready for the engine to
    /// fetch.
    pub(crate) async fn push_replies(server: &mut DuplexStream, replies: &[ServerMessage]) {
        let mut writer = ChunkWriter::new(server);
        for reply in replies {
            let mut buf = BytesMut::new();
            encode_server_message(&mut buf, reply);
            writer.enqueue(&buf);
        }
        writer.flush().await.unwrap();
    }

    /// Reads the next request the engine flushed.
    pub(crate) async fn recv_request(server: &mut DuplexStream) -> ClientMessage {
        let mut reader = ChunkReader::new(server);
        let data = reader.read_message().await.unwrap();
        decode_client_message(&data).unwrap()
    }

    /// Asserts the engine has flushed nothing (within a short grace
    /// period); EOF counts as nothing.
    pub(crate) async fn assert_no_request(server: &mut DuplexStream) {
        let mut byte = [0u8; 1];
        match tokio::time::timeout(Duration::from_millis(50), server.read(&mut byte)).await {
            Err(_) => {}
            Ok(Ok(0)) => {}
            Ok(read) => panic!("unexpected bytes from client: {read:?}"),
        }
    }

    pub(crate) fn success(entries: &[(&str, BoltValue)]) -> ServerMessage {
        ServerMessage::Success {
            metadata: entries
                .iter()
                .map(|(k, v)| ((*k).to_owned(), v.clone()))
                .collect(),
        }
    }

    pub(crate) fn record(values: Vec<BoltValue>) -> ServerMessage {
        ServerMessage::Record { data: values }
    }

    pub(crate) fn failure(code: &str, message: &str) -> ServerMessage {
        ServerMessage::Failure {
            metadata: BoltDict::from([
                ("code".to_string(), BoltValue::String(code.into())),
                ("message".to_string(), BoltValue::String(message.into())),
            ]),
        }
    }

    /// A SUCCESS header naming the result columns.
    pub(crate) fn fields_header(names: &[&str]) -> ServerMessage {
        success(&[(
            "fields",
            BoltValue::List(
                names
                    .iter()
                    .map(|n| BoltValue::String((*n).to_owned()))
                    .collect(),
            ),
        )])
    }
}
