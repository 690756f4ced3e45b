//! Reads chunked messages from an async byte stream.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::BoltError;

/// Reads Bolt-chunked messages from an `AsyncRead` stream.
///
/// Each message consists of one or more chunks (2-byte big-endian length
/// prefix followed by that many data bytes), terminated by a zero-length
/// chunk (0x0000).
#[derive(Debug)]
pub struct ChunkReader<R> {
    reader: R,
}

impl<R: AsyncRead + Unpin> ChunkReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Reads a complete message (all chunks until the `0x0000` terminator).
    ///
    /// A mid-message disconnect surfaces as
    /// [`BoltError::ConnectionLost`].
    pub async fn read_message(&mut self) -> Result<BytesMut, BoltError> {
        let mut message = BytesMut::new();

        loop {
            let mut header = [0u8; 2];
            self.reader
                .read_exact(&mut header)
                .await
                .map_err(BoltError::from_io)?;
            let chunk_len = u16::from_be_bytes(header) as usize;

            if chunk_len == 0 {
                // End of message.
                break;
            }

            // Grow the message and read the chunk straight into it.
            let start = message.len();
            message.resize(start + chunk_len, 0);
            self.reader
                .read_exact(&mut message[start..])
                .await
                .map_err(BoltError::from_io)?;
        }

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn read_single_chunk_message() {
        // One chunk of 3 bytes + terminator.
        let data: Vec<u8> = vec![
            0x00, 0x03, // chunk length = 3
            0x01, 0x02, 0x03, // data
            0x00, 0x00, // terminator
        ];
        let mut reader = ChunkReader::new(Cursor::new(data));
        let msg = reader.read_message().await.unwrap();
        assert_eq!(&msg[..], &[0x01, 0x02, 0x03]);
    }

    #[tokio::test]
    async fn read_multi_chunk_message() {
        let data: Vec<u8> = vec![
            0x00, 0x02, 0xAA, 0xBB, // chunk 1: 2 bytes
            0x00, 0x01, 0xCC, // chunk 2: 1 byte
            0x00, 0x00, // terminator
        ];
        let mut reader = ChunkReader::new(Cursor::new(data));
        let msg = reader.read_message().await.unwrap();
        assert_eq!(&msg[..], &[0xAA, 0xBB, 0xCC]);
    }

    #[tokio::test]
    async fn read_empty_message() {
        // Just a terminator (no data chunks).
        let data: Vec<u8> = vec![0x00, 0x00];
        let mut reader = ChunkReader::new(Cursor::new(data));
        let msg = reader.read_message().await.unwrap();
        assert!(msg.is_empty());
    }

    #[tokio::test]
    async fn consecutive_messages_from_one_stream() {
        let data: Vec<u8> = vec![
            0x00, 0x01, 0x11, 0x00, 0x00, // message 1
            0x00, 0x01, 0x22, 0x00, 0x00, // message 2
        ];
        let mut reader = ChunkReader::new(Cursor::new(data));
        assert_eq!(&reader.read_message().await.unwrap()[..], &[0x11]);
        assert_eq!(&reader.read_message().await.unwrap()[..], &[0x22]);
    }

    #[tokio::test]
    async fn truncated_stream_is_connection_lost() {
        // Header promises 3 bytes but the stream ends after 1.
        let data: Vec<u8> = vec![0x00, 0x03, 0x01];
        let mut reader = ChunkReader::new(Cursor::new(data));
        let err = reader.read_message().await.unwrap_err();
        assert!(err.is_connection_lost());
    }
}
