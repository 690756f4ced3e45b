//! Writes chunked messages to an async byte stream, buffering until an
//! explicit flush.

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::BoltError;

/// Maximum chunk size (2-byte unsigned length = 65535).
const MAX_CHUNK_SIZE: usize = 65535;

/// Writes Bolt-chunked messages to an `AsyncWrite` stream.
///
/// Messages are chunk-encoded into an in-memory buffer by [`enqueue`]
/// and only hit the stream on [`flush`], so that several requests can be
/// pipelined into a single network write.
///
/// [`enqueue`]: ChunkWriter::enqueue
/// [`flush`]: ChunkWriter::flush
#[derive(Debug)]
pub struct ChunkWriter<W> {
    writer: W,
    outbound: BytesMut,
    max_chunk_size: usize,
}

impl<W: AsyncWrite + Unpin> ChunkWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            outbound: BytesMut::new(),
            max_chunk_size: MAX_CHUNK_SIZE,
        }
    }

    /// Appends one message to the outbound buffer, splitting into chunks
    /// if needed and ending with the `0x0000` terminator. Does not touch
    /// the stream.
    pub fn enqueue(&mut self, data: &[u8]) {
        let mut offset = 0;
        while offset < data.len() {
            let end = (offset + self.max_chunk_size).min(data.len());
            let chunk = &data[offset..end];
            self.outbound.put_u16(chunk.len() as u16);
            self.outbound.put_slice(chunk);
            offset = end;
        }
        // Terminator.
        self.outbound.put_u16(0);
    }

    /// Writes the outbound buffer to the stream and flushes it.
    ///
    /// Transport loss surfaces as [`BoltError::ConnectionLost`].
    pub async fn flush(&mut self) -> Result<(), BoltError> {
        let pending = self.outbound.split();
        self.writer
            .write_all(&pending)
            .await
            .map_err(BoltError::from_io)?;
        self.writer.flush().await.map_err(BoltError::from_io)?;
        Ok(())
    }

    /// Shuts down the write half of the stream.
    pub async fn shutdown(&mut self) -> Result<(), BoltError> {
        self.writer.shutdown().await.map_err(BoltError::from_io)?;
        Ok(())
    }

    /// Number of buffered outbound bytes not yet flushed.
    pub fn pending(&self) -> usize {
        self.outbound.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enqueue_buffers_until_flush() {
        let mut output = Vec::new();
        let mut writer = ChunkWriter::new(&mut output);

        writer.enqueue(&[0x01, 0x02, 0x03]);
        // Header + data + terminator, all still buffered.
        assert_eq!(writer.pending(), 7);

        writer.flush().await.unwrap();
        assert_eq!(writer.pending(), 0);
        assert_eq!(
            output,
            vec![
                0x00, 0x03, // length
                0x01, 0x02, 0x03, // data
                0x00, 0x00, // terminator
            ]
        );
    }

    #[tokio::test]
    async fn flush_pipelines_multiple_messages() {
        let mut output = Vec::new();
        let mut writer = ChunkWriter::new(&mut output);

        writer.enqueue(&[0xAA]);
        writer.enqueue(&[0xBB, 0xCC]);
        writer.flush().await.unwrap();

        assert_eq!(
            output,
            vec![0x00, 0x01, 0xAA, 0x00, 0x00, 0x00, 0x02, 0xBB, 0xCC, 0x00, 0x00]
        );
    }

    #[tokio::test]
    async fn enqueue_empty_message() {
        let mut output = Vec::new();
        let mut writer = ChunkWriter::new(&mut output);
        writer.enqueue(&[]);
        writer.flush().await.unwrap();
        // Just the terminator.
        assert_eq!(output, vec![0x00, 0x00]);
    }

    #[tokio::test]
    async fn flush_resets_buffer() {
        let mut output = Vec::new();
        let mut writer = ChunkWriter::new(&mut output);
        writer.enqueue(&[0x01]);
        writer.flush().await.unwrap();
        assert_eq!(writer.pending(), 0);
        writer.flush().await.unwrap();
        assert_eq!(output.len(), 5);
    }
}
