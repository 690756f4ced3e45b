//! Bolt message framing (2-byte length-prefixed chunks).

pub mod reader;
pub mod writer;

pub use reader::ChunkReader;
pub use writer::ChunkWriter;
