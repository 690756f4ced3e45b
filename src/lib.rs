//! bolt3 — an asynchronous client driver for the Bolt v3 wire protocol.
//!
//! This crate implements the client side of the Bolt binary protocol
//! spoken by Neo4j and compatible graph databases: requests are
//! pipelined onto a single duplex stream, server replies are correlated
//! with the outstanding-request queue, and results are consumed as lazy
//! record streams that read from the transport only on demand.
//!
//! # Architecture
//!
//! - **`packstream`** — Binary encoding/decoding (PackStream format)
//! - **`chunk`** — Message framing (2-byte length-prefixed chunks)
//! - **`message`** — Protocol message types and serialization
//! - **`types`** — Bolt value types
//! - **`handshake`** / **`version`** — Version negotiation (3.0 only)
//! - **`client`** — The session engine: connection, courier,
//!   transactions, result streams

pub mod chunk;
pub mod client;
pub mod error;
pub mod handshake;
pub mod message;
pub mod packstream;
pub mod types;
pub mod version;

pub use client::{
    Auth, Bookmark, BoltConnection, Outcome, QueryResult, Record, RecordKey, Response, Summary,
    Transaction, TxOptions,
};
pub use error::{BoltError, Failure};
pub use types::{BoltDict, BoltValue};
