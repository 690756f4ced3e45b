//! Client-to-server Bolt v3 messages.

use crate::types::BoltDict;

/// A message sent from the client to the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Initialize and authenticate the connection. Sent once after the
    /// handshake.
    Hello { extras: BoltDict },

    /// Gracefully close the connection.
    Goodbye,

    /// Reset the connection to a clean state, aborting any pending work.
    Reset,

    /// Execute a query (auto-commit or within a transaction).
    Run {
        cypher: String,
        parameters: BoltDict,
        extras: BoltDict,
    },

    /// Begin an explicit transaction.
    Begin { extras: BoltDict },

    /// Commit the current explicit transaction.
    Commit,

    /// Roll back the current explicit transaction.
    Rollback,

    /// Discard all records of the last RUN, keeping its summary.
    DiscardAll,

    /// Stream all records of the last RUN.
    PullAll,
}
