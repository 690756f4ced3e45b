//! Server-to-client Bolt v3 messages.

use crate::types::{BoltDict, BoltValue};

/// A message sent from the server to the client.
///
/// These four are the only server-initiated messages in Bolt v3; each
/// one answers the request at the head of the outstanding queue.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// The request completed; `metadata` carries its summary.
    Success { metadata: BoltDict },

    /// One row of a result stream.
    Record { data: Vec<BoltValue> },

    /// The request was skipped because an earlier one failed.
    Ignored,

    /// The request failed; `metadata` carries `code` and `message`.
    Failure { metadata: BoltDict },
}
