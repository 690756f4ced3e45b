//! Encode Bolt v3 messages to PackStream bytes.

use bytes::BytesMut;

use super::{ClientMessage, ServerMessage, sig};
use crate::packstream::encode as ps;

/// Encodes a client message into PackStream bytes.
pub fn encode_client_message(buf: &mut BytesMut, msg: &ClientMessage) {
    match msg {
        ClientMessage::Hello { extras } => {
            ps::encode_struct_header(buf, sig::HELLO, 1);
            ps::encode_dict(buf, extras);
        }
        ClientMessage::Goodbye => {
            ps::encode_struct_header(buf, sig::GOODBYE, 0);
        }
        ClientMessage::Reset => {
            ps::encode_struct_header(buf, sig::RESET, 0);
        }
        ClientMessage::Run {
            cypher,
            parameters,
            extras,
        } => {
            ps::encode_struct_header(buf, sig::RUN, 3);
            ps::encode_string(buf, cypher);
            ps::encode_dict(buf, parameters);
            ps::encode_dict(buf, extras);
        }
        ClientMessage::Begin { extras } => {
            ps::encode_struct_header(buf, sig::BEGIN, 1);
            ps::encode_dict(buf, extras);
        }
        ClientMessage::Commit => {
            ps::encode_struct_header(buf, sig::COMMIT, 0);
        }
        ClientMessage::Rollback => {
            ps::encode_struct_header(buf, sig::ROLLBACK, 0);
        }
        ClientMessage::DiscardAll => {
            ps::encode_struct_header(buf, sig::DISCARD_ALL, 0);
        }
        ClientMessage::PullAll => {
            ps::encode_struct_header(buf, sig::PULL_ALL, 0);
        }
    }
}

/// Encodes a server message into PackStream bytes.
pub fn encode_server_message(buf: &mut BytesMut, msg: &ServerMessage) {
    match msg {
        ServerMessage::Success { metadata } => {
            ps::encode_struct_header(buf, sig::SUCCESS, 1);
            ps::encode_dict(buf, metadata);
        }
        ServerMessage::Record { data } => {
            ps::encode_struct_header(buf, sig::RECORD, 1);
            ps::encode_list(buf, data);
        }
        ServerMessage::Ignored => {
            ps::encode_struct_header(buf, sig::IGNORED, 0);
        }
        ServerMessage::Failure { metadata } => {
            ps::encode_struct_header(buf, sig::FAILURE, 1);
            ps::encode_dict(buf, metadata);
        }
    }
}
