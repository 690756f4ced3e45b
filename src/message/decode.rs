//! Decode Bolt v3 messages from PackStream bytes.

use bytes::Buf;

use super::{ClientMessage, ServerMessage, sig};
use crate::error::BoltError;
use crate::packstream::decode::decode_value;
use crate::packstream::marker;
use crate::types::{BoltDict, BoltValue};

/// Decodes a client message from PackStream bytes.
pub fn decode_client_message(data: &[u8]) -> Result<ClientMessage, BoltError> {
    let mut buf = data;
    let (tag, field_count) = read_struct_header(&mut buf)?;

    match tag {
        sig::HELLO => {
            expect_fields("HELLO", field_count, 1)?;
            let extras = require_dict(decode_value(&mut buf)?)?;
            Ok(ClientMessage::Hello { extras })
        }
        sig::GOODBYE => Ok(ClientMessage::Goodbye),
        sig::RESET => Ok(ClientMessage::Reset),
        sig::RUN => {
            expect_fields("RUN", field_count, 3)?;
            let cypher = require_string(decode_value(&mut buf)?)?;
            let parameters = require_dict(decode_value(&mut buf)?)?;
            let extras = require_dict(decode_value(&mut buf)?)?;
            Ok(ClientMessage::Run {
                cypher,
                parameters,
                extras,
            })
        }
        sig::BEGIN => {
            expect_fields("BEGIN", field_count, 1)?;
            let extras = require_dict(decode_value(&mut buf)?)?;
            Ok(ClientMessage::Begin { extras })
        }
        sig::COMMIT => Ok(ClientMessage::Commit),
        sig::ROLLBACK => Ok(ClientMessage::Rollback),
        sig::DISCARD_ALL => Ok(ClientMessage::DiscardAll),
        sig::PULL_ALL => Ok(ClientMessage::PullAll),
        _ => Err(BoltError::Protocol(format!(
            "illegal message structure tag: 0x{tag:02X}"
        ))),
    }
}

/// Decodes a server message from PackStream bytes.
pub fn decode_server_message(data: &[u8]) -> Result<ServerMessage, BoltError> {
    let mut buf = data;
    let (tag, field_count) = read_struct_header(&mut buf)?;

    match tag {
        sig::SUCCESS => {
            expect_fields("SUCCESS", field_count, 1)?;
            let metadata = require_dict(decode_value(&mut buf)?)?;
            Ok(ServerMessage::Success { metadata })
        }
        sig::RECORD => {
            expect_fields("RECORD", field_count, 1)?;
            let data = require_list(decode_value(&mut buf)?)?;
            Ok(ServerMessage::Record { data })
        }
        sig::IGNORED => Ok(ServerMessage::Ignored),
        sig::FAILURE => {
            expect_fields("FAILURE", field_count, 1)?;
            let metadata = require_dict(decode_value(&mut buf)?)?;
            Ok(ServerMessage::Failure { metadata })
        }
        _ => Err(BoltError::Protocol(format!(
            "illegal message structure tag: 0x{tag:02X}"
        ))),
    }
}

/// Reads the structure marker and tag byte. A payload that is not a
/// PackStream structure is an illegal message.
fn read_struct_header(buf: &mut &[u8]) -> Result<(u8, u8), BoltError> {
    let m = read_u8(buf)?;
    if m & 0xF0 != marker::TINY_STRUCT_NIBBLE {
        return Err(BoltError::Protocol(format!(
            "illegal message: expected a structure, got marker 0x{m:02X}"
        )));
    }
    let field_count = m & 0x0F;
    let tag = read_u8(buf)?;
    Ok((tag, field_count))
}

fn read_u8(buf: &mut &[u8]) -> Result<u8, BoltError> {
    if buf.has_remaining() {
        Ok(buf.get_u8())
    } else {
        Err(BoltError::Protocol("unexpected end of message".into()))
    }
}

fn expect_fields(msg_name: &str, got: u8, expected: u8) -> Result<(), BoltError> {
    if got < expected {
        Err(BoltError::Protocol(format!(
            "{msg_name} expects at least {expected} fields, got {got}"
        )))
    } else {
        Ok(())
    }
}

fn require_string(v: BoltValue) -> Result<String, BoltError> {
    match v {
        BoltValue::String(s) => Ok(s),
        other => Err(BoltError::Protocol(format!(
            "expected string, got: {other}"
        ))),
    }
}

fn require_dict(v: BoltValue) -> Result<BoltDict, BoltError> {
    match v {
        BoltValue::Dict(d) => Ok(d),
        other => Err(BoltError::Protocol(format!("expected dict, got: {other}"))),
    }
}

fn require_list(v: BoltValue) -> Result<Vec<BoltValue>, BoltError> {
    match v {
        BoltValue::List(l) => Ok(l),
        other => Err(BoltError::Protocol(format!("expected list, got: {other}"))),
    }
}
