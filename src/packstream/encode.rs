//! PackStream encoding: `BoltValue` → bytes.

use bytes::{BufMut, BytesMut};

use super::marker;
use crate::types::{BoltDict, BoltValue};

/// Encodes a `BoltValue` into the buffer using PackStream format.
pub fn encode_value(buf: &mut BytesMut, value: &BoltValue) {
    match value {
        BoltValue::Null => encode_null(buf),
        BoltValue::Boolean(b) => encode_bool(buf, *b),
        BoltValue::Integer(i) => encode_int(buf, *i),
        BoltValue::Float(f) => encode_float(buf, *f),
        BoltValue::String(s) => encode_string(buf, s),
        BoltValue::Bytes(b) => encode_bytes(buf, b),
        BoltValue::List(items) => encode_list(buf, items),
        BoltValue::Dict(dict) => encode_dict(buf, dict),
        BoltValue::Structure { tag, fields } => {
            encode_struct_header(buf, *tag, fields.len() as u8);
            for field in fields {
                encode_value(buf, field);
            }
        }
    }
}

pub fn encode_null(buf: &mut BytesMut) {
    buf.put_u8(marker::NULL);
}

pub fn encode_bool(buf: &mut BytesMut, value: bool) {
    buf.put_u8(if value { marker::TRUE } else { marker::FALSE });
}

/// Encodes an integer using the smallest possible PackStream representation.
pub fn encode_int(buf: &mut BytesMut, value: i64) {
    if (-16..=127).contains(&value) {
        // TINY_INT: single byte
        buf.put_u8(value as u8);
    } else if i64::from(i8::MIN) <= value && value <= i64::from(i8::MAX) {
        buf.put_u8(marker::INT_8);
        buf.put_i8(value as i8);
    } else if i64::from(i16::MIN) <= value && value <= i64::from(i16::MAX) {
        buf.put_u8(marker::INT_16);
        buf.put_i16(value as i16);
    } else if i64::from(i32::MIN) <= value && value <= i64::from(i32::MAX) {
        buf.put_u8(marker::INT_32);
        buf.put_i32(value as i32);
    } else {
        buf.put_u8(marker::INT_64);
        buf.put_i64(value);
    }
}

pub fn encode_float(buf: &mut BytesMut, value: f64) {
    buf.put_u8(marker::FLOAT_64);
    buf.put_f64(value);
}

/// Encodes a string (size = byte length, not char count).
pub fn encode_string(buf: &mut BytesMut, value: &str) {
    let len = value.len();
    if len <= 15 {
        buf.put_u8(marker::TINY_STRING_NIBBLE | len as u8);
    } else if len <= 255 {
        buf.put_u8(marker::STRING_8);
        buf.put_u8(len as u8);
    } else if len <= 65535 {
        buf.put_u8(marker::STRING_16);
        buf.put_u16(len as u16);
    } else {
        buf.put_u8(marker::STRING_32);
        buf.put_u32(len as u32);
    }
    buf.put_slice(value.as_bytes());
}

pub fn encode_bytes(buf: &mut BytesMut, value: &[u8]) {
    let len = value.len();
    if len <= 255 {
        buf.put_u8(marker::BYTES_8);
        buf.put_u8(len as u8);
    } else if len <= 65535 {
        buf.put_u8(marker::BYTES_16);
        buf.put_u16(len as u16);
    } else {
        buf.put_u8(marker::BYTES_32);
        buf.put_u32(len as u32);
    }
    buf.put_slice(value);
}

pub fn encode_list(buf: &mut BytesMut, items: &[BoltValue]) {
    let len = items.len();
    if len <= 15 {
        buf.put_u8(marker::TINY_LIST_NIBBLE | len as u8);
    } else if len <= 255 {
        buf.put_u8(marker::LIST_8);
        buf.put_u8(len as u8);
    } else if len <= 65535 {
        buf.put_u8(marker::LIST_16);
        buf.put_u16(len as u16);
    } else {
        buf.put_u8(marker::LIST_32);
        buf.put_u32(len as u32);
    }
    for item in items {
        encode_value(buf, item);
    }
}

pub fn encode_dict(buf: &mut BytesMut, dict: &BoltDict) {
    let len = dict.len();
    if len <= 15 {
        buf.put_u8(marker::TINY_DICT_NIBBLE | len as u8);
    } else if len <= 255 {
        buf.put_u8(marker::DICT_8);
        buf.put_u8(len as u8);
    } else if len <= 65535 {
        buf.put_u8(marker::DICT_16);
        buf.put_u16(len as u16);
    } else {
        buf.put_u8(marker::DICT_32);
        buf.put_u32(len as u32);
    }
    for (key, value) in dict {
        encode_string(buf, key);
        encode_value(buf, value);
    }
}

/// Encodes a structure header (marker nibble + field count + tag byte).
pub fn encode_struct_header(buf: &mut BytesMut, tag: u8, field_count: u8) {
    buf.put_u8(marker::TINY_STRUCT_NIBBLE | field_count);
    buf.put_u8(tag);
}
