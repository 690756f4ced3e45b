//! PackStream decoding: bytes → `BoltValue`.

use bytes::Buf;

use super::marker;
use crate::error::BoltError;
use crate::types::{BoltDict, BoltValue};

/// Decodes a single `BoltValue` from the buffer.
pub fn decode_value(buf: &mut impl Buf) -> Result<BoltValue, BoltError> {
    if !buf.has_remaining() {
        return Err(BoltError::Protocol("unexpected end of data".into()));
    }

    let m = buf.get_u8();
    match m {
        // Null
        marker::NULL => Ok(BoltValue::Null),

        // Boolean
        marker::FALSE => Ok(BoltValue::Boolean(false)),
        marker::TRUE => Ok(BoltValue::Boolean(true)),

        // Float
        marker::FLOAT_64 => {
            ensure_remaining(buf, 8)?;
            Ok(BoltValue::Float(buf.get_f64()))
        }

        // Integer markers
        marker::INT_8 => {
            ensure_remaining(buf, 1)?;
            Ok(BoltValue::Integer(i64::from(buf.get_i8())))
        }
        marker::INT_16 => {
            ensure_remaining(buf, 2)?;
            Ok(BoltValue::Integer(i64::from(buf.get_i16())))
        }
        marker::INT_32 => {
            ensure_remaining(buf, 4)?;
            Ok(BoltValue::Integer(i64::from(buf.get_i32())))
        }
        marker::INT_64 => {
            ensure_remaining(buf, 8)?;
            Ok(BoltValue::Integer(buf.get_i64()))
        }

        // Bytes
        marker::BYTES_8 => {
            ensure_remaining(buf, 1)?;
            let len = buf.get_u8() as usize;
            decode_bytes_data(buf, len)
        }
        marker::BYTES_16 => {
            ensure_remaining(buf, 2)?;
            let len = buf.get_u16() as usize;
            decode_bytes_data(buf, len)
        }
        marker::BYTES_32 => {
            ensure_remaining(buf, 4)?;
            let len = buf.get_u32() as usize;
            decode_bytes_data(buf, len)
        }

        // String (longer)
        marker::STRING_8 => {
            ensure_remaining(buf, 1)?;
            let len = buf.get_u8() as usize;
            decode_string_data(buf, len)
        }
        marker::STRING_16 => {
            ensure_remaining(buf, 2)?;
            let len = buf.get_u16() as usize;
            decode_string_data(buf, len)
        }
        marker::STRING_32 => {
            ensure_remaining(buf, 4)?;
            let len = buf.get_u32() as usize;
            decode_string_data(buf, len)
        }

        // List (longer)
        marker::LIST_8 => {
            ensure_remaining(buf, 1)?;
            let len = buf.get_u8() as usize;
            decode_list_data(buf, len)
        }
        marker::LIST_16 => {
            ensure_remaining(buf, 2)?;
            let len = buf.get_u16() as usize;
            decode_list_data(buf, len)
        }
        marker::LIST_32 => {
            ensure_remaining(buf, 4)?;
            let len = buf.get_u32() as usize;
            decode_list_data(buf, len)
        }

        // Dict (longer)
        marker::DICT_8 => {
            ensure_remaining(buf, 1)?;
            let len = buf.get_u8() as usize;
            decode_dict_data(buf, len)
        }
        marker::DICT_16 => {
            ensure_remaining(buf, 2)?;
            let len = buf.get_u16() as usize;
            decode_dict_data(buf, len)
        }
        marker::DICT_32 => {
            ensure_remaining(buf, 4)?;
            let len = buf.get_u32() as usize;
            decode_dict_data(buf, len)
        }

        // Tiny types and other ranges
        _ => {
            let high = m & 0xF0;
            let low = m & 0x0F;

            match high {
                // TINY_STRING: 0x80..=0x8F
                0x80 => decode_string_data(buf, low as usize),

                // TINY_LIST: 0x90..=0x9F
                0x90 => decode_list_data(buf, low as usize),

                // TINY_DICT: 0xA0..=0xAF
                0xA0 => decode_dict_data(buf, low as usize),

                // TINY_STRUCT: 0xB0..=0xBF
                0xB0 => {
                    ensure_remaining(buf, 1)?;
                    let tag = buf.get_u8();
                    let mut fields = Vec::with_capacity(low as usize);
                    for _ in 0..low {
                        fields.push(decode_value(buf)?);
                    }
                    Ok(BoltValue::Structure { tag, fields })
                }

                // TINY_INT positive: 0x00..=0x7F
                _ if m <= 0x7F => Ok(BoltValue::Integer(i64::from(m))),

                // TINY_INT negative: 0xF0..=0xFF (-16..-1)
                _ if m >= 0xF0 => Ok(BoltValue::Integer(i64::from(m as i8))),

                _ => Err(BoltError::Protocol(format!(
                    "unknown PackStream marker: 0x{m:02X}"
                ))),
            }
        }
    }
}

fn ensure_remaining(buf: &impl Buf, needed: usize) -> Result<(), BoltError> {
    if buf.remaining() < needed {
        Err(BoltError::Protocol(format!(
            "need {needed} bytes but only {} remaining",
            buf.remaining()
        )))
    } else {
        Ok(())
    }
}

fn decode_bytes_data(buf: &mut impl Buf, len: usize) -> Result<BoltValue, BoltError> {
    ensure_remaining(buf, len)?;
    let mut data = vec![0u8; len];
    buf.copy_to_slice(&mut data);
    Ok(BoltValue::Bytes(data))
}

fn decode_string_data(buf: &mut impl Buf, len: usize) -> Result<BoltValue, BoltError> {
    ensure_remaining(buf, len)?;
    let mut data = vec![0u8; len];
    buf.copy_to_slice(&mut data);
    let s = String::from_utf8(data)
        .map_err(|e| BoltError::Protocol(format!("invalid UTF-8 in string: {e}")))?;
    Ok(BoltValue::String(s))
}

fn decode_list_data(buf: &mut impl Buf, len: usize) -> Result<BoltValue, BoltError> {
    let mut items = Vec::with_capacity(len.min(1024));
    for _ in 0..len {
        items.push(decode_value(buf)?);
    }
    Ok(BoltValue::List(items))
}

fn decode_dict_data(buf: &mut impl Buf, len: usize) -> Result<BoltValue, BoltError> {
    let mut dict = BoltDict::with_capacity(len.min(1024));
    for _ in 0..len {
        let key = match decode_value(buf)? {
            BoltValue::String(s) => s,
            other => {
                return Err(BoltError::Protocol(format!(
                    "dictionary key must be a string, got: {other}"
                )));
            }
        };
        dict.insert(key, decode_value(buf)?);
    }
    Ok(BoltValue::Dict(dict))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packstream::encode::encode_value;
    use bytes::BytesMut;

    fn round_trip(value: &BoltValue) -> BoltValue {
        let mut buf = BytesMut::new();
        encode_value(&mut buf, value);
        decode_value(&mut &buf[..]).expect("decode failed")
    }

    #[test]
    fn round_trip_scalars() {
        for value in [
            BoltValue::Null,
            BoltValue::Boolean(true),
            BoltValue::Boolean(false),
            BoltValue::Float(2.5),
            BoltValue::String("hello".into()),
            BoltValue::Bytes(vec![0xDE, 0xAD]),
        ] {
            assert_eq!(round_trip(&value), value);
        }
    }

    #[test]
    fn round_trip_integer_widths() {
        for i in [
            0,
            1,
            -1,
            -16,
            127,
            -17,
            -128,
            128,
            32767,
            -32768,
            32768,
            i64::from(i32::MAX),
            i64::from(i32::MIN),
            i64::MAX,
            i64::MIN,
        ] {
            assert_eq!(round_trip(&BoltValue::Integer(i)), BoltValue::Integer(i));
        }
    }

    #[test]
    fn round_trip_long_string() {
        let s: String = "x".repeat(300);
        assert_eq!(
            round_trip(&BoltValue::String(s.clone())),
            BoltValue::String(s)
        );
    }

    #[test]
    fn round_trip_collections() {
        let list = BoltValue::List(vec![
            BoltValue::Integer(1),
            BoltValue::String("two".into()),
            BoltValue::Null,
        ]);
        assert_eq!(round_trip(&list), list);

        let dict = BoltValue::Dict(BoltDict::from([
            ("a".to_string(), BoltValue::Integer(1)),
            ("b".to_string(), BoltValue::List(vec![BoltValue::Float(0.5)])),
        ]));
        assert_eq!(round_trip(&dict), dict);
    }

    #[test]
    fn round_trip_structure() {
        // A Date structure as a server would send it; kept generic.
        let value = BoltValue::Structure {
            tag: 0x44,
            fields: vec![BoltValue::Integer(18262)],
        };
        assert_eq!(round_trip(&value), value);
    }

    #[test]
    fn tiny_int_boundaries() {
        let mut buf = BytesMut::new();
        encode_value(&mut buf, &BoltValue::Integer(127));
        assert_eq!(&buf[..], &[0x7F]);

        let mut buf = BytesMut::new();
        encode_value(&mut buf, &BoltValue::Integer(-16));
        assert_eq!(&buf[..], &[0xF0]);
    }

    #[test]
    fn truncated_input_is_protocol_error() {
        let data = [marker::INT_32, 0x00];
        let err = decode_value(&mut &data[..]).unwrap_err();
        assert!(matches!(err, BoltError::Protocol(_)));
    }
}
