//! PackStream marker byte constants.
//!
//! Values in the tiny ranges carry their size in the marker's low
//! nibble and need no constant here:
//! TINY_INT `0x00..=0x7F` / `0xF0..=0xFF`, TINY_STRING `0x80..=0x8F`,
//! TINY_LIST `0x90..=0x9F`, TINY_DICT `0xA0..=0xAF`, and TINY_STRUCT
//! `0xB0..=0xBF`.

// Singletons.
pub const NULL: u8 = 0xC0;
pub const FALSE: u8 = 0xC2;
pub const TRUE: u8 = 0xC3;

// IEEE 754 double-precision float.
pub const FLOAT_64: u8 = 0xC1;

// Integers beyond the TINY_INT range, by width.
pub const INT_8: u8 = 0xC8;
pub const INT_16: u8 = 0xC9;
pub const INT_32: u8 = 0xCA;
pub const INT_64: u8 = 0xCB;

// Sized types beyond their tiny ranges; the suffix is the width of the
// length field that follows the marker.
pub const BYTES_8: u8 = 0xCC;
pub const BYTES_16: u8 = 0xCD;
pub const BYTES_32: u8 = 0xCE;

pub const STRING_8: u8 = 0xD0;
pub const STRING_16: u8 = 0xD1;
pub const STRING_32: u8 = 0xD2;

pub const LIST_8: u8 = 0xD4;
pub const LIST_16: u8 = 0xD5;
pub const LIST_32: u8 = 0xD6;

pub const DICT_8: u8 = 0xD8;
pub const DICT_16: u8 = 0xD9;
pub const DICT_32: u8 = 0xDA;

// High-nibble masks for composing tiny-type markers.
pub const TINY_STRING_NIBBLE: u8 = 0x80;
pub const TINY_LIST_NIBBLE: u8 = 0x90;
pub const TINY_DICT_NIBBLE: u8 = 0xA0;
pub const TINY_STRUCT_NIBBLE: u8 = 0xB0;
