//! Bolt protocol value types.

mod value;

pub use value::{BoltDict, BoltValue};
