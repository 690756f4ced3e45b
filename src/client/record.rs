//! Result records.

use std::sync::Arc;

use crate::types::BoltValue;

/// One row of a query result: an ordered tuple of values plus the
/// shared column-name vector from the RUN header.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Arc<[String]>,
    values: Vec<BoltValue>,
}

/// Addresses a value in a [`Record`] by position or column name.
#[derive(Debug, Clone, Copy)]
pub enum RecordKey<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for RecordKey<'_> {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl<'a> From<&'a str> for RecordKey<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl Record {
    pub(crate) fn new(fields: Arc<[String]>, values: Vec<BoltValue>) -> Self {
        Self { fields, values }
    }

    /// The column names, in result order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// The values, in column order.
    pub fn values(&self) -> &[BoltValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Looks up a value by index or column name.
    pub fn get<'k>(&self, key: impl Into<RecordKey<'k>>) -> Option<&BoltValue> {
        match key.into() {
            RecordKey::Index(index) => self.values.get(index),
            RecordKey::Name(name) => self
                .fields
                .iter()
                .position(|field| field == name)
                .and_then(|index| self.values.get(index)),
        }
    }
}
