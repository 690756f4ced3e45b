//! Per-request reply buffers.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};

use super::courier::Courier;
use super::summary::Outcome;
use crate::error::BoltError;
use crate::types::BoltValue;

/// The reply buffer for one outstanding request: a FIFO of records plus
/// the terminal summary slot.
///
/// The handle is cheap to clone; one copy sits in the courier's
/// outstanding queue (where inbound messages are dispatched to it) and
/// another is held by whoever awaits the reply. A response is filled by
/// the courier only; consumers drain it through [`get_record`] and
/// [`get_summary`], which drive the courier just far enough to satisfy
/// the demand.
///
/// [`get_record`]: Response::get_record
/// [`get_summary`]: Response::get_summary
#[derive(Debug, Clone, Default)]
pub struct Response {
    inner: Arc<Mutex<ResponseState>>,
}

#[derive(Debug, Default)]
struct ResponseState {
    records: VecDeque<Vec<BoltValue>>,
    summary: Option<Outcome>,
}

impl Response {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a record in server-send order. Must not be called once
    /// the summary is set.
    pub(crate) fn put_record(&self, values: Vec<BoltValue>) {
        let mut state = self.inner.lock();
        debug_assert!(state.summary.is_none());
        state.records.push_back(values);
    }

    /// Sets the terminal summary. A response only ever gets one.
    pub(crate) fn put_summary(&self, outcome: Outcome) {
        let mut state = self.inner.lock();
        debug_assert!(state.summary.is_none());
        state.summary = Some(outcome);
    }

    /// True if at least one record is buffered.
    pub fn has_record(&self) -> bool {
        !self.inner.lock().records.is_empty()
    }

    /// True once the terminal summary has arrived.
    pub fn has_summary(&self) -> bool {
        self.inner.lock().summary.is_some()
    }

    /// The terminal summary, if it has arrived.
    pub fn summary(&self) -> Option<Outcome> {
        self.inner.lock().summary.clone()
    }

    fn pop_record(&self) -> Option<Vec<BoltValue>> {
        self.inner.lock().records.pop_front()
    }

    /// Returns the next record, reading from the transport only as far
    /// as needed, or `None` at end of records.
    ///
    /// Buffered records always drain before end-of-records is reported,
    /// even when the summary has already arrived: RECORD messages
    /// precede the terminal summary on the wire, so they are already
    /// queued here by the time the summary lands.
    pub async fn get_record<S>(
        &self,
        courier: &mut Courier<S>,
    ) -> Result<Option<Vec<BoltValue>>, BoltError>
    where
        S: AsyncRead + AsyncWrite,
    {
        loop {
            if let Some(values) = self.pop_record() {
                return Ok(Some(values));
            }
            if self.has_summary() {
                return Ok(None);
            }
            let this = self.clone();
            courier
                .fetch_until(move || this.has_record() || this.has_summary())
                .await?;
            if !self.has_record() && !self.has_summary() {
                return Err(BoltError::Protocol(
                    "response queue drained before this response completed".into(),
                ));
            }
        }
    }

    /// Returns the terminal summary, reading from the transport until it
    /// arrives.
    pub async fn get_summary<S>(&self, courier: &mut Courier<S>) -> Result<Outcome, BoltError>
    where
        S: AsyncRead + AsyncWrite,
    {
        let this = self.clone();
        courier.fetch_until(move || this.has_summary()).await?;
        self.summary().ok_or_else(|| {
            BoltError::Protocol("response queue drained before this response completed".into())
        })
    }
}
