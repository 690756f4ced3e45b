//! Transaction state machine and options.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex as SyncMutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;

use super::courier::Courier;
use super::record::RecordKey;
use super::result::QueryResult;
use super::summary::Bookmark;
use crate::error::{BoltError, Failure};
use crate::types::{BoltDict, BoltValue};

/// Options for a transaction, mapped into the BEGIN/RUN `extras` entry.
#[derive(Debug, Clone, Default)]
pub struct TxOptions {
    readonly: bool,
    bookmarks: Vec<String>,
    timeout: Option<Duration>,
    metadata: BoltDict,
}

impl TxOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request read-only routing on the server (`mode = "R"`); the
    /// server defaults to write.
    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    /// Bookmarks the server must have seen before this transaction
    /// begins.
    pub fn bookmarks<I, T>(mut self, bookmarks: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.bookmarks = bookmarks.into_iter().map(Into::into).collect();
        self
    }

    /// Server-side execution timeout, sent as whole milliseconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Application metadata tied to this transaction, generally used
    /// for audit purposes.
    pub fn metadata(mut self, metadata: BoltDict) -> Self {
        self.metadata = metadata;
        self
    }

    pub(crate) fn has_bookmarks(&self) -> bool {
        !self.bookmarks.is_empty()
    }

    /// Builds the wire-level extras map, including only the entries
    /// that were actually supplied.
    fn to_extras(&self) -> Result<BoltDict, BoltError> {
        let mut extras = BoltDict::new();
        if self.readonly {
            extras.insert("mode".to_owned(), BoltValue::String("R".to_owned()));
        }
        if !self.bookmarks.is_empty() {
            extras.insert(
                "bookmarks".to_owned(),
                BoltValue::List(
                    self.bookmarks
                        .iter()
                        .map(|b| BoltValue::String(b.clone()))
                        .collect(),
                ),
            );
        }
        if let Some(timeout) = self.timeout {
            if !timeout.is_zero() {
                let millis =
                    i64::try_from(timeout.as_millis()).map_err(|_| BoltError::InvalidOption {
                        option: "timeout",
                        reason: "milliseconds do not fit in a 64-bit integer".into(),
                    })?;
                extras.insert("tx_timeout".to_owned(), BoltValue::Integer(millis));
            }
        }
        if !self.metadata.is_empty() {
            extras.insert(
                "tx_metadata".to_owned(),
                BoltValue::Dict(self.metadata.clone()),
            );
        }
        Ok(extras)
    }
}

/// A protocol-level transaction: a sequence of requests between BEGIN
/// and COMMIT/ROLLBACK, or a single auto-commit RUN.
///
/// The handle is cheap to clone; all copies share one state. A
/// transaction moves from open to closed exactly once, by commit,
/// rollback, a server failure, or (auto-commit) its RUN being flushed.
#[derive(Debug)]
pub struct Transaction<S> {
    courier: Arc<Mutex<Courier<S>>>,
    inner: Arc<TxInner>,
}

#[derive(Debug)]
struct TxInner {
    autocommit: bool,
    extras: BoltDict,
    closed: AtomicBool,
    failure: SyncMutex<Option<Failure>>,
}

impl<S> Clone for Transaction<S> {
    fn clone(&self) -> Self {
        Self {
            courier: Arc::clone(&self.courier),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: AsyncRead + AsyncWrite> Transaction<S> {
    pub(crate) fn new(
        courier: Arc<Mutex<Courier<S>>>,
        options: &TxOptions,
        autocommit: bool,
    ) -> Result<Self, BoltError> {
        Ok(Self {
            courier,
            inner: Arc::new(TxInner {
                autocommit,
                extras: options.to_extras()?,
                closed: AtomicBool::new(false),
                failure: SyncMutex::new(None),
            }),
        })
    }

    /// Begins an explicit transaction.
    pub(crate) async fn begin(
        courier: Arc<Mutex<Courier<S>>>,
        options: &TxOptions,
    ) -> Result<Self, BoltError> {
        let tx = Self::new(courier, options, false)?;
        let mut courier = tx.courier.lock().await;
        courier.write_begin(tx.inner.extras.clone());
        if options.has_bookmarks() {
            // With bookmarks, BEGIN must sync to the network so that
            // any failure they cause surfaces here rather than on a
            // later request. Without them the write stays pipelined.
            courier.send().await?;
            courier.fetch_all().await?;
        }
        drop(courier);
        Ok(tx)
    }

    /// Issues RUN plus PULL_ALL (or DISCARD_ALL when `discard` is true)
    /// and returns the lazy result.
    ///
    /// An auto-commit transaction flushes immediately and is closed
    /// once the flush finishes, whether or not it succeeded.
    pub async fn run(
        &self,
        cypher: &str,
        parameters: BoltDict,
        discard: bool,
    ) -> Result<QueryResult<S>, BoltError> {
        self.assert_open()?;
        let mut courier = self.courier.lock().await;
        let extras = if self.inner.autocommit {
            self.inner.extras.clone()
        } else {
            BoltDict::new()
        };
        let head = courier.write_run(cypher, parameters, extras);
        let body = if discard {
            courier.write_discard_all()
        } else {
            courier.write_pull_all()
        };
        if self.inner.autocommit {
            let sent = courier.send().await;
            self.inner.closed.store(true, Ordering::Release);
            sent?;
        }
        drop(courier);
        Ok(QueryResult::new(self.clone(), head, body))
    }

    /// Runs a query and returns a single value from its first and only
    /// record, or `None` if the result is empty or lacks the key.
    pub async fn evaluate<'k>(
        &self,
        cypher: &str,
        parameters: BoltDict,
        key: impl Into<RecordKey<'k>>,
    ) -> Result<Option<BoltValue>, BoltError> {
        let mut result = self.run(cypher, parameters, false).await?;
        let record = result.single().await?;
        Ok(record.and_then(|r| r.get(key).cloned()))
    }

    /// Commits, returning the bookmark from the COMMIT summary. The
    /// transaction is closed whether or not the commit succeeds.
    pub async fn commit(&self) -> Result<Bookmark, BoltError> {
        self.assert_open()?;
        if self.inner.autocommit {
            return Err(BoltError::Transaction(
                "cannot explicitly commit an auto-commit transaction".into(),
            ));
        }
        let result = self.commit_inner().await;
        self.inner.closed.store(true, Ordering::Release);
        result
    }

    async fn commit_inner(&self) -> Result<Bookmark, BoltError> {
        let mut courier = self.courier.lock().await;
        let response = courier.write_commit();
        courier.send().await?;
        courier.fetch_all().await?;
        let outcome = response.get_summary(&mut courier).await?;
        let bookmark = outcome
            .metadata()
            .and_then(|metadata| metadata.get("bookmark"))
            .and_then(BoltValue::as_str)
            .map(str::to_owned);
        Ok(Bookmark::new(bookmark))
    }

    /// Rolls back. The transaction is closed whether or not the
    /// rollback succeeds.
    pub async fn rollback(&self) -> Result<(), BoltError> {
        self.assert_open()?;
        if self.inner.autocommit {
            return Err(BoltError::Transaction(
                "cannot explicitly rollback an auto-commit transaction".into(),
            ));
        }
        let result = self.rollback_inner().await;
        self.inner.closed.store(true, Ordering::Release);
        result
    }

    async fn rollback_inner(&self) -> Result<(), BoltError> {
        let mut courier = self.courier.lock().await;
        courier.write_rollback();
        courier.send().await?;
        courier.fetch_all().await?;
        Ok(())
    }

    /// Recovers from a server FAILURE: writes RESET (the server ignores
    /// every request between the failure and the reset), closes the
    /// transaction, and records the failure. Idempotent: a second
    /// failure neither resets again nor replaces the stored one.
    ///
    /// Returns the error the caller should propagate.
    pub(crate) async fn fail(&self, failure: Failure) -> BoltError {
        if let Some(existing) = self.failure() {
            return BoltError::Failure(existing);
        }
        if let Err(e) = self.reset_inner().await {
            return e;
        }
        self.inner.closed.store(true, Ordering::Release);
        *self.inner.failure.lock() = Some(failure.clone());
        BoltError::Failure(failure)
    }

    async fn reset_inner(&self) -> Result<(), BoltError> {
        let mut courier = self.courier.lock().await;
        courier.write_reset();
        courier.send().await?;
        courier.fetch_all().await?;
        Ok(())
    }

    pub fn is_autocommit(&self) -> bool {
        self.inner.autocommit
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// The failure that closed this transaction, if any.
    pub fn failure(&self) -> Option<Failure> {
        self.inner.failure.lock().clone()
    }

    pub(crate) fn courier(&self) -> &Arc<Mutex<Courier<S>>> {
        &self.courier
    }

    fn assert_open(&self) -> Result<(), BoltError> {
        if self.is_closed() {
            Err(BoltError::Transaction(
                "transaction is already closed".into(),
            ))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::response::Response;
    use crate::client::testkit::{assert_no_request, push_replies, recv_request, success};
    use crate::message::ClientMessage;
    use tokio::io::{DuplexStream, duplex};

    fn extras_of(options: TxOptions) -> BoltDict {
        options.to_extras().unwrap()
    }

    fn new_courier() -> (Arc<Mutex<Courier<DuplexStream>>>, DuplexStream) {
        let (client_io, server_io) = duplex(4096);
        (Arc::new(Mutex::new(Courier::new(client_io))), server_io)
    }

    fn stub_failure(message: &str) -> Failure {
        Failure {
            code: "Neo.ClientError.X".into(),
            message: message.into(),
            remote_address: None,
            response: Response::new(),
        }
    }

    #[test]
    fn default_options_produce_empty_extras() {
        assert!(extras_of(TxOptions::new()).is_empty());
    }

    #[test]
    fn readonly_maps_to_mode_r() {
        let extras = extras_of(TxOptions::new().readonly(true));
        assert_eq!(extras.get("mode"), Some(&BoltValue::String("R".into())));
        // Write mode is the server default and is never sent.
        assert!(!extras_of(TxOptions::new().readonly(false)).contains_key("mode"));
    }

    #[test]
    fn bookmarks_included_only_when_non_empty() {
        let extras = extras_of(TxOptions::new().bookmarks(["b0", "b1"]));
        assert_eq!(
            extras.get("bookmarks"),
            Some(&BoltValue::List(vec![
                BoltValue::String("b0".into()),
                BoltValue::String("b1".into()),
            ]))
        );
        assert!(!extras_of(TxOptions::new().bookmarks(Vec::<String>::new()))
            .contains_key("bookmarks"));
    }

    #[test]
    fn half_second_timeout_encodes_as_500_milliseconds() {
        let extras = extras_of(TxOptions::new().timeout(Duration::from_secs_f64(0.5)));
        assert_eq!(extras.get("tx_timeout"), Some(&BoltValue::Integer(500)));
    }

    #[test]
    fn zero_timeout_is_omitted() {
        assert!(!extras_of(TxOptions::new().timeout(Duration::ZERO)).contains_key("tx_timeout"));
    }

    #[test]
    fn oversized_timeout_is_rejected_by_name() {
        let err = TxOptions::new()
            .timeout(Duration::from_secs(u64::MAX))
            .to_extras()
            .unwrap_err();
        match err {
            BoltError::InvalidOption { option, .. } => assert_eq!(option, "timeout"),
            other => panic!("expected InvalidOption, got {other:?}"),
        }
    }

    #[test]
    fn metadata_included_only_when_non_empty() {
        let metadata = BoltDict::from([("who".to_string(), BoltValue::String("test".into()))]);
        let extras = extras_of(TxOptions::new().metadata(metadata.clone()));
        assert_eq!(extras.get("tx_metadata"), Some(&BoltValue::Dict(metadata)));
        assert!(!extras_of(TxOptions::new().metadata(BoltDict::new())).contains_key("tx_metadata"));
    }

    #[tokio::test]
    async fn fail_resets_once_and_keeps_the_first_failure() {
        let (courier, mut server) = new_courier();
        let tx = Transaction::new(courier, &TxOptions::new(), false).unwrap();

        // Answer to the one RESET.
        push_replies(&mut server, &[success(&[])]).await;

        let first = tx.fail(stub_failure("first")).await;
        assert!(matches!(first, BoltError::Failure(f) if f.message == "first"));
        assert!(tx.is_closed());

        let second = tx.fail(stub_failure("second")).await;
        assert!(matches!(second, BoltError::Failure(f) if f.message == "first"));
        assert_eq!(tx.failure().unwrap().message, "first");

        assert_eq!(recv_request(&mut server).await, ClientMessage::Reset);
        assert_no_request(&mut server).await;
    }

    #[tokio::test]
    async fn autocommit_transactions_reject_explicit_finish() {
        let (courier, _server) = new_courier();
        let tx = Transaction::new(courier, &TxOptions::new(), true).unwrap();
        assert!(tx.is_autocommit());
        assert!(matches!(
            tx.commit().await.unwrap_err(),
            BoltError::Transaction(_)
        ));
        assert!(matches!(
            tx.rollback().await.unwrap_err(),
            BoltError::Transaction(_)
        ));
        assert!(!tx.is_closed());
    }

    #[tokio::test]
    async fn run_on_a_closed_transaction_is_rejected() {
        let (courier, _server) = new_courier();
        let tx = Transaction::new(courier, &TxOptions::new(), true).unwrap();
        tx.run("RETURN 1", BoltDict::new(), false).await.unwrap();
        // The auto-commit flush closed it.
        assert!(tx.is_closed());
        let err = tx.run("RETURN 2", BoltDict::new(), false).await.unwrap_err();
        assert!(matches!(err, BoltError::Transaction(_)));
    }
}
