//! The caller-facing view of a RUN: a lazy record stream.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::warn;

use super::record::Record;
use super::response::Response;
use super::summary::Outcome;
use super::transaction::Transaction;
use crate::error::BoltError;
use crate::types::BoltValue;

/// The result of a query, backed by two responses: the RUN header and
/// the PULL_ALL/DISCARD_ALL body.
///
/// Records are pulled one at a time; each [`next`] drives the transport
/// only as far as needed to produce one more record, so a consumer can
/// abandon a large result without the driver having buffered it all.
///
/// [`next`]: QueryResult::next
#[derive(Debug)]
pub struct QueryResult<S> {
    tx: Transaction<S>,
    head: Response,
    body: Response,
    fields: Option<Arc<[String]>>,
}

impl<S: AsyncRead + AsyncWrite> QueryResult<S> {
    pub(crate) fn new(tx: Transaction<S>, head: Response, body: Response) -> Self {
        Self {
            tx,
            head,
            body,
            fields: None,
        }
    }

    /// Returns the next record, or `None` at end of stream.
    ///
    /// A server FAILURE on the body closes the transaction (with a
    /// RESET on the wire) and surfaces here as the error.
    pub async fn next(&mut self) -> Result<Option<Record>, BoltError> {
        let fetched = {
            let mut courier = self.tx.courier().lock().await;
            self.body.get_record(&mut courier).await
        };
        match fetched {
            Ok(Some(values)) => {
                let fields = self.fields().await?;
                Ok(Some(Record::new(fields, values)))
            }
            Ok(None) => Ok(None),
            Err(BoltError::Failure(failure)) => Err(self.tx.fail(failure).await),
            Err(e) => Err(e),
        }
    }

    /// The RUN summary. Its `fields` metadata names the result columns.
    pub async fn get_header(&mut self) -> Result<Outcome, BoltError> {
        let fetched = {
            let mut courier = self.tx.courier().lock().await;
            self.head.get_summary(&mut courier).await
        };
        match fetched {
            Ok(outcome) => Ok(outcome),
            Err(BoltError::Failure(failure)) => Err(self.tx.fail(failure).await),
            Err(e) => Err(e),
        }
    }

    /// The body summary. [`Outcome::Ignored`] means an earlier failure
    /// poisoned the pipeline, which makes the return value usable as a
    /// success predicate.
    pub async fn consume(&mut self) -> Result<Outcome, BoltError> {
        let fetched = {
            let mut courier = self.tx.courier().lock().await;
            self.body.get_summary(&mut courier).await
        };
        match fetched {
            Ok(outcome) => Ok(outcome),
            Err(BoltError::Failure(failure)) => Err(self.tx.fail(failure).await),
            Err(e) => Err(e),
        }
    }

    /// The result's column names, resolved from the header once and
    /// cached.
    pub async fn fields(&mut self) -> Result<Arc<[String]>, BoltError> {
        if let Some(fields) = &self.fields {
            return Ok(Arc::clone(fields));
        }
        let header = self.get_header().await?;
        let names: Vec<String> = header
            .metadata()
            .and_then(|metadata| metadata.get("fields"))
            .and_then(BoltValue::as_list)
            .map(|items| {
                items
                    .iter()
                    .filter_map(BoltValue::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        let fields: Arc<[String]> = names.into();
        self.fields = Some(Arc::clone(&fields));
        Ok(fields)
    }

    /// Drains the stream and returns its only record.
    ///
    /// Returns `None` for an empty result; logs a warning and returns
    /// the first record if there was more than one.
    pub async fn single(&mut self) -> Result<Option<Record>, BoltError> {
        let mut records = Vec::new();
        while let Some(record) = self.next().await? {
            records.push(record);
        }
        match records.len() {
            0 => Ok(None),
            1 => Ok(Some(records.swap_remove(0))),
            n => {
                warn!("expected a result with a single record, but it contains {n}");
                Ok(Some(records.swap_remove(0)))
            }
        }
    }

    pub fn transaction(&self) -> &Transaction<S> {
        &self.tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::connection::BoltConnection;
    use crate::client::testkit::{fields_header, push_replies, record, success};
    use crate::client::transaction::TxOptions;
    use crate::message::ServerMessage;
    use crate::types::BoltDict;
    use tokio::io::{DuplexStream, duplex};

    async fn run_result(
        replies: &[ServerMessage],
    ) -> (
        BoltConnection<DuplexStream>,
        QueryResult<DuplexStream>,
        DuplexStream,
    ) {
        let (client_io, mut server_io) = duplex(16384);
        let mut conn = BoltConnection::new(client_io);
        push_replies(&mut server_io, replies).await;
        let result = conn
            .run("RETURN 1", BoltDict::new(), false, TxOptions::new())
            .await
            .unwrap();
        (conn, result, server_io)
    }

    #[tokio::test]
    async fn single_returns_none_for_an_empty_result() {
        let (_conn, mut result, _server) =
            run_result(&[fields_header(&["n"]), success(&[])]).await;
        assert!(result.single().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn single_returns_the_first_of_many_records() {
        let (_conn, mut result, _server) = run_result(&[
            fields_header(&["n"]),
            record(vec![BoltValue::Integer(1)]),
            record(vec![BoltValue::Integer(2)]),
            success(&[]),
        ])
        .await;
        let row = result.single().await.unwrap().unwrap();
        assert_eq!(row.get("n"), Some(&BoltValue::Integer(1)));
    }

    #[tokio::test]
    async fn ignored_replies_surface_as_the_sentinel() {
        let (_conn, mut result, _server) =
            run_result(&[ServerMessage::Ignored, ServerMessage::Ignored]).await;
        assert!(result.next().await.unwrap().is_none());
        let outcome = result.consume().await.unwrap();
        assert!(outcome.is_ignored());
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn fields_resolve_from_the_header_and_default_to_empty() {
        let (_conn, mut result, _server) = run_result(&[
            fields_header(&["a", "b"]),
            success(&[]),
        ])
        .await;
        assert_eq!(&result.fields().await.unwrap()[..], ["a", "b"]);

        let (_conn, mut result, _server) = run_result(&[success(&[]), success(&[])]).await;
        assert!(result.fields().await.unwrap().is_empty());
    }
}
