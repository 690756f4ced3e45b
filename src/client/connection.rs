//! Per-connection lifecycle for Bolt v3.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use super::courier::Courier;
use super::result::QueryResult;
use super::transaction::{Transaction, TxOptions};
use crate::error::BoltError;
use crate::handshake::client_handshake;
use crate::types::{BoltDict, BoltValue};
use crate::version;

/// The user agent sent in HELLO.
pub const DEFAULT_USER_AGENT: &str = concat!("bolt3/", env!("CARGO_PKG_VERSION"));

/// Basic-auth credentials for [`BoltConnection::init`].
#[derive(Debug, Clone)]
pub struct Auth {
    principal: String,
    credentials: String,
}

impl Auth {
    pub fn basic(principal: impl Into<String>, credentials: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            credentials: credentials.into(),
        }
    }
}

/// A Bolt v3 connection.
///
/// Holds the courier and at most one active transaction at a time; a
/// new one may start only once the previous one has closed. All
/// operations belong to a single logical task; the driver adds no
/// internal concurrency.
pub struct BoltConnection<S> {
    courier: Arc<Mutex<Courier<S>>>,
    tx: Option<Transaction<S>>,
    closed: bool,
    server_agent: Option<String>,
    server_connection_id: Option<String>,
    local_channel_id: u16,
}

impl BoltConnection<TcpStream> {
    /// Connects over TCP and performs the version-negotiation
    /// handshake, leaving the connection ready for [`init`].
    ///
    /// [`init`]: BoltConnection::init
    pub async fn connect(addr: SocketAddr) -> Result<Self, BoltError> {
        let mut stream = TcpStream::connect(addr).await.map_err(BoltError::from_io)?;
        client_handshake(&mut stream).await?;
        let local = stream.local_addr().ok();
        let remote = stream.peer_addr().ok();
        Ok(Self::with_addresses(stream, local, remote))
    }
}

impl<S: AsyncRead + AsyncWrite> BoltConnection<S> {
    /// The one protocol version this connection speaks.
    pub const PROTOCOL_VERSION: (u8, u8) = version::PROTOCOL_VERSION;

    /// Wraps an already-negotiated duplex stream.
    pub fn new(stream: S) -> Self {
        Self::with_addresses(stream, None, None)
    }

    pub fn with_addresses(
        stream: S,
        local_address: Option<SocketAddr>,
        remote_address: Option<SocketAddr>,
    ) -> Self {
        let courier = Courier::with_addresses(stream, local_address, remote_address);
        let local_channel_id = courier.local_channel_id();
        Self {
            courier: Arc::new(Mutex::new(courier)),
            tx: None,
            closed: false,
            server_agent: None,
            server_connection_id: None,
            local_channel_id,
        }
    }

    /// Authenticates with HELLO.
    ///
    /// Without `auth` the scheme is `"none"`, otherwise `"basic"` with
    /// principal and credentials. On success the server's agent string
    /// and connection id are recorded; on failure the transport is torn
    /// down and the failure returned.
    pub async fn init(&mut self, auth: Option<Auth>) -> Result<(), BoltError> {
        let mut extras = BoltDict::from([
            (
                "scheme".to_owned(),
                BoltValue::String("none".to_owned()),
            ),
            (
                "user_agent".to_owned(),
                BoltValue::String(DEFAULT_USER_AGENT.to_owned()),
            ),
        ]);
        if let Some(auth) = auth {
            extras.insert("scheme".to_owned(), BoltValue::String("basic".to_owned()));
            extras.insert("principal".to_owned(), BoltValue::String(auth.principal));
            extras.insert(
                "credentials".to_owned(),
                BoltValue::String(auth.credentials),
            );
        }

        let summary = {
            let mut courier = self.courier.lock().await;
            let response = courier.write_hello(extras);
            courier.send().await?;
            response.get_summary(&mut courier).await
        };
        match summary {
            Ok(outcome) => {
                if let Some(metadata) = outcome.metadata() {
                    self.server_agent = metadata
                        .get("server")
                        .and_then(BoltValue::as_str)
                        .map(str::to_owned);
                    self.server_connection_id = metadata
                        .get("connection_id")
                        .and_then(BoltValue::as_str)
                        .map(str::to_owned);
                }
                Ok(())
            }
            Err(e) => {
                let mut courier = self.courier.lock().await;
                let _ = courier.shutdown().await;
                self.closed = true;
                Err(e)
            }
        }
    }

    /// Closes the connection: GOODBYE (best effort) and transport
    /// teardown. Idempotent.
    pub async fn close(&mut self) -> Result<(), BoltError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let mut courier = self.courier.lock().await;
        courier.write_goodbye();
        match courier.send().await {
            Ok(()) => {}
            // GOODBYE is a courtesy; a lost peer already got the point.
            Err(e) if e.is_connection_lost() => {}
            Err(e) => {
                let _ = courier.shutdown().await;
                return Err(e);
            }
        }
        match courier.shutdown().await {
            Ok(()) => Ok(()),
            Err(e) if e.is_connection_lost() => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// True when no transaction is in progress and one may be started.
    pub fn ready(&self) -> bool {
        self.tx.as_ref().map_or(true, Transaction::is_closed)
    }

    fn assert_ready(&self) -> Result<(), BoltError> {
        if self.ready() {
            Ok(())
        } else {
            Err(BoltError::Transaction(
                "a transaction is already in progress on this connection".into(),
            ))
        }
    }

    /// Runs a query in an auto-commit transaction.
    pub async fn run(
        &mut self,
        cypher: &str,
        parameters: BoltDict,
        discard: bool,
        options: TxOptions,
    ) -> Result<QueryResult<S>, BoltError> {
        self.assert_ready()?;
        let tx = Transaction::new(Arc::clone(&self.courier), &options, true)?;
        self.tx = Some(tx.clone());
        tx.run(cypher, parameters, discard).await
    }

    /// Begins an explicit transaction and returns its handle.
    pub async fn begin(&mut self, options: TxOptions) -> Result<Transaction<S>, BoltError> {
        self.assert_ready()?;
        let tx = Transaction::begin(Arc::clone(&self.courier), &options).await?;
        self.tx = Some(tx.clone());
        Ok(tx)
    }

    /// Runs `f` inside an explicit transaction: commits on `Ok`, rolls
    /// back on `Err` and propagates the original error unchanged.
    pub async fn run_tx<T, E, F, Fut>(&mut self, options: TxOptions, f: F) -> Result<T, E>
    where
        F: FnOnce(Transaction<S>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<BoltError>,
    {
        let tx = self.begin(options).await.map_err(E::from)?;
        match f(tx.clone()).await {
            Ok(value) => {
                tx.commit().await.map_err(E::from)?;
                Ok(value)
            }
            Err(e) => {
                if !tx.is_closed() {
                    // The rollback is best-effort; the caller's error
                    // wins.
                    let _ = tx.rollback().await;
                }
                Err(e)
            }
        }
    }

    /// The server's agent string from HELLO, e.g. `Neo4j/3.5.0`.
    pub fn server_agent(&self) -> Option<&str> {
        self.server_agent.as_deref()
    }

    /// The server-issued connection id from HELLO.
    pub fn server_connection_id(&self) -> Option<&str> {
        self.server_connection_id.as_deref()
    }

    /// The local port, as used in this connection's log prefixes.
    /// Distinct from [`server_connection_id`].
    ///
    /// [`server_connection_id`]: BoltConnection::server_connection_id
    pub fn local_channel_id(&self) -> u16 {
        self.local_channel_id
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// True once the peer has violated the protocol and the connection
    /// must be discarded.
    pub async fn is_defunct(&self) -> bool {
        self.courier.lock().await.is_defunct()
    }
}
