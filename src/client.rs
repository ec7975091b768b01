//! Client lifecycle and the public request surface.
//!
//! One [`Client`] owns at most one live session. A session composes one
//! transport, one dispatch queue and one correlation bus, established by the
//! fixed sequence: open socket -> handshake preamble + version range ->
//! await the server-version frame -> StartAPI -> await next-valid-id and
//! managed-accounts concurrently -> ready.
//!
//! Concurrent `connect()` calls share the in-flight attempt; once connected,
//! further calls are no-ops. Request ids come from a single counter seeded
//! by the server and are never reused within a connection.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{Duration, Instant};

use crate::bus::{
    BusKey, ClientEvent, CorrelationBus, ErrorFrame, Response, StreamEvent,
};
use crate::contract::{Contract, ContractDetails};
use crate::error::{Result, TwsError};
use crate::market_data::{
    HistogramEntry, HistoricalData, HistoricalTicksResult, Position, ScannerItem,
    ScannerSubscription, SecDefOptParams, Ticker,
};
use crate::messages::{outgoing, min_server_ver, IncomingKind};
use crate::order::{Order, OrderReport};
use crate::protocol::{encode_frame, FieldsetBuilder};
use crate::queue::DispatchQueue;
use crate::requests;
use crate::requests::market_data::{HistoricalDataParams, HistoricalTicksParams};
use crate::transport::{self, WriterHandle};

/// Messages the broker accepts per rate-limiter window.
const CALLS_PER_SLOT: u32 = 45;

/// Rate-limiter window length.
const SLOT_INTERVAL: Duration = Duration::from_millis(1000);

/// Error code that acknowledges a successful order cancel.
const ORDER_CANCELLED_CODE: i32 = 202;

/// Connection parameters.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub client_id: i32,
    /// Connection-wide correlation timeout; also the deadline horizon for
    /// expirable sends.
    pub timeout: Duration,
    /// Maximum dispatch-queue depth; `None` leaves the queue unbounded.
    pub max_queue_len: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7496,
            client_id: 1,
            timeout: Duration::from_secs(30),
            max_queue_len: None,
        }
    }
}

pub(crate) struct Session {
    server_version: i32,
    accounts: Vec<String>,
    timeout: Duration,
    bus: CorrelationBus,
    queue: DispatchQueue,
    next_request_id: AtomicI64,
    closed: Arc<AtomicBool>,
}

impl Session {
    async fn establish(
        config: &Config,
        events: broadcast::Sender<ClientEvent>,
    ) -> Result<Arc<Session>> {
        let (writer, frames) = transport::connect(&config.host, config.port).await?;
        Self::negotiate(config, events, writer, frames).await
    }

    /// Handshake and StartAPI over already-established I/O.
    pub(crate) async fn negotiate(
        config: &Config,
        events: broadcast::Sender<ClientEvent>,
        writer: WriterHandle,
        mut frames: mpsc::UnboundedReceiver<Vec<String>>,
    ) -> Result<Arc<Session>> {
        let bus = CorrelationBus::new(config.timeout, events);
        let closed = Arc::new(AtomicBool::new(false));

        let pump_bus = bus.clone();
        let pump_closed = Arc::clone(&closed);
        tokio::spawn(async move {
            while let Some(fields) = frames.recv().await {
                pump_bus.dispatch(fields);
            }
            pump_closed.store(true, Ordering::SeqCst);
            pump_bus.emit_connection(ClientEvent::Close);
        });

        let version_reply = bus.register(BusKey::Kind(IncomingKind::ServerVersion));
        writer.send_handshake()?;
        let server_version = match version_reply.wait().await? {
            Response::ServerVersion(v) => v,
            _ => return Err(TwsError::unexpected_response()),
        };

        // StartAPI carries the client id; bypasses the queue like the
        // handshake itself.
        let mut start_api = FieldsetBuilder::new();
        start_api
            .push_i32(outgoing::START_API)
            .push_i32(2)
            .push_i32(config.client_id)
            .push_empty(); // optional capabilities
        writer.send_fieldset(&start_api.into_fields())?;

        let next_id_reply = bus.register(BusKey::Kind(IncomingKind::NextValidId));
        let accounts_reply = bus.register(BusKey::Kind(IncomingKind::ManagedAccts));
        let (next_id, accounts) =
            tokio::try_join!(next_id_reply.wait(), accounts_reply.wait())?;

        let next_valid_id = match next_id {
            Response::NextValidId(id) => id,
            _ => return Err(TwsError::unexpected_response()),
        };
        let accounts = match accounts {
            Response::ManagedAccounts(list) => list,
            _ => return Err(TwsError::unexpected_response()),
        };
        tracing::debug!(server_version, next_valid_id, "session ready");

        let queue = DispatchQueue::new(
            writer.raw_sender(),
            CALLS_PER_SLOT,
            SLOT_INTERVAL,
            config.max_queue_len,
        );

        Ok(Arc::new(Session {
            server_version,
            accounts,
            timeout: config.timeout,
            bus,
            queue,
            next_request_id: AtomicI64::new(next_valid_id),
            closed,
        }))
    }

    fn allocate_request_id(&self) -> i64 {
        self.next_request_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn submit_durable(&self, fields: &[String]) -> Result<()> {
        self.queue.submit(encode_frame(fields)).map(|_| ())
    }

    fn submit_expirable(&self, fields: &[String]) -> Result<()> {
        self.queue
            .submit_expirable(encode_frame(fields), Instant::now() + self.timeout)
            .map(|_| ())
    }
}

/// Live subscription handle.
///
/// Events arrive through [`Subscription::recv`]; [`Subscription::stop`]
/// deletes the bus state for the id and sends the protocol-level cancel.
pub struct Subscription {
    request_id: i64,
    rx: mpsc::UnboundedReceiver<StreamEvent>,
    session: Arc<Session>,
    cancel: CancelKind,
}

enum CancelKind {
    MarketData,
    TickByTick,
}

impl Subscription {
    /// The request id this subscription is keyed on.
    pub fn request_id(&self) -> i64 {
        self.request_id
    }

    /// Next event, or `None` after the subscription is torn down.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }

    /// Tear the subscription down: bus state first, then the cancel frame.
    pub fn stop(self) -> Result<()> {
        self.session.bus.drop_key(BusKey::Request(self.request_id));
        let fields = match self.cancel {
            CancelKind::MarketData => {
                requests::market_data::cancel_market_data(self.request_id)
            }
            CancelKind::TickByTick => requests::market_data::cancel_tick_by_tick(
                self.session.server_version,
                self.request_id,
            )?,
        };
        self.session.submit_durable(&fields)
    }
}

struct ClientShared {
    config: Config,
    session: tokio::sync::Mutex<Option<Arc<Session>>>,
    events: broadcast::Sender<ClientEvent>,
}

/// Handle to one broker connection.
///
/// Cloning shares the connection. The connection is established lazily on
/// the first request or explicitly via [`Client::connect`].
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientShared>,
}

impl Client {
    pub fn new(config: Config) -> Client {
        let (events, _) = broadcast::channel(256);
        Client {
            inner: Arc::new(ClientShared {
                config,
                session: tokio::sync::Mutex::new(None),
                events,
            }),
        }
    }

    /// Subscribe to connection-wide events (broadcast errors, order status,
    /// close). Without a subscriber these events are silently dropped.
    pub fn events(&self) -> broadcast::Receiver<ClientEvent> {
        self.inner.events.subscribe()
    }

    /// Establish the connection now. A no-op when already connected.
    pub async fn connect(&self) -> Result<()> {
        self.session().await.map(|_| ())
    }

    /// Drop the live session. In-flight waiters are left to their timeouts;
    /// there is no automatic reconnect.
    pub async fn disconnect(&self) {
        let mut guard = self.inner.session.lock().await;
        *guard = None;
    }

    /// Negotiated server version.
    pub async fn server_version(&self) -> Result<i32> {
        Ok(self.session().await?.server_version)
    }

    /// Accounts the session is authorized for, from the handshake.
    pub async fn managed_accounts(&self) -> Result<Vec<String>> {
        Ok(self.session().await?.accounts.clone())
    }

    async fn session(&self) -> Result<Arc<Session>> {
        let mut guard = self.inner.session.lock().await;
        if let Some(session) = guard.as_ref() {
            if !session.closed.load(Ordering::SeqCst) {
                return Ok(Arc::clone(session));
            }
        }
        let session = Session::establish(&self.inner.config, self.inner.events.clone()).await?;
        *guard = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Attach an already-negotiated session (test entry point).
    #[doc(hidden)]
    pub async fn attach_session_for_tests(
        config: Config,
        writer: WriterHandle,
        frames: mpsc::UnboundedReceiver<Vec<String>>,
    ) -> Result<Client> {
        let client = Client::new(config);
        let session = Session::negotiate(
            &client.inner.config,
            client.inner.events.clone(),
            writer,
            frames,
        )
        .await?;
        *client.inner.session.lock().await = Some(session);
        Ok(client)
    }

    /// Server-side UTC clock, seconds since the epoch.
    pub async fn current_time(&self) -> Result<i64> {
        let session = self.session().await?;
        let mut b = FieldsetBuilder::new();
        b.push_i32(outgoing::REQ_CURRENT_TIME).push_i32(1);

        let reply = session.bus.register(BusKey::Kind(IncomingKind::CurrentTime));
        session.submit_expirable(&b.into_fields())?;
        match reply.wait().await? {
            Response::CurrentTime(t) => Ok(t),
            _ => Err(TwsError::unexpected_response()),
        }
    }

    /// Switch between real-time (1) and frozen (2) market data.
    pub async fn market_data_type(&self, data_type: i32) -> Result<()> {
        let session = self.session().await?;
        let fields = requests::market_data::market_data_type(session.server_version, data_type)?;
        session.submit_durable(&fields)
    }

    /// Stream market data for a contract until the subscription is stopped.
    pub async fn stream_market_data(&self, contract: &Contract) -> Result<Subscription> {
        self.stream_market_data_filtered(contract, "").await
    }

    /// Stream market data with a generic-tick-list filter.
    pub async fn stream_market_data_filtered(
        &self,
        contract: &Contract,
        generic_tick_list: &str,
    ) -> Result<Subscription> {
        let session = self.session().await?;
        let request_id = session.allocate_request_id();
        let fields = requests::market_data::market_data(
            session.server_version,
            request_id,
            contract,
            generic_tick_list,
            false,
            false,
        )?;

        let rx = session.bus.open_stream(request_id);
        session.submit_durable(&fields)?;
        Ok(Subscription {
            request_id,
            rx,
            session,
            cancel: CancelKind::MarketData,
        })
    }

    /// One-shot market-data snapshot, resolved by the snapshot-end frame.
    pub async fn market_data_snapshot(&self, contract: &Contract) -> Result<Ticker> {
        let session = self.session().await?;
        let request_id = session.allocate_request_id();
        let fields = requests::market_data::market_data(
            session.server_version,
            request_id,
            contract,
            "",
            true,
            false,
        )?;

        let reply = session.bus.register(BusKey::Request(request_id));
        session.submit_expirable(&fields)?;
        match reply.wait().await? {
            Response::Ticker(t) => Ok(t),
            _ => Err(TwsError::unexpected_response()),
        }
    }

    /// Stream tick-by-tick data. `tick_kind` is `"Last"`, `"AllLast"`,
    /// `"BidAsk"` or `"MidPoint"`.
    pub async fn stream_tick_by_tick(
        &self,
        contract: &Contract,
        tick_kind: &str,
        number_of_ticks: i64,
        ignore_size: bool,
    ) -> Result<Subscription> {
        let session = self.session().await?;
        let request_id = session.allocate_request_id();
        let fields = requests::market_data::tick_by_tick(
            session.server_version,
            request_id,
            contract,
            tick_kind,
            number_of_ticks,
            ignore_size,
        )?;

        let rx = session.bus.open_stream(request_id);
        session.submit_durable(&fields)?;
        Ok(Subscription {
            request_id,
            rx,
            session,
            cancel: CancelKind::TickByTick,
        })
    }

    /// Place an order; returns the allocated order id. Status changes
    /// arrive as connection-wide events.
    pub async fn place_order(&self, contract: &Contract, order: &Order) -> Result<i64> {
        let session = self.session().await?;
        let order_id = session.allocate_request_id();
        let fields =
            requests::order::place_order(session.server_version, order_id, contract, order)?;
        session.submit_durable(&fields)?;
        Ok(order_id)
    }

    /// Cancel an order. The broker acknowledges a successful cancel with an
    /// error frame; that specific code resolves the wait instead of
    /// rejecting it.
    pub async fn cancel_order(&self, order_id: i64) -> Result<ErrorFrame> {
        let session = self.session().await?;
        let fields = requests::order::cancel_order(order_id);

        let reply = session
            .bus
            .register_resolve_on_error(BusKey::Request(order_id), ORDER_CANCELLED_CODE);
        session.submit_expirable(&fields)?;
        match reply.wait().await? {
            Response::Error(ack) => Ok(ack),
            _ => Err(TwsError::unexpected_response()),
        }
    }

    /// Open orders placed from this client.
    pub async fn open_orders(&self) -> Result<Vec<OrderReport>> {
        let mut b = FieldsetBuilder::new();
        b.push_i32(outgoing::REQ_OPEN_ORDERS).push_i32(1);
        self.await_orders(b.into_fields(), IncomingKind::OpenOrderEnd).await
    }

    /// Open orders from all clients and the terminal itself.
    pub async fn all_open_orders(&self) -> Result<Vec<OrderReport>> {
        let mut b = FieldsetBuilder::new();
        b.push_i32(outgoing::REQ_ALL_OPEN_ORDERS).push_i32(1);
        self.await_orders(b.into_fields(), IncomingKind::OpenOrderEnd).await
    }

    /// Completed orders; `api_only` restricts to orders placed via the API.
    pub async fn completed_orders(&self, api_only: bool) -> Result<Vec<OrderReport>> {
        let session = self.session().await?;
        let fields = requests::order::completed_orders(session.server_version, api_only)?;
        drop(session);
        self.await_orders(fields, IncomingKind::CompletedOrdersEnd).await
    }

    async fn await_orders(
        &self,
        fields: Vec<String>,
        terminator: IncomingKind,
    ) -> Result<Vec<OrderReport>> {
        let session = self.session().await?;
        let reply = session.bus.register(BusKey::Kind(terminator));
        session.submit_expirable(&fields)?;
        match reply.wait().await? {
            Response::Orders(orders) => Ok(orders),
            _ => Err(TwsError::unexpected_response()),
        }
    }

    /// Ask the terminal to bind newly created native orders to this client.
    /// Only valid for client id 0.
    pub async fn auto_open_orders(&self, auto_bind: bool) -> Result<()> {
        let session = self.session().await?;
        let mut b = FieldsetBuilder::new();
        b.push_i32(outgoing::REQ_AUTO_OPEN_ORDERS).push_i32(1).push_bool(auto_bind);
        session.submit_durable(&b.into_fields())
    }

    /// Cancel all open orders globally, including those placed natively.
    pub async fn global_cancel(&self) -> Result<()> {
        let session = self.session().await?;
        let mut b = FieldsetBuilder::new();
        b.push_i32(outgoing::REQ_GLOBAL_CANCEL).push_i32(1);
        session.submit_durable(&b.into_fields())
    }

    /// Subscribe/unsubscribe to account value and portfolio updates.
    pub async fn account_updates(&self, subscribe: bool, account_code: &str) -> Result<()> {
        let session = self.session().await?;
        let mut b = FieldsetBuilder::new();
        b.push_i32(outgoing::REQ_ACCT_DATA)
            .push_i32(2)
            .push_bool(subscribe)
            .push_str(account_code);
        session.submit_durable(&b.into_fields())
    }

    /// Positions across all accounts, keyed by contract id.
    pub async fn positions(&self) -> Result<std::collections::HashMap<i64, Position>> {
        let session = self.session().await?;
        requests::require(
            session.server_version,
            min_server_ver::POSITIONS,
            "positions requests",
        )?;

        let mut b = FieldsetBuilder::new();
        b.push_i32(outgoing::REQ_POSITIONS).push_i32(1);

        let reply = session.bus.register(BusKey::Kind(IncomingKind::PositionEnd));
        session.submit_expirable(&b.into_fields())?;
        match reply.wait().await? {
            Response::Positions(positions) => Ok(positions),
            _ => Err(TwsError::unexpected_response()),
        }
    }

    /// Stop real-time position updates.
    pub async fn cancel_positions(&self) -> Result<()> {
        let session = self.session().await?;
        requests::require(
            session.server_version,
            min_server_ver::POSITIONS,
            "positions requests",
        )?;
        let mut b = FieldsetBuilder::new();
        b.push_i32(outgoing::CANCEL_POSITIONS).push_i32(1);
        session.submit_durable(&b.into_fields())
    }

    /// Full contract details for every instrument matching the description.
    pub async fn contract_details(&self, contract: &Contract) -> Result<Vec<ContractDetails>> {
        let session = self.session().await?;
        let request_id = session.allocate_request_id();
        let fields =
            requests::contract::contract_details(session.server_version, request_id, contract)?;

        let reply = session.bus.register(BusKey::Request(request_id));
        session.submit_expirable(&fields)?;
        match reply.wait().await? {
            Response::ContractDetails(details) => Ok(details),
            _ => Err(TwsError::unexpected_response()),
        }
    }

    /// Option chain parameters for an underlying; `exchange` filters
    /// client-side since the server-side exchange filter returns nothing.
    pub async fn sec_def_opt_params(
        &self,
        underlying: &Contract,
        fut_fop_exchange: &str,
        exchange: Option<&str>,
    ) -> Result<Vec<SecDefOptParams>> {
        let session = self.session().await?;
        let request_id = session.allocate_request_id();
        let fields = requests::contract::sec_def_opt_params(
            session.server_version,
            request_id,
            underlying,
            fut_fop_exchange,
        )?;

        let reply = session.bus.register(BusKey::Request(request_id));
        session.submit_expirable(&fields)?;
        let mut rows = match reply.wait().await? {
            Response::SecDefOptParams(rows) => rows,
            _ => return Err(TwsError::unexpected_response()),
        };
        if let Some(exchange) = exchange {
            rows.retain(|row| row.exchange == exchange);
        }
        Ok(rows)
    }

    /// Historical bars.
    pub async fn historical_data(&self, params: &HistoricalDataParams) -> Result<HistoricalData> {
        let session = self.session().await?;
        let request_id = session.allocate_request_id();
        let fields =
            requests::market_data::historical_data(session.server_version, request_id, params)?;

        let reply = session.bus.register(BusKey::Request(request_id));
        session.submit_expirable(&fields)?;
        match reply.wait().await? {
            Response::HistoricalData(data) => Ok(data),
            _ => Err(TwsError::unexpected_response()),
        }
    }

    /// Cancel a delayed or keep-up-to-date historical-data request.
    pub async fn cancel_historical_data(&self, request_id: i64) -> Result<()> {
        let session = self.session().await?;
        let fields = requests::market_data::cancel_historical_data(request_id);
        session.submit_durable(&fields)
    }

    /// Earliest data point available for a contract.
    pub async fn head_timestamp(
        &self,
        contract: &Contract,
        what_to_show: &str,
        use_rth: bool,
        format_date: i32,
    ) -> Result<String> {
        let session = self.session().await?;
        let request_id = session.allocate_request_id();
        let fields = requests::market_data::head_timestamp(
            session.server_version,
            request_id,
            contract,
            what_to_show,
            use_rth,
            format_date,
        )?;

        let reply = session.bus.register(BusKey::Request(request_id));
        session.submit_expirable(&fields)?;
        match reply.wait().await? {
            Response::HeadTimestamp(ts) => Ok(ts),
            _ => Err(TwsError::unexpected_response()),
        }
    }

    /// Cancel a pending head-timestamp request.
    pub async fn cancel_head_timestamp(&self, request_id: i64) -> Result<()> {
        let session = self.session().await?;
        let fields =
            requests::market_data::cancel_head_timestamp(session.server_version, request_id)?;
        session.submit_durable(&fields)
    }

    /// Traded-volume histogram over a time period.
    pub async fn histogram_data(
        &self,
        contract: &Contract,
        use_rth: bool,
        time_period: &str,
    ) -> Result<Vec<HistogramEntry>> {
        let session = self.session().await?;
        let request_id = session.allocate_request_id();
        let fields = requests::market_data::histogram_data(
            session.server_version,
            request_id,
            contract,
            use_rth,
            time_period,
        )?;

        let reply = session.bus.register(BusKey::Request(request_id));
        session.submit_expirable(&fields)?;
        match reply.wait().await? {
            Response::HistogramData(entries) => Ok(entries),
            _ => Err(TwsError::unexpected_response()),
        }
    }

    /// Cancel a pending histogram request.
    pub async fn cancel_histogram_data(&self, request_id: i64) -> Result<()> {
        let session = self.session().await?;
        let fields =
            requests::market_data::cancel_histogram_data(session.server_version, request_id)?;
        session.submit_durable(&fields)
    }

    /// Historical ticks; the result shape follows `what_to_show`.
    pub async fn historical_ticks(
        &self,
        params: &HistoricalTicksParams,
    ) -> Result<HistoricalTicksResult> {
        let session = self.session().await?;
        let request_id = session.allocate_request_id();
        let fields =
            requests::market_data::historical_ticks(session.server_version, request_id, params)?;

        let reply = session.bus.register(BusKey::Request(request_id));
        session.submit_expirable(&fields)?;
        match reply.wait().await? {
            Response::HistoricalTicks(t) => Ok(HistoricalTicksResult::Midpoint(t)),
            Response::HistoricalTicksBidAsk(t) => Ok(HistoricalTicksResult::BidAsk(t)),
            Response::HistoricalTicksLast(t) => Ok(HistoricalTicksResult::Trades(t)),
            _ => Err(TwsError::unexpected_response()),
        }
    }

    /// XML description of all supported scanner queries.
    pub async fn scanner_parameters(&self) -> Result<String> {
        let session = self.session().await?;
        let mut b = FieldsetBuilder::new();
        b.push_i32(outgoing::REQ_SCANNER_PARAMETERS).push_i32(1);

        let reply = session
            .bus
            .register(BusKey::Kind(IncomingKind::ScannerParameters));
        session.submit_durable(&b.into_fields())?;
        match reply.wait().await? {
            Response::ScannerParameters(xml) => Ok(xml),
            _ => Err(TwsError::unexpected_response()),
        }
    }

    /// Run a market scan and collect the result rows.
    pub async fn scanner_subscription(
        &self,
        subscription: &ScannerSubscription,
        filter_options: &[(String, String)],
        subscription_options: &[(String, String)],
    ) -> Result<Vec<ScannerItem>> {
        let session = self.session().await?;
        let request_id = session.allocate_request_id();
        let fields = requests::market_data::scanner_subscription(
            session.server_version,
            request_id,
            subscription,
            filter_options,
            subscription_options,
        )?;

        let reply = session.bus.register(BusKey::Request(request_id));
        session.submit_expirable(&fields)?;
        match reply.wait().await? {
            Response::ScannerData(items) => Ok(items),
            _ => Err(TwsError::unexpected_response()),
        }
    }

    /// Stop a running scanner subscription.
    pub async fn cancel_scanner_subscription(&self, request_id: i64) -> Result<()> {
        let session = self.session().await?;
        let fields = requests::market_data::cancel_scanner_subscription(request_id);
        session.submit_durable(&fields)
    }

    /// Stop a real-time-bars feed.
    pub async fn cancel_real_time_bars(&self, request_id: i64) -> Result<()> {
        let session = self.session().await?;
        let fields = requests::market_data::cancel_real_time_bars(request_id);
        session.submit_durable(&fields)
    }
}
