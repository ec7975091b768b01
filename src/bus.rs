//! Request/response correlation bus.
//!
//! Inbound frames are demultiplexed by message kind or request id into one
//! of three consumers over shared per-key state:
//!
//! - one-shot futures ([`CorrelationBus::register`]): every waiter queued
//!   under a key is resolved with a clone of the same result the first time
//!   the key resolves, then the key's state is discarded;
//! - live subscriptions ([`CorrelationBus::open_stream`]): frames addressed
//!   to a request id become typed events until the caller tears the
//!   subscription down;
//! - accumulators: decoders collect repeated sub-records under a key until
//!   a terminator frame drives the resolve path.
//!
//! Key state is created lazily on first touch and deleted once drained or
//! expired, which bounds memory growth over a long-lived connection. Each
//! waiter carries its own timeout; a timeout removes only that waiter.
//!
//! Bus state is deliberately not rejected when the connection closes; the
//! owner decides what a dropped connection means for in-flight calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Duration;

use crate::contract::ContractDetails;
use crate::error::{Result, TwsError};
use crate::handlers;
use crate::market_data::{
    Bar, HistogramEntry, HistoricalData, HistoricalTick, HistoricalTickBidAsk,
    HistoricalTickLast, Position, RealTimeBar, ScannerItem, SecDefOptParams, Ticker,
};
use crate::messages::IncomingKind;
use crate::order::{OrderReport, OrderStatus};
use crate::protocol::Fieldset;

/// Correlation key: either a message kind (connection-scoped messages) or a
/// caller-allocated request id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusKey {
    Kind(IncomingKind),
    Request(i64),
}

/// Error frame payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorFrame {
    pub code: i32,
    pub message: String,
}

/// Result delivered to a one-shot waiter.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    ServerVersion(i32),
    CurrentTime(i64),
    NextValidId(i64),
    ManagedAccounts(Vec<String>),
    ContractDetails(Vec<ContractDetails>),
    Orders(Vec<OrderReport>),
    Positions(HashMap<i64, Position>),
    Ticker(Ticker),
    HistoricalData(HistoricalData),
    HistoricalBarUpdate(Bar),
    RealTimeBar(RealTimeBar),
    HeadTimestamp(String),
    HistogramData(Vec<HistogramEntry>),
    HistoricalTicks(Vec<HistoricalTick>),
    HistoricalTicksBidAsk(Vec<HistoricalTickBidAsk>),
    HistoricalTicksLast(Vec<HistoricalTickLast>),
    ScannerParameters(String),
    ScannerData(Vec<ScannerItem>),
    SecDefOptParams(Vec<SecDefOptParams>),
    /// An error frame reinterpreted as success via resolve-on-error-code.
    Error(ErrorFrame),
}

/// Tick-by-tick event payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum TickByTick {
    Trade {
        tick_type: i32,
        time: i64,
        price: f64,
        size: i64,
        mask: i32,
        exchange: String,
        special_conditions: String,
    },
    BidAsk {
        time: i64,
        bid_price: f64,
        ask_price: f64,
        bid_size: i64,
        ask_size: i64,
        mask: i32,
    },
    MidPoint { time: i64, mid_point: f64 },
}

/// Event delivered on a per-request subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Numeric tick (price or generic value).
    Tick {
        tick_type: i32,
        value: f64,
        mask: Option<i32>,
    },
    TickString { tick_type: i32, value: String },
    TickSize { tick_type: i32, size: i64 },
    TickByTick(TickByTick),
    MarketDataType(i32),
    ReqParams {
        min_tick: f64,
        bbo_exchange: String,
        snapshot_permissions: i32,
    },
    Error(ErrorFrame),
}

/// Event on the connection-wide channel.
///
/// With no subscriber attached the channel is a no-op sink; broadcast errors
/// are silently swallowed by default.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    Error(ErrorFrame),
    OrderStatus(OrderStatus),
    Close,
}

/// Accumulated sub-record, list-shaped accumulations only.
#[derive(Debug, Clone)]
pub(crate) enum Record {
    Contract(ContractDetails),
    Order(OrderReport),
    SecDef(SecDefOptParams),
}

struct Waiter {
    token: u64,
    tx: oneshot::Sender<Result<Response>>,
}

#[derive(Default)]
pub(crate) struct KeyState {
    waiters: Vec<Waiter>,
    resolve_on_error: Option<i32>,
    stream: Option<mpsc::UnboundedSender<StreamEvent>>,
    pub(crate) records: Vec<Record>,
    pub(crate) positions: HashMap<i64, Position>,
    pub(crate) ticker: Ticker,
}

/// Shared bus state. Handlers run against this with the bus lock held, so a
/// frame's storage writes, resolution and event emission are one atomic
/// step relative to caller registration.
pub(crate) struct BusInner {
    /// Negotiated server version; 0 until the negotiation frame arrives.
    pub(crate) server_version: i32,
    states: HashMap<BusKey, KeyState>,
    next_token: u64,
    events: broadcast::Sender<ClientEvent>,
}

impl BusInner {
    pub(crate) fn state_mut(&mut self, key: BusKey) -> &mut KeyState {
        self.states.entry(key).or_default()
    }

    pub(crate) fn records_mut(&mut self, key: BusKey) -> &mut Vec<Record> {
        &mut self.state_mut(key).records
    }

    pub(crate) fn positions_mut(&mut self, key: BusKey) -> &mut HashMap<i64, Position> {
        &mut self.state_mut(key).positions
    }

    pub(crate) fn ticker_mut(&mut self, request_id: i64) -> &mut Ticker {
        &mut self.state_mut(BusKey::Request(request_id)).ticker
    }

    pub(crate) fn take_records(&mut self, key: BusKey) -> Vec<Record> {
        self.states
            .get_mut(&key)
            .map(|s| std::mem::take(&mut s.records))
            .unwrap_or_default()
    }

    pub(crate) fn take_positions(&mut self, key: BusKey) -> HashMap<i64, Position> {
        self.states
            .get_mut(&key)
            .map(|s| std::mem::take(&mut s.positions))
            .unwrap_or_default()
    }

    pub(crate) fn take_ticker(&mut self, request_id: i64) -> Ticker {
        self.states
            .get_mut(&BusKey::Request(request_id))
            .map(|s| std::mem::take(&mut s.ticker))
            .unwrap_or_default()
    }

    /// Resolve a key: broadcast the result to every waiter registered under
    /// it and discard the key's state. A key nobody touched resolves into
    /// nothing.
    pub(crate) fn resolve(&mut self, key: BusKey, response: Response) {
        if let Some(state) = self.states.remove(&key) {
            let mut waiters = state.waiters;
            if let Some(last) = waiters.pop() {
                for waiter in waiters {
                    let _ = waiter.tx.send(Ok(response.clone()));
                }
                let _ = last.tx.send(Ok(response));
            }
        }
    }

    /// Reject a key: broadcast a request error to every waiter and discard
    /// the key's state.
    pub(crate) fn reject(&mut self, key: BusKey, code: i32, message: &str) {
        if let Some(state) = self.states.remove(&key) {
            for waiter in state.waiters {
                let _ = waiter.tx.send(Err(TwsError::Request {
                    code,
                    message: message.to_string(),
                }));
            }
        }
    }

    /// Emit an event on a request id's subscription, if one exists.
    pub(crate) fn emit(&mut self, request_id: i64, event: StreamEvent) {
        match self.states.get(&BusKey::Request(request_id)) {
            Some(state) => {
                if let Some(stream) = &state.stream {
                    let _ = stream.send(event);
                } else {
                    tracing::debug!(request_id, "event for id without subscription");
                }
            }
            None => tracing::debug!(request_id, "event for untracked id"),
        }
    }

    /// Emit an event on the connection-wide channel.
    pub(crate) fn emit_connection(&self, event: ClientEvent) {
        // No subscriber is the accepted default; the send error is the
        // no-op sink.
        let _ = self.events.send(event);
    }

    /// Error fan-in for frames carrying a request id.
    pub(crate) fn error_for_request(&mut self, request_id: i64, frame: ErrorFrame) {
        let key = BusKey::Request(request_id);
        let (has_waiters, resolve_on_error, has_stream) = match self.states.get(&key) {
            Some(state) => (
                !state.waiters.is_empty(),
                state.resolve_on_error,
                state.stream.is_some(),
            ),
            None => {
                tracing::debug!(request_id, code = frame.code, "error for untracked id");
                return;
            }
        };

        if has_waiters {
            if resolve_on_error == Some(frame.code) {
                self.resolve(key, Response::Error(frame));
            } else {
                self.reject(key, frame.code, &frame.message);
            }
        } else if has_stream {
            self.emit(request_id, StreamEvent::Error(frame));
        } else {
            tracing::warn!(
                request_id,
                code = frame.code,
                "dropping error frame: no waiter or subscription"
            );
        }
    }
}

/// Per-connection correlation bus. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CorrelationBus {
    inner: Arc<Mutex<BusInner>>,
    timeout: Duration,
}

/// One registered one-shot wait.
pub struct PendingReply {
    bus: CorrelationBus,
    key: BusKey,
    token: u64,
    rx: oneshot::Receiver<Result<Response>>,
}

impl PendingReply {
    /// Suspend until the key resolves, the key rejects, or this waiter's
    /// timeout fires. A timeout removes only this waiter; co-waiters on the
    /// same key keep waiting.
    pub async fn wait(self) -> Result<Response> {
        let PendingReply {
            bus,
            key,
            token,
            rx,
        } = self;
        match tokio::time::timeout(bus.timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(TwsError::ConnectionClosed),
            Err(_) => {
                bus.remove_waiter(key, token);
                Err(TwsError::Timeout)
            }
        }
    }
}

impl CorrelationBus {
    pub fn new(timeout: Duration, events: broadcast::Sender<ClientEvent>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusInner {
                server_version: 0,
                states: HashMap::new(),
                next_token: 1,
                events,
            })),
            timeout,
        }
    }

    /// Register a one-shot waiter under a key.
    pub fn register(&self, key: BusKey) -> PendingReply {
        self.register_inner(key, None)
    }

    /// Register a one-shot waiter that treats an error frame with the given
    /// code as the successful outcome (cancel-acknowledgement flows).
    pub fn register_resolve_on_error(&self, key: BusKey, code: i32) -> PendingReply {
        self.register_inner(key, Some(code))
    }

    fn register_inner(&self, key: BusKey, error_code: Option<i32>) -> PendingReply {
        let (tx, rx) = oneshot::channel();
        let token = {
            let mut inner = self.inner.lock().unwrap();
            let token = inner.next_token;
            inner.next_token += 1;
            let state = inner.state_mut(key);
            state.waiters.push(Waiter { token, tx });
            if error_code.is_some() {
                state.resolve_on_error = error_code;
            }
            token
        };
        PendingReply {
            bus: self.clone(),
            key,
            token,
            rx,
        }
    }

    /// Open a long-lived subscription for a request id. Events addressed to
    /// the id flow into the returned channel until [`Self::drop_key`].
    pub fn open_stream(&self, request_id: i64) -> mpsc::UnboundedReceiver<StreamEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap();
        inner.state_mut(BusKey::Request(request_id)).stream = Some(tx);
        rx
    }

    /// Delete all state under a key. Used by subscription teardown; the
    /// caller is responsible for also sending the protocol-level cancel.
    pub fn drop_key(&self, key: BusKey) {
        let mut inner = self.inner.lock().unwrap();
        inner.states.remove(&key);
    }

    /// Whether any state exists under a key.
    pub fn has_key(&self, key: BusKey) -> bool {
        self.inner.lock().unwrap().states.contains_key(&key)
    }

    /// Route one inbound fieldset.
    ///
    /// Before version negotiation the only recognizable frame is the
    /// server-version frame: structurally, the first 2-field frame after
    /// the handshake. Everything after that carries a leading type id.
    pub fn dispatch(&self, fields: Fieldset) {
        let mut inner = self.inner.lock().unwrap();
        if inner.server_version == 0 {
            if fields.len() == 2 {
                if let Err(e) = handlers::handle_server_version(&mut inner, &fields) {
                    tracing::error!("bad server-version frame: {}", e);
                }
            } else {
                tracing::debug!("dropping pre-negotiation frame with {} fields", fields.len());
            }
            return;
        }

        if let Err(e) = handlers::dispatch(&mut inner, &fields) {
            tracing::error!("failed to decode inbound frame: {}", e);
        }
    }

    /// Emit a connection-wide event.
    pub fn emit_connection(&self, event: ClientEvent) {
        self.inner.lock().unwrap().emit_connection(event);
    }

    /// Negotiated server version, 0 before negotiation.
    pub fn server_version(&self) -> i32 {
        self.inner.lock().unwrap().server_version
    }

    fn remove_waiter(&self, key: BusKey, token: u64) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(state) = inner.states.get_mut(&key) {
            state.waiters.retain(|w| w.token != token);
            if state.waiters.is_empty() && state.stream.is_none() {
                inner.states.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::IncomingKind;

    fn bus_with_timeout(ms: u64) -> CorrelationBus {
        let (events, _) = broadcast::channel(16);
        CorrelationBus::new(Duration::from_millis(ms), events)
    }

    fn fields(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn negotiated(bus: &CorrelationBus) {
        bus.dispatch(fields(&["151", "20260806 10:11:12 EST"]));
    }

    #[tokio::test]
    async fn test_broadcast_resolution_to_all_waiters() {
        let bus = bus_with_timeout(5_000);
        negotiated(&bus);

        let first = bus.register(BusKey::Kind(IncomingKind::CurrentTime));
        let second = bus.register(BusKey::Kind(IncomingKind::CurrentTime));

        bus.dispatch(fields(&["49", "1", "1700000000"]));

        assert_eq!(first.wait().await.unwrap(), Response::CurrentTime(1700000000));
        assert_eq!(second.wait().await.unwrap(), Response::CurrentTime(1700000000));

        // The key was cleared; a later await starts a fresh wait.
        assert!(!bus.has_key(BusKey::Kind(IncomingKind::CurrentTime)));
        let third = bus.register(BusKey::Kind(IncomingKind::CurrentTime));
        bus.dispatch(fields(&["49", "1", "1700000005"]));
        assert_eq!(third.wait().await.unwrap(), Response::CurrentTime(1700000005));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiter_timeout_leaves_co_waiters() {
        let bus = bus_with_timeout(100);
        negotiated(&bus);

        let timed_out = bus.register(BusKey::Request(5));
        assert!(matches!(timed_out.wait().await, Err(TwsError::Timeout)));
        assert!(!bus.has_key(BusKey::Request(5)));
    }

    #[tokio::test]
    async fn test_error_frame_rejects_request_waiter() {
        let bus = bus_with_timeout(5_000);
        negotiated(&bus);

        let pending = bus.register(BusKey::Request(9));
        bus.dispatch(fields(&["4", "2", "9", "200", "No security definition found"]));

        match pending.wait().await {
            Err(TwsError::Request { code, message }) => {
                assert_eq!(code, 200);
                assert_eq!(message, "No security definition found");
            }
            other => panic!("expected request error, got {:?}", other),
        }
        assert!(!bus.has_key(BusKey::Request(9)));
    }

    #[tokio::test]
    async fn test_resolve_on_error_code_turns_error_into_success() {
        let bus = bus_with_timeout(5_000);
        negotiated(&bus);

        let pending = bus.register_resolve_on_error(BusKey::Request(12), 202);
        bus.dispatch(fields(&["4", "2", "12", "202", "Order cancelled"]));

        assert_eq!(
            pending.wait().await.unwrap(),
            Response::Error(ErrorFrame {
                code: 202,
                message: "Order cancelled".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_error_without_request_id_goes_to_connection_channel() {
        let (events, mut events_rx) = broadcast::channel(16);
        let bus = CorrelationBus::new(Duration::from_secs(5), events);
        negotiated(&bus);

        bus.dispatch(fields(&["4", "2", "-1", "1100", "Connectivity lost"]));

        match events_rx.recv().await.unwrap() {
            ClientEvent::Error(e) => {
                assert_eq!(e.code, 1100);
                assert_eq!(e.message, "Connectivity lost");
            }
            other => panic!("expected error event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stream_teardown_stops_events_and_clears_state() {
        let bus = bus_with_timeout(5_000);
        negotiated(&bus);

        let mut stream = bus.open_stream(31);
        bus.dispatch(fields(&["1", "6", "31", "4", "101.25", "50", "0"]));

        assert!(matches!(
            stream.recv().await,
            Some(StreamEvent::Tick { tick_type: 4, .. })
        ));

        bus.drop_key(BusKey::Request(31));
        assert!(!bus.has_key(BusKey::Request(31)));

        // Frames addressed to the stopped id produce no events.
        bus.dispatch(fields(&["1", "6", "31", "4", "102.0", "10", "0"]));
        // LAST price tick also produced a LAST_SIZE event before teardown.
        assert!(matches!(
            stream.recv().await,
            Some(StreamEvent::TickSize { .. })
        ));
        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_accumulate_then_terminator_releases_state() {
        let bus = bus_with_timeout(5_000);
        negotiated(&bus);

        let pending = bus.register(BusKey::Request(5));

        // Two option-parameter records, then the terminator.
        bus.dispatch(fields(&[
            "75", "5", "CBOE", "11004968", "SPY", "100", "1", "20260918", "2", "400", "410",
        ]));
        bus.dispatch(fields(&[
            "75", "5", "AMEX", "11004968", "SPY", "100", "1", "20261218", "1", "405",
        ]));
        bus.dispatch(fields(&["76", "5"]));

        match pending.wait().await.unwrap() {
            Response::SecDefOptParams(rows) => {
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0].exchange, "CBOE");
                assert_eq!(rows[1].exchange, "AMEX");
            }
            other => panic!("expected option params, got {:?}", other),
        }
        assert!(!bus.has_key(BusKey::Request(5)));
    }

    #[tokio::test]
    async fn test_pre_negotiation_routing() {
        let bus = bus_with_timeout(5_000);

        let pending = bus.register(BusKey::Kind(IncomingKind::ServerVersion));
        // Frames that are not the 2-field negotiation frame are dropped.
        bus.dispatch(fields(&["junk"]));
        bus.dispatch(fields(&["151", "20260806 09:30:00 EST"]));

        assert_eq!(pending.wait().await.unwrap(), Response::ServerVersion(151));
        assert_eq!(bus.server_version(), 151);
    }
}
