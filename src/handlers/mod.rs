//! Inbound frame decoding and dispatch.
//!
//! Every handler consumes its fieldset strictly in wire order through a
//! [`FieldCursor`] and runs with the bus lock held, so storage writes,
//! resolution and event emission for one frame are atomic with respect to
//! caller registration.

mod market_data;
mod order;

use std::collections::HashMap;

use crate::bus::{BusInner, BusKey, ClientEvent, ErrorFrame, Record, Response};
use crate::contract::{Contract, ContractDetails};
use crate::error::Result;
use crate::market_data::{
    Bar, HistogramEntry, HistoricalData, HistoricalTick, HistoricalTickBidAsk,
    HistoricalTickLast, Position, RealTimeBar, ScannerItem, SecDefOptParams,
};
use crate::messages::{min_server_ver, IncomingKind};
use crate::protocol::FieldCursor;

/// The negotiation frame: server version plus the connection time-stamp,
/// with no leading type id.
pub(crate) fn handle_server_version(inner: &mut BusInner, fields: &[String]) -> Result<()> {
    let mut cur = FieldCursor::new(fields);
    let version = cur.next_i32()?;
    tracing::debug!(version, "negotiated server version");
    inner.server_version = version;
    inner.resolve(
        BusKey::Kind(IncomingKind::ServerVersion),
        Response::ServerVersion(version),
    );
    Ok(())
}

/// Route one post-negotiation frame by its leading type id.
pub(crate) fn dispatch(inner: &mut BusInner, fields: &[String]) -> Result<()> {
    let mut cur = FieldCursor::new(fields);
    let type_id = cur.next_i32()?;

    let Some(kind) = IncomingKind::from_id(type_id) else {
        tracing::warn!(type_id, "unknown inbound message type");
        return Ok(());
    };

    match kind {
        IncomingKind::TickPrice => market_data::tick_price(inner, cur),
        IncomingKind::TickSize => market_data::tick_size(inner, cur),
        IncomingKind::TickGeneric => market_data::tick_generic(inner, cur),
        IncomingKind::TickString => market_data::tick_string(inner, cur),
        IncomingKind::TickOptionComputation => market_data::tick_option_computation(inner, cur),
        IncomingKind::TickSnapshotEnd => market_data::tick_snapshot_end(inner, cur),
        IncomingKind::TickReqParams => market_data::tick_req_params(inner, cur),
        IncomingKind::TickByTick => market_data::tick_by_tick(inner, cur),
        IncomingKind::MarketDataType => market_data::market_data_type(inner, cur),

        IncomingKind::OrderStatus => order::order_status(inner, cur),
        IncomingKind::OpenOrder => order::open_order(inner, cur),
        IncomingKind::OpenOrderEnd => order::open_order_end(inner),
        IncomingKind::CompletedOrder => order::completed_order(inner, cur),
        IncomingKind::CompletedOrdersEnd => order::completed_orders_end(inner),

        IncomingKind::ErrMsg => err_msg(inner, cur),
        IncomingKind::NextValidId => next_valid_id(inner, cur),
        IncomingKind::ManagedAccts => managed_accts(inner, cur),
        IncomingKind::CurrentTime => current_time(inner, cur),
        IncomingKind::ContractData => contract_data(inner, cur),
        IncomingKind::ContractDataEnd => contract_data_end(inner, cur),
        IncomingKind::PositionData => position_data(inner, cur),
        IncomingKind::PositionEnd => position_end(inner),
        IncomingKind::HistoricalData => historical_data(inner, cur),
        IncomingKind::HistoricalDataUpdate => historical_data_update(inner, cur),
        IncomingKind::RealTimeBars => real_time_bars(inner, cur),
        IncomingKind::HeadTimestamp => head_timestamp(inner, cur),
        IncomingKind::HistogramData => histogram_data(inner, cur),
        IncomingKind::ScannerParameters => scanner_parameters(inner, cur),
        IncomingKind::ScannerData => scanner_data(inner, cur),
        IncomingKind::SecurityDefinitionOptionParameter => sec_def_opt_params(inner, cur),
        IncomingKind::SecurityDefinitionOptionParameterEnd => sec_def_opt_params_end(inner, cur),
        IncomingKind::HistoricalTicks => historical_ticks(inner, cur),
        IncomingKind::HistoricalTicksBidAsk => historical_ticks_bid_ask(inner, cur),
        IncomingKind::HistoricalTicksLast => historical_ticks_last(inner, cur),

        // Recognized but unconsumed message families.
        _ => {
            tracing::debug!(?kind, "no decoder for message kind, frame dropped");
            Ok(())
        }
    }
}

fn err_msg(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    cur.skip()?; // message version
    let request_id = cur.next_int()?;
    let code = cur.next_i32()?;
    let message = cur.next_string()?;
    let frame = ErrorFrame { code, message };

    if request_id > 0 {
        inner.error_for_request(request_id, frame);
    } else {
        inner.emit_connection(ClientEvent::Error(frame));
    }
    Ok(())
}

fn next_valid_id(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    cur.skip()?; // message version
    let id = cur.next_int()?;
    inner.resolve(
        BusKey::Kind(IncomingKind::NextValidId),
        Response::NextValidId(id),
    );
    Ok(())
}

fn managed_accts(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    cur.skip()?; // message version
    let accounts = cur
        .next_str()?
        .split(',')
        .map(str::to_string)
        .collect();
    inner.resolve(
        BusKey::Kind(IncomingKind::ManagedAccts),
        Response::ManagedAccounts(accounts),
    );
    Ok(())
}

fn current_time(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    cur.skip()?; // message version
    let time = cur.next_int()?;
    inner.resolve(
        BusKey::Kind(IncomingKind::CurrentTime),
        Response::CurrentTime(time),
    );
    Ok(())
}

fn contract_data(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    let version = cur.next_i32()?;
    let request_id = if version >= 3 { cur.next_int()? } else { -1 };

    let mut details = ContractDetails::default();
    let c = &mut details.contract;
    c.symbol = cur.next_string()?;
    c.sec_type = cur.next_string()?;

    // The last-trade field can carry a time-of-day part after a space.
    let last_trade = cur.next_str()?;
    if !last_trade.is_empty() {
        let mut parts = last_trade.split(' ');
        if let Some(date) = parts.next() {
            c.last_trade_date_or_contract_month = date.to_string();
        }
        if let Some(time) = parts.next() {
            details.last_trade_time = time.to_string();
        }
    }

    c.strike = cur.next_opt_float()?;
    c.right = cur.next_string()?;
    c.exchange = cur.next_string()?;
    c.currency = cur.next_string()?;
    c.local_symbol = cur.next_string()?;
    details.market_name = cur.next_string()?;
    c.trading_class = cur.next_string()?;
    c.con_id = cur.next_int()?;
    details.min_tick = cur.next_float()?;
    if inner.server_version >= min_server_ver::MD_SIZE_MULTIPLIER {
        details.md_size_multiplier = cur.next_opt_int()?;
    }
    c.multiplier = cur.next_string()?;
    details.order_types = cur.next_string()?;
    details.valid_exchanges = cur.next_string()?;
    details.price_magnifier = cur.next_int()?;
    if version >= 4 {
        details.under_con_id = cur.next_int()?;
    }
    if version >= 5 {
        details.long_name = cur.next_string()?;
        c.primary_exchange = cur.next_string()?;
    }
    if version >= 6 {
        details.contract_month = cur.next_string()?;
        details.industry = cur.next_string()?;
        details.category = cur.next_string()?;
        details.subcategory = cur.next_string()?;
        details.time_zone_id = cur.next_string()?;
        details.trading_hours = cur.next_string()?;
        details.liquid_hours = cur.next_string()?;
    }
    if version >= 8 {
        details.ev_rule = cur.next_string()?;
        details.ev_multiplier = cur.next_int()?;
    }
    if version >= 7 {
        let count = cur.next_int()?;
        for _ in 0..count {
            let tag = cur.next_string()?;
            let value = cur.next_string()?;
            details.sec_id_list.push((tag, value));
        }
    }
    if inner.server_version >= min_server_ver::AGG_GROUP {
        details.agg_group = cur.next_opt_int()?;
    }
    if inner.server_version >= min_server_ver::UNDERLYING_INFO {
        details.under_symbol = cur.next_string()?;
        details.under_sec_type = cur.next_string()?;
    }
    if inner.server_version >= min_server_ver::MARKET_RULES {
        details.market_rule_ids = cur.next_string()?;
    }
    if inner.server_version >= min_server_ver::REAL_EXPIRATION_DATE {
        details.real_expiration_date = cur.next_string()?;
    }

    inner
        .records_mut(BusKey::Request(request_id))
        .push(Record::Contract(details));
    Ok(())
}

fn contract_data_end(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    cur.skip()?; // message version
    let request_id = cur.next_int()?;
    let key = BusKey::Request(request_id);

    let details: Vec<ContractDetails> = inner
        .take_records(key)
        .into_iter()
        .filter_map(|r| match r {
            Record::Contract(d) => Some(d),
            _ => None,
        })
        .collect();
    inner.resolve(key, Response::ContractDetails(details));
    Ok(())
}

fn position_data(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    let version = cur.next_i32()?;
    let account = cur.next_string()?;

    let mut contract = Contract {
        con_id: cur.next_int()?,
        symbol: cur.next_string()?,
        sec_type: cur.next_string()?,
        last_trade_date_or_contract_month: cur.next_string()?,
        strike: cur.next_opt_float()?,
        right: cur.next_string()?,
        multiplier: cur.next_string()?,
        exchange: cur.next_string()?,
        currency: cur.next_string()?,
        local_symbol: cur.next_string()?,
        ..Default::default()
    };
    if version >= 2 {
        contract.trading_class = cur.next_string()?;
    }

    let position = if inner.server_version >= min_server_ver::FRACTIONAL_POSITIONS {
        cur.next_float()?
    } else {
        cur.next_int()? as f64
    };
    let avg_cost = if version >= 3 { cur.next_float()? } else { 0.0 };

    let con_id = contract.con_id;
    inner
        .positions_mut(BusKey::Kind(IncomingKind::PositionEnd))
        .insert(
            con_id,
            Position {
                account,
                contract,
                position,
                avg_cost,
            },
        );
    Ok(())
}

fn position_end(inner: &mut BusInner) -> Result<()> {
    let key = BusKey::Kind(IncomingKind::PositionEnd);
    let positions: HashMap<i64, Position> = inner.take_positions(key);
    inner.resolve(key, Response::Positions(positions));
    Ok(())
}

fn historical_data(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    if inner.server_version < min_server_ver::SYNT_REALTIME_BARS {
        cur.skip()?; // message version
    }
    let request_id = cur.next_int()?;
    let start = cur.next_string()?;
    let end = cur.next_string()?;

    let count = cur.next_int()?;
    let mut bars = Vec::with_capacity(count.max(0) as usize);
    for _ in 0..count {
        let mut bar = Bar {
            date: cur.next_string()?,
            open: cur.next_float()?,
            high: cur.next_float()?,
            low: cur.next_float()?,
            close: cur.next_float()?,
            volume: cur.next_int()?,
            average: cur.next_float()?,
            ..Default::default()
        };
        if inner.server_version < min_server_ver::SYNT_REALTIME_BARS {
            cur.skip()?; // hasGaps, retired field
        }
        bar.bar_count = cur.next_int()?;
        bars.push(bar);
    }

    inner.resolve(
        BusKey::Request(request_id),
        Response::HistoricalData(HistoricalData { start, end, bars }),
    );
    Ok(())
}

fn historical_data_update(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    let request_id = cur.next_int()?;
    // Update frames carry the bar fields in a different order than the
    // initial download: count first, close before high.
    let bar = Bar {
        bar_count: cur.next_int()?,
        date: cur.next_string()?,
        open: cur.next_float()?,
        close: cur.next_float()?,
        high: cur.next_float()?,
        low: cur.next_float()?,
        average: cur.next_float()?,
        volume: cur.next_int()?,
    };
    inner.resolve(
        BusKey::Request(request_id),
        Response::HistoricalBarUpdate(bar),
    );
    Ok(())
}

fn real_time_bars(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    cur.skip()?; // message version
    let request_id = cur.next_int()?;
    let bar = RealTimeBar {
        time: cur.next_int()?,
        open: cur.next_float()?,
        high: cur.next_float()?,
        low: cur.next_float()?,
        close: cur.next_float()?,
        volume: cur.next_int()?,
        wap: cur.next_float()?,
        count: cur.next_int()?,
    };
    inner.resolve(BusKey::Request(request_id), Response::RealTimeBar(bar));
    Ok(())
}

fn head_timestamp(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    let request_id = cur.next_int()?;
    let timestamp = cur.next_string()?;
    inner.resolve(
        BusKey::Request(request_id),
        Response::HeadTimestamp(timestamp),
    );
    Ok(())
}

fn histogram_data(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    let request_id = cur.next_int()?;
    let count = cur.next_int()?;
    let mut entries = Vec::with_capacity(count.max(0) as usize);
    for _ in 0..count {
        entries.push(HistogramEntry {
            price: cur.next_float()?,
            size: cur.next_int()?,
        });
    }
    inner.resolve(
        BusKey::Request(request_id),
        Response::HistogramData(entries),
    );
    Ok(())
}

fn scanner_parameters(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    cur.skip()?; // message version
    let xml = cur.next_string()?;
    inner.resolve(
        BusKey::Kind(IncomingKind::ScannerParameters),
        Response::ScannerParameters(xml),
    );
    Ok(())
}

fn scanner_data(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    cur.skip()?; // message version
    let request_id = cur.next_int()?;
    let count = cur.next_int()?;

    let mut items = Vec::with_capacity(count.max(0) as usize);
    for _ in 0..count {
        let mut item = ScannerItem {
            rank: cur.next_int()?,
            ..Default::default()
        };
        let c = &mut item.contract_details.contract;
        c.con_id = cur.next_int()?;
        c.symbol = cur.next_string()?;
        c.sec_type = cur.next_string()?;
        c.last_trade_date_or_contract_month = cur.next_string()?;
        c.strike = cur.next_opt_float()?;
        c.right = cur.next_string()?;
        c.exchange = cur.next_string()?;
        c.currency = cur.next_string()?;
        c.local_symbol = cur.next_string()?;
        item.contract_details.market_name = cur.next_string()?;
        c.trading_class = cur.next_string()?;
        item.distance = cur.next_string()?;
        item.benchmark = cur.next_string()?;
        item.projection = cur.next_string()?;
        item.legs_str = cur.next_string()?;
        items.push(item);
    }

    inner.resolve(BusKey::Request(request_id), Response::ScannerData(items));
    Ok(())
}

fn sec_def_opt_params(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    let request_id = cur.next_int()?;
    let mut row = SecDefOptParams {
        exchange: cur.next_string()?,
        underlying_con_id: cur.next_int()?,
        trading_class: cur.next_string()?,
        multiplier: cur.next_string()?,
        ..Default::default()
    };

    let exp_count = cur.next_int()?;
    for _ in 0..exp_count {
        row.expirations.push(cur.next_string()?);
    }
    let strike_count = cur.next_int()?;
    for _ in 0..strike_count {
        row.strikes.push(cur.next_float()?);
    }

    inner
        .records_mut(BusKey::Request(request_id))
        .push(Record::SecDef(row));
    Ok(())
}

fn sec_def_opt_params_end(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    let request_id = cur.next_int()?;
    let key = BusKey::Request(request_id);
    let rows: Vec<SecDefOptParams> = inner
        .take_records(key)
        .into_iter()
        .filter_map(|r| match r {
            Record::SecDef(p) => Some(p),
            _ => None,
        })
        .collect();
    inner.resolve(key, Response::SecDefOptParams(rows));
    Ok(())
}

fn historical_ticks(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    let request_id = cur.next_int()?;
    let count = cur.next_int()?;
    let mut ticks = Vec::with_capacity(count.max(0) as usize);
    for _ in 0..count {
        let time = cur.next_int()?;
        cur.skip()?; // pad field, kept for cross-family consistency
        ticks.push(HistoricalTick {
            time,
            price: cur.next_float()?,
            size: cur.next_int()?,
        });
    }
    cur.skip()?; // done flag

    inner.resolve(
        BusKey::Request(request_id),
        Response::HistoricalTicks(ticks),
    );
    Ok(())
}

fn historical_ticks_bid_ask(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    let request_id = cur.next_int()?;
    let count = cur.next_int()?;
    let mut ticks = Vec::with_capacity(count.max(0) as usize);
    for _ in 0..count {
        ticks.push(HistoricalTickBidAsk {
            time: cur.next_int()?,
            mask: cur.next_i32()?,
            price_bid: cur.next_float()?,
            price_ask: cur.next_float()?,
            size_bid: cur.next_int()?,
            size_ask: cur.next_int()?,
        });
    }
    cur.skip()?; // done flag

    inner.resolve(
        BusKey::Request(request_id),
        Response::HistoricalTicksBidAsk(ticks),
    );
    Ok(())
}

fn historical_ticks_last(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    let request_id = cur.next_int()?;
    let count = cur.next_int()?;
    let mut ticks = Vec::with_capacity(count.max(0) as usize);
    for _ in 0..count {
        ticks.push(HistoricalTickLast {
            time: cur.next_int()?,
            mask: cur.next_i32()?,
            price: cur.next_float()?,
            size: cur.next_int()?,
            exchange: cur.next_string()?,
            special_conditions: cur.next_string()?,
        });
    }
    cur.skip()?; // done flag

    inner.resolve(
        BusKey::Request(request_id),
        Response::HistoricalTicksLast(ticks),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::CorrelationBus;
    use tokio::sync::broadcast;
    use tokio::time::Duration;

    fn bus_at(server_version: i32) -> CorrelationBus {
        let (events, _) = broadcast::channel(16);
        let bus = CorrelationBus::new(Duration::from_secs(5), events);
        bus.dispatch(vec![
            server_version.to_string(),
            "20260806 09:30:00 EST".to_string(),
        ]);
        bus
    }

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    #[tokio::test]
    async fn test_contract_details_accumulate_and_resolve() {
        let bus = bus_at(151);
        let reply = bus.register(BusKey::Request(5));

        let mut f = vec!["10".to_string()];
        f.extend(s(&["8", "5"])); // message version, request id
        f.extend(s(&["AAPL", "STK", "20260918 13:30", "", ""]));
        f.extend(s(&["SMART", "USD", "AAPL", "NMS", "AAPL", "265598", "0.01"]));
        f.extend(s(&["100"])); // md size multiplier
        f.extend(s(&["", "LMT,MKT", "SMART,NYSE", "1"]));
        f.extend(s(&["0"])); // under con id
        f.extend(s(&["Apple Inc", "NASDAQ"]));
        f.extend(s(&["", "Technology", "", "", "US/Eastern", "", ""]));
        f.extend(s(&["", "0"])); // ev rule, ev multiplier
        f.extend(s(&["1", "ISIN", "US0378331005"])); // sec id list
        f.extend(s(&["1"])); // agg group
        f.extend(s(&["", ""])); // underlying info
        f.extend(s(&["26"])); // market rule ids
        f.extend(s(&[""])); // real expiration date
        bus.dispatch(f);

        bus.dispatch(s(&["52", "1", "5"]));

        match reply.wait().await.unwrap() {
            Response::ContractDetails(details) => {
                assert_eq!(details.len(), 1);
                let d = &details[0];
                assert_eq!(d.contract.symbol, "AAPL");
                assert_eq!(d.contract.con_id, 265598);
                assert_eq!(d.contract.last_trade_date_or_contract_month, "20260918");
                assert_eq!(d.last_trade_time, "13:30");
                assert_eq!(d.min_tick, 0.01);
                assert_eq!(d.md_size_multiplier, Some(100));
                assert_eq!(d.long_name, "Apple Inc");
                assert_eq!(d.contract.primary_exchange, "NASDAQ");
                assert_eq!(d.sec_id_list, vec![("ISIN".to_string(), "US0378331005".to_string())]);
                assert_eq!(d.market_rule_ids, "26");
            }
            other => panic!("expected contract details, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_historical_data_modern_layout() {
        let bus = bus_at(151);
        let reply = bus.register(BusKey::Request(77));

        bus.dispatch(s(&[
            "17", "77", "20260101 00:00:00", "20260201 00:00:00", "2", //
            "20260102", "100", "103", "99", "102.5", "12000", "101.2", "450", //
            "20260103", "102.5", "104", "101", "103.1", "9000", "103", "390",
        ]));

        match reply.wait().await.unwrap() {
            Response::HistoricalData(data) => {
                assert_eq!(data.start, "20260101 00:00:00");
                assert_eq!(data.bars.len(), 2);
                assert_eq!(data.bars[0].date, "20260102");
                assert_eq!(data.bars[0].close, 102.5);
                assert_eq!(data.bars[0].bar_count, 450);
                assert_eq!(data.bars[1].volume, 9000);
            }
            other => panic!("expected historical data, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_historical_data_legacy_has_gaps_field() {
        let bus = bus_at(120);
        let reply = bus.register(BusKey::Request(4));

        // Pre-synthetic-bars servers carry a message version and a retired
        // hasGaps token inside each bar.
        bus.dispatch(s(&[
            "17", "3", "4", "start", "end", "1", //
            "20260102", "100", "103", "99", "102.5", "12000", "101.2", "false", "450",
        ]));

        match reply.wait().await.unwrap() {
            Response::HistoricalData(data) => {
                assert_eq!(data.bars.len(), 1);
                assert_eq!(data.bars[0].bar_count, 450);
            }
            other => panic!("expected historical data, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_positions_accumulate_by_contract_id() {
        let bus = bus_at(151);
        let reply = bus.register(BusKey::Kind(IncomingKind::PositionEnd));

        bus.dispatch(s(&[
            "61", "3", "DU1", "265598", "AAPL", "STK", "", "", "", "SMART", "USD", "AAPL",
            "NMS", "100", "150.25",
        ]));
        bus.dispatch(s(&[
            "61", "3", "DU1", "8314", "IBM", "STK", "", "", "", "SMART", "USD", "IBM",
            "IBM", "-50", "120.5",
        ]));
        // A second report for the same conId overwrites the first.
        bus.dispatch(s(&[
            "61", "3", "DU1", "265598", "AAPL", "STK", "", "", "", "SMART", "USD", "AAPL",
            "NMS", "175", "151",
        ]));
        bus.dispatch(s(&["62", "1"]));

        match reply.wait().await.unwrap() {
            Response::Positions(positions) => {
                assert_eq!(positions.len(), 2);
                assert_eq!(positions[&265598].position, 175.0);
                assert_eq!(positions[&265598].avg_cost, 151.0);
                assert_eq!(positions[&8314].position, -50.0);
            }
            other => panic!("expected positions, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_message_type_is_dropped() {
        let bus = bus_at(151);
        // Must not panic or corrupt anything.
        bus.dispatch(s(&["48", "1", "whatever"]));
        bus.dispatch(s(&["not-a-number"]));
    }

    #[tokio::test]
    async fn test_historical_ticks_last_layout() {
        let bus = bus_at(151);
        let reply = bus.register(BusKey::Request(12));

        bus.dispatch(s(&[
            "98", "12", "2", //
            "1700000001", "0", "99.5", "100", "NYSE", "", //
            "1700000002", "2", "99.6", "50", "ARCA", "O", //
            "1", // done
        ]));

        match reply.wait().await.unwrap() {
            Response::HistoricalTicksLast(ticks) => {
                assert_eq!(ticks.len(), 2);
                assert_eq!(ticks[0].price, 99.5);
                assert_eq!(ticks[1].exchange, "ARCA");
                assert_eq!(ticks[1].special_conditions, "O");
            }
            other => panic!("expected last ticks, got {:?}", other),
        }
    }
}
