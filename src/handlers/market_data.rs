//! Decoders for the market-data message family.

use crate::bus::{BusInner, BusKey, Response, StreamEvent, TickByTick};
use crate::error::Result;
use crate::market_data::{OptionComputation, TickValue};
use crate::messages::tick_type;
use crate::protocol::FieldCursor;

/// Price ticks that carry an implicit companion size field. Only the codes
/// in this table trigger the secondary size emission.
fn size_tick_for(price_tick: i32) -> Option<i32> {
    match price_tick {
        tick_type::BID => Some(tick_type::BID_SIZE),
        tick_type::ASK => Some(tick_type::ASK_SIZE),
        tick_type::LAST => Some(tick_type::LAST_SIZE),
        tick_type::DELAYED_BID => Some(tick_type::DELAYED_BID_SIZE),
        tick_type::DELAYED_ASK => Some(tick_type::DELAYED_ASK_SIZE),
        tick_type::DELAYED_LAST => Some(tick_type::DELAYED_LAST_SIZE),
        _ => None,
    }
}

pub(super) fn tick_price(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    cur.skip()?; // message version
    let request_id = cur.next_int()?;
    let kind = cur.next_i32()?;
    let price = cur.next_float()?;
    let size = cur.next_int()?;
    let mask = cur.next_i32()?;

    inner
        .ticker_mut(request_id)
        .values
        .insert(kind, TickValue::Price(price));
    inner.emit(
        request_id,
        StreamEvent::Tick {
            tick_type: kind,
            value: price,
            mask: Some(mask),
        },
    );

    // A price tick for these codes doubles as the matching size tick.
    if let Some(size_kind) = size_tick_for(kind) {
        inner
            .ticker_mut(request_id)
            .values
            .insert(size_kind, TickValue::Size(size));
        inner.emit(
            request_id,
            StreamEvent::TickSize {
                tick_type: size_kind,
                size,
            },
        );
    }
    Ok(())
}

pub(super) fn tick_size(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    cur.skip()?; // message version
    let request_id = cur.next_int()?;
    let kind = cur.next_i32()?;
    let size = cur.next_int()?;

    inner
        .ticker_mut(request_id)
        .values
        .insert(kind, TickValue::Size(size));
    inner.emit(
        request_id,
        StreamEvent::TickSize {
            tick_type: kind,
            size,
        },
    );
    Ok(())
}

pub(super) fn tick_generic(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    cur.skip()?; // message version
    let request_id = cur.next_int()?;
    let kind = cur.next_i32()?;
    let value = cur.next_float()?;

    inner
        .ticker_mut(request_id)
        .values
        .insert(kind, TickValue::Value(value));
    inner.emit(
        request_id,
        StreamEvent::Tick {
            tick_type: kind,
            value,
            mask: None,
        },
    );
    Ok(())
}

pub(super) fn tick_string(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    cur.skip()?; // message version
    let request_id = cur.next_int()?;
    let kind = cur.next_i32()?;
    let value = cur.next_string()?;

    inner
        .ticker_mut(request_id)
        .values
        .insert(kind, TickValue::Text(value.clone()));
    inner.emit(
        request_id,
        StreamEvent::TickString {
            tick_type: kind,
            value,
        },
    );
    Ok(())
}

pub(super) fn tick_snapshot_end(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    cur.skip()?; // message version
    let request_id = cur.next_int()?;
    let ticker = inner.take_ticker(request_id);
    inner.resolve(BusKey::Request(request_id), Response::Ticker(ticker));
    Ok(())
}

pub(super) fn market_data_type(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    cur.skip()?; // message version
    let request_id = cur.next_int()?;
    let data_type = cur.next_i32()?;

    inner.ticker_mut(request_id).market_data_type = Some(data_type);
    inner.emit(request_id, StreamEvent::MarketDataType(data_type));
    Ok(())
}

pub(super) fn tick_req_params(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    let request_id = cur.next_int()?;
    let min_tick = cur.next_float()?;
    let bbo_exchange = cur.next_string()?;
    let snapshot_permissions = cur.next_i32()?;

    inner.emit(
        request_id,
        StreamEvent::ReqParams {
            min_tick,
            bbo_exchange,
            snapshot_permissions,
        },
    );
    Ok(())
}

pub(super) fn tick_by_tick(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    let request_id = cur.next_int()?;
    let kind = cur.next_i32()?;
    let time = cur.next_int()?;

    let event = match kind {
        // 0 = none
        0 => return Ok(()),
        // 1 = Last, 2 = AllLast
        1 | 2 => {
            let price = cur.next_float()?;
            let size = cur.next_int()?;
            let mask = cur.next_i32()?;
            let exchange = cur.next_string()?;
            let special_conditions = cur.next_string()?;
            TickByTick::Trade {
                tick_type: kind,
                time,
                price,
                size,
                mask,
                exchange,
                special_conditions,
            }
        }
        3 => TickByTick::BidAsk {
            time,
            bid_price: cur.next_float()?,
            ask_price: cur.next_float()?,
            bid_size: cur.next_int()?,
            ask_size: cur.next_int()?,
            mask: cur.next_i32()?,
        },
        4 => TickByTick::MidPoint {
            time,
            mid_point: cur.next_float()?,
        },
        other => {
            tracing::warn!(kind = other, "unknown tick-by-tick kind");
            return Ok(());
        }
    };

    inner.emit(request_id, StreamEvent::TickByTick(event));
    Ok(())
}

pub(super) fn tick_option_computation(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    let version = cur.next_i32()?;
    let request_id = cur.next_int()?;
    let kind = cur.next_i32()?;

    // -1 and -2 are reserved "not (yet) computed" markers and must never
    // surface as literal numbers.
    let implied_vol = cur.next_float()?;
    let implied_vol = (implied_vol >= 0.0).then_some(implied_vol);
    let delta = cur.next_float()?;
    let delta = (delta != -2.0).then_some(delta);

    let mut comp = OptionComputation {
        implied_vol,
        delta,
        ..Default::default()
    };

    if version >= 6
        || kind == tick_type::MODEL_OPTION
        || kind == tick_type::DELAYED_MODEL_OPTION
    {
        let opt_price = cur.next_float()?;
        comp.opt_price = (opt_price != -1.0).then_some(opt_price);
        let pv_dividend = cur.next_float()?;
        comp.pv_dividend = (pv_dividend != -1.0).then_some(pv_dividend);
    }

    if version >= 6 {
        let gamma = cur.next_float()?;
        comp.gamma = (gamma != -2.0).then_some(gamma);
        let vega = cur.next_float()?;
        comp.vega = (vega != -2.0).then_some(vega);
        let theta = cur.next_float()?;
        comp.theta = (theta != -2.0).then_some(theta);
        let und_price = cur.next_float()?;
        comp.und_price = (und_price != -1.0).then_some(und_price);
    }

    inner.ticker_mut(request_id).option_computation = Some(comp);
    Ok(())
}
