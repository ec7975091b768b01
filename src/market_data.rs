//! Market-data, account and scanner record types.

use std::collections::BTreeMap;

use crate::contract::{Contract, ContractDetails};

/// One tick value keyed by tick field code in a [`Ticker`].
#[derive(Debug, Clone, PartialEq)]
pub enum TickValue {
    Price(f64),
    Size(i64),
    Value(f64),
    Text(String),
}

/// Option greeks block delivered by the option-computation tick.
///
/// Fields the server has not computed yet arrive as reserved sentinel
/// numbers on the wire and are stored here as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionComputation {
    pub implied_vol: Option<f64>,
    pub delta: Option<f64>,
    pub opt_price: Option<f64>,
    pub pv_dividend: Option<f64>,
    pub gamma: Option<f64>,
    pub vega: Option<f64>,
    pub theta: Option<f64>,
    pub und_price: Option<f64>,
}

/// Accumulated market-data snapshot for one request id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ticker {
    /// Latest value per tick field code.
    pub values: BTreeMap<i32, TickValue>,
    pub market_data_type: Option<i32>,
    pub option_computation: Option<OptionComputation>,
}

impl Ticker {
    fn price(&self, field: i32) -> Option<f64> {
        match self.values.get(&field) {
            Some(TickValue::Price(p)) => Some(*p),
            _ => None,
        }
    }

    fn size(&self, field: i32) -> Option<i64> {
        match self.values.get(&field) {
            Some(TickValue::Size(s)) => Some(*s),
            _ => None,
        }
    }

    pub fn bid(&self) -> Option<f64> {
        self.price(crate::messages::tick_type::BID)
    }

    pub fn ask(&self) -> Option<f64> {
        self.price(crate::messages::tick_type::ASK)
    }

    pub fn last(&self) -> Option<f64> {
        self.price(crate::messages::tick_type::LAST)
    }

    pub fn close(&self) -> Option<f64> {
        self.price(crate::messages::tick_type::CLOSE)
    }

    pub fn bid_size(&self) -> Option<i64> {
        self.size(crate::messages::tick_type::BID_SIZE)
    }

    pub fn ask_size(&self) -> Option<i64> {
        self.size(crate::messages::tick_type::ASK_SIZE)
    }

    pub fn last_size(&self) -> Option<i64> {
        self.size(crate::messages::tick_type::LAST_SIZE)
    }
}

/// One historical bar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bar {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub average: f64,
    pub bar_count: i64,
}

/// Result of a historical-data request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalData {
    pub start: String,
    pub end: String,
    pub bars: Vec<Bar>,
}

/// One five-second real-time bar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RealTimeBar {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub wap: f64,
    pub count: i64,
}

/// Historical midpoint/trade tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalTick {
    pub time: i64,
    pub price: f64,
    pub size: i64,
}

/// Historical bid/ask tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalTickBidAsk {
    pub time: i64,
    pub mask: i32,
    pub price_bid: f64,
    pub price_ask: f64,
    pub size_bid: i64,
    pub size_ask: i64,
}

/// Historical last-trade tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalTickLast {
    pub time: i64,
    pub mask: i32,
    pub price: f64,
    pub size: i64,
    pub exchange: String,
    pub special_conditions: String,
}

/// Historical-ticks result; the shape follows the request's `what_to_show`.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoricalTicksResult {
    Midpoint(Vec<HistoricalTick>),
    BidAsk(Vec<HistoricalTickBidAsk>),
    Trades(Vec<HistoricalTickLast>),
}

/// One histogram bucket: traded size at a price level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistogramEntry {
    pub price: f64,
    pub size: i64,
}

/// One position row keyed by contract id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Position {
    pub account: String,
    pub contract: Contract,
    pub position: f64,
    pub avg_cost: f64,
}

/// Option chain parameters for one exchange.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecDefOptParams {
    pub exchange: String,
    pub underlying_con_id: i64,
    pub trading_class: String,
    pub multiplier: String,
    pub expirations: Vec<String>,
    pub strikes: Vec<f64>,
}

/// Scanner subscription filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannerSubscription {
    pub number_of_rows: i32,
    pub instrument: String,
    pub location_code: String,
    pub scan_code: String,
    pub above_price: Option<f64>,
    pub below_price: Option<f64>,
    pub above_volume: Option<i64>,
    pub market_cap_above: Option<f64>,
    pub market_cap_below: Option<f64>,
    pub moody_rating_above: String,
    pub moody_rating_below: String,
    pub sp_rating_above: String,
    pub sp_rating_below: String,
    pub maturity_date_above: String,
    pub maturity_date_below: String,
    pub coupon_rate_above: Option<f64>,
    pub coupon_rate_below: Option<f64>,
    pub exclude_convertible: bool,
    pub average_option_volume_above: Option<i64>,
    pub scanner_setting_pairs: String,
    pub stock_type_filter: String,
}

impl Default for ScannerSubscription {
    fn default() -> Self {
        Self {
            number_of_rows: -1,
            instrument: String::new(),
            location_code: String::new(),
            scan_code: String::new(),
            above_price: None,
            below_price: None,
            above_volume: None,
            market_cap_above: None,
            market_cap_below: None,
            moody_rating_above: String::new(),
            moody_rating_below: String::new(),
            sp_rating_above: String::new(),
            sp_rating_below: String::new(),
            maturity_date_above: String::new(),
            maturity_date_below: String::new(),
            coupon_rate_above: None,
            coupon_rate_below: None,
            exclude_convertible: false,
            average_option_volume_above: None,
            scanner_setting_pairs: String::new(),
            stock_type_filter: String::new(),
        }
    }
}

/// One scanner result row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScannerItem {
    pub rank: i64,
    pub contract_details: ContractDetails,
    pub distance: String,
    pub benchmark: String,
    pub projection: String,
    pub legs_str: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::tick_type;

    #[test]
    fn test_ticker_accessors() {
        let mut ticker = Ticker::default();
        ticker.values.insert(tick_type::BID, TickValue::Price(99.5));
        ticker.values.insert(tick_type::BID_SIZE, TickValue::Size(300));

        assert_eq!(ticker.bid(), Some(99.5));
        assert_eq!(ticker.bid_size(), Some(300));
        assert_eq!(ticker.ask(), None);
    }

    #[test]
    fn test_scanner_subscription_defaults() {
        let s = ScannerSubscription::default();
        assert_eq!(s.number_of_rows, -1);
        assert_eq!(s.above_price, None);
    }
}
