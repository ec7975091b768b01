//! Encoders for market-data requests.

use crate::contract::Contract;
use crate::error::{Result, TwsError};
use crate::market_data::ScannerSubscription;
use crate::messages::{min_server_ver, outgoing};
use crate::protocol::FieldsetBuilder;

use super::require;

/// Encode a market-data request, either streaming or snapshot.
pub fn market_data(
    server_version: i32,
    request_id: i64,
    contract: &Contract,
    generic_tick_list: &str,
    snapshot: bool,
    regulatory_snapshot: bool,
) -> Result<Vec<String>> {
    if server_version < min_server_ver::DELTA_NEUTRAL
        && contract.delta_neutral_contract.is_some()
    {
        return Err(TwsError::Capability {
            feature: "delta-neutral market data",
            required: min_server_ver::DELTA_NEUTRAL,
        });
    }
    if server_version < min_server_ver::REQ_MKT_DATA_CONID && contract.con_id > 0 {
        return Err(TwsError::Capability {
            feature: "conId parameter in market data requests",
            required: min_server_ver::REQ_MKT_DATA_CONID,
        });
    }
    if server_version < min_server_ver::TRADING_CLASS && !contract.trading_class.is_empty() {
        return Err(TwsError::Capability {
            feature: "tradingClass parameter in market data requests",
            required: min_server_ver::TRADING_CLASS,
        });
    }

    const VERSION: i32 = 11;

    let mut b = FieldsetBuilder::new();
    b.push_i32(outgoing::REQ_MKT_DATA).push_i32(VERSION).push_int(request_id);

    if server_version >= min_server_ver::REQ_MKT_DATA_CONID {
        b.push_int(contract.con_id);
    }
    b.push_str(&contract.symbol);
    b.push_str(&contract.sec_type);
    b.push_str(&contract.last_trade_date_or_contract_month);
    b.push_opt_float(contract.strike);
    b.push_str(&contract.right);
    b.push_str(&contract.multiplier);
    b.push_str(&contract.exchange);
    b.push_str(&contract.primary_exchange);
    b.push_str(&contract.currency);
    b.push_str(&contract.local_symbol);
    if server_version >= min_server_ver::TRADING_CLASS {
        b.push_str(&contract.trading_class);
    }

    if contract.sec_type == "BAG" && !contract.combo_legs.is_empty() {
        b.push_int(contract.combo_legs.len() as i64);
        for leg in &contract.combo_legs {
            b.push_int(leg.con_id);
            b.push_int(leg.ratio);
            b.push_str(&leg.action);
            b.push_str(&leg.exchange);
        }
    }

    if server_version >= min_server_ver::DELTA_NEUTRAL {
        match &contract.delta_neutral_contract {
            Some(dn) => {
                b.push_bool(true);
                b.push_int(dn.con_id);
                b.push_float(dn.delta);
                b.push_float(dn.price);
            }
            None => {
                b.push_bool(false);
            }
        }
    }

    b.push_str(generic_tick_list);
    b.push_bool(snapshot);
    if server_version >= min_server_ver::REQ_SMART_COMPONENTS {
        b.push_bool(regulatory_snapshot);
    }
    if server_version >= min_server_ver::LINKING {
        b.push_empty(); // mktDataOptions, internal use only
    }

    Ok(b.into_fields())
}

/// Encode a market-data cancel.
pub fn cancel_market_data(request_id: i64) -> Vec<String> {
    let mut b = FieldsetBuilder::new();
    b.push_i32(outgoing::CANCEL_MKT_DATA).push_i32(2).push_int(request_id);
    b.into_fields()
}

/// Encode a market-data-type switch (real-time vs frozen).
pub fn market_data_type(server_version: i32, data_type: i32) -> Result<Vec<String>> {
    require(
        server_version,
        min_server_ver::REQ_MARKET_DATA_TYPE,
        "market data type requests",
    )?;
    let mut b = FieldsetBuilder::new();
    b.push_i32(outgoing::REQ_MARKET_DATA_TYPE).push_i32(1).push_i32(data_type);
    Ok(b.into_fields())
}

/// Encode a tick-by-tick data request.
pub fn tick_by_tick(
    server_version: i32,
    request_id: i64,
    contract: &Contract,
    tick_kind: &str,
    number_of_ticks: i64,
    ignore_size: bool,
) -> Result<Vec<String>> {
    require(
        server_version,
        min_server_ver::TICK_BY_TICK,
        "tick-by-tick data requests",
    )?;
    require(
        server_version,
        min_server_ver::TICK_BY_TICK_IGNORE_SIZE,
        "ignoreSize and numberOfTicks in tick-by-tick data requests",
    )?;

    let mut b = FieldsetBuilder::new();
    b.push_i32(outgoing::REQ_TICK_BY_TICK_DATA).push_int(request_id);
    b.push_int(contract.con_id);
    b.push_str(&contract.symbol);
    b.push_str(&contract.sec_type);
    b.push_str(&contract.last_trade_date_or_contract_month);
    b.push_opt_float(contract.strike);
    b.push_str(&contract.right);
    b.push_str(&contract.multiplier);
    b.push_str(&contract.exchange);
    b.push_str(&contract.primary_exchange);
    b.push_str(&contract.currency);
    b.push_str(&contract.local_symbol);
    b.push_str(&contract.trading_class);
    b.push_str(tick_kind);

    if server_version >= min_server_ver::TICK_BY_TICK_IGNORE_SIZE {
        b.push_int(number_of_ticks);
        b.push_bool(ignore_size);
    }

    Ok(b.into_fields())
}

/// Encode a tick-by-tick cancel.
pub fn cancel_tick_by_tick(server_version: i32, request_id: i64) -> Result<Vec<String>> {
    require(
        server_version,
        min_server_ver::TICK_BY_TICK,
        "tick-by-tick data requests",
    )?;
    let mut b = FieldsetBuilder::new();
    b.push_i32(outgoing::CANCEL_TICK_BY_TICK_DATA).push_int(request_id);
    Ok(b.into_fields())
}

/// Historical-data request parameters.
#[derive(Debug, Clone, Default)]
pub struct HistoricalDataParams {
    pub contract: Contract,
    pub end_date_time: String,
    pub duration: String,
    pub bar_size_setting: String,
    pub what_to_show: String,
    pub use_rth: bool,
    pub format_date: i32,
    pub keep_up_to_date: bool,
    pub chart_options: Vec<(String, String)>,
}

/// Encode a historical-data request.
pub fn historical_data(
    server_version: i32,
    request_id: i64,
    p: &HistoricalDataParams,
) -> Result<Vec<String>> {
    let contract = &p.contract;
    if server_version < min_server_ver::TRADING_CLASS
        && (!contract.trading_class.is_empty() || contract.con_id > 0)
    {
        return Err(TwsError::Capability {
            feature: "conId and tradingClass parameters in historical data requests",
            required: min_server_ver::TRADING_CLASS,
        });
    }

    const VERSION: i32 = 6;

    let mut b = FieldsetBuilder::new();
    b.push_i32(outgoing::REQ_HISTORICAL_DATA);
    if server_version < min_server_ver::SYNT_REALTIME_BARS {
        b.push_i32(VERSION);
    }
    b.push_int(request_id);

    if server_version >= min_server_ver::TRADING_CLASS {
        b.push_int(contract.con_id);
    }
    b.push_str(&contract.symbol);
    b.push_str(&contract.sec_type);
    b.push_str(&contract.last_trade_date_or_contract_month);
    b.push_opt_float(contract.strike);
    b.push_str(&contract.right);
    b.push_str(&contract.multiplier);
    b.push_str(&contract.exchange);
    b.push_str(&contract.primary_exchange);
    b.push_str(&contract.currency);
    b.push_str(&contract.local_symbol);
    if server_version >= min_server_ver::TRADING_CLASS {
        b.push_str(&contract.trading_class);
    }
    b.push_bool(contract.include_expired);
    b.push_str(&p.end_date_time);
    b.push_str(&p.bar_size_setting);
    b.push_str(&p.duration);
    b.push_bool(p.use_rth);
    b.push_str(&p.what_to_show);
    b.push_i32(p.format_date);

    if contract.sec_type == "BAG" {
        b.push_int(contract.combo_legs.len() as i64);
        for leg in &contract.combo_legs {
            b.push_int(leg.con_id);
            b.push_int(leg.ratio);
            b.push_str(&leg.action);
            b.push_str(&leg.exchange);
        }
    }

    if server_version >= min_server_ver::SYNT_REALTIME_BARS {
        b.push_bool(p.keep_up_to_date);
    }
    if server_version >= min_server_ver::LINKING {
        b.push_tags(&p.chart_options);
    }

    Ok(b.into_fields())
}

/// Encode a historical-data cancel.
pub fn cancel_historical_data(request_id: i64) -> Vec<String> {
    let mut b = FieldsetBuilder::new();
    b.push_i32(outgoing::CANCEL_HISTORICAL_DATA).push_i32(1).push_int(request_id);
    b.into_fields()
}

/// Encode a head-timestamp request (earliest available data point).
pub fn head_timestamp(
    server_version: i32,
    request_id: i64,
    contract: &Contract,
    what_to_show: &str,
    use_rth: bool,
    format_date: i32,
) -> Result<Vec<String>> {
    require(
        server_version,
        min_server_ver::REQ_HEAD_TIMESTAMP,
        "head timestamp requests",
    )?;

    let mut b = FieldsetBuilder::new();
    b.push_i32(outgoing::REQ_HEAD_TIMESTAMP).push_int(request_id);
    b.push_int(contract.con_id);
    b.push_str(&contract.symbol);
    b.push_str(&contract.sec_type);
    b.push_str(&contract.last_trade_date_or_contract_month);
    b.push_opt_float(contract.strike);
    b.push_str(&contract.right);
    b.push_str(&contract.multiplier);
    b.push_str(&contract.exchange);
    b.push_str(&contract.primary_exchange);
    b.push_str(&contract.currency);
    b.push_str(&contract.local_symbol);
    b.push_str(&contract.trading_class);
    b.push_bool(contract.include_expired);
    b.push_bool(use_rth);
    b.push_str(what_to_show);
    b.push_i32(format_date);
    Ok(b.into_fields())
}

/// Encode a head-timestamp cancel.
pub fn cancel_head_timestamp(server_version: i32, request_id: i64) -> Result<Vec<String>> {
    require(
        server_version,
        min_server_ver::CANCEL_HEADTIMESTAMP,
        "head timestamp requests",
    )?;
    let mut b = FieldsetBuilder::new();
    b.push_i32(outgoing::CANCEL_HEAD_TIMESTAMP).push_int(request_id);
    Ok(b.into_fields())
}

/// Encode a histogram-data request.
pub fn histogram_data(
    server_version: i32,
    request_id: i64,
    contract: &Contract,
    use_rth: bool,
    time_period: &str,
) -> Result<Vec<String>> {
    require(
        server_version,
        min_server_ver::REQ_HISTOGRAM,
        "histogram requests",
    )?;

    let mut b = FieldsetBuilder::new();
    b.push_i32(outgoing::REQ_HISTOGRAM_DATA).push_int(request_id);
    b.push_int(contract.con_id);
    b.push_str(&contract.symbol);
    b.push_str(&contract.sec_type);
    b.push_str(&contract.last_trade_date_or_contract_month);
    b.push_opt_float(contract.strike);
    b.push_str(&contract.right);
    b.push_str(&contract.multiplier);
    b.push_str(&contract.exchange);
    b.push_str(&contract.primary_exchange);
    b.push_str(&contract.currency);
    b.push_str(&contract.local_symbol);
    b.push_str(&contract.trading_class);
    b.push_bool(contract.include_expired);
    b.push_bool(use_rth);
    b.push_str(time_period);
    Ok(b.into_fields())
}

/// Encode a histogram-data cancel.
pub fn cancel_histogram_data(server_version: i32, request_id: i64) -> Result<Vec<String>> {
    require(
        server_version,
        min_server_ver::REQ_HISTOGRAM,
        "histogram requests",
    )?;
    let mut b = FieldsetBuilder::new();
    b.push_i32(outgoing::CANCEL_HISTOGRAM_DATA).push_int(request_id);
    Ok(b.into_fields())
}

/// Historical-ticks request parameters.
#[derive(Debug, Clone, Default)]
pub struct HistoricalTicksParams {
    pub contract: Contract,
    pub start_date_time: String,
    pub end_date_time: String,
    pub number_of_ticks: i64,
    pub what_to_show: String,
    pub use_rth: bool,
    pub ignore_size: bool,
    pub misc_options: Vec<(String, String)>,
}

/// Encode a historical-ticks request.
pub fn historical_ticks(
    server_version: i32,
    request_id: i64,
    p: &HistoricalTicksParams,
) -> Result<Vec<String>> {
    require(
        server_version,
        min_server_ver::HISTORICAL_TICKS,
        "historical ticks requests",
    )?;

    let contract = &p.contract;
    let mut b = FieldsetBuilder::new();
    b.push_i32(outgoing::REQ_HISTORICAL_TICKS).push_int(request_id);
    b.push_int(contract.con_id);
    b.push_str(&contract.symbol);
    b.push_str(&contract.sec_type);
    b.push_str(&contract.last_trade_date_or_contract_month);
    b.push_opt_float(contract.strike);
    b.push_str(&contract.right);
    b.push_str(&contract.multiplier);
    b.push_str(&contract.exchange);
    b.push_str(&contract.primary_exchange);
    b.push_str(&contract.currency);
    b.push_str(&contract.local_symbol);
    b.push_str(&contract.trading_class);
    b.push_bool(contract.include_expired);
    b.push_str(&p.start_date_time);
    b.push_str(&p.end_date_time);
    b.push_int(p.number_of_ticks);
    b.push_str(&p.what_to_show);
    b.push_bool(p.use_rth);
    b.push_bool(p.ignore_size);
    b.push_tags(&p.misc_options);
    Ok(b.into_fields())
}

/// Encode a scanner-subscription request.
pub fn scanner_subscription(
    server_version: i32,
    request_id: i64,
    subscription: &ScannerSubscription,
    filter_options: &[(String, String)],
    subscription_options: &[(String, String)],
) -> Result<Vec<String>> {
    if server_version < min_server_ver::SCANNER_GENERIC_OPTS && !filter_options.is_empty() {
        return Err(TwsError::Capability {
            feature: "scanner subscription generic filter options",
            required: min_server_ver::SCANNER_GENERIC_OPTS,
        });
    }

    const VERSION: i32 = 4;

    let mut b = FieldsetBuilder::new();
    b.push_i32(outgoing::REQ_SCANNER_SUBSCRIPTION);
    if server_version < min_server_ver::SCANNER_GENERIC_OPTS {
        b.push_i32(VERSION);
    }
    b.push_int(request_id);
    b.push_i32(subscription.number_of_rows);
    b.push_str(&subscription.instrument);
    b.push_str(&subscription.location_code);
    b.push_str(&subscription.scan_code);
    b.push_opt_float(subscription.above_price);
    b.push_opt_float(subscription.below_price);
    b.push_opt_int(subscription.above_volume);
    b.push_opt_float(subscription.market_cap_above);
    b.push_opt_float(subscription.market_cap_below);
    b.push_str(&subscription.moody_rating_above);
    b.push_str(&subscription.moody_rating_below);
    b.push_str(&subscription.sp_rating_above);
    b.push_str(&subscription.sp_rating_below);
    b.push_str(&subscription.maturity_date_above);
    b.push_str(&subscription.maturity_date_below);
    b.push_opt_float(subscription.coupon_rate_above);
    b.push_opt_float(subscription.coupon_rate_below);
    b.push_bool(subscription.exclude_convertible);
    b.push_opt_int(subscription.average_option_volume_above);
    b.push_str(&subscription.scanner_setting_pairs);
    b.push_str(&subscription.stock_type_filter);

    if server_version >= min_server_ver::SCANNER_GENERIC_OPTS {
        b.push_tags(filter_options);
    }
    if server_version >= min_server_ver::LINKING {
        b.push_tags(subscription_options);
    }

    Ok(b.into_fields())
}

/// Encode a scanner-subscription cancel.
pub fn cancel_scanner_subscription(request_id: i64) -> Vec<String> {
    let mut b = FieldsetBuilder::new();
    b.push_i32(outgoing::CANCEL_SCANNER_SUBSCRIPTION).push_i32(1).push_int(request_id);
    b.into_fields()
}

/// Encode a real-time-bars cancel.
pub fn cancel_real_time_bars(request_id: i64) -> Vec<String> {
    let mut b = FieldsetBuilder::new();
    b.push_i32(outgoing::CANCEL_REAL_TIME_BARS).push_i32(1).push_int(request_id);
    b.into_fields()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn test_market_data_request_layout() {
        let contract = Contract::stock("AAPL");
        let fields = market_data(151, 17, &contract, "", false, false).unwrap();

        assert_eq!(
            fields,
            s(&[
                "1", "11", "17", // type, message version, request id
                "0", "AAPL", "STK", "", "", "", "", "SMART", "", "USD", "", "",
                "0",  // no delta-neutral underlying
                "",   // generic tick list
                "0",  // snapshot
                "0",  // regulatory snapshot
                "",   // internal options
            ])
        );
    }

    #[test]
    fn test_market_data_snapshot_flag() {
        let contract = Contract::stock("AAPL");
        let fields = market_data(151, 17, &contract, "", true, false).unwrap();
        assert_eq!(fields[fields.len() - 3], "1");
    }

    #[test]
    fn test_market_data_combo_legs_inline() {
        let mut contract = Contract::combo("SPY");
        contract.combo_legs.push(crate::contract::ComboLeg {
            con_id: 1,
            ratio: 1,
            action: "BUY".to_string(),
            exchange: "SMART".to_string(),
            ..Default::default()
        });
        contract.combo_legs.push(crate::contract::ComboLeg {
            con_id: 2,
            ratio: 1,
            action: "SELL".to_string(),
            exchange: "SMART".to_string(),
            ..Default::default()
        });

        let fields = market_data(151, 3, &contract, "", false, false).unwrap();
        let count_pos = fields.iter().position(|f| f == "2").unwrap();
        assert_eq!(
            &fields[count_pos..count_pos + 9],
            &s(&["2", "1", "1", "BUY", "SMART", "2", "1", "SELL", "SMART"])[..]
        );
    }

    #[test]
    fn test_tick_by_tick_requires_capability() {
        let contract = Contract::stock("AAPL");
        assert!(matches!(
            tick_by_tick(136, 1, &contract, "Last", 0, false),
            Err(TwsError::Capability { .. })
        ));
        assert!(tick_by_tick(140, 1, &contract, "Last", 0, false).is_ok());
    }

    #[test]
    fn test_market_data_type_gate() {
        assert!(matches!(
            market_data_type(54, 2),
            Err(TwsError::Capability { .. })
        ));
        assert_eq!(market_data_type(55, 2).unwrap(), s(&["59", "1", "2"]));
    }

    #[test]
    fn test_historical_data_no_version_on_modern_servers() {
        let params = HistoricalDataParams {
            contract: Contract::stock("AAPL"),
            end_date_time: "20260801 00:00:00".to_string(),
            duration: "1 M".to_string(),
            bar_size_setting: "1 day".to_string(),
            what_to_show: "TRADES".to_string(),
            use_rth: true,
            format_date: 1,
            keep_up_to_date: false,
            chart_options: Vec::new(),
        };

        let modern = historical_data(151, 5, &params).unwrap();
        assert_eq!(&modern[..2], &["20", "5"]);

        let legacy = historical_data(120, 5, &params).unwrap();
        assert_eq!(&legacy[..3], &["20", "6", "5"]);
    }

    #[test]
    fn test_cancel_encoders() {
        assert_eq!(cancel_market_data(9), s(&["2", "2", "9"]));
        assert_eq!(cancel_historical_data(9), s(&["25", "1", "9"]));
        assert_eq!(cancel_scanner_subscription(9), s(&["23", "1", "9"]));
        assert_eq!(cancel_real_time_bars(9), s(&["51", "1", "9"]));
    }
}
