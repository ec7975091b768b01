//! Contract descriptions and the convenience constructors for the common
//! security types.

/// One leg of a combo (BAG) contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ComboLeg {
    pub con_id: i64,
    pub ratio: i64,
    pub action: String,
    pub exchange: String,
    pub open_close: i32,
    pub short_sale_slot: i32,
    pub designated_location: String,
    pub exempt_code: i32,
}

impl Default for ComboLeg {
    fn default() -> Self {
        Self {
            con_id: 0,
            ratio: 0,
            action: String::new(),
            exchange: String::new(),
            open_close: 0,
            short_sale_slot: 0,
            designated_location: String::new(),
            exempt_code: -1,
        }
    }
}

/// Delta-neutral underlying attached to a combo order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeltaNeutralContract {
    pub con_id: i64,
    pub delta: f64,
    pub price: f64,
}

/// Description of a tradable instrument.
///
/// Only `symbol` and `sec_type` are required for most requests; everything
/// else narrows the match or is filled in by the broker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contract {
    pub con_id: i64,
    pub symbol: String,
    pub sec_type: String,
    pub last_trade_date_or_contract_month: String,
    pub strike: Option<f64>,
    pub right: String,
    pub multiplier: String,
    pub exchange: String,
    pub primary_exchange: String,
    pub currency: String,
    pub local_symbol: String,
    pub trading_class: String,
    pub include_expired: bool,
    pub sec_id_type: String,
    pub sec_id: String,
    pub combo_legs_descrip: String,
    pub combo_legs: Vec<ComboLeg>,
    pub delta_neutral_contract: Option<DeltaNeutralContract>,
}

impl Contract {
    /// Stock on SMART routing, USD.
    pub fn stock(symbol: &str) -> Contract {
        Contract {
            symbol: symbol.to_string(),
            sec_type: "STK".to_string(),
            currency: "USD".to_string(),
            exchange: "SMART".to_string(),
            ..Default::default()
        }
    }

    /// Contract-for-difference on SMART routing, USD.
    pub fn cfd(symbol: &str) -> Contract {
        Contract {
            symbol: symbol.to_string(),
            sec_type: "CFD".to_string(),
            currency: "USD".to_string(),
            exchange: "SMART".to_string(),
            ..Default::default()
        }
    }

    /// Currency pair on IDEALPRO, e.g. `forex("EURUSD")`.
    pub fn forex(pair: &str) -> Contract {
        assert_eq!(pair.len(), 6, "forex pair must be six characters");
        Contract {
            symbol: pair[..3].to_string(),
            currency: pair[3..].to_string(),
            sec_type: "CASH".to_string(),
            exchange: "IDEALPRO".to_string(),
            ..Default::default()
        }
    }

    /// Index, defaulting to CBOE/USD.
    pub fn index(symbol: &str) -> Contract {
        Contract {
            symbol: symbol.to_string(),
            sec_type: "IND".to_string(),
            currency: "USD".to_string(),
            exchange: "CBOE".to_string(),
            ..Default::default()
        }
    }

    /// Future; `last_trade` is the last trading day (YYYYMMDD) or the
    /// contract month (YYYYMM).
    pub fn future(symbol: &str, last_trade: &str) -> Contract {
        Contract {
            symbol: symbol.to_string(),
            last_trade_date_or_contract_month: last_trade.to_string(),
            sec_type: "FUT".to_string(),
            currency: "USD".to_string(),
            exchange: "ONE".to_string(),
            ..Default::default()
        }
    }

    /// Equity option, SMART/USD, multiplier 100.
    ///
    /// `right` is `"C"`/`"CALL"` or `"P"`/`"PUT"`.
    pub fn option(symbol: &str, last_trade: &str, strike: f64, right: &str) -> Contract {
        Contract {
            symbol: symbol.to_string(),
            last_trade_date_or_contract_month: last_trade.to_string(),
            strike: Some(strike),
            right: right.to_string(),
            sec_type: "OPT".to_string(),
            currency: "USD".to_string(),
            exchange: "SMART".to_string(),
            multiplier: "100".to_string(),
            ..Default::default()
        }
    }

    /// Futures option, GLOBEX/USD, multiplier 50.
    pub fn futures_option(symbol: &str, last_trade: &str, strike: f64, right: &str) -> Contract {
        Contract {
            symbol: symbol.to_string(),
            last_trade_date_or_contract_month: last_trade.to_string(),
            strike: Some(strike),
            right: right.to_string(),
            sec_type: "FOP".to_string(),
            currency: "USD".to_string(),
            exchange: "GLOBEX".to_string(),
            multiplier: "50".to_string(),
            ..Default::default()
        }
    }

    /// Combo (BAG) contract; legs are added by the caller.
    pub fn combo(symbol: &str) -> Contract {
        Contract {
            symbol: symbol.to_string(),
            sec_type: "BAG".to_string(),
            currency: "USD".to_string(),
            exchange: "SMART".to_string(),
            ..Default::default()
        }
    }
}

/// Full contract description returned by a contract-details request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractDetails {
    pub contract: Contract,
    pub market_name: String,
    pub min_tick: f64,
    pub md_size_multiplier: Option<i64>,
    pub order_types: String,
    pub valid_exchanges: String,
    pub price_magnifier: i64,
    pub under_con_id: i64,
    pub long_name: String,
    pub contract_month: String,
    pub industry: String,
    pub category: String,
    pub subcategory: String,
    pub time_zone_id: String,
    pub trading_hours: String,
    pub liquid_hours: String,
    pub ev_rule: String,
    pub ev_multiplier: i64,
    pub sec_id_list: Vec<(String, String)>,
    pub agg_group: Option<i64>,
    pub under_symbol: String,
    pub under_sec_type: String,
    pub market_rule_ids: String,
    pub real_expiration_date: String,
    /// Time-of-day part of the last trade date, when the broker sends one.
    pub last_trade_time: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_preset() {
        let c = Contract::stock("AAPL");
        assert_eq!(c.symbol, "AAPL");
        assert_eq!(c.sec_type, "STK");
        assert_eq!(c.exchange, "SMART");
        assert_eq!(c.currency, "USD");
        assert_eq!(c.strike, None);
    }

    #[test]
    fn test_forex_pair_split() {
        let c = Contract::forex("EURUSD");
        assert_eq!(c.symbol, "EUR");
        assert_eq!(c.currency, "USD");
        assert_eq!(c.sec_type, "CASH");
        assert_eq!(c.exchange, "IDEALPRO");
    }

    #[test]
    fn test_option_preset() {
        let c = Contract::option("SPY", "20260918", 500.0, "C");
        assert_eq!(c.sec_type, "OPT");
        assert_eq!(c.strike, Some(500.0));
        assert_eq!(c.multiplier, "100");
        assert_eq!(c.right, "C");
    }

    #[test]
    fn test_combo_leg_default_exempt_code() {
        assert_eq!(ComboLeg::default().exempt_code, -1);
    }
}
