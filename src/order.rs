//! Order terms, order state and the convenience constructors for the common
//! order types.

use crate::contract::Contract;

/// Per-leg price for combo orders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderComboLeg {
    pub price: Option<f64>,
}

/// Soft-dollar tier designation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoftDollarTier {
    pub name: String,
    pub value: String,
    pub display_name: String,
}

/// Activation condition attached to an order.
///
/// Every condition starts with its conjunction flag (`and` with the previous
/// condition, or `or`); the remaining fields depend on the kind.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderCondition {
    /// Triggers on the price of a contract (kind 1).
    Price {
        conjunction_and: bool,
        is_more: bool,
        price: f64,
        con_id: i64,
        exchange: String,
        trigger_method: i32,
    },
    /// Triggers at a point in time (kind 3).
    Time {
        conjunction_and: bool,
        is_more: bool,
        time: String,
    },
    /// Triggers on the account margin cushion percentage (kind 4).
    Margin {
        conjunction_and: bool,
        is_more: bool,
        percent: i64,
    },
    /// Triggers when an execution for the matching instrument occurs (kind 5).
    Execution {
        conjunction_and: bool,
        sec_type: String,
        exchange: String,
        symbol: String,
    },
    /// Triggers on the traded volume of a contract (kind 6).
    Volume {
        conjunction_and: bool,
        is_more: bool,
        volume: i64,
        con_id: i64,
        exchange: String,
    },
    /// Triggers on the percent change of a contract (kind 7).
    PercentChange {
        conjunction_and: bool,
        is_more: bool,
        change_percent: f64,
        con_id: i64,
        exchange: String,
    },
}

impl OrderCondition {
    /// Wire id of the condition kind.
    pub fn kind(&self) -> i32 {
        match self {
            OrderCondition::Price { .. } => 1,
            OrderCondition::Time { .. } => 3,
            OrderCondition::Margin { .. } => 4,
            OrderCondition::Execution { .. } => 5,
            OrderCondition::Volume { .. } => 6,
            OrderCondition::PercentChange { .. } => 7,
        }
    }
}

/// Order terms.
///
/// Defaults mirror the broker's: `transmit` on, `exempt_code` -1 and
/// everything optional absent. Most fields only matter for specific order
/// types and are ignored otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub order_id: i64,
    pub client_id: i64,
    pub perm_id: i64,
    pub parent_perm_id: i64,
    pub action: String,
    pub total_quantity: f64,
    pub order_type: String,
    pub lmt_price: Option<f64>,
    pub aux_price: Option<f64>,
    pub tif: String,
    pub oca_group: String,
    pub oca_type: i32,
    pub account: String,
    pub open_close: String,
    pub origin: i32,
    pub order_ref: String,
    pub transmit: bool,
    pub parent_id: i64,
    pub block_order: bool,
    pub sweep_to_fill: bool,
    pub display_size: i32,
    pub trigger_method: i32,
    pub outside_rth: bool,
    pub hidden: bool,
    pub good_after_time: String,
    pub good_till_date: String,
    pub override_percentage_constraints: bool,
    pub rule_80a: String,
    pub all_or_none: bool,
    pub min_qty: Option<i64>,
    pub percent_offset: Option<f64>,
    pub discretionary_amt: f64,
    pub e_trade_only: bool,
    pub firm_quote_only: bool,
    pub nbbo_price_cap: Option<f64>,

    // Financial-advisor allocation
    pub fa_group: String,
    pub fa_method: String,
    pub fa_percentage: String,
    pub fa_profile: String,
    pub model_code: String,

    // Institutional short sale
    pub short_sale_slot: i32,
    pub designated_location: String,
    pub exempt_code: i32,

    pub settling_firm: String,
    pub clearing_account: String,
    pub clearing_intent: String,

    pub auction_strategy: i32,
    pub starting_price: Option<f64>,
    pub stock_ref_price: Option<f64>,
    pub delta: Option<f64>,
    pub stock_range_lower: Option<f64>,
    pub stock_range_upper: Option<f64>,

    // Volatility orders
    pub volatility: Option<f64>,
    pub volatility_type: i32,
    pub delta_neutral_order_type: String,
    pub delta_neutral_aux_price: Option<f64>,
    pub delta_neutral_con_id: i64,
    pub delta_neutral_settling_firm: String,
    pub delta_neutral_clearing_account: String,
    pub delta_neutral_clearing_intent: String,
    pub delta_neutral_open_close: String,
    pub delta_neutral_short_sale: bool,
    pub delta_neutral_short_sale_slot: i32,
    pub delta_neutral_designated_location: String,
    pub continuous_update: bool,
    pub reference_price_type: i32,

    pub trail_stop_price: Option<f64>,
    pub trailing_percent: Option<f64>,
    pub lmt_price_offset: Option<f64>,

    pub basis_points: Option<f64>,
    pub basis_points_type: Option<i32>,

    // Combo orders
    pub order_combo_legs: Vec<OrderComboLeg>,
    pub smart_combo_routing_params: Vec<(String, String)>,

    // Scale orders
    pub scale_init_level_size: Option<i64>,
    pub scale_subs_level_size: Option<i64>,
    pub scale_price_increment: Option<f64>,
    pub scale_price_adjust_value: Option<f64>,
    pub scale_price_adjust_interval: Option<i64>,
    pub scale_profit_offset: Option<f64>,
    pub scale_auto_reset: bool,
    pub scale_init_position: Option<i64>,
    pub scale_init_fill_qty: Option<i64>,
    pub scale_random_percent: bool,
    pub scale_table: String,
    pub active_start_time: String,
    pub active_stop_time: String,

    pub hedge_type: String,
    pub hedge_param: String,
    pub opt_out_smart_routing: bool,
    pub not_held: bool,

    // Algo orders
    pub algo_strategy: String,
    pub algo_params: Vec<(String, String)>,
    pub algo_id: String,

    pub what_if: bool,
    pub order_misc_options: Vec<(String, String)>,
    pub solicited: bool,
    pub randomize_size: bool,
    pub randomize_price: bool,

    // Pegged-to-benchmark
    pub reference_contract_id: i64,
    pub is_pegged_change_amount_decrease: bool,
    pub pegged_change_amount: f64,
    pub reference_change_amount: f64,
    pub reference_exchange_id: String,

    pub conditions: Vec<OrderCondition>,
    pub conditions_ignore_rth: bool,
    pub conditions_cancel_order: bool,

    pub adjusted_order_type: String,
    pub trigger_price: Option<f64>,
    pub adjusted_stop_price: Option<f64>,
    pub adjusted_stop_limit_price: Option<f64>,
    pub adjusted_trailing_amount: Option<f64>,
    pub adjustable_trailing_unit: i32,

    pub ext_operator: String,
    pub soft_dollar_tier: SoftDollarTier,
    pub cash_qty: Option<f64>,
    pub mifid2_decision_maker: String,
    pub mifid2_decision_algo: String,
    pub mifid2_execution_trader: String,
    pub mifid2_execution_algo: String,
    pub dont_use_auto_price_for_hedge: bool,
    pub is_oms_container: bool,
    pub discretionary_up_to_limit_price: bool,
    pub use_price_mgmt_algo: Option<bool>,

    // Completed-order report fields
    pub auto_cancel_date: String,
    pub filled_quantity: Option<f64>,
    pub ref_futures_con_id: i64,
    pub auto_cancel_parent: bool,
    pub shareholder: String,
    pub imbalance_only: bool,
    pub route_marketable_to_bbo: bool,
}

impl Default for Order {
    fn default() -> Self {
        Self {
            order_id: 0,
            client_id: 0,
            perm_id: 0,
            parent_perm_id: 0,
            action: String::new(),
            total_quantity: 0.0,
            order_type: String::new(),
            lmt_price: None,
            aux_price: None,
            tif: String::new(),
            oca_group: String::new(),
            oca_type: 0,
            account: String::new(),
            open_close: String::new(),
            origin: 0,
            order_ref: String::new(),
            transmit: true,
            parent_id: 0,
            block_order: false,
            sweep_to_fill: false,
            display_size: 0,
            trigger_method: 0,
            outside_rth: false,
            hidden: false,
            good_after_time: String::new(),
            good_till_date: String::new(),
            override_percentage_constraints: false,
            rule_80a: String::new(),
            all_or_none: false,
            min_qty: None,
            percent_offset: None,
            discretionary_amt: 0.0,
            e_trade_only: true,
            firm_quote_only: true,
            nbbo_price_cap: None,
            fa_group: String::new(),
            fa_method: String::new(),
            fa_percentage: String::new(),
            fa_profile: String::new(),
            model_code: String::new(),
            short_sale_slot: 0,
            designated_location: String::new(),
            exempt_code: -1,
            settling_firm: String::new(),
            clearing_account: String::new(),
            clearing_intent: String::new(),
            auction_strategy: 0,
            starting_price: None,
            stock_ref_price: None,
            delta: None,
            stock_range_lower: None,
            stock_range_upper: None,
            volatility: None,
            volatility_type: 0,
            delta_neutral_order_type: String::new(),
            delta_neutral_aux_price: None,
            delta_neutral_con_id: 0,
            delta_neutral_settling_firm: String::new(),
            delta_neutral_clearing_account: String::new(),
            delta_neutral_clearing_intent: String::new(),
            delta_neutral_open_close: String::new(),
            delta_neutral_short_sale: false,
            delta_neutral_short_sale_slot: 0,
            delta_neutral_designated_location: String::new(),
            continuous_update: false,
            reference_price_type: 0,
            trail_stop_price: None,
            trailing_percent: None,
            lmt_price_offset: None,
            basis_points: None,
            basis_points_type: None,
            order_combo_legs: Vec::new(),
            smart_combo_routing_params: Vec::new(),
            scale_init_level_size: None,
            scale_subs_level_size: None,
            scale_price_increment: None,
            scale_price_adjust_value: None,
            scale_price_adjust_interval: None,
            scale_profit_offset: None,
            scale_auto_reset: false,
            scale_init_position: None,
            scale_init_fill_qty: None,
            scale_random_percent: false,
            scale_table: String::new(),
            active_start_time: String::new(),
            active_stop_time: String::new(),
            hedge_type: String::new(),
            hedge_param: String::new(),
            opt_out_smart_routing: false,
            not_held: false,
            algo_strategy: String::new(),
            algo_params: Vec::new(),
            algo_id: String::new(),
            what_if: false,
            order_misc_options: Vec::new(),
            solicited: false,
            randomize_size: false,
            randomize_price: false,
            reference_contract_id: 0,
            is_pegged_change_amount_decrease: false,
            pegged_change_amount: 0.0,
            reference_change_amount: 0.0,
            reference_exchange_id: String::new(),
            conditions: Vec::new(),
            conditions_ignore_rth: false,
            conditions_cancel_order: false,
            adjusted_order_type: String::new(),
            trigger_price: None,
            adjusted_stop_price: None,
            adjusted_stop_limit_price: None,
            adjusted_trailing_amount: None,
            adjustable_trailing_unit: 0,
            ext_operator: String::new(),
            soft_dollar_tier: SoftDollarTier::default(),
            cash_qty: None,
            mifid2_decision_maker: String::new(),
            mifid2_decision_algo: String::new(),
            mifid2_execution_trader: String::new(),
            mifid2_execution_algo: String::new(),
            dont_use_auto_price_for_hedge: false,
            is_oms_container: false,
            discretionary_up_to_limit_price: false,
            use_price_mgmt_algo: None,
            auto_cancel_date: String::new(),
            filled_quantity: None,
            ref_futures_con_id: 0,
            auto_cancel_parent: false,
            shareholder: String::new(),
            imbalance_only: false,
            route_marketable_to_bbo: false,
        }
    }
}

impl Order {
    /// Day limit order.
    pub fn limit(action: &str, quantity: f64, lmt_price: f64) -> Order {
        assert!(quantity > 0.0);
        assert!(lmt_price > 0.0);
        Order {
            action: action.to_string(),
            total_quantity: quantity,
            order_type: "LMT".to_string(),
            lmt_price: Some(lmt_price),
            tif: "DAY".to_string(),
            open_close: "O".to_string(),
            ..Default::default()
        }
    }

    /// Market order.
    pub fn market(action: &str, quantity: f64) -> Order {
        assert!(quantity > 0.0);
        Order {
            action: action.to_string(),
            total_quantity: quantity,
            order_type: "MKT".to_string(),
            ..Default::default()
        }
    }

    /// Day stop order triggered at `stop_price`.
    pub fn stop(action: &str, quantity: f64, stop_price: f64) -> Order {
        assert!(quantity > 0.0);
        assert!(stop_price > 0.0);
        Order {
            action: action.to_string(),
            total_quantity: quantity,
            order_type: "STP".to_string(),
            aux_price: Some(stop_price),
            tif: "DAY".to_string(),
            ..Default::default()
        }
    }
}

/// Broker-side state attached to an order report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderState {
    pub status: String,
    pub init_margin_before: String,
    pub maint_margin_before: String,
    pub equity_with_loan_before: String,
    pub init_margin_change: String,
    pub maint_margin_change: String,
    pub equity_with_loan_change: String,
    pub init_margin_after: String,
    pub maint_margin_after: String,
    pub equity_with_loan_after: String,
    pub commission: Option<f64>,
    pub min_commission: Option<f64>,
    pub max_commission: Option<f64>,
    pub commission_currency: String,
    pub warning_text: String,
    pub completed_time: String,
    pub completed_status: String,
}

/// One open-order or completed-order record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderReport {
    pub contract: Contract,
    pub order: Order,
    pub order_state: OrderState,
}

/// Order status change, emitted on the connection-wide channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderStatus {
    pub order_id: i64,
    pub status: String,
    pub filled: f64,
    pub remaining: f64,
    pub avg_fill_price: f64,
    pub perm_id: i64,
    pub parent_id: i64,
    pub last_fill_price: f64,
    pub client_id: i64,
    pub why_held: String,
    pub market_cap_price: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_preset() {
        let o = Order::limit("BUY", 100.0, 55.5);
        assert_eq!(o.order_type, "LMT");
        assert_eq!(o.lmt_price, Some(55.5));
        assert_eq!(o.tif, "DAY");
        assert_eq!(o.open_close, "O");
        assert!(o.transmit);
    }

    #[test]
    fn test_market_preset() {
        let o = Order::market("SELL", 10.0);
        assert_eq!(o.order_type, "MKT");
        assert_eq!(o.lmt_price, None);
        assert_eq!(o.aux_price, None);
    }

    #[test]
    fn test_stop_preset() {
        let o = Order::stop("SELL", 10.0, 48.0);
        assert_eq!(o.order_type, "STP");
        assert_eq!(o.aux_price, Some(48.0));
    }

    #[test]
    fn test_default_exempt_code() {
        assert_eq!(Order::default().exempt_code, -1);
    }

    #[test]
    fn test_condition_kinds() {
        let c = OrderCondition::Time {
            conjunction_and: true,
            is_more: true,
            time: "20260806 15:59:00".to_string(),
        };
        assert_eq!(c.kind(), 3);

        let c = OrderCondition::Price {
            conjunction_and: false,
            is_more: false,
            price: 100.0,
            con_id: 1,
            exchange: "SMART".to_string(),
            trigger_method: 0,
        };
        assert_eq!(c.kind(), 1);
    }
}
