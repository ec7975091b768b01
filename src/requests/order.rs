//! Place-order encoder.
//!
//! The longest encode in the protocol. Field order and every guard mirror
//! the open-order decoder in `handlers::order`; the capability ladder at
//! the top rejects any order that uses a feature the negotiated server
//! version cannot carry.

use crate::contract::Contract;
use crate::error::{Result, TwsError};
use crate::messages::{min_server_ver, outgoing};
use crate::order::{Order, OrderCondition};
use crate::protocol::FieldsetBuilder;

use super::require;

fn check_capabilities(server_version: i32, contract: &Contract, order: &Order) -> Result<()> {
    if server_version < min_server_ver::DELTA_NEUTRAL && contract.delta_neutral_contract.is_some()
    {
        return Err(TwsError::Capability {
            feature: "delta-neutral orders",
            required: min_server_ver::DELTA_NEUTRAL,
        });
    }
    if server_version < min_server_ver::SCALE_ORDERS2 && order.scale_subs_level_size.is_some() {
        return Err(TwsError::Capability {
            feature: "subsequent level size for scale orders",
            required: min_server_ver::SCALE_ORDERS2,
        });
    }
    if server_version < min_server_ver::ALGO_ORDERS && !order.algo_strategy.is_empty() {
        return Err(TwsError::Capability {
            feature: "algo orders",
            required: min_server_ver::ALGO_ORDERS,
        });
    }
    if server_version < min_server_ver::NOT_HELD && order.not_held {
        return Err(TwsError::Capability {
            feature: "notHeld parameter",
            required: min_server_ver::NOT_HELD,
        });
    }
    if server_version < min_server_ver::SEC_ID_TYPE
        && (!contract.sec_id_type.is_empty() || !contract.sec_id.is_empty())
    {
        return Err(TwsError::Capability {
            feature: "secIdType and secId parameters",
            required: min_server_ver::SEC_ID_TYPE,
        });
    }
    if server_version < min_server_ver::PLACE_ORDER_CONID && contract.con_id > 0 {
        return Err(TwsError::Capability {
            feature: "conId parameter",
            required: min_server_ver::PLACE_ORDER_CONID,
        });
    }
    if server_version < min_server_ver::SSHORTX && order.exempt_code != -1 {
        return Err(TwsError::Capability {
            feature: "exemptCode parameter",
            required: min_server_ver::SSHORTX,
        });
    }
    if server_version < min_server_ver::SSHORTX
        && contract.combo_legs.iter().any(|leg| leg.exempt_code != -1)
    {
        return Err(TwsError::Capability {
            feature: "combo leg exemptCode parameter",
            required: min_server_ver::SSHORTX,
        });
    }
    if server_version < min_server_ver::HEDGE_ORDERS && !order.hedge_type.is_empty() {
        return Err(TwsError::Capability {
            feature: "hedge orders",
            required: min_server_ver::HEDGE_ORDERS,
        });
    }
    if server_version < min_server_ver::OPT_OUT_SMART_ROUTING && order.opt_out_smart_routing {
        return Err(TwsError::Capability {
            feature: "optOutSmartRouting parameter",
            required: min_server_ver::OPT_OUT_SMART_ROUTING,
        });
    }
    if server_version < min_server_ver::DELTA_NEUTRAL_CONID
        && (order.delta_neutral_con_id > 0
            || !order.delta_neutral_settling_firm.is_empty()
            || !order.delta_neutral_clearing_account.is_empty()
            || !order.delta_neutral_clearing_intent.is_empty())
    {
        return Err(TwsError::Capability {
            feature: "delta-neutral conId/settlingFirm/clearingAccount/clearingIntent",
            required: min_server_ver::DELTA_NEUTRAL_CONID,
        });
    }
    if server_version < min_server_ver::DELTA_NEUTRAL_OPEN_CLOSE
        && (!order.delta_neutral_open_close.is_empty()
            || order.delta_neutral_short_sale
            || order.delta_neutral_short_sale_slot > 0
            || !order.delta_neutral_designated_location.is_empty())
    {
        return Err(TwsError::Capability {
            feature: "delta-neutral openClose/shortSale/shortSaleSlot/designatedLocation",
            required: min_server_ver::DELTA_NEUTRAL_OPEN_CLOSE,
        });
    }
    if server_version < min_server_ver::SCALE_ORDERS3
        && order.scale_price_increment.map_or(false, |v| v > 0.0)
        && (order.scale_price_adjust_value.is_some()
            || order.scale_price_adjust_interval.is_some()
            || order.scale_profit_offset.is_some()
            || order.scale_auto_reset
            || order.scale_init_position.is_some()
            || order.scale_init_fill_qty.is_some()
            || order.scale_random_percent)
    {
        return Err(TwsError::Capability {
            feature: "extended scale order parameters",
            required: min_server_ver::SCALE_ORDERS3,
        });
    }
    if server_version < min_server_ver::ORDER_COMBO_LEGS_PRICE
        && contract.sec_type == "BAG"
        && order.order_combo_legs.iter().any(|leg| leg.price.is_some())
    {
        return Err(TwsError::Capability {
            feature: "per-leg prices for order combo legs",
            required: min_server_ver::ORDER_COMBO_LEGS_PRICE,
        });
    }
    if server_version < min_server_ver::TRAILING_PERCENT && order.trailing_percent.is_some() {
        return Err(TwsError::Capability {
            feature: "trailing percent parameter",
            required: min_server_ver::TRAILING_PERCENT,
        });
    }
    if server_version < min_server_ver::TRADING_CLASS && !contract.trading_class.is_empty() {
        return Err(TwsError::Capability {
            feature: "tradingClass parameter in placeOrder",
            required: min_server_ver::TRADING_CLASS,
        });
    }
    if server_version < min_server_ver::SCALE_TABLE
        && (!order.scale_table.is_empty()
            || !order.active_start_time.is_empty()
            || !order.active_stop_time.is_empty())
    {
        return Err(TwsError::Capability {
            feature: "scaleTable, activeStartTime and activeStopTime parameters",
            required: min_server_ver::SCALE_TABLE,
        });
    }
    if server_version < min_server_ver::ALGO_ID && !order.algo_id.is_empty() {
        return Err(TwsError::Capability {
            feature: "algoId parameter",
            required: min_server_ver::ALGO_ID,
        });
    }
    if server_version < min_server_ver::ORDER_SOLICITED && order.solicited {
        return Err(TwsError::Capability {
            feature: "order solicited parameter",
            required: min_server_ver::ORDER_SOLICITED,
        });
    }
    if server_version < min_server_ver::MODELS_SUPPORT && !order.model_code.is_empty() {
        return Err(TwsError::Capability {
            feature: "model code parameter",
            required: min_server_ver::MODELS_SUPPORT,
        });
    }
    if server_version < min_server_ver::EXT_OPERATOR && !order.ext_operator.is_empty() {
        return Err(TwsError::Capability {
            feature: "ext operator parameter",
            required: min_server_ver::EXT_OPERATOR,
        });
    }
    if server_version < min_server_ver::SOFT_DOLLAR_TIER
        && (!order.soft_dollar_tier.name.is_empty() || !order.soft_dollar_tier.value.is_empty())
    {
        return Err(TwsError::Capability {
            feature: "soft dollar tier",
            required: min_server_ver::SOFT_DOLLAR_TIER,
        });
    }
    if server_version < min_server_ver::CASH_QTY && order.cash_qty.is_some() {
        return Err(TwsError::Capability {
            feature: "cash quantity parameter",
            required: min_server_ver::CASH_QTY,
        });
    }
    if server_version < min_server_ver::DECISION_MAKER
        && (!order.mifid2_decision_maker.is_empty() || !order.mifid2_decision_algo.is_empty())
    {
        return Err(TwsError::Capability {
            feature: "MIFID II decision maker parameters",
            required: min_server_ver::DECISION_MAKER,
        });
    }
    if server_version < min_server_ver::MIFID_EXECUTION
        && (!order.mifid2_execution_trader.is_empty() || !order.mifid2_execution_algo.is_empty())
    {
        return Err(TwsError::Capability {
            feature: "MIFID II execution parameters",
            required: min_server_ver::MIFID_EXECUTION,
        });
    }
    if server_version < min_server_ver::AUTO_PRICE_FOR_HEDGE && order.dont_use_auto_price_for_hedge
    {
        return Err(TwsError::Capability {
            feature: "dontUseAutoPriceForHedge parameter",
            required: min_server_ver::AUTO_PRICE_FOR_HEDGE,
        });
    }
    if server_version < min_server_ver::ORDER_CONTAINER && order.is_oms_container {
        return Err(TwsError::Capability {
            feature: "OMS container parameter",
            required: min_server_ver::ORDER_CONTAINER,
        });
    }
    if server_version < min_server_ver::PRICE_MGMT_ALGO && order.use_price_mgmt_algo.is_some() {
        return Err(TwsError::Capability {
            feature: "price management algo parameter",
            required: min_server_ver::PRICE_MGMT_ALGO,
        });
    }
    Ok(())
}

fn encode_condition(b: &mut FieldsetBuilder, condition: &OrderCondition) {
    b.push_i32(condition.kind());
    match condition {
        OrderCondition::Price {
            conjunction_and,
            is_more,
            price,
            con_id,
            exchange,
            trigger_method,
        } => {
            b.push_str(if *conjunction_and { "a" } else { "o" });
            b.push_bool(*is_more);
            b.push_float(*price);
            b.push_int(*con_id);
            b.push_str(exchange);
            b.push_i32(*trigger_method);
        }
        OrderCondition::Time {
            conjunction_and,
            is_more,
            time,
        } => {
            b.push_str(if *conjunction_and { "a" } else { "o" });
            b.push_bool(*is_more);
            b.push_str(time);
        }
        OrderCondition::Margin {
            conjunction_and,
            is_more,
            percent,
        } => {
            b.push_str(if *conjunction_and { "a" } else { "o" });
            b.push_bool(*is_more);
            b.push_int(*percent);
        }
        OrderCondition::Execution {
            conjunction_and,
            sec_type,
            exchange,
            symbol,
        } => {
            b.push_str(if *conjunction_and { "a" } else { "o" });
            b.push_str(sec_type);
            b.push_str(exchange);
            b.push_str(symbol);
        }
        OrderCondition::Volume {
            conjunction_and,
            is_more,
            volume,
            con_id,
            exchange,
        } => {
            b.push_str(if *conjunction_and { "a" } else { "o" });
            b.push_bool(*is_more);
            b.push_int(*volume);
            b.push_int(*con_id);
            b.push_str(exchange);
        }
        OrderCondition::PercentChange {
            conjunction_and,
            is_more,
            change_percent,
            con_id,
            exchange,
        } => {
            b.push_str(if *conjunction_and { "a" } else { "o" });
            b.push_bool(*is_more);
            b.push_float(*change_percent);
            b.push_int(*con_id);
            b.push_str(exchange);
        }
    }
}

/// Encode a place-order request.
pub fn place_order(
    server_version: i32,
    order_id: i64,
    contract: &Contract,
    order: &Order,
) -> Result<Vec<String>> {
    check_capabilities(server_version, contract, order)?;

    let version = if server_version < min_server_ver::NOT_HELD {
        27
    } else {
        45
    };

    let mut b = FieldsetBuilder::new();
    b.push_i32(outgoing::PLACE_ORDER);
    if server_version < min_server_ver::ORDER_CONTAINER {
        b.push_i32(version);
    }
    b.push_int(order_id);

    // Contract fields
    if server_version >= min_server_ver::PLACE_ORDER_CONID {
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
    if server_version >= min_server_ver::SEC_ID_TYPE {
        b.push_str(&contract.sec_id_type);
        b.push_str(&contract.sec_id);
    }

    // Main order fields
    b.push_str(&order.action);
    b.push_float(order.total_quantity);
    b.push_str(&order.order_type);
    if server_version < min_server_ver::ORDER_COMBO_LEGS_PRICE {
        b.push_float(order.lmt_price.unwrap_or(0.0));
    } else {
        b.push_opt_float(order.lmt_price);
    }
    if server_version < min_server_ver::TRAILING_PERCENT {
        b.push_float(order.aux_price.unwrap_or(0.0));
    } else {
        b.push_opt_float(order.aux_price);
    }

    // Extended order fields
    b.push_str(&order.tif);
    b.push_str(&order.oca_group);
    b.push_str(&order.account);
    b.push_str(&order.open_close);
    b.push_i32(order.origin);
    b.push_str(&order.order_ref);
    b.push_bool(order.transmit);
    b.push_int(order.parent_id);
    b.push_bool(order.block_order);
    b.push_bool(order.sweep_to_fill);
    b.push_i32(order.display_size);
    b.push_i32(order.trigger_method);
    b.push_bool(order.outside_rth);
    b.push_bool(order.hidden);

    // Combo legs for BAG orders
    if contract.sec_type == "BAG" {
        b.push_int(contract.combo_legs.len() as i64);
        for leg in &contract.combo_legs {
            b.push_int(leg.con_id);
            b.push_int(leg.ratio);
            b.push_str(&leg.action);
            b.push_str(&leg.exchange);
            b.push_i32(leg.open_close);
            b.push_i32(leg.short_sale_slot);
            b.push_str(&leg.designated_location);
            if server_version >= min_server_ver::SSHORTX_OLD {
                b.push_i32(leg.exempt_code);
            }
        }
    }
    if server_version >= min_server_ver::ORDER_COMBO_LEGS_PRICE && contract.sec_type == "BAG" {
        b.push_int(order.order_combo_legs.len() as i64);
        for leg in &order.order_combo_legs {
            b.push_opt_float(leg.price);
        }
    }
    if server_version >= min_server_ver::SMART_COMBO_ROUTING_PARAMS && contract.sec_type == "BAG" {
        b.push_int(order.smart_combo_routing_params.len() as i64);
        for (tag, value) in &order.smart_combo_routing_params {
            b.push_str(tag);
            b.push_str(value);
        }
    }

    // Retired shares-allocation field
    b.push_empty();

    b.push_float(order.discretionary_amt);
    b.push_str(&order.good_after_time);
    b.push_str(&order.good_till_date);

    b.push_str(&order.fa_group);
    b.push_str(&order.fa_method);
    b.push_str(&order.fa_percentage);
    b.push_str(&order.fa_profile);

    if server_version >= min_server_ver::MODELS_SUPPORT {
        b.push_str(&order.model_code);
    }

    // Institutional short-sale slot
    b.push_i32(order.short_sale_slot);
    b.push_str(&order.designated_location);
    if server_version >= min_server_ver::SSHORTX_OLD {
        b.push_i32(order.exempt_code);
    }

    b.push_i32(order.oca_type);
    b.push_str(&order.rule_80a);
    b.push_str(&order.settling_firm);
    b.push_bool(order.all_or_none);
    b.push_opt_int(order.min_qty);
    b.push_opt_float(order.percent_offset);
    b.push_bool(order.e_trade_only);
    b.push_bool(order.firm_quote_only);
    b.push_opt_float(order.nbbo_price_cap);
    b.push_i32(order.auction_strategy);
    b.push_opt_float(order.starting_price);
    b.push_opt_float(order.stock_ref_price);
    b.push_opt_float(order.delta);
    b.push_opt_float(order.stock_range_lower);
    b.push_opt_float(order.stock_range_upper);

    b.push_bool(order.override_percentage_constraints);

    // Volatility orders
    b.push_opt_float(order.volatility);
    b.push_i32(order.volatility_type);
    b.push_str(&order.delta_neutral_order_type);
    b.push_opt_float(order.delta_neutral_aux_price);

    if server_version >= min_server_ver::DELTA_NEUTRAL_CONID
        && !order.delta_neutral_order_type.is_empty()
    {
        b.push_int(order.delta_neutral_con_id);
        b.push_str(&order.delta_neutral_settling_firm);
        b.push_str(&order.delta_neutral_clearing_account);
        b.push_str(&order.delta_neutral_clearing_intent);
    }
    if server_version >= min_server_ver::DELTA_NEUTRAL_OPEN_CLOSE
        && !order.delta_neutral_order_type.is_empty()
    {
        b.push_str(&order.delta_neutral_open_close);
        b.push_bool(order.delta_neutral_short_sale);
        b.push_i32(order.delta_neutral_short_sale_slot);
        b.push_str(&order.delta_neutral_designated_location);
    }

    b.push_bool(order.continuous_update);
    b.push_i32(order.reference_price_type);
    b.push_opt_float(order.trail_stop_price);
    if server_version >= min_server_ver::TRAILING_PERCENT {
        b.push_opt_float(order.trailing_percent);
    }

    // Scale orders
    if server_version >= min_server_ver::SCALE_ORDERS2 {
        b.push_opt_int(order.scale_init_level_size);
        b.push_opt_int(order.scale_subs_level_size);
    } else {
        b.push_empty(); // retired scaleNumComponents
        b.push_opt_int(order.scale_init_level_size);
    }
    b.push_opt_float(order.scale_price_increment);

    if server_version >= min_server_ver::SCALE_ORDERS3
        && order.scale_price_increment.map_or(false, |v| v > 0.0)
    {
        b.push_opt_float(order.scale_price_adjust_value);
        b.push_opt_int(order.scale_price_adjust_interval);
        b.push_opt_float(order.scale_profit_offset);
        b.push_bool(order.scale_auto_reset);
        b.push_opt_int(order.scale_init_position);
        b.push_opt_int(order.scale_init_fill_qty);
        b.push_bool(order.scale_random_percent);
    }

    if server_version >= min_server_ver::SCALE_TABLE {
        b.push_str(&order.scale_table);
        b.push_str(&order.active_start_time);
        b.push_str(&order.active_stop_time);
    }

    // Hedge orders
    if server_version >= min_server_ver::HEDGE_ORDERS {
        b.push_str(&order.hedge_type);
        if !order.hedge_type.is_empty() {
            b.push_str(&order.hedge_param);
        }
    }

    if server_version >= min_server_ver::OPT_OUT_SMART_ROUTING {
        b.push_bool(order.opt_out_smart_routing);
    }

    if server_version >= min_server_ver::PTA_ORDERS {
        b.push_str(&order.clearing_account);
        b.push_str(&order.clearing_intent);
    }

    if server_version >= min_server_ver::NOT_HELD {
        b.push_bool(order.not_held);
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

    if server_version >= min_server_ver::ALGO_ORDERS {
        b.push_str(&order.algo_strategy);
        if !order.algo_strategy.is_empty() {
            b.push_int(order.algo_params.len() as i64);
            for (tag, value) in &order.algo_params {
                b.push_str(tag);
                b.push_str(value);
            }
        }
    }

    if server_version >= min_server_ver::ALGO_ID {
        b.push_str(&order.algo_id);
    }

    b.push_bool(order.what_if);

    if server_version >= min_server_ver::LINKING {
        b.push_tags(&order.order_misc_options);
    }

    if server_version >= min_server_ver::ORDER_SOLICITED {
        b.push_bool(order.solicited);
    }

    if server_version >= min_server_ver::RANDOMIZE_SIZE_AND_PRICE {
        b.push_bool(order.randomize_size);
        b.push_bool(order.randomize_price);
    }

    if server_version >= min_server_ver::PEGGED_TO_BENCHMARK {
        if order.order_type == "PEG BENCH" {
            b.push_int(order.reference_contract_id);
            b.push_bool(order.is_pegged_change_amount_decrease);
            b.push_float(order.pegged_change_amount);
            b.push_float(order.reference_change_amount);
            b.push_str(&order.reference_exchange_id);
        }

        b.push_int(order.conditions.len() as i64);
        if !order.conditions.is_empty() {
            for condition in &order.conditions {
                encode_condition(&mut b, condition);
            }
            b.push_bool(order.conditions_ignore_rth);
            b.push_bool(order.conditions_cancel_order);
        }

        b.push_str(&order.adjusted_order_type);
        b.push_opt_float(order.trigger_price);
        b.push_opt_float(order.lmt_price_offset);
        b.push_opt_float(order.adjusted_stop_price);
        b.push_opt_float(order.adjusted_stop_limit_price);
        b.push_opt_float(order.adjusted_trailing_amount);
        b.push_i32(order.adjustable_trailing_unit);
    }

    if server_version >= min_server_ver::EXT_OPERATOR {
        b.push_str(&order.ext_operator);
    }

    if server_version >= min_server_ver::SOFT_DOLLAR_TIER {
        b.push_str(&order.soft_dollar_tier.name);
        b.push_str(&order.soft_dollar_tier.value);
    }

    if server_version >= min_server_ver::CASH_QTY {
        b.push_opt_float(order.cash_qty);
    }

    if server_version >= min_server_ver::DECISION_MAKER {
        b.push_str(&order.mifid2_decision_maker);
        b.push_str(&order.mifid2_decision_algo);
    }

    if server_version >= min_server_ver::MIFID_EXECUTION {
        b.push_str(&order.mifid2_execution_trader);
        b.push_str(&order.mifid2_execution_algo);
    }

    if server_version >= min_server_ver::AUTO_PRICE_FOR_HEDGE {
        b.push_bool(order.dont_use_auto_price_for_hedge);
    }

    if server_version >= min_server_ver::ORDER_CONTAINER {
        b.push_bool(order.is_oms_container);
    }

    if server_version >= min_server_ver::D_PEG_ORDERS {
        b.push_bool(order.discretionary_up_to_limit_price);
    }

    if server_version >= min_server_ver::PRICE_MGMT_ALGO {
        b.push_opt_bool(order.use_price_mgmt_algo);
    }

    Ok(b.into_fields())
}

/// Encode an order cancel.
pub fn cancel_order(order_id: i64) -> Vec<String> {
    let mut b = FieldsetBuilder::new();
    b.push_i32(outgoing::CANCEL_ORDER).push_i32(1).push_int(order_id);
    b.into_fields()
}

/// Encode a completed-orders request.
pub fn completed_orders(server_version: i32, api_only: bool) -> Result<Vec<String>> {
    require(
        server_version,
        min_server_ver::REQ_COMPLETED_ORDERS,
        "completed orders request",
    )?;
    let mut b = FieldsetBuilder::new();
    b.push_i32(outgoing::REQ_COMPLETED_ORDERS).push_bool(api_only);
    Ok(b.into_fields())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::SoftDollarTier;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn test_place_order_current_version_layout() {
        let contract = Contract::stock("MSFT");
        let order = Order::limit("BUY", 100.0, 330.25);

        let fields = place_order(151, 5, &contract, &order).unwrap();

        let expected = s(&[
            "3", "5", // no message version at this server level
            // contract
            "0", "MSFT", "STK", "", "", "", "", "SMART", "", "USD", "", "", "", "",
            // main order terms
            "BUY", "100", "LMT", "330.25", "",
            // extended order fields
            "DAY", "", "", "O", "0", "", "1", "0", "0", "0", "0", "0", "0", "0",
            // retired shares allocation
            "",
            "0", "", "", "", "", "", "", "",
            // short sale
            "0", "", "-1",
            "0", "", "", "0", "", "", "1", "1", "", "0", "", "", "", "", "",
            // override percentage constraints
            "0",
            // volatility block
            "", "0", "", "",
            "0", "0", "", "",
            // scale
            "", "", "",
            "", "", "",
            // hedge (empty type, no param)
            "",
            // opt-out smart routing
            "0",
            // clearing
            "", "",
            // not held
            "0",
            // delta-neutral marker
            "0",
            // algo
            "", "",
            // what-if
            "0",
            // misc options
            "",
            // solicited
            "0",
            // randomize flags
            "0", "0",
            // conditions count + adjusted block
            "0", "", "", "", "", "", "", "0",
            // ext operator + soft dollar tier
            "", "", "",
            // cash qty
            "",
            // mifid2
            "", "", "", "",
            // auto price for hedge, oms container, d-peg
            "0", "0", "0",
            // price management algo (tri-state absent)
            "",
        ]);
        assert_eq!(fields, expected);
    }

    #[test]
    fn test_place_order_legacy_version_layout() {
        let contract = Contract::stock("MSFT");
        let order = Order::limit("BUY", 100.0, 330.25);

        let legacy = place_order(100, 5, &contract, &order).unwrap();
        let current = place_order(151, 5, &contract, &order).unwrap();

        // Legacy servers get an explicit message version...
        assert_eq!(&legacy[..3], &["3", "45", "5"]);
        // ...and none of the capability-gated tail fields. Relative to the
        // current layout that drops 20 fields and adds the version field.
        assert_eq!(legacy.len() + 19, current.len());
        // Randomize flags close the legacy frame.
        assert_eq!(&legacy[legacy.len() - 2..], &["0", "0"]);
    }

    #[test]
    fn test_place_order_capability_error_before_send() {
        let contract = Contract::stock("MSFT");
        let order = Order {
            cash_qty: Some(10_000.0),
            ..Order::limit("BUY", 10.0, 100.0)
        };

        match place_order(100, 5, &contract, &order) {
            Err(TwsError::Capability { required, .. }) => {
                assert_eq!(required, min_server_ver::CASH_QTY);
            }
            other => panic!("expected capability error, got {:?}", other),
        }
    }

    #[test]
    fn test_place_order_legacy_rejects_trailing_percent() {
        let contract = Contract::stock("IBM");
        let order = Order {
            trailing_percent: Some(2.0),
            ..Order::market("SELL", 5.0)
        };

        assert!(matches!(
            place_order(61, 1, &contract, &order),
            Err(TwsError::Capability { .. })
        ));
        assert!(place_order(62, 1, &contract, &order).is_ok());
    }

    #[test]
    fn test_soft_dollar_tier_encoded_when_supported() {
        let contract = Contract::stock("MSFT");
        let order = Order {
            soft_dollar_tier: SoftDollarTier {
                name: "T1".to_string(),
                value: "V1".to_string(),
                display_name: "Tier One".to_string(),
            },
            ..Order::limit("BUY", 1.0, 10.0)
        };

        let fields = place_order(151, 9, &contract, &order).unwrap();
        let pos = fields.iter().position(|f| f == "T1").unwrap();
        // Name then value; the display name never goes on the wire.
        assert_eq!(fields[pos + 1], "V1");
        assert!(!fields.contains(&"Tier One".to_string()));
    }

    #[test]
    fn test_condition_encoding_matches_decoder_layout() {
        let mut b = FieldsetBuilder::new();
        encode_condition(
            &mut b,
            &OrderCondition::Price {
                conjunction_and: true,
                is_more: true,
                price: 250.5,
                con_id: 8314,
                exchange: "SMART".to_string(),
                trigger_method: 0,
            },
        );
        encode_condition(
            &mut b,
            &OrderCondition::Time {
                conjunction_and: false,
                is_more: false,
                time: "20260901 10:00:00".to_string(),
            },
        );

        assert_eq!(
            b.into_fields(),
            s(&[
                "1", "a", "1", "250.5", "8314", "SMART", "0", //
                "3", "o", "0", "20260901 10:00:00",
            ])
        );
    }

    #[test]
    fn test_cancel_order_layout() {
        assert_eq!(cancel_order(42), s(&["4", "1", "42"]));
    }
}
