//! Decoders for the order message family.
//!
//! The open-order and completed-order reports are the longest sequential
//! decodes in the protocol, under both version gates at once: the
//! connection's server version and, on older servers, a per-message version
//! carried as the first payload field. Field order and every guard here
//! mirror the place-order encoder in `requests::order`; changing one side
//! without the other desynchronizes every later field in the frame.

use crate::bus::{BusInner, BusKey, ClientEvent, Record, Response};
use crate::error::Result;
use crate::messages::{min_server_ver, IncomingKind};
use crate::order::{
    OrderCondition, OrderComboLeg, OrderReport, OrderStatus, SoftDollarTier,
};
use crate::contract::{ComboLeg, DeltaNeutralContract};
use crate::protocol::FieldCursor;

/// Message version used for report shapes that no longer carry one on the
/// wire: high enough to pass every per-message gate.
const LATEST_MESSAGE_VERSION: i32 = 10_000;

pub(super) fn order_status(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    if inner.server_version < min_server_ver::MARKET_CAP_PRICE {
        cur.skip()?; // message version
    }
    let status = OrderStatus {
        order_id: cur.next_int()?,
        status: cur.next_string()?,
        filled: cur.next_float()?,
        remaining: cur.next_float()?,
        avg_fill_price: cur.next_float()?,
        perm_id: cur.next_int()?,
        parent_id: cur.next_int()?,
        last_fill_price: cur.next_float()?,
        client_id: cur.next_int()?,
        why_held: cur.next_string()?,
        market_cap_price: if inner.server_version >= min_server_ver::MARKET_CAP_PRICE {
            cur.next_opt_float()?
        } else {
            None
        },
    };
    inner.emit_connection(ClientEvent::OrderStatus(status));
    Ok(())
}

pub(super) fn open_order(inner: &mut BusInner, mut cur: FieldCursor) -> Result<()> {
    let server_version = inner.server_version;
    let version = if server_version < min_server_ver::ORDER_CONTAINER {
        cur.next_i32()?
    } else {
        server_version
    };

    let mut d = OrderDecoder::new(version, server_version, cur);
    d.decode_order_id()?;
    d.decode_contract_fields()?;

    d.decode_action()?;
    d.decode_total_quantity()?;
    d.decode_order_type()?;
    d.decode_lmt_price()?;
    d.decode_aux_price()?;
    d.decode_tif()?;
    d.decode_oca_group()?;
    d.decode_account()?;
    d.decode_open_close()?;
    d.decode_origin()?;
    d.decode_order_ref()?;
    d.decode_client_id()?;
    d.decode_perm_id()?;
    d.decode_outside_rth()?;
    d.decode_hidden()?;
    d.decode_discretionary_amt()?;
    d.decode_good_after_time()?;
    d.skip_shares_allocation()?;
    d.decode_fa_params()?;
    d.decode_model_code()?;
    d.decode_good_till_date()?;
    d.decode_rule_80a()?;
    d.decode_percent_offset()?;
    d.decode_settling_firm()?;
    d.decode_short_sale_params()?;
    d.decode_auction_strategy()?;
    d.decode_box_order_params()?;
    d.decode_peg_to_stk_or_vol_order_params()?;
    d.decode_display_size()?;
    d.decode_block_order()?;
    d.decode_sweep_to_fill()?;
    d.decode_all_or_none()?;
    d.decode_min_qty()?;
    d.decode_oca_type()?;
    d.decode_e_trade_only()?;
    d.decode_firm_quote_only()?;
    d.decode_nbbo_price_cap()?;
    d.decode_parent_id()?;
    d.decode_trigger_method()?;
    d.decode_vol_order_params(true)?;
    d.decode_trail_params()?;
    d.decode_basis_points()?;
    d.decode_combo_legs()?;
    d.decode_smart_combo_routing_params()?;
    d.decode_scale_order_params()?;
    d.decode_hedge_params()?;
    d.decode_opt_out_smart_routing()?;
    d.decode_clearing_params()?;
    d.decode_not_held()?;
    d.decode_delta_neutral()?;
    d.decode_algo_params()?;
    d.decode_solicited()?;
    d.decode_what_if_info_and_commission()?;
    d.decode_vol_randomize_flags()?;
    d.decode_peg_to_bench_params()?;
    d.decode_conditions()?;
    d.decode_adjusted_order_params()?;
    d.decode_soft_dollar_tier()?;
    d.decode_cash_qty()?;
    d.decode_dont_use_auto_price_for_hedge()?;
    d.decode_is_oms_container()?;
    d.decode_discretionary_up_to_limit_price()?;
    d.decode_use_price_mgmt_algo()?;

    inner
        .records_mut(BusKey::Kind(IncomingKind::OpenOrderEnd))
        .push(Record::Order(d.into_report()));
    Ok(())
}

pub(super) fn open_order_end(inner: &mut BusInner) -> Result<()> {
    let key = BusKey::Kind(IncomingKind::OpenOrderEnd);
    let orders = take_order_records(inner, key);
    inner.resolve(key, Response::Orders(orders));
    Ok(())
}

pub(super) fn completed_order(inner: &mut BusInner, cur: FieldCursor) -> Result<()> {
    let server_version = inner.server_version;
    let mut d = OrderDecoder::new(LATEST_MESSAGE_VERSION, server_version, cur);

    d.decode_contract_fields()?;

    d.decode_action()?;
    d.decode_total_quantity()?;
    d.decode_order_type()?;
    d.decode_lmt_price()?;
    d.decode_aux_price()?;
    d.decode_tif()?;
    d.decode_oca_group()?;
    d.decode_account()?;
    d.decode_open_close()?;
    d.decode_origin()?;
    d.decode_order_ref()?;
    d.decode_perm_id()?;
    d.decode_outside_rth()?;
    d.decode_hidden()?;
    d.decode_discretionary_amt()?;
    d.decode_good_after_time()?;
    d.decode_fa_params()?;
    d.decode_model_code()?;
    d.decode_good_till_date()?;
    d.decode_rule_80a()?;
    d.decode_percent_offset()?;
    d.decode_settling_firm()?;
    d.decode_short_sale_params()?;
    d.decode_box_order_params()?;
    d.decode_peg_to_stk_or_vol_order_params()?;
    d.decode_display_size()?;
    d.decode_sweep_to_fill()?;
    d.decode_all_or_none()?;
    d.decode_min_qty()?;
    d.decode_oca_type()?;
    d.decode_trigger_method()?;
    d.decode_vol_order_params(false)?;
    d.decode_trail_params()?;
    d.decode_combo_legs()?;
    d.decode_smart_combo_routing_params()?;
    d.decode_scale_order_params()?;
    d.decode_hedge_params()?;
    d.decode_clearing_params()?;
    d.decode_not_held()?;
    d.decode_delta_neutral()?;
    d.decode_algo_params()?;
    d.decode_solicited()?;
    d.decode_order_status()?;
    d.decode_vol_randomize_flags()?;
    d.decode_peg_to_bench_params()?;
    d.decode_conditions()?;
    d.decode_stop_price_and_lmt_price_offset()?;
    d.decode_cash_qty()?;
    d.decode_dont_use_auto_price_for_hedge()?;
    d.decode_is_oms_container()?;
    d.decode_auto_cancel_date()?;
    d.decode_filled_quantity()?;
    d.decode_ref_futures_con_id()?;
    d.decode_auto_cancel_parent()?;
    d.decode_shareholder()?;
    d.decode_imbalance_only()?;
    d.decode_route_marketable_to_bbo()?;
    d.decode_parent_perm_id()?;
    d.decode_completed_time()?;
    d.decode_completed_status()?;

    inner
        .records_mut(BusKey::Kind(IncomingKind::CompletedOrdersEnd))
        .push(Record::Order(d.into_report()));
    Ok(())
}

pub(super) fn completed_orders_end(inner: &mut BusInner) -> Result<()> {
    let key = BusKey::Kind(IncomingKind::CompletedOrdersEnd);
    let orders = take_order_records(inner, key);
    inner.resolve(key, Response::Orders(orders));
    Ok(())
}

fn take_order_records(inner: &mut BusInner, key: BusKey) -> Vec<OrderReport> {
    inner
        .take_records(key)
        .into_iter()
        .filter_map(|r| match r {
            Record::Order(o) => Some(o),
            _ => None,
        })
        .collect()
}

/// Cursor-driven decoder for the order report shapes.
///
/// Each method consumes exactly the fields of one group; the handler
/// functions above fix the group order per message type.
pub(crate) struct OrderDecoder<'a> {
    version: i32,
    server_version: i32,
    cur: FieldCursor<'a>,
    report: OrderReport,
}

impl<'a> OrderDecoder<'a> {
    pub(crate) fn new(version: i32, server_version: i32, cur: FieldCursor<'a>) -> Self {
        Self {
            version,
            server_version,
            cur,
            report: OrderReport::default(),
        }
    }

    pub(crate) fn into_report(self) -> OrderReport {
        self.report
    }

    fn decode_order_id(&mut self) -> Result<()> {
        self.report.order.order_id = self.cur.next_int()?;
        Ok(())
    }

    fn decode_contract_fields(&mut self) -> Result<()> {
        let c = &mut self.report.contract;
        c.con_id = self.cur.next_int()?;
        c.symbol = self.cur.next_string()?;
        c.sec_type = self.cur.next_string()?;
        c.last_trade_date_or_contract_month = self.cur.next_string()?;
        c.strike = self.cur.next_opt_float()?;
        c.right = self.cur.next_string()?;
        if self.version >= 32 {
            c.multiplier = self.cur.next_string()?;
        }
        c.exchange = self.cur.next_string()?;
        c.currency = self.cur.next_string()?;
        c.local_symbol = self.cur.next_string()?;
        if self.version >= 32 {
            c.trading_class = self.cur.next_string()?;
        }
        Ok(())
    }

    fn decode_action(&mut self) -> Result<()> {
        self.report.order.action = self.cur.next_string()?;
        Ok(())
    }

    fn decode_total_quantity(&mut self) -> Result<()> {
        self.report.order.total_quantity =
            if self.server_version >= min_server_ver::FRACTIONAL_POSITIONS {
                self.cur.next_float()?
            } else {
                self.cur.next_int()? as f64
            };
        Ok(())
    }

    fn decode_order_type(&mut self) -> Result<()> {
        self.report.order.order_type = self.cur.next_string()?;
        Ok(())
    }

    fn decode_lmt_price(&mut self) -> Result<()> {
        self.report.order.lmt_price = self.cur.next_opt_float()?;
        Ok(())
    }

    fn decode_aux_price(&mut self) -> Result<()> {
        self.report.order.aux_price = self.cur.next_opt_float()?;
        Ok(())
    }

    fn decode_tif(&mut self) -> Result<()> {
        self.report.order.tif = self.cur.next_string()?;
        Ok(())
    }

    fn decode_oca_group(&mut self) -> Result<()> {
        self.report.order.oca_group = self.cur.next_string()?;
        Ok(())
    }

    fn decode_account(&mut self) -> Result<()> {
        self.report.order.account = self.cur.next_string()?;
        Ok(())
    }

    fn decode_open_close(&mut self) -> Result<()> {
        self.report.order.open_close = self.cur.next_string()?;
        Ok(())
    }

    fn decode_origin(&mut self) -> Result<()> {
        self.report.order.origin = self.cur.next_i32()?;
        Ok(())
    }

    fn decode_order_ref(&mut self) -> Result<()> {
        self.report.order.order_ref = self.cur.next_string()?;
        Ok(())
    }

    fn decode_client_id(&mut self) -> Result<()> {
        self.report.order.client_id = self.cur.next_int()?;
        Ok(())
    }

    fn decode_perm_id(&mut self) -> Result<()> {
        self.report.order.perm_id = self.cur.next_int()?;
        Ok(())
    }

    fn decode_outside_rth(&mut self) -> Result<()> {
        self.report.order.outside_rth = self.cur.next_bool()?;
        Ok(())
    }

    fn decode_hidden(&mut self) -> Result<()> {
        self.report.order.hidden = self.cur.next_bool()?;
        Ok(())
    }

    fn decode_discretionary_amt(&mut self) -> Result<()> {
        self.report.order.discretionary_amt = self.cur.next_float()?;
        Ok(())
    }

    fn decode_good_after_time(&mut self) -> Result<()> {
        self.report.order.good_after_time = self.cur.next_string()?;
        Ok(())
    }

    fn skip_shares_allocation(&mut self) -> Result<()> {
        self.cur.skip() // retired field
    }

    fn decode_fa_params(&mut self) -> Result<()> {
        let o = &mut self.report.order;
        o.fa_group = self.cur.next_string()?;
        o.fa_method = self.cur.next_string()?;
        o.fa_percentage = self.cur.next_string()?;
        o.fa_profile = self.cur.next_string()?;
        Ok(())
    }

    fn decode_model_code(&mut self) -> Result<()> {
        if self.server_version >= min_server_ver::MODELS_SUPPORT {
            self.report.order.model_code = self.cur.next_string()?;
        }
        Ok(())
    }

    fn decode_good_till_date(&mut self) -> Result<()> {
        self.report.order.good_till_date = self.cur.next_string()?;
        Ok(())
    }

    fn decode_rule_80a(&mut self) -> Result<()> {
        self.report.order.rule_80a = self.cur.next_string()?;
        Ok(())
    }

    fn decode_percent_offset(&mut self) -> Result<()> {
        self.report.order.percent_offset = self.cur.next_opt_float()?;
        Ok(())
    }

    fn decode_settling_firm(&mut self) -> Result<()> {
        self.report.order.settling_firm = self.cur.next_string()?;
        Ok(())
    }

    fn decode_short_sale_params(&mut self) -> Result<()> {
        let o = &mut self.report.order;
        o.short_sale_slot = self.cur.next_i32()?;
        o.designated_location = self.cur.next_string()?;
        if self.server_version == min_server_ver::SSHORTX_OLD {
            self.cur.skip()?;
        } else if self.version >= 23 {
            o.exempt_code = self.cur.next_i32()?;
        }
        Ok(())
    }

    fn decode_auction_strategy(&mut self) -> Result<()> {
        self.report.order.auction_strategy = self.cur.next_i32()?;
        Ok(())
    }

    fn decode_box_order_params(&mut self) -> Result<()> {
        let o = &mut self.report.order;
        o.starting_price = self.cur.next_opt_float()?;
        o.stock_ref_price = self.cur.next_opt_float()?;
        o.delta = self.cur.next_opt_float()?;
        Ok(())
    }

    fn decode_peg_to_stk_or_vol_order_params(&mut self) -> Result<()> {
        let o = &mut self.report.order;
        o.stock_range_lower = self.cur.next_opt_float()?;
        o.stock_range_upper = self.cur.next_opt_float()?;
        Ok(())
    }

    fn decode_display_size(&mut self) -> Result<()> {
        self.report.order.display_size = self.cur.next_i32()?;
        Ok(())
    }

    fn decode_block_order(&mut self) -> Result<()> {
        self.report.order.block_order = self.cur.next_bool()?;
        Ok(())
    }

    fn decode_sweep_to_fill(&mut self) -> Result<()> {
        self.report.order.sweep_to_fill = self.cur.next_bool()?;
        Ok(())
    }

    fn decode_all_or_none(&mut self) -> Result<()> {
        self.report.order.all_or_none = self.cur.next_bool()?;
        Ok(())
    }

    fn decode_min_qty(&mut self) -> Result<()> {
        self.report.order.min_qty = self.cur.next_opt_int()?;
        Ok(())
    }

    fn decode_oca_type(&mut self) -> Result<()> {
        self.report.order.oca_type = self.cur.next_i32()?;
        Ok(())
    }

    fn decode_e_trade_only(&mut self) -> Result<()> {
        self.report.order.e_trade_only = self.cur.next_bool()?;
        Ok(())
    }

    fn decode_firm_quote_only(&mut self) -> Result<()> {
        self.report.order.firm_quote_only = self.cur.next_bool()?;
        Ok(())
    }

    fn decode_nbbo_price_cap(&mut self) -> Result<()> {
        self.report.order.nbbo_price_cap = self.cur.next_opt_float()?;
        Ok(())
    }

    fn decode_parent_id(&mut self) -> Result<()> {
        self.report.order.parent_id = self.cur.next_int()?;
        Ok(())
    }

    fn decode_trigger_method(&mut self) -> Result<()> {
        self.report.order.trigger_method = self.cur.next_i32()?;
        Ok(())
    }

    fn decode_vol_order_params(&mut self, open_order_attribs: bool) -> Result<()> {
        let o = &mut self.report.order;
        o.volatility = self.cur.next_opt_float()?;
        o.volatility_type = self.cur.next_i32()?;
        o.delta_neutral_order_type = self.cur.next_string()?;
        o.delta_neutral_aux_price = self.cur.next_opt_float()?;

        if self.version >= 27 && !o.delta_neutral_order_type.is_empty() {
            o.delta_neutral_con_id = self.cur.next_int()?;
            if open_order_attribs {
                o.delta_neutral_settling_firm = self.cur.next_string()?;
                o.delta_neutral_clearing_account = self.cur.next_string()?;
                o.delta_neutral_clearing_intent = self.cur.next_string()?;
            }
        }

        if self.version >= 31 && !o.delta_neutral_order_type.is_empty() && open_order_attribs {
            o.delta_neutral_open_close = self.cur.next_string()?;
            o.delta_neutral_short_sale = self.cur.next_bool()?;
            o.delta_neutral_short_sale_slot = self.cur.next_i32()?;
            o.delta_neutral_designated_location = self.cur.next_string()?;
        }

        o.continuous_update = self.cur.next_bool()?;
        o.reference_price_type = self.cur.next_i32()?;
        Ok(())
    }

    fn decode_trail_params(&mut self) -> Result<()> {
        self.report.order.trail_stop_price = self.cur.next_opt_float()?;
        if self.version >= 30 {
            self.report.order.trailing_percent = self.cur.next_opt_float()?;
        }
        Ok(())
    }

    fn decode_basis_points(&mut self) -> Result<()> {
        self.report.order.basis_points = self.cur.next_opt_float()?;
        self.report.order.basis_points_type = self
            .cur
            .next_opt_int()?
            .map(|v| v as i32);
        Ok(())
    }

    fn decode_combo_legs(&mut self) -> Result<()> {
        self.report.contract.combo_legs_descrip = self.cur.next_string()?;

        if self.version >= 29 {
            let combo_legs_count = self.cur.next_int()?;
            if combo_legs_count > 0 {
                for _ in 0..combo_legs_count {
                    self.report.contract.combo_legs.push(ComboLeg {
                        con_id: self.cur.next_int()?,
                        ratio: self.cur.next_int()?,
                        action: self.cur.next_string()?,
                        exchange: self.cur.next_string()?,
                        open_close: self.cur.next_i32()?,
                        short_sale_slot: self.cur.next_i32()?,
                        designated_location: self.cur.next_string()?,
                        exempt_code: self.cur.next_i32()?,
                    });
                }

                let order_combo_legs_count = self.cur.next_int()?;
                for _ in 0..order_combo_legs_count {
                    self.report.order.order_combo_legs.push(OrderComboLeg {
                        price: self.cur.next_opt_float()?,
                    });
                }
            }
        }
        Ok(())
    }

    fn decode_smart_combo_routing_params(&mut self) -> Result<()> {
        if self.version >= 26 {
            let count = self.cur.next_int()?;
            for _ in 0..count {
                let tag = self.cur.next_string()?;
                let value = self.cur.next_string()?;
                self.report.order.smart_combo_routing_params.push((tag, value));
            }
        }
        Ok(())
    }

    fn decode_scale_order_params(&mut self) -> Result<()> {
        let o = &mut self.report.order;
        if self.version >= 20 {
            o.scale_init_level_size = self.cur.next_opt_int()?;
            o.scale_subs_level_size = self.cur.next_opt_int()?;
        } else {
            self.cur.skip()?; // retired scaleNumComponents
            o.scale_init_level_size = self.cur.next_opt_int()?;
        }

        o.scale_price_increment = self.cur.next_opt_float()?;

        if self.version >= 28 && o.scale_price_increment.map_or(false, |v| v > 0.0) {
            o.scale_price_adjust_value = self.cur.next_opt_float()?;
            o.scale_price_adjust_interval = self.cur.next_opt_int()?;
            o.scale_profit_offset = self.cur.next_opt_float()?;
            o.scale_auto_reset = self.cur.next_bool()?;
            o.scale_init_position = self.cur.next_opt_int()?;
            o.scale_init_fill_qty = self.cur.next_opt_int()?;
            o.scale_random_percent = self.cur.next_bool()?;
        }
        Ok(())
    }

    fn decode_hedge_params(&mut self) -> Result<()> {
        if self.version >= 24 {
            let o = &mut self.report.order;
            o.hedge_type = self.cur.next_string()?;
            if !o.hedge_type.is_empty() {
                o.hedge_param = self.cur.next_string()?;
            }
        }
        Ok(())
    }

    fn decode_opt_out_smart_routing(&mut self) -> Result<()> {
        if self.version >= 25 {
            self.report.order.opt_out_smart_routing = self.cur.next_bool()?;
        }
        Ok(())
    }

    fn decode_clearing_params(&mut self) -> Result<()> {
        self.report.order.clearing_account = self.cur.next_string()?;
        self.report.order.clearing_intent = self.cur.next_string()?;
        Ok(())
    }

    fn decode_not_held(&mut self) -> Result<()> {
        if self.version >= 22 {
            self.report.order.not_held = self.cur.next_bool()?;
        }
        Ok(())
    }

    fn decode_delta_neutral(&mut self) -> Result<()> {
        if self.version >= 20 {
            let present = self.cur.next_bool()?;
            if present {
                self.report.contract.delta_neutral_contract = Some(DeltaNeutralContract {
                    con_id: self.cur.next_int()?,
                    delta: self.cur.next_float()?,
                    price: self.cur.next_float()?,
                });
            }
        }
        Ok(())
    }

    fn decode_algo_params(&mut self) -> Result<()> {
        if self.version >= 21 {
            let o = &mut self.report.order;
            o.algo_strategy = self.cur.next_string()?;
            if !o.algo_strategy.is_empty() {
                let count = self.cur.next_int()?;
                for _ in 0..count {
                    let tag = self.cur.next_string()?;
                    let value = self.cur.next_string()?;
                    o.algo_params.push((tag, value));
                }
            }
        }
        Ok(())
    }

    fn decode_solicited(&mut self) -> Result<()> {
        if self.version >= 33 {
            self.report.order.solicited = self.cur.next_bool()?;
        }
        Ok(())
    }

    fn decode_order_status(&mut self) -> Result<()> {
        self.report.order_state.status = self.cur.next_string()?;
        Ok(())
    }

    fn decode_what_if_info_and_commission(&mut self) -> Result<()> {
        self.report.order.what_if = self.cur.next_bool()?;
        self.decode_order_status()?;

        let s = &mut self.report.order_state;
        if self.server_version >= min_server_ver::WHAT_IF_EXT_FIELDS {
            s.init_margin_before = self.cur.next_string()?;
            s.maint_margin_before = self.cur.next_string()?;
            s.equity_with_loan_before = self.cur.next_string()?;
            s.init_margin_change = self.cur.next_string()?;
            s.maint_margin_change = self.cur.next_string()?;
            s.equity_with_loan_change = self.cur.next_string()?;
        }

        s.init_margin_after = self.cur.next_string()?;
        s.maint_margin_after = self.cur.next_string()?;
        s.equity_with_loan_after = self.cur.next_string()?;
        s.commission = self.cur.next_opt_float()?;
        s.min_commission = self.cur.next_opt_float()?;
        s.max_commission = self.cur.next_opt_float()?;
        s.commission_currency = self.cur.next_string()?;
        s.warning_text = self.cur.next_string()?;
        Ok(())
    }

    fn decode_vol_randomize_flags(&mut self) -> Result<()> {
        if self.version >= 34 {
            self.report.order.randomize_size = self.cur.next_bool()?;
            self.report.order.randomize_price = self.cur.next_bool()?;
        }
        Ok(())
    }

    fn decode_peg_to_bench_params(&mut self) -> Result<()> {
        if self.server_version >= min_server_ver::PEGGED_TO_BENCHMARK
            && self.report.order.order_type == "PEG BENCH"
        {
            let o = &mut self.report.order;
            o.reference_contract_id = self.cur.next_int()?;
            o.is_pegged_change_amount_decrease = self.cur.next_bool()?;
            o.pegged_change_amount = self.cur.next_float()?;
            o.reference_change_amount = self.cur.next_float()?;
            o.reference_exchange_id = self.cur.next_string()?;
        }
        Ok(())
    }

    fn decode_conditions(&mut self) -> Result<()> {
        if self.server_version >= min_server_ver::PEGGED_TO_BENCHMARK {
            let count = self.cur.next_int()?;
            if count > 0 {
                for _ in 0..count {
                    let kind = self.cur.next_i32()?;
                    let condition = self.decode_condition(kind)?;
                    self.report.order.conditions.push(condition);
                }
                self.report.order.conditions_ignore_rth = self.cur.next_bool()?;
                self.report.order.conditions_cancel_order = self.cur.next_bool()?;
            }
        }
        Ok(())
    }

    fn decode_condition(&mut self, kind: i32) -> Result<OrderCondition> {
        let conjunction_and = self.cur.next_str()? == "a";
        Ok(match kind {
            1 => OrderCondition::Price {
                conjunction_and,
                is_more: self.cur.next_bool()?,
                price: self.cur.next_float()?,
                con_id: self.cur.next_int()?,
                exchange: self.cur.next_string()?,
                trigger_method: self.cur.next_i32()?,
            },
            3 => OrderCondition::Time {
                conjunction_and,
                is_more: self.cur.next_bool()?,
                time: self.cur.next_string()?,
            },
            4 => OrderCondition::Margin {
                conjunction_and,
                is_more: self.cur.next_bool()?,
                percent: self.cur.next_int()?,
            },
            5 => OrderCondition::Execution {
                conjunction_and,
                sec_type: self.cur.next_string()?,
                exchange: self.cur.next_string()?,
                symbol: self.cur.next_string()?,
            },
            6 => OrderCondition::Volume {
                conjunction_and,
                is_more: self.cur.next_bool()?,
                volume: self.cur.next_int()?,
                con_id: self.cur.next_int()?,
                exchange: self.cur.next_string()?,
            },
            7 => OrderCondition::PercentChange {
                conjunction_and,
                is_more: self.cur.next_bool()?,
                change_percent: self.cur.next_float()?,
                con_id: self.cur.next_int()?,
                exchange: self.cur.next_string()?,
            },
            other => {
                return Err(crate::error::TwsError::Protocol(format!(
                    "unknown order condition kind {}",
                    other
                )))
            }
        })
    }

    fn decode_adjusted_order_params(&mut self) -> Result<()> {
        if self.server_version >= min_server_ver::PEGGED_TO_BENCHMARK {
            self.report.order.adjusted_order_type = self.cur.next_string()?;
            self.report.order.trigger_price = self.cur.next_opt_float()?;
            self.decode_stop_price_and_lmt_price_offset()?;
            let o = &mut self.report.order;
            o.adjusted_stop_price = self.cur.next_opt_float()?;
            o.adjusted_stop_limit_price = self.cur.next_opt_float()?;
            o.adjusted_trailing_amount = self.cur.next_opt_float()?;
            o.adjustable_trailing_unit = self.cur.next_i32()?;
        }
        Ok(())
    }

    fn decode_stop_price_and_lmt_price_offset(&mut self) -> Result<()> {
        self.report.order.trail_stop_price = self.cur.next_opt_float()?;
        self.report.order.lmt_price_offset = self.cur.next_opt_float()?;
        Ok(())
    }

    fn decode_soft_dollar_tier(&mut self) -> Result<()> {
        if self.server_version >= min_server_ver::SOFT_DOLLAR_TIER {
            self.report.order.soft_dollar_tier = SoftDollarTier {
                name: self.cur.next_string()?,
                value: self.cur.next_string()?,
                display_name: self.cur.next_string()?,
            };
        }
        Ok(())
    }

    fn decode_cash_qty(&mut self) -> Result<()> {
        if self.server_version >= min_server_ver::CASH_QTY {
            self.report.order.cash_qty = self.cur.next_opt_float()?;
        }
        Ok(())
    }

    fn decode_dont_use_auto_price_for_hedge(&mut self) -> Result<()> {
        if self.server_version >= min_server_ver::AUTO_PRICE_FOR_HEDGE {
            self.report.order.dont_use_auto_price_for_hedge = self.cur.next_bool()?;
        }
        Ok(())
    }

    fn decode_is_oms_container(&mut self) -> Result<()> {
        if self.server_version >= min_server_ver::ORDER_CONTAINER {
            self.report.order.is_oms_container = self.cur.next_bool()?;
        }
        Ok(())
    }

    fn decode_discretionary_up_to_limit_price(&mut self) -> Result<()> {
        if self.server_version >= min_server_ver::D_PEG_ORDERS {
            self.report.order.discretionary_up_to_limit_price = self.cur.next_bool()?;
        }
        Ok(())
    }

    fn decode_use_price_mgmt_algo(&mut self) -> Result<()> {
        if self.server_version >= min_server_ver::PRICE_MGMT_ALGO {
            let raw = self.cur.next_str()?;
            self.report.order.use_price_mgmt_algo = match raw {
                "" => None,
                "1" => Some(true),
                _ => Some(false),
            };
        }
        Ok(())
    }

    fn decode_auto_cancel_date(&mut self) -> Result<()> {
        self.report.order.auto_cancel_date = self.cur.next_string()?;
        Ok(())
    }

    fn decode_filled_quantity(&mut self) -> Result<()> {
        self.report.order.filled_quantity = self.cur.next_opt_float()?;
        Ok(())
    }

    fn decode_ref_futures_con_id(&mut self) -> Result<()> {
        self.report.order.ref_futures_con_id = self.cur.next_int()?;
        Ok(())
    }

    fn decode_auto_cancel_parent(&mut self) -> Result<()> {
        self.report.order.auto_cancel_parent = self.cur.next_bool()?;
        Ok(())
    }

    fn decode_shareholder(&mut self) -> Result<()> {
        self.report.order.shareholder = self.cur.next_string()?;
        Ok(())
    }

    fn decode_imbalance_only(&mut self) -> Result<()> {
        self.report.order.imbalance_only = self.cur.next_bool()?;
        Ok(())
    }

    fn decode_route_marketable_to_bbo(&mut self) -> Result<()> {
        self.report.order.route_marketable_to_bbo = self.cur.next_bool()?;
        Ok(())
    }

    fn decode_parent_perm_id(&mut self) -> Result<()> {
        self.report.order.parent_perm_id = self.cur.next_int()?;
        Ok(())
    }

    fn decode_completed_time(&mut self) -> Result<()> {
        self.report.order_state.completed_time = self.cur.next_string()?;
        Ok(())
    }

    fn decode_completed_status(&mut self) -> Result<()> {
        self.report.order_state.completed_status = self.cur.next_string()?;
        Ok(())
    }
}
