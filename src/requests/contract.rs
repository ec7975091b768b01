//! Encoders for contract-lookup requests.

use crate::contract::Contract;
use crate::error::{Result, TwsError};
use crate::messages::{min_server_ver, outgoing};
use crate::protocol::FieldsetBuilder;

use super::require;

/// Encode a contract-details request.
pub fn contract_details(
    server_version: i32,
    request_id: i64,
    contract: &Contract,
) -> Result<Vec<String>> {
    if server_version < min_server_ver::SEC_ID_TYPE
        && (!contract.sec_id_type.is_empty() || !contract.sec_id.is_empty())
    {
        return Err(TwsError::Capability {
            feature: "secIdType and secId parameters",
            required: min_server_ver::SEC_ID_TYPE,
        });
    }
    if server_version < min_server_ver::TRADING_CLASS && !contract.trading_class.is_empty() {
        return Err(TwsError::Capability {
            feature: "tradingClass parameter in contract details requests",
            required: min_server_ver::TRADING_CLASS,
        });
    }
    if server_version < min_server_ver::LINKING && !contract.primary_exchange.is_empty() {
        return Err(TwsError::Capability {
            feature: "primaryExchange parameter in contract details requests",
            required: min_server_ver::LINKING,
        });
    }

    const VERSION: i32 = 8;

    let mut b = FieldsetBuilder::new();
    b.push_i32(outgoing::REQ_CONTRACT_DATA).push_i32(VERSION);

    if server_version >= min_server_ver::CONTRACT_DATA_CHAIN {
        b.push_int(request_id);
    }

    b.push_int(contract.con_id);
    b.push_str(&contract.symbol);
    b.push_str(&contract.sec_type);
    b.push_str(&contract.last_trade_date_or_contract_month);
    b.push_opt_float(contract.strike);
    b.push_str(&contract.right);
    b.push_str(&contract.multiplier);

    if server_version >= min_server_ver::PRIMARYEXCH {
        b.push_str(&contract.exchange);
        b.push_str(&contract.primary_exchange);
    } else if server_version >= min_server_ver::LINKING {
        // Older linking servers take a combined exchange:primary token for
        // routed exchanges.
        if !contract.primary_exchange.is_empty()
            && (contract.exchange == "BEST" || contract.exchange == "SMART")
        {
            b.push_string(format!("{}:{}", contract.exchange, contract.primary_exchange));
        } else {
            b.push_str(&contract.exchange);
        }
    }

    b.push_str(&contract.currency);
    b.push_str(&contract.local_symbol);
    if server_version >= min_server_ver::TRADING_CLASS {
        b.push_str(&contract.trading_class);
    }
    b.push_bool(contract.include_expired);
    if server_version >= min_server_ver::SEC_ID_TYPE {
        b.push_str(&contract.sec_id_type);
        b.push_str(&contract.sec_id);
    }

    Ok(b.into_fields())
}

/// Encode a security-definition option-parameters request (option chain).
pub fn sec_def_opt_params(
    server_version: i32,
    request_id: i64,
    underlying: &Contract,
    fut_fop_exchange: &str,
) -> Result<Vec<String>> {
    require(
        server_version,
        min_server_ver::SEC_DEF_OPT_PARAMS_REQ,
        "security definition option parameters requests",
    )?;

    let mut b = FieldsetBuilder::new();
    b.push_i32(outgoing::REQ_SEC_DEF_OPT_PARAMS).push_int(request_id);
    b.push_str(&underlying.symbol);
    b.push_str(fut_fop_exchange);
    b.push_str(&underlying.sec_type);
    b.push_int(underlying.con_id);
    Ok(b.into_fields())
}
