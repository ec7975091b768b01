//! Message type identifiers and version constants.
//!
//! Every frame starts with an integer message type id. Outbound ids live in
//! [`outgoing`]; inbound ids are modeled as the [`IncomingKind`] enum so
//! dispatch is an exhaustive match instead of a lookup table.
//!
//! [`min_server_ver`] holds the server capability levels that gate field
//! presence on both the encode and decode side. The per-message ("legacy")
//! version numbers are not listed here; they are carried inline by the
//! affected message families.

/// Lowest protocol version this client can speak.
pub const MIN_CLIENT_VERSION: i32 = 100;

/// Highest protocol version this client can speak.
pub const MAX_CLIENT_VERSION: i32 = 151;

/// Outbound message type ids.
pub mod outgoing {
    pub const REQ_MKT_DATA: i32 = 1;
    pub const CANCEL_MKT_DATA: i32 = 2;
    pub const PLACE_ORDER: i32 = 3;
    pub const CANCEL_ORDER: i32 = 4;
    pub const REQ_OPEN_ORDERS: i32 = 5;
    pub const REQ_ACCT_DATA: i32 = 6;
    pub const REQ_EXECUTIONS: i32 = 7;
    pub const REQ_IDS: i32 = 8;
    pub const REQ_CONTRACT_DATA: i32 = 9;
    pub const REQ_MKT_DEPTH: i32 = 10;
    pub const CANCEL_MKT_DEPTH: i32 = 11;
    pub const REQ_NEWS_BULLETINS: i32 = 12;
    pub const CANCEL_NEWS_BULLETINS: i32 = 13;
    pub const SET_SERVER_LOGLEVEL: i32 = 14;
    pub const REQ_AUTO_OPEN_ORDERS: i32 = 15;
    pub const REQ_ALL_OPEN_ORDERS: i32 = 16;
    pub const REQ_MANAGED_ACCTS: i32 = 17;
    pub const REQ_FA: i32 = 18;
    pub const REPLACE_FA: i32 = 19;
    pub const REQ_HISTORICAL_DATA: i32 = 20;
    pub const EXERCISE_OPTIONS: i32 = 21;
    pub const REQ_SCANNER_SUBSCRIPTION: i32 = 22;
    pub const CANCEL_SCANNER_SUBSCRIPTION: i32 = 23;
    pub const REQ_SCANNER_PARAMETERS: i32 = 24;
    pub const CANCEL_HISTORICAL_DATA: i32 = 25;
    pub const REQ_CURRENT_TIME: i32 = 49;
    pub const REQ_REAL_TIME_BARS: i32 = 50;
    pub const CANCEL_REAL_TIME_BARS: i32 = 51;
    pub const REQ_FUNDAMENTAL_DATA: i32 = 52;
    pub const CANCEL_FUNDAMENTAL_DATA: i32 = 53;
    pub const REQ_CALC_IMPLIED_VOLAT: i32 = 54;
    pub const REQ_CALC_OPTION_PRICE: i32 = 55;
    pub const CANCEL_CALC_IMPLIED_VOLAT: i32 = 56;
    pub const CANCEL_CALC_OPTION_PRICE: i32 = 57;
    pub const REQ_GLOBAL_CANCEL: i32 = 58;
    pub const REQ_MARKET_DATA_TYPE: i32 = 59;
    pub const REQ_POSITIONS: i32 = 61;
    pub const REQ_ACCOUNT_SUMMARY: i32 = 62;
    pub const CANCEL_ACCOUNT_SUMMARY: i32 = 63;
    pub const CANCEL_POSITIONS: i32 = 64;
    pub const QUERY_DISPLAY_GROUPS: i32 = 67;
    pub const SUBSCRIBE_TO_GROUP_EVENTS: i32 = 68;
    pub const UPDATE_DISPLAY_GROUP: i32 = 69;
    pub const UNSUBSCRIBE_FROM_GROUP_EVENTS: i32 = 70;
    pub const START_API: i32 = 71;
    pub const REQ_POSITIONS_MULTI: i32 = 74;
    pub const CANCEL_POSITIONS_MULTI: i32 = 75;
    pub const REQ_ACCOUNT_UPDATES_MULTI: i32 = 76;
    pub const CANCEL_ACCOUNT_UPDATES_MULTI: i32 = 77;
    pub const REQ_SEC_DEF_OPT_PARAMS: i32 = 78;
    pub const REQ_SOFT_DOLLAR_TIERS: i32 = 79;
    pub const REQ_FAMILY_CODES: i32 = 80;
    pub const REQ_MATCHING_SYMBOLS: i32 = 81;
    pub const REQ_MKT_DEPTH_EXCHANGES: i32 = 82;
    pub const REQ_SMART_COMPONENTS: i32 = 83;
    pub const REQ_NEWS_ARTICLE: i32 = 84;
    pub const REQ_NEWS_PROVIDERS: i32 = 85;
    pub const REQ_HISTORICAL_NEWS: i32 = 86;
    pub const REQ_HEAD_TIMESTAMP: i32 = 87;
    pub const REQ_HISTOGRAM_DATA: i32 = 88;
    pub const CANCEL_HISTOGRAM_DATA: i32 = 89;
    pub const CANCEL_HEAD_TIMESTAMP: i32 = 90;
    pub const REQ_MARKET_RULE: i32 = 91;
    pub const REQ_PNL: i32 = 92;
    pub const CANCEL_PNL: i32 = 93;
    pub const REQ_PNL_SINGLE: i32 = 94;
    pub const CANCEL_PNL_SINGLE: i32 = 95;
    pub const REQ_HISTORICAL_TICKS: i32 = 96;
    pub const REQ_TICK_BY_TICK_DATA: i32 = 97;
    pub const CANCEL_TICK_BY_TICK_DATA: i32 = 98;
    pub const REQ_COMPLETED_ORDERS: i32 = 99;
}

/// Inbound message kinds.
///
/// `ServerVersion` is synthetic: the negotiation frame right after the
/// handshake carries no type id and is recognized structurally (first
/// 2-field frame), but it flows through the same correlation machinery as
/// everything else, so it gets a kind of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncomingKind {
    TickPrice,
    TickSize,
    OrderStatus,
    ErrMsg,
    OpenOrder,
    AcctValue,
    PortfolioValue,
    AcctUpdateTime,
    NextValidId,
    ContractData,
    ExecutionData,
    MarketDepth,
    MarketDepthL2,
    NewsBulletins,
    ManagedAccts,
    ReceiveFa,
    HistoricalData,
    BondContractData,
    ScannerParameters,
    ScannerData,
    TickOptionComputation,
    TickGeneric,
    TickString,
    TickEfp,
    CurrentTime,
    RealTimeBars,
    FundamentalData,
    ContractDataEnd,
    OpenOrderEnd,
    AcctDownloadEnd,
    ExecutionDataEnd,
    DeltaNeutralValidation,
    TickSnapshotEnd,
    MarketDataType,
    CommissionReport,
    PositionData,
    PositionEnd,
    AccountSummary,
    AccountSummaryEnd,
    SecurityDefinitionOptionParameter,
    SecurityDefinitionOptionParameterEnd,
    SoftDollarTiers,
    FamilyCodes,
    SymbolSamples,
    MktDepthExchanges,
    TickReqParams,
    SmartComponents,
    NewsArticle,
    TickNews,
    NewsProviders,
    HistoricalNews,
    HistoricalNewsEnd,
    HeadTimestamp,
    HistogramData,
    HistoricalDataUpdate,
    MarketRule,
    Pnl,
    PnlSingle,
    HistoricalTicks,
    HistoricalTicksBidAsk,
    HistoricalTicksLast,
    TickByTick,
    OrderBound,
    CompletedOrder,
    CompletedOrdersEnd,
    ServerVersion,
}

impl IncomingKind {
    /// Map a wire message type id to its kind.
    pub fn from_id(id: i32) -> Option<IncomingKind> {
        use IncomingKind::*;
        Some(match id {
            1 => TickPrice,
            2 => TickSize,
            3 => OrderStatus,
            4 => ErrMsg,
            5 => OpenOrder,
            6 => AcctValue,
            7 => PortfolioValue,
            8 => AcctUpdateTime,
            9 => NextValidId,
            10 => ContractData,
            11 => ExecutionData,
            12 => MarketDepth,
            13 => MarketDepthL2,
            14 => NewsBulletins,
            15 => ManagedAccts,
            16 => ReceiveFa,
            17 => HistoricalData,
            18 => BondContractData,
            19 => ScannerParameters,
            20 => ScannerData,
            21 => TickOptionComputation,
            45 => TickGeneric,
            46 => TickString,
            47 => TickEfp,
            49 => CurrentTime,
            50 => RealTimeBars,
            51 => FundamentalData,
            52 => ContractDataEnd,
            53 => OpenOrderEnd,
            54 => AcctDownloadEnd,
            55 => ExecutionDataEnd,
            56 => DeltaNeutralValidation,
            57 => TickSnapshotEnd,
            58 => MarketDataType,
            59 => CommissionReport,
            61 => PositionData,
            62 => PositionEnd,
            63 => AccountSummary,
            64 => AccountSummaryEnd,
            75 => SecurityDefinitionOptionParameter,
            76 => SecurityDefinitionOptionParameterEnd,
            77 => SoftDollarTiers,
            78 => FamilyCodes,
            79 => SymbolSamples,
            80 => MktDepthExchanges,
            81 => TickReqParams,
            82 => SmartComponents,
            83 => NewsArticle,
            84 => TickNews,
            85 => NewsProviders,
            86 => HistoricalNews,
            87 => HistoricalNewsEnd,
            88 => HeadTimestamp,
            89 => HistogramData,
            90 => HistoricalDataUpdate,
            93 => MarketRule,
            94 => Pnl,
            95 => PnlSingle,
            96 => HistoricalTicks,
            97 => HistoricalTicksBidAsk,
            98 => HistoricalTicksLast,
            99 => TickByTick,
            100 => OrderBound,
            101 => CompletedOrder,
            102 => CompletedOrdersEnd,
            _ => return None,
        })
    }
}

/// Server capability levels (minimum server version per feature).
pub mod min_server_ver {
    pub const REAL_TIME_BARS: i32 = 34;
    pub const SCALE_ORDERS: i32 = 35;
    pub const SNAPSHOT_MKT_DATA: i32 = 35;
    pub const SSHORT_COMBO_LEGS: i32 = 35;
    pub const WHAT_IF_ORDERS: i32 = 36;
    pub const CONTRACT_CONID: i32 = 37;
    pub const PTA_ORDERS: i32 = 39;
    pub const FUNDAMENTAL_DATA: i32 = 40;
    pub const DELTA_NEUTRAL: i32 = 40;
    pub const CONTRACT_DATA_CHAIN: i32 = 40;
    pub const SCALE_ORDERS2: i32 = 40;
    pub const ALGO_ORDERS: i32 = 41;
    pub const EXECUTION_DATA_CHAIN: i32 = 42;
    pub const NOT_HELD: i32 = 44;
    pub const SEC_ID_TYPE: i32 = 45;
    pub const PLACE_ORDER_CONID: i32 = 46;
    pub const REQ_MKT_DATA_CONID: i32 = 47;
    pub const REQ_CALC_IMPLIED_VOLAT: i32 = 49;
    pub const REQ_CALC_OPTION_PRICE: i32 = 50;
    pub const SSHORTX_OLD: i32 = 51;
    pub const SSHORTX: i32 = 52;
    pub const REQ_GLOBAL_CANCEL: i32 = 53;
    pub const HEDGE_ORDERS: i32 = 54;
    pub const REQ_MARKET_DATA_TYPE: i32 = 55;
    pub const OPT_OUT_SMART_ROUTING: i32 = 56;
    pub const SMART_COMBO_ROUTING_PARAMS: i32 = 57;
    pub const DELTA_NEUTRAL_CONID: i32 = 58;
    pub const SCALE_ORDERS3: i32 = 60;
    pub const ORDER_COMBO_LEGS_PRICE: i32 = 61;
    pub const TRAILING_PERCENT: i32 = 62;
    pub const DELTA_NEUTRAL_OPEN_CLOSE: i32 = 66;
    pub const POSITIONS: i32 = 67;
    pub const ACCOUNT_SUMMARY: i32 = 67;
    pub const TRADING_CLASS: i32 = 68;
    pub const SCALE_TABLE: i32 = 69;
    pub const LINKING: i32 = 70;
    pub const ALGO_ID: i32 = 71;
    pub const OPTIONAL_CAPABILITIES: i32 = 72;
    pub const ORDER_SOLICITED: i32 = 73;
    pub const LINKING_AUTH: i32 = 74;
    pub const PRIMARYEXCH: i32 = 75;
    pub const RANDOMIZE_SIZE_AND_PRICE: i32 = 76;
    pub const FRACTIONAL_POSITIONS: i32 = 101;
    pub const PEGGED_TO_BENCHMARK: i32 = 102;
    pub const MODELS_SUPPORT: i32 = 103;
    pub const SEC_DEF_OPT_PARAMS_REQ: i32 = 104;
    pub const EXT_OPERATOR: i32 = 105;
    pub const SOFT_DOLLAR_TIER: i32 = 106;
    pub const REQ_FAMILY_CODES: i32 = 107;
    pub const REQ_MATCHING_SYMBOLS: i32 = 108;
    pub const PAST_LIMIT: i32 = 109;
    pub const MD_SIZE_MULTIPLIER: i32 = 110;
    pub const CASH_QTY: i32 = 111;
    pub const REQ_MKT_DEPTH_EXCHANGES: i32 = 112;
    pub const TICK_NEWS: i32 = 113;
    pub const REQ_SMART_COMPONENTS: i32 = 114;
    pub const REQ_NEWS_PROVIDERS: i32 = 115;
    pub const REQ_NEWS_ARTICLE: i32 = 116;
    pub const REQ_HISTORICAL_NEWS: i32 = 117;
    pub const REQ_HEAD_TIMESTAMP: i32 = 118;
    pub const REQ_HISTOGRAM: i32 = 119;
    pub const SERVICE_DATA_TYPE: i32 = 120;
    pub const AGG_GROUP: i32 = 121;
    pub const UNDERLYING_INFO: i32 = 122;
    pub const CANCEL_HEADTIMESTAMP: i32 = 123;
    pub const SYNT_REALTIME_BARS: i32 = 124;
    pub const CFD_REROUTE: i32 = 125;
    pub const MARKET_RULES: i32 = 126;
    pub const PNL: i32 = 127;
    pub const NEWS_QUERY_ORIGINS: i32 = 128;
    pub const UNREALIZED_PNL: i32 = 129;
    pub const HISTORICAL_TICKS: i32 = 130;
    pub const MARKET_CAP_PRICE: i32 = 131;
    pub const PRE_OPEN_BID_ASK: i32 = 132;
    pub const REAL_EXPIRATION_DATE: i32 = 134;
    pub const REALIZED_PNL: i32 = 135;
    pub const LAST_LIQUIDITY: i32 = 136;
    pub const TICK_BY_TICK: i32 = 137;
    pub const DECISION_MAKER: i32 = 138;
    pub const MIFID_EXECUTION: i32 = 139;
    pub const TICK_BY_TICK_IGNORE_SIZE: i32 = 140;
    pub const AUTO_PRICE_FOR_HEDGE: i32 = 141;
    pub const WHAT_IF_EXT_FIELDS: i32 = 142;
    pub const SCANNER_GENERIC_OPTS: i32 = 143;
    pub const API_BIND_ORDER: i32 = 144;
    pub const ORDER_CONTAINER: i32 = 145;
    pub const SMART_DEPTH: i32 = 146;
    pub const REMOVE_NULL_ALL_CASTING: i32 = 147;
    pub const D_PEG_ORDERS: i32 = 148;
    pub const MKT_DEPTH_PRIM_EXCHANGE: i32 = 149;
    pub const REQ_COMPLETED_ORDERS: i32 = 150;
    pub const PRICE_MGMT_ALGO: i32 = 151;
}

/// Tick field codes used by the market data messages.
pub mod tick_type {
    pub const BID_SIZE: i32 = 0;
    pub const BID: i32 = 1;
    pub const ASK: i32 = 2;
    pub const ASK_SIZE: i32 = 3;
    pub const LAST: i32 = 4;
    pub const LAST_SIZE: i32 = 5;
    pub const HIGH: i32 = 6;
    pub const LOW: i32 = 7;
    pub const VOLUME: i32 = 8;
    pub const CLOSE: i32 = 9;
    pub const BID_OPTION_COMPUTATION: i32 = 10;
    pub const ASK_OPTION_COMPUTATION: i32 = 11;
    pub const LAST_OPTION_COMPUTATION: i32 = 12;
    pub const MODEL_OPTION: i32 = 13;
    pub const OPEN: i32 = 14;
    pub const LOW_13_WEEK: i32 = 15;
    pub const HIGH_13_WEEK: i32 = 16;
    pub const LOW_26_WEEK: i32 = 17;
    pub const HIGH_26_WEEK: i32 = 18;
    pub const LOW_52_WEEK: i32 = 19;
    pub const HIGH_52_WEEK: i32 = 20;
    pub const AVG_VOLUME: i32 = 21;
    pub const OPEN_INTEREST: i32 = 22;
    pub const OPTION_HISTORICAL_VOL: i32 = 23;
    pub const OPTION_IMPLIED_VOL: i32 = 24;
    pub const OPTION_BID_EXCH: i32 = 25;
    pub const OPTION_ASK_EXCH: i32 = 26;
    pub const OPTION_CALL_OPEN_INTEREST: i32 = 27;
    pub const OPTION_PUT_OPEN_INTEREST: i32 = 28;
    pub const OPTION_CALL_VOLUME: i32 = 29;
    pub const OPTION_PUT_VOLUME: i32 = 30;
    pub const INDEX_FUTURE_PREMIUM: i32 = 31;
    pub const BID_EXCH: i32 = 32;
    pub const ASK_EXCH: i32 = 33;
    pub const AUCTION_VOLUME: i32 = 34;
    pub const AUCTION_PRICE: i32 = 35;
    pub const AUCTION_IMBALANCE: i32 = 36;
    pub const MARK_PRICE: i32 = 37;
    pub const BID_EFP_COMPUTATION: i32 = 38;
    pub const ASK_EFP_COMPUTATION: i32 = 39;
    pub const LAST_EFP_COMPUTATION: i32 = 40;
    pub const OPEN_EFP_COMPUTATION: i32 = 41;
    pub const HIGH_EFP_COMPUTATION: i32 = 42;
    pub const LOW_EFP_COMPUTATION: i32 = 43;
    pub const CLOSE_EFP_COMPUTATION: i32 = 44;
    pub const LAST_TIMESTAMP: i32 = 45;
    pub const SHORTABLE: i32 = 46;
    pub const FUNDAMENTAL_RATIOS: i32 = 47;
    pub const RT_VOLUME: i32 = 48;
    pub const HALTED: i32 = 49;
    pub const BID_YIELD: i32 = 50;
    pub const ASK_YIELD: i32 = 51;
    pub const LAST_YIELD: i32 = 52;
    pub const CUST_OPTION_COMPUTATION: i32 = 53;
    pub const TRADE_COUNT: i32 = 54;
    pub const TRADE_RATE: i32 = 55;
    pub const VOLUME_RATE: i32 = 56;
    pub const LAST_RTH_TRADE: i32 = 57;
    pub const RT_HISTORICAL_VOL: i32 = 58;
    pub const IB_DIVIDENDS: i32 = 59;
    pub const BOND_FACTOR_MULTIPLIER: i32 = 60;
    pub const REGULATORY_IMBALANCE: i32 = 61;
    pub const NEWS_TICK: i32 = 62;
    pub const SHORT_TERM_VOLUME_3_MIN: i32 = 63;
    pub const SHORT_TERM_VOLUME_5_MIN: i32 = 64;
    pub const SHORT_TERM_VOLUME_10_MIN: i32 = 65;
    pub const DELAYED_BID: i32 = 66;
    pub const DELAYED_ASK: i32 = 67;
    pub const DELAYED_LAST: i32 = 68;
    pub const DELAYED_BID_SIZE: i32 = 69;
    pub const DELAYED_ASK_SIZE: i32 = 70;
    pub const DELAYED_LAST_SIZE: i32 = 71;
    pub const DELAYED_HIGH: i32 = 72;
    pub const DELAYED_LOW: i32 = 73;
    pub const DELAYED_VOLUME: i32 = 74;
    pub const DELAYED_CLOSE: i32 = 75;
    pub const DELAYED_OPEN: i32 = 76;
    pub const RT_TRD_VOLUME: i32 = 77;
    pub const CREDITMAN_MARK_PRICE: i32 = 78;
    pub const CREDITMAN_SLOW_MARK_PRICE: i32 = 79;
    pub const DELAYED_BID_OPTION: i32 = 80;
    pub const DELAYED_ASK_OPTION: i32 = 81;
    pub const DELAYED_LAST_OPTION: i32 = 82;
    pub const DELAYED_MODEL_OPTION: i32 = 83;
    pub const LAST_EXCH: i32 = 84;
    pub const LAST_REG_TIME: i32 = 85;
    pub const FUTURES_OPEN_INTEREST: i32 = 86;
    pub const AVG_OPT_VOLUME: i32 = 87;
    pub const DELAYED_LAST_TIMESTAMP: i32 = 88;
    pub const SHORTABLE_SHARES: i32 = 89;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_id_known_types() {
        assert_eq!(IncomingKind::from_id(1), Some(IncomingKind::TickPrice));
        assert_eq!(IncomingKind::from_id(4), Some(IncomingKind::ErrMsg));
        assert_eq!(IncomingKind::from_id(9), Some(IncomingKind::NextValidId));
        assert_eq!(IncomingKind::from_id(53), Some(IncomingKind::OpenOrderEnd));
        assert_eq!(
            IncomingKind::from_id(102),
            Some(IncomingKind::CompletedOrdersEnd)
        );
    }

    #[test]
    fn test_from_id_unknown_types() {
        assert_eq!(IncomingKind::from_id(0), None);
        assert_eq!(IncomingKind::from_id(48), None);
        assert_eq!(IncomingKind::from_id(10_000), None);
    }
}
