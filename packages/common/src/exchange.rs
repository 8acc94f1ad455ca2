//! Exchange router interface.
//!
//! The capability set the orchestrator needs from a DEX: quote, swap and add
//! liquidity. Swaps take the offer asset as attached native funds.

use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::Uint128;

use crate::asset::{Asset, AssetInfo};

#[cw_serde]
pub enum ExchangeExecuteMsg {
    /// Swap the attached native funds into `ask_asset`, sending the output to `recipient`
    Swap {
        ask_asset: AssetInfo,
        min_return: Uint128,
        recipient: String,
    },
    /// Provide both assets as liquidity. CW20 legs are pulled via allowance,
    /// native legs are attached as funds. LP receipt goes to `recipient`.
    AddLiquidity {
        assets: [Asset; 2],
        recipient: String,
    },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum ExchangeQueryMsg {
    #[returns(QuoteResponse)]
    Quote {
        offer_asset: AssetInfo,
        ask_asset: AssetInfo,
        amount: Uint128,
    },
}

#[cw_serde]
pub struct QuoteResponse {
    pub return_amount: Uint128,
}
