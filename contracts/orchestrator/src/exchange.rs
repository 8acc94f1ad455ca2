//! Exchange adapter
//!
//! Stateless pricing and trading helpers over an injected router contract.
//! Nothing here touches storage; callers pass the router address from config.

use cosmwasm_std::{
    to_json_binary, Addr, Coin, CosmosMsg, QuerierWrapper, StdResult, Uint128, WasmMsg,
};
use cw20::Cw20ExecuteMsg;

use common::exchange::{ExchangeExecuteMsg, ExchangeQueryMsg, QuoteResponse};
use common::{Asset, AssetInfo};

use crate::state::SLIPPAGE_DENOMINATOR;

/// Expected output of swapping `amount` of `offer` into `ask`
pub fn quote(
    querier: &QuerierWrapper,
    router: &Addr,
    offer: AssetInfo,
    ask: AssetInfo,
    amount: Uint128,
) -> StdResult<Uint128> {
    let response: QuoteResponse = querier.query_wasm_smart(
        router.to_string(),
        &ExchangeQueryMsg::Quote {
            offer_asset: offer,
            ask_asset: ask,
            amount,
        },
    )?;
    Ok(response.return_amount)
}

/// Lowest acceptable output for a quote under a slippage factor out of 1000
pub fn min_return(quoted: Uint128, max_slippage: u16) -> Uint128 {
    quoted.multiply_ratio(max_slippage, SLIPPAGE_DENOMINATOR)
}

/// Swap native `offer` into `ask`, delivering to `recipient`
pub fn swap_msg(
    router: &Addr,
    offer: Coin,
    ask: AssetInfo,
    min_return: Uint128,
    recipient: &Addr,
) -> StdResult<CosmosMsg> {
    Ok(CosmosMsg::Wasm(WasmMsg::Execute {
        contract_addr: router.to_string(),
        msg: to_json_binary(&ExchangeExecuteMsg::Swap {
            ask_asset: ask,
            min_return,
            recipient: recipient.to_string(),
        })?,
        funds: vec![offer],
    }))
}

/// Pair a CW20 amount with a native amount as liquidity.
/// Emits the allowance grant followed by the provide call.
pub fn add_liquidity_msgs(
    router: &Addr,
    token: &Addr,
    token_amount: Uint128,
    native: Coin,
    recipient: &Addr,
) -> StdResult<Vec<CosmosMsg>> {
    let allowance = CosmosMsg::Wasm(WasmMsg::Execute {
        contract_addr: token.to_string(),
        msg: to_json_binary(&Cw20ExecuteMsg::IncreaseAllowance {
            spender: router.to_string(),
            amount: token_amount,
            expires: None,
        })?,
        funds: vec![],
    });
    let provide = CosmosMsg::Wasm(WasmMsg::Execute {
        contract_addr: router.to_string(),
        msg: to_json_binary(&ExchangeExecuteMsg::AddLiquidity {
            assets: [
                Asset::new(AssetInfo::cw20(token.clone()), token_amount),
                Asset::new(AssetInfo::native(native.denom.clone()), native.amount),
            ],
            recipient: recipient.to_string(),
        })?,
        funds: vec![native],
    });
    Ok(vec![allowance, provide])
}
