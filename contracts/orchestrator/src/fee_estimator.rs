//! Fee Estimator
//!
//! The relay must be prepaid in the sending chain's gas denom. Fees are sized
//! from the payload length and the destination's fixed gas budget, so every
//! `check_*_fee` helper builds the exact payload it would send and asks the
//! relay for a quote.
//!
//! | Request              | Channel            | Paid by                 |
//! |----------------------|--------------------|-------------------------|
//! | Deposit              | `SendWithAsset`    | depositor (attached)    |
//! | Withdrawal           | `SendMessageOnly`  | withdrawer (attached)   |
//! | Repatriation         | `SendWithAsset`    | host orchestrator gas   |
//! | Distribute earnings  | `SendWithAsset`    | vault (attached)        |

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Binary, Coin, Deps, QuerierWrapper, Uint128};

use common::relay::{QuoteFeeResponse, RelayQueryMsg};

use crate::chain_registry::load_enabled_endpoint;
use crate::codec::{
    encode_deposit_payload, encode_distribute_earnings_payload, encode_repatriation_payload,
    encode_withdrawal_payload,
};
use crate::error::ContractError;
use crate::state::{ChainEndpoint, Config, CONFIG, OUTBOUND_NONCE, STATS};

/// A relay quote for one concrete payload
#[cw_serde]
pub struct FeeQuote {
    pub fee: Coin,
    pub payload_len: u32,
}

/// Ask the relay what delivering `payload_len` bytes to `endpoint` costs
pub fn quote_fee(
    querier: &QuerierWrapper,
    config: &Config,
    endpoint: &ChainEndpoint,
    payload_len: u32,
    with_asset: bool,
) -> Result<Coin, ContractError> {
    let response: QuoteFeeResponse = querier.query_wasm_smart(
        config.relay.to_string(),
        &RelayQueryMsg::QuoteFee {
            dest_chain_id: endpoint.relay_chain_id,
            payload_len,
            native_gas_budget: endpoint.gas_budget,
            with_asset,
        },
    )?;
    Ok(response.fee)
}

/// Quote an already encoded payload
pub fn quote_payload(
    querier: &QuerierWrapper,
    config: &Config,
    endpoint: &ChainEndpoint,
    payload: &Binary,
    with_asset: bool,
) -> Result<FeeQuote, ContractError> {
    let payload_len = u32::try_from(payload.len()).map_err(|_| ContractError::MalformedPayload {
        reason: "payload too long".to_string(),
    })?;
    Ok(FeeQuote {
        fee: quote_fee(querier, config, endpoint, payload_len, with_asset)?,
        payload_len,
    })
}

fn next_nonce(deps: Deps) -> Result<u64, ContractError> {
    Ok(OUTBOUND_NONCE.may_load(deps.storage)?.unwrap_or_default())
}

#[allow(clippy::too_many_arguments)]
pub fn check_deposit_fee(
    deps: Deps,
    dest_chain_id: u64,
    origin_account: &[u8],
    pool_id: u64,
    value: Uint128,
    weeks_committed: u32,
    max_slippage: u16,
    dest_account: &[u8],
) -> Result<FeeQuote, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let endpoint = load_enabled_endpoint(deps.storage, dest_chain_id)?;
    let payload = encode_deposit_payload(
        next_nonce(deps)?,
        pool_id,
        value,
        weeks_committed,
        max_slippage,
        origin_account,
        dest_account,
    )?;
    quote_payload(&deps.querier, &config, &endpoint, &payload, true)
}

pub fn check_withdrawal_fee(
    deps: Deps,
    dest_chain_id: u64,
    origin_account: &[u8],
    pool_id: u64,
    tranche_id: u64,
    max_slippage: u16,
) -> Result<FeeQuote, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let endpoint = load_enabled_endpoint(deps.storage, dest_chain_id)?;
    let payload = encode_withdrawal_payload(
        next_nonce(deps)?,
        config.this_chain_id,
        origin_account,
        pool_id,
        tranche_id,
        max_slippage,
    )?;
    quote_payload(&deps.querier, &config, &endpoint, &payload, false)
}

/// Fee for returning a tranche to `origin_chain_id`
pub fn check_repatriation_fee(
    deps: Deps,
    origin_chain_id: u64,
    pool_id: u64,
    tranche_id: u64,
    origin_recipient: &[u8],
    burnable_rewards: Uint128,
    rewards_due: Uint128,
) -> Result<FeeQuote, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let endpoint = load_enabled_endpoint(deps.storage, origin_chain_id)?;
    let payload = encode_repatriation_payload(
        next_nonce(deps)?,
        origin_chain_id,
        pool_id,
        tranche_id,
        origin_recipient,
        burnable_rewards,
        rewards_due,
    )?;
    quote_payload(&deps.querier, &config, &endpoint, &payload, true)
}

/// Fee for reporting earnings to the home chain
pub fn check_distribute_earnings_fee(
    deps: Deps,
    buyback_amount: Uint128,
    revshare_amount: Uint128,
    max_slippage: u16,
) -> Result<FeeQuote, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if config.is_home_chain() {
        return Err(ContractError::UnexpectedRequest {
            reason: "home chain distributes earnings locally".to_string(),
        });
    }
    let endpoint = load_enabled_endpoint(deps.storage, config.home_chain_id)?;
    let slashed = STATS
        .may_load(deps.storage)?
        .unwrap_or_default()
        .synthetic_rewards_slashed;
    let payload = encode_distribute_earnings_payload(
        next_nonce(deps)?,
        config.this_chain_id,
        buyback_amount,
        revshare_amount,
        slashed,
        max_slippage,
    )?;
    quote_payload(&deps.querier, &config, &endpoint, &payload, true)
}
