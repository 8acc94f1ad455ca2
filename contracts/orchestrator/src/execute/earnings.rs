//! Earnings distribution.
//!
//! A pool vault hands harvested stablecoin profit to its orchestrator. Off
//! the home chain the profit is bridged to home together with the rewards
//! slashed here since the last report; on home it is split into:
//!
//! - buyback: half swapped to the reward token, half to its LP pair denom,
//!   liquidity added and the LP receipt sent to the burn address
//! - revshare: swapped to the reward token straight into the staking vault

use cosmwasm_std::{Coin, DepsMut, Env, MessageInfo, Response, Uint128};

use common::AssetInfo;

use super::outgoing::{
    collect_payment, dispatch_request, refund_msg, take_nonce, validate_slippage,
};
use crate::chain_registry::load_enabled_endpoint;
use crate::codec::encode_distribute_earnings_payload;
use crate::error::ContractError;
use crate::exchange::{add_liquidity_msgs, min_return, quote, swap_msg};
use crate::fee_estimator::quote_payload;
use crate::hash::bytes32_to_hex;
use crate::state::{Config, RequestKind, CONFIG, POOL_BY_VAULT, STATS};

/// Vault entry point for harvested profit
pub fn execute_request_distribute_earnings(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    buyback_amount: Uint128,
    revshare_amount: Uint128,
    max_slippage: u16,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if config.paused {
        return Err(ContractError::Paused);
    }
    let pool_id = POOL_BY_VAULT
        .may_load(deps.storage, &info.sender)?
        .ok_or(ContractError::UnauthorizedVault)?;
    validate_slippage(&config, max_slippage)?;

    let total = buyback_amount.checked_add(revshare_amount)?;
    if total.is_zero() {
        return Err(ContractError::InvalidAmount {
            reason: "nothing to distribute".to_string(),
        });
    }
    let earnings = Coin {
        denom: config.stablecoin_denom.clone(),
        amount: total,
    };

    if config.is_home_chain() {
        let refund = collect_payment(&info.funds, vec![earnings], &config.gas_denom)?;
        let mut response = distribute_on_home(
            deps,
            &env,
            &config,
            total,
            buyback_amount,
            revshare_amount,
            Uint128::zero(),
            max_slippage,
        )?;
        if let Some(msg) = refund_msg(info.sender.as_str(), refund) {
            response = response.add_message(msg);
        }
        return Ok(response
            .add_attribute("action", "distribute_earnings")
            .add_attribute("pool_id", pool_id.to_string()));
    }

    let endpoint = load_enabled_endpoint(deps.storage, config.home_chain_id)?;

    // The slashed counter travels with this report and starts over
    let mut stats = STATS.load(deps.storage)?;
    let slashed_rewards = stats.synthetic_rewards_slashed;
    stats.synthetic_rewards_slashed = Uint128::zero();
    STATS.save(deps.storage, &stats)?;

    let nonce = take_nonce(deps.storage)?;
    let payload = encode_distribute_earnings_payload(
        nonce,
        config.this_chain_id,
        buyback_amount,
        revshare_amount,
        slashed_rewards,
        max_slippage,
    )?;
    let fee = quote_payload(&deps.querier, &config, &endpoint, &payload, true)?.fee;
    let refund = collect_payment(&info.funds, vec![earnings.clone(), fee.clone()], &fee.denom)?;

    let (request, relay_msg) = dispatch_request(
        deps.storage,
        &env,
        &config,
        &endpoint,
        RequestKind::DistributeEarnings,
        nonce,
        payload,
        Some(earnings),
        &fee,
    )?;

    let mut response = Response::new().add_message(relay_msg);
    if let Some(msg) = refund_msg(info.sender.as_str(), refund) {
        response = response.add_message(msg);
    }

    Ok(response
        .add_attribute("action", "request_distribute_earnings")
        .add_attribute("pool_id", pool_id.to_string())
        .add_attribute("nonce", nonce.to_string())
        .add_attribute("request_id", bytes32_to_hex(&request.request_id))
        .add_attribute("buyback_amount", buyback_amount.to_string())
        .add_attribute("revshare_amount", revshare_amount.to_string())
        .add_attribute("slashed_rewards", slashed_rewards.to_string())
        .add_attribute("fee", fee.to_string()))
}

/// Split `received` stablecoin pro rata between buyback and revshare and
/// build the swaps. `slashed_rewards` is the remote chain's forfeited total
/// being absorbed.
#[allow(clippy::too_many_arguments)]
pub(crate) fn distribute_on_home(
    deps: DepsMut,
    env: &Env,
    config: &Config,
    received: Uint128,
    buyback_amount: Uint128,
    revshare_amount: Uint128,
    slashed_rewards: Uint128,
    max_slippage: u16,
) -> Result<Response, ContractError> {
    let declared = buyback_amount.checked_add(revshare_amount)?;
    let buyback_received = received.multiply_ratio(buyback_amount, declared);
    let revshare_received = received.checked_sub(buyback_received)?;

    let stable = AssetInfo::native(config.stablecoin_denom.clone());
    let reward = AssetInfo::cw20(config.reward_token.clone());
    let router = &config.exchange_router;
    let contract = &env.contract.address;
    let mut messages = vec![];

    // Buyback: reward half and pair half, then liquidity to the burn address
    let reward_half = buyback_received.multiply_ratio(1u128, 2u128);
    let pair_half = buyback_received.checked_sub(reward_half)?;
    let mut lp_reward = Uint128::zero();
    let mut lp_pair = Uint128::zero();
    if !reward_half.is_zero() && !pair_half.is_zero() {
        let quoted = quote(&deps.querier, router, stable.clone(), reward.clone(), reward_half)?;
        lp_reward = min_return(quoted, max_slippage);
        messages.push(swap_msg(
            router,
            Coin {
                denom: config.stablecoin_denom.clone(),
                amount: reward_half,
            },
            reward.clone(),
            lp_reward,
            contract,
        )?);

        lp_pair = if config.lp_pair_denom == config.stablecoin_denom {
            pair_half
        } else {
            let pair = AssetInfo::native(config.lp_pair_denom.clone());
            let quoted = quote(&deps.querier, router, stable.clone(), pair.clone(), pair_half)?;
            let minimum = min_return(quoted, max_slippage);
            messages.push(swap_msg(
                router,
                Coin {
                    denom: config.stablecoin_denom.clone(),
                    amount: pair_half,
                },
                pair,
                minimum,
                contract,
            )?);
            minimum
        };

        if !lp_reward.is_zero() && !lp_pair.is_zero() {
            messages.extend(add_liquidity_msgs(
                router,
                &config.reward_token,
                lp_reward,
                Coin {
                    denom: config.lp_pair_denom.clone(),
                    amount: lp_pair,
                },
                &config.burn_address,
            )?);
        }
    }

    // Revshare: straight to the staking vault
    let mut revshare_min = Uint128::zero();
    if !revshare_received.is_zero() {
        let quoted = quote(&deps.querier, router, stable, reward.clone(), revshare_received)?;
        revshare_min = min_return(quoted, max_slippage);
        messages.push(swap_msg(
            router,
            Coin {
                denom: config.stablecoin_denom.clone(),
                amount: revshare_received,
            },
            reward,
            revshare_min,
            &config.staking_vault,
        )?);
    }

    let mut stats = STATS.load(deps.storage)?;
    stats.total_buyback = stats.total_buyback.checked_add(buyback_received)?;
    stats.total_revshare = stats.total_revshare.checked_add(revshare_received)?;
    stats.slashed_rewards_absorbed = stats.slashed_rewards_absorbed.checked_add(slashed_rewards)?;
    STATS.save(deps.storage, &stats)?;

    Ok(Response::new()
        .add_messages(messages)
        .add_attribute("received", received.to_string())
        .add_attribute("buyback", buyback_received.to_string())
        .add_attribute("buyback_lp_reward", lp_reward.to_string())
        .add_attribute("buyback_lp_pair", lp_pair.to_string())
        .add_attribute("revshare", revshare_received.to_string())
        .add_attribute("revshare_min_return", revshare_min.to_string())
        .add_attribute("slashed_rewards_absorbed", slashed_rewards.to_string()))
}
