//! Configuration management handlers.
//!
//! This module handles:
//! - Chain endpoints (set/remove)
//! - Contract configuration, including pause
//! - Emission parameters
//! - Vault fee factors

use cosmwasm_std::{DepsMut, Env, MessageInfo, Response};

use common::vault::VaultExecuteMsg;

use super::pools::vault_msg;
use crate::chain_registry::{remove_endpoint, save_endpoint};
use crate::error::ContractError;
use crate::rewards::{mass_update_pools, validate_rewards_state};
use crate::state::{
    ChainEndpoint, TimeBoost, CONFIG, FEE_FACTOR_MAX, POOLS, REWARDS_STATE, SLIPPAGE_DENOMINATOR,
};

// ============================================================================
// Chain Endpoints
// ============================================================================

/// Register or replace the endpoint for `chain_id`.
#[allow(clippy::too_many_arguments)]
pub fn execute_set_chain_endpoint(
    deps: DepsMut,
    info: MessageInfo,
    chain_id: u64,
    relay_chain_id: u64,
    orchestrator: String,
    is_home: bool,
    gas_budget: u64,
    enabled: bool,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized);
    }

    let endpoint = ChainEndpoint {
        chain_id,
        relay_chain_id,
        orchestrator: orchestrator.clone(),
        is_home,
        gas_budget,
        enabled,
    };
    save_endpoint(deps.storage, &config, &endpoint)?;

    Ok(Response::new()
        .add_attribute("action", "set_chain_endpoint")
        .add_attribute("chain_id", chain_id.to_string())
        .add_attribute("relay_chain_id", relay_chain_id.to_string())
        .add_attribute("orchestrator", orchestrator)
        .add_attribute("enabled", enabled.to_string()))
}

pub fn execute_remove_chain_endpoint(
    deps: DepsMut,
    info: MessageInfo,
    chain_id: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized);
    }

    let removed = remove_endpoint(deps.storage, chain_id)?;

    Ok(Response::new()
        .add_attribute("action", "remove_chain_endpoint")
        .add_attribute("chain_id", chain_id.to_string())
        .add_attribute("relay_chain_id", removed.relay_chain_id.to_string()))
}

// ============================================================================
// Contract Configuration
// ============================================================================

/// Update any subset of the configuration.
#[allow(clippy::too_many_arguments)]
pub fn execute_update_config(
    deps: DepsMut,
    info: MessageInfo,
    paused: Option<bool>,
    relay: Option<String>,
    reward_token: Option<String>,
    public_pool: Option<String>,
    staking_vault: Option<String>,
    exchange_router: Option<String>,
    lp_pair_denom: Option<String>,
    burn_address: Option<String>,
    min_slippage_factor: Option<u16>,
    entrance_fee_factor_min: Option<u64>,
    withdraw_fee_factor_min: Option<u64>,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized);
    }

    if let Some(paused) = paused {
        config.paused = paused;
    }
    if let Some(relay) = relay {
        config.relay = deps.api.addr_validate(&relay)?;
    }
    if let Some(reward_token) = reward_token {
        config.reward_token = deps.api.addr_validate(&reward_token)?;
    }
    if let Some(public_pool) = public_pool {
        config.public_pool = deps.api.addr_validate(&public_pool)?;
    }
    if let Some(staking_vault) = staking_vault {
        config.staking_vault = deps.api.addr_validate(&staking_vault)?;
    }
    if let Some(exchange_router) = exchange_router {
        config.exchange_router = deps.api.addr_validate(&exchange_router)?;
    }
    if let Some(lp_pair_denom) = lp_pair_denom {
        config.lp_pair_denom = lp_pair_denom;
    }
    if let Some(burn_address) = burn_address {
        config.burn_address = deps.api.addr_validate(&burn_address)?;
    }
    if let Some(factor) = min_slippage_factor {
        if factor == 0 || factor > SLIPPAGE_DENOMINATOR {
            return Err(ContractError::InvalidSlippage {
                factor,
                min: 1,
            });
        }
        config.min_slippage_factor = factor;
    }
    if let Some(min) = entrance_fee_factor_min {
        check_fee_factor_floor(min)?;
        config.entrance_fee_factor_min = min;
    }
    if let Some(min) = withdraw_fee_factor_min {
        check_fee_factor_floor(min)?;
        config.withdraw_fee_factor_min = min;
    }

    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "update_config")
        .add_attribute("paused", config.paused.to_string()))
}

fn check_fee_factor_floor(min: u64) -> Result<(), ContractError> {
    if min > FEE_FACTOR_MAX {
        return Err(ContractError::FeeFactorOutOfBounds {
            factor: min,
            min: 0,
            max: FEE_FACTOR_MAX,
        });
    }
    Ok(())
}

// ============================================================================
// Emission Parameters
// ============================================================================

/// Update any subset of the emission parameters.
///
/// Pools are advanced under the old parameters first so past blocks keep the
/// rate they were emitted at.
#[allow(clippy::too_many_arguments)]
pub fn execute_update_rewards_params(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    blocks_per_day: Option<u64>,
    dist_factor_min: Option<u64>,
    dist_factor_max: Option<u64>,
    base_reward_rate: Option<u64>,
    chain_multiplier: Option<u64>,
    start_block: Option<u64>,
    oracle: Option<String>,
    time_boost: Option<TimeBoost>,
    max_weeks_committed: Option<u32>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized);
    }

    let mut rewards = REWARDS_STATE.load(deps.storage)?;
    if let Some(start_block) = start_block {
        if rewards.start_block.is_some() {
            return Err(ContractError::StartBlockImmutable);
        }
        rewards.start_block = Some(start_block);
    }
    if let Some(v) = blocks_per_day {
        rewards.blocks_per_day = v;
    }
    if let Some(v) = dist_factor_min {
        rewards.dist_factor_min = v;
    }
    if let Some(v) = dist_factor_max {
        rewards.dist_factor_max = v;
    }
    if let Some(v) = base_reward_rate {
        rewards.base_reward_rate = v;
    }
    if let Some(v) = chain_multiplier {
        rewards.chain_multiplier = v;
    }
    if let Some(oracle) = oracle {
        rewards.oracle = deps.api.addr_validate(&oracle)?;
    }
    if let Some(boost) = time_boost {
        rewards.time_boost = boost;
    }
    if let Some(v) = max_weeks_committed {
        rewards.max_weeks_committed = v;
    }
    validate_rewards_state(&rewards)?;

    let messages = mass_update_pools(deps.storage, &env, &config)?;
    REWARDS_STATE.save(deps.storage, &rewards)?;

    Ok(Response::new()
        .add_messages(messages)
        .add_attribute("action", "update_rewards_params")
        .add_attribute("dist_factor_min", rewards.dist_factor_min.to_string())
        .add_attribute("dist_factor_max", rewards.dist_factor_max.to_string())
        .add_attribute(
            "start_block",
            rewards
                .start_block
                .map_or_else(|| "none".to_string(), |b| b.to_string()),
        ))
}

// ============================================================================
// Vault Fees
// ============================================================================

/// Push new fee factors to a pool's vault.
///
/// Factors are out of 10000 where 10000 charges nothing, so the configured
/// minimums cap the fee a vault may take.
pub fn execute_set_vault_fees(
    deps: DepsMut,
    info: MessageInfo,
    pool_id: u64,
    entrance_fee_factor: u64,
    withdraw_fee_factor: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized);
    }

    let bounds = [
        (entrance_fee_factor, config.entrance_fee_factor_min),
        (withdraw_fee_factor, config.withdraw_fee_factor_min),
    ];
    for (factor, min) in bounds {
        if factor < min || factor > FEE_FACTOR_MAX {
            return Err(ContractError::FeeFactorOutOfBounds {
                factor,
                min,
                max: FEE_FACTOR_MAX,
            });
        }
    }

    let mut pool = POOLS
        .may_load(deps.storage, pool_id)?
        .ok_or(ContractError::PoolNotFound { pool_id })?;
    pool.entrance_fee_factor = entrance_fee_factor;
    pool.withdraw_fee_factor = withdraw_fee_factor;
    POOLS.save(deps.storage, pool_id, &pool)?;

    let msg = vault_msg(
        &pool,
        &VaultExecuteMsg::SetFeeFactors {
            entrance_fee_factor,
            withdraw_fee_factor,
        },
        vec![],
    )?;

    Ok(Response::new()
        .add_message(msg)
        .add_attribute("action", "set_vault_fees")
        .add_attribute("pool_id", pool_id.to_string())
        .add_attribute("entrance_fee_factor", entrance_fee_factor.to_string())
        .add_attribute("withdraw_fee_factor", withdraw_fee_factor.to_string()))
}
