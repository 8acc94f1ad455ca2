//! Reward emission engine
//!
//! Emission rate policy, pool accrual, pending rewards, the time-commitment
//! multiplier and the early-exit split. The math lives in pure functions so it
//! can be tested without storage; `update_pool` and `mass_update_pools` wrap
//! it with the storage writes and token movements.
//!
//! ## Emission Rate
//!
//! ```text
//! dist  = base_reward_rate * market_tvl * capture_bps / (10000 * protocol_tvl)
//! dist  = clamp(dist, dist_factor_min, dist_factor_max)
//! rate  = dist * public_pool_balance * chain_multiplier
//!         / (10000 * total_chain_multipliers * blocks_per_day)
//! ```
//!
//! All intermediates are computed in 256 bits.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{
    to_json_binary, Addr, CosmosMsg, Env, Order, Storage, Uint128, Uint256, WasmMsg,
};
use cw20::Cw20ExecuteMsg;

use crate::error::ContractError;
use crate::state::{
    Config, Pool, RewardsState, TimeBoost, Tranche, ACC_REWARD_PRECISION, BPS_DENOMINATOR,
    POOLS, REWARDS_STATE, SECONDS_PER_WEEK, STATS, TIME_MULTIPLIER_PRECISION, TOTAL_ALLOC_POINT,
};

// ============================================================================
// Emission Rate
// ============================================================================

/// Oracle inputs to `compute_emission_rate`
#[cw_serde]
pub struct EmissionInputs {
    pub total_chain_multipliers: u64,
    pub total_market_tvl: Uint128,
    pub target_tvl_capture_bps: u64,
    pub total_protocol_tvl: Uint128,
    pub public_pool_balance: Uint128,
}

/// Daily distribution factor (bps) after clamping, and the per-block rate
#[cw_serde]
pub struct EmissionOutcome {
    pub raw_dist_factor: Uint256,
    pub dist_factor: u64,
    pub emission_rate: Uint128,
}

pub fn compute_emission_rate(
    state: &RewardsState,
    inputs: &EmissionInputs,
) -> Result<EmissionOutcome, ContractError> {
    if inputs.total_chain_multipliers == 0 {
        return Err(ContractError::InvalidRewardsParams {
            reason: "total chain multipliers must be positive".to_string(),
        });
    }
    if state.chain_multiplier > inputs.total_chain_multipliers {
        return Err(ContractError::InvalidRewardsParams {
            reason: format!(
                "chain multiplier {} exceeds total {}",
                state.chain_multiplier, inputs.total_chain_multipliers
            ),
        });
    }

    let bps = Uint256::from(BPS_DENOMINATOR);

    // A protocol with nothing deployed is infinitely far below target
    let raw_dist_factor = if inputs.total_protocol_tvl.is_zero() {
        Uint256::MAX
    } else {
        Uint256::from(state.base_reward_rate)
            .checked_mul(Uint256::from(inputs.total_market_tvl))?
            .checked_mul(Uint256::from(inputs.target_tvl_capture_bps))?
            .checked_div(bps.checked_mul(Uint256::from(inputs.total_protocol_tvl))?)?
    };

    let dist_factor =
        clamp_dist_factor(raw_dist_factor, state.dist_factor_min, state.dist_factor_max);

    let denominator = bps
        .checked_mul(Uint256::from(inputs.total_chain_multipliers))?
        .checked_mul(Uint256::from(state.blocks_per_day))?;
    let rate = Uint256::from(dist_factor)
        .checked_mul(Uint256::from(inputs.public_pool_balance))?
        .checked_mul(Uint256::from(state.chain_multiplier))?
        .checked_div(denominator)?;

    Ok(EmissionOutcome {
        raw_dist_factor,
        dist_factor,
        emission_rate: Uint128::try_from(rate)?,
    })
}

/// Saturate a raw factor onto the rails
pub fn clamp_dist_factor(raw: Uint256, min: u64, max: u64) -> u64 {
    if raw < Uint256::from(min) {
        min
    } else if raw > Uint256::from(max) {
        max
    } else {
        // min <= raw <= max, so it fits in u64
        Uint128::try_from(raw).map_or(max, |v| v.u128() as u64)
    }
}

// ============================================================================
// Pool Accrual
// ============================================================================

/// Result of advancing a pool's accumulator
#[derive(Debug, Clone, PartialEq)]
pub struct Accrual {
    pub acc_reward_per_unit: Uint256,
    /// Reward tokens attributed to the pool over the elapsed blocks
    pub reward: Uint128,
}

/// First block of the window still to be accounted for
fn accrual_start(pool: &Pool, start_block: Option<u64>) -> u64 {
    match start_block {
        Some(start) => pool.last_reward_block.max(start),
        None => pool.last_reward_block,
    }
}

/// Accumulator as of `current_block`, without writing anything
pub fn accrue(
    pool: &Pool,
    rewards: &RewardsState,
    total_alloc_point: u64,
    current_block: u64,
) -> Result<Accrual, ContractError> {
    let elapsed = current_block.saturating_sub(accrual_start(pool, rewards.start_block));
    if elapsed == 0 || pool.total_contribution.is_zero() || total_alloc_point == 0 {
        return Ok(Accrual {
            acc_reward_per_unit: pool.acc_reward_per_unit,
            reward: Uint128::zero(),
        });
    }

    let reward = Uint256::from(elapsed)
        .checked_mul(Uint256::from(rewards.emission_rate))?
        .checked_mul(Uint256::from(pool.alloc_point))?
        .checked_div(Uint256::from(total_alloc_point))?;

    let increment = reward
        .checked_mul(Uint256::from(ACC_REWARD_PRECISION))?
        .checked_div(Uint256::from(pool.total_contribution))?;

    Ok(Accrual {
        acc_reward_per_unit: pool.acc_reward_per_unit.checked_add(increment)?,
        reward: Uint128::try_from(reward)?,
    })
}

/// Reward owed to a tranche at accumulator value `acc`
pub fn pending_for(tranche: &Tranche, acc: Uint256) -> Result<Uint128, ContractError> {
    if tranche.is_exited() || acc <= tranche.reward_debt {
        return Ok(Uint128::zero());
    }
    let owed = acc
        .checked_sub(tranche.reward_debt)?
        .checked_mul(Uint256::from(tranche.contribution))?
        .checked_div(Uint256::from(ACC_REWARD_PRECISION))?;
    Ok(Uint128::try_from(owed)?)
}

// ============================================================================
// Time Multiplier
// ============================================================================

/// Integer square root (Newton's method)
pub fn isqrt(value: u128) -> u128 {
    if value < 2 {
        return value;
    }
    let mut x = value;
    let mut y = value / 2 + value % 2;
    while y < x {
        x = y;
        y = (x + value / x) / 2;
    }
    x
}

/// `PRECISION * (1 + coefficient * sqrt(weeks))`, or `PRECISION` when the boost is off
pub fn time_multiplier(boost: &TimeBoost, weeks_committed: u32) -> Result<Uint128, ContractError> {
    let precision = Uint128::new(TIME_MULTIPLIER_PRECISION);
    if !boost.enabled {
        return Ok(precision);
    }
    // u32::MAX * 1e24 stays well inside u128
    let scaled_weeks =
        weeks_committed as u128 * TIME_MULTIPLIER_PRECISION * TIME_MULTIPLIER_PRECISION;
    let sqrt_weeks = Uint128::new(isqrt(scaled_weeks));
    let boost_part = sqrt_weeks.multiply_ratio(boost.coefficient_bps, BPS_DENOMINATOR);
    Ok(precision.checked_add(boost_part)?)
}

/// Boosted units credited for `want_amount`
pub fn contribution_for(want_amount: Uint128, multiplier: Uint128) -> Uint128 {
    want_amount.multiply_ratio(multiplier, TIME_MULTIPLIER_PRECISION)
}

// ============================================================================
// Early Exit
// ============================================================================

/// `(rewards_due, burnable_rewards)` for a tranche exiting at `now` (seconds).
/// Leaving before the commitment ends forfeits the unserved share.
pub fn early_exit_split(
    pending: Uint128,
    tranche: &Tranche,
    now: u64,
) -> Result<(Uint128, Uint128), ContractError> {
    let committed = (tranche.weeks_committed as u64).saturating_mul(SECONDS_PER_WEEK);
    let commitment_end = tranche.enter_timestamp.saturating_add(committed);
    if committed == 0 || now >= commitment_end || pending.is_zero() {
        return Ok((pending, Uint128::zero()));
    }
    let remaining = commitment_end - now;
    let burnable = pending.multiply_ratio(remaining, committed);
    Ok((pending.checked_sub(burnable)?, burnable))
}

// ============================================================================
// Parameter Validation
// ============================================================================

/// Reject emission parameters the engine cannot work with
pub fn validate_rewards_state(rewards: &RewardsState) -> Result<(), ContractError> {
    let invalid = |reason: &str| {
        Err(ContractError::InvalidRewardsParams {
            reason: reason.to_string(),
        })
    };
    if rewards.blocks_per_day == 0 {
        return invalid("blocks_per_day must be positive");
    }
    if rewards.chain_multiplier == 0 {
        return invalid("chain_multiplier must be positive");
    }
    if rewards.dist_factor_min > rewards.dist_factor_max {
        return invalid("dist_factor_min exceeds dist_factor_max");
    }
    if u128::from(rewards.dist_factor_max) > BPS_DENOMINATOR {
        return invalid("dist_factor_max exceeds 10000");
    }
    if rewards.time_boost.enabled
        && (rewards.time_boost.coefficient_bps == 0
            || u128::from(rewards.time_boost.coefficient_bps) > BPS_DENOMINATOR)
    {
        return invalid("time boost coefficient must be in (0, 10000]");
    }
    Ok(())
}

// ============================================================================
// Storage Wrappers
// ============================================================================

/// Message moving `amount` of freshly emitted rewards into the orchestrator.
/// Home draws on the public pool allowance, other chains mint.
pub fn emission_msg(
    config: &Config,
    contract: &Addr,
    amount: Uint128,
) -> Result<CosmosMsg, ContractError> {
    let msg = if config.is_home_chain() {
        Cw20ExecuteMsg::TransferFrom {
            owner: config.public_pool.to_string(),
            recipient: contract.to_string(),
            amount,
        }
    } else {
        Cw20ExecuteMsg::Mint {
            recipient: contract.to_string(),
            amount,
        }
    };
    Ok(CosmosMsg::Wasm(WasmMsg::Execute {
        contract_addr: config.reward_token.to_string(),
        msg: to_json_binary(&msg)?,
        funds: vec![],
    }))
}

/// Advance one pool to the current block and collect its emission
pub fn update_pool(
    storage: &mut dyn Storage,
    env: &Env,
    config: &Config,
    pool_id: u64,
) -> Result<(Pool, Vec<CosmosMsg>), ContractError> {
    let mut pool = POOLS
        .may_load(storage, pool_id)?
        .ok_or(ContractError::PoolNotFound { pool_id })?;
    let messages = advance_pool(storage, env, config, &mut pool)?;
    Ok((pool, messages))
}

/// Advance every pool; run before any weight change
pub fn mass_update_pools(
    storage: &mut dyn Storage,
    env: &Env,
    config: &Config,
) -> Result<Vec<CosmosMsg>, ContractError> {
    let pools = POOLS
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, pool)| pool))
        .collect::<Result<Vec<_>, _>>()?;

    let mut messages = vec![];
    for mut pool in pools {
        messages.extend(advance_pool(storage, env, config, &mut pool)?);
    }
    Ok(messages)
}

fn advance_pool(
    storage: &mut dyn Storage,
    env: &Env,
    config: &Config,
    pool: &mut Pool,
) -> Result<Vec<CosmosMsg>, ContractError> {
    let current_block = env.block.height;
    if current_block <= pool.last_reward_block {
        return Ok(vec![]);
    }

    let rewards = REWARDS_STATE.load(storage)?;
    let total_alloc_point = TOTAL_ALLOC_POINT.may_load(storage)?.unwrap_or_default();
    let accrual = accrue(pool, &rewards, total_alloc_point, current_block)?;

    pool.acc_reward_per_unit = accrual.acc_reward_per_unit;
    pool.last_reward_block = current_block;
    POOLS.save(storage, pool.id, pool)?;

    if accrual.reward.is_zero() {
        return Ok(vec![]);
    }

    if !config.is_home_chain() {
        let mut stats = STATS.load(storage)?;
        stats.synthetic_rewards_minted =
            stats.synthetic_rewards_minted.checked_add(accrual.reward)?;
        STATS.save(storage, &stats)?;
    }

    Ok(vec![emission_msg(config, &env.contract.address, accrual.reward)?])
}
