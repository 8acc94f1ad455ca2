//! Pool handlers.
//!
//! This module handles:
//! - Pool creation and weighting (owner)
//! - Emission rate updates (oracle)
//! - Pool accrual (anyone)
//! - Local deposit, withdraw and reward claims for accounts on this chain
//!
//! Tranche creation and exit are shared with the inbound deposit and
//! withdrawal flows.

use cosmwasm_std::{
    to_json_binary, Addr, Binary, Coin, CosmosMsg, DepsMut, Env, MessageInfo, Response, Storage,
    Uint128, Uint256, WasmMsg,
};
use cw20::Cw20ExecuteMsg;

use common::vault::VaultExecuteMsg;
use common::{Asset, AssetInfo};

use super::outgoing::{collect_payment, validate_slippage};
use crate::error::ContractError;
use crate::rewards::{
    compute_emission_rate, contribution_for, early_exit_split, mass_update_pools, pending_for,
    time_multiplier, update_pool, EmissionInputs,
};
use crate::state::{
    Config, Pool, Tranche, CONFIG, FEE_FACTOR_MAX, POOLS, POOL_BY_VAULT, POOL_COUNT,
    REWARDS_STATE, SLIPPAGE_DENOMINATOR, STATS, TOTAL_ALLOC_POINT, TRANCHES, TRANCHE_COUNT,
};

// ============================================================================
// Shared Tranche Lifecycle
// ============================================================================

/// A tranche that was just credited
pub(crate) struct NewTranche {
    pub pool: Pool,
    pub tranche_id: u64,
    pub tranche: Tranche,
    /// Emission transfers produced by the pool update
    pub messages: Vec<CosmosMsg>,
}

/// Credit a new tranche with what the vault keeps of `want_amount` after its
/// entrance fee, bringing the pool up to date first
#[allow(clippy::too_many_arguments)]
pub(crate) fn create_tranche(
    storage: &mut dyn Storage,
    env: &Env,
    config: &Config,
    pool_id: u64,
    account: &[u8],
    want_amount: Uint128,
    weeks_committed: u32,
    origin_chain_id: u64,
    dest_account: Binary,
) -> Result<NewTranche, ContractError> {
    if want_amount.is_zero() {
        return Err(ContractError::InvalidAmount {
            reason: "deposit amount must be positive".to_string(),
        });
    }
    let rewards = REWARDS_STATE.load(storage)?;
    if weeks_committed > rewards.max_weeks_committed {
        return Err(ContractError::InvalidCommitment {
            weeks: weeks_committed,
            max: rewards.max_weeks_committed,
        });
    }

    let (mut pool, messages) = update_pool(storage, env, config, pool_id)?;

    let credited = want_amount.multiply_ratio(pool.entrance_fee_factor, FEE_FACTOR_MAX);
    if credited.is_zero() {
        return Err(ContractError::InvalidAmount {
            reason: "deposit amount is consumed by the entrance fee".to_string(),
        });
    }
    let multiplier = time_multiplier(&rewards.time_boost, weeks_committed)?;
    let contribution = contribution_for(credited, multiplier);
    let tranche = Tranche {
        want_amount: credited,
        time_multiplier: multiplier,
        contribution,
        reward_debt: pool.acc_reward_per_unit,
        weeks_committed,
        origin_chain_id,
        dest_account,
        enter_timestamp: env.block.time.seconds(),
        exit_timestamp: 0,
    };

    let tranche_id = TRANCHE_COUNT
        .may_load(storage, (pool_id, account))?
        .unwrap_or_default();
    TRANCHE_COUNT.save(storage, (pool_id, account), &(tranche_id + 1))?;
    TRANCHES.save(storage, (pool_id, account, tranche_id), &tranche)?;

    pool.total_contribution = pool.total_contribution.checked_add(contribution)?;
    POOLS.save(storage, pool_id, &pool)?;

    Ok(NewTranche {
        pool,
        tranche_id,
        tranche,
        messages,
    })
}

/// Outcome of exiting a tranche
pub(crate) struct TrancheExit {
    pub pool: Pool,
    pub tranche: Tranche,
    pub rewards_due: Uint128,
    pub burnable_rewards: Uint128,
    /// Principal the vault returns after its withdrawal fee
    pub principal: Uint128,
    pub messages: Vec<CosmosMsg>,
}

pub(crate) fn load_tranche(
    storage: &dyn Storage,
    pool_id: u64,
    account: &[u8],
    tranche_id: u64,
) -> Result<Tranche, ContractError> {
    TRANCHES
        .may_load(storage, (pool_id, account, tranche_id))?
        .ok_or(ContractError::TrancheNotFound {
            pool_id,
            tranche_id,
        })
}

/// Mark a tranche exited, remove it from the pool total and split its rewards
pub(crate) fn exit_tranche(
    storage: &mut dyn Storage,
    env: &Env,
    config: &Config,
    pool_id: u64,
    account: &[u8],
    tranche_id: u64,
    max_slippage: u16,
) -> Result<TrancheExit, ContractError> {
    let mut tranche = load_tranche(storage, pool_id, account, tranche_id)?;
    if tranche.is_exited() {
        return Err(ContractError::TrancheExited {
            pool_id,
            tranche_id,
        });
    }

    let (mut pool, messages) = update_pool(storage, env, config, pool_id)?;

    let now = env.block.time.seconds();
    let pending = pending_for(&tranche, pool.acc_reward_per_unit)?;
    let (rewards_due, burnable_rewards) = early_exit_split(pending, &tranche, now)?;

    let principal = tranche
        .want_amount
        .multiply_ratio(pool.withdraw_fee_factor, FEE_FACTOR_MAX);
    let minimum = tranche
        .want_amount
        .multiply_ratio(max_slippage, SLIPPAGE_DENOMINATOR);
    if principal < minimum {
        return Err(ContractError::SlippageExceeded {
            received: principal,
            minimum,
        });
    }

    tranche.reward_debt = pool.acc_reward_per_unit;
    tranche.exit_timestamp = now.max(1);
    TRANCHES.save(storage, (pool_id, account, tranche_id), &tranche)?;

    pool.total_contribution = pool.total_contribution.checked_sub(tranche.contribution)?;
    POOLS.save(storage, pool_id, &pool)?;

    Ok(TrancheExit {
        pool,
        tranche,
        rewards_due,
        burnable_rewards,
        principal,
        messages,
    })
}

pub(crate) fn reward_transfer_msg(
    config: &Config,
    recipient: &Addr,
    amount: Uint128,
) -> Result<CosmosMsg, ContractError> {
    let reward = Asset::new(AssetInfo::cw20(config.reward_token.clone()), amount);
    Ok(reward.transfer_msg(recipient)?)
}

/// Dispose of forfeited rewards held by the orchestrator.
/// Home returns them to the public pool, other chains burn them.
pub(crate) fn forfeit_rewards_msg(
    config: &Config,
    amount: Uint128,
) -> Result<Option<CosmosMsg>, ContractError> {
    if amount.is_zero() {
        return Ok(None);
    }
    if config.is_home_chain() {
        return Ok(Some(reward_transfer_msg(config, &config.public_pool, amount)?));
    }
    Ok(Some(CosmosMsg::Wasm(WasmMsg::Execute {
        contract_addr: config.reward_token.to_string(),
        msg: to_json_binary(&Cw20ExecuteMsg::Burn { amount })?,
        funds: vec![],
    })))
}

/// Book synthetic rewards burned on this chain. `burned` leaves the minted
/// total; `slashed` is added to the counter reported home with earnings.
pub(crate) fn record_synthetic_burn(
    storage: &mut dyn Storage,
    config: &Config,
    burned: Uint128,
    slashed: Uint128,
) -> Result<(), ContractError> {
    if config.is_home_chain() || (burned.is_zero() && slashed.is_zero()) {
        return Ok(());
    }
    let mut stats = STATS.load(storage)?;
    // State migrated from schema 1 starts the minted counter at zero
    stats.synthetic_rewards_minted = stats.synthetic_rewards_minted.saturating_sub(burned);
    stats.synthetic_rewards_slashed = stats.synthetic_rewards_slashed.checked_add(slashed)?;
    STATS.save(storage, &stats)?;
    Ok(())
}

pub(crate) fn vault_msg(
    pool: &Pool,
    msg: &VaultExecuteMsg,
    funds: Vec<Coin>,
) -> Result<CosmosMsg, ContractError> {
    Ok(CosmosMsg::Wasm(WasmMsg::Execute {
        contract_addr: pool.vault.to_string(),
        msg: to_json_binary(msg)?,
        funds,
    }))
}

// ============================================================================
// Pool Management
// ============================================================================

/// Register a new pool backed by `vault`
pub fn execute_add_pool(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    alloc_point: u64,
    vault: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized);
    }

    let vault = deps.api.addr_validate(&vault)?;
    if let Some(pool_id) = POOL_BY_VAULT.may_load(deps.storage, &vault)? {
        return Err(ContractError::VaultAlreadyRegistered { pool_id });
    }

    let messages = mass_update_pools(deps.storage, &env, &config)?;

    let rewards = REWARDS_STATE.load(deps.storage)?;
    let pool_id = POOL_COUNT.may_load(deps.storage)?.unwrap_or_default();
    let pool = Pool {
        id: pool_id,
        acc_reward_per_unit: Uint256::zero(),
        last_reward_block: env.block.height.max(rewards.start_block.unwrap_or_default()),
        total_contribution: Uint128::zero(),
        alloc_point,
        vault: vault.clone(),
        entrance_fee_factor: FEE_FACTOR_MAX,
        withdraw_fee_factor: FEE_FACTOR_MAX,
    };
    POOLS.save(deps.storage, pool_id, &pool)?;
    POOL_BY_VAULT.save(deps.storage, &vault, &pool_id)?;
    POOL_COUNT.save(deps.storage, &(pool_id + 1))?;

    let total = TOTAL_ALLOC_POINT.may_load(deps.storage)?.unwrap_or_default();
    TOTAL_ALLOC_POINT.save(deps.storage, &(total + alloc_point))?;

    Ok(Response::new()
        .add_messages(messages)
        .add_attribute("action", "add_pool")
        .add_attribute("pool_id", pool_id.to_string())
        .add_attribute("vault", vault)
        .add_attribute("alloc_point", alloc_point.to_string()))
}

/// Change a pool's emission weight
pub fn execute_set_pool(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    pool_id: u64,
    alloc_point: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized);
    }

    let messages = mass_update_pools(deps.storage, &env, &config)?;

    let mut pool = POOLS
        .may_load(deps.storage, pool_id)?
        .ok_or(ContractError::PoolNotFound { pool_id })?;
    let total = TOTAL_ALLOC_POINT.may_load(deps.storage)?.unwrap_or_default();
    let total = total
        .checked_sub(pool.alloc_point)
        .and_then(|t| t.checked_add(alloc_point))
        .ok_or_else(|| ContractError::InvalidAmount {
            reason: "total allocation point out of range".to_string(),
        })?;

    let previous = pool.alloc_point;
    pool.alloc_point = alloc_point;
    POOLS.save(deps.storage, pool_id, &pool)?;
    TOTAL_ALLOC_POINT.save(deps.storage, &total)?;

    Ok(Response::new()
        .add_messages(messages)
        .add_attribute("action", "set_pool")
        .add_attribute("pool_id", pool_id.to_string())
        .add_attribute("previous_alloc_point", previous.to_string())
        .add_attribute("alloc_point", alloc_point.to_string())
        .add_attribute("total_alloc_point", total.to_string()))
}

pub fn execute_update_pool(
    deps: DepsMut,
    env: Env,
    pool_id: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let (pool, messages) = update_pool(deps.storage, &env, &config, pool_id)?;

    Ok(Response::new()
        .add_messages(messages)
        .add_attribute("action", "update_pool")
        .add_attribute("pool_id", pool_id.to_string())
        .add_attribute("acc_reward_per_unit", pool.acc_reward_per_unit.to_string())
        .add_attribute("last_reward_block", pool.last_reward_block.to_string()))
}

pub fn execute_mass_update_pools(deps: DepsMut, env: Env) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let messages = mass_update_pools(deps.storage, &env, &config)?;

    Ok(Response::new()
        .add_messages(messages)
        .add_attribute("action", "mass_update_pools"))
}

/// Recompute the per-block emission from the oracle's TVL figures.
///
/// Pools are brought up to date first so past blocks keep the old rate.
pub fn execute_set_emission_rate(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    inputs: EmissionInputs,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let mut rewards = REWARDS_STATE.load(deps.storage)?;
    if info.sender != rewards.oracle {
        return Err(ContractError::UnauthorizedOracle);
    }

    let outcome = compute_emission_rate(&rewards, &inputs)?;
    let messages = mass_update_pools(deps.storage, &env, &config)?;

    let previous = rewards.emission_rate;
    rewards.emission_rate = outcome.emission_rate;
    REWARDS_STATE.save(deps.storage, &rewards)?;

    Ok(Response::new()
        .add_messages(messages)
        .add_attribute("action", "set_emission_rate")
        .add_attribute("raw_dist_factor", outcome.raw_dist_factor.to_string())
        .add_attribute("dist_factor", outcome.dist_factor.to_string())
        .add_attribute("previous_emission_rate", previous.to_string())
        .add_attribute("emission_rate", outcome.emission_rate.to_string()))
}

// ============================================================================
// Local Deposit / Withdraw / Claim
// ============================================================================

/// Deposit the attached stablecoin into a pool on this chain
pub fn execute_deposit(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    pool_id: u64,
    weeks_committed: u32,
    max_slippage: u16,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if config.paused {
        return Err(ContractError::Paused);
    }
    validate_slippage(&config, max_slippage)?;

    let amount = info
        .funds
        .iter()
        .find(|c| c.denom == config.stablecoin_denom)
        .map(|c| c.amount)
        .unwrap_or_default();
    let required = Coin {
        denom: config.stablecoin_denom.clone(),
        amount,
    };
    collect_payment(&info.funds, vec![required.clone()], &config.gas_denom)?;

    let account = info.sender.as_bytes();
    let created = create_tranche(
        deps.storage,
        &env,
        &config,
        pool_id,
        account,
        amount,
        weeks_committed,
        config.this_chain_id,
        Binary::from(account),
    )?;

    let deposit = vault_msg(
        &created.pool,
        &VaultExecuteMsg::DepositWantToken { max_slippage },
        vec![required],
    )?;

    Ok(Response::new()
        .add_messages(created.messages)
        .add_message(deposit)
        .add_attribute("action", "deposit")
        .add_attribute("pool_id", pool_id.to_string())
        .add_attribute("account", info.sender)
        .add_attribute("tranche_id", created.tranche_id.to_string())
        .add_attribute("amount", amount.to_string())
        .add_attribute("want_amount", created.tranche.want_amount.to_string())
        .add_attribute("contribution", created.tranche.contribution.to_string())
        .add_attribute("time_multiplier", created.tranche.time_multiplier.to_string()))
}

/// Exit one of the caller's local tranches
pub fn execute_withdraw(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    pool_id: u64,
    tranche_id: u64,
    max_slippage: u16,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    validate_slippage(&config, max_slippage)?;

    let account = info.sender.as_bytes();
    let tranche = load_tranche(deps.storage, pool_id, account, tranche_id)?;
    if tranche.origin_chain_id != config.this_chain_id {
        return Err(ContractError::TrancheOriginMismatch {
            pool_id,
            tranche_id,
            chain_id: config.this_chain_id,
        });
    }

    let exit = exit_tranche(
        deps.storage,
        &env,
        &config,
        pool_id,
        account,
        tranche_id,
        max_slippage,
    )?;

    let mut messages = exit.messages;
    messages.push(vault_msg(
        &exit.pool,
        &VaultExecuteMsg::WithdrawWantToken {
            amount: exit.tranche.want_amount,
            max_slippage,
            recipient: info.sender.to_string(),
        },
        vec![],
    )?);
    if !exit.rewards_due.is_zero() {
        messages.push(reward_transfer_msg(&config, &info.sender, exit.rewards_due)?);
    }
    if let Some(msg) = forfeit_rewards_msg(&config, exit.burnable_rewards)? {
        messages.push(msg);
    }
    record_synthetic_burn(
        deps.storage,
        &config,
        exit.burnable_rewards,
        exit.burnable_rewards,
    )?;

    Ok(Response::new()
        .add_messages(messages)
        .add_attribute("action", "withdraw")
        .add_attribute("pool_id", pool_id.to_string())
        .add_attribute("account", info.sender)
        .add_attribute("tranche_id", tranche_id.to_string())
        .add_attribute("principal", exit.principal.to_string())
        .add_attribute("rewards_due", exit.rewards_due.to_string())
        .add_attribute("burnable_rewards", exit.burnable_rewards.to_string()))
}

/// Pay a tranche's pending rewards to its claim account and sync its debt.
///
/// Before the commitment ends the claim is split like an early exit and the
/// unserved share is forfeited.
pub fn execute_claim_rewards(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    pool_id: u64,
    account: Binary,
    tranche_id: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let mut tranche = load_tranche(deps.storage, pool_id, account.as_slice(), tranche_id)?;
    if tranche.dest_account.as_slice() != info.sender.as_bytes() {
        return Err(ContractError::UnauthorizedTrancheAccess {
            pool_id,
            tranche_id,
        });
    }
    if tranche.is_exited() {
        return Err(ContractError::TrancheExited {
            pool_id,
            tranche_id,
        });
    }

    let (pool, mut messages) = update_pool(deps.storage, &env, &config, pool_id)?;
    let pending = pending_for(&tranche, pool.acc_reward_per_unit)?;
    let (rewards_due, burnable_rewards) =
        early_exit_split(pending, &tranche, env.block.time.seconds())?;
    tranche.reward_debt = pool.acc_reward_per_unit;
    TRANCHES.save(
        deps.storage,
        (pool_id, account.as_slice(), tranche_id),
        &tranche,
    )?;

    if !rewards_due.is_zero() {
        messages.push(reward_transfer_msg(&config, &info.sender, rewards_due)?);
    }
    if let Some(msg) = forfeit_rewards_msg(&config, burnable_rewards)? {
        messages.push(msg);
    }
    record_synthetic_burn(deps.storage, &config, burnable_rewards, burnable_rewards)?;

    Ok(Response::new()
        .add_messages(messages)
        .add_attribute("action", "claim_rewards")
        .add_attribute("pool_id", pool_id.to_string())
        .add_attribute("tranche_id", tranche_id.to_string())
        .add_attribute("recipient", info.sender)
        .add_attribute("amount", rewards_due.to_string())
        .add_attribute("burnable_rewards", burnable_rewards.to_string()))
}
