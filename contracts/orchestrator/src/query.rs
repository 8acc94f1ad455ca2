//! Query handlers for the Zorro orchestrator contract.
//!
//! This module contains all query message handlers for retrieving contract state.

use cosmwasm_std::{Binary, Deps, Env, Order, StdError, StdResult, Uint128, Uint256};
use cw_storage_plus::Bound;

use crate::chain_registry::load_endpoint;
use crate::error::ContractError;
use crate::fee_estimator::{
    check_deposit_fee, check_distribute_earnings_fee, check_repatriation_fee,
    check_withdrawal_fee, FeeQuote,
};
use crate::hash::{bytes32_from_slice, bytes32_to_hex};
use crate::msg::{
    ChainsResponse, FeeQuoteResponse, InboundRequestResponse, OutboundRequestResponse,
    OutboundRequestsResponse, PendingOwnerResponse, PendingRewardsResponse, PoolsResponse,
    TimeMultiplierResponse, TrancheResponse, TranchesResponse,
};
use crate::rewards::{accrue, pending_for, time_multiplier};
use crate::state::{
    ChainEndpoint, Config, OutboundRequest, Pool, RewardsState, Stats, CHAIN_ENDPOINTS, CONFIG,
    INBOUND_REQUESTS, OUTBOUND_REQUESTS, PENDING_OWNER, POOLS, REWARDS_STATE, STATS,
    TOTAL_ALLOC_POINT, TRANCHES,
};

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 50;

fn std_err(err: ContractError) -> StdError {
    match err {
        ContractError::Std(e) => e,
        other => StdError::generic_err(other.to_string()),
    }
}

fn page_limit(limit: Option<u32>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize
}

// ============================================================================
// Core Queries
// ============================================================================

pub fn query_config(deps: Deps) -> StdResult<Config> {
    CONFIG.load(deps.storage)
}

pub fn query_pending_owner(deps: Deps) -> StdResult<Option<PendingOwnerResponse>> {
    let pending = PENDING_OWNER.may_load(deps.storage)?;
    Ok(pending.map(|p| PendingOwnerResponse {
        new_address: p.new_address,
        execute_after: p.execute_after,
    }))
}

pub fn query_rewards_state(deps: Deps) -> StdResult<RewardsState> {
    REWARDS_STATE.load(deps.storage)
}

pub fn query_stats(deps: Deps) -> StdResult<Stats> {
    Ok(STATS.may_load(deps.storage)?.unwrap_or_default())
}

// ============================================================================
// Chain Queries
// ============================================================================

pub fn query_chain(deps: Deps, chain_id: u64) -> StdResult<ChainEndpoint> {
    load_endpoint(deps.storage, chain_id).map_err(std_err)
}

pub fn query_chains(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<ChainsResponse> {
    let limit = page_limit(limit);
    let start = start_after.map(Bound::exclusive);

    let chains = CHAIN_ENDPOINTS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, endpoint)| endpoint))
        .collect::<StdResult<Vec<_>>>()?;

    Ok(ChainsResponse { chains })
}

// ============================================================================
// Pool & Tranche Queries
// ============================================================================

fn load_pool(deps: Deps, pool_id: u64) -> StdResult<Pool> {
    POOLS
        .may_load(deps.storage, pool_id)?
        .ok_or_else(|| std_err(ContractError::PoolNotFound { pool_id }))
}

/// Pool accumulator advanced to the current block without writing it back
fn current_acc(deps: Deps, env: &Env, pool: &Pool) -> StdResult<Uint256> {
    let rewards = REWARDS_STATE.load(deps.storage)?;
    let total_alloc_point = TOTAL_ALLOC_POINT.may_load(deps.storage)?.unwrap_or_default();
    let accrual = accrue(pool, &rewards, total_alloc_point, env.block.height).map_err(std_err)?;
    Ok(accrual.acc_reward_per_unit)
}

pub fn query_pool(deps: Deps, pool_id: u64) -> StdResult<Pool> {
    load_pool(deps, pool_id)
}

pub fn query_pools(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<PoolsResponse> {
    let limit = page_limit(limit);
    let start = start_after.map(Bound::exclusive);

    let pools = POOLS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, pool)| pool))
        .collect::<StdResult<Vec<_>>>()?;

    Ok(PoolsResponse {
        pools,
        total_alloc_point: TOTAL_ALLOC_POINT.may_load(deps.storage)?.unwrap_or_default(),
    })
}

pub fn query_tranche(
    deps: Deps,
    env: Env,
    pool_id: u64,
    account: Binary,
    tranche_id: u64,
) -> StdResult<TrancheResponse> {
    let pool = load_pool(deps, pool_id)?;
    let tranche = TRANCHES
        .may_load(deps.storage, (pool_id, account.as_slice(), tranche_id))?
        .ok_or_else(|| {
            std_err(ContractError::TrancheNotFound {
                pool_id,
                tranche_id,
            })
        })?;
    let acc = current_acc(deps, &env, &pool)?;
    let pending_rewards = pending_for(&tranche, acc).map_err(std_err)?;

    Ok(TrancheResponse {
        pool_id,
        account,
        tranche_id,
        tranche,
        pending_rewards,
    })
}

pub fn query_tranches(
    deps: Deps,
    env: Env,
    pool_id: u64,
    account: Binary,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<TranchesResponse> {
    let pool = load_pool(deps, pool_id)?;
    let acc = current_acc(deps, &env, &pool)?;
    let limit = page_limit(limit);
    let start = start_after.map(Bound::exclusive);

    let tranches = TRANCHES
        .prefix((pool_id, account.as_slice()))
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| {
            let (tranche_id, tranche) = item?;
            let pending_rewards = pending_for(&tranche, acc).map_err(std_err)?;
            Ok(TrancheResponse {
                pool_id,
                account: account.clone(),
                tranche_id,
                tranche,
                pending_rewards,
            })
        })
        .collect::<StdResult<Vec<_>>>()?;

    Ok(TranchesResponse { tranches })
}

/// Rewards claimable now, as if the pool were updated in this block
pub fn query_pending_rewards(
    deps: Deps,
    env: Env,
    pool_id: u64,
    account: Binary,
    tranche_id: Option<u64>,
) -> StdResult<PendingRewardsResponse> {
    let pool = load_pool(deps, pool_id)?;
    let acc = current_acc(deps, &env, &pool)?;

    let pending = match tranche_id {
        Some(tranche_id) => {
            let tranche = TRANCHES
                .may_load(deps.storage, (pool_id, account.as_slice(), tranche_id))?
                .ok_or_else(|| {
                    std_err(ContractError::TrancheNotFound {
                        pool_id,
                        tranche_id,
                    })
                })?;
            pending_for(&tranche, acc).map_err(std_err)?
        }
        None => TRANCHES
            .prefix((pool_id, account.as_slice()))
            .range(deps.storage, None, None, Order::Ascending)
            .try_fold(Uint128::zero(), |total, item| -> StdResult<Uint128> {
                let (_, tranche) = item?;
                let pending = pending_for(&tranche, acc).map_err(std_err)?;
                Ok(total.checked_add(pending)?)
            })?,
    };

    Ok(PendingRewardsResponse {
        pending,
        acc_reward_per_unit: acc,
    })
}

pub fn query_time_multiplier(
    deps: Deps,
    weeks_committed: u32,
) -> StdResult<TimeMultiplierResponse> {
    let rewards = REWARDS_STATE.load(deps.storage)?;
    let multiplier = time_multiplier(&rewards.time_boost, weeks_committed).map_err(std_err)?;
    Ok(TimeMultiplierResponse {
        weeks_committed,
        multiplier,
    })
}

// ============================================================================
// Fee Queries
// ============================================================================

fn fee_response(quote: Result<FeeQuote, ContractError>) -> StdResult<FeeQuoteResponse> {
    let quote = quote.map_err(std_err)?;
    Ok(FeeQuoteResponse {
        fee: quote.fee,
        payload_len: quote.payload_len,
    })
}

#[allow(clippy::too_many_arguments)]
pub fn query_check_deposit_fee(
    deps: Deps,
    depositor: String,
    dest_chain_id: u64,
    pool_id: u64,
    value: Uint128,
    weeks_committed: u32,
    max_slippage: u16,
    dest_account: Binary,
) -> StdResult<FeeQuoteResponse> {
    let depositor = deps.api.addr_validate(&depositor)?;
    fee_response(check_deposit_fee(
        deps,
        dest_chain_id,
        depositor.as_bytes(),
        pool_id,
        value,
        weeks_committed,
        max_slippage,
        dest_account.as_slice(),
    ))
}

pub fn query_check_withdrawal_fee(
    deps: Deps,
    withdrawer: String,
    dest_chain_id: u64,
    pool_id: u64,
    tranche_id: u64,
    max_slippage: u16,
) -> StdResult<FeeQuoteResponse> {
    let withdrawer = deps.api.addr_validate(&withdrawer)?;
    fee_response(check_withdrawal_fee(
        deps,
        dest_chain_id,
        withdrawer.as_bytes(),
        pool_id,
        tranche_id,
        max_slippage,
    ))
}

pub fn query_check_repatriation_fee(
    deps: Deps,
    origin_chain_id: u64,
    pool_id: u64,
    tranche_id: u64,
    origin_recipient: Binary,
    burnable_rewards: Uint128,
    rewards_due: Uint128,
) -> StdResult<FeeQuoteResponse> {
    fee_response(check_repatriation_fee(
        deps,
        origin_chain_id,
        pool_id,
        tranche_id,
        origin_recipient.as_slice(),
        burnable_rewards,
        rewards_due,
    ))
}

pub fn query_check_distribute_earnings_fee(
    deps: Deps,
    buyback_amount: Uint128,
    revshare_amount: Uint128,
    max_slippage: u16,
) -> StdResult<FeeQuoteResponse> {
    fee_response(check_distribute_earnings_fee(
        deps,
        buyback_amount,
        revshare_amount,
        max_slippage,
    ))
}

// ============================================================================
// Request Audit Queries
// ============================================================================

fn outbound_response(request: OutboundRequest) -> OutboundRequestResponse {
    OutboundRequestResponse {
        nonce: request.nonce,
        request_id: bytes32_to_hex(&request.request_id),
        kind: request.kind,
        origin_chain_id: request.origin_chain_id,
        dest_chain_id: request.dest_chain_id,
        payload: request.payload,
        payload_hash: bytes32_to_hex(&request.payload_hash),
        asset: request.asset,
        status: request.status,
        created_at: request.created_at,
        updated_at: request.updated_at,
    }
}

pub fn query_outbound_request(deps: Deps, nonce: u64) -> StdResult<OutboundRequestResponse> {
    let request = OUTBOUND_REQUESTS
        .may_load(deps.storage, nonce)?
        .ok_or_else(|| std_err(ContractError::RequestNotFound { nonce }))?;
    Ok(outbound_response(request))
}

pub fn query_outbound_requests(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<OutboundRequestsResponse> {
    let limit = page_limit(limit);
    let start = start_after.map(Bound::exclusive);

    let requests = OUTBOUND_REQUESTS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, request)| outbound_response(request)))
        .collect::<StdResult<Vec<_>>>()?;

    Ok(OutboundRequestsResponse { requests })
}

pub fn query_inbound_request(deps: Deps, request_id: Binary) -> StdResult<InboundRequestResponse> {
    let id = bytes32_from_slice(request_id.as_slice())
        .ok_or_else(|| StdError::generic_err("request_id must be 32 bytes"))?;
    let request = INBOUND_REQUESTS
        .may_load(deps.storage, id.as_slice())?
        .ok_or_else(|| StdError::not_found("InboundRequest"))?;

    Ok(InboundRequestResponse {
        request_id: bytes32_to_hex(&request.request_id),
        kind: request.kind,
        origin_chain_id: request.origin_chain_id,
        nonce: request.nonce,
        payload_hash: bytes32_to_hex(&request.payload_hash),
        status: request.status,
        applied_at: request.applied_at,
    })
}
