//! Outgoing request handlers (RequestDeposit and RequestWithdrawal).
//!
//! Also holds the dispatch helpers every outbound flow shares: nonce
//! allocation, the audit record, the relay message and fund accounting.

use cosmwasm_std::{
    to_json_binary, BankMsg, Binary, Coin, CosmosMsg, DepsMut, Env, MessageInfo, Response,
    Storage, Uint128, WasmMsg,
};

use common::relay::RelayExecuteMsg;

use crate::chain_registry::load_enabled_endpoint;
use crate::codec::{encode_deposit_payload, encode_withdrawal_payload};
use crate::error::ContractError;
use crate::fee_estimator::quote_payload;
use crate::hash::{bytes32_to_hex, compute_request_id, keccak256};
use crate::state::{
    withdrawal_key, ChainEndpoint, Config, OutboundRequest, RequestKind, RequestStatus, CONFIG,
    OUTBOUND_NONCE, OUTBOUND_REQUESTS, PENDING_WITHDRAWALS, REWARDS_STATE, SLIPPAGE_DENOMINATOR,
    STATS,
};

// ============================================================================
// Dispatch Helpers
// ============================================================================

/// Reject slippage factors outside `[min_slippage_factor, 1000]`
pub(crate) fn validate_slippage(config: &Config, factor: u16) -> Result<(), ContractError> {
    if factor < config.min_slippage_factor || factor > SLIPPAGE_DENOMINATOR {
        return Err(ContractError::InvalidSlippage {
            factor,
            min: config.min_slippage_factor,
        });
    }
    Ok(())
}

/// Allocate the next outbound nonce
pub(crate) fn take_nonce(storage: &mut dyn Storage) -> Result<u64, ContractError> {
    let nonce = OUTBOUND_NONCE.may_load(storage)?.unwrap_or_default();
    OUTBOUND_NONCE.save(storage, &(nonce + 1))?;
    Ok(nonce)
}

/// Combine coins of the same denom, drop zeros, sort by denom
pub(crate) fn merge_coins(coins: Vec<Coin>) -> Vec<Coin> {
    let mut merged: Vec<Coin> = vec![];
    for coin in coins {
        if coin.amount.is_zero() {
            continue;
        }
        match merged.iter_mut().find(|c| c.denom == coin.denom) {
            Some(existing) => existing.amount += coin.amount,
            None => merged.push(coin),
        }
    }
    merged.sort_by(|a, b| a.denom.cmp(&b.denom));
    merged
}

/// Check the attached funds cover `required` and return what must be refunded.
///
/// Shortfalls in `fee_denom` are reported as `InsufficientFee`; denoms not
/// listed in `required` are rejected.
pub(crate) fn collect_payment(
    funds: &[Coin],
    required: Vec<Coin>,
    fee_denom: &str,
) -> Result<Vec<Coin>, ContractError> {
    let required = merge_coins(required);
    let attached = merge_coins(funds.to_vec());

    for coin in &attached {
        if !required.iter().any(|r| r.denom == coin.denom) {
            return Err(ContractError::InvalidFunds {
                reason: format!("unexpected denom {}", coin.denom),
            });
        }
    }

    let mut refund = vec![];
    for need in required {
        let got = attached
            .iter()
            .find(|c| c.denom == need.denom)
            .map(|c| c.amount)
            .unwrap_or_default();
        if got < need.amount {
            if need.denom == fee_denom {
                return Err(ContractError::InsufficientFee {
                    expected: need.amount,
                    got,
                    denom: need.denom,
                });
            }
            return Err(ContractError::InvalidFunds {
                reason: format!(
                    "expected {}{}, got {}{}",
                    need.amount, need.denom, got, need.denom
                ),
            });
        }
        let excess = got - need.amount;
        if !excess.is_zero() {
            refund.push(Coin {
                denom: need.denom,
                amount: excess,
            });
        }
    }
    Ok(refund)
}

/// Relay message carrying `payload` (and `asset`, if any) to `endpoint`
pub(crate) fn relay_send_msg(
    config: &Config,
    endpoint: &ChainEndpoint,
    payload: Binary,
    asset: Option<&Coin>,
    fee: &Coin,
) -> Result<CosmosMsg, ContractError> {
    let (msg, funds) = match asset {
        Some(asset) => (
            RelayExecuteMsg::SendWithAsset {
                dest_chain_id: endpoint.relay_chain_id,
                dest_address: endpoint.orchestrator.clone(),
                asset: asset.denom.clone(),
                amount: asset.amount,
                payload,
            },
            merge_coins(vec![asset.clone(), fee.clone()]),
        ),
        None => (
            RelayExecuteMsg::SendMessageOnly {
                dest_chain_id: endpoint.relay_chain_id,
                dest_address: endpoint.orchestrator.clone(),
                payload,
                gas_budget: endpoint.gas_budget,
            },
            merge_coins(vec![fee.clone()]),
        ),
    };
    Ok(CosmosMsg::Wasm(WasmMsg::Execute {
        contract_addr: config.relay.to_string(),
        msg: to_json_binary(&msg)?,
        funds,
    }))
}

/// Store the audit record of a new outbound request and build its relay message
#[allow(clippy::too_many_arguments)]
pub(crate) fn dispatch_request(
    storage: &mut dyn Storage,
    env: &Env,
    config: &Config,
    endpoint: &ChainEndpoint,
    kind: RequestKind,
    nonce: u64,
    payload: Binary,
    asset: Option<Coin>,
    fee: &Coin,
) -> Result<(OutboundRequest, CosmosMsg), ContractError> {
    let request = OutboundRequest {
        nonce,
        request_id: compute_request_id(config.this_chain_id, payload.as_slice()),
        kind,
        origin_chain_id: config.this_chain_id,
        dest_chain_id: endpoint.chain_id,
        payload_hash: keccak256(payload.as_slice()),
        payload: payload.clone(),
        asset: asset.clone(),
        status: RequestStatus::Sent,
        created_at: env.block.time,
        updated_at: env.block.time,
    };
    OUTBOUND_REQUESTS.save(storage, nonce, &request)?;

    let mut stats = STATS.load(storage)?;
    stats.total_outbound_requests += 1;
    STATS.save(storage, &stats)?;

    let msg = relay_send_msg(config, endpoint, payload, asset.as_ref(), fee)?;
    Ok((request, msg))
}

pub(crate) fn refund_msg(recipient: &str, refund: Vec<Coin>) -> Option<CosmosMsg> {
    if refund.is_empty() {
        return None;
    }
    Some(CosmosMsg::Bank(BankMsg::Send {
        to_address: recipient.to_string(),
        amount: refund,
    }))
}

// ============================================================================
// RequestDeposit
// ============================================================================

/// Bridge stablecoin into a pool on another chain
#[allow(clippy::too_many_arguments)]
pub fn execute_request_deposit(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    dest_chain_id: u64,
    pool_id: u64,
    value: Uint128,
    weeks_committed: u32,
    max_slippage: u16,
    dest_account: Binary,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if config.paused {
        return Err(ContractError::Paused);
    }
    if dest_chain_id == config.this_chain_id {
        return Err(ContractError::UnexpectedRequest {
            reason: "use Deposit for pools on this chain".to_string(),
        });
    }
    if value.is_zero() {
        return Err(ContractError::InvalidAmount {
            reason: "deposit value must be positive".to_string(),
        });
    }
    validate_slippage(&config, max_slippage)?;

    let rewards = REWARDS_STATE.load(deps.storage)?;
    if weeks_committed > rewards.max_weeks_committed {
        return Err(ContractError::InvalidCommitment {
            weeks: weeks_committed,
            max: rewards.max_weeks_committed,
        });
    }

    let endpoint = load_enabled_endpoint(deps.storage, dest_chain_id)?;
    let nonce = take_nonce(deps.storage)?;
    let payload = encode_deposit_payload(
        nonce,
        pool_id,
        value,
        weeks_committed,
        max_slippage,
        info.sender.as_bytes(),
        dest_account.as_slice(),
    )?;
    let quote = quote_payload(&deps.querier, &config, &endpoint, &payload, true)?;

    let asset = Coin {
        denom: config.stablecoin_denom.clone(),
        amount: value,
    };
    let refund = collect_payment(
        &info.funds,
        vec![asset.clone(), quote.fee.clone()],
        &quote.fee.denom,
    )?;

    let (request, relay_msg) = dispatch_request(
        deps.storage,
        &env,
        &config,
        &endpoint,
        RequestKind::Deposit,
        nonce,
        payload,
        Some(asset),
        &quote.fee,
    )?;

    let mut response = Response::new().add_message(relay_msg);
    if let Some(msg) = refund_msg(info.sender.as_str(), refund) {
        response = response.add_message(msg);
    }

    Ok(response
        .add_attribute("action", "request_deposit")
        .add_attribute("nonce", nonce.to_string())
        .add_attribute("request_id", bytes32_to_hex(&request.request_id))
        .add_attribute("sender", info.sender)
        .add_attribute("dest_chain_id", dest_chain_id.to_string())
        .add_attribute("pool_id", pool_id.to_string())
        .add_attribute("value", value.to_string())
        .add_attribute("weeks_committed", weeks_committed.to_string())
        .add_attribute("max_slippage", max_slippage.to_string())
        .add_attribute("fee", quote.fee.to_string()))
}

// ============================================================================
// RequestWithdrawal
// ============================================================================

/// Ask the chain hosting a tranche to exit it and repatriate the principal
pub fn execute_request_withdrawal(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    dest_chain_id: u64,
    pool_id: u64,
    tranche_id: u64,
    max_slippage: u16,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if dest_chain_id == config.this_chain_id {
        return Err(ContractError::UnexpectedRequest {
            reason: "use Withdraw for pools on this chain".to_string(),
        });
    }
    validate_slippage(&config, max_slippage)?;
    let endpoint = load_enabled_endpoint(deps.storage, dest_chain_id)?;

    let account = info.sender.as_bytes();
    let key = withdrawal_key(dest_chain_id, pool_id, tranche_id);
    if PENDING_WITHDRAWALS.has(deps.storage, (account, key.as_slice())) {
        return Err(ContractError::WithdrawalAlreadyPending {
            pool_id,
            tranche_id,
        });
    }

    let nonce = take_nonce(deps.storage)?;
    let payload = encode_withdrawal_payload(
        nonce,
        config.this_chain_id,
        account,
        pool_id,
        tranche_id,
        max_slippage,
    )?;
    let quote = quote_payload(&deps.querier, &config, &endpoint, &payload, false)?;
    let refund = collect_payment(&info.funds, vec![quote.fee.clone()], &quote.fee.denom)?;

    let (request, relay_msg) = dispatch_request(
        deps.storage,
        &env,
        &config,
        &endpoint,
        RequestKind::Withdrawal,
        nonce,
        payload,
        None,
        &quote.fee,
    )?;
    PENDING_WITHDRAWALS.save(deps.storage, (account, key.as_slice()), &nonce)?;

    let mut response = Response::new().add_message(relay_msg);
    if let Some(msg) = refund_msg(info.sender.as_str(), refund) {
        response = response.add_message(msg);
    }

    Ok(response
        .add_attribute("action", "request_withdrawal")
        .add_attribute("nonce", nonce.to_string())
        .add_attribute("request_id", bytes32_to_hex(&request.request_id))
        .add_attribute("sender", info.sender)
        .add_attribute("dest_chain_id", dest_chain_id.to_string())
        .add_attribute("pool_id", pool_id.to_string())
        .add_attribute("tranche_id", tranche_id.to_string())
        .add_attribute("fee", quote.fee.to_string()))
}
