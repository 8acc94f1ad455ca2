//! Inbound dispatch (relay callbacks).
//!
//! Every delivery walks the same path:
//!
//! ```text
//! received -> authorized -> decoded -> applied -> terminal
//! ```
//!
//! - authorized: the caller is the configured relay and the reported origin
//!   resolves to an enabled endpoint whose orchestrator is the reported sender
//! - decoded: selector and fields parse strictly
//! - applied: exactly one flow runs; the request id must not have been
//!   applied before
//!
//! Any error reverts the whole call, so a rejected delivery leaves no trace
//! in pool or tranche state and the relay keeps the asset.

use cosmwasm_std::{
    to_json_binary, Binary, Coin, CosmosMsg, DepsMut, Env, MessageInfo, Response, Uint128,
    WasmMsg,
};
use cw20::Cw20ExecuteMsg;

use common::vault::VaultExecuteMsg;
use common::{Asset, AssetInfo};

use super::earnings::distribute_on_home;
use super::outgoing::{dispatch_request, take_nonce};
use super::pools::{
    create_tranche, exit_tranche, forfeit_rewards_msg, load_tranche, record_synthetic_burn,
    vault_msg,
};
use crate::chain_registry::authorize_origin;
use crate::codec::{
    decode_request, encode_repatriation_payload, CrossChainRequest, DepositRequest,
    DistributeEarningsRequest, RepatriationRequest, WithdrawalRequest,
};
use crate::error::ContractError;
use crate::fee_estimator::quote_payload;
use crate::hash::{bytes32_to_hex, compute_request_id, keccak256};
use crate::state::{
    withdrawal_key, ChainEndpoint, Config, InboundRequest, RequestKind, RequestStatus, CONFIG,
    INBOUND_REQUESTS, OUTBOUND_REQUESTS, PENDING_WITHDRAWALS, SLIPPAGE_DENOMINATOR, STATS,
};

/// Which relay entry point delivered the payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeliveryChannel {
    Asset,
    MessageOnly,
}

/// Relay callback for both delivery channels
pub fn execute_on_delivery(
    mut deps: DepsMut,
    env: Env,
    info: MessageInfo,
    channel: DeliveryChannel,
    src_chain_id: u64,
    src_address: String,
    payload: Binary,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    // received -> authorized
    if info.sender != config.relay {
        return Err(ContractError::UnauthorizedRelay);
    }
    let origin = authorize_origin(deps.storage, src_chain_id, &src_address)?;

    // authorized -> decoded
    let decoded = decode_request(payload.as_slice())?;
    let kind = decoded.request.kind();
    let expected_channel = match kind {
        RequestKind::Withdrawal => DeliveryChannel::MessageOnly,
        _ => DeliveryChannel::Asset,
    };
    if channel != expected_channel {
        return Err(ContractError::UnexpectedRequest {
            reason: format!("{} request delivered on the wrong channel", kind.as_str()),
        });
    }

    let request_id = compute_request_id(origin.chain_id, payload.as_slice());
    if INBOUND_REQUESTS.has(deps.storage, request_id.as_slice()) {
        return Err(ContractError::DuplicateRequest {
            request_id: bytes32_to_hex(&request_id),
        });
    }

    // decoded -> applied
    let applied = match decoded.request {
        CrossChainRequest::Deposit(request) => {
            let received = delivered_stablecoin(&config, &info.funds)?;
            apply_deposit(deps.branch(), &env, &config, &origin, request, received)?
        }
        CrossChainRequest::Withdrawal(request) => {
            apply_withdrawal(deps.branch(), &env, &config, &origin, request)?
        }
        CrossChainRequest::Repatriation(request) => {
            let received = delivered_stablecoin(&config, &info.funds)?;
            apply_repatriation(deps.branch(), &env, &config, &origin, request, received)?
        }
        CrossChainRequest::DistributeEarnings(request) => {
            let received = delivered_stablecoin(&config, &info.funds)?;
            apply_distribute_earnings(deps.branch(), &env, &config, request, received)?
        }
    };

    // applied -> terminal
    INBOUND_REQUESTS.save(
        deps.storage,
        request_id.as_slice(),
        &InboundRequest {
            request_id,
            kind,
            origin_chain_id: origin.chain_id,
            nonce: decoded.nonce,
            payload_hash: keccak256(payload.as_slice()),
            status: RequestStatus::Delivered,
            applied_at: env.block.time,
        },
    )?;
    let mut stats = STATS.load(deps.storage)?;
    stats.total_inbound_requests += 1;
    STATS.save(deps.storage, &stats)?;

    Ok(applied
        .add_attribute("request_id", bytes32_to_hex(&request_id))
        .add_attribute("origin_chain_id", origin.chain_id.to_string())
        .add_attribute("nonce", decoded.nonce.to_string()))
}

/// The single stablecoin coin delivered with an asset-carrying request
fn delivered_stablecoin(config: &Config, funds: &[Coin]) -> Result<Uint128, ContractError> {
    match funds {
        [coin] if coin.denom == config.stablecoin_denom => Ok(coin.amount),
        [] => Ok(Uint128::zero()),
        _ => Err(ContractError::InvalidFunds {
            reason: format!("expected only {}", config.stablecoin_denom),
        }),
    }
}

fn minimum_received(value: Uint128, max_slippage: u16) -> Uint128 {
    value.multiply_ratio(max_slippage, SLIPPAGE_DENOMINATOR)
}

// ============================================================================
// Deposit
// ============================================================================

fn apply_deposit(
    deps: DepsMut,
    env: &Env,
    config: &Config,
    origin: &ChainEndpoint,
    request: DepositRequest,
    received: Uint128,
) -> Result<Response, ContractError> {
    if config.paused {
        return Err(ContractError::Paused);
    }
    let minimum = minimum_received(request.value, request.max_slippage);
    if received < minimum {
        return Err(ContractError::SlippageExceeded { received, minimum });
    }

    // The tranche is credited from what actually arrived, never the declared value
    let created = create_tranche(
        deps.storage,
        env,
        config,
        request.pool_id,
        request.origin_account.as_slice(),
        received,
        request.weeks_committed,
        origin.chain_id,
        request.dest_account,
    )?;

    let deposit = vault_msg(
        &created.pool,
        &VaultExecuteMsg::DepositWantToken {
            max_slippage: request.max_slippage,
        },
        vec![Coin {
            denom: config.stablecoin_denom.clone(),
            amount: received,
        }],
    )?;

    Ok(Response::new()
        .add_messages(created.messages)
        .add_message(deposit)
        .add_attribute("action", "receive_deposit")
        .add_attribute("pool_id", request.pool_id.to_string())
        .add_attribute("tranche_id", created.tranche_id.to_string())
        .add_attribute("declared_value", request.value.to_string())
        .add_attribute("received", received.to_string())
        .add_attribute("want_amount", created.tranche.want_amount.to_string())
        .add_attribute("contribution", created.tranche.contribution.to_string()))
}

// ============================================================================
// Withdrawal
// ============================================================================

fn apply_withdrawal(
    deps: DepsMut,
    env: &Env,
    config: &Config,
    origin: &ChainEndpoint,
    request: WithdrawalRequest,
) -> Result<Response, ContractError> {
    let pool_id = request.pool_id;
    let tranche_id = request.tranche_id;
    let account = request.origin_account.as_slice();

    if request.origin_chain_id != origin.chain_id {
        return Err(ContractError::UnexpectedRequest {
            reason: format!(
                "withdrawal claims origin {} but was sent from {}",
                request.origin_chain_id, origin.chain_id
            ),
        });
    }
    let tranche = load_tranche(deps.storage, pool_id, account, tranche_id)?;
    if tranche.origin_chain_id != origin.chain_id {
        return Err(ContractError::TrancheOriginMismatch {
            pool_id,
            tranche_id,
            chain_id: origin.chain_id,
        });
    }

    let exit = exit_tranche(
        deps.storage,
        env,
        config,
        pool_id,
        account,
        tranche_id,
        request.max_slippage,
    )?;

    let mut messages = exit.messages;
    messages.push(vault_msg(
        &exit.pool,
        &VaultExecuteMsg::WithdrawWantToken {
            amount: exit.tranche.want_amount,
            max_slippage: request.max_slippage,
            recipient: env.contract.address.to_string(),
        },
        vec![],
    )?);

    // Rewards are paid on the origin chain; release what this chain holds for the tranche
    let held = exit.rewards_due.checked_add(exit.burnable_rewards)?;
    if let Some(msg) = forfeit_rewards_msg(config, held)? {
        messages.push(msg);
    }
    // The origin chain pays and records the split
    record_synthetic_burn(deps.storage, config, held, Uint128::zero())?;

    // Repatriation leg, fee paid from the orchestrator's own gas balance
    let nonce = take_nonce(deps.storage)?;
    let payload = encode_repatriation_payload(
        nonce,
        origin.chain_id,
        pool_id,
        tranche_id,
        account,
        exit.burnable_rewards,
        exit.rewards_due,
    )?;
    let quote = quote_payload(&deps.querier, config, origin, &payload, true)?;
    if !quote.fee.amount.is_zero() {
        let balance = deps
            .querier
            .query_balance(env.contract.address.to_string(), quote.fee.denom.clone())?;
        if balance.amount < quote.fee.amount {
            return Err(ContractError::InsufficientFee {
                expected: quote.fee.amount,
                got: balance.amount,
                denom: quote.fee.denom,
            });
        }
    }

    let asset = Coin {
        denom: config.stablecoin_denom.clone(),
        amount: exit.principal,
    };
    let (outbound, relay_msg) = dispatch_request(
        deps.storage,
        env,
        config,
        origin,
        RequestKind::Repatriation,
        nonce,
        payload,
        Some(asset),
        &quote.fee,
    )?;
    messages.push(relay_msg);

    Ok(Response::new()
        .add_messages(messages)
        .add_attribute("action", "receive_withdrawal")
        .add_attribute("pool_id", pool_id.to_string())
        .add_attribute("tranche_id", tranche_id.to_string())
        .add_attribute("principal", exit.principal.to_string())
        .add_attribute("rewards_due", exit.rewards_due.to_string())
        .add_attribute("burnable_rewards", exit.burnable_rewards.to_string())
        .add_attribute("repatriation_nonce", nonce.to_string())
        .add_attribute(
            "repatriation_request_id",
            bytes32_to_hex(&outbound.request_id),
        ))
}

// ============================================================================
// Repatriation
// ============================================================================

fn apply_repatriation(
    deps: DepsMut,
    env: &Env,
    config: &Config,
    origin: &ChainEndpoint,
    request: RepatriationRequest,
    received: Uint128,
) -> Result<Response, ContractError> {
    if request.origin_chain_id != config.this_chain_id {
        return Err(ContractError::UnexpectedRequest {
            reason: format!(
                "repatriation addressed to chain {}, this is chain {}",
                request.origin_chain_id, config.this_chain_id
            ),
        });
    }
    let recipient = std::str::from_utf8(request.origin_recipient.as_slice())
        .map_err(|_| ContractError::InvalidAddress {
            reason: "recipient is not valid utf-8".to_string(),
        })
        .and_then(|s| deps.api.addr_validate(s).map_err(ContractError::from))?;

    let mut messages: Vec<CosmosMsg> = vec![];
    if !received.is_zero() {
        let principal = Asset::new(AssetInfo::native(config.stablecoin_denom.clone()), received);
        messages.push(principal.transfer_msg(&recipient)?);
    }

    let mut stats = STATS.load(deps.storage)?;
    if !request.rewards_due.is_zero() {
        let pay = if config.is_home_chain() {
            Cw20ExecuteMsg::TransferFrom {
                owner: config.public_pool.to_string(),
                recipient: recipient.to_string(),
                amount: request.rewards_due,
            }
        } else {
            stats.synthetic_rewards_minted = stats
                .synthetic_rewards_minted
                .checked_add(request.rewards_due)?;
            Cw20ExecuteMsg::Mint {
                recipient: recipient.to_string(),
                amount: request.rewards_due,
            }
        };
        messages.push(CosmosMsg::Wasm(WasmMsg::Execute {
            contract_addr: config.reward_token.to_string(),
            msg: to_json_binary(&pay)?,
            funds: vec![],
        }));
    }
    if !config.is_home_chain() {
        stats.synthetic_rewards_slashed = stats
            .synthetic_rewards_slashed
            .checked_add(request.burnable_rewards)?;
    }
    STATS.save(deps.storage, &stats)?;

    // Resolve the withdrawal this repatriation answers
    let key = withdrawal_key(origin.chain_id, request.pool_id, request.tranche_id);
    let pending_key = (request.origin_recipient.as_slice(), key.as_slice());
    let resolved = PENDING_WITHDRAWALS.may_load(deps.storage, pending_key)?;
    if let Some(nonce) = resolved {
        PENDING_WITHDRAWALS.remove(deps.storage, pending_key);
        if let Some(mut outbound) = OUTBOUND_REQUESTS.may_load(deps.storage, nonce)? {
            outbound.status = RequestStatus::Delivered;
            outbound.updated_at = env.block.time;
            OUTBOUND_REQUESTS.save(deps.storage, nonce, &outbound)?;
        }
    }

    Ok(Response::new()
        .add_messages(messages)
        .add_attribute("action", "receive_repatriation")
        .add_attribute("pool_id", request.pool_id.to_string())
        .add_attribute("tranche_id", request.tranche_id.to_string())
        .add_attribute("recipient", recipient)
        .add_attribute("principal", received.to_string())
        .add_attribute("rewards_due", request.rewards_due.to_string())
        .add_attribute("burnable_rewards", request.burnable_rewards.to_string())
        .add_attribute(
            "withdrawal_nonce",
            resolved.map_or_else(|| "none".to_string(), |n| n.to_string()),
        ))
}

// ============================================================================
// Earnings
// ============================================================================

fn apply_distribute_earnings(
    deps: DepsMut,
    env: &Env,
    config: &Config,
    request: DistributeEarningsRequest,
    received: Uint128,
) -> Result<Response, ContractError> {
    if !config.is_home_chain() {
        return Err(ContractError::NotHomeChain);
    }
    let expected = request
        .buyback_amount
        .checked_add(request.revshare_amount)?;
    if expected.is_zero() {
        return Err(ContractError::InvalidAmount {
            reason: "nothing to distribute".to_string(),
        });
    }
    let minimum = minimum_received(expected, request.max_slippage);
    if received < minimum || received.is_zero() {
        return Err(ContractError::SlippageExceeded { received, minimum });
    }

    let distribution = distribute_on_home(
        deps,
        env,
        config,
        received,
        request.buyback_amount,
        request.revshare_amount,
        request.slashed_rewards,
        request.max_slippage,
    )?;

    Ok(distribution
        .add_attribute("action", "receive_distribute_earnings")
        .add_attribute("remote_chain_id", request.remote_chain_id.to_string()))
}
