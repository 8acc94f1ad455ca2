//! Admin operations handlers.
//!
//! This module handles:
//! - Owner transfer (propose/accept/cancel)
//! - Outbound request recovery (mark failed, resend)

use cosmwasm_std::{DepsMut, Env, MessageInfo, Response, Storage};

use super::outgoing::{collect_payment, refund_msg, relay_send_msg};
use crate::chain_registry::load_enabled_endpoint;
use crate::codec::{decode_request, CrossChainRequest};
use crate::error::ContractError;
use crate::fee_estimator::quote_payload;
use crate::hash::bytes32_to_hex;
use crate::state::{
    withdrawal_key, OutboundRequest, PendingOwner, RequestStatus, CONFIG, OUTBOUND_REQUESTS,
    OWNER_TIMELOCK_DURATION, PENDING_OWNER, PENDING_WITHDRAWALS,
};

// ============================================================================
// Owner Transfer
// ============================================================================

/// Propose a new owner (starts timelock).
pub fn execute_propose_owner(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    new_owner: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized);
    }

    let new_owner_addr = deps.api.addr_validate(&new_owner)?;
    let pending = PendingOwner {
        new_address: new_owner_addr.clone(),
        execute_after: env.block.time.plus_seconds(OWNER_TIMELOCK_DURATION),
    };
    PENDING_OWNER.save(deps.storage, &pending)?;

    Ok(Response::new()
        .add_attribute("action", "propose_owner")
        .add_attribute("new_owner", new_owner_addr.to_string())
        .add_attribute("execute_after", pending.execute_after.seconds().to_string()))
}

/// Accept the pending owner role (after timelock).
pub fn execute_accept_owner(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let pending = PENDING_OWNER
        .may_load(deps.storage)?
        .ok_or(ContractError::NoPendingOwner)?;

    if info.sender != pending.new_address {
        return Err(ContractError::UnauthorizedPendingOwner);
    }

    if env.block.time < pending.execute_after {
        let remaining = pending.execute_after.seconds() - env.block.time.seconds();
        return Err(ContractError::TimelockNotExpired {
            remaining_seconds: remaining,
        });
    }

    let mut config = CONFIG.load(deps.storage)?;
    config.owner = pending.new_address.clone();
    CONFIG.save(deps.storage, &config)?;
    PENDING_OWNER.remove(deps.storage);

    Ok(Response::new()
        .add_attribute("action", "accept_owner")
        .add_attribute("new_owner", pending.new_address.to_string()))
}

/// Cancel the pending owner proposal.
pub fn execute_cancel_owner_proposal(
    deps: DepsMut,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized);
    }

    PENDING_OWNER.remove(deps.storage);

    Ok(Response::new().add_attribute("action", "cancel_owner_proposal"))
}

// ============================================================================
// Request Recovery
// ============================================================================

fn load_outbound(storage: &dyn Storage, nonce: u64) -> Result<OutboundRequest, ContractError> {
    OUTBOUND_REQUESTS
        .may_load(storage, nonce)?
        .ok_or(ContractError::RequestNotFound { nonce })
}

/// Pending-withdrawal marker of an outbound withdrawal request.
/// Returns None for every other kind.
fn withdrawal_marker(request: &OutboundRequest) -> Result<Option<WithdrawalMarker>, ContractError> {
    match decode_request(request.payload.as_slice())?.request {
        CrossChainRequest::Withdrawal(w) => Ok(Some(WithdrawalMarker {
            account: w.origin_account.to_vec(),
            key: withdrawal_key(request.dest_chain_id, w.pool_id, w.tranche_id),
            pool_id: w.pool_id,
            tranche_id: w.tranche_id,
        })),
        _ => Ok(None),
    }
}

struct WithdrawalMarker {
    account: Vec<u8>,
    key: [u8; 24],
    pool_id: u64,
    tranche_id: u64,
}

/// Record that the relay will never deliver a request.
///
/// A failed withdrawal frees its tranche for a new `RequestWithdrawal`.
pub fn execute_mark_request_failed(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    nonce: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized);
    }

    let mut request = load_outbound(deps.storage, nonce)?;
    if request.status != RequestStatus::Sent {
        return Err(ContractError::InvalidRequestStatus {
            nonce,
            status: request.status.as_str().to_string(),
        });
    }

    if let Some(w) = withdrawal_marker(&request)? {
        let marker = (w.account.as_slice(), w.key.as_slice());
        if PENDING_WITHDRAWALS.may_load(deps.storage, marker)? == Some(nonce) {
            PENDING_WITHDRAWALS.remove(deps.storage, marker);
        }
    }

    request.status = RequestStatus::Failed;
    request.updated_at = env.block.time;
    OUTBOUND_REQUESTS.save(deps.storage, nonce, &request)?;

    Ok(Response::new()
        .add_attribute("action", "mark_request_failed")
        .add_attribute("nonce", nonce.to_string())
        .add_attribute("request_id", bytes32_to_hex(&request.request_id))
        .add_attribute("kind", request.kind.as_str()))
}

/// Hand an undelivered request to the relay again with its original payload.
///
/// The payload is byte-identical, so the request id is unchanged and the
/// destination still applies it at most once.
pub fn execute_resend_request(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    nonce: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized);
    }

    let mut request = load_outbound(deps.storage, nonce)?;
    if request.status == RequestStatus::Delivered {
        return Err(ContractError::InvalidRequestStatus {
            nonce,
            status: request.status.as_str().to_string(),
        });
    }
    let endpoint = load_enabled_endpoint(deps.storage, request.dest_chain_id)?;

    if let Some(w) = withdrawal_marker(&request)? {
        let marker = (w.account.as_slice(), w.key.as_slice());
        match PENDING_WITHDRAWALS.may_load(deps.storage, marker)? {
            Some(pending) if pending != nonce => {
                return Err(ContractError::WithdrawalAlreadyPending {
                    pool_id: w.pool_id,
                    tranche_id: w.tranche_id,
                });
            }
            Some(_) => {}
            None => PENDING_WITHDRAWALS.save(deps.storage, marker, &nonce)?,
        }
    }

    let fee = quote_payload(
        &deps.querier,
        &config,
        &endpoint,
        &request.payload,
        request.asset.is_some(),
    )?
    .fee;
    let mut required = vec![fee.clone()];
    if let Some(asset) = &request.asset {
        required.push(asset.clone());
    }
    let refund = collect_payment(&info.funds, required, &fee.denom)?;

    let relay_msg = relay_send_msg(
        &config,
        &endpoint,
        request.payload.clone(),
        request.asset.as_ref(),
        &fee,
    )?;

    request.status = RequestStatus::Sent;
    request.updated_at = env.block.time;
    OUTBOUND_REQUESTS.save(deps.storage, nonce, &request)?;

    let mut response = Response::new().add_message(relay_msg);
    if let Some(msg) = refund_msg(info.sender.as_str(), refund) {
        response = response.add_message(msg);
    }

    Ok(response
        .add_attribute("action", "resend_request")
        .add_attribute("nonce", nonce.to_string())
        .add_attribute("request_id", bytes32_to_hex(&request.request_id))
        .add_attribute("kind", request.kind.as_str())
        .add_attribute("fee", fee.to_string()))
}
