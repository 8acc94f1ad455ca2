//! Owner handover, request recovery, configuration updates and migration.

mod common;

use cosmwasm_std::{coin, Binary, Coin, Uint128};
use cw_multi_test::{AppResponse, Executor};

use common::{attr, setup, Suite, GAS, HOME_CHAIN, STABLE};
use orchestrator::msg::{
    ExecuteMsg, FeeQuoteResponse, MigrateMsg, OutboundRequestResponse, PendingOwnerResponse,
    QueryMsg,
};
use orchestrator::state::{Config, Pool, RequestStatus};

fn update_config(
    suite: &mut Suite,
    paused: Option<bool>,
    min_slippage_factor: Option<u16>,
) -> anyhow::Result<AppResponse> {
    let owner = suite.owner.clone();
    let contract = suite.remote.orchestrator.clone();
    suite.app.execute_contract(
        owner,
        contract,
        &ExecuteMsg::UpdateConfig {
            paused,
            relay: None,
            reward_token: None,
            public_pool: None,
            staking_vault: None,
            exchange_router: None,
            lp_pair_denom: None,
            burn_address: None,
            min_slippage_factor,
            entrance_fee_factor_min: None,
            withdraw_fee_factor_min: None,
        },
        &[],
    )
}

fn outbound(suite: &Suite, nonce: u64) -> OutboundRequestResponse {
    suite.query(
        &suite.remote.orchestrator,
        &QueryMsg::OutboundRequest { nonce },
    )
}

fn resend(suite: &mut Suite, nonce: u64, funds: &[Coin]) -> anyhow::Result<AppResponse> {
    let owner = suite.owner.clone();
    let contract = suite.remote.orchestrator.clone();
    suite
        .app
        .execute_contract(owner, contract, &ExecuteMsg::ResendRequest { nonce }, funds)
}

// ============================================================================
// Owner Handover
// ============================================================================

#[test]
fn test_owner_handover_timelock() {
    let mut suite = setup();
    let orchestrator = suite.home.orchestrator.clone();
    let new_owner = suite.user.clone();

    let err = suite
        .app
        .execute_contract(
            new_owner.clone(),
            orchestrator.clone(),
            &ExecuteMsg::ProposeOwner {
                new_owner: new_owner.to_string(),
            },
            &[],
        )
        .unwrap_err();
    let err_str = err.root_cause().to_string();
    assert!(err_str.contains("only owner"), "{}", err_str);

    suite
        .app
        .execute_contract(
            suite.owner.clone(),
            orchestrator.clone(),
            &ExecuteMsg::ProposeOwner {
                new_owner: new_owner.to_string(),
            },
            &[],
        )
        .unwrap();
    let pending: Option<PendingOwnerResponse> =
        suite.query(&orchestrator, &QueryMsg::PendingOwner {});
    assert_eq!(pending.unwrap().new_address, new_owner);

    let err = suite
        .app
        .execute_contract(
            new_owner.clone(),
            orchestrator.clone(),
            &ExecuteMsg::AcceptOwner {},
            &[],
        )
        .unwrap_err();
    let err_str = err.root_cause().to_string();
    assert!(err_str.contains("Timelock not expired"), "{}", err_str);

    let err = suite
        .app
        .execute_contract(
            suite.owner.clone(),
            orchestrator.clone(),
            &ExecuteMsg::AcceptOwner {},
            &[],
        )
        .unwrap_err();
    let err_str = err.root_cause().to_string();
    assert!(err_str.contains("only pending owner"), "{}", err_str);

    suite.advance_seconds(7 * 24 * 60 * 60);
    suite
        .app
        .execute_contract(
            new_owner.clone(),
            orchestrator.clone(),
            &ExecuteMsg::AcceptOwner {},
            &[],
        )
        .unwrap();

    let config: Config = suite.query(&orchestrator, &QueryMsg::Config {});
    assert_eq!(config.owner, new_owner);
    let pending: Option<PendingOwnerResponse> =
        suite.query(&orchestrator, &QueryMsg::PendingOwner {});
    assert!(pending.is_none());
}

#[test]
fn test_owner_proposal_cancel() {
    let mut suite = setup();
    let orchestrator = suite.home.orchestrator.clone();

    suite
        .app
        .execute_contract(
            suite.owner.clone(),
            orchestrator.clone(),
            &ExecuteMsg::ProposeOwner {
                new_owner: suite.user.to_string(),
            },
            &[],
        )
        .unwrap();
    suite
        .app
        .execute_contract(
            suite.owner.clone(),
            orchestrator.clone(),
            &ExecuteMsg::CancelOwnerProposal {},
            &[],
        )
        .unwrap();

    suite.advance_seconds(7 * 24 * 60 * 60);
    let err = suite
        .app
        .execute_contract(
            suite.user.clone(),
            orchestrator,
            &ExecuteMsg::AcceptOwner {},
            &[],
        )
        .unwrap_err();
    let err_str = err.root_cause().to_string();
    assert!(err_str.contains("No pending owner"), "{}", err_str);
}

// ============================================================================
// Request Recovery
// ============================================================================

#[test]
fn test_mark_failed_releases_withdrawal() {
    let mut suite = setup();
    suite.request_deposit(1_000, 990, 0).unwrap();
    suite.deliver(0, 0).unwrap();
    suite.request_withdrawal(0, 990).unwrap();

    let err = suite
        .app
        .execute_contract(
            suite.user.clone(),
            suite.remote.orchestrator.clone(),
            &ExecuteMsg::MarkRequestFailed { nonce: 1 },
            &[],
        )
        .unwrap_err();
    let err_str = err.root_cause().to_string();
    assert!(err_str.contains("only owner"), "{}", err_str);

    let res = suite
        .app
        .execute_contract(
            suite.owner.clone(),
            suite.remote.orchestrator.clone(),
            &ExecuteMsg::MarkRequestFailed { nonce: 1 },
            &[],
        )
        .unwrap();
    assert_eq!(attr(&res, "kind").unwrap(), "withdrawal");
    assert_eq!(outbound(&suite, 1).status, RequestStatus::Failed);

    // Already failed
    let err = suite
        .app
        .execute_contract(
            suite.owner.clone(),
            suite.remote.orchestrator.clone(),
            &ExecuteMsg::MarkRequestFailed { nonce: 1 },
            &[],
        )
        .unwrap_err();
    let err_str = err.root_cause().to_string();
    assert!(err_str.contains("cannot transition from failed"), "{}", err_str);

    // The tranche can be asked for again
    suite.request_withdrawal(0, 990).unwrap();

    let err = suite
        .app
        .execute_contract(
            suite.owner.clone(),
            suite.remote.orchestrator.clone(),
            &ExecuteMsg::MarkRequestFailed { nonce: 99 },
            &[],
        )
        .unwrap_err();
    let err_str = err.root_cause().to_string();
    assert!(err_str.contains("Request not found: nonce 99"), "{}", err_str);
}

#[test]
fn test_resend_reuses_payload_and_applies_once() {
    let mut suite = setup();
    suite.request_deposit(1_000, 990, 0).unwrap();
    let original = outbound(&suite, 0);

    let quote: FeeQuoteResponse = suite.query(
        &suite.remote.orchestrator,
        &QueryMsg::CheckDepositFee {
            depositor: suite.user.to_string(),
            dest_chain_id: HOME_CHAIN,
            pool_id: 0,
            value: Uint128::new(1_000),
            weeks_committed: 0,
            max_slippage: 990,
            dest_account: Binary::from(suite.user.as_bytes()),
        },
    );

    // The asset has to come with the resend
    let err = resend(&mut suite, 0, &[quote.fee.clone()]).unwrap_err();
    let err_str = err.root_cause().to_string();
    assert!(err_str.contains("Invalid funds"), "{}", err_str);

    let res = resend(&mut suite, 0, &[quote.fee, coin(1_000, STABLE)]).unwrap();
    assert_eq!(attr(&res, "action").unwrap(), "resend_request");
    assert_eq!(attr(&res, "request_id").unwrap(), original.request_id);
    let send_id: u64 = attr(&res, "send_id").unwrap().parse().unwrap();
    assert_eq!(send_id, 1);
    assert_eq!(suite.envelope(1).payload, original.payload);

    suite.deliver(1, 0).unwrap();
    let err = suite.deliver(0, 0).unwrap_err();
    let err_str = err.root_cause().to_string();
    assert!(err_str.contains("Duplicate request"), "{}", err_str);

    let pool: Pool = suite.query(&suite.home.orchestrator, &QueryMsg::Pool { pool_id: 0 });
    assert_eq!(pool.total_contribution, Uint128::new(1_000));
}

#[test]
fn test_resend_of_delivered_request_rejected() {
    let mut suite = setup();
    suite.request_deposit(1_000, 990, 0).unwrap();
    suite.deliver(0, 0).unwrap();
    suite.request_withdrawal(0, 990).unwrap();
    suite.deliver(1, 0).unwrap();
    suite.deliver(2, 0).unwrap();
    assert_eq!(outbound(&suite, 1).status, RequestStatus::Delivered);

    let err = resend(&mut suite, 1, &[coin(100_000, GAS)]).unwrap_err();
    let err_str = err.root_cause().to_string();
    assert!(err_str.contains("cannot transition from delivered"), "{}", err_str);
}

#[test]
fn test_resend_failed_withdrawal_restores_marker() {
    let mut suite = setup();
    suite.request_deposit(1_000, 990, 0).unwrap();
    suite.deliver(0, 0).unwrap();
    suite.request_withdrawal(0, 990).unwrap();
    suite
        .app
        .execute_contract(
            suite.owner.clone(),
            suite.remote.orchestrator.clone(),
            &ExecuteMsg::MarkRequestFailed { nonce: 1 },
            &[],
        )
        .unwrap();

    resend(&mut suite, 1, &[coin(100_000, GAS)]).unwrap();
    assert_eq!(outbound(&suite, 1).status, RequestStatus::Sent);

    let err = suite.request_withdrawal(0, 990).unwrap_err();
    let err_str = err.root_cause().to_string();
    assert!(err_str.contains("Withdrawal already pending"), "{}", err_str);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_pause_blocks_deposits_but_not_withdrawals() {
    let mut suite = setup();
    suite.request_deposit(1_000, 990, 0).unwrap();
    suite.deliver(0, 0).unwrap();

    let res = update_config(&mut suite, Some(true), None).unwrap();
    assert_eq!(attr(&res, "paused").unwrap(), "true");

    let err = suite.request_deposit(1_000, 990, 0).unwrap_err();
    let err_str = err.root_cause().to_string();
    assert!(err_str.contains("paused"), "{}", err_str);

    suite.request_withdrawal(0, 990).unwrap();

    update_config(&mut suite, Some(false), None).unwrap();
    suite.request_deposit(1_000, 990, 0).unwrap();
}

#[test]
fn test_update_config_validates_slippage_floor() {
    let mut suite = setup();
    let err = update_config(&mut suite, None, Some(0)).unwrap_err();
    let err_str = err.root_cause().to_string();
    assert!(err_str.contains("Invalid slippage factor"), "{}", err_str);

    let err = update_config(&mut suite, None, Some(1_001)).unwrap_err();
    let err_str = err.root_cause().to_string();
    assert!(err_str.contains("Invalid slippage factor"), "{}", err_str);

    // A tighter floor applies to new requests
    update_config(&mut suite, None, Some(995)).unwrap();
    let err = suite.request_deposit(1_000, 990, 0).unwrap_err();
    let err_str = err.root_cause().to_string();
    assert!(err_str.contains("Invalid slippage factor 990"), "{}", err_str);
}

#[test]
fn test_vault_fees_bounded_by_floor() {
    let mut suite = setup();
    let err = suite
        .app
        .execute_contract(
            suite.owner.clone(),
            suite.home.orchestrator.clone(),
            &ExecuteMsg::SetVaultFees {
                pool_id: 0,
                entrance_fee_factor: 8_999,
                withdraw_fee_factor: 10_000,
            },
            &[],
        )
        .unwrap_err();
    let err_str = err.root_cause().to_string();
    assert!(err_str.contains("Fee factor 8999 out of bounds"), "{}", err_str);

    let err = suite
        .app
        .execute_contract(
            suite.owner.clone(),
            suite.home.orchestrator.clone(),
            &ExecuteMsg::SetVaultFees {
                pool_id: 7,
                entrance_fee_factor: 10_000,
                withdraw_fee_factor: 10_000,
            },
            &[],
        )
        .unwrap_err();
    let err_str = err.root_cause().to_string();
    assert!(err_str.contains("Pool not found: 7"), "{}", err_str);
}

// ============================================================================
// Migration
// ============================================================================

#[test]
fn test_migrate_keeps_state() {
    let mut suite = setup();
    suite.request_deposit(1_000, 990, 0).unwrap();

    let res = suite
        .app
        .migrate_contract(
            suite.owner.clone(),
            suite.remote.orchestrator.clone(),
            &MigrateMsg {},
            suite.orchestrator_code_id,
        )
        .unwrap();
    assert_eq!(attr(&res, "from_schema").unwrap(), "2");
    assert_eq!(attr(&res, "to_schema").unwrap(), "2");

    assert_eq!(outbound(&suite, 0).status, RequestStatus::Sent);
}
