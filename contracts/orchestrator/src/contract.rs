//! Zorro Orchestrator Contract - Entry Points
//!
//! The implementation is modularized into:
//! - `execute/` - Execute message handlers
//! - `query` - Query message handlers

use cosmwasm_std::{
    entry_point, to_json_binary, Binary, Deps, DepsMut, Env, MessageInfo, Response, StdResult,
    Uint128,
};
use cw2::set_contract_version;

use crate::error::ContractError;
use crate::execute::{
    execute_accept_owner, execute_add_pool, execute_cancel_owner_proposal,
    execute_claim_rewards, execute_deposit, execute_mark_request_failed,
    execute_mass_update_pools, execute_on_delivery, execute_propose_owner,
    execute_remove_chain_endpoint, execute_request_deposit, execute_request_distribute_earnings,
    execute_request_withdrawal, execute_resend_request, execute_set_chain_endpoint,
    execute_set_emission_rate, execute_set_pool, execute_set_vault_fees, execute_update_config,
    execute_update_pool, execute_update_rewards_params, execute_withdraw, DeliveryChannel,
};
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use crate::query::{
    query_chain, query_chains, query_check_deposit_fee, query_check_distribute_earnings_fee,
    query_check_repatriation_fee, query_check_withdrawal_fee, query_config,
    query_inbound_request, query_outbound_request, query_outbound_requests,
    query_pending_owner, query_pending_rewards, query_pool, query_pools, query_rewards_state,
    query_stats, query_time_multiplier, query_tranche, query_tranches,
};
use crate::rewards::validate_rewards_state;
use crate::state::{
    Config, RewardsState, Stats, TimeBoost, CONFIG, CONTRACT_NAME, CONTRACT_VERSION,
    CURRENT_SCHEMA_VERSION, DEFAULT_DIST_FACTOR_MAX, DEFAULT_DIST_FACTOR_MIN,
    DEFAULT_MAX_WEEKS_COMMITTED, DEFAULT_TIME_BOOST_COEFFICIENT_BPS, FEE_FACTOR_MAX,
    OUTBOUND_NONCE, POOL_COUNT, REWARDS_STATE, SCHEMA_VERSION, SLIPPAGE_DENOMINATOR, STATS,
    TOTAL_ALLOC_POINT,
};

// ============================================================================
// Instantiate
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let owner = match msg.owner {
        Some(owner) => deps.api.addr_validate(&owner)?,
        None => info.sender,
    };

    if msg.stablecoin_denom.is_empty() || msg.gas_denom.is_empty() {
        return Err(ContractError::InvalidFunds {
            reason: "stablecoin and gas denoms are required".to_string(),
        });
    }
    if msg.min_slippage_factor == 0 || msg.min_slippage_factor > SLIPPAGE_DENOMINATOR {
        return Err(ContractError::InvalidSlippage {
            factor: msg.min_slippage_factor,
            min: 1,
        });
    }
    for factor in [msg.entrance_fee_factor_min, msg.withdraw_fee_factor_min] {
        if factor > FEE_FACTOR_MAX {
            return Err(ContractError::FeeFactorOutOfBounds {
                factor,
                min: 0,
                max: FEE_FACTOR_MAX,
            });
        }
    }

    let config = Config {
        owner,
        paused: false,
        this_chain_id: msg.this_chain_id,
        home_chain_id: msg.home_chain_id,
        relay: deps.api.addr_validate(&msg.relay)?,
        stablecoin_denom: msg.stablecoin_denom,
        gas_denom: msg.gas_denom,
        reward_token: deps.api.addr_validate(&msg.reward_token)?,
        public_pool: deps.api.addr_validate(&msg.public_pool)?,
        staking_vault: deps.api.addr_validate(&msg.staking_vault)?,
        exchange_router: deps.api.addr_validate(&msg.exchange_router)?,
        lp_pair_denom: msg.lp_pair_denom,
        burn_address: deps.api.addr_validate(&msg.burn_address)?,
        min_slippage_factor: msg.min_slippage_factor,
        entrance_fee_factor_min: msg.entrance_fee_factor_min,
        withdraw_fee_factor_min: msg.withdraw_fee_factor_min,
    };
    CONFIG.save(deps.storage, &config)?;

    let params = msg.rewards;
    let rewards = RewardsState {
        blocks_per_day: params.blocks_per_day,
        dist_factor_min: params.dist_factor_min.unwrap_or(DEFAULT_DIST_FACTOR_MIN),
        dist_factor_max: params.dist_factor_max.unwrap_or(DEFAULT_DIST_FACTOR_MAX),
        base_reward_rate: params.base_reward_rate,
        chain_multiplier: params.chain_multiplier,
        emission_rate: Uint128::zero(),
        start_block: params.start_block,
        oracle: deps.api.addr_validate(&params.oracle)?,
        time_boost: params.time_boost.unwrap_or(TimeBoost {
            enabled: true,
            coefficient_bps: DEFAULT_TIME_BOOST_COEFFICIENT_BPS,
        }),
        max_weeks_committed: params
            .max_weeks_committed
            .unwrap_or(DEFAULT_MAX_WEEKS_COMMITTED),
    };
    validate_rewards_state(&rewards)?;
    REWARDS_STATE.save(deps.storage, &rewards)?;

    STATS.save(deps.storage, &Stats::default())?;
    OUTBOUND_NONCE.save(deps.storage, &0u64)?;
    POOL_COUNT.save(deps.storage, &0u64)?;
    TOTAL_ALLOC_POINT.save(deps.storage, &0u64)?;
    SCHEMA_VERSION.save(deps.storage, &CURRENT_SCHEMA_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("owner", config.owner.to_string())
        .add_attribute("this_chain_id", config.this_chain_id.to_string())
        .add_attribute("home_chain_id", config.home_chain_id.to_string())
        .add_attribute("relay", config.relay.to_string()))
}

// ============================================================================
// Execute
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        // Relay callbacks
        ExecuteMsg::OnAssetDelivery {
            src_chain_id,
            src_address,
            payload,
        } => execute_on_delivery(
            deps,
            env,
            info,
            DeliveryChannel::Asset,
            src_chain_id,
            src_address,
            payload,
        ),
        ExecuteMsg::OnMessageDelivery {
            src_chain_id,
            src_address,
            payload,
        } => execute_on_delivery(
            deps,
            env,
            info,
            DeliveryChannel::MessageOnly,
            src_chain_id,
            src_address,
            payload,
        ),

        // Cross-chain requests
        ExecuteMsg::RequestDeposit {
            dest_chain_id,
            pool_id,
            value,
            weeks_committed,
            max_slippage,
            dest_account,
        } => execute_request_deposit(
            deps,
            env,
            info,
            dest_chain_id,
            pool_id,
            value,
            weeks_committed,
            max_slippage,
            dest_account,
        ),
        ExecuteMsg::RequestWithdrawal {
            dest_chain_id,
            pool_id,
            tranche_id,
            max_slippage,
        } => execute_request_withdrawal(
            deps,
            env,
            info,
            dest_chain_id,
            pool_id,
            tranche_id,
            max_slippage,
        ),
        ExecuteMsg::RequestDistributeEarnings {
            buyback_amount,
            revshare_amount,
            max_slippage,
        } => execute_request_distribute_earnings(
            deps,
            env,
            info,
            buyback_amount,
            revshare_amount,
            max_slippage,
        ),

        // Local pool operations
        ExecuteMsg::Deposit {
            pool_id,
            weeks_committed,
            max_slippage,
        } => execute_deposit(deps, env, info, pool_id, weeks_committed, max_slippage),
        ExecuteMsg::Withdraw {
            pool_id,
            tranche_id,
            max_slippage,
        } => execute_withdraw(deps, env, info, pool_id, tranche_id, max_slippage),
        ExecuteMsg::ClaimRewards {
            pool_id,
            account,
            tranche_id,
        } => execute_claim_rewards(deps, env, info, pool_id, account, tranche_id),
        ExecuteMsg::UpdatePool { pool_id } => execute_update_pool(deps, env, pool_id),
        ExecuteMsg::MassUpdatePools {} => execute_mass_update_pools(deps, env),
        ExecuteMsg::SetEmissionRate(inputs) => execute_set_emission_rate(deps, env, info, inputs),

        // Administration
        ExecuteMsg::AddPool { alloc_point, vault } => {
            execute_add_pool(deps, env, info, alloc_point, vault)
        }
        ExecuteMsg::SetPool {
            pool_id,
            alloc_point,
        } => execute_set_pool(deps, env, info, pool_id, alloc_point),
        ExecuteMsg::SetVaultFees {
            pool_id,
            entrance_fee_factor,
            withdraw_fee_factor,
        } => execute_set_vault_fees(deps, info, pool_id, entrance_fee_factor, withdraw_fee_factor),
        ExecuteMsg::SetChainEndpoint {
            chain_id,
            relay_chain_id,
            orchestrator,
            is_home,
            gas_budget,
            enabled,
        } => execute_set_chain_endpoint(
            deps,
            info,
            chain_id,
            relay_chain_id,
            orchestrator,
            is_home,
            gas_budget,
            enabled,
        ),
        ExecuteMsg::RemoveChainEndpoint { chain_id } => {
            execute_remove_chain_endpoint(deps, info, chain_id)
        }
        ExecuteMsg::UpdateConfig {
            paused,
            relay,
            reward_token,
            public_pool,
            staking_vault,
            exchange_router,
            lp_pair_denom,
            burn_address,
            min_slippage_factor,
            entrance_fee_factor_min,
            withdraw_fee_factor_min,
        } => execute_update_config(
            deps,
            info,
            paused,
            relay,
            reward_token,
            public_pool,
            staking_vault,
            exchange_router,
            lp_pair_denom,
            burn_address,
            min_slippage_factor,
            entrance_fee_factor_min,
            withdraw_fee_factor_min,
        ),
        ExecuteMsg::UpdateRewardsParams {
            blocks_per_day,
            dist_factor_min,
            dist_factor_max,
            base_reward_rate,
            chain_multiplier,
            start_block,
            oracle,
            time_boost,
            max_weeks_committed,
        } => execute_update_rewards_params(
            deps,
            env,
            info,
            blocks_per_day,
            dist_factor_min,
            dist_factor_max,
            base_reward_rate,
            chain_multiplier,
            start_block,
            oracle,
            time_boost,
            max_weeks_committed,
        ),
        ExecuteMsg::ProposeOwner { new_owner } => execute_propose_owner(deps, env, info, new_owner),
        ExecuteMsg::AcceptOwner {} => execute_accept_owner(deps, env, info),
        ExecuteMsg::CancelOwnerProposal {} => execute_cancel_owner_proposal(deps, info),
        ExecuteMsg::MarkRequestFailed { nonce } => {
            execute_mark_request_failed(deps, env, info, nonce)
        }
        ExecuteMsg::ResendRequest { nonce } => execute_resend_request(deps, env, info, nonce),
    }
}

// ============================================================================
// Query
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        // Core queries
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?),
        QueryMsg::PendingOwner {} => to_json_binary(&query_pending_owner(deps)?),
        QueryMsg::RewardsState {} => to_json_binary(&query_rewards_state(deps)?),
        QueryMsg::Stats {} => to_json_binary(&query_stats(deps)?),
        QueryMsg::Chain { chain_id } => to_json_binary(&query_chain(deps, chain_id)?),
        QueryMsg::Chains { start_after, limit } => {
            to_json_binary(&query_chains(deps, start_after, limit)?)
        }

        // Pool queries
        QueryMsg::Pool { pool_id } => to_json_binary(&query_pool(deps, pool_id)?),
        QueryMsg::Pools { start_after, limit } => {
            to_json_binary(&query_pools(deps, start_after, limit)?)
        }
        QueryMsg::Tranche {
            pool_id,
            account,
            tranche_id,
        } => to_json_binary(&query_tranche(deps, env, pool_id, account, tranche_id)?),
        QueryMsg::Tranches {
            pool_id,
            account,
            start_after,
            limit,
        } => to_json_binary(&query_tranches(
            deps,
            env,
            pool_id,
            account,
            start_after,
            limit,
        )?),
        QueryMsg::PendingRewards {
            pool_id,
            account,
            tranche_id,
        } => to_json_binary(&query_pending_rewards(
            deps, env, pool_id, account, tranche_id,
        )?),
        QueryMsg::TimeMultiplier { weeks_committed } => {
            to_json_binary(&query_time_multiplier(deps, weeks_committed)?)
        }

        // Fee queries
        QueryMsg::CheckDepositFee {
            depositor,
            dest_chain_id,
            pool_id,
            value,
            weeks_committed,
            max_slippage,
            dest_account,
        } => to_json_binary(&query_check_deposit_fee(
            deps,
            depositor,
            dest_chain_id,
            pool_id,
            value,
            weeks_committed,
            max_slippage,
            dest_account,
        )?),
        QueryMsg::CheckWithdrawalFee {
            withdrawer,
            dest_chain_id,
            pool_id,
            tranche_id,
            max_slippage,
        } => to_json_binary(&query_check_withdrawal_fee(
            deps,
            withdrawer,
            dest_chain_id,
            pool_id,
            tranche_id,
            max_slippage,
        )?),
        QueryMsg::CheckRepatriationFee {
            origin_chain_id,
            pool_id,
            tranche_id,
            origin_recipient,
            burnable_rewards,
            rewards_due,
        } => to_json_binary(&query_check_repatriation_fee(
            deps,
            origin_chain_id,
            pool_id,
            tranche_id,
            origin_recipient,
            burnable_rewards,
            rewards_due,
        )?),
        QueryMsg::CheckDistributeEarningsFee {
            buyback_amount,
            revshare_amount,
            max_slippage,
        } => to_json_binary(&query_check_distribute_earnings_fee(
            deps,
            buyback_amount,
            revshare_amount,
            max_slippage,
        )?),

        // Request audit queries
        QueryMsg::OutboundRequest { nonce } => {
            to_json_binary(&query_outbound_request(deps, nonce)?)
        }
        QueryMsg::OutboundRequests { start_after, limit } => {
            to_json_binary(&query_outbound_requests(deps, start_after, limit)?)
        }
        QueryMsg::InboundRequest { request_id } => {
            to_json_binary(&query_inbound_request(deps, request_id)?)
        }
    }
}

// ============================================================================
// Migrate
// ============================================================================

/// Bring storage up to `CURRENT_SCHEMA_VERSION`.
///
/// Deployments without a schema marker are treated as version 1, which
/// predates the stats record and the persisted outbound nonce.
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let stored = SCHEMA_VERSION.may_load(deps.storage)?.unwrap_or(1);
    if stored > CURRENT_SCHEMA_VERSION {
        return Err(ContractError::InvalidMigration {
            stored,
            current: CURRENT_SCHEMA_VERSION,
        });
    }

    if STATS.may_load(deps.storage)?.is_none() {
        STATS.save(deps.storage, &Stats::default())?;
    }
    if OUTBOUND_NONCE.may_load(deps.storage)?.is_none() {
        OUTBOUND_NONCE.save(deps.storage, &0u64)?;
    }

    SCHEMA_VERSION.save(deps.storage, &CURRENT_SCHEMA_VERSION)?;
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("version", CONTRACT_VERSION)
        .add_attribute("from_schema", stored.to_string())
        .add_attribute("to_schema", CURRENT_SCHEMA_VERSION.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::{mock_dependencies, mock_env, mock_info};
    use cosmwasm_std::coin;
    use cw2::get_contract_version;

    use crate::codec::encode_distribute_earnings_payload;
    use crate::msg::RewardsParamsMsg;

    fn instantiate_msg() -> InstantiateMsg {
        InstantiateMsg {
            owner: None,
            this_chain_id: 2,
            home_chain_id: 1,
            relay: "relay".to_string(),
            stablecoin_denom: "uusdc".to_string(),
            gas_denom: "ugas".to_string(),
            reward_token: "zor".to_string(),
            public_pool: "public_pool".to_string(),
            staking_vault: "staking_vault".to_string(),
            exchange_router: "router".to_string(),
            lp_pair_denom: "uluna".to_string(),
            burn_address: "burn".to_string(),
            min_slippage_factor: 500,
            entrance_fee_factor_min: 9_000,
            withdraw_fee_factor_min: 9_000,
            rewards: RewardsParamsMsg {
                blocks_per_day: 14_400,
                base_reward_rate: 10,
                chain_multiplier: 1,
                oracle: "oracle".to_string(),
                start_block: None,
                dist_factor_min: None,
                dist_factor_max: None,
                time_boost: None,
                max_weeks_committed: None,
            },
        }
    }

    #[test]
    fn test_instantiate_defaults() {
        let mut deps = mock_dependencies();
        instantiate(deps.as_mut(), mock_env(), mock_info("creator", &[]), instantiate_msg()).unwrap();

        let config = CONFIG.load(&deps.storage).unwrap();
        assert_eq!(config.owner.as_str(), "creator");
        assert!(!config.is_home_chain());

        let rewards = REWARDS_STATE.load(&deps.storage).unwrap();
        assert_eq!(rewards.dist_factor_min, DEFAULT_DIST_FACTOR_MIN);
        assert_eq!(rewards.dist_factor_max, DEFAULT_DIST_FACTOR_MAX);
        assert!(rewards.time_boost.enabled);
        assert!(rewards.emission_rate.is_zero());
        assert_eq!(SCHEMA_VERSION.load(&deps.storage).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_instantiate_rejects_bad_config() {
        let mut deps = mock_dependencies();
        let mut msg = instantiate_msg();
        msg.min_slippage_factor = 0;
        let err = instantiate(deps.as_mut(), mock_env(), mock_info("creator", &[]), msg).unwrap_err();
        assert!(matches!(err, ContractError::InvalidSlippage { .. }));

        let mut msg = instantiate_msg();
        msg.withdraw_fee_factor_min = 10_001;
        let err = instantiate(deps.as_mut(), mock_env(), mock_info("creator", &[]), msg).unwrap_err();
        assert!(matches!(err, ContractError::FeeFactorOutOfBounds { .. }));

        let mut msg = instantiate_msg();
        msg.rewards.blocks_per_day = 0;
        let err = instantiate(deps.as_mut(), mock_env(), mock_info("creator", &[]), msg).unwrap_err();
        assert!(matches!(err, ContractError::InvalidRewardsParams { .. }));
    }

    #[test]
    fn test_migrate_backfills_v1_state() {
        let mut deps = mock_dependencies();
        instantiate(deps.as_mut(), mock_env(), mock_info("creator", &[]), instantiate_msg()).unwrap();

        // Schema 1 had no version marker, stats or nonce counter
        SCHEMA_VERSION.remove(&mut deps.storage);
        STATS.remove(&mut deps.storage);
        OUTBOUND_NONCE.remove(&mut deps.storage);

        let res = migrate(deps.as_mut(), mock_env(), MigrateMsg {}).unwrap();
        assert!(res
            .attributes
            .iter()
            .any(|a| a.key == "from_schema" && a.value == "1"));

        assert_eq!(STATS.load(&deps.storage).unwrap(), Stats::default());
        assert_eq!(OUTBOUND_NONCE.load(&deps.storage).unwrap(), 0);
        assert_eq!(SCHEMA_VERSION.load(&deps.storage).unwrap(), CURRENT_SCHEMA_VERSION);
        assert_eq!(
            get_contract_version(&deps.storage).unwrap().contract,
            CONTRACT_NAME
        );
    }

    #[test]
    fn test_migrate_rejects_newer_schema() {
        let mut deps = mock_dependencies();
        instantiate(deps.as_mut(), mock_env(), mock_info("creator", &[]), instantiate_msg()).unwrap();
        SCHEMA_VERSION
            .save(&mut deps.storage, &(CURRENT_SCHEMA_VERSION + 1))
            .unwrap();

        let err = migrate(deps.as_mut(), mock_env(), MigrateMsg {}).unwrap_err();
        assert_eq!(
            err,
            ContractError::InvalidMigration {
                stored: CURRENT_SCHEMA_VERSION + 1,
                current: CURRENT_SCHEMA_VERSION,
            }
        );
    }

    #[test]
    fn test_delivered_earnings_without_amounts_rejected() {
        let mut deps = mock_dependencies();
        let mut msg = instantiate_msg();
        msg.this_chain_id = 1;
        instantiate(deps.as_mut(), mock_env(), mock_info("creator", &[]), msg).unwrap();
        execute(
            deps.as_mut(),
            mock_env(),
            mock_info("creator", &[]),
            ExecuteMsg::SetChainEndpoint {
                chain_id: 2,
                relay_chain_id: 102,
                orchestrator: "remote_orchestrator".to_string(),
                is_home: false,
                gas_budget: 5_000,
                enabled: true,
            },
        )
        .unwrap();

        // Stablecoin arrives but neither share was declared
        let payload = encode_distribute_earnings_payload(
            0,
            2,
            Uint128::zero(),
            Uint128::zero(),
            Uint128::new(5),
            990,
        )
        .unwrap();
        let err = execute(
            deps.as_mut(),
            mock_env(),
            mock_info("relay", &[coin(100, "uusdc")]),
            ExecuteMsg::OnAssetDelivery {
                src_chain_id: 102,
                src_address: "remote_orchestrator".to_string(),
                payload,
            },
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::InvalidAmount { .. }));
    }
}
