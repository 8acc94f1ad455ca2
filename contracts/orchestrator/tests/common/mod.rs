//! Shared cw-multi-test harness.
//!
//! One `App` hosts two orchestrators (home chain 1, remote chain 2) together
//! with in-test stand-ins for the external collaborators:
//! - `mock_relay` - records sends, charges quoted fees, delivers on demand
//! - `mock_vault` - holds deposits and honors its fee factors on withdrawal
//! - `mock_router` - 1:1 quotes and swaps, records LP receipts

#![allow(dead_code)]

use cosmwasm_std::{coin, Addr, Binary, Empty, Uint128};
use cw20::{
    BalanceResponse, Cw20Coin, Cw20ExecuteMsg, Cw20QueryMsg, MinterResponse, TokenInfoResponse,
};
use cw_multi_test::{App, AppResponse, Contract, ContractWrapper, Executor};
use serde::de::DeserializeOwned;

use orchestrator::msg::{
    ExecuteMsg, FeeQuoteResponse, InstantiateMsg, QueryMsg, RewardsParamsMsg,
};
use orchestrator::rewards::EmissionInputs;

pub const HOME_CHAIN: u64 = 1;
pub const REMOTE_CHAIN: u64 = 2;
pub const HOME_RELAY_ID: u64 = 101;
pub const REMOTE_RELAY_ID: u64 = 102;

pub const STABLE: &str = "uusdc";
pub const GAS: &str = "ugas";
pub const PAIR: &str = "uluna";

pub const GAS_BUDGET: u64 = 5_000;
pub const MIN_SLIPPAGE: u16 = 500;

// ============================================================================
// Mock Relay
// ============================================================================

pub mod mock_relay {
    use cosmwasm_schema::cw_serde;
    use cosmwasm_std::{
        to_json_binary, Binary, Coin, Deps, DepsMut, Env, MessageInfo, Response, StdError,
        StdResult, Uint128, WasmMsg,
    };
    use cw_storage_plus::{Item, Map};

    use common::relay::{QuoteFeeResponse, RelayReceiveMsg};

    pub const BASE_FEE: u128 = 1_000;
    pub const PER_BYTE_FEE: u128 = 10;
    pub const ASSET_FEE: u128 = 2_000;

    #[cw_serde]
    pub struct InstantiateMsg {
        pub fee_denom: String,
    }

    #[cw_serde]
    pub enum ExecuteMsg {
        SendWithAsset {
            dest_chain_id: u64,
            dest_address: String,
            asset: String,
            amount: Uint128,
            payload: Binary,
        },
        SendMessageOnly {
            dest_chain_id: u64,
            dest_address: String,
            payload: Binary,
            gas_budget: u64,
        },
        /// Map a sending contract to the relay chain id it lives on
        RegisterSender { address: String, relay_chain_id: u64 },
        /// Deliver a recorded send, keeping `haircut` of the bridged asset
        Deliver { id: u64, haircut: Uint128 },
    }

    #[cw_serde]
    pub enum QueryMsg {
        QuoteFee {
            dest_chain_id: u64,
            payload_len: u32,
            native_gas_budget: u64,
            with_asset: bool,
        },
        Envelope { id: u64 },
        SendCount {},
    }

    #[cw_serde]
    pub struct Envelope {
        pub src_chain_id: u64,
        pub src_address: String,
        pub dest_chain_id: u64,
        pub dest_address: String,
        pub payload: Binary,
        pub asset: Option<Coin>,
        pub fee_paid: Uint128,
        pub delivered: bool,
    }

    const FEE_DENOM: Item<String> = Item::new("fee_denom");
    const SENDERS: Map<&str, u64> = Map::new("senders");
    const ENVELOPES: Map<u64, Envelope> = Map::new("envelopes");
    const SEND_COUNT: Item<u64> = Item::new("send_count");

    pub fn quote(payload_len: u32, gas_budget: u64, with_asset: bool) -> u128 {
        let asset = if with_asset { ASSET_FEE } else { 0 };
        BASE_FEE + PER_BYTE_FEE * payload_len as u128 + gas_budget as u128 + asset
    }

    fn paid(info: &MessageInfo, denom: &str) -> Uint128 {
        info.funds
            .iter()
            .filter(|c| c.denom == denom)
            .map(|c| c.amount)
            .sum()
    }

    pub fn instantiate(
        deps: DepsMut,
        _env: Env,
        _info: MessageInfo,
        msg: InstantiateMsg,
    ) -> StdResult<Response> {
        FEE_DENOM.save(deps.storage, &msg.fee_denom)?;
        SEND_COUNT.save(deps.storage, &0)?;
        Ok(Response::new())
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        deps: DepsMut,
        info: &MessageInfo,
        dest_chain_id: u64,
        dest_address: String,
        payload: Binary,
        asset: Option<Coin>,
        gas_budget: u64,
    ) -> StdResult<Response> {
        let src_chain_id = SENDERS
            .may_load(deps.storage, info.sender.as_str())?
            .ok_or_else(|| StdError::generic_err("unregistered sender"))?;
        let fee_denom = FEE_DENOM.load(deps.storage)?;
        let required = quote(payload.len() as u32, gas_budget, asset.is_some());

        let mut fee_paid = paid(info, &fee_denom);
        if let Some(asset) = &asset {
            let attached = paid(info, &asset.denom);
            if attached < asset.amount {
                return Err(StdError::generic_err("asset not attached"));
            }
            if asset.denom == fee_denom {
                fee_paid -= asset.amount;
            }
        }
        if fee_paid.u128() < required {
            return Err(StdError::generic_err(format!(
                "fee too low: {} < {}",
                fee_paid, required
            )));
        }

        let id = SEND_COUNT.load(deps.storage)?;
        SEND_COUNT.save(deps.storage, &(id + 1))?;
        ENVELOPES.save(
            deps.storage,
            id,
            &Envelope {
                src_chain_id,
                src_address: info.sender.to_string(),
                dest_chain_id,
                dest_address,
                payload,
                asset,
                fee_paid,
                delivered: false,
            },
        )?;
        Ok(Response::new().add_attribute("send_id", id.to_string()))
    }

    pub fn execute(
        deps: DepsMut,
        _env: Env,
        info: MessageInfo,
        msg: ExecuteMsg,
    ) -> StdResult<Response> {
        match msg {
            ExecuteMsg::SendWithAsset {
                dest_chain_id,
                dest_address,
                asset,
                amount,
                payload,
            } => {
                let asset = Coin {
                    denom: asset,
                    amount,
                };
                record(deps, &info, dest_chain_id, dest_address, payload, Some(asset), 0)
            }
            ExecuteMsg::SendMessageOnly {
                dest_chain_id,
                dest_address,
                payload,
                gas_budget,
            } => record(deps, &info, dest_chain_id, dest_address, payload, None, gas_budget),
            ExecuteMsg::RegisterSender {
                address,
                relay_chain_id,
            } => {
                SENDERS.save(deps.storage, &address, &relay_chain_id)?;
                Ok(Response::new())
            }
            ExecuteMsg::Deliver { id, haircut } => {
                let mut envelope = ENVELOPES.load(deps.storage, id)?;
                if envelope.delivered {
                    return Err(StdError::generic_err("already delivered"));
                }
                envelope.delivered = true;
                ENVELOPES.save(deps.storage, id, &envelope)?;

                let (callback, funds) = match &envelope.asset {
                    Some(asset) => {
                        let amount = asset.amount.checked_sub(haircut)?;
                        let funds = if amount.is_zero() {
                            vec![]
                        } else {
                            vec![Coin {
                                denom: asset.denom.clone(),
                                amount,
                            }]
                        };
                        (
                            RelayReceiveMsg::OnAssetDelivery {
                                src_chain_id: envelope.src_chain_id,
                                src_address: envelope.src_address.clone(),
                                payload: envelope.payload.clone(),
                            },
                            funds,
                        )
                    }
                    None => (
                        RelayReceiveMsg::OnMessageDelivery {
                            src_chain_id: envelope.src_chain_id,
                            src_address: envelope.src_address.clone(),
                            payload: envelope.payload.clone(),
                        },
                        vec![],
                    ),
                };
                Ok(Response::new().add_message(WasmMsg::Execute {
                    contract_addr: envelope.dest_address,
                    msg: to_json_binary(&callback)?,
                    funds,
                }))
            }
        }
    }

    pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
        match msg {
            QueryMsg::QuoteFee {
                payload_len,
                native_gas_budget,
                with_asset,
                ..
            } => {
                let fee_denom = FEE_DENOM.load(deps.storage)?;
                let amount = quote(payload_len, native_gas_budget, with_asset);
                to_json_binary(&QuoteFeeResponse {
                    fee: Coin::new(amount, fee_denom),
                })
            }
            QueryMsg::Envelope { id } => to_json_binary(&ENVELOPES.load(deps.storage, id)?),
            QueryMsg::SendCount {} => to_json_binary(&SEND_COUNT.load(deps.storage)?),
        }
    }
}

// ============================================================================
// Mock Vault
// ============================================================================

pub mod mock_vault {
    use cosmwasm_schema::cw_serde;
    use cosmwasm_std::{
        to_json_binary, Addr, BankMsg, Binary, Coin, Deps, DepsMut, Env, MessageInfo, Response,
        StdError, StdResult, Uint128, WasmMsg,
    };
    use cw_storage_plus::Item;

    #[cw_serde]
    pub struct InstantiateMsg {
        pub orchestrator: String,
        pub stablecoin_denom: String,
    }

    #[cw_serde]
    pub enum ExecuteMsg {
        DepositWantToken {
            max_slippage: u16,
        },
        WithdrawWantToken {
            amount: Uint128,
            max_slippage: u16,
            recipient: String,
        },
        Farm {},
        Earn {},
        SetFeeFactors {
            entrance_fee_factor: u64,
            withdraw_fee_factor: u64,
        },
        /// Hand harvested profit (from the vault's own balance) to the orchestrator
        Distribute {
            buyback_amount: Uint128,
            revshare_amount: Uint128,
            max_slippage: u16,
            fee: Option<Coin>,
        },
    }

    #[cw_serde]
    pub enum QueryMsg {
        State {},
    }

    #[cw_serde]
    pub struct VaultState {
        pub orchestrator: Addr,
        pub stablecoin_denom: String,
        pub deposited: Uint128,
        pub entrance_fee_factor: u64,
        pub withdraw_fee_factor: u64,
    }

    const STATE: Item<VaultState> = Item::new("state");

    pub fn instantiate(
        deps: DepsMut,
        _env: Env,
        _info: MessageInfo,
        msg: InstantiateMsg,
    ) -> StdResult<Response> {
        STATE.save(
            deps.storage,
            &VaultState {
                orchestrator: deps.api.addr_validate(&msg.orchestrator)?,
                stablecoin_denom: msg.stablecoin_denom,
                deposited: Uint128::zero(),
                entrance_fee_factor: 10_000,
                withdraw_fee_factor: 10_000,
            },
        )?;
        Ok(Response::new())
    }

    pub fn execute(
        deps: DepsMut,
        _env: Env,
        info: MessageInfo,
        msg: ExecuteMsg,
    ) -> StdResult<Response> {
        let mut state = STATE.load(deps.storage)?;
        let orchestrator = state.orchestrator.clone();
        let only_orchestrator = |sender: &Addr| {
            if *sender != orchestrator {
                return Err(StdError::generic_err("vault: unauthorized"));
            }
            Ok(())
        };

        match msg {
            ExecuteMsg::DepositWantToken { .. } => {
                only_orchestrator(&info.sender)?;
                let amount: Uint128 = info
                    .funds
                    .iter()
                    .filter(|c| c.denom == state.stablecoin_denom)
                    .map(|c| c.amount)
                    .sum();
                let credited = amount.multiply_ratio(state.entrance_fee_factor, 10_000u128);
                state.deposited += credited;
                STATE.save(deps.storage, &state)?;
                Ok(Response::new().add_attribute("vault_deposit", credited.to_string()))
            }
            ExecuteMsg::WithdrawWantToken {
                amount, recipient, ..
            } => {
                only_orchestrator(&info.sender)?;
                if amount > state.deposited {
                    return Err(StdError::generic_err(format!(
                        "vault: withdraw {} exceeds deposits {}",
                        amount, state.deposited
                    )));
                }
                let paid = amount.multiply_ratio(state.withdraw_fee_factor, 10_000u128);
                state.deposited -= amount;
                STATE.save(deps.storage, &state)?;
                Ok(Response::new()
                    .add_message(BankMsg::Send {
                        to_address: recipient,
                        amount: vec![Coin {
                            denom: state.stablecoin_denom.clone(),
                            amount: paid,
                        }],
                    })
                    .add_attribute("vault_withdraw", paid.to_string()))
            }
            ExecuteMsg::Farm {} | ExecuteMsg::Earn {} => Ok(Response::new()),
            ExecuteMsg::SetFeeFactors {
                entrance_fee_factor,
                withdraw_fee_factor,
            } => {
                only_orchestrator(&info.sender)?;
                state.entrance_fee_factor = entrance_fee_factor;
                state.withdraw_fee_factor = withdraw_fee_factor;
                STATE.save(deps.storage, &state)?;
                Ok(Response::new())
            }
            ExecuteMsg::Distribute {
                buyback_amount,
                revshare_amount,
                max_slippage,
                fee,
            } => {
                let mut funds = vec![Coin {
                    denom: state.stablecoin_denom.clone(),
                    amount: buyback_amount + revshare_amount,
                }];
                if let Some(fee) = fee {
                    funds.push(fee);
                }
                funds.sort_by(|a, b| a.denom.cmp(&b.denom));
                Ok(Response::new().add_message(WasmMsg::Execute {
                    contract_addr: state.orchestrator.to_string(),
                    msg: to_json_binary(&orchestrator::msg::ExecuteMsg::RequestDistributeEarnings {
                        buyback_amount,
                        revshare_amount,
                        max_slippage,
                    })?,
                    funds,
                }))
            }
        }
    }

    pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
        match msg {
            QueryMsg::State {} => to_json_binary(&STATE.load(deps.storage)?),
        }
    }
}

// ============================================================================
// Mock Router
// ============================================================================

pub mod mock_router {
    use cosmwasm_schema::cw_serde;
    use cosmwasm_std::{
        to_json_binary, Binary, Deps, DepsMut, Env, MessageInfo, Response, StdError, StdResult,
        Uint128, WasmMsg,
    };
    use cw20::Cw20ExecuteMsg;
    use cw_storage_plus::Map;

    use common::exchange::{ExchangeExecuteMsg, QuoteResponse};
    use common::{Asset, AssetInfo};

    #[cw_serde]
    pub struct InstantiateMsg {}

    #[cw_serde]
    pub enum QueryMsg {
        Quote {
            offer_asset: AssetInfo,
            ask_asset: AssetInfo,
            amount: Uint128,
        },
        /// LP receipts credited to `address`
        Lp { address: String },
    }

    const LP: Map<&str, Uint128> = Map::new("lp");

    pub fn instantiate(
        _deps: DepsMut,
        _env: Env,
        _info: MessageInfo,
        _msg: InstantiateMsg,
    ) -> StdResult<Response> {
        Ok(Response::new())
    }

    pub fn execute(
        deps: DepsMut,
        env: Env,
        info: MessageInfo,
        msg: ExchangeExecuteMsg,
    ) -> StdResult<Response> {
        match msg {
            ExchangeExecuteMsg::Swap {
                ask_asset,
                min_return,
                recipient,
            } => {
                let offer = match info.funds.as_slice() {
                    [coin] => coin.clone(),
                    _ => return Err(StdError::generic_err("router: send exactly one coin")),
                };
                if offer.amount < min_return {
                    return Err(StdError::generic_err("router: min return not met"));
                }
                let out = Asset::new(ask_asset, offer.amount);
                let recipient = deps.api.addr_validate(&recipient)?;
                Ok(Response::new()
                    .add_message(out.transfer_msg(&recipient)?)
                    .add_attribute("swap_out", offer.amount.to_string()))
            }
            ExchangeExecuteMsg::AddLiquidity { assets, recipient } => {
                let mut messages = vec![];
                let mut native_leg = Uint128::zero();
                for asset in assets.iter() {
                    match &asset.info {
                        AssetInfo::Cw20 { contract_addr } => messages.push(WasmMsg::Execute {
                            contract_addr: contract_addr.to_string(),
                            msg: to_json_binary(&Cw20ExecuteMsg::TransferFrom {
                                owner: info.sender.to_string(),
                                recipient: env.contract.address.to_string(),
                                amount: asset.amount,
                            })?,
                            funds: vec![],
                        }),
                        AssetInfo::Native { denom } => {
                            let attached: Uint128 = info
                                .funds
                                .iter()
                                .filter(|c| &c.denom == denom)
                                .map(|c| c.amount)
                                .sum();
                            if attached < asset.amount {
                                return Err(StdError::generic_err("router: native leg missing"));
                            }
                            native_leg += asset.amount;
                        }
                    }
                }
                LP.update(deps.storage, &recipient, |lp| -> StdResult<_> {
                    Ok(lp.unwrap_or_default() + native_leg)
                })?;
                Ok(Response::new()
                    .add_messages(messages)
                    .add_attribute("lp_minted", native_leg.to_string()))
            }
        }
    }

    pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
        match msg {
            QueryMsg::Quote { amount, .. } => to_json_binary(&QuoteResponse {
                return_amount: amount,
            }),
            QueryMsg::Lp { address } => {
                to_json_binary(&LP.may_load(deps.storage, &address)?.unwrap_or_default())
            }
        }
    }
}

// ============================================================================
// Contract Wrappers
// ============================================================================

fn contract_orchestrator() -> Box<dyn Contract<Empty>> {
    let contract = ContractWrapper::new(
        orchestrator::contract::execute,
        orchestrator::contract::instantiate,
        orchestrator::contract::query,
    )
    .with_migrate(orchestrator::contract::migrate);
    Box::new(contract)
}

fn contract_cw20() -> Box<dyn Contract<Empty>> {
    let contract = ContractWrapper::new(
        cw20_base::contract::execute,
        cw20_base::contract::instantiate,
        cw20_base::contract::query,
    );
    Box::new(contract)
}

fn contract_relay() -> Box<dyn Contract<Empty>> {
    Box::new(ContractWrapper::new(
        mock_relay::execute,
        mock_relay::instantiate,
        mock_relay::query,
    ))
}

fn contract_vault() -> Box<dyn Contract<Empty>> {
    Box::new(ContractWrapper::new(
        mock_vault::execute,
        mock_vault::instantiate,
        mock_vault::query,
    ))
}

fn contract_router() -> Box<dyn Contract<Empty>> {
    Box::new(ContractWrapper::new(
        mock_router::execute,
        mock_router::instantiate,
        mock_router::query,
    ))
}

// ============================================================================
// Suite
// ============================================================================

/// One orchestrator deployment
pub struct Chain {
    pub chain_id: u64,
    pub orchestrator: Addr,
    pub token: Addr,
    pub vault: Addr,
}

pub struct Suite {
    pub app: App,
    pub owner: Addr,
    pub oracle: Addr,
    pub user: Addr,
    pub public_pool: Addr,
    pub staking_vault: Addr,
    pub burn: Addr,
    pub relay: Addr,
    pub router: Addr,
    pub orchestrator_code_id: u64,
    pub home: Chain,
    pub remote: Chain,
}

pub fn instantiate_msg(
    chain_id: u64,
    relay: &Addr,
    token: &Addr,
    router: &Addr,
    owner: &Addr,
    oracle: &Addr,
) -> InstantiateMsg {
    InstantiateMsg {
        owner: Some(owner.to_string()),
        this_chain_id: chain_id,
        home_chain_id: HOME_CHAIN,
        relay: relay.to_string(),
        stablecoin_denom: STABLE.to_string(),
        gas_denom: GAS.to_string(),
        reward_token: token.to_string(),
        public_pool: "public_pool".to_string(),
        staking_vault: "staking_vault".to_string(),
        exchange_router: router.to_string(),
        lp_pair_denom: PAIR.to_string(),
        burn_address: "burn_address".to_string(),
        min_slippage_factor: MIN_SLIPPAGE,
        entrance_fee_factor_min: 9_000,
        withdraw_fee_factor_min: 9_000,
        rewards: RewardsParamsMsg {
            blocks_per_day: 100,
            base_reward_rate: 10,
            chain_multiplier: 1,
            oracle: oracle.to_string(),
            start_block: None,
            dist_factor_min: None,
            dist_factor_max: None,
            time_boost: None,
            max_weeks_committed: None,
        },
    }
}

/// Inputs that put both chains exactly on target: dist 10 bps, 5 tokens per block
pub fn on_target_inputs() -> EmissionInputs {
    EmissionInputs {
        total_chain_multipliers: 2,
        total_market_tvl: Uint128::new(1_000),
        target_tvl_capture_bps: 10_000,
        total_protocol_tvl: Uint128::new(1_000),
        public_pool_balance: Uint128::new(1_000_000),
    }
}

pub fn setup() -> Suite {
    let owner = Addr::unchecked("owner");
    let oracle = Addr::unchecked("oracle");
    let user = Addr::unchecked("user");
    let public_pool = Addr::unchecked("public_pool");
    let staking_vault = Addr::unchecked("staking_vault");
    let burn = Addr::unchecked("burn_address");

    let mut app = App::default();
    app.init_modules(|router, _, storage| {
        router
            .bank
            .init_balance(
                storage,
                &owner,
                vec![
                    coin(1_000_000_000_000, GAS),
                    coin(1_000_000_000_000, PAIR),
                    coin(1_000_000_000_000, STABLE),
                ],
            )
            .unwrap();
        router
            .bank
            .init_balance(
                storage,
                &user,
                vec![coin(1_000_000_000, GAS), coin(1_000_000_000, STABLE)],
            )
            .unwrap();
    });

    let orchestrator_code_id = app.store_code(contract_orchestrator());
    let cw20_code_id = app.store_code(contract_cw20());
    let relay_code_id = app.store_code(contract_relay());
    let vault_code_id = app.store_code(contract_vault());
    let router_code_id = app.store_code(contract_router());

    let relay = app
        .instantiate_contract(
            relay_code_id,
            owner.clone(),
            &mock_relay::InstantiateMsg {
                fee_denom: GAS.to_string(),
            },
            &[],
            "relay",
            None,
        )
        .unwrap();
    let router = app
        .instantiate_contract(
            router_code_id,
            owner.clone(),
            &mock_router::InstantiateMsg {},
            &[],
            "router",
            None,
        )
        .unwrap();

    // Home token is pre-minted into the public pool; the remote one is minted on demand
    let home_token = app
        .instantiate_contract(
            cw20_code_id,
            owner.clone(),
            &cw20_base::msg::InstantiateMsg {
                name: "Zorro Token".to_string(),
                symbol: "ZOR".to_string(),
                decimals: 6,
                initial_balances: vec![
                    Cw20Coin {
                        address: public_pool.to_string(),
                        amount: Uint128::new(1_000_000_000),
                    },
                    Cw20Coin {
                        address: router.to_string(),
                        amount: Uint128::new(1_000_000_000),
                    },
                ],
                mint: None,
                marketing: None,
            },
            &[],
            "zor-home",
            None,
        )
        .unwrap();
    let remote_token = app
        .instantiate_contract(
            cw20_code_id,
            owner.clone(),
            &cw20_base::msg::InstantiateMsg {
                name: "Zorro Synthetic".to_string(),
                symbol: "ZORS".to_string(),
                decimals: 6,
                initial_balances: vec![],
                mint: Some(MinterResponse {
                    minter: owner.to_string(),
                    cap: None,
                }),
                marketing: None,
            },
            &[],
            "zor-remote",
            None,
        )
        .unwrap();

    let deploy = |app: &mut App, chain_id: u64, token: &Addr| -> Chain {
        let orchestrator = app
            .instantiate_contract(
                orchestrator_code_id,
                owner.clone(),
                &instantiate_msg(chain_id, &relay, token, &router, &owner, &oracle),
                &[],
                "zorro-orchestrator",
                Some(owner.to_string()),
            )
            .unwrap();
        let vault = app
            .instantiate_contract(
                vault_code_id,
                owner.clone(),
                &mock_vault::InstantiateMsg {
                    orchestrator: orchestrator.to_string(),
                    stablecoin_denom: STABLE.to_string(),
                },
                &[],
                "vault",
                None,
            )
            .unwrap();
        app.execute_contract(
            owner.clone(),
            orchestrator.clone(),
            &ExecuteMsg::AddPool {
                alloc_point: 100,
                vault: vault.to_string(),
            },
            &[],
        )
        .unwrap();
        Chain {
            chain_id,
            orchestrator,
            token: token.clone(),
            vault,
        }
    };
    let home = deploy(&mut app, HOME_CHAIN, &home_token);
    let remote = deploy(&mut app, REMOTE_CHAIN, &remote_token);

    // Reward token plumbing
    app.execute_contract(
        public_pool.clone(),
        home_token.clone(),
        &Cw20ExecuteMsg::IncreaseAllowance {
            spender: home.orchestrator.to_string(),
            amount: Uint128::new(1_000_000_000),
            expires: None,
        },
        &[],
    )
    .unwrap();
    app.execute_contract(
        owner.clone(),
        remote_token.clone(),
        &Cw20ExecuteMsg::UpdateMinter {
            new_minter: Some(remote.orchestrator.to_string()),
        },
        &[],
    )
    .unwrap();

    // Chain registry on both sides, relay sender registration
    for (local, peer, peer_chain, peer_relay_id, peer_is_home) in [
        (&home, &remote, REMOTE_CHAIN, REMOTE_RELAY_ID, false),
        (&remote, &home, HOME_CHAIN, HOME_RELAY_ID, true),
    ] {
        app.execute_contract(
            owner.clone(),
            local.orchestrator.clone(),
            &ExecuteMsg::SetChainEndpoint {
                chain_id: peer_chain,
                relay_chain_id: peer_relay_id,
                orchestrator: peer.orchestrator.to_string(),
                is_home: peer_is_home,
                gas_budget: GAS_BUDGET,
                enabled: true,
            },
            &[],
        )
        .unwrap();
    }
    for (chain, relay_chain_id) in [(&home, HOME_RELAY_ID), (&remote, REMOTE_RELAY_ID)] {
        app.execute_contract(
            owner.clone(),
            relay.clone(),
            &mock_relay::ExecuteMsg::RegisterSender {
                address: chain.orchestrator.to_string(),
                relay_chain_id,
            },
            &[],
        )
        .unwrap();
    }

    // Gas for repatriation fees, profit for the vaults, pair liquidity for the router
    for chain in [&home, &remote] {
        app.send_tokens(
            owner.clone(),
            chain.orchestrator.clone(),
            &[coin(100_000_000, GAS)],
        )
        .unwrap();
        app.send_tokens(
            owner.clone(),
            chain.vault.clone(),
            &[coin(100_000_000, GAS), coin(100_000_000, STABLE)],
        )
        .unwrap();
    }
    app.send_tokens(owner.clone(), router.clone(), &[coin(1_000_000_000, PAIR)])
        .unwrap();

    for chain in [&home, &remote] {
        app.execute_contract(
            oracle.clone(),
            chain.orchestrator.clone(),
            &ExecuteMsg::SetEmissionRate(on_target_inputs()),
            &[],
        )
        .unwrap();
    }

    Suite {
        app,
        owner,
        oracle,
        user,
        public_pool,
        staking_vault,
        burn,
        relay,
        router,
        orchestrator_code_id,
        home,
        remote,
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn attr(res: &AppResponse, key: &str) -> Option<String> {
    res.events
        .iter()
        .flat_map(|e| &e.attributes)
        .find(|a| a.key == key)
        .map(|a| a.value.clone())
}

impl Suite {
    pub fn query<T: DeserializeOwned>(&self, orchestrator: &Addr, msg: &QueryMsg) -> T {
        self.app
            .wrap()
            .query_wasm_smart(orchestrator.to_string(), msg)
            .unwrap()
    }

    pub fn token_balance(&self, token: &Addr, account: &Addr) -> Uint128 {
        let res: BalanceResponse = self
            .app
            .wrap()
            .query_wasm_smart(
                token.to_string(),
                &Cw20QueryMsg::Balance {
                    address: account.to_string(),
                },
            )
            .unwrap();
        res.balance
    }

    pub fn token_supply(&self, token: &Addr) -> Uint128 {
        let res: TokenInfoResponse = self
            .app
            .wrap()
            .query_wasm_smart(token.to_string(), &Cw20QueryMsg::TokenInfo {})
            .unwrap();
        res.total_supply
    }

    pub fn bank_balance(&self, account: &Addr, denom: &str) -> Uint128 {
        self.app
            .wrap()
            .query_balance(account.to_string(), denom)
            .unwrap()
            .amount
    }

    pub fn advance_blocks(&mut self, blocks: u64) {
        self.app.update_block(|block| {
            block.height += blocks;
            block.time = block.time.plus_seconds(5 * blocks);
        });
    }

    pub fn advance_seconds(&mut self, seconds: u64) {
        self.app.update_block(|block| {
            block.time = block.time.plus_seconds(seconds);
        });
    }

    pub fn send_count(&self) -> u64 {
        self.app
            .wrap()
            .query_wasm_smart(self.relay.to_string(), &mock_relay::QueryMsg::SendCount {})
            .unwrap()
    }

    pub fn envelope(&self, id: u64) -> mock_relay::Envelope {
        self.app
            .wrap()
            .query_wasm_smart(self.relay.to_string(), &mock_relay::QueryMsg::Envelope { id })
            .unwrap()
    }

    pub fn deliver(&mut self, id: u64, haircut: u128) -> anyhow::Result<AppResponse> {
        self.app.execute_contract(
            self.owner.clone(),
            self.relay.clone(),
            &mock_relay::ExecuteMsg::Deliver {
                id,
                haircut: Uint128::new(haircut),
            },
            &[],
        )
    }

    /// `user` on the remote chain deposits into the home pool 0
    pub fn request_deposit(
        &mut self,
        value: u128,
        max_slippage: u16,
        weeks_committed: u32,
    ) -> anyhow::Result<AppResponse> {
        let dest_account = Binary::from(self.user.as_bytes());
        let quote: FeeQuoteResponse = self.query(
            &self.remote.orchestrator,
            &QueryMsg::CheckDepositFee {
                depositor: self.user.to_string(),
                dest_chain_id: HOME_CHAIN,
                pool_id: 0,
                value: Uint128::new(value),
                weeks_committed,
                max_slippage,
                dest_account: dest_account.clone(),
            },
        );
        self.app.execute_contract(
            self.user.clone(),
            self.remote.orchestrator.clone(),
            &ExecuteMsg::RequestDeposit {
                dest_chain_id: HOME_CHAIN,
                pool_id: 0,
                value: Uint128::new(value),
                weeks_committed,
                max_slippage,
                dest_account,
            },
            &[quote.fee, coin(value, STABLE)],
        )
    }

    /// `user` on the remote chain asks home to exit one of its tranches
    pub fn request_withdrawal(
        &mut self,
        tranche_id: u64,
        max_slippage: u16,
    ) -> anyhow::Result<AppResponse> {
        let quote: FeeQuoteResponse = self.query(
            &self.remote.orchestrator,
            &QueryMsg::CheckWithdrawalFee {
                withdrawer: self.user.to_string(),
                dest_chain_id: HOME_CHAIN,
                pool_id: 0,
                tranche_id,
                max_slippage,
            },
        );
        self.app.execute_contract(
            self.user.clone(),
            self.remote.orchestrator.clone(),
            &ExecuteMsg::RequestWithdrawal {
                dest_chain_id: HOME_CHAIN,
                pool_id: 0,
                tranche_id,
                max_slippage,
            },
            &[quote.fee],
        )
    }
}
