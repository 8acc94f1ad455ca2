//! Message types for the Zorro orchestrator contract
//!
//! Instantiation, execution and query messages, plus the query responses.
//! The relay callback variants mirror `common::relay::RelayReceiveMsg`
//! field for field so the relay can call any orchestrator.

use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Binary, Coin, Timestamp, Uint128, Uint256};

use crate::rewards::EmissionInputs;
use crate::state::{
    ChainEndpoint, Config, Pool, RequestKind, RequestStatus, RewardsState, Stats, TimeBoost,
    Tranche,
};

// ============================================================================
// Instantiate & Migrate
// ============================================================================

#[cw_serde]
pub struct MigrateMsg {}

/// Emission parameters supplied at instantiation
#[cw_serde]
pub struct RewardsParamsMsg {
    pub blocks_per_day: u64,
    pub base_reward_rate: u64,
    pub chain_multiplier: u64,
    pub oracle: String,
    pub start_block: Option<u64>,
    /// Defaults to 1 bps (0.01% per day)
    pub dist_factor_min: Option<u64>,
    /// Defaults to 20 bps (0.2% per day)
    pub dist_factor_max: Option<u64>,
    /// Defaults to enabled with a 0.2 coefficient
    pub time_boost: Option<TimeBoost>,
    pub max_weeks_committed: Option<u32>,
}

#[cw_serde]
pub struct InstantiateMsg {
    /// Defaults to the instantiating account
    pub owner: Option<String>,
    pub this_chain_id: u64,
    pub home_chain_id: u64,
    pub relay: String,
    pub stablecoin_denom: String,
    pub gas_denom: String,
    pub reward_token: String,
    pub public_pool: String,
    pub staking_vault: String,
    pub exchange_router: String,
    pub lp_pair_denom: String,
    pub burn_address: String,
    pub min_slippage_factor: u16,
    pub entrance_fee_factor_min: u64,
    pub withdraw_fee_factor_min: u64,
    pub rewards: RewardsParamsMsg,
}

// ============================================================================
// Execute Messages
// ============================================================================

#[cw_serde]
pub enum ExecuteMsg {
    // ========================================================================
    // Relay Callbacks
    // ========================================================================
    /// Asset + payload delivery. Authorization: configured relay, registered origin.
    OnAssetDelivery {
        /// Relay chain id of the origin
        src_chain_id: u64,
        /// Orchestrator on the origin chain
        src_address: String,
        payload: Binary,
    },

    /// Payload-only delivery. Authorization: configured relay, registered origin.
    OnMessageDelivery {
        src_chain_id: u64,
        src_address: String,
        payload: Binary,
    },

    // ========================================================================
    // Cross-Chain Requests
    // ========================================================================
    /// Deposit stablecoin into a pool hosted on another chain.
    ///
    /// Funds: `value` of the stablecoin plus the relay fee (`CheckDepositFee`).
    RequestDeposit {
        dest_chain_id: u64,
        pool_id: u64,
        value: Uint128,
        weeks_committed: u32,
        /// Minimum received factor out of 1000
        max_slippage: u16,
        /// Account on the destination chain allowed to claim rewards there
        dest_account: Binary,
    },

    /// Exit a tranche held on another chain. Funds: the relay fee.
    RequestWithdrawal {
        dest_chain_id: u64,
        pool_id: u64,
        tranche_id: u64,
        max_slippage: u16,
    },

    /// Hand harvested profit to the home chain. Caller: a registered pool vault.
    ///
    /// Funds: `buyback_amount + revshare_amount` stablecoin (plus the relay fee
    /// off the home chain).
    RequestDistributeEarnings {
        buyback_amount: Uint128,
        revshare_amount: Uint128,
        max_slippage: u16,
    },

    // ========================================================================
    // Local Pool Operations
    // ========================================================================
    /// Deposit the attached stablecoin into a pool on this chain
    Deposit {
        pool_id: u64,
        weeks_committed: u32,
        max_slippage: u16,
    },

    /// Exit one of the caller's tranches on this chain
    Withdraw {
        pool_id: u64,
        tranche_id: u64,
        max_slippage: u16,
    },

    /// Pay out pending rewards of a tranche to its claim account
    ClaimRewards {
        pool_id: u64,
        /// Tranche owner key (origin account bytes)
        account: Binary,
        tranche_id: u64,
    },

    UpdatePool {
        pool_id: u64,
    },

    MassUpdatePools {},

    /// Recompute the emission rate. Caller: the emission oracle.
    SetEmissionRate(EmissionInputs),

    // ========================================================================
    // Administration (owner)
    // ========================================================================
    AddPool {
        alloc_point: u64,
        vault: String,
    },

    SetPool {
        pool_id: u64,
        alloc_point: u64,
    },

    /// Push fee factors (out of 10000) to a pool's vault
    SetVaultFees {
        pool_id: u64,
        entrance_fee_factor: u64,
        withdraw_fee_factor: u64,
    },

    /// Insert or replace a chain endpoint
    SetChainEndpoint {
        chain_id: u64,
        relay_chain_id: u64,
        orchestrator: String,
        is_home: bool,
        gas_budget: u64,
        enabled: bool,
    },

    RemoveChainEndpoint {
        chain_id: u64,
    },

    /// Update any subset of the configuration
    UpdateConfig {
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
    },

    /// Update any subset of the emission parameters
    UpdateRewardsParams {
        blocks_per_day: Option<u64>,
        dist_factor_min: Option<u64>,
        dist_factor_max: Option<u64>,
        base_reward_rate: Option<u64>,
        chain_multiplier: Option<u64>,
        /// Can only be set once
        start_block: Option<u64>,
        oracle: Option<String>,
        time_boost: Option<TimeBoost>,
        max_weeks_committed: Option<u32>,
    },

    /// Propose a new owner (7-day timelock)
    ProposeOwner {
        new_owner: String,
    },

    AcceptOwner {},

    CancelOwnerProposal {},

    /// Give up on an outbound request the relay never delivered
    MarkRequestFailed {
        nonce: u64,
    },

    /// Hand an outbound request to the relay again under its original nonce.
    ///
    /// Funds: the relay fee, plus the bridged asset for asset-carrying requests.
    ResendRequest {
        nonce: u64,
    },
}

// ============================================================================
// Query Messages
// ============================================================================

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(Config)]
    Config {},

    #[returns(Option<PendingOwnerResponse>)]
    PendingOwner {},

    #[returns(RewardsState)]
    RewardsState {},

    #[returns(Stats)]
    Stats {},

    #[returns(ChainEndpoint)]
    Chain { chain_id: u64 },

    #[returns(ChainsResponse)]
    Chains {
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    #[returns(Pool)]
    Pool { pool_id: u64 },

    #[returns(PoolsResponse)]
    Pools {
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    #[returns(TrancheResponse)]
    Tranche {
        pool_id: u64,
        account: Binary,
        tranche_id: u64,
    },

    #[returns(TranchesResponse)]
    Tranches {
        pool_id: u64,
        account: Binary,
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    /// Pending rewards of one tranche, or all of the account's tranches when `tranche_id` is None
    #[returns(PendingRewardsResponse)]
    PendingRewards {
        pool_id: u64,
        account: Binary,
        tranche_id: Option<u64>,
    },

    #[returns(TimeMultiplierResponse)]
    TimeMultiplier { weeks_committed: u32 },

    /// Relay fee for `RequestDeposit` sent by `depositor`
    #[returns(FeeQuoteResponse)]
    CheckDepositFee {
        depositor: String,
        dest_chain_id: u64,
        pool_id: u64,
        value: Uint128,
        weeks_committed: u32,
        max_slippage: u16,
        dest_account: Binary,
    },

    #[returns(FeeQuoteResponse)]
    CheckWithdrawalFee {
        withdrawer: String,
        dest_chain_id: u64,
        pool_id: u64,
        tranche_id: u64,
        max_slippage: u16,
    },

    #[returns(FeeQuoteResponse)]
    CheckRepatriationFee {
        origin_chain_id: u64,
        pool_id: u64,
        tranche_id: u64,
        origin_recipient: Binary,
        burnable_rewards: Uint128,
        rewards_due: Uint128,
    },

    #[returns(FeeQuoteResponse)]
    CheckDistributeEarningsFee {
        buyback_amount: Uint128,
        revshare_amount: Uint128,
        max_slippage: u16,
    },

    #[returns(OutboundRequestResponse)]
    OutboundRequest { nonce: u64 },

    #[returns(OutboundRequestsResponse)]
    OutboundRequests {
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    /// Inbound record by 32-byte request id
    #[returns(InboundRequestResponse)]
    InboundRequest { request_id: Binary },
}

// ============================================================================
// Query Responses
// ============================================================================

#[cw_serde]
pub struct PendingOwnerResponse {
    pub new_address: Addr,
    pub execute_after: Timestamp,
}

#[cw_serde]
pub struct ChainsResponse {
    pub chains: Vec<ChainEndpoint>,
}

#[cw_serde]
pub struct PoolsResponse {
    pub pools: Vec<Pool>,
    pub total_alloc_point: u64,
}

#[cw_serde]
pub struct TrancheResponse {
    pub pool_id: u64,
    pub account: Binary,
    pub tranche_id: u64,
    pub tranche: Tranche,
    pub pending_rewards: Uint128,
}

#[cw_serde]
pub struct TranchesResponse {
    pub tranches: Vec<TrancheResponse>,
}

#[cw_serde]
pub struct PendingRewardsResponse {
    pub pending: Uint128,
    /// Accumulator advanced virtually to the current block
    pub acc_reward_per_unit: Uint256,
}

#[cw_serde]
pub struct TimeMultiplierResponse {
    pub weeks_committed: u32,
    pub multiplier: Uint128,
}

#[cw_serde]
pub struct FeeQuoteResponse {
    pub fee: Coin,
    pub payload_len: u32,
}

#[cw_serde]
pub struct OutboundRequestResponse {
    pub nonce: u64,
    /// Hex with 0x prefix
    pub request_id: String,
    pub kind: RequestKind,
    pub origin_chain_id: u64,
    pub dest_chain_id: u64,
    pub payload: Binary,
    pub payload_hash: String,
    pub asset: Option<Coin>,
    pub status: RequestStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[cw_serde]
pub struct OutboundRequestsResponse {
    pub requests: Vec<OutboundRequestResponse>,
}

#[cw_serde]
pub struct InboundRequestResponse {
    pub request_id: String,
    pub kind: RequestKind,
    pub origin_chain_id: u64,
    pub nonce: u64,
    pub payload_hash: String,
    pub status: RequestStatus,
    pub applied_at: Timestamp,
}
