//! State definitions for the Zorro orchestrator contract
//!
//! This module defines all storage structures and state maps: configuration,
//! the chain registry, reward emission state, pools and tranches, and the
//! audit trail of cross-chain requests.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Binary, Coin, Timestamp, Uint128, Uint256};
use cw_storage_plus::{Item, Map};

// ============================================================================
// Core Configuration
// ============================================================================

/// Contract configuration
#[cw_serde]
pub struct Config {
    /// Owner address (holds the configuration capability)
    pub owner: Addr,
    /// Whether new requests and local deposits are currently refused
    pub paused: bool,
    /// Zorro chain id of the chain this instance runs on
    pub this_chain_id: u64,
    /// Zorro chain id of the home chain (reward minting authority, public pool)
    pub home_chain_id: u64,
    /// Relay contract (bridge + messenger)
    pub relay: Addr,
    /// Denom of the stablecoin used for deposits, repatriation and earnings
    pub stablecoin_denom: String,
    /// Native gas denom the relay is prepaid in
    pub gas_denom: String,
    /// Reward token (CW20)
    pub reward_token: Addr,
    /// Pre-funded public reward pool (home chain only)
    pub public_pool: Addr,
    /// Staking vault receiving revshare (home chain only)
    pub staking_vault: Addr,
    /// Exchange router used for buyback and revshare swaps (home chain only)
    pub exchange_router: Addr,
    /// Native counterpart of the reward token in its liquidity pair
    pub lp_pair_denom: String,
    /// Destination of burned LP receipts
    pub burn_address: Addr,
    /// Lowest slippage factor (out of 1000) a request may specify
    pub min_slippage_factor: u16,
    /// Lowest entrance fee factor (out of 10000) accepted for vaults
    pub entrance_fee_factor_min: u64,
    /// Lowest withdrawal fee factor (out of 10000) accepted for vaults
    pub withdraw_fee_factor_min: u64,
}

impl Config {
    pub fn is_home_chain(&self) -> bool {
        self.this_chain_id == self.home_chain_id
    }
}

/// Pending owner change proposal
#[cw_serde]
pub struct PendingOwner {
    /// Proposed new owner address
    pub new_address: Addr,
    /// Block time when the change can be accepted
    pub execute_after: Timestamp,
}

// ============================================================================
// Chain Registry
// ============================================================================

/// One chain the orchestrator exchanges messages with
#[cw_serde]
pub struct ChainEndpoint {
    /// Zorro-internal chain id
    pub chain_id: u64,
    /// Chain id as understood by the relay
    pub relay_chain_id: u64,
    /// Orchestrator address on that chain (opaque string, may be non-bech32)
    pub orchestrator: String,
    /// Whether this is the home chain
    pub is_home: bool,
    /// Native gas budget prepaid for deliveries to this chain
    pub gas_budget: u64,
    /// Whether requests to and from this chain are accepted
    pub enabled: bool,
}

// ============================================================================
// Reward Emission
// ============================================================================

/// Time-commitment boost parameters
#[cw_serde]
pub struct TimeBoost {
    pub enabled: bool,
    /// Weight of sqrt(weeks), in basis points (2000 = 0.2)
    pub coefficient_bps: u64,
}

/// Per-chain emission parameters and the current rate
#[cw_serde]
pub struct RewardsState {
    pub blocks_per_day: u64,
    /// Lower rail for the daily distribution factor (basis points)
    pub dist_factor_min: u64,
    /// Upper rail for the daily distribution factor (basis points)
    pub dist_factor_max: u64,
    /// Daily distribution factor when exactly on target (basis points)
    pub base_reward_rate: u64,
    /// This chain's share weight of global emissions
    pub chain_multiplier: u64,
    /// Reward tokens emitted per block on this chain
    pub emission_rate: Uint128,
    /// First block that earns rewards (immutable once set)
    pub start_block: Option<u64>,
    /// Account allowed to recompute the emission rate
    pub oracle: Addr,
    pub time_boost: TimeBoost,
    pub max_weeks_committed: u32,
}

// ============================================================================
// Pools & Tranches
// ============================================================================

/// One investable strategy on this chain
#[cw_serde]
pub struct Pool {
    pub id: u64,
    /// Accumulated reward per unit of contribution, scaled by ACC_REWARD_PRECISION
    pub acc_reward_per_unit: Uint256,
    pub last_reward_block: u64,
    /// Sum of contributions of all active tranches
    pub total_contribution: Uint128,
    pub alloc_point: u64,
    pub vault: Addr,
    /// Vault entrance fee factor out of 10000 (10000 = no fee)
    pub entrance_fee_factor: u64,
    /// Vault withdrawal fee factor out of 10000, applied to returned principal
    pub withdraw_fee_factor: u64,
}

/// One contribution by one account to one pool
#[cw_serde]
pub struct Tranche {
    /// Principal held by the vault for this tranche, after its entrance fee
    pub want_amount: Uint128,
    /// Boost fixed at creation, scaled by TIME_MULTIPLIER_PRECISION
    pub time_multiplier: Uint128,
    /// Boosted units counted in the pool total
    pub contribution: Uint128,
    /// Accumulator value at the last sync
    pub reward_debt: Uint256,
    pub weeks_committed: u32,
    /// Chain the depositor lives on
    pub origin_chain_id: u64,
    /// Account on this chain allowed to claim rewards locally
    pub dest_account: Binary,
    pub enter_timestamp: u64,
    /// Zero while active
    pub exit_timestamp: u64,
}

impl Tranche {
    pub fn is_exited(&self) -> bool {
        self.exit_timestamp != 0
    }
}

// ============================================================================
// Cross-Chain Requests
// ============================================================================

#[cw_serde]
#[derive(Copy)]
pub enum RequestKind {
    Deposit,
    Withdrawal,
    Repatriation,
    DistributeEarnings,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Deposit => "deposit",
            RequestKind::Withdrawal => "withdrawal",
            RequestKind::Repatriation => "repatriation",
            RequestKind::DistributeEarnings => "distribute_earnings",
        }
    }
}

#[cw_serde]
#[derive(Copy)]
pub enum RequestStatus {
    Sent,
    Delivered,
    Failed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Sent => "sent",
            RequestStatus::Delivered => "delivered",
            RequestStatus::Failed => "failed",
        }
    }
}

/// Request dispatched from this chain
#[cw_serde]
pub struct OutboundRequest {
    pub nonce: u64,
    pub request_id: [u8; 32],
    pub kind: RequestKind,
    pub origin_chain_id: u64,
    pub dest_chain_id: u64,
    pub payload: Binary,
    pub payload_hash: [u8; 32],
    /// Asset bridged with the payload, if any
    pub asset: Option<Coin>,
    pub status: RequestStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request applied on this chain
#[cw_serde]
pub struct InboundRequest {
    pub request_id: [u8; 32],
    pub kind: RequestKind,
    pub origin_chain_id: u64,
    pub nonce: u64,
    pub payload_hash: [u8; 32],
    pub status: RequestStatus,
    pub applied_at: Timestamp,
}

/// Orchestrator statistics and reward reconciliation counters
#[cw_serde]
#[derive(Default)]
pub struct Stats {
    pub total_outbound_requests: u64,
    pub total_inbound_requests: u64,
    /// Rewards minted on this (non-home) chain, to reconcile with home accounting
    pub synthetic_rewards_minted: Uint128,
    /// Rewards forfeited on this (non-home) chain not yet reported to home
    pub synthetic_rewards_slashed: Uint128,
    /// Slashed rewards reported by remote chains (home chain only)
    pub slashed_rewards_absorbed: Uint128,
    pub total_buyback: Uint128,
    pub total_revshare: Uint128,
}

// ============================================================================
// Constants
// ============================================================================

/// Contract name for cw2 migration info
pub const CONTRACT_NAME: &str = "crates.io:zorro-orchestrator";

/// Contract version for cw2 migration info
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Storage layout version written by this code
pub const CURRENT_SCHEMA_VERSION: u16 = 2;

/// 7 days in seconds for owner change timelock
pub const OWNER_TIMELOCK_DURATION: u64 = 604_800;

/// Fixed-point scale of `Pool::acc_reward_per_unit`
pub const ACC_REWARD_PRECISION: u128 = 1_000_000_000_000_000_000_000_000;

/// Fixed-point scale of time multipliers (1.0 = 1e12)
pub const TIME_MULTIPLIER_PRECISION: u128 = 1_000_000_000_000;

/// Basis points denominator (10000 = 100%)
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Slippage factors are expressed out of 1000
pub const SLIPPAGE_DENOMINATOR: u16 = 1000;

/// Fee factors are expressed out of 10000 (10000 = no fee)
pub const FEE_FACTOR_MAX: u64 = 10_000;

pub const SECONDS_PER_WEEK: u64 = 604_800;

/// Default lower rail: 0.01% of the public pool per day
pub const DEFAULT_DIST_FACTOR_MIN: u64 = 1;

/// Default upper rail: 0.2% of the public pool per day
pub const DEFAULT_DIST_FACTOR_MAX: u64 = 20;

/// Default sqrt(weeks) weight: 0.2
pub const DEFAULT_TIME_BOOST_COEFFICIENT_BPS: u64 = 2_000;

pub const DEFAULT_MAX_WEEKS_COMMITTED: u32 = 520;

// ============================================================================
// Core State Storage
// ============================================================================

pub const CONFIG: Item<Config> = Item::new("config");

pub const PENDING_OWNER: Item<PendingOwner> = Item::new("pending_owner");

pub const STATS: Item<Stats> = Item::new("stats");

/// Storage layout version (see `contract::migrate`)
pub const SCHEMA_VERSION: Item<u16> = Item::new("schema_version");

pub const REWARDS_STATE: Item<RewardsState> = Item::new("rewards_state");

// ============================================================================
// Chain Registry Storage
// ============================================================================

/// Key: Zorro chain id, Value: ChainEndpoint
pub const CHAIN_ENDPOINTS: Map<u64, ChainEndpoint> = Map::new("chain_endpoints");

/// Key: relay chain id, Value: Zorro chain id
pub const RELAY_CHAIN_INDEX: Map<u64, u64> = Map::new("relay_chain_index");

// ============================================================================
// Pool & Tranche Storage
// ============================================================================

/// Next pool id
pub const POOL_COUNT: Item<u64> = Item::new("pool_count");

pub const POOLS: Map<u64, Pool> = Map::new("pools");

/// Key: vault address, Value: pool id
pub const POOL_BY_VAULT: Map<&Addr, u64> = Map::new("pool_by_vault");

/// Sum of alloc points over all pools
pub const TOTAL_ALLOC_POINT: Item<u64> = Item::new("total_alloc_point");

/// Key: (pool id, account bytes, tranche id)
pub const TRANCHES: Map<(u64, &[u8], u64), Tranche> = Map::new("tranches");

/// Next tranche id per (pool id, account bytes)
pub const TRANCHE_COUNT: Map<(u64, &[u8]), u64> = Map::new("tranche_count");

// ============================================================================
// Cross-Chain Request Storage
// ============================================================================

/// Next outbound request nonce
pub const OUTBOUND_NONCE: Item<u64> = Item::new("outbound_nonce");

/// Key: nonce, Value: OutboundRequest
pub const OUTBOUND_REQUESTS: Map<u64, OutboundRequest> = Map::new("outbound_requests");

/// Key: 32-byte request id, Value: InboundRequest
pub const INBOUND_REQUESTS: Map<&[u8], InboundRequest> = Map::new("inbound_requests");

/// Outstanding withdrawal requests sent from this chain.
/// Key: (account bytes, host chain ‖ pool ‖ tranche as 24 bytes), Value: outbound nonce
pub const PENDING_WITHDRAWALS: Map<(&[u8], &[u8]), u64> = Map::new("pending_withdrawals");

/// Composite key for `PENDING_WITHDRAWALS`
pub fn withdrawal_key(host_chain_id: u64, pool_id: u64, tranche_id: u64) -> [u8; 24] {
    let mut key = [0u8; 24];
    key[0..8].copy_from_slice(&host_chain_id.to_be_bytes());
    key[8..16].copy_from_slice(&pool_id.to_be_bytes());
    key[16..24].copy_from_slice(&tranche_id.to_be_bytes());
    key
}
