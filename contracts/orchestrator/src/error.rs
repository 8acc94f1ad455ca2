//! Error types for the Zorro orchestrator contract
//!
//! Every fatal condition carries a reason that ends up in the transaction log,
//! so off-chain monitoring can tell failures apart.

use cosmwasm_std::{
    ConversionOverflowError, DivideByZeroError, OverflowError, StdError, Uint128,
};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("{0}")]
    DivideByZero(#[from] DivideByZeroError),

    #[error("{0}")]
    ConversionOverflow(#[from] ConversionOverflowError),

    // ========================================================================
    // Authorization Errors
    // ========================================================================

    #[error("Unauthorized: only owner can perform this action")]
    Unauthorized,

    #[error("Unauthorized: only the emission oracle can set the emission rate")]
    UnauthorizedOracle,

    #[error("Unauthorized: only pending owner can accept")]
    UnauthorizedPendingOwner,

    #[error("Unauthorized: caller is not the configured relay")]
    UnauthorizedRelay,

    #[error("Unauthorized origin: {address} is not the registered orchestrator for relay chain {relay_chain_id}")]
    UnauthorizedOrigin {
        relay_chain_id: u64,
        address: String,
    },

    #[error("Unauthorized: caller is not a registered pool vault")]
    UnauthorizedVault,

    #[error("Unauthorized: caller may not manage tranche {tranche_id} of pool {pool_id}")]
    UnauthorizedTrancheAccess { pool_id: u64, tranche_id: u64 },

    // ========================================================================
    // Owner Handover Errors
    // ========================================================================

    #[error("No pending owner change")]
    NoPendingOwner,

    #[error("Timelock not expired: {remaining_seconds} seconds remaining")]
    TimelockNotExpired { remaining_seconds: u64 },

    // ========================================================================
    // State Errors
    // ========================================================================

    #[error("Orchestrator is paused")]
    Paused,

    #[error("Chain not registered: {chain_id}")]
    ChainNotRegistered { chain_id: u64 },

    #[error("Chain disabled: {chain_id}")]
    ChainDisabled { chain_id: u64 },

    #[error("Invalid chain endpoint: {reason}")]
    InvalidChainEndpoint { reason: String },

    #[error("Pool not found: {pool_id}")]
    PoolNotFound { pool_id: u64 },

    #[error("Vault already registered for pool {pool_id}")]
    VaultAlreadyRegistered { pool_id: u64 },

    #[error("Tranche not found: pool {pool_id}, tranche {tranche_id}")]
    TrancheNotFound { pool_id: u64, tranche_id: u64 },

    #[error("Tranche already exited: pool {pool_id}, tranche {tranche_id}")]
    TrancheExited { pool_id: u64, tranche_id: u64 },

    #[error("Tranche {tranche_id} of pool {pool_id} does not originate from chain {chain_id}")]
    TrancheOriginMismatch {
        pool_id: u64,
        tranche_id: u64,
        chain_id: u64,
    },

    #[error("Withdrawal already pending for pool {pool_id}, tranche {tranche_id}")]
    WithdrawalAlreadyPending { pool_id: u64, tranche_id: u64 },

    #[error("Operation only available on the home chain")]
    NotHomeChain,

    #[error("Start block is immutable once set")]
    StartBlockImmutable,

    // ========================================================================
    // Cross-Chain Request Errors
    // ========================================================================

    #[error("Malformed payload: {reason}")]
    MalformedPayload { reason: String },

    #[error("Unknown function selector: 0x{selector}")]
    UnknownSelector { selector: String },

    #[error("Unexpected request: {reason}")]
    UnexpectedRequest { reason: String },

    #[error("Duplicate request: {request_id} already applied")]
    DuplicateRequest { request_id: String },

    #[error("Request not found: nonce {nonce}")]
    RequestNotFound { nonce: u64 },

    #[error("Request {nonce} cannot transition from {status}")]
    InvalidRequestStatus { nonce: u64, status: String },

    // ========================================================================
    // Amount & Funds Errors
    // ========================================================================

    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    #[error("Invalid funds: {reason}")]
    InvalidFunds { reason: String },

    #[error("Insufficient fee: expected {expected}{denom}, got {got}{denom}")]
    InsufficientFee {
        expected: Uint128,
        got: Uint128,
        denom: String,
    },

    #[error("Slippage exceeded: received {received}, minimum acceptable {minimum}")]
    SlippageExceeded { received: Uint128, minimum: Uint128 },

    #[error("Invalid slippage factor {factor}: must be between {min} and 1000")]
    InvalidSlippage { factor: u16, min: u16 },

    #[error("Invalid commitment: {weeks} weeks exceeds maximum of {max}")]
    InvalidCommitment { weeks: u32, max: u32 },

    #[error("Invalid address: {reason}")]
    InvalidAddress { reason: String },

    // ========================================================================
    // Configuration Errors
    // ========================================================================

    #[error("Invalid rewards parameter: {reason}")]
    InvalidRewardsParams { reason: String },

    #[error("Fee factor {factor} out of bounds [{min}, {max}]")]
    FeeFactorOutOfBounds { factor: u64, min: u64, max: u64 },

    #[error("Cannot migrate from schema version {stored} to {current}")]
    InvalidMigration { stored: u16, current: u16 },
}
