//! Zorro Orchestrator - Multi-Chain Reward Emission and Cross-Chain Flows
//!
//! One orchestrator runs on every supported chain. Each instance hosts the
//! pools of its chain, emits reward tokens to them, and exchanges requests
//! with the other orchestrators through an external relay.
//!
//! # Deposit Flow (Cross-Chain)
//! 1. User calls `RequestDeposit` with stablecoin and the relay fee
//! 2. Relay bridges the stablecoin and payload to the hosting chain
//! 3. Hosting orchestrator checks slippage, credits a tranche, funds the vault
//!
//! # Withdrawal Flow (Cross-Chain)
//! 1. User calls `RequestWithdrawal` with the relay fee (payload only)
//! 2. Hosting orchestrator exits the tranche and pulls principal from the vault
//! 3. Principal and the reward split travel back as a repatriation
//! 4. Origin orchestrator pays the principal and rewards due to the user
//!
//! # Earnings Flow
//! Vaults hand harvested profit to their orchestrator. Remote chains bridge
//! it to the home chain, which buys back reward-token liquidity (burned) and
//! sends revenue share to the staking vault.
//!
//! # Safety
//! - Inbound requests authorized by relay caller and registered origin
//! - Request ids deduplicated so a payload applies at most once
//! - Slippage floors on every bridged or swapped amount
//! - 7-day timelock on owner handover

pub mod chain_registry;
pub mod codec;
pub mod contract;
pub mod error;
pub mod exchange;
mod execute;
pub mod fee_estimator;
pub mod hash;
pub mod msg;
mod query;
pub mod rewards;
pub mod state;

pub use crate::codec::{decode_request, encode_request, CrossChainRequest};
pub use crate::error::ContractError;
pub use crate::hash::{compute_request_id, keccak256};
