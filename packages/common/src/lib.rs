//! Common - Shared Types and Interfaces for Zorro Contracts
//!
//! This package provides the asset types used across the Zorro contracts and
//! the message interfaces of the external collaborators the orchestrator
//! talks to:
//! - `relay` - cross-chain bridge + messenger
//! - `vault` - yield strategy of a single pool
//! - `exchange` - swap/liquidity router used for buybacks and revshare

pub mod asset;
pub mod exchange;
pub mod relay;
pub mod vault;

pub use asset::{Asset, AssetInfo};
