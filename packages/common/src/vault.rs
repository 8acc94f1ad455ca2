//! Vault strategy interface.
//!
//! Each pool is backed by one vault contract implementing its yield strategy.
//! The orchestrator only moves the stablecoin in and out and pushes fee
//! settings; swaps, liquidity provision and lending happen inside the vault.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint128;

#[cw_serde]
pub enum VaultExecuteMsg {
    /// Deposit the attached stablecoin into the strategy
    DepositWantToken {
        /// Minimum received factor out of 1000 for internal swaps
        max_slippage: u16,
    },
    /// Withdraw `amount` of want value and send the stablecoin to `recipient`
    WithdrawWantToken {
        amount: Uint128,
        max_slippage: u16,
        recipient: String,
    },
    /// Put idle want to work
    Farm {},
    /// Harvest and compound
    Earn {},
    /// Fee factors out of 10000 (10000 = no fee)
    SetFeeFactors {
        entrance_fee_factor: u64,
        withdraw_fee_factor: u64,
    },
}
