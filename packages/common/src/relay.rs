//! Relay (bridge + messenger) interface.
//!
//! The relay is an external point-to-point transport. Orchestrators hand it a
//! payload (optionally together with an asset) and prepay the delivery fee in
//! the native gas denom. On the destination chain the relay calls back into
//! the orchestrator with [`RelayReceiveMsg`].

use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Binary, Coin, Uint128};

/// Messages accepted by the relay contract
#[cw_serde]
pub enum RelayExecuteMsg {
    /// Bridge `amount` of `asset` together with `payload`.
    ///
    /// Funds attached: the asset plus the quoted fee.
    SendWithAsset {
        dest_chain_id: u64,
        dest_address: String,
        asset: String,
        amount: Uint128,
        payload: Binary,
    },

    /// Deliver `payload` only. Funds attached: the quoted fee.
    SendMessageOnly {
        dest_chain_id: u64,
        dest_address: String,
        payload: Binary,
        gas_budget: u64,
    },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum RelayQueryMsg {
    /// Fee required to deliver a payload of `payload_len` bytes to `dest_chain_id`
    #[returns(QuoteFeeResponse)]
    QuoteFee {
        dest_chain_id: u64,
        payload_len: u32,
        native_gas_budget: u64,
        with_asset: bool,
    },
}

#[cw_serde]
pub struct QuoteFeeResponse {
    pub fee: Coin,
}

/// Callbacks the relay invokes on the destination orchestrator.
///
/// `src_chain_id` is the relay-specific id of the origin chain and
/// `src_address` the orchestrator that sent the message there.
#[cw_serde]
pub enum RelayReceiveMsg {
    /// Delivered asset is attached as funds
    OnAssetDelivery {
        src_chain_id: u64,
        src_address: String,
        payload: Binary,
    },
    OnMessageDelivery {
        src_chain_id: u64,
        src_address: String,
        payload: Binary,
    },
}
