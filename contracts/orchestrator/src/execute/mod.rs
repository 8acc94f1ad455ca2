//! Execute handlers for the Zorro orchestrator contract.
//!
//! This module contains all execute message handlers, organized by category:
//! - `outgoing` - RequestDeposit and RequestWithdrawal, plus relay dispatch helpers
//! - `inbound` - relay callbacks and the inbound dispatch state machine
//! - `earnings` - earnings distribution (remote hand-off and home buyback/revshare)
//! - `pools` - pool management, emission rate, local deposit/withdraw/claim
//! - `config` - chain endpoints, configuration, rewards parameters, vault fees
//! - `admin` - owner handover, request failure marking and resend

mod admin;
mod config;
mod earnings;
mod inbound;
mod outgoing;
mod pools;

pub use admin::*;
pub use config::*;
pub use earnings::*;
pub use inbound::*;
pub use outgoing::*;
pub use pools::*;
