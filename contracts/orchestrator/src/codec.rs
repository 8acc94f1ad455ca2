//! Cross-chain request codec
//!
//! Payloads are transport-agnostic byte strings:
//!
//! ```text
//! | selector (4) | nonce (u64) | fields ... |
//! ```
//!
//! Integers are fixed-width big-endian (ids u64, amounts u128, weeks u32,
//! slippage u16). Accounts are raw bytes with a u16 length prefix so
//! non-bech32 addresses survive the round trip. Decoding is strict: unknown
//! selectors, truncated fields, over-long accounts, out-of-range slippage and
//! trailing bytes are all rejected.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Binary, Uint128};

use crate::error::ContractError;
use crate::hash::selector;
use crate::state::{RequestKind, SLIPPAGE_DENOMINATOR};

/// Longest account identifier carried in a payload
pub const MAX_ACCOUNT_BYTES: usize = 128;

pub const SELECTOR_LEN: usize = 4;

pub const DEPOSIT_SIGNATURE: &str =
    "receiveDepositRequest(uint64,uint64,uint128,uint32,uint16,bytes,bytes)";
pub const WITHDRAWAL_SIGNATURE: &str =
    "receiveWithdrawalRequest(uint64,uint64,bytes,uint64,uint64,uint16)";
pub const REPATRIATION_SIGNATURE: &str =
    "receiveRepatriationRequest(uint64,uint64,uint64,uint64,bytes,uint128,uint128)";
pub const DISTRIBUTE_EARNINGS_SIGNATURE: &str =
    "receiveDistributeEarningsRequest(uint64,uint64,uint128,uint128,uint128,uint16)";

// ============================================================================
// Request Types
// ============================================================================

/// Register a bridged deposit on the chain hosting the pool
#[cw_serde]
pub struct DepositRequest {
    pub pool_id: u64,
    /// Stablecoin value sent from the origin chain (before bridge costs)
    pub value: Uint128,
    pub weeks_committed: u32,
    /// Minimum received factor out of 1000
    pub max_slippage: u16,
    pub origin_account: Binary,
    pub dest_account: Binary,
}

/// Ask the chain hosting the pool to exit a tranche
#[cw_serde]
pub struct WithdrawalRequest {
    pub origin_chain_id: u64,
    pub origin_account: Binary,
    pub pool_id: u64,
    pub tranche_id: u64,
    pub max_slippage: u16,
}

/// Return principal and rewards to the origin chain
#[cw_serde]
pub struct RepatriationRequest {
    pub origin_chain_id: u64,
    pub pool_id: u64,
    pub tranche_id: u64,
    pub origin_recipient: Binary,
    pub burnable_rewards: Uint128,
    pub rewards_due: Uint128,
}

/// Hand harvested profit to the home chain
#[cw_serde]
pub struct DistributeEarningsRequest {
    pub remote_chain_id: u64,
    pub buyback_amount: Uint128,
    pub revshare_amount: Uint128,
    /// Rewards forfeited on the remote chain since the last report
    pub slashed_rewards: Uint128,
    pub max_slippage: u16,
}

#[cw_serde]
pub enum CrossChainRequest {
    Deposit(DepositRequest),
    Withdrawal(WithdrawalRequest),
    Repatriation(RepatriationRequest),
    DistributeEarnings(DistributeEarningsRequest),
}

impl CrossChainRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            CrossChainRequest::Deposit(_) => RequestKind::Deposit,
            CrossChainRequest::Withdrawal(_) => RequestKind::Withdrawal,
            CrossChainRequest::Repatriation(_) => RequestKind::Repatriation,
            CrossChainRequest::DistributeEarnings(_) => RequestKind::DistributeEarnings,
        }
    }
}

/// Function selector for a request kind
pub fn selector_for(kind: RequestKind) -> [u8; 4] {
    match kind {
        RequestKind::Deposit => selector(DEPOSIT_SIGNATURE),
        RequestKind::Withdrawal => selector(WITHDRAWAL_SIGNATURE),
        RequestKind::Repatriation => selector(REPATRIATION_SIGNATURE),
        RequestKind::DistributeEarnings => selector(DISTRIBUTE_EARNINGS_SIGNATURE),
    }
}

/// A decoded payload
#[cw_serde]
pub struct DecodedRequest {
    pub nonce: u64,
    pub request: CrossChainRequest,
}

// ============================================================================
// Encoding
// ============================================================================

struct PayloadWriter {
    buf: Vec<u8>,
}

impl PayloadWriter {
    fn new(kind: RequestKind, nonce: u64) -> Self {
        let mut buf = Vec::with_capacity(96);
        buf.extend_from_slice(&selector_for(kind));
        buf.extend_from_slice(&nonce.to_be_bytes());
        Self { buf }
    }

    fn u16(mut self, v: u16) -> Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn u32(mut self, v: u32) -> Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn u64(mut self, v: u64) -> Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn u128(mut self, v: Uint128) -> Self {
        self.buf.extend_from_slice(&v.u128().to_be_bytes());
        self
    }

    fn account(mut self, bytes: &[u8]) -> Result<Self, ContractError> {
        validate_account(bytes)?;
        self.buf
            .extend_from_slice(&(bytes.len() as u16).to_be_bytes());
        self.buf.extend_from_slice(bytes);
        Ok(self)
    }

    fn finish(self) -> Binary {
        Binary::from(self.buf)
    }
}

fn validate_account(bytes: &[u8]) -> Result<(), ContractError> {
    if bytes.len() > MAX_ACCOUNT_BYTES {
        return Err(ContractError::MalformedPayload {
            reason: format!(
                "account is {} bytes, maximum is {}",
                bytes.len(),
                MAX_ACCOUNT_BYTES
            ),
        });
    }
    Ok(())
}

fn validate_slippage(factor: u16) -> Result<(), ContractError> {
    if factor > SLIPPAGE_DENOMINATOR {
        return Err(ContractError::MalformedPayload {
            reason: format!("slippage factor {} exceeds {}", factor, SLIPPAGE_DENOMINATOR),
        });
    }
    Ok(())
}

pub fn encode_deposit_payload(
    nonce: u64,
    pool_id: u64,
    value: Uint128,
    weeks_committed: u32,
    max_slippage: u16,
    origin_account: &[u8],
    dest_account: &[u8],
) -> Result<Binary, ContractError> {
    validate_slippage(max_slippage)?;
    Ok(PayloadWriter::new(RequestKind::Deposit, nonce)
        .u64(pool_id)
        .u128(value)
        .u32(weeks_committed)
        .u16(max_slippage)
        .account(origin_account)?
        .account(dest_account)?
        .finish())
}

pub fn encode_withdrawal_payload(
    nonce: u64,
    origin_chain_id: u64,
    origin_account: &[u8],
    pool_id: u64,
    tranche_id: u64,
    max_slippage: u16,
) -> Result<Binary, ContractError> {
    validate_slippage(max_slippage)?;
    Ok(PayloadWriter::new(RequestKind::Withdrawal, nonce)
        .u64(origin_chain_id)
        .account(origin_account)?
        .u64(pool_id)
        .u64(tranche_id)
        .u16(max_slippage)
        .finish())
}

pub fn encode_repatriation_payload(
    nonce: u64,
    origin_chain_id: u64,
    pool_id: u64,
    tranche_id: u64,
    origin_recipient: &[u8],
    burnable_rewards: Uint128,
    rewards_due: Uint128,
) -> Result<Binary, ContractError> {
    Ok(PayloadWriter::new(RequestKind::Repatriation, nonce)
        .u64(origin_chain_id)
        .u64(pool_id)
        .u64(tranche_id)
        .account(origin_recipient)?
        .u128(burnable_rewards)
        .u128(rewards_due)
        .finish())
}

pub fn encode_distribute_earnings_payload(
    nonce: u64,
    remote_chain_id: u64,
    buyback_amount: Uint128,
    revshare_amount: Uint128,
    slashed_rewards: Uint128,
    max_slippage: u16,
) -> Result<Binary, ContractError> {
    validate_slippage(max_slippage)?;
    Ok(PayloadWriter::new(RequestKind::DistributeEarnings, nonce)
        .u64(remote_chain_id)
        .u128(buyback_amount)
        .u128(revshare_amount)
        .u128(slashed_rewards)
        .u16(max_slippage)
        .finish())
}

/// Encode any request
pub fn encode_request(nonce: u64, request: &CrossChainRequest) -> Result<Binary, ContractError> {
    match request {
        CrossChainRequest::Deposit(r) => encode_deposit_payload(
            nonce,
            r.pool_id,
            r.value,
            r.weeks_committed,
            r.max_slippage,
            r.origin_account.as_slice(),
            r.dest_account.as_slice(),
        ),
        CrossChainRequest::Withdrawal(r) => encode_withdrawal_payload(
            nonce,
            r.origin_chain_id,
            r.origin_account.as_slice(),
            r.pool_id,
            r.tranche_id,
            r.max_slippage,
        ),
        CrossChainRequest::Repatriation(r) => encode_repatriation_payload(
            nonce,
            r.origin_chain_id,
            r.pool_id,
            r.tranche_id,
            r.origin_recipient.as_slice(),
            r.burnable_rewards,
            r.rewards_due,
        ),
        CrossChainRequest::DistributeEarnings(r) => encode_distribute_earnings_payload(
            nonce,
            r.remote_chain_id,
            r.buyback_amount,
            r.revshare_amount,
            r.slashed_rewards,
            r.max_slippage,
        ),
    }
}

// ============================================================================
// Decoding
// ============================================================================

struct PayloadReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize, field: &str) -> Result<&'a [u8], ContractError> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.data.len());
        match end {
            Some(end) => {
                let slice = &self.data[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(ContractError::MalformedPayload {
                reason: format!("truncated at field {}", field),
            }),
        }
    }

    fn array<const N: usize>(&mut self, field: &str) -> Result<[u8; N], ContractError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, field)?);
        Ok(out)
    }

    fn u16(&mut self, field: &str) -> Result<u16, ContractError> {
        Ok(u16::from_be_bytes(self.array(field)?))
    }

    fn u32(&mut self, field: &str) -> Result<u32, ContractError> {
        Ok(u32::from_be_bytes(self.array(field)?))
    }

    fn u64(&mut self, field: &str) -> Result<u64, ContractError> {
        Ok(u64::from_be_bytes(self.array(field)?))
    }

    fn u128(&mut self, field: &str) -> Result<Uint128, ContractError> {
        Ok(Uint128::new(u128::from_be_bytes(self.array(field)?)))
    }

    fn slippage(&mut self, field: &str) -> Result<u16, ContractError> {
        let factor = self.u16(field)?;
        validate_slippage(factor)?;
        Ok(factor)
    }

    fn account(&mut self, field: &str) -> Result<Binary, ContractError> {
        let len = self.u16(field)? as usize;
        if len > MAX_ACCOUNT_BYTES {
            return Err(ContractError::MalformedPayload {
                reason: format!("{} is {} bytes, maximum is {}", field, len, MAX_ACCOUNT_BYTES),
            });
        }
        Ok(Binary::from(self.take(len, field)?))
    }

    fn finish(self) -> Result<(), ContractError> {
        if self.pos != self.data.len() {
            return Err(ContractError::MalformedPayload {
                reason: format!("{} trailing bytes", self.data.len() - self.pos),
            });
        }
        Ok(())
    }
}

/// Strip the selector and decode a payload
pub fn decode_request(payload: &[u8]) -> Result<DecodedRequest, ContractError> {
    let mut reader = PayloadReader::new(payload);
    let tag: [u8; SELECTOR_LEN] = reader.array("selector")?;
    let kind = [
        RequestKind::Deposit,
        RequestKind::Withdrawal,
        RequestKind::Repatriation,
        RequestKind::DistributeEarnings,
    ]
    .into_iter()
    .find(|kind| selector_for(*kind) == tag)
    .ok_or_else(|| ContractError::UnknownSelector {
        selector: hex::encode(tag),
    })?;

    let nonce = reader.u64("nonce")?;
    let request = match kind {
        RequestKind::Deposit => CrossChainRequest::Deposit(DepositRequest {
            pool_id: reader.u64("pool_id")?,
            value: reader.u128("value")?,
            weeks_committed: reader.u32("weeks_committed")?,
            max_slippage: reader.slippage("max_slippage")?,
            origin_account: reader.account("origin_account")?,
            dest_account: reader.account("dest_account")?,
        }),
        RequestKind::Withdrawal => CrossChainRequest::Withdrawal(WithdrawalRequest {
            origin_chain_id: reader.u64("origin_chain_id")?,
            origin_account: reader.account("origin_account")?,
            pool_id: reader.u64("pool_id")?,
            tranche_id: reader.u64("tranche_id")?,
            max_slippage: reader.slippage("max_slippage")?,
        }),
        RequestKind::Repatriation => CrossChainRequest::Repatriation(RepatriationRequest {
            origin_chain_id: reader.u64("origin_chain_id")?,
            pool_id: reader.u64("pool_id")?,
            tranche_id: reader.u64("tranche_id")?,
            origin_recipient: reader.account("origin_recipient")?,
            burnable_rewards: reader.u128("burnable_rewards")?,
            rewards_due: reader.u128("rewards_due")?,
        }),
        RequestKind::DistributeEarnings => {
            CrossChainRequest::DistributeEarnings(DistributeEarningsRequest {
                remote_chain_id: reader.u64("remote_chain_id")?,
                buyback_amount: reader.u128("buyback_amount")?,
                revshare_amount: reader.u128("revshare_amount")?,
                slashed_rewards: reader.u128("slashed_rewards")?,
                max_slippage: reader.slippage("max_slippage")?,
            })
        }
    };
    reader.finish()?;

    Ok(DecodedRequest { nonce, request })
}
