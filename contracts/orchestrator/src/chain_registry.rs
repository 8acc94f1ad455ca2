//! Chain registry
//!
//! Maps Zorro chain ids to relay chain ids and the orchestrator address on
//! each chain. The registry is the only authorization boundary for inbound
//! cross-chain calls: a delivery is accepted only when the relay-reported
//! origin resolves to an enabled endpoint whose orchestrator matches the
//! reported source address.

use cosmwasm_std::Storage;

use crate::codec::MAX_ACCOUNT_BYTES;
use crate::error::ContractError;
use crate::state::{ChainEndpoint, Config, CHAIN_ENDPOINTS, RELAY_CHAIN_INDEX};

/// Check an endpoint against the local configuration before storing it
pub fn validate_endpoint(config: &Config, endpoint: &ChainEndpoint) -> Result<(), ContractError> {
    if endpoint.chain_id == config.this_chain_id {
        return Err(ContractError::InvalidChainEndpoint {
            reason: "cannot register this chain as a remote endpoint".to_string(),
        });
    }
    if endpoint.orchestrator.is_empty() || endpoint.orchestrator.len() > MAX_ACCOUNT_BYTES {
        return Err(ContractError::InvalidChainEndpoint {
            reason: format!(
                "orchestrator address must be 1-{} bytes, got {}",
                MAX_ACCOUNT_BYTES,
                endpoint.orchestrator.len()
            ),
        });
    }
    let is_home = endpoint.chain_id == config.home_chain_id;
    if endpoint.is_home != is_home {
        return Err(ContractError::InvalidChainEndpoint {
            reason: format!(
                "chain {} home flag must be {} (home chain is {})",
                endpoint.chain_id, is_home, config.home_chain_id
            ),
        });
    }
    Ok(())
}

/// Insert or replace an endpoint, keeping the relay index consistent
pub fn save_endpoint(
    storage: &mut dyn Storage,
    config: &Config,
    endpoint: &ChainEndpoint,
) -> Result<(), ContractError> {
    validate_endpoint(config, endpoint)?;

    if let Some(owner) = RELAY_CHAIN_INDEX.may_load(storage, endpoint.relay_chain_id)? {
        if owner != endpoint.chain_id {
            return Err(ContractError::InvalidChainEndpoint {
                reason: format!(
                    "relay chain id {} already mapped to chain {}",
                    endpoint.relay_chain_id, owner
                ),
            });
        }
    }

    if let Some(previous) = CHAIN_ENDPOINTS.may_load(storage, endpoint.chain_id)? {
        if previous.relay_chain_id != endpoint.relay_chain_id {
            RELAY_CHAIN_INDEX.remove(storage, previous.relay_chain_id);
        }
    }

    CHAIN_ENDPOINTS.save(storage, endpoint.chain_id, endpoint)?;
    RELAY_CHAIN_INDEX.save(storage, endpoint.relay_chain_id, &endpoint.chain_id)?;
    Ok(())
}

pub fn remove_endpoint(
    storage: &mut dyn Storage,
    chain_id: u64,
) -> Result<ChainEndpoint, ContractError> {
    let endpoint = load_endpoint(storage, chain_id)?;
    RELAY_CHAIN_INDEX.remove(storage, endpoint.relay_chain_id);
    CHAIN_ENDPOINTS.remove(storage, chain_id);
    Ok(endpoint)
}

pub fn load_endpoint(storage: &dyn Storage, chain_id: u64) -> Result<ChainEndpoint, ContractError> {
    CHAIN_ENDPOINTS
        .may_load(storage, chain_id)?
        .ok_or(ContractError::ChainNotRegistered { chain_id })
}

/// Endpoint a new outbound request may be sent to
pub fn load_enabled_endpoint(
    storage: &dyn Storage,
    chain_id: u64,
) -> Result<ChainEndpoint, ContractError> {
    let endpoint = load_endpoint(storage, chain_id)?;
    if !endpoint.enabled {
        return Err(ContractError::ChainDisabled { chain_id });
    }
    Ok(endpoint)
}

/// Resolve the relay-reported origin of a delivery to a registered endpoint
pub fn authorize_origin(
    storage: &dyn Storage,
    relay_chain_id: u64,
    src_address: &str,
) -> Result<ChainEndpoint, ContractError> {
    let unauthorized = || ContractError::UnauthorizedOrigin {
        relay_chain_id,
        address: src_address.to_string(),
    };

    let chain_id = RELAY_CHAIN_INDEX
        .may_load(storage, relay_chain_id)?
        .ok_or_else(unauthorized)?;
    let endpoint = CHAIN_ENDPOINTS
        .may_load(storage, chain_id)?
        .ok_or_else(unauthorized)?;

    if endpoint.orchestrator != src_address {
        return Err(unauthorized());
    }
    if !endpoint.enabled {
        return Err(ContractError::ChainDisabled { chain_id });
    }
    Ok(endpoint)
}
