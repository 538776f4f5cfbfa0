//! Resolves caller-supplied chain ids and names to registry entries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::registry::{NetworkEntry, NetworkRegistry};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Unable to find network details for chainId: {chain_id} or chainName: {chain_name}")]
    NotFound { chain_id: i64, chain_name: String },
    #[error("Chain ID and chain name baseUrl mismatch: {by_id} vs {by_name}")]
    Mismatch { by_id: String, by_name: String },
}

/// Either form a caller may use to identify a network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkQuery {
    Id(i64),
    Name(String),
}

impl From<i64> for NetworkQuery {
    fn from(id: i64) -> Self {
        NetworkQuery::Id(id)
    }
}

impl From<&str> for NetworkQuery {
    fn from(name: &str) -> Self {
        NetworkQuery::Name(name.to_string())
    }
}

impl From<String> for NetworkQuery {
    fn from(name: String) -> Self {
        NetworkQuery::Name(name)
    }
}

/// A registry entry together with its chain id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedNetwork {
    pub network_name: String,
    pub base_url: String,
    pub rpc: Option<String>,
    pub chain_id: u64,
}

impl ResolvedNetwork {
    fn from_entry(entry: &NetworkEntry, chain_id: usize) -> Self {
        Self {
            network_name: entry.name.to_string(),
            base_url: entry.api_base_url.to_string(),
            rpc: entry.rpc_endpoint.map(str::to_string),
            chain_id: chain_id as u64,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkResolver {
    registry: NetworkRegistry,
}

impl NetworkResolver {
    pub fn new(registry: NetworkRegistry) -> Self {
        Self { registry }
    }

    /// Every registry entry, resolved, in chain id order.
    pub fn all(&self) -> Vec<ResolvedNetwork> {
        self.registry
            .list_all()
            .iter()
            .enumerate()
            .map(|(chain_id, entry)| ResolvedNetwork::from_entry(entry, chain_id))
            .collect()
    }

    /// Numeric input (a number, or a string that parses fully as an integer)
    /// is looked up as a chain id first; anything that fails that lookup falls
    /// through to a case-insensitive name match.
    pub fn resolve_by_name_or_id(&self, query: impl Into<NetworkQuery>) -> Option<ResolvedNetwork> {
        match query.into() {
            NetworkQuery::Id(id) => self.resolve_chain_id(id),
            NetworkQuery::Name(input) => input
                .parse::<i64>()
                .ok()
                .and_then(|id| self.resolve_chain_id(id))
                .or_else(|| self.resolve_name(&input)),
        }
    }

    /// Resolves both halves of a (chain id, chain name) pair and checks they
    /// point at the same network. Returns the network resolved from the name.
    pub fn validate_consistent_pair(
        &self,
        chain_id: i64,
        chain_name: &str,
    ) -> Result<ResolvedNetwork, NetworkError> {
        let by_id = self.resolve_by_name_or_id(chain_id);
        let by_name = self.resolve_by_name_or_id(chain_name);

        let (by_id, by_name) = match (by_id, by_name) {
            (Some(by_id), Some(by_name)) => (by_id, by_name),
            _ => {
                return Err(NetworkError::NotFound {
                    chain_id,
                    chain_name: chain_name.to_string(),
                })
            }
        };

        if by_id.base_url != by_name.base_url {
            return Err(NetworkError::Mismatch {
                by_id: by_id.base_url,
                by_name: by_name.base_url,
            });
        }

        Ok(by_name)
    }

    fn resolve_chain_id(&self, id: i64) -> Option<ResolvedNetwork> {
        let id = u64::try_from(id).ok()?;
        self.registry
            .by_chain_id(id)
            .map(|entry| ResolvedNetwork::from_entry(entry, id as usize))
    }

    fn resolve_name(&self, name: &str) -> Option<ResolvedNetwork> {
        let chain_id = self.registry.position_ignore_case(name)?;
        self.registry
            .by_chain_id(chain_id as u64)
            .map(|entry| ResolvedNetwork::from_entry(entry, chain_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::registry::NETWORKS;

    #[test]
    fn every_entry_resolves_by_id_and_by_name_in_any_case() {
        let resolver = NetworkResolver::default();
        for (i, entry) in NETWORKS.iter().enumerate() {
            let by_id = resolver.resolve_by_name_or_id(i as i64).unwrap();
            assert_eq!(by_id.network_name, entry.name);
            assert_eq!(by_id.chain_id, i as u64);

            for name in [
                entry.name.to_string(),
                entry.name.to_lowercase(),
                entry.name.to_uppercase(),
            ] {
                let by_name = resolver.resolve_by_name_or_id(name).unwrap();
                assert_eq!(by_name, by_id);
            }
        }
    }

    #[test]
    fn numeric_strings_resolve_as_chain_ids() {
        let resolver = NetworkResolver::default();
        let kusama = resolver.resolve_by_name_or_id("1").unwrap();
        assert_eq!(kusama.network_name, "Kusama");
        assert_eq!(kusama.chain_id, 1);
    }

    #[test]
    fn unknown_inputs_resolve_to_nothing() {
        let resolver = NetworkResolver::default();
        assert!(resolver.resolve_by_name_or_id(NETWORKS.len() as i64).is_none());
        assert!(resolver.resolve_by_name_or_id(-1i64).is_none());
        assert!(resolver.resolve_by_name_or_id("9999").is_none());
        assert!(resolver.resolve_by_name_or_id("Atlantis").is_none());
        assert!(resolver.resolve_by_name_or_id("").is_none());
    }

    #[test]
    fn matching_pair_validates() {
        let resolver = NetworkResolver::default();
        let network = resolver.validate_consistent_pair(0, "polkadot").unwrap();
        assert_eq!(network.network_name, "Polkadot");
        assert_eq!(network.rpc.as_deref(), Some("wss://rpc.polkadot.io"));
    }

    #[test]
    fn every_mismatched_pair_is_rejected() {
        let resolver = NetworkResolver::default();
        for i in 0..NETWORKS.len() {
            for (j, other) in NETWORKS.iter().enumerate() {
                let result = resolver.validate_consistent_pair(i as i64, other.name);
                if i == j {
                    assert!(result.is_ok());
                } else {
                    assert!(matches!(result, Err(NetworkError::Mismatch { .. })));
                }
            }
        }
    }

    #[test]
    fn unresolvable_half_is_not_found() {
        let resolver = NetworkResolver::default();
        let err = resolver.validate_consistent_pair(0, "Atlantis").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to find network details for chainId: 0 or chainName: Atlantis"
        );
        assert!(matches!(
            resolver.validate_consistent_pair(500, "Polkadot"),
            Err(NetworkError::NotFound { .. })
        ));
    }

    #[test]
    fn mismatch_message_names_both_base_urls() {
        let resolver = NetworkResolver::default();
        let err = resolver.validate_consistent_pair(0, "Kusama").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Chain ID and chain name baseUrl mismatch: https://polkadot.api.subscan.io vs https://kusama.api.subscan.io"
        );
    }
}
