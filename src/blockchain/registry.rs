//! Canonical table of Subscan-indexed networks.
//!
//! A network's chain id is its zero-based position in [`NETWORKS`]. The ids are
//! handed out to tool callers, so entries must only ever be appended; inserting,
//! removing or reordering renumbers every network after the change.

use std::collections::HashMap;

use lazy_static::lazy_static;

/// A single network known to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkEntry {
    /// Canonical, case-sensitive network key (e.g. `Polkadot`)
    pub name: &'static str,
    /// Base URL of the network's Subscan API
    pub api_base_url: &'static str,
    /// WebSocket endpoint of a public chain node, when one is configured
    pub rpc_endpoint: Option<&'static str>,
}

const fn network(
    name: &'static str,
    api_base_url: &'static str,
    rpc_endpoint: Option<&'static str>,
) -> NetworkEntry {
    NetworkEntry {
        name,
        api_base_url,
        rpc_endpoint,
    }
}

/// Ordered registry. Position == chain id.
pub static NETWORKS: &[NetworkEntry] = &[
    network("Polkadot", "https://polkadot.api.subscan.io", Some("wss://rpc.polkadot.io")),
    network("Kusama", "https://kusama.api.subscan.io", None),
    network("Acala", "https://acala.api.subscan.io", None),
    network("AcalaMandala", "https://acala-testnet.api.subscan.io", None),
    network("Ajuna", "https://ajuna.api.subscan.io", None),
    network("AlephZero", "https://alephzero.api.subscan.io", None),
    network("AlephZeroTestnet", "https://alephzero-testnet.api.subscan.io", None),
    network("Altair", "https://altair.api.subscan.io", None),
    network("AssethubPolkadot", "https://assethub-polkadot.api.subscan.io", None),
    network("AssethubKusama", "https://assethub-kusama.api.subscan.io", None),
    network("AssethubPaseo", "https://assethub-paseo.api.subscan.io", None),
    network("AssethubRococo", "https://assethub-rococo.api.subscan.io", None),
    network("Astar", "https://astar.api.subscan.io", Some("wss://rpc.astar.network")),
    network("Bajun", "https://bajun.api.subscan.io", None),
    network("Basilisk", "https://basilisk.api.subscan.io", None),
    network("BifrostPolkadot", "https://bifrost.api.subscan.io", None),
    network("BifrostKusama", "https://bifrost-kusama.api.subscan.io", None),
    network("Calamari", "https://calamari.api.subscan.io", None),
    network("Centrifuge", "https://centrifuge.api.subscan.io", None),
    network("ChainX", "https://chainx.api.subscan.io", None),
    network("Clover", "https://clover.api.subscan.io", None),
    network("Composable", "https://composable.api.subscan.io", None),
    network("Crab", "https://crab.api.subscan.io", None),
    network("Creditcoin", "https://creditcoin.api.subscan.io", None),
    network("CreditcoinTestnet", "https://creditcoin-testnet.api.subscan.io", None),
    network("Crust", "https://crust.api.subscan.io", None),
    network("Darwinia", "https://darwinia.api.subscan.io", None),
    network("Dock", "https://dock.api.subscan.io", None),
    network("Encointer", "https://encointer.api.subscan.io", None),
    network("HydraDX", "https://hydradx.api.subscan.io", None),
    network("Integritee", "https://integritee.api.subscan.io", None),
    network("Interlay", "https://interlay.api.subscan.io", None),
    network("Joystream", "https://joystream.api.subscan.io", None),
    network("Karura", "https://karura.api.subscan.io", None),
    network("Khala", "https://khala.api.subscan.io", None),
    network("KiltSpiritnet", "https://spiritnet.api.subscan.io", None),
    network("Kintsugi", "https://kintsugi.api.subscan.io", None),
    network("Mangata", "https://mangatax.api.subscan.io", None),
    network("Moonbase", "https://moonbase.api.subscan.io", None),
    network("Moonbeam", "https://moonbeam.api.subscan.io", None),
    network("Moonriver", "https://moonriver.api.subscan.io", None),
    network("Nodle", "https://nodle.api.subscan.io", None),
    network("Opal", "https://opal.api.subscan.io", None),
    network("Pangolin", "https://pangolin.api.subscan.io", None),
    network("Parallel", "https://parallel.api.subscan.io", None),
    network("ParallelHeiko", "https://parallel-heiko.api.subscan.io", None),
    network("Paseo", "https://paseo.api.subscan.io", Some("wss://rpc.ibp.network/paseo")),
    network("Phala", "https://phala.api.subscan.io", None),
    network("Picasso", "https://picasso.api.subscan.io", None),
    network("Pioneer", "https://pioneer.api.subscan.io", None),
    network("Polkadex", "https://polkadex.api.subscan.io", None),
    network("Quartz", "https://quartz.api.subscan.io", None),
    network("Robonomics", "https://robonomics.api.subscan.io", None),
    network("Rococo", "https://rococo.api.subscan.io", None),
    network("Shibuya", "https://shibuya.api.subscan.io", None),
    network("Shiden", "https://shiden.api.subscan.io", None),
    network("Sora", "https://sora.api.subscan.io", None),
    network("Stafi", "https://stafi.api.subscan.io", None),
    network("Statemine", "https://statemine.api.subscan.io", None),
    network("Statemint", "https://statemint.api.subscan.io", None),
    network("StatemintAssetHub", "https://assethub-statmint.api.subscan.io", None),
    network("Turing", "https://turing.api.subscan.io", None),
    network("Unique", "https://unique.api.subscan.io", None),
    network("Vara", "https://vara.api.subscan.io", None),
    network("Westend", "https://westend.api.subscan.io", None),
    network("Zeitgeist", "https://zeitgeist.api.subscan.io", None),
];

lazy_static! {
    // Lowercased name -> chain id, built once on first lookup.
    static ref NAME_INDEX: HashMap<String, usize> = NETWORKS
        .iter()
        .enumerate()
        .map(|(index, entry)| (entry.name.to_lowercase(), index))
        .collect();
}

/// Read-only view over [`NETWORKS`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkRegistry;

impl NetworkRegistry {
    /// All networks, in chain id order.
    pub fn list_all(&self) -> &'static [NetworkEntry] {
        NETWORKS
    }

    /// Exact, case-sensitive lookup by canonical name.
    pub fn get(&self, name: &str) -> Option<&'static NetworkEntry> {
        self.position_ignore_case(name)
            .map(|index| &NETWORKS[index])
            .filter(|entry| entry.name == name)
    }

    pub fn by_chain_id(&self, chain_id: u64) -> Option<&'static NetworkEntry> {
        usize::try_from(chain_id).ok().and_then(|index| NETWORKS.get(index))
    }

    /// Chain id of the network whose name matches `name` ignoring ASCII case.
    pub fn position_ignore_case(&self, name: &str) -> Option<usize> {
        NAME_INDEX.get(&name.to_lowercase()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique_ignoring_case() {
        let names: HashSet<String> = NETWORKS.iter().map(|n| n.name.to_lowercase()).collect();
        assert_eq!(names.len(), NETWORKS.len());
    }

    #[test]
    fn base_urls_are_unique() {
        let urls: HashSet<&str> = NETWORKS.iter().map(|n| n.api_base_url).collect();
        assert_eq!(urls.len(), NETWORKS.len());
    }

    #[test]
    fn well_known_chain_ids_are_pinned() {
        let registry = NetworkRegistry;
        assert_eq!(registry.by_chain_id(0).map(|n| n.name), Some("Polkadot"));
        assert_eq!(registry.by_chain_id(1).map(|n| n.name), Some("Kusama"));
        assert!(registry.by_chain_id(NETWORKS.len() as u64).is_none());
    }

    #[test]
    fn get_is_case_sensitive() {
        let registry = NetworkRegistry;
        assert_eq!(
            registry.get("Astar").and_then(|n| n.rpc_endpoint),
            Some("wss://rpc.astar.network")
        );
        assert!(registry.get("astar").is_none());
        assert!(registry.get("Atlantis").is_none());
    }
}
