//! Network identity and clique snapshot types

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use web3_primitives::{Address, H256};

/// Network identity assembled from genesis hash, `net_version` and `eth_chainId`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Id {
    /// Value of `net_version`
    pub network_id: u64,
    /// Value of `eth_chainId`
    pub chain_id: u64,
    /// Hash of block 0
    pub genesis_hash: H256,
}

/// Clique consensus snapshot returned by `clique_getSnapshot`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Block number of the snapshot
    pub number: u64,
    /// Block hash of the snapshot
    pub hash: H256,
    /// Signer -> last signed block
    #[serde(default)]
    pub signers: BTreeMap<Address, u64>,
    /// Set of authorized voters
    #[serde(default, with = "address_set")]
    pub voters: BTreeSet<Address>,
    /// Pending votes
    #[serde(default)]
    pub votes: Vec<Vote>,
    /// Current vote tally
    #[serde(default)]
    pub tally: BTreeMap<Address, Tally>,
}

/// Single authorization vote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Voting signer
    pub signer: Address,
    /// Block the vote was cast in
    pub block: u64,
    /// Account being voted on
    pub address: Address,
    /// Authorize or deauthorize
    pub authorize: bool,
}

/// Vote tally for one account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    /// Direction of the votes
    pub authorize: bool,
    /// Number of votes
    pub votes: i64,
}

// Voters arrive as `{"0xabc...": {}, ...}`.
mod address_set {
    use super::*;

    pub fn serialize<S: Serializer>(set: &BTreeSet<Address>, serializer: S) -> Result<S::Ok, S::Error> {
        let map: BTreeMap<&Address, BTreeMap<String, ()>> =
            set.iter().map(|a| (a, BTreeMap::new())).collect();
        map.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeSet<Address>, D::Error> {
        let map = BTreeMap::<Address, serde::de::IgnoredAny>::deserialize(deserializer)?;
        Ok(map.into_keys().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_deserialize() {
        let snap: Snapshot = serde_json::from_value(serde_json::json!({
            "number": 1200,
            "hash": "0x3333333333333333333333333333333333333333333333333333333333333333",
            "signers": {
                "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed": 1199,
                "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359": 1198
            },
            "voters": {
                "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed": {}
            },
            "votes": [{
                "signer": "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed",
                "block": 1190,
                "address": "0xdbf03b407c01e7cd3cbea99509d93f8dddc8c6fb",
                "authorize": true
            }],
            "tally": {
                "0xdbf03b407c01e7cd3cbea99509d93f8dddc8c6fb": {"authorize": true, "votes": 1}
            }
        }))
        .unwrap();

        assert_eq!(snap.number, 1200);
        assert_eq!(snap.signers.len(), 2);
        assert_eq!(snap.voters.len(), 1);
        assert_eq!(snap.votes[0].block, 1190);
        assert_eq!(snap.tally.values().next().map(|t| t.votes), Some(1));
    }

    #[test]
    fn test_snapshot_voters_serialize_as_map() {
        let mut snap = Snapshot::default();
        snap.voters.insert(Address::from_bytes([0x11; 20]));
        let v = serde_json::to_value(&snap).unwrap();
        assert!(v["voters"]["0x1111111111111111111111111111111111111111"].is_object());
    }

    #[test]
    fn test_id_field_names() {
        let id = Id {
            network_id: 60,
            chain_id: 60,
            genesis_hash: H256::ZERO,
        };
        let v = serde_json::to_value(id).unwrap();
        assert_eq!(v["network_id"], 60);
        assert_eq!(v["chain_id"], 60);
        assert!(v["genesis_hash"].is_string());
    }
}
