//! Latest-block and average block time derived from a recent block sample.

use std::fmt;

use num_bigint::BigUint;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Smallest and largest number of blocks requested for a stats sample.
pub const MIN_SAMPLE_SIZE: u32 = 3;
pub const MAX_SAMPLE_SIZE: u32 = 100;

/// Gaps at or above this many seconds are treated as stalls, not block time.
const MAX_BLOCK_GAP_SECS: i64 = 300;

pub fn clamp_sample_size(requested: u32) -> u32 {
    requested.clamp(MIN_SAMPLE_SIZE, MAX_SAMPLE_SIZE)
}

/// Block height of arbitrary size.
///
/// Deserializes from a JSON number or a numeric string. Serializes as a
/// number while it fits in `u64`, otherwise as a string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockNumber(pub BigUint);

impl From<u64> for BlockNumber {
    fn from(n: u64) -> Self {
        BlockNumber(BigUint::from(n))
    }
}

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Serialize for BlockNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match u64::try_from(&self.0) {
            Ok(n) => serializer.serialize_u64(n),
            Err(_) => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for BlockNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(n.into()),
            Repr::Text(s) => s
                .trim()
                .parse::<BigUint>()
                .map(BlockNumber)
                .map_err(|_| de::Error::custom(format!("invalid block number '{s}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSample {
    pub block_number: BlockNumber,
    pub timestamp_secs: i64,
    pub block_hash: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_block: Option<BlockNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_block_time_sec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_block_time_ms: Option<u64>,
}

/// Summarises a sample ordered by block number, highest first.
///
/// Inter-block gaps are taken over the timestamps in ascending order and only
/// gaps in `(0, 300)` seconds count towards the average. A sample with no
/// usable gap yields no average; that is not an error.
pub fn aggregate(samples: &[BlockSample]) -> NetworkStats {
    let latest = samples.first();

    let mut timestamps: Vec<i64> = samples.iter().map(|s| s.timestamp_secs).collect();
    timestamps.sort_unstable();

    let gaps: Vec<i64> = timestamps
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .filter(|gap| *gap > 0 && *gap < MAX_BLOCK_GAP_SECS)
        .collect();

    let (avg_block_time_sec, avg_block_time_ms) = if gaps.is_empty() {
        (None, None)
    } else {
        let mean = gaps.iter().sum::<i64>() as f64 / gaps.len() as f64;
        let secs = (mean * 100.0).round() / 100.0;
        (Some(secs), Some((secs * 1000.0).round() as u64))
    };

    NetworkStats {
        latest_block: latest.map(|s| s.block_number.clone()),
        latest_hash: latest.and_then(|s| s.block_hash.clone()),
        avg_block_time_sec,
        avg_block_time_ms,
    }
}
