//! Grid cell identifiers.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Address of one cell in a discrete global grid.
///
/// The identifier is an opaque 64-bit integer; only the provider that
/// produced it can interpret it. It prints (and serializes) as lowercase
/// hex, which is the conventional string form for H3 indexes:
///
/// ```
/// use geo_index::CellId;
///
/// let cell = CellId::new(0x8a1fb46622dffff);
/// assert_eq!(cell.to_string(), "8a1fb46622dffff");
/// assert_eq!("8a1fb46622dffff".parse::<CellId>().unwrap(), cell);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(u64);

impl CellId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw 64-bit identifier.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for CellId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<CellId> for u64 {
    fn from(cell: CellId) -> Self {
        cell.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

impl FromStr for CellId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        u64::from_str_radix(digits, 16).map(Self)
    }
}

impl Serialize for CellId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
