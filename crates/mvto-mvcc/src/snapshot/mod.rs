//! Point-in-time copies of item state, used for end-of-run reporting.

use std::collections::BTreeMap;
use std::fmt;

use mvto_common::error::{MvtoError, MvtoResult};
use mvto_common::types::{ItemId, Tid, Value};

/// Maximum number of entries printed per map before eliding the middle.
const DISPLAY_EDGE: usize = 4;

/// A copy of one item's versions and reader map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSnapshot {
    /// The item.
    pub id: ItemId,
    /// Highest version written at snapshot time.
    pub max_version: Tid,
    /// Surviving versions.
    pub versions: BTreeMap<Tid, Value>,
    /// Largest non-adjacent reader per version.
    pub max_readers: BTreeMap<Tid, Tid>,
}

impl ItemSnapshot {
    /// Returns the value of the latest version.
    pub fn latest_value(&self) -> Option<Value> {
        self.versions.get(&self.max_version).copied()
    }

    /// Checks the item invariants.
    ///
    /// - the sentinel version 0 is present;
    /// - `max_version` is the largest stored version;
    /// - every reader entry refers to a stored version;
    /// - every recorded reader is non-adjacent to the version it read.
    pub fn verify(&self) -> MvtoResult<()> {
        if !self.versions.contains_key(&Tid::ZERO) {
            return Err(MvtoError::invariant_violation(self.id, "sentinel version 0 missing"));
        }

        let largest = self.versions.keys().next_back().copied().unwrap_or(Tid::ZERO);
        if largest != self.max_version {
            return Err(MvtoError::invariant_violation(
                self.id,
                format!("max version {} but largest stored version {}", self.max_version, largest),
            ));
        }

        for (&version, &reader) in &self.max_readers {
            if !self.versions.contains_key(&version) {
                return Err(MvtoError::invariant_violation(
                    self.id,
                    format!("reader {} recorded for missing version {}", reader, version),
                ));
            }
            if reader <= version.next() {
                return Err(MvtoError::invariant_violation(
                    self.id,
                    format!("adjacent reader {} recorded for version {}", reader, version),
                ));
            }
        }

        Ok(())
    }
}

/// Writes `{k:v,k:v,...}`, eliding the middle of long maps.
fn write_map<K: fmt::Display, V: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    map: &BTreeMap<K, V>,
) -> fmt::Result {
    write!(f, "(n={}){{", map.len())?;
    let len = map.len();
    for (i, (k, v)) in map.iter().enumerate() {
        if len > DISPLAY_EDGE * 2 && i == DISPLAY_EDGE {
            write!(f, "...,")?;
        }
        if len > DISPLAY_EDGE * 2 && i >= DISPLAY_EDGE && i < len - DISPLAY_EDGE {
            continue;
        }
        write!(f, "{}:{},", k, v)?;
    }
    write!(f, "}}")
}

impl fmt::Display for ItemSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "data:{} max_version={}", self.id, self.max_version)?;
        write!(f, "ver:val")?;
        write_map(f, &self.versions)?;
        writeln!(f)?;
        write!(f, "ri[xj]")?;
        write_map(f, &self.max_readers)
    }
}
