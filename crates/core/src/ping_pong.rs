//! Slot indices and main/alt buffer selection for ping-ponged render targets.
//!
//! Every logical render target owns two physical textures. A
//! [`BufferSelection`] records, per slot, whether the *alt* texture is the
//! one currently holding readable content. This is pure index math with no
//! GPU dependency, used by the pass planner and the executor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of logical color render targets in a pool.
pub const MAX_RENDER_TARGETS: usize = 8;

/// A validated render target slot index in `0..MAX_RENDER_TARGETS`.
///
/// Construct with [`TargetIndex::new`]; out-of-range values are rejected so
/// that pool and selection lookups never need a bounds check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct TargetIndex(u8);

impl TargetIndex {
    /// Slot 0, the target presented when no pass runs.
    pub const FIRST: TargetIndex = TargetIndex(0);

    /// Returns the slot index if `index < MAX_RENDER_TARGETS`.
    pub fn new(index: usize) -> Option<Self> {
        if index < MAX_RENDER_TARGETS {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    /// The raw slot number.
    pub fn get(self) -> usize {
        self.0 as usize
    }

    /// Iterates over every slot in ascending order.
    pub fn all() -> impl Iterator<Item = TargetIndex> {
        (0..MAX_RENDER_TARGETS as u8).map(TargetIndex)
    }
}

impl TryFrom<usize> for TargetIndex {
    type Error = String;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::new(index).ok_or_else(|| {
            format!("render target index {index} out of range (max {MAX_RENDER_TARGETS})")
        })
    }
}

impl From<TargetIndex> for usize {
    fn from(index: TargetIndex) -> usize {
        index.get()
    }
}

impl fmt::Display for TargetIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-slot main/alt selection. `true` means the slot's alt texture.
///
/// Used both as the read state threaded through the pass chain and as a
/// pass's write mask (the complement of its read state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct BufferSelection([bool; MAX_RENDER_TARGETS]);

impl BufferSelection {
    /// All slots select their main texture.
    pub fn all_main() -> Self {
        Self([false; MAX_RENDER_TARGETS])
    }

    /// Builds a selection from a raw flag array.
    pub fn from_flags(flags: [bool; MAX_RENDER_TARGETS]) -> Self {
        Self(flags)
    }

    /// Whether `slot` selects its alt texture.
    pub fn is_alt(&self, slot: TargetIndex) -> bool {
        self.0[slot.get()]
    }

    /// Flips the selection of a single slot.
    pub fn toggle(&mut self, slot: TargetIndex) {
        self.0[slot.get()] = !self.0[slot.get()];
    }

    /// Element-wise complement over every slot.
    pub fn inverted(&self) -> Self {
        Self(self.0.map(|alt| !alt))
    }

    /// Slots currently selecting their alt texture, in ascending order.
    pub fn alt_slots(&self) -> impl Iterator<Item = TargetIndex> + '_ {
        TargetIndex::all().filter(|&slot| self.is_alt(slot))
    }

    /// The raw flag array.
    pub fn flags(&self) -> [bool; MAX_RENDER_TARGETS] {
        self.0
    }
}

impl fmt::Display for BufferSelection {
    /// Renders as one character per slot: `m` for main, `a` for alt.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for alt in self.0 {
            f.write_str(if alt { "a" } else { "m" })?;
        }
        Ok(())
    }
}
