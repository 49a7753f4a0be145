//! Opaque handles for actors owned by an external arena.

use core::fmt;

/// Generation-checked reference to an actor.
///
/// Handles are issued by whoever owns actor lifetime. A handle whose slot has
/// been reused carries a stale generation, so liveness is always answered by
/// [`crate::env::ActorOracle::is_live`] rather than by the handle itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorHandle {
    pub index: u32,
    pub generation: u32,
}

impl ActorHandle {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for ActorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Team affiliation used to classify noise and damage instigators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TeamId(pub u8);

impl TeamId {
    /// Team 0 is never hostile or friendly to anyone.
    pub const NEUTRAL: Self = Self(0);

    pub const fn is_neutral(self) -> bool {
        self.0 == Self::NEUTRAL.0
    }
}

/// Identifies one entry in a priority stack (modifier or config).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StackHandle(pub u64);

impl fmt::Display for StackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stack:{}", self.0)
    }
}
