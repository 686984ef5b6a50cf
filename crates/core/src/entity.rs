//! Entity trait: identity that survives state changes.

/// Anything the stores keep by identity (items, actors, ledger entries).
pub trait Entity {
    /// Strongly-typed identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> Self::Id;
}
