//! Entity trait: identity + continuity across snapshots.

/// Entity marker + minimal interface.
///
/// Products and movements keep their identity between snapshots even though
/// every other field may change.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

/// First entity in `items` with the given id.
pub fn find_by_id<E: Entity>(items: &[E], id: E::Id) -> Option<&E> {
    items.iter().find(|e| e.id() == id)
}
