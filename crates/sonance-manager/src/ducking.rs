//! Ducking aggregation.
//!
//! Any number of boolean conditions can ask for the output to be ducked. The
//! aggregate is the logical OR of their current values; an empty set never
//! ducks. The engine subscribes one listener per condition and recomputes on
//! every change.

use sonance_core::{ListenerId, Property};

struct Member {
    property: Property<bool>,
    listener: ListenerId,
}

/// Ordered set of ducking conditions and the aggregate they produce.
#[derive(Default)]
pub struct DuckingAggregator {
    members: Vec<Member>,
    active: bool,
}

impl DuckingAggregator {
    /// Empty aggregator; not ducking.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `property` is a member (by identity).
    pub fn contains(&self, property: &Property<bool>) -> bool {
        self.members.iter().any(|m| m.property.ptr_eq(property))
    }

    /// Appends a condition together with the listener subscribed to it.
    ///
    /// The caller checks [`contains`](Self::contains) first; adding a member
    /// twice would leak one subscription.
    pub fn insert(&mut self, property: Property<bool>, listener: ListenerId) {
        self.members.push(Member { property, listener });
    }

    /// Removes a condition and returns the listener that was subscribed to it.
    pub fn remove(&mut self, property: &Property<bool>) -> Option<(Property<bool>, ListenerId)> {
        let index = self
            .members
            .iter()
            .position(|m| m.property.ptr_eq(property))?;
        let member = self.members.remove(index);
        Some((member.property, member.listener))
    }

    /// Recomputes the aggregate from the members' current values.
    ///
    /// Returns the new aggregate if it changed.
    pub fn recompute(&mut self) -> Option<bool> {
        let active = self.members.iter().any(|m| m.property.get());
        if active == self.active {
            return None;
        }
        self.active = active;
        Some(active)
    }

    /// Current aggregate.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Number of member conditions.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether there are no member conditions.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Removes every member, returning their subscriptions.
    pub fn clear(&mut self) -> Vec<(Property<bool>, ListenerId)> {
        self.active = false;
        self.members
            .drain(..)
            .map(|m| (m.property, m.listener))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(agg: &mut DuckingAggregator, value: bool) -> Property<bool> {
        let property = Property::new(value);
        let id = property.lazy_link(|_, _| {});
        agg.insert(property.clone(), id);
        property
    }

    #[test]
    fn empty_set_is_inactive() {
        let mut agg = DuckingAggregator::new();
        assert!(agg.is_empty());
        assert_eq!(agg.recompute(), None);
        assert!(!agg.is_active());
    }

    #[test]
    fn or_of_members() {
        let mut agg = DuckingAggregator::new();
        let a = member(&mut agg, false);
        let b = member(&mut agg, false);
        assert_eq!(agg.recompute(), None);

        b.set(true);
        assert_eq!(agg.recompute(), Some(true));
        a.set(true);
        assert_eq!(agg.recompute(), None);
        b.set(false);
        assert_eq!(agg.recompute(), None);
        assert!(agg.is_active());
        a.set(false);
        assert_eq!(agg.recompute(), Some(false));
    }

    #[test]
    fn remove_by_identity() {
        let mut agg = DuckingAggregator::new();
        let a = member(&mut agg, true);
        let lookalike = Property::new(true);
        assert_eq!(agg.recompute(), Some(true));

        assert!(!agg.contains(&lookalike));
        assert!(agg.remove(&lookalike).is_none());

        let (removed, id) = agg.remove(&a).unwrap();
        assert!(removed.ptr_eq(&a));
        assert!(a.has_listener(id));
        assert_eq!(agg.recompute(), Some(false));
        assert_eq!(agg.len(), 0);
    }

    #[test]
    fn clear_returns_subscriptions() {
        let mut agg = DuckingAggregator::new();
        member(&mut agg, true);
        member(&mut agg, false);
        agg.recompute();

        assert_eq!(agg.clear().len(), 2);
        assert!(!agg.is_active());
        assert!(agg.is_empty());
    }
}
