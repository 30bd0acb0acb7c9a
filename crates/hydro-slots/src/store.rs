//! The per-block slot arena.

use indexmap::IndexMap;

use hydro_core::{SlotError, SlotKey};

use crate::slot::StateSlot;

/// Named state slots owned by one block.
///
/// The store always contains [`SlotKey::Base`]. Other slots are created
/// by [`ensure_cloned`](Self::ensure_cloned) and live until the store is
/// dropped; later calls for an existing key are no-ops, so a step reuses
/// the allocations of the previous one.
#[derive(Clone, Debug)]
pub struct SlotStore {
    index: IndexMap<SlotKey, usize>,
    slots: Vec<StateSlot>,
    allocations: u64,
}

impl SlotStore {
    /// Create a store whose base slot is `base`.
    pub fn new(base: StateSlot) -> Self {
        let mut index = IndexMap::new();
        index.insert(SlotKey::Base, 0);
        Self {
            index,
            slots: vec![base],
            allocations: 0,
        }
    }

    /// Whether `key` exists.
    pub fn contains(&self, key: SlotKey) -> bool {
        self.index.contains_key(&key)
    }

    /// Slot lookup.
    pub fn get(&self, key: SlotKey) -> Result<&StateSlot, SlotError> {
        self.index
            .get(&key)
            .map(|&i| &self.slots[i])
            .ok_or(SlotError::Missing(key))
    }

    /// Mutable slot lookup.
    pub fn get_mut(&mut self, key: SlotKey) -> Result<&mut StateSlot, SlotError> {
        match self.index.get(&key) {
            Some(&i) => Ok(&mut self.slots[i]),
            None => Err(SlotError::Missing(key)),
        }
    }

    /// The base slot.
    pub fn base(&self) -> &StateSlot {
        &self.slots[0]
    }

    /// The mutable base slot.
    pub fn base_mut(&mut self) -> &mut StateSlot {
        &mut self.slots[0]
    }

    /// Create `key` as a clone of `from` unless it already exists.
    ///
    /// Returns `true` when a new slot was allocated.
    pub fn ensure_cloned(&mut self, key: SlotKey, from: SlotKey) -> Result<bool, SlotError> {
        if self.contains(key) {
            return Ok(false);
        }
        let mut copy = self.get(from)?.clone();
        copy.comm_mut().clear();
        self.index.insert(key, self.slots.len());
        self.slots.push(copy);
        self.allocations += 1;
        Ok(true)
    }

    /// Number of slots allocated by [`ensure_cloned`](Self::ensure_cloned)
    /// over the store's lifetime.
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    /// Slot keys in creation order.
    pub fn keys(&self) -> impl Iterator<Item = SlotKey> + '_ {
        self.index.keys().copied()
    }

    /// Number of slots, base included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always `false`: the base slot exists from construction.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Run `f` with `target` detached from the store.
    ///
    /// `f` receives the rest of the store read-only and the target slot
    /// mutably, which lets a kernel read one slot while writing another
    /// without copying. Inside `f`, looking up `target` through the store
    /// yields an empty placeholder.
    pub fn with_target<R>(
        &mut self,
        target: SlotKey,
        f: impl FnOnce(&SlotStore, &mut StateSlot) -> R,
    ) -> Result<R, SlotError> {
        let i = *self.index.get(&target).ok_or(SlotError::Missing(target))?;
        let mut slot = std::mem::take(&mut self.slots[i]);
        let out = f(self, &mut slot);
        self.slots[i] = slot;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydro_core::{BlockGeometry, FieldLayout};

    fn base() -> StateSlot {
        let g = BlockGeometry {
            nx: 4,
            nghost: 1,
            x_min: 0.0,
            dx: 0.25,
        };
        let mut s = StateSlot::new(
            FieldLayout {
                nvar: 2,
                nderived: 1,
            },
            &g,
        );
        s.var_mut(0).fill(1.0);
        s
    }

    #[test]
    fn base_always_exists() {
        let store = SlotStore::new(base());
        assert!(store.contains(SlotKey::Base));
        assert_eq!(store.len(), 1);
        assert_eq!(store.allocations(), 0);
        assert_eq!(
            store.get(SlotKey::Stage(1)).unwrap_err(),
            SlotError::Missing(SlotKey::Stage(1))
        );
    }

    #[test]
    fn ensure_cloned_copies_once() {
        let mut store = SlotStore::new(base());
        assert!(store.ensure_cloned(SlotKey::Stage(1), SlotKey::Base).unwrap());
        assert_eq!(store.get(SlotKey::Stage(1)).unwrap(), store.base());

        store.get_mut(SlotKey::Stage(1)).unwrap().var_mut(0).fill(7.0);
        assert!(!store.ensure_cloned(SlotKey::Stage(1), SlotKey::Base).unwrap());
        // Existing slot is reused, not re-cloned.
        assert!(store.get(SlotKey::Stage(1)).unwrap().var(0).iter().all(|&v| v == 7.0));
        assert_eq!(store.allocations(), 1);
    }

    #[test]
    fn ensure_cloned_from_missing_source_fails() {
        let mut store = SlotStore::new(base());
        let err = store
            .ensure_cloned(SlotKey::Stage(2), SlotKey::Stage(1))
            .unwrap_err();
        assert_eq!(err, SlotError::Missing(SlotKey::Stage(1)));
        assert!(!store.contains(SlotKey::Stage(2)));
    }

    #[test]
    fn clone_does_not_carry_exchange_markers() {
        let mut store = SlotStore::new(base());
        store.base_mut().comm_mut().arm();
        store.ensure_cloned(SlotKey::RateOfChange, SlotKey::Base).unwrap();
        assert!(!store.get(SlotKey::RateOfChange).unwrap().comm().is_armed());
    }

    #[test]
    fn with_target_reads_other_slots() {
        let mut store = SlotStore::new(base());
        store.ensure_cloned(SlotKey::Stage(1), SlotKey::Base).unwrap();
        store
            .with_target(SlotKey::Stage(1), |rest, target| {
                let src = rest.get(SlotKey::Base).unwrap();
                for (t, s) in target.var_mut(0).iter_mut().zip(src.var(0)) {
                    *t = 2.0 * s;
                }
            })
            .unwrap();
        assert!(store.get(SlotKey::Stage(1)).unwrap().var(0).iter().all(|&v| v == 2.0));
        assert!(store.base().var(0).iter().all(|&v| v == 1.0));
    }

    #[test]
    fn keys_follow_creation_order() {
        let mut store = SlotStore::new(base());
        store.ensure_cloned(SlotKey::RateOfChange, SlotKey::Base).unwrap();
        store.ensure_cloned(SlotKey::Stage(1), SlotKey::Base).unwrap();
        assert_eq!(
            store.keys().collect::<Vec<_>>(),
            vec![SlotKey::Base, SlotKey::RateOfChange, SlotKey::Stage(1)]
        );
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn allocations_equal_distinct_keys(
                stages in proptest::collection::vec(1u32..6, 1..30),
            ) {
                let mut store = SlotStore::new(base());
                for &s in &stages {
                    store.ensure_cloned(SlotKey::Stage(s), SlotKey::Base).unwrap();
                }
                let distinct: std::collections::HashSet<_> = stages.iter().collect();
                prop_assert_eq!(store.allocations() as usize, distinct.len());
                prop_assert_eq!(store.len(), distinct.len() + 1);
            }
        }
    }
}
