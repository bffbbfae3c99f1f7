//! DoubleHashMap: open addressing with double hashing over a prime-sized slot array.

use crate::config::MapConfig;
use crate::error::TableError;
use crate::hashing::Probe;
use crate::prime::next_prime;
use core::fmt;
use core::mem;

#[derive(Debug)]
struct Entry<V> {
    key: Box<str>,
    value: V,
}

#[derive(Debug)]
enum Slot<V> {
    Empty,
    Tombstone,
    Occupied(Entry<V>),
}

impl<V> Slot<V> {
    fn into_value(self) -> Option<V> {
        match self {
            Slot::Occupied(e) => Some(e.value),
            _ => None,
        }
    }
}

/// Where a key lives, or where it should go.
enum Lookup {
    Found(usize),
    /// First tombstone on the probe path, else the empty slot that ended it.
    Vacant(usize),
    Full,
}

fn allocate_slots<V>(capacity: usize) -> Result<Vec<Slot<V>>, TableError> {
    let mut slots = Vec::new();
    slots.try_reserve_exact(capacity)?;
    slots.resize_with(capacity, || Slot::Empty);
    Ok(slots)
}

/// A map from owned string keys to opaque values.
///
/// The map never inspects or calls its values; it stores them, hands out
/// references, and gives them back on overwrite or removal.
pub struct DoubleHashMap<V> {
    slots: Vec<Slot<V>>,
    len: usize,
    tombstones: usize,
    config: MapConfig,
}

impl<V> DoubleHashMap<V> {
    /// Map sized for the default initial size (64 elements, 97 slots).
    pub fn new() -> Self {
        Self::with_config(MapConfig::default())
    }

    /// Map sized for `n` elements; it never shrinks below that size.
    ///
    /// # Panics
    /// If the backing array cannot be allocated.
    pub fn with_capacity(n: usize) -> Self {
        Self::with_config(MapConfig::new().initial_size(n))
    }

    /// # Panics
    /// If `config` is invalid or the backing array cannot be allocated.
    pub fn with_config(config: MapConfig) -> Self {
        Self::try_with_config(config).unwrap_or_else(|e| panic!("{}", e))
    }

    pub fn try_with_capacity(n: usize) -> Result<Self, TableError> {
        Self::try_with_config(MapConfig::new().initial_size(n))
    }

    pub fn try_with_config(config: MapConfig) -> Result<Self, TableError> {
        config.validate()?;
        Ok(Self {
            slots: allocate_slots(config.initial_capacity())?,
            len: 0,
            tombstones: 0,
            config,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots in the backing array. Always prime.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub(crate) fn tombstones(&self) -> usize {
        self.tombstones
    }

    fn load_percent(&self, occupied: usize) -> usize {
        occupied.saturating_mul(100) / self.capacity()
    }

    fn lookup(&self, key: &str) -> Lookup {
        let mut reusable = None;
        for idx in Probe::new(key, self.capacity()) {
            match &self.slots[idx] {
                Slot::Empty => return Lookup::Vacant(reusable.unwrap_or(idx)),
                Slot::Tombstone => {
                    if reusable.is_none() {
                        reusable = Some(idx);
                    }
                }
                Slot::Occupied(e) if &*e.key == key => return Lookup::Found(idx),
                Slot::Occupied(_) => {}
            }
        }
        reusable.map_or(Lookup::Full, Lookup::Vacant)
    }

    fn find(&self, key: &str) -> Option<usize> {
        match self.lookup(key) {
            Lookup::Found(idx) => Some(idx),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        match &self.slots[self.find(key)?] {
            Slot::Occupied(e) => Some(&e.value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let idx = self.find(key)?;
        match &mut self.slots[idx] {
            Slot::Occupied(e) => Some(&mut e.value),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Insert or overwrite. Returns the displaced value on overwrite.
    ///
    /// # Panics
    /// If a resize cannot allocate its backing array. Use
    /// [`try_insert`](Self::try_insert) to observe that as an error.
    pub fn insert(&mut self, key: &str, value: V) -> Option<V> {
        self.try_insert(key, value).unwrap_or_else(|e| panic!("{}", e))
    }

    /// Insert or overwrite, reporting allocation failure during a resize.
    /// On error the map is unchanged and `value` is dropped.
    pub fn try_insert(&mut self, key: &str, value: V) -> Result<Option<V>, TableError> {
        self.make_room()?;
        loop {
            match self.lookup(key) {
                Lookup::Found(idx) => {
                    let entry = Entry {
                        key: key.into(),
                        value,
                    };
                    let old = mem::replace(&mut self.slots[idx], Slot::Occupied(entry));
                    return Ok(old.into_value());
                }
                Lookup::Vacant(idx) => {
                    if let Slot::Tombstone = self.slots[idx] {
                        self.tombstones -= 1;
                    }
                    self.slots[idx] = Slot::Occupied(Entry {
                        key: key.into(),
                        value,
                    });
                    self.len += 1;
                    return Ok(None);
                }
                Lookup::Full => self.grow()?,
            }
        }
    }

    /// Remove `key`, returning its value. Removing an absent key leaves the
    /// map's length untouched.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        // Shrink is decided on the pre-removal length; the key is then
        // located in the (possibly rebuilt) table.
        if self.load_percent(self.len) < self.config.shrink_below_percent {
            self.shrink();
        }
        let idx = self.find(key)?;
        self.len -= 1;
        self.tombstones += 1;
        mem::replace(&mut self.slots[idx], Slot::Tombstone).into_value()
    }

    /// True when placing one more entry over `occupied` taken slots would
    /// pass the grow threshold or leave no empty slot.
    fn crowded(&self, occupied: usize) -> bool {
        self.load_percent(occupied) > self.config.grow_above_percent
            || occupied + 1 >= self.capacity()
    }

    fn make_room(&mut self) -> Result<(), TableError> {
        if self.crowded(self.len) {
            self.grow()
        } else if self.crowded(self.len + self.tombstones) {
            let capacity = self.capacity();
            tracing::debug!(capacity, tombstones = self.tombstones, "purging tombstones");
            self.rebuild(capacity)
        } else {
            Ok(())
        }
    }

    fn grow(&mut self) -> Result<(), TableError> {
        let base = self.capacity().saturating_mul(2);
        tracing::debug!(from = self.capacity(), base, len = self.len, "growing table");
        self.resize(base)
    }

    fn shrink(&mut self) {
        let base = self.capacity() / 2;
        if base < self.config.min_base_size() {
            return;
        }
        tracing::debug!(from = self.capacity(), base, len = self.len, "shrinking table");
        if let Err(err) = self.resize(base) {
            tracing::warn!(%err, capacity = self.capacity(), "skipping shrink");
        }
    }

    /// Rebuild into `next_prime(base)` slots unless `base` is under the floor.
    fn resize(&mut self, base: usize) -> Result<(), TableError> {
        if base < self.config.min_base_size() {
            return Ok(());
        }
        self.rebuild(base)
    }

    /// Re-place every live entry into a fresh array, dropping tombstones.
    fn rebuild(&mut self, base: usize) -> Result<(), TableError> {
        let capacity = next_prime(base);
        if capacity <= self.len {
            return Ok(());
        }
        let fresh = allocate_slots(capacity)?;
        let old = mem::replace(&mut self.slots, fresh);
        self.tombstones = 0;
        for slot in old {
            if let Slot::Occupied(entry) = slot {
                let idx = Probe::new(&entry.key, capacity)
                    .find(|&i| matches!(self.slots[i], Slot::Empty))
                    .expect("rebuilt table has a free slot for every live entry");
                self.slots[idx] = Slot::Occupied(entry);
            }
        }
        Ok(())
    }
}

impl<V> Default for DoubleHashMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for DoubleHashMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoubleHashMap")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("tombstones", &self.tombstones)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::probe_index;
    use crate::prime::is_prime;
    use std::rc::Rc;

    fn small() -> DoubleHashMap<i32> {
        // 10 base slots, 11 after rounding up.
        DoubleHashMap::with_config(MapConfig::new().initial_size(7))
    }

    /// Two distinct keys whose probe sequences start at the same slot.
    fn colliding_pair(capacity: usize) -> (String, String) {
        let keys: Vec<String> = (0..1000).map(|i| format!("k{}", i)).collect();
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                if probe_index(a, capacity, 0) == probe_index(b, capacity, 0) {
                    return (a.clone(), b.clone());
                }
            }
        }
        panic!("no colliding pair");
    }

    /// Invariant: a fresh map has the default 97 slots and no entries.
    #[test]
    fn new_map_is_empty_with_97_slots() {
        let m: DoubleHashMap<i32> = DoubleHashMap::new();
        assert_eq!(m.capacity(), 97);
        assert_eq!(m.len(), 0);
        assert!(m.is_empty());
        assert!(m.get("anything").is_none());
    }

    /// Invariant: overwrite keeps `len`, returns the old value, and the
    /// latest value is observed.
    #[test]
    fn overwrite_returns_old_value() {
        let mut m = small();
        assert_eq!(m.insert("k", 1), None);
        assert_eq!(m.insert("k", 2), Some(1));
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("k"), Some(&2));
    }

    /// Invariant: the map owns its key copy; the caller's string may go away.
    #[test]
    fn keys_are_copied() {
        let mut m = small();
        {
            let key = String::from("temporary");
            m.insert(&key, 5);
        }
        assert_eq!(m.get("temporary"), Some(&5));
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut m = small();
        m.insert("k", 10);
        *m.get_mut("k").unwrap() += 5;
        assert_eq!(m.get("k"), Some(&15));
        assert!(m.get_mut("other").is_none());
    }

    /// Invariant: removing returns the value, leaves a tombstone, and the
    /// key is no longer found.
    #[test]
    fn remove_then_lookup_misses() {
        let mut m = small();
        m.insert("a", 1);
        m.insert("b", 2);
        assert_eq!(m.remove("a"), Some(1));
        assert_eq!(m.len(), 1);
        assert_eq!(m.tombstones(), 1);
        assert!(!m.contains_key("a"));
        assert!(m.contains_key("b"));
    }

    /// Invariant: removing an absent key changes nothing.
    #[test]
    fn remove_absent_key_keeps_len() {
        let mut m = small();
        m.insert("a", 1);
        assert_eq!(m.remove("zzz"), None);
        assert_eq!(m.remove("zzz"), None);
        assert_eq!(m.len(), 1);
        assert_eq!(m.tombstones(), 0);
        let mut empty: DoubleHashMap<i32> = DoubleHashMap::new();
        assert_eq!(empty.remove("x"), None);
        assert_eq!(empty.len(), 0);
    }

    /// Invariant: a tombstone does not end the probe chain of a key that
    /// was placed past it.
    #[test]
    fn tombstone_keeps_probe_chain_intact() {
        let mut m = small();
        let (a, b) = colliding_pair(m.capacity());
        m.insert(&a, 1);
        m.insert(&b, 2);
        assert_eq!(m.remove(&a), Some(1));
        assert_eq!(m.get(&b), Some(&2));
        assert!(m.get(&a).is_none());
    }

    /// Invariant: insert reuses the first tombstone on the key's path, and
    /// never duplicates a key living further along.
    #[test]
    fn insert_reuses_tombstone_without_duplicating() {
        let mut m = small();
        let (a, b) = colliding_pair(m.capacity());
        m.insert(&a, 1);
        m.insert(&b, 2);
        m.remove(&a);
        assert_eq!(m.tombstones(), 1);

        // b lies past the tombstone: this is an update, not a new entry.
        assert_eq!(m.insert(&b, 3), Some(2));
        assert_eq!(m.len(), 1);
        assert_eq!(m.tombstones(), 1);

        assert_eq!(m.insert(&a, 4), None);
        assert_eq!(m.len(), 2);
        assert_eq!(m.tombstones(), 0);
        assert_eq!(m.get(&a), Some(&4));
        assert_eq!(m.get(&b), Some(&3));
    }

    /// Invariant: growth happens once the pre-insert load exceeds 70%, and
    /// the new capacity is the next prime after doubling.
    #[test]
    fn grows_past_seventy_percent() {
        let mut m = small();
        // 7 * 100 / 11 == 63, 8 * 100 / 11 == 72.
        for i in 0..8 {
            m.insert(&format!("k{}", i), i);
        }
        assert_eq!(m.capacity(), 11);
        m.insert("k8", 8);
        assert_eq!(m.capacity(), 23);
        for i in 0..9 {
            assert_eq!(m.get(&format!("k{}", i)), Some(&i));
        }
    }

    /// Invariant: shrinking is decided before removal, halves toward the
    /// next prime, and never goes under the floor.
    #[test]
    fn shrinks_but_not_below_floor() {
        let mut m = small();
        for i in 0..30 {
            m.insert(&format!("k{}", i), i);
        }
        let peak = m.capacity();
        assert!(peak > 11);
        for i in 0..29 {
            assert_eq!(m.remove(&format!("k{}", i)), Some(i));
            assert!(is_prime(m.capacity()));
            assert!(m.capacity() >= 11);
        }
        assert!(m.capacity() < peak);
        assert_eq!(m.get("k29"), Some(&29));
        assert_eq!(m.len(), 1);
    }

    /// Invariant: insert/remove churn purges tombstones so every probe
    /// sequence still ends at an empty slot; capacity does not move.
    #[test]
    fn churn_never_exhausts_empty_slots() {
        let mut m = small();
        for i in 0..500 {
            let k = format!("churn{}", i);
            m.insert(&k, i);
            assert!(m.len() + m.tombstones() < m.capacity());
            assert_eq!(m.remove(&k), Some(i));
            assert!(m.get(&k).is_none());
        }
        assert_eq!(m.capacity(), 11);
        assert!(m.is_empty());
    }

    /// Invariant: a two-slot map still grows and keeps every key.
    #[test]
    fn tiny_map_grows() {
        let mut m: DoubleHashMap<usize> = DoubleHashMap::with_capacity(0);
        assert_eq!(m.capacity(), 2);
        for i in 0..50 {
            m.insert(&i.to_string(), i);
            assert!(is_prime(m.capacity()));
        }
        for i in 0..50 {
            assert_eq!(m.get(&i.to_string()), Some(&i));
        }
    }

    /// Invariant: every value is dropped exactly once, whether displaced,
    /// removed, or released with the map.
    #[test]
    fn values_are_released_once() {
        let v = Rc::new(());
        let mut m2: DoubleHashMap<Rc<()>> = DoubleHashMap::new();
        for i in 0..40 {
            m2.insert(&format!("k{}", i), v.clone());
        }
        assert_eq!(Rc::strong_count(&v), 41);
        let old = m2.insert("k0", v.clone());
        assert!(old.is_some());
        drop(old);
        assert_eq!(Rc::strong_count(&v), 41);
        drop(m2.remove("k1"));
        assert_eq!(Rc::strong_count(&v), 40);
        drop(m2);
        assert_eq!(Rc::strong_count(&v), 1);
    }

    #[test]
    fn debug_reports_shape() {
        let mut m = small();
        m.insert("a", 1);
        let s = format!("{:?}", m);
        assert!(s.contains("len: 1"));
        assert!(s.contains("capacity: 11"));
    }
}
