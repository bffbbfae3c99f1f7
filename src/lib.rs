//! prime-probe-map: a string-keyed map built on open addressing with
//! double hashing, for hosts that register opaque values (typically
//! callbacks) by name.
//!
//! Internal Design:
//!
//! Summary
//! - One structure, `DoubleHashMap<V>`, owning a prime-sized array of
//!   slots. A slot is `Empty`, `Tombstone`, or `Occupied(key, value)`.
//! - Layers:
//!   - `prime`: primality by trial division, `next_prime`, and the 10/7
//!     element-to-slot ratio.
//!   - `hashing`: two polynomial rolling hashes (bases 137 and 139)
//!     reduced modulo the capacity, combined into a double-hashing
//!     `Probe` sequence shared by insert, lookup and removal.
//!   - `double_hash_map`: upsert/lookup/remove plus the resize policy.
//!
//! Constraints
//! - Single-threaded: no internal synchronization. All mutation goes
//!   through `&mut self`; share across threads behind an external lock.
//! - Capacity is always prime, so every nonzero stride visits every slot.
//! - Keys are copied into the map on insert; values are stored as-is and
//!   never called or inspected.
//!
//! Resize policy
//! - Before an insert, a load (`len * 100 / capacity`) above 70% grows
//!   the table to `next_prime(2 * capacity)`.
//! - Before a removal, a load below 10% shrinks it to
//!   `next_prime(capacity / 2)`, unless that would go under the floor
//!   given by the initial size.
//! - Live entries plus tombstones above 70% triggers a same-size rebuild
//!   that drops tombstones. Either rebuild also fires when the insert
//!   would fill the last empty slot, so probe sequences always reach one.
//! - Every resize rebuilds the whole array in one pass.
//!
//! Notes and non-goals
//! - No iteration API, no persistence, text keys only.
//! - Removing an absent key is a no-op and does not disturb `len`.

pub mod config;
pub mod double_hash_map;
mod double_hash_map_proptest;
pub mod error;
pub mod hashing;
pub mod prime;

// Public surface
pub use config::MapConfig;
pub use double_hash_map::DoubleHashMap;
pub use error::TableError;

/// A callback stored by name. The map never invokes it.
pub type Routine = fn();

/// Name-to-callback registry.
pub type RoutineMap = DoubleHashMap<Routine>;
