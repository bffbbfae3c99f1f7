//! Sizing and resize thresholds for `DoubleHashMap`.

use crate::error::TableError;
use crate::prime::{n_to_cells, next_prime};

pub const DEFAULT_INITIAL_SIZE: usize = 64;
pub const DEFAULT_GROW_ABOVE_PERCENT: usize = 70;
pub const DEFAULT_SHRINK_BELOW_PERCENT: usize = 10;

/// Resize policy of a map.
///
/// Loads are integer percentages `len * 100 / capacity`. A map grows before
/// an insert when its load is strictly above `grow_above_percent`, and
/// shrinks before a removal when its load is strictly below
/// `shrink_below_percent`. It never shrinks under the floor derived from
/// `initial_size`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MapConfig {
    pub initial_size: usize,
    pub grow_above_percent: usize,
    pub shrink_below_percent: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_size: DEFAULT_INITIAL_SIZE,
            grow_above_percent: DEFAULT_GROW_ABOVE_PERCENT,
            shrink_below_percent: DEFAULT_SHRINK_BELOW_PERCENT,
        }
    }
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expected element count the map is first sized for.
    pub fn initial_size(mut self, n: usize) -> Self {
        self.initial_size = n;
        self
    }

    pub fn grow_above_percent(mut self, percent: usize) -> Self {
        self.grow_above_percent = percent;
        self
    }

    pub fn shrink_below_percent(mut self, percent: usize) -> Self {
        self.shrink_below_percent = percent;
        self
    }

    pub fn validate(&self) -> Result<(), TableError> {
        if !(1..=99).contains(&self.grow_above_percent) {
            return Err(TableError::InvalidConfig(
                "grow_above_percent must be within 1..=99",
            ));
        }
        if self.shrink_below_percent >= self.grow_above_percent {
            return Err(TableError::InvalidConfig(
                "shrink_below_percent must be below grow_above_percent",
            ));
        }
        Ok(())
    }

    /// Smallest base size a resize may request; smaller requests are ignored.
    pub fn min_base_size(&self) -> usize {
        n_to_cells(self.initial_size)
    }

    /// Capacity of a freshly created map.
    pub fn initial_capacity(&self) -> usize {
        next_prime(self.min_base_size())
    }
}
