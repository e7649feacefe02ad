use crate::mpc::{Bus, Load};

/// Sums the demand of load records onto buses.
pub trait LoadAggregator {
    /// Returns the active (MW) and reactive (MVAr) demand at each bus in
    /// `bus`. `load` holds one normalized record per bus, aligned by
    /// position. Both returned vectors must have `bus.len()` elements.
    fn total_load(&self, bus: &[Bus], load: &[Load]) -> (Vec<f64>, Vec<f64>);
}
