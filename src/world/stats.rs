//! Simulation statistics collection trait

use glam::IVec2;

/// Trait for collecting simulation statistics
///
/// Movement rules and the combustion step report what they did through this
/// seam; the world keeps a [`TickStats`] for the most recent tick.
pub trait SimStats {
    /// Record that a cell was moved during simulation
    fn record_cell_moved(&mut self);

    /// Record a move together with where it started and ended
    fn record_move(&mut self, from: IVec2, to: IVec2) {
        let _ = (from, to);
        self.record_cell_moved();
    }

    /// Record that a cell was overwritten with another material
    fn record_transmutation(&mut self);

    /// Record that a cell caught fire
    fn record_ignition(&mut self);
}

/// A no-op implementation for when stats collection is not needed
#[derive(Default)]
pub struct NoopStats;

impl SimStats for NoopStats {
    fn record_cell_moved(&mut self) {}
    fn record_transmutation(&mut self) {}
    fn record_ignition(&mut self) {}
}

/// Counters for a single tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    pub cells_moved: u32,
    pub transmutations: u32,
    pub ignitions: u32,
    /// Chunks scanned (every chunk in whole-grid mode)
    pub chunks_scanned: u32,
}

impl SimStats for TickStats {
    fn record_cell_moved(&mut self) {
        self.cells_moved += 1;
    }

    fn record_transmutation(&mut self) {
        self.transmutations += 1;
    }

    fn record_ignition(&mut self) {
        self.ignitions += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_stats_all_methods() {
        let mut stats = NoopStats;
        for _ in 0..100 {
            stats.record_cell_moved();
            stats.record_transmutation();
            stats.record_ignition();
        }
    }

    #[test]
    fn test_tick_stats_counts() {
        let mut stats = TickStats::default();
        stats.record_cell_moved();
        stats.record_cell_moved();
        stats.record_transmutation();
        stats.record_ignition();

        assert_eq!(stats.cells_moved, 2);
        assert_eq!(stats.transmutations, 1);
        assert_eq!(stats.ignitions, 1);
        assert_eq!(stats.chunks_scanned, 0);
    }

    #[test]
    fn test_record_move_counts_as_cell_moved() {
        let mut stats = TickStats::default();
        stats.record_move(IVec2::new(3, 4), IVec2::new(3, 3));
        assert_eq!(stats.cells_moved, 1);
    }

    #[test]
    fn test_tick_stats_through_trait_object() {
        let mut stats = TickStats::default();
        {
            let dyn_stats: &mut dyn SimStats = &mut stats;
            dyn_stats.record_cell_moved();
        }
        assert_eq!(stats.cells_moved, 1);
    }
}
