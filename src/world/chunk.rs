//! Chunk activity tracking
//!
//! The grid is partitioned into square chunks. A chunk is simulated on the
//! next tick only if something inside it (or on a shared edge next to it)
//! reported activity during the current tick.

/// Fixed rectangular partition of the grid
#[derive(Clone, Debug)]
pub struct Chunk {
    /// Chunk coordinates (in chunk space, not cell space)
    pub cx: usize,
    pub cy: usize,

    /// Cell-space bounds, min inclusive, max exclusive
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,

    /// Simulated during the current tick
    pub should_update: bool,
    /// Activity reported during the current tick, promoted at tick end
    pub should_update_next_frame: bool,
}

impl Chunk {
    pub fn contains(&self, x: usize, y: usize) -> bool {
        (self.min_x..self.max_x).contains(&x) && (self.min_y..self.max_y).contains(&y)
    }
}

/// Owns every chunk of a grid and the activity double-buffer
pub struct ChunkTracker {
    chunks: Vec<Chunk>,
    chunk_size: usize,
    chunks_wide: usize,
    chunks_high: usize,
    width: usize,
    height: usize,
}

impl ChunkTracker {
    /// Partition a `width` x `height` grid. Edge chunks may be smaller than
    /// `chunk_size`. Every chunk is active for the first tick only.
    pub fn new(width: usize, height: usize, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        let chunks_wide = width.div_ceil(chunk_size);
        let chunks_high = height.div_ceil(chunk_size);

        let mut chunks = Vec::with_capacity(chunks_wide * chunks_high);
        for cy in 0..chunks_high {
            for cx in 0..chunks_wide {
                chunks.push(Chunk {
                    cx,
                    cy,
                    min_x: cx * chunk_size,
                    min_y: cy * chunk_size,
                    max_x: ((cx + 1) * chunk_size).min(width),
                    max_y: ((cy + 1) * chunk_size).min(height),
                    should_update: true,
                    should_update_next_frame: false,
                });
            }
        }

        Self {
            chunks,
            chunk_size,
            chunks_wide,
            chunks_high,
            width,
            height,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Chunk grid dimensions (columns, rows)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.chunks_wide, self.chunks_high)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    fn index_at(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        let cx = x as usize / self.chunk_size;
        let cy = y as usize / self.chunk_size;
        Some(cy * self.chunks_wide + cx)
    }

    /// Chunk owning cell (x, y), if in bounds
    pub fn chunk_at(&self, x: i32, y: i32) -> Option<&Chunk> {
        self.index_at(x, y).map(|i| &self.chunks[i])
    }

    fn arm(&mut self, x: i32, y: i32) {
        if let Some(i) = self.index_at(x, y) {
            self.chunks[i].should_update_next_frame = true;
        }
    }

    /// Request simulation of the chunk owning (x, y) on the next tick.
    /// A cell on a chunk edge also arms the chunk across that edge.
    pub fn report_activity(&mut self, x: i32, y: i32) {
        let Some(i) = self.index_at(x, y) else {
            return;
        };

        let (min_x, min_y, max_x, max_y) = {
            let chunk = &mut self.chunks[i];
            chunk.should_update_next_frame = true;
            (chunk.min_x as i32, chunk.min_y as i32, chunk.max_x as i32, chunk.max_y as i32)
        };

        if x == min_x {
            self.arm(x - 1, y);
        }
        if x == max_x - 1 {
            self.arm(x + 1, y);
        }
        if y == min_y {
            self.arm(x, y - 1);
        }
        if y == max_y - 1 {
            self.arm(x, y + 1);
        }
    }

    /// Promote next-tick requests to the current tick and clear them
    pub fn advance_and_reset(&mut self) {
        for chunk in &mut self.chunks {
            chunk.should_update = chunk.should_update_next_frame;
            chunk.should_update_next_frame = false;
        }
    }

    /// Activate the chunk owning (x, y) for the current tick as well as the
    /// next one. Used for edits made between ticks.
    pub fn wake(&mut self, x: i32, y: i32) {
        if let Some(i) = self.index_at(x, y) {
            let chunk = &mut self.chunks[i];
            chunk.should_update = true;
            chunk.should_update_next_frame = true;
        }
    }

    /// Mark every chunk active for the current and next tick
    pub fn wake_all(&mut self) {
        for chunk in &mut self.chunks {
            chunk.should_update = true;
            chunk.should_update_next_frame = true;
        }
    }

    pub fn active_count(&self) -> usize {
        self.chunks.iter().filter(|c| c.should_update).count()
    }
}
