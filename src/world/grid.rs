//! Grid - dense row-major cell storage with a permanent border ring

use super::chunk::ChunkTracker;
use super::render_sync::ColorChange;
use super::{Cell, WorldRng};
use crate::error::{Result, SandfallError};
use crate::simulation::{color, Material, Materials};

/// Exclusive owner of every cell in the simulation
///
/// Coordinates are `(x, y)` with `y = 0` at the bottom row. Every
/// coordinate-taking method quietly ignores out-of-bounds input. Perimeter
/// cells are `Border` and refuse all writes.
pub struct Grid {
    width: usize,
    height: usize,

    /// Cell data, row-major order
    /// Index = y * width + x
    cells: Vec<Cell>,

    /// Activity double-buffer, fed by every mutation below
    chunks: ChunkTracker,

    /// One flag per cell: color changed since the last drain
    color_dirty: Vec<bool>,
    /// Indices of the flagged cells, in the order they were first touched
    dirty_cells: Vec<usize>,
}

impl Grid {
    /// Allocate a `width` x `height` grid: border ring, empty interior
    pub fn new(
        width: usize,
        height: usize,
        chunk_size: usize,
        materials: &Materials,
    ) -> Result<Self> {
        if width < 3 || height < 3 {
            return Err(SandfallError::InvalidDimensions { width, height });
        }
        if chunk_size == 0 {
            return Err(SandfallError::InvalidChunkSize);
        }

        let count = width
            .checked_mul(height)
            .ok_or(SandfallError::OutOfMemory { cells: usize::MAX })?;

        let mut cells = Vec::new();
        cells
            .try_reserve_exact(count)
            .map_err(|_| SandfallError::OutOfMemory { cells: count })?;

        let mut color_dirty = Vec::new();
        color_dirty
            .try_reserve_exact(count)
            .map_err(|_| SandfallError::OutOfMemory { cells: count })?;
        color_dirty.resize(count, false);

        let empty = materials.empty();
        let border = materials.border();
        for y in 0..height {
            for x in 0..width {
                let perimeter = x == 0 || y == 0 || x == width - 1 || y == height - 1;
                cells.push(if perimeter { border } else { empty });
            }
        }

        Ok(Self {
            width,
            height,
            cells,
            chunks: ChunkTracker::new(width, height, chunk_size),
            color_dirty,
            dirty_cells: Vec::new(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Get raw cell slice for rendering or inspection
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn chunks(&self) -> &ChunkTracker {
        &self.chunks
    }

    pub fn chunks_mut(&mut self) -> &mut ChunkTracker {
        &mut self.chunks
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        self.in_bounds(x, y)
            .then(|| y as usize * self.width + x as usize)
    }

    pub fn is_perimeter(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y)
            && (x == 0 || y == 0 || x as usize == self.width - 1 || y as usize == self.height - 1)
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Mutable access for in-place state updates (velocity, flags,
    /// temperature). Material changes go through [`Grid::set`] or
    /// [`Grid::replace`] so observers are notified.
    #[inline]
    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        match self.index(x, y) {
            Some(i) if self.cells[i].material != Material::Border => Some(&mut self.cells[i]),
            _ => None,
        }
    }

    /// Material at (x, y); out-of-bounds reads as `Border`
    #[inline]
    pub fn material(&self, x: i32, y: i32) -> Material {
        self.get(x, y).map_or(Material::Border, |c| c.material)
    }

    /// True only for in-bounds `Empty` cells
    #[inline]
    pub fn is_empty(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_some_and(Cell::is_empty)
    }

    /// Overwrite one cell. Border cells are never overwritten.
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        if self.cells[i].material == Material::Border {
            return false;
        }

        self.cells[i] = cell;
        self.notify(i);
        self.chunks.report_activity(x, y);
        true
    }

    /// Re-initialize (x, y) as a fresh `material` cell from the registry.
    /// The new cell counts as resolved for the rest of the current tick.
    pub fn replace<R: WorldRng>(
        &mut self,
        x: i32,
        y: i32,
        material: Material,
        materials: &Materials,
        rng: &mut R,
    ) -> bool {
        if self.get_mut(x, y).is_none() {
            return false;
        }
        let mut cell = materials.create(material, rng);
        cell.set_moved(true);
        self.set(x, y, cell)
    }

    /// Exchange the full state of two cells and mark both as resolved
    pub fn swap(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) -> bool {
        let (Some(a), Some(b)) = (self.index(x1, y1), self.index(x2, y2)) else {
            return false;
        };
        if self.cells[a].material == Material::Border || self.cells[b].material == Material::Border
        {
            return false;
        }

        self.cells.swap(a, b);
        self.cells[a].set_moved(true);
        self.cells[b].set_moved(true);

        self.notify(a);
        self.notify(b);
        self.chunks.report_activity(x1, y1);
        self.chunks.report_activity(x2, y2);
        true
    }

    /// Flag a cell whose color was edited in place
    pub fn touch_color(&mut self, x: i32, y: i32) {
        if let Some(i) = self.index(x, y) {
            self.notify(i);
        }
    }

    pub fn report_activity(&mut self, x: i32, y: i32) {
        self.chunks.report_activity(x, y);
    }

    fn notify(&mut self, index: usize) {
        if !self.color_dirty[index] {
            self.color_dirty[index] = true;
            self.dirty_cells.push(index);
        }
    }

    /// Hand every flagged cell to the caller once, with its current color.
    ///
    /// All flags are cleared up front, so dropping the iterator early loses
    /// the remaining notifications rather than wedging those cells.
    pub fn drain_color_changes(&mut self) -> impl Iterator<Item = ColorChange> + '_ {
        for &index in &self.dirty_cells {
            self.color_dirty[index] = false;
        }
        let cells = &self.cells;
        self.dirty_cells.drain(..).map(move |index| ColorChange {
            index,
            rgba: color::to_rgba8(cells[index].color),
        })
    }

    /// Number of cells waiting for a color sync; never exceeds the cell count
    pub fn pending_color_count(&self) -> usize {
        self.dirty_cells.len()
    }

    /// Clear all "resolved this tick" flags
    pub fn clear_moved_flags(&mut self) {
        for cell in &mut self.cells {
            cell.set_moved(false);
        }
    }

    /// Count cells holding `material`
    pub fn count(&self, material: Material) -> usize {
        self.cells.iter().filter(|c| c.material == material).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    fn grid(width: usize, height: usize) -> Grid {
        Grid::new(width, height, 4, &Materials::new()).unwrap()
    }

    #[test]
    fn test_new_has_border_ring() {
        let grid = grid(6, 5);
        for y in 0..5 {
            for x in 0..6 {
                let expected = if grid.is_perimeter(x, y) {
                    Material::Border
                } else {
                    Material::Empty
                };
                assert_eq!(grid.material(x, y), expected);
            }
        }
        assert_eq!(grid.count(Material::Border), 2 * 6 + 2 * 3);
    }

    #[test]
    fn test_rejects_degenerate_dimensions() {
        let materials = Materials::new();
        assert!(matches!(
            Grid::new(2, 10, 4, &materials),
            Err(SandfallError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Grid::new(10, 10, 0, &materials),
            Err(SandfallError::InvalidChunkSize)
        ));
    }

    #[test]
    fn test_huge_grid_reports_out_of_memory() {
        let materials = Materials::new();
        let result = Grid::new(usize::MAX / 2, 3, 16, &materials);
        assert!(matches!(result, Err(SandfallError::OutOfMemory { .. })));
    }

    #[test]
    fn test_is_empty_false_for_border_and_out_of_bounds() {
        let grid = grid(5, 5);
        assert!(grid.is_empty(2, 2));
        assert!(!grid.is_empty(0, 2));
        assert!(!grid.is_empty(-1, 2));
        assert!(!grid.is_empty(2, 99));
    }

    #[test]
    fn test_set_refuses_border_and_out_of_bounds() {
        let mut grid = grid(5, 5);
        let sand = Cell {
            material: Material::Sand,
            ..Cell::EMPTY
        };
        assert!(!grid.set(0, 0, sand));
        assert!(!grid.set(7, 2, sand));
        assert_eq!(grid.material(0, 0), Material::Border);
        assert_eq!(grid.pending_color_count(), 0);

        assert!(grid.set(2, 2, sand));
        assert_eq!(grid.material(2, 2), Material::Sand);
        assert_eq!(grid.pending_color_count(), 1);
    }

    #[test]
    fn test_swap_marks_and_notifies_both() {
        let mut grid = grid(5, 5);
        let sand = Cell {
            material: Material::Sand,
            ..Cell::EMPTY
        };
        grid.set(2, 3, sand);
        grid.drain_color_changes();

        assert!(grid.swap(2, 3, 2, 2));
        assert_eq!(grid.material(2, 2), Material::Sand);
        assert_eq!(grid.material(2, 3), Material::Empty);
        assert!(grid.get(2, 2).unwrap().moved_this_tick());
        assert!(grid.get(2, 3).unwrap().moved_this_tick());

        let changes: Vec<_> = grid.drain_color_changes().collect();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].index, 3 * 5 + 2);
        assert_eq!(changes[1].index, 2 * 5 + 2);
    }

    #[test]
    fn test_repeated_changes_coalesce_per_cell() {
        let mut grid = grid(5, 5);
        let sand = Cell {
            material: Material::Sand,
            ..Cell::EMPTY
        };
        grid.set(2, 2, sand);
        for _ in 0..50 {
            grid.swap(2, 2, 2, 3);
            grid.touch_color(2, 3);
        }
        assert_eq!(grid.pending_color_count(), 2);

        grid.get_mut(2, 2).unwrap().color = color::rgb(10.0, 20.0, 30.0);
        grid.touch_color(2, 2);
        let changes: Vec<_> = grid.drain_color_changes().collect();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].index, 2 * 5 + 2);
        assert_eq!(changes[0].rgba, [10, 20, 30, 255]);
        assert_eq!(grid.pending_color_count(), 0);

        grid.touch_color(2, 2);
        assert_eq!(grid.pending_color_count(), 1);
    }

    #[test]
    fn test_swap_with_border_is_refused() {
        let mut grid = grid(5, 5);
        assert!(!grid.swap(2, 1, 2, 0));
        assert!(!grid.swap(2, 1, 2, -1));
        assert_eq!(grid.material(2, 0), Material::Border);
    }

    #[test]
    fn test_replace_uses_registry_and_marks_moved() {
        let materials = Materials::new();
        let mut grid = Grid::new(5, 5, 4, &materials).unwrap();
        let mut rng = Xoshiro256StarStar::seed_from_u64(5);

        assert!(grid.replace(2, 2, Material::Smoke, &materials, &mut rng));
        let cell = grid.get(2, 2).unwrap();
        assert_eq!(cell.material, Material::Smoke);
        assert!(cell.moved_this_tick());
        assert!((15.0..30.0).contains(&cell.life));

        assert!(!grid.replace(0, 2, Material::Smoke, &materials, &mut rng));
    }

    #[test]
    fn test_clear_moved_flags() {
        let mut grid = grid(5, 5);
        grid.swap(1, 1, 2, 2);
        grid.clear_moved_flags();
        assert!(grid.cells().iter().all(|c| !c.moved_this_tick()));
    }

    #[test]
    fn test_get_mut_hides_border() {
        let mut grid = grid(5, 5);
        assert!(grid.get_mut(0, 0).is_none());
        assert!(grid.get_mut(1, 1).is_some());
    }
}
