//! Render sync seam
//!
//! The core never talks to a GPU. It flags cells whose color changed and, on
//! sync, hands the host one [`ColorChange`] per flagged cell to forward to
//! whatever renderer it owns.

/// A cell whose visible color changed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorChange {
    /// Row-major cell index (`y * width + x`)
    pub index: usize,
    pub rgba: [u8; 4],
}

/// Receives per-cell color updates
pub trait RenderSync {
    fn on_cell_color_changed(&mut self, index: usize, rgba: [u8; 4]);
}

/// Discards every update
#[derive(Default)]
pub struct NoopRenderSync;

impl RenderSync for NoopRenderSync {
    fn on_cell_color_changed(&mut self, _index: usize, _rgba: [u8; 4]) {}
}

/// Flat RGBA8 buffer, four bytes per cell, ready for a texture upload
pub struct ColorBuffer {
    pub data: Vec<u8>,
}

impl ColorBuffer {
    pub fn new(cell_count: usize) -> Self {
        Self {
            data: vec![0; cell_count * 4],
        }
    }

    pub fn get(&self, index: usize) -> Option<[u8; 4]> {
        let px = self.data.get(index * 4..index * 4 + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

impl RenderSync for ColorBuffer {
    fn on_cell_color_changed(&mut self, index: usize, rgba: [u8; 4]) {
        if let Some(px) = self.data.get_mut(index * 4..index * 4 + 4) {
            px.copy_from_slice(&rgba);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_buffer_writes_pixel() {
        let mut buffer = ColorBuffer::new(4);
        buffer.on_cell_color_changed(2, [1, 2, 3, 4]);
        assert_eq!(buffer.get(2), Some([1, 2, 3, 4]));
        assert_eq!(buffer.get(1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_color_buffer_ignores_out_of_range() {
        let mut buffer = ColorBuffer::new(1);
        buffer.on_cell_color_changed(5, [9, 9, 9, 9]);
        assert_eq!(buffer.get(5), None);
        assert_eq!(buffer.data, vec![0, 0, 0, 0]);
    }
}
