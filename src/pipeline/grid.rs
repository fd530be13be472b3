// Maps global frame indices onto the packed row-major icon grid

use image::{RgbaImage, imageops};

use super::frame_index::FrameMap;
use crate::error::{DmiError, DmiResult};
use crate::model::StateDeclaration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl CellRect {
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }
}

pub fn frame_to_rect(index: usize, grid_side: usize, width: u32, height: u32) -> CellRect {
    let col = (index % grid_side) as u32;
    let row = (index / grid_side) as u32;
    CellRect {
        x0: col * width,
        y0: row * height,
        x1: col * width + width,
        y1: row * height + height,
    }
}

/// Copies `rect` out of `source`. Parts past the image edge come back transparent.
pub fn crop_tile(source: &RgbaImage, rect: CellRect) -> RgbaImage {
    let mut tile = RgbaImage::new(rect.width(), rect.height());
    if rect.x0 >= source.width() || rect.y0 >= source.height() {
        return tile;
    }

    let w = rect.width().min(source.width() - rect.x0);
    let h = rect.height().min(source.height() - rect.y0);
    let view = imageops::crop_imm(source, rect.x0, rect.y0, w, h).to_image();
    imageops::replace(&mut tile, &view, 0, 0);
    tile
}

/// Overwrites the pixels at `rect`; anything past the canvas edge is dropped.
pub fn paste_tile(dest: &mut RgbaImage, tile: &RgbaImage, rect: CellRect) {
    imageops::replace(dest, tile, rect.x0 as i64, rect.y0 as i64);
}

/// Crops every grid cell into the `pixel_tiles` of the state that owns it.
/// Cells past the last declared frame have no owner and are skipped.
pub fn extract(
    source: &RgbaImage,
    frame_map: &FrameMap,
    states: &mut [StateDeclaration],
    grid_side: usize,
    width: u32,
    height: u32,
) {
    for index in 0..grid_side * grid_side {
        let Some(owner) = frame_map.owner(index) else {
            continue;
        };
        let Some(state) = states.get_mut(owner) else {
            continue;
        };

        let rect = frame_to_rect(index, grid_side, width, height);
        state.pixel_tiles.push(crop_tile(source, rect));
    }
}

/// Writes a state's tiles into consecutive slots from `start_frame`.
/// Returns the number of slots consumed.
pub fn place(
    dest: &mut RgbaImage,
    state: &StateDeclaration,
    start_frame: usize,
    grid_side: usize,
    width: u32,
    height: u32,
) -> DmiResult<usize> {
    let slots = state.slot_count();
    if state.pixel_tiles.len() < slots {
        return Err(DmiError::TileCountMismatch {
            state: state.name.clone(),
            expected: slots,
            found: state.pixel_tiles.len(),
        });
    }

    for (offset, tile) in state.pixel_tiles.iter().take(slots).enumerate() {
        let rect = frame_to_rect(start_frame + offset, grid_side, width, height);
        paste_tile(dest, tile, rect);
    }

    Ok(slots)
}
