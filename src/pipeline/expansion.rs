// Expands single-direction smoothing states into four rotated directions
// and repacks the whole sheet

use image::{RgbaImage, imageops};
use tracing::debug;

use super::frame_index::grid_side_for;
use super::grid::{frame_to_rect, paste_tile, place};
use crate::error::{DmiError, DmiResult};
use crate::model::{Descriptor, SmoothingSet, StateDeclaration};

/// Counter-clockwise rotation applied to a source tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    None,
    Quarter,
    Half,
    ThreeQuarter,
}

impl Rotation {
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Quarter => 90,
            Rotation::Half => 180,
            Rotation::ThreeQuarter => 270,
        }
    }
}

/// Rotation written to each of the four direction slots, in slot order.
/// Consumers read the slots as north, south, east, west.
pub const DIRECTIONAL_ROTATIONS: [Rotation; 4] = [
    Rotation::None,
    Rotation::Half,
    Rotation::Quarter,
    Rotation::ThreeQuarter,
];

/// Rotates `tile` counter-clockwise, keeping its dimensions. Non-square
/// tiles are turned about their centre and cropped back to size.
pub fn rotate_tile(tile: &RgbaImage, rotation: Rotation) -> RgbaImage {
    let rotated = match rotation {
        Rotation::None => return tile.clone(),
        Rotation::Half => return imageops::rotate180(tile),
        Rotation::Quarter => imageops::rotate270(tile),
        Rotation::ThreeQuarter => imageops::rotate90(tile),
    };

    if rotated.dimensions() == tile.dimensions() {
        return rotated;
    }

    let mut out = RgbaImage::new(tile.width(), tile.height());
    let dx = (tile.width() as i64 - rotated.width() as i64) / 2;
    let dy = (tile.height() as i64 - rotated.height() as i64) / 2;
    imageops::replace(&mut out, &rotated, dx, dy);
    out
}

pub fn is_eligible(state: &StateDeclaration, smoothing: &SmoothingSet) -> bool {
    state.dirs == 1 && smoothing.contains(&state.name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionReport {
    pub original_total: usize,
    pub eligible_total: usize,
    pub new_total: usize,
    pub new_grid_side: usize,
    pub expanded_states: Vec<String>,
}

/// Frame counts of the expanded layout, computed before anything is moved.
pub fn plan(states: &[StateDeclaration], smoothing: &SmoothingSet) -> ExpansionReport {
    let original_total: usize = states.iter().map(StateDeclaration::slot_count).sum();

    let mut eligible_total = 0;
    let mut expanded_states = Vec::new();
    for state in states.iter().filter(|s| is_eligible(s, smoothing)) {
        eligible_total += state.slot_count();
        expanded_states.push(state.name.clone());
    }

    let new_total = (original_total - eligible_total) + eligible_total * 4;

    ExpansionReport {
        original_total,
        eligible_total,
        new_total,
        new_grid_side: grid_side_for(new_total),
        expanded_states,
    }
}

/// Writes four rotated copies of every frame of `state` starting at
/// `start_frame`, then turns the state into a four-direction one.
/// Returns the number of slots consumed.
pub fn place_directional(
    dest: &mut RgbaImage,
    state: &mut StateDeclaration,
    start_frame: usize,
    grid_side: usize,
    width: u32,
    height: u32,
) -> DmiResult<usize> {
    let frames = state.frames as usize;
    if state.pixel_tiles.len() < frames {
        return Err(DmiError::TileCountMismatch {
            state: state.name.clone(),
            expected: frames,
            found: state.pixel_tiles.len(),
        });
    }

    let mut tiles = Vec::with_capacity(frames * DIRECTIONAL_ROTATIONS.len());
    let mut indices = Vec::with_capacity(frames * DIRECTIONAL_ROTATIONS.len());
    let mut frame = start_frame;

    for source in state.pixel_tiles.iter().take(frames) {
        for rotation in DIRECTIONAL_ROTATIONS {
            let tile = rotate_tile(source, rotation);
            paste_tile(dest, &tile, frame_to_rect(frame, grid_side, width, height));
            tiles.push(tile);
            indices.push(frame);
            frame += 1;
        }
    }

    state.dirs = DIRECTIONAL_ROTATIONS.len() as u32;
    state.pixel_tiles = tiles;
    state.frame_indices = indices;

    Ok(frame - start_frame)
}

/// Repacks every state onto a fresh transparent canvas in declaration
/// order. A single forward cursor decides where each state lands.
pub fn expand(
    descriptor: &mut Descriptor,
    smoothing: &SmoothingSet,
) -> DmiResult<(RgbaImage, ExpansionReport)> {
    let report = plan(&descriptor.states, smoothing);
    let (width, height) = (descriptor.width, descriptor.height);
    let grid_side = report.new_grid_side;
    let side = u32::try_from(grid_side).ok();
    let (Some(dimensions), Some(_)) = (
        side.and_then(|s| s.checked_mul(width)),
        side.and_then(|s| s.checked_mul(height)),
    ) else {
        return Err(DmiError::malformed(format!(
            "a {}x{} grid of {}x{} icons overflows the image size",
            grid_side, grid_side, width, height
        )));
    };

    debug!(
        original = report.original_total,
        eligible = report.eligible_total,
        new_total = report.new_total,
        grid_side,
        "expanding layout"
    );

    // Square on the icon width; height is assumed equal
    let mut canvas = RgbaImage::new(dimensions, dimensions);

    let mut current_frame = 0;
    for state in descriptor.states.iter_mut() {
        if is_eligible(state, smoothing) {
            current_frame +=
                place_directional(&mut canvas, state, current_frame, grid_side, width, height)?;
        } else {
            let used = place(&mut canvas, state, current_frame, grid_side, width, height)?;
            state.frame_indices = (current_frame..current_frame + used).collect();
            current_frame += used;
        }
    }

    Ok((canvas, report))
}
