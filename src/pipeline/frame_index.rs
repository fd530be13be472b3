// Global frame numbering: states in declaration order, frames outer,
// directions inner

use crate::model::StateDeclaration;

/// Back-references from global frame index to the owning state's position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameMap {
    owners: Vec<usize>,
}

impl FrameMap {
    /// Owning state of `index`, or `None` for grid slack past the last frame.
    pub fn owner(&self, index: usize) -> Option<usize> {
        self.owners.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// Smallest side length of a square grid holding `total` frames.
pub fn grid_side_for(total: usize) -> usize {
    let mut side = (total as f64).sqrt() as usize;
    while side * side < total {
        side += 1;
    }
    while side > 0 && (side - 1) * (side - 1) >= total {
        side -= 1;
    }
    side
}

/// Numbers every frame and records the indices on each state. Returns the
/// frame map and the grid side derived from the walk.
pub fn assign_frame_indices(states: &mut [StateDeclaration]) -> (FrameMap, usize) {
    let mut owners = Vec::new();
    let mut frame = 0;

    for (position, state) in states.iter_mut().enumerate() {
        let mut local_frames = Vec::with_capacity(state.slot_count());
        for _ in 0..state.frames {
            for _ in 0..state.dirs {
                owners.push(position);
                local_frames.push(frame);
                frame += 1;
            }
        }
        state.frame_indices = local_frames;
    }

    let grid_side = grid_side_for(owners.len());
    (FrameMap { owners }, grid_side)
}
