use image::RgbaImage;
use std::path::Path;

use super::dmi_io;
use super::expansion::{self, ExpansionReport};
use super::frame_index::{FrameMap, assign_frame_indices, grid_side_for};
use super::grammar;
use super::grid;
use crate::error::{DmiError, DmiResult};
use crate::model::{Descriptor, SmoothingSet};

/// A parsed icon sheet with every state's tiles cut out of the source grid.
#[derive(Debug, Clone)]
pub struct DmiFile {
    pub descriptor: Descriptor,
    pub frame_map: FrameMap,
    /// Side of the source grid, recounted from the descriptor text.
    pub grid_side: usize,
}

/// Rejects icon sizes that cannot describe `image`: a tile larger than the
/// sheet, or a grid whose columns overflow or run past the right edge.
/// Missing rows at the bottom are tolerated and read back as transparent.
fn check_geometry(image: &RgbaImage, descriptor: &Descriptor, grid_side: usize) -> DmiResult<()> {
    let (width, height) = (descriptor.width, descriptor.height);
    if width > image.width() || height > image.height() {
        return Err(DmiError::malformed(format!(
            "icon size {}x{} does not fit in a {}x{} sheet",
            width,
            height,
            image.width(),
            image.height()
        )));
    }

    let side = u32::try_from(grid_side).ok();
    let grid_width = side.and_then(|s| s.checked_mul(width));
    let grid_height = side.and_then(|s| s.checked_mul(height));
    match (grid_width, grid_height) {
        (Some(grid_width), Some(_)) if grid_width <= image.width() => Ok(()),
        (Some(grid_width), Some(_)) => Err(DmiError::malformed(format!(
            "{} columns of {}px need {}px but the sheet is {}px wide",
            grid_side,
            width,
            grid_width,
            image.width()
        ))),
        _ => Err(DmiError::malformed(format!(
            "a {}x{} grid of {}x{} icons overflows the image size",
            grid_side, grid_side, width, height
        ))),
    }
}

/// Output of [`DmiFile::render`].
#[derive(Debug, Clone)]
pub struct RenderedDmi {
    pub image: RgbaImage,
    pub description: String,
    pub report: ExpansionReport,
}

impl DmiFile {
    pub fn open(path: &Path) -> DmiResult<Self> {
        let (image, description) = dmi_io::read_dmi(path)?;
        Self::from_image(&image, &description)
    }

    pub fn from_bytes(bytes: &[u8]) -> DmiResult<Self> {
        let (image, description) = dmi_io::read_dmi_bytes(bytes)?;
        Self::from_image(&image, &description)
    }

    pub fn from_image(image: &RgbaImage, description: &str) -> DmiResult<Self> {
        let lines = grammar::parse_lines(description)?;
        let mut descriptor = grammar::descriptor_from_lines(&lines)?;

        let (frame_map, walked_side) = assign_frame_indices(&mut descriptor.states);
        let grid_side = grid_side_for(grammar::total_frame_count(&lines)?);
        if grid_side != walked_side {
            return Err(DmiError::malformed(format!(
                "grid side {} from the frame walk disagrees with {} from the recount",
                walked_side, grid_side
            )));
        }

        check_geometry(image, &descriptor, grid_side)?;

        grid::extract(
            image,
            &frame_map,
            &mut descriptor.states,
            grid_side,
            descriptor.width,
            descriptor.height,
        );

        Ok(Self {
            descriptor,
            frame_map,
            grid_side,
        })
    }

    /// Expands the smoothing states and renders the new sheet together with
    /// its regenerated descriptor. Consumes the parsed state.
    pub fn render(
        mut self,
        smoothing: &SmoothingSet,
        preserve_extra_attributes: bool,
    ) -> DmiResult<RenderedDmi> {
        let (image, report) = expansion::expand(&mut self.descriptor, smoothing)?;
        let description = grammar::serialize_with(&self.descriptor, preserve_extra_attributes);

        Ok(RenderedDmi {
            image,
            description,
            report,
        })
    }
}
