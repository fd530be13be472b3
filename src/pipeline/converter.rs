// High-level API: one DMI file in, one direction-fixed DMI file out

use std::path::Path;
use tracing::{debug, info};

use super::dmi::DmiFile;
use super::dmi_io;
use super::expansion::ExpansionReport;
use crate::error::DmiResult;
use crate::model::SmoothingSet;

#[derive(Debug, Clone, Default)]
pub struct FixOptions {
    pub smoothing: SmoothingSet,
    pub preserve_extra_attributes: bool,
}

impl FixOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_smoothing(mut self, smoothing: SmoothingSet) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub fn with_extra_attributes(mut self, preserve: bool) -> Self {
        self.preserve_extra_attributes = preserve;
        self
    }
}

/// Parses, expands and re-encodes a DMI held in memory.
pub fn fix_dmi_bytes(data: &[u8], options: &FixOptions) -> DmiResult<(Vec<u8>, ExpansionReport)> {
    let dmi = DmiFile::from_bytes(data)?;
    debug!(
        states = dmi.descriptor.states.len(),
        grid_side = dmi.grid_side,
        "parsed descriptor"
    );

    let rendered = dmi.render(&options.smoothing, options.preserve_extra_attributes)?;
    let encoded = dmi_io::encode_dmi(&rendered.image, &rendered.description)?;
    Ok((encoded, rendered.report))
}

pub fn fix_dmi_file(
    input_path: &Path,
    output_path: &Path,
    options: &FixOptions,
) -> DmiResult<ExpansionReport> {
    let dmi = DmiFile::open(input_path)?;
    let rendered = dmi.render(&options.smoothing, options.preserve_extra_attributes)?;

    info!(
        file = %input_path.display(),
        expanded = rendered.report.expanded_states.len(),
        frames = rendered.report.new_total,
        grid_side = rendered.report.new_grid_side,
        "rendered"
    );

    dmi_io::write_dmi(output_path, &rendered.image, &rendered.description)?;
    Ok(rendered.report)
}
