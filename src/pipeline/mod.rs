pub mod converter;
pub mod dmi;
pub mod dmi_io;
pub mod expansion;
pub mod frame_index;
pub mod fs_ops;
pub mod grammar;
pub mod grid;

pub use converter::{FixOptions, fix_dmi_bytes, fix_dmi_file};
pub use dmi::{DmiFile, RenderedDmi};
pub use expansion::ExpansionReport;

#[cfg(test)]
mod pipeline_test;
