// Library exports for dmi-dirfix

pub mod config;
pub mod error;
pub mod event;
pub mod model;
pub mod pipeline;
pub mod pipeline_worker;

pub use error::{DmiError, DmiResult};
pub use model::{Descriptor, SmoothingSet, StateDeclaration, Value};
pub use pipeline::{DmiFile, ExpansionReport, FixOptions, fix_dmi_file};
