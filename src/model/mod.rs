pub mod descriptor;
pub mod smoothing;

pub use descriptor::{Descriptor, StateDeclaration, Value};
pub use smoothing::SmoothingSet;
