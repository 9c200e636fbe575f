mod registry;
mod selectors;

pub use registry::{ModelRegistry, ModelSpec, CAPABILITY_EDIT, CAPABILITY_MOCKUP, CAPABILITY_PRO};
pub use selectors::{ModelSelection, ModelSelector};
