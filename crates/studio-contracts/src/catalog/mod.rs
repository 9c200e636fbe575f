mod output;
mod products;

pub use output::{AspectRatio, Resolution, ASPECT_RATIOS, DEFAULT_ASPECT_RATIO};
pub use products::{default_product, find_product, ProductTemplate, PRODUCT_TEMPLATES};

pub const EDIT_SUGGESTIONS: &[&str] = &[
    "Make it cyberpunk style",
    "Add sunlight from the right",
    "Turn the background to a forest",
];
