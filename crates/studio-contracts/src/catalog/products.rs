#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductTemplate {
    pub id: &'static str,
    pub display_name: &'static str,
    pub prompt_fragment: &'static str,
}

pub const PRODUCT_TEMPLATES: &[ProductTemplate] = &[
    ProductTemplate {
        id: "t-shirt",
        display_name: "T-Shirt",
        prompt_fragment: "folded white cotton t-shirt on a wooden table",
    },
    ProductTemplate {
        id: "mug",
        display_name: "Ceramic Mug",
        prompt_fragment: "white ceramic coffee mug on a marble counter next to coffee beans",
    },
    ProductTemplate {
        id: "tote",
        display_name: "Tote Bag",
        prompt_fragment: "canvas tote bag hanging on a hook against a minimal wall",
    },
    ProductTemplate {
        id: "box",
        display_name: "Packaging Box",
        prompt_fragment: "cardboard packaging box on a clean surface",
    },
];

impl ProductTemplate {
    /// Instruction sent alongside the logo when the user did not type their own.
    pub fn placement_prompt(&self) -> String {
        format!("Place this logo realistically on a {}.", self.prompt_fragment)
    }

    pub fn record_prompt(&self) -> String {
        format!("Logo on {}", self.display_name)
    }
}

pub fn default_product() -> &'static ProductTemplate {
    &PRODUCT_TEMPLATES[0]
}

/// Looks a template up by id or display name, ignoring case. `shirt` and
/// `bag` are accepted as shorthands for the shirt and tote entries.
pub fn find_product(query: &str) -> Option<&'static ProductTemplate> {
    let normalized = query.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return None;
    }
    let normalized = match normalized.as_str() {
        "shirt" | "tshirt" => "t-shirt".to_string(),
        "bag" => "tote".to_string(),
        _ => normalized,
    };
    PRODUCT_TEMPLATES.iter().find(|product| {
        product.id == normalized || product.display_name.to_ascii_lowercase() == normalized
    })
}
