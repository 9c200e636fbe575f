use indexmap::IndexMap;

pub const CAPABILITY_MOCKUP: &str = "mockup";
pub const CAPABILITY_EDIT: &str = "edit";
pub const CAPABILITY_PRO: &str = "pro";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
    pub provider: String,
    pub capabilities: Vec<String>,
}

impl ModelSpec {
    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|item| item == capability)
    }
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl ModelRegistry {
    pub fn new(models: Option<IndexMap<String, ModelSpec>>) -> Self {
        Self {
            models: models.unwrap_or_else(default_models),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.get(name)
    }

    pub fn by_capability(&self, capability: &str) -> Vec<ModelSpec> {
        self.models
            .values()
            .filter(|model| model.supports(capability))
            .cloned()
            .collect()
    }

    pub fn ensure(&self, name: &str, capability: &str) -> Option<ModelSpec> {
        let model = self.get(name.trim())?;
        if model.supports(capability) {
            return Some(model.clone());
        }
        None
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

// Order matters: the first model supporting a capability is its default.
fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map = IndexMap::new();

    let mut insert = |name: &str, provider: &str, capabilities: &[&str]| {
        map.insert(
            name.to_string(),
            ModelSpec {
                name: name.to_string(),
                provider: provider.to_string(),
                capabilities: capabilities
                    .iter()
                    .map(|item| (*item).to_string())
                    .collect(),
            },
        );
    };

    insert(
        "gemini-2.5-flash-image",
        "gemini",
        &[CAPABILITY_MOCKUP, CAPABILITY_EDIT],
    );
    insert(
        "gemini-3-pro-image-preview",
        "gemini",
        &[CAPABILITY_PRO, CAPABILITY_MOCKUP, CAPABILITY_EDIT],
    );
    insert(
        "dryrun-image-1",
        "dryrun",
        &[CAPABILITY_MOCKUP, CAPABILITY_EDIT, CAPABILITY_PRO],
    );

    map
}
