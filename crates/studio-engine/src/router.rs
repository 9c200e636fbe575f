use std::fmt;
use std::str::FromStr;

use studio_contracts::images::ImageResource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StudioMode {
    #[default]
    Mockup,
    Edit,
    Pro,
}

impl StudioMode {
    pub fn as_str(self) -> &'static str {
        match self {
            StudioMode::Mockup => "mockup",
            StudioMode::Edit => "edit",
            StudioMode::Pro => "pro",
        }
    }
}

impl fmt::Display for StudioMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudioMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mockup" | "mockups" => Ok(StudioMode::Mockup),
            "edit" | "editor" => Ok(StudioMode::Edit),
            "pro" | "studio" => Ok(StudioMode::Pro),
            other => Err(format!("unknown mode '{other}' (expected mockup, edit or pro)")),
        }
    }
}

/// Image handed to the edit workflow, tagged with the handoff it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedImage {
    image: ImageResource,
    token: u64,
}

impl SeedImage {
    pub fn new(image: ImageResource, token: u64) -> Self {
        Self { image, token }
    }

    pub fn image(&self) -> &ImageResource {
        &self.image
    }

    pub fn token(&self) -> u64 {
        self.token
    }
}

/// Which workflow is visible, plus the latest edit handoff.
#[derive(Debug, Clone, Default)]
pub struct ModeRouter {
    mode: StudioMode,
    seed: Option<SeedImage>,
    handoffs: u64,
}

impl ModeRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> StudioMode {
        self.mode
    }

    pub fn seed(&self) -> Option<&SeedImage> {
        self.seed.as_ref()
    }

    /// Returns whether the mode changed.
    pub fn switch_to(&mut self, mode: StudioMode) -> bool {
        let changed = self.mode != mode;
        self.mode = mode;
        changed
    }

    /// Starts a new handoff: every call gets a fresh token, even for an image
    /// that was handed off before.
    pub fn edit_existing_image(&mut self, image: ImageResource) -> &SeedImage {
        self.handoffs += 1;
        self.mode = StudioMode::Edit;
        self.seed.insert(SeedImage::new(image, self.handoffs))
    }
}
