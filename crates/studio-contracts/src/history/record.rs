use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::images::ImageResource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    Mockup,
    Edit,
    Pro,
}

impl GenerationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationKind::Mockup => "mockup",
            GenerationKind::Edit => "edit",
            GenerationKind::Pro => "pro",
        }
    }
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One successful generation. Records are immutable; the only way to obtain
/// one is through [`super::SessionHistory::record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImageRecord {
    id: String,
    image: ImageResource,
    prompt: String,
    kind: GenerationKind,
    created_at: DateTime<Utc>,
}

impl GeneratedImageRecord {
    pub(crate) fn new(
        id: String,
        image: ImageResource,
        prompt: String,
        kind: GenerationKind,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            image,
            prompt,
            kind,
            created_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn image(&self) -> &ImageResource {
        &self.image
    }

    /// Displayable reference to the image (a `data:` URI).
    pub fn url(&self) -> String {
        self.image.data_uri()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn kind(&self) -> GenerationKind {
        self.kind
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn download_file_name(&self) -> String {
        format!("mockup-studio-{}.{}", self.id, self.image.extension())
    }
}
