use std::collections::BTreeMap;

use anyhow::Result;
use serde_json::{json, Map, Value};
use studio_contracts::images::ImageResource;

/// One ordered content segment of a `generateContent` request.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    InlineImage(ImageResource),
    Text(String),
}

impl ContentPart {
    fn to_value(&self) -> Value {
        match self {
            ContentPart::InlineImage(image) => json!({
                "inlineData": {
                    "mimeType": image.mime_type(),
                    "data": image.base64_data(),
                }
            }),
            ContentPart::Text(text) => json!({ "text": text }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageConfig {
    pub image_size: Option<String>,
    pub aspect_ratio: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateContentRequest {
    pub model: String,
    pub parts: Vec<ContentPart>,
    pub image_config: Option<ImageConfig>,
}

impl GenerateContentRequest {
    pub fn new(model: impl Into<String>, parts: Vec<ContentPart>) -> Self {
        Self {
            model: model.into(),
            parts,
            image_config: None,
        }
    }

    pub fn with_image_config(mut self, config: ImageConfig) -> Self {
        self.image_config = Some(config);
        self
    }

    /// Text of every text part, joined by newlines.
    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text(text) => Some(text.as_str()),
                ContentPart::InlineImage(_) => None,
            })
            .collect::<Vec<&str>>()
            .join("\n")
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageResource> {
        self.parts.iter().filter_map(|part| match part {
            ContentPart::InlineImage(image) => Some(image),
            ContentPart::Text(_) => None,
        })
    }

    /// JSON body for `models/{model}:generateContent`.
    pub fn to_payload(&self) -> Value {
        let mut payload = Map::new();
        payload.insert(
            "contents".to_string(),
            Value::Array(vec![json!({
                "role": "user",
                "parts": self.parts.iter().map(ContentPart::to_value).collect::<Vec<Value>>(),
            })]),
        );
        if let Some(config) = &self.image_config {
            let mut image_config = Map::new();
            if let Some(size) = &config.image_size {
                image_config.insert("imageSize".to_string(), Value::String(size.clone()));
            }
            if let Some(ratio) = &config.aspect_ratio {
                image_config.insert("aspectRatio".to_string(), Value::String(ratio.clone()));
            }
            if !image_config.is_empty() {
                payload.insert(
                    "generationConfig".to_string(),
                    json!({ "imageConfig": Value::Object(image_config) }),
                );
            }
        }
        Value::Object(payload)
    }
}

/// The external multimodal generation service. Implementations return the
/// raw response body; interpreting it is the extractor's job.
pub trait GenerationService: Send + Sync {
    fn name(&self) -> &str;
    fn generate_content(&self, request: &GenerateContentRequest) -> Result<Value>;
}

#[derive(Default)]
pub struct ServiceRegistry {
    services: BTreeMap<String, Box<dyn GenerationService>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: GenerationService + 'static>(&mut self, service: S) {
        self.services
            .insert(service.name().to_string(), Box::new(service));
    }

    pub fn get(&self, name: &str) -> Option<&dyn GenerationService> {
        self.services.get(name).map(|service| service.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }
}
